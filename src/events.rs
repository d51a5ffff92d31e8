//! Transient game events and their fan-out targeting.
//!
//! Events are collected on the world during a tick and flushed to open
//! channels after all mutation completes. Unit-death notices are throttled
//! to one per owner per five seconds.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::entities::{PlayerId, TeamId};

/// Seconds between unit-death notices for the same owner.
pub const DEATH_NOTICE_DEBOUNCE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    Info,
    Warning,
    System,
    Error,
}

impl EventCategory {
    fn default_color(self) -> &'static str {
        match self {
            EventCategory::Info => "#e8e8e8",
            EventCategory::Warning => "#ffcc00",
            EventCategory::System => "#66ccff",
            EventCategory::Error => "#ff5544",
        }
    }
}

/// Who receives an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTarget {
    All,
    Team(BTreeSet<TeamId>),
    Specific(BTreeSet<PlayerId>),
    Spectators,
}

impl EventTarget {
    pub fn team(team: TeamId) -> Self {
        EventTarget::Team(BTreeSet::from([team]))
    }

    pub fn player(player: PlayerId) -> Self {
        EventTarget::Specific(BTreeSet::from([player]))
    }
}

/// A transient notification, separate from snapshots.
#[derive(Debug, Clone)]
pub struct GameEvent {
    pub message: String,
    pub category: EventCategory,
    pub color: String,
    pub target: EventTarget,
    pub exclude: BTreeSet<PlayerId>,
    pub display_duration_ms: u32,
}

impl GameEvent {
    pub fn new(message: impl Into<String>, category: EventCategory, target: EventTarget) -> Self {
        Self {
            message: message.into(),
            category,
            color: category.default_color().to_string(),
            target,
            exclude: BTreeSet::new(),
            display_duration_ms: 4000,
        }
    }

    pub fn info(message: impl Into<String>, target: EventTarget) -> Self {
        Self::new(message, EventCategory::Info, target)
    }

    pub fn warning(message: impl Into<String>, target: EventTarget) -> Self {
        Self::new(message, EventCategory::Warning, target)
    }

    pub fn system(message: impl Into<String>, target: EventTarget) -> Self {
        Self::new(message, EventCategory::System, target)
    }

    pub fn error(message: impl Into<String>, target: EventTarget) -> Self {
        Self::new(message, EventCategory::Error, target)
    }

    pub fn excluding(mut self, player: PlayerId) -> Self {
        self.exclude.insert(player);
        self
    }

    pub fn lasting_ms(mut self, ms: u32) -> Self {
        self.display_duration_ms = ms;
        self
    }

    /// Should this event be delivered to the given endpoint?
    pub fn applies_to(&self, player: PlayerId, team: Option<TeamId>, spectator: bool) -> bool {
        if self.exclude.contains(&player) {
            return false;
        }
        match &self.target {
            EventTarget::All => true,
            EventTarget::Team(teams) => team.is_some_and(|t| teams.contains(&t)),
            EventTarget::Specific(players) => players.contains(&player),
            EventTarget::Spectators => spectator,
        }
    }

    /// Wire form: targeting stripped.
    pub fn record(&self) -> GameEventRecord {
        GameEventRecord {
            message: self.message.clone(),
            category: self.category,
            color: self.color.clone(),
            display_duration_ms: self.display_duration_ms,
        }
    }
}

/// The serialized shape delivered to channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEventRecord {
    pub message: String,
    pub category: EventCategory,
    pub color: String,
    pub display_duration_ms: u32,
}

/// Per-tick event collector with death-notice throttling.
#[derive(Debug, Default)]
pub struct EventBus {
    pending: Vec<GameEvent>,
    last_death_notice: HashMap<PlayerId, f64>,
}

impl EventBus {
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push(event);
    }

    /// Queue a unit-death notice unless one fired for this owner within the
    /// debounce window.
    pub fn notify_unit_death(&mut self, owner: PlayerId, unit_name: &str, now: f64) {
        match self.last_death_notice.get(&owner) {
            Some(&last) if now - last < DEATH_NOTICE_DEBOUNCE => {}
            _ => {
                self.last_death_notice.insert(owner, now);
                self.push(GameEvent::warning(
                    format!("{unit_name} lost"),
                    EventTarget::player(owner),
                ));
            }
        }
    }

    /// Take everything queued this tick.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targeting() {
        let event = GameEvent::info("hello", EventTarget::team(TeamId(1)));
        assert!(event.applies_to(PlayerId(1), Some(TeamId(1)), false));
        assert!(!event.applies_to(PlayerId(2), Some(TeamId(2)), false));
        assert!(!event.applies_to(PlayerId(3), None, true));

        let event = GameEvent::info("spec", EventTarget::Spectators);
        assert!(event.applies_to(PlayerId(9), None, true));
        assert!(!event.applies_to(PlayerId(1), Some(TeamId(1)), false));
    }

    #[test]
    fn test_exclusion() {
        let event = GameEvent::info("all but 2", EventTarget::All).excluding(PlayerId(2));
        assert!(event.applies_to(PlayerId(1), Some(TeamId(1)), false));
        assert!(!event.applies_to(PlayerId(2), Some(TeamId(1)), false));
    }

    #[test]
    fn test_death_notice_throttling() {
        let mut bus = EventBus::default();
        let owner = PlayerId(1);
        bus.notify_unit_death(owner, "Trooper", 10.0);
        bus.notify_unit_death(owner, "Trooper", 12.0);
        assert_eq!(bus.pending_count(), 1, "second notice inside 5 s is dropped");
        bus.notify_unit_death(owner, "Trooper", 15.5);
        assert_eq!(bus.pending_count(), 2, "notice after 5 s passes");

        // A different owner is throttled independently.
        bus.notify_unit_death(PlayerId(2), "Tank", 15.6);
        assert_eq!(bus.pending_count(), 3);
    }
}
