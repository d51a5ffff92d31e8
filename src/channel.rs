//! The duplex boundary between the core and the transport layer.
//!
//! The transport registers one [`PlayerChannel`] per player (or spectator)
//! and pushes [`InputFrame`]s into the shared [`InputQueue`]. The simulation
//! drains the queue once per tick and pushes snapshots and events back
//! through the channels, fire-and-forget.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::catalog::{BuildingType, ResearchType, UnitType};
use crate::entities::{EntityId, PlayerId, Stance};
use crate::events::GameEventRecord;
use crate::snapshot::GameState;

/// Abstract per-player message channel. `send` must not block the
/// simulation; implementations buffer or drop according to their own policy.
pub trait PlayerChannel: Send + Sync {
    fn is_open(&self) -> bool;
    fn send(&self, message: &ServerMessage);
}

/// Outbound wire shape, serialized as JSON-like structured records.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Snapshot(GameState),
    Event(GameEventRecord),
}

// ============================================================================
// INBOUND FRAMES
// ============================================================================

/// An order applying to the frame's unit selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitOrder {
    Move { x: f32, y: f32 },
    AttackMove { x: f32, y: f32 },
    AttackUnit { target: EntityId },
    AttackBuilding { target: EntityId },
    AttackWall { target: EntityId },
    AttackGround { x: f32, y: f32, single_shot: bool },
    Harvest { deposit: EntityId },
    Mine { obstacle: EntityId },
    Construct { building: EntityId },
    Garrison { bunker: EntityId },
    Ungarrison { bunker: EntityId, all: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOrder {
    pub building: BuildingType,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProduceOrder {
    pub unit: UnitType,
    pub building: EntityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RallyOrder {
    pub building: EntityId,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartResearchOrder {
    pub research: ResearchType,
    pub building: EntityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelResearchOrder {
    pub building: EntityId,
}

/// Toggle the selection's special ability, optionally aimed at a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityOrder {
    pub target: Option<EntityId>,
}

/// One input frame. Any subset of fields may be present; the newest frame
/// per player wins within a tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFrame {
    pub selection: Option<Vec<EntityId>>,
    pub order: Option<UnitOrder>,
    pub build: Option<BuildOrder>,
    pub produce: Option<ProduceOrder>,
    pub stance: Option<Stance>,
    pub rally: Option<RallyOrder>,
    pub start_research: Option<StartResearchOrder>,
    pub cancel_research: Option<CancelResearchOrder>,
    pub ability: Option<AbilityOrder>,
}

// ============================================================================
// SHARED STATE (the only cross-thread surface)
// ============================================================================

/// Latest-wins input frames, written by transport callbacks and drained by
/// the simulation once per tick.
#[derive(Default)]
pub struct InputQueue {
    frames: Mutex<BTreeMap<PlayerId, InputFrame>>,
}

impl InputQueue {
    pub fn submit(&self, player: PlayerId, frame: InputFrame) {
        self.frames.lock().insert(player, frame);
    }

    /// Take all pending frames, leaving the queue empty.
    pub fn drain(&self) -> BTreeMap<PlayerId, InputFrame> {
        std::mem::take(&mut *self.frames.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }
}

#[derive(Clone)]
struct RegisteredChannel {
    channel: Arc<dyn PlayerChannel>,
    spectator: bool,
}

/// Registry of live channels, written by the transport and read by the
/// simulation.
#[derive(Default)]
pub struct ChannelRegistry {
    inner: Mutex<BTreeMap<PlayerId, RegisteredChannel>>,
}

impl ChannelRegistry {
    pub fn register(&self, player: PlayerId, channel: Arc<dyn PlayerChannel>, spectator: bool) {
        self.inner
            .lock()
            .insert(player, RegisteredChannel { channel, spectator });
    }

    pub fn remove(&self, player: PlayerId) {
        self.inner.lock().remove(&player);
    }

    pub fn is_open(&self, player: PlayerId) -> bool {
        self.inner
            .lock()
            .get(&player)
            .is_some_and(|r| r.channel.is_open())
    }

    /// Snapshot the registry for iteration outside the lock.
    pub fn endpoints(&self) -> Vec<(PlayerId, bool, Arc<dyn PlayerChannel>)> {
        self.inner
            .lock()
            .iter()
            .map(|(player, reg)| (*player, reg.spectator, Arc::clone(&reg.channel)))
            .collect()
    }

    /// Drop channels that report closed; returns the players reaped.
    pub fn reap_closed(&self) -> Vec<PlayerId> {
        let mut guard = self.inner.lock();
        let closed: Vec<PlayerId> = guard
            .iter()
            .filter(|(_, reg)| !reg.channel.is_open())
            .map(|(player, _)| *player)
            .collect();
        for player in &closed {
            guard.remove(player);
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct TestChannel {
        open: AtomicBool,
        sent: AtomicUsize,
    }

    impl TestChannel {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                open: AtomicBool::new(true),
                sent: AtomicUsize::new(0),
            })
        }
    }

    impl PlayerChannel for TestChannel {
        fn is_open(&self) -> bool {
            self.open.load(Ordering::SeqCst)
        }
        fn send(&self, _message: &ServerMessage) {
            self.sent.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_input_queue_latest_wins() {
        let queue = InputQueue::default();
        let player = PlayerId(1);
        queue.submit(
            player,
            InputFrame {
                stance: Some(Stance::Passive),
                ..InputFrame::default()
            },
        );
        queue.submit(
            player,
            InputFrame {
                stance: Some(Stance::Aggressive),
                ..InputFrame::default()
            },
        );
        let drained = queue.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[&player].stance, Some(Stance::Aggressive));
        assert!(queue.is_empty(), "drain clears the queue");
    }

    #[test]
    fn test_registry_reaps_closed_channels() {
        let registry = ChannelRegistry::default();
        let a = TestChannel::new();
        let b = TestChannel::new();
        registry.register(PlayerId(1), a.clone(), false);
        registry.register(PlayerId(2), b.clone(), false);

        b.open.store(false, Ordering::SeqCst);
        let reaped = registry.reap_closed();
        assert_eq!(reaped, vec![PlayerId(2)]);
        assert!(registry.is_open(PlayerId(1)));
        assert!(!registry.is_open(PlayerId(2)));
        assert_eq!(registry.endpoints().len(), 1);
    }

    #[test]
    fn test_input_frame_round_trips_as_json() {
        let frame = InputFrame {
            selection: Some(vec![EntityId(4), EntityId(9)]),
            order: Some(UnitOrder::AttackGround {
                x: 100.0,
                y: 200.0,
                single_shot: false,
            }),
            ..InputFrame::default()
        };
        let json = serde_json::to_string(&frame).expect("serialize");
        let back: InputFrame = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, frame);
    }
}
