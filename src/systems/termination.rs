//! Win/draw detection and eliminated-team notifications.

use std::collections::BTreeSet;

use crate::catalog::BuildingType;
use crate::entities::{PlayerId, TeamId};
use crate::events::{EventTarget, GameEvent};
use crate::world::World;

/// Seconds after game start before win conditions are evaluated.
pub const GRACE_SECS: f64 = 5.0;

/// Final result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// `None` means a draw.
    pub winning_team: Option<TeamId>,
}

/// Evaluate the win/draw condition. A player is defeated when disconnected
/// or when they no longer own an active headquarters; a team is eliminated
/// when all of its players are defeated.
pub fn evaluate(world: &mut World, elapsed: f64) -> Option<Outcome> {
    if elapsed < GRACE_SECS {
        return None;
    }

    let players: Vec<PlayerId> = world.factions.keys().copied().collect();

    // Which teams were alive before this evaluation, to detect transitions.
    let alive_before: BTreeSet<TeamId> = world
        .factions
        .values()
        .filter(|f| !f.defeated)
        .map(|f| f.team)
        .collect();

    for player in players {
        let has_hq = world.buildings.values().any(|b| {
            b.core.owner == player && b.core.active && b.kind == BuildingType::Headquarters
        });
        let Some(faction) = world.factions.get_mut(&player) else {
            continue;
        };
        let defeated = !faction.connected || !has_hq;
        if defeated && !faction.defeated {
            faction.defeated = true;
            let name = faction.name.clone();
            world.events.push(GameEvent::system(
                format!("{name} has been eliminated"),
                EventTarget::All,
            ));
            log::info!("player {player:?} ({name}) eliminated");
        }
    }

    let alive_after: BTreeSet<TeamId> = world
        .factions
        .values()
        .filter(|f| !f.defeated)
        .map(|f| f.team)
        .collect();

    for team in alive_before.difference(&alive_after) {
        world.events.push(GameEvent::system(
            format!("Team {} has been eliminated", team.0),
            EventTarget::All,
        ));
    }

    if alive_after.len() > 1 {
        return None;
    }

    let outcome = Outcome {
        winning_team: alive_after.first().copied(),
    };
    match outcome.winning_team {
        Some(team) => {
            world.events.push(
                GameEvent::system(format!("Team {} wins!", team.0), EventTarget::All)
                    .lasting_ms(10_000),
            );
            log::info!("game over: team {} wins", team.0);
        }
        None => {
            world.events.push(
                GameEvent::system("Draw: all teams eliminated", EventTarget::All)
                    .lasting_ms(10_000),
            );
            log::info!("game over: draw");
        }
    }
    Some(outcome)
}
