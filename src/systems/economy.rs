//! The economy sampler: upkeep totals, power balance, low-power transitions.
//!
//! Runs every 50th tick (1 s) so the upkeep and power invariants are never
//! more than one sampler interval stale.

use crate::catalog::BuildingType;
use crate::entities::PlayerId;
use crate::events::{EventTarget, GameEvent};
use crate::world::World;

/// Sampler cadence in ticks (1 s at the 20 ms tick).
pub const SAMPLE_INTERVAL_TICKS: u64 = 50;

/// Recompute per-player upkeep and power from live entities.
pub fn sample_economy(world: &mut World) {
    let players: Vec<PlayerId> = world.factions.keys().copied().collect();
    for player in players {
        let upkeep: f32 = world
            .units
            .values()
            .filter(|u| u.core.active && u.core.owner == player)
            .map(|u| u.upkeep_cost)
            .sum();

        let mut generated = 0.0;
        let mut consumed = 0.0;
        let mut upkeep_bonus = 0.0;
        for building in world.buildings.values() {
            if building.core.owner != player || !building.is_operational() {
                continue;
            }
            let def = world.catalog.building(building.kind);
            if def.power_value >= 0.0 {
                generated += def.power_value;
            } else {
                consumed += -def.power_value;
            }
            if building.kind == BuildingType::CommandCitadel {
                upkeep_bonus += def.upkeep_bonus;
            }
        }

        let base_cap = world
            .catalog
            .faction(&world.factions[&player].faction_tag)
            .base_upkeep_cap;

        let Some(faction) = world.factions.get_mut(&player) else {
            continue;
        };
        if faction.current_upkeep < 0.0 {
            // Invariant violation: log, notify, re-establish.
            log::error!(
                "negative upkeep {} for player {:?}, resampling",
                faction.current_upkeep,
                player
            );
            world.events.push(GameEvent::error(
                "Upkeep accounting corrected",
                EventTarget::player(player),
            ));
        }
        faction.current_upkeep = upkeep;
        faction.max_upkeep = base_cap + upkeep_bonus;
        faction.power_generated = generated;
        faction.power_consumed = consumed;

        let low = consumed > generated;
        if low != faction.has_low_power {
            faction.has_low_power = low;
            if low {
                world.events.push(GameEvent::warning(
                    "LOW POWER",
                    EventTarget::player(player),
                ));
                log::info!("player {player:?} entered low power");
            } else {
                world.events.push(GameEvent::info(
                    "Power restored",
                    EventTarget::player(player),
                ));
                log::info!("player {player:?} power restored");
            }
        }
    }
}
