//! Research progression and modifier application.

use crate::catalog::ResearchType;
use crate::entities::PlayerId;
use crate::events::{EventTarget, GameEvent};
use crate::world::World;

/// Advance every player's active research slots by `dt`. Slots whose host
/// lab died are cancelled without refund.
pub fn update_research(world: &mut World, dt: f32) {
    let players: Vec<PlayerId> = world.factions.keys().copied().collect();
    for player in players {
        let catalog = std::sync::Arc::clone(&world.catalog);

        let lab_ok: Vec<bool> = match world.factions.get(&player) {
            Some(faction) => faction
                .active_research
                .iter()
                .map(|slot| {
                    world
                        .buildings
                        .get(&slot.building)
                        .map(|b| b.is_operational())
                        .unwrap_or(false)
                })
                .collect(),
            None => continue,
        };

        let mut finished: Vec<ResearchType> = Vec::new();
        if let Some(faction) = world.factions.get_mut(&player) {
            let slots: Vec<_> = faction.active_research.drain(..).collect();
            for (slot_ok, mut slot) in lab_ok.into_iter().zip(slots) {
                if !slot_ok {
                    log::info!(
                        "research {:?} cancelled for {player:?}: lab destroyed",
                        slot.research
                    );
                    continue;
                }
                slot.progress += dt;
                if slot.progress >= catalog.research(slot.research).time {
                    finished.push(slot.research);
                } else {
                    faction.active_research.push(slot);
                }
            }
        }

        for research in finished {
            complete_research(world, player, research);
        }
    }
}

/// Apply a completed research project to the player: record it, adjust
/// every existing owned unit, and grant tier / slot bonuses.
///
/// Running this twice for the same project is a bug in the caller; the
/// completed-set guard makes the second call a logged no-op so the buff is
/// never doubled.
pub fn complete_research(world: &mut World, player: PlayerId, research: ResearchType) {
    let def = world.catalog.research(research).clone();

    {
        let Some(faction) = world.factions.get_mut(&player) else {
            return;
        };
        if !faction.completed_research.insert(research) {
            log::error!("duplicate completion of {research:?} for {player:?} ignored");
            return;
        }
        if let Some(tier) = def.tier_grant {
            faction.tech_tier = faction.tech_tier.max(tier);
        }
    }

    // Adjust every existing owned unit in place. Health scales
    // proportionally with its maximum.
    let modifier = def.modifier;
    for unit in world.units.values_mut() {
        if unit.core.owner != player || !unit.core.active {
            continue;
        }
        unit.core.max_health *= modifier.health_mult;
        unit.core.health *= modifier.health_mult;
        unit.damage *= modifier.damage_mult;
        unit.speed *= modifier.speed_mult;
        unit.vision_range += modifier.vision_add;
        if unit.max_carried > 0.0 {
            unit.max_carried += modifier.carry_add;
        }
    }

    world.events.push(GameEvent::info(
        format!("Research complete: {}", def.name),
        EventTarget::player(player),
    ));
    log::info!("player {player:?} completed {research:?}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Biome, BuildingType, Catalog, UnitType};
    use crate::entities::{PlayerFaction, ResearchSlot, TeamId};
    use crate::math::Vec2;
    use std::sync::Arc;

    fn world_with_player() -> World {
        let catalog = Arc::new(Catalog::standard());
        let mut world = World::new(Arc::clone(&catalog), 4096.0, 4096.0, Biome::Verdant);
        world.factions.insert(
            PlayerId(1),
            PlayerFaction::join(
                PlayerId(1),
                TeamId(1),
                "p1".to_string(),
                "FORGE".to_string(),
                &catalog,
            ),
        );
        world
    }

    #[test]
    fn test_completion_buffs_existing_units() {
        let mut world = world_with_player();
        let unit = world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::ZERO);
        let base_health = world.units[&unit].core.max_health;
        // Wound the unit to check proportional scaling.
        world.units.get_mut(&unit).unwrap().core.health = base_health * 0.5;

        complete_research(&mut world, PlayerId(1), ResearchType::HardenedPlating);

        let u = &world.units[&unit];
        assert!((u.core.max_health - base_health * 1.2).abs() < 1e-3);
        assert!(
            (u.core.health - base_health * 0.5 * 1.2).abs() < 1e-3,
            "current health scales proportionally"
        );
    }

    #[test]
    fn test_duplicate_completion_is_a_no_op() {
        let mut world = world_with_player();
        let unit = world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::ZERO);

        complete_research(&mut world, PlayerId(1), ResearchType::TungstenRounds);
        let damage_after_first = world.units[&unit].damage;
        complete_research(&mut world, PlayerId(1), ResearchType::TungstenRounds);
        assert!(
            (world.units[&unit].damage - damage_after_first).abs() < 1e-6,
            "running the completion handler twice must not double the buff"
        );
    }

    #[test]
    fn test_slots_progress_and_finish() {
        let mut world = world_with_player();
        let lab = world.spawn_building(
            PlayerId(1),
            TeamId(1),
            BuildingType::ResearchLab,
            Vec2::new(500.0, 500.0),
            true,
        );
        world
            .faction_mut(PlayerId(1))
            .unwrap()
            .active_research
            .push(ResearchSlot {
                research: ResearchType::FieldOptics,
                building: lab,
                progress: 29.95,
            });

        update_research(&mut world, 0.1);
        let faction = world.faction(PlayerId(1)).unwrap();
        assert!(faction.active_research.is_empty());
        assert!(faction
            .completed_research
            .contains(&ResearchType::FieldOptics));
    }

    #[test]
    fn test_tier_grant() {
        let mut world = world_with_player();
        complete_research(&mut world, PlayerId(1), ResearchType::FabricationTier2);
        assert_eq!(world.faction(PlayerId(1)).unwrap().tech_tier, 2);
    }
}
