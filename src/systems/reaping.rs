//! Reaping: remove inactive entities, emit destruction notices, and tear
//! down dependent structures.
//!
//! Buildings are processed first so their dependents (wall segments,
//! garrisons, hosted research) resolve in the same tick.

use crate::entities::{EntityId, PlayerId};
use crate::events::{EventTarget, GameEvent};
use crate::world::World;

pub fn reap(world: &mut World, now: f64) {
    reap_buildings(world);
    crate::systems::walls::maintain(world);
    reap_walls(world);
    reap_units(world, now);
    reap_simple(world);
}

fn reap_buildings(world: &mut World) {
    let dead: Vec<EntityId> = world
        .buildings
        .iter()
        .filter(|(_, b)| !b.core.active)
        .map(|(id, _)| *id)
        .collect();

    for id in dead {
        let Some(building) = world.buildings.get(&id) else {
            continue;
        };
        let owner = building.core.owner;
        let position = building.core.position;
        let garrisoned = building.garrisoned.clone();
        let name = world.catalog.building(building.kind).name;

        world.events.push(GameEvent::warning(
            format!("{name} destroyed"),
            EventTarget::player(owner),
        ));

        // Bunker teardown: garrisoned units re-enter the world at the
        // bunker's position and rejoin physics.
        for (slot, unit_id) in garrisoned.into_iter().enumerate() {
            world.release_garrisoned(unit_id, position, slot);
        }

        // Hosted research dies with the lab, no refund.
        cancel_hosted_research(world, id);

        world.despawn(id);
    }
}

fn cancel_hosted_research(world: &mut World, building: EntityId) {
    let players: Vec<PlayerId> = world.factions.keys().copied().collect();
    for player in players {
        if let Some(faction) = world.factions.get_mut(&player) {
            let before = faction.active_research.len();
            faction.active_research.retain(|slot| slot.building != building);
            if faction.active_research.len() != before {
                log::info!("research cancelled for {player:?}: host building destroyed");
            }
        }
    }
}

fn reap_walls(world: &mut World) {
    let dead: Vec<EntityId> = world
        .wall_segments
        .iter()
        .filter(|(_, s)| !s.core.active)
        .map(|(id, _)| *id)
        .collect();
    for id in dead {
        world.despawn(id);
    }
}

fn reap_units(world: &mut World, now: f64) {
    let dead: Vec<EntityId> = world
        .units
        .iter()
        .filter(|(_, u)| !u.core.active)
        .map(|(id, _)| *id)
        .collect();

    for id in dead {
        let Some(unit) = world.units.get(&id) else {
            continue;
        };
        let owner = unit.core.owner;
        let garrisoned_in = unit.garrisoned_in;
        let name = world.catalog.unit(unit.kind).name;

        world.events.notify_unit_death(owner, name, now);

        // A unit dying inside a bunker vacates its slot.
        if let Some(bunker) = garrisoned_in {
            if let Some(bunker) = world.buildings.get_mut(&bunker) {
                bunker.garrisoned.retain(|u| *u != id);
            }
        }
        world.despawn(id);
    }
}

/// Projectiles, beams, fields, depleted deposits, destroyed obstacles.
fn reap_simple(world: &mut World) {
    let mut dead: Vec<EntityId> = Vec::new();
    dead.extend(
        world
            .projectiles
            .iter()
            .filter(|(_, p)| !p.core.active)
            .map(|(id, _)| *id),
    );
    dead.extend(
        world
            .beams
            .iter()
            .filter(|(_, b)| !b.core.active)
            .map(|(id, _)| *id),
    );
    dead.extend(
        world
            .field_effects
            .iter()
            .filter(|(_, f)| !f.core.active)
            .map(|(id, _)| *id),
    );
    dead.extend(
        world
            .deposits
            .iter()
            .filter(|(_, d)| !d.core.active || d.is_depleted())
            .map(|(id, _)| *id),
    );
    dead.extend(
        world
            .obstacles
            .iter()
            .filter(|(_, o)| !o.core.active)
            .map(|(id, _)| *id),
    );
    for id in dead {
        world.despawn(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Biome, BuildingType, Catalog, UnitType};
    use crate::entities::{PlayerFaction, TeamId};
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
    fn test_dead_units_are_removed_with_notice() {
        let mut world = world_with_player();
        let a = world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::ZERO);
        let b = world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::new(50.0, 0.0));
        world.units.get_mut(&a).unwrap().core.active = false;
        world.units.get_mut(&b).unwrap().core.active = false;

        reap(&mut world, 10.0);
        assert!(world.units.is_empty());
        // Two deaths, one throttled notice.
        assert_eq!(world.events.drain().len(), 1);
    }

    #[test]
    fn test_bunker_death_releases_garrison() {
        let mut world = world_with_player();
        let bunker = world.spawn_building(
            PlayerId(1),
            TeamId(1),
            BuildingType::Bunker,
            Vec2::new(500.0, 500.0),
            true,
        );
        let mut riders = Vec::new();
        for i in 0..3 {
            let unit = world.spawn_unit(
                PlayerId(1),
                TeamId(1),
                UnitType::Trooper,
                Vec2::new(400.0 + i as f32 * 20.0, 400.0),
            );
            // Garrison manually: detach body, record membership.
            let handle = world.units.get_mut(&unit).unwrap().core.body.take().unwrap();
            world.physics.remove_body(handle);
            world.units.get_mut(&unit).unwrap().garrisoned_in = Some(bunker);
            world.buildings.get_mut(&bunker).unwrap().garrisoned.push(unit);
            riders.push(unit);
        }

        world.buildings.get_mut(&bunker).unwrap().core.active = false;
        reap(&mut world, 5.0);

        assert!(world.buildings.is_empty());
        for unit in riders {
            let u = &world.units[&unit];
            assert!(u.garrisoned_in.is_none());
            assert!(u.core.body.is_some(), "released unit rejoins physics");
            assert!(
                u.core.position.distance_to(Vec2::new(500.0, 500.0)) < 60.0,
                "released at the bunker position"
            );
        }
    }

    #[test]
    fn test_post_death_tears_down_segment() {
        let mut world = world_with_player();
        let a = world.spawn_building(
            PlayerId(1),
            TeamId(1),
            BuildingType::WallPost,
            Vec2::new(1000.0, 1000.0),
            true,
        );
        let b = world.spawn_building(
            PlayerId(1),
            TeamId(1),
            BuildingType::WallPost,
            Vec2::new(1100.0, 1000.0),
            true,
        );
        let post = world.buildings[&b].clone();
        crate::systems::walls::link_post(&mut world, &post);
        assert_eq!(world.wall_segments.len(), 1);

        world.buildings.get_mut(&a).unwrap().core.active = false;
        reap(&mut world, 5.0);
        assert!(world.wall_segments.is_empty(), "segment reaped with its post");
    }

    #[test]
    fn test_depleted_deposits_are_removed() {
        let mut world = world_with_player();
        let deposit = world.spawn_deposit(
            Vec2::new(600.0, 500.0),
            crate::catalog::ResourceKind::Ore,
            100.0,
        );
        world.deposits.get_mut(&deposit).unwrap().extract(100.0);
        reap(&mut world, 5.0);
        assert!(world.deposits.is_empty());
    }
}
