//! Field-effect lifecycle: expiry, shrink, and per-kind area behavior.
//!
//! Per-tick movement modifiers (`move_scale`, `frozen`) are reset here and
//! re-applied from live fields, so an expired field stops affecting units
//! the moment it dies.

use crate::catalog::FieldEffectKind;
use crate::entities::{EntityId, EntityKind, FieldEffect};
use crate::math::Vec2;
use crate::world::World;

/// Slow fields scale hostile movement by this factor.
pub const SLOW_FACTOR: f32 = 0.5;
/// Speed-boost fields scale friendly movement by this factor.
pub const BOOST_FACTOR: f32 = 1.5;
/// Gravity wells pull with this impulse per second.
pub const GRAVITY_PULL: f32 = 400.0;
/// A proximity mine detonates into an explosion of this radius multiple.
pub const MINE_BLAST_RADIUS: f32 = 45.0;

pub fn update_fields(world: &mut World, dt: f32) {
    // Reset per-tick modifiers; live fields reassert them below.
    for unit in world.units.values_mut() {
        unit.move_scale = 1.0;
        unit.frozen = false;
    }

    let ids: Vec<EntityId> = world.field_effects.keys().copied().collect();
    for id in ids {
        let Some(mut field) = world.field_effects.remove(&id) else {
            continue;
        };
        if field.core.active {
            field.remaining -= dt;
            if field.remaining <= 0.0 {
                field.core.active = false;
            } else {
                if field.shrinks() {
                    // Shrink toward half size over the lifetime.
                    field.radius = field.initial_radius * (0.5 + 0.5 * field.life_fraction());
                }
                apply_field(&mut field, world, dt);
            }
        }
        world.field_effects.insert(id, field);
    }
}

/// Entities (units and, for some kinds, buildings) inside the field.
fn occupants(field: &FieldEffect, world: &World, kind: EntityKind) -> Vec<EntityId> {
    world
        .spatial
        .query_radius(field.core.position, field.radius + 20.0)
        .into_iter()
        .filter(|e| e.kind == kind)
        .filter(|e| {
            e.position.distance_to(field.core.position) <= field.radius + e.radius
        })
        .map(|e| e.id)
        .collect()
}

fn apply_field(field: &mut FieldEffect, world: &mut World, dt: f32) {
    let team = field.core.team;
    match field.kind {
        // Instantaneous damage kinds: full amount, once per entity.
        FieldEffectKind::Explosion | FieldEffectKind::Fragmentation => {
            for id in occupants(field, world, EntityKind::Unit) {
                if hostile(world, id, team) && field.affected.insert(id) {
                    world.apply_damage(id, field.dps);
                }
            }
            for id in occupants(field, world, EntityKind::Building) {
                if hostile(world, id, team) && field.affected.insert(id) {
                    world.apply_damage(id, field.dps);
                }
            }
        }
        // Continuous damage over time to hostiles.
        FieldEffectKind::Fire | FieldEffectKind::Electric | FieldEffectKind::Poison => {
            for id in occupants(field, world, EntityKind::Unit) {
                if hostile(world, id, team) {
                    world.apply_damage(id, field.dps * dt);
                }
            }
        }
        FieldEffectKind::Earthquake => {
            // Shakes structures only.
            for id in occupants(field, world, EntityKind::Building) {
                if hostile(world, id, team) {
                    world.apply_damage(id, field.dps * dt);
                }
            }
        }
        FieldEffectKind::HealZone => {
            for id in occupants(field, world, EntityKind::Unit) {
                if !hostile(world, id, team) {
                    world.heal_entity(id, field.dps * dt);
                }
            }
        }
        FieldEffectKind::SlowField => {
            for id in occupants(field, world, EntityKind::Unit) {
                if hostile(world, id, team) {
                    if let Some(unit) = world.units.get_mut(&id) {
                        unit.move_scale *= SLOW_FACTOR;
                    }
                }
            }
        }
        FieldEffectKind::SpeedBoost => {
            for id in occupants(field, world, EntityKind::Unit) {
                if !hostile(world, id, team) {
                    if let Some(unit) = world.units.get_mut(&id) {
                        unit.move_scale *= BOOST_FACTOR;
                    }
                }
            }
        }
        FieldEffectKind::Freeze => {
            for id in occupants(field, world, EntityKind::Unit) {
                if hostile(world, id, team) {
                    let handle = world.units.get_mut(&id).and_then(|unit| {
                        unit.frozen = true;
                        unit.core.body
                    });
                    if let Some(handle) = handle {
                        world.physics.set_velocity(handle, Vec2::ZERO);
                    }
                }
            }
        }
        FieldEffectKind::GravityWell => {
            let center = field.core.position;
            for id in occupants(field, world, EntityKind::Unit) {
                if !hostile(world, id, team) {
                    continue;
                }
                let Some(unit) = world.units.get(&id) else { continue };
                let pull = (center - unit.core.position).normalized() * (GRAVITY_PULL * dt);
                if let Some(handle) = unit.core.body {
                    world.physics.apply_impulse(handle, pull);
                }
            }
        }
        FieldEffectKind::ShieldBarrier => {
            // Absorbs hostile projectiles, like the generator shield.
            let center = field.core.position;
            let radius = field.radius;
            for projectile in world.projectiles.values_mut() {
                if projectile.core.active
                    && projectile.core.team != team
                    && projectile.core.position.distance_to(center) <= radius
                {
                    projectile.core.active = false;
                }
            }
        }
        FieldEffectKind::ProximityMine => {
            let tripped = occupants(field, world, EntityKind::Unit)
                .into_iter()
                .any(|id| hostile(world, id, team));
            if tripped {
                field.core.active = false;
                world.spawn_field_effect(
                    field.core.owner,
                    team,
                    FieldEffectKind::Explosion,
                    field.core.position,
                    MINE_BLAST_RADIUS,
                    field.dps,
                    None,
                );
            }
        }
        FieldEffectKind::WarningZone => {}
    }
}

fn hostile(world: &World, id: EntityId, team: crate::entities::TeamId) -> bool {
    world.core_of(id).is_some_and(|c| c.team != team)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Biome, Catalog, UnitType};
    use crate::entities::{PlayerFaction, PlayerId, TeamId};
    use std::sync::Arc;

    fn world_with_players() -> World {
        let catalog = Arc::new(Catalog::standard());
        let mut world = World::new(Arc::clone(&catalog), 4096.0, 4096.0, Biome::Ashlands);
        for (player, team) in [(1u32, 1u8), (2, 2)] {
            world.factions.insert(
                PlayerId(player),
                PlayerFaction::join(
                    PlayerId(player),
                    TeamId(team),
                    format!("p{player}"),
                    "FORGE".to_string(),
                    &catalog,
                ),
            );
        }
        world
    }

    #[test]
    fn test_explosion_applies_once_per_entity() {
        let mut world = world_with_players();
        let victim = world.spawn_unit(
            PlayerId(2),
            TeamId(2),
            UnitType::Trooper,
            Vec2::new(10.0, 0.0),
        );
        world.rebuild_spatial();
        world.spawn_field_effect(
            PlayerId(1),
            TeamId(1),
            FieldEffectKind::Explosion,
            Vec2::ZERO,
            30.0,
            20.0,
            Some(0.5),
        );

        update_fields(&mut world, 0.02);
        let after_first = world.units[&victim].core.health;
        update_fields(&mut world, 0.02);
        let after_second = world.units[&victim].core.health;

        assert!((100.0 - after_first - 20.0).abs() < 1e-3, "full hit once");
        assert_eq!(after_first, after_second, "instantaneous kind applies once");
    }

    #[test]
    fn test_fire_ticks_damage_over_time() {
        let mut world = world_with_players();
        let victim = world.spawn_unit(
            PlayerId(2),
            TeamId(2),
            UnitType::Trooper,
            Vec2::new(5.0, 0.0),
        );
        world.rebuild_spatial();
        world.spawn_field_effect(
            PlayerId(1),
            TeamId(1),
            FieldEffectKind::Fire,
            Vec2::ZERO,
            40.0,
            10.0,
            None,
        );

        for _ in 0..50 {
            update_fields(&mut world, 0.02);
        }
        let health = world.units[&victim].core.health;
        assert!(
            (100.0 - health - 10.0).abs() < 0.5,
            "1 s of 10 dps, got {}",
            100.0 - health
        );
    }

    #[test]
    fn test_fields_expire() {
        let mut world = world_with_players();
        let field = world.spawn_field_effect(
            PlayerId(1),
            TeamId(1),
            FieldEffectKind::WarningZone,
            Vec2::ZERO,
            30.0,
            0.0,
            Some(0.1),
        );
        for _ in 0..10 {
            update_fields(&mut world, 0.02);
        }
        assert!(!world.field_effects[&field].core.active);
    }

    #[test]
    fn test_slow_and_boost_stack_on_move_scale() {
        let mut world = world_with_players();
        let friendly = world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::ZERO);
        let enemy = world.spawn_unit(
            PlayerId(2),
            TeamId(2),
            UnitType::Trooper,
            Vec2::new(10.0, 0.0),
        );
        world.rebuild_spatial();
        world.spawn_field_effect(
            PlayerId(1),
            TeamId(1),
            FieldEffectKind::SlowField,
            Vec2::ZERO,
            60.0,
            0.0,
            None,
        );
        world.spawn_field_effect(
            PlayerId(1),
            TeamId(1),
            FieldEffectKind::SpeedBoost,
            Vec2::ZERO,
            60.0,
            0.0,
            None,
        );

        update_fields(&mut world, 0.02);
        assert!((world.units[&enemy].move_scale - SLOW_FACTOR).abs() < 1e-6);
        assert!((world.units[&friendly].move_scale - BOOST_FACTOR).abs() < 1e-6);
    }

    #[test]
    fn test_proximity_mine_detonates() {
        let mut world = world_with_players();
        let mine = world.spawn_field_effect(
            PlayerId(1),
            TeamId(1),
            FieldEffectKind::ProximityMine,
            Vec2::ZERO,
            25.0,
            30.0,
            None,
        );
        // No hostiles yet: mine stays armed.
        world.rebuild_spatial();
        update_fields(&mut world, 0.02);
        assert!(world.field_effects[&mine].core.active);

        world.spawn_unit(PlayerId(2), TeamId(2), UnitType::Trooper, Vec2::new(15.0, 0.0));
        world.rebuild_spatial();
        update_fields(&mut world, 0.02);
        assert!(!world.field_effects[&mine].core.active, "mine tripped");
        assert!(
            world
                .field_effects
                .values()
                .any(|f| f.kind == FieldEffectKind::Explosion && f.core.active),
            "explosion spawned at the mine"
        );
    }
}
