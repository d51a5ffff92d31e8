//! Projectile and beam advancement: range exhaustion, end-of-flight
//! explosions, beam decay.

use crate::catalog::{BulletEffect, FieldEffectKind};
use crate::entities::EntityId;
use crate::world::World;

/// Explosion field radius per unit of ordinance size.
pub const EXPLOSION_RADIUS_PER_SIZE: f32 = 15.0;
/// Share of projectile damage carried by its end-of-range explosion.
pub const EXPLOSION_DAMAGE_SHARE: f32 = 0.5;

pub fn update_ordinance(world: &mut World, dt: f32) {
    let ids: Vec<EntityId> = world.projectiles.keys().copied().collect();
    for id in ids {
        let Some(mut projectile) = world.projectiles.remove(&id) else {
            continue;
        };
        if projectile.core.active {
            projectile.range_remaining -= projectile.velocity.length() * dt;

            let out_of_world = projectile.core.position.x < 0.0
                || projectile.core.position.y < 0.0
                || projectile.core.position.x > world.width
                || projectile.core.position.y > world.height;

            if projectile.range_remaining <= 0.0 || out_of_world {
                projectile.core.active = false;
                // Explosive kinds detonate where the range ran out.
                let effects = &world.catalog.ordinance(projectile.kind).effects;
                if effects.contains(&BulletEffect::Explosive) && !out_of_world {
                    world.spawn_field_effect(
                        projectile.core.owner,
                        projectile.core.team,
                        FieldEffectKind::Explosion,
                        projectile.core.position,
                        projectile.size * EXPLOSION_RADIUS_PER_SIZE,
                        projectile.damage * EXPLOSION_DAMAGE_SHARE,
                        None,
                    );
                }
            }
        }
        world.projectiles.insert(id, projectile);
    }

    for beam in world.beams.values_mut() {
        if beam.core.active {
            beam.remaining -= dt;
            if beam.remaining <= 0.0 {
                beam.core.active = false;
            }
        }
    }
}
