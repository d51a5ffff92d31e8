//! Collision mapping: physics contacts become logical combat events.
//!
//! Contacts are buffered by the physics facade during the step and applied
//! here afterwards, so the world is never mutated mid-step. Friendly fire
//! and elevation mismatches are filtered before any damage lands.

use crate::catalog::{BulletEffect, Elevation, FieldEffectKind};
use crate::entities::{EntityId, EntityKind};
use crate::math::Vec2;
use crate::physics::ContactEvent;
use crate::world::World;

/// Flame splash radius on impact.
const FLAME_FIELD_RADIUS: f32 = 30.0;
/// Poison splash radius on impact.
const POISON_FIELD_RADIUS: f32 = 35.0;
/// Fragmentation burst radius on impact.
const FRAG_FIELD_RADIUS: f32 = 40.0;
/// Freeze splash radius on impact.
const FREEZE_FIELD_RADIUS: f32 = 35.0;
/// Impact explosion radius per unit of ordinance size.
const IMPACT_EXPLOSION_PER_SIZE: f32 = 15.0;

/// Apply all buffered contacts from one physics step.
pub fn process_contacts(world: &mut World, contacts: Vec<ContactEvent>) {
    for contact in contacts {
        if !contact.started {
            continue;
        }
        let pair = classify(world, contact.a, contact.b);
        if let Some((projectile, target)) = pair {
            projectile_hit(world, projectile, target);
        }
    }
}

/// Order a contact pair into (projectile, damageable target), if it is one.
fn classify(world: &World, a: EntityId, b: EntityId) -> Option<(EntityId, EntityId)> {
    let ka = world.kind_of(a)?;
    let kb = world.kind_of(b)?;
    let damageable = |k: EntityKind| {
        matches!(
            k,
            EntityKind::Unit | EntityKind::Building | EntityKind::WallSegment | EntityKind::Obstacle
        )
    };
    match (ka, kb) {
        (EntityKind::Projectile, k) if damageable(k) => Some((a, b)),
        (k, EntityKind::Projectile) if damageable(k) => Some((b, a)),
        _ => None,
    }
}

fn projectile_hit(world: &mut World, projectile_id: EntityId, target_id: EntityId) {
    let Some(projectile) = world.projectiles.get(&projectile_id) else {
        return;
    };
    if !projectile.core.active {
        return;
    }
    let Some(target_core) = world.core_of(target_id) else {
        return;
    };
    if !target_core.active {
        return;
    }

    // Friendly fire is suppressed at collision time.
    if target_core.team == projectile.core.team {
        return;
    }

    // Elevation targeting: the ordinance must be able to hit this level.
    let target_elevation = match world.kind_of(target_id) {
        Some(EntityKind::Unit) => world
            .units
            .get(&target_id)
            .map(|u| u.elevation)
            .unwrap_or(Elevation::Ground),
        _ => Elevation::Ground,
    };
    let ordinance = world.catalog.ordinance(projectile.kind).clone();
    if !ordinance.targets.contains(&target_elevation) {
        return;
    }

    let piercing = ordinance.effects.contains(&BulletEffect::Piercing);
    let damage = projectile.damage;
    let size = projectile.size;
    let owner = projectile.core.owner;
    let team = projectile.core.team;
    let impact = projectile.core.position;

    {
        let Some(projectile) = world.projectiles.get_mut(&projectile_id) else {
            return;
        };
        if piercing {
            // A piercing round hits each distinct target at most once and
            // keeps flying.
            if !projectile.mark_affected(target_id) {
                return;
            }
        } else {
            projectile.mark_affected(target_id);
            projectile.core.active = false;
        }
    }

    world.apply_damage(target_id, damage);
    apply_impact_effects(world, &ordinance.effects, owner, team, impact, damage, size);
}

/// Secondary impact effects: DoT splashes, explosions, fragmentation.
fn apply_impact_effects(
    world: &mut World,
    effects: &[BulletEffect],
    owner: crate::entities::PlayerId,
    team: crate::entities::TeamId,
    impact: Vec2,
    damage: f32,
    size: f32,
) {
    for effect in effects {
        match effect {
            BulletEffect::Explosive => {
                world.spawn_field_effect(
                    owner,
                    team,
                    FieldEffectKind::Explosion,
                    impact,
                    size * IMPACT_EXPLOSION_PER_SIZE,
                    damage * 0.5,
                    None,
                );
            }
            BulletEffect::Flame => {
                world.spawn_field_effect(
                    owner,
                    team,
                    FieldEffectKind::Fire,
                    impact,
                    FLAME_FIELD_RADIUS,
                    damage * 0.25,
                    None,
                );
            }
            BulletEffect::Poison => {
                world.spawn_field_effect(
                    owner,
                    team,
                    FieldEffectKind::Poison,
                    impact,
                    POISON_FIELD_RADIUS,
                    damage * 0.2,
                    None,
                );
            }
            BulletEffect::Fragmentation => {
                world.spawn_field_effect(
                    owner,
                    team,
                    FieldEffectKind::Fragmentation,
                    impact,
                    FRAG_FIELD_RADIUS,
                    damage * 0.3,
                    None,
                );
            }
            BulletEffect::Freeze => {
                world.spawn_field_effect(
                    owner,
                    team,
                    FieldEffectKind::Freeze,
                    impact,
                    FREEZE_FIELD_RADIUS,
                    0.0,
                    None,
                );
            }
            BulletEffect::Electric => {
                world.spawn_field_effect(
                    owner,
                    team,
                    FieldEffectKind::Electric,
                    impact,
                    crate::systems::weapons::ELECTRIC_FIELD_RADIUS,
                    damage * crate::systems::weapons::ELECTRIC_FIELD_DAMAGE_SHARE,
                    None,
                );
            }
            BulletEffect::Piercing => {}
        }
    }
}
