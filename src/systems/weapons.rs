//! Weapon firing: predictive aiming, projectile launch, beam raycasts.

use crate::catalog::{Elevation, OrdinanceDef, WeaponDef};
use crate::commands::FireTarget;
use crate::entities::{EntityId, EntityKind, PlayerId, TeamId, Unit};
use crate::math::{intercept_time, Vec2};
use crate::world::World;

/// Projectiles faster than this are treated as hitscan: aim at the current
/// position, no intercept solve.
pub const HITSCAN_SPEED: f32 = 1000.0;
/// Intercept solutions are clamped to this many seconds ahead.
pub const INTERCEPT_CLAMP_SECS: f32 = 3.0;
/// Projectiles carry range beyond the weapon's engagement ring.
pub const PROJECTILE_RANGE_FACTOR: f32 = 1.25;
/// Electric beams spawn a field with this share of the beam damage.
pub const ELECTRIC_FIELD_DAMAGE_SHARE: f32 = 0.3;
/// Electric field radius at the beam hit point.
pub const ELECTRIC_FIELD_RADIUS: f32 = 40.0;

/// Fire a unit's weapon at the target if the cooldown and range allow.
/// Firing stops the unit for the tick and breaks cloak. Returns true when a
/// shot actually left the barrel.
pub fn try_fire(unit: &mut Unit, world: &mut World, target: FireTarget) -> bool {
    if !unit.can_attack() || unit.weapon_cooldown > 0.0 {
        return false;
    }
    let def = world.catalog.unit(unit.kind);
    let Some(weapon) = def.weapon.clone() else {
        return false;
    };

    let shooter = ShooterInfo {
        id: Some(unit.core.id),
        owner: unit.core.owner,
        team: unit.core.team,
        position: unit.core.position,
        muzzle_offset: unit.radius + 2.0,
        damage: unit.damage,
        range: unit.attack_range,
        elevation: unit.elevation,
    };
    let Some(aim) = resolve_fire(world, &shooter, &weapon, target) else {
        return false;
    };

    unit.core.rotation = (aim - unit.core.position).angle();
    unit.turret_rotation = unit.core.rotation;
    unit.weapon_cooldown = 1.0 / unit.attack_rate;
    unit.break_cloak();
    true
}

/// Static shooter description shared by units and building turrets.
pub struct ShooterInfo {
    pub id: Option<EntityId>,
    pub owner: PlayerId,
    pub team: TeamId,
    pub position: Vec2,
    pub muzzle_offset: f32,
    pub damage: f32,
    pub range: f32,
    pub elevation: Elevation,
}

/// Resolve and execute one shot. Returns the aim point used, or `None` when
/// the shot was invalid (dead target, wrong elevation, out of range).
pub fn resolve_fire(
    world: &mut World,
    shooter: &ShooterInfo,
    weapon: &WeaponDef,
    target: FireTarget,
) -> Option<Vec2> {
    let ordinance = world.catalog.ordinance(weapon.ordinance).clone();

    let aim = match target {
        FireTarget::Ground(position) => position,
        FireTarget::Entity(id) => {
            let core = world.core_of(id)?;
            if !core.active || core.team == shooter.team {
                return None;
            }
            let elevation = match world.kind_of(id)? {
                EntityKind::Unit => world.units.get(&id)?.elevation,
                _ => Elevation::Ground,
            };
            if !ordinance.targets.contains(&elevation) {
                return None;
            }
            let pad = world.radius_of(id);
            let dist = shooter.position.distance_to(core.position);
            if dist > (shooter.range + pad) * 1.1 {
                return None;
            }
            let velocity = core
                .body
                .map(|h| world.physics.velocity(h))
                .unwrap_or(Vec2::ZERO);
            predict_aim_point(shooter.position, core.position, velocity, ordinance.speed)
        }
    };

    let dir = (aim - shooter.position).normalized();
    if dir == Vec2::ZERO {
        return None;
    }
    let muzzle = shooter.position + dir * shooter.muzzle_offset;

    if ordinance.beam {
        fire_beam(world, shooter, weapon, &ordinance, muzzle, dir);
    } else {
        let range = match target {
            // Ground fire detonates at the aim point.
            FireTarget::Ground(_) => shooter.position.distance_to(aim),
            FireTarget::Entity(_) => shooter.range * PROJECTILE_RANGE_FACTOR,
        };
        world.spawn_projectile(
            shooter.owner,
            shooter.team,
            muzzle,
            dir * ordinance.speed,
            weapon.ordinance,
            shooter.damage,
            range,
            shooter.elevation,
        );
    }
    Some(aim)
}

/// Predictive intercept: aim where the target will be, clamped to 3 s out.
/// Hitscan-fast rounds and unreachable targets aim at the current position.
pub fn predict_aim_point(
    shooter: Vec2,
    target_pos: Vec2,
    target_vel: Vec2,
    proj_speed: f32,
) -> Vec2 {
    if proj_speed > HITSCAN_SPEED || target_vel.length() < 1e-3 {
        return target_pos;
    }
    match intercept_time(target_pos - shooter, target_vel, proj_speed) {
        Some(t) => target_pos + target_vel * t.min(INTERCEPT_CLAMP_SECS),
        None => target_pos,
    }
}

fn fire_beam(
    world: &mut World,
    shooter: &ShooterInfo,
    weapon: &WeaponDef,
    ordinance: &OrdinanceDef,
    muzzle: Vec2,
    dir: Vec2,
) {
    let team = shooter.team;
    let resolved = world.cast_beam(muzzle, dir, shooter.range, team, shooter.id);

    let end = match &resolved {
        Some(h) => h.point,
        None => muzzle + dir * shooter.range,
    };
    world.spawn_beam(
        shooter.owner,
        team,
        weapon.ordinance,
        shooter.damage,
        muzzle,
        end,
    );

    if let Some(hit) = resolved {
        world.apply_damage(hit.entity, shooter.damage);
        if ordinance
            .effects
            .contains(&crate::catalog::BulletEffect::Electric)
        {
            world.spawn_field_effect(
                shooter.owner,
                team,
                crate::catalog::FieldEffectKind::Electric,
                hit.point,
                ELECTRIC_FIELD_RADIUS,
                shooter.damage * ELECTRIC_FIELD_DAMAGE_SHARE,
                None,
            );
        }
    }
}
