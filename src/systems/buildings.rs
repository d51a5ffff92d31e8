//! Per-building tick: construction completion, production queues, turret
//! behavior, shield projection and bank interest.

use crate::catalog::Elevation;
use crate::commands::{FireTarget, MoveState, UnitCommand};
use crate::entities::{Building, EntityId, EntityKind};
use crate::events::{EventTarget, GameEvent};
use crate::math::Vec2;
use crate::systems::{walls, weapons};
use crate::world::World;

/// Shield generator projection radius.
pub const SHIELD_RADIUS: f32 = 200.0;
/// Seconds between bank interest payouts.
pub const BANK_INTEREST_SECS: f32 = 30.0;
/// Compound interest rate per payout.
pub const BANK_INTEREST_RATE: f32 = 0.02;
/// Clearance between a producer's footprint and the units it spawns.
const SPAWN_PAD: f32 = 5.0;

pub fn update_buildings(world: &mut World, dt: f32) {
    let ids: Vec<EntityId> = world.buildings.keys().copied().collect();
    for id in ids {
        let Some(mut building) = world.buildings.remove(&id) else {
            continue;
        };
        if building.core.active {
            tick_building(&mut building, world, dt);
        }
        world.buildings.insert(id, building);
    }
}

fn tick_building(building: &mut Building, world: &mut World, dt: f32) {
    if building.under_construction {
        // Workers push `construction_progress`; completion resolves here so
        // posts finishing in the same tick still link exactly once.
        if building.construction_progress >= building.core.max_health {
            building.under_construction = false;
            building.core.health = building.core.max_health;
            let def = world.catalog.building(building.kind);
            world.events.push(GameEvent::info(
                format!("{} construction complete", def.name),
                EventTarget::player(building.core.owner),
            ));
            walls::link_post(world, building);
        }
        return;
    }

    let low_power = world
        .faction(building.core.owner)
        .map(|f| f.has_low_power)
        .unwrap_or(false);

    tick_production(building, world, dt, low_power);
    tick_turret(building, world, dt);

    if let Some(shield) = &mut building.shield {
        shield.online = !low_power;
        if shield.online {
            absorb_projectiles(world, building.core.position, SHIELD_RADIUS, building.core.team);
        }
    }

    if let Some(bank) = &mut building.bank {
        // Low power pauses accrual entirely.
        if !low_power {
            bank.timer += dt;
            if bank.timer >= BANK_INTEREST_SECS {
                bank.timer -= BANK_INTEREST_SECS;
                if let Some(faction) = world.faction_mut(building.core.owner) {
                    let interest = faction.credits * BANK_INTEREST_RATE;
                    faction.deposit(interest);
                    log::debug!(
                        "bank {:?} paid {interest:.0} interest to player {:?}",
                        building.core.id,
                        building.core.owner
                    );
                }
            }
        }
    }
}

fn tick_production(building: &mut Building, world: &mut World, dt: f32, low_power: bool) {
    // Low power pauses progress at its current value; it resumes without
    // regression when power is restored.
    if low_power {
        return;
    }
    let Some(job) = building.queue.front_mut() else {
        return;
    };
    job.progress += dt;
    if job.progress < job.time {
        return;
    }

    let unit_kind = job.unit;
    let (unit_radius, upkeep_cost, unit_name) = {
        let def = world.catalog.unit(unit_kind);
        (def.radius, def.upkeep_cost, def.name)
    };
    let upkeep_ok = world
        .faction(building.core.owner)
        .map(|f| f.current_upkeep + upkeep_cost <= f.max_upkeep)
        .unwrap_or(false);
    if !upkeep_ok {
        // Hold the finished job until upkeep frees up.
        return;
    }

    let rally = building.rally;
    let out_dir = match rally {
        Some(r) => (r - building.core.position).normalized(),
        None => Vec2::new(0.0, 1.0),
    };
    let spawn_pos = building.core.position + out_dir * (building.radius + unit_radius + SPAWN_PAD);

    building.queue.pop_front();
    let unit_id = world.spawn_unit(
        building.core.owner,
        building.core.team,
        unit_kind,
        spawn_pos,
    );
    if let Some(faction) = world.faction_mut(building.core.owner) {
        faction.current_upkeep += upkeep_cost;
    }
    if let Some(rally) = rally {
        if let Some(unit) = world.units.get_mut(&unit_id) {
            unit.command = UnitCommand::Move(MoveState::to(rally));
        }
    }
    world.events.push(GameEvent::info(
        format!("{unit_name} ready"),
        EventTarget::player(building.core.owner),
    ));
}

fn tick_turret(building: &mut Building, world: &mut World, dt: f32) {
    let def = world.catalog.building(building.kind);
    let Some(turret) = def.turret.clone() else {
        return;
    };
    building.turret_cooldown = (building.turret_cooldown - dt).max(0.0);
    if building.turret_cooldown > 0.0 {
        return;
    }

    // Nearest enemy unit in range; buildings only when no unit presents.
    let mut target: Option<EntityId> = None;
    let mut fallback: Option<EntityId> = None;
    for entry in world.spatial.query_enemies(
        building.core.position,
        turret.weapon.range,
        building.core.team,
    ) {
        match entry.kind {
            EntityKind::Unit => {
                target = Some(entry.id);
                break;
            }
            EntityKind::Building => {
                if fallback.is_none() {
                    fallback = Some(entry.id);
                }
            }
            _ => {}
        }
    }
    let Some(target) = target.or(fallback) else {
        return;
    };

    let shooter = weapons::ShooterInfo {
        id: Some(building.core.id),
        owner: building.core.owner,
        team: building.core.team,
        position: building.core.position,
        muzzle_offset: building.radius + 2.0,
        damage: turret.weapon.damage,
        range: turret.weapon.range,
        elevation: Elevation::Ground,
    };
    if let Some(aim) =
        weapons::resolve_fire(world, &shooter, &turret.weapon, FireTarget::Entity(target))
    {
        building.turret_rotation = (aim - building.core.position).angle();
        building.turret_cooldown = 1.0 / turret.weapon.attack_rate;
    }
}

/// Delete hostile projectiles inside the shield circle.
fn absorb_projectiles(world: &mut World, center: Vec2, radius: f32, team: crate::entities::TeamId) {
    for projectile in world.projectiles.values_mut() {
        if projectile.core.active
            && projectile.core.team != team
            && projectile.core.position.distance_to(center) <= radius
        {
            projectile.core.active = false;
        }
    }
}
