//! The per-unit command state machine.
//!
//! Each unit carries exactly one command. Issuing a new command cancels the
//! previous one; commands never queue. Every tick the unit's command is
//! advanced: completion checks first, then movement intent, then combat.
//! Target references are ids and are re-validated on every use.

mod attack;
mod worker;

pub use attack::{AttackGroundState, AttackMoveState, AttackState};
pub use worker::{ConstructState, GarrisonState, HarvestPhase, HarvestState, MinePhase, MineState};

use std::collections::VecDeque;

use crate::entities::{EntityId, Stance, Unit};
use crate::math::Vec2;
use crate::systems::sensors;
use crate::world::World;

/// A move command is complete within this distance of its destination.
pub const ARRIVE_RADIUS: f32 = 10.0;
/// Path waypoints are consumed within this distance.
pub const WAYPOINT_RADIUS: f32 = 20.0;
/// Extra slop added to radius sums for "adjacent" checks.
pub const ADJACENCY_SLOP: f32 = 10.0;
/// Combat commands close to this fraction of their attack range.
pub const CLOSE_FACTOR: f32 = 0.9;
/// Defensive stance leash from the unit's home position.
pub const DEFENSIVE_LEASH: f32 = 300.0;
/// Idle defensive units walk home when further than this from it.
pub const LEASH_HOME_SLOP: f32 = 50.0;
/// Residual speed below which a unit counts as stopped.
pub const STOPPED_SPEED: f32 = 5.0;
/// Separation steering radius multiplier (times unit radius).
const SEPARATION_REACH: f32 = 3.0;

/// Current intent of a unit, replaced wholesale by new orders.
#[derive(Debug, Clone, Default)]
pub enum UnitCommand {
    #[default]
    Idle,
    Move(MoveState),
    AttackMove(AttackMoveState),
    AttackUnit(AttackState),
    AttackBuilding(AttackState),
    AttackWall(AttackState),
    AttackGround(AttackGroundState),
    Harvest(HarvestState),
    Mine(MineState),
    Construct(ConstructState),
    Garrison(GarrisonState),
}

impl UnitCommand {
    /// Short tag for snapshots and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            UnitCommand::Idle => "idle",
            UnitCommand::Move(_) => "move",
            UnitCommand::AttackMove(_) => "attack_move",
            UnitCommand::AttackUnit(_) => "attack_unit",
            UnitCommand::AttackBuilding(_) => "attack_building",
            UnitCommand::AttackWall(_) => "attack_wall",
            UnitCommand::AttackGround(_) => "attack_ground",
            UnitCommand::Harvest(_) => "harvest",
            UnitCommand::Mine(_) => "mine",
            UnitCommand::Construct(_) => "construct",
            UnitCommand::Garrison(_) => "garrison",
        }
    }
}

/// Plain movement toward a destination along queued waypoints.
#[derive(Debug, Clone)]
pub struct MoveState {
    pub dest: Vec2,
    pub path: VecDeque<Vec2>,
}

impl MoveState {
    pub fn to(dest: Vec2) -> Self {
        Self {
            dest,
            path: VecDeque::from([dest]),
        }
    }

    /// Current waypoint, consuming reached ones.
    fn waypoint(&mut self, from: Vec2) -> Vec2 {
        while let Some(front) = self.path.front() {
            if from.distance_to(*front) <= WAYPOINT_RADIUS && self.path.len() > 1 {
                self.path.pop_front();
            } else {
                return *front;
            }
        }
        self.dest
    }
}

/// What a command wants this tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickIntent {
    /// Where to steer; `None` stops the unit.
    pub steer: Option<Vec2>,
    /// What to shoot at.
    pub fire: Option<FireTarget>,
}

/// Aim point for the weapon layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireTarget {
    Entity(EntityId),
    Ground(Vec2),
}

/// Replace the unit's command, cancelling the old one.
pub fn issue(unit: &mut Unit, command: UnitCommand) {
    on_cancel(unit);
    unit.command = command;
}

/// Cancellation hook for the current command. Commands keep no external
/// state beyond ids, so cancelling is mostly a bookkeeping no-op; carried
/// resources and pickaxe wear survive replacement.
pub fn on_cancel(unit: &mut Unit) {
    if let UnitCommand::AttackMove(_) = &unit.command {
        if unit.stance == Stance::AttackMove {
            unit.stance = Stance::Defensive;
        }
    }
}

/// Advance one unit for one tick. The unit is detached from the world map
/// while this runs; `world` holds everything else.
pub fn update_unit(unit: &mut Unit, world: &mut World, dt: f32) {
    // Cooldowns.
    unit.weapon_cooldown = (unit.weapon_cooldown - dt).max(0.0);
    unit.ability_cooldown = (unit.ability_cooldown - dt).max(0.0);
    unit.support_cooldown = (unit.support_cooldown - dt).max(0.0);

    // Advance the current command.
    let mut command = std::mem::take(&mut unit.command);
    let (done, intent) = tick_command(&mut command, unit, world, dt);
    if done {
        if unit.stance == Stance::AttackMove {
            unit.stance = Stance::Defensive;
        }
        unit.command = UnitCommand::Idle;
        unit.home = unit.core.position;
    } else {
        unit.command = command;
    }

    // A unit absorbed into a bunker this tick does nothing further.
    if unit.is_garrisoned() {
        return;
    }

    // Idle auto-acquisition and leash homing.
    let intent = idle_behavior(unit, world, intent);

    // Support scans run even while moving.
    sensors::scan_for_support_targets(unit, world);

    // Combat first: firing zeroes velocity for the tick.
    let fired = match intent.fire {
        Some(target) => crate::systems::weapons::try_fire(unit, world, target),
        None => false,
    };
    if fired {
        // Ground fire tracks whether the shot actually left the barrel, so
        // single-shot orders complete on the next tick.
        if let UnitCommand::AttackGround(state) = &mut unit.command {
            state.fired = true;
        }
    }

    // Movement.
    if fired || unit.frozen {
        stop(unit, world);
    } else {
        match intent.steer {
            Some(dest) => steer_towards(unit, world, dest),
            None => stop(unit, world),
        }
    }
}

/// Dispatch to the per-variant tick. Returns (complete, intent).
fn tick_command(
    command: &mut UnitCommand,
    unit: &mut Unit,
    world: &mut World,
    dt: f32,
) -> (bool, TickIntent) {
    match command {
        UnitCommand::Idle => (false, TickIntent::default()),
        UnitCommand::Move(state) => tick_move(state, unit, world),
        UnitCommand::AttackMove(state) => attack::tick_attack_move(state, unit, world),
        UnitCommand::AttackUnit(state) => attack::tick_attack_entity(state, unit, world, 0.0),
        UnitCommand::AttackBuilding(state) => {
            let pad = world.radius_of(state.target);
            attack::tick_attack_entity(state, unit, world, pad)
        }
        UnitCommand::AttackWall(state) => {
            attack::tick_attack_entity(state, unit, world, attack::WALL_TARGET_PAD)
        }
        UnitCommand::AttackGround(state) => attack::tick_attack_ground(state, unit),
        UnitCommand::Harvest(state) => worker::tick_harvest(state, unit, world, dt),
        UnitCommand::Mine(state) => worker::tick_mine(state, unit, world, dt),
        UnitCommand::Construct(state) => worker::tick_construct(state, unit, world, dt),
        UnitCommand::Garrison(state) => worker::tick_garrison(state, unit, world),
    }
}

fn tick_move(state: &mut MoveState, unit: &mut Unit, world: &World) -> (bool, TickIntent) {
    let pos = unit.core.position;
    if pos.distance_to(state.dest) <= ARRIVE_RADIUS {
        // Brake inside the arrival radius; complete once the body damps.
        if is_stopped(unit, world) {
            return (true, TickIntent::default());
        }
        return (false, TickIntent::default());
    }
    let waypoint = state.waypoint(pos);
    (
        false,
        TickIntent {
            steer: Some(waypoint),
            fire: None,
        },
    )
}

/// Idle units: defensive leash homing and stance-gated auto-engagement.
fn idle_behavior(unit: &mut Unit, world: &World, intent: TickIntent) -> TickIntent {
    if !matches!(unit.command, UnitCommand::Idle) {
        return intent;
    }
    if let Some(engage) = sensors::scan_for_enemies(unit, world) {
        issue(unit, engage);
        return intent;
    }
    if unit.stance == Stance::Defensive
        && unit.core.position.distance_to(unit.home) > LEASH_HOME_SLOP
    {
        let home = unit.home;
        unit.command = UnitCommand::Move(MoveState::to(home));
    }
    intent
}

// ============================================================================
// STEERING
// ============================================================================

/// Whether the unit's physics body has damped to a stop.
pub fn is_stopped(unit: &Unit, world: &World) -> bool {
    match unit.core.body {
        Some(handle) => world.physics.velocity(handle).length() < STOPPED_SPEED,
        None => true,
    }
}

/// Zero the unit's velocity.
pub fn stop(unit: &Unit, world: &mut World) {
    if let Some(handle) = unit.core.body {
        world.physics.set_velocity(handle, Vec2::ZERO);
    }
}

/// Seek the target position with separation from nearby friendly units.
pub fn steer_towards(unit: &mut Unit, world: &mut World, dest: Vec2) {
    let Some(handle) = unit.core.body else {
        return;
    };
    let pos = unit.core.position;
    let to = dest - pos;
    if to.length() < 1e-3 {
        world.physics.set_velocity(handle, Vec2::ZERO);
        return;
    }
    let mut velocity = to.normalized() * unit.speed;

    // Separation: shove away from crowding neighbours.
    let reach = unit.radius * SEPARATION_REACH;
    let mut push = Vec2::ZERO;
    for entry in world.spatial.query_radius(pos, reach) {
        if entry.id == unit.core.id || entry.kind != crate::entities::EntityKind::Unit {
            continue;
        }
        let away = pos - entry.position;
        let dist = away.length().max(1e-3);
        push += away.normalized() * ((reach - dist) / reach);
    }
    velocity += push * (unit.speed * 0.5);

    // Clamp to speed and apply field modifiers.
    if velocity.length() > unit.speed {
        velocity = velocity.normalized() * unit.speed;
    }
    velocity = velocity * unit.move_scale.max(0.0);
    if unit.frozen {
        velocity = Vec2::ZERO;
    }

    world.physics.set_velocity(handle, velocity);
    if velocity.length() > STOPPED_SPEED {
        unit.core.rotation = velocity.angle();
    }
}

/// Whether the unit is inside engagement distance of a point.
pub fn within(unit: &Unit, target: Vec2, close_range: f32) -> bool {
    unit.core.position.distance_to(target) <= close_range
}
