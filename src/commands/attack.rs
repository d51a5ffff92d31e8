//! Attack command variants: single targets, attack-move, ground fire.

use super::{within, FireTarget, MoveState, TickIntent, CLOSE_FACTOR};
use crate::entities::{EntityId, Unit};
use crate::math::Vec2;
use crate::systems::sensors;
use crate::world::World;

/// Extra engagement pad when shooting a wall segment.
pub const WALL_TARGET_PAD: f32 = 20.0;
/// A combat command drops its target beyond this multiple of attack range.
pub const TARGET_DROP_FACTOR: f32 = 2.0;

/// Chasing a single unit, building or wall segment.
#[derive(Debug, Clone)]
pub struct AttackState {
    pub target: EntityId,
    /// Set when the sensor subsystem picked the target; auto targets are
    /// dropped at the defensive leash edge.
    pub auto: bool,
}

impl AttackState {
    pub fn ordered(target: EntityId) -> Self {
        Self {
            target,
            auto: false,
        }
    }

    pub fn acquired(target: EntityId) -> Self {
        Self { target, auto: true }
    }
}

/// Move to a destination, engaging anything met along the way.
#[derive(Debug, Clone)]
pub struct AttackMoveState {
    pub movement: MoveState,
    pub engaged: Option<EntityId>,
}

impl AttackMoveState {
    pub fn to(dest: Vec2) -> Self {
        Self {
            movement: MoveState::to(dest),
            engaged: None,
        }
    }
}

/// Shelling a ground position.
#[derive(Debug, Clone)]
pub struct AttackGroundState {
    pub position: Vec2,
    pub single_shot: bool,
    pub fired: bool,
}

/// Attack a specific entity. `range_pad` widens the engagement ring for
/// big targets (building radius, wall pad).
pub fn tick_attack_entity(
    state: &mut AttackState,
    unit: &mut Unit,
    world: &World,
    range_pad: f32,
) -> (bool, TickIntent) {
    if !world.is_active(state.target) {
        return (true, TickIntent::default());
    }
    let Some(core) = world.core_of(state.target) else {
        return (true, TickIntent::default());
    };
    let target_pos = core.position;
    let dist = unit.core.position.distance_to(target_pos);

    // Target lost. Auto-acquired targets drop at twice the attack range;
    // explicitly ordered pursuits only give up at twice vision.
    let drop_range = if state.auto {
        unit.attack_range * TARGET_DROP_FACTOR
    } else {
        unit.attack_range.max(unit.vision_range) * TARGET_DROP_FACTOR
    };
    if dist > drop_range {
        return (true, TickIntent::default());
    }
    // Auto-acquired targets respect the defensive leash.
    if state.auto && sensors::beyond_leash(unit, target_pos) {
        return (true, TickIntent::default());
    }

    let close_range = CLOSE_FACTOR * (unit.attack_range + range_pad);
    if within(unit, target_pos, close_range) {
        (
            false,
            TickIntent {
                steer: None,
                fire: Some(FireTarget::Entity(state.target)),
            },
        )
    } else {
        (
            false,
            TickIntent {
                steer: Some(target_pos),
                fire: None,
            },
        )
    }
}

/// Attack-move: advance on the destination, engaging scanned enemies.
pub fn tick_attack_move(
    state: &mut AttackMoveState,
    unit: &mut Unit,
    world: &World,
) -> (bool, TickIntent) {
    // Re-validate or acquire an engagement.
    if let Some(target) = state.engaged {
        if !world.is_active(target) {
            state.engaged = None;
        }
    }
    if state.engaged.is_none() {
        state.engaged = sensors::scan_along_path(unit, world);
    }

    if let Some(target) = state.engaged {
        let mut chase = AttackState::acquired(target);
        let pad = match world.kind_of(target) {
            Some(crate::entities::EntityKind::Building) => world.radius_of(target),
            Some(crate::entities::EntityKind::WallSegment) => WALL_TARGET_PAD,
            _ => 0.0,
        };
        let (done, intent) = tick_attack_entity(&mut chase, unit, world, pad);
        if done {
            state.engaged = None;
        }
        return (false, intent);
    }

    // No engagement: keep moving.
    let pos = unit.core.position;
    if pos.distance_to(state.movement.dest) <= super::ARRIVE_RADIUS {
        return (true, TickIntent::default());
    }
    let waypoint = state.movement.waypoint(pos);
    (
        false,
        TickIntent {
            steer: Some(waypoint),
            fire: None,
        },
    )
}

/// Fire on a ground position; persistent unless flagged single-shot.
pub fn tick_attack_ground(state: &mut AttackGroundState, unit: &mut Unit) -> (bool, TickIntent) {
    if state.single_shot && state.fired {
        return (true, TickIntent::default());
    }
    let close_range = CLOSE_FACTOR * unit.attack_range;
    if within(unit, state.position, close_range) {
        (
            false,
            TickIntent {
                steer: None,
                fire: Some(FireTarget::Ground(state.position)),
            },
        )
    } else {
        (
            false,
            TickIntent {
                steer: Some(state.position),
                fire: None,
            },
        )
    }
}
