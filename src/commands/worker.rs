//! Worker loops: harvest, mine, construct, garrison.

use super::{within, TickIntent, ADJACENCY_SLOP};
use crate::entities::{EntityId, Unit};
use crate::world::World;

/// Resources harvested per second of contact with a deposit.
pub const HARVEST_RATE: f32 = 25.0;
/// Refinery selection is refreshed at this interval.
pub const REFINERY_RESELECT_SECS: f32 = 1.0;
/// Obstacle damage dealt per second of mining.
pub const MINE_DAMAGE_RATE: f32 = 15.0;
/// Pickaxe durability lost per second of mining.
pub const PICKAXE_WEAR_RATE: f32 = 5.0;
/// Durability threshold that sends the miner home for repairs.
pub const PICKAXE_LOW: f32 = 30.0;
/// Durability restored per second at the headquarters.
pub const PICKAXE_REPAIR_RATE: f32 = 50.0;
/// Construction progress added per worker per second.
pub const CONSTRUCT_RATE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestPhase {
    SeekDeposit,
    Harvest,
    ReturnToRefinery,
    Deposit,
}

/// The harvest loop: seek, fill up, walk back, deposit, repeat.
#[derive(Debug, Clone)]
pub struct HarvestState {
    pub deposit: EntityId,
    pub phase: HarvestPhase,
    pub refinery: Option<EntityId>,
    pub reselect_timer: f32,
}

impl HarvestState {
    pub fn at(deposit: EntityId) -> Self {
        Self {
            deposit,
            phase: HarvestPhase::SeekDeposit,
            refinery: None,
            reselect_timer: 0.0,
        }
    }
}

pub fn tick_harvest(
    state: &mut HarvestState,
    unit: &mut Unit,
    world: &mut World,
    dt: f32,
) -> (bool, TickIntent) {
    let deposit_gone = world
        .deposits
        .get(&state.deposit)
        .map(|d| !d.core.active || d.is_depleted())
        .unwrap_or(true);

    match state.phase {
        HarvestPhase::SeekDeposit => {
            if deposit_gone {
                // Nothing left: bank what we carry, otherwise we are done.
                if unit.carried > 0.0 {
                    state.phase = HarvestPhase::ReturnToRefinery;
                    return (false, TickIntent::default());
                }
                return (true, TickIntent::default());
            }
            let deposit = &world.deposits[&state.deposit];
            let reach = deposit.radius + unit.radius + deposit.harvest_range;
            let target = deposit.core.position;
            if within(unit, target, reach) {
                state.phase = HarvestPhase::Harvest;
                (false, TickIntent::default())
            } else {
                (
                    false,
                    TickIntent {
                        steer: Some(target),
                        fire: None,
                    },
                )
            }
        }
        HarvestPhase::Harvest => {
            if unit.carried >= unit.max_carried || deposit_gone {
                state.phase = HarvestPhase::ReturnToRefinery;
                return (false, TickIntent::default());
            }
            let want = (HARVEST_RATE * dt).min(unit.max_carried - unit.carried);
            if let Some(deposit) = world.deposits.get_mut(&state.deposit) {
                unit.carried += deposit.extract(want);
            }
            (false, TickIntent::default())
        }
        HarvestPhase::ReturnToRefinery => {
            // Re-select the refinery periodically or when it dies.
            state.reselect_timer -= dt;
            let invalid = state
                .refinery
                .map(|id| {
                    world
                        .buildings
                        .get(&id)
                        .map(|b| !b.is_operational())
                        .unwrap_or(true)
                })
                .unwrap_or(true);
            if invalid || state.reselect_timer <= 0.0 {
                state.refinery = world.nearest_deposit_point(unit.core.owner, unit.core.position);
                state.reselect_timer = REFINERY_RESELECT_SECS;
            }
            let Some(refinery) = state.refinery else {
                // Nowhere to deposit; wait in place.
                return (false, TickIntent::default());
            };
            let building = &world.buildings[&refinery];
            let reach = building.radius + unit.radius + ADJACENCY_SLOP;
            let target = building.core.position;
            if within(unit, target, reach) {
                state.phase = HarvestPhase::Deposit;
                (false, TickIntent::default())
            } else {
                (
                    false,
                    TickIntent {
                        steer: Some(target),
                        fire: None,
                    },
                )
            }
        }
        HarvestPhase::Deposit => {
            if unit.carried > 0.0 {
                let amount = unit.carried.round();
                if let Some(faction) = world.faction_mut(unit.core.owner) {
                    faction.deposit(amount);
                }
                unit.carried = 0.0;
            }
            if deposit_gone {
                (true, TickIntent::default())
            } else {
                state.phase = HarvestPhase::SeekDeposit;
                (false, TickIntent::default())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinePhase {
    SeekObstacle,
    Mine,
    ReturnToHq,
    Repair,
}

/// The mining loop: chew the obstacle, go home when the pickaxe dulls.
#[derive(Debug, Clone)]
pub struct MineState {
    pub obstacle: EntityId,
    pub phase: MinePhase,
    pub repair_at: Option<EntityId>,
}

impl MineState {
    pub fn at(obstacle: EntityId) -> Self {
        Self {
            obstacle,
            phase: MinePhase::SeekObstacle,
            repair_at: None,
        }
    }
}

pub fn tick_mine(
    state: &mut MineState,
    unit: &mut Unit,
    world: &mut World,
    dt: f32,
) -> (bool, TickIntent) {
    let obstacle_gone = !world.is_active(state.obstacle);

    match state.phase {
        MinePhase::SeekObstacle => {
            if obstacle_gone {
                return (true, TickIntent::default());
            }
            let obstacle = &world.obstacles[&state.obstacle];
            let reach = obstacle.radius + unit.radius + ADJACENCY_SLOP;
            let target = obstacle.core.position;
            if within(unit, target, reach) {
                state.phase = MinePhase::Mine;
                (false, TickIntent::default())
            } else {
                (
                    false,
                    TickIntent {
                        steer: Some(target),
                        fire: None,
                    },
                )
            }
        }
        MinePhase::Mine => {
            if obstacle_gone {
                return (true, TickIntent::default());
            }
            if unit.pickaxe < PICKAXE_LOW {
                state.phase = MinePhase::ReturnToHq;
                return (false, TickIntent::default());
            }
            unit.pickaxe = (unit.pickaxe - PICKAXE_WEAR_RATE * dt).max(0.0);
            world.apply_damage(state.obstacle, MINE_DAMAGE_RATE * dt);
            (false, TickIntent::default())
        }
        MinePhase::ReturnToHq => {
            let invalid = state
                .repair_at
                .map(|id| {
                    world
                        .buildings
                        .get(&id)
                        .map(|b| !b.is_operational())
                        .unwrap_or(true)
                })
                .unwrap_or(true);
            if invalid {
                state.repair_at = world.nearest_building_of(
                    unit.core.owner,
                    crate::catalog::BuildingType::Headquarters,
                    unit.core.position,
                );
            }
            let Some(hq) = state.repair_at else {
                return (false, TickIntent::default());
            };
            let building = &world.buildings[&hq];
            let reach = building.radius + unit.radius + ADJACENCY_SLOP;
            let target = building.core.position;
            if within(unit, target, reach) {
                state.phase = MinePhase::Repair;
                (false, TickIntent::default())
            } else {
                (
                    false,
                    TickIntent {
                        steer: Some(target),
                        fire: None,
                    },
                )
            }
        }
        MinePhase::Repair => {
            unit.pickaxe = (unit.pickaxe + PICKAXE_REPAIR_RATE * dt).min(100.0);
            if unit.pickaxe >= 100.0 {
                state.phase = MinePhase::SeekObstacle;
            }
            (false, TickIntent::default())
        }
    }
}

/// Helping a building under construction.
#[derive(Debug, Clone)]
pub struct ConstructState {
    pub building: EntityId,
}

pub fn tick_construct(
    state: &mut ConstructState,
    unit: &mut Unit,
    world: &mut World,
    dt: f32,
) -> (bool, TickIntent) {
    let Some(building) = world.buildings.get(&state.building) else {
        return (true, TickIntent::default());
    };
    if !building.core.active || !building.under_construction {
        return (true, TickIntent::default());
    }
    let reach = building.radius + unit.radius + ADJACENCY_SLOP;
    let target = building.core.position;
    if within(unit, target, reach) {
        // Each adjacent worker adds progress; completion is resolved by the
        // construction system so simultaneous finishes stay consistent.
        if let Some(building) = world.buildings.get_mut(&state.building) {
            building.construction_progress =
                (building.construction_progress + CONSTRUCT_RATE * dt).min(building.core.max_health);
            building.core.health = building.construction_progress;
        }
        (false, TickIntent::default())
    } else {
        (
            false,
            TickIntent {
                steer: Some(target),
                fire: None,
            },
        )
    }
}

/// Walking into a bunker.
#[derive(Debug, Clone)]
pub struct GarrisonState {
    pub bunker: EntityId,
}

pub fn tick_garrison(
    state: &mut GarrisonState,
    unit: &mut Unit,
    world: &mut World,
) -> (bool, TickIntent) {
    let Some(bunker) = world.buildings.get(&state.bunker) else {
        return (true, TickIntent::default());
    };
    let capacity = world.catalog.building(bunker.kind).garrison_capacity as usize;
    if !bunker.is_operational() || capacity == 0 || bunker.garrisoned.len() >= capacity {
        return (true, TickIntent::default());
    }
    let reach = bunker.radius + unit.radius + ADJACENCY_SLOP;
    let target = bunker.core.position;
    if within(unit, target, reach) {
        // Absorb: detach from physics and record the garrison.
        if let Some(handle) = unit.core.body.take() {
            world.physics.remove_body(handle);
        }
        unit.garrisoned_in = Some(state.bunker);
        let unit_id = unit.core.id;
        if let Some(bunker) = world.buildings.get_mut(&state.bunker) {
            bunker.garrisoned.push(unit_id);
        }
        (true, TickIntent::default())
    } else {
        (
            false,
            TickIntent {
                steer: Some(target),
                fire: None,
            },
        )
    }
}
