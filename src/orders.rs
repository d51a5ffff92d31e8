//! Input intake: validate player frames and convert them into world
//! mutations.
//!
//! Validation failures never mutate state; the offending order is dropped
//! and the player receives a WARNING event. Everything else in the frame
//! still applies.

use crate::catalog::SpecialAbility;
use crate::channel::{
    AbilityOrder, BuildOrder, CancelResearchOrder, InputFrame, ProduceOrder, RallyOrder,
    StartResearchOrder, UnitOrder,
};
use crate::commands::{
    self, AttackGroundState, AttackMoveState, AttackState, ConstructState, GarrisonState,
    HarvestState, MineState, MoveState, UnitCommand,
};
use crate::entities::{EntityId, PlayerId, ProductionJob, ResearchSlot, Stance};
use crate::error::OrderError;
use crate::events::{EventTarget, GameEvent};
use crate::math::Vec2;
use crate::world::World;

/// Apply one player's input frame to the world.
pub fn apply_frame(world: &mut World, player: PlayerId, frame: InputFrame) {
    let Some(faction) = world.faction(player) else {
        log::debug!("frame from unknown player {player:?} dropped");
        return;
    };
    if faction.defeated {
        log::debug!("frame from defeated player {player:?} dropped");
        return;
    }

    // Selection: only the player's own live units.
    let selection: Vec<EntityId> = frame
        .selection
        .unwrap_or_default()
        .into_iter()
        .filter(|id| {
            world
                .units
                .get(id)
                .map(|u| u.core.owner == player && u.core.active)
                .unwrap_or(false)
        })
        .collect();

    if let Some(order) = frame.order {
        apply_unit_order(world, player, &selection, order);
    }
    if let Some(stance) = frame.stance {
        apply_stance(world, &selection, stance);
    }
    if let Some(build) = frame.build {
        let result = apply_build(world, player, build);
        report(world, player, result);
    }
    if let Some(produce) = frame.produce {
        let result = apply_produce(world, player, produce);
        report(world, player, result);
    }
    if let Some(rally) = frame.rally {
        let result = apply_rally(world, player, rally);
        report(world, player, result);
    }
    if let Some(research) = frame.start_research {
        let result = apply_start_research(world, player, research);
        report(world, player, result);
    }
    if let Some(cancel) = frame.cancel_research {
        let result = apply_cancel_research(world, player, cancel);
        report(world, player, result);
    }
    if let Some(ability) = frame.ability {
        apply_ability(world, &selection, ability);
    }
}

fn report(world: &mut World, player: PlayerId, result: Result<(), OrderError>) {
    if let Err(error) = result {
        log::debug!("order rejected for {player:?}: {error}");
        world.events.push(GameEvent::warning(
            error.to_string(),
            EventTarget::player(player),
        ));
    }
}

// ============================================================================
// UNIT ORDERS
// ============================================================================

fn apply_unit_order(world: &mut World, player: PlayerId, selection: &[EntityId], order: UnitOrder) {
    // Ungarrison targets a bunker, not the selection.
    if let UnitOrder::Ungarrison { bunker, all } = order {
        let result = apply_ungarrison(world, player, bunker, all, selection);
        report(world, player, result);
        return;
    }

    for unit_id in selection {
        let result = unit_command_for(world, *unit_id, &order);
        match result {
            Ok(command) => {
                let Some(unit) = world.units.get_mut(unit_id) else {
                    continue;
                };
                let is_attack_move = matches!(command, UnitCommand::AttackMove(_));
                commands::issue(unit, command);
                if is_attack_move {
                    unit.stance = Stance::AttackMove;
                }
            }
            Err(error) => report(world, player, Err(error)),
        }
    }
}

/// Validate one order against one unit and build its command.
fn unit_command_for(
    world: &World,
    unit_id: EntityId,
    order: &UnitOrder,
) -> Result<UnitCommand, OrderError> {
    let Some(unit) = world.units.get(&unit_id) else {
        return Err(OrderError::UnknownTarget(unit_id));
    };
    let is_worker = unit.max_carried > 0.0;
    let team = unit.core.team;

    match *order {
        UnitOrder::Move { x, y } => Ok(UnitCommand::Move(MoveState::to(Vec2::new(x, y)))),
        UnitOrder::AttackMove { x, y } => Ok(UnitCommand::AttackMove(AttackMoveState::to(
            Vec2::new(x, y),
        ))),
        UnitOrder::AttackUnit { target } => {
            let hostile = world
                .units
                .get(&target)
                .map(|t| t.core.active && t.core.team != team)
                .unwrap_or(false);
            if !hostile {
                return Err(OrderError::UnknownTarget(target));
            }
            if !unit.can_attack() {
                return Err(OrderError::UnsupportedOrder);
            }
            Ok(UnitCommand::AttackUnit(AttackState::ordered(target)))
        }
        UnitOrder::AttackBuilding { target } => {
            let hostile = world
                .buildings
                .get(&target)
                .map(|t| t.core.active && t.core.team != team)
                .unwrap_or(false);
            if !hostile {
                return Err(OrderError::UnknownTarget(target));
            }
            if !unit.can_attack() {
                return Err(OrderError::UnsupportedOrder);
            }
            Ok(UnitCommand::AttackBuilding(AttackState::ordered(target)))
        }
        UnitOrder::AttackWall { target } => {
            let hostile = world
                .wall_segments
                .get(&target)
                .map(|t| t.core.active && t.core.team != team)
                .unwrap_or(false);
            if !hostile {
                return Err(OrderError::UnknownTarget(target));
            }
            if !unit.can_attack() {
                return Err(OrderError::UnsupportedOrder);
            }
            Ok(UnitCommand::AttackWall(AttackState::ordered(target)))
        }
        UnitOrder::AttackGround { x, y, single_shot } => {
            if !unit.can_attack() {
                return Err(OrderError::UnsupportedOrder);
            }
            Ok(UnitCommand::AttackGround(AttackGroundState {
                position: Vec2::new(x, y),
                single_shot,
                fired: false,
            }))
        }
        UnitOrder::Harvest { deposit } => {
            if !is_worker {
                return Err(OrderError::UnsupportedOrder);
            }
            let valid = world
                .deposits
                .get(&deposit)
                .map(|d| d.core.active && !d.is_depleted())
                .unwrap_or(false);
            if !valid {
                return Err(OrderError::UnknownTarget(deposit));
            }
            Ok(UnitCommand::Harvest(HarvestState::at(deposit)))
        }
        UnitOrder::Mine { obstacle } => {
            if !is_worker {
                return Err(OrderError::UnsupportedOrder);
            }
            let valid = world
                .obstacles
                .get(&obstacle)
                .map(|o| o.core.active && o.destructible)
                .unwrap_or(false);
            if !valid {
                return Err(OrderError::UnknownTarget(obstacle));
            }
            Ok(UnitCommand::Mine(MineState::at(obstacle)))
        }
        UnitOrder::Construct { building } => {
            if !is_worker {
                return Err(OrderError::UnsupportedOrder);
            }
            let valid = world
                .buildings
                .get(&building)
                .map(|b| {
                    b.core.active && b.under_construction && b.core.owner == unit.core.owner
                })
                .unwrap_or(false);
            if !valid {
                return Err(OrderError::UnknownTarget(building));
            }
            Ok(UnitCommand::Construct(ConstructState { building }))
        }
        UnitOrder::Garrison { bunker } => {
            let valid = world
                .buildings
                .get(&bunker)
                .map(|b| {
                    b.is_operational()
                        && b.core.team == team
                        && (b.garrisoned.len() as u32)
                            < world.catalog.building(b.kind).garrison_capacity
                })
                .unwrap_or(false);
            if !valid {
                return Err(OrderError::UnknownTarget(bunker));
            }
            Ok(UnitCommand::Garrison(GarrisonState { bunker }))
        }
        UnitOrder::Ungarrison { bunker, .. } => Err(OrderError::UnknownTarget(bunker)),
    }
}

fn apply_ungarrison(
    world: &mut World,
    player: PlayerId,
    bunker_id: EntityId,
    all: bool,
    selection: &[EntityId],
) -> Result<(), OrderError> {
    let Some(bunker) = world.buildings.get(&bunker_id) else {
        return Err(OrderError::UnknownTarget(bunker_id));
    };
    if bunker.core.owner != player {
        return Err(OrderError::NotOwned(bunker_id));
    }
    let position = bunker.core.position;
    let to_release: Vec<EntityId> = if all {
        bunker.garrisoned.clone()
    } else {
        bunker
            .garrisoned
            .iter()
            .filter(|id| selection.contains(id))
            .copied()
            .collect()
    };

    for (slot, unit_id) in to_release.iter().enumerate() {
        world.release_garrisoned(*unit_id, position, slot);
    }
    if let Some(bunker) = world.buildings.get_mut(&bunker_id) {
        bunker.garrisoned.retain(|id| !to_release.contains(id));
    }
    Ok(())
}

fn apply_stance(world: &mut World, selection: &[EntityId], stance: Stance) {
    for unit_id in selection {
        if let Some(unit) = world.units.get_mut(unit_id) {
            if unit.cloaked {
                // Cloak forces passive; remember the requested stance.
                unit.prior_stance = Some(stance);
            } else {
                unit.stance = stance;
            }
        }
    }
}

// ============================================================================
// STRUCTURE ORDERS
// ============================================================================

fn apply_build(world: &mut World, player: PlayerId, order: BuildOrder) -> Result<(), OrderError> {
    let def = world.catalog.building(order.building);
    let (cost, tier) = (def.credit_cost, def.tech_tier);
    let position = Vec2::new(order.x, order.y);

    let faction = world
        .faction(player)
        .ok_or(OrderError::UnknownTarget(EntityId(0)))?;
    if faction.tech_tier < tier {
        return Err(OrderError::TechLocked(order.building, tier));
    }
    if !faction.can_afford(cost) {
        return Err(OrderError::InsufficientCredits {
            need: cost,
            have: faction.credits,
        });
    }
    if world.placement_blocked(order.building, position) {
        return Err(OrderError::LocationBlocked {
            x: order.x,
            y: order.y,
        });
    }

    let team = faction.team;
    if let Some(faction) = world.faction_mut(player) {
        faction.spend(cost);
    }
    world.spawn_building(player, team, order.building, position, false);
    Ok(())
}

fn apply_produce(
    world: &mut World,
    player: PlayerId,
    order: ProduceOrder,
) -> Result<(), OrderError> {
    let producer_ok = world
        .buildings
        .get(&order.building)
        .map(|b| b.core.owner == player && b.is_operational())
        .unwrap_or(false);
    if !producer_ok {
        return Err(OrderError::UnknownTarget(order.building));
    }
    let building_kind = world.buildings[&order.building].kind;
    if !world
        .catalog
        .building(building_kind)
        .produces
        .contains(&order.unit)
    {
        return Err(OrderError::WrongProducer(order.unit));
    }

    let unit_def = world.catalog.unit(order.unit);
    let (cost, upkeep, build_time) = (unit_def.credit_cost, unit_def.upkeep_cost, unit_def.build_time);

    let faction = world
        .faction(player)
        .ok_or(OrderError::UnknownTarget(EntityId(0)))?;
    if faction.has_low_power {
        return Err(OrderError::LowPower);
    }
    if !faction.can_afford(cost) {
        return Err(OrderError::InsufficientCredits {
            need: cost,
            have: faction.credits,
        });
    }
    if faction.current_upkeep + upkeep > faction.max_upkeep {
        return Err(OrderError::UpkeepExceeded(order.unit));
    }

    if let Some(faction) = world.faction_mut(player) {
        faction.spend(cost);
    }
    if let Some(building) = world.buildings.get_mut(&order.building) {
        building.queue.push_back(ProductionJob {
            unit: order.unit,
            progress: 0.0,
            time: build_time,
        });
    }
    Ok(())
}

fn apply_rally(world: &mut World, player: PlayerId, order: RallyOrder) -> Result<(), OrderError> {
    let Some(building) = world.buildings.get_mut(&order.building) else {
        return Err(OrderError::UnknownTarget(order.building));
    };
    if building.core.owner != player {
        return Err(OrderError::NotOwned(order.building));
    }
    building.rally = Some(Vec2::new(order.x, order.y));
    Ok(())
}

fn apply_start_research(
    world: &mut World,
    player: PlayerId,
    order: StartResearchOrder,
) -> Result<(), OrderError> {
    let host_ok = world
        .buildings
        .get(&order.building)
        .map(|b| {
            b.core.owner == player
                && b.is_operational()
                && world.catalog.building(b.kind).research_host
        })
        .unwrap_or(false);
    if !host_ok {
        return Err(OrderError::UnknownTarget(order.building));
    }

    let def = world.catalog.research(order.research).clone();
    let cap = world
        .faction(player)
        .map(|f| f.research_cap(&world.catalog))
        .unwrap_or(1);

    let faction = world
        .faction(player)
        .ok_or(OrderError::UnknownTarget(EntityId(0)))?;
    if faction.completed_research.contains(&order.research)
        || faction
            .active_research
            .iter()
            .any(|slot| slot.research == order.research)
    {
        return Err(OrderError::ResearchLocked(order.research));
    }
    if !def
        .prerequisites
        .iter()
        .all(|p| faction.completed_research.contains(p))
    {
        return Err(OrderError::ResearchLocked(order.research));
    }
    if faction.active_research.len() >= cap {
        return Err(OrderError::ResearchBusy);
    }
    if !faction.can_afford(def.credit_cost) {
        return Err(OrderError::InsufficientCredits {
            need: def.credit_cost,
            have: faction.credits,
        });
    }

    if let Some(faction) = world.faction_mut(player) {
        faction.spend(def.credit_cost);
        faction.active_research.push(ResearchSlot {
            research: order.research,
            building: order.building,
            progress: 0.0,
        });
    }
    Ok(())
}

/// Cancelling research drops the slots hosted at the building. Credits are
/// not refunded.
fn apply_cancel_research(
    world: &mut World,
    player: PlayerId,
    order: CancelResearchOrder,
) -> Result<(), OrderError> {
    let owned = world
        .buildings
        .get(&order.building)
        .map(|b| b.core.owner == player)
        .unwrap_or(false);
    if !owned {
        return Err(OrderError::UnknownTarget(order.building));
    }
    if let Some(faction) = world.faction_mut(player) {
        faction
            .active_research
            .retain(|slot| slot.building != order.building);
    }
    Ok(())
}

fn apply_ability(world: &mut World, selection: &[EntityId], _order: AbilityOrder) {
    for unit_id in selection {
        let Some(unit) = world.units.get_mut(unit_id) else {
            continue;
        };
        let ability = world.catalog.unit(unit.kind).ability;
        match ability {
            Some(SpecialAbility::Cloak) => {
                if unit.ability_cooldown > 0.0 {
                    continue;
                }
                if unit.cloaked {
                    unit.break_cloak();
                } else {
                    unit.engage_cloak();
                }
                unit.ability_cooldown = 1.0;
            }
            None => {}
        }
    }
}
