//! Sensor scans: enemy acquisition, heal and repair targets.
//!
//! Invoked per unit per tick; each scan short-circuits on the first
//! engagement. Selection prefers units over buildings and resolves distance
//! ties toward the smaller id (the spatial grid sorts that way).

use crate::catalog::{Elevation, UnitType};
use crate::commands::{AttackState, UnitCommand, DEFENSIVE_LEASH};
use crate::entities::{EntityId, EntityKind, Stance, Unit};
use crate::world::World;

/// Maximum distance at which any vision source reveals a cloaked unit.
pub const CLOAK_DETECTION_RANGE: f32 = 50.0;
/// Heal/repair scan radius.
pub const SUPPORT_RADIUS: f32 = 150.0;
/// Cooldown between support actions.
pub const SUPPORT_COOLDOWN: f32 = 10.0;
/// Health restored per support action.
pub const SUPPORT_AMOUNT: f32 = 25.0;

/// Defensive units ignore anything beyond the leash around home.
pub fn beyond_leash(unit: &Unit, target: crate::math::Vec2) -> bool {
    unit.stance == Stance::Defensive && unit.home.distance_to(target) > DEFENSIVE_LEASH
}

/// Stance-gated enemy acquisition for idle units. Returns the engagement
/// command to issue, if any.
pub fn scan_for_enemies(unit: &Unit, world: &World) -> Option<UnitCommand> {
    if !unit.can_attack() {
        return None;
    }
    match unit.stance {
        Stance::Passive | Stance::AttackMove => return None,
        Stance::Defensive | Stance::Aggressive => {}
    }
    let target = acquire_target(unit, world)?;
    Some(match world.kind_of(target)? {
        EntityKind::Unit => UnitCommand::AttackUnit(AttackState::acquired(target)),
        EntityKind::Building => UnitCommand::AttackBuilding(AttackState::acquired(target)),
        _ => return None,
    })
}

/// Engagement scan for attack-move: any hostile in vision qualifies.
pub fn scan_along_path(unit: &Unit, world: &World) -> Option<EntityId> {
    if !unit.can_attack() {
        return None;
    }
    acquire_target_with_leash(unit, world, false)
}

fn acquire_target(unit: &Unit, world: &World) -> Option<EntityId> {
    acquire_target_with_leash(unit, world, unit.stance == Stance::Defensive)
}

/// Nearest attackable enemy, preferring units over buildings.
fn acquire_target_with_leash(unit: &Unit, world: &World, leashed: bool) -> Option<EntityId> {
    let ordinance = weapon_targets(unit, world)?;
    let mut best_building: Option<EntityId> = None;

    for entry in world
        .spatial
        .query_enemies(unit.core.position, unit.vision_range, unit.core.team)
    {
        if leashed && unit.home.distance_to(entry.position) > DEFENSIVE_LEASH {
            continue;
        }
        match entry.kind {
            EntityKind::Unit => {
                let Some(target) = world.units.get(&entry.id) else {
                    continue;
                };
                if !target.core.active {
                    continue;
                }
                if !ordinance.contains(&target.elevation) {
                    continue;
                }
                // A cloaked enemy is only acquirable inside detection range.
                if target.cloaked {
                    let detect =
                        unit.vision_range.min(CLOAK_DETECTION_RANGE) + target.radius;
                    if unit.core.position.distance_to(target.core.position) > detect {
                        continue;
                    }
                }
                // Entries are distance-then-id sorted: first unit wins.
                return Some(entry.id);
            }
            EntityKind::Building => {
                if best_building.is_none()
                    && ordinance.contains(&Elevation::Ground)
                    && world.is_active(entry.id)
                {
                    best_building = Some(entry.id);
                }
            }
            _ => {}
        }
    }
    best_building
}

/// Elevations the unit's weapon can hit.
fn weapon_targets(unit: &Unit, world: &World) -> Option<Vec<Elevation>> {
    let def = world.catalog.unit(unit.kind);
    let weapon = def.weapon.as_ref()?;
    Some(world.catalog.ordinance(weapon.ordinance).targets.clone())
}

/// Medic heal and engineer repair scans. Applies the support action
/// directly and starts the shared cooldown.
pub fn scan_for_support_targets(unit: &mut Unit, world: &mut World) {
    if unit.support_cooldown > 0.0 {
        return;
    }
    match unit.kind {
        UnitType::Medic => {
            if let Some(target) = lowest_health_friend(unit, world, false) {
                world.heal_entity(target, SUPPORT_AMOUNT);
                unit.support_cooldown = SUPPORT_COOLDOWN;
            }
        }
        UnitType::Engineer => {
            // Prefer units; fall back to damaged buildings.
            let target = lowest_health_friend(unit, world, false)
                .or_else(|| lowest_health_friend(unit, world, true));
            if let Some(target) = target {
                world.heal_entity(target, SUPPORT_AMOUNT);
                unit.support_cooldown = SUPPORT_COOLDOWN;
            }
        }
        _ => {}
    }
}

/// Friendly in support range with the lowest health fraction below 1.
fn lowest_health_friend(unit: &Unit, world: &World, buildings: bool) -> Option<EntityId> {
    let mut best: Option<(f32, EntityId)> = None;
    for entry in world
        .spatial
        .query_team(unit.core.position, SUPPORT_RADIUS, unit.core.team)
    {
        if entry.id == unit.core.id {
            continue;
        }
        let fraction = match (entry.kind, buildings) {
            (EntityKind::Unit, false) => world.units.get(&entry.id).map(|u| u.core.health_fraction()),
            (EntityKind::Building, true) => world
                .buildings
                .get(&entry.id)
                .filter(|b| !b.under_construction)
                .map(|b| b.core.health_fraction()),
            _ => None,
        };
        let Some(fraction) = fraction else { continue };
        if fraction >= 1.0 {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_fraction, best_id)) => {
                fraction < best_fraction || (fraction == best_fraction && entry.id < best_id)
            }
        };
        if better {
            best = Some((fraction, entry.id));
        }
    }
    best.map(|(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Biome, Catalog};
    use crate::entities::{PlayerFaction, PlayerId, TeamId};
    use crate::math::Vec2;
    use std::sync::Arc;

    fn world_with_players() -> World {
        let catalog = Arc::new(Catalog::standard());
        let mut world = World::new(Arc::clone(&catalog), 4096.0, 4096.0, Biome::Verdant);
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
    fn test_scan_prefers_units_over_buildings() {
        let mut world = world_with_players();
        let shooter = world.spawn_unit(
            PlayerId(1),
            TeamId(1),
            UnitType::Trooper,
            Vec2::new(0.0, 0.0),
        );
        // Enemy building closer than the enemy unit.
        world.spawn_building(
            PlayerId(2),
            TeamId(2),
            crate::catalog::BuildingType::Barracks,
            Vec2::new(80.0, 0.0),
            true,
        );
        let enemy = world.spawn_unit(
            PlayerId(2),
            TeamId(2),
            UnitType::Trooper,
            Vec2::new(200.0, 0.0),
        );
        world.rebuild_spatial();

        let unit = world.units[&shooter].clone();
        let command = scan_for_enemies(&unit, &world).expect("must engage");
        match command {
            UnitCommand::AttackUnit(state) => assert_eq!(state.target, enemy),
            other => panic!("expected unit engagement, got {}", other.tag()),
        }
    }

    #[test]
    fn test_passive_stance_never_engages() {
        let mut world = world_with_players();
        let shooter =
            world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::ZERO);
        world.spawn_unit(PlayerId(2), TeamId(2), UnitType::Trooper, Vec2::new(100.0, 0.0));
        world.rebuild_spatial();

        let mut unit = world.units[&shooter].clone();
        unit.stance = Stance::Passive;
        assert!(scan_for_enemies(&unit, &world).is_none());
    }

    #[test]
    fn test_defensive_leash_filters_targets() {
        let mut world = world_with_players();
        let shooter =
            world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Sniper, Vec2::ZERO);
        // Enemy within vision (380) but beyond the 300 leash.
        world.spawn_unit(PlayerId(2), TeamId(2), UnitType::Trooper, Vec2::new(340.0, 0.0));
        world.rebuild_spatial();

        let unit = world.units[&shooter].clone();
        assert!(
            scan_for_enemies(&unit, &world).is_none(),
            "defensive unit must ignore enemies beyond the leash"
        );

        let mut aggressive = unit;
        aggressive.stance = Stance::Aggressive;
        assert!(scan_for_enemies(&aggressive, &world).is_some());
    }

    #[test]
    fn test_cloaked_enemy_needs_detection_range() {
        let mut world = world_with_players();
        let shooter =
            world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::ZERO);
        let sneak = world.spawn_unit(
            PlayerId(2),
            TeamId(2),
            UnitType::CloakTank,
            Vec2::new(120.0, 0.0),
        );
        world.units.get_mut(&sneak).unwrap().engage_cloak();
        world.rebuild_spatial();

        let mut unit = world.units[&shooter].clone();
        unit.stance = Stance::Aggressive;
        assert!(
            scan_for_enemies(&unit, &world).is_none(),
            "cloaked tank at 120 is outside the 50 detection range"
        );

        world.units.get_mut(&sneak).unwrap().core.position = Vec2::new(40.0, 0.0);
        world.rebuild_spatial();
        assert!(
            scan_for_enemies(&unit, &world).is_some(),
            "cloaked tank at 40 is detectable"
        );
    }

    #[test]
    fn test_medic_heals_lowest_fraction() {
        let mut world = world_with_players();
        let medic = world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Medic, Vec2::ZERO);
        let hurt = world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::new(50.0, 0.0));
        let hurting_more =
            world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::new(60.0, 0.0));
        world.units.get_mut(&hurt).unwrap().core.health = 80.0;
        world.units.get_mut(&hurting_more).unwrap().core.health = 30.0;
        world.rebuild_spatial();

        let mut unit = world.units[&medic].clone();
        scan_for_support_targets(&mut unit, &mut world);
        assert!(unit.support_cooldown > 0.0, "heal starts the cooldown");
        assert!(
            (world.units[&hurting_more].core.health - 55.0).abs() < 1e-3,
            "lowest-fraction friend is healed first"
        );
        assert!((world.units[&hurt].core.health - 80.0).abs() < 1e-3);
    }
}
