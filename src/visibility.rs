//! Fog-of-war: per-team vision sources and the visibility test.
//!
//! A target is visible to a team when some source satisfies
//! `dist(source, target) <= source_range + target_radius`; cloaked targets
//! clamp the effective source range to the cloak detection range. Own-team
//! entities are always visible. Terrain is exempt from fog entirely.

use crate::entities::{EntityId, TeamId};
use crate::math::Vec2;
use crate::systems::sensors::CLOAK_DETECTION_RANGE;
use crate::world::World;

/// One team's assembled vision sources for a tick.
#[derive(Debug, Clone)]
pub struct TeamVision {
    pub team: TeamId,
    sources: Vec<(Vec2, f32)>,
}

impl TeamVision {
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Visibility test for a non-own-team target.
    pub fn can_see(&self, position: Vec2, radius: f32, cloaked: bool) -> bool {
        self.sources.iter().any(|(source, range)| {
            let effective = if cloaked {
                range.min(CLOAK_DETECTION_RANGE)
            } else {
                *range
            };
            source.distance_to(position) <= effective + radius
        })
    }
}

/// Assemble a team's vision sources: live, non-garrisoned units plus
/// completed buildings, each with its own (research-modified) radius.
pub fn team_vision(world: &World, team: TeamId) -> TeamVision {
    let mut sources = Vec::new();
    for unit in world.units.values() {
        if unit.core.active && unit.core.team == team && !unit.is_garrisoned() {
            sources.push((unit.core.position, unit.vision_range));
        }
    }
    for building in world.buildings.values() {
        if building.is_operational() && building.core.team == team {
            sources.push((building.core.position, building.vision_range));
        }
    }
    TeamVision { team, sources }
}

/// Units visible to the team: all own (non-garrisoned) plus enemies inside
/// vision, cloak respected.
pub fn visible_units(world: &World, vision: &TeamVision) -> Vec<EntityId> {
    world
        .units
        .iter()
        .filter(|(_, u)| u.core.active && !u.is_garrisoned())
        .filter(|(_, u)| {
            u.core.team == vision.team
                || vision.can_see(u.core.position, u.radius, u.cloaked)
        })
        .map(|(id, _)| *id)
        .collect()
}

/// Buildings visible to the team.
pub fn visible_buildings(world: &World, vision: &TeamVision) -> Vec<EntityId> {
    world
        .buildings
        .iter()
        .filter(|(_, b)| b.core.active)
        .filter(|(_, b)| {
            b.core.team == vision.team || vision.can_see(b.core.position, b.radius, false)
        })
        .map(|(id, _)| *id)
        .collect()
}

/// Wall segments obey fog like buildings do.
pub fn visible_wall_segments(world: &World, vision: &TeamVision) -> Vec<EntityId> {
    world
        .wall_segments
        .iter()
        .filter(|(_, s)| s.core.active)
        .filter(|(_, s)| {
            s.core.team == vision.team
                || vision.can_see(s.core.position, s.length * 0.5, false)
        })
        .map(|(id, _)| *id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Biome, Catalog, UnitType};
    use crate::entities::{PlayerFaction, PlayerId};
    use std::sync::Arc;

    fn world_with_players() -> World {
        let catalog = Arc::new(Catalog::standard());
        let mut world = World::new(Arc::clone(&catalog), 4096.0, 4096.0, Biome::Tundra);
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
    fn test_own_team_always_visible() {
        let mut world = world_with_players();
        let own = world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::ZERO);
        // An enemy far outside anyone's vision.
        let enemy = world.spawn_unit(
            PlayerId(2),
            TeamId(2),
            UnitType::Trooper,
            Vec2::new(3000.0, 3000.0),
        );
        let vision = team_vision(&world, TeamId(1));
        let visible = visible_units(&world, &vision);
        assert!(visible.contains(&own));
        assert!(!visible.contains(&enemy));
    }

    #[test]
    fn test_no_sources_returns_only_own() {
        let mut world = world_with_players();
        let enemy = world.spawn_unit(PlayerId(2), TeamId(2), UnitType::Trooper, Vec2::ZERO);
        // Team 1 has no entities at all.
        let vision = team_vision(&world, TeamId(1));
        assert!(!vision.has_sources());
        assert!(!visible_units(&world, &vision).contains(&enemy));
    }

    #[test]
    fn test_vision_radius_plus_target_radius() {
        let mut world = world_with_players();
        world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::ZERO);
        // Trooper vision is 300, enemy radius 8: visible out to 308.
        let near = world.spawn_unit(
            PlayerId(2),
            TeamId(2),
            UnitType::Trooper,
            Vec2::new(305.0, 0.0),
        );
        let far = world.spawn_unit(
            PlayerId(2),
            TeamId(2),
            UnitType::Trooper,
            Vec2::new(312.0, 0.0),
        );
        let vision = team_vision(&world, TeamId(1));
        let visible = visible_units(&world, &vision);
        assert!(visible.contains(&near));
        assert!(!visible.contains(&far));
    }

    #[test]
    fn test_cloak_clamps_source_range() {
        let mut world = world_with_players();
        world.spawn_unit(PlayerId(2), TeamId(2), UnitType::Trooper, Vec2::ZERO);
        let tank = world.spawn_unit(
            PlayerId(1),
            TeamId(1),
            UnitType::CloakTank,
            Vec2::new(100.0, 0.0),
        );
        world.units.get_mut(&tank).unwrap().engage_cloak();

        let vision = team_vision(&world, TeamId(2));
        assert!(
            !visible_units(&world, &vision).contains(&tank),
            "cloaked at 100 > detection 50"
        );

        world.units.get_mut(&tank).unwrap().core.position = Vec2::new(45.0, 0.0);
        let vision = team_vision(&world, TeamId(2));
        assert!(
            visible_units(&world, &vision).contains(&tank),
            "cloaked at 45 <= 50 + radius"
        );

        // Breaking cloak restores normal visibility at any range in vision.
        world.units.get_mut(&tank).unwrap().core.position = Vec2::new(250.0, 0.0);
        world.units.get_mut(&tank).unwrap().break_cloak();
        let vision = team_vision(&world, TeamId(2));
        assert!(visible_units(&world, &vision).contains(&tank));
    }

    #[test]
    fn test_garrisoned_units_are_hidden() {
        let mut world = world_with_players();
        let rider = world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::ZERO);
        world.units.get_mut(&rider).unwrap().garrisoned_in =
            Some(crate::entities::EntityId(9999));
        let vision = team_vision(&world, TeamId(1));
        assert!(!visible_units(&world, &vision).contains(&rider));
    }
}
