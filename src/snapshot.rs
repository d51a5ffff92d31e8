//! Per-player snapshot assembly.
//!
//! Every record lists exactly the fields the wire shape requires; there is
//! no reflective serialization. Units and buildings pass through the
//! visibility filter; short-lived entities and terrain are always included;
//! faction detail is stripped for other teams.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::{
    Biome, BuildingType, FieldEffectKind, OrdinanceKind, ResearchType, ResourceKind, UnitType,
};
use crate::entities::{EntityId, PlayerId, Stance, TeamId};
use crate::visibility::{self, TeamVision};
use crate::world::World;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRecord {
    pub id: EntityId,
    pub owner: PlayerId,
    pub team: TeamId,
    pub kind: UnitType,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub health: f32,
    pub max_health: f32,
    pub stance: Stance,
    pub command: &'static str,
    pub carried: f32,
    pub cloaked: bool,
    /// Fixture outlines in local space; own-team units only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<Vec<Vec<(f32, f32)>>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingRecord {
    pub id: EntityId,
    pub owner: PlayerId,
    pub team: TeamId,
    pub kind: BuildingType,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub health: f32,
    pub max_health: f32,
    pub under_construction: bool,
    pub construction_progress: f32,
    pub garrisoned_count: u32,
    pub shield_online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorties_flown: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rally: Option<(f32, f32)>,
    /// (unit type, progress fraction) per queued job; own-team only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<Vec<(UnitType, f32)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<Vec<Vec<(f32, f32)>>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileRecord {
    pub id: EntityId,
    pub team: TeamId,
    pub kind: OrdinanceKind,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub size: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamRecord {
    pub id: EntityId,
    pub team: TeamId,
    pub kind: OrdinanceKind,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub width: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEffectRecord {
    pub id: EntityId,
    pub team: TeamId,
    pub kind: FieldEffectKind,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub remaining: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDepositRecord {
    pub id: EntityId,
    pub kind: ResourceKind,
    pub x: f32,
    pub y: f32,
    pub remaining: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleRecord {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub destructible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallSegmentRecord {
    pub id: EntityId,
    pub owner: PlayerId,
    pub team: TeamId,
    pub post1: EntityId,
    pub post2: EntityId,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub length: f32,
    pub health: f32,
    pub max_health: f32,
}

/// Faction detail: full for the viewer's team, name-and-team otherwise.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactionRecord {
    pub player: PlayerId,
    pub name: String,
    pub team: TeamId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faction_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_generated: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_consumed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_low_power: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_upkeep: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upkeep: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_tier: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_research: Option<Vec<ResearchType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_research: Option<Vec<(ResearchType, f32)>>,
}

/// One tick's vision-filtered world state for a single player.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub timestamp: u64,
    pub units: Vec<UnitRecord>,
    pub buildings: Vec<BuildingRecord>,
    pub projectiles: Vec<ProjectileRecord>,
    pub beams: Vec<BeamRecord>,
    pub field_effects: Vec<FieldEffectRecord>,
    pub resource_deposits: Vec<ResourceDepositRecord>,
    pub obstacles: Vec<ObstacleRecord>,
    pub wall_segments: Vec<WallSegmentRecord>,
    pub factions: BTreeMap<PlayerId, FactionRecord>,
    pub biome: Biome,
    pub world_width: f32,
    pub world_height: f32,
}

/// Assemble the snapshot for one viewer. Spectators see everything.
pub fn build_snapshot(
    world: &World,
    viewer: PlayerId,
    spectator: bool,
    timestamp_ms: u64,
) -> GameState {
    let viewer_team = world.team_of_player(viewer);
    let vision: Option<TeamVision> = if spectator {
        None
    } else {
        viewer_team.map(|team| visibility::team_vision(world, team))
    };

    let units = unit_records(world, viewer_team, vision.as_ref());
    let buildings = building_records(world, viewer_team, vision.as_ref());
    let wall_segments = wall_records(world, vision.as_ref());

    let projectiles = world
        .projectiles
        .values()
        .filter(|p| p.core.active)
        .map(|p| ProjectileRecord {
            id: p.core.id,
            team: p.core.team,
            kind: p.kind,
            x: p.core.position.x,
            y: p.core.position.y,
            rotation: p.core.rotation,
            size: p.size,
        })
        .collect();

    let beams = world
        .beams
        .values()
        .filter(|b| b.core.active)
        .map(|b| BeamRecord {
            id: b.core.id,
            team: b.core.team,
            kind: b.kind,
            x1: b.start.x,
            y1: b.start.y,
            x2: b.end.x,
            y2: b.end.y,
            width: b.width,
        })
        .collect();

    let field_effects = world
        .field_effects
        .values()
        .filter(|f| f.core.active)
        .map(|f| FieldEffectRecord {
            id: f.core.id,
            team: f.core.team,
            kind: f.kind,
            x: f.core.position.x,
            y: f.core.position.y,
            radius: f.radius,
            remaining: f.remaining,
        })
        .collect();

    let resource_deposits = world
        .deposits
        .values()
        .filter(|d| d.core.active)
        .map(|d| ResourceDepositRecord {
            id: d.core.id,
            kind: d.kind,
            x: d.core.position.x,
            y: d.core.position.y,
            remaining: d.remaining,
            max: d.max,
        })
        .collect();

    let obstacles = world
        .obstacles
        .values()
        .filter(|o| o.core.active)
        .map(|o| ObstacleRecord {
            id: o.core.id,
            x: o.core.position.x,
            y: o.core.position.y,
            radius: o.radius,
            destructible: o.destructible,
            health: o.destructible.then_some(o.core.health),
        })
        .collect();

    let factions = world
        .factions
        .values()
        .map(|f| {
            let own = spectator || viewer_team == Some(f.team);
            let record = if own {
                FactionRecord {
                    player: f.player,
                    name: f.name.clone(),
                    team: f.team,
                    faction_tag: Some(f.faction_tag.clone()),
                    credits: Some(f.credits),
                    power_generated: Some(f.power_generated),
                    power_consumed: Some(f.power_consumed),
                    has_low_power: Some(f.has_low_power),
                    current_upkeep: Some(f.current_upkeep),
                    max_upkeep: Some(f.max_upkeep),
                    tech_tier: Some(f.tech_tier),
                    completed_research: Some(f.completed_research.iter().copied().collect()),
                    active_research: Some(
                        f.active_research
                            .iter()
                            .map(|slot| {
                                let time = world.catalog.research(slot.research).time;
                                (slot.research, (slot.progress / time).clamp(0.0, 1.0))
                            })
                            .collect(),
                    ),
                }
            } else {
                FactionRecord {
                    player: f.player,
                    name: f.name.clone(),
                    team: f.team,
                    faction_tag: None,
                    credits: None,
                    power_generated: None,
                    power_consumed: None,
                    has_low_power: None,
                    current_upkeep: None,
                    max_upkeep: None,
                    tech_tier: None,
                    completed_research: None,
                    active_research: None,
                }
            };
            (f.player, record)
        })
        .collect();

    GameState {
        timestamp: timestamp_ms,
        units,
        buildings,
        projectiles,
        beams,
        field_effects,
        resource_deposits,
        obstacles,
        wall_segments,
        factions,
        biome: world.biome,
        world_width: world.width,
        world_height: world.height,
    }
}

fn unit_records(
    world: &World,
    viewer_team: Option<TeamId>,
    vision: Option<&TeamVision>,
) -> Vec<UnitRecord> {
    world
        .units
        .values()
        .filter(|u| u.core.active && !u.is_garrisoned())
        .filter(|u| match vision {
            None => true,
            Some(vision) => {
                u.core.team == vision.team || vision.can_see(u.core.position, u.radius, u.cloaked)
            }
        })
        .map(|u| {
            let own = viewer_team == Some(u.core.team);
            UnitRecord {
                id: u.core.id,
                owner: u.core.owner,
                team: u.core.team,
                kind: u.kind,
                x: u.core.position.x,
                y: u.core.position.y,
                rotation: u.core.rotation,
                health: u.core.health,
                max_health: u.core.max_health,
                stance: u.stance,
                command: u.command.tag(),
                carried: u.carried,
                cloaked: u.cloaked,
                fixtures: own.then(|| {
                    world
                        .catalog
                        .unit(u.kind)
                        .fixtures
                        .iter()
                        .map(|f| f.outline())
                        .collect()
                }),
            }
        })
        .collect()
}

fn building_records(
    world: &World,
    viewer_team: Option<TeamId>,
    vision: Option<&TeamVision>,
) -> Vec<BuildingRecord> {
    world
        .buildings
        .values()
        .filter(|b| b.core.active)
        .filter(|b| match vision {
            None => true,
            Some(vision) => {
                b.core.team == vision.team || vision.can_see(b.core.position, b.radius, false)
            }
        })
        .map(|b| {
            let own = viewer_team == Some(b.core.team);
            BuildingRecord {
                id: b.core.id,
                owner: b.core.owner,
                team: b.core.team,
                kind: b.kind,
                x: b.core.position.x,
                y: b.core.position.y,
                rotation: b.core.rotation,
                health: b.core.health,
                max_health: b.core.max_health,
                under_construction: b.under_construction,
                construction_progress: b.construction_progress,
                garrisoned_count: b.garrisoned.len() as u32,
                shield_online: b.shield.as_ref().map(|s| s.online).unwrap_or(false),
                sorties_flown: b.hangar.as_ref().map(|h| h.sorties_flown),
                rally: b.rally.filter(|_| own).map(|r| (r.x, r.y)),
                queue: own.then(|| {
                    b.queue
                        .iter()
                        .map(|job| (job.unit, (job.progress / job.time).clamp(0.0, 1.0)))
                        .collect()
                }),
                fixtures: own.then(|| {
                    world
                        .catalog
                        .building(b.kind)
                        .fixtures
                        .iter()
                        .map(|f| f.outline())
                        .collect()
                }),
            }
        })
        .collect()
}

fn wall_records(world: &World, vision: Option<&TeamVision>) -> Vec<WallSegmentRecord> {
    world
        .wall_segments
        .values()
        .filter(|s| s.core.active)
        .filter(|s| match vision {
            None => true,
            Some(vision) => {
                s.core.team == vision.team
                    || vision.can_see(s.core.position, s.length * 0.5, false)
            }
        })
        .map(|s| WallSegmentRecord {
            id: s.core.id,
            owner: s.core.owner,
            team: s.core.team,
            post1: s.post1,
            post2: s.post2,
            x: s.core.position.x,
            y: s.core.position.y,
            rotation: s.core.rotation,
            length: s.length,
            health: s.core.health,
            max_health: s.core.max_health,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::entities::PlayerFaction;
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
    fn test_snapshot_filters_enemy_units_by_vision() {
        let mut world = world_with_players();
        world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::new(100.0, 100.0));
        // Far-away enemy, outside vision.
        world.spawn_unit(
            PlayerId(2),
            TeamId(2),
            UnitType::Trooper,
            Vec2::new(3000.0, 3000.0),
        );

        let snap = build_snapshot(&world, PlayerId(1), false, 0);
        assert_eq!(snap.units.len(), 1, "only the own unit is visible");
        assert_eq!(snap.units[0].team, TeamId(1));
        assert!(snap.units[0].fixtures.is_some(), "own units carry fixtures");

        // The spectator sees both.
        let snap = build_snapshot(&world, PlayerId(99), true, 0);
        assert_eq!(snap.units.len(), 2);
    }

    #[test]
    fn test_terrain_always_included() {
        let mut world = world_with_players();
        world.spawn_deposit(Vec2::new(3000.0, 3000.0), ResourceKind::Ore, 1000.0);
        world.spawn_obstacle(Vec2::new(3500.0, 3500.0), 30.0, true, 300.0);

        let snap = build_snapshot(&world, PlayerId(1), false, 0);
        assert_eq!(snap.resource_deposits.len(), 1);
        assert_eq!(snap.obstacles.len(), 1);
    }

    #[test]
    fn test_faction_detail_stripped_for_enemies() {
        let world = world_with_players();
        let snap = build_snapshot(&world, PlayerId(1), false, 0);
        let own = &snap.factions[&PlayerId(1)];
        let foe = &snap.factions[&PlayerId(2)];
        assert!(own.credits.is_some());
        assert!(foe.credits.is_none());
        assert_eq!(foe.name, "p2");
        assert_eq!(foe.team, TeamId(2));
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let mut world = world_with_players();
        world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Worker, Vec2::new(100.0, 100.0));
        let snap = build_snapshot(&world, PlayerId(1), false, 1234);
        let json = serde_json::to_string(&snap).expect("snapshot serializes");
        assert!(json.contains("\"timestamp\":1234"));
        assert!(json.contains("worldWidth"));
        assert!(json.contains("\"Worker\""));
    }
}
