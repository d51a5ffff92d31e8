//! The simulation world: id-keyed entity maps and the operations that keep
//! them consistent with the physics layer.
//!
//! Maps are `BTreeMap`s so iteration is always by ascending id; distance
//! tie-breaks therefore resolve identically on every run. Cross-entity
//! references are ids and are re-validated on every use.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::catalog::{
    Biome, BuildingType, Catalog, Elevation, FieldEffectKind, Fixture, OrdinanceKind,
    ResourceKind, UnitType,
};
use crate::entities::{
    alloc_entity_id, Beam, Building, CoreFields, EntityId, EntityKind, FieldEffect, Obstacle,
    PlayerFaction, PlayerId, Projectile, ResourceDeposit, Targetable, TeamId, Unit, WallSegment,
};
use crate::events::EventBus;
use crate::math::Vec2;
use crate::physics::{BodyClass, CollisionLayer, PhysicsWorld};
use crate::spatial::{SpatialEntry, SpatialGrid};

/// The world owns all entities, the physics layer, the spatial index and the
/// per-tick event collector.
pub struct World {
    pub width: f32,
    pub height: f32,
    pub biome: Biome,
    pub catalog: Arc<Catalog>,
    pub physics: PhysicsWorld,
    pub spatial: SpatialGrid,
    pub events: EventBus,

    pub units: BTreeMap<EntityId, Unit>,
    pub buildings: BTreeMap<EntityId, Building>,
    pub wall_segments: BTreeMap<EntityId, WallSegment>,
    pub projectiles: BTreeMap<EntityId, Projectile>,
    pub beams: BTreeMap<EntityId, Beam>,
    pub field_effects: BTreeMap<EntityId, FieldEffect>,
    pub deposits: BTreeMap<EntityId, ResourceDeposit>,
    pub obstacles: BTreeMap<EntityId, Obstacle>,
    pub factions: BTreeMap<PlayerId, PlayerFaction>,

    kinds: HashMap<EntityId, EntityKind>,
}

impl World {
    pub fn new(catalog: Arc<Catalog>, width: f32, height: f32, biome: Biome) -> Self {
        Self {
            width,
            height,
            biome,
            catalog,
            physics: PhysicsWorld::new(),
            spatial: SpatialGrid::default(),
            events: EventBus::default(),
            units: BTreeMap::new(),
            buildings: BTreeMap::new(),
            wall_segments: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            beams: BTreeMap::new(),
            field_effects: BTreeMap::new(),
            deposits: BTreeMap::new(),
            obstacles: BTreeMap::new(),
            factions: BTreeMap::new(),
            kinds: HashMap::new(),
        }
    }

    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        self.kinds.get(&id).copied()
    }

    // ========================================================================
    // SPAWNING
    // ========================================================================

    /// Spawn a unit with the owner's completed research folded in.
    pub fn spawn_unit(
        &mut self,
        owner: PlayerId,
        team: TeamId,
        kind: UnitType,
        position: Vec2,
    ) -> EntityId {
        let id = alloc_entity_id();
        let catalog = Arc::clone(&self.catalog);
        let def = catalog.unit(kind);
        let modifier = self
            .factions
            .get(&owner)
            .map(|f| f.unit_modifier(&catalog))
            .unwrap_or(crate::catalog::ResearchModifier::IDENTITY);
        let mut unit = Unit::from_def(id, owner, team, position, kind, def, &modifier);
        let layer = match def.elevation {
            Elevation::Ground => CollisionLayer::Ground,
            Elevation::Air => CollisionLayer::Air,
        };
        unit.core.body = Some(self.physics.create_body(
            id,
            BodyClass::Unit,
            layer,
            position,
            0.0,
            &def.fixtures,
        ));
        self.units.insert(id, unit);
        self.kinds.insert(id, EntityKind::Unit);
        id
    }

    /// Place a building; `completed` bases arrive at full health.
    pub fn spawn_building(
        &mut self,
        owner: PlayerId,
        team: TeamId,
        kind: BuildingType,
        position: Vec2,
        completed: bool,
    ) -> EntityId {
        let id = alloc_entity_id();
        let catalog = Arc::clone(&self.catalog);
        let def = catalog.building(kind);
        let mut building = Building::place(id, owner, team, position, kind, def, completed);
        building.core.body = Some(self.physics.create_body(
            id,
            BodyClass::Static,
            CollisionLayer::Static,
            position,
            0.0,
            &def.fixtures,
        ));
        self.buildings.insert(id, building);
        self.kinds.insert(id, EntityKind::Building);
        id
    }

    /// Span a wall segment between two posts (validated by the caller).
    pub fn spawn_wall_segment(
        &mut self,
        owner: PlayerId,
        team: TeamId,
        post1: (EntityId, Vec2),
        post2: (EntityId, Vec2),
    ) -> EntityId {
        let id = alloc_entity_id();
        let mut segment = WallSegment::span(id, owner, team, post1, post2);
        let fixtures = [Fixture::Rect {
            half_width: segment.length * 0.5,
            half_height: 4.0,
        }];
        segment.core.body = Some(self.physics.create_body(
            id,
            BodyClass::Static,
            CollisionLayer::Static,
            segment.core.position,
            segment.core.rotation,
            &fixtures,
        ));
        self.wall_segments.insert(id, segment);
        self.kinds.insert(id, EntityKind::WallSegment);
        id
    }

    /// Launch a projectile.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_projectile(
        &mut self,
        owner: PlayerId,
        team: TeamId,
        position: Vec2,
        velocity: Vec2,
        kind: OrdinanceKind,
        damage: f32,
        range: f32,
        elevation: Elevation,
    ) -> EntityId {
        let id = alloc_entity_id();
        let size = self.catalog.ordinance(kind).size;
        let mut projectile = Projectile::launch(
            id, owner, team, position, velocity, kind, damage, size, range, elevation,
        );
        let fixtures = [Fixture::Circle {
            radius: projectile.radius(),
        }];
        let handle = self.physics.create_body(
            id,
            BodyClass::Projectile,
            CollisionLayer::Ordnance,
            position,
            velocity.angle(),
            &fixtures,
        );
        self.physics.set_velocity(handle, velocity);
        projectile.core.body = Some(handle);
        self.projectiles.insert(id, projectile);
        self.kinds.insert(id, EntityKind::Projectile);
        id
    }

    /// Record a resolved beam for rendering.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_beam(
        &mut self,
        owner: PlayerId,
        team: TeamId,
        kind: OrdinanceKind,
        damage: f32,
        start: Vec2,
        end: Vec2,
    ) -> EntityId {
        let id = alloc_entity_id();
        let def = self.catalog.ordinance(kind);
        let beam = Beam::fired(
            id,
            owner,
            team,
            kind,
            damage,
            def.beam_width,
            def.beam_duration,
            start,
            end,
        );
        self.beams.insert(id, beam);
        self.kinds.insert(id, EntityKind::Beam);
        id
    }

    /// Create a field effect; `duration` of `None` uses the catalog default.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_field_effect(
        &mut self,
        owner: PlayerId,
        team: TeamId,
        kind: FieldEffectKind,
        position: Vec2,
        radius: f32,
        dps: f32,
        duration: Option<f32>,
    ) -> EntityId {
        let id = alloc_entity_id();
        let duration = duration.unwrap_or_else(|| self.catalog.field_effect(kind).duration);
        let field = FieldEffect::create(id, owner, team, position, kind, radius, duration, dps);
        self.field_effects.insert(id, field);
        self.kinds.insert(id, EntityKind::FieldEffect);
        id
    }

    pub fn spawn_deposit(&mut self, position: Vec2, kind: ResourceKind, amount: f32) -> EntityId {
        let id = alloc_entity_id();
        let mut deposit = ResourceDeposit::seed(id, position, kind, amount);
        let fixtures = [Fixture::Circle {
            radius: deposit.radius,
        }];
        deposit.core.body = Some(self.physics.create_body(
            id,
            BodyClass::Static,
            CollisionLayer::Static,
            position,
            0.0,
            &fixtures,
        ));
        self.deposits.insert(id, deposit);
        self.kinds.insert(id, EntityKind::ResourceDeposit);
        id
    }

    pub fn spawn_obstacle(
        &mut self,
        position: Vec2,
        radius: f32,
        destructible: bool,
        health: f32,
    ) -> EntityId {
        let id = alloc_entity_id();
        let mut obstacle = Obstacle::seed(id, position, radius, destructible, health);
        let fixtures = [Fixture::Circle { radius }];
        obstacle.core.body = Some(self.physics.create_body(
            id,
            BodyClass::Static,
            CollisionLayer::Static,
            position,
            0.0,
            &fixtures,
        ));
        self.obstacles.insert(id, obstacle);
        self.kinds.insert(id, EntityKind::Obstacle);
        id
    }

    // ========================================================================
    // DESPAWNING
    // ========================================================================

    /// Remove an entity and its physics body.
    pub fn despawn(&mut self, id: EntityId) {
        let Some(kind) = self.kinds.remove(&id) else {
            return;
        };
        let body = match kind {
            EntityKind::Unit => self.units.remove(&id).and_then(|e| e.core.body),
            EntityKind::Building => self.buildings.remove(&id).and_then(|e| e.core.body),
            EntityKind::WallSegment => self.wall_segments.remove(&id).and_then(|e| e.core.body),
            EntityKind::Projectile => self.projectiles.remove(&id).and_then(|e| e.core.body),
            EntityKind::Beam => self.beams.remove(&id).and_then(|e| e.core.body),
            EntityKind::FieldEffect => self.field_effects.remove(&id).and_then(|e| e.core.body),
            EntityKind::ResourceDeposit => self.deposits.remove(&id).and_then(|e| e.core.body),
            EntityKind::Obstacle => self.obstacles.remove(&id).and_then(|e| e.core.body),
        };
        if let Some(handle) = body {
            self.physics.remove_body(handle);
        }
    }

    // ========================================================================
    // CROSS-KIND ACCESS
    // ========================================================================

    /// Core fields of any entity, by id.
    pub fn core_of(&self, id: EntityId) -> Option<&CoreFields> {
        match self.kind_of(id)? {
            EntityKind::Unit => self.units.get(&id).map(|e| &e.core),
            EntityKind::Building => self.buildings.get(&id).map(|e| &e.core),
            EntityKind::WallSegment => self.wall_segments.get(&id).map(|e| &e.core),
            EntityKind::Projectile => self.projectiles.get(&id).map(|e| &e.core),
            EntityKind::Beam => self.beams.get(&id).map(|e| &e.core),
            EntityKind::FieldEffect => self.field_effects.get(&id).map(|e| &e.core),
            EntityKind::ResourceDeposit => self.deposits.get(&id).map(|e| &e.core),
            EntityKind::Obstacle => self.obstacles.get(&id).map(|e| &e.core),
        }
    }

    /// Whether the id refers to a live, active entity.
    pub fn is_active(&self, id: EntityId) -> bool {
        self.core_of(id).is_some_and(|c| c.active)
    }

    /// Collision/selection radius of a targetable entity.
    pub fn radius_of(&self, id: EntityId) -> f32 {
        match self.kind_of(id) {
            Some(EntityKind::Unit) => self.units.get(&id).map(|e| e.radius).unwrap_or(0.0),
            Some(EntityKind::Building) => self.buildings.get(&id).map(|e| e.radius).unwrap_or(0.0),
            Some(EntityKind::WallSegment) => self
                .wall_segments
                .get(&id)
                .map(|e| e.length * 0.5)
                .unwrap_or(0.0),
            Some(EntityKind::Obstacle) => self.obstacles.get(&id).map(|e| e.radius).unwrap_or(0.0),
            Some(EntityKind::ResourceDeposit) => {
                self.deposits.get(&id).map(|e| e.radius).unwrap_or(0.0)
            }
            _ => 0.0,
        }
    }

    /// Apply damage to a damageable entity. Marks it inactive at zero
    /// health; reaping despawns it. Returns true when destroyed just now.
    pub fn apply_damage(&mut self, id: EntityId, amount: f32) -> bool {
        match self.kind_of(id) {
            Some(EntityKind::Unit) => self
                .units
                .get_mut(&id)
                .map(|e| e.take_damage(amount))
                .unwrap_or(false),
            Some(EntityKind::Building) => self
                .buildings
                .get_mut(&id)
                .map(|e| {
                    let destroyed = e.take_damage(amount);
                    // While constructing, progress tracks health.
                    if e.under_construction {
                        e.construction_progress = e.core.health;
                    }
                    destroyed
                })
                .unwrap_or(false),
            Some(EntityKind::WallSegment) => self
                .wall_segments
                .get_mut(&id)
                .map(|e| e.take_damage(amount))
                .unwrap_or(false),
            Some(EntityKind::Obstacle) => self
                .obstacles
                .get_mut(&id)
                .map(|e| e.take_damage(amount))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Heal a unit or building, clamped to max health.
    pub fn heal_entity(&mut self, id: EntityId, amount: f32) {
        match self.kind_of(id) {
            Some(EntityKind::Unit) => {
                if let Some(e) = self.units.get_mut(&id) {
                    e.heal(amount);
                }
            }
            Some(EntityKind::Building) => {
                if let Some(e) = self.buildings.get_mut(&id) {
                    // Construction progress is driven by workers, not heals.
                    if !e.under_construction {
                        e.heal(amount);
                    }
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // LOOKUPS
    // ========================================================================

    pub fn faction(&self, player: PlayerId) -> Option<&PlayerFaction> {
        self.factions.get(&player)
    }

    pub fn faction_mut(&mut self, player: PlayerId) -> Option<&mut PlayerFaction> {
        self.factions.get_mut(&player)
    }

    pub fn team_of_player(&self, player: PlayerId) -> Option<TeamId> {
        self.factions.get(&player).map(|f| f.team)
    }

    /// Nearest operational deposit point (refinery or HQ) of the owner.
    pub fn nearest_deposit_point(&self, owner: PlayerId, from: Vec2) -> Option<EntityId> {
        self.buildings
            .iter()
            .filter(|(_, b)| {
                b.core.owner == owner
                    && b.is_operational()
                    && self.catalog.building(b.kind).deposit_point
            })
            .min_by(|(ida, a), (idb, b)| {
                let da = a.core.position.distance_to(from);
                let db = b.core.position.distance_to(from);
                da.partial_cmp(&db)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(ida.cmp(idb))
            })
            .map(|(id, _)| *id)
    }

    /// Nearest operational building of a given type owned by `owner`.
    pub fn nearest_building_of(
        &self,
        owner: PlayerId,
        kind: BuildingType,
        from: Vec2,
    ) -> Option<EntityId> {
        self.buildings
            .iter()
            .filter(|(_, b)| b.core.owner == owner && b.is_operational() && b.kind == kind)
            .min_by(|(ida, a), (idb, b)| {
                let da = a.core.position.distance_to(from);
                let db = b.core.position.distance_to(from);
                da.partial_cmp(&db)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(ida.cmp(idb))
            })
            .map(|(id, _)| *id)
    }

    /// Placement test: blocked when the new footprint would overlap any
    /// active building, obstacle or deposit (center distance < radius sum),
    /// or leave the world bounds.
    pub fn placement_blocked(&self, kind: BuildingType, position: Vec2) -> bool {
        let def = self.catalog.building(kind);
        let radius = def.radius;
        if position.x < radius
            || position.y < radius
            || position.x > self.width - radius
            || position.y > self.height - radius
        {
            return true;
        }
        let margin = def.placement_margin;
        let too_close = |other: Vec2, other_radius: f32, extra: f32| {
            position.distance_to(other) < radius + other_radius + extra
        };
        if self
            .buildings
            .values()
            .any(|b| b.core.active && too_close(b.core.position, b.radius, margin))
        {
            return true;
        }
        if self
            .obstacles
            .values()
            .any(|o| o.core.active && too_close(o.core.position, o.radius, 0.0))
        {
            return true;
        }
        self.deposits
            .values()
            .any(|d| d.core.active && too_close(d.core.position, d.radius, 0.0))
    }

    /// Re-embody a garrisoned unit at `position`, fanned out by slot index.
    /// Used by ungarrison orders and bunker destruction.
    pub fn release_garrisoned(&mut self, unit_id: EntityId, position: Vec2, slot: usize) {
        let Some(unit) = self.units.get_mut(&unit_id) else {
            return;
        };
        if !unit.core.active || unit.garrisoned_in.is_none() {
            return;
        }
        let angle = slot as f32 * (std::f32::consts::TAU / 4.0);
        let offset = Vec2::from_angle(angle) * (unit.radius * 2.5);
        unit.core.position = position + offset;
        unit.garrisoned_in = None;

        let kind = unit.kind;
        let spawn_pos = unit.core.position;
        let elevation = unit.elevation;
        let catalog = Arc::clone(&self.catalog);
        let def = catalog.unit(kind);
        let layer = match elevation {
            Elevation::Ground => CollisionLayer::Ground,
            Elevation::Air => CollisionLayer::Air,
        };
        let handle = self.physics.create_body(
            unit_id,
            BodyClass::Unit,
            layer,
            spawn_pos,
            0.0,
            &def.fixtures,
        );
        if let Some(unit) = self.units.get_mut(&unit_id) {
            unit.core.body = Some(handle);
        }
    }

    /// Beam raycast: first hostile, beam-blocking hit along the ray.
    /// Friendly entities and deposits never block; obstacles always do.
    pub fn cast_beam(
        &mut self,
        origin: Vec2,
        dir: Vec2,
        max_dist: f32,
        team: TeamId,
        exclude: Option<EntityId>,
    ) -> Option<crate::physics::RayHit> {
        let Self {
            physics,
            units,
            buildings,
            wall_segments,
            obstacles,
            ..
        } = self;
        let blocking = move |id: EntityId| -> bool {
            if Some(id) == exclude {
                return false;
            }
            if let Some(u) = units.get(&id) {
                return u.core.active && u.core.team != team;
            }
            if let Some(b) = buildings.get(&id) {
                return b.core.active && b.core.team != team;
            }
            if let Some(w) = wall_segments.get(&id) {
                return w.core.active && w.core.team != team;
            }
            obstacles.get(&id).is_some_and(|o| o.core.active)
        };
        physics.cast_ray(origin, dir, max_dist, blocking)
    }

    // ========================================================================
    // PER-TICK MAINTENANCE
    // ========================================================================

    /// Rebuild the spatial index from live units and buildings.
    pub fn rebuild_spatial(&mut self) {
        self.spatial.clear();
        for (id, unit) in &self.units {
            if !unit.core.active || unit.is_garrisoned() {
                continue;
            }
            self.spatial.insert(SpatialEntry {
                id: *id,
                kind: EntityKind::Unit,
                team: unit.core.team,
                position: unit.core.position,
                radius: unit.radius,
            });
        }
        for (id, building) in &self.buildings {
            if !building.core.active {
                continue;
            }
            self.spatial.insert(SpatialEntry {
                id: *id,
                kind: EntityKind::Building,
                team: building.core.team,
                position: building.core.position,
                radius: building.radius,
            });
        }
    }

    /// Copy physics positions back into entity state after a step.
    pub fn sync_positions_from_physics(&mut self) {
        for unit in self.units.values_mut() {
            if let Some(handle) = unit.core.body {
                if let Some(pos) = self.physics.position(handle) {
                    unit.core.position = pos;
                }
            }
        }
        for projectile in self.projectiles.values_mut() {
            if let Some(handle) = projectile.core.body {
                if let Some(pos) = self.physics.position(handle) {
                    projectile.core.position = pos;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world() -> World {
        World::new(Arc::new(Catalog::standard()), 4096.0, 4096.0, Biome::Ashlands)
    }

    fn join(world: &mut World, player: u32, team: u8) {
        let catalog = Arc::clone(&world.catalog);
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

    #[test]
    fn test_spawn_and_despawn_unit() {
        let mut world = test_world();
        join(&mut world, 1, 1);
        let id = world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Worker, Vec2::new(100.0, 100.0));
        assert_eq!(world.kind_of(id), Some(EntityKind::Unit));
        assert!(world.is_active(id));
        let body = world.units[&id].core.body.expect("unit is embodied");
        assert!(world.physics.position(body).is_some());

        world.despawn(id);
        assert_eq!(world.kind_of(id), None);
        assert!(world.physics.position(body).is_none(), "body removed with entity");
    }

    #[test]
    fn test_placement_rules() {
        let mut world = test_world();
        join(&mut world, 1, 1);
        world.spawn_building(
            PlayerId(1),
            TeamId(1),
            BuildingType::Headquarters,
            Vec2::new(500.0, 500.0),
            true,
        );
        // Overlapping the HQ footprint is blocked.
        assert!(world.placement_blocked(BuildingType::Barracks, Vec2::new(520.0, 500.0)));
        // Far away is fine.
        assert!(!world.placement_blocked(BuildingType::Barracks, Vec2::new(900.0, 900.0)));
        // Outside the world is blocked.
        assert!(world.placement_blocked(BuildingType::Barracks, Vec2::new(-5.0, 100.0)));
    }

    #[test]
    fn test_nearest_deposit_point_prefers_closest() {
        let mut world = test_world();
        join(&mut world, 1, 1);
        let hq = world.spawn_building(
            PlayerId(1),
            TeamId(1),
            BuildingType::Headquarters,
            Vec2::new(400.0, 400.0),
            true,
        );
        let refinery = world.spawn_building(
            PlayerId(1),
            TeamId(1),
            BuildingType::Refinery,
            Vec2::new(1000.0, 400.0),
            true,
        );
        assert_eq!(
            world.nearest_deposit_point(PlayerId(1), Vec2::new(500.0, 400.0)),
            Some(hq)
        );
        assert_eq!(
            world.nearest_deposit_point(PlayerId(1), Vec2::new(950.0, 400.0)),
            Some(refinery)
        );
        // A building under construction is not a deposit point.
        let unfinished = world.spawn_building(
            PlayerId(1),
            TeamId(1),
            BuildingType::Refinery,
            Vec2::new(960.0, 700.0),
            false,
        );
        assert_ne!(
            world.nearest_deposit_point(PlayerId(1), Vec2::new(960.0, 700.0)),
            Some(unfinished)
        );
    }

    #[test]
    fn test_research_modifier_applies_at_spawn() {
        let mut world = test_world();
        join(&mut world, 1, 1);
        world
            .faction_mut(PlayerId(1))
            .unwrap()
            .completed_research
            .insert(crate::catalog::ResearchType::HardenedPlating);
        let id = world.spawn_unit(PlayerId(1), TeamId(1), UnitType::Trooper, Vec2::ZERO);
        let base = world.catalog.unit(UnitType::Trooper).max_health;
        assert!((world.units[&id].core.max_health - base * 1.2).abs() < 1e-3);
    }
}
