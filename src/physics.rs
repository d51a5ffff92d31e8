//! Narrow facade over the 2D rigid-body engine.
//!
//! The simulation depends only on this module's surface: body creation with
//! fixture lists, position/velocity access, impulses, stepping, raycasts and
//! a per-step contact drain. No other module names a physics type.
//!
//! Contact events are buffered during the step and drained afterwards, so
//! the world is never mutated from inside the physics callback.

use parking_lot::Mutex;
use rapier2d::parry::shape::Ball;
use rapier2d::prelude::*;

use crate::catalog::Fixture;
use crate::entities::EntityId;
use crate::math::Vec2;

/// Opaque body handle owned by an entity.
pub type BodyHandle = RigidBodyHandle;

/// Which dynamics class a body belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyClass {
    /// Velocity-driven unit body with damping, rotation locked.
    Unit,
    /// Fast sensor body; generates contact events, never pushes.
    Projectile,
    /// Immovable footprint (buildings, obstacles, deposits, walls).
    Static,
}

/// Collision layer; determines who blocks whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionLayer {
    Ground,
    Air,
    Static,
    Ordnance,
}

impl CollisionLayer {
    fn groups(self) -> InteractionGroups {
        let ground = Group::GROUP_1;
        let air = Group::GROUP_2;
        let fixed = Group::GROUP_3;
        let ordnance = Group::GROUP_4;
        match self {
            CollisionLayer::Ground => InteractionGroups::new(ground, ground | fixed | ordnance),
            CollisionLayer::Air => InteractionGroups::new(air, air | ordnance),
            CollisionLayer::Static => InteractionGroups::new(fixed, ground | fixed | ordnance),
            CollisionLayer::Ordnance => InteractionGroups::new(ordnance, ground | air | fixed),
        }
    }
}

/// A raycast hit resolved to an entity.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub entity: EntityId,
    pub point: Vec2,
    pub distance: f32,
}

/// A buffered contact between two entities.
#[derive(Debug, Clone, Copy)]
pub struct ContactEvent {
    pub a: EntityId,
    pub b: EntityId,
    pub started: bool,
}

/// Collects collision events during a step for post-step processing.
#[derive(Default)]
struct ContactCollector {
    events: Mutex<Vec<CollisionEvent>>,
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.events.lock().push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// The physics world. Owned by the simulation world; bodies are created and
/// removed in lockstep with entity spawn/despawn.
pub struct PhysicsWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    params: IntegrationParameters,
    gravity: Vector<Real>,
    collector: ContactCollector,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            params: IntegrationParameters::default(),
            // Top-down world: no ambient gravity.
            gravity: vector![0.0, 0.0],
            collector: ContactCollector::default(),
        }
    }

    /// Create a body with one collider per fixture.
    pub fn create_body(
        &mut self,
        entity: EntityId,
        class: BodyClass,
        layer: CollisionLayer,
        position: Vec2,
        rotation: f32,
        fixtures: &[Fixture],
    ) -> BodyHandle {
        let user_data = entity.0 as u128;
        let builder = match class {
            BodyClass::Unit => RigidBodyBuilder::dynamic()
                .lock_rotations()
                .linear_damping(4.0),
            BodyClass::Projectile => RigidBodyBuilder::dynamic().lock_rotations().ccd_enabled(true),
            BodyClass::Static => RigidBodyBuilder::fixed(),
        };
        let body = builder
            .translation(vector![position.x, position.y])
            .rotation(rotation)
            .user_data(user_data)
            .build();
        let handle = self.bodies.insert(body);
        for fixture in fixtures {
            self.add_fixture(handle, fixture, class, layer, user_data);
        }
        handle
    }

    fn add_fixture(
        &mut self,
        handle: BodyHandle,
        fixture: &Fixture,
        class: BodyClass,
        layer: CollisionLayer,
        user_data: u128,
    ) {
        let builder = match fixture {
            Fixture::Circle { radius } => ColliderBuilder::ball(*radius),
            Fixture::Rect {
                half_width,
                half_height,
            } => ColliderBuilder::cuboid(*half_width, *half_height),
            Fixture::Polygon { verts } => {
                let points: Vec<Point<Real>> =
                    verts.iter().map(|(x, y)| point![*x, *y]).collect();
                match ColliderBuilder::convex_hull(&points) {
                    Some(b) => b,
                    None => {
                        // Degenerate hull; fall back to a point-ish ball.
                        log::error!("degenerate convex hull fixture, using ball");
                        ColliderBuilder::ball(1.0)
                    }
                }
            }
        };
        let sensor = class == BodyClass::Projectile;
        let collider = builder
            .sensor(sensor)
            .active_events(if sensor {
                ActiveEvents::COLLISION_EVENTS
            } else {
                ActiveEvents::empty()
            })
            .collision_groups(layer.groups())
            .user_data(user_data)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
    }

    /// Remove a body and all of its colliders.
    pub fn remove_body(&mut self, handle: BodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_translation(vector![position.x, position.y], true);
        }
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies
            .get(handle)
            .map(|b| Vec2::new(b.translation().x, b.translation().y))
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_linvel(vector![velocity.x, velocity.y], true);
        }
    }

    pub fn velocity(&self, handle: BodyHandle) -> Vec2 {
        self.bodies
            .get(handle)
            .map(|b| Vec2::new(b.linvel().x, b.linvel().y))
            .unwrap_or(Vec2::ZERO)
    }

    /// One-shot impulse (gravity wells, knockback).
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.apply_impulse(vector![impulse.x, impulse.y], true);
        }
    }

    /// Advance the world and drain the contact events it produced.
    pub fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.collector,
        );

        let raw: Vec<CollisionEvent> = std::mem::take(&mut *self.collector.events.lock());
        let mut out = Vec::with_capacity(raw.len());
        for event in raw {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };
            let (Some(a), Some(b)) = (self.collider_entity(h1), self.collider_entity(h2)) else {
                continue;
            };
            out.push(ContactEvent { a, b, started });
        }
        out
    }

    fn collider_entity(&self, handle: ColliderHandle) -> Option<EntityId> {
        self.colliders
            .get(handle)
            .map(|c| EntityId(c.user_data as u32))
    }

    /// First non-sensor hit along a ray for which `filter` returns true.
    pub fn cast_ray(
        &mut self,
        origin: Vec2,
        dir: Vec2,
        max_dist: f32,
        filter: impl Fn(EntityId) -> bool,
    ) -> Option<RayHit> {
        let dir = dir.normalized();
        if dir == Vec2::ZERO {
            return None;
        }
        self.query_pipeline.update(&self.colliders);
        let pred = |_handle: ColliderHandle, collider: &Collider| {
            filter(EntityId(collider.user_data as u32))
        };
        let ray = Ray::new(point![origin.x, origin.y], vector![dir.x, dir.y]);
        let query_filter = QueryFilter::default().exclude_sensors().predicate(&pred);
        let (handle, toi) = self.query_pipeline.cast_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            max_dist,
            true,
            query_filter,
        )?;
        let entity = self.collider_entity(handle)?;
        Some(RayHit {
            entity,
            point: origin + dir * toi,
            distance: toi,
        })
    }

    /// Entities whose colliders intersect the given circle. Includes
    /// sensors; the caller filters by kind.
    pub fn entities_in_circle(&mut self, center: Vec2, radius: f32) -> Vec<EntityId> {
        self.query_pipeline.update(&self.colliders);
        let shape = Ball::new(radius);
        let iso = Isometry::translation(center.x, center.y);
        let mut out = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.bodies,
            &self.colliders,
            &iso,
            &shape,
            QueryFilter::default(),
            |handle| {
                if let Some(entity) = self.colliders.get(handle).map(|c| EntityId(c.user_data as u32))
                {
                    out.push(entity);
                }
                true
            },
        );
        out.sort();
        out.dedup();
        out
    }

    /// Number of live bodies (diagnostics).
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
