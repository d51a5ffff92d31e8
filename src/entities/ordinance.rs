//! Projectiles and beams.

use std::collections::BTreeSet;

use super::{CoreFields, EntityId, PlayerId, TeamId, Targetable};
use crate::catalog::{Elevation, OrdinanceKind};
use crate::math::Vec2;

/// A physical round in flight. Despawns on hit (unless piercing), range
/// exhaustion, or explicit deletion (shield absorption).
#[derive(Debug, Clone)]
pub struct Projectile {
    pub core: CoreFields,
    pub kind: OrdinanceKind,
    pub damage: f32,
    pub size: f32,
    pub velocity: Vec2,
    pub range_remaining: f32,
    /// Flight level the round currently occupies.
    pub elevation: Elevation,
    /// Distinct targets already hit; piercing rounds hit each at most once.
    pub affected: BTreeSet<EntityId>,
}

impl Projectile {
    pub fn launch(
        id: EntityId,
        owner: PlayerId,
        team: TeamId,
        position: Vec2,
        velocity: Vec2,
        kind: OrdinanceKind,
        damage: f32,
        size: f32,
        range: f32,
        elevation: Elevation,
    ) -> Self {
        let mut core = CoreFields::new(id, owner, team, position, 1.0);
        core.rotation = velocity.angle();
        Self {
            core,
            kind,
            damage,
            size,
            velocity,
            range_remaining: range,
            elevation,
            affected: BTreeSet::new(),
        }
    }

    /// Record a hit; returns false when this target was already affected.
    pub fn mark_affected(&mut self, target: EntityId) -> bool {
        self.affected.insert(target)
    }
}

impl Targetable for Projectile {
    fn core(&self) -> &CoreFields {
        &self.core
    }
    fn core_mut(&mut self) -> &mut CoreFields {
        &mut self.core
    }
    fn radius(&self) -> f32 {
        self.size * 2.0
    }
}

/// An instantaneous beam, kept alive briefly for rendering. Damage was
/// already applied when the raycast resolved.
#[derive(Debug, Clone)]
pub struct Beam {
    pub core: CoreFields,
    pub kind: OrdinanceKind,
    pub damage: f32,
    pub width: f32,
    pub remaining: f32,
    pub start: Vec2,
    pub end: Vec2,
}

impl Beam {
    pub fn fired(
        id: EntityId,
        owner: PlayerId,
        team: TeamId,
        kind: OrdinanceKind,
        damage: f32,
        width: f32,
        duration: f32,
        start: Vec2,
        end: Vec2,
    ) -> Self {
        let mut core = CoreFields::new(id, owner, team, start, 1.0);
        core.rotation = (end - start).angle();
        Self {
            core,
            kind,
            damage,
            width,
            remaining: duration,
            start,
            end,
        }
    }
}
