//! Entity families and the fields they share.
//!
//! All entities live in the world's id-keyed maps. Cross-entity references
//! are ids, never pointers; holders re-validate them on every use. The
//! physics body is owned by its entity and removed when the entity despawns.

mod building;
mod faction;
mod field;
mod ordinance;
mod terrain;
mod unit;
mod wall;

pub use building::{BankState, Building, HangarState, ProductionJob, ShieldState};
pub use faction::{PlayerFaction, ResearchSlot};
pub use field::FieldEffect;
pub use ordinance::{Beam, Projectile};
pub use terrain::{Obstacle, ResourceDeposit};
pub use unit::{Stance, Unit};
pub use wall::{WallSegment, WALL_HEALTH_PER_LENGTH, WALL_LINK_MAX, WALL_LINK_MIN};

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::physics::BodyHandle;

/// Unique entity identifier, monotonically issued process-wide.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityId(pub u32);

static NEXT_ENTITY_ID: AtomicU32 = AtomicU32::new(1);

/// Issue the next entity id. Compare-and-increment; never reused.
pub fn alloc_entity_id() -> EntityId {
    EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
}

/// Player identifier, assigned by the session layer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PlayerId(pub u32);

/// Team identifier. Players on the same team share vision and never take
/// friendly fire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TeamId(pub u8);

/// Neutral team for map-owned entities (deposits, obstacles).
pub const NEUTRAL_TEAM: TeamId = TeamId(0);

/// Owner id for map-owned entities.
pub const WORLD_OWNER: PlayerId = PlayerId(0);

/// Which family map an id lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Unit,
    Building,
    WallSegment,
    Projectile,
    Beam,
    FieldEffect,
    ResourceDeposit,
    Obstacle,
}

/// Fields shared by every entity family.
#[derive(Debug, Clone)]
pub struct CoreFields {
    pub id: EntityId,
    pub owner: PlayerId,
    pub team: TeamId,
    pub position: Vec2,
    pub rotation: f32,
    pub health: f32,
    pub max_health: f32,
    pub active: bool,
    /// Physics body, when the entity is embodied. Garrisoned units and
    /// beams have none.
    pub body: Option<BodyHandle>,
}

impl CoreFields {
    pub fn new(id: EntityId, owner: PlayerId, team: TeamId, position: Vec2, health: f32) -> Self {
        Self {
            id,
            owner,
            team,
            position,
            rotation: 0.0,
            health,
            max_health: health,
            active: true,
            body: None,
        }
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }
}

/// The damage interface shared by anything a weapon can hit.
pub trait Targetable {
    fn core(&self) -> &CoreFields;
    fn core_mut(&mut self) -> &mut CoreFields;
    fn radius(&self) -> f32;

    /// Subtract health; marks the entity inactive when it reaches zero.
    /// Returns true when this call destroyed the entity.
    fn take_damage(&mut self, amount: f32) -> bool {
        let core = self.core_mut();
        if !core.active {
            return false;
        }
        core.health = (core.health - amount).max(0.0);
        if core.health <= 0.0 {
            core.active = false;
            true
        } else {
            false
        }
    }

    /// Add health, clamped to max.
    fn heal(&mut self, amount: f32) {
        let core = self.core_mut();
        core.health = (core.health + amount).min(core.max_health);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy(CoreFields);
    impl Targetable for Dummy {
        fn core(&self) -> &CoreFields {
            &self.0
        }
        fn core_mut(&mut self) -> &mut CoreFields {
            &mut self.0
        }
        fn radius(&self) -> f32 {
            5.0
        }
    }

    #[test]
    fn test_ids_are_monotonic() {
        let a = alloc_entity_id();
        let b = alloc_entity_id();
        assert!(b.0 > a.0);
    }

    #[test]
    fn test_damage_marks_inactive_at_zero() {
        let mut d = Dummy(CoreFields::new(
            EntityId(1),
            WORLD_OWNER,
            NEUTRAL_TEAM,
            Vec2::ZERO,
            50.0,
        ));
        assert!(!d.take_damage(20.0));
        assert!(d.core().active);
        assert!(d.take_damage(40.0));
        assert!(!d.core().active);
        assert_eq!(d.core().health, 0.0);
        // Hitting a dead entity again reports no new destruction.
        assert!(!d.take_damage(10.0));
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let mut d = Dummy(CoreFields::new(
            EntityId(2),
            WORLD_OWNER,
            NEUTRAL_TEAM,
            Vec2::ZERO,
            100.0,
        ));
        d.take_damage(30.0);
        d.heal(1000.0);
        assert_eq!(d.core().health, 100.0);
    }
}
