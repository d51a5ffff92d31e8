//! Map-owned entities: resource deposits and obstacles.

use super::{CoreFields, EntityId, Targetable, NEUTRAL_TEAM, WORLD_OWNER};
use crate::catalog::ResourceKind;
use crate::math::Vec2;

/// A harvestable deposit. Depletes to zero and stays on the map as an
/// empty marker until reaped.
#[derive(Debug, Clone)]
pub struct ResourceDeposit {
    pub core: CoreFields,
    pub kind: ResourceKind,
    pub remaining: f32,
    pub max: f32,
    pub radius: f32,
    /// Workers inside this range of the edge can harvest.
    pub harvest_range: f32,
}

impl ResourceDeposit {
    pub fn seed(id: EntityId, position: Vec2, kind: ResourceKind, amount: f32) -> Self {
        Self {
            core: CoreFields::new(id, WORLD_OWNER, NEUTRAL_TEAM, position, 1.0),
            kind,
            remaining: amount,
            max: amount,
            radius: 16.0,
            harvest_range: 20.0,
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Extract up to `amount`; returns what was actually taken.
    pub fn extract(&mut self, amount: f32) -> f32 {
        let taken = amount.min(self.remaining);
        self.remaining -= taken;
        taken
    }
}

/// A terrain obstacle. Destructible obstacles can be mined down; the rest
/// persist for the whole game.
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub core: CoreFields,
    pub radius: f32,
    pub destructible: bool,
}

impl Obstacle {
    pub fn seed(id: EntityId, position: Vec2, radius: f32, destructible: bool, health: f32) -> Self {
        let mut core = CoreFields::new(id, WORLD_OWNER, NEUTRAL_TEAM, position, health);
        if !destructible {
            // Indestructible terrain never loses health.
            core.health = f32::MAX;
            core.max_health = f32::MAX;
        }
        Self {
            core,
            radius,
            destructible,
        }
    }
}

impl Targetable for Obstacle {
    fn core(&self) -> &CoreFields {
        &self.core
    }
    fn core_mut(&mut self) -> &mut CoreFields {
        &mut self.core
    }
    fn radius(&self) -> f32 {
        self.radius
    }
    fn take_damage(&mut self, amount: f32) -> bool {
        if !self.destructible {
            return false;
        }
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
}
