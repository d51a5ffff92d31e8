//! Building state.

use std::collections::VecDeque;

use super::{CoreFields, EntityId, PlayerId, TeamId, Targetable};
use crate::catalog::{BuildingDef, BuildingType, UnitType};
use crate::math::Vec2;

/// One queued unit production job.
#[derive(Debug, Clone)]
pub struct ProductionJob {
    pub unit: UnitType,
    pub progress: f32,
    pub time: f32,
}

/// Shield generator component. Projection is disabled under low power.
#[derive(Debug, Clone, Default)]
pub struct ShieldState {
    pub online: bool,
}

/// Bank component: 30-second compound interest timer.
#[derive(Debug, Clone, Default)]
pub struct BankState {
    pub timer: f32,
}

/// Hangar lifecycle hooks for sortie-based aircraft. The sortie loop itself
/// lives outside the core; only the counters ride in snapshots.
#[derive(Debug, Clone, Default)]
pub struct HangarState {
    pub sorties_flown: u32,
}

/// A live building.
#[derive(Debug, Clone)]
pub struct Building {
    pub core: CoreFields,
    pub kind: BuildingType,
    pub under_construction: bool,
    /// Progress in health points; mirrors `core.health` while constructing.
    pub construction_progress: f32,
    pub radius: f32,
    pub vision_range: f32,
    pub rally: Option<Vec2>,
    /// Production queue; the front job is in progress.
    pub queue: VecDeque<ProductionJob>,
    pub garrisoned: Vec<EntityId>,
    pub shield: Option<ShieldState>,
    pub bank: Option<BankState>,
    pub hangar: Option<HangarState>,
    pub turret_cooldown: f32,
    pub turret_rotation: f32,
}

impl Building {
    /// Place a building. A constructed placement (starting bases) arrives at
    /// full health; a player placement starts at 1 health and is built up by
    /// workers.
    pub fn place(
        id: EntityId,
        owner: PlayerId,
        team: TeamId,
        position: Vec2,
        kind: BuildingType,
        def: &BuildingDef,
        completed: bool,
    ) -> Self {
        let mut core = CoreFields::new(id, owner, team, position, def.max_health);
        if !completed {
            core.health = 1.0;
        }
        Self {
            core,
            kind,
            under_construction: !completed,
            construction_progress: if completed { def.max_health } else { 1.0 },
            radius: def.radius,
            vision_range: def.vision_range,
            rally: None,
            queue: VecDeque::new(),
            garrisoned: Vec::new(),
            shield: def.shield.then(ShieldState::default),
            bank: def.bank.then(BankState::default),
            hangar: def.hangar.then(HangarState::default),
            turret_cooldown: 0.0,
            turret_rotation: 0.0,
        }
    }

    pub fn is_operational(&self) -> bool {
        self.core.active && !self.under_construction
    }
}

impl Targetable for Building {
    fn core(&self) -> &CoreFields {
        &self.core
    }
    fn core_mut(&mut self) -> &mut CoreFields {
        &mut self.core
    }
    fn radius(&self) -> f32 {
        self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::entities::alloc_entity_id;

    #[test]
    fn test_placement_starts_at_one_health() {
        let catalog = Catalog::standard();
        let def = catalog.building(BuildingType::Barracks);
        let b = Building::place(
            alloc_entity_id(),
            PlayerId(1),
            TeamId(1),
            Vec2::ZERO,
            BuildingType::Barracks,
            def,
            false,
        );
        assert!(b.under_construction);
        assert_eq!(b.core.health, 1.0);
        assert_eq!(b.core.max_health, def.max_health);
    }

    #[test]
    fn test_starting_base_is_complete() {
        let catalog = Catalog::standard();
        let def = catalog.building(BuildingType::Headquarters);
        let b = Building::place(
            alloc_entity_id(),
            PlayerId(1),
            TeamId(1),
            Vec2::ZERO,
            BuildingType::Headquarters,
            def,
            true,
        );
        assert!(b.is_operational());
        assert_eq!(b.core.health, def.max_health);
    }
}
