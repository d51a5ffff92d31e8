//! Unit state.

use serde::{Deserialize, Serialize};

use super::{CoreFields, EntityId, PlayerId, TeamId, Targetable};
use crate::catalog::{Elevation, ResearchModifier, UnitDef, UnitType};
use crate::commands::UnitCommand;
use crate::math::Vec2;

/// Combat stance governing the enemy scan (see the sensor subsystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Stance {
    /// Never auto-engage.
    Passive,
    /// Engage within a 300-unit leash of the home position.
    #[default]
    Defensive,
    /// Engage anything in vision.
    Aggressive,
    /// Managed by an attack-move command.
    AttackMove,
}

/// A live unit. Stats are the catalog values with the owner's completed
/// research folded in at spawn; later research completions adjust them in
/// place.
#[derive(Debug, Clone)]
pub struct Unit {
    pub core: CoreFields,
    pub kind: UnitType,
    pub stance: Stance,
    pub command: UnitCommand,

    // Live stats.
    pub speed: f32,
    pub damage: f32,
    pub attack_rate: f32,
    pub attack_range: f32,
    pub vision_range: f32,
    pub radius: f32,
    pub upkeep_cost: f32,
    pub elevation: Elevation,

    // Worker tooling.
    pub max_carried: f32,
    pub carried: f32,
    /// Pickaxe durability, 0..=100. Wears while mining.
    pub pickaxe: f32,

    // Weapon bookkeeping.
    pub weapon_cooldown: f32,
    pub turret_rotation: f32,

    // Ability state.
    pub cloaked: bool,
    pub prior_stance: Option<Stance>,
    pub ability_cooldown: f32,

    // Support scans (medic heal / engineer repair) share one cooldown.
    pub support_cooldown: f32,

    /// Anchor for the defensive leash; set at spawn and on arrival.
    pub home: Vec2,

    /// Bunker currently holding this unit, if any.
    pub garrisoned_in: Option<EntityId>,

    // Per-tick field-effect modifiers; reset at the start of every tick.
    pub move_scale: f32,
    pub frozen: bool,
}

impl Unit {
    /// Build a unit from its catalog definition with research folded in.
    pub fn from_def(
        id: EntityId,
        owner: PlayerId,
        team: TeamId,
        position: Vec2,
        kind: UnitType,
        def: &UnitDef,
        modifier: &ResearchModifier,
    ) -> Self {
        let max_health = def.max_health * modifier.health_mult;
        let mut core = CoreFields::new(id, owner, team, position, max_health);
        core.rotation = 0.0;
        let (damage, attack_rate, attack_range) = match &def.weapon {
            Some(w) => (w.damage * modifier.damage_mult, w.attack_rate, w.range),
            None => (0.0, 0.0, 0.0),
        };
        Self {
            core,
            kind,
            stance: Stance::default(),
            command: UnitCommand::Idle,
            speed: def.speed * modifier.speed_mult,
            damage,
            attack_rate,
            attack_range,
            vision_range: def.vision_range + modifier.vision_add,
            radius: def.radius,
            upkeep_cost: def.upkeep_cost,
            elevation: def.elevation,
            max_carried: if def.max_carried > 0.0 {
                def.max_carried + modifier.carry_add
            } else {
                0.0
            },
            carried: 0.0,
            pickaxe: 100.0,
            weapon_cooldown: 0.0,
            turret_rotation: 0.0,
            cloaked: false,
            prior_stance: None,
            ability_cooldown: 0.0,
            support_cooldown: 0.0,
            home: position,
            garrisoned_in: None,
            move_scale: 1.0,
            frozen: false,
        }
    }

    pub fn can_attack(&self) -> bool {
        self.attack_rate > 0.0
    }

    pub fn is_garrisoned(&self) -> bool {
        self.garrisoned_in.is_some()
    }

    /// Engage cloak: saves the stance and goes passive.
    pub fn engage_cloak(&mut self) {
        if !self.cloaked {
            self.cloaked = true;
            self.prior_stance = Some(self.stance);
            self.stance = Stance::Passive;
        }
    }

    /// Drop cloak (fired or toggled off); restores the saved stance.
    pub fn break_cloak(&mut self) {
        if self.cloaked {
            self.cloaked = false;
            if let Some(prior) = self.prior_stance.take() {
                self.stance = prior;
            }
        }
    }
}

impl Targetable for Unit {
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
    fn test_research_folds_into_spawn_stats() {
        let catalog = Catalog::standard();
        let def = catalog.unit(UnitType::Trooper);
        let modifier = ResearchModifier {
            health_mult: 1.2,
            damage_mult: 1.15,
            speed_mult: 1.1,
            vision_add: 50.0,
            carry_add: 0.0,
        };
        let unit = Unit::from_def(
            alloc_entity_id(),
            PlayerId(1),
            TeamId(1),
            Vec2::ZERO,
            UnitType::Trooper,
            def,
            &modifier,
        );
        assert!((unit.core.max_health - def.max_health * 1.2).abs() < 1e-3);
        assert!((unit.speed - def.speed * 1.1).abs() < 1e-3);
        assert!((unit.vision_range - def.vision_range - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_cloak_saves_and_restores_stance() {
        let catalog = Catalog::standard();
        let def = catalog.unit(UnitType::CloakTank);
        let mut unit = Unit::from_def(
            alloc_entity_id(),
            PlayerId(1),
            TeamId(1),
            Vec2::ZERO,
            UnitType::CloakTank,
            def,
            &ResearchModifier::IDENTITY,
        );
        unit.stance = Stance::Aggressive;
        unit.engage_cloak();
        assert_eq!(unit.stance, Stance::Passive);
        unit.break_cloak();
        assert_eq!(unit.stance, Stance::Aggressive);
        // Breaking an already-broken cloak is a no-op.
        unit.break_cloak();
        assert_eq!(unit.stance, Stance::Aggressive);
    }
}
