//! Research definitions and the modifier applied on completion.

use std::collections::BTreeMap;

use super::ResearchType;

/// Stat adjustments applied once to every owned unit when the research
/// completes, and folded into new units at spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResearchModifier {
    /// Max health multiplier. Current health scales proportionally.
    pub health_mult: f32,
    pub damage_mult: f32,
    pub speed_mult: f32,
    pub vision_add: f32,
    /// Extra worker carry capacity.
    pub carry_add: f32,
}

impl ResearchModifier {
    pub const IDENTITY: ResearchModifier = ResearchModifier {
        health_mult: 1.0,
        damage_mult: 1.0,
        speed_mult: 1.0,
        vision_add: 0.0,
        carry_add: 0.0,
    };

    /// Fold another modifier into this one.
    pub fn combine(&self, other: &ResearchModifier) -> ResearchModifier {
        ResearchModifier {
            health_mult: self.health_mult * other.health_mult,
            damage_mult: self.damage_mult * other.damage_mult,
            speed_mult: self.speed_mult * other.speed_mult,
            vision_add: self.vision_add + other.vision_add,
            carry_add: self.carry_add + other.carry_add,
        }
    }
}

/// Static definition of a research project.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchDef {
    pub name: &'static str,
    pub credit_cost: f32,
    /// Seconds of lab time.
    pub time: f32,
    pub prerequisites: Vec<ResearchType>,
    pub modifier: ResearchModifier,
    /// Tech tier granted on completion (tier gates building placement).
    pub tier_grant: Option<u8>,
    /// Extra simultaneous research slots granted on completion.
    pub parallel_bonus: u32,
}

pub(super) fn standard_research() -> BTreeMap<ResearchType, ResearchDef> {
    let mut map = BTreeMap::new();

    fn plain(name: &'static str, cost: f32, time: f32, modifier: ResearchModifier) -> ResearchDef {
        ResearchDef {
            name,
            credit_cost: cost,
            time,
            prerequisites: vec![],
            modifier,
            tier_grant: None,
            parallel_bonus: 0,
        }
    }

    map.insert(
        ResearchType::HardenedPlating,
        plain(
            "Hardened Plating",
            250.0,
            45.0,
            ResearchModifier {
                health_mult: 1.2,
                ..ResearchModifier::IDENTITY
            },
        ),
    );
    map.insert(
        ResearchType::TungstenRounds,
        plain(
            "Tungsten Rounds",
            250.0,
            45.0,
            ResearchModifier {
                damage_mult: 1.15,
                ..ResearchModifier::IDENTITY
            },
        ),
    );
    map.insert(
        ResearchType::OverdriveServos,
        plain(
            "Overdrive Servos",
            200.0,
            40.0,
            ResearchModifier {
                speed_mult: 1.1,
                ..ResearchModifier::IDENTITY
            },
        ),
    );
    map.insert(
        ResearchType::FieldOptics,
        plain(
            "Field Optics",
            150.0,
            30.0,
            ResearchModifier {
                vision_add: 50.0,
                ..ResearchModifier::IDENTITY
            },
        ),
    );
    map.insert(
        ResearchType::ExpandedHoppers,
        plain(
            "Expanded Hoppers",
            150.0,
            30.0,
            ResearchModifier {
                carry_add: 50.0,
                ..ResearchModifier::IDENTITY
            },
        ),
    );
    map.insert(
        ResearchType::ParallelResearch,
        ResearchDef {
            parallel_bonus: 1,
            ..plain("Parallel Research", 300.0, 50.0, ResearchModifier::IDENTITY)
        },
    );
    map.insert(
        ResearchType::FabricationTier2,
        ResearchDef {
            tier_grant: Some(2),
            ..plain("Fabrication Tier 2", 400.0, 60.0, ResearchModifier::IDENTITY)
        },
    );
    map.insert(
        ResearchType::FabricationTier3,
        ResearchDef {
            prerequisites: vec![ResearchType::FabricationTier2],
            tier_grant: Some(3),
            ..plain("Fabrication Tier 3", 700.0, 90.0, ResearchModifier::IDENTITY)
        },
    );
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_combine() {
        let plating = ResearchModifier {
            health_mult: 1.2,
            ..ResearchModifier::IDENTITY
        };
        let optics = ResearchModifier {
            vision_add: 50.0,
            ..ResearchModifier::IDENTITY
        };
        let folded = plating.combine(&optics);
        assert!((folded.health_mult - 1.2).abs() < 1e-6);
        assert!((folded.vision_add - 50.0).abs() < 1e-6);
        assert!((folded.damage_mult - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tier3_requires_tier2() {
        let defs = standard_research();
        let t3 = &defs[&ResearchType::FabricationTier3];
        assert!(t3.prerequisites.contains(&ResearchType::FabricationTier2));
    }
}
