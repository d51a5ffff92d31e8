//! Building type definitions.

use std::collections::BTreeMap;

use super::units::WeaponDef;
use super::{BuildingType, Fixture, OrdinanceKind, UnitType};

/// Autonomous turret mounted on a defensive building.
#[derive(Debug, Clone, PartialEq)]
pub struct TurretDef {
    pub weapon: WeaponDef,
}

/// Static definition of a building type.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingDef {
    pub name: &'static str,
    pub max_health: f32,
    pub credit_cost: f32,
    /// Seconds of worker construction at one worker (10 progress/s means
    /// `max_health / 10` seconds; this field is the catalog's nominal time).
    pub build_time: f32,
    /// Placement / collision radius.
    pub radius: f32,
    /// Positive generates power; negative consumes it.
    pub power_value: f32,
    pub vision_range: f32,
    /// Required tech tier (0 = always available).
    pub tech_tier: u8,
    /// Units this building can produce.
    pub produces: Vec<UnitType>,
    /// Extra max-upkeep granted while active.
    pub upkeep_bonus: f32,
    /// Garrison slots (bunkers only).
    pub garrison_capacity: u32,
    /// Workers can deposit harvested resources here.
    pub deposit_point: bool,
    /// Projects the projectile-absorbing shield (radius 200).
    pub shield: bool,
    /// Accrues compound interest for the owner.
    pub bank: bool,
    /// Hosts sortie aircraft lifecycle hooks.
    pub hangar: bool,
    /// Hosts research slots.
    pub research_host: bool,
    pub turret: Option<TurretDef>,
    /// Minimum clearance to any other building at placement time, added to
    /// the radius sum.
    pub placement_margin: f32,
    pub fixtures: Vec<Fixture>,
}

pub(super) fn standard_buildings() -> BTreeMap<BuildingType, BuildingDef> {
    let mut map = BTreeMap::new();

    // Shorthand for the common case: a circular footprint, nothing special.
    fn base(name: &'static str, hp: f32, cost: f32, time: f32, radius: f32) -> BuildingDef {
        BuildingDef {
            name,
            max_health: hp,
            credit_cost: cost,
            build_time: time,
            radius,
            power_value: 0.0,
            vision_range: 220.0,
            tech_tier: 0,
            produces: vec![],
            upkeep_bonus: 0.0,
            garrison_capacity: 0,
            deposit_point: false,
            shield: false,
            bank: false,
            hangar: false,
            research_host: false,
            turret: None,
            placement_margin: 10.0,
            fixtures: vec![Fixture::Circle { radius }],
        }
    }

    map.insert(
        BuildingType::Headquarters,
        BuildingDef {
            power_value: 20.0,
            vision_range: 400.0,
            produces: vec![UnitType::Worker],
            deposit_point: true,
            fixtures: vec![Fixture::Rect {
                half_width: 40.0,
                half_height: 40.0,
            }],
            ..base("Headquarters", 2500.0, 800.0, 60.0, 40.0)
        },
    );
    map.insert(
        BuildingType::PowerPlant,
        BuildingDef {
            power_value: 40.0,
            vision_range: 200.0,
            ..base("Power Plant", 700.0, 150.0, 15.0, 22.0)
        },
    );
    map.insert(
        BuildingType::Refinery,
        BuildingDef {
            power_value: -5.0,
            deposit_point: true,
            ..base("Refinery", 900.0, 200.0, 18.0, 26.0)
        },
    );
    map.insert(
        BuildingType::Barracks,
        BuildingDef {
            power_value: -10.0,
            vision_range: 260.0,
            produces: vec![
                UnitType::Trooper,
                UnitType::Grenadier,
                UnitType::Sniper,
                UnitType::Medic,
                UnitType::Engineer,
                UnitType::ArcTrooper,
            ],
            ..base("Barracks", 1200.0, 250.0, 20.0, 28.0)
        },
    );
    map.insert(
        BuildingType::Factory,
        BuildingDef {
            power_value: -15.0,
            tech_tier: 2,
            produces: vec![UnitType::Tank, UnitType::CloakTank],
            fixtures: vec![Fixture::Rect {
                half_width: 32.0,
                half_height: 26.0,
            }],
            ..base("Factory", 1500.0, 400.0, 30.0, 32.0)
        },
    );
    map.insert(
        BuildingType::AndroidFactory,
        BuildingDef {
            power_value: -20.0,
            tech_tier: 2,
            produces: vec![UnitType::Android],
            ..base("Android Factory", 1300.0, 450.0, 30.0, 30.0)
        },
    );
    map.insert(
        BuildingType::Airbase,
        BuildingDef {
            power_value: -15.0,
            tech_tier: 2,
            produces: vec![UnitType::Gunship],
            hangar: true,
            ..base("Airbase", 1400.0, 500.0, 32.0, 34.0)
        },
    );
    map.insert(
        BuildingType::Bank,
        BuildingDef {
            power_value: -5.0,
            bank: true,
            ..base("Bank", 800.0, 300.0, 24.0, 20.0)
        },
    );
    map.insert(
        BuildingType::ResearchLab,
        BuildingDef {
            power_value: -10.0,
            research_host: true,
            ..base("Research Lab", 900.0, 350.0, 26.0, 24.0)
        },
    );
    map.insert(
        BuildingType::ShieldGenerator,
        BuildingDef {
            power_value: -25.0,
            shield: true,
            ..base("Shield Generator", 1000.0, 400.0, 28.0, 22.0)
        },
    );
    map.insert(
        BuildingType::CommandCitadel,
        BuildingDef {
            power_value: -10.0,
            upkeep_bonus: 150.0,
            ..base("Command Citadel", 1800.0, 600.0, 40.0, 30.0)
        },
    );
    map.insert(
        BuildingType::Bunker,
        BuildingDef {
            garrison_capacity: 4,
            ..base("Bunker", 1200.0, 200.0, 18.0, 24.0)
        },
    );
    map.insert(
        BuildingType::WallPost,
        BuildingDef {
            vision_range: 120.0,
            // Wall posts may be chained close together.
            placement_margin: 0.0,
            ..base("Wall Post", 500.0, 40.0, 6.0, 10.0)
        },
    );
    map.insert(
        BuildingType::SentryTurret,
        BuildingDef {
            power_value: -5.0,
            vision_range: 320.0,
            turret: Some(TurretDef {
                weapon: WeaponDef {
                    ordinance: OrdinanceKind::Bullet,
                    damage: 12.0,
                    attack_rate: 2.5,
                    range: 280.0,
                },
            }),
            ..base("Sentry Turret", 600.0, 180.0, 15.0, 14.0)
        },
    );
    map
}
