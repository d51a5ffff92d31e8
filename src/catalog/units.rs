//! Unit type definitions.

use std::collections::BTreeMap;

use super::{BuildingType, Elevation, Fixture, OrdinanceKind, SpecialAbility, UnitType};

/// A unit weapon: what it fires and how hard.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponDef {
    pub ordinance: OrdinanceKind,
    pub damage: f32,
    /// Attacks per second; minimum fire interval is `1 / attack_rate`.
    pub attack_rate: f32,
    pub range: f32,
}

/// Static definition of a unit type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDef {
    pub name: &'static str,
    pub max_health: f32,
    /// Movement speed in units/second.
    pub speed: f32,
    /// Collision radius.
    pub radius: f32,
    pub vision_range: f32,
    pub upkeep_cost: f32,
    pub credit_cost: f32,
    /// Production time in seconds.
    pub build_time: f32,
    pub elevation: Elevation,
    pub producer: BuildingType,
    pub weapon: Option<WeaponDef>,
    pub ability: Option<SpecialAbility>,
    /// Resource carry capacity; zero for non-workers.
    pub max_carried: f32,
    pub fixtures: Vec<Fixture>,
}

pub(super) fn standard_units() -> BTreeMap<UnitType, UnitDef> {
    let mut map = BTreeMap::new();

    map.insert(
        UnitType::Worker,
        UnitDef {
            name: "Worker",
            max_health: 60.0,
            speed: 90.0,
            radius: 8.0,
            vision_range: 250.0,
            upkeep_cost: 2.0,
            credit_cost: 50.0,
            build_time: 8.0,
            elevation: Elevation::Ground,
            producer: BuildingType::Headquarters,
            weapon: None,
            ability: None,
            max_carried: 100.0,
            fixtures: vec![Fixture::Circle { radius: 8.0 }],
        },
    );
    map.insert(
        UnitType::Trooper,
        UnitDef {
            name: "Trooper",
            max_health: 100.0,
            speed: 80.0,
            radius: 8.0,
            vision_range: 300.0,
            upkeep_cost: 4.0,
            credit_cost: 80.0,
            build_time: 10.0,
            elevation: Elevation::Ground,
            producer: BuildingType::Barracks,
            weapon: Some(WeaponDef {
                ordinance: OrdinanceKind::Bullet,
                damage: 8.0,
                attack_rate: 2.0,
                range: 180.0,
            }),
            ability: None,
            max_carried: 0.0,
            fixtures: vec![Fixture::Circle { radius: 8.0 }],
        },
    );
    map.insert(
        UnitType::Grenadier,
        UnitDef {
            name: "Grenadier",
            max_health: 110.0,
            speed: 70.0,
            radius: 9.0,
            vision_range: 280.0,
            upkeep_cost: 6.0,
            credit_cost: 120.0,
            build_time: 14.0,
            elevation: Elevation::Ground,
            producer: BuildingType::Barracks,
            weapon: Some(WeaponDef {
                ordinance: OrdinanceKind::Grenade,
                damage: 22.0,
                attack_rate: 0.8,
                range: 200.0,
            }),
            ability: None,
            max_carried: 0.0,
            fixtures: vec![Fixture::Circle { radius: 9.0 }],
        },
    );
    map.insert(
        UnitType::Sniper,
        UnitDef {
            name: "Sniper",
            max_health: 70.0,
            speed: 75.0,
            radius: 8.0,
            vision_range: 380.0,
            upkeep_cost: 6.0,
            credit_cost: 140.0,
            build_time: 16.0,
            elevation: Elevation::Ground,
            producer: BuildingType::Barracks,
            weapon: Some(WeaponDef {
                ordinance: OrdinanceKind::Slug,
                damage: 40.0,
                attack_rate: 0.4,
                range: 340.0,
            }),
            ability: None,
            max_carried: 0.0,
            fixtures: vec![Fixture::Circle { radius: 8.0 }],
        },
    );
    map.insert(
        UnitType::Medic,
        UnitDef {
            name: "Medic",
            max_health: 80.0,
            speed: 85.0,
            radius: 8.0,
            vision_range: 260.0,
            upkeep_cost: 4.0,
            credit_cost: 100.0,
            build_time: 12.0,
            elevation: Elevation::Ground,
            producer: BuildingType::Barracks,
            weapon: None,
            ability: None,
            max_carried: 0.0,
            fixtures: vec![Fixture::Circle { radius: 8.0 }],
        },
    );
    map.insert(
        UnitType::Engineer,
        UnitDef {
            name: "Engineer",
            max_health: 80.0,
            speed: 85.0,
            radius: 8.0,
            vision_range: 260.0,
            upkeep_cost: 4.0,
            credit_cost: 100.0,
            build_time: 12.0,
            elevation: Elevation::Ground,
            producer: BuildingType::Barracks,
            weapon: None,
            ability: None,
            max_carried: 0.0,
            fixtures: vec![Fixture::Circle { radius: 8.0 }],
        },
    );
    map.insert(
        UnitType::Android,
        UnitDef {
            name: "Android",
            max_health: 140.0,
            speed: 85.0,
            radius: 9.0,
            vision_range: 300.0,
            upkeep_cost: 6.0,
            credit_cost: 150.0,
            build_time: 12.0,
            elevation: Elevation::Ground,
            producer: BuildingType::AndroidFactory,
            weapon: Some(WeaponDef {
                ordinance: OrdinanceKind::Bullet,
                damage: 10.0,
                attack_rate: 2.4,
                range: 190.0,
            }),
            ability: None,
            max_carried: 0.0,
            fixtures: vec![Fixture::Circle { radius: 9.0 }],
        },
    );
    map.insert(
        UnitType::Tank,
        UnitDef {
            name: "Tank",
            max_health: 320.0,
            speed: 60.0,
            radius: 14.0,
            vision_range: 320.0,
            upkeep_cost: 10.0,
            credit_cost: 300.0,
            build_time: 22.0,
            elevation: Elevation::Ground,
            producer: BuildingType::Factory,
            weapon: Some(WeaponDef {
                ordinance: OrdinanceKind::Shell,
                damage: 45.0,
                attack_rate: 0.5,
                range: 260.0,
            }),
            ability: None,
            max_carried: 0.0,
            fixtures: vec![
                Fixture::Rect {
                    half_width: 14.0,
                    half_height: 10.0,
                },
                Fixture::Circle { radius: 6.0 },
            ],
        },
    );
    map.insert(
        UnitType::CloakTank,
        UnitDef {
            name: "Cloak Tank",
            max_health: 220.0,
            speed: 65.0,
            radius: 13.0,
            vision_range: 300.0,
            upkeep_cost: 10.0,
            credit_cost: 340.0,
            build_time: 24.0,
            elevation: Elevation::Ground,
            producer: BuildingType::Factory,
            weapon: Some(WeaponDef {
                ordinance: OrdinanceKind::Shell,
                damage: 35.0,
                attack_rate: 0.6,
                range: 240.0,
            }),
            ability: Some(SpecialAbility::Cloak),
            max_carried: 0.0,
            fixtures: vec![Fixture::Rect {
                half_width: 13.0,
                half_height: 9.0,
            }],
        },
    );
    map.insert(
        UnitType::ArcTrooper,
        UnitDef {
            name: "Arc Trooper",
            max_health: 90.0,
            speed: 75.0,
            radius: 8.0,
            vision_range: 300.0,
            upkeep_cost: 7.0,
            credit_cost: 160.0,
            build_time: 16.0,
            elevation: Elevation::Ground,
            producer: BuildingType::Barracks,
            weapon: Some(WeaponDef {
                ordinance: OrdinanceKind::ArcBeam,
                damage: 18.0,
                attack_rate: 1.0,
                range: 220.0,
            }),
            ability: None,
            max_carried: 0.0,
            fixtures: vec![Fixture::Circle { radius: 8.0 }],
        },
    );
    map.insert(
        UnitType::Gunship,
        UnitDef {
            name: "Gunship",
            max_health: 260.0,
            speed: 120.0,
            radius: 15.0,
            vision_range: 360.0,
            upkeep_cost: 12.0,
            credit_cost: 380.0,
            build_time: 26.0,
            elevation: Elevation::Air,
            producer: BuildingType::Airbase,
            weapon: Some(WeaponDef {
                ordinance: OrdinanceKind::Rocket,
                damage: 30.0,
                attack_rate: 1.0,
                range: 240.0,
            }),
            ability: None,
            max_carried: 0.0,
            fixtures: vec![Fixture::Polygon {
                verts: vec![(15.0, 0.0), (-10.0, 9.0), (-6.0, 0.0), (-10.0, -9.0)],
            }],
        },
    );
    map
}
