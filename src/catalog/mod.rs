//! Static game data: unit, building, research, ordinance, field-effect and
//! faction definitions.
//!
//! The catalog is immutable and loaded once at game construction. All
//! balance numbers live here; the simulation only ever reads them.

mod buildings;
mod research;
mod units;

pub use buildings::{BuildingDef, TurretDef};
pub use research::{ResearchDef, ResearchModifier};
pub use units::{UnitDef, WeaponDef};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// TYPE IDENTIFIERS
// ============================================================================

/// Every producible unit type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum UnitType {
    Worker,
    Trooper,
    Grenadier,
    Sniper,
    Medic,
    Engineer,
    Android,
    Tank,
    CloakTank,
    ArcTrooper,
    Gunship,
}

impl UnitType {
    pub const ALL: [UnitType; 11] = [
        UnitType::Worker,
        UnitType::Trooper,
        UnitType::Grenadier,
        UnitType::Sniper,
        UnitType::Medic,
        UnitType::Engineer,
        UnitType::Android,
        UnitType::Tank,
        UnitType::CloakTank,
        UnitType::ArcTrooper,
        UnitType::Gunship,
    ];
}

/// Every placeable building type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum BuildingType {
    Headquarters,
    PowerPlant,
    Refinery,
    Barracks,
    Factory,
    AndroidFactory,
    Airbase,
    Bank,
    ResearchLab,
    ShieldGenerator,
    CommandCitadel,
    Bunker,
    WallPost,
    SentryTurret,
}

impl BuildingType {
    pub const ALL: [BuildingType; 14] = [
        BuildingType::Headquarters,
        BuildingType::PowerPlant,
        BuildingType::Refinery,
        BuildingType::Barracks,
        BuildingType::Factory,
        BuildingType::AndroidFactory,
        BuildingType::Airbase,
        BuildingType::Bank,
        BuildingType::ResearchLab,
        BuildingType::ShieldGenerator,
        BuildingType::CommandCitadel,
        BuildingType::Bunker,
        BuildingType::WallPost,
        BuildingType::SentryTurret,
    ];
}

/// Research projects available at a research lab.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ResearchType {
    HardenedPlating,
    TungstenRounds,
    OverdriveServos,
    FieldOptics,
    ExpandedHoppers,
    ParallelResearch,
    FabricationTier2,
    FabricationTier3,
}

impl ResearchType {
    pub const ALL: [ResearchType; 8] = [
        ResearchType::HardenedPlating,
        ResearchType::TungstenRounds,
        ResearchType::OverdriveServos,
        ResearchType::FieldOptics,
        ResearchType::ExpandedHoppers,
        ResearchType::ParallelResearch,
        ResearchType::FabricationTier2,
        ResearchType::FabricationTier3,
    ];
}

/// Projectile / beam families fired by weapons.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum OrdinanceKind {
    Bullet,
    Slug,
    Shell,
    Rocket,
    Grenade,
    ArcBeam,
    LaserBeam,
}

impl OrdinanceKind {
    pub const ALL: [OrdinanceKind; 7] = [
        OrdinanceKind::Bullet,
        OrdinanceKind::Slug,
        OrdinanceKind::Shell,
        OrdinanceKind::Rocket,
        OrdinanceKind::Grenade,
        OrdinanceKind::ArcBeam,
        OrdinanceKind::LaserBeam,
    ];
}

/// Secondary effects an ordinance applies on impact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum BulletEffect {
    Explosive,
    Piercing,
    Flame,
    Poison,
    Electric,
    Fragmentation,
    Freeze,
}

/// Timed area effects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum FieldEffectKind {
    Explosion,
    Fire,
    Electric,
    Freeze,
    Fragmentation,
    Poison,
    HealZone,
    SlowField,
    ShieldBarrier,
    GravityWell,
    SpeedBoost,
    ProximityMine,
    Earthquake,
    WarningZone,
}

impl FieldEffectKind {
    pub const ALL: [FieldEffectKind; 14] = [
        FieldEffectKind::Explosion,
        FieldEffectKind::Fire,
        FieldEffectKind::Electric,
        FieldEffectKind::Freeze,
        FieldEffectKind::Fragmentation,
        FieldEffectKind::Poison,
        FieldEffectKind::HealZone,
        FieldEffectKind::SlowField,
        FieldEffectKind::ShieldBarrier,
        FieldEffectKind::GravityWell,
        FieldEffectKind::SpeedBoost,
        FieldEffectKind::ProximityMine,
        FieldEffectKind::Earthquake,
        FieldEffectKind::WarningZone,
    ];
}

/// Flight level an entity occupies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Elevation {
    Ground,
    Air,
}

/// Toggleable special abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialAbility {
    Cloak,
}

/// Harvestable resource families.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ResourceKind {
    Ore,
    Crystal,
}

/// World biomes; cosmetic, but carried in every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Biome {
    Ashlands,
    Tundra,
    Duneveld,
    Verdant,
}

impl Biome {
    pub const ALL: [Biome; 4] = [
        Biome::Ashlands,
        Biome::Tundra,
        Biome::Duneveld,
        Biome::Verdant,
    ];
}

// ============================================================================
// SHARED DEFINITION PIECES
// ============================================================================

/// A physics fixture shape in a definition. Compound bodies list several.
#[derive(Debug, Clone, PartialEq)]
pub enum Fixture {
    Circle { radius: f32 },
    Rect { half_width: f32, half_height: f32 },
    Polygon { verts: Vec<(f32, f32)> },
}

impl Fixture {
    /// Local-space outline vertices, for snapshot geometry. Circles are
    /// approximated with a 12-gon so clients need no geometry library.
    pub fn outline(&self) -> Vec<(f32, f32)> {
        match self {
            Fixture::Circle { radius } => (0..12)
                .map(|i| {
                    let a = (i as f32 / 12.0) * std::f32::consts::TAU;
                    (radius * a.cos(), radius * a.sin())
                })
                .collect(),
            Fixture::Rect {
                half_width,
                half_height,
            } => vec![
                (-half_width, -half_height),
                (*half_width, -half_height),
                (*half_width, *half_height),
                (-half_width, *half_height),
            ],
            Fixture::Polygon { verts } => verts.clone(),
        }
    }
}

/// Ordinance family data shared by every weapon firing that kind.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinanceDef {
    /// Visual / collision size scalar. Explosion radius is `size * 15`.
    pub size: f32,
    /// Muzzle speed in units/second. Ignored for beams.
    pub speed: f32,
    /// Beam ordinance resolves instantaneously via raycast.
    pub beam: bool,
    pub beam_width: f32,
    pub beam_duration: f32,
    /// Impact effects applied by the collision processor.
    pub effects: Vec<BulletEffect>,
    /// Elevations this ordinance can hit.
    pub targets: Vec<Elevation>,
}

/// Field-effect defaults looked up when a field is spawned without explicit
/// duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldEffectDef {
    pub duration: f32,
    /// Instantaneous kinds apply their full damage once per entity.
    pub instantaneous: bool,
}

/// Cosmetic faction identity plus economy baselines.
#[derive(Debug, Clone, PartialEq)]
pub struct FactionDef {
    pub tag: String,
    pub name: String,
    pub starting_credits: f32,
    pub base_upkeep_cap: f32,
}

// ============================================================================
// CATALOG
// ============================================================================

/// Immutable lookup tables for all static game data.
#[derive(Debug, Clone)]
pub struct Catalog {
    units: BTreeMap<UnitType, UnitDef>,
    buildings: BTreeMap<BuildingType, BuildingDef>,
    research: BTreeMap<ResearchType, ResearchDef>,
    ordinance: BTreeMap<OrdinanceKind, OrdinanceDef>,
    fields: BTreeMap<FieldEffectKind, FieldEffectDef>,
    factions: Vec<FactionDef>,
}

impl Catalog {
    /// The standard skirmish catalog.
    pub fn standard() -> Self {
        Self {
            units: units::standard_units(),
            buildings: buildings::standard_buildings(),
            research: research::standard_research(),
            ordinance: standard_ordinance(),
            fields: standard_fields(),
            factions: standard_factions(),
        }
    }

    pub fn unit(&self, kind: UnitType) -> &UnitDef {
        &self.units[&kind]
    }

    pub fn building(&self, kind: BuildingType) -> &BuildingDef {
        &self.buildings[&kind]
    }

    pub fn research(&self, kind: ResearchType) -> &ResearchDef {
        &self.research[&kind]
    }

    pub fn ordinance(&self, kind: OrdinanceKind) -> &OrdinanceDef {
        &self.ordinance[&kind]
    }

    pub fn field_effect(&self, kind: FieldEffectKind) -> &FieldEffectDef {
        &self.fields[&kind]
    }

    pub fn factions(&self) -> &[FactionDef] {
        &self.factions
    }

    /// Faction def by tag, falling back to the first faction.
    pub fn faction(&self, tag: &str) -> &FactionDef {
        self.factions
            .iter()
            .find(|f| f.tag == tag)
            .unwrap_or(&self.factions[0])
    }
}

fn standard_ordinance() -> BTreeMap<OrdinanceKind, OrdinanceDef> {
    let mut map = BTreeMap::new();
    let ground = vec![Elevation::Ground];
    let both = vec![Elevation::Ground, Elevation::Air];

    map.insert(
        OrdinanceKind::Bullet,
        OrdinanceDef {
            size: 1.0,
            speed: 420.0,
            beam: false,
            beam_width: 0.0,
            beam_duration: 0.0,
            effects: vec![],
            targets: both.clone(),
        },
    );
    map.insert(
        OrdinanceKind::Slug,
        OrdinanceDef {
            size: 1.0,
            // Above the hitscan threshold: predictive aiming aims at the
            // current position.
            speed: 1200.0,
            beam: false,
            beam_width: 0.0,
            beam_duration: 0.0,
            effects: vec![BulletEffect::Piercing],
            targets: both.clone(),
        },
    );
    map.insert(
        OrdinanceKind::Shell,
        OrdinanceDef {
            size: 2.0,
            speed: 500.0,
            beam: false,
            beam_width: 0.0,
            beam_duration: 0.0,
            effects: vec![BulletEffect::Explosive],
            targets: ground.clone(),
        },
    );
    map.insert(
        OrdinanceKind::Rocket,
        OrdinanceDef {
            size: 2.0,
            speed: 320.0,
            beam: false,
            beam_width: 0.0,
            beam_duration: 0.0,
            effects: vec![BulletEffect::Explosive],
            targets: both.clone(),
        },
    );
    map.insert(
        OrdinanceKind::Grenade,
        OrdinanceDef {
            size: 1.5,
            speed: 260.0,
            beam: false,
            beam_width: 0.0,
            beam_duration: 0.0,
            effects: vec![BulletEffect::Explosive, BulletEffect::Fragmentation],
            targets: ground,
        },
    );
    map.insert(
        OrdinanceKind::ArcBeam,
        OrdinanceDef {
            size: 1.0,
            speed: 0.0,
            beam: true,
            beam_width: 3.0,
            beam_duration: 0.25,
            effects: vec![BulletEffect::Electric],
            targets: both.clone(),
        },
    );
    map.insert(
        OrdinanceKind::LaserBeam,
        OrdinanceDef {
            size: 1.0,
            speed: 0.0,
            beam: true,
            beam_width: 2.0,
            beam_duration: 0.15,
            effects: vec![],
            targets: both,
        },
    );
    map
}

fn standard_fields() -> BTreeMap<FieldEffectKind, FieldEffectDef> {
    let mut map = BTreeMap::new();
    let mut put = |kind, duration, instantaneous| {
        map.insert(
            kind,
            FieldEffectDef {
                duration,
                instantaneous,
            },
        );
    };
    put(FieldEffectKind::Explosion, 0.5, true);
    put(FieldEffectKind::Fire, 4.0, false);
    put(FieldEffectKind::Electric, 2.0, false);
    put(FieldEffectKind::Freeze, 3.0, false);
    put(FieldEffectKind::Fragmentation, 0.3, true);
    put(FieldEffectKind::Poison, 5.0, false);
    put(FieldEffectKind::HealZone, 6.0, false);
    put(FieldEffectKind::SlowField, 4.0, false);
    put(FieldEffectKind::ShieldBarrier, 8.0, false);
    put(FieldEffectKind::GravityWell, 3.0, false);
    put(FieldEffectKind::SpeedBoost, 4.0, false);
    put(FieldEffectKind::ProximityMine, 60.0, true);
    put(FieldEffectKind::Earthquake, 2.0, false);
    put(FieldEffectKind::WarningZone, 1.5, false);
    map
}

fn standard_factions() -> Vec<FactionDef> {
    vec![
        FactionDef {
            tag: "FORGE".to_string(),
            name: "Forgemasters".to_string(),
            starting_credits: 500.0,
            base_upkeep_cap: 250.0,
        },
        FactionDef {
            tag: "ASH".to_string(),
            name: "Ashborn".to_string(),
            starting_credits: 500.0,
            base_upkeep_cap: 250.0,
        },
    ]
}
