//! Error taxonomy for the simulation core.
//!
//! Order validation failures are surfaced to the offending player as a
//! WARNING event and never mutate state. Per-entity faults inside a tick are
//! logged and skipped. Only construction can fail fatally.

use thiserror::Error;

use crate::catalog::{BuildingType, ResearchType, UnitType};
use crate::entities::EntityId;

/// A player order that cannot be applied. The frame is discarded for the
/// offending unit/building; no state mutation occurs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("target {0:?} is gone or invalid")]
    UnknownTarget(EntityId),
    #[error("entity {0:?} is not owned by the ordering player")]
    NotOwned(EntityId),
    #[error("insufficient credits: need {need}, have {have}")]
    InsufficientCredits { need: f32, have: f32 },
    #[error("{0:?} requires tech tier {1}")]
    TechLocked(BuildingType, u8),
    #[error("research {0:?} prerequisites not met")]
    ResearchLocked(ResearchType),
    #[error("all research slots busy")]
    ResearchBusy,
    #[error("build location ({x:.0}, {y:.0}) is blocked")]
    LocationBlocked { x: f32, y: f32 },
    #[error("producing {0:?} would exceed the upkeep cap")]
    UpkeepExceeded(UnitType),
    #[error("low power: production is paused")]
    LowPower,
    #[error("{0:?} cannot be produced at this building")]
    WrongProducer(UnitType),
    #[error("order does not apply to this unit")]
    UnsupportedOrder,
}

/// Fatal construction failure. A game that fails to construct is unusable.
#[derive(Debug, Error)]
pub enum GameInitError {
    #[error("world generation produced no start location for player {0}")]
    MissingStartLocation(u32),
    #[error("world dimensions are degenerate: {width}x{height}")]
    BadWorldDimensions { width: f32, height: f32 },
    #[error("at least two players are required, got {0}")]
    NotEnoughPlayers(usize),
    #[error("duplicate player id {0}")]
    DuplicatePlayer(u32),
}
