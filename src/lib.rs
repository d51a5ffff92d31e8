//! No Man's Forge - Server Simulation Core
//!
//! The authoritative, fixed-timestep simulation engine for a multiplayer
//! real-time strategy game. The engine advances a deterministic world from
//! player commands and timed tick events, resolves combat through a 2D
//! rigid-body layer, and emits per-player, vision-filtered snapshots.
//!
//! Transport, map art, and clients live outside this crate; they talk to the
//! core through [`channel::PlayerChannel`] and [`channel::InputFrame`].

pub mod catalog;
pub mod channel;
pub mod collision;
pub mod commands;
pub mod engine;
pub mod entities;
pub mod error;
pub mod events;
pub mod math;
pub mod orders;
pub mod physics;
pub mod runner;
pub mod snapshot;
pub mod spatial;
pub mod systems;
pub mod visibility;
pub mod world;
pub mod worldgen;

pub use catalog::Catalog;
pub use channel::{ChannelRegistry, InputFrame, InputQueue, PlayerChannel, ServerMessage};
pub use engine::{Game, GameConfig, PlayerSlot};
pub use entities::{EntityId, PlayerId, TeamId};
pub use error::{GameInitError, OrderError};
pub use events::{EventCategory, EventTarget, GameEvent};
pub use runner::GameRunner;
pub use snapshot::GameState;
pub use spatial::{SpatialEntry, SpatialGrid};
pub use world::World;
pub use worldgen::{SkirmishGenerator, WorldGenerator};
