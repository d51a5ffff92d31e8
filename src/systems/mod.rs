//! Per-stage simulation systems.
//!
//! Each system is a free function over the world, invoked by the tick
//! pipeline in a fixed order (see `engine`). Systems that iterate a family
//! while mutating the rest of the world use the take-mutate-reinsert
//! pattern so the entity maps never alias.

pub mod buildings;
pub mod economy;
pub mod fields;
pub mod ordinance;
pub mod reaping;
pub mod research;
pub mod sensors;
pub mod termination;
pub mod walls;
pub mod weapons;
