//! Spatial partitioning for sensor scans and visibility.
//!
//! Provides O(1) cell lookup and O(k) neighbor queries where k is the number
//! of entities in nearby cells, rather than O(n) for brute force. The grid
//! is rebuilt from the entity maps at the start of every tick.

use std::collections::HashMap;

use crate::entities::{EntityId, EntityKind, TeamId};
use crate::math::Vec2;

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy)]
pub struct SpatialEntry {
    pub id: EntityId,
    pub kind: EntityKind,
    pub team: TeamId,
    pub position: Vec2,
    pub radius: f32,
}

/// Grid-based spatial partitioning structure.
///
/// Divides the world into cells and tracks which entities are in each cell.
/// Query results are sorted by distance with id as the tie-break, so equal
/// distances resolve identically on every machine.
#[derive(Debug)]
pub struct SpatialGrid {
    pub cell_size: f32,
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    count: usize,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(64.0)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            count: 0,
        }
    }

    #[inline]
    fn world_to_cell(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    /// Clear all entries (call before rebuilding each tick).
    pub fn clear(&mut self) {
        self.cells.clear();
        self.count = 0;
    }

    pub fn insert(&mut self, entry: SpatialEntry) {
        let cell = self.world_to_cell(entry.position);
        self.cells.entry(cell).or_default().push(entry);
        self.count += 1;
    }

    /// All entries whose center is within `radius` of `center`, sorted by
    /// distance then id.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<SpatialEntry> {
        let radius_sq = radius * radius;
        let span = (radius / self.cell_size).ceil() as i32 + 1;
        let origin = self.world_to_cell(center);

        let mut results = Vec::new();
        for dx in -span..=span {
            for dy in -span..=span {
                let cell = (origin.0 + dx, origin.1 + dy);
                if let Some(entries) = self.cells.get(&cell) {
                    for entry in entries {
                        if (entry.position - center).length_squared() <= radius_sq {
                            results.push(*entry);
                        }
                    }
                }
            }
        }

        results.sort_by(|a, b| {
            let da = (a.position - center).length_squared();
            let db = (b.position - center).length_squared();
            da.partial_cmp(&db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        results
    }

    /// Entries within radius belonging to a different team.
    pub fn query_enemies(&self, center: Vec2, radius: f32, team: TeamId) -> Vec<SpatialEntry> {
        let mut results = self.query_radius(center, radius);
        results.retain(|e| e.team != team);
        results
    }

    /// Entries within radius belonging to the given team.
    pub fn query_team(&self, center: Vec2, radius: f32, team: TeamId) -> Vec<SpatialEntry> {
        let mut results = self.query_radius(center, radius);
        results.retain(|e| e.team == team);
        results
    }

    pub fn total_count(&self) -> usize {
        self.count
    }
}
