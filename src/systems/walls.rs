//! Wall-segment maintenance.
//!
//! A completed wall post links to every completed same-team post whose
//! distance lies in the link window. Duplicate unordered pairs are
//! suppressed; segments die with either post.

use crate::entities::{Building, EntityId, WallSegment};
use crate::entities::{WALL_LINK_MAX, WALL_LINK_MIN};
use crate::world::World;

/// Connect a freshly completed wall post to its completed neighbours.
/// The post itself is detached from the map while its building ticks; its
/// data rides in `post`.
pub fn link_post(world: &mut World, post: &Building) {
    if post.kind != crate::catalog::BuildingType::WallPost {
        return;
    }
    let candidates: Vec<(EntityId, crate::math::Vec2)> = world
        .buildings
        .iter()
        .filter(|(id, other)| {
            **id != post.core.id
                && other.kind == crate::catalog::BuildingType::WallPost
                && other.core.active
                && !other.under_construction
                && other.core.team == post.core.team
        })
        .map(|(id, other)| (*id, other.core.position))
        .filter(|(_, position)| {
            let dist = post.core.position.distance_to(*position);
            (WALL_LINK_MIN..=WALL_LINK_MAX).contains(&dist)
        })
        .collect();

    for (other_id, other_pos) in candidates {
        if segment_exists(world, post.core.id, other_id) {
            continue;
        }
        world.spawn_wall_segment(
            post.core.owner,
            post.core.team,
            (post.core.id, post.core.position),
            (other_id, other_pos),
        );
    }
}

fn segment_exists(world: &World, a: EntityId, b: EntityId) -> bool {
    let pair = if a <= b { (a, b) } else { (b, a) };
    world.wall_segments.values().any(|s| s.pair() == pair)
}

/// Re-establish the segment invariant: both posts alive, complete, and in
/// link range. Violations mark the segment for reaping.
pub fn maintain(world: &mut World) {
    let mut dead: Vec<EntityId> = Vec::new();
    for (id, segment) in &world.wall_segments {
        if !segment.core.active {
            continue;
        }
        if !post_ok(world, segment, segment.post1) || !post_ok(world, segment, segment.post2) {
            dead.push(*id);
        }
    }
    for id in dead {
        if let Some(segment) = world.wall_segments.get_mut(&id) {
            segment.core.active = false;
        }
    }
}

fn post_ok(world: &World, segment: &WallSegment, post: EntityId) -> bool {
    let Some(building) = world.buildings.get(&post) else {
        return false;
    };
    if !building.core.active || building.under_construction {
        return false;
    }
    let other = if segment.post1 == post {
        segment.post2
    } else {
        segment.post1
    };
    let Some(other) = world.buildings.get(&other) else {
        return false;
    };
    let dist = building.core.position.distance_to(other.core.position);
    (WALL_LINK_MIN..=WALL_LINK_MAX).contains(&dist)
}
