//! Wall segments spanning two completed wall posts.

use super::{CoreFields, EntityId, PlayerId, TeamId, Targetable};
use crate::math::Vec2;

/// Health granted per unit of wall length.
pub const WALL_HEALTH_PER_LENGTH: f32 = 10.0;

/// Post-pair distance range within which a segment forms.
pub const WALL_LINK_MIN: f32 = 40.0;
pub const WALL_LINK_MAX: f32 = 200.0;

/// A wall spanning two posts. Holds post ids, never references; it is
/// reaped when either post dies or the pair drifts out of link range.
#[derive(Debug, Clone)]
pub struct WallSegment {
    pub core: CoreFields,
    pub post1: EntityId,
    pub post2: EntityId,
    pub length: f32,
}

impl WallSegment {
    pub fn span(
        id: EntityId,
        owner: PlayerId,
        team: TeamId,
        post1: (EntityId, Vec2),
        post2: (EntityId, Vec2),
    ) -> Self {
        let length = post1.1.distance_to(post2.1);
        let mut core = CoreFields::new(
            id,
            owner,
            team,
            Vec2::midpoint(post1.1, post2.1),
            length * WALL_HEALTH_PER_LENGTH,
        );
        core.rotation = (post2.1 - post1.1).angle();
        Self {
            core,
            post1: post1.0,
            post2: post2.0,
            length,
        }
    }

    /// Unordered-pair identity, for duplicate suppression.
    pub fn pair(&self) -> (EntityId, EntityId) {
        if self.post1 <= self.post2 {
            (self.post1, self.post2)
        } else {
            (self.post2, self.post1)
        }
    }

    pub fn links(&self, post: EntityId) -> bool {
        self.post1 == post || self.post2 == post
    }
}

impl Targetable for WallSegment {
    fn core(&self) -> &CoreFields {
        &self.core
    }
    fn core_mut(&mut self) -> &mut CoreFields {
        &mut self.core
    }
    fn radius(&self) -> f32 {
        self.length * 0.5
    }
}
