//! Timed area effects.

use std::collections::BTreeSet;

use super::{CoreFields, EntityId, PlayerId, TeamId};
use crate::catalog::FieldEffectKind;
use crate::math::Vec2;

/// A timed, possibly continuous, area that mutates entities inside its
/// radius. Instantaneous kinds apply once per entity; continuous kinds
/// apply `dps * dt` every tick.
#[derive(Debug, Clone)]
pub struct FieldEffect {
    pub core: CoreFields,
    pub kind: FieldEffectKind,
    pub radius: f32,
    pub initial_radius: f32,
    pub remaining: f32,
    pub duration: f32,
    /// Damage (or healing) per second for continuous kinds; full one-shot
    /// amount for instantaneous kinds.
    pub dps: f32,
    /// Entities already affected, for instantaneous kinds and mines.
    pub affected: BTreeSet<EntityId>,
}

impl FieldEffect {
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        id: EntityId,
        owner: PlayerId,
        team: TeamId,
        position: Vec2,
        kind: FieldEffectKind,
        radius: f32,
        duration: f32,
        dps: f32,
    ) -> Self {
        Self {
            core: CoreFields::new(id, owner, team, position, 1.0),
            kind,
            radius,
            initial_radius: radius,
            remaining: duration,
            duration,
            dps,
            affected: BTreeSet::new(),
        }
    }

    pub fn life_fraction(&self) -> f32 {
        if self.duration <= 0.0 {
            0.0
        } else {
            (self.remaining / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Fire and fragmentation clouds shrink toward half size over their
    /// lifetime; other kinds keep their radius.
    pub fn shrinks(&self) -> bool {
        matches!(
            self.kind,
            FieldEffectKind::Fire | FieldEffectKind::Fragmentation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::alloc_entity_id;

    #[test]
    fn test_life_fraction() {
        let mut f = FieldEffect::create(
            alloc_entity_id(),
            PlayerId(1),
            TeamId(1),
            Vec2::ZERO,
            FieldEffectKind::Fire,
            40.0,
            4.0,
            10.0,
        );
        assert!((f.life_fraction() - 1.0).abs() < 1e-6);
        f.remaining = 1.0;
        assert!((f.life_fraction() - 0.25).abs() < 1e-6);
    }
}
