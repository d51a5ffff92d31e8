//! World generation: starting bases, resource fields, obstacles.
//!
//! The generator is an external collaborator called once at construction;
//! the seeded skirmish generator here is the default used by the demo and
//! the tests. Generation is the only place the simulation touches an RNG.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::{Biome, ResourceKind};
use crate::entities::{PlayerId, TeamId};
use crate::math::Vec2;

/// One joining player, as the session layer describes them.
#[derive(Debug, Clone)]
pub struct PlayerSlot {
    pub player: PlayerId,
    pub team: TeamId,
    pub name: String,
    pub faction_tag: String,
}

#[derive(Debug, Clone)]
pub struct StartLocation {
    pub player: PlayerId,
    pub position: Vec2,
}

#[derive(Debug, Clone)]
pub struct DepositSpec {
    pub kind: ResourceKind,
    pub position: Vec2,
    pub amount: f32,
}

#[derive(Debug, Clone)]
pub struct ObstacleSpec {
    pub position: Vec2,
    pub radius: f32,
    pub destructible: bool,
    pub health: f32,
}

/// Everything the engine needs to materialize a fresh world.
#[derive(Debug, Clone)]
pub struct WorldBlueprint {
    pub width: f32,
    pub height: f32,
    pub biome: Biome,
    pub starts: Vec<StartLocation>,
    pub deposits: Vec<DepositSpec>,
    pub obstacles: Vec<ObstacleSpec>,
}

/// Map generation collaborator.
pub trait WorldGenerator {
    fn generate(&self, players: &[PlayerSlot]) -> WorldBlueprint;
}

/// Seeded default generator: starts on a ring, ore near each base, a
/// scattering of rocks in the interior.
#[derive(Debug, Clone)]
pub struct SkirmishGenerator {
    pub seed: u64,
    pub width: f32,
    pub height: f32,
}

impl Default for SkirmishGenerator {
    fn default() -> Self {
        Self {
            seed: 0,
            width: 4096.0,
            height: 4096.0,
        }
    }
}

impl SkirmishGenerator {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl WorldGenerator for SkirmishGenerator {
    fn generate(&self, players: &[PlayerSlot]) -> WorldBlueprint {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let center = Vec2::new(self.width * 0.5, self.height * 0.5);
        let ring = self.width.min(self.height) * 0.38;

        let biome = Biome::ALL[(self.seed % Biome::ALL.len() as u64) as usize];

        let mut starts = Vec::new();
        let mut deposits = Vec::new();
        for (index, slot) in players.iter().enumerate() {
            let angle = (index as f32 / players.len().max(1) as f32) * std::f32::consts::TAU;
            let position = center + Vec2::from_angle(angle) * ring;
            starts.push(StartLocation {
                player: slot.player,
                position,
            });

            // Two ore fields near each base, biased toward the map center.
            for _ in 0..2 {
                let jitter = Vec2::new(rng.gen_range(-60.0..60.0), rng.gen_range(-60.0..60.0));
                let toward_center = (center - position).normalized() * rng.gen_range(140.0..220.0);
                deposits.push(DepositSpec {
                    kind: ResourceKind::Ore,
                    position: position + toward_center + jitter,
                    amount: 1500.0,
                });
            }
        }

        // A crystal field in the contested middle.
        for _ in 0..3 {
            let jitter = Vec2::new(rng.gen_range(-150.0..150.0), rng.gen_range(-150.0..150.0));
            deposits.push(DepositSpec {
                kind: ResourceKind::Crystal,
                position: center + jitter,
                amount: 2500.0,
            });
        }

        // Rocks between the bases; about half can be mined through.
        let mut obstacles = Vec::new();
        for _ in 0..12 {
            let position = Vec2::new(
                rng.gen_range(self.width * 0.2..self.width * 0.8),
                rng.gen_range(self.height * 0.2..self.height * 0.8),
            );
            // Keep spawn areas clear.
            if starts
                .iter()
                .any(|s| s.position.distance_to(position) < 350.0)
            {
                continue;
            }
            let destructible = rng.gen_bool(0.5);
            obstacles.push(ObstacleSpec {
                position,
                radius: rng.gen_range(20.0..40.0),
                destructible,
                health: 300.0,
            });
        }

        WorldBlueprint {
            width: self.width,
            height: self.height,
            biome,
            starts,
            deposits,
            obstacles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_players() -> Vec<PlayerSlot> {
        vec![
            PlayerSlot {
                player: PlayerId(1),
                team: TeamId(1),
                name: "Nia".to_string(),
                faction_tag: "FORGE".to_string(),
            },
            PlayerSlot {
                player: PlayerId(2),
                team: TeamId(2),
                name: "Rourke".to_string(),
                faction_tag: "ASH".to_string(),
            },
        ]
    }

    #[test]
    fn test_every_player_gets_a_start() {
        let blueprint = SkirmishGenerator::with_seed(7).generate(&two_players());
        assert_eq!(blueprint.starts.len(), 2);
        let a = blueprint.starts[0].position;
        let b = blueprint.starts[1].position;
        assert!(
            a.distance_to(b) > 1500.0,
            "starts must be far apart, got {}",
            a.distance_to(b)
        );
    }

    #[test]
    fn test_deposits_near_each_start() {
        let blueprint = SkirmishGenerator::with_seed(7).generate(&two_players());
        for start in &blueprint.starts {
            let nearby = blueprint
                .deposits
                .iter()
                .filter(|d| d.position.distance_to(start.position) < 400.0)
                .count();
            assert!(nearby >= 2, "each base needs harvestable ore in reach");
        }
    }

    #[test]
    fn test_same_seed_same_map() {
        let a = SkirmishGenerator::with_seed(42).generate(&two_players());
        let b = SkirmishGenerator::with_seed(42).generate(&two_players());
        assert_eq!(a.biome, b.biome);
        assert_eq!(a.deposits.len(), b.deposits.len());
        for (da, db) in a.deposits.iter().zip(&b.deposits) {
            assert_eq!(da.position, db.position);
        }
    }

    #[test]
    fn test_obstacles_keep_clear_of_starts() {
        let blueprint = SkirmishGenerator::with_seed(3).generate(&two_players());
        for obstacle in &blueprint.obstacles {
            for start in &blueprint.starts {
                assert!(obstacle.position.distance_to(start.position) >= 350.0);
            }
        }
    }
}
