//! Full-pipeline tick cost at scale.
//!
//! Run with: `cargo bench`

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use nmf_sim::catalog::UnitType;
use nmf_sim::entities::{PlayerId, TeamId};
use nmf_sim::math::Vec2;
use nmf_sim::{Catalog, Game, GameConfig, PlayerSlot, SkirmishGenerator};

fn build_game(units_per_side: usize) -> Game {
    let players = vec![
        PlayerSlot {
            player: PlayerId(1),
            team: TeamId(1),
            name: "bench-a".to_string(),
            faction_tag: "FORGE".to_string(),
        },
        PlayerSlot {
            player: PlayerId(2),
            team: TeamId(2),
            name: "bench-b".to_string(),
            faction_tag: "ASH".to_string(),
        },
    ];
    let mut game = Game::new(
        GameConfig::default(),
        Arc::new(Catalog::standard()),
        &SkirmishGenerator::with_seed(99),
        players,
    )
    .expect("game constructs");

    // Two massed armies far enough apart to stay out of combat.
    let cols = 20;
    for i in 0..units_per_side {
        let row = (i / cols) as f32;
        let col = (i % cols) as f32;
        game.world_mut().spawn_unit(
            PlayerId(1),
            TeamId(1),
            UnitType::Trooper,
            Vec2::new(600.0 + col * 20.0, 600.0 + row * 20.0),
        );
        game.world_mut().spawn_unit(
            PlayerId(2),
            TeamId(2),
            UnitType::Trooper,
            Vec2::new(3000.0 + col * 20.0, 3000.0 + row * 20.0),
        );
    }
    game
}

fn bench_tick(c: &mut Criterion) {
    for units_per_side in [100usize, 400] {
        let mut game = build_game(units_per_side);
        let mut frame: u64 = 0;
        c.bench_function(&format!("tick_{}_units", units_per_side * 2), |b| {
            b.iter(|| {
                frame += 1;
                game.tick(frame * 20_000_000);
            });
        });
    }
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
