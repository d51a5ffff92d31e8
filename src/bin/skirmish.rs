//! Headless skirmish demo.
//!
//! Runs a two-player game on the tick thread for a few seconds, drives a
//! few orders through the input queue, and prints the events and a final
//! snapshot summary.
//!
//! Run with: `RUST_LOG=info cargo run --bin skirmish`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use nmf_sim::channel::UnitOrder;
use nmf_sim::entities::{PlayerId, TeamId};
use nmf_sim::{
    Catalog, Game, GameConfig, InputFrame, PlayerChannel, PlayerSlot, ServerMessage,
    SkirmishGenerator,
};

/// Console channel: prints events, counts snapshots.
struct ConsoleChannel {
    label: &'static str,
    open: AtomicBool,
    snapshots: std::sync::atomic::AtomicU64,
}

impl ConsoleChannel {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            open: AtomicBool::new(true),
            snapshots: std::sync::atomic::AtomicU64::new(0),
        })
    }
}

impl PlayerChannel for ConsoleChannel {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send(&self, message: &ServerMessage) {
        match message {
            ServerMessage::Event(event) => {
                println!("[{}] {:?}: {}", self.label, event.category, event.message);
            }
            ServerMessage::Snapshot(_) => {
                self.snapshots.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

fn main() {
    env_logger::init();
    println!("=== No Man's Forge - headless skirmish ===\n");

    let catalog = Arc::new(Catalog::standard());
    let players = vec![
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
    ];

    let game = Game::new(
        GameConfig::default(),
        catalog,
        &SkirmishGenerator::with_seed(7),
        players,
    )
    .expect("game construction");

    let channels = game.channels();
    let inputs = game.inputs();
    let p1 = ConsoleChannel::new("p1");
    let p2 = ConsoleChannel::new("p2");
    channels.register(PlayerId(1), p1.clone(), false);
    channels.register(PlayerId(2), p2.clone(), false);

    // Send each player's workers to the nearest ore field.
    let mut harvest_orders = Vec::new();
    {
        let world = game.world();
        for player in [PlayerId(1), PlayerId(2)] {
            let workers: Vec<_> = world
                .units
                .iter()
                .filter(|(_, u)| u.core.owner == player)
                .map(|(id, u)| (*id, u.core.position))
                .collect();
            if let Some((_, anchor)) = workers.first() {
                if let Some((deposit, _)) = world
                    .deposits
                    .iter()
                    .min_by_key(|(_, d)| d.core.position.distance_to(*anchor) as u64)
                {
                    harvest_orders.push((
                        player,
                        InputFrame {
                            selection: Some(workers.iter().map(|(id, _)| *id).collect()),
                            order: Some(UnitOrder::Harvest { deposit: *deposit }),
                            ..InputFrame::default()
                        },
                    ));
                }
            }
        }
    }

    let mut runner = nmf_sim::GameRunner::start(game).expect("tick thread");
    for (player, frame) in harvest_orders {
        inputs.submit(player, frame);
    }

    println!("Running for 15 seconds of wall time...\n");
    thread::sleep(Duration::from_secs(15));

    let game = runner.stop().expect("game returns on stop");
    println!("\n=== Final state (frame {}) ===", game.frame());
    for player in [PlayerId(1), PlayerId(2)] {
        let faction = game.world().faction(player).expect("faction");
        println!(
            "{}: credits={:.0} upkeep={:.0}/{:.0} power={:.0}/{:.0}",
            faction.name,
            faction.credits,
            faction.current_upkeep,
            faction.max_upkeep,
            faction.power_consumed,
            faction.power_generated,
        );
    }
    println!(
        "snapshots delivered: p1={} p2={}",
        p1.snapshots.load(Ordering::Relaxed),
        p2.snapshots.load(Ordering::Relaxed),
    );

    let snapshot = game.snapshot_for(PlayerId(1), false);
    println!(
        "p1 sees {} units, {} buildings, {} deposits",
        snapshot.units.len(),
        snapshot.buildings.len(),
        snapshot.resource_deposits.len(),
    );
}
