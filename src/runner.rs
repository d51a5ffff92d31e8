//! The dedicated tick thread.
//!
//! Runs the pipeline every 20 ms of wall time. A panicking tick is caught,
//! logged and abandoned; the next tick proceeds. `stop()` is idempotent and
//! returns the final game state to the caller.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::engine::Game;

/// Handle to a running game's tick thread.
pub struct GameRunner {
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<Game>>,
}

impl GameRunner {
    /// Take ownership of the game and start ticking it on a dedicated
    /// thread.
    pub fn start(game: Game) -> std::io::Result<Self> {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop_flag);

        let handle = thread::Builder::new()
            .name("sim-tick".to_string())
            .spawn(move || run_loop(game, flag))?;

        Ok(Self {
            stop_flag,
            handle: Some(handle),
        })
    }

    /// Stop the tick thread and return the final game. Safe to call more
    /// than once; later calls return `None`.
    pub fn stop(&mut self) -> Option<Game> {
        self.stop_flag.store(true, Ordering::SeqCst);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(game) => Some(game),
            Err(_) => {
                log::error!("tick thread terminated abnormally");
                None
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for GameRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(mut game: Game, stop_flag: Arc<AtomicBool>) -> Game {
    let interval = Duration::from_millis(game.config().tick_interval_ms);
    let epoch = Instant::now();
    let mut next_tick = Instant::now();
    let mut slow_ticks: u64 = 0;

    while !stop_flag.load(Ordering::SeqCst) && !game.is_over() {
        let now_ns = epoch.elapsed().as_nanos() as u64;
        let started = Instant::now();

        // A panicking tick is abandoned; the game does not terminate.
        if catch_unwind(AssertUnwindSafe(|| game.tick(now_ns))).is_err() {
            log::error!("tick {} panicked; abandoning tick", game.frame());
        }

        let cost = started.elapsed();
        if cost > interval {
            slow_ticks += 1;
            log::warn!(
                "tick {} overran its budget: {:?} (slow ticks: {slow_ticks})",
                game.frame(),
                cost
            );
        }

        next_tick += interval;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        } else {
            // Fell behind; resynchronize rather than bursting.
            next_tick = now;
        }
    }

    log::info!(
        "tick loop stopped at frame {} (game over: {})",
        game.frame(),
        game.is_over()
    );
    game
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::engine::{GameConfig, PlayerSlot};
    use crate::entities::{PlayerId, TeamId};
    use crate::worldgen::SkirmishGenerator;

    fn new_game() -> Game {
        Game::new(
            GameConfig::default(),
            Arc::new(Catalog::standard()),
            &SkirmishGenerator::with_seed(1),
            vec![
                PlayerSlot {
                    player: PlayerId(1),
                    team: TeamId(1),
                    name: "a".to_string(),
                    faction_tag: "FORGE".to_string(),
                },
                PlayerSlot {
                    player: PlayerId(2),
                    team: TeamId(2),
                    name: "b".to_string(),
                    faction_tag: "ASH".to_string(),
                },
            ],
        )
        .expect("game constructs")
    }

    #[test]
    fn test_runner_ticks_and_stops() {
        let mut runner = GameRunner::start(new_game()).expect("runner starts");
        thread::sleep(Duration::from_millis(120));
        let game = runner.stop().expect("first stop returns the game");
        assert!(game.frame() >= 3, "several ticks ran, got {}", game.frame());

        // Idempotent: a second stop is a no-op.
        assert!(runner.stop().is_none());
        assert!(!runner.is_running());
    }
}
