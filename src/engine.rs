//! The game engine: construction and the fixed tick pipeline.
//!
//! One tick runs thirteen stages in a fixed order: clock, economy sampler,
//! research, input intake, unit update, building update, ordinance update,
//! physics step + collision mapping, field effects, reaping, disconnect
//! check, termination check, snapshot broadcast. Entity iteration is by
//! ascending id throughout, so identical input traces replay identically.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::catalog::Catalog;
use crate::channel::{ChannelRegistry, InputFrame, InputQueue, ServerMessage};
use crate::collision;
use crate::commands;
use crate::entities::{EntityId, PlayerFaction, PlayerId};
use crate::error::GameInitError;
use crate::events::{EventTarget, GameEvent};
use crate::math::Vec2;
use crate::orders;
use crate::snapshot::{self, GameState};
use crate::systems::{buildings, economy, fields, ordinance, reaping, research, termination};
use crate::world::World;
pub use crate::worldgen::PlayerSlot;
use crate::worldgen::WorldGenerator;

/// Fixed tick cadence.
pub const TICK_INTERVAL_MS: u64 = 20;

/// Engine tuning knobs. Defaults match the production cadence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Milliseconds between ticks.
    pub tick_interval_ms: u64,
    /// Ceiling on a single tick's delta, so a stall cannot teleport
    /// entities.
    pub max_dt_secs: f32,
    /// Workers spawned with each starting base.
    pub starting_workers: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            max_dt_secs: 0.1,
            starting_workers: 3,
        }
    }
}

/// The authoritative game instance. All simulation state lives here and is
/// only touched from the tick thread; the input queue and channel registry
/// are the sole cross-thread surfaces.
pub struct Game {
    world: World,
    config: GameConfig,
    channels: Arc<ChannelRegistry>,
    inputs: Arc<InputQueue>,
    frame: u64,
    last_tick_ns: Option<u64>,
    elapsed: f64,
    outcome: Option<termination::Outcome>,
}

impl Game {
    /// Construct a game: generate the map, seed factions, starting bases
    /// and workers. Construction is the only fatal failure point.
    pub fn new(
        config: GameConfig,
        catalog: Arc<Catalog>,
        generator: &dyn WorldGenerator,
        players: Vec<PlayerSlot>,
    ) -> Result<Self, GameInitError> {
        if players.len() < 2 {
            return Err(GameInitError::NotEnoughPlayers(players.len()));
        }
        {
            let mut seen = std::collections::BTreeSet::new();
            for slot in &players {
                if !seen.insert(slot.player) {
                    return Err(GameInitError::DuplicatePlayer(slot.player.0));
                }
            }
        }

        let blueprint = generator.generate(&players);
        if blueprint.width <= 0.0 || blueprint.height <= 0.0 {
            return Err(GameInitError::BadWorldDimensions {
                width: blueprint.width,
                height: blueprint.height,
            });
        }

        let mut world = World::new(
            Arc::clone(&catalog),
            blueprint.width,
            blueprint.height,
            blueprint.biome,
        );

        for slot in &players {
            world.factions.insert(
                slot.player,
                PlayerFaction::join(
                    slot.player,
                    slot.team,
                    slot.name.clone(),
                    slot.faction_tag.clone(),
                    &catalog,
                ),
            );
        }

        for spec in &blueprint.deposits {
            world.spawn_deposit(spec.position, spec.kind, spec.amount);
        }
        for spec in &blueprint.obstacles {
            world.spawn_obstacle(spec.position, spec.radius, spec.destructible, spec.health);
        }

        for slot in &players {
            let start = blueprint
                .starts
                .iter()
                .find(|s| s.player == slot.player)
                .ok_or(GameInitError::MissingStartLocation(slot.player.0))?;

            world.spawn_building(
                slot.player,
                slot.team,
                crate::catalog::BuildingType::Headquarters,
                start.position,
                true,
            );
            let hq_radius = catalog
                .building(crate::catalog::BuildingType::Headquarters)
                .radius;
            let worker_radius = catalog.unit(crate::catalog::UnitType::Worker).radius;
            for i in 0..config.starting_workers {
                let angle = 0.5 + i as f32 * 0.6;
                let offset = Vec2::from_angle(angle) * (hq_radius + worker_radius + 12.0);
                world.spawn_unit(
                    slot.player,
                    slot.team,
                    crate::catalog::UnitType::Worker,
                    start.position + offset,
                );
            }
        }

        // Upkeep starts consistent with the spawned workers.
        economy::sample_economy(&mut world);

        log::info!(
            "game constructed: {} players, {}x{} {:?}",
            players.len(),
            blueprint.width,
            blueprint.height,
            blueprint.biome
        );

        Ok(Self {
            world,
            config,
            channels: Arc::new(ChannelRegistry::default()),
            inputs: Arc::new(InputQueue::default()),
            frame: 0,
            last_tick_ns: None,
            elapsed: 0.0,
            outcome: None,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Channel registry handle for the transport layer.
    pub fn channels(&self) -> Arc<ChannelRegistry> {
        Arc::clone(&self.channels)
    }

    /// Input queue handle for the transport layer.
    pub fn inputs(&self) -> Arc<InputQueue> {
        Arc::clone(&self.inputs)
    }

    /// Transport callback: queue a frame for the next tick (latest wins).
    pub fn accept_player_input(&self, player: PlayerId, frame: InputFrame) {
        self.inputs.submit(player, frame);
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn winning_team(&self) -> Option<crate::entities::TeamId> {
        self.outcome.and_then(|o| o.winning_team)
    }

    /// Build the vision-filtered snapshot one player would receive now.
    pub fn snapshot_for(&self, player: PlayerId, spectator: bool) -> GameState {
        snapshot::build_snapshot(&self.world, player, spectator, (self.elapsed * 1000.0) as u64)
    }

    /// Advance the simulation one tick. `now_ns` comes from a monotonic
    /// clock; the delta is clamped so stalls never teleport entities.
    pub fn tick(&mut self, now_ns: u64) {
        if self.is_over() {
            return;
        }

        // Stage 1: clock and bookkeeping.
        let dt = match self.last_tick_ns {
            Some(last) => {
                let raw = now_ns.saturating_sub(last) as f64 / 1e9;
                (raw as f32).clamp(0.0, self.config.max_dt_secs)
            }
            None => self.config.tick_interval_ms as f32 / 1000.0,
        };
        self.last_tick_ns = Some(now_ns);
        self.frame += 1;
        self.elapsed += dt as f64;
        let now = self.elapsed;

        // Stage 2: economy sampler.
        if self.frame % economy::SAMPLE_INTERVAL_TICKS == 0 {
            economy::sample_economy(&mut self.world);
        }

        // Stage 3: research sampler.
        research::update_research(&mut self.world, dt);

        // Stage 4: input intake (latest frame per player).
        let frames: BTreeMap<PlayerId, InputFrame> = self.inputs.drain();
        for (player, frame) in frames {
            orders::apply_frame(&mut self.world, player, frame);
        }

        // Stage 5: unit update.
        self.world.rebuild_spatial();
        let unit_ids: Vec<EntityId> = self.world.units.keys().copied().collect();
        for id in unit_ids {
            let Some(mut unit) = self.world.units.remove(&id) else {
                continue;
            };
            if unit.core.active && !unit.is_garrisoned() {
                commands::update_unit(&mut unit, &mut self.world, dt);
            }
            self.world.units.insert(id, unit);
        }

        // Stage 6: building update.
        buildings::update_buildings(&mut self.world, dt);

        // Stage 7: projectile/beam update.
        ordinance::update_ordinance(&mut self.world, dt);

        // Stage 8: physics step, then buffered collision mapping.
        let contacts = self.world.physics.step(dt);
        self.world.sync_positions_from_physics();
        collision::process_contacts(&mut self.world, contacts);
        self.world.rebuild_spatial();

        // Stage 9: field effects.
        fields::update_fields(&mut self.world, dt);

        // Stage 10: reaping.
        reaping::reap(&mut self.world, now);

        // Stage 11: disconnect check.
        for player in self.channels.reap_closed() {
            if let Some(faction) = self.world.faction_mut(player) {
                if faction.connected {
                    faction.connected = false;
                    let name = faction.name.clone();
                    self.world.events.push(GameEvent::system(
                        format!("{name} disconnected"),
                        EventTarget::All,
                    ));
                    log::info!("player {player:?} disconnected");
                }
            }
        }

        // Stage 12: termination check.
        if self.outcome.is_none() {
            self.outcome = termination::evaluate(&mut self.world, self.elapsed);
        }

        // Stage 13: event fan-out, then snapshot broadcast.
        self.flush_events();
        if self.outcome.is_none() {
            self.broadcast_snapshots();
        }
    }

    /// Advance one tick and report its wall-clock cost.
    #[cfg(any(test, feature = "profile"))]
    pub fn tick_profiled(&mut self, now_ns: u64) -> std::time::Duration {
        let start = std::time::Instant::now();
        self.tick(now_ns);
        start.elapsed()
    }

    fn flush_events(&mut self) {
        let events = self.world.events.drain();
        if events.is_empty() {
            return;
        }
        let endpoints = self.channels.endpoints();
        for event in events {
            let message = ServerMessage::Event(event.record());
            for (player, spectator, channel) in &endpoints {
                if !channel.is_open() {
                    continue;
                }
                let team = self.world.team_of_player(*player);
                if event.applies_to(*player, team, *spectator) {
                    channel.send(&message);
                }
            }
        }
    }

    fn broadcast_snapshots(&mut self) {
        let timestamp_ms = (self.elapsed * 1000.0) as u64;
        for (player, spectator, channel) in self.channels.endpoints() {
            if !channel.is_open() {
                continue;
            }
            if !spectator && self.world.faction(player).is_none() {
                continue;
            }
            let state = snapshot::build_snapshot(&self.world, player, spectator, timestamp_ms);
            channel.send(&ServerMessage::Snapshot(state));
        }
    }
}
