//! End-to-end skirmish scenarios driven through the public engine surface.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use nmf_sim::catalog::{ResourceKind, UnitType};
use nmf_sim::channel::UnitOrder;
use nmf_sim::entities::{EntityId, PlayerId, Stance, TeamId};
use nmf_sim::math::Vec2;
use nmf_sim::worldgen::{DepositSpec, PlayerSlot, StartLocation, WorldBlueprint, WorldGenerator};
use nmf_sim::{Catalog, Game, GameConfig, InputFrame, PlayerChannel, ServerMessage};

const TICK_NS: u64 = 20_000_000;

/// Deterministic map: fixed starts, fixed deposits, no obstacles.
struct FixedMap {
    starts: Vec<(u32, f32, f32)>,
    deposits: Vec<(f32, f32, f32)>,
}

impl WorldGenerator for FixedMap {
    fn generate(&self, _players: &[PlayerSlot]) -> WorldBlueprint {
        WorldBlueprint {
            width: 4096.0,
            height: 4096.0,
            biome: nmf_sim::catalog::Biome::Ashlands,
            starts: self
                .starts
                .iter()
                .map(|(player, x, y)| StartLocation {
                    player: PlayerId(*player),
                    position: Vec2::new(*x, *y),
                })
                .collect(),
            deposits: self
                .deposits
                .iter()
                .map(|(x, y, amount)| DepositSpec {
                    kind: ResourceKind::Ore,
                    position: Vec2::new(*x, *y),
                    amount: *amount,
                })
                .collect(),
            obstacles: vec![],
        }
    }
}

struct CountingChannel {
    open: AtomicBool,
    snapshots: AtomicU64,
    events: parking_lot::Mutex<Vec<String>>,
}

impl CountingChannel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            open: AtomicBool::new(true),
            snapshots: AtomicU64::new(0),
            events: parking_lot::Mutex::new(Vec::new()),
        })
    }

    fn snapshot_count(&self) -> u64 {
        self.snapshots.load(Ordering::SeqCst)
    }
}

impl PlayerChannel for CountingChannel {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
    fn send(&self, message: &ServerMessage) {
        match message {
            ServerMessage::Snapshot(_) => {
                self.snapshots.fetch_add(1, Ordering::SeqCst);
            }
            ServerMessage::Event(event) => {
                self.events.lock().push(event.message.clone());
            }
        }
    }
}

fn slot(player: u32, team: u8, name: &str) -> PlayerSlot {
    PlayerSlot {
        player: PlayerId(player),
        team: TeamId(team),
        name: name.to_string(),
        faction_tag: "FORGE".to_string(),
    }
}

fn two_player_game(deposits: Vec<(f32, f32, f32)>) -> Game {
    let generator = FixedMap {
        starts: vec![(1, 500.0, 500.0), (2, 3500.0, 3500.0)],
        deposits,
    };
    Game::new(
        GameConfig::default(),
        Arc::new(Catalog::standard()),
        &generator,
        vec![slot(1, 1, "Nia"), slot(2, 2, "Rourke")],
    )
    .expect("game constructs")
}

/// Advance `ticks` fixed steps, continuing from the frame counter.
fn run_ticks(game: &mut Game, ticks: u64) {
    let start = game.frame();
    for i in 0..ticks {
        game.tick((start + i + 1) * TICK_NS);
    }
}

#[test]
fn scenario_startup_visibility() {
    let game = two_player_game(vec![]);

    for (viewer, own_team) in [(PlayerId(1), TeamId(1)), (PlayerId(2), TeamId(2))] {
        let snap = game.snapshot_for(viewer, false);
        assert_eq!(snap.units.len(), 3, "exactly the three own workers");
        assert!(snap.units.iter().all(|u| u.team == own_team));
        assert_eq!(snap.buildings.len(), 1, "only the own HQ");
        assert_eq!(snap.buildings[0].team, own_team);
        assert!(!snap.buildings[0].under_construction);
    }
}

#[test]
fn scenario_harvest_one_trip() {
    // Deposit worth exactly one worker load.
    let mut game = two_player_game(vec![(600.0, 500.0, 100.0)]);

    let deposit: EntityId = *game.world().deposits.keys().next().expect("deposit");
    let hq_pos = game
        .world()
        .buildings
        .values()
        .find(|b| b.core.owner == PlayerId(1))
        .map(|b| b.core.position)
        .expect("p1 HQ");

    // Dedicated worker at the spec position.
    let worker = game
        .world_mut()
        .spawn_unit(PlayerId(1), TeamId(1), UnitType::Worker, Vec2::new(650.0, 450.0));

    game.accept_player_input(
        PlayerId(1),
        InputFrame {
            selection: Some(vec![worker]),
            order: Some(UnitOrder::Harvest { deposit }),
            ..InputFrame::default()
        },
    );

    // Twelve seconds of simulated time.
    run_ticks(&mut game, 600);

    let credits = game.world().faction(PlayerId(1)).unwrap().credits;
    assert!(
        (credits - 600.0).abs() < 1.0,
        "one full load banked: expected ~600 credits, got {credits}"
    );
    let worker = &game.world().units[&worker];
    assert!(worker.carried < 1.0, "carried zeroed after deposit");
    assert!(
        worker.core.position.distance_to(hq_pos) < 120.0,
        "worker ends adjacent to the HQ, at distance {}",
        worker.core.position.distance_to(hq_pos)
    );
    let remaining = game
        .world()
        .deposits
        .get(&deposit)
        .map(|d| d.remaining)
        .unwrap_or(0.0);
    assert!(remaining < 1.0, "deposit drained by 100");
}

#[test]
fn scenario_wall_posts_completing_same_tick_link_once() {
    let mut game = two_player_game(vec![]);

    let a = game.world_mut().spawn_building(
        PlayerId(1),
        TeamId(1),
        nmf_sim::catalog::BuildingType::WallPost,
        Vec2::new(1000.0, 1000.0),
        false,
    );
    let b = game.world_mut().spawn_building(
        PlayerId(1),
        TeamId(1),
        nmf_sim::catalog::BuildingType::WallPost,
        Vec2::new(1150.0, 1000.0),
        false,
    );
    // Both posts reach full progress before the same tick.
    for id in [a, b] {
        let building = game.world_mut().buildings.get_mut(&id).unwrap();
        building.construction_progress = building.core.max_health;
    }

    run_ticks(&mut game, 1);

    let world = game.world();
    assert!(!world.buildings[&a].under_construction);
    assert!(!world.buildings[&b].under_construction);
    assert_eq!(
        world.wall_segments.len(),
        1,
        "exactly one segment between the pair"
    );
    let segment = world.wall_segments.values().next().unwrap();
    assert!((segment.length - 150.0).abs() < 0.5);
    assert!((segment.core.max_health - 1500.0).abs() < 5.0);
    assert!(
        segment.core.rotation.abs() < 1e-3,
        "horizontal pair aligns at angle 0"
    );

    // The segment is fog-filtered: the enemy across the map cannot see it.
    let snap = game.snapshot_for(PlayerId(2), false);
    assert!(snap.wall_segments.is_empty());
    let snap = game.snapshot_for(PlayerId(1), false);
    assert_eq!(snap.wall_segments.len(), 1);
}

#[test]
fn scenario_cloaked_ambush() {
    let mut game = two_player_game(vec![]);

    let tank = game.world_mut().spawn_unit(
        PlayerId(1),
        TeamId(1),
        UnitType::CloakTank,
        Vec2::new(2000.0, 2000.0),
    );
    let scout = game.world_mut().spawn_unit(
        PlayerId(2),
        TeamId(2),
        UnitType::Trooper,
        Vec2::new(2045.0, 2000.0),
    );
    game.world_mut().units.get_mut(&scout).unwrap().stance = Stance::Passive;
    game.world_mut().units.get_mut(&tank).unwrap().engage_cloak();
    run_ticks(&mut game, 1);

    // Scout at distance 45: inside the 50-unit detection range.
    let snap = game.snapshot_for(PlayerId(2), false);
    assert!(
        snap.units.iter().any(|u| u.id == tank),
        "cloaked tank at 45 units is detected"
    );

    // Scout at distance 200: cloak holds.
    {
        let world = game.world_mut();
        let handle = world.units[&scout].core.body.unwrap();
        world.units.get_mut(&scout).unwrap().core.position = Vec2::new(2200.0, 2000.0);
        world.physics.set_position(handle, Vec2::new(2200.0, 2000.0));
    }
    run_ticks(&mut game, 1);
    let snap = game.snapshot_for(PlayerId(2), false);
    assert!(
        !snap.units.iter().any(|u| u.id == tank),
        "cloaked tank at 200 units is hidden"
    );

    // Firing decloaks regardless of distance.
    game.accept_player_input(
        PlayerId(1),
        InputFrame {
            selection: Some(vec![tank]),
            order: Some(UnitOrder::AttackUnit { target: scout }),
            ..InputFrame::default()
        },
    );
    run_ticks(&mut game, 5);

    let world = game.world();
    assert!(!world.units[&tank].cloaked, "firing breaks cloak");
    let snap = game.snapshot_for(PlayerId(2), false);
    assert!(
        snap.units.iter().any(|u| u.id == tank),
        "decloaked tank is visible in plain vision"
    );
}

#[test]
fn scenario_rocket_range_expiry_explosion() {
    let mut game = two_player_game(vec![]);

    // Victim parked just past where the rocket's range runs out.
    let victim = game.world_mut().spawn_unit(
        PlayerId(2),
        TeamId(2),
        UnitType::Trooper,
        Vec2::new(1320.0, 1000.0),
    );
    game.world_mut().units.get_mut(&victim).unwrap().stance = Stance::Passive;

    game.world_mut().spawn_projectile(
        PlayerId(1),
        TeamId(1),
        Vec2::new(1000.0, 1000.0),
        Vec2::new(320.0, 0.0),
        nmf_sim::catalog::OrdinanceKind::Rocket,
        40.0,
        300.0,
        nmf_sim::catalog::Elevation::Ground,
    );

    // Flight takes just under a second; run two.
    run_ticks(&mut game, 100);

    let world = game.world();
    assert!(
        world.projectiles.is_empty(),
        "rocket expired and was reaped"
    );
    let health = world.units[&victim].core.health;
    assert!(
        (health - 80.0).abs() < 0.5,
        "end-of-range explosion deals half damage exactly once, health {health}"
    );
}

#[test]
fn scenario_win_condition_with_grace() {
    let generator = FixedMap {
        starts: vec![
            (1, 500.0, 500.0),
            (2, 3500.0, 500.0),
            (3, 2000.0, 3500.0),
        ],
        deposits: vec![],
    };
    let mut game = Game::new(
        GameConfig::default(),
        Arc::new(Catalog::standard()),
        &generator,
        vec![slot(1, 1, "Nia"), slot(2, 2, "Rourke"), slot(3, 3, "Vex")],
    )
    .expect("game constructs");

    let channels = game.channels();
    let (c1, c2, c3) = (
        CountingChannel::new(),
        CountingChannel::new(),
        CountingChannel::new(),
    );
    channels.register(PlayerId(1), c1.clone(), false);
    channels.register(PlayerId(2), c2.clone(), false);
    channels.register(PlayerId(3), c3.clone(), false);

    // Player 2's HQ falls immediately.
    let hq2 = *game
        .world()
        .buildings
        .iter()
        .find(|(_, b)| b.core.owner == PlayerId(2))
        .map(|(id, _)| id)
        .unwrap();
    game.world_mut().buildings.get_mut(&hq2).unwrap().core.active = false;

    // Inside the 5-second grace nothing is decided.
    run_ticks(&mut game, 100);
    assert!(!game.is_over());

    // Past the grace: player 2 eliminated, two teams remain.
    run_ticks(&mut game, 200);
    assert!(!game.is_over());
    assert!(c1
        .events
        .lock()
        .iter()
        .any(|m| m.contains("eliminated")));

    // Player 3 disconnects; team 1 wins on the next evaluation.
    c3.open.store(false, Ordering::SeqCst);
    run_ticks(&mut game, 50);
    assert!(game.is_over());
    assert_eq!(game.winning_team(), Some(TeamId(1)));
    assert!(c1.events.lock().iter().any(|m| m.contains("Team 1 wins")));

    // No further snapshots after game over.
    let frozen = c1.snapshot_count();
    run_ticks(&mut game, 25);
    assert_eq!(c1.snapshot_count(), frozen, "snapshots stop after game over");
}

#[test]
fn scenario_attack_ground_single_shot_vs_persistent() {
    let mut game = two_player_game(vec![]);

    let one_shot = game.world_mut().spawn_unit(
        PlayerId(1),
        TeamId(1),
        UnitType::Trooper,
        Vec2::new(1000.0, 1000.0),
    );
    let barrage = game.world_mut().spawn_unit(
        PlayerId(1),
        TeamId(1),
        UnitType::Trooper,
        Vec2::new(1000.0, 1400.0),
    );
    for id in [one_shot, barrage] {
        game.world_mut().units.get_mut(&id).unwrap().stance = Stance::Passive;
    }

    game.accept_player_input(
        PlayerId(1),
        InputFrame {
            selection: Some(vec![one_shot]),
            order: Some(UnitOrder::AttackGround {
                x: 1100.0,
                y: 1000.0,
                single_shot: true,
            }),
            ..InputFrame::default()
        },
    );
    run_ticks(&mut game, 1);
    assert_eq!(
        game.world().projectiles.len(),
        1,
        "the single-shot order fires on its first tick in range"
    );

    // The shot is spent: the command completes and never fires again.
    run_ticks(&mut game, 3);
    assert_eq!(
        game.world().units[&one_shot].command.tag(),
        "idle",
        "single-shot ground fire completes after one shot"
    );
    run_ticks(&mut game, 50);
    assert_eq!(game.world().units[&one_shot].command.tag(), "idle");
    assert!(
        game.world().projectiles.is_empty(),
        "no further rounds after the single shot"
    );

    // The persistent variant keeps shelling until cancelled.
    game.accept_player_input(
        PlayerId(1),
        InputFrame {
            selection: Some(vec![barrage]),
            order: Some(UnitOrder::AttackGround {
                x: 1100.0,
                y: 1400.0,
                single_shot: false,
            }),
            ..InputFrame::default()
        },
    );
    run_ticks(&mut game, 75);
    assert_eq!(
        game.world().units[&barrage].command.tag(),
        "attack_ground",
        "persistent ground fire holds until cancelled"
    );
    // Trooper fire rate is 2/s: a fresh round is in flight inside any
    // 1.5 s window.
    assert!(
        game.world().units[&barrage].weapon_cooldown > 0.0,
        "the barrage keeps cycling its weapon"
    );
}

#[test]
fn scenario_snapshots_are_consistent_between_allies_and_hide_enemies() {
    let mut game = two_player_game(vec![]);

    // A p1 trooper walks up to p2's base: p2 must see it; p1 must still not
    // see p2's workers once the trooper is gone again.
    let visitor = game.world_mut().spawn_unit(
        PlayerId(1),
        TeamId(1),
        UnitType::Trooper,
        Vec2::new(3400.0, 3400.0),
    );
    game.world_mut().units.get_mut(&visitor).unwrap().stance = Stance::Passive;
    run_ticks(&mut game, 1);

    let p2_snap = game.snapshot_for(PlayerId(2), false);
    assert!(
        p2_snap.units.iter().any(|u| u.id == visitor),
        "intruder inside p2 vision appears in p2 snapshot"
    );
    let p1_snap = game.snapshot_for(PlayerId(1), false);
    assert!(
        p1_snap.units.iter().any(|u| u.team == TeamId(2)),
        "the visitor grants p1 vision of p2 units"
    );

    // Enemy faction records are stripped to identity.
    let foe = &p1_snap.factions[&PlayerId(2)];
    assert!(foe.credits.is_none());
    assert_eq!(foe.team, TeamId(2));
}
