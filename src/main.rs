//! Grid Crawler
//!
//! Loads a level, walks a scripted tour through it casting every spell,
//! and checks the run replays to the same state hash.

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use grid_crawler::{
    TICK_RATE, VERSION,
    config::SimConfig,
    game::{
        events::{GameEvent, GameEventData},
        input::{Command, InputFrame, InputScript},
        projectile::Variant,
        state::DungeonState,
        tick::{replay, tick},
    },
    level::document::Level,
};

/// Length of the demo run (20 seconds).
const DEMO_TICKS: u32 = TICK_RATE * 20;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Grid Crawler v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let mut config = SimConfig::from_env();
    if let Some(path) = std::env::args_os().nth(1) {
        config.level_path = Some(path.into());
    }

    let level = match &config.level_path {
        Some(path) => Level::load_or_default(path).level,
        None => Level::default_dungeon(),
    };

    demo_run(&level, &config)
}

/// Scripted walk: wander, turn, cast each spell, toggle a torch.
fn demo_input(t: u32) -> InputFrame {
    let command = match t % 300 {
        0..=29 => Some(Command::MoveBackward),
        40 => Some(Command::Cast(Variant::Fireball)),
        60 => Some(Command::PlaceTorch),
        80..=89 => Some(Command::TurnRight),
        100 => Some(Command::Cast(Variant::IceArrow)),
        120..=149 => Some(Command::MoveForward),
        160 => Some(Command::Cast(Variant::Lightning)),
        180..=189 => Some(Command::TurnLeft),
        200 => Some(Command::Cast(Variant::GasCloud)),
        220..=259 => Some(Command::StrafeRight),
        270 => Some(Command::PlaceTorch),
        _ => None,
    };
    command.map_or_else(InputFrame::new, |c| InputFrame::from_commands(&[c]))
}

fn log_event(event: &GameEvent) {
    match &event.data {
        GameEventData::ActorMoved { from, to, .. } => {
            info!("Tick {}: moved {:?} -> {:?}", event.tick, from, to);
        }
        GameEventData::FacingChanged { facing } => {
            info!("Tick {}: now facing {}", event.tick, facing.label());
        }
        GameEventData::ProjectileSpawned { id, variant, .. } => {
            info!("Tick {}: cast {} (#{})", event.tick, variant, id);
        }
        GameEventData::ProjectileDestroyed { id, variant, cause, position } => {
            info!("Tick {}: {} #{} {:?} at {}", event.tick, variant, id, cause, position);
        }
        GameEventData::Status(text) => {
            info!("Tick {}: {}", event.tick, text);
        }
        other => debug!("Tick {}: {:?}", event.tick, other),
    }
}

fn demo_run(level: &Level, config: &SimConfig) -> Result<()> {
    info!("=== Starting Demo Run ===");
    info!("Level: {} ({}x{})", level.name, level.grid.size(), level.grid.size());

    let mut state = DungeonState::new(level, config);
    let mut script = InputScript::new(level.fingerprint(), config.seed, config.tick_ms);

    info!("Level Hash: {}", hex::encode(state.level_hash));
    info!("Session Seed: {}", state.rng_seed);
    info!(
        "Effects: {} pit lights, {} torches",
        state.effects.pit_light_count(),
        state.effects.torch_count()
    );

    let mut total_events = 0;
    for t in 0..DEMO_TICKS {
        let input = demo_input(t);
        script.record(t, input);

        let result = tick(&mut state, input, config.tick_ms, config);
        total_events += result.events.len();
        for event in &result.events {
            log_event(event);
        }
    }
    script.finalize(DEMO_TICKS - 1);

    let frame = state.frame();
    info!("=== Run Results ===");
    info!(
        "Actor at {:?} facing {}, {} projectiles and {} impacts live",
        frame.actor.cell,
        frame.actor.facing.label(),
        frame.projectiles.len(),
        frame.impacts.len()
    );
    info!("Total events: {}", total_events);

    let hash = state.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    let bytes = script.to_bytes().context("Failed to encode input script")?;
    info!(
        "Input script: {} ticks, {} deltas, {} bytes",
        script.tick_count(),
        script.delta_count(),
        bytes.len()
    );

    // Verify determinism by replaying the recorded script
    info!("=== Verifying Determinism ===");
    let decoded = InputScript::from_bytes(&bytes).context("Failed to decode input script")?;
    let (replayed, _) = replay(level, config, &decoded);
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("DETERMINISM FAILURE: Hashes differ!");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}
