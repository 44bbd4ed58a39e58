#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that hosts a Duel Defence match between two bots.

mod bot;
mod config;
mod room;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use duel_defence_core::{Command, Event, Side, UnitFate};
use duel_defence_world::World;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    bot::{Bot, BotSettings},
    room::{Room, RoomSettings},
};

const INTENT_CHANNEL_CAPACITY: usize = 256;
const EVENT_BROADCAST_CAPACITY: usize = 4096;

/// Runs a seeded bot-versus-bot match and reports the outcome.
#[derive(Debug, Parser)]
#[command(name = "duel-defence", version, about)]
struct Args {
    /// Tower and unit tables.
    #[arg(long, default_value = "config/catalog.toml")]
    catalog: PathBuf,
    /// Board layout and pacing; defaults apply when omitted.
    #[arg(long)]
    match_config: Option<PathBuf>,
    /// Simulated milliseconds advanced per tick.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Simulation speed relative to wall-clock time.
    #[arg(long, default_value_t = 4.0)]
    speed: f64,
    /// Rounds to play before stopping.
    #[arg(long, default_value_t = 3)]
    rounds: u32,
    /// Seed shared by both bots.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Print the final match snapshot as JSON.
    #[arg(long)]
    print_snapshot: bool,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Entry point for the Duel Defence command-line interface.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    ensure!(args.tick_ms > 0, "--tick-ms must be positive");
    ensure!(
        args.speed.is_finite() && args.speed > 0.0,
        "--speed must be a positive number"
    );

    let tick = Duration::from_millis(args.tick_ms);
    let interval = tick_interval(tick, args.speed)?;

    let catalog = config::load_catalog(&args.catalog)?;
    let match_config = config::load_match_config(args.match_config.as_deref())?;
    let world = World::new(&match_config, catalog.clone()).context("failed to create match")?;

    let room = Room::spawn(
        world,
        RoomSettings {
            tick,
            interval,
            intent_capacity: INTENT_CHANNEL_CAPACITY,
            event_capacity: EVENT_BROADCAST_CAPACITY,
        },
    );
    tracing::info!(rounds = args.rounds, seed = args.seed, "match started");

    let tally = tokio::spawn(tally_leaks(room.events()));
    for (index, side) in Side::ALL.into_iter().enumerate() {
        let bot = Bot::new(
            side,
            match_config.region(side),
            &catalog,
            BotSettings::default(),
            args.seed.wrapping_add(index as u64),
        );
        let _ = tokio::spawn(bot::run(bot, room.intents(), room.subscribe()));
    }

    room.intents()
        .send(Command::OpenConstruction)
        .await
        .context("room closed before the match opened")?;

    let mut state = room.subscribe();
    let rounds = args.rounds;
    tokio::select! {
        finished = state.wait_for(|state| state.rounds_completed >= rounds) => {
            let _ = finished.context("room stopped unexpectedly")?;
        }
        interrupted = tokio::signal::ctrl_c() => {
            interrupted.context("failed to listen for ctrl-c")?;
            tracing::warn!("interrupted");
        }
    }

    let world = room.dispose().await?;
    let leaks = tally.await.context("event tally failed")?;
    for (side, count) in Side::ALL.into_iter().zip(leaks) {
        tracing::info!(?side, units_through = count, "side summary");
    }

    if args.print_snapshot {
        let snapshot = duel_defence_world::query::match_state(&world);
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("failed to encode snapshot")?
        );
    }
    Ok(())
}

/// Wall-clock time between ticks when simulating `tick` at `speed`.
fn tick_interval(tick: Duration, speed: f64) -> Result<Duration> {
    let interval = Duration::try_from_secs_f64(tick.as_secs_f64() / speed)
        .with_context(|| format!("--speed {speed} gives no usable tick interval"))?;
    ensure!(
        !interval.is_zero(),
        "--speed {speed} is too fast for a {}ms tick",
        tick.as_millis()
    );
    Ok(interval)
}

/// Counts units of each side that reached the opposing base.
async fn tally_leaks(mut events: broadcast::Receiver<Event>) -> [u32; 2] {
    let mut leaks = [0; 2];
    loop {
        match events.recv().await {
            Ok(Event::UnitDestroyed {
                side,
                fate: UnitFate::ReachedBase,
                ..
            }) => {
                let slot = match side {
                    Side::Top => 0,
                    Side::Bottom => 1,
                };
                leaks[slot] += 1;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event tally lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
    leaks
}
