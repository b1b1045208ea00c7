//! Headless dungeon host
//!
//! Runs several dungeon instances side by side, one thread each, with
//! scripted players. Instances share the definitions and one persistence
//! gateway and nothing else.

mod bot;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use clap::Parser;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use dg_core::DungeonInstance;
use dg_core::data::Definitions;
use dg_core::persist::{MemoryGateway, PersistenceGateway};
use dg_core::player::PlayerId;
use dg_core::world::{ConfigError, InstanceConfig, InstanceError, ServerEvent};
use dg_data::DataError;
use dg_save::{JsonStore, SaveError};

use bot::Bot;

/// Run dungeon instances with scripted players
#[derive(Parser, Debug)]
#[command(name = "dg-sim")]
#[command(author, version, about = "Headless dungeon instance host", long_about = None)]
struct Args {
    /// Number of concurrent instances
    #[arg(short = 'n', long, default_value_t = 2)]
    instances: usize,

    /// Bots per instance
    #[arg(short = 'p', long, default_value_t = 2)]
    players: u32,

    /// Simulated seconds per instance
    #[arg(short = 's', long, default_value_t = 600.0)]
    seconds: f64,

    /// Base RNG seed; instance i uses seed + i
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Dungeon to run
    #[arg(short = 'd', long, default_value = dg_data::DEFAULT_DUNGEON)]
    dungeon: String,

    /// Class for every bot
    #[arg(short = 'c', long, default_value = "warrior")]
    class: String,

    /// Save directory (defaults to the platform data dir)
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Keep saves in memory only
    #[arg(long)]
    memory: bool,

    /// Run as fast as possible instead of in real time
    #[arg(short = 'f', long)]
    fast: bool,

    /// Instance configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Definition pack (JSON) to use instead of the built-in content
    #[arg(long)]
    definitions: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error("could not start instance thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{failed} of {total} instances failed")]
    InstancesFailed { failed: usize, total: usize },
}

/// What one instance did
#[derive(Debug, Default)]
struct Summary {
    id: String,
    seconds: f64,
    ticks: u64,
    kills: u64,
    deaths: u64,
    floors_cleared: u32,
    level_ups: u32,
    complete: bool,
    saves_lost: usize,
    failure: Option<String>,
}

impl Summary {
    fn failed(index: usize, reason: String) -> Self {
        Self {
            id: format!("room-{index}"),
            failure: Some(reason),
            ..Default::default()
        }
    }
}

fn main() -> Result<(), SimError> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .init();

    let config = match &args.config {
        Some(path) => InstanceConfig::load_from_file(path)?,
        None => InstanceConfig::default(),
    };
    let defs = match &args.definitions {
        Some(path) => dg_data::load_pack(path)?,
        None => dg_data::builtin_definitions()?,
    };
    let gateway: Arc<dyn PersistenceGateway> = if args.memory {
        Arc::new(MemoryGateway::new())
    } else {
        let dir = args.save_dir.clone().unwrap_or_else(dg_save::default_save_dir);
        let store = JsonStore::open(&dir)?;
        info!(dir = %store.root().display(), "saving to disk");
        Arc::new(store)
    };

    info!(
        instances = args.instances,
        players = args.players,
        seconds = args.seconds,
        dungeon = %args.dungeon,
        fast = args.fast,
        "starting simulation"
    );

    let started = Instant::now();
    let mut handles = Vec::with_capacity(args.instances);
    for index in 0..args.instances {
        let defs = Arc::clone(&defs);
        let gateway = Arc::clone(&gateway);
        let config = config.clone();
        let run = RunArgs::from_args(&args, index);
        let handle = thread::Builder::new()
            .name(format!("instance-{index}"))
            .spawn(move || run_instance(&run, defs, config, gateway))?;
        handles.push(handle);
    }

    let total = handles.len();
    let summaries = join_all(handles);

    print_summary(&summaries, started.elapsed());
    let failed = summaries.iter().filter(|s| s.failure.is_some()).count();
    if failed > 0 {
        return Err(SimError::InstancesFailed { failed, total });
    }
    Ok(())
}

/// Wait for every instance thread. A failure or panic becomes a failed
/// summary so the remaining instances still finish.
fn join_all(handles: Vec<JoinHandle<Result<Summary, InstanceError>>>) -> Vec<Summary> {
    let mut summaries = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        let summary = match handle.join() {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => {
                error!(instance = index, "instance failed: {e}");
                Summary::failed(index, e.to_string())
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(instance = index, "instance thread panicked: {reason}");
                Summary::failed(index, format!("panicked: {reason}"))
            }
        };
        summaries.push(summary);
    }
    summaries
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Per-instance slice of the command line
#[derive(Debug, Clone)]
struct RunArgs {
    index: usize,
    players: u32,
    seconds: f64,
    seed: u64,
    dungeon: String,
    class: String,
    fast: bool,
}

impl RunArgs {
    fn from_args(args: &Args, index: usize) -> Self {
        Self {
            index,
            players: args.players,
            seconds: args.seconds,
            seed: args.seed.wrapping_add(index as u64),
            dungeon: args.dungeon.clone(),
            class: args.class.clone(),
            fast: args.fast,
        }
    }
}

fn run_instance(
    args: &RunArgs,
    defs: Arc<Definitions>,
    config: InstanceConfig,
    gateway: Arc<dyn PersistenceGateway>,
) -> Result<Summary, InstanceError> {
    let dt = config.tick_dt();
    let mut inst = DungeonInstance::new(
        format!("room-{}", args.index),
        &args.dungeon,
        Arc::clone(&defs),
        config,
        gateway,
        args.seed,
    )?;

    let mut bots = Vec::with_capacity(args.players as usize);
    for n in 0..args.players {
        let id = PlayerId(args.index as u32 * 1000 + n + 1);
        let bot = Bot::new(id, format!("bot-{}-{}", args.index, n), Arc::clone(&defs));
        inst.join(bot.id, &bot.name, &args.class)?;
        bots.push(bot);
    }

    let mut summary = Summary {
        id: inst.id().to_string(),
        ..Default::default()
    };
    let tick_period = Duration::from_secs_f32(dt);
    let mut next_tick = Instant::now();

    while inst.now() < args.seconds {
        for bot in bots.iter_mut() {
            for message in bot.decide(&inst, dt) {
                inst.handle_message(bot.id, message);
            }
        }
        inst.tick(dt);

        for envelope in inst.drain_events() {
            match envelope.event {
                ServerEvent::LevelUp {
                    player_id, level, ..
                } => {
                    summary.level_ups += 1;
                    debug!(instance = %inst.id(), %player_id, level, "bot leveled");
                }
                ServerEvent::PersistWarning { message } => {
                    warn!(instance = %inst.id(), "{message}");
                }
                _ => {}
            }
        }

        if bots.iter().all(|b| b.exited) {
            info!(instance = %inst.id(), at = inst.now(), "all bots returned to hub");
            break;
        }

        if !args.fast {
            next_tick += tick_period;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            } else {
                next_tick = now;
            }
        }
    }

    for bot in &bots {
        inst.leave(bot.id);
    }
    let report = inst.shutdown();

    let stats = inst.stats();
    summary.seconds = inst.now();
    summary.ticks = stats.ticks;
    summary.kills = stats.kills;
    summary.deaths = stats.player_deaths;
    summary.floors_cleared = stats.floors_cleared;
    summary.complete = inst.state().floor.dungeon_complete;
    summary.saves_lost = report.dropped.len();
    Ok(summary)
}

fn print_summary(summaries: &[Summary], wall: Duration) {
    println!();
    println!(
        "{:<10} {:>8} {:>8} {:>6} {:>7} {:>7} {:>6} {:>9} {:>6}",
        "instance", "sim(s)", "ticks", "kills", "deaths", "floors", "lvls", "complete", "lost"
    );
    for s in summaries {
        if let Some(reason) = &s.failure {
            println!("{:<10} failed: {reason}", s.id);
            continue;
        }
        println!(
            "{:<10} {:>8.1} {:>8} {:>6} {:>7} {:>7} {:>6} {:>9} {:>6}",
            s.id,
            s.seconds,
            s.ticks,
            s.kills,
            s.deaths,
            s.floors_cleared,
            s.level_ups,
            if s.complete { "yes" } else { "no" },
            s.saves_lost
        );
    }
    println!("wall time: {:.2}s", wall.as_secs_f64());
}
