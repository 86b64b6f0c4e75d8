#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives AR Summon sessions without a display.

mod config;
mod headless;
mod session;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result as AnyResult};
use ar_summon_core::SoundId;
use ar_summon_system_synthesis::SoundBank;
use clap::{ArgAction, Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::SessionConfig,
    session::{scripted_presses, Session},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless driver for the AR Summon simulation")]
struct Cli {
    /// Path to a session config TOML
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the seed of the world and every derived random source
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Raises log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Runs a scripted tapping session and prints a summary
    Simulate(SimulateArgs),
    /// Synthesizes every sound and prints buffer statistics
    Synth,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Simulated session length in seconds
    #[arg(long, default_value_t = 30.0)]
    duration: f64,

    /// Simulated frame time in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
}

/// Entry point for the AR Summon command-line interface.
fn main() -> AnyResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = SessionConfig::load(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.world.seed = seed;
    }

    match cli.command {
        Mode::Simulate(args) => simulate(&config, &args),
        Mode::Synth => synth(&config),
    }
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn simulate(config: &SessionConfig, args: &SimulateArgs) -> AnyResult<()> {
    let duration = Duration::try_from_secs_f64(args.duration)
        .with_context(|| format!("invalid duration {}", args.duration))?;
    let frame = Duration::from_millis(args.frame_ms.max(1));

    let session = Session::new(config)?;
    let script = scripted_presses(
        config.world.seed,
        duration,
        session.viewport(),
        session.long_press(),
    );
    info!(presses = script.len(), seed = config.world.seed, "session_started");
    let report = session.run(&script, duration, frame)?;
    print!("{report}");
    Ok(())
}

fn synth(config: &SessionConfig) -> AnyResult<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.world.seed);
    let bank = SoundBank::synthesize_all(config.audio.sample_rate, &mut rng)
        .context("failed to synthesize sounds")?;
    println!("sample rate: {} Hz", bank.sample_rate());
    for sound in SoundId::ALL {
        let buffer = bank
            .get(sound)
            .with_context(|| format!("sound {} missing from bank", sound.name()))?;
        println!(
            "{:<14} {} ch  {:>6} frames  {:>5} ms  peak {:.3} (bound {:.3})",
            sound.name(),
            buffer.channel_count(),
            buffer.frames(),
            buffer.duration().as_millis(),
            buffer.peak(),
            sound.peak_bound(),
        );
    }
    Ok(())
}
