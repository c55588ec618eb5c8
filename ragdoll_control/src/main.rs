//! # Ragdoll Control
//!
//! Runs one figure through the reference simulation at a fixed step:
//! loads and validates the figure TOML, aggregates structural loads,
//! applies the initial mode, then ticks limiters, controllers and physics.
//! `--toggle-at` schedules Posed ⇄ Ragdoll switches.

use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use ragdoll_common::config::{ConfigLoader, LogLevel};
use ragdoll_common::consts::DEFAULT_FIXED_DT;
use ragdoll_common::figure::FigureConfig;
use ragdoll_common::state::RagdollMode;
use ragdoll_control::angle;
use ragdoll_control::body::{BodySet, SegmentId};
use ragdoll_control::config::assemble;
use ragdoll_control::cycle::FixedStepRunner;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Posed,
    Ragdoll,
}

impl From<ModeArg> for RagdollMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Posed => RagdollMode::Posed,
            ModeArg::Ragdoll => RagdollMode::Ragdoll,
        }
    }
}

/// Ragdoll Control - load-weighted pose control for 2D figures
#[derive(Parser, Debug)]
#[command(name = "ragdoll_control")]
#[command(version)]
#[command(about = "Drive a ragdoll figure through the reference simulation")]
struct Args {
    /// Path to the figure TOML.
    #[arg(long, value_name = "PATH", default_value = "config/humanoid.toml")]
    figure: PathBuf,

    /// Number of fixed steps to run.
    #[arg(long, default_value_t = 500)]
    steps: u64,

    /// Step size [time units].
    #[arg(long, default_value_t = DEFAULT_FIXED_DT)]
    dt: f64,

    /// Toggle Posed ⇄ Ragdoll at the start of these steps.
    #[arg(long, value_name = "STEP", num_args = 1..)]
    toggle_at: Vec<u64>,

    /// Override the figure's initial mode.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Enable verbose logging (DEBUG level). Overrides the figure's `log_level`.
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    // Read first so the figure's log level applies to everything after.
    let config = FigureConfig::load(&args.figure);
    let log_level = config.as_ref().map(|c| c.shared.log_level).unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("Ragdoll Control v{} starting...", env!("CARGO_PKG_VERSION"));

    let outcome = match config {
        Ok(config) => run(&args, config),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = outcome {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

fn run(args: &Args, config: FigureConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Loaded figure config from {}", args.figure.display());
    let mut loaded = assemble(config)?;
    let figure = &mut loaded.figure;

    if let Some(mode) = args.mode {
        figure.set_initial_mode(mode.into());
    }

    let report = figure.aggregate_loads(&loaded.world);
    for (id, faults) in figure.degraded() {
        if let Some(seg) = figure.segment(id) {
            warn!("segment '{}' degraded: {faults:?}", seg.name());
        }
    }
    info!(
        "Loads OK: {} segment(s) computed, {} cyclic edge(s)",
        report.order.len(),
        report.cyclic_edges.len()
    );

    let transition = figure.activate(&mut loaded.world, &mut loaded.pairs);
    info!("Figure '{}' active in {} mode", figure.name(), transition.to);

    let mut runner = FixedStepRunner::new(args.dt).with_toggles(args.toggle_at.iter().copied());
    let stats = *runner.run(figure, &mut loaded.world, &mut loaded.pairs, args.steps);

    info!(
        "Ran {} step(s) ({:.2} time units): {} command(s), {} correction(s), {} skipped, {} toggle(s), max |ω| {:.1}",
        stats.cycle_count,
        stats.sim_time,
        stats.commanded,
        stats.corrections,
        stats.skipped,
        stats.toggles,
        stats.max_abs_command
    );

    for (i, seg) in figure.segments().iter().enumerate() {
        let id = SegmentId(i as u16);
        let Some(rotation) = loaded.world.rotation_of(id) else {
            continue;
        };
        let relative = match seg.anchor() {
            Some(anchor) => match loaded.world.rotation_of(anchor) {
                Some(reference) => angle::delta(reference, rotation),
                None => continue,
            },
            None => angle::normalize(rotation),
        };
        info!(
            "  {:<16} relative {:>8.2}° target {:>8.2}° load factor {}",
            seg.name(),
            relative,
            seg.controller().target_angle(),
            seg.load_factor()
                .map_or_else(|| "-".to_string(), |f| format!("{f:.2}"))
        );
    }

    info!("Final mode: {}", figure.mode());
    Ok(())
}

fn setup_tracing(args: &Args, log_level: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        log_level.as_directive().parse().unwrap_or(Level::INFO)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
