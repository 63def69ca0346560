/// design: resolve an interval against a recording container, build the
/// lagged design matrix and write it to a safetensors file.
///
/// Output keys:
///   design   [T, m·(d+1)]   f64
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stimlag::{
    io::{load_recording, write_design},
    EpochResolver, Interval, PrepConfig, prepare_with_config, SignalSource,
};

#[derive(Parser, Debug)]
#[command(name = "design", about = "Lagged stimulus design matrix builder")]
struct Args {
    /// Recording container (safetensors with `data`, `fs`, epochs).
    #[arg(long)]
    input: PathBuf,

    /// Output safetensors path.
    #[arg(long)]
    output: PathBuf,

    /// Interval start (s).
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// Interval end (s).
    #[arg(long)]
    end: f64,

    /// Number of leading stimulus channels (m).
    #[arg(long, default_value_t = 18)]
    channels: usize,

    /// Lag depth (d).
    #[arg(long, default_value_t = 0)]
    lags: usize,

    /// Epoch bin width (s).
    #[arg(long, default_value_t = 1.5)]
    epoch_step: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = PrepConfig {
        epoch_step: args.epoch_step,
        n_channels: args.channels,
        lag_depth: args.lags,
        ..PrepConfig::default()
    };

    let signal = load_recording(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    info!("loaded {}", signal.summary());
    info!(channels = ?signal.channel_names(), "channels");

    let interval = Interval::new(args.start, args.end);
    let covered = EpochResolver::from_config(&cfg).resolve(&signal, &interval)?;
    info!(
        range = ?covered.index_range,
        n_epochs = covered.names.len(),
        "interval [{}, {}] s",
        interval.start,
        interval.end
    );
    for name in &covered.names {
        info!("  {name}");
    }

    let design = prepare_with_config(&signal, &interval, &cfg)?;
    info!(rows = design.nrows(), cols = design.ncols(), "design matrix");

    write_design(&design, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!("written → {}", args.output.display());
    Ok(())
}
