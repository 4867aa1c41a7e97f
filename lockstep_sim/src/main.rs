//! Lockstep replay CLI
//!
//! Replays recordings (or synthetic ones) through a scripted input sequence
//! and reports where playback ended up.

use clap::Parser;
use lockstep_core::{ReplayConfig, ReplaySession, SynchronizationSet, TrajectorySeries};
use lockstep_env::{ReplayContext, TokioContext};
use lockstep_sim::{
    load_config, load_recording, ChannelLayout, InputScript, LoadError, PlaybackDriver, RunSummary,
    ScriptId, SimContext, SyntheticRecorder, DEFAULT_STEP,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Synchronized multi-stream marker replay
#[derive(Parser, Debug)]
#[command(name = "lockstep-sim")]
#[command(about = "Replay recorded marker streams in lockstep", long_about = None)]
struct Args {
    /// Tab-separated recording files
    files: Vec<PathBuf>,

    /// Number of synthetic recordings to generate when no files are given
    #[arg(long, default_value = "2")]
    synthetic: usize,

    /// Comma-separated synthetic recording lengths (overrides --synthetic)
    #[arg(long, value_delimiter = ',')]
    lengths: Vec<usize>,

    /// Seed for synthetic recordings
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Play streams at their native lengths instead of warping
    #[arg(long)]
    no_warp: bool,

    /// Driver steps to run (20 ms each)
    #[arg(short = 'n', long, visible_alias = "ticks", default_value = "3000")]
    steps: u64,

    /// Input script (straight, rewind_midway, speed_ramp, pause_resume, restart)
    #[arg(short = 'S', long, default_value = "straight")]
    script: String,

    /// Replay configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Column layout of the recording files (JSON)
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Export every committed tick to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Pace the replay in wall-clock time instead of the virtual clock
    #[arg(long)]
    realtime: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output
    #[arg(long)]
    json: bool,
}

fn load_streams(args: &Args) -> Result<Vec<TrajectorySeries>, LoadError> {
    if !args.files.is_empty() {
        let layout = match &args.layout {
            Some(path) => ChannelLayout::load(path)?,
            None => ChannelLayout::default(),
        };
        return args
            .files
            .iter()
            .map(|path| load_recording(path, &layout))
            .collect();
    }

    let lengths = if args.lengths.is_empty() {
        (0..args.synthetic).map(|i| 1000 + 137 * i).collect()
    } else {
        args.lengths.clone()
    };
    info!(seed = args.seed, ?lengths, "generating synthetic recordings");
    Ok(SyntheticRecorder::new(args.seed).record_session(&lengths)?)
}

fn build_session(args: &Args) -> Result<(ReplaySession, ReplayConfig), LoadError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ReplayConfig::default(),
    };
    if args.no_warp {
        config.warp_enabled = false;
    }

    let streams = load_streams(args)?;
    let set = SynchronizationSet::build(streams, config.warp_enabled)?;
    Ok((ReplaySession::new(set, &config), config))
}

async fn run<Ctx: ReplayContext>(
    context: Arc<Ctx>,
    session: ReplaySession,
    script: InputScript,
    steps: u64,
    export_path: Option<&str>,
) -> RunSummary {
    let mut driver = PlaybackDriver::new(context, session)
        .with_step(DEFAULT_STEP)
        .with_script(script);
    if export_path.is_some() {
        driver = driver.with_export();
    }

    let summary = driver.run(steps).await;

    if let (Some(path), Some(export)) = (export_path, driver.take_export()) {
        match export.write_to_file(path) {
            Ok(()) => info!("Exported {} frames to {}", export.frames.len(), path),
            Err(e) => error!("Failed to write export: {}", e),
        }
    }
    summary
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let script_id: ScriptId = args.script.parse().unwrap_or_else(|e| {
        error!("{}", e);
        let names: Vec<&str> = ScriptId::all().iter().map(ScriptId::name).collect();
        error!("Available scripts: {}", names.join(", "));
        std::process::exit(1);
    });

    let (session, config) = match build_session(&args) {
        Ok(built) => built,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if !args.json {
        let set = session.playback().set();
        info!(
            streams = set.len(),
            common_length = set.common_length(),
            policy = ?set.policy(),
            script = %script_id,
            "Lockstep replay"
        );
    }

    let script = script_id.script(config.speed_step);
    let export = args.export.as_deref();

    let summary = if args.realtime {
        run(TokioContext::shared(), session, script, args.steps, export).await
    } else {
        run(SimContext::shared(), session, script, args.steps, export).await
    };

    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize summary: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        info!(
            "{} steps, {} ticks, {} ends, {} restarts, final state {}",
            summary.steps, summary.ticks, summary.ends, summary.restarts, summary.final_state
        );
        info!("Final indices: {:?}", summary.final_indices);
    }
}
