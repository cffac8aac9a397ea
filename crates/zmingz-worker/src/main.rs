//! Mirror an image or video into its two kaleidoscope variants.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zmingz_media::{stage_input, OutputAllocator};
use zmingz_models::MediaKind;
use zmingz_worker::{MirrorJobResult, MirrorOutcome, MirrorPipeline, WorkerConfig};

#[derive(Debug, Parser)]
#[command(name = "zmingz", version, about = "Mirror an image or video two ways")]
struct Cli {
    /// Image or video to mirror
    input: PathBuf,

    /// Media kind (image or video); guessed from the extension when omitted
    #[arg(long)]
    kind: Option<MediaKind>,

    /// Print each result as a JSON line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

/// Colored output for dev, JSON when `LOG_FORMAT=json`. Logs go to stderr so
/// stdout only carries results.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("zmingz=info,zmingz_worker=info,zmingz_media=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Returns whether at least one slot succeeded.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let kind = cli
        .kind
        .or_else(|| MediaKind::from_path(&cli.input))
        .with_context(|| {
            format!(
                "cannot tell whether {} is an image or a video; pass --kind",
                cli.input.display()
            )
        })?;

    let engine = config.engine().context("FFmpeg is required")?;

    let input = if config.stage_input {
        stage_input(&cli.input, &config.work_dir)
            .await
            .context("failed to stage input")?
    } else {
        cli.input.clone()
    };

    let outputs = OutputAllocator::new(&config.work_dir, &input)
        .await?
        .allocate_all()?;

    let succeeded = Arc::new(AtomicUsize::new(0));
    let observer = {
        let succeeded = succeeded.clone();
        let json = cli.json;
        Arc::new(move |result: MirrorJobResult| {
            if result.is_success() {
                succeeded.fetch_add(1, Ordering::SeqCst);
            }
            report(&result, json);
        })
    };

    let pipeline = MirrorPipeline::new(Arc::new(engine));
    let handle = pipeline.run(&input, kind, |slot| outputs[slot.index()].clone(), &observer)?;

    info!(run_id = %handle.run_id(), "Waiting for mirror jobs");
    handle.join().await?;

    Ok(succeeded.load(Ordering::SeqCst) > 0)
}

fn report(result: &MirrorJobResult, json: bool) {
    if json {
        match serde_json::to_string(result) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("Failed to serialize result: {}", e),
        }
        return;
    }

    match &result.outcome {
        MirrorOutcome::Success(path) => println!("{} {}: {}", result.kind, result.slot, path.display()),
        MirrorOutcome::Cancelled => println!("{} {}: cancelled", result.kind, result.slot),
        MirrorOutcome::Failed(code) => {
            println!("{} {}: failed (return code {})", result.kind, result.slot, code)
        }
    }
}
