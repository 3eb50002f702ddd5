//! Montage stage runner binary.
//!
//! Usage: `montage-worker <request.json> [plan.json]`. The render plan is
//! written to the second path, or to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use montage_media::{ClipValidityClassifier, FfmpegSplitter};
use montage_ml_client::MlClient;
use montage_storage::{R2Client, R2ClipPublisher};
use montage_worker::config_store::{mask_subtitle_config, text_match_config};
use montage_worker::{
    ClipResourcePreparer, FileConfigStore, MontagePipeline, MontageRequest, ShotSegmenter,
    SplitSupport, TemporalMatcher, WorkerConfig,
};

fn init_tracing() -> Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("montage=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

fn build_pipeline(config: &WorkerConfig) -> Result<MontagePipeline> {
    let Some(path) = config.product_config_path.as_deref() else {
        bail!("PRODUCT_CONFIG_PATH is not set");
    };
    let store = FileConfigStore::from_path(path)?;
    let mask = mask_subtitle_config(&store)?;
    let text_match = text_match_config(&store)?;

    let ml = Arc::new(MlClient::from_env()?);
    let r2 = R2Client::from_env()?;

    let mut segmenter = ShotSegmenter::new(ml.clone(), Arc::new(r2.clone()), config.segmenter.clone());
    if config.segmenter.split_enabled {
        segmenter = segmenter.with_split_support(SplitSupport {
            splitter: Arc::new(FfmpegSplitter::new(&config.work_dir)),
            publisher: Arc::new(R2ClipPublisher::new(r2, config.piece_prefix.clone())),
        });
    }

    Ok(MontagePipeline::new(
        segmenter,
        ClipValidityClassifier::new(mask),
        ClipResourcePreparer::new(config.preparer.clone()),
        TemporalMatcher::new(ml, config.matcher.clone(), text_match),
    ))
}

async fn run(request_path: PathBuf, plan_path: Option<PathBuf>) -> Result<()> {
    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let raw = tokio::fs::read_to_string(&request_path)
        .await
        .with_context(|| format!("reading {}", request_path.display()))?;
    let request: MontageRequest = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", request_path.display()))?;

    let pipeline = build_pipeline(&config)?;
    let plan = pipeline.run(&request).await?;
    let output = serde_json::to_string_pretty(&plan)?;

    match plan_path {
        Some(path) => {
            tokio::fs::write(&path, output)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!(request_id = %plan.request_id, path = %path.display(), "Render plan written");
        }
        None => println!("{}", output),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        eprintln!("rustls crypto provider already installed");
    }

    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }

    let metrics_port = std::env::var("METRICS_PORT").ok().and_then(|s| s.parse().ok());
    if let Err(e) = montage_worker::metrics::init_metrics(metrics_port) {
        error!("Failed to install metrics exporter: {}", e);
    }

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let Some(request_path) = args.next() else {
        eprintln!("usage: montage-worker <request.json> [plan.json]");
        std::process::exit(2);
    };
    let plan_path = args.next();

    info!("Starting montage-worker");
    if let Err(e) = run(request_path, plan_path).await {
        error!("Montage run failed: {:#}", e);
        std::process::exit(1);
    }
}
