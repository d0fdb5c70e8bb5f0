//! Combination render worker binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use combocut_media::{check_ffmpeg, check_ffprobe, FfmpegToolkit, HttpFetcher};
use combocut_queue::JobQueue;
use combocut_storage::StorageClient;
use combocut_tts::ElevenLabsClient;
use combocut_worker::{BatchOrchestrator, JobExecutor, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting combocut-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    if let Err(e) = check_ffmpeg().and_then(|_| check_ffprobe()) {
        error!("Media tooling unavailable: {}", e);
        std::process::exit(1);
    }

    init_metrics_listener();

    let queue = match JobQueue::from_env() {
        Ok(q) => q,
        Err(e) => {
            error!("Failed to create job queue: {}", e);
            std::process::exit(1);
        }
    };

    let storage = match StorageClient::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create storage client: {}", e);
            std::process::exit(1);
        }
    };

    let tts = match ElevenLabsClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create TTS client: {}", e);
            std::process::exit(1);
        }
    };
    if !tts.is_configured() {
        warn!("ELEVENLABS_API_KEY not set, combinations will render without voice-over");
    }

    let fetcher = match HttpFetcher::new() {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to create HTTP fetcher: {}", e);
            std::process::exit(1);
        }
    };

    let orchestrator = BatchOrchestrator::new(
        config.batch_config(),
        Arc::new(fetcher),
        Arc::new(tts),
        Arc::new(storage),
        Arc::new(FfmpegToolkit::new()),
    );

    let executor = Arc::new(JobExecutor::new(config, queue, orchestrator));

    let signal_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal_executor.shutdown();
        }
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}

/// Colored output for dev, JSON for production.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,combocut=info"));

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
}

/// Serve Prometheus metrics when `WORKER_METRICS_ADDR` is set.
fn init_metrics_listener() {
    let Ok(addr) = std::env::var("WORKER_METRICS_ADDR") else {
        return;
    };

    let addr: SocketAddr = match addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Ignoring invalid WORKER_METRICS_ADDR {}: {}", addr, e);
            return;
        }
    };

    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => info!("Prometheus metrics listening on {}", addr),
        Err(e) => warn!("Failed to start metrics listener: {}", e),
    }
}
