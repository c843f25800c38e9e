//! pingprom exporter binary.
//!
//! - Probes every `--target` over ICMP, one task per target
//! - Serves `/metrics` (Prometheus text), `/healthz`, `/readyz`
//! - Ctrl+C / SIGTERM stops the probe loops, then the listener

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use pingprom_core::error::{PingPromError, Result};
use pingprom_exporter::{
    app_state::AppState,
    bootstrap,
    config::{self, ExporterConfig, Overrides},
    obs::MetricsRegistry,
    orchestrator::Orchestrator,
    probe::IcmpConnector,
    router,
};

/// ICMP reachability and latency exporter for Prometheus.
#[derive(Parser, Debug)]
#[command(name = "pingprom", version, about, long_about = None)]
struct Cli {
    /// Target address to probe (repeatable)
    #[arg(long = "target", env = "PINGPROM_TARGETS", value_delimiter = ',')]
    targets: Vec<String>,

    /// Port for the metrics listener (overrides config file; default 2112)
    #[arg(long, env = "PINGPROM_PORT")]
    port: Option<u16>,

    /// Bind address for the metrics listener (overrides config file)
    #[arg(long, env = "PINGPROM_BIND")]
    bind: Option<String>,

    /// Optional YAML configuration file
    #[arg(short, long, env = "PINGPROM_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "pingprom exiting");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: Cli) -> Result<ExporterConfig> {
    let mut cfg = match cli.config.as_deref() {
        Some(path) => {
            tracing::info!(path, "loading configuration");
            config::load_from_file(path)?
        }
        None => ExporterConfig::default(),
    };

    // CLI > ENV > config file
    cfg.apply_overrides(Overrides {
        bind: cli.bind,
        port: cli.port,
        targets: cli.targets,
    })?;
    Ok(cfg)
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(cli)?;
    let listen = cfg.exporter.listen_addr()?;
    let targets = cfg.targets();
    let grace = cfg.probe.shutdown_grace();

    if targets.is_empty() {
        tracing::warn!("no targets configured; serving empty metrics");
    }

    // Initialized before any probe loop can emit.
    let registry = Arc::new(MetricsRegistry::new());

    let connector = IcmpConnector::new(cfg.probe.timeout(), cfg.probe.payload_size);
    let orchestrator =
        Orchestrator::start(&targets, &cfg.probe, &connector, registry.clone()).await?;
    for t in orchestrator.targets() {
        tracing::info!(addr = %t, "pinging");
    }

    let (listener, orchestrator) = bootstrap::bind_or_shutdown(listen, orchestrator, grace).await?;

    let state = AppState::new(registry, orchestrator.watch());
    let app = router::build_router(state);

    tracing::info!(%listen, "pingprom listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(orchestrator, grace))
        .await
        .map_err(|e| PingPromError::Internal(format!("server failed: {e}")))?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then stop every probe loop.
async fn shutdown_signal(orchestrator: Orchestrator, grace: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received terminate signal"),
    }

    tracing::info!("stopping probe loops");
    let stopped = orchestrator.shutdown(grace).await;
    tracing::info!(stopped, "probe loops stopped");
}
