//! flowd — the FlowScale autoscaler daemon.
//!
//! Wires the two control-loop stages together in one process: the
//! metric-provider stage polls external metric sources for every configured
//! workload, and the scaler stage reconciles instance counts against the
//! compute control plane. An HTTP surface exposes a one-shot refresh
//! (`POST /`), liveness (`GET /healthz`), and scaling gauges
//! (`GET /metrics`).
//!
//! # Usage
//!
//! ```text
//! flowd --config ./flowscale.yaml --compute-endpoint https://compute.example.com
//! flowd --config ./flowscale.yaml            # dry run against an in-memory plane
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use flowscale_api::{build_router, AppState, InProcessScaleClient};
use flowscale_auth::{AuthResolver, EnvSecretStore};
use flowscale_config::{ConfigProvider, FileStore};
use flowscale_engine::{
    ComputePlane, InMemoryComputePlane, RestComputePlane, ScalersManager, ScalingMetrics,
};
use flowscale_provider::{CycleDriver, Orchestrator, StateProvider};
use flowscale_triggers::BuilderFactory;

const DEFAULT_GLOBAL_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "flowd", about = "FlowScale external-metrics autoscaler")]
struct Cli {
    /// Configuration document handle (a file path).
    #[arg(long, env = "FLOWSCALE_CONFIG")]
    config: String,

    /// Port for the HTTP surface.
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Base URL of the compute control plane's REST API. When omitted the
    /// daemon runs dry against an in-memory plane.
    #[arg(long, env = "FLOWSCALE_COMPUTE_ENDPOINT")]
    compute_endpoint: Option<String>,

    /// Scale services through the autoscaling floor (revision-template min
    /// instances) instead of the manual instance count.
    #[arg(long, env = "FLOWSCALE_USE_MIN_INSTANCES")]
    use_min_instances: bool,

    /// Record scaling gauges for the /metrics endpoint.
    #[arg(long, env = "FLOWSCALE_EMIT_METRICS")]
    emit_metrics: bool,

    /// Emit logs as JSON for log collectors.
    #[arg(long, env = "FLOWSCALE_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // Configuration problems are fatal; everything past this point retries
    // per cycle instead of exiting.
    let config_provider = ConfigProvider::new(Box::new(FileStore::new()));
    let config = Arc::new(config_provider.load(&cli.config).await?);
    info!(
        config = %cli.config,
        workloads = config.spec.scaled_objects.len(),
        "configuration loaded"
    );

    let compute: Arc<dyn ComputePlane> = match &cli.compute_endpoint {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "using REST compute plane");
            Arc::new(RestComputePlane::new(endpoint)?)
        }
        None => {
            warn!("no compute endpoint configured; running dry against an in-memory plane");
            Arc::new(InMemoryComputePlane::new())
        }
    };

    let metrics = Arc::new(ScalingMetrics::new());
    let manager = if cli.emit_metrics {
        ScalersManager::with_metrics(compute, cli.use_min_instances, metrics.clone())
    } else {
        ScalersManager::new(compute, cli.use_min_instances)
    };
    let scale_client = Arc::new(InProcessScaleClient::new(manager));

    let auth_resolver = AuthResolver::new(Arc::new(EnvSecretStore::new()));
    let orchestrator = Arc::new(Orchestrator::new(
        scale_client,
        config.clone(),
        BuilderFactory::new(auth_resolver, DEFAULT_GLOBAL_HTTP_TIMEOUT),
        StateProvider::new(),
    ));

    let polling_interval = config
        .spec
        .polling_interval
        .map(|secs| Duration::from_secs(u64::from(secs)));
    let driver = CycleDriver::new(orchestrator.clone(), polling_interval);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let driver_handle = tokio::spawn(driver.run(shutdown_rx));

    let router = build_router(AppState {
        orchestrator,
        metrics,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    // Give an in-flight cycle a bounded grace period.
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, driver_handle)
        .await
        .is_err()
    {
        warn!("polling loop did not stop within the shutdown grace period");
    }

    info!("flowd stopped");
    Ok(())
}

fn init_tracing(log_json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,flowd=debug,flowscale=debug".parse().unwrap());

    if log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
