//! Hostctl Daemon - Main Entry Point
//! JSON-RPC server + background metrics poller

mod config;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::DaemonConfig;
use hostctl_api_rpc::{RpcServer, RpcServices};
use hostctl_core::application::{
    shutdown_channel, AlertEvaluator, AuditLog, CommandExecutor, MetricsPoller, MetricsSampler,
    ProcessRegistry, SnapshotCache,
};
use hostctl_core::port::time_provider::SystemTimeProvider;
use hostctl_core::port::TimeProvider;
use hostctl_infra_system::{platform_terminator, SubprocessRunner, SysinfoHostQuery};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const POLLER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

fn init_logging() -> Result<()> {
    let log_format = std::env::var("HOSTCTL_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("hostctl=info"))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Wait for the poller task; false if it panicked or outlived `limit`
async fn join_poller(handle: JoinHandle<()>, limit: Duration) -> bool {
    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(error = %e, "Metrics poller task failed");
            false
        }
        Err(_) => {
            warn!(timeout_ms = limit.as_millis() as u64, "Metrics poller did not stop in time");
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    init_logging()?;
    info!("Hostctl daemon v{} starting...", VERSION);

    // 2. Configuration
    let config = DaemonConfig::from_env();
    info!(
        host = %config.rpc.host,
        port = config.rpc.port,
        command_timeout_secs = config.command_timeout.as_secs(),
        poll_interval_secs = config.poll_interval.as_secs(),
        poll_evaluate_alerts = config.poll_evaluate_alerts,
        "Configuration loaded"
    );

    // 3. Dependency wiring
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let host = Arc::new(SysinfoHostQuery::new());
    let terminator = platform_terminator();
    info!(mechanism = terminator.mechanism(), "Process terminator selected");

    let audit = Arc::new(AuditLog::new(time_provider.clone()));
    let executor = Arc::new(
        CommandExecutor::new(
            Arc::new(SubprocessRunner::new()),
            audit.clone(),
            time_provider.clone(),
        )
        .with_default_timeout(config.command_timeout)
        .with_cancel_token(shutdown_rx.clone()),
    );
    let registry = Arc::new(ProcessRegistry::new(host.clone(), terminator, audit.clone()));
    let sampler = Arc::new(MetricsSampler::new(host, time_provider.clone()));
    let alerts = Arc::new(AlertEvaluator::new(time_provider));
    let cache = SnapshotCache::new();

    // 4. Background poller
    let mut poller = MetricsPoller::new(sampler.clone(), cache.clone())
        .with_interval(config.poll_interval);
    if config.poll_evaluate_alerts {
        poller = poller.with_alerts(alerts.clone());
    }
    let poller_handle = tokio::spawn(poller.run(shutdown_rx));

    // 5. JSON-RPC server
    let services = RpcServices {
        executor,
        registry,
        sampler,
        alerts,
        audit,
        cache,
    };
    let rpc_handle = RpcServer::new(config.rpc.clone(), services)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!("System ready. Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 7. Graceful shutdown
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    join_poller(poller_handle, POLLER_STOP_TIMEOUT).await;

    info!("Shutdown complete.");

    Ok(())
}
