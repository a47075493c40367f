//! Proctor
//!
//! Wires the integrity monitor together for headless runs:
//! - Layered configuration
//! - Logging and the Prometheus exporter
//! - Scripted session replay against the configured backend

pub mod config;
pub mod replay;
pub mod surfaces;

use backend_client::HttpBackend;
use config::{LoggingConfig, ProctorConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use session_control::SessionState;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) {
    let level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
            .expect("Failed to set tracing subscriber");
    } else {
        tracing::subscriber::set_global_default(builder.finish())
            .expect("Failed to set tracing subscriber");
    }
}

/// Serve Prometheus metrics on `addr`
pub fn install_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Replay `script` as one session against the configured backend
pub async fn run_script(config: &ProctorConfig, script: &Path) -> anyhow::Result<SessionState> {
    let steps = replay::load_script(script)?;
    info!("Replaying {} steps from {}", steps.len(), script.display());

    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let outcome = replay::run_session(config, steps, backend).await?;

    for event in outcome.events.events() {
        debug!("{} {} ({})", event.timestamp, event.kind, event.severity);
    }
    for (kind, count) in outcome.events.summary() {
        info!("  {:<32} {}", kind.as_str(), count);
    }
    Ok(outcome.state)
}
