//! # Metrics Collection
//!
//! Prometheus metrics collection for the sessiond service.

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};
use ::tracing::info;
use metrics::{counter, describe_counter, describe_gauge, gauge, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the Prometheus metrics exporter
pub fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    let Some(bind_address) = config.metrics_bind_address() else {
        info!("Metrics port is 0, Prometheus exporter disabled");
        return Ok(());
    };

    let addr: SocketAddr = bind_address
        .parse()
        .map_err(|e| Error::config(format!("Invalid metrics address {}: {}", bind_address, e)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| Error::config(format!("Failed to install Prometheus exporter: {}", e)))?;

    describe_metrics();

    info!(address = %addr, "Prometheus metrics exporter listening");
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "sessions_revoked_total",
        Unit::Count,
        "Sessions invalidated through logout"
    );
    describe_counter!(
        "sessions_created_total",
        Unit::Count,
        "Sessions minted by the session service"
    );
    describe_counter!("http_requests_total", Unit::Count, "HTTP requests handled");
    describe_gauge!("sessions_active", Unit::Count, "Sessions currently in active status");
}

/// Record session invalidations
pub async fn record_session_revoked(count: u64) {
    counter!("sessions_revoked_total").increment(count);
}

/// Record session creations
pub async fn record_session_created(count: u64) {
    counter!("sessions_created_total").increment(count);
}

/// Update the active-session gauge
pub async fn set_active_sessions(count: usize) {
    gauge!("sessions_active").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_without_exporter_does_not_panic() {
        record_session_revoked(1).await;
        record_session_created(1).await;
        set_active_sessions(3).await;
    }
}
