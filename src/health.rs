//! Health check module
//! Reports database connectivity for the `/health` endpoint

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{error, info};

use crate::database::DataStore;

pub const DATABASE_UP: &str = "connected and running";
pub const DATABASE_DOWN: &str = "not connected server has errors";

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Overall health state
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

/// Health status response
#[derive(Debug, Serialize, Clone)]
pub struct HealthStatus {
    pub status: HealthState,
    pub database: &'static str,
    pub response_time_ms: Option<u64>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthState::Healthy)
    }
}

/// Health checker for the application
#[derive(Clone)]
pub struct HealthChecker {
    store: Arc<dyn DataStore>,
}

impl HealthChecker {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn check_health(&self) -> HealthStatus {
        let start = Instant::now();

        let (status, database, response_time_ms) =
            match timeout(PROBE_TIMEOUT, self.store.ping()).await {
                Ok(Ok(())) => {
                    let elapsed = start.elapsed().as_millis() as u64;
                    info!("Database health check: OK ({}ms)", elapsed);
                    (HealthState::Healthy, DATABASE_UP, Some(elapsed))
                }
                Ok(Err(e)) => {
                    error!("Database health check failed: {}", e);
                    (HealthState::Unhealthy, DATABASE_DOWN, None)
                }
                Err(_) => {
                    error!("Database health check timed out");
                    (HealthState::Unhealthy, DATABASE_DOWN, None)
                }
            };

        HealthStatus {
            status,
            database,
            response_time_ms,
            timestamp: chrono::Utc::now(),
        }
    }
}
