pub mod directions;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::timeout;
use tracing::warn;

use crate::models::service::TransportMode;
use crate::observability::metrics::Metrics;

#[derive(Debug, Error)]
pub enum TravelError {
    #[error("routing request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("routing service returned status {0}")]
    Status(String),

    #[error("no route between locations")]
    NoRoute,
}

#[async_trait]
pub trait RoutingService: Send + Sync {
    async fn travel_minutes(
        &self,
        origin: &str,
        destination: &str,
        mode: TransportMode,
    ) -> Result<u32, TravelError>;
}

/// Travel time is advisory: any routing failure or timeout resolves to the fixed
/// default instead of blocking an assignment.
#[derive(Clone)]
pub struct TravelEstimator {
    routing: Option<Arc<dyn RoutingService>>,
    timeout: Duration,
    default_minutes: u32,
    metrics: Metrics,
}

impl TravelEstimator {
    pub fn new(
        routing: Option<Arc<dyn RoutingService>>,
        timeout: Duration,
        default_minutes: u32,
        metrics: Metrics,
    ) -> Self {
        Self {
            routing,
            timeout,
            default_minutes,
            metrics,
        }
    }

    pub async fn estimate(&self, origin: &str, destination: &str, mode: TransportMode) -> u32 {
        let Some(routing) = &self.routing else {
            return self.default_minutes;
        };

        match timeout(self.timeout, routing.travel_minutes(origin, destination, mode)).await {
            Ok(Ok(minutes)) => minutes,
            Ok(Err(err)) => {
                warn!(error = %err, origin, destination, "travel estimate failed; using default");
                self.metrics.travel_fallbacks_total.inc();
                self.default_minutes
            }
            Err(_) => {
                warn!(origin, destination, "travel estimate timed out; using default");
                self.metrics.travel_fallbacks_total.inc();
                self.default_minutes
            }
        }
    }
}
