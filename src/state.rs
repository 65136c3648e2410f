use std::sync::Arc;

use crate::config::{Config, EngineSettings};
use crate::engine::assignment::RotaEngine;
use crate::engine::scheduler::WeeklyScheduler;
use crate::observability::metrics::Metrics;
use crate::oracle::ReasoningOracle;
use crate::oracle::chat::{ChatCompletionOracle, ChatOracleParams};
use crate::store::{MemoryStore, RotaStore};
use crate::travel::RoutingService;
use crate::travel::directions::{DirectionsClient, DirectionsClientParams};

pub struct AppState {
    pub engine: RotaEngine,
    pub scheduler: WeeklyScheduler,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RotaStore>,
        oracle: Option<Arc<dyn ReasoningOracle>>,
        routing: Option<Arc<dyn RoutingService>>,
        settings: &EngineSettings,
    ) -> Self {
        let metrics = Metrics::new();

        Self {
            engine: RotaEngine::new(store, oracle, routing, settings, metrics.clone()),
            scheduler: WeeklyScheduler::new(),
            metrics,
        }
    }

    /// Wires the HTTP collaborators whose credentials are configured; the rest run on
    /// their deterministic fallbacks.
    pub fn from_config(config: &Config) -> Self {
        let oracle = config.oracle.as_ref().map(|oracle| {
            Arc::new(ChatCompletionOracle::new(ChatOracleParams {
                base_url: oracle.base_url.clone(),
                api_key: oracle.api_key.clone(),
                model: oracle.model.clone(),
            })) as Arc<dyn ReasoningOracle>
        });

        let routing = config.routing.as_ref().map(|routing| {
            Arc::new(DirectionsClient::new(DirectionsClientParams {
                base_url: routing.base_url.clone(),
                api_key: routing.api_key.clone(),
            })) as Arc<dyn RoutingService>
        });

        Self::new(Arc::new(MemoryStore::new()), oracle, routing, &config.engine)
    }
}
