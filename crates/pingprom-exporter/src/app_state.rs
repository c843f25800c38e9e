//! Shared application state for the exporter's HTTP surface.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::obs::MetricsRegistry;

#[derive(Clone)]
pub struct AppState {
    registry: Arc<MetricsRegistry>,
    draining: CancellationToken,
}

impl AppState {
    /// `draining` is a watch token from the orchestrator; once it fires the
    /// readiness probe reports 503.
    pub fn new(registry: Arc<MetricsRegistry>, draining: CancellationToken) -> Self {
        Self { registry, draining }
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    pub fn is_draining(&self) -> bool {
        self.draining.is_cancelled()
    }
}
