//! Shared application state for the reporting endpoint.

use std::sync::Arc;

use statkit_core::{AggregateSink, MetricsRegistry};

use crate::config::StatkitConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    registry: Arc<MetricsRegistry>,
}

struct AppStateInner {
    cfg: StatkitConfig,
}

impl AppState {
    /// State around an existing registry.
    pub fn new(cfg: StatkitConfig, registry: Arc<MetricsRegistry>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { cfg }),
            registry,
        }
    }

    /// State with a fresh registry built from `cfg`: configured reservoirs and
    /// an aggregate sink on every metric.
    pub fn from_config(cfg: StatkitConfig) -> Self {
        let registry = MetricsRegistry::new()
            .with_histogram_options(cfg.histogram_options())
            .with_sink_factory(AggregateSink::factory());
        Self::new(cfg, Arc::new(registry))
    }

    pub fn cfg(&self) -> &StatkitConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.registry)
    }
}
