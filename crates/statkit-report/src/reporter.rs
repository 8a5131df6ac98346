//! Reporters: read a registry and emit it somewhere.

use std::io::{self, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use statkit_core::error::{Result, StatkitError};
use statkit_core::MetricsRegistry;

use crate::config::ReporterSection;
use crate::{payload, render};

/// A collaborator exporting registry contents on demand.
///
/// Reporters only use the registry's read side. `report_now` is called by
/// [`crate::schedule::spawn`] once per interval, or directly by callers.
#[async_trait]
pub trait Reporter: Send + Sync {
    fn name(&self) -> &str;
    async fn report_now(&self, registry: &MetricsRegistry) -> Result<()>;
}

/// Writes the text exposition to any writer (stdout by default).
pub struct ConsoleReporter<W = io::Stdout> {
    prefix: String,
    out: Mutex<W>,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(prefix: impl Into<String>) -> Self {
        Self::new(io::stdout(), prefix)
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn name(&self) -> &str {
        "console"
    }

    async fn report_now(&self, registry: &MetricsRegistry) -> Result<()> {
        let body = render::render_text(registry, &self.prefix);
        let mut out = self
            .out
            .lock()
            .map_err(|_| StatkitError::Report("console writer poisoned".into()))?;
        let write_err = |e: io::Error| StatkitError::Report(format!("console write failed: {e}"));
        out.write_all(body.as_bytes()).map_err(write_err)?;
        out.flush().map_err(write_err)
    }
}

/// Builds the raw-sink payload each interval and emits it as a log event.
///
/// The payload is never sent over the network; the last one is kept for
/// inspection.
pub struct PayloadReporter {
    cfg: ReporterSection,
    last: Mutex<Option<String>>,
}

impl PayloadReporter {
    pub fn new(cfg: ReporterSection) -> Self {
        Self {
            cfg,
            last: Mutex::new(None),
        }
    }

    /// JSON of the most recent report, if any.
    pub fn last_payload(&self) -> Option<String> {
        self.last.lock().ok().and_then(|g| g.clone())
    }
}

#[async_trait]
impl Reporter for PayloadReporter {
    fn name(&self) -> &str {
        "payload"
    }

    async fn report_now(&self, registry: &MetricsRegistry) -> Result<()> {
        let payload = payload::collect(registry, &self.cfg);
        let metrics = payload.components.iter().map(|c| c.metrics.len()).sum::<usize>();
        let json = payload::to_json(&payload)?;

        tracing::info!(target: "statkit::payload", metrics, payload = %json, "payload ready");

        let mut last = self
            .last
            .lock()
            .map_err(|_| StatkitError::Report("payload slot poisoned".into()))?;
        *last = Some(json);
        Ok(())
    }
}
