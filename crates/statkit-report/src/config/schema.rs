use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use statkit_core::error::{Result, StatkitError};
use statkit_core::HistogramOptions;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatkitConfig {
    pub version: u32,

    #[serde(default)]
    pub reporter: ReporterSection,

    #[serde(default)]
    pub histogram: HistogramSection,
}

impl Default for StatkitConfig {
    fn default() -> Self {
        Self {
            version: 1,
            reporter: ReporterSection::default(),
            histogram: HistogramSection::default(),
        }
    }
}

impl StatkitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(StatkitError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.reporter.validate()?;
        self.histogram.validate()?;

        Ok(())
    }

    /// Reservoir parameters for registry-created histograms and timers.
    pub fn histogram_options(&self) -> HistogramOptions {
        HistogramOptions {
            size: self.histogram.reservoir_size,
            alpha: self.histogram.alpha,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReporterSection {
    #[serde(default = "default_name")]
    pub name: String,

    /// Prepended verbatim to every exported name.
    #[serde(default)]
    pub prefix: String,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_guid")]
    pub guid: String,
}

impl Default for ReporterSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            prefix: String::new(),
            interval_secs: default_interval_secs(),
            listen: default_listen(),
            guid: default_guid(),
        }
    }
}

impl ReporterSection {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StatkitError::Config("reporter.name must not be empty".into()));
        }
        if !(1..=3600).contains(&self.interval_secs) {
            return Err(StatkitError::Config(
                "reporter.interval_secs must be between 1 and 3600".into(),
            ));
        }
        self.listen_addr()?;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            StatkitError::Config(format!("reporter.listen must be a valid SocketAddr: {e}"))
        })
    }
}

fn default_name() -> String {
    "statkit".into()
}
fn default_interval_secs() -> u64 {
    5
}
fn default_listen() -> String {
    "127.0.0.1:9102".into()
}
fn default_guid() -> String {
    "io.statkit".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistogramSection {
    #[serde(default = "default_reservoir_size")]
    pub reservoir_size: usize,

    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for HistogramSection {
    fn default() -> Self {
        Self {
            reservoir_size: default_reservoir_size(),
            alpha: default_alpha(),
        }
    }
}

impl HistogramSection {
    pub fn validate(&self) -> Result<()> {
        if self.reservoir_size == 0 {
            return Err(StatkitError::Config(
                "histogram.reservoir_size must be greater than 0".into(),
            ));
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(StatkitError::Config(
                "histogram.alpha must be a finite positive number".into(),
            ));
        }
        Ok(())
    }
}

fn default_reservoir_size() -> usize {
    statkit_core::sample::DEFAULT_SIZE
}
fn default_alpha() -> f64 {
    statkit_core::sample::DEFAULT_ALPHA
}
