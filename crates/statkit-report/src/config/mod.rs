//! Reporter config loader (strict parsing).

pub mod schema;

use std::fs;

use statkit_core::error::{Result, StatkitError};

pub use schema::{HistogramSection, ReporterSection, StatkitConfig};

pub fn load_from_file(path: &str) -> Result<StatkitConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| StatkitError::Config(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<StatkitConfig> {
    let cfg: StatkitConfig = serde_yaml::from_str(s)
        .map_err(|e| StatkitError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
