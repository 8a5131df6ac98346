//! Top-level facade crate for statkit.
//!
//! Re-exports the core metrics engine and the reporting library so users can
//! depend on a single crate.
//!
//! ```
//! use statkit::MetricsRegistry;
//!
//! let registry = MetricsRegistry::new();
//! let requests = registry.counter("requests").unwrap();
//! requests.inc();
//! assert_eq!(registry.counter("requests").unwrap().count(), 1);
//! ```

pub mod core {
    pub use statkit_core::*;
}

pub mod report {
    pub use statkit_report::*;
}

pub use statkit_core::{MetricsRegistry, Result, StatkitError};
