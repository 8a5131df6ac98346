//! statkit reporting: collaborators that read a [`MetricsRegistry`] and export it.
//!
//! The core crate only records. This crate wires the read side: strict YAML
//! configuration, a text exposition renderer, the raw-sink aggregate payload,
//! periodic reporters on a tokio interval, and a pull HTTP endpoint. The
//! binary (`main.rs`) and integration tests consume it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. A failing report is
//! logged and counted; it never stops the schedule or the server.
//!
//! [`MetricsRegistry`]: statkit_core::MetricsRegistry

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod ops;
pub mod payload;
pub mod render;
pub mod reporter;
pub mod router;
pub mod schedule;

pub use reporter::{ConsoleReporter, PayloadReporter, Reporter};
