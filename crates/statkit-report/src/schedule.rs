//! Periodic reporting on a tokio interval.
//!
//! Each report is timed into `statkit.report.<name>` and failures are counted
//! in `statkit.report.<name>.errors`, both in the registry being reported.
//! A failing report is logged and the loop keeps going.

use std::sync::Arc;
use std::time::Duration;

use statkit_core::MetricsRegistry;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::reporter::Reporter;

/// Run `reporter.report_now` once, recording its duration and any failure.
pub async fn report_once(reporter: &dyn Reporter, registry: &MetricsRegistry) {
    let name = reporter.name();
    let timer = registry.timer(&format!("statkit.report.{name}")).ok();

    let ctx = timer.as_deref().map(|t| t.time());
    let res = reporter.report_now(registry).await;
    drop(ctx);

    if let Err(e) = res {
        tracing::warn!(reporter = %name, code = e.code().as_str(), error = %e, "report failed");
        if let Ok(errors) = registry.counter(&format!("statkit.report.{name}.errors")) {
            errors.inc();
        }
    }
}

/// Spawn a task reporting every `interval` until `shutdown` flips to `true`
/// or its sender is dropped. The first report happens one interval in.
pub fn spawn(
    reporter: Arc<dyn Reporter>,
    registry: Arc<MetricsRegistry>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = time::interval_at(Instant::now() + interval, interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(reporter = %reporter.name(), ?interval, "reporter started");

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    report_once(reporter.as_ref(), &registry).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!(reporter = %reporter.name(), "reporter stopped");
    })
}
