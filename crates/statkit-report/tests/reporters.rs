#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use statkit_core::error::{Result, StatkitError};
use statkit_core::MetricsRegistry;
use statkit_report::app_state::AppState;
use statkit_report::config::{self, ReporterSection};
use statkit_report::{ops, schedule, ConsoleReporter, PayloadReporter, Reporter};
use tokio::sync::watch;

struct Failing;

#[async_trait]
impl Reporter for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn report_now(&self, _registry: &MetricsRegistry) -> Result<()> {
        Err(StatkitError::Report("backend unavailable".into()))
    }
}

#[tokio::test]
async fn console_reporter_writes_text_exposition() {
    let registry = MetricsRegistry::new();
    registry.counter("requests").unwrap().inc_by(7);

    let reporter = ConsoleReporter::new(Vec::new(), "web.");
    assert_eq!(reporter.name(), "console");
    reporter.report_now(&registry).await.unwrap();

    let written = String::from_utf8(reporter.into_inner()).unwrap();
    assert_eq!(written, "# TYPE web_requests counter\nweb_requests 7\n");
}

#[tokio::test]
async fn payload_reporter_keeps_last_payload() {
    let state = AppState::from_config(config::load_from_str("version: 1\n").unwrap());
    let registry = state.registry();
    registry.counter("c").unwrap().inc();

    let reporter = PayloadReporter::new(state.cfg().reporter.clone());
    assert!(reporter.last_payload().is_none());
    reporter.report_now(&registry).await.unwrap();

    let json: serde_json::Value = serde_json::from_str(&reporter.last_payload().unwrap()).unwrap();
    assert_eq!(json["components"][0]["name"], "statkit");
    assert_eq!(json["components"][0]["metrics"]["Component/c"]["count"], 1);
}

#[tokio::test]
async fn report_once_times_success_and_counts_failures() {
    let registry = MetricsRegistry::new();
    let ok = ConsoleReporter::new(Vec::new(), "");

    schedule::report_once(&ok, &registry).await;
    schedule::report_once(&Failing, &registry).await;
    schedule::report_once(&Failing, &registry).await;

    assert_eq!(registry.timer("statkit.report.console").unwrap().count(), 1);
    assert_eq!(registry.timer("statkit.report.failing").unwrap().count(), 2);
    assert_eq!(registry.counter("statkit.report.failing.errors").unwrap().count(), 2);
    assert!(registry.counters().get("statkit.report.console.errors").is_none());
}

#[tokio::test]
async fn scheduled_reporter_runs_until_shutdown() {
    let registry = Arc::new(MetricsRegistry::new());
    let reporter = Arc::new(PayloadReporter::new(ReporterSection::default()));
    let (tx, rx) = watch::channel(false);

    let handle = schedule::spawn(
        reporter.clone(),
        Arc::clone(&registry),
        Duration::from_millis(20),
        rx,
    );
    tokio::time::sleep(Duration::from_millis(150)).await;
    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("reporter must stop")
        .unwrap();

    let runs = registry.timer("statkit.report.payload").unwrap().count();
    assert!(runs >= 1, "ran {runs} times");
    assert!(reporter.last_payload().is_some());
}

#[tokio::test]
async fn scheduled_reporter_stops_when_sender_dropped() {
    let registry = Arc::new(MetricsRegistry::new());
    let (tx, rx) = watch::channel(false);
    let handle = schedule::spawn(Arc::new(Failing), registry, Duration::from_secs(3600), rx);
    drop(tx);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("reporter must stop")
        .unwrap();
}

#[tokio::test]
async fn ops_endpoints() {
    let cfg = config::load_from_str("version: 1\nreporter: { prefix: \"svc_\" }\n").unwrap();
    let state = AppState::from_config(cfg);
    state.registry().counter("up").unwrap().inc();

    let health = ops::healthz().await.into_response();
    assert_eq!(health.status(), StatusCode::OK);

    let resp = ops::metrics(State(state)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "text/plain; version=0.0.4; charset=utf-8"
    );
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("svc_up 1\n"), "{body}");
}
