//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/metrics` : text exposition of the registry

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{app_state::AppState, render};

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = render::render_text(&state.registry(), &state.cfg().reporter.prefix);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
