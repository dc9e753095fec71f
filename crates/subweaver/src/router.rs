// HTTP surface: one endpoint that authenticates, fetches, runs the pipeline,
// and returns the finished profile. Auth mismatches are rejected before any
// fetch work; a missing template is the only fatal request error.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::state::AppState;

pub fn init(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/profile", get(profile))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ProfileQuery {
    token: Option<String>,
}

async fn profile(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProfileQuery>,
) -> Response {
    if query.token.as_deref() != Some(state.token.expose_secret()) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let template = match state.template.fetch().await {
        Ok(template) => template,
        Err(err) => {
            error!(error = %err, "template fetch failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Generator error: {err}"),
            )
                .into_response();
        }
    };

    let sources = state.sources.fetch_all(&state.endpoints).await;
    let document = state.pipeline.run(template, sources);

    match serde_json::to_string_pretty(&document) {
        Ok(body) => (
            [
                (header::CONTENT_TYPE, "application/json; charset=utf-8"),
                (
                    header::CACHE_CONTROL,
                    "no-store, no-cache, must-revalidate",
                ),
            ],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "profile serialization failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Generator error: {err}"),
            )
                .into_response()
        }
    }
}
