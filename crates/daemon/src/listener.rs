// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface: deploy, status, stop and health.

use crate::env::VERSION;
use ah_adapters::{ContainerAdapter, GitAdapter, RepairAdapter};
use ah_core::{Clock, JobSnapshot};
use ah_engine::{DeployRequest, Orchestrator};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Body of `POST /deploy`.
#[derive(Debug, Deserialize)]
pub struct DeployBody {
    #[serde(alias = "repoURL")]
    pub repo_url: String,
    #[serde(default, alias = "token")]
    pub github_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeployAccepted {
    status: &'static str,
    job_id: String,
}

/// Build the router over a shared orchestrator.
pub fn router<C, G, R, K>(orchestrator: Orchestrator<C, G, R, K>) -> Router
where
    C: ContainerAdapter,
    G: GitAdapter,
    R: RepairAdapter,
    K: Clock,
{
    Router::new()
        .route("/deploy", post(deploy::<C, G, R, K>))
        .route("/status", get(status::<C, G, R, K>))
        .route("/stop", post(stop::<C, G, R, K>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(orchestrator)
}

async fn deploy<C, G, R, K>(
    State(orchestrator): State<Orchestrator<C, G, R, K>>,
    Json(body): Json<DeployBody>,
) -> Response
where
    C: ContainerAdapter,
    G: GitAdapter,
    R: RepairAdapter,
    K: Clock,
{
    let request = DeployRequest { repo_url: body.repo_url, token: body.github_token };
    match orchestrator.deploy(request) {
        Ok(id) => (
            StatusCode::OK,
            Json(DeployAccepted { status: "started", job_id: id.to_string() }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "deploy rejected");
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn status<C, G, R, K>(
    State(orchestrator): State<Orchestrator<C, G, R, K>>,
) -> Json<JobSnapshot>
where
    C: ContainerAdapter,
    G: GitAdapter,
    R: RepairAdapter,
    K: Clock,
{
    Json(orchestrator.status())
}

async fn stop<C, G, R, K>(
    State(orchestrator): State<Orchestrator<C, G, R, K>>,
) -> Json<serde_json::Value>
where
    C: ContainerAdapter,
    G: GitAdapter,
    R: RepairAdapter,
    K: Clock,
{
    orchestrator.stop().await;
    Json(json!({ "message": "Process stopped" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
