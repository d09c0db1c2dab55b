//! Request handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::server::AppState;
use crate::pipeline::{FailureKind, SessionSnapshot, TxOutcome};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecuteRequest {
    pub function: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    pub address: String,
    pub chain_id: String,
    pub network: String,
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub node_reachable: bool,
}

/// `POST /api/v1/execute`
pub async fn execute(
    State(state): State<AppState>,
    body: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let outcome = TxOutcome::failure(FailureKind::Internal, rejection.body_text());
            return (rejection.status(), Json(outcome)).into_response();
        }
    };

    tracing::info!(function = %request.function, "Execute");
    let outcome = state.router.execute(&request.function, &request.arguments).await;
    Json(outcome).into_response()
}

/// `GET /api/v1/account`, establishing the session if needed.
pub async fn account(State(state): State<AppState>) -> Response {
    match state.pipeline.ensure_session().await {
        Ok(session) => Json(AccountStatus {
            address: state.pipeline.identity().address().to_string(),
            chain_id: state.pipeline.network().chain_id.clone(),
            network: state.pipeline.network().kind.to_string(),
            session,
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Account lookup failed");
            (StatusCode::BAD_GATEWAY, Json(TxOutcome::from(e))).into_response()
        }
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let node_reachable = state.pipeline.node().is_healthy().await;
    let (code, status) = if node_reachable {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        code,
        Json(HealthStatus {
            status,
            version: env!("CARGO_PKG_VERSION"),
            node_reachable,
        }),
    )
}
