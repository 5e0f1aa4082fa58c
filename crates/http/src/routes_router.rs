use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use routing::{PlanRequest, RoutingCalculator};
use serde_json::json;

use crate::{http_metrics, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chains", get(get_chains))
        .route("/routes", post(plan_routes))
        .with_state(state)
}

async fn get_chains() -> impl IntoResponse {
    let mut chains: Vec<_> = utils::get_supported_chains().values().copied().collect();
    chains.sort_by_key(|chain| chain.id);

    (StatusCode::OK, Json(json!({ "chains": chains })))
}

async fn plan_routes(
    State(AppState { routing: config, providers }): State<AppState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Response {
    let Json(plan) = match payload {
        Ok(plan) => plan,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
        }
    };

    let (request, snapshot) = plan.into_parts();
    let calculator = RoutingCalculator::from_snapshot(config, providers, Arc::new(snapshot));
    match calculator.calculate(&request).await {
        Ok(outcome) => {
            http_metrics::record_outcome(&outcome);
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(err) => {
            tracing::warn!(code = err.code(), %err, "planning failed");
            http_metrics::record_routing_error(&err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.code(), err.to_string())
        }
    }
}

fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    (
        status,
        Json(json!({ "error": { "code": code, "message": message } })),
    )
        .into_response()
}
