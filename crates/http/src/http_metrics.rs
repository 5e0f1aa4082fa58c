use std::{future::ready, time::Instant};

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::IntoResponse,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

const REQUEST_DURATION: &str = "http_requests_duration_seconds";

fn setup_metrics_recorder() -> eyre::Result<PrometheusHandle> {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), EXPONENTIAL_SECONDS)?
        .install_recorder()?;
    Ok(handle)
}

pub(crate) async fn start_metrics_server(cfg: &crate::ServerConfig) -> eyre::Result<()> {
    let recorder_handle = setup_metrics_recorder()?;
    let app = Router::new().route("/metrics", get(move || ready(recorder_handle.render())));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.metrics_port)).await?;
    tracing::info!("metrics server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(crate::shutdown_signal())
        .await?;
    Ok(())
}

pub(crate) async fn track_request_metrics(req: Request, next: Next) -> impl IntoResponse {
    let start = Instant::now();
    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };
    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();
    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!(REQUEST_DURATION, &labels).record(latency);

    response
}

pub(crate) fn record_outcome(outcome: &routing::RoutingOutcome) {
    metrics::counter!("routing_outcomes_total", "outcome" => outcome.label()).increment(1);
}

pub(crate) fn record_routing_error(err: &routing::RoutingError) {
    metrics::counter!("routing_errors_total", "code" => err.code()).increment(1);
}
