use std::{sync::Arc, time::Duration};

use axum::{body::Bytes, middleware, routing::get, Json, Router};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod http_metrics;
mod routes_router;

pub(crate) const PKG_NAME: &str = concat!("", env!("CARGO_PKG_NAME"));
pub(crate) const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub req_timeout: u8,
    pub metrics_port: u16,
    pub log_level: String,
    pub routing: routing::RoutingConfig,
}

/// Shared by every request; the collaborators themselves arrive with each plan request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub routing: routing::RoutingConfig,
    pub providers: Arc<routing::ReadOnlyProviders>,
}

/// Installs the global subscriber. `RUST_LOG` wins over `log_level` when set.
pub fn init_tracing(log_level: &str) -> eyre::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{PKG_NAME}={log_level},routing={log_level},planner={log_level},tower_http=debug"
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

pub fn run_server(cfg: ServerConfig) -> eyre::Result<()> {
    init_tracing(&cfg.log_level)?;
    cfg.routing.validate()?;

    // creates a new default tokio multi-thread [Runtime](tokio::runtime::Runtime) with all features enabled
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let providers = routing::ReadOnlyProviders::new(&cfg.routing.chain_ids())?;
            let state = AppState {
                routing: cfg.routing.clone(),
                providers: Arc::new(providers),
            };
            // `/metrics` is served on its own port so it can stay private
            let (main_server, metrics_server) = tokio::join!(
                start_main_server(&cfg, state),
                http_metrics::start_metrics_server(&cfg),
            );
            main_server.and(metrics_server)
        })
}

pub fn app(state: AppState, req_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/version", get(|| async { Json(json!({ "version": VERSION })) }))
        .merge(routes_router::router(state))
        .route_layer(middleware::from_fn(http_metrics::track_request_metrics))
        .layer((
            TraceLayer::new_for_http().on_body_chunk(
                |chunk: &Bytes, _latency: Duration, _span: &Span| {
                    tracing::debug!("streaming {} bytes", chunk.len())
                },
            ),
            TimeoutLayer::new(req_timeout),
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ))
}

async fn start_main_server(cfg: &ServerConfig, state: AppState) -> eyre::Result<()> {
    let app = app(state, Duration::from_secs(cfg.req_timeout.into()));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port)).await?;
    tracing::info!("running planner server on {}...", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

// support graceful shutdown
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
