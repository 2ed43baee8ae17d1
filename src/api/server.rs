use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use crate::alerting::{AlertingGate, NullNotifier, WebhookNotifier};
use crate::config::Config;
use crate::dispatch::AidDispatchCore;
use crate::observability::Metrics;
use crate::store::{EncoderCache, EncoderRegistry, HttpClusterDirectoryClient, StoreHandle};
use crate::video::{HttpVideoRecordClient, VideoRecordClient};
use crate::workers::{TimeoutMonitor, VideoHealer};

use super::handlers::{claim_job, complete_job, get_job, health, list_jobs, update_job};
use super::state::AppState;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Assembles the routed, layered `Router` from a ready [`AppState`].
/// Split out from [`run`] so integration tests can drive the same routes
/// with `tower::ServiceExt::oneshot` against isolated, in-process state.
pub fn build_router(state: AppState, request_timeout_secs: u64) -> Router {
    Router::new()
        .route("/aid/v1/health", get(health))
        .route("/aid/v1/list-jobs", post(list_jobs))
        .route("/aid/v1/claim-job", post(claim_job))
        .route("/aid/v1/update-job", post(update_job))
        .route("/aid/v1/complete-job", post(complete_job))
        .route("/aid/v1/get-job", post(get_job))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_secs)))
}

/// Boots the Aid Dispatch Service. Opens the local encoder registry
/// synchronously (must succeed), connects the job store in the background
/// with a bounded budget, then starts the transport and the two background
/// singletons.
pub async fn run(config: Config) -> Result<(), AnyError> {
    info!(bind_addr = %config.server.bind_addr, "starting aid dispatch service");

    let registry = EncoderRegistry::open(&config.registry.path)
        .map_err(|e| format!("failed to open encoder registry: {e}"))?;
    let registry = Arc::new(registry);

    let store = StoreHandle::connecting(
        config.store.path.clone(),
        Duration::from_secs(config.store.connect_timeout_secs),
    );

    let metrics = Arc::new(Metrics::new());

    let http_client = reqwest::Client::new();

    let alerting = Arc::new(match &config.alerting.webhook_url {
        Some(url) => AlertingGate::new(Box::new(WebhookNotifier::new(
            http_client.clone(),
            url.clone(),
            metrics.clone(),
        ))),
        None => AlertingGate::new(Box::new(NullNotifier)),
    });

    let video_client: Arc<dyn VideoRecordClient> = match &config.video_client.base_url {
        Some(url) => Arc::new(HttpVideoRecordClient::new(http_client.clone(), url.clone())),
        None => crate::video::InMemoryVideoRecordClient::shared(),
    };

    let encoder_cache = config.encoder_cache.directory_base_url.as_ref().map(|url| {
        Arc::new(EncoderCache::new(Arc::new(HttpClusterDirectoryClient::new(
            http_client.clone(),
            url.clone(),
        ))))
    });

    let core = Arc::new(AidDispatchCore::new(
        store.clone(),
        alerting.clone(),
        metrics.clone(),
        config.server.list_jobs_cap,
    ));

    tokio::spawn(
        TimeoutMonitor::new(
            store.clone(),
            alerting.clone(),
            metrics.clone(),
            config.timeout_monitor.ttl_secs,
            config.timeout_monitor.tick_interval_secs,
        )
        .run(),
    );

    tokio::spawn(
        VideoHealer::new(
            store.clone(),
            video_client,
            alerting.clone(),
            metrics.clone(),
            config.healer.job_window_secs,
            config.healer.record_window_secs,
            config.healer.tick_interval_secs,
        )
        .run(),
    );

    let _ = encoder_cache; // retained on AppState once a display endpoint consumes it

    let state = AppState::new(core, registry, metrics);
    let app = build_router(state, config.server.request_timeout_secs);

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    info!(bind_addr = %config.server.bind_addr, "aid dispatch service listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
