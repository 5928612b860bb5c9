use crate::cli::ServeArgs;
use crate::infra::{cors_layer, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use reidentify::config::AppConfig;
use reidentify::error::AppError;
use reidentify::requests::RequestWorkflowService;
use reidentify::store::{InMemoryRequestStore, MongoRequestStore, RequestStore};
use reidentify::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if args.in_memory {
        warn!("serving from an in-memory store; decisions are lost on restart");
        return serve(config, Arc::new(InMemoryRequestStore::default())).await;
    }

    let store = MongoRequestStore::connect(&config.store).await?;
    match store.ping().await {
        Ok(()) => info!("mongodb connected"),
        Err(err) => warn!(
            error = %err,
            "mongodb unreachable at startup; requests fail until it recovers"
        ),
    }
    serve(config, Arc::new(store)).await
}

async fn serve<S>(config: AppConfig, store: Arc<S>) -> Result<(), AppError>
where
    S: RequestStore + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(RequestWorkflowService::new(
        store,
        config.workflow.unknown_status,
    ));

    let app = with_operational_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(cors_layer(&config.cors)?);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "ReIDentify backend ready");
    info!("health check available at http://{addr}/api/health");

    axum::serve(listener, app).await?;
    Ok(())
}
