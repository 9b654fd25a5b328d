use crate::cli::ServeArgs;
use crate::infra::{
    seeded_criteria, seeded_directory, seeded_tokens, AppState, InMemoryEvaluationRepository,
    LoggingNotificationPublisher,
};
use crate::routes::with_portal_routes;
use abz_portal::config::AppConfig;
use abz_portal::error::AppError;
use abz_portal::performance::EvaluationService;
use abz_portal::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryEvaluationRepository::default());
    let notifications = Arc::new(LoggingNotificationPublisher);
    let service = Arc::new(EvaluationService::new(
        repository,
        notifications,
        Arc::new(seeded_criteria()),
        Arc::new(seeded_directory()),
        Arc::new(seeded_tokens()),
    ));

    let app = with_portal_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "abz portal evaluation api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
