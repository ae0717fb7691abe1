use crate::cli::ServeArgs;
use crate::infra::{AppState, SessionPrefill};
use crate::routes::with_ownership_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ownership_flow::config::AppConfig;
use ownership_flow::error::AppError;
use ownership_flow::telemetry;
use ownership_flow::workflows::ownership::{
    InMemorySessionRepository, PrefillSource, VerificationSessionService,
};
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
    if let Some(path) = args.prefill_csv.take() {
        config.workflow.prefill_csv = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let prefill = SessionPrefill::from_config(&config.workflow);
    // fail at startup rather than on the first session
    prefill.load()?;
    let prefill_source = prefill.describe();

    let repository = Arc::new(InMemorySessionRepository::default());
    let session_service = Arc::new(VerificationSessionService::new(
        repository,
        Arc::new(prefill),
        config.workflow.clone(),
    ));

    let app = with_ownership_routes(session_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        prefill = %prefill_source,
        policy = ?config.workflow.transition_policy,
        "ownership verification orchestrator ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
