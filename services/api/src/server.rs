use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryEnquiryRepository, LoggingNotificationPublisher, SeedPropertyCatalog,
    TrustingPartnerDirectory,
};
use crate::routes::with_enquiry_routes;
use reparv_engine::config::AppConfig;
use reparv_engine::error::AppError;
use reparv_engine::telemetry;
use reparv_engine::workflows::enquiry::EnquiryService;

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

    let enquiry_service = Arc::new(EnquiryService::new(
        Arc::new(InMemoryEnquiryRepository::default()),
        Arc::new(SeedPropertyCatalog::default()),
        Arc::new(TrustingPartnerDirectory),
        Arc::new(LoggingNotificationPublisher),
    ));

    let app = with_enquiry_routes(enquiry_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "referral back office ready");

    axum::serve(listener, app).await?;
    Ok(())
}
