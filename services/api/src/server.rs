use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryEnrollmentStore};
use crate::routes::{with_enrollment_routes, with_mock_courses};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use enrollment::admission::{EnrollmentService, StaticCourseCatalog};
use enrollment::config::{AdmissionMode, AppConfig, ConfigError};
use enrollment::error::AppError;
use enrollment::remote::{HttpCourseDirectory, HttpIdentityResolver};
use enrollment::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mode = args.standalone.then_some(AdmissionMode::Standalone);
    let mut config = AppConfig::load_with_mode(mode)?;

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

    let timeout = config.upstream.lookup_timeout;
    let identity = Arc::new(HttpIdentityResolver::new(
        config.upstream.auth_service_url.as_str(),
        timeout,
    )?);
    let store = Arc::new(InMemoryEnrollmentStore::new(config.store.max_connections));
    let engine_config = config.admission.engine_config();

    let app = match config.admission.mode {
        AdmissionMode::Registry => {
            let base_url = config
                .upstream
                .course_service_url
                .as_deref()
                .ok_or(ConfigError::MissingCourseServiceUrl)?;
            let directory = Arc::new(HttpCourseDirectory::new(base_url, timeout)?);
            let service = Arc::new(EnrollmentService::new(store, directory, engine_config));
            with_enrollment_routes(service, identity)
        }
        AdmissionMode::Standalone => {
            let catalog = Arc::new(StaticCourseCatalog::standard()?);
            let service = Arc::new(EnrollmentService::new(
                store,
                catalog.clone(),
                engine_config,
            ));
            with_mock_courses(with_enrollment_routes(service, identity), catalog)
        }
    };
    let app = app.layer(Extension(app_state)).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        mode = ?config.admission.mode,
        %addr,
        "enrollment service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
