use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryLedger};
use crate::routes::with_registration_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use matchdesk::config::AppConfig;
use matchdesk::error::AppError;
use matchdesk::telemetry;
use matchdesk::workflows::registration::{
    CategoryRegistry, ConversationGateway, CsvLedger, MessageCatalog, RegistrationLedger,
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let registry = Arc::new(CategoryRegistry::standard());
    let messages = MessageCatalog::new(config.payment.clone());

    let app = match config.ledger.csv_path.clone() {
        Some(path) => {
            info!(path = %path.display(), "using CSV registration ledger");
            build_router(registry, Arc::new(CsvLedger::open(path)?), messages)
        }
        None => {
            info!("no ledger path configured, registrations stay in memory");
            build_router(registry, Arc::new(InMemoryLedger::default()), messages)
        }
    };
    let app = app.layer(Extension(app_state)).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "registration desk ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router<L>(
    registry: Arc<CategoryRegistry>,
    ledger: Arc<L>,
    messages: MessageCatalog,
) -> axum::Router
where
    L: RegistrationLedger + 'static,
{
    let gateway = Arc::new(ConversationGateway::new(registry, ledger, messages));
    with_registration_routes(gateway)
}
