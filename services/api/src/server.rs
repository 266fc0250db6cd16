use crate::cli::ServeArgs;
use crate::infra::{sample_listings, AppState, InMemoryBookingRepository, InMemoryListingDirectory};
use crate::routes::with_booking_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use bookstay::bookings::checkout::{CheckoutOrchestrator, CheckoutUrls, PaymentGateway};
use bookstay::bookings::ledger::BookingLedger;
use bookstay::bookings::proofs::DiskProofStore;
use bookstay::bookings::router::BookingApi;
use bookstay::bookings::stripe::StripeCheckoutClient;
use bookstay::config::AppConfig;
use bookstay::error::AppError;
use bookstay::telemetry;

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

    let repository = Arc::new(InMemoryBookingRepository::default());
    let listings = Arc::new(InMemoryListingDirectory::with_listings(sample_listings()));
    let ledger = Arc::new(BookingLedger::new(repository, listings));

    let gateway = config
        .payment
        .secret_key
        .clone()
        .map(|key| Arc::new(StripeCheckoutClient::new(key)) as Arc<dyn PaymentGateway>);
    if gateway.is_none() {
        info!("payment provider credential absent; checkout will answer NotConfigured");
    }

    let checkout = Arc::new(CheckoutOrchestrator::new(
        ledger.clone(),
        gateway,
        CheckoutUrls::new(config.payment.frontend_url.clone()),
    ));
    let proofs = Arc::new(DiskProofStore::new(config.uploads.directory.clone()));

    let api = BookingApi {
        ledger,
        checkout,
        proofs,
    };

    let app = with_booking_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "booking service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
