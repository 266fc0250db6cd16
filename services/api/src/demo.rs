use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Args;

use crate::infra::{sample_listings, InMemoryBookingRepository, InMemoryListingDirectory};
use bookstay::bookings::checkout::{
    CheckoutOrchestrator, CheckoutSession, CheckoutUrls, PaymentError, PaymentGateway,
    SessionRequest,
};
use bookstay::bookings::domain::{BookingRequest, ListingId, UserId};
use bookstay::bookings::ledger::BookingLedger;
use bookstay::bookings::repository::{BookingView, ListingDirectory};
use bookstay::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Listing to book (defaults to the first seeded sample listing)
    #[arg(long, default_value = "L1")]
    pub(crate) listing: String,
    /// Customer name on the booking
    #[arg(long, default_value = "Jane Doe")]
    pub(crate) customer_name: String,
    /// Ten-digit contact phone
    #[arg(long, default_value = "9876543210")]
    pub(crate) phone: String,
    /// Customer address
    #[arg(long, default_value = "1 Main St, Des Moines")]
    pub(crate) address: String,
}

/// Offline stand-in for the payment provider so the demo never needs a
/// credential or a network.
struct DemoGateway;

#[async_trait]
impl PaymentGateway for DemoGateway {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        Ok(CheckoutSession {
            session_id: format!("cs_demo_{}", request.booking_id.short_tag()),
            redirect_url: format!(
                "https://checkout.provider.example/pay/cs_demo_{}",
                request.booking_id.short_tag()
            ),
        })
    }
}

fn demo_error(err: impl std::fmt::Display) -> AppError {
    AppError::Io(io::Error::other(err.to_string()))
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let repository = Arc::new(InMemoryBookingRepository::default());
    let directory = Arc::new(InMemoryListingDirectory::with_listings(sample_listings()));
    let ledger = Arc::new(BookingLedger::new(repository, directory.clone()));
    let checkout = CheckoutOrchestrator::new(
        ledger.clone(),
        Some(Arc::new(DemoGateway) as Arc<dyn PaymentGateway>),
        CheckoutUrls::new("http://localhost:5173"),
    );

    let listing_id = ListingId(args.listing.clone());
    let listing = directory
        .fetch(&listing_id)
        .map_err(demo_error)?
        .ok_or_else(|| demo_error(format!("no sample listing '{}'", args.listing)))?;

    let user = UserId("demo-user".to_string());
    let request = BookingRequest {
        listing_id: args.listing,
        customer_name: args.customer_name,
        phone: args.phone,
        address: args.address,
        id_proof_url: "/uploads/demo-id.png".to_string(),
        amount: listing.booking_price(),
        currency: None,
    };

    let (booking, listing) = ledger.create(&request, &user).map_err(demo_error)?;
    println!("== booking created ==");
    print_view(&BookingView::from_booking(&booking, Some(&listing)))?;

    let session = checkout
        .create_checkout_session(&booking.id, &user)
        .await
        .map_err(demo_error)?;
    println!("\n== checkout session ==");
    println!("session id:   {}", session.session_id);
    println!("redirect url: {}", session.redirect_url);

    let (booking, listing) = ledger.get(&booking.id, &user).map_err(demo_error)?;
    println!("\n== booking after checkout ==");
    print_view(&BookingView::from_booking(&booking, listing.as_ref()))?;

    Ok(())
}

fn print_view(view: &BookingView) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(view)
        .map_err(|err| AppError::Io(io::Error::other(err.to_string())))?;
    println!("{rendered}");
    Ok(())
}
