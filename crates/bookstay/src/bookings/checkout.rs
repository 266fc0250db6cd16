use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use super::domain::{Booking, BookingId, BookingStatus, UserId};
use super::ledger::{BookingLedger, LedgerError};
use super::repository::{BookingRepository, ListingDirectory};

/// Provider-issued checkout handle: a redirect URL for the buyer plus the
/// session id used for later reconciliation. Never persisted by this core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub session_id: String,
    pub redirect_url: String,
}

/// Everything the provider needs to mint a hosted checkout session: a single
/// line item at the booking's amount in minor units, quantity one, and the
/// booking id carried in the metadata and redirect URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub booking_id: BookingId,
    pub currency: String,
    pub product_name: String,
    pub unit_amount: i64,
    pub quantity: u32,
    pub success_url: String,
    pub cancel_url: String,
}

/// Outbound seam to the payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: &SessionRequest)
        -> Result<CheckoutSession, PaymentError>;
}

/// Failures from the provider call itself, distinct from the unconfigured case.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment provider rejected the session request: {0}")]
    Provider(String),
    #[error("payment provider unreachable: {0}")]
    Transport(String),
}

/// Buyer-redirect targets, parameterized by booking id so the external
/// confirmation collaborator can find the record again.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    frontend_url: String,
}

impl CheckoutUrls {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        let frontend_url = frontend_url.into().trim_end_matches('/').to_string();
        Self { frontend_url }
    }

    pub fn success_url(&self, booking_id: &BookingId) -> String {
        format!(
            "{}/booking/success?bookingId={}",
            self.frontend_url, booking_id.0
        )
    }

    pub fn cancel_url(&self, booking_id: &BookingId) -> String {
        format!(
            "{}/booking/cancel?bookingId={}",
            self.frontend_url, booking_id.0
        )
    }
}

/// Provider-mandated decimal-to-minor-unit scaling: multiply by 100 and round
/// to the nearest integer, with no locale-specific behavior.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Sequences booking validation, provider-session creation, and the status
/// transition. Holds no state between requests beyond what the ledger
/// persists on the booking record.
pub struct CheckoutOrchestrator<R, L> {
    ledger: Arc<BookingLedger<R, L>>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    urls: CheckoutUrls,
}

impl<R, L> CheckoutOrchestrator<R, L>
where
    R: BookingRepository + 'static,
    L: ListingDirectory + 'static,
{
    pub fn new(
        ledger: Arc<BookingLedger<R, L>>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        urls: CheckoutUrls,
    ) -> Self {
        Self {
            ledger,
            gateway,
            urls,
        }
    }

    /// Create a hosted checkout session for a booking the caller owns.
    ///
    /// The booking is only marked `payment_pending` after the provider call
    /// succeeds; a provider failure leaves the stored status untouched. The
    /// amount comes from the persisted record, never from the caller, so a
    /// client cannot request a session at an arbitrary price.
    pub async fn create_checkout_session(
        &self,
        booking_id: &BookingId,
        user: &UserId,
    ) -> Result<CheckoutSession, CheckoutError> {
        let booking = self.ledger.authorized(booking_id, user)?;

        if booking.status.is_terminal() {
            return Err(CheckoutError::InvalidState {
                current: booking.status.label(),
            });
        }

        let request = self.build_session_request(&booking)?;

        let gateway = self.gateway.as_ref().ok_or(CheckoutError::NotConfigured)?;
        let session = gateway.create_session(&request).await?;

        // Ordering matters: the transition happens only once a session is
        // confirmed to exist. A write failure here means an orphaned provider
        // session, which operators must reconcile by hand.
        match self
            .ledger
            .transition(&booking.id, booking.status, BookingStatus::PaymentPending)
        {
            Ok(updated) => {
                info!(
                    booking_id = %updated.id.0,
                    session_id = %session.session_id,
                    "checkout session created"
                );
                Ok(session)
            }
            Err(err) => {
                error!(
                    booking_id = %booking.id.0,
                    session_id = %session.session_id,
                    %err,
                    "checkout session exists but status update failed; reconciliation required"
                );
                Err(CheckoutError::StatusUpdateFailed {
                    session_id: session.session_id,
                })
            }
        }
    }

    fn build_session_request(&self, booking: &Booking) -> Result<SessionRequest, CheckoutError> {
        let listing = self
            .ledger
            .resolve_listing(&booking.listing_ref)
            .map_err(|err| CheckoutError::ListingUnavailable(err.to_string()))?
            .ok_or_else(|| {
                CheckoutError::ListingUnavailable("associated listing not found".to_string())
            })?;

        // Guards against corrupted records reaching the provider.
        if !(booking.amount.is_finite() && booking.amount > 0.0) {
            return Err(CheckoutError::InvalidAmount);
        }

        let product_name = match listing.name.trim() {
            "" => format!("Property Booking #{}", booking.id.short_tag()),
            name => name.to_string(),
        };

        Ok(SessionRequest {
            booking_id: booking.id.clone(),
            currency: booking.currency.clone(),
            product_name,
            unit_amount: to_minor_units(booking.amount),
            quantity: 1,
            success_url: self.urls.success_url(&booking.id),
            cancel_url: self.urls.cancel_url(&booking.id),
        })
    }
}

/// Error raised by the checkout orchestrator. Every variant is a distinct kind
/// so callers can tell "nobody set this up" from "the call failed" from "you
/// don't own this booking".
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("booking not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("invalid booking amount")]
    InvalidAmount,
    #[error("booking is already {current}")]
    InvalidState { current: &'static str },
    #[error("associated listing unavailable: {0}")]
    ListingUnavailable(String),
    #[error("payment processing is not configured")]
    NotConfigured,
    #[error("payment initialization failed: {0}")]
    Payment(#[from] PaymentError),
    #[error("checkout session {session_id} created but booking update failed")]
    StatusUpdateFailed { session_id: String },
    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<LedgerError> for CheckoutError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::NotFound => CheckoutError::NotFound,
            LedgerError::Forbidden(_) => CheckoutError::Forbidden,
            other => CheckoutError::Ledger(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_unit_scaling_rounds_to_nearest_cent() {
        assert_eq!(to_minor_units(250.5), 25050);
        assert_eq!(to_minor_units(19.99), 1999);
        assert_eq!(to_minor_units(100.0), 10000);
        assert_eq!(to_minor_units(1234.56), 123456);
        assert_eq!(to_minor_units(0.01), 1);
    }

    #[test]
    fn redirect_urls_carry_the_booking_id() {
        let urls = CheckoutUrls::new("https://marketplace.test/");
        let id = BookingId("bk-000042".to_string());
        assert_eq!(
            urls.success_url(&id),
            "https://marketplace.test/booking/success?bookingId=bk-000042"
        );
        assert_eq!(
            urls.cancel_url(&id),
            "https://marketplace.test/booking/cancel?bookingId=bk-000042"
        );
    }
}
