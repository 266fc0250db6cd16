use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::access::{ensure_owner, Forbidden};
use super::domain::{
    Booking, BookingId, BookingRequest, BookingStatus, ListingId, UserId, ValidationError,
};
use super::repository::{
    BookingRepository, DirectoryError, ListingDirectory, ListingSummary, RepositoryError,
};

/// Single source of truth for booking records and their status. All writes to a
/// booking go through this type; the orchestrator and router never touch the
/// repository directly.
pub struct BookingLedger<R, L> {
    repository: Arc<R>,
    listings: Arc<L>,
}

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_booking_id() -> BookingId {
    let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BookingId(format!("bk-{id:06}"))
}

impl<R, L> BookingLedger<R, L>
where
    R: BookingRepository + 'static,
    L: ListingDirectory + 'static,
{
    pub fn new(repository: Arc<R>, listings: Arc<L>) -> Self {
        Self {
            repository,
            listings,
        }
    }

    /// Validate a submission and persist it as a `draft` booking. The payment
    /// provider is never contacted here. Returns the stored record together
    /// with the listing it references, already resolved for the response.
    pub fn create(
        &self,
        request: &BookingRequest,
        user: &UserId,
    ) -> Result<(Booking, ListingSummary), LedgerError> {
        let validated = request.validate()?;

        let listing = self
            .listings
            .fetch(&validated.listing_id)?
            .ok_or(LedgerError::ListingNotFound)?;

        let now = Utc::now();
        let booking = Booking {
            id: next_booking_id(),
            listing_ref: validated.listing_id,
            user_ref: user.clone(),
            customer_name: validated.customer_name,
            phone: validated.phone,
            address: validated.address,
            id_proof_url: validated.id_proof_url,
            amount: validated.amount,
            currency: validated.currency,
            status: BookingStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(booking)?;
        Ok((stored, listing))
    }

    /// Fetch a booking for its owner, with the listing expanded for display.
    /// The listing may have disappeared from the directory since creation; the
    /// caller's view tolerates that.
    pub fn get(
        &self,
        id: &BookingId,
        user: &UserId,
    ) -> Result<(Booking, Option<ListingSummary>), LedgerError> {
        let booking = self.authorized(id, user)?;
        let listing = self.listings.fetch(&booking.listing_ref)?;
        Ok((booking, listing))
    }

    /// Load a booking and enforce ownership, nothing else.
    pub fn authorized(&self, id: &BookingId, user: &UserId) -> Result<Booking, LedgerError> {
        let booking = self.repository.fetch(id)?.ok_or(LedgerError::NotFound)?;
        ensure_owner(&booking, user)?;
        Ok(booking)
    }

    pub fn resolve_listing(
        &self,
        id: &ListingId,
    ) -> Result<Option<ListingSummary>, DirectoryError> {
        self.listings.fetch(id)
    }

    /// Forward-only, compare-and-swap status transition. A stale expectation
    /// (another request won the race) and an illegal step are both conflicts;
    /// stored state is left untouched in either case.
    pub fn transition(
        &self,
        id: &BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking, LedgerError> {
        if !expected.permits(next) {
            return Err(LedgerError::InvalidTransition {
                from: expected.label(),
                to: next.label(),
            });
        }

        match self.repository.transition(id, expected, next) {
            Ok(booking) => Ok(booking),
            Err(RepositoryError::NotFound) => Err(LedgerError::NotFound),
            Err(RepositoryError::StaleStatus) => Err(LedgerError::StatusConflict),
            Err(other) => Err(LedgerError::Repository(other)),
        }
    }
}

/// Error raised by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("the property you're trying to book was not found")]
    ListingNotFound,
    #[error("booking not found")]
    NotFound,
    #[error(transparent)]
    Forbidden(#[from] Forbidden),
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("booking status changed concurrently")]
    StatusConflict,
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
