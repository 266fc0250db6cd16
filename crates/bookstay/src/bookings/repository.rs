use serde::{Deserialize, Serialize};

use super::domain::{Booking, BookingId, BookingStatus, ListingId};

/// Storage abstraction over booking records. The ledger is the only component
/// that calls the mutating operations; everything else goes through the ledger.
pub trait BookingRepository: Send + Sync {
    fn insert(&self, booking: Booking) -> Result<Booking, RepositoryError>;
    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError>;
    /// Conditional status update: succeeds only while the stored status still
    /// equals `expected`, so two racing checkout requests cannot both win.
    fn transition(
        &self,
        id: &BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stored status no longer matches the expected status")]
    StaleStatus,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Read-only lookup into the external listing directory. Listings are never
/// mutated by this core.
pub trait ListingDirectory: Send + Sync {
    fn fetch(&self, id: &ListingId) -> Result<Option<ListingSummary>, DirectoryError>;
}

/// Listing-directory lookup failure, independent of business validity.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("listing directory unavailable: {0}")]
    Unavailable(String),
}

/// The slice of a listing record the booking core needs for display and
/// checkout labeling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSummary {
    pub id: ListingId,
    pub name: String,
    pub address: String,
    pub regular_price: f64,
    pub discount_price: f64,
    pub offer: bool,
}

impl ListingSummary {
    /// The price a booking would be charged today.
    pub fn booking_price(&self) -> f64 {
        if self.offer {
            self.discount_price
        } else {
            self.regular_price
        }
    }
}

/// Public projection of a listing, whitelisting the fields callers may see.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub id: ListingId,
    pub name: String,
    pub address: String,
    pub regular_price: f64,
    pub discount_price: f64,
    pub offer: bool,
}

impl From<&ListingSummary> for ListingView {
    fn from(listing: &ListingSummary) -> Self {
        Self {
            id: listing.id.clone(),
            name: listing.name.clone(),
            address: listing.address.clone(),
            regular_price: listing.regular_price,
            discount_price: listing.discount_price,
            offer: listing.offer,
        }
    }
}

/// Public projection of a booking. Response shaping is an explicit whitelist
/// per entity, never a strip-one-field pass over the stored record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: BookingId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<ListingView>,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub id_proof_url: String,
    pub amount: f64,
    pub currency: String,
    pub status: &'static str,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl BookingView {
    pub fn from_booking(booking: &Booking, listing: Option<&ListingSummary>) -> Self {
        Self {
            id: booking.id.clone(),
            listing: listing.map(ListingView::from),
            customer_name: booking.customer_name.clone(),
            phone: booking.phone.clone(),
            address: booking.address.clone(),
            id_proof_url: booking.id_proof_url.clone(),
            amount: booking.amount,
            currency: booking.currency.clone(),
            status: booking.status.label(),
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}
