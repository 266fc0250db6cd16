use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;

use bookstay::bookings::domain::{Booking, BookingId, BookingStatus, ListingId};
use bookstay::bookings::repository::{
    BookingRepository, DirectoryError, ListingDirectory, ListingSummary, RepositoryError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Booking storage for single-process deployments and demos. The persistent
/// database behind the wider marketplace stays outside this service; the
/// ledger only requires the `BookingRepository` contract.
#[derive(Default, Clone)]
pub(crate) struct InMemoryBookingRepository {
    records: Arc<Mutex<HashMap<BookingId, Booking>>>,
}

impl BookingRepository for InMemoryBookingRepository {
    fn insert(&self, booking: Booking) -> Result<Booking, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&booking.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(booking.id.clone(), booking.clone());
        Ok(booking)
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn transition(
        &self,
        id: &BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let booking = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if booking.status != expected {
            return Err(RepositoryError::StaleStatus);
        }
        booking.status = next;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }
}

/// Read-only listing lookup seeded at startup. Listing CRUD lives in the
/// marketplace service proper.
#[derive(Default, Clone)]
pub(crate) struct InMemoryListingDirectory {
    listings: Arc<HashMap<ListingId, ListingSummary>>,
}

impl InMemoryListingDirectory {
    pub(crate) fn with_listings(listings: Vec<ListingSummary>) -> Self {
        let listings = listings
            .into_iter()
            .map(|listing| (listing.id.clone(), listing))
            .collect();
        Self {
            listings: Arc::new(listings),
        }
    }
}

impl ListingDirectory for InMemoryListingDirectory {
    fn fetch(&self, id: &ListingId) -> Result<Option<ListingSummary>, DirectoryError> {
        Ok(self.listings.get(id).cloned())
    }
}

pub(crate) fn sample_listings() -> Vec<ListingSummary> {
    vec![
        ListingSummary {
            id: ListingId("L1".to_string()),
            name: "Seaside Cottage".to_string(),
            address: "12 Shore Rd, Half Moon Bay".to_string(),
            regular_price: 300.0,
            discount_price: 250.5,
            offer: true,
        },
        ListingSummary {
            id: ListingId("L2".to_string()),
            name: "Downtown Loft".to_string(),
            address: "88 5th Ave, Des Moines".to_string(),
            regular_price: 185.0,
            discount_price: 185.0,
            offer: false,
        },
        ListingSummary {
            id: ListingId("L3".to_string()),
            name: "Prairie Farmhouse".to_string(),
            address: "401 County Rd 12, Ames".to_string(),
            regular_price: 140.0,
            discount_price: 120.0,
            offer: true,
        },
    ]
}
