use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for booking records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

impl BookingId {
    /// Last six characters of the id, used for the fallback product label when a
    /// listing display name is unavailable.
    pub fn short_tag(&self) -> &str {
        let start = self
            .0
            .char_indices()
            .rev()
            .take(6)
            .last()
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &self.0[start..]
    }
}

/// Identifier of a listing held by the external listing directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

/// Identifier of the authenticated user owning a booking. The core never reads
/// credentials; this is solely the ownership handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Canonical form for ownership comparison: ids arriving from different
    /// representations must compare equal by their trimmed, case-folded string.
    pub fn canonical(&self) -> String {
        self.0.trim().to_ascii_lowercase()
    }
}

/// Payment lifecycle of a booking. Transitions only move forward; `paid` and
/// `canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Draft,
    PaymentPending,
    Paid,
    Canceled,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BookingStatus::Draft => "draft",
            BookingStatus::PaymentPending => "payment_pending",
            BookingStatus::Paid => "paid",
            BookingStatus::Canceled => "canceled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Paid | BookingStatus::Canceled)
    }

    /// Whether `next` is a legal forward step from this status.
    /// `payment_pending -> payment_pending` is allowed so a session can be
    /// re-minted for a booking the provider never completed.
    pub const fn permits(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Draft, BookingStatus::PaymentPending)
                | (BookingStatus::Draft, BookingStatus::Canceled)
                | (BookingStatus::PaymentPending, BookingStatus::PaymentPending)
                | (BookingStatus::PaymentPending, BookingStatus::Paid)
                | (BookingStatus::PaymentPending, BookingStatus::Canceled)
        )
    }
}

/// Persisted booking record. `listing_ref`, `user_ref`, and `amount` are fixed
/// at creation; only `status` and `updated_at` change afterwards, and only
/// through the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub listing_ref: ListingId,
    pub user_ref: UserId,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub id_proof_url: String,
    pub amount: f64,
    pub currency: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inbound booking submission, field names matching the public API contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default)]
    pub listing_id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub id_proof_url: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Validated, normalized booking fields ready for persistence.
#[derive(Debug, Clone)]
pub struct ValidatedBooking {
    pub listing_id: ListingId,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub id_proof_url: String,
    pub amount: f64,
    pub currency: String,
}

/// Field-level intake failures, each citing the offending field by name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("phone must be exactly 10 digits")]
    InvalidPhone,
    #[error("please provide a valid booking amount")]
    InvalidAmount,
    #[error("currency must be a 3-letter code")]
    InvalidCurrency,
}

impl ValidationError {
    pub const fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing { field } => field,
            ValidationError::InvalidPhone => "phone",
            ValidationError::InvalidAmount => "amount",
            ValidationError::InvalidCurrency => "currency",
        }
    }
}

/// Exactly ten ASCII decimal digits, nothing else.
pub fn is_valid_phone(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    Ok(trimmed)
}

impl BookingRequest {
    /// Trim, validate, and normalize the submission. The listing's existence is
    /// the ledger's concern; everything checked here is in-memory.
    pub fn validate(&self) -> Result<ValidatedBooking, ValidationError> {
        let listing_id = required(&self.listing_id, "listingId")?.to_string();
        let customer_name = required(&self.customer_name, "customerName")?.to_string();
        let phone = required(&self.phone, "phone")?.to_string();
        let address = required(&self.address, "address")?.to_string();
        let id_proof_url = required(&self.id_proof_url, "idProofUrl")?.to_string();

        if !is_valid_phone(&phone) {
            return Err(ValidationError::InvalidPhone);
        }

        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err(ValidationError::InvalidAmount);
        }

        let currency = match self.currency.as_deref().map(str::trim) {
            None | Some("") => "USD".to_string(),
            Some(code) => {
                if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
                    return Err(ValidationError::InvalidCurrency);
                }
                code.to_ascii_uppercase()
            }
        };

        Ok(ValidatedBooking {
            listing_id: ListingId(listing_id),
            customer_name,
            phone,
            address,
            id_proof_url,
            amount: self.amount,
            currency,
        })
    }
}
