//! Ownership checks for booking records.
//!
//! Every read or mutating operation on a booking runs through `ensure_owner`;
//! the ledger and the checkout orchestrator both call it rather than comparing
//! ids inline, so the comparison cannot drift between endpoints.

use super::domain::{Booking, UserId};

/// Authenticated-but-not-the-owner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("forbidden")]
pub struct Forbidden;

/// Ownership predicate: ids are compared by canonical string form so the same
/// id arriving in different representations still matches.
pub fn is_owner(booking: &Booking, user: &UserId) -> bool {
    booking.user_ref.canonical() == user.canonical()
}

pub fn ensure_owner(booking: &Booking, user: &UserId) -> Result<(), Forbidden> {
    if is_owner(booking, user) {
        Ok(())
    } else {
        Err(Forbidden)
    }
}
