//! Booking lifecycle and payment-session orchestration for a real-estate marketplace.
//!
//! The `bookings` module owns the domain core: the booking ledger (record creation,
//! retrieval, and forward-only status transitions), the checkout orchestrator that
//! turns a draft booking into a hosted payment session, the ownership gateway applied
//! to every booking operation, and the identity-proof store contract. Listing lookup,
//! authentication, and the payment provider itself stay behind traits so the service
//! layer can wire real or in-memory collaborators.

pub mod bookings;
pub mod config;
pub mod error;
pub mod telemetry;
