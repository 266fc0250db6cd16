//! Booking lifecycle core: the ledger that owns booking records and their
//! forward-only status machine, the checkout orchestrator that mints hosted
//! payment sessions, the ownership gateway, and the identity-proof store
//! contract. External collaborators (listing directory, payment provider,
//! authentication) enter through traits and headers only.

pub mod access;
pub mod checkout;
pub mod domain;
pub mod ledger;
pub mod proofs;
pub mod repository;
pub mod router;
pub mod stripe;

pub use access::{ensure_owner, is_owner, Forbidden};
pub use checkout::{
    to_minor_units, CheckoutError, CheckoutOrchestrator, CheckoutSession, CheckoutUrls,
    PaymentError, PaymentGateway, SessionRequest,
};
pub use domain::{
    is_valid_phone, Booking, BookingId, BookingRequest, BookingStatus, ListingId, UserId,
    ValidationError,
};
pub use ledger::{BookingLedger, LedgerError};
pub use proofs::{
    is_allowed_image, DiskProofStore, IdentityProofStore, ProofStoreError, ProofUpload,
    StoredProof,
};
pub use repository::{
    BookingRepository, BookingView, DirectoryError, ListingDirectory, ListingSummary, ListingView,
    RepositoryError,
};
pub use router::{booking_router, AuthenticatedUser, BookingApi, USER_ID_HEADER};
pub use stripe::StripeCheckoutClient;
