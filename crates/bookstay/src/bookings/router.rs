use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Multipart, Path, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::checkout::{CheckoutError, CheckoutOrchestrator};
use super::domain::{BookingId, BookingRequest, UserId};
use super::ledger::{BookingLedger, LedgerError};
use super::proofs::{is_allowed_image, IdentityProofStore, ProofStoreError, ProofUpload};
use super::repository::{BookingRepository, BookingView, ListingDirectory, RepositoryError};

/// Header installed by the external authentication layer in front of this
/// service. Session issuance and verification are not this core's concern.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity extracted from the auth header; absence is a 401 before any
/// handler runs.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| AuthenticatedUser(UserId(value.to_string())))
            .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "authentication required"))
    }
}

/// Shared router state bundling the ledger, the orchestrator, and the proof
/// store behind one cloneable handle.
pub struct BookingApi<R, L> {
    pub ledger: Arc<BookingLedger<R, L>>,
    pub checkout: Arc<CheckoutOrchestrator<R, L>>,
    pub proofs: Arc<dyn IdentityProofStore>,
}

impl<R, L> Clone for BookingApi<R, L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            checkout: self.checkout.clone(),
            proofs: self.proofs.clone(),
        }
    }
}

/// Router builder exposing the booking endpoints.
pub fn booking_router<R, L>(api: BookingApi<R, L>) -> Router
where
    R: BookingRepository + 'static,
    L: ListingDirectory + 'static,
{
    Router::new()
        .route("/api/booking", post(create_booking_handler::<R, L>))
        .route("/api/booking/:id", get(get_booking_handler::<R, L>))
        .route(
            "/api/booking/checkout-session",
            post(checkout_session_handler::<R, L>),
        )
        .route("/api/booking/upload-id", post(upload_id_proof_handler::<R, L>))
        .with_state(api)
}

pub(crate) async fn create_booking_handler<R, L>(
    State(api): State<BookingApi<R, L>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(request): Json<BookingRequest>,
) -> Response
where
    R: BookingRepository + 'static,
    L: ListingDirectory + 'static,
{
    match api.ledger.create(&request, &user) {
        Ok((booking, listing)) => {
            let view = BookingView::from_booking(&booking, Some(&listing));
            let payload = json!({
                "success": true,
                "booking": view,
                "message": "Booking created successfully",
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => ledger_error_response(err),
    }
}

pub(crate) async fn get_booking_handler<R, L>(
    State(api): State<BookingApi<R, L>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Response
where
    R: BookingRepository + 'static,
    L: ListingDirectory + 'static,
{
    let id = BookingId(id);
    match api.ledger.get(&id, &user) {
        Ok((booking, listing)) => {
            let view = BookingView::from_booking(&booking, listing.as_ref());
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(err) => ledger_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckoutSessionBody {
    #[serde(default)]
    booking_id: String,
}

pub(crate) async fn checkout_session_handler<R, L>(
    State(api): State<BookingApi<R, L>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<CheckoutSessionBody>,
) -> Response
where
    R: BookingRepository + 'static,
    L: ListingDirectory + 'static,
{
    let booking_id = body.booking_id.trim();
    if booking_id.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "bookingId required");
    }

    let booking_id = BookingId(booking_id.to_string());
    match api.checkout.create_checkout_session(&booking_id, &user).await {
        Ok(session) => {
            let payload = json!({ "url": session.redirect_url, "id": session.session_id });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => checkout_error_response(err),
    }
}

pub(crate) async fn upload_id_proof_handler<R, L>(
    State(api): State<BookingApi<R, L>>,
    AuthenticatedUser(_user): AuthenticatedUser,
    mut multipart: Multipart,
) -> Response
where
    R: BookingRepository + 'static,
    L: ListingDirectory + 'static,
{
    let upload = loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let content_type = field.content_type().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        break ProofUpload {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        }
                    }
                    Err(err) => return failure(StatusCode::BAD_REQUEST, &err.to_string()),
                }
            }
            Ok(None) => return failure(StatusCode::BAD_REQUEST, "No file uploaded"),
            Err(err) => return failure(StatusCode::BAD_REQUEST, &err.to_string()),
        }
    };

    if !is_allowed_image(&upload.content_type) {
        return failure(StatusCode::BAD_REQUEST, "Only JPEG/PNG allowed");
    }

    // Proof stores write to disk; keep that off the async workers.
    let proofs = api.proofs.clone();
    let stored = tokio::task::spawn_blocking(move || proofs.store(upload)).await;

    match stored {
        Ok(Ok(stored)) => (StatusCode::OK, Json(json!({ "url": stored.url }))).into_response(),
        Ok(Err(err @ ProofStoreError::UnsupportedMediaType(_))) => {
            failure(StatusCode::BAD_REQUEST, &err.to_string())
        }
        Ok(Err(err)) => failure(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
        Err(err) => failure(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

fn failure(status: StatusCode, message: &str) -> Response {
    let payload = json!({ "success": false, "message": message });
    (status, Json(payload)).into_response()
}

fn ledger_error_response(err: LedgerError) -> Response {
    match err {
        LedgerError::Validation(err) => {
            let payload = json!({
                "success": false,
                "message": "Validation error",
                "errors": [{ "field": err.field(), "message": err.to_string() }],
            });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        LedgerError::ListingNotFound => failure(
            StatusCode::NOT_FOUND,
            "The property you're trying to book was not found",
        ),
        LedgerError::NotFound => failure(StatusCode::NOT_FOUND, "Booking not found"),
        LedgerError::Forbidden(_) => failure(StatusCode::FORBIDDEN, "Forbidden"),
        err @ (LedgerError::InvalidTransition { .. } | LedgerError::StatusConflict) => {
            failure(StatusCode::CONFLICT, &err.to_string())
        }
        LedgerError::Directory(err) => {
            failure(StatusCode::SERVICE_UNAVAILABLE, &err.to_string())
        }
        LedgerError::Repository(RepositoryError::Conflict) => failure(
            StatusCode::CONFLICT,
            "A booking already exists for this property",
        ),
        LedgerError::Repository(err) => {
            failure(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

fn checkout_error_response(err: CheckoutError) -> Response {
    match err {
        CheckoutError::NotFound => failure(StatusCode::NOT_FOUND, "Booking not found"),
        CheckoutError::Forbidden => failure(StatusCode::FORBIDDEN, "Forbidden"),
        CheckoutError::InvalidAmount => {
            failure(StatusCode::BAD_REQUEST, "Invalid booking amount")
        }
        err @ CheckoutError::InvalidState { .. } => {
            failure(StatusCode::CONFLICT, &err.to_string())
        }
        err @ CheckoutError::ListingUnavailable(_) => {
            failure(StatusCode::SERVICE_UNAVAILABLE, &err.to_string())
        }
        CheckoutError::NotConfigured => failure(
            StatusCode::NOT_IMPLEMENTED,
            "Payment processing is not configured",
        ),
        err @ CheckoutError::Payment(_) => failure(StatusCode::BAD_GATEWAY, &err.to_string()),
        err @ CheckoutError::StatusUpdateFailed { .. } => {
            failure(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
        CheckoutError::Ledger(inner) => ledger_error_response(inner),
    }
}
