use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::checkout::{CheckoutSession, PaymentError, PaymentGateway, SessionRequest};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Thin client for Stripe's hosted Checkout Session API. The API base is
/// overridable so tests can point it at a local stub. Every call carries a
/// bounded deadline: a hung provider surfaces as a `Transport` error instead
/// of stalling the checkout request.
pub struct StripeCheckoutClient {
    http: Client,
    secret_key: String,
    api_base: String,
    timeout: Duration,
}

impl StripeCheckoutClient {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self::with_api_base(secret_key, DEFAULT_API_BASE)
    }

    pub fn with_api_base(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            secret_key: secret_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn form_params(request: &SessionRequest) -> Vec<(&'static str, String)> {
        vec![
            ("mode", "payment".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            (
                "line_items[0][price_data][currency]",
                request.currency.to_ascii_lowercase(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                request.product_name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                request.unit_amount.to_string(),
            ),
            ("line_items[0][quantity]", request.quantity.to_string()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            ("metadata[bookingId]", request.booking_id.0.clone()),
        ]
    }
}

impl std::fmt::Debug for StripeCheckoutClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeCheckoutClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SessionPayload {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

#[async_trait]
impl PaymentGateway for StripeCheckoutClient {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .timeout(self.timeout)
            .bearer_auth(&self.secret_key)
            .form(&Self::form_params(request))
            .send()
            .await
            .map_err(|err| PaymentError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorPayload>()
                .await
                .ok()
                .and_then(|payload| payload.error.message)
                .unwrap_or_else(|| format!("provider returned {status}"));
            return Err(PaymentError::Provider(message));
        }

        let payload = response
            .json::<SessionPayload>()
            .await
            .map_err(|err| PaymentError::Provider(format!("unexpected response: {err}")))?;

        let redirect_url = payload
            .url
            .ok_or_else(|| PaymentError::Provider("session missing redirect url".to_string()))?;

        Ok(CheckoutSession {
            session_id: payload.id,
            redirect_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookings::domain::BookingId;

    fn session_request() -> SessionRequest {
        SessionRequest {
            booking_id: BookingId("bk-000007".to_string()),
            currency: "USD".to_string(),
            product_name: "Seaside Cottage".to_string(),
            unit_amount: 25050,
            quantity: 1,
            success_url: "http://localhost:5173/booking/success?bookingId=bk-000007".to_string(),
            cancel_url: "http://localhost:5173/booking/cancel?bookingId=bk-000007".to_string(),
        }
    }

    #[test]
    fn form_params_encode_one_line_item_and_metadata() {
        let request = session_request();

        let params = StripeCheckoutClient::form_params(&request);
        let lookup = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(lookup("mode"), Some("payment"));
        assert_eq!(lookup("line_items[0][price_data][currency]"), Some("usd"));
        assert_eq!(
            lookup("line_items[0][price_data][unit_amount]"),
            Some("25050")
        );
        assert_eq!(lookup("line_items[0][quantity]"), Some("1"));
        assert_eq!(lookup("metadata[bookingId]"), Some("bk-000007"));
    }

    #[tokio::test]
    async fn unresponsive_provider_times_out_as_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        // Accept the connection, then never answer.
        let server = tokio::spawn(async move {
            let _socket = listener.accept().await.expect("accept");
            std::future::pending::<()>().await;
        });

        let client = StripeCheckoutClient::with_api_base("sk_test_x", format!("http://{addr}"))
            .with_timeout(Duration::from_millis(200));

        let err = client
            .create_session(&session_request())
            .await
            .expect_err("deadline expires");
        assert!(matches!(err, PaymentError::Transport(_)));

        server.abort();
    }
}
