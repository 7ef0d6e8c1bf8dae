//! # Calculation Client
//!
//! Sends a [`CalculationRequest`] to the compute service and turns the reply
//! into a number or a typed error:
//!
//! - operands that cannot be sent (missing, NaN, infinite) fail locally with
//!   [`CalcError::Validation`] and nothing goes over the wire
//! - transport failures and unreadable bodies become [`CalcError::Transport`]
//! - errors reported by the service become [`CalcError::Computation`]
//!
//! Nothing is retried. No timeout is set unless one is configured; the
//! transport's own behaviour applies.
//!
//! ## Example
//!
//! ```rust,no_run
//! use calc_core::client::{CalculationClient, HttpTransport};
//! use calc_core::request::{CalculationRequest, Operator};
//!
//! # async fn run() -> calc_core::CalcResult<()> {
//! let client = CalculationClient::new(HttpTransport::new("http://localhost:5000", None)?);
//! let value = client.calculate(&CalculationRequest::basic(5.0, Operator::Add, 3.0)).await?;
//! assert_eq!(value, 8.0);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::{CalcError, CalcResult};
use crate::request::CalculationRequest;
use crate::response::CalculationResult;

/// Path of the calculation endpoint, relative to the service base URL
pub const CALCULATE_PATH: &str = "/calculate";

/// Moves one request to the compute service and returns the raw body.
#[async_trait]
pub trait ComputeTransport: Send + Sync {
    async fn send(&self, request: &CalculationRequest) -> CalcResult<String>;
}

/// JSON-over-HTTP transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport for the service at `base_url`.
    ///
    /// `timeout` of `None` leaves reqwest's defaults in place.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> CalcResult<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(format!("calc_core/{}", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CalcError::transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(HttpTransport {
            client,
            endpoint: endpoint_for(base_url),
        })
    }
}

#[async_trait]
impl ComputeTransport for HttpTransport {
    async fn send(&self, request: &CalculationRequest) -> CalcResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| CalcError::transport(format!("network error: {}", e)))?;

        // Domain errors arrive with 4xx statuses, so the body decides.
        let status = response.status();
        debug!(%status, "compute service responded");

        response
            .text()
            .await
            .map_err(|e| CalcError::transport(format!("failed to read response: {}", e)))
    }
}

fn endpoint_for(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), CALCULATE_PATH)
}

/// Client for the compute service.
///
/// Cheap to clone; clones share the transport, so several requests may be
/// in flight at once.
#[derive(Clone)]
pub struct CalculationClient {
    transport: Arc<dyn ComputeTransport>,
}

impl CalculationClient {
    pub fn new(transport: impl ComputeTransport + 'static) -> Self {
        CalculationClient {
            transport: Arc::new(transport),
        }
    }

    pub fn from_shared(transport: Arc<dyn ComputeTransport>) -> Self {
        CalculationClient { transport }
    }

    /// Send `request` and return the service's numeric result (unrounded).
    pub async fn calculate(&self, request: &CalculationRequest) -> CalcResult<f64> {
        check_sendable(request)?;
        debug!(expression = %request.expression(), "sending calculation");

        let body = self.transport.send(request).await.map_err(|e| {
            warn!(error = %e, "calculation request failed");
            e
        })?;

        let result = CalculationResult::from_body(&body).map_err(|e| {
            warn!(error = %e, body = %body, "unreadable calculation response");
            e
        })?;

        result.into_value()
    }
}

/// JSON cannot carry NaN or infinities, so such operands never leave the client.
fn check_sendable(request: &CalculationRequest) -> CalcResult<()> {
    match request {
        CalculationRequest::Basic { num1, num2, .. } => {
            if !num1.is_finite() || !num2.is_finite() {
                return Err(CalcError::validation("Please enter valid numbers"));
            }
        }
        CalculationRequest::Scientific { function, num, .. } => {
            if function.is_constant() {
                return Ok(());
            }
            match num {
                None => return Err(CalcError::validation("Please enter a number")),
                Some(value) if !value.is_finite() => {
                    return Err(CalcError::validation("Please enter a valid number"))
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}
