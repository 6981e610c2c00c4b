use crate::config::VERIFICATION_HEADER;
use crate::error::VerificationError;
use crate::tracker::CompletionLatch;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

const BODY_PREFIX: &[u8] = br#"{"verification" : ""#;
const BODY_SUFFIX: &[u8] = br#""}"#;

/// Verification handler for one registered path
#[derive(Debug)]
pub struct EndpointHandler {
    path: String,
    /// `None` when exit-when-done is disabled.
    latch: Option<CompletionLatch>,
}

impl EndpointHandler {
    pub fn new(path: impl Into<String>, latch: Option<CompletionLatch>) -> Self {
        Self {
            path: path.into(),
            latch,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether this path has completed its verification.
    pub fn is_verified(&self) -> bool {
        self.latch.as_ref().is_some_and(CompletionLatch::is_fired)
    }

    /// Validate a verification request and extract the raw challenge value.
    pub fn challenge<'h>(
        &self,
        method: &Method,
        headers: &'h HeaderMap,
    ) -> Result<&'h HeaderValue, VerificationError> {
        if *method != Method::GET {
            return Err(VerificationError::InvalidMethod);
        }

        headers
            .get(VERIFICATION_HEADER)
            .filter(|value| !value.as_bytes().trim_ascii().is_empty())
            .ok_or(VerificationError::MissingChallenge)
    }

    /// Mark this path verified. Returns `true` only for the first completion.
    pub fn complete(&self) -> bool {
        self.latch.as_ref().is_some_and(CompletionLatch::fire)
    }
}

/// Echo the challenge back to Okta.
///
/// The header bytes are spliced into the body verbatim, with no JSON escaping.
pub fn verification_response(challenge: &HeaderValue) -> Response {
    let mut body = Vec::with_capacity(BODY_PREFIX.len() + challenge.len() + BODY_SUFFIX.len());
    body.extend_from_slice(BODY_PREFIX);
    body.extend_from_slice(challenge.as_bytes());
    body.extend_from_slice(BODY_SUFFIX);

    (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        Body::from(body),
    )
        .into_response()
}

/// One-time verification endpoint
///
/// Routed for every method so that anything other than `GET` answers
/// `400 Bad Request` rather than `405`.
///
/// # Request
///
/// ```text
/// GET /eventhook/test
/// x-okta-verification-challenge: random-test-shared-key
/// ```
///
/// # Response
///
/// ```json
/// {"verification" : "random-test-shared-key"}
/// ```
pub async fn verify(
    State(endpoint): State<Arc<EndpointHandler>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let challenge = match endpoint.challenge(&method, &headers) {
        Ok(challenge) => challenge,
        Err(err) => {
            tracing::error!(method = %method, path = %uri.path(), "{err}");
            return err.into_response();
        }
    };

    let response = verification_response(challenge);
    tracing::info!(path = %uri.path(), "one-time verification response sent");

    if endpoint.complete() {
        tracing::info!(path = %endpoint.path(), "event hook verified");
    }

    response
}
