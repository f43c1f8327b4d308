//! # Verification API
//!
//! Builds the axum router for the challenge/response flow. All handlers
//! share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path          | Description                                   |
//! |--------|---------------|-----------------------------------------------|
//! | GET    | `/health`     | Liveness probe                                |
//! | GET    | `/api/verify` | Issue a signing challenge (sets the session)  |
//! | POST   | `/api/verify` | Verify a signature and pin the NFT metadata   |
//! | other  | `/api/verify` | Fallback: `{"message":"Invalid api route"}`   |
//!
//! ## The two-faced error policy
//!
//! The POST handler knows exactly why a submission failed — missing
//! challenge, stale challenge, malformed signature, address mismatch,
//! pinning outage — and tells the logs. The client gets precisely two
//! distinguishable outcomes: the metadata was incomplete, or "no". The
//! collapse is deliberate; anything finer-grained is a signature-validity
//! oracle.

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use mintgate_core::challenge::{Challenge, StoredChallenge};
use mintgate_core::config::{AppConfig, CHALLENGE_SESSION_KEY, SESSION_COOKIE_NAME};
use mintgate_core::crypto::signature::{verify_submission, VerificationError};
use mintgate_core::pinning::{MetadataPinner, NftMetadataDraft, PinningError};
use mintgate_core::session::{CookieSession, SessionStore};
use mintgate_core::SignatureSubmission;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Deployment configuration, built once at startup.
    pub config: Arc<AppConfig>,
    /// The pinning collaborator. A real Pinata client in production, a
    /// mock in tests.
    pub pinner: Arc<dyn MetadataPinner>,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/verify",
            get(issue_challenge_handler)
                .post(verify_and_pin_handler)
                .fallback(invalid_route_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request Types
// ---------------------------------------------------------------------------

/// Body of `POST /api/verify`. Everything is optional at the parsing
/// layer; the handler decides which absence maps to which rejection.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub nft: NftMetadataDraft,
    pub address: Option<String>,
    pub signature: Option<String>,
}

// ---------------------------------------------------------------------------
// Internal failure taxonomy (logs only — never the wire)
// ---------------------------------------------------------------------------

/// Why a POST was rejected. Rich for the logs, collapsed on the wire.
#[derive(Debug, Error)]
enum SubmissionError {
    #[error("no challenge in session")]
    MissingChallenge,

    #[error("challenge in session is unreadable")]
    CorruptChallenge,

    #[error("challenge expired")]
    StaleChallenge,

    #[error("address or signature missing from request")]
    IncompleteSubmission,

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Pinning(#[from] PinningError),
}

/// The one generic rejection body for anything past metadata validation.
fn generic_rejection() -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({ "message": "Couldnt create JSON MetaData" })),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Session cookie plumbing
// ---------------------------------------------------------------------------

/// Extracts our session cookie's value from the request headers, if any.
fn session_cookie_value(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE_NAME).then(|| value.to_string())
    })
}

/// Opens the request's session, empty if no (valid) cookie was sent.
fn open_session(headers: &HeaderMap, config: &AppConfig) -> CookieSession {
    CookieSession::open(&config.cookie_password, session_cookie_value(headers).as_deref())
}

/// Formats the Set-Cookie header for a sealed session value.
fn set_cookie_value(sealed: &str, config: &AppConfig) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE_NAME, sealed
    );
    if config.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the server is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /api/verify` — issue a fresh challenge.
///
/// Generates a challenge bound to the configured contract address, stores
/// it in the session (overwriting any prior challenge), and returns it as
/// the response body with the re-sealed session cookie attached. The only
/// failure mode is the session refusing to seal.
async fn issue_challenge_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let challenge = Challenge::generate(&state.config.contract_address);
    let stored = StoredChallenge::issue(challenge.clone());

    let mut session = open_session(&headers, &state.config);
    let sealed = serde_json::to_value(&stored)
        .map_err(anyhow::Error::from)
        .and_then(|value| {
            session.set(CHALLENGE_SESSION_KEY, value);
            session
                .seal(&state.config.cookie_password)
                .map_err(anyhow::Error::from)
        });

    let cookie = match sealed {
        Ok(sealed) => set_cookie_value(&sealed, &state.config),
        Err(error) => {
            tracing::error!(%error, "failed to persist challenge into session");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "message": "Cannot generate a message!" })),
            )
                .into_response();
        }
    };

    tracing::debug!(challenge_id = %challenge.id, "challenge issued");

    let mut response = (StatusCode::OK, Json(challenge)).into_response();
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
            response
        }
        Err(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "message": "Cannot generate a message!" })),
        )
            .into_response(),
    }
}

/// `POST /api/verify` — verify a signed challenge, then pin.
///
/// Metadata completeness is checked first and cheaply; cryptography only
/// runs for well-formed requests. Everything after that collapses to the
/// generic rejection on failure.
async fn verify_and_pin_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Response {
    // A body that isn't JSON at all gets the generic rejection, same as
    // any other malformed submission.
    let Ok(Json(request)) = body else {
        tracing::warn!("submission body failed to parse as JSON");
        return generic_rejection();
    };

    // 1. Fail fast on incomplete metadata, before touching the session or
    //    any cryptography.
    let Some(nft) = request.nft.clone().complete() else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "message": "Form data are missing" })),
        )
            .into_response();
    };

    let session = open_session(&headers, &state.config);
    match handle_submission(&state, &session, request, nft).await {
        Ok(pin_response) => (StatusCode::OK, Json(pin_response)).into_response(),
        Err(reason) => {
            tracing::warn!(%reason, "submission rejected");
            generic_rejection()
        }
    }
}

/// Steps 2–4 of the POST state machine: load the session's challenge,
/// verify the signature, forward to the pinner.
async fn handle_submission(
    state: &AppState,
    session: &CookieSession,
    request: VerifyRequest,
    nft: mintgate_core::pinning::NftMetadata,
) -> Result<serde_json::Value, SubmissionError> {
    let (Some(address), Some(signature)) = (request.address, request.signature) else {
        return Err(SubmissionError::IncompleteSubmission);
    };

    let stored: StoredChallenge = session
        .get(CHALLENGE_SESSION_KEY)
        .ok_or(SubmissionError::MissingChallenge)
        .and_then(|value| {
            serde_json::from_value(value.clone()).map_err(|_| SubmissionError::CorruptChallenge)
        })?;

    if stored.is_expired(state.config.challenge_ttl_secs) {
        return Err(SubmissionError::StaleChallenge);
    }

    let submission = SignatureSubmission { address, signature };
    verify_submission(&stored.challenge, &submission)?;

    tracing::debug!(challenge_id = %stored.challenge.id, "signature verified, pinning");

    // The pin label is a fresh UUID, not anything client-controlled.
    let pin_response = state
        .pinner
        .pin_metadata(&Uuid::new_v4().to_string(), &nft)
        .await?;
    Ok(pin_response)
}

/// Any other method on `/api/verify` — a fallback, not an error path.
async fn invalid_route_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Invalid api route" })),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
