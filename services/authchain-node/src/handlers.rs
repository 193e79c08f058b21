use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use authchain_core::{validate_chain, ChainValidation, LedgerError};
use authchain_identity::{AuthOutcome, IdentityError};
use authchain_mesh::{ChainResponse, MeshError, SyncBlockRequest};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Display;
use tracing::error;

use crate::state::AppState;

/// Failure response carrying a status code and a `{"message"}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(err: impl Display) -> Self {
        error!(error = %err, "Request failed with internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::AlreadyRegistered { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "User already registered.")
            }
            IdentityError::UserNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "User not found.")
            }
            IdentityError::UserOrChallengeNotFound { .. }
            | IdentityError::ChallengeNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "User or challenge not found.")
            }
            other => Self::internal(other),
        }
    }
}

impl From<MeshError> for ApiError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::Ledger(LedgerError::HashMismatch { .. }) => Self::new(
                StatusCode::BAD_REQUEST,
                "Block rejected (hash mismatch)",
            ),
            other => Self::internal(other),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct SignRequest {
    pub username: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub username: String,
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub username: String,
    pub signature: String,
}

pub async fn welcome(State(state): State<AppState>) -> String {
    format!("Welcome to AuthChain node {}!", state.node_id)
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "authchain-node",
        "node_id": state.node_id,
        "timestamp": Utc::now().to_rfc3339()
    }))
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    let public_key = state.protocol.register(&request.username)?;

    Ok(Json(json!({
        "message": "Registration successful.",
        "username": request.username,
        "public_key": public_key
    })))
}

pub async fn sign(
    State(state): State<AppState>,
    Json(request): Json<SignRequest>,
) -> Result<Json<Value>, ApiError> {
    let signature = state.protocol.sign(&request.username, &request.message)?;

    Ok(Json(json!({
        "message": "Signature generated.",
        "username": request.username,
        "signature": signature
    })))
}

pub async fn authenticate(
    State(state): State<AppState>,
    Json(request): Json<AuthenticateRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state.protocol.authenticate(
        &request.username,
        &request.message,
        &request.signature,
    )?;

    match outcome {
        AuthOutcome::Accepted => Ok(Json(json!({ "message": "Authentication successful." }))),
        AuthOutcome::Rejected => Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Authentication failed.",
        )),
    }
}

pub async fn challenge(
    State(state): State<AppState>,
    Json(request): Json<ChallengeRequest>,
) -> Result<Json<Value>, ApiError> {
    let challenge = state.protocol.begin_challenge(&request.username)?;

    Ok(Json(json!({
        "message": "Challenge generated.",
        "challenge": challenge
    })))
}

pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state
        .protocol
        .complete_challenge(&request.username, &request.signature)?;

    match outcome {
        AuthOutcome::Accepted => Ok(Json(json!({
            "message": "Zero-Knowledge Authentication successful."
        }))),
        AuthOutcome::Rejected => Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Zero-Knowledge Authentication failed.",
        )),
    }
}

pub async fn sync_block(
    State(state): State<AppState>,
    Json(request): Json<SyncBlockRequest>,
) -> Result<Json<Value>, ApiError> {
    state.sync.receive(request.block)?;
    Ok(Json(json!({ "message": "Block synced" })))
}

pub async fn consensus(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let report = state.consensus.reconcile().await?;

    Ok(Json(json!({
        "message": "Consensus complete.",
        "length": report.length,
        "replaced": report.replaced,
        "source": report.source,
        "peers_polled": report.peers_polled,
        "peers_unreachable": report.peers_unreachable
    })))
}

pub async fn chain(State(state): State<AppState>) -> Result<Json<ChainResponse>, ApiError> {
    let snapshot = state
        .ledger()
        .read()
        .map_err(|e| ApiError::internal(format!("ledger lock poisoned: {}", e)))?
        .snapshot();

    Ok(Json(ChainResponse::from_chain(snapshot)))
}

pub async fn validate(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let (validation, length) = {
        let ledger = state
            .ledger()
            .read()
            .map_err(|e| ApiError::internal(format!("ledger lock poisoned: {}", e)))?;
        (validate_chain(ledger.blocks()), ledger.len())
    };

    let errors: Vec<String> = match &validation {
        ChainValidation::Valid => Vec::new(),
        invalid => vec![invalid.to_string()],
    };

    Ok(Json(json!({
        "ok": validation.is_valid(),
        "length": length,
        "errors": errors
    })))
}
