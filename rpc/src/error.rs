//! RPC error type and its HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use praman_credential::CredentialError;
use praman_orchestrator::FlowError;
use praman_registry::RegistryError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl RpcError {
    /// Validation and state errors map to 400, registry invariant
    /// conflicts to 409, missing records to 404, and credential failures
    /// to 401.
    fn status(&self) -> StatusCode {
        match self {
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::Credential(err) => match err {
                CredentialError::DuplicateConsumer(_) => StatusCode::CONFLICT,
                CredentialError::UnknownConsumer(_) => StatusCode::NOT_FOUND,
                CredentialError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                CredentialError::UnknownKey
                | CredentialError::StaleRequest
                | CredentialError::BadSignature => StatusCode::UNAUTHORIZED,
            },
            RpcError::Flow(err) => match err {
                FlowError::NoActiveFlow
                | FlowError::TooManyAttempts
                | FlowError::Challenge(_) => StatusCode::BAD_REQUEST,
                FlowError::Registry(inner) => registry_status(inner),
            },
            RpcError::Registry(err) => registry_status(err),
        }
    }
}

fn registry_status(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::NotFound(_) | RegistryError::UnknownOwner(_) => StatusCode::NOT_FOUND,
        RegistryError::DuplicateChannel
        | RegistryError::AlreadyLinked(_)
        | RegistryError::DuplicateReference(_)
        | RegistryError::Blacklisted(_)
        | RegistryError::OwnerBlacklisted(_) => StatusCode::CONFLICT,
        RegistryError::Allocation(_) | RegistryError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        RegistryError::UnverifiedChannel
        | RegistryError::EmptyOwnerSet
        | RegistryError::OwnerCardinalityViolation(_)
        | RegistryError::DuplicateOwner(_)
        | RegistryError::SelfDealing
        | RegistryError::InvalidLineItem(_)
        | RegistryError::ScoreOutOfRange(_)
        | RegistryError::InvalidRegionCode(_) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praman_challenge::ChallengeError;

    #[test]
    fn invariant_conflicts_are_409() {
        assert_eq!(
            RpcError::Registry(RegistryError::DuplicateChannel).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            RpcError::Registry(RegistryError::AlreadyLinked("x".into())).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn validation_failures_are_400() {
        assert_eq!(
            RpcError::Registry(RegistryError::SelfDealing).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RpcError::Flow(FlowError::Challenge(ChallengeError::CodeMismatch)).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn auth_failures_are_401_and_lookups_404() {
        assert_eq!(
            RpcError::Credential(CredentialError::BadSignature).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RpcError::Registry(RegistryError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
    }
}
