use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::{
    models::responses::ApiResponse,
    services::{
        aggregator::AggregateError, identity::AuthError, issuer::IssueError, qr::QrError,
        redemption::RedemptionError,
    },
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required.")]
    Unauthenticated,

    #[error("You are not allowed to do that.")]
    Forbidden,

    #[error("Class session not found or not scheduled today.")]
    UnknownSession,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Invalid or expired QR code.")]
    TokenInvalid,

    #[error("You are not enrolled in this class.")]
    SessionMismatch,

    #[error("Too many requests. Please slow down.")]
    RateLimited,

    #[error("Something went wrong. Please try again.")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UnknownSession | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::TokenInvalid => StatusCode::BAD_REQUEST,
            Self::SessionMismatch => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Internal(detail) = &self {
            tracing::error!("Request failed: {}", detail);
        }
        (
            status,
            Json(ApiResponse::failure(self.to_string(), status.as_u16())),
        )
            .into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential | AuthError::InvalidCredential => Self::Unauthenticated,
            AuthError::Signing(detail) => Self::Internal(detail),
        }
    }
}

impl From<IssueError> for AppError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::Forbidden => Self::Forbidden,
            IssueError::UnknownSession(_) => Self::UnknownSession,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<RedemptionError> for AppError {
    fn from(err: RedemptionError) -> Self {
        match err {
            RedemptionError::TokenInvalid => Self::TokenInvalid,
            RedemptionError::SessionMismatch => Self::SessionMismatch,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AggregateError> for AppError {
    fn from(err: AggregateError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<crate::managers::DirectoryError> for AppError {
    fn from(err: crate::managers::DirectoryError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<QrError> for AppError {
    fn from(err: QrError) -> Self {
        Self::Internal(err.to_string())
    }
}
