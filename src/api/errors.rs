// src/api/errors.rs
//! Error types of the request boundary and their wire rendering.

use crate::core::common::AssetMapError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request: missing field, bad box, unsupported mode or command.
    #[error("Invalid request: {0}")]
    Validation(String),
    /// Well-formed request that does not apply to the map's extent.
    #[error("{0}")]
    BoundaryPolicy(String),
    /// The store round-trip failed; the in-memory map may be ahead of it.
    #[error("Persistence failure: {0}")]
    Persistence(#[source] AssetMapError),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wire form of an error: `{ "error": <code>, "message": <text> }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: u16,
    pub message: String,
}

impl ApiError {
    pub const fn code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::BoundaryPolicy(_) => 422,
            ApiError::Persistence(_) => 503,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse { error: self.code(), message: self.to_string() }
    }
}

impl From<AssetMapError> for ApiError {
    fn from(err: AssetMapError) -> Self {
        match err {
            e if e.is_validation() => ApiError::Validation(e.to_string()),
            e @ AssetMapError::OutsideBoundary { .. } => ApiError::BoundaryPolicy(e.to_string()),
            e if e.is_persistence() => ApiError::Persistence(e),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", err))
    }
}
