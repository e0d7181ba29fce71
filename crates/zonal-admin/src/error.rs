//! Admin error types.

use thiserror::Error;
use zonal_core::{ErrorKind, ZoneError};
use zonal_state::StateError;

/// Errors that can occur during administrative operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Zone(#[from] ZoneError),

    #[error("zone store error: {0}")]
    State(#[from] StateError),
}

impl AdminError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::Zone(err) => err.kind(),
            AdminError::State(_) => ErrorKind::Storage,
        }
    }
}

pub type AdminResult<T> = Result<T, AdminError>;
