//! Error taxonomy shared by every zonal crate.

use thiserror::Error;

use crate::types::{DescriptorId, IndexId};

/// Result type alias for zone operations.
pub type ZoneResult<T> = Result<T, ZoneError>;

/// Stable error classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown database, table, index or partition target.
    NotFound,
    /// Malformed or contradictory configuration fields.
    InvalidConfig,
    /// A subzone references an index the descriptor does not carry.
    StaleSubzone,
    /// A partition bound cannot be encoded under its column's type.
    EncodingFailure,
    /// The zone store failed underneath the operation.
    Storage,
}

/// Domain errors raised while resolving targets, validating configs or
/// generating subzone spans.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    #[error("{object} \"{name}\" does not exist")]
    NotFound { object: &'static str, name: String },

    #[error("index \"{name}\" is ambiguous (found in {})", .tables.join(" and "))]
    AmbiguousIndex { name: String, tables: Vec<String> },

    #[error("invalid zone config: {0}")]
    InvalidConfig(String),

    #[error("subzone references index {index_id} which does not exist on table {table_id}")]
    StaleSubzone {
        table_id: DescriptorId,
        index_id: IndexId,
    },

    #[error("cannot encode partition \"{partition}\" of index \"{index}\": {reason}")]
    EncodingFailure {
        index: String,
        partition: String,
        reason: String,
    },
}

impl ZoneError {
    pub fn not_found(object: &'static str, name: impl Into<String>) -> Self {
        ZoneError::NotFound {
            object,
            name: name.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        ZoneError::InvalidConfig(msg.into())
    }

    /// The stable kind of this error. Ambiguous index names are reported as
    /// `NotFound`, like a missing index.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ZoneError::NotFound { .. } | ZoneError::AmbiguousIndex { .. } => ErrorKind::NotFound,
            ZoneError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            ZoneError::StaleSubzone { .. } => ErrorKind::StaleSubzone,
            ZoneError::EncodingFailure { .. } => ErrorKind::EncodingFailure,
        }
    }
}
