//! # AppError
//!
//! Centralized error handling for the discovery engine.
//! Maps store and access failures to stable, matchable error codes.

use thiserror::Error;

/// Failures raised by a `Store<T>` adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An entity with this ID already exists (insert-or-fail stores)
    #[error("entity already exists with ID {0}")]
    Conflict(String),

    /// The entity to update or delete does not exist
    #[error("entity not found with ID {0}")]
    NotFound(String),

    /// The entity or patch could not be (de)serialized
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Infrastructure failure (e.g., DB down, connection reset)
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// The primary error type for all application and composite operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Trail, Spot)
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: String },

    /// A gated spot was read without creator, admin or discovery access
    #[error("spot {0} must be discovered first")]
    DiscoveryRequired(String),

    /// The account context carries no account id
    #[error("account id is required")]
    AccountIdRequired,

    /// Input failed validation (e.g., latitude out of range)
    #[error("validation error: {0}")]
    Validation(String),

    /// Store failure, with the underlying cause attached
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Stable code for transport layers to map onto responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::DiscoveryRequired(_) => "DISCOVERY_REQUIRED",
            Self::AccountIdRequired => "ACCOUNT_ID_REQUIRED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Only backend failures are worth retrying; everything else is deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(StoreError::Backend(_)))
    }
}

/// A specialized Result type for discovery logic.
pub type Result<T> = std::result::Result<T, AppError>;
