pub mod driver;
pub mod identity;
pub mod notifier;
pub mod repository;

use std::fmt::Display;

/// Error taxonomy shared by every operation the engine exposes. Domain rule
/// violations arrive as the typed conflict variants; `Internal` is reserved
/// for persistence/infra faults and is the only variant whose detail is kept
/// away from callers.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Inventory(#[from] tandem_ride::InventoryError),

    #[error(transparent)]
    Ride(#[from] tandem_ride::RideError),

    #[error(transparent)]
    Lifecycle(#[from] tandem_booking::LifecycleError),

    #[error(transparent)]
    Review(#[from] tandem_review::ReviewError),

    #[error("internal service error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn internal(err: impl Display) -> Self {
        CoreError::Internal(err.to_string())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
