//! Catalog error types

use thiserror::Error;
use uuid::Uuid;

use crate::messaging::MessagingError;

/// Errors from catalog operations
///
/// A write that commits to the store but fails to enqueue its downstream
/// task surfaces the messaging error to the caller as a dependency error.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product not found: {0}")]
    NotFound(Uuid),

    #[error("catalog store error: {0}")]
    Store(String),

    #[error(transparent)]
    Messaging(#[from] MessagingError),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
