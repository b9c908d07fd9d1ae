//! Top-level error type aggregating the subsystem errors

use thiserror::Error;

use crate::cache::CacheError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::messaging::MessagingError;

/// Crate-level error
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

/// Crate-level result alias
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_errors_convert() {
        let err: ServiceError = MessagingError::not_initialized("no transport").into();
        assert!(matches!(err, ServiceError::Messaging(_)));

        let err: ServiceError = CacheError::BackendError("redis down".to_string()).into();
        assert!(matches!(err, ServiceError::Cache(_)));
    }
}
