//! Repository factory trait
//!
//! Repositories are built from a configuration value (usually a [`DbClient`])
//! so the scheduler stays agnostic of the concrete storage.
//!
//! [`DbClient`]: crate::DbClient

/// A trait for database repository factories
///
/// This trait defines a factory for creating repository instances.
/// It is generic over the repository type and the configuration type.
pub trait RepositoryFactory<R, C> {
    /// Create a new repository instance from `config`.
    fn create_repository(&self, config: C) -> R;
}
