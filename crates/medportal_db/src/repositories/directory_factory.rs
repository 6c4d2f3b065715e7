//! Factory for creating directory repositories

use crate::repositories::directory_sql::SqlDirectoryRepository;
use crate::{DbClient, RepositoryFactory};

#[derive(Debug, Clone, Default)]
pub struct DirectoryRepositoryFactory;

impl DirectoryRepositoryFactory {
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryFactory<SqlDirectoryRepository, DbClient> for DirectoryRepositoryFactory {
    fn create_repository(&self, db_client: DbClient) -> SqlDirectoryRepository {
        SqlDirectoryRepository::new(db_client)
    }
}
