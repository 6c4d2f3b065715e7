//! Factory for creating appointment repositories

use crate::repositories::appointment_sql::SqlAppointmentRepository;
use crate::{DbClient, RepositoryFactory};

#[derive(Debug, Clone, Default)]
pub struct AppointmentRepositoryFactory;

impl AppointmentRepositoryFactory {
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryFactory<SqlAppointmentRepository, DbClient> for AppointmentRepositoryFactory {
    fn create_repository(&self, db_client: DbClient) -> SqlAppointmentRepository {
        SqlAppointmentRepository::new(db_client)
    }
}
