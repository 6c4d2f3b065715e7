//! Storage for the MedPortal scheduler
//!
//! A database client built on SQLx's `Any` driver plus the repositories the
//! scheduler needs: appointments and the doctor/patient directory. SQLite is
//! the default backend; PostgreSQL and MySQL are available through feature
//! flags.
//!
//! # Example
//!
//! ```rust,no_run
//! use medportal_config::AppConfig;
//! use medportal_db::{AppointmentRepository, DbClient, SqlAppointmentRepository};
//!
//! async fn setup_db() -> Result<SqlAppointmentRepository, Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let db_client = DbClient::new(&config).await?;
//!     let repo = SqlAppointmentRepository::new(db_client);
//!     repo.init_schema().await?;
//!     Ok(repo)
//! }
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod factory;
pub mod repositories;
pub mod repository;

pub use client::{DbClient, DbTransaction};
pub use error::DbError;
pub use factory::DbClientFactory;
pub use repository::RepositoryFactory;

pub use repositories::{
    AppointmentRepository, AppointmentRepositoryFactory, DirectoryRepository,
    DirectoryRepositoryFactory, SqlAppointmentRepository, SqlDirectoryRepository,
};
