//! Repository traits and their SQL implementations.

pub mod appointment;
pub mod appointment_factory;
pub mod appointment_sql;
pub mod directory;
pub mod directory_factory;
pub mod directory_sql;

pub use appointment::AppointmentRepository;
pub use appointment_factory::AppointmentRepositoryFactory;
pub use appointment_sql::SqlAppointmentRepository;
pub use directory::DirectoryRepository;
pub use directory_factory::DirectoryRepositoryFactory;
pub use directory_sql::SqlDirectoryRepository;
