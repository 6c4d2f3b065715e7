// --- File: crates/medportal_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // HTTP error rendering
pub mod logging; // Logging utilities
pub mod models; // Domain models shared by storage and scheduling
pub mod services; // Collaborator abstractions

// Re-export error types and utilities for easier access
pub use error::{internal_error, HttpStatusCode, PortalError};

// Re-export logging utilities for easier access
pub use logging::{init, init_from_config, init_with_level, log_result};

pub use models::{Appointment, AppointmentStatus, Doctor, Identity, Patient, Role};
pub use services::{Clock, FixedClock, NotificationRelay, SystemClock};

// This crate provides functionality shared by every MedPortal crate:
// the domain model, the error taxonomy, logging setup and collaborator traits.
