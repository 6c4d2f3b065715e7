// --- File: crates/medportal_scheduler/src/lib.rs ---
// Declare modules within this crate
pub mod auth;
pub mod doc;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod notify;
pub mod routes;
pub mod service;
#[cfg(test)]
mod service_test;

pub use error::SchedulerError;
pub use handlers::SchedulerState;
pub use notify::BroadcastRelay;
pub use service::{BookingOutcome, SchedulerService};
