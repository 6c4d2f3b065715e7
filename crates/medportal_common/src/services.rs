// --- File: crates/medportal_common/src/services.rs ---
//! Service abstractions for collaborators of the scheduler.
//!
//! These traits decouple scheduling logic from the wall clock and from the
//! real-time relay so both can be replaced in tests.

use crate::models::{Appointment, AppointmentStatus};
use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Source of the current clinic-local time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time in the clinic time zone.
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the system time, projected into a time zone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    time_zone: Tz,
}

impl SystemClock {
    pub fn new(time_zone: Tz) -> Self {
        Self { time_zone }
    }

    /// Builds a clock from an IANA zone name such as `Europe/Zurich`.
    pub fn from_name(name: &str) -> Result<Self, String> {
        Tz::from_str(name)
            .map(Self::new)
            .map_err(|e| format!("invalid time zone '{name}': {e}"))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.time_zone).naive_local()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// What happened to an appointment.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentEventKind {
    Booked,
    Cancelled,
    Updated,
    Deleted,
}

impl AppointmentEventKind {
    /// Name used as the event type on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            AppointmentEventKind::Booked => "booked",
            AppointmentEventKind::Cancelled => "cancelled",
            AppointmentEventKind::Updated => "updated",
            AppointmentEventKind::Deleted => "deleted",
        }
    }
}

/// Message published to the relay whenever an appointment changes.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentEvent {
    pub kind: AppointmentEventKind,
    pub appointment_id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub appointment_time: NaiveDateTime,
    pub status: AppointmentStatus,
}

impl AppointmentEvent {
    pub fn new(kind: AppointmentEventKind, appointment: &Appointment, now: NaiveDateTime) -> Self {
        let status = match kind {
            AppointmentEventKind::Cancelled | AppointmentEventKind::Deleted => {
                AppointmentStatus::Cancelled
            }
            AppointmentEventKind::Booked | AppointmentEventKind::Updated => {
                appointment.status(now)
            }
        };
        Self {
            kind,
            appointment_id: appointment.appointment_id,
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
            appointment_time: appointment.appointment_time,
            status,
        }
    }
}

/// Room a doctor's clients subscribe to.
pub fn doctor_room(doctor_id: i64) -> String {
    format!("doctor-{doctor_id}")
}

/// Room a patient's clients subscribe to.
pub fn patient_room(patient_id: i64) -> String {
    format!("patient-{patient_id}")
}

/// A trait for the real-time relay.
///
/// `publish` delivers the event to every current subscriber of `room` and
/// returns how many received it. Publishing never fails the caller's request.
pub trait NotificationRelay: Send + Sync {
    fn publish(&self, room: &str, event: AppointmentEvent) -> usize;
}
