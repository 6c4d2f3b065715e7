// --- File: crates/medportal_common/src/models.rs ---
//! Domain models shared by the storage and scheduling crates.
//!
//! Timestamps are naive clinic-local wall-clock values.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A doctor offering appointments at one clinic location.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub doctor_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub city: String,
    pub state: String,
    pub phone_number: String,
    pub email: String,
    pub is_accepting_new_patients: bool,
}

/// Fields required to register a doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDoctor {
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub city: String,
    pub state: String,
    pub phone_number: String,
    pub email: String,
    pub is_accepting_new_patients: bool,
}

/// A patient and the demographics the portal keeps about them.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Date of birth, `YYYY-MM-DD`.
    pub dob: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// Fields required to register a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// A booked appointment.
///
/// At most one appointment exists per `(doctor_id, appointment_time)`.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2025-01-10T09:00:00"))]
    pub appointment_time: NaiveDateTime,
    pub clinic_name: String,
    pub city: String,
    pub state: String,
}

/// Everything an appointment holds except its id.
///
/// Used for inserts and for the administrative full-field replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentFields {
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_time: NaiveDateTime,
    pub clinic_name: String,
    pub city: String,
    pub state: String,
}

impl Appointment {
    pub fn from_fields(appointment_id: i64, fields: AppointmentFields) -> Self {
        Self {
            appointment_id,
            doctor_id: fields.doctor_id,
            patient_id: fields.patient_id,
            appointment_time: fields.appointment_time,
            clinic_name: fields.clinic_name,
            city: fields.city,
            state: fields.state,
        }
    }

    /// Status derived from the wall clock, see [`AppointmentStatus::at`].
    pub fn status(&self, now: NaiveDateTime) -> AppointmentStatus {
        AppointmentStatus::at(self.appointment_time, now)
    }
}

/// Lifecycle state of an appointment.
///
/// Nothing is stored: `Scheduled` and `Completed` are computed by comparing the
/// appointment time with now, and a cancelled appointment no longer exists.
/// `Cancelled` therefore only shows up in notifications.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn at(appointment_time: NaiveDateTime, now: NaiveDateTime) -> Self {
        if appointment_time < now {
            AppointmentStatus::Completed
        } else {
            AppointmentStatus::Scheduled
        }
    }
}

/// Portal role of an authenticated caller.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The authenticated caller, one variant per login kind.
///
/// Each variant carries the id of the record the login belongs to.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Identity {
    Patient { patient_id: i64 },
    Doctor { doctor_id: i64 },
    Admin { admin_id: i64 },
}

impl Identity {
    pub fn new(role: Role, id: i64) -> Self {
        match role {
            Role::Patient => Identity::Patient { patient_id: id },
            Role::Doctor => Identity::Doctor { doctor_id: id },
            Role::Admin => Identity::Admin { admin_id: id },
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Identity::Patient { .. } => Role::Patient,
            Identity::Doctor { .. } => Role::Doctor,
            Identity::Admin { .. } => Role::Admin,
        }
    }

    pub fn actor_id(&self) -> i64 {
        match *self {
            Identity::Patient { patient_id } => patient_id,
            Identity::Doctor { doctor_id } => doctor_id,
            Identity::Admin { admin_id } => admin_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Identity::Admin { .. })
    }

    /// True when this caller is the patient `patient_id`.
    pub fn is_patient(&self, patient_id: i64) -> bool {
        matches!(*self, Identity::Patient { patient_id: own } if own == patient_id)
    }

    /// True when this caller is the doctor `doctor_id`.
    pub fn is_doctor(&self, doctor_id: i64) -> bool {
        matches!(*self, Identity::Doctor { doctor_id: own } if own == doctor_id)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role(), self.actor_id())
    }
}
