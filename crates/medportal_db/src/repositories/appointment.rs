//! Repository for appointments
//!
//! Storage guarantees at most one appointment per `(doctor_id, appointment_time)`;
//! writes that would break this fail with [`DbError::Conflict`].

use crate::error::DbError;
use chrono::NaiveDateTime;
use medportal_common::models::{Appointment, AppointmentFields};
use std::future::Future;

pub trait AppointmentRepository: Send + Sync {
    /// Create the `appointments` table if it doesn't exist.
    ///
    /// The directory schema (`doctor_patients` in particular) must already be
    /// initialized.
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Persist a new appointment and link the patient to the doctor.
    ///
    /// Both writes happen in one transaction. A taken slot yields
    /// [`DbError::Conflict`] and nothing is written.
    fn insert(
        &self,
        fields: AppointmentFields,
    ) -> impl Future<Output = Result<Appointment, DbError>> + Send;

    fn find_by_id(
        &self,
        appointment_id: i64,
    ) -> impl Future<Output = Result<Option<Appointment>, DbError>> + Send;

    /// The appointment occupying a doctor's slot, if any.
    fn find_by_doctor_and_time(
        &self,
        doctor_id: i64,
        appointment_time: NaiveDateTime,
    ) -> impl Future<Output = Result<Option<Appointment>, DbError>> + Send;

    /// A doctor's appointments in `[start, end)`, ascending by time.
    fn find_by_doctor_between(
        &self,
        doctor_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> impl Future<Output = Result<Vec<Appointment>, DbError>> + Send;

    /// All appointments of a patient, ascending by time.
    fn find_by_patient(
        &self,
        patient_id: i64,
    ) -> impl Future<Output = Result<Vec<Appointment>, DbError>> + Send;

    /// Overwrite every field of an appointment.
    ///
    /// Returns `None` when the id does not exist and [`DbError::Conflict`] when
    /// the new slot is taken by another appointment.
    fn replace(
        &self,
        appointment_id: i64,
        fields: AppointmentFields,
    ) -> impl Future<Output = Result<Option<Appointment>, DbError>> + Send;

    /// Unconditional delete. Returns whether a row was removed.
    fn delete(&self, appointment_id: i64) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Delete only if the appointment belongs to `patient_id` and is still after `now`.
    ///
    /// The condition is evaluated by the delete statement itself.
    fn delete_owned_future(
        &self,
        appointment_id: i64,
        patient_id: i64,
        now: NaiveDateTime,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;
}
