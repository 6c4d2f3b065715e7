//! Repository for doctors, patients and the link between them

use crate::error::DbError;
use medportal_common::models::{Doctor, NewDoctor, NewPatient, Patient};
use std::future::Future;

pub trait DirectoryRepository: Send + Sync {
    /// Create the `doctors`, `patients` and `doctor_patients` tables if missing.
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    fn create_doctor(&self, doctor: NewDoctor)
        -> impl Future<Output = Result<Doctor, DbError>> + Send;

    fn create_patient(
        &self,
        patient: NewPatient,
    ) -> impl Future<Output = Result<Patient, DbError>> + Send;

    fn find_doctor(
        &self,
        doctor_id: i64,
    ) -> impl Future<Output = Result<Option<Doctor>, DbError>> + Send;

    fn find_patient(
        &self,
        patient_id: i64,
    ) -> impl Future<Output = Result<Option<Patient>, DbError>> + Send;

    /// Whether the patient is already in the doctor's panel.
    fn is_linked(
        &self,
        doctor_id: i64,
        patient_id: i64,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;
}
