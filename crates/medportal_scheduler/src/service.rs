// --- File: crates/medportal_scheduler/src/service.rs ---
//! Appointment scheduling operations.
//!
//! Every mutating operation takes the caller's [`Identity`] explicitly and
//! authorizes it before touching storage. "Now" always comes from the injected
//! [`Clock`].

use crate::error::SchedulerError;
use crate::logic::{
    available_slots, day_range, validate_request, AppointmentRequest, AppointmentView, SlotPolicy,
};
use chrono::{NaiveDate, NaiveDateTime};
use medportal_common::models::{Appointment, Doctor, Identity, Patient};
use medportal_common::services::{
    doctor_room, patient_room, AppointmentEvent, AppointmentEventKind, Clock, NotificationRelay,
};
use medportal_db::{AppointmentRepository, DirectoryRepository};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SLOT_UNAVAILABLE_MESSAGE: &str =
    "The selected time slot is no longer available. Please choose another.";
pub const PAST_BOOKING_MESSAGE: &str = "Cannot book past appointments.";
pub const PAST_CANCEL_MESSAGE: &str = "Cannot cancel past appointments.";

/// Result of a write that claims a doctor's slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    /// The appointment as stored
    Booked(Appointment),
    /// Another appointment holds the slot; nothing was written
    SlotUnavailable,
}

pub struct SchedulerService<A, D> {
    appointments: A,
    directory: D,
    policy: SlotPolicy,
    clock: Arc<dyn Clock>,
    relay: Arc<dyn NotificationRelay>,
}

impl<A, D> SchedulerService<A, D>
where
    A: AppointmentRepository,
    D: DirectoryRepository,
{
    pub fn new(
        appointments: A,
        directory: D,
        policy: SlotPolicy,
        clock: Arc<dyn Clock>,
        relay: Arc<dyn NotificationRelay>,
    ) -> Self {
        Self {
            appointments,
            directory,
            policy,
            clock,
            relay,
        }
    }

    /// Create the directory tables, then the appointment table that references them.
    pub async fn init_storage(&self) -> Result<(), SchedulerError> {
        self.directory.init_schema().await?;
        self.appointments.init_schema().await?;
        Ok(())
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn policy(&self) -> &SlotPolicy {
        &self.policy
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    async fn require_doctor(&self, doctor_id: i64) -> Result<Doctor, SchedulerError> {
        self.directory
            .find_doctor(doctor_id)
            .await?
            .ok_or_else(|| SchedulerError::not_found(format!("Doctor {doctor_id} not found.")))
    }

    async fn require_patient(&self, patient_id: i64) -> Result<Patient, SchedulerError> {
        self.directory
            .find_patient(patient_id)
            .await?
            .ok_or_else(|| SchedulerError::not_found(format!("Patient {patient_id} not found.")))
    }

    async fn require_appointment(&self, appointment_id: i64) -> Result<Appointment, SchedulerError> {
        self.appointments
            .find_by_id(appointment_id)
            .await?
            .ok_or_else(|| {
                SchedulerError::not_found(format!("Appointment {appointment_id} not found."))
            })
    }

    fn publish(&self, kind: AppointmentEventKind, appointment: &Appointment) {
        let event = AppointmentEvent::new(kind, appointment, self.now());
        let delivered = self.relay.publish(&doctor_room(appointment.doctor_id), event.clone())
            + self.relay.publish(&patient_room(appointment.patient_id), event);
        debug!(
            "Published {:?} for appointment {} to {} subscriber(s)",
            kind, appointment.appointment_id, delivered
        );
    }

    /// Free slots of a doctor on `date`, ascending.
    ///
    /// Slots already booked or earlier than now are excluded. Non-working
    /// days yield an empty list.
    pub async fn list_available_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<NaiveDateTime>, SchedulerError> {
        self.require_doctor(doctor_id).await?;

        let candidates = self.policy.candidate_slots(date);
        if candidates.is_empty() {
            debug!("{} is not a working day", date);
            return Ok(candidates);
        }

        let (start, end) = day_range(date)?;
        let booked: Vec<NaiveDateTime> = self
            .appointments
            .find_by_doctor_between(doctor_id, start, end)
            .await?
            .into_iter()
            .map(|appointment| appointment.appointment_time)
            .collect();

        Ok(available_slots(&candidates, &booked, self.now()))
    }

    /// Book a slot for a patient.
    ///
    /// Patients book for themselves; admins name the patient. A slot taken
    /// concurrently is reported as [`BookingOutcome::SlotUnavailable`].
    pub async fn book_appointment(
        &self,
        caller: &Identity,
        request: AppointmentRequest,
    ) -> Result<BookingOutcome, SchedulerError> {
        let patient_id = match *caller {
            Identity::Patient { patient_id } => match request.patient_id {
                Some(requested) if requested != patient_id => {
                    warn!("{} tried to book for patient {}", caller, requested);
                    return Err(SchedulerError::forbidden(
                        "Patients can only book appointments for themselves.",
                    ));
                }
                _ => patient_id,
            },
            Identity::Admin { .. } => request
                .patient_id
                .ok_or_else(|| SchedulerError::validation("Missing required field: patient_id."))?,
            Identity::Doctor { .. } => {
                return Err(SchedulerError::forbidden("Doctors cannot book appointments."));
            }
        };

        let fields = validate_request(&request, patient_id)?;
        let doctor = self.require_doctor(fields.doctor_id).await?;
        self.require_patient(patient_id).await?;

        if fields.appointment_time < self.now() {
            return Err(SchedulerError::Temporal(PAST_BOOKING_MESSAGE.to_string()));
        }
        if !self.policy.is_slot(fields.appointment_time) {
            return Err(SchedulerError::validation(format!(
                "{} is not a bookable slot.",
                fields.appointment_time
            )));
        }
        // Administrators may enrol a patient with a closed panel
        if !doctor.is_accepting_new_patients
            && !caller.is_admin()
            && !self.directory.is_linked(doctor.doctor_id, patient_id).await?
        {
            return Err(SchedulerError::forbidden(
                "This doctor is not accepting new patients.",
            ));
        }

        if self
            .appointments
            .find_by_doctor_and_time(fields.doctor_id, fields.appointment_time)
            .await?
            .is_some()
        {
            debug!(
                "Slot {} of doctor {} already taken",
                fields.appointment_time, fields.doctor_id
            );
            return Ok(BookingOutcome::SlotUnavailable);
        }

        // The unique constraint decides races the pre-check above cannot see
        match self.appointments.insert(fields).await {
            Ok(appointment) => {
                info!(
                    "{} booked appointment {} with doctor {} at {}",
                    caller,
                    appointment.appointment_id,
                    appointment.doctor_id,
                    appointment.appointment_time
                );
                self.publish(AppointmentEventKind::Booked, &appointment);
                Ok(BookingOutcome::Booked(appointment))
            }
            Err(e) if e.is_conflict() => {
                debug!("Lost booking race: {}", e);
                Ok(BookingOutcome::SlotUnavailable)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Cancel one of the caller's own future appointments.
    pub async fn cancel_appointment(
        &self,
        caller: &Identity,
        appointment_id: i64,
    ) -> Result<Appointment, SchedulerError> {
        let Identity::Patient { patient_id } = *caller else {
            return Err(SchedulerError::forbidden(
                "Only the patient who booked an appointment can cancel it.",
            ));
        };

        let appointment = self.require_appointment(appointment_id).await?;
        if appointment.patient_id != patient_id {
            warn!("{} tried to cancel appointment {}", caller, appointment_id);
            return Err(SchedulerError::forbidden(
                "You can only cancel your own appointments.",
            ));
        }

        let now = self.now();
        if appointment.appointment_time <= now {
            return Err(SchedulerError::Temporal(PAST_CANCEL_MESSAGE.to_string()));
        }

        let deleted = self
            .appointments
            .delete_owned_future(appointment_id, patient_id, now)
            .await?;
        if !deleted {
            // Gone or started between the read and the delete
            return match self.appointments.find_by_id(appointment_id).await? {
                Some(_) => Err(SchedulerError::Temporal(PAST_CANCEL_MESSAGE.to_string())),
                None => Err(SchedulerError::not_found(format!(
                    "Appointment {appointment_id} not found."
                ))),
            };
        }

        info!("{} cancelled appointment {}", caller, appointment_id);
        self.publish(AppointmentEventKind::Cancelled, &appointment);
        Ok(appointment)
    }

    /// Administrative full-field overwrite. Past appointments may be edited.
    pub async fn edit_appointment(
        &self,
        caller: &Identity,
        appointment_id: i64,
        request: AppointmentRequest,
    ) -> Result<BookingOutcome, SchedulerError> {
        require_admin(caller)?;

        let patient_id = request
            .patient_id
            .ok_or_else(|| SchedulerError::validation("Missing required field: patient_id."))?;
        let fields = validate_request(&request, patient_id)?;
        self.require_doctor(fields.doctor_id).await?;
        self.require_patient(patient_id).await?;

        if !self.policy.is_slot(fields.appointment_time) {
            return Err(SchedulerError::validation(format!(
                "{} is not a bookable slot.",
                fields.appointment_time
            )));
        }

        match self.appointments.replace(appointment_id, fields).await {
            Ok(Some(appointment)) => {
                info!("{} edited appointment {}", caller, appointment_id);
                self.publish(AppointmentEventKind::Updated, &appointment);
                Ok(BookingOutcome::Booked(appointment))
            }
            Ok(None) => Err(SchedulerError::not_found(format!(
                "Appointment {appointment_id} not found."
            ))),
            Err(e) if e.is_conflict() => Ok(BookingOutcome::SlotUnavailable),
            Err(e) => Err(e.into()),
        }
    }

    /// Administrative unconditional delete.
    pub async fn delete_appointment(
        &self,
        caller: &Identity,
        appointment_id: i64,
    ) -> Result<Appointment, SchedulerError> {
        require_admin(caller)?;

        let appointment = self.require_appointment(appointment_id).await?;
        if !self.appointments.delete(appointment_id).await? {
            return Err(SchedulerError::not_found(format!(
                "Appointment {appointment_id} not found."
            )));
        }

        info!("{} deleted appointment {}", caller, appointment_id);
        self.publish(AppointmentEventKind::Deleted, &appointment);
        Ok(appointment)
    }

    /// A patient's appointments with their current status, ascending.
    pub async fn list_patient_appointments(
        &self,
        caller: &Identity,
        patient_id: i64,
    ) -> Result<Vec<AppointmentView>, SchedulerError> {
        if !caller.is_admin() && !caller.is_patient(patient_id) {
            return Err(SchedulerError::forbidden(
                "You can only view your own appointments.",
            ));
        }
        self.require_patient(patient_id).await?;

        let now = self.now();
        Ok(self
            .appointments
            .find_by_patient(patient_id)
            .await?
            .into_iter()
            .map(|appointment| AppointmentView::at(appointment, now))
            .collect())
    }

    /// A doctor's appointments on `date` with their current status.
    pub async fn list_doctor_schedule(
        &self,
        caller: &Identity,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<AppointmentView>, SchedulerError> {
        if !caller.is_admin() && !caller.is_doctor(doctor_id) {
            return Err(SchedulerError::forbidden(
                "You can only view your own schedule.",
            ));
        }
        self.require_doctor(doctor_id).await?;

        let (start, end) = day_range(date)?;
        let now = self.now();
        Ok(self
            .appointments
            .find_by_doctor_between(doctor_id, start, end)
            .await?
            .into_iter()
            .map(|appointment| AppointmentView::at(appointment, now))
            .collect())
    }
}

fn require_admin(caller: &Identity) -> Result<(), SchedulerError> {
    if caller.is_admin() {
        Ok(())
    } else {
        warn!("{} attempted an administrative action", caller);
        Err(SchedulerError::forbidden("Administrator access required."))
    }
}
