// File: crates/medportal_scheduler/src/doc.rs

#![allow(dead_code)]
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::logic::{
    AppointmentRequest, AppointmentView, AppointmentsResponse, AvailableSlotsResponse,
    BookingResponse, CancellationResponse, DateQuery,
};
use medportal_common::models::{Appointment, AppointmentStatus};
use medportal_common::services::{AppointmentEvent, AppointmentEventKind};

#[utoipa::path(
    get,
    path = "/doctors/{doctor_id}/slots",
    params(
        ("doctor_id" = i64, Path, description = "Doctor to list free slots for"),
        ("date" = String, Query, description = "Day in YYYY-MM-DD format", example = "2025-01-10", format = "date")
    ),
    responses(
        (status = 200, description = "Free slots, ascending", body = AvailableSlotsResponse,
         example = json!({
             "doctor_id": 1,
             "date": "2025-01-10",
             "slots": ["09:00", "09:30", "10:00"]
         })
        ),
        (status = 400, description = "Malformed date"),
        (status = 404, description = "Doctor not found")
    ),
    tag = "scheduler"
)]
fn doc_get_available_slots_handler() {}

#[utoipa::path(
    post,
    path = "/appointments",
    request_body(content = AppointmentRequest, example = json!({
        "doctor_id": 1,
        "appointment_date": "2025-01-10",
        "appointment_time": "09:00",
        "clinic_name": "North Clinic",
        "city": "Springfield",
        "state": "IL"
    })),
    params(
        ("X-Portal-Role" = String, Header, description = "patient or admin"),
        ("X-Portal-User-Id" = i64, Header, description = "Id of the caller's record")
    ),
    responses(
        (status = 200, description = "Appointment booked", body = BookingResponse,
         example = json!({
             "success": true,
             "appointment_id": 17,
             "message": "Appointment booked successfully."
         })
        ),
        (status = 409, description = "Slot already booked", body = BookingResponse,
         example = json!({
             "success": false,
             "appointment_id": null,
             "message": "The selected time slot is no longer available. Please choose another."
         })
        ),
        (status = 400, description = "Missing or malformed field"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller may not book for this patient"),
        (status = 404, description = "Doctor or patient not found"),
        (status = 422, description = "Appointment time is in the past")
    ),
    tag = "scheduler"
)]
fn doc_book_appointment_handler() {}

#[utoipa::path(
    get,
    path = "/appointments",
    params(
        ("patient_id" = Option<i64>, Query, description = "Required for administrators")
    ),
    responses(
        (status = 200, description = "The patient's appointments with status", body = AppointmentsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the caller's appointments")
    ),
    tag = "scheduler"
)]
fn doc_list_appointments_handler() {}

#[utoipa::path(
    delete,
    path = "/appointments/{appointment_id}",
    params(
        ("appointment_id" = i64, Path, description = "The appointment to cancel")
    ),
    responses(
        (status = 200, description = "Cancellation result", body = CancellationResponse,
         example = json!({
             "success": true,
             "message": "Appointment cancelled successfully."
         })
        ),
        (status = 403, description = "Not the caller's appointment"),
        (status = 404, description = "Appointment not found"),
        (status = 422, description = "Appointment already started",
         example = json!({
             "success": false,
             "message": "Cannot cancel past appointments.",
             "code": 422
         })
        )
    ),
    tag = "scheduler"
)]
fn doc_cancel_appointment_handler() {}

#[utoipa::path(
    get,
    path = "/doctors/{doctor_id}/appointments",
    params(
        ("doctor_id" = i64, Path, description = "Doctor whose schedule to show"),
        ("date" = String, Query, description = "Day in YYYY-MM-DD format", format = "date")
    ),
    responses(
        (status = 200, description = "The day's appointments with status", body = AppointmentsResponse),
        (status = 403, description = "Neither this doctor nor an administrator"),
        (status = 404, description = "Doctor not found")
    ),
    tag = "scheduler"
)]
fn doc_get_doctor_schedule_handler() {}

#[utoipa::path(
    put,
    path = "/admin/appointments/{appointment_id}",
    params(
        ("appointment_id" = i64, Path, description = "The appointment to overwrite")
    ),
    request_body = AppointmentRequest,
    responses(
        (status = 200, description = "Appointment updated", body = BookingResponse),
        (status = 409, description = "New slot already booked", body = BookingResponse),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Appointment, doctor or patient not found")
    ),
    tag = "admin"
)]
fn doc_edit_appointment_handler() {}

#[utoipa::path(
    delete,
    path = "/admin/appointments/{appointment_id}",
    params(
        ("appointment_id" = i64, Path, description = "The appointment to delete")
    ),
    responses(
        (status = 200, description = "Deletion result", body = CancellationResponse),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Appointment not found")
    ),
    tag = "admin"
)]
fn doc_delete_appointment_handler() {}

#[utoipa::path(
    get,
    path = "/rooms/{room}/events",
    params(
        ("room" = String, Path, description = "doctor-{id} or patient-{id}", example = "patient-7")
    ),
    responses(
        (status = 200, description = "Server-Sent Events stream; event type is the change kind", body = AppointmentEvent, content_type = "text/event-stream"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the caller's room")
    ),
    tag = "scheduler"
)]
fn doc_room_events_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_get_available_slots_handler,
        doc_book_appointment_handler,
        doc_list_appointments_handler,
        doc_cancel_appointment_handler,
        doc_get_doctor_schedule_handler,
        doc_edit_appointment_handler,
        doc_delete_appointment_handler,
        doc_room_events_handler
    ),
    components(
        schemas(
            DateQuery,
            AvailableSlotsResponse,
            AppointmentRequest,
            BookingResponse,
            CancellationResponse,
            Appointment,
            AppointmentStatus,
            AppointmentView,
            AppointmentsResponse,
            AppointmentEvent,
            AppointmentEventKind
        )
    ),
    tags(
        (name = "scheduler", description = "Appointment availability and booking"),
        (name = "admin", description = "Administrative appointment management")
    ),
    servers(
        (url = "/api", description = "MedPortal API server")
    )
)]
pub struct SchedulerApiDoc;
