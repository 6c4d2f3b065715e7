// --- File: crates/medportal_scheduler/src/handlers.rs ---
use crate::auth::{AuthState, CallerIdentity};
use crate::error::SchedulerError;
use crate::extract::{ValidJson, ValidPath, ValidQuery};
use crate::logic::{
    format_slot, parse_date, AppointmentRequest, AppointmentsResponse, AvailableSlotsResponse,
    BookingResponse, CancellationResponse, DateQuery, SlotPolicy,
};
use crate::notify::{can_join_room, BroadcastRelay};
use crate::service::{BookingOutcome, SchedulerService, SLOT_UNAVAILABLE_MESSAGE};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use medportal_common::models::Identity;
use medportal_common::services::{AppointmentEvent, SystemClock};
use medportal_config::AppConfig;
use medportal_db::{
    AppointmentRepositoryFactory, DbClient, DirectoryRepositoryFactory, RepositoryFactory,
    SqlAppointmentRepository, SqlDirectoryRepository,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

pub type PortalScheduler = SchedulerService<SqlAppointmentRepository, SqlDirectoryRepository>;

// Shared state needed by the scheduler handlers
#[derive(Clone)]
pub struct SchedulerState {
    pub scheduler: Arc<PortalScheduler>,
    pub auth: Arc<AuthState>,
    /// The relay the scheduler publishes to, for room subscriptions
    pub relay: Arc<BroadcastRelay>,
}

impl SchedulerState {
    pub fn new(scheduler: PortalScheduler, auth: AuthState, relay: Arc<BroadcastRelay>) -> Self {
        Self {
            scheduler: Arc::new(scheduler),
            auth: Arc::new(auth),
            relay,
        }
    }

    /// Wire the SQL repositories, the configured slot policy and the clinic clock.
    pub fn from_config(
        config: &AppConfig,
        db_client: DbClient,
        relay: Arc<BroadcastRelay>,
    ) -> Result<Self, SchedulerError> {
        let policy = SlotPolicy::from_config(&config.scheduling)?;
        let clock = SystemClock::from_name(&config.scheduling.time_zone)
            .map_err(SchedulerError::Config)?;
        let appointments = AppointmentRepositoryFactory::new().create_repository(db_client.clone());
        let directory = DirectoryRepositoryFactory::new().create_repository(db_client);

        let auth = AuthState {
            shared_secret: config.auth.as_ref().and_then(|a| a.shared_secret.clone()),
            trust_identity_headers: config
                .auth
                .as_ref()
                .is_some_and(|a| a.trust_identity_headers),
        };
        if auth.shared_secret.is_none() {
            if !auth.trust_identity_headers {
                return Err(SchedulerError::Config(
                    "auth.shared_secret is not set (AUTH_SHARED_SECRET); set it or enable \
                     auth.trust_identity_headers"
                        .to_string(),
                ));
            }
            warn!("No internal auth secret configured, identity headers are trusted as-is");
        }

        Ok(Self::new(
            SchedulerService::new(
                appointments,
                directory,
                policy,
                Arc::new(clock),
                relay.clone(),
            ),
            auth,
            relay,
        ))
    }
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct PatientQuery {
    /// Patient to list; patients may omit it, administrators must set it
    pub patient_id: Option<i64>,
}

fn booking_response(outcome: BookingOutcome, message: &str) -> (StatusCode, Json<BookingResponse>) {
    match outcome {
        BookingOutcome::Booked(appointment) => (
            StatusCode::OK,
            Json(BookingResponse {
                success: true,
                appointment_id: Some(appointment.appointment_id),
                message: message.to_string(),
            }),
        ),
        BookingOutcome::SlotUnavailable => (
            StatusCode::CONFLICT,
            Json(BookingResponse {
                success: false,
                appointment_id: None,
                message: SLOT_UNAVAILABLE_MESSAGE.to_string(),
            }),
        ),
    }
}

/// Handler to get the free slots of a doctor on one day.
pub async fn get_available_slots_handler(
    State(state): State<SchedulerState>,
    ValidPath(doctor_id): ValidPath<i64>,
    ValidQuery(query): ValidQuery<DateQuery>,
) -> Result<Json<AvailableSlotsResponse>, SchedulerError> {
    let date = parse_date(&query.date)?;
    let slots = state
        .scheduler
        .list_available_slots(doctor_id, date)
        .await?;

    Ok(Json(AvailableSlotsResponse {
        doctor_id,
        date: query.date.trim().to_string(),
        slots: slots.into_iter().map(format_slot).collect(),
    }))
}

/// Handler to book an appointment.
pub async fn book_appointment_handler(
    State(state): State<SchedulerState>,
    CallerIdentity(caller): CallerIdentity,
    ValidJson(request): ValidJson<AppointmentRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), SchedulerError> {
    let outcome = state.scheduler.book_appointment(&caller, request).await?;
    Ok(booking_response(outcome, "Appointment booked successfully."))
}

/// Handler to list a patient's appointments.
pub async fn list_appointments_handler(
    State(state): State<SchedulerState>,
    CallerIdentity(caller): CallerIdentity,
    ValidQuery(query): ValidQuery<PatientQuery>,
) -> Result<Json<AppointmentsResponse>, SchedulerError> {
    let patient_id = match (caller, query.patient_id) {
        (_, Some(patient_id)) => patient_id,
        (Identity::Patient { patient_id }, None) => patient_id,
        _ => {
            return Err(SchedulerError::validation(
                "Missing required query parameter: patient_id.",
            ))
        }
    };

    let appointments = state
        .scheduler
        .list_patient_appointments(&caller, patient_id)
        .await?;
    Ok(Json(AppointmentsResponse { appointments }))
}

/// Handler for a patient cancelling their own appointment.
pub async fn cancel_appointment_handler(
    State(state): State<SchedulerState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(appointment_id): ValidPath<i64>,
) -> Result<Json<CancellationResponse>, SchedulerError> {
    state
        .scheduler
        .cancel_appointment(&caller, appointment_id)
        .await?;
    Ok(Json(CancellationResponse {
        success: true,
        message: "Appointment cancelled successfully.".to_string(),
    }))
}

/// Handler to get a doctor's appointments on one day.
pub async fn get_doctor_schedule_handler(
    State(state): State<SchedulerState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(doctor_id): ValidPath<i64>,
    ValidQuery(query): ValidQuery<DateQuery>,
) -> Result<Json<AppointmentsResponse>, SchedulerError> {
    let date = parse_date(&query.date)?;
    let appointments = state
        .scheduler
        .list_doctor_schedule(&caller, doctor_id, date)
        .await?;
    Ok(Json(AppointmentsResponse { appointments }))
}

/// Admin handler to overwrite an appointment.
pub async fn edit_appointment_handler(
    State(state): State<SchedulerState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(appointment_id): ValidPath<i64>,
    ValidJson(request): ValidJson<AppointmentRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), SchedulerError> {
    let outcome = state
        .scheduler
        .edit_appointment(&caller, appointment_id, request)
        .await?;
    Ok(booking_response(outcome, "Appointment updated successfully."))
}

/// Admin handler to delete an appointment.
pub async fn delete_appointment_handler(
    State(state): State<SchedulerState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(appointment_id): ValidPath<i64>,
) -> Result<Json<CancellationResponse>, SchedulerError> {
    state
        .scheduler
        .delete_appointment(&caller, appointment_id)
        .await?;
    Ok(Json(CancellationResponse {
        success: true,
        message: "Appointment deleted successfully.".to_string(),
    }))
}

/// Handler streaming the events of one notification room as Server-Sent Events.
///
/// Doctors and patients may join their own room; administrators any room.
pub async fn room_events_handler(
    State(state): State<SchedulerState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(room): ValidPath<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, SchedulerError> {
    if !can_join_room(&caller, &room) {
        warn!("{} tried to join room {}", caller, room);
        return Err(SchedulerError::forbidden("You cannot join this room."));
    }

    let receiver = state.relay.subscribe(&room);
    info!("{} joined room {}", caller, room);

    let stream = BroadcastStream::new(receiver).filter_map(move |message| match message {
        Ok(event) => sse_event(&event).map(Ok),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!("Subscriber of {} lagged, {} event(s) dropped", room, skipped);
            None
        }
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn sse_event(event: &AppointmentEvent) -> Option<Event> {
    Event::default()
        .event(event.kind.name())
        .json_data(event)
        .map_err(|e| warn!("Failed to encode event: {}", e))
        .ok()
}
