// --- File: crates/medportal_scheduler/src/routes.rs ---

use crate::auth::shared_secret_middleware;
use crate::handlers::{
    book_appointment_handler, cancel_appointment_handler, delete_appointment_handler,
    edit_appointment_handler, get_available_slots_handler, get_doctor_schedule_handler,
    list_appointments_handler, room_events_handler, SchedulerState,
};
use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};

/// Creates a router containing all scheduler routes, to be nested under `/api`.
///
/// Every route passes the shared-secret check when a secret is configured.
pub fn routes(state: SchedulerState) -> Router {
    let auth_state = state.auth.clone();

    Router::new()
        .route(
            "/doctors/{doctor_id}/slots",
            get(get_available_slots_handler),
        )
        .route(
            "/doctors/{doctor_id}/appointments",
            get(get_doctor_schedule_handler),
        )
        .route(
            "/appointments",
            get(list_appointments_handler).post(book_appointment_handler),
        )
        .route(
            "/appointments/{appointment_id}",
            delete(cancel_appointment_handler),
        )
        .route("/rooms/{room}/events", get(room_events_handler))
        .route(
            "/admin/appointments/{appointment_id}",
            put(edit_appointment_handler).delete(delete_appointment_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            shared_secret_middleware,
        ))
        .with_state(state)
}
