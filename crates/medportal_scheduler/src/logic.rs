// --- File: crates/medportal_scheduler/src/logic.rs ---
use crate::error::SchedulerError;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use medportal_common::models::{Appointment, AppointmentFields, AppointmentStatus};
use medportal_config::SchedulingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const SLOT_FORMAT: &str = "%H:%M";
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

// --- Data Structures ---

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct DateQuery {
    /// Calendar date in YYYY-MM-DD format
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2025-01-10"))]
    pub date: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AvailableSlotsResponse {
    pub doctor_id: i64,
    #[cfg_attr(feature = "openapi", schema(example = "2025-01-10"))]
    pub date: String,
    /// Free slot start times, ascending, `HH:MM`
    #[cfg_attr(feature = "openapi", schema(example = json!(["09:00", "09:30"])))]
    pub slots: Vec<String>,
}

/// Body of a booking or an administrative edit.
///
/// Every field is optional on the wire so a missing field is reported as a
/// validation error naming it.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AppointmentRequest {
    /// Required for administrators; patients may omit it
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    #[cfg_attr(feature = "openapi", schema(example = "2025-01-10"))]
    #[serde(default)]
    pub appointment_date: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "09:30"))]
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub clinic_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BookingResponse {
    pub success: bool,
    pub appointment_id: Option<i64>,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CancellationResponse {
    pub success: bool,
    pub message: String,
}

/// An appointment together with its status at the time of the request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub status: AppointmentStatus,
}

impl AppointmentView {
    pub fn at(appointment: Appointment, now: NaiveDateTime) -> Self {
        let status = appointment.status(now);
        Self {
            appointment,
            status,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentView>,
}

// --- Slot Policy ---

/// Daily working window and slot grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPolicy {
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub step: Duration,
    pub working_days: Vec<Weekday>,
}

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl Default for SlotPolicy {
    /// 09:00 to 17:00 every day in 30 minute steps.
    fn default() -> Self {
        Self {
            work_start: NaiveTime::MIN + Duration::hours(9),
            work_end: NaiveTime::MIN + Duration::hours(17),
            step: Duration::minutes(30),
            working_days: ALL_DAYS.to_vec(),
        }
    }
}

impl SlotPolicy {
    pub fn new(
        work_start: NaiveTime,
        work_end: NaiveTime,
        step_minutes: i64,
        working_days: Vec<Weekday>,
    ) -> Result<Self, SchedulerError> {
        if !(1..=24 * 60).contains(&step_minutes) {
            return Err(SchedulerError::Config(format!(
                "slot_minutes must be between 1 and 1440, got {step_minutes}"
            )));
        }
        if work_end <= work_start {
            return Err(SchedulerError::Config(format!(
                "work_end {work_end} must be after work_start {work_start}"
            )));
        }
        if working_days.is_empty() {
            return Err(SchedulerError::Config(
                "at least one working day is required".to_string(),
            ));
        }
        Ok(Self {
            work_start,
            work_end,
            step: Duration::minutes(step_minutes),
            working_days,
        })
    }

    /// Builds the policy from the `[scheduling]` section.
    pub fn from_config(config: &SchedulingConfig) -> Result<Self, SchedulerError> {
        let work_start = parse_time(&config.work_start)
            .map_err(|_| SchedulerError::Config(format!("invalid work_start '{}'", config.work_start)))?;
        let work_end = parse_time(&config.work_end)
            .map_err(|_| SchedulerError::Config(format!("invalid work_end '{}'", config.work_end)))?;
        let working_days = config
            .working_days
            .iter()
            .map(|day| {
                day.trim()
                    .parse::<Weekday>()
                    .map_err(|_| SchedulerError::Config(format!("invalid working day '{day}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(work_start, work_end, config.slot_minutes, working_days)
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.working_days.contains(&date.weekday())
    }

    /// Every slot start of `date`, ascending. Empty on non-working days.
    ///
    /// A slot is included only if it ends by `work_end`.
    pub fn candidate_slots(&self, date: NaiveDate) -> Vec<NaiveDateTime> {
        if !self.is_working_day(date) {
            return Vec::new();
        }
        let end = date.and_time(self.work_end);
        let mut slot = date.and_time(self.work_start);
        let mut slots = Vec::new();
        while slot + self.step <= end {
            slots.push(slot);
            slot += self.step;
        }
        slots
    }

    /// True when `ts` is one of the candidate slots of its day.
    pub fn is_slot(&self, ts: NaiveDateTime) -> bool {
        if !self.is_working_day(ts.date()) {
            return false;
        }
        let time = ts.time();
        if time < self.work_start || time + self.step > self.work_end || time + self.step < time {
            return false;
        }
        (time - self.work_start).num_seconds() % self.step.num_seconds() == 0
    }
}

// --- Availability Logic ---

/// Candidates that are neither booked nor earlier than `now`.
///
/// Occupancy is an exact timestamp match; appointments carry no duration.
pub fn available_slots(
    candidates: &[NaiveDateTime],
    booked: &[NaiveDateTime],
    now: NaiveDateTime,
) -> Vec<NaiveDateTime> {
    let booked: HashSet<&NaiveDateTime> = booked.iter().collect();
    let slots: Vec<NaiveDateTime> = candidates
        .iter()
        .filter(|slot| **slot >= now && !booked.contains(slot))
        .copied()
        .collect();
    debug!(
        "{} of {} candidate slots available ({} booked)",
        slots.len(),
        candidates.len(),
        booked.len()
    );
    slots
}

/// `[00:00, next 00:00)` of `date`.
pub fn day_range(date: NaiveDate) -> Result<(NaiveDateTime, NaiveDateTime), SchedulerError> {
    let next = date
        .succ_opt()
        .ok_or_else(|| SchedulerError::validation(format!("Date {date} is out of range.")))?;
    Ok((date.and_time(NaiveTime::MIN), next.and_time(NaiveTime::MIN)))
}

// --- Parsing and Validation ---

/// Parses `YYYY-MM-DD`.
///
/// The date and the day after it must have four-digit years, so the day's
/// range bounds keep sorting as stored text.
pub fn parse_date(raw: &str) -> Result<NaiveDate, SchedulerError> {
    let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        SchedulerError::validation(format!("Invalid date '{raw}', expected YYYY-MM-DD."))
    })?;
    let next_in_range = date
        .succ_opt()
        .is_some_and(|next| next.year() <= MAX_YEAR);
    if date.year() < MIN_YEAR || !next_in_range {
        return Err(SchedulerError::validation(format!(
            "Date '{raw}' is out of range, years {MIN_YEAR} to {MAX_YEAR} are supported."
        )));
    }
    Ok(date)
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, SchedulerError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| SchedulerError::validation(format!("Invalid time '{raw}', expected HH:MM.")))
}

fn required_text(value: &Option<String>, field: &str) -> Result<String, SchedulerError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(SchedulerError::validation(format!(
            "Missing required field: {field}."
        ))),
    }
}

/// Checks presence and format of every field and builds the storable fields.
///
/// Existence of the doctor and patient is checked by the caller.
pub fn validate_request(
    request: &AppointmentRequest,
    patient_id: i64,
) -> Result<AppointmentFields, SchedulerError> {
    let doctor_id = request
        .doctor_id
        .ok_or_else(|| SchedulerError::validation("Missing required field: doctor_id."))?;
    let date = parse_date(&required_text(&request.appointment_date, "appointment_date")?)?;
    let time = parse_time(&required_text(&request.appointment_time, "appointment_time")?)?;

    Ok(AppointmentFields {
        doctor_id,
        patient_id,
        appointment_time: date.and_time(time),
        clinic_name: required_text(&request.clinic_name, "clinic_name")?,
        city: required_text(&request.city, "city")?,
        state: required_text(&request.state, "state")?,
    })
}

pub fn format_slot(slot: NaiveDateTime) -> String {
    slot.format(SLOT_FORMAT).to_string()
}
