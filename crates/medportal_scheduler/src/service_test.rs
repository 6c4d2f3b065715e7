#[cfg(test)]
mod tests {
    use crate::error::SchedulerError;
    use crate::logic::{AppointmentRequest, SlotPolicy};
    use crate::service::{BookingOutcome, SchedulerService, PAST_CANCEL_MESSAGE};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use medportal_common::models::{AppointmentStatus, Identity, NewDoctor, NewPatient};
    use medportal_common::services::{
        AppointmentEvent, AppointmentEventKind, FixedClock, NotificationRelay,
    };
    use medportal_db::{
        DbClient, DirectoryRepository, SqlAppointmentRepository, SqlDirectoryRepository,
    };
    use mockall::mock;
    use std::sync::Arc;

    mock! {
        pub Relay {}
        impl NotificationRelay for Relay {
            fn publish(&self, room: &str, event: AppointmentEvent) -> usize;
        }
    }

    type Scheduler = SchedulerService<SqlAppointmentRepository, SqlDirectoryRepository>;

    struct Fixture {
        scheduler: Scheduler,
        doctor_id: i64,
        patient_id: i64,
        other_patient_id: i64,
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn quiet_relay() -> MockRelay {
        let mut relay = MockRelay::new();
        relay.expect_publish().returning(|_, _| 0);
        relay
    }

    fn request(doctor_id: i64, time: &str) -> AppointmentRequest {
        AppointmentRequest {
            patient_id: None,
            doctor_id: Some(doctor_id),
            appointment_date: Some("2025-01-10".to_string()),
            appointment_time: Some(time.to_string()),
            clinic_name: Some("North Clinic".to_string()),
            city: Some("Springfield".to_string()),
            state: Some("IL".to_string()),
        }
    }

    fn new_patient(first_name: &str) -> NewPatient {
        NewPatient {
            first_name: first_name.to_string(),
            last_name: "Doe".to_string(),
            dob: "1990-01-01".to_string(),
            email: Some(format!("{}@example.org", first_name.to_lowercase())),
            phone_number: Some("555-0101".to_string()),
        }
    }

    async fn setup_with(now: NaiveDateTime, relay: MockRelay, accepting: bool) -> Fixture {
        let path = std::env::temp_dir().join(format!("medportal-test-{}.db", uuid::Uuid::new_v4()));
        let db = DbClient::from_url(&format!("sqlite:{}", path.display()))
            .await
            .expect("database opens");

        let scheduler = SchedulerService::new(
            SqlAppointmentRepository::new(db.clone()),
            SqlDirectoryRepository::new(db),
            SlotPolicy::default(),
            Arc::new(FixedClock(now)),
            Arc::new(relay),
        );
        scheduler.init_storage().await.expect("schema");

        let directory = scheduler.directory();
        let doctor = directory
            .create_doctor(NewDoctor {
                first_name: "Meredith".to_string(),
                last_name: "Grey".to_string(),
                specialty: "General Surgery".to_string(),
                city: "Seattle".to_string(),
                state: "WA".to_string(),
                phone_number: "555-0110".to_string(),
                email: "grey@example.org".to_string(),
                is_accepting_new_patients: accepting,
            })
            .await
            .unwrap();
        let patient = directory.create_patient(new_patient("Alice")).await.unwrap();
        let other = directory.create_patient(new_patient("Bob")).await.unwrap();

        Fixture {
            scheduler,
            doctor_id: doctor.doctor_id,
            patient_id: patient.patient_id,
            other_patient_id: other.patient_id,
        }
    }

    async fn setup(now: NaiveDateTime) -> Fixture {
        setup_with(now, quiet_relay(), true).await
    }

    fn patient(id: i64) -> Identity {
        Identity::Patient { patient_id: id }
    }

    const ADMIN: Identity = Identity::Admin { admin_id: 1 };

    #[tokio::test]
    async fn test_empty_day_lists_sixteen_slots() {
        let fx = setup(at(0, 0) - Duration::days(1)).await;
        let slots = fx
            .scheduler
            .list_available_slots(fx.doctor_id, day())
            .await
            .unwrap();
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0], at(9, 0));
        assert_eq!(slots[15], at(16, 30));
    }

    #[tokio::test]
    async fn test_unknown_doctor_is_not_found() {
        let fx = setup(at(0, 0)).await;
        let err = fx
            .scheduler
            .list_available_slots(fx.doctor_id + 100, day())
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_booking_removes_slot_and_second_attempt_conflicts() {
        let fx = setup(at(0, 0) - Duration::days(1)).await;
        let caller = patient(fx.patient_id);

        let outcome = fx
            .scheduler
            .book_appointment(&caller, request(fx.doctor_id, "09:00"))
            .await
            .unwrap();
        let BookingOutcome::Booked(appointment) = outcome else {
            panic!("expected booking to succeed");
        };
        assert_eq!(appointment.appointment_time, at(9, 0));
        assert_eq!(appointment.patient_id, fx.patient_id);

        let again = fx
            .scheduler
            .book_appointment(&patient(fx.other_patient_id), request(fx.doctor_id, "09:00"))
            .await
            .unwrap();
        assert_eq!(again, BookingOutcome::SlotUnavailable);

        let slots = fx
            .scheduler
            .list_available_slots(fx.doctor_id, day())
            .await
            .unwrap();
        assert_eq!(slots.len(), 15);
        assert!(!slots.contains(&at(9, 0)));
    }

    #[tokio::test]
    async fn test_concurrent_bookings_have_exactly_one_winner() {
        let fx = setup(at(0, 0) - Duration::days(1)).await;
        let first = patient(fx.patient_id);
        let second = patient(fx.other_patient_id);

        let (a, b) = tokio::join!(
            fx.scheduler
                .book_appointment(&first, request(fx.doctor_id, "10:00")),
            fx.scheduler
                .book_appointment(&second, request(fx.doctor_id, "10:00")),
        );
        let outcomes = [a.unwrap(), b.unwrap()];

        let booked = outcomes
            .iter()
            .filter(|o| matches!(o, BookingOutcome::Booked(_)))
            .count();
        let unavailable = outcomes
            .iter()
            .filter(|o| **o == BookingOutcome::SlotUnavailable)
            .count();
        assert_eq!((booked, unavailable), (1, 1));

        let schedule = fx
            .scheduler
            .list_doctor_schedule(&ADMIN, fx.doctor_id, day())
            .await
            .unwrap();
        assert_eq!(schedule.len(), 1);
    }

    #[tokio::test]
    async fn test_booking_publishes_to_doctor_and_patient_rooms() {
        let mut relay = MockRelay::new();
        relay
            .expect_publish()
            .withf(|room, event| {
                room.eq("doctor-1") && event.kind == AppointmentEventKind::Booked
            })
            .times(1)
            .returning(|_, _| 1);
        relay
            .expect_publish()
            .withf(|room, _| room.starts_with("patient-"))
            .times(1)
            .returning(|_, _| 0);

        let fx = setup_with(at(0, 0) - Duration::days(1), relay, true).await;
        assert_eq!(fx.doctor_id, 1);
        fx.scheduler
            .book_appointment(&patient(fx.patient_id), request(fx.doctor_id, "11:30"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_booking_rejections() {
        let fx = setup(at(12, 0)).await;
        let caller = patient(fx.patient_id);

        let past = fx
            .scheduler
            .book_appointment(&caller, request(fx.doctor_id, "09:00"))
            .await
            .unwrap_err();
        assert!(matches!(past, SchedulerError::Temporal(_)));

        let off_grid = fx
            .scheduler
            .book_appointment(&caller, request(fx.doctor_id, "13:15"))
            .await
            .unwrap_err();
        assert!(matches!(off_grid, SchedulerError::Validation(_)));

        let for_someone_else = AppointmentRequest {
            patient_id: Some(fx.other_patient_id),
            ..request(fx.doctor_id, "14:00")
        };
        let err = fx
            .scheduler
            .book_appointment(&caller, for_someone_else)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Forbidden(_)));

        let doctor = Identity::Doctor {
            doctor_id: fx.doctor_id,
        };
        let err = fx
            .scheduler
            .book_appointment(&doctor, request(fx.doctor_id, "14:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Forbidden(_)));

        let unknown_doctor = fx
            .scheduler
            .book_appointment(&caller, request(fx.doctor_id + 50, "14:00"))
            .await
            .unwrap_err();
        assert!(matches!(unknown_doctor, SchedulerError::NotFound(_)));

        let missing_clinic = AppointmentRequest {
            clinic_name: None,
            ..request(fx.doctor_id, "14:00")
        };
        let err = fx
            .scheduler
            .book_appointment(&caller, missing_clinic)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Validation(_)));

        let admin_without_patient = fx
            .scheduler
            .book_appointment(&ADMIN, request(fx.doctor_id, "14:00"))
            .await
            .unwrap_err();
        assert!(matches!(admin_without_patient, SchedulerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_closed_panel_only_accepts_linked_patients() {
        let fx = setup_with(at(0, 0) - Duration::days(1), quiet_relay(), false).await;
        let caller = patient(fx.patient_id);

        let err = fx
            .scheduler
            .book_appointment(&caller, request(fx.doctor_id, "09:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Forbidden(_)));

        // An admin booking enrols the patient, after which they may book themselves
        let admin_request = AppointmentRequest {
            patient_id: Some(fx.patient_id),
            ..request(fx.doctor_id, "09:00")
        };
        let outcome = fx
            .scheduler
            .book_appointment(&ADMIN, admin_request)
            .await
            .unwrap();
        assert!(matches!(outcome, BookingOutcome::Booked(_)));
        assert!(fx
            .scheduler
            .directory()
            .is_linked(fx.doctor_id, fx.patient_id)
            .await
            .unwrap());

        let outcome = fx
            .scheduler
            .book_appointment(&caller, request(fx.doctor_id, "09:30"))
            .await
            .unwrap();
        assert!(matches!(outcome, BookingOutcome::Booked(_)));

        let err = fx
            .scheduler
            .book_appointment(&patient(fx.other_patient_id), request(fx.doctor_id, "10:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let fx = setup(at(0, 0) - Duration::days(1)).await;
        let owner = patient(fx.patient_id);
        let BookingOutcome::Booked(appointment) = fx
            .scheduler
            .book_appointment(&owner, request(fx.doctor_id, "15:00"))
            .await
            .unwrap()
        else {
            panic!("expected booking to succeed");
        };

        let err = fx
            .scheduler
            .cancel_appointment(&patient(fx.other_patient_id), appointment.appointment_id)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Forbidden(_)));

        let err = fx
            .scheduler
            .cancel_appointment(&owner, appointment.appointment_id + 100)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NotFound(_)));

        let cancelled = fx
            .scheduler
            .cancel_appointment(&owner, appointment.appointment_id)
            .await
            .unwrap();
        assert_eq!(cancelled.appointment_id, appointment.appointment_id);

        let slots = fx
            .scheduler
            .list_available_slots(fx.doctor_id, day())
            .await
            .unwrap();
        assert_eq!(slots.len(), 16);
    }

    #[tokio::test]
    async fn test_cancelling_past_appointment_is_rejected() {
        // The clock reads the day after the appointment
        let fx = setup(at(10, 0) + Duration::days(1)).await;
        let owner = patient(fx.patient_id);

        let admin_request = AppointmentRequest {
            patient_id: Some(fx.patient_id),
            appointment_date: Some((day() + Duration::days(2)).format("%Y-%m-%d").to_string()),
            ..request(fx.doctor_id, "09:00")
        };
        let BookingOutcome::Booked(appointment) = fx
            .scheduler
            .book_appointment(&ADMIN, admin_request)
            .await
            .unwrap()
        else {
            panic!("expected booking to succeed");
        };

        // Move it into the past: edits are not time-restricted
        let moved = AppointmentRequest {
            patient_id: Some(fx.patient_id),
            ..request(fx.doctor_id, "09:00")
        };
        let outcome = fx
            .scheduler
            .edit_appointment(&ADMIN, appointment.appointment_id, moved)
            .await
            .unwrap();
        assert!(matches!(outcome, BookingOutcome::Booked(_)));

        let err = fx
            .scheduler
            .cancel_appointment(&owner, appointment.appointment_id)
            .await
            .unwrap_err();
        match err {
            SchedulerError::Temporal(message) => assert_eq!(message, PAST_CANCEL_MESSAGE),
            other => panic!("expected temporal error, got {other:?}"),
        }

        // Not the owner and in the past: still rejected
        assert!(fx
            .scheduler
            .cancel_appointment(&patient(fx.other_patient_id), appointment.appointment_id)
            .await
            .is_err());

        let history = fx
            .scheduler
            .list_patient_appointments(&owner, fx.patient_id)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, AppointmentStatus::Completed);
    }

    #[tokio::test]
    async fn test_admin_edit_and_delete() {
        let fx = setup(at(0, 0) - Duration::days(1)).await;
        let owner = patient(fx.patient_id);
        let mut ids = Vec::new();
        for time in ["09:00", "10:00"] {
            if let BookingOutcome::Booked(a) = fx
                .scheduler
                .book_appointment(&owner, request(fx.doctor_id, time))
                .await
                .unwrap()
            {
                ids.push(a.appointment_id);
            }
        }
        assert_eq!(ids.len(), 2);

        let collide = AppointmentRequest {
            patient_id: Some(fx.patient_id),
            ..request(fx.doctor_id, "10:00")
        };
        let err = fx
            .scheduler
            .edit_appointment(&owner, ids[0], collide.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Forbidden(_)));

        let outcome = fx
            .scheduler
            .edit_appointment(&ADMIN, ids[0], collide)
            .await
            .unwrap();
        assert_eq!(outcome, BookingOutcome::SlotUnavailable);

        let moved = AppointmentRequest {
            patient_id: Some(fx.other_patient_id),
            clinic_name: Some("South Clinic".to_string()),
            ..request(fx.doctor_id, "11:00")
        };
        let BookingOutcome::Booked(edited) = fx
            .scheduler
            .edit_appointment(&ADMIN, ids[0], moved)
            .await
            .unwrap()
        else {
            panic!("expected edit to succeed");
        };
        assert_eq!(edited.patient_id, fx.other_patient_id);
        assert_eq!(edited.clinic_name, "South Clinic");

        let missing = fx
            .scheduler
            .edit_appointment(
                &ADMIN,
                9999,
                AppointmentRequest {
                    patient_id: Some(fx.patient_id),
                    ..request(fx.doctor_id, "12:00")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(missing, SchedulerError::NotFound(_)));

        assert!(fx.scheduler.delete_appointment(&owner, ids[1]).await.is_err());
        fx.scheduler.delete_appointment(&ADMIN, ids[1]).await.unwrap();
        let err = fx
            .scheduler
            .delete_appointment(&ADMIN, ids[1])
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_schedule_and_history_visibility() {
        let fx = setup(at(10, 0)).await;
        let owner = patient(fx.patient_id);
        for time in ["11:00", "14:30"] {
            fx.scheduler
                .book_appointment(&owner, request(fx.doctor_id, time))
                .await
                .unwrap();
        }

        let doctor = Identity::Doctor {
            doctor_id: fx.doctor_id,
        };
        let schedule = fx
            .scheduler
            .list_doctor_schedule(&doctor, fx.doctor_id, day())
            .await
            .unwrap();
        let times: Vec<_> = schedule
            .iter()
            .map(|v| v.appointment.appointment_time)
            .collect();
        assert_eq!(times, vec![at(11, 0), at(14, 30)]);
        assert!(schedule.iter().all(|v| v.status == AppointmentStatus::Scheduled));

        let err = fx
            .scheduler
            .list_doctor_schedule(&owner, fx.doctor_id, day())
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Forbidden(_)));

        let err = fx
            .scheduler
            .list_patient_appointments(&patient(fx.other_patient_id), fx.patient_id)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Forbidden(_)));

        let as_admin = fx
            .scheduler
            .list_patient_appointments(&ADMIN, fx.patient_id)
            .await
            .unwrap();
        assert_eq!(as_admin.len(), 2);
    }
}
