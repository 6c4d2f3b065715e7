// Integration tests for the SQL repositories against a throwaway SQLite file.

use chrono::{NaiveDate, NaiveDateTime};
use medportal_common::models::{AppointmentFields, NewDoctor, NewPatient};
use medportal_db::{
    AppointmentRepository, AppointmentRepositoryFactory, DbClient, DbError, DirectoryRepository,
    DirectoryRepositoryFactory, RepositoryFactory, SqlAppointmentRepository,
    SqlDirectoryRepository,
};

struct Fixture {
    appointments: SqlAppointmentRepository,
    directory: SqlDirectoryRepository,
    doctor_id: i64,
    patient_id: i64,
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 10)
        .and_then(|d| d.and_hms_opt(h, m, 0))
        .expect("valid timestamp")
}

fn fields(doctor_id: i64, patient_id: i64, time: NaiveDateTime) -> AppointmentFields {
    AppointmentFields {
        doctor_id,
        patient_id,
        appointment_time: time,
        clinic_name: "North Clinic".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
    }
}

async fn setup() -> Fixture {
    let path = std::env::temp_dir().join(format!("medportal-test-{}.db", uuid::Uuid::new_v4()));
    let db = DbClient::from_url(&format!("sqlite:{}", path.display()))
        .await
        .expect("database opens");

    let directory = DirectoryRepositoryFactory::new().create_repository(db.clone());
    let appointments = AppointmentRepositoryFactory::new().create_repository(db);
    directory.init_schema().await.expect("directory schema");
    appointments.init_schema().await.expect("appointment schema");

    let doctor = directory
        .create_doctor(NewDoctor {
            first_name: "Gregory".to_string(),
            last_name: "House".to_string(),
            specialty: "Diagnostics".to_string(),
            city: "Princeton".to_string(),
            state: "NJ".to_string(),
            phone_number: "555-0100".to_string(),
            email: "house@example.org".to_string(),
            is_accepting_new_patients: true,
        })
        .await
        .expect("doctor created");
    let patient = directory
        .create_patient(NewPatient {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            dob: "1990-12-10".to_string(),
            email: Some("ada@example.org".to_string()),
            phone_number: Some("555-0199".to_string()),
        })
        .await
        .expect("patient created");

    Fixture {
        appointments,
        directory,
        doctor_id: doctor.doctor_id,
        patient_id: patient.patient_id,
    }
}

#[tokio::test]
async fn directory_round_trip() {
    let fx = setup().await;

    let doctor = fx.directory.find_doctor(fx.doctor_id).await.unwrap().unwrap();
    assert_eq!(doctor.last_name, "House");
    assert!(doctor.is_accepting_new_patients);

    let patient = fx.directory.find_patient(fx.patient_id).await.unwrap().unwrap();
    assert_eq!(patient.email.as_deref(), Some("ada@example.org"));

    assert!(fx.directory.find_doctor(9999).await.unwrap().is_none());
    assert!(!fx.directory.is_linked(fx.doctor_id, fx.patient_id).await.unwrap());
}

#[tokio::test]
async fn insert_links_patient_and_rejects_duplicate_slot() {
    let fx = setup().await;

    let created = fx
        .appointments
        .insert(fields(fx.doctor_id, fx.patient_id, at(9, 0)))
        .await
        .expect("first booking succeeds");
    assert_eq!(created.appointment_time, at(9, 0));
    assert!(fx.directory.is_linked(fx.doctor_id, fx.patient_id).await.unwrap());

    let err = fx
        .appointments
        .insert(fields(fx.doctor_id, fx.patient_id, at(9, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)), "got {err:?}");

    let found = fx
        .appointments
        .find_by_doctor_and_time(fx.doctor_id, at(9, 0))
        .await
        .unwrap();
    assert_eq!(found.map(|a| a.appointment_id), Some(created.appointment_id));
}

#[tokio::test]
async fn range_and_patient_queries_are_ordered() {
    let fx = setup().await;
    for (h, m) in [(15, 0), (9, 30), (11, 0)] {
        fx.appointments
            .insert(fields(fx.doctor_id, fx.patient_id, at(h, m)))
            .await
            .unwrap();
    }
    let next_day = at(9, 0) + chrono::Duration::days(1);
    fx.appointments
        .insert(fields(fx.doctor_id, fx.patient_id, next_day))
        .await
        .unwrap();

    let day = fx
        .appointments
        .find_by_doctor_between(fx.doctor_id, at(0, 0), at(0, 0) + chrono::Duration::days(1))
        .await
        .unwrap();
    let times: Vec<_> = day.iter().map(|a| a.appointment_time).collect();
    assert_eq!(times, vec![at(9, 30), at(11, 0), at(15, 0)]);

    let all = fx.appointments.find_by_patient(fx.patient_id).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all.last().map(|a| a.appointment_time), Some(next_day));
}

#[tokio::test]
async fn conditional_delete_respects_owner_and_time() {
    let fx = setup().await;
    let appt = fx
        .appointments
        .insert(fields(fx.doctor_id, fx.patient_id, at(10, 0)))
        .await
        .unwrap();

    // Wrong owner
    assert!(!fx
        .appointments
        .delete_owned_future(appt.appointment_id, fx.patient_id + 1, at(8, 0))
        .await
        .unwrap());
    // Already started
    assert!(!fx
        .appointments
        .delete_owned_future(appt.appointment_id, fx.patient_id, at(10, 0))
        .await
        .unwrap());
    assert!(fx
        .appointments
        .delete_owned_future(appt.appointment_id, fx.patient_id, at(8, 0))
        .await
        .unwrap());
    assert!(fx
        .appointments
        .find_by_id(appt.appointment_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn replace_overwrites_and_detects_collisions() {
    let fx = setup().await;
    let first = fx
        .appointments
        .insert(fields(fx.doctor_id, fx.patient_id, at(9, 0)))
        .await
        .unwrap();
    fx.appointments
        .insert(fields(fx.doctor_id, fx.patient_id, at(10, 0)))
        .await
        .unwrap();

    let mut moved = fields(fx.doctor_id, fx.patient_id, at(13, 30));
    moved.clinic_name = "South Clinic".to_string();
    let replaced = fx
        .appointments
        .replace(first.appointment_id, moved)
        .await
        .unwrap()
        .expect("appointment exists");
    assert_eq!(replaced.clinic_name, "South Clinic");

    let stored = fx
        .appointments
        .find_by_id(first.appointment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.appointment_time, at(13, 30));

    let err = fx
        .appointments
        .replace(first.appointment_id, fields(fx.doctor_id, fx.patient_id, at(10, 0)))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    assert!(fx
        .appointments
        .replace(424242, fields(fx.doctor_id, fx.patient_id, at(16, 0)))
        .await
        .unwrap()
        .is_none());

    assert!(fx.appointments.delete(first.appointment_id).await.unwrap());
    assert!(!fx.appointments.delete(first.appointment_id).await.unwrap());
}
