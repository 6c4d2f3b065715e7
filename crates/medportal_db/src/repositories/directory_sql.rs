//! SQL implementation of the directory repository

use crate::error::DbError;
use crate::repositories::directory::DirectoryRepository;
use crate::DbClient;
use medportal_common::models::{Doctor, NewDoctor, NewPatient, Patient};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

/// SQL implementation of the directory repository
#[derive(Debug, Clone)]
pub struct SqlDirectoryRepository {
    db_client: DbClient,
}

impl SqlDirectoryRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn doctor_from_row(row: &AnyRow) -> Result<Doctor, DbError> {
    // Booleans are stored as INTEGER, the Any driver only decodes them as i64
    let accepting: i64 = row.try_get("is_accepting_new_patients")?;
    Ok(Doctor {
        doctor_id: row.try_get("doctor_id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        specialty: row.try_get("specialty")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        phone_number: row.try_get("phone_number")?,
        email: row.try_get("email")?,
        is_accepting_new_patients: accepting != 0,
    })
}

fn patient_from_row(row: &AnyRow) -> Result<Patient, DbError> {
    Ok(Patient {
        patient_id: row.try_get("patient_id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        dob: row.try_get("dob")?,
        email: row.try_get("email")?,
        phone_number: row.try_get("phone_number")?,
    })
}

fn query_error(context: &'static str) -> impl Fn(sqlx::Error) -> DbError {
    move |e| {
        error!("{}: {}", context, e);
        DbError::from_write(e)
    }
}

impl DirectoryRepository for SqlDirectoryRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing directory schema");

        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS doctors (
                doctor_id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                specialty TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                phone_number TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                is_accepting_new_patients INTEGER NOT NULL DEFAULT 1
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS patients (
                patient_id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                dob TEXT NOT NULL,
                email TEXT UNIQUE,
                phone_number TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS doctor_patients (
                doctor_id INTEGER NOT NULL REFERENCES doctors(doctor_id),
                patient_id INTEGER NOT NULL REFERENCES patients(patient_id),
                PRIMARY KEY (doctor_id, patient_id)
            )
            "#,
        ];

        for statement in statements {
            self.db_client.execute(statement).await?;
        }

        info!("Directory schema initialized successfully");
        Ok(())
    }

    async fn create_doctor(&self, doctor: NewDoctor) -> Result<Doctor, DbError> {
        debug!("Creating doctor {} {}", doctor.first_name, doctor.last_name);

        let row = sqlx::query(
            r#"
            INSERT INTO doctors (first_name, last_name, specialty, city, state, phone_number,
                                 email, is_accepting_new_patients)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING doctor_id
            "#,
        )
        .bind(&doctor.first_name)
        .bind(&doctor.last_name)
        .bind(&doctor.specialty)
        .bind(&doctor.city)
        .bind(&doctor.state)
        .bind(&doctor.phone_number)
        .bind(&doctor.email)
        .bind(i64::from(doctor.is_accepting_new_patients))
        .fetch_one(self.db_client.pool())
        .await
        .map_err(query_error("Failed to insert doctor"))?;

        let doctor_id: i64 = row.try_get("doctor_id")?;
        info!("Doctor {} created", doctor_id);

        Ok(Doctor {
            doctor_id,
            first_name: doctor.first_name,
            last_name: doctor.last_name,
            specialty: doctor.specialty,
            city: doctor.city,
            state: doctor.state,
            phone_number: doctor.phone_number,
            email: doctor.email,
            is_accepting_new_patients: doctor.is_accepting_new_patients,
        })
    }

    async fn create_patient(&self, patient: NewPatient) -> Result<Patient, DbError> {
        debug!("Creating patient {} {}", patient.first_name, patient.last_name);

        let row = sqlx::query(
            r#"
            INSERT INTO patients (first_name, last_name, dob, email, phone_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING patient_id
            "#,
        )
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(&patient.dob)
        .bind(patient.email.clone())
        .bind(patient.phone_number.clone())
        .fetch_one(self.db_client.pool())
        .await
        .map_err(query_error("Failed to insert patient"))?;

        let patient_id: i64 = row.try_get("patient_id")?;
        info!("Patient {} created", patient_id);

        Ok(Patient {
            patient_id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            dob: patient.dob,
            email: patient.email,
            phone_number: patient.phone_number,
        })
    }

    async fn find_doctor(&self, doctor_id: i64) -> Result<Option<Doctor>, DbError> {
        debug!("Finding doctor {}", doctor_id);

        let row = sqlx::query(
            r#"
            SELECT doctor_id, first_name, last_name, specialty, city, state, phone_number,
                   email, is_accepting_new_patients
            FROM doctors
            WHERE doctor_id = $1
            "#,
        )
        .bind(doctor_id)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(query_error("Failed to find doctor"))?;

        row.as_ref().map(doctor_from_row).transpose()
    }

    async fn find_patient(&self, patient_id: i64) -> Result<Option<Patient>, DbError> {
        debug!("Finding patient {}", patient_id);

        let row = sqlx::query(
            r#"
            SELECT patient_id, first_name, last_name, dob, email, phone_number
            FROM patients
            WHERE patient_id = $1
            "#,
        )
        .bind(patient_id)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(query_error("Failed to find patient"))?;

        row.as_ref().map(patient_from_row).transpose()
    }

    async fn is_linked(&self, doctor_id: i64, patient_id: i64) -> Result<bool, DbError> {
        let row = sqlx::query(
            "SELECT doctor_id FROM doctor_patients WHERE doctor_id = $1 AND patient_id = $2",
        )
        .bind(doctor_id)
        .bind(patient_id)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(query_error("Failed to look up doctor-patient link"))?;

        Ok(row.is_some())
    }
}
