//! SQL implementation of the appointment repository

use crate::codec::{decode_timestamp, encode_timestamp};
use crate::error::DbError;
use crate::repositories::appointment::AppointmentRepository;
use crate::DbClient;
use chrono::NaiveDateTime;
use medportal_common::models::{Appointment, AppointmentFields};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

const SELECT_COLUMNS: &str = "SELECT appointment_id, doctor_id, patient_id, appointment_time, \
     clinic_name, city, state FROM appointments";

/// SQL implementation of the appointment repository
#[derive(Debug, Clone)]
pub struct SqlAppointmentRepository {
    db_client: DbClient,
}

impl SqlAppointmentRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn appointment_from_row(row: &AnyRow) -> Result<Appointment, DbError> {
    let raw_time: String = row.try_get("appointment_time")?;
    Ok(Appointment {
        appointment_id: row.try_get("appointment_id")?,
        doctor_id: row.try_get("doctor_id")?,
        patient_id: row.try_get("patient_id")?,
        appointment_time: decode_timestamp(&raw_time)?,
        clinic_name: row.try_get("clinic_name")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
    })
}

fn appointments_from_rows(rows: Vec<AnyRow>) -> Result<Vec<Appointment>, DbError> {
    rows.iter().map(appointment_from_row).collect()
}

fn read_error(context: &'static str) -> impl Fn(sqlx::Error) -> DbError {
    move |e| {
        error!("{}: {}", context, e);
        DbError::QueryError(e.to_string())
    }
}

fn write_error(context: &'static str) -> impl Fn(sqlx::Error) -> DbError {
    move |e| {
        let err = DbError::from_write(e);
        if err.is_conflict() {
            debug!("{}: {}", context, err);
        } else {
            error!("{}: {}", context, err);
        }
        err
    }
}

impl AppointmentRepository for SqlAppointmentRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing appointment schema");

        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS appointments (
                appointment_id INTEGER PRIMARY KEY AUTOINCREMENT,
                doctor_id INTEGER NOT NULL REFERENCES doctors(doctor_id),
                patient_id INTEGER NOT NULL REFERENCES patients(patient_id),
                appointment_time TEXT NOT NULL,
                clinic_name TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                UNIQUE(doctor_id, appointment_time)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id, appointment_time)",
        ];

        for statement in statements {
            self.db_client.execute(statement).await?;
        }

        info!("Appointment schema initialized successfully");
        Ok(())
    }

    async fn insert(&self, fields: AppointmentFields) -> Result<Appointment, DbError> {
        let time = encode_timestamp(fields.appointment_time);
        debug!(
            "Inserting appointment for doctor {} at {}",
            fields.doctor_id, time
        );

        let mut tx = self.db_client.begin().await?;

        // First statement of the transaction: concurrent bookers queue on the
        // write lock and the loser sees the unique violation.
        sqlx::query(
            r#"
            INSERT INTO appointments (doctor_id, patient_id, appointment_time, clinic_name, city, state)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(fields.doctor_id)
        .bind(fields.patient_id)
        .bind(&time)
        .bind(&fields.clinic_name)
        .bind(&fields.city)
        .bind(&fields.state)
        .execute(&mut *tx)
        .await
        .map_err(write_error("Failed to insert appointment"))?;

        let row = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE doctor_id = $1 AND appointment_time = $2"
        ))
        .bind(fields.doctor_id)
        .bind(&time)
        .fetch_one(&mut *tx)
        .await
        .map_err(read_error("Failed to read back appointment"))?;
        let appointment = appointment_from_row(&row)?;

        sqlx::query(
            r#"
            INSERT INTO doctor_patients (doctor_id, patient_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(fields.doctor_id)
        .bind(fields.patient_id)
        .execute(&mut *tx)
        .await
        .map_err(write_error("Failed to link patient to doctor"))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!(
            "Appointment {} created for doctor {} at {}",
            appointment.appointment_id, appointment.doctor_id, time
        );
        Ok(appointment)
    }

    async fn find_by_id(&self, appointment_id: i64) -> Result<Option<Appointment>, DbError> {
        debug!("Finding appointment {}", appointment_id);

        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE appointment_id = $1"))
            .bind(appointment_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(read_error("Failed to find appointment"))?;

        row.as_ref().map(appointment_from_row).transpose()
    }

    async fn find_by_doctor_and_time(
        &self,
        doctor_id: i64,
        appointment_time: NaiveDateTime,
    ) -> Result<Option<Appointment>, DbError> {
        let row = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE doctor_id = $1 AND appointment_time = $2"
        ))
        .bind(doctor_id)
        .bind(encode_timestamp(appointment_time))
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(read_error("Failed to find appointment by slot"))?;

        row.as_ref().map(appointment_from_row).transpose()
    }

    async fn find_by_doctor_between(
        &self,
        doctor_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>, DbError> {
        debug!(
            "Finding appointments for doctor {} in [{}, {})",
            doctor_id, start, end
        );

        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE doctor_id = $1 AND appointment_time >= $2 \
             AND appointment_time < $3 ORDER BY appointment_time ASC"
        ))
        .bind(doctor_id)
        .bind(encode_timestamp(start))
        .bind(encode_timestamp(end))
        .fetch_all(self.db_client.pool())
        .await
        .map_err(read_error("Failed to find doctor appointments"))?;

        appointments_from_rows(rows)
    }

    async fn find_by_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, DbError> {
        debug!("Finding appointments for patient {}", patient_id);

        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE patient_id = $1 ORDER BY appointment_time ASC"
        ))
        .bind(patient_id)
        .fetch_all(self.db_client.pool())
        .await
        .map_err(read_error("Failed to find patient appointments"))?;

        appointments_from_rows(rows)
    }

    async fn replace(
        &self,
        appointment_id: i64,
        fields: AppointmentFields,
    ) -> Result<Option<Appointment>, DbError> {
        let time = encode_timestamp(fields.appointment_time);
        debug!("Replacing appointment {} (new time {})", appointment_id, time);

        let mut tx = self.db_client.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET doctor_id = $1, patient_id = $2, appointment_time = $3,
                clinic_name = $4, city = $5, state = $6
            WHERE appointment_id = $7
            "#,
        )
        .bind(fields.doctor_id)
        .bind(fields.patient_id)
        .bind(&time)
        .bind(&fields.clinic_name)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(appointment_id)
        .execute(&mut *tx)
        .await
        .map_err(write_error("Failed to update appointment"))?;

        if result.rows_affected() == 0 {
            debug!("Appointment {} not found for replace", appointment_id);
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO doctor_patients (doctor_id, patient_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(fields.doctor_id)
        .bind(fields.patient_id)
        .execute(&mut *tx)
        .await
        .map_err(write_error("Failed to link patient to doctor"))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!("Appointment {} replaced", appointment_id);
        Ok(Some(Appointment::from_fields(appointment_id, fields)))
    }

    async fn delete(&self, appointment_id: i64) -> Result<bool, DbError> {
        debug!("Deleting appointment {}", appointment_id);

        let result = sqlx::query("DELETE FROM appointments WHERE appointment_id = $1")
            .bind(appointment_id)
            .execute(self.db_client.pool())
            .await
            .map_err(write_error("Failed to delete appointment"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_owned_future(
        &self,
        appointment_id: i64,
        patient_id: i64,
        now: NaiveDateTime,
    ) -> Result<bool, DbError> {
        debug!(
            "Deleting appointment {} for patient {} if after {}",
            appointment_id, patient_id, now
        );

        let result = sqlx::query(
            r#"
            DELETE FROM appointments
            WHERE appointment_id = $1 AND patient_id = $2 AND appointment_time > $3
            "#,
        )
        .bind(appointment_id)
        .bind(patient_id)
        .bind(encode_timestamp(now))
        .execute(self.db_client.pool())
        .await
        .map_err(write_error("Failed to cancel appointment"))?;

        Ok(result.rows_affected() > 0)
    }
}
