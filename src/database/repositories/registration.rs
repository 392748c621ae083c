//! Registration repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use crate::database::repositories::RegistrationStore;
use crate::models::registration::{NewRegistration, Registration};
use crate::utils::errors::HealingError;

const REGISTRATION_COLUMNS: &str = "id, event_id, user_id, guest_name, guest_email, guest_phone, registration_date, ip_address, is_admin_override";

#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationStore for RegistrationRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Registration>, HealingError> {
        let sql = format!("SELECT {} FROM registrations WHERE id = $1", REGISTRATION_COLUMNS);
        let registration = sqlx::query_as::<_, Registration>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    async fn find_by_event(&self, event_id: i64) -> Result<Vec<Registration>, HealingError> {
        let sql = format!(
            "SELECT {} FROM registrations WHERE event_id = $1 ORDER BY registration_date ASC, id ASC",
            REGISTRATION_COLUMNS
        );
        let registrations = sqlx::query_as::<_, Registration>(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(registrations)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Registration>, HealingError> {
        let sql = format!(
            "SELECT {} FROM registrations WHERE user_id = $1 ORDER BY registration_date DESC, id DESC",
            REGISTRATION_COLUMNS
        );
        let registrations = sqlx::query_as::<_, Registration>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(registrations)
    }

    async fn find_by_event_and_user(&self, event_id: i64, user_id: i64) -> Result<Option<Registration>, HealingError> {
        let sql = format!(
            "SELECT {} FROM registrations WHERE event_id = $1 AND user_id = $2",
            REGISTRATION_COLUMNS
        );
        let registration = sqlx::query_as::<_, Registration>(&sql)
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    async fn find_by_event_and_guest_email(&self, event_id: i64, guest_email: &str) -> Result<Option<Registration>, HealingError> {
        // No unique index backs this lookup, so more than one row can exist after a race
        let sql = format!(
            "SELECT {} FROM registrations WHERE event_id = $1 AND guest_email = $2 ORDER BY id ASC LIMIT 1",
            REGISTRATION_COLUMNS
        );
        let registration = sqlx::query_as::<_, Registration>(&sql)
            .bind(event_id)
            .bind(guest_email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    async fn count_by_event(&self, event_id: i64) -> Result<i64, HealingError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1"
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn count_by_event_ip_since(&self, event_id: i64, ip_address: &str, since: DateTime<Utc>) -> Result<i64, HealingError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND ip_address = $2 AND registration_date >= $3"
        )
        .bind(event_id)
        .bind(ip_address)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn add(&self, registration: NewRegistration) -> Result<Registration, HealingError> {
        let sql = format!(
            r#"
            INSERT INTO registrations (event_id, user_id, guest_name, guest_email, guest_phone, registration_date, ip_address, is_admin_override)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );
        let registration = sqlx::query_as::<_, Registration>(&sql)
            .bind(registration.event_id)
            .bind(registration.user_id)
            .bind(registration.guest_name)
            .bind(registration.guest_email)
            .bind(registration.guest_phone)
            .bind(registration.registration_date)
            .bind(registration.ip_address)
            .bind(registration.is_admin_override)
            .fetch_one(&self.pool)
            .await?;

        Ok(registration)
    }

    async fn delete(&self, id: i64) -> Result<bool, HealingError> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
