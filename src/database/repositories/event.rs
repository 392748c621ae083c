//! Event repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use crate::database::repositories::EventStore;
use crate::models::event::{Address, Event, EventChanges, EventStatus, NewAddress, NewEvent, Tag};
use crate::utils::errors::HealingError;

const EVENT_COLUMNS: &str = "id, title, description, event_type, status, start_date_time, end_date_time, capacity, owner_id, address_id, created_at, updated_at";

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for EventRepository {
    /// Create a new event
    async fn create(&self, event: NewEvent) -> Result<Event, HealingError> {
        let sql = format!(
            r#"
            INSERT INTO events (title, description, event_type, status, start_date_time, end_date_time, capacity, owner_id, address_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(event.title)
            .bind(event.description)
            .bind(event.event_type)
            .bind(event.status)
            .bind(event.start_date_time)
            .bind(event.end_date_time)
            .bind(event.capacity)
            .bind(event.owner_id)
            .bind(event.address_id)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(event)
    }

    /// Find event by ID
    async fn find_by_id(&self, id: i64) -> Result<Option<Event>, HealingError> {
        let sql = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Update event
    async fn update(&self, id: i64, changes: EventChanges) -> Result<Option<Event>, HealingError> {
        let sql = format!(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                event_type = COALESCE($4, event_type),
                status = COALESCE($5, status),
                start_date_time = COALESCE($6, start_date_time),
                end_date_time = COALESCE($7, end_date_time),
                capacity = COALESCE($8, capacity),
                address_id = COALESCE($9, address_id),
                updated_at = $10
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.event_type)
            .bind(changes.status)
            .bind(changes.start_date_time)
            .bind(changes.end_date_time)
            .bind(changes.capacity)
            .bind(changes.address_id)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Change event status
    async fn set_status(&self, id: i64, status: EventStatus) -> Result<Option<Event>, HealingError> {
        let sql = format!(
            "UPDATE events SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        );
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Delete event
    async fn delete(&self, id: i64) -> Result<bool, HealingError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List events with pagination
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Event>, HealingError> {
        let sql = format!(
            "SELECT {} FROM events ORDER BY start_date_time ASC, id ASC LIMIT $1 OFFSET $2",
            EVENT_COLUMNS
        );
        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    /// Get upcoming published events
    async fn list_upcoming_published(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Event>, HealingError> {
        let sql = format!(
            "SELECT {} FROM events WHERE start_date_time > $1 AND status = $2 ORDER BY start_date_time ASC LIMIT $3",
            EVENT_COLUMNS
        );
        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(now)
            .bind(EventStatus::Published)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    /// Count total events
    async fn count(&self) -> Result<i64, HealingError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn create_address(&self, address: NewAddress) -> Result<Address, HealingError> {
        let address = sqlx::query_as::<_, Address>(
            r#"
            INSERT INTO addresses (street, city, state, postal_code, country)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, street, city, state, postal_code, country
            "#
        )
        .bind(address.street)
        .bind(address.city)
        .bind(address.state)
        .bind(address.postal_code)
        .bind(address.country)
        .fetch_one(&self.pool)
        .await?;

        Ok(address)
    }

    async fn find_address(&self, id: i64) -> Result<Option<Address>, HealingError> {
        let address = sqlx::query_as::<_, Address>(
            "SELECT id, street, city, state, postal_code, country FROM addresses WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(address)
    }

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, HealingError> {
        let tag = sqlx::query_as::<_, Tag>(
            "SELECT id, name FROM tags WHERE LOWER(name) = LOWER($1)"
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    async fn create_tag(&self, name: &str) -> Result<Tag, HealingError> {
        let tag = sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name) VALUES ($1) RETURNING id, name"
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(tag)
    }

    async fn attach_tag(&self, event_id: i64, tag_id: i64) -> Result<(), HealingError> {
        sqlx::query(
            "INSERT INTO event_tags (event_id, tag_id) VALUES ($1, $2) ON CONFLICT (event_id, tag_id) DO NOTHING"
        )
        .bind(event_id)
        .bind(tag_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_tags(&self, event_id: i64) -> Result<(), HealingError> {
        sqlx::query("DELETE FROM event_tags WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn tags_for_event(&self, event_id: i64) -> Result<Vec<Tag>, HealingError> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name
            FROM tags t
            INNER JOIN event_tags et ON t.id = et.tag_id
            WHERE et.event_id = $1
            ORDER BY t.name ASC
            "#
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }
}
