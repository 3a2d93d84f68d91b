use crate::domain::{
    models::rehearsal::{Rehearsal, RehearsalAttendee, RehearsalFilter, STATUS_SCHEDULED},
    ports::RehearsalRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteRehearsalRepo {
    pool: SqlitePool,
}

impl SqliteRehearsalRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RehearsalRepository for SqliteRehearsalRepo {
    async fn create(&self, rehearsal: &Rehearsal, attendees: &[RehearsalAttendee]) -> Result<Rehearsal, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, Rehearsal>(
            "INSERT INTO rehearsals (id, band_id, venue_id, title, description, start_time, end_time, status, created_by, reminder_sent, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&rehearsal.id).bind(&rehearsal.band_id).bind(&rehearsal.venue_id).bind(&rehearsal.title)
            .bind(&rehearsal.description).bind(rehearsal.start_time).bind(rehearsal.end_time).bind(&rehearsal.status)
            .bind(&rehearsal.created_by).bind(rehearsal.reminder_sent).bind(rehearsal.created_at).bind(rehearsal.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        for attendee in attendees {
            sqlx::query(
                "INSERT INTO rehearsal_attendees (id, rehearsal_id, user_id, status, comment, responded_at, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
            )
                .bind(&attendee.id).bind(&attendee.rehearsal_id).bind(&attendee.user_id).bind(&attendee.status)
                .bind(&attendee.comment).bind(attendee.responded_at).bind(attendee.created_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Rehearsal>, AppError> {
        sqlx::query_as::<_, Rehearsal>("SELECT * FROM rehearsals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_for_user(&self, user_id: &str, filter: &RehearsalFilter) -> Result<Vec<Rehearsal>, AppError> {
        let query = r#"
            SELECT r.*
            FROM rehearsals r
            JOIN band_members bm ON bm.band_id = r.band_id
            WHERE bm.user_id = ?
            AND (? IS NULL OR r.band_id = ?)
            AND (? IS NULL OR r.start_time >= ?)
            AND (? IS NULL OR r.start_time < ?)
            AND (? IS NULL OR r.status = ?)
            ORDER BY r.start_time ASC
        "#;

        sqlx::query_as::<_, Rehearsal>(query)
            .bind(user_id)
            .bind(&filter.band_id).bind(&filter.band_id)
            .bind(filter.start).bind(filter.start)
            .bind(filter.end).bind(filter.end)
            .bind(&filter.status).bind(&filter.status)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, rehearsal: &Rehearsal) -> Result<Rehearsal, AppError> {
        sqlx::query_as::<_, Rehearsal>(
            "UPDATE rehearsals SET venue_id=?, title=?, description=?, start_time=?, end_time=?, status=?, reminder_sent=?, updated_at=?
             WHERE id=?
             RETURNING *"
        )
            .bind(&rehearsal.venue_id).bind(&rehearsal.title).bind(&rehearsal.description)
            .bind(rehearsal.start_time).bind(rehearsal.end_time).bind(&rehearsal.status)
            .bind(rehearsal.reminder_sent).bind(rehearsal.updated_at)
            .bind(&rehearsal.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM rehearsals WHERE id = ?")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Rehearsal not found".into()));
        }
        Ok(())
    }

    async fn list_attendees(&self, rehearsal_id: &str) -> Result<Vec<RehearsalAttendee>, AppError> {
        sqlx::query_as::<_, RehearsalAttendee>(
            "SELECT * FROM rehearsal_attendees WHERE rehearsal_id = ? ORDER BY created_at ASC"
        )
            .bind(rehearsal_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn upsert_attendance(&self, attendee: &RehearsalAttendee) -> Result<RehearsalAttendee, AppError> {
        sqlx::query_as::<_, RehearsalAttendee>(
            "INSERT INTO rehearsal_attendees (id, rehearsal_id, user_id, status, comment, responded_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (rehearsal_id, user_id) DO UPDATE SET status = excluded.status, comment = excluded.comment, responded_at = excluded.responded_at
             RETURNING *"
        )
            .bind(&attendee.id).bind(&attendee.rehearsal_id).bind(&attendee.user_id).bind(&attendee.status)
            .bind(&attendee.comment).bind(attendee.responded_at).bind(attendee.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_due_reminders(&self, now: DateTime<Utc>, horizon: DateTime<Utc>, limit: i64) -> Result<Vec<Rehearsal>, AppError> {
        sqlx::query_as::<_, Rehearsal>(
            "SELECT * FROM rehearsals
             WHERE status = ? AND reminder_sent = ? AND start_time > ? AND start_time <= ?
             ORDER BY start_time ASC
             LIMIT ?"
        )
            .bind(STATUS_SCHEDULED).bind(false).bind(now).bind(horizon).bind(limit)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn claim_reminder(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE rehearsals SET reminder_sent = ? WHERE id = ? AND reminder_sent = ?")
            .bind(true)
            .bind(id)
            .bind(false)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() == 1)
    }
}
