use crate::domain::{
    models::rehearsal::{Rehearsal, RehearsalAttendee, RehearsalFilter, STATUS_SCHEDULED},
    ports::RehearsalRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresRehearsalRepo {
    pool: PgPool,
}

impl PostgresRehearsalRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RehearsalRepository for PostgresRehearsalRepo {
    async fn create(&self, rehearsal: &Rehearsal, attendees: &[RehearsalAttendee]) -> Result<Rehearsal, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, Rehearsal>(
            "INSERT INTO rehearsals (id, band_id, venue_id, title, description, start_time, end_time, status, created_by, reminder_sent, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING *"
        )
            .bind(&rehearsal.id).bind(&rehearsal.band_id).bind(&rehearsal.venue_id).bind(&rehearsal.title)
            .bind(&rehearsal.description).bind(rehearsal.start_time).bind(rehearsal.end_time).bind(&rehearsal.status)
            .bind(&rehearsal.created_by).bind(rehearsal.reminder_sent).bind(rehearsal.created_at).bind(rehearsal.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        for attendee in attendees {
            sqlx::query(
                "INSERT INTO rehearsal_attendees (id, rehearsal_id, user_id, status, comment, responded_at, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)"
            )
                .bind(&attendee.id).bind(&attendee.rehearsal_id).bind(&attendee.user_id).bind(&attendee.status)
                .bind(&attendee.comment).bind(attendee.responded_at).bind(attendee.created_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Rehearsal>, AppError> {
        sqlx::query_as::<_, Rehearsal>("SELECT * FROM rehearsals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_for_user(&self, user_id: &str, filter: &RehearsalFilter) -> Result<Vec<Rehearsal>, AppError> {
        let query = r#"
            SELECT r.*
            FROM rehearsals r
            JOIN band_members bm ON bm.band_id = r.band_id
            WHERE bm.user_id = $1
            AND ($2 IS NULL OR r.band_id = $3)
            AND ($4 IS NULL OR r.start_time >= $5)
            AND ($6 IS NULL OR r.start_time < $7)
            AND ($8 IS NULL OR r.status = $9)
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
            "UPDATE rehearsals SET venue_id=$1, title=$2, description=$3, start_time=$4, end_time=$5, status=$6, reminder_sent=$7, updated_at=$8
             WHERE id=$9
             RETURNING *"
        )
            .bind(&rehearsal.venue_id).bind(&rehearsal.title).bind(&rehearsal.description)
            .bind(rehearsal.start_time).bind(rehearsal.end_time).bind(&rehearsal.status)
            .bind(rehearsal.reminder_sent).bind(rehearsal.updated_at)
            .bind(&rehearsal.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM rehearsals WHERE id = $1")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Rehearsal not found".into()));
        }
        Ok(())
    }

    async fn list_attendees(&self, rehearsal_id: &str) -> Result<Vec<RehearsalAttendee>, AppError> {
        sqlx::query_as::<_, RehearsalAttendee>(
            "SELECT * FROM rehearsal_attendees WHERE rehearsal_id = $1 ORDER BY created_at ASC"
        )
            .bind(rehearsal_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn upsert_attendance(&self, attendee: &RehearsalAttendee) -> Result<RehearsalAttendee, AppError> {
        sqlx::query_as::<_, RehearsalAttendee>(
            "INSERT INTO rehearsal_attendees (id, rehearsal_id, user_id, status, comment, responded_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
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
             WHERE status = $1 AND reminder_sent = $2 AND start_time > $3 AND start_time <= $4
             ORDER BY start_time ASC
             LIMIT $5"
        )
            .bind(STATUS_SCHEDULED).bind(false).bind(now).bind(horizon).bind(limit)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn claim_reminder(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE rehearsals SET reminder_sent = $1 WHERE id = $2 AND reminder_sent = $3")
            .bind(true)
            .bind(id)
            .bind(false)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() == 1)
    }
}
