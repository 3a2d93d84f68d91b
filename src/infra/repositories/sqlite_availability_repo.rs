use crate::domain::{
    models::availability::{AvailabilityException, RecurringAvailability, UserAvailability},
    ports::AvailabilityRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

pub struct SqliteAvailabilityRepo {
    pool: SqlitePool,
}

impl SqliteAvailabilityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Starts `{select} WHERE user_id IN (...)` with one bind per id.
fn user_id_filter<'a>(select: &str, user_ids: &'a [String]) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::<Sqlite>::new(select);
    qb.push(" WHERE user_id IN (");
    let mut ids = qb.separated(", ");
    for id in user_ids {
        ids.push_bind(id.as_str());
    }
    ids.push_unseparated(")");
    qb
}

#[async_trait]
impl AvailabilityRepository for SqliteAvailabilityRepo {
    async fn list_intervals(&self, user_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<UserAvailability>, AppError> {
        sqlx::query_as::<_, UserAvailability>(
            "SELECT * FROM user_availability WHERE user_id = ? AND start_time < ? AND end_time > ? ORDER BY start_time ASC"
        )
            .bind(user_id).bind(end).bind(start)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn replace_intervals(&self, user_id: &str, start: DateTime<Utc>, end: DateTime<Utc>, intervals: &[UserAvailability]) -> Result<Vec<UserAvailability>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query("DELETE FROM user_availability WHERE user_id = ? AND start_time < ? AND end_time > ?")
            .bind(user_id).bind(end).bind(start)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        let mut created = Vec::with_capacity(intervals.len());
        for interval in intervals {
            let row = sqlx::query_as::<_, UserAvailability>(
                "INSERT INTO user_availability (id, user_id, start_time, end_time, is_available, priority, notes, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                 RETURNING *"
            )
                .bind(&interval.id).bind(&interval.user_id).bind(interval.start_time).bind(interval.end_time)
                .bind(interval.is_available).bind(interval.priority).bind(&interval.notes).bind(interval.created_at)
                .fetch_one(&mut *tx).await.map_err(AppError::Database)?;
            created.push(row);
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn create_recurring(&self, rule: &RecurringAvailability) -> Result<RecurringAvailability, AppError> {
        sqlx::query_as::<_, RecurringAvailability>(
            "INSERT INTO recurring_availability (id, user_id, day_of_week, start_time, end_time, is_available, priority, notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&rule.id).bind(&rule.user_id).bind(rule.day_of_week).bind(rule.start_time).bind(rule.end_time)
            .bind(rule.is_available).bind(rule.priority).bind(&rule.notes).bind(rule.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_recurring(&self, user_id: &str) -> Result<Vec<RecurringAvailability>, AppError> {
        sqlx::query_as::<_, RecurringAvailability>(
            "SELECT * FROM recurring_availability WHERE user_id = ? ORDER BY day_of_week ASC, start_time ASC"
        )
            .bind(user_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete_recurring(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM recurring_availability WHERE id = ? AND user_id = ?")
            .bind(id).bind(user_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Recurring availability not found".into()));
        }
        Ok(())
    }

    async fn upsert_exception(&self, exception: &AvailabilityException) -> Result<AvailabilityException, AppError> {
        sqlx::query_as::<_, AvailabilityException>(
            "INSERT INTO availability_exceptions (id, user_id, exception_date, is_available, reason, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id, exception_date) DO UPDATE SET is_available = excluded.is_available, reason = excluded.reason
             RETURNING *"
        )
            .bind(&exception.id).bind(&exception.user_id).bind(exception.exception_date)
            .bind(exception.is_available).bind(&exception.reason).bind(exception.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_exceptions(&self, user_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<AvailabilityException>, AppError> {
        sqlx::query_as::<_, AvailabilityException>(
            "SELECT * FROM availability_exceptions WHERE user_id = ? AND exception_date >= ? AND exception_date <= ? ORDER BY exception_date ASC"
        )
            .bind(user_id).bind(start).bind(end)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete_exception(&self, user_id: &str, date: NaiveDate) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM availability_exceptions WHERE user_id = ? AND exception_date = ?")
            .bind(user_id).bind(date)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Exception not found".into()));
        }
        Ok(())
    }

    async fn fetch_recurring_rules(&self, user_ids: &[String]) -> Result<Vec<RecurringAvailability>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = user_id_filter("SELECT * FROM recurring_availability", user_ids);
        qb.push(" ORDER BY user_id, day_of_week, start_time");
        qb.build_query_as::<RecurringAvailability>()
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn fetch_explicit_intervals(&self, user_ids: &[String], start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<UserAvailability>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = user_id_filter("SELECT * FROM user_availability", user_ids);
        qb.push(" AND start_time < ").push_bind(end);
        qb.push(" AND end_time > ").push_bind(start);
        qb.push(" ORDER BY user_id, created_at");
        qb.build_query_as::<UserAvailability>()
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn fetch_exceptions(&self, user_ids: &[String], start: NaiveDate, end: NaiveDate) -> Result<Vec<AvailabilityException>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = user_id_filter("SELECT * FROM availability_exceptions", user_ids);
        qb.push(" AND exception_date >= ").push_bind(start);
        qb.push(" AND exception_date <= ").push_bind(end);
        qb.push(" ORDER BY user_id, exception_date");
        qb.build_query_as::<AvailabilityException>()
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
