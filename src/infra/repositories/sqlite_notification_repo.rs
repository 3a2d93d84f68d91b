use crate::domain::{
    models::notification::{Notification, NotificationFilter},
    ports::NotificationRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

pub struct SqliteNotificationRepo {
    pool: SqlitePool,
}

impl SqliteNotificationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepo {
    async fn create_many(&self, notifications: &[Notification]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        for n in notifications {
            sqlx::query(
                "INSERT INTO notifications (id, user_id, notification_type, title, message, data_json, is_read, read_at, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
            )
                .bind(&n.id).bind(&n.user_id).bind(&n.notification_type).bind(&n.title)
                .bind(&n.message).bind(&n.data_json).bind(n.is_read).bind(n.read_at).bind(n.created_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<Notification>, AppError> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_for_user(&self, user_id: &str, filter: &NotificationFilter) -> Result<Vec<Notification>, AppError> {
        let query = r#"
            SELECT * FROM notifications
            WHERE user_id = ?
            AND (? IS NULL OR is_read = ?)
            AND (? IS NULL OR notification_type = ?)
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
        "#;

        let read_state = filter.unread_only.then_some(false);

        sqlx::query_as::<_, Notification>(query)
            .bind(user_id)
            .bind(read_state).bind(read_state)
            .bind(&filter.notification_type).bind(&filter.notification_type)
            .bind(filter.limit).bind(filter.offset)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn count_unread(&self, user_id: &str) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM notifications WHERE user_id = ? AND is_read = ?")
            .bind(user_id)
            .bind(false)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn mark_read(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE notifications SET is_read = ?, read_at = COALESCE(read_at, ?) WHERE id = ? AND user_id = ?")
            .bind(true).bind(Utc::now())
            .bind(id).bind(user_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification not found".into()));
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE notifications SET is_read = ?, read_at = ? WHERE user_id = ? AND is_read = ?")
            .bind(true).bind(Utc::now())
            .bind(user_id).bind(false)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id).bind(user_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification not found".into()));
        }
        Ok(())
    }

    async fn delete_all(&self, user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
