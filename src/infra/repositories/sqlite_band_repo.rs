use crate::domain::{
    models::band::{Band, BandMember, BandMemberDetail, ROLE_ADMIN},
    ports::BandRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

pub struct SqliteBandRepo {
    pool: SqlitePool,
}

impl SqliteBandRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const MEMBER_DETAIL_SELECT: &str =
    "SELECT bm.user_id, bm.band_id, bm.role, bm.instrument, bm.nickname, bm.joined_at,
            u.email, u.first_name, u.last_name, u.timezone
     FROM band_members bm
     JOIN users u ON u.id = bm.user_id";

#[async_trait]
impl BandRepository for SqliteBandRepo {
    async fn create(&self, band: &Band, founder: &BandMember) -> Result<Band, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, Band>(
            "INSERT INTO bands (id, name, description, genre, logo_url, website, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&band.id).bind(&band.name).bind(&band.description).bind(&band.genre)
            .bind(&band.logo_url).bind(&band.website).bind(&band.created_by)
            .bind(band.created_at).bind(band.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        sqlx::query(
            "INSERT INTO band_members (id, band_id, user_id, role, instrument, nickname, joined_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
            .bind(&founder.id).bind(&founder.band_id).bind(&founder.user_id).bind(&founder.role)
            .bind(&founder.instrument).bind(&founder.nickname).bind(founder.joined_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Band>, AppError> {
        sqlx::query_as::<_, Band>("SELECT * FROM bands WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Band>, AppError> {
        sqlx::query_as::<_, Band>(
            "SELECT b.* FROM bands b
             JOIN band_members bm ON bm.band_id = b.id
             WHERE bm.user_id = ?
             ORDER BY b.name ASC"
        )
            .bind(user_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, band: &Band) -> Result<Band, AppError> {
        sqlx::query_as::<_, Band>(
            "UPDATE bands SET name=?, description=?, genre=?, logo_url=?, website=?, updated_at=? WHERE id=? RETURNING *"
        )
            .bind(&band.name).bind(&band.description).bind(&band.genre)
            .bind(&band.logo_url).bind(&band.website).bind(band.updated_at)
            .bind(&band.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM bands WHERE id = ?")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Band not found".into()));
        }
        Ok(())
    }

    async fn add_member(&self, member: &BandMember) -> Result<BandMember, AppError> {
        sqlx::query_as::<_, BandMember>(
            "INSERT INTO band_members (id, band_id, user_id, role, instrument, nickname, joined_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&member.id).bind(&member.band_id).bind(&member.user_id).bind(&member.role)
            .bind(&member.instrument).bind(&member.nickname).bind(member.joined_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_member(&self, band_id: &str, user_id: &str) -> Result<Option<BandMember>, AppError> {
        sqlx::query_as::<_, BandMember>("SELECT * FROM band_members WHERE band_id = ? AND user_id = ?")
            .bind(band_id)
            .bind(user_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_members(&self, band_id: &str) -> Result<Vec<BandMemberDetail>, AppError> {
        sqlx::query_as::<_, BandMemberDetail>(
            &format!("{} WHERE bm.band_id = ? ORDER BY bm.joined_at ASC", MEMBER_DETAIL_SELECT)
        )
            .bind(band_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_member(&self, member: &BandMember) -> Result<BandMember, AppError> {
        sqlx::query_as::<_, BandMember>(
            "UPDATE band_members SET role=?, instrument=?, nickname=? WHERE band_id=? AND user_id=? RETURNING *"
        )
            .bind(&member.role).bind(&member.instrument).bind(&member.nickname)
            .bind(&member.band_id).bind(&member.user_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn remove_member(&self, band_id: &str, user_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM band_members WHERE band_id = ? AND user_id = ?")
            .bind(band_id)
            .bind(user_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".into()));
        }
        Ok(())
    }

    async fn count_admins(&self, band_id: &str) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM band_members WHERE band_id = ? AND role = ?")
            .bind(band_id)
            .bind(ROLE_ADMIN)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn list_band_ids_for_user(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT band_id FROM band_members WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        Ok(rows.iter().map(|r| r.get::<String, _>("band_id")).collect())
    }
}
