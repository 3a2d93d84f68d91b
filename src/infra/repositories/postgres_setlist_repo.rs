use crate::domain::{
    models::setlist::{Setlist, SetlistFilter, SetlistSong, SetlistSongDetail},
    ports::SetlistRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

pub struct PostgresSetlistRepo {
    pool: PgPool,
}

impl PostgresSetlistRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_ENTRY: &str =
    "INSERT INTO setlist_songs (id, setlist_id, song_id, position, duration_sec, notes, created_at, updated_at)
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
     RETURNING *";

#[async_trait]
impl SetlistRepository for PostgresSetlistRepo {
    async fn create(&self, setlist: &Setlist, songs: &[SetlistSong]) -> Result<Setlist, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, Setlist>(
            "INSERT INTO setlists (id, band_id, name, description, is_template, duration_min, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *"
        )
            .bind(&setlist.id).bind(&setlist.band_id).bind(&setlist.name).bind(&setlist.description)
            .bind(setlist.is_template).bind(setlist.duration_min).bind(&setlist.created_by)
            .bind(setlist.created_at).bind(setlist.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        for entry in songs {
            sqlx::query(INSERT_ENTRY)
                .bind(&entry.id).bind(&entry.setlist_id).bind(&entry.song_id).bind(entry.position)
                .bind(entry.duration_sec).bind(&entry.notes).bind(entry.created_at).bind(entry.updated_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Setlist>, AppError> {
        sqlx::query_as::<_, Setlist>("SELECT * FROM setlists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_for_user(&self, user_id: &str, filter: &SetlistFilter) -> Result<Vec<Setlist>, AppError> {
        let query = r#"
            SELECT sl.*
            FROM setlists sl
            JOIN band_members bm ON bm.band_id = sl.band_id
            WHERE bm.user_id = $1
            AND ($2 IS NULL OR sl.band_id = $3)
            AND ($4 IS NULL OR LOWER(sl.name) LIKE $5 OR LOWER(sl.description) LIKE $6)
            ORDER BY sl.updated_at DESC
        "#;

        let pattern = filter.search.as_ref().map(|s| format!("%{}%", s.to_lowercase()));

        sqlx::query_as::<_, Setlist>(query)
            .bind(user_id)
            .bind(&filter.band_id).bind(&filter.band_id)
            .bind(&pattern).bind(&pattern).bind(&pattern)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, setlist: &Setlist) -> Result<Setlist, AppError> {
        sqlx::query_as::<_, Setlist>(
            "UPDATE setlists SET name=$1, description=$2, is_template=$3, duration_min=$4, updated_at=$5
             WHERE id=$6
             RETURNING *"
        )
            .bind(&setlist.name).bind(&setlist.description).bind(setlist.is_template)
            .bind(setlist.duration_min).bind(setlist.updated_at)
            .bind(&setlist.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM setlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Setlist not found".into()));
        }
        Ok(())
    }

    async fn list_songs(&self, setlist_id: &str) -> Result<Vec<SetlistSongDetail>, AppError> {
        sqlx::query_as::<_, SetlistSongDetail>(
            "SELECT ss.id, ss.song_id, ss.position, ss.duration_sec, ss.notes,
                    s.title, s.artist, s.key_signature, s.bpm, s.duration_sec AS song_duration_sec
             FROM setlist_songs ss
             JOIN songs s ON s.id = ss.song_id
             WHERE ss.setlist_id = $1
             ORDER BY ss.position ASC"
        )
            .bind(setlist_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn add_song(&self, entry: &SetlistSong) -> Result<SetlistSong, AppError> {
        sqlx::query_as::<_, SetlistSong>(INSERT_ENTRY)
            .bind(&entry.id).bind(&entry.setlist_id).bind(&entry.song_id).bind(entry.position)
            .bind(entry.duration_sec).bind(&entry.notes).bind(entry.created_at).bind(entry.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn remove_song(&self, setlist_id: &str, song_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM setlist_songs WHERE setlist_id = $1 AND song_id = $2")
            .bind(setlist_id)
            .bind(song_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Song is not in this setlist".into()));
        }
        Ok(())
    }

    async fn reorder(&self, setlist_id: &str, order: &[(String, i32)]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let now = Utc::now();

        // Park every moved entry on a negative slot first so swaps never hit the unique index.
        for (i, (id, _)) in order.iter().enumerate() {
            let parked = -(i as i32) - 1;
            let result = sqlx::query("UPDATE setlist_songs SET position = $1 WHERE id = $2 AND setlist_id = $3")
                .bind(parked).bind(id).bind(setlist_id)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("Setlist entry {} not found", id)));
            }
        }

        for (id, position) in order {
            sqlx::query("UPDATE setlist_songs SET position = $1, updated_at = $2 WHERE id = $3 AND setlist_id = $4")
                .bind(position).bind(now).bind(id).bind(setlist_id)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}
