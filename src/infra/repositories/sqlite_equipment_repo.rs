use crate::domain::{
    models::equipment::{AssignedEquipment, Equipment, EquipmentFilter, RehearsalEquipment},
    ports::EquipmentRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteEquipmentRepo {
    pool: SqlitePool,
}

impl SqliteEquipmentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EquipmentRepository for SqliteEquipmentRepo {
    async fn create(&self, equipment: &Equipment) -> Result<Equipment, AppError> {
        sqlx::query_as::<_, Equipment>(
            "INSERT INTO equipment (id, name, equipment_type, description, brand, model, serial_number, purchase_date, purchase_price, notes, band_id, user_id, is_backline, needs_power, weight_kg, dimensions, photos_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&equipment.id).bind(&equipment.name).bind(&equipment.equipment_type).bind(&equipment.description)
            .bind(&equipment.brand).bind(&equipment.model).bind(&equipment.serial_number).bind(equipment.purchase_date)
            .bind(equipment.purchase_price).bind(&equipment.notes).bind(&equipment.band_id).bind(&equipment.user_id)
            .bind(equipment.is_backline).bind(equipment.needs_power).bind(equipment.weight_kg).bind(&equipment.dimensions)
            .bind(&equipment.photos_json).bind(equipment.created_at).bind(equipment.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Equipment>, AppError> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_visible(&self, user_id: &str, filter: &EquipmentFilter) -> Result<Vec<Equipment>, AppError> {
        let query = r#"
            SELECT e.*
            FROM equipment e
            WHERE (e.user_id = ? OR e.band_id IN (SELECT band_id FROM band_members WHERE user_id = ?))
            AND (? IS NULL OR e.band_id = ?)
            AND (? IS NULL OR e.user_id = ?)
            AND (? IS NULL OR e.equipment_type = ?)
            AND (? IS NULL OR LOWER(e.name) LIKE ? OR LOWER(e.brand) LIKE ? OR LOWER(e.model) LIKE ?)
            ORDER BY e.name ASC
        "#;

        let pattern = filter.search.as_ref().map(|s| format!("%{}%", s.to_lowercase()));

        sqlx::query_as::<_, Equipment>(query)
            .bind(user_id).bind(user_id)
            .bind(&filter.band_id).bind(&filter.band_id)
            .bind(&filter.user_id).bind(&filter.user_id)
            .bind(&filter.equipment_type).bind(&filter.equipment_type)
            .bind(&pattern).bind(&pattern).bind(&pattern).bind(&pattern)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, equipment: &Equipment) -> Result<Equipment, AppError> {
        sqlx::query_as::<_, Equipment>(
            "UPDATE equipment SET name=?, equipment_type=?, description=?, brand=?, model=?, serial_number=?, purchase_date=?, purchase_price=?, notes=?, is_backline=?, needs_power=?, weight_kg=?, dimensions=?, photos_json=?, updated_at=?
             WHERE id=?
             RETURNING *"
        )
            .bind(&equipment.name).bind(&equipment.equipment_type).bind(&equipment.description).bind(&equipment.brand)
            .bind(&equipment.model).bind(&equipment.serial_number).bind(equipment.purchase_date).bind(equipment.purchase_price)
            .bind(&equipment.notes).bind(equipment.is_backline).bind(equipment.needs_power).bind(equipment.weight_kg)
            .bind(&equipment.dimensions).bind(&equipment.photos_json).bind(equipment.updated_at)
            .bind(&equipment.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = ?")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Equipment not found".into()));
        }
        Ok(())
    }

    async fn assign(&self, assignment: &RehearsalEquipment) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO rehearsal_equipment (id, rehearsal_id, equipment_id, notes, assigned_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (rehearsal_id, equipment_id) DO NOTHING"
        )
            .bind(&assignment.id).bind(&assignment.rehearsal_id).bind(&assignment.equipment_id)
            .bind(&assignment.notes).bind(&assignment.assigned_by).bind(assignment.created_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_for_rehearsal(&self, rehearsal_id: &str) -> Result<Vec<AssignedEquipment>, AppError> {
        sqlx::query_as::<_, AssignedEquipment>(
            "SELECT re.id AS assignment_id, e.id AS equipment_id, e.name, e.equipment_type, e.band_id, e.user_id,
                    e.needs_power, re.notes, re.assigned_by, re.created_at
             FROM rehearsal_equipment re
             JOIN equipment e ON e.id = re.equipment_id
             WHERE re.rehearsal_id = ?
             ORDER BY e.name ASC"
        )
            .bind(rehearsal_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn unassign(&self, rehearsal_id: &str, equipment_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM rehearsal_equipment WHERE rehearsal_id = ? AND equipment_id = ?")
            .bind(rehearsal_id)
            .bind(equipment_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Equipment is not assigned to this rehearsal".into()));
        }
        Ok(())
    }
}
