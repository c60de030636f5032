use chrono::Utc;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::inventory::{
        Material, MaterialCard, MaterialCardInput, MaterialInput, MaterialKind, MaterialQuantities,
        Storage,
    },
};

/// Material cards, the single storage row and named materials
pub struct InventoryStore {
    pool: DbPool,
}

fn column_list() -> String {
    MaterialKind::ALL.map(MaterialKind::column).join(", ")
}

/// `col <op> ?` for every material column, joined with `sep`
fn per_column(template: &str, sep: &str) -> String {
    MaterialKind::ALL
        .map(|kind| template.replace("{col}", kind.column()))
        .join(sep)
}

impl InventoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create_material_card(&self, card: &MaterialCardInput) -> Result<MaterialCard> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO material_cards (name, {}, created_at, updated_at) VALUES (?, {}, ?, ?) RETURNING *",
            column_list(),
            ["?"; 10].join(", ")
        );

        let mut query = sqlx::query_as::<_, MaterialCard>(&sql).bind(&card.name);
        for value in card.quantities.values() {
            query = query.bind(value);
        }
        let created = query
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(created)
    }

    pub async fn get_all_material_cards(&self) -> Result<Vec<MaterialCard>> {
        let cards = sqlx::query_as::<_, MaterialCard>("SELECT * FROM material_cards ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(cards)
    }

    pub async fn get_material_card_by_id(&self, id: i64) -> Result<MaterialCard> {
        let card = sqlx::query_as::<_, MaterialCard>("SELECT * FROM material_cards WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found("Material card"))?;

        Ok(card)
    }

    pub async fn update_material_card(
        &self,
        id: i64,
        card: &MaterialCardInput,
    ) -> Result<MaterialCard> {
        let sql = format!(
            "UPDATE material_cards SET name = ?, {}, updated_at = ? WHERE id = ? RETURNING *",
            per_column("{col} = ?", ", ")
        );

        let mut query = sqlx::query_as::<_, MaterialCard>(&sql).bind(&card.name);
        for value in card.quantities.values() {
            query = query.bind(value);
        }
        let updated = query
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found("Material card"))?;

        Ok(updated)
    }

    /// Delete a recipe; services using it lose their card reference
    pub async fn delete_material_card(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM material_cards WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Material card"));
        }

        Ok(())
    }

    pub async fn get_storage(&self) -> Result<Storage> {
        let storage = sqlx::query_as::<_, Storage>("SELECT * FROM storage WHERE id = 1")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(storage)
    }

    /// Add delivered amounts on top of the current stock
    pub async fn add_delivery(&self, delivery: &MaterialQuantities) -> Result<Storage> {
        let sql = format!(
            "UPDATE storage SET {}, updated_at = ? WHERE id = 1",
            per_column("{col} = {col} + ?", ", ")
        );

        let mut query = sqlx::query(&sql);
        for value in delivery.values() {
            query = query.bind(value);
        }
        query
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        self.get_storage().await
    }

    /// Consume one recipe from storage in a single guarded update.
    /// On shortage nothing is written.
    pub async fn spell_material(&self, card_id: i64) -> Result<Storage> {
        let card = self.get_material_card_by_id(card_id).await?;
        let recipe = card.quantities;

        let sql = format!(
            "UPDATE storage SET {}, updated_at = ? WHERE id = 1 AND {}",
            per_column("{col} = {col} - ?", ", "),
            per_column("{col} >= ?", " AND ")
        );

        let mut query = sqlx::query(&sql);
        for value in recipe.values() {
            query = query.bind(value);
        }
        query = query.bind(Utc::now());
        for value in recipe.values() {
            query = query.bind(value);
        }
        let result = query
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            let storage = self.get_storage().await?;
            return Err(match storage.quantities.first_shortage(&recipe) {
                Some(kind) => AppError::InsufficientInventory {
                    material: kind.column().to_string(),
                    available: storage.quantities.get(kind),
                    required: recipe.get(kind),
                },
                None => AppError::Conflict("storage changed concurrently".into()),
            });
        }

        self.get_storage().await
    }

    pub async fn create_material(&self, material: &MaterialInput) -> Result<Material> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (name, type_ds, storage, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&material.name)
        .bind(material.type_ds)
        .bind(material.storage)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::unique_or_database(
                e,
                format!("material {} of type {} already exists", material.name, material.type_ds),
            )
        })?;

        Ok(created)
    }

    pub async fn get_all_materials(&self) -> Result<Vec<Material>> {
        let materials = sqlx::query_as::<_, Material>("SELECT * FROM materials ORDER BY name, type_ds")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(materials)
    }

    pub async fn get_material_by_id(&self, id: i64) -> Result<Material> {
        let material = sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found("Material"))?;

        Ok(material)
    }

    pub async fn update_material(&self, id: i64, material: &MaterialInput) -> Result<Material> {
        let updated = sqlx::query_as::<_, Material>(
            r#"
            UPDATE materials
            SET name = ?, type_ds = ?, storage = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&material.name)
        .bind(material.type_ds)
        .bind(material.storage)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::unique_or_database(
                e,
                format!("material {} of type {} already exists", material.name, material.type_ds),
            )
        })?
        .ok_or_else(|| AppError::not_found("Material"))?;

        Ok(updated)
    }

    pub async fn delete_material(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM materials WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Material"));
        }

        Ok(())
    }

    pub async fn add_quantity(&self, id: i64, quantity: i64) -> Result<Material> {
        let updated = sqlx::query_as::<_, Material>(
            "UPDATE materials SET storage = storage + ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::not_found("Material"))?;

        Ok(updated)
    }

    /// Take `quantity` off the on-hand count; refused if it would go negative
    pub async fn subtract_quantity(&self, id: i64, quantity: i64) -> Result<Material> {
        let updated = sqlx::query_as::<_, Material>(
            r#"
            UPDATE materials SET storage = storage - ?, updated_at = ?
            WHERE id = ? AND storage >= ?
            RETURNING *
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        match updated {
            Some(material) => Ok(material),
            None => {
                let material = self.get_material_by_id(id).await?;
                Err(AppError::InsufficientInventory {
                    material: material.name,
                    available: material.storage,
                    required: quantity,
                })
            }
        }
    }
}
