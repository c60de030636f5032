use crate::{
    db::{DbPool, inventory_store::InventoryStore},
    error::{AppError, Result},
    models::inventory::{
        Material, MaterialCard, MaterialCardInput, MaterialInput, MaterialQuantities, Storage,
    },
};

pub struct InventoryService {
    inventory: InventoryStore,
}

impl InventoryService {
    pub fn new(pool: DbPool) -> Self {
        Self {
            inventory: InventoryStore::new(pool),
        }
    }

    pub async fn create_material_card(&self, card: MaterialCardInput) -> Result<MaterialCard> {
        ensure_non_negative(&card.quantities, "material card")?;

        let created = self.inventory.create_material_card(&card).await?;
        tracing::info!(card_id = created.id, "material card created");

        Ok(created)
    }

    pub async fn get_all_material_cards(&self) -> Result<Vec<MaterialCard>> {
        self.inventory.get_all_material_cards().await
    }

    pub async fn update_material_card(
        &self,
        id: i64,
        card: MaterialCardInput,
    ) -> Result<MaterialCard> {
        ensure_non_negative(&card.quantities, "material card")?;

        let updated = self.inventory.update_material_card(id, &card).await?;
        tracing::info!(card_id = id, "material card updated");

        Ok(updated)
    }

    pub async fn delete_material_card(&self, id: i64) -> Result<()> {
        self.inventory.delete_material_card(id).await?;
        tracing::info!(card_id = id, "material card deleted");

        Ok(())
    }

    pub async fn get_storage(&self) -> Result<Storage> {
        self.inventory.get_storage().await
    }

    pub async fn add_delivery(&self, delivery: MaterialQuantities) -> Result<Storage> {
        ensure_non_negative(&delivery, "delivery")?;

        let storage = self.inventory.add_delivery(&delivery).await?;
        tracing::info!(?delivery, "delivery booked into storage");

        Ok(storage)
    }

    /// Consume the recipe of one performed service
    pub async fn spell_material(&self, card_id: i64) -> Result<Storage> {
        match self.inventory.spell_material(card_id).await {
            Ok(storage) => {
                tracing::info!(card_id, "material card consumed");
                Ok(storage)
            }
            Err(err) => {
                if let AppError::InsufficientInventory { material, available, required } = &err {
                    tracing::warn!(card_id, %material, available, required, "storage too low");
                }
                Err(err)
            }
        }
    }

    pub async fn create_material(&self, material: MaterialInput) -> Result<Material> {
        validate_material(&material)?;

        let created = self.inventory.create_material(&material).await?;
        tracing::info!(material_id = created.id, name = %created.name, "material created");

        Ok(created)
    }

    pub async fn get_all_materials(&self) -> Result<Vec<Material>> {
        self.inventory.get_all_materials().await
    }

    pub async fn get_material(&self, id: i64) -> Result<Material> {
        self.inventory.get_material_by_id(id).await
    }

    pub async fn update_material(&self, id: i64, material: MaterialInput) -> Result<Material> {
        validate_material(&material)?;

        let updated = self.inventory.update_material(id, &material).await?;
        tracing::info!(material_id = id, "material updated");

        Ok(updated)
    }

    pub async fn delete_material(&self, id: i64) -> Result<()> {
        self.inventory.delete_material(id).await?;
        tracing::info!(material_id = id, "material deleted");

        Ok(())
    }

    pub async fn add_quantity(&self, id: i64, quantity: i64) -> Result<Material> {
        ensure_positive(quantity)?;

        let material = self.inventory.add_quantity(id, quantity).await?;
        tracing::info!(material_id = id, quantity, on_hand = material.storage, "material added");

        Ok(material)
    }

    pub async fn subtract_quantity(&self, id: i64, quantity: i64) -> Result<Material> {
        ensure_positive(quantity)?;

        let material = self.inventory.subtract_quantity(id, quantity).await?;
        tracing::info!(material_id = id, quantity, on_hand = material.storage, "material taken");

        Ok(material)
    }
}

fn ensure_non_negative(quantities: &MaterialQuantities, what: &str) -> Result<()> {
    match quantities.first_negative() {
        Some(kind) => Err(AppError::validation(format!(
            "{what} quantity of {} must not be negative",
            kind.column()
        ))),
        None => Ok(()),
    }
}

fn ensure_positive(quantity: i64) -> Result<()> {
    if quantity <= 0 {
        return Err(AppError::validation("quantity must be positive"));
    }
    Ok(())
}

fn validate_material(material: &MaterialInput) -> Result<()> {
    if material.name.trim().is_empty() {
        return Err(AppError::validation("material name is required"));
    }
    if material.storage < 0 {
        return Err(AppError::validation("on-hand count must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    #[tokio::test]
    async fn negative_delivery_is_rejected() {
        let inventory = InventoryService::new(memory_pool().await.unwrap());

        let err = inventory
            .add_delivery(MaterialQuantities {
                r20: -1,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn spell_of_unknown_card_is_not_found() {
        let inventory = InventoryService::new(memory_pool().await.unwrap());
        assert!(matches!(
            inventory.spell_material(3).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected() {
        let inventory = InventoryService::new(memory_pool().await.unwrap());
        let valve = inventory
            .create_material(MaterialInput {
                name: "Valve".into(),
                type_ds: 0,
                storage: 1,
            })
            .await
            .unwrap();

        assert!(matches!(
            inventory.subtract_quantity(valve.id, 0).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            inventory.add_quantity(valve.id, -4).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
