use chrono::Utc;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::service::{NewService, Service, ServicePrice, ServiceUpdate},
};

/// Catalog of contract-scoped prices
pub struct ServiceStore {
    pool: DbPool,
}

impl ServiceStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert one price row
    pub async fn create_service(&self, service: &NewService) -> Result<Service> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (name, price, contract_id, material_card_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&service.name)
        .bind(service.price)
        .bind(service.contract_id)
        .bind(service.material_card_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(created)
    }

    pub async fn get_all_services(&self) -> Result<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>("SELECT * FROM services ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(services)
    }

    pub async fn get_service_by_id(&self, id: i64) -> Result<Service> {
        let service = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found("Service"))?;

        Ok(service)
    }

    /// Price list of one contract
    pub async fn get_services_by_contract(&self, contract_id: i64) -> Result<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE contract_id = ? ORDER BY name, id",
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(services)
    }

    /// Every catalog row with the number of the contract it belongs to
    pub async fn get_all_prices(&self) -> Result<Vec<ServicePrice>> {
        let rows = sqlx::query_as::<_, ServicePrice>(
            r#"
            SELECT
                s.id AS service_id,
                s.name AS service_name,
                s.contract_id,
                c.number AS contract_name,
                s.price,
                s.material_card_id
            FROM services s
            JOIN contracts c ON c.id = s.contract_id
            ORDER BY s.contract_id, s.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Replace name, price and recipe of a row
    pub async fn update_service(&self, id: i64, update: &ServiceUpdate) -> Result<Service> {
        let updated = sqlx::query_as::<_, Service>(
            r#"
            UPDATE services
            SET name = ?, price = ?, material_card_id = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&update.name)
        .bind(update.price)
        .bind(update.material_card_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::not_found("Service"))?;

        Ok(updated)
    }

    pub async fn delete_service(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM services WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Service"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{contract_store::ContractStore, memory_pool},
        models::contract::{ClientType, NewContract},
    };

    #[tokio::test]
    async fn prices_are_listed_per_contract() {
        let pool = memory_pool().await.unwrap();
        let contracts = ContractStore::new(pool.clone());
        let store = ServiceStore::new(pool);

        let cash = contracts
            .create_contract(&NewContract::new("C-CASH", ClientType::Cash))
            .await
            .unwrap();
        let agg = contracts
            .create_contract(&NewContract::new("C-AGG", ClientType::Aggregator))
            .await
            .unwrap();
        for (contract_id, price) in [(cash.id, 700), (agg.id, 595)] {
            store
                .create_service(&NewService {
                    name: "Balancing".into(),
                    price,
                    contract_id,
                    material_card_id: None,
                })
                .await
                .unwrap();
        }

        let agg_prices = store.get_services_by_contract(agg.id).await.unwrap();
        assert_eq!(agg_prices.len(), 1);
        assert_eq!(agg_prices[0].price, 595);

        let all = store.get_all_prices().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].contract_name, "C-CASH");
    }

    #[tokio::test]
    async fn unknown_contract_is_refused_by_the_database() {
        let store = ServiceStore::new(memory_pool().await.unwrap());

        let result = store
            .create_service(&NewService {
                name: "Balancing".into(),
                price: 700,
                contract_id: 99,
                material_card_id: None,
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_row_are_not_found() {
        let store = ServiceStore::new(memory_pool().await.unwrap());
        let update = ServiceUpdate {
            name: "Balancing".into(),
            price: 1,
            material_card_id: None,
        };

        assert!(matches!(
            store.update_service(5, &update).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            store.delete_service(5).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
