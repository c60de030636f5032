use crate::{
    db::{
        DbPool, contract_store::ContractStore, inventory_store::InventoryStore,
        service_store::ServiceStore,
    },
    error::{AppError, Result},
    models::{
        contract::{Contract, NewContract},
        service::{
            ContractServiceInput, NewService, Service, ServiceFamily, ServiceUpdate,
            group_into_families,
        },
    },
};

/// Contracts and the prices signed under them
pub struct CatalogService {
    contracts: ContractStore,
    services: ServiceStore,
    inventory: InventoryStore,
}

impl CatalogService {
    pub fn new(pool: DbPool) -> Self {
        Self {
            contracts: ContractStore::new(pool.clone()),
            services: ServiceStore::new(pool.clone()),
            inventory: InventoryStore::new(pool),
        }
    }

    pub async fn create_contract(&self, contract: NewContract) -> Result<Contract> {
        if contract.number.trim().is_empty() {
            return Err(AppError::validation("contract number is required"));
        }

        let created = self.contracts.create_contract(&contract).await?;
        tracing::info!(contract_id = created.id, number = %created.number, "contract created");

        Ok(created)
    }

    pub async fn get_all_contracts(&self) -> Result<Vec<Contract>> {
        self.contracts.get_all_contracts().await
    }

    pub async fn get_contract(&self, id: i64) -> Result<Contract> {
        self.contracts.get_contract_by_id(id).await
    }

    /// Fill a contract's price list in one go
    pub async fn add_services_to_contract(
        &self,
        contract_id: i64,
        services: Vec<ContractServiceInput>,
    ) -> Result<Vec<Service>> {
        if services.is_empty() {
            return Err(AppError::validation("at least one service is required"));
        }
        for service in &services {
            validate_price_row(&service.name, service.price)?;
            self.ensure_material_card(service.material_card_id).await?;
        }

        let created = self.contracts.add_services(contract_id, &services).await?;
        tracing::info!(contract_id, count = created.len(), "services added to contract");

        Ok(created)
    }

    pub async fn create_service(&self, service: NewService) -> Result<Service> {
        validate_price_row(&service.name, service.price)?;
        // Surfaces a missing contract as NotFound rather than a key violation
        self.contracts.get_contract_by_id(service.contract_id).await?;
        self.ensure_material_card(service.material_card_id).await?;

        let created = self.services.create_service(&service).await?;
        tracing::info!(
            service_id = created.id,
            contract_id = created.contract_id,
            price = created.price,
            "service created"
        );

        Ok(created)
    }

    pub async fn get_all_services(&self) -> Result<Vec<Service>> {
        self.services.get_all_services().await
    }

    /// Price list of one contract
    pub async fn get_service_prices_by_contract(&self, contract_id: i64) -> Result<Vec<Service>> {
        self.contracts.get_contract_by_id(contract_id).await?;
        self.services.get_services_by_contract(contract_id).await
    }

    /// Catalog grouped into service families across contracts
    pub async fn get_all_with_prices(&self) -> Result<Vec<ServiceFamily>> {
        let rows = self.services.get_all_prices().await?;
        tracing::debug!(rows = rows.len(), "grouping catalog into families");

        Ok(group_into_families(rows))
    }

    pub async fn update_service(&self, id: i64, update: ServiceUpdate) -> Result<Service> {
        validate_price_row(&update.name, update.price)?;
        self.ensure_material_card(update.material_card_id).await?;

        let updated = self.services.update_service(id, &update).await?;
        tracing::info!(service_id = id, price = updated.price, "service updated");

        Ok(updated)
    }

    pub async fn delete_service(&self, id: i64) -> Result<()> {
        self.services.delete_service(id).await?;
        tracing::info!(service_id = id, "service deleted");

        Ok(())
    }

    async fn ensure_material_card(&self, card_id: Option<i64>) -> Result<()> {
        if let Some(id) = card_id {
            self.inventory.get_material_card_by_id(id).await?;
        }
        Ok(())
    }
}

fn validate_price_row(name: &str, price: i64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("service name is required"));
    }
    if price < 0 {
        return Err(AppError::validation("service price must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory_pool, models::contract::ClientType};

    fn balancing(contract_id: i64, price: i64) -> NewService {
        NewService {
            name: "Balancing".into(),
            price,
            contract_id,
            material_card_id: None,
        }
    }

    #[tokio::test]
    async fn same_service_under_two_contracts_forms_one_family() {
        let catalog = CatalogService::new(memory_pool().await.unwrap());
        let cash = catalog
            .create_contract(NewContract::new("C-CASH", ClientType::Cash))
            .await
            .unwrap();
        let agg = catalog
            .create_contract(NewContract::new("C-AGG", ClientType::Aggregator))
            .await
            .unwrap();
        catalog.create_service(balancing(cash.id, 700)).await.unwrap();
        catalog.create_service(balancing(agg.id, 595)).await.unwrap();

        let families = catalog.get_all_with_prices().await.unwrap();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].name, "Balancing");
        let prices: Vec<_> = families[0]
            .variants
            .iter()
            .map(|v| (v.price, v.contract_name.as_str()))
            .collect();
        assert_eq!(prices, vec![(700, "C-CASH"), (595, "C-AGG")]);
    }

    #[tokio::test]
    async fn negative_price_is_rejected() {
        let catalog = CatalogService::new(memory_pool().await.unwrap());
        let cash = catalog
            .create_contract(NewContract::new("C-CASH", ClientType::Cash))
            .await
            .unwrap();

        let err = catalog.create_service(balancing(cash.id, -5)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn service_needs_existing_contract_and_card() {
        let catalog = CatalogService::new(memory_pool().await.unwrap());

        let err = catalog.create_service(balancing(3, 100)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "Contract"));

        let cash = catalog
            .create_contract(NewContract::new("C-CASH", ClientType::Cash))
            .await
            .unwrap();
        let mut with_card = balancing(cash.id, 100);
        with_card.material_card_id = Some(8);
        let err = catalog.create_service(with_card).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "Material card"));
    }

    #[tokio::test]
    async fn empty_contract_number_is_rejected() {
        let catalog = CatalogService::new(memory_pool().await.unwrap());

        let err = catalog
            .create_contract(NewContract::new("  ", ClientType::Cash))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
