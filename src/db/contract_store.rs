use chrono::Utc;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::{
        contract::{Contract, NewContract},
        service::{ContractServiceInput, Service},
    },
};

/// Contracts are written once and never updated or deleted.
pub struct ContractStore {
    pool: DbPool,
}

impl ContractStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a contract; a taken number is a conflict
    pub async fn create_contract(&self, contract: &NewContract) -> Result<Contract> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Contract>(
            r#"
            INSERT INTO contracts (
                number, description,
                client_company_name, client_company_address, client_company_phone,
                client_company_email, client_company_inn, client_company_kpp,
                client_company_ogrn, client_type, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&contract.number)
        .bind(&contract.description)
        .bind(&contract.client_company_name)
        .bind(&contract.client_company_address)
        .bind(&contract.client_company_phone)
        .bind(&contract.client_company_email)
        .bind(&contract.client_company_inn)
        .bind(&contract.client_company_kpp)
        .bind(&contract.client_company_ogrn)
        .bind(contract.client_type)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::unique_or_database(e, format!("contract number {} already exists", contract.number))
        })?;

        Ok(created)
    }

    pub async fn get_all_contracts(&self) -> Result<Vec<Contract>> {
        let contracts = sqlx::query_as::<_, Contract>("SELECT * FROM contracts ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(contracts)
    }

    pub async fn get_contract_by_id(&self, id: i64) -> Result<Contract> {
        let contract = sqlx::query_as::<_, Contract>("SELECT * FROM contracts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found("Contract"))?;

        Ok(contract)
    }

    /// Insert a batch of price rows for one contract, all or nothing
    pub async fn add_services(
        &self,
        contract_id: i64,
        services: &[ContractServiceInput],
    ) -> Result<Vec<Service>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM contracts WHERE id = ?")
            .bind(contract_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if exists.is_none() {
            return Err(AppError::not_found("Contract"));
        }

        let mut created = Vec::with_capacity(services.len());
        for service in services {
            let row = sqlx::query_as::<_, Service>(
                r#"
                INSERT INTO services (name, price, contract_id, material_card_id, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                RETURNING *
                "#,
            )
            .bind(&service.name)
            .bind(service.price)
            .bind(contract_id)
            .bind(service.material_card_id)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;
            created.push(row);
        }

        tx.commit().await.map_err(AppError::Database)?;

        Ok(created)
    }
}
