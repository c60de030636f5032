use crate::{
    db::{
        DbPool, client_store::ClientStore, contract_store::ContractStore,
        service_store::ServiceStore,
    },
    error::{AppError, Result},
    models::{
        client::{
            Car, Client, ClientComparison, ClientInput, NewCar, VehicleImportReport,
            normalize_plate,
        },
        contract::ClientType,
    },
};

/// Clients, their vehicles and the prices each of them is billed at
pub struct ClientService {
    clients: ClientStore,
    contracts: ContractStore,
    services: ServiceStore,
}

impl ClientService {
    pub fn new(pool: DbPool) -> Self {
        Self {
            clients: ClientStore::new(pool.clone()),
            contracts: ContractStore::new(pool.clone()),
            services: ServiceStore::new(pool),
        }
    }

    pub async fn create_client(&self, input: ClientInput) -> Result<Client> {
        self.validate(&input).await?;

        let client = self.clients.create_client(&input).await?;
        tracing::info!(client_id = client.id, contract_id = client.contract_id, "client created");

        Ok(client)
    }

    pub async fn get_all_clients(&self) -> Result<Vec<Client>> {
        self.clients.get_all_clients().await
    }

    pub async fn get_client(&self, id: i64) -> Result<Client> {
        self.clients.get_client_by_id(id).await
    }

    pub async fn update_client(&self, id: i64, input: ClientInput) -> Result<Client> {
        self.validate(&input).await?;

        let client = self.clients.update_client(id, &input).await?;
        tracing::info!(client_id = id, "client updated");

        Ok(client)
    }

    pub async fn delete_client(&self, id: i64) -> Result<()> {
        self.clients.delete_client(id).await?;
        tracing::info!(client_id = id, "client deleted");

        Ok(())
    }

    pub async fn get_client_cars(&self, client_id: i64) -> Result<Vec<Car>> {
        self.clients.get_client_by_id(client_id).await?;
        self.clients.get_client_cars(client_id).await
    }

    /// Link a vehicle to a client, creating the vehicle on first sight
    pub async fn add_car_to_client(&self, client_id: i64, car: NewCar) -> Result<Car> {
        self.clients.get_client_by_id(client_id).await?;

        let car = normalized(car)?;
        let stored = self.clients.add_car_to_client(client_id, &car).await?;
        tracing::info!(client_id, car_id = stored.id, number = %stored.number, "vehicle linked");

        Ok(stored)
    }

    /// Link a batch of parsed vehicle rows. Rows already linked are skipped,
    /// invalid rows are reported back; database failures abort the import.
    pub async fn import_vehicles(
        &self,
        client_id: i64,
        cars: Vec<NewCar>,
    ) -> Result<VehicleImportReport> {
        self.clients.get_client_by_id(client_id).await?;

        let mut report = VehicleImportReport::default();
        for car in cars {
            let raw = car.number.clone();
            let car = match normalized(car) {
                Ok(car) => car,
                Err(_) => {
                    report.failed.push(raw);
                    continue;
                }
            };

            match self.clients.add_car_to_client(client_id, &car).await {
                Ok(_) => report.added += 1,
                Err(AppError::Conflict(_)) => report.skipped += 1,
                Err(err) => return Err(err),
            }
        }

        tracing::info!(
            client_id,
            added = report.added,
            skipped = report.skipped,
            failed = report.failed.len(),
            "vehicle import finished"
        );

        Ok(report)
    }

    pub async fn get_client_types(&self) -> Result<Vec<ClientType>> {
        self.clients.get_client_types().await
    }

    /// Every client a plate is linked to
    pub async fn whose_car(&self, number: &str) -> Result<Vec<Client>> {
        self.clients.get_clients_by_car(&normalize_plate(number)).await
    }

    /// What the vehicle would be billed under each of its clients
    pub async fn compare_clients_for_car(&self, number: &str) -> Result<Vec<ClientComparison>> {
        let clients = self.whose_car(number).await?;
        if clients.is_empty() {
            return Err(AppError::not_found(format!("Vehicle {}", normalize_plate(number))));
        }

        let mut comparison = Vec::with_capacity(clients.len());
        for client in clients {
            let services = self.services.get_services_by_contract(client.contract_id).await?;
            comparison.push(ClientComparison { client, services });
        }

        Ok(comparison)
    }

    async fn validate(&self, input: &ClientInput) -> Result<()> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation("client name is required"));
        }

        let contract = self.contracts.get_contract_by_id(input.contract_id).await?;
        if contract.client_type != input.client_type {
            tracing::warn!(
                contract_id = contract.id,
                contract_type = ?contract.client_type,
                client_type = ?input.client_type,
                "client type differs from its contract"
            );
        }

        Ok(())
    }
}

fn normalized(car: NewCar) -> Result<NewCar> {
    let number = normalize_plate(&car.number);
    if number.is_empty() {
        return Err(AppError::validation("vehicle number is required"));
    }
    if car.year < 0 {
        return Err(AppError::validation("vehicle year must not be negative"));
    }

    Ok(NewCar { number, ..car })
}
