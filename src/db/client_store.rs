use chrono::Utc;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::{
        client::{Car, Client, ClientInput, ClientRow, NewCar},
        contract::ClientType,
    },
};

const CLIENT_SELECT: &str = r#"
    SELECT
        c.id, c.name, c.client_type, c.owner_phone, c.manager_phone, c.contract_id,
        group_concat(cars.number) AS car_numbers,
        c.created_at, c.updated_at
    FROM clients c
    LEFT JOIN clients_cars cc ON cc.client_id = c.id
    LEFT JOIN cars ON cars.id = cc.car_id
"#;

/// Clients and the vehicles linked to them
pub struct ClientStore {
    pool: DbPool,
}

impl ClientStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create_client(&self, client: &ClientInput) -> Result<Client> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO clients (name, client_type, owner_phone, manager_phone, contract_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&client.name)
        .bind(client.client_type)
        .bind(&client.owner_phone)
        .bind(&client.manager_phone)
        .bind(client.contract_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        self.get_client_by_id(id).await
    }

    /// All clients, each with its plate numbers
    pub async fn get_all_clients(&self) -> Result<Vec<Client>> {
        let rows = sqlx::query_as::<_, ClientRow>(&format!(
            "{CLIENT_SELECT} GROUP BY c.id ORDER BY c.id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(Client::from).collect())
    }

    pub async fn get_client_by_id(&self, id: i64) -> Result<Client> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "{CLIENT_SELECT} WHERE c.id = ? GROUP BY c.id"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::not_found("Client"))?;

        Ok(row.into())
    }

    pub async fn update_client(&self, id: i64, client: &ClientInput) -> Result<Client> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET name = ?, client_type = ?, owner_phone = ?, manager_phone = ?, contract_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&client.name)
        .bind(client.client_type)
        .bind(&client.owner_phone)
        .bind(&client.manager_phone)
        .bind(client.contract_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Client"));
        }

        self.get_client_by_id(id).await
    }

    /// Delete a client; its vehicle links go with it, the vehicles stay
    pub async fn delete_client(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::referenced_or_database(e, "Client"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Client"));
        }

        Ok(())
    }

    pub async fn get_client_cars(&self, client_id: i64) -> Result<Vec<Car>> {
        let cars = sqlx::query_as::<_, Car>(
            r#"
            SELECT cars.*
            FROM cars
            JOIN clients_cars cc ON cc.car_id = cars.id
            WHERE cc.client_id = ?
            ORDER BY cars.number
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(cars)
    }

    /// Find the vehicle by plate or create it, then link it to the client.
    /// The plate must already be normalized.
    pub async fn add_car_to_client(&self, client_id: i64, car: &NewCar) -> Result<Car> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query(
            r#"
            INSERT INTO cars (number, model, year, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (number) DO NOTHING
            "#,
        )
        .bind(&car.number)
        .bind(&car.model)
        .bind(car.year)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let stored = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE number = ?")
            .bind(&car.number)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query("INSERT INTO clients_cars (client_id, car_id) VALUES (?, ?)")
            .bind(client_id)
            .bind(stored.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::unique_or_database(
                    e,
                    format!("vehicle {} is already linked to this client", car.number),
                )
            })?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(stored)
    }

    /// Client-type tags present on clients or contracts
    pub async fn get_client_types(&self) -> Result<Vec<ClientType>> {
        let types = sqlx::query_scalar::<_, ClientType>(
            r#"
            SELECT client_type FROM clients
            UNION
            SELECT client_type FROM contracts
            ORDER BY 1
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(types)
    }

    /// Clients linked to a plate number
    pub async fn get_clients_by_car(&self, number: &str) -> Result<Vec<Client>> {
        let rows = sqlx::query_as::<_, ClientRow>(&format!(
            r#"{CLIENT_SELECT}
            WHERE c.id IN (
                SELECT cc2.client_id
                FROM clients_cars cc2
                JOIN cars car2 ON car2.id = cc2.car_id
                WHERE car2.number = ?
            )
            GROUP BY c.id
            ORDER BY c.id"#
        ))
        .bind(number)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(Client::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{contract_store::ContractStore, memory_pool},
        models::contract::NewContract,
    };

    async fn setup() -> (ClientStore, i64) {
        let pool = memory_pool().await.unwrap();
        let contract = ContractStore::new(pool.clone())
            .create_contract(&NewContract::new("C-AGG", ClientType::Aggregator))
            .await
            .unwrap();
        (ClientStore::new(pool), contract.id)
    }

    fn client(name: &str, contract_id: i64) -> ClientInput {
        ClientInput {
            name: name.into(),
            client_type: ClientType::Aggregator,
            owner_phone: String::new(),
            manager_phone: String::new(),
            contract_id,
        }
    }

    #[tokio::test]
    async fn shared_vehicle_links_to_two_clients_once() {
        let (store, contract_id) = setup().await;
        let yandex = store.create_client(&client("Yandex", contract_id)).await.unwrap();
        let uber = store.create_client(&client("Uber", contract_id)).await.unwrap();
        let car = NewCar::new("A123BC77", "Kia Rio", 2021);

        let first = store.add_car_to_client(yandex.id, &car).await.unwrap();
        let second = store.add_car_to_client(uber.id, &car).await.unwrap();
        assert_eq!(first.id, second.id);

        let cars: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cars")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(cars, 1);

        let owners = store.get_clients_by_car("A123BC77").await.unwrap();
        assert_eq!(owners.len(), 2);
    }

    #[tokio::test]
    async fn linking_same_vehicle_twice_is_a_conflict() {
        let (store, contract_id) = setup().await;
        let yandex = store.create_client(&client("Yandex", contract_id)).await.unwrap();
        let car = NewCar::new("A123BC77", "Kia Rio", 2021);

        store.add_car_to_client(yandex.id, &car).await.unwrap();
        let err = store.add_car_to_client(yandex.id, &car).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.get_client_cars(yandex.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_client_keeps_the_vehicle() {
        let (store, contract_id) = setup().await;
        let yandex = store.create_client(&client("Yandex", contract_id)).await.unwrap();
        store
            .add_car_to_client(yandex.id, &NewCar::new("A123BC77", "", 0))
            .await
            .unwrap();

        store.delete_client(yandex.id).await.unwrap();

        assert!(store.get_clients_by_car("A123BC77").await.unwrap().is_empty());
        let cars: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cars")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(cars, 1);
    }

    #[tokio::test]
    async fn client_lists_its_plates() {
        let (store, contract_id) = setup().await;
        let yandex = store.create_client(&client("Yandex", contract_id)).await.unwrap();
        store
            .add_car_to_client(yandex.id, &NewCar::new("B222BB77", "", 0))
            .await
            .unwrap();
        store
            .add_car_to_client(yandex.id, &NewCar::new("A111AA77", "", 0))
            .await
            .unwrap();

        let all = store.get_all_clients().await.unwrap();
        assert_eq!(all[0].car_numbers, vec!["A111AA77", "B222BB77"]);
        assert_eq!(
            store.get_client_types().await.unwrap(),
            vec![ClientType::Aggregator]
        );
    }
}
