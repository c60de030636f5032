use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{contract::ClientType, service::Service};

/// Client with the plate numbers linked to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub client_type: ClientType,
    pub owner_phone: String,
    pub manager_phone: String,
    pub contract_id: i64,
    pub car_numbers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of a client with its plates aggregated by `group_concat`
#[derive(Debug, FromRow)]
pub struct ClientRow {
    pub id: i64,
    pub name: String,
    pub client_type: ClientType,
    pub owner_phone: String,
    pub manager_phone: String,
    pub contract_id: i64,
    pub car_numbers: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        let mut car_numbers: Vec<String> = row
            .car_numbers
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
        car_numbers.sort();

        Self {
            id: row.id,
            name: row.name,
            client_type: row.client_type,
            owner_phone: row.owner_phone,
            manager_phone: row.manager_phone,
            contract_id: row.contract_id,
            car_numbers,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Create and update payload of a client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInput {
    pub name: String,
    pub client_type: ClientType,
    #[serde(default)]
    pub owner_phone: String,
    #[serde(default)]
    pub manager_phone: String,
    pub contract_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Car {
    pub id: i64,
    pub number: String,
    pub model: String,
    pub year: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCar {
    pub number: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub year: i64,
}

impl NewCar {
    pub fn new(number: impl Into<String>, model: impl Into<String>, year: i64) -> Self {
        Self {
            number: number.into(),
            model: model.into(),
            year,
        }
    }
}

/// Plates are stored trimmed and upper-cased.
pub fn normalize_plate(number: &str) -> String {
    number.trim().to_uppercase()
}

/// Outcome of a bulk vehicle import
#[derive(Debug, Default, Serialize)]
pub struct VehicleImportReport {
    pub added: usize,
    pub skipped: usize,
    pub failed: Vec<String>,
}

/// What the same vehicle would be billed under one of its linked clients
#[derive(Debug, Serialize)]
pub struct ClientComparison {
    pub client: Client,
    pub services: Vec<Service>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plates_are_trimmed_and_upper_cased() {
        assert_eq!(normalize_plate("  a123bc77 "), "A123BC77");
    }

    #[test]
    fn aggregated_plates_split_into_sorted_list() {
        let now = Utc::now();
        let client = Client::from(ClientRow {
            id: 1,
            name: "Yandex Go".into(),
            client_type: ClientType::Aggregator,
            owner_phone: String::new(),
            manager_phone: String::new(),
            contract_id: 1,
            car_numbers: Some("B222BB77,A111AA77".into()),
            created_at: now,
            updated_at: now,
        });
        assert_eq!(client.car_numbers, vec!["A111AA77", "B222BB77"]);
    }

    #[test]
    fn client_without_cars_has_empty_list() {
        let now = Utc::now();
        let client = Client::from(ClientRow {
            id: 1,
            name: "Walk-in".into(),
            client_type: ClientType::Cash,
            owner_phone: String::new(),
            manager_phone: String::new(),
            contract_id: 1,
            car_numbers: None,
            created_at: now,
            updated_at: now,
        });
        assert!(client.car_numbers.is_empty());
    }
}
