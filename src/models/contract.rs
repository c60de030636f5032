use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Client-type category a contract (and its price list) is signed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ClientType {
    Cash,
    Counterparty,
    Aggregator,
}

/// A signed agreement; every priced service row belongs to exactly one
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contract {
    pub id: i64,
    pub number: String,
    pub description: String,
    pub client_company_name: String,
    pub client_company_address: String,
    pub client_company_phone: String,
    pub client_company_email: String,
    pub client_company_inn: String,
    pub client_company_kpp: String,
    pub client_company_ogrn: String,
    pub client_type: ClientType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContract {
    pub number: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub client_company_name: String,
    #[serde(default)]
    pub client_company_address: String,
    #[serde(default)]
    pub client_company_phone: String,
    #[serde(default)]
    pub client_company_email: String,
    #[serde(default)]
    pub client_company_inn: String,
    #[serde(default)]
    pub client_company_kpp: String,
    #[serde(default)]
    pub client_company_ogrn: String,
    pub client_type: ClientType,
}

impl NewContract {
    pub fn new(number: impl Into<String>, client_type: ClientType) -> Self {
        Self {
            number: number.into(),
            description: String::new(),
            client_company_name: String::new(),
            client_company_address: String::new(),
            client_company_phone: String::new(),
            client_company_email: String::new(),
            client_company_inn: String::new(),
            client_company_kpp: String::new(),
            client_company_ogrn: String::new(),
            client_type,
        }
    }
}
