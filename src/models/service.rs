use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One price point: a named service under one contract
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub contract_id: i64,
    pub material_card_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewService {
    pub name: String,
    pub price: i64,
    pub contract_id: i64,
    #[serde(default)]
    pub material_card_id: Option<i64>,
}

/// Replacement fields for a catalog row; the owning contract is fixed
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceUpdate {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub material_card_id: Option<i64>,
}

/// A service line without contract, used when filling a contract's price list
#[derive(Debug, Clone, Deserialize)]
pub struct ContractServiceInput {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub material_card_id: Option<i64>,
}

/// Catalog row joined with its contract number
#[derive(Debug, Clone, FromRow)]
pub struct ServicePrice {
    pub service_id: i64,
    pub service_name: String,
    pub contract_id: i64,
    pub contract_name: String,
    pub price: i64,
    pub material_card_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceVariant {
    pub service_id: i64,
    pub contract_id: i64,
    pub contract_name: String,
    pub price: i64,
}

/// All contract-specific prices of one logical service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceFamily {
    pub name: String,
    pub material_card_id: Option<i64>,
    pub variants: Vec<PriceVariant>,
}

/// Grouping key of a family: trimmed, inner whitespace collapsed, lower-cased.
pub fn family_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Groups catalog rows into families in one pass. Families come out sorted by
/// key; variants keep the order of the input rows. The first row seen names
/// the family and supplies its material card.
pub fn group_into_families(rows: Vec<ServicePrice>) -> Vec<ServiceFamily> {
    let mut families: BTreeMap<String, ServiceFamily> = BTreeMap::new();

    for row in rows {
        let family = families
            .entry(family_key(&row.service_name))
            .or_insert_with(|| ServiceFamily {
                name: row.service_name.trim().to_string(),
                material_card_id: row.material_card_id,
                variants: Vec::new(),
            });
        if family.material_card_id.is_none() {
            family.material_card_id = row.material_card_id;
        }
        family.variants.push(PriceVariant {
            service_id: row.service_id,
            contract_id: row.contract_id,
            contract_name: row.contract_name,
            price: row.price,
        });
    }

    families.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, name: &str, contract_id: i64, contract: &str, price: i64) -> ServicePrice {
        ServicePrice {
            service_id: id,
            service_name: name.to_string(),
            contract_id,
            contract_name: contract.to_string(),
            price,
            material_card_id: None,
        }
    }

    #[test]
    fn groups_same_name_across_contracts() {
        let families = group_into_families(vec![
            row(1, "Balancing", 1, "C-CASH", 700),
            row(2, "Balancing", 2, "C-AGG", 595),
            row(3, "Wheel mount", 1, "C-CASH", 300),
        ]);

        assert_eq!(families.len(), 2);
        let balancing = &families[0];
        assert_eq!(balancing.name, "Balancing");
        assert_eq!(
            balancing
                .variants
                .iter()
                .map(|v| (v.contract_id, v.price))
                .collect::<Vec<_>>(),
            vec![(1, 700), (2, 595)]
        );
        assert_eq!(families[1].name, "Wheel mount");
        assert_eq!(families[1].variants.len(), 1);
    }

    #[test]
    fn casing_and_whitespace_do_not_split_a_family() {
        let families = group_into_families(vec![
            row(1, "Wheel  mount", 1, "A", 300),
            row(2, " wheel mount ", 2, "B", 250),
        ]);

        assert_eq!(families.len(), 1);
        assert_eq!(families[0].name, "Wheel  mount");
        assert_eq!(families[0].variants.len(), 2);
    }

    #[test]
    fn first_known_material_card_wins() {
        let mut with_card = row(2, "Patch", 2, "B", 100);
        with_card.material_card_id = Some(7);
        let families = group_into_families(vec![row(1, "Patch", 1, "A", 120), with_card]);

        assert_eq!(families[0].material_card_id, Some(7));
    }

    #[test]
    fn empty_catalog_gives_no_families() {
        assert!(group_into_families(Vec::new()).is_empty());
    }
}
