use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Consumables tracked in storage. Each kind is one column in `storage`
/// and in `material_cards`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Rs25,
    R19,
    R20,
    R25,
    R251,
    R13,
    R15,
    Foot9,
    Foot12,
    Foot15,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 10] = [
        MaterialKind::Rs25,
        MaterialKind::R19,
        MaterialKind::R20,
        MaterialKind::R25,
        MaterialKind::R251,
        MaterialKind::R13,
        MaterialKind::R15,
        MaterialKind::Foot9,
        MaterialKind::Foot12,
        MaterialKind::Foot15,
    ];

    pub fn column(self) -> &'static str {
        match self {
            MaterialKind::Rs25 => "rs25",
            MaterialKind::R19 => "r19",
            MaterialKind::R20 => "r20",
            MaterialKind::R25 => "r25",
            MaterialKind::R251 => "r251",
            MaterialKind::R13 => "r13",
            MaterialKind::R15 => "r15",
            MaterialKind::Foot9 => "foot9",
            MaterialKind::Foot12 => "foot12",
            MaterialKind::Foot15 => "foot15",
        }
    }
}

/// Amount of every material kind; a recipe, a delivery or the stock itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct MaterialQuantities {
    pub rs25: i64,
    pub r19: i64,
    pub r20: i64,
    pub r25: i64,
    pub r251: i64,
    pub r13: i64,
    pub r15: i64,
    pub foot9: i64,
    pub foot12: i64,
    pub foot15: i64,
}

impl MaterialQuantities {
    pub fn get(&self, kind: MaterialKind) -> i64 {
        match kind {
            MaterialKind::Rs25 => self.rs25,
            MaterialKind::R19 => self.r19,
            MaterialKind::R20 => self.r20,
            MaterialKind::R25 => self.r25,
            MaterialKind::R251 => self.r251,
            MaterialKind::R13 => self.r13,
            MaterialKind::R15 => self.r15,
            MaterialKind::Foot9 => self.foot9,
            MaterialKind::Foot12 => self.foot12,
            MaterialKind::Foot15 => self.foot15,
        }
    }

    /// Values in `MaterialKind::ALL` order, for binding.
    pub fn values(&self) -> [i64; 10] {
        MaterialKind::ALL.map(|kind| self.get(kind))
    }

    /// First kind holding a negative amount.
    pub fn first_negative(&self) -> Option<MaterialKind> {
        MaterialKind::ALL.into_iter().find(|kind| self.get(*kind) < 0)
    }

    /// First kind where `self` (the stock) cannot cover `required`.
    pub fn first_shortage(&self, required: &MaterialQuantities) -> Option<MaterialKind> {
        MaterialKind::ALL
            .into_iter()
            .find(|kind| self.get(*kind) < required.get(*kind))
    }
}

/// Recipe: what performing one service consumes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaterialCard {
    pub id: i64,
    pub name: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub quantities: MaterialQuantities,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialCardInput {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub quantities: MaterialQuantities,
}

/// The single on-hand stock row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Storage {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub quantities: MaterialQuantities,
    pub updated_at: DateTime<Utc>,
}

/// Named material with its own on-hand count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub type_ds: i64,
    pub storage: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialInput {
    pub name: String,
    #[serde(default)]
    pub type_ds: i64,
    #[serde(default)]
    pub storage: i64,
}

#[derive(Debug, Deserialize)]
pub struct QuantityChange {
    pub quantity: i64,
}
