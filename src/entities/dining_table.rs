use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dining_table")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub table_number: i32,
    pub table_name: Option<String>,
    pub capacity: i32,
    pub location: Location,
    #[sea_orm(column_type = "Json")]
    pub features: Features,
    pub min_booking_hours: i32,
    #[sea_orm(column_type = "Double")]
    pub price_per_hour: f64,
    pub description: Option<String>,
    pub status: TableStatus,
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Location {
    #[default]
    #[sea_orm(string_value = "indoor")]
    Indoor,
    #[sea_orm(string_value = "outdoor")]
    Outdoor,
}

/// Physical state of a table. A table carries one status for the whole day,
/// regardless of how many time slots it serves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    #[default]
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "occupied")]
    Occupied,
    #[sea_orm(string_value = "reserved")]
    Reserved,
    #[sea_orm(string_value = "maintenance")]
    Maintenance,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "available",
            TableStatus::Occupied => "occupied",
            TableStatus::Reserved => "reserved",
            TableStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(TableStatus::Available),
            "occupied" => Ok(TableStatus::Occupied),
            "reserved" => Ok(TableStatus::Reserved),
            "maintenance" => Ok(TableStatus::Maintenance),
            other => Err(format!(
                "Invalid table status '{other}'. Expected one of: available, occupied, reserved, maintenance"
            )),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct Features(pub Vec<String>);

impl From<Vec<String>> for Features {
    fn from(features: Vec<String>) -> Self {
        // Features behave as a set: keep first occurrence, drop repeats.
        let mut unique: Vec<String> = Vec::with_capacity(features.len());
        for feature in features {
            if !unique.contains(&feature) {
                unique.push(feature);
            }
        }
        Features(unique)
    }
}
