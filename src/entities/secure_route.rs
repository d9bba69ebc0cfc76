use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Traffic-light risk level for a transport route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum SecurityStatus {
    #[sea_orm(string_value = "green")]
    Green,
    #[sea_orm(string_value = "yellow")]
    Yellow,
    #[sea_orm(string_value = "red")]
    Red,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "secure_routes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub farmer_id: i32,
    pub route_name: String,
    pub route_path_geojson: Json,
    pub security_status: SecurityStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub risk_notes: Option<String>,
    pub last_updated: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::farmer::Entity",
        from = "Column::FarmerId",
        to = "super::farmer::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Farmer,
}

impl Related<super::farmer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Farmer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
