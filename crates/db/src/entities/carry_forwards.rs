//! `SeaORM` Entity for carry_forwards table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "carry_forwards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub source_exercise_id: Uuid,
    pub destination_exercise_id: Uuid,
    pub generated_at: DateTimeWithTimeZone,
    pub generated_by: Uuid,
    pub entry_id: Option<Uuid>,
    #[sea_orm(column_type = "JsonBinary")]
    pub balances: Json,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
