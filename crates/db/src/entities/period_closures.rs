//! `SeaORM` Entity for period_closures table.
//!
//! Reopened closures stay as history; at most one CLOSED row exists per
//! (exercise, period).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "period_closures")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub exercise_id: Uuid,
    pub period: String,
    pub closure_type: String,
    pub status: String,
    pub closed_by: Uuid,
    pub closed_at: DateTimeWithTimeZone,
    #[sea_orm(column_type = "JsonBinary")]
    pub controls: Json,
    pub anomaly_count: i32,
    pub reopen_reason: Option<String>,
    pub reopened_by: Option<Uuid>,
    pub reopened_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exercises::Entity",
        from = "Column::ExerciseId",
        to = "super::exercises::Column::Id"
    )]
    Exercises,
}

impl Related<super::exercises::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exercises.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
