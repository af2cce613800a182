//! Attendance entity - One mark per enrollment and session date.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance mark database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    /// Unique identifier for the mark
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Enrollment the mark belongs to
    pub enrollment_id: i64,
    /// Date of the class session
    pub session_date: Date,
    /// Whether the student attended
    pub present: bool,
}

/// Defines relationships for Attendance
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each mark belongs to one enrollment
    #[sea_orm(
        belongs_to = "super::enrollment::Entity",
        from = "Column::EnrollmentId",
        to = "super::enrollment::Column::Id",
        on_delete = "Cascade"
    )]
    Enrollment,
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
