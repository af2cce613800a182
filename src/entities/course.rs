//! Course entity - The course catalog.
//!
//! `enrolled_count` is a denormalized counter owned by the enrollment ledger: it is
//! only ever moved by `+1`/`-1` updates issued in the same database transaction as
//! the enrollment insert/delete.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Seats offered when a course is created without an explicit capacity.
pub const DEFAULT_CAPACITY: i32 = 30;

/// Course database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    /// Unique identifier for the course
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Catalog code, e.g. "CS101"; unique
    #[sea_orm(unique)]
    pub code: String,
    /// Human-readable title
    pub name: String,
    /// Credit hours
    pub credits: i32,
    /// Room where the course meets
    pub room: Option<String>,
    /// Seats offered (informational)
    pub capacity: i32,
    /// Live enrollment counter maintained by the ledger
    pub enrolled_count: i32,
    /// Faculty profile teaching the course, if assigned
    pub faculty_id: Option<i64>,
}

/// Defines relationships for Course
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each course is taught by at most one faculty member
    #[sea_orm(
        belongs_to = "super::faculty::Entity",
        from = "Column::FacultyId",
        to = "super::faculty::Column::Id"
    )]
    Faculty,
    /// One course has many enrollments
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,
    /// One course has many assignments
    #[sea_orm(has_many = "super::assignment::Entity")]
    Assignments,
}

impl Related<super::faculty::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Faculty.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
