//! Assignment entity - Coursework posted by faculty for a course.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Assignment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    /// Unique identifier for the assignment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Course the assignment belongs to
    pub course_id: i64,
    /// Short title shown in listings
    pub title: String,
    /// Longer instructions
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Deadline; undated assignments never expire
    pub due_date: Option<Date>,
    /// Stored path of an attached brief, if any
    pub attachment_path: Option<String>,
    /// When the assignment was posted
    pub created_at: DateTimeUtc,
}

/// Defines relationships for Assignment
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each assignment belongs to one course
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
    /// Submissions handed in for this assignment
    #[sea_orm(has_many = "super::submission::Entity")]
    Submissions,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
