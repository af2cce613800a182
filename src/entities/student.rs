//! Student profile entity - Academic record attached to a student account.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Unique identifier for the profile (the ledger's student id)
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning account; one profile per account
    #[sea_orm(unique)]
    pub user_id: i64,
    /// Degree programme, e.g. "BS Computer Science"
    pub program: Option<String>,
    /// Year of first enrollment
    pub enrollment_year: Option<i32>,
}

/// Defines relationships for Student
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each profile belongs to one account
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One student has many enrollments
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,
    /// One student has many submissions
    #[sea_orm(has_many = "super::submission::Entity")]
    Submissions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
