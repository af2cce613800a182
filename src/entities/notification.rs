//! Notification entity - One-line announcements delivered to a single account.
//! Broadcasts fan out into one row per recipient.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Unique identifier for the notification
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Recipient account
    pub user_id: i64,
    /// Announcement text
    #[sea_orm(column_type = "Text")]
    pub message: String,
    /// When the notification was created
    pub created_at: DateTimeUtc,
    /// Recipient has seen it
    pub is_read: bool,
    /// Recipient archived it
    pub is_archived: bool,
    /// Recipient dismissed it
    pub is_deleted: bool,
}

/// Defines relationships for Notification
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each notification belongs to one account
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
