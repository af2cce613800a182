//! Message entity - Directed mail between accounts.
//!
//! Messages are never physically deleted. `is_archived` and `is_deleted` are
//! independent flags; the folder a message shows up in is derived from both.

use super::user::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Message database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    /// Unique identifier for the message
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Account that sent the message
    pub sender_id: i64,
    /// Role the sender wrote as
    pub sender_role: Role,
    /// Account the message is addressed to
    pub receiver_id: i64,
    /// Role the message is addressed to; always the receiver's role
    pub receiver_role: Role,
    /// Subject line
    pub subject: String,
    /// Message text
    #[sea_orm(column_type = "Text")]
    pub body: String,
    /// When the message was sent
    pub sent_at: DateTimeUtc,
    /// Receiver has opened the message
    pub is_read: bool,
    /// Receiver moved the message to the archive
    pub is_archived: bool,
    /// Receiver moved the message to the trash
    pub is_deleted: bool,
}

/// Defines relationships for Message
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Sending account
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id"
    )]
    Sender,
    /// Receiving account
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReceiverId",
        to = "super::user::Column::Id"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}
