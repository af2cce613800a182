//! Mailbox actions shared by every portal.
//!
//! Actors only ever see and change messages addressed to themselves.

use super::session::Actor;
use crate::{
    core::messaging::{self, FlagChange, FlagOutcome, Folder},
    entities::message,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Messages in one of the actor's folders, newest first.
pub async fn folder(
    db: &DatabaseConnection,
    actor: &Actor,
    folder: Folder,
) -> Result<Vec<message::Model>> {
    messaging::list_folder(db, actor.identity(), folder).await
}

/// Messages the actor sent.
pub async fn sent(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<message::Model>> {
    messaging::sent_by(db, actor.identity()).await
}

/// Unread messages in the actor's inbox.
pub async fn unread(db: &DatabaseConnection, actor: &Actor) -> Result<u64> {
    messaging::unread_count(db, actor.identity()).await
}

/// Changes a flag on one of the actor's received messages.
pub async fn change_flag(
    db: &DatabaseConnection,
    actor: &Actor,
    message_id: i64,
    flag: FlagChange,
) -> Result<FlagOutcome> {
    messaging::mutate_flag(db, message_id, actor.user_id(), flag).await
}

/// Replies to one of the actor's received messages.
pub async fn reply(
    db: &DatabaseConnection,
    actor: &Actor,
    message_id: i64,
    body: &str,
    discard_original: bool,
) -> Result<message::Model> {
    messaging::reply(db, actor.identity(), message_id, body, discard_original).await
}
