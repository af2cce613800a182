//! Messaging - Mail between accounts, with soft-delete and archive flags.
//!
//! Messages are only ever flagged, never removed. `is_archived` and `is_deleted` are
//! independent of each other; the folders below are views over the two flags.
//!
//! Who may message whom is decided by the portal layer from the contact lists at the
//! bottom of this module. At this level the only routing rule is that the addressed
//! role must match the recipient account.

use crate::{
    core::directory::{self, Identity},
    entities::{Course, Enrollment, Message, Role, User, course, enrollment, message},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Addressee of a message: the account and the role the sender believes it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipient {
    /// Role the recipient is expected to have
    pub role: Role,
    /// Account id of the recipient
    pub user_id: i64,
}

/// A flag change requested by the receiver of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagChange {
    /// Mark as read
    Read,
    /// Mark as unread
    Unread,
    /// Move to the archive
    Archived,
    /// Move to the trash
    Deleted,
    /// Clears both the archived and the deleted flag
    Restore,
}

/// Whether a flag change touched a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagOutcome {
    /// The flag was written
    Updated,
    /// No message with that id is addressed to the caller
    NoOp,
}

/// Mailbox views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folder {
    /// Neither archived nor deleted
    Inbox,
    /// Archived but not deleted
    Archived,
    /// Deleted, whatever the archive flag says
    Trash,
}

/// Someone a portal user may write to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    /// Account id to address messages to
    pub user_id: i64,
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
    /// Role of the account
    pub role: Role,
}

async fn insert_message<C: ConnectionTrait>(
    db: &C,
    sender: &Identity,
    recipient: Recipient,
    subject: &str,
    body: &str,
) -> Result<message::Model> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(Error::InvalidInput {
            message: "Subject cannot be empty".to_string(),
        });
    }

    let receiver = User::find_by_id(recipient.user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound {
            id: recipient.user_id,
        })?;
    if receiver.role != recipient.role {
        return Err(Error::RecipientMismatch {
            user_id: receiver.id,
            expected: recipient.role,
            actual: receiver.role,
        });
    }

    message::ActiveModel {
        sender_id: Set(sender.user_id),
        sender_role: Set(sender.role),
        receiver_id: Set(receiver.id),
        receiver_role: Set(receiver.role),
        subject: Set(subject.to_string()),
        body: Set(body.to_string()),
        sent_at: Set(chrono::Utc::now()),
        is_read: Set(false),
        is_archived: Set(false),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Sends a message. The new message is unread, unarchived and not deleted.
///
/// # Errors
/// * `Error::InvalidInput` for an empty subject
/// * `Error::UserNotFound` if the recipient account does not exist
/// * `Error::RecipientMismatch` if the recipient's role is not the addressed role
#[instrument(skip(db, sender, body), fields(sender_id = sender.user_id))]
pub async fn send_message(
    db: &DatabaseConnection,
    sender: &Identity,
    recipient: Recipient,
    subject: &str,
    body: &str,
) -> Result<message::Model> {
    let message = insert_message(db, sender, recipient, subject, body).await?;
    info!(
        "Message {} sent from user {} to user {}",
        message.id, message.sender_id, message.receiver_id
    );
    Ok(message)
}

/// Sends a message to the administration, which is the primary administrator account.
///
/// # Errors
/// Returns `Error::NoAdministrator` if there is no admin account to receive it.
pub async fn send_to_administration(
    db: &DatabaseConnection,
    sender: &Identity,
    subject: &str,
    body: &str,
) -> Result<message::Model> {
    let admin = directory::primary_admin(db).await?;
    send_message(
        db,
        sender,
        Recipient {
            role: Role::Admin,
            user_id: admin.id,
        },
        subject,
        body,
    )
    .await
}

/// Gets a message by id.
pub async fn get_message(db: &DatabaseConnection, message_id: i64) -> Result<Option<message::Model>> {
    Message::find_by_id(message_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Applies a flag change to a message addressed to `receiver_id`.
///
/// Each flag is set on its own. Ownership is checked through the receiver id only;
/// a message addressed to someone else is left alone and `NoOp` is returned.
#[instrument(skip(db))]
pub async fn mutate_flag(
    db: &DatabaseConnection,
    message_id: i64,
    receiver_id: i64,
    flag: FlagChange,
) -> Result<FlagOutcome> {
    let update = Message::update_many()
        .filter(message::Column::Id.eq(message_id))
        .filter(message::Column::ReceiverId.eq(receiver_id));
    let update = match flag {
        FlagChange::Read => update.col_expr(message::Column::IsRead, Expr::value(true)),
        FlagChange::Unread => update.col_expr(message::Column::IsRead, Expr::value(false)),
        FlagChange::Archived => update.col_expr(message::Column::IsArchived, Expr::value(true)),
        FlagChange::Deleted => update.col_expr(message::Column::IsDeleted, Expr::value(true)),
        FlagChange::Restore => update
            .col_expr(message::Column::IsArchived, Expr::value(false))
            .col_expr(message::Column::IsDeleted, Expr::value(false)),
    };

    let result = update.exec(db).await?;
    if result.rows_affected == 0 {
        debug!("Message {message_id} not addressed to user {receiver_id}; flag unchanged");
        Ok(FlagOutcome::NoOp)
    } else {
        Ok(FlagOutcome::Updated)
    }
}

/// Messages received by an account in one folder, newest first.
pub async fn list_folder(
    db: &DatabaseConnection,
    receiver: &Identity,
    folder: Folder,
) -> Result<Vec<message::Model>> {
    let query = Message::find()
        .filter(message::Column::ReceiverId.eq(receiver.user_id))
        .filter(message::Column::ReceiverRole.eq(receiver.role));
    let query = match folder {
        Folder::Inbox => query
            .filter(message::Column::IsArchived.eq(false))
            .filter(message::Column::IsDeleted.eq(false)),
        Folder::Archived => query
            .filter(message::Column::IsArchived.eq(true))
            .filter(message::Column::IsDeleted.eq(false)),
        Folder::Trash => query.filter(message::Column::IsDeleted.eq(true)),
    };

    query
        .order_by_desc(message::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Messages sent by an account, newest first.
pub async fn sent_by(db: &DatabaseConnection, sender: &Identity) -> Result<Vec<message::Model>> {
    Message::find()
        .filter(message::Column::SenderId.eq(sender.user_id))
        .order_by_desc(message::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Unread messages waiting in an account's inbox.
pub async fn unread_count(db: &DatabaseConnection, receiver: &Identity) -> Result<u64> {
    Message::find()
        .filter(message::Column::ReceiverId.eq(receiver.user_id))
        .filter(message::Column::ReceiverRole.eq(receiver.role))
        .filter(message::Column::IsRead.eq(false))
        .filter(message::Column::IsDeleted.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Replies to a received message with `Re: <subject>`.
///
/// The reply goes back to the original sender. With `discard_original` the original
/// is moved to the trash; both writes commit together.
///
/// # Errors
/// Returns `Error::MessageNotFound` unless the original was addressed to `actor`.
#[instrument(skip(db, actor, body), fields(actor_id = actor.user_id))]
pub async fn reply(
    db: &DatabaseConnection,
    actor: &Identity,
    original_id: i64,
    body: &str,
    discard_original: bool,
) -> Result<message::Model> {
    let txn = db.begin().await?;

    let original = Message::find_by_id(original_id)
        .filter(message::Column::ReceiverId.eq(actor.user_id))
        .one(&txn)
        .await?
        .ok_or(Error::MessageNotFound { id: original_id })?;

    let subject = if original.subject.starts_with("Re: ") {
        original.subject.clone()
    } else {
        format!("Re: {}", original.subject)
    };
    let sent = insert_message(
        &txn,
        actor,
        Recipient {
            role: original.sender_role,
            user_id: original.sender_id,
        },
        &subject,
        body,
    )
    .await?;

    let mut active: message::ActiveModel = original.into();
    active.is_read = Set(true);
    if discard_original {
        active.is_deleted = Set(true);
    }
    active.update(&txn).await?;

    txn.commit().await?;
    info!("User {} replied to message {original_id}", actor.user_id);
    Ok(sent)
}

fn into_contacts(users: impl IntoIterator<Item = crate::entities::user::Model>) -> Vec<Contact> {
    let mut contacts: Vec<Contact> = users
        .into_iter()
        .map(|u| Contact {
            user_id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
        })
        .collect();
    contacts.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.user_id.cmp(&b.user_id)));
    contacts.dedup_by_key(|c| c.user_id);
    contacts
}

/// Faculty members teaching any course the student is enrolled in.
pub async fn faculty_contacts_for_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<Contact>> {
    let course_ids: Vec<i64> = Enrollment::find()
        .select_only()
        .column(enrollment::Column::CourseId)
        .filter(enrollment::Column::StudentId.eq(student_id))
        .into_tuple()
        .all(db)
        .await?;
    if course_ids.is_empty() {
        return Ok(Vec::new());
    }

    let faculty_ids: Vec<Option<i64>> = Course::find()
        .select_only()
        .column(course::Column::FacultyId)
        .filter(course::Column::Id.is_in(course_ids))
        .into_tuple()
        .all(db)
        .await?;
    let accounts =
        directory::faculty_accounts(db, faculty_ids.into_iter().flatten().collect()).await?;
    Ok(into_contacts(accounts.into_values()))
}

/// Students enrolled in any course the faculty member teaches.
pub async fn student_contacts_for_faculty(
    db: &DatabaseConnection,
    faculty_id: i64,
) -> Result<Vec<Contact>> {
    let course_ids: Vec<i64> = Course::find()
        .select_only()
        .column(course::Column::Id)
        .filter(course::Column::FacultyId.eq(faculty_id))
        .into_tuple()
        .all(db)
        .await?;
    if course_ids.is_empty() {
        return Ok(Vec::new());
    }

    let student_ids: Vec<i64> = Enrollment::find()
        .select_only()
        .column(enrollment::Column::StudentId)
        .filter(enrollment::Column::CourseId.is_in(course_ids))
        .into_tuple()
        .all(db)
        .await?;
    let accounts = directory::student_accounts(db, student_ids).await?;
    Ok(into_contacts(accounts.into_values()))
}
