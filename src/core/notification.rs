//! Notifications - One-line announcements and role-wide broadcasts.

use crate::{
    core::messaging::{FlagChange, FlagOutcome},
    entities::{Notification, Role, User, notification, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};

fn validate_text(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidInput {
            message: "Notification text cannot be empty".to_string(),
        });
    }
    Ok(text)
}

fn new_notification(user_id: i64, text: &str) -> notification::ActiveModel {
    notification::ActiveModel {
        user_id: Set(user_id),
        message: Set(text.to_string()),
        created_at: Set(chrono::Utc::now()),
        is_read: Set(false),
        is_archived: Set(false),
        is_deleted: Set(false),
        ..Default::default()
    }
}

/// Delivers a notification to one account.
///
/// # Errors
/// * `Error::InvalidInput` for empty text
/// * `Error::UserNotFound` if the account does not exist
pub async fn notify(db: &DatabaseConnection, user_id: i64, text: &str) -> Result<notification::Model> {
    let text = validate_text(text)?;
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    new_notification(user_id, text)
        .insert(db)
        .await
        .map_err(Into::into)
}

/// Sends the same notification to every account of a role.
///
/// The fan-out is one transaction: either every recipient gets the notification
/// or nobody does. Returns the number of recipients.
#[instrument(skip(db, text))]
pub async fn broadcast(db: &DatabaseConnection, role: Role, text: &str) -> Result<u64> {
    let text = validate_text(text)?;

    let txn = db.begin().await?;

    let recipients: Vec<i64> = User::find()
        .select_only()
        .column(user::Column::Id)
        .filter(user::Column::Role.eq(role))
        .into_tuple()
        .all(&txn)
        .await?;
    if recipients.is_empty() {
        debug!("No {role} accounts to notify");
        return Ok(0);
    }

    let count = recipients.len() as u64;
    Notification::insert_many(recipients.into_iter().map(|id| new_notification(id, text)))
        .exec_without_returning(&txn)
        .await?;

    txn.commit().await?;
    info!("Broadcast to {count} {role} accounts");
    Ok(count)
}

/// Notifications of an account that are not deleted, newest first.
pub async fn notifications_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<notification::Model>> {
    Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsDeleted.eq(false))
        .order_by_desc(notification::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The latest `limit` notifications of an account.
pub async fn latest_notifications(
    db: &DatabaseConnection,
    user_id: i64,
    limit: u64,
) -> Result<Vec<notification::Model>> {
    Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsDeleted.eq(false))
        .order_by_desc(notification::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Unread notifications of a user, not counting deleted ones.
pub async fn unread_notification_count(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsRead.eq(false))
        .filter(notification::Column::IsDeleted.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Marks every notification of an account as read. Returns how many changed.
pub async fn mark_all_read(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    let result = Notification::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsRead.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Applies a flag change to one notification owned by `user_id`.
pub async fn mutate_notification_flag(
    db: &DatabaseConnection,
    notification_id: i64,
    user_id: i64,
    flag: FlagChange,
) -> Result<FlagOutcome> {
    let update = Notification::update_many()
        .filter(notification::Column::Id.eq(notification_id))
        .filter(notification::Column::UserId.eq(user_id));
    let update = match flag {
        FlagChange::Read => update.col_expr(notification::Column::IsRead, Expr::value(true)),
        FlagChange::Unread => update.col_expr(notification::Column::IsRead, Expr::value(false)),
        FlagChange::Archived => {
            update.col_expr(notification::Column::IsArchived, Expr::value(true))
        }
        FlagChange::Deleted => update.col_expr(notification::Column::IsDeleted, Expr::value(true)),
        FlagChange::Restore => update
            .col_expr(notification::Column::IsArchived, Expr::value(false))
            .col_expr(notification::Column::IsDeleted, Expr::value(false)),
    };

    let result = update.exec(db).await?;
    Ok(if result.rows_affected == 0 {
        FlagOutcome::NoOp
    } else {
        FlagOutcome::Updated
    })
}
