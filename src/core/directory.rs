//! Directory business logic - Accounts and their student/faculty profiles.
//!
//! Profiles are tied to accounts through `user_id` only. Names and emails are
//! never used to join a profile to its account.

use crate::{
    entities::{Faculty, Role, Student, User, faculty, student, user},
    errors::{Error, Result, is_unique_violation},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, instrument};

/// Input for [`create_account`]. Profile fields are ignored for roles that
/// do not own that profile.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Display name
    pub name: String,
    /// Sign-in email
    pub email: String,
    /// Credential produced by the authentication layer
    pub password_hash: String,
    /// Portal role
    pub role: Role,
    /// Faculty department
    pub department: Option<String>,
    /// Student programme
    pub program: Option<String>,
    /// Student first year
    pub enrollment_year: Option<i32>,
}

/// Resolved identity of an account: who it is, what role it has and which
/// profile row represents it in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Account id
    pub user_id: i64,
    /// Display name
    pub name: String,
    /// Sign-in email
    pub email: String,
    /// Portal role
    pub role: Role,
    /// Student or faculty profile id; `None` for administrators
    pub profile_id: Option<i64>,
}

fn validate_account(account: &NewAccount) -> Result<()> {
    if account.name.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "Name cannot be empty".to_string(),
        });
    }
    let email = account.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::InvalidInput {
            message: format!("'{}' is not a valid email address", account.email),
        });
    }
    if account.password_hash.is_empty() {
        return Err(Error::InvalidInput {
            message: "Password cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// Creates an account together with the profile its role requires.
///
/// The account row and the profile row are written in one transaction, so a
/// student or faculty account never exists without its profile.
///
/// # Errors
/// * `Error::InvalidInput` for an empty name, malformed email or empty credential
/// * `Error::DuplicateEmail` if the email is taken
#[instrument(skip(db, account), fields(email = %account.email, role = %account.role))]
pub async fn create_account(db: &DatabaseConnection, account: NewAccount) -> Result<Identity> {
    validate_account(&account)?;
    let email = account.email.trim().to_lowercase();

    if find_by_email(db, &email).await?.is_some() {
        return Err(Error::DuplicateEmail { email });
    }

    let txn = db.begin().await?;

    let user = user::ActiveModel {
        name: Set(account.name.trim().to_string()),
        email: Set(email.clone()),
        password_hash: Set(account.password_hash),
        role: Set(account.role),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::DuplicateEmail {
                email: email.clone(),
            }
        } else {
            e.into()
        }
    })?;

    let profile_id = match account.role {
        Role::Admin => None,
        Role::Student => {
            let profile = student::ActiveModel {
                user_id: Set(user.id),
                program: Set(account.program),
                enrollment_year: Set(account.enrollment_year),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            Some(profile.id)
        }
        Role::Faculty => {
            let profile = faculty::ActiveModel {
                user_id: Set(user.id),
                department: Set(account.department),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            Some(profile.id)
        }
    };

    txn.commit().await?;
    info!("Created {} account {}", user.role, user.id);

    Ok(Identity {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        profile_id,
    })
}

/// Resolves an account id into its [`Identity`].
///
/// # Errors
/// Returns `Error::UserNotFound` if no such account exists.
pub async fn lookup(db: &DatabaseConnection, user_id: i64) -> Result<Identity> {
    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let profile_id = match user.role {
        Role::Admin => None,
        Role::Student => student_profile_for_user(db, user.id).await?.map(|p| p.id),
        Role::Faculty => faculty_profile_for_user(db, user.id).await?.map(|p| p.id),
    };

    Ok(Identity {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        profile_id,
    })
}

/// Finds an account by email (case-insensitive, as emails are stored lowercased).
pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all accounts of a role, ordered by name.
pub async fn list_by_role(db: &DatabaseConnection, role: Role) -> Result<Vec<user::Model>> {
    User::find()
        .filter(user::Column::Role.eq(role))
        .order_by_asc(user::Column::Name)
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts accounts of a role.
pub async fn count_by_role(db: &DatabaseConnection, role: Role) -> Result<u64> {
    User::find()
        .filter(user::Column::Role.eq(role))
        .count(db)
        .await
        .map_err(Into::into)
}

/// The administrator that receives mail addressed to "the administration":
/// the oldest admin account.
///
/// # Errors
/// Returns `Error::NoAdministrator` if the directory has no admin account.
pub async fn primary_admin<C: ConnectionTrait>(db: &C) -> Result<user::Model> {
    User::find()
        .filter(user::Column::Role.eq(Role::Admin))
        .order_by_asc(user::Column::Id)
        .one(db)
        .await?
        .ok_or(Error::NoAdministrator)
}

/// Student profile owned by an account.
pub async fn student_profile_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Option<student::Model>> {
    Student::find()
        .filter(student::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Faculty profile owned by an account.
pub async fn faculty_profile_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Option<faculty::Model>> {
    Faculty::find()
        .filter(faculty::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Student profile by id.
pub async fn get_student(db: &DatabaseConnection, student_id: i64) -> Result<Option<student::Model>> {
    Student::find_by_id(student_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Faculty profile by id.
pub async fn get_faculty(db: &DatabaseConnection, faculty_id: i64) -> Result<Option<faculty::Model>> {
    Faculty::find_by_id(faculty_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Accounts keyed by id, for turning profile rows into names in bulk.
pub async fn users_by_ids(
    db: &DatabaseConnection,
    user_ids: Vec<i64>,
) -> Result<HashMap<i64, user::Model>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

/// Accounts of the given student profiles, keyed by student id.
pub async fn student_accounts(
    db: &DatabaseConnection,
    student_ids: Vec<i64>,
) -> Result<HashMap<i64, user::Model>> {
    if student_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let profiles = Student::find()
        .filter(student::Column::Id.is_in(student_ids))
        .all(db)
        .await?;
    let mut users = users_by_ids(db, profiles.iter().map(|p| p.user_id).collect()).await?;
    Ok(profiles
        .into_iter()
        .filter_map(|p| users.remove(&p.user_id).map(|u| (p.id, u)))
        .collect())
}

/// Accounts of the given faculty profiles, keyed by faculty id.
pub async fn faculty_accounts(
    db: &DatabaseConnection,
    faculty_ids: Vec<i64>,
) -> Result<HashMap<i64, user::Model>> {
    if faculty_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let profiles = Faculty::find()
        .filter(faculty::Column::Id.is_in(faculty_ids))
        .all(db)
        .await?;
    let mut users = users_by_ids(db, profiles.iter().map(|p| p.user_id).collect()).await?;
    Ok(profiles
        .into_iter()
        .filter_map(|p| users.remove(&p.user_id).map(|u| (p.id, u)))
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_account_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut account = new_account("", "x@uni.edu", Role::Student);
        let result = create_account(&db, account.clone()).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        account.name = "Sara".to_string();
        account.email = "not-an-email".to_string();
        let result = create_account(&db, account.clone()).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        account.email = "sara@uni.edu".to_string();
        account.password_hash = String::new();
        let result = create_account(&db, account).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_account_creates_matching_profile() -> Result<()> {
        let db = setup_test_db().await?;

        let student = create_account(&db, new_account("Sara", "Sara@Uni.edu", Role::Student)).await?;
        assert_eq!(student.email, "sara@uni.edu");
        let profile = student_profile_for_user(&db, student.user_id).await?.unwrap();
        assert_eq!(student.profile_id, Some(profile.id));
        assert!(faculty_profile_for_user(&db, student.user_id).await?.is_none());

        let teacher = create_account(&db, new_account("Ali", "ali@uni.edu", Role::Faculty)).await?;
        let profile = faculty_profile_for_user(&db, teacher.user_id).await?.unwrap();
        assert_eq!(teacher.profile_id, Some(profile.id));

        let admin = create_account(&db, new_account("Root", "root@uni.edu", Role::Admin)).await?;
        assert!(admin.profile_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        create_account(&db, new_account("Sara", "sara@uni.edu", Role::Student)).await?;

        let result = create_account(&db, new_account("Other Sara", "SARA@uni.edu", Role::Faculty)).await;
        assert!(matches!(result, Err(Error::DuplicateEmail { email }) if email == "sara@uni.edu"));
        assert_eq!(count_by_role(&db, Role::Faculty).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_same_names_resolve_to_distinct_identities() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_account(&db, new_account("Ahmed Khan", "ahmed1@uni.edu", Role::Student)).await?;
        let second = create_account(&db, new_account("Ahmed Khan", "ahmed2@uni.edu", Role::Student)).await?;

        let first_lookup = lookup(&db, first.user_id).await?;
        let second_lookup = lookup(&db, second.user_id).await?;
        assert_ne!(first_lookup.profile_id, second_lookup.profile_id);
        assert_eq!(first_lookup, first);
        assert_eq!(second_lookup, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_lookup_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;
        let result = lookup(&db, 404).await;
        assert!(matches!(result, Err(Error::UserNotFound { id: 404 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_primary_admin_is_oldest_admin() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(primary_admin(&db).await, Err(Error::NoAdministrator)));

        let first = create_account(&db, new_account("Root", "root@uni.edu", Role::Admin)).await?;
        create_account(&db, new_account("Deputy", "deputy@uni.edu", Role::Admin)).await?;
        assert_eq!(primary_admin(&db).await?.id, first.user_id);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_and_count_by_role() -> Result<()> {
        let db = setup_test_db().await?;
        create_account(&db, new_account("Zara", "zara@uni.edu", Role::Student)).await?;
        create_account(&db, new_account("Bilal", "bilal@uni.edu", Role::Student)).await?;
        create_account(&db, new_account("Ali", "ali@uni.edu", Role::Faculty)).await?;

        let students = list_by_role(&db, Role::Student).await?;
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].name, "Bilal");
        assert_eq!(count_by_role(&db, Role::Faculty).await?, 1);
        assert_eq!(count_by_role(&db, Role::Admin).await?, 0);
        Ok(())
    }
}
