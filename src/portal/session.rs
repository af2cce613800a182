//! Signed-in identity passed explicitly into every portal operation.

use crate::{
    core::directory::{self, Identity},
    entities::Role,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tracing::debug;

/// The authenticated account a portal request acts for.
///
/// Built once per request from the account id the session layer has verified.
/// Nothing in the portal reads identity from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    identity: Identity,
}

impl Actor {
    /// Resolves a verified account id into an actor.
    ///
    /// # Errors
    /// Returns `Error::UserNotFound` if the account no longer exists.
    pub async fn sign_in(db: &DatabaseConnection, user_id: i64) -> Result<Self> {
        let identity = directory::lookup(db, user_id).await?;
        debug!("User {} signed in as {}", identity.user_id, identity.role);
        Ok(Self { identity })
    }

    /// Wraps an identity that was already looked up.
    #[must_use]
    pub const fn from_identity(identity: Identity) -> Self {
        Self { identity }
    }

    /// The signed-in account.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Account id.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.identity.user_id
    }

    /// Portal role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.identity.role
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Fails with `Error::Forbidden` unless the actor has `role`.
    pub fn require(&self, role: Role) -> Result<()> {
        if self.identity.role == role {
            Ok(())
        } else {
            Err(Error::Forbidden {
                required: role,
                actual: self.identity.role,
            })
        }
    }

    fn profile_id(&self, role: Role) -> Result<i64> {
        self.require(role)?;
        self.identity.profile_id.ok_or(Error::ProfileMissing {
            user_id: self.identity.user_id,
            role,
        })
    }

    /// Student profile id of a student actor.
    ///
    /// # Errors
    /// `Error::Forbidden` for other roles, `Error::ProfileMissing` if the profile is gone.
    pub fn student_id(&self) -> Result<i64> {
        self.profile_id(Role::Student)
    }

    /// Faculty profile id of a faculty actor.
    ///
    /// # Errors
    /// `Error::Forbidden` for other roles, `Error::ProfileMissing` if the profile is gone.
    pub fn faculty_id(&self) -> Result<i64> {
        self.profile_id(Role::Faculty)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_sign_in_resolves_profile() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "Sara").await?;

        let actor = Actor::sign_in(&db, student.user_id).await?;
        assert_eq!(actor.role(), Role::Student);
        assert_eq!(actor.name(), "Sara");
        assert_eq!(Some(actor.student_id()?), student.profile_id);

        let result = Actor::sign_in(&db, 999).await;
        assert!(matches!(result, Err(Error::UserNotFound { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_require_role() -> Result<()> {
        let db = setup_test_db().await?;
        let teacher = Actor::from_identity(create_test_faculty(&db, "Ali").await?);

        assert!(teacher.require(Role::Faculty).is_ok());
        assert!(teacher.faculty_id().is_ok());
        assert!(matches!(
            teacher.require(Role::Admin),
            Err(Error::Forbidden {
                required: Role::Admin,
                actual: Role::Faculty
            })
        ));
        assert!(matches!(teacher.student_id(), Err(Error::Forbidden { .. })));
        Ok(())
    }

    #[test]
    fn test_missing_profile() {
        let actor = Actor::from_identity(Identity {
            user_id: 7,
            name: "Orphan".to_string(),
            email: "orphan@uni.test".to_string(),
            role: Role::Student,
            profile_id: None,
        });
        assert!(matches!(
            actor.student_id(),
            Err(Error::ProfileMissing { user_id: 7, .. })
        ));
    }
}
