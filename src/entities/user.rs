//! User entity - Represents an account in the university directory.
//!
//! Every person who can sign in has exactly one row here. Students and faculty
//! additionally own a profile row (`students` / `faculty`) that points back to the
//! account through `user_id`; administrators have no profile.

use crate::errors::Error;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Role of an account. Decides which portal the account may use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Role {
    /// Registry staff with access to the admin portal
    #[sea_orm(string_value = "Admin")]
    Admin,
    /// Teaching staff; owns a faculty profile
    #[sea_orm(string_value = "Faculty")]
    Faculty,
    /// Enrolled learner; owns a student profile
    #[sea_orm(string_value = "Student")]
    Student,
}

impl Role {
    /// Canonical label stored in the database and shown in the portals.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Faculty => "Faculty",
            Self::Student => "Student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    /// Parses a role label case-insensitively (`"admin"`, `"Faculty"`, ...).
    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "faculty" => Ok(Self::Faculty),
            "student" => Ok(Self::Student),
            _ => Err(Error::InvalidRole {
                value: value.to_string(),
            }),
        }
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (not unique; never used for joins)
    pub name: String,
    /// Sign-in email, unique across the directory
    #[sea_orm(unique)]
    pub email: String,
    /// Opaque credential produced by the authentication layer
    pub password_hash: String,
    /// Portal role of this account
    pub role: Role,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and the profile tables
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A student account has one student profile
    #[sea_orm(has_one = "super::student::Entity")]
    Student,
    /// A faculty account has one faculty profile
    #[sea_orm(has_one = "super::faculty::Entity")]
    Faculty,
    /// Notifications delivered to this account
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::faculty::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Faculty.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
