//! Seed data loading from seed.toml
//!
//! The seed file lists the accounts and courses a fresh installation starts with.
//! Seeding is idempotent: accounts are matched by email and courses by code, and
//! anything that already exists is left untouched.

use crate::{
    core::{
        catalog::{self, NewCourse},
        directory::{self, NewAccount},
    },
    entities::{Role, course::DEFAULT_CAPACITY},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Structure of the whole seed file
#[derive(Debug, Default, Deserialize)]
pub struct SeedConfig {
    /// Accounts to create
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,
    /// Courses to create
    #[serde(default)]
    pub courses: Vec<CourseSeed>,
}

/// One account entry
#[derive(Debug, Deserialize, Clone)]
pub struct AccountSeed {
    /// Display name
    pub name: String,
    /// Sign-in email
    pub email: String,
    /// Credential as produced by the authentication layer
    pub password_hash: String,
    /// `Admin`, `Faculty` or `Student`
    pub role: Role,
    /// Faculty department
    #[serde(default)]
    pub department: Option<String>,
    /// Student programme
    #[serde(default)]
    pub program: Option<String>,
    /// Student first year
    #[serde(default)]
    pub enrollment_year: Option<i32>,
}

/// One course entry
#[derive(Debug, Deserialize, Clone)]
pub struct CourseSeed {
    /// Catalog code
    pub code: String,
    /// Course title
    pub name: String,
    /// Credit hours
    pub credits: i32,
    /// Meeting room
    #[serde(default)]
    pub room: Option<String>,
    /// Seats offered
    #[serde(default = "default_capacity")]
    pub capacity: i32,
    /// Email of the faculty account teaching the course
    #[serde(default)]
    pub faculty_email: Option<String>,
}

const fn default_capacity() -> i32 {
    DEFAULT_CAPACITY
}

/// What a seeding run changed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Accounts inserted
    pub accounts_created: usize,
    /// Accounts already present
    pub accounts_skipped: usize,
    /// Courses inserted
    pub courses_created: usize,
    /// Courses already present
    pub courses_skipped: usize,
}

/// Loads seed data from a TOML file
///
/// # Errors
/// Returns `Error::Config` if the file cannot be read or is not valid TOML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read seed file {}: {e}", path.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed file {}: {e}", path.display()),
    })
}

/// Path of the seed file: `SEED_PATH`, or `./seed.toml`.
#[must_use]
pub fn default_seed_path() -> String {
    std::env::var("SEED_PATH").unwrap_or_else(|_| "seed.toml".to_string())
}

/// Inserts every account and course from `config` that does not exist yet.
pub async fn seed_database(db: &DatabaseConnection, config: &SeedConfig) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for account in &config.accounts {
        if directory::find_by_email(db, &account.email).await?.is_some() {
            warn!("Account '{}' already exists. Skipping.", account.email);
            summary.accounts_skipped += 1;
            continue;
        }

        directory::create_account(
            db,
            NewAccount {
                name: account.name.clone(),
                email: account.email.clone(),
                password_hash: account.password_hash.clone(),
                role: account.role,
                department: account.department.clone(),
                program: account.program.clone(),
                enrollment_year: account.enrollment_year,
            },
        )
        .await?;
        info!("Seeded {} account '{}'", account.role, account.email);
        summary.accounts_created += 1;
    }

    for course in &config.courses {
        if catalog::get_course_by_code(db, &course.code).await?.is_some() {
            warn!("Course '{}' already exists. Skipping.", course.code);
            summary.courses_skipped += 1;
            continue;
        }

        let faculty_id = match &course.faculty_email {
            Some(email) => resolve_faculty(db, email).await?,
            None => None,
        };

        catalog::create_course(
            db,
            NewCourse {
                code: course.code.clone(),
                name: course.name.clone(),
                credits: course.credits,
                room: course.room.clone(),
                capacity: course.capacity,
                faculty_id,
            },
        )
        .await?;
        info!("Seeded course '{}'", course.code);
        summary.courses_created += 1;
    }

    Ok(summary)
}

async fn resolve_faculty(db: &DatabaseConnection, email: &str) -> Result<Option<i64>> {
    let Some(user) = directory::find_by_email(db, email).await? else {
        warn!("Faculty account '{email}' not found; course left unassigned.");
        return Ok(None);
    };

    let profile = directory::faculty_profile_for_user(db, user.id).await?;
    if profile.is_none() {
        warn!("Account '{email}' has no faculty profile; course left unassigned.");
    }
    Ok(profile.map(|p| p.id))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    const SAMPLE: &str = r#"
        [[accounts]]
        name = "Super Admin"
        email = "admin@uni.edu"
        password_hash = "hash-admin"
        role = "Admin"

        [[accounts]]
        name = "Ali Raza"
        email = "ali@uni.edu"
        password_hash = "hash-ali"
        role = "Faculty"
        department = "Computer Science"

        [[accounts]]
        name = "Ahmed Khan"
        email = "ahmed@uni.edu"
        password_hash = "hash-ahmed"
        role = "Student"
        program = "BS Computer Science"
        enrollment_year = 2024

        [[courses]]
        code = "CS101"
        name = "Introduction to Programming"
        credits = 3
        room = "B-12"
        faculty_email = "ali@uni.edu"

        [[courses]]
        code = "MA101"
        name = "Calculus I"
        credits = 4
        capacity = 45
    "#;

    #[test]
    fn test_parse_seed_config() {
        let config: SeedConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.accounts.len(), 3);
        assert_eq!(config.accounts[1].role, Role::Faculty);
        assert_eq!(config.accounts[2].enrollment_year, Some(2024));
        assert_eq!(config.courses[0].capacity, DEFAULT_CAPACITY);
        assert_eq!(config.courses[1].capacity, 45);
        assert!(config.courses[1].faculty_email.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_role() {
        let bad = r#"
            [[accounts]]
            name = "X"
            email = "x@uni.edu"
            password_hash = "h"
            role = "Dean"
        "#;
        assert!(toml::from_str::<SeedConfig>(bad).is_err());
    }

    #[tokio::test]
    async fn test_seed_database_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let config: SeedConfig = toml::from_str(SAMPLE).unwrap();

        let first = seed_database(&db, &config).await?;
        assert_eq!(first.accounts_created, 3);
        assert_eq!(first.courses_created, 2);

        let second = seed_database(&db, &config).await?;
        assert_eq!(second.accounts_created, 0);
        assert_eq!(second.accounts_skipped, 3);
        assert_eq!(second.courses_skipped, 2);

        let cs101 = catalog::get_course_by_code(&db, "CS101").await?.unwrap();
        assert!(cs101.faculty_id.is_some());
        let ma101 = catalog::get_course_by_code(&db, "MA101").await?.unwrap();
        assert!(ma101.faculty_id.is_none());
        assert_eq!(ma101.capacity, 45);
        Ok(())
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
