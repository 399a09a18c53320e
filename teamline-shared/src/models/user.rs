/// User model and database operations
///
/// Accounts carry a system-wide role (employee, manager, administrator) that
/// gates mutating operations across the API. Users are never hard-deleted:
/// deactivation clears `is_active`, which locks the account out at the
/// authentication middleware.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     name VARCHAR(50) NOT NULL,
///     surname VARCHAR(50) NOT NULL,
///     gender user_gender NOT NULL,
///     birth_date DATE NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'employee',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Advisory lock key serializing first-administrator promotion
const FIRST_ADMIN_LOCK_KEY: i64 = 0x7431_6d6c_6e5f_0001;

/// System-wide user role
///
/// Hierarchy-free: what each role may do is spelled out in the policy table,
/// not derived from a numeric level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Default role for every registered account
    Employee,

    /// May create teams and manage work across them
    Manager,

    /// Full access, including role assignment and deactivation
    Administrator,
}

impl Role {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Manager => "manager",
            Role::Administrator => "administrator",
        }
    }
}

/// User gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// User model representing an account
///
/// Passwords are stored as bcrypt hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address (case-insensitive via CITEXT, unique)
    pub email: String,

    /// First name
    pub name: String,

    /// Surname
    pub surname: String,

    /// Gender
    pub gender: Gender,

    /// Date of birth
    pub birth_date: NaiveDate,

    /// bcrypt password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// System-wide role
    pub role: Role,

    /// Whether the account can authenticate
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub surname: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,

    /// bcrypt hash (NOT the plaintext password!)
    pub password_hash: String,
}

/// Input for updating an existing user
///
/// Only non-None fields are written. Role and active flag have dedicated
/// operations and are deliberately absent here.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub password_hash: Option<String>,
}

const USER_COLUMNS: &str =
    "id, email, name, surname, gender, birth_date, password_hash, role, is_active, created_at, updated_at";

impl User {
    /// Creates a new user with the default employee role
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint
    /// violation) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, surname, gender, birth_date, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.email)
        .bind(data.name)
        .bind(data.surname)
        .bind(data.gender)
        .bind(data.birth_date)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Updates profile fields of an existing user
    ///
    /// Only non-None fields in `data` are written; `updated_at` is bumped.
    /// Returns the updated user, or None if the user doesn't exist.
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateUser) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.surname.is_some() {
            bind_count += 1;
            query.push_str(&format!(", surname = ${}", bind_count));
        }
        if data.gender.is_some() {
            bind_count += 1;
            query.push_str(&format!(", gender = ${}", bind_count));
        }
        if data.birth_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", birth_date = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(surname) = data.surname {
            q = q.bind(surname);
        }
        if let Some(gender) = data.gender {
            q = q.bind(gender);
        }
        if let Some(birth_date) = data.birth_date {
            q = q.bind(birth_date);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Sets a user's role
    ///
    /// Returns the updated user, or None if the user doesn't exist.
    pub async fn set_role(pool: &PgPool, id: Uuid, role: Role) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Soft-deactivates a user
    ///
    /// The row is kept (tasks, meetings, and evaluations keep their
    /// references); authentication rejects the account from the next request.
    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users with pagination, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users").fetch_one(pool).await?;

        Ok(count)
    }

    /// Checks whether any administrator exists
    pub async fn admin_exists(pool: &PgPool) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE role = 'administrator')")
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Promotes a user to administrator if and only if none exists yet
    ///
    /// The check-and-set runs in one transaction under a Postgres advisory
    /// lock, so concurrent bootstrap attempts are serialized: exactly one
    /// caller wins, every other call observes the winner and returns None.
    ///
    /// Returns the promoted user, or None when an administrator already
    /// exists (or the user row is gone).
    pub async fn promote_first_admin(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Held until commit/rollback; the second caller blocks here and then
        // sees the first caller's committed administrator.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(FIRST_ADMIN_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let admin_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE role = 'administrator')")
                .fetch_one(&mut *tx)
                .await?;

        if admin_exists {
            tx.rollback().await?;
            return Ok(None);
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = 'administrator', updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Employee.as_str(), "employee");
        assert_eq!(Role::Manager.as_str(), "manager");
        assert_eq!(Role::Administrator.as_str(), "administrator");
    }

    #[test]
    fn test_role_serde_roundtrip() {
        let json = serde_json::to_string(&Role::Administrator).unwrap();
        assert_eq!(json, "\"administrator\"");

        let role: Role = serde_json::from_str("\"manager\"").unwrap();
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn test_update_user_default_is_empty() {
        let update = UpdateUser::default();
        assert!(update.name.is_none());
        assert!(update.surname.is_none());
        assert!(update.gender.is_none());
        assert!(update.birth_date.is_none());
        assert!(update.password_hash.is_none());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            name: "Test".to_string(),
            surname: "User".to_string(),
            gender: Gender::Female,
            birth_date: NaiveDate::from_ymd_opt(1994, 8, 8).unwrap(),
            password_hash: "$2b$12$secret".to_string(),
            role: Role::Employee,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$2b$12$secret"));
    }

    // Integration tests for database operations live in the api crate's
    // test suite and require TEST_DATABASE_URL.
}
