/// Team membership association
///
/// Implements the many-to-many relationship between users and teams. A user
/// belongs to zero or more teams; the team's owner is always also a member.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE team_members (
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (team_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::User;

/// Membership row linking a user to a team
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Team ID
    pub team_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// When the user joined the team
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Adds a user to a team
    ///
    /// # Errors
    ///
    /// Returns an error if the membership already exists (primary key
    /// violation) or the team/user doesn't exist (foreign key violation).
    pub async fn add(pool: &PgPool, team_id: Uuid, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO team_members (team_id, user_id)
            VALUES ($1, $2)
            RETURNING team_id, user_id, joined_at
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Removes a user from a team
    ///
    /// Returns true if a membership was removed.
    pub async fn remove(pool: &PgPool, team_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Checks if a user is a member of a team
    pub async fn is_member(pool: &PgPool, team_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let is_member: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM team_members WHERE team_id = $1 AND user_id = $2)",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(is_member)
    }

    /// Checks whether two users share at least one team
    ///
    /// Used by the user-visibility policy: plain employees only see members
    /// of their own teams.
    pub async fn share_team(pool: &PgPool, user_a: Uuid, user_b: Uuid) -> Result<bool, sqlx::Error> {
        let shared: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM team_members a
                JOIN team_members b ON a.team_id = b.team_id
                WHERE a.user_id = $1 AND b.user_id = $2
            )
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_one(pool)
        .await?;

        Ok(shared)
    }

    /// Lists the members of a team, longest-standing first
    pub async fn list_members(pool: &PgPool, team_id: Uuid) -> Result<Vec<User>, sqlx::Error> {
        let members = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.name, u.surname, u.gender, u.birth_date,
                   u.password_hash, u.role, u.is_active, u.created_at, u.updated_at
            FROM users u
            JOIN team_members m ON m.user_id = u.id
            WHERE m.team_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Lists the ids of teams a user is a member of
    pub async fn team_ids_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT team_id FROM team_members WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(ids)
    }
}
