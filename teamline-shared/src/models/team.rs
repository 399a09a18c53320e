/// Team model and database operations
///
/// Every team has exactly one owning user. Membership is a separate
/// association (see `membership`); creating a team enrolls the owner as its
/// first member in the same transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(150) NOT NULL,
///     description VARCHAR(350) NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Team model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    /// Unique team ID
    pub id: Uuid,

    /// Team name
    pub name: String,

    /// Team description
    pub description: String,

    /// Owning user
    pub owner_id: Uuid,

    /// When the team was created
    pub created_at: DateTime<Utc>,

    /// When the team was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new team
#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
}

/// Input for updating an existing team
#[derive(Debug, Clone, Default)]
pub struct UpdateTeam {
    pub name: Option<String>,
    pub description: Option<String>,
}

const TEAM_COLUMNS: &str = "id, name, description, owner_id, created_at, updated_at";

impl Team {
    /// Creates a team and enrolls the owner as its first member
    ///
    /// Both writes happen in one transaction so a team can never exist with
    /// an owner who is not a member.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner doesn't exist (foreign key violation) or
    /// the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateTeam) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(&format!(
            r#"
            INSERT INTO teams (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING {TEAM_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO team_members (team_id, user_id) VALUES ($1, $2)")
            .bind(team.id)
            .bind(data.owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(team)
    }

    /// Finds a team by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(team)
    }

    /// Updates name/description of an existing team
    ///
    /// Returns the updated team, or None if the team doesn't exist.
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateTeam) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE teams SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TEAM_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Team>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        let team = q.fetch_optional(pool).await?;

        Ok(team)
    }

    /// Deletes a team
    ///
    /// Memberships, tasks, and meetings of the team go with it (ON DELETE
    /// CASCADE). Returns true if a team was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1").bind(id).execute(pool).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all teams with pagination, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let teams = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(teams)
    }

    /// Lists the teams a user belongs to (as member or owner)
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let teams = sqlx::query_as::<_, Team>(&format!(
            r#"
            SELECT {TEAM_COLUMNS} FROM teams
            WHERE owner_id = $1
               OR id IN (SELECT team_id FROM team_members WHERE user_id = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(teams)
    }

    /// Transfers ownership of the team to an existing member
    ///
    /// Runs in one transaction: verifies the new owner is a member, then
    /// rewrites `owner_id`. Returns the updated team, None if either the team
    /// doesn't exist or the candidate is not a member.
    pub async fn transfer_ownership(pool: &PgPool, id: Uuid, new_owner_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let is_member: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM team_members WHERE team_id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(new_owner_id)
        .fetch_one(&mut *tx)
        .await?;

        if !is_member {
            tx.rollback().await?;
            return Ok(None);
        }

        let team = sqlx::query_as::<_, Team>(&format!(
            "UPDATE teams SET owner_id = $2, updated_at = NOW() WHERE id = $1 RETURNING {TEAM_COLUMNS}"
        ))
        .bind(id)
        .bind(new_owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_team_default_is_empty() {
        let update = UpdateTeam::default();
        assert!(update.name.is_none());
        assert!(update.description.is_none());
    }

    #[test]
    fn test_team_serializes_owner() {
        let team = Team {
            id: Uuid::new_v4(),
            name: "Platform".to_string(),
            description: "Platform engineering team".to_string(),
            owner_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&team).unwrap();
        assert_eq!(json["name"], "Platform");
        assert!(json["owner_id"].is_string());
    }
}
