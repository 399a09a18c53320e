/// Meeting model and database operations
///
/// Meetings belong to exactly one team and carry a participant set via the
/// `meeting_participants` association. Creating a meeting writes the meeting
/// row and its participants in one transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::User;

/// Meeting model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Meeting {
    /// Unique meeting ID
    pub id: Uuid,

    /// Meeting title
    pub title: String,

    /// Meeting description
    pub description: String,

    /// When the meeting takes place
    pub scheduled_at: DateTime<Utc>,

    /// Owning team
    pub team_id: Uuid,

    /// User who scheduled the meeting
    pub creator_id: Uuid,

    /// When the meeting was created
    pub created_at: DateTime<Utc>,

    /// When the meeting was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new meeting
#[derive(Debug, Clone)]
pub struct CreateMeeting {
    pub title: String,
    pub description: String,
    pub scheduled_at: DateTime<Utc>,
    pub team_id: Uuid,
    pub creator_id: Uuid,

    /// Initial participant set
    pub participant_ids: Vec<Uuid>,
}

/// Input for updating an existing meeting
#[derive(Debug, Clone, Default)]
pub struct UpdateMeeting {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

const MEETING_COLUMNS: &str = "id, title, description, scheduled_at, team_id, creator_id, created_at, updated_at";

impl Meeting {
    /// Creates a meeting together with its initial participants
    ///
    /// The meeting row and all participant rows are written in one
    /// transaction; a bad participant reference rolls the whole thing back.
    pub async fn create(pool: &PgPool, data: CreateMeeting) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let meeting = sqlx::query_as::<_, Meeting>(&format!(
            r#"
            INSERT INTO meetings (title, description, scheduled_at, team_id, creator_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MEETING_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.scheduled_at)
        .bind(data.team_id)
        .bind(data.creator_id)
        .fetch_one(&mut *tx)
        .await?;

        for participant_id in &data.participant_ids {
            sqlx::query(
                "INSERT INTO meeting_participants (meeting_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(meeting.id)
            .bind(participant_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(meeting)
    }

    /// Finds a meeting by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let meeting = sqlx::query_as::<_, Meeting>(&format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(meeting)
    }

    /// Lists a team's meetings, soonest first
    pub async fn list_by_team(pool: &PgPool, team_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let meetings = sqlx::query_as::<_, Meeting>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE team_id = $1 ORDER BY scheduled_at ASC LIMIT $2 OFFSET $3"
        ))
        .bind(team_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(meetings)
    }

    /// Updates an existing meeting
    ///
    /// Returns the updated meeting, or None if it doesn't exist.
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateMeeting) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE meetings SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.scheduled_at.is_some() {
            bind_count += 1;
            query.push_str(&format!(", scheduled_at = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {MEETING_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Meeting>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(scheduled_at) = data.scheduled_at {
            q = q.bind(scheduled_at);
        }

        let meeting = q.fetch_optional(pool).await?;

        Ok(meeting)
    }

    /// Deletes a meeting and its participant rows
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM meetings WHERE id = $1").bind(id).execute(pool).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds a participant to the meeting
    ///
    /// Returns false if the user was already a participant.
    pub async fn add_participant(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO meeting_participants (meeting_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a participant from the meeting
    pub async fn remove_participant(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM meeting_participants WHERE meeting_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the meeting's participants
    pub async fn participants(pool: &PgPool, id: Uuid) -> Result<Vec<User>, sqlx::Error> {
        let participants = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.name, u.surname, u.gender, u.birth_date,
                   u.password_hash, u.role, u.is_active, u.created_at, u.updated_at
            FROM users u
            JOIN meeting_participants p ON p.user_id = u.id
            WHERE p.meeting_id = $1
            ORDER BY u.surname, u.name
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_meeting_default_is_empty() {
        let update = UpdateMeeting::default();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.scheduled_at.is_none());
    }
}
