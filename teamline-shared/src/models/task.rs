/// Task model and database operations
///
/// Every task belongs to exactly one team, records who created it, and may be
/// assigned to a user. Deleting the team removes its tasks; deleting the
/// assignee only clears the assignment.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(80) NOT NULL,
///     description VARCHAR(1000),
///     status task_status NOT NULL DEFAULT 'open',
///     deadline TIMESTAMPTZ NOT NULL,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     creator_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Newly created, not started
    Open,

    /// Being worked on
    InProgress,

    /// Finished; eligible for evaluation
    Done,
}

impl TaskStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Lifecycle status
    pub status: TaskStatus,

    /// Completion deadline
    pub deadline: DateTime<Utc>,

    /// Assigned user, if any
    pub assignee_id: Option<Uuid>,

    /// Owning team
    pub team_id: Uuid,

    /// User who created the task
    pub creator_id: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub assignee_id: Option<Uuid>,
    pub team_id: Uuid,
    pub creator_id: Uuid,
}

/// Input for updating task fields
///
/// Status and assignee changes have dedicated operations with their own
/// permission rules and are not part of this struct.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub deadline: Option<DateTime<Utc>>,
}

/// Filter for task listings
///
/// All fields are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub team_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Option<Uuid>,
}

const TASK_COLUMNS: &str =
    "id, title, description, status, deadline, assignee_id, team_id, creator_id, created_at, updated_at";

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns an error if the team, creator, or assignee doesn't exist
    /// (foreign key violation).
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, deadline, assignee_id, team_id, creator_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.deadline)
        .bind(data.assignee_id)
        .bind(data.team_id)
        .bind(data.creator_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Lists tasks matching a filter, scoped to what a user can see
    ///
    /// When `visible_to` is Some, only tasks in teams the user belongs to or
    /// owns, plus tasks assigned to them, are returned. Administrators and
    /// managers pass None and see everything.
    pub async fn list(
        pool: &PgPool,
        filter: TaskFilter,
        visible_to: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE ($1::task_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR team_id = $2)
              AND ($3::uuid IS NULL OR assignee_id = $3)
              AND ($4::uuid IS NULL OR creator_id = $4)
              AND ($5::uuid IS NULL
                   OR assignee_id = $5
                   OR team_id IN (SELECT team_id FROM team_members WHERE user_id = $5)
                   OR team_id IN (SELECT id FROM teams WHERE owner_id = $5))
            ORDER BY deadline ASC
            LIMIT $6 OFFSET $7
            "#,
        ))
        .bind(filter.status)
        .bind(filter.team_id)
        .bind(filter.assignee_id)
        .bind(filter.creator_id)
        .bind(visible_to)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates title/description/deadline of an existing task
    ///
    /// Returns the updated task, or None if the task doesn't exist.
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateTask) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.deadline.is_some() {
            bind_count += 1;
            query.push_str(&format!(", deadline = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(deadline) = data.deadline {
            q = q.bind(deadline);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Sets the task's status
    pub async fn set_status(pool: &PgPool, id: Uuid, status: TaskStatus) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Reassigns the task (None clears the assignment)
    pub async fn set_assignee(pool: &PgPool, id: Uuid, assignee_id: Option<Uuid>) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET assignee_id = $2, updated_at = NOW() WHERE id = $1 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(assignee_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// Returns true if a task was deleted. Its evaluation, if any, goes with
    /// it (ON DELETE CASCADE).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1").bind(id).execute(pool).await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Open.as_str(), "open");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }

    #[test]
    fn test_status_serde_roundtrip() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let status: TaskStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(status, TaskStatus::Done);
    }

    #[test]
    fn test_task_filter_default_matches_everything() {
        let filter = TaskFilter::default();
        assert!(filter.status.is_none());
        assert!(filter.team_id.is_none());
        assert!(filter.assignee_id.is_none());
        assert!(filter.creator_id.is_none());
    }
}
