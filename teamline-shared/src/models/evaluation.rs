/// Evaluation model and database operations
///
/// A finished task can be scored once: the UNIQUE constraint on `task_id`
/// makes a second evaluation a conflict, not a silent overwrite. Scores map
/// to 1-5 for averaging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Five-point evaluation score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "evaluation_score", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Score {
    Unacceptable,
    Bad,
    Satisfactory,
    Good,
    Excellent,
}

impl Score {
    /// Numeric value used for averages (1-5)
    pub fn numeric(&self) -> i32 {
        match self {
            Score::Unacceptable => 1,
            Score::Bad => 2,
            Score::Satisfactory => 3,
            Score::Good => 4,
            Score::Excellent => 5,
        }
    }
}

/// Evaluation model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Evaluation {
    /// Unique evaluation ID
    pub id: Uuid,

    /// The evaluated task (one evaluation per task)
    pub task_id: Uuid,

    /// User who gave the score
    pub evaluator_id: Uuid,

    /// User whose work is scored (the task's assignee at evaluation time)
    pub evaluated_user_id: Uuid,

    /// The score
    pub score: Score,

    /// Optional free-text comment
    pub comment: Option<String>,

    /// When the evaluation was created
    pub created_at: DateTime<Utc>,

    /// When the evaluation was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new evaluation
#[derive(Debug, Clone)]
pub struct CreateEvaluation {
    pub task_id: Uuid,
    pub evaluator_id: Uuid,
    pub evaluated_user_id: Uuid,
    pub score: Score,
    pub comment: Option<String>,
}

const EVALUATION_COLUMNS: &str =
    "id, task_id, evaluator_id, evaluated_user_id, score, comment, created_at, updated_at";

impl Evaluation {
    /// Creates an evaluation for a task
    ///
    /// # Errors
    ///
    /// Returns an error if the task already has an evaluation (unique
    /// constraint violation) or a referenced row doesn't exist.
    pub async fn create(pool: &PgPool, data: CreateEvaluation) -> Result<Self, sqlx::Error> {
        let evaluation = sqlx::query_as::<_, Evaluation>(&format!(
            r#"
            INSERT INTO evaluations (task_id, evaluator_id, evaluated_user_id, score, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {EVALUATION_COLUMNS}
            "#,
        ))
        .bind(data.task_id)
        .bind(data.evaluator_id)
        .bind(data.evaluated_user_id)
        .bind(data.score)
        .bind(data.comment)
        .fetch_one(pool)
        .await?;

        Ok(evaluation)
    }

    /// Finds an evaluation by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let evaluation =
            sqlx::query_as::<_, Evaluation>(&format!("SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE id = $1"))
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(evaluation)
    }

    /// Finds the evaluation of a task, if any
    pub async fn find_by_task(pool: &PgPool, task_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let evaluation = sqlx::query_as::<_, Evaluation>(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE task_id = $1"
        ))
        .bind(task_id)
        .fetch_optional(pool)
        .await?;

        Ok(evaluation)
    }

    /// Lists the evaluations a user has received, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let evaluations = sqlx::query_as::<_, Evaluation>(&format!(
            r#"
            SELECT {EVALUATION_COLUMNS} FROM evaluations
            WHERE evaluated_user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(evaluations)
    }

    /// Updates an evaluation's score and comment
    ///
    /// Returns the updated evaluation, or None if it doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        score: Score,
        comment: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let evaluation = sqlx::query_as::<_, Evaluation>(&format!(
            r#"
            UPDATE evaluations
            SET score = $2, comment = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {EVALUATION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(score)
        .bind(comment)
        .fetch_optional(pool)
        .await?;

        Ok(evaluation)
    }

    /// Average received score of a user on the 1-5 scale
    ///
    /// None if the user has no evaluations yet.
    pub async fn average_for_user(pool: &PgPool, user_id: Uuid) -> Result<Option<f64>, sqlx::Error> {
        let average: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT AVG(
                CASE score
                    WHEN 'unacceptable' THEN 1
                    WHEN 'bad' THEN 2
                    WHEN 'satisfactory' THEN 3
                    WHEN 'good' THEN 4
                    WHEN 'excellent' THEN 5
                END
            )::float8
            FROM evaluations
            WHERE evaluated_user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(average)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_numeric_scale() {
        assert_eq!(Score::Unacceptable.numeric(), 1);
        assert_eq!(Score::Bad.numeric(), 2);
        assert_eq!(Score::Satisfactory.numeric(), 3);
        assert_eq!(Score::Good.numeric(), 4);
        assert_eq!(Score::Excellent.numeric(), 5);
    }

    #[test]
    fn test_score_serde_roundtrip() {
        let json = serde_json::to_string(&Score::Good).unwrap();
        assert_eq!(json, "\"good\"");

        let score: Score = serde_json::from_str("\"unacceptable\"").unwrap();
        assert_eq!(score, Score::Unacceptable);
    }
}
