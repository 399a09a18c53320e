/// Calendar projection
///
/// The calendar is a read-only view over two sources: task deadlines and
/// scheduled meetings. Nothing is stored; the projection is a UNION query
/// over a time range, scoped to the teams the requesting user can see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Kind of calendar event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A task's completion deadline
    TaskDeadline,

    /// A scheduled meeting
    Meeting,
}

/// A single event on the calendar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Id of the underlying task or meeting
    pub id: Uuid,

    /// Title of the underlying task or meeting
    pub title: String,

    /// What kind of event this is
    pub event_type: EventType,

    /// When the event occurs (deadline or meeting time)
    pub scheduled_at: DateTime<Utc>,

    /// Team the event belongs to
    pub team_id: Uuid,

    /// For task deadlines: whether the task is done
    pub is_done: bool,

    /// For task deadlines: past due and not done
    pub is_overdue: bool,
}

/// Raw UNION row; `kind` is a text discriminator
#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    kind: String,
    scheduled_at: DateTime<Utc>,
    team_id: Uuid,
    is_done: bool,
}

impl EventRow {
    fn into_event(self, now: DateTime<Utc>) -> CalendarEvent {
        let event_type = if self.kind == "meeting" {
            EventType::Meeting
        } else {
            EventType::TaskDeadline
        };

        let is_overdue = event_type == EventType::TaskDeadline && !self.is_done && self.scheduled_at < now;

        CalendarEvent {
            id: self.id,
            title: self.title,
            event_type,
            scheduled_at: self.scheduled_at,
            team_id: self.team_id,
            is_done: self.is_done,
            is_overdue,
        }
    }
}

/// Fetches calendar events in a time range
///
/// # Arguments
///
/// * `start` / `end` - Inclusive time range
/// * `visible_to` - When Some, restrict to teams the user belongs to or owns
///   (administrators and managers pass None)
/// * `team_id` - Optional additional filter to a single team
pub async fn events_in_range(
    pool: &PgPool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    visible_to: Option<Uuid>,
    team_id: Option<Uuid>,
) -> Result<Vec<CalendarEvent>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, title, kind, scheduled_at, team_id, is_done FROM (
            SELECT t.id, t.title, 'task_deadline' AS kind, t.deadline AS scheduled_at,
                   t.team_id, (t.status = 'done') AS is_done
            FROM tasks t
            UNION ALL
            SELECT m.id, m.title, 'meeting' AS kind, m.scheduled_at,
                   m.team_id, FALSE AS is_done
            FROM meetings m
        ) events
        WHERE scheduled_at >= $1
          AND scheduled_at <= $2
          AND ($3::uuid IS NULL
               OR team_id IN (SELECT team_id FROM team_members WHERE user_id = $3)
               OR team_id IN (SELECT id FROM teams WHERE owner_id = $3))
          AND ($4::uuid IS NULL OR team_id = $4)
        ORDER BY scheduled_at ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .bind(visible_to)
    .bind(team_id)
    .fetch_all(pool)
    .await?;

    let now = Utc::now();
    Ok(rows.into_iter().map(|row| row.into_event(now)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(kind: &str, scheduled_at: DateTime<Utc>, is_done: bool) -> EventRow {
        EventRow {
            id: Uuid::new_v4(),
            title: "event".to_string(),
            kind: kind.to_string(),
            scheduled_at,
            team_id: Uuid::new_v4(),
            is_done,
        }
    }

    #[test]
    fn test_past_unfinished_task_is_overdue() {
        let now = Utc::now();
        let event = row("task_deadline", now - Duration::hours(2), false).into_event(now);

        assert_eq!(event.event_type, EventType::TaskDeadline);
        assert!(event.is_overdue);
    }

    #[test]
    fn test_done_task_is_never_overdue() {
        let now = Utc::now();
        let event = row("task_deadline", now - Duration::hours(2), true).into_event(now);

        assert!(!event.is_overdue);
    }

    #[test]
    fn test_meetings_are_never_overdue() {
        let now = Utc::now();
        let event = row("meeting", now - Duration::hours(2), false).into_event(now);

        assert_eq!(event.event_type, EventType::Meeting);
        assert!(!event.is_overdue);
    }

    #[test]
    fn test_future_deadline_is_not_overdue() {
        let now = Utc::now();
        let event = row("task_deadline", now + Duration::hours(2), false).into_event(now);

        assert!(!event.is_overdue);
    }
}
