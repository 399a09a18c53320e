/// Calendar endpoints
///
/// Read-only projections over task deadlines and meetings:
///
/// - `GET /api/calendar/day?date=2025-03-14` - One day
/// - `GET /api/calendar/week?date=2025-03-14` - The Monday-Sunday week containing the date
/// - `GET /api/calendar/month?year=2025&month=3` - One month
/// - `GET /api/calendar/upcoming` - The next seven days, grouped
///
/// Employees see events of teams they belong to or own; managers and
/// administrators see everything. An optional `team_id` narrows any view.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use teamline_shared::{
    auth::middleware::Principal,
    models::calendar::{events_in_range, CalendarEvent},
    models::user::Role,
};
use uuid::Uuid;

/// Query for the day and week views
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    /// Anchor date (YYYY-MM-DD)
    pub date: NaiveDate,

    /// Optional team filter
    pub team_id: Option<Uuid>,
}

/// Query for the month view
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,

    /// 1-12
    pub month: u32,

    /// Optional team filter
    pub team_id: Option<Uuid>,
}

/// Query for the upcoming view
#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    /// Optional team filter
    pub team_id: Option<Uuid>,
}

/// A time range with its events
#[derive(Debug, Serialize)]
pub struct CalendarRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub events: Vec<CalendarEvent>,
    pub total_events: usize,
    pub has_overdue: bool,
}

impl CalendarRange {
    fn new(start: DateTime<Utc>, end: DateTime<Utc>, events: Vec<CalendarEvent>) -> Self {
        let has_overdue = events.iter().any(|e| e.is_overdue);
        Self {
            start,
            end,
            total_events: events.len(),
            has_overdue,
            events,
        }
    }
}

/// The upcoming seven days, grouped
#[derive(Debug, Serialize)]
pub struct UpcomingResponse {
    pub today: Vec<CalendarEvent>,
    pub tomorrow: Vec<CalendarEvent>,
    pub later_this_week: Vec<CalendarEvent>,
}

fn visibility(principal: &Principal) -> Option<Uuid> {
    match principal.role() {
        Role::Administrator | Role::Manager => None,
        Role::Employee => Some(principal.id()),
    }
}

fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1) - Duration::seconds(1);
    (start, end)
}

/// One day of events
pub async fn day(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<CalendarRange>> {
    let (start, end) = day_bounds(query.date);

    let events = events_in_range(&state.db, start, end, visibility(&principal), query.team_id).await?;

    Ok(Json(CalendarRange::new(start, end, events)))
}

/// The Monday-Sunday week containing the anchor date
pub async fn week(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<CalendarRange>> {
    let monday = query.date - Duration::days(query.date.weekday().num_days_from_monday() as i64);
    let start = monday.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(7) - Duration::seconds(1);

    let events = events_in_range(&state.db, start, end, visibility(&principal), query.team_id).await?;

    Ok(Json(CalendarRange::new(start, end, events)))
}

/// One month of events
pub async fn month(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<MonthQuery>,
) -> ApiResult<Json<CalendarRange>> {
    let first = NaiveDate::from_ymd_opt(query.year, query.month, 1)
        .ok_or_else(|| ApiError::BadRequest("Invalid year/month".to_string()))?;

    let next_month = if query.month == 12 {
        NaiveDate::from_ymd_opt(query.year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(query.year, query.month + 1, 1)
    }
    .ok_or_else(|| ApiError::BadRequest("Invalid year/month".to_string()))?;

    let start = first.and_time(NaiveTime::MIN).and_utc();
    let end = next_month.and_time(NaiveTime::MIN).and_utc() - Duration::seconds(1);

    let events = events_in_range(&state.db, start, end, visibility(&principal), query.team_id).await?;

    Ok(Json(CalendarRange::new(start, end, events)))
}

/// The next seven days, grouped into today / tomorrow / later
pub async fn upcoming(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<UpcomingResponse>> {
    let now = Utc::now();
    let today = now.date_naive();
    let (start_today, end_today) = day_bounds(today);
    let (start_tomorrow, end_tomorrow) = day_bounds(today + Duration::days(1));
    let end = start_today + Duration::days(7) - Duration::seconds(1);

    // Start from "now", not midnight: events earlier today already happened.
    let events = events_in_range(&state.db, now, end, visibility(&principal), query.team_id).await?;

    let mut response = UpcomingResponse {
        today: Vec::new(),
        tomorrow: Vec::new(),
        later_this_week: Vec::new(),
    };

    for event in events {
        if event.scheduled_at <= end_today {
            response.today.push(event);
        } else if event.scheduled_at >= start_tomorrow && event.scheduled_at <= end_tomorrow {
            response.tomorrow.push(event);
        } else {
            response.later_this_week.push(event);
        }
    }

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bounds_cover_whole_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let (start, end) = day_bounds(date);

        assert_eq!(start.to_rfc3339(), "2025-03-14T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-03-14T23:59:59+00:00");
    }

    #[test]
    fn test_week_anchor_maps_to_monday() {
        // 2025-03-14 is a Friday; its week starts Monday 2025-03-10.
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);

        assert_eq!(monday, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    }
}
