/// API route handlers
///
/// One module per resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, refresh, first-admin bootstrap
/// - `users`: Account management
/// - `teams`: Teams and membership
/// - `tasks`: Task lifecycle
/// - `meetings`: Meetings and participants
/// - `calendar`: Day/week/month/upcoming projections
/// - `evaluations`: Task evaluations and averages

pub mod auth;
pub mod calendar;
pub mod evaluations;
pub mod health;
pub mod meetings;
pub mod tasks;
pub mod teams;
pub mod users;

use serde::Deserialize;

/// Common pagination query parameters
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    /// Page size (default 50, capped at 200)
    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Rows to skip
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl Pagination {
    /// Limit clamped to sane bounds
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, 200)
    }

    /// Offset clamped to non-negative
    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.limit(), 50);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_clamping() {
        let p = Pagination { limit: 10_000, offset: -5 };
        assert_eq!(p.limit(), 200);
        assert_eq!(p.offset(), 0);

        let p = Pagination { limit: 0, offset: 10 };
        assert_eq!(p.limit(), 1);
        assert_eq!(p.offset(), 10);
    }
}
