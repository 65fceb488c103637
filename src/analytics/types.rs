use chrono::NaiveDate;
use serde::Serialize;

/// Headline stats for a scope: totals, status buckets, completion rate,
/// overdue count. PENDING and IN_PROGRESS are merged into one reported
/// bucket.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskStats {
    pub total: u64,
    pub pending_or_in_progress: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub on_hold: u64,
    /// Percentage of in-scope tasks whose status is COMPLETED. Always 0.0
    /// when the scope is empty.
    pub completion_rate: f64,
    pub overdue_count: u64,
}

/// One priority tier in a distribution report.
#[derive(Debug, Clone, Serialize)]
pub struct PriorityBucket {
    pub label: String,
    pub count: u64,
    pub percentage: f64,
}

/// Completions on one calendar date.
///
/// Trend series are sparse: dates without completions are omitted, so a
/// charting caller must fill gaps itself.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub count: u64,
    pub label: String,
}

/// Per-client task counts and completion rate within one organization.
/// Built per query, never persisted. Emitted entries always have
/// `task_count > 0`.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
    pub client_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub task_count: u64,
    pub completed_count: u64,
    pub completion_rate: f64,
}

/// Performance summary for one user.
#[derive(Debug, Clone, Serialize)]
pub struct UserPerformance {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub total_assigned: u64,
    pub total_completed: u64,
    pub completion_rate: f64,
    pub avg_completion_time_hours: f64,
}

/// Self-service metrics for one user.
#[derive(Debug, Clone, Serialize)]
pub struct PersonalMetrics {
    pub avg_completion_time_hours: f64,
    pub on_time_rate: f64,
    pub completed_count: u64,
    pub extra: String,
}
