pub mod types;

pub use types::*;

use chrono::Duration;

use crate::date_util;
use crate::error::{Error, Result};
use crate::model::{TaskPriority, TaskRecord, TaskStatus};
use crate::scope::Scope;
use crate::storage::{repository, Database};

/// Label attached to every completion-trend point.
const TREND_LABEL: &str = "Tasks Completed";

/// Headline stats for a scope: totals, status buckets, completion rate,
/// overdue count. An empty scope yields all-zero stats, never an error.
pub async fn task_stats(db: &Database, scope: Scope) -> Result<TaskStats> {
    db.reader()
        .call(move |conn| {
            let total = repository::count_all(conn, &scope)?;
            let pending = repository::count_by_status(conn, TaskStatus::Pending, &scope)?;
            let in_progress = repository::count_by_status(conn, TaskStatus::InProgress, &scope)?;
            let completed = repository::count_by_status(conn, TaskStatus::Completed, &scope)?;
            let cancelled = repository::count_by_status(conn, TaskStatus::Cancelled, &scope)?;
            let on_hold = repository::count_by_status(conn, TaskStatus::OnHold, &scope)?;
            let overdue = repository::count_overdue(conn, &scope)?;

            Ok::<TaskStats, rusqlite::Error>(TaskStats {
                total: total as u64,
                pending_or_in_progress: (pending + in_progress) as u64,
                completed: completed as u64,
                cancelled: cancelled as u64,
                on_hold: on_hold as u64,
                completion_rate: pct(completed, total),
                overdue_count: overdue as u64,
            })
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))
}

/// Percentage breakdown of in-scope tasks by priority tier, in fixed
/// order LOW, MEDIUM, HIGH, URGENT.
///
/// A scope with zero tasks returns an empty vec rather than four
/// zero-percentage entries; callers rely on that short-circuit.
pub async fn priority_distribution(db: &Database, scope: Scope) -> Result<Vec<PriorityBucket>> {
    db.reader()
        .call(move |conn| {
            let total = repository::count_all(conn, &scope)?;
            if total == 0 {
                return Ok::<Vec<PriorityBucket>, rusqlite::Error>(Vec::new());
            }

            let mut buckets = Vec::with_capacity(TaskPriority::ALL.len());
            for priority in TaskPriority::ALL {
                let count = repository::count_by_priority(conn, priority, &scope)?;
                buckets.push(PriorityBucket {
                    label: priority.display_label().to_string(),
                    count: count as u64,
                    percentage: pct(count, total),
                });
            }
            Ok(buckets)
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))
}

/// Day-bucketed completions over the trailing window `[now - days, now]`
/// (UTC), ascending by date.
///
/// The series is sparse: dates with zero completions are omitted, so a
/// caller building a chart must fill gaps itself. Only tasks with status
/// COMPLETED and a non-null `completed_at` inside the window count; the
/// stamp is never inferred from `status`.
pub async fn completion_trend(db: &Database, scope: Scope, days: u32) -> Result<Vec<TrendPoint>> {
    if days == 0 {
        return Err(Error::InvalidWindow(days));
    }

    let end = date_util::now_utc();
    let start = end - Duration::days(days as i64);
    let start_s = date_util::to_sql_datetime(start);
    let end_s = date_util::to_sql_datetime(end);

    db.reader()
        .call(move |conn| {
            let rows = repository::find_completed_in_window(conn, &scope, &start_s, &end_s)?;
            Ok::<Vec<TrendPoint>, rusqlite::Error>(
                rows.into_iter()
                    .map(|(date, count)| TrendPoint {
                        date,
                        count: count as u64,
                        label: TREND_LABEL.to_string(),
                    })
                    .collect(),
            )
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))
}

/// Per-client task counts and completion rates within one organization,
/// ordered by task count descending. Clients without tasks are absent.
///
/// Only valid for organization scope; anything else is a caller bug and
/// fails fast with `InvalidScope`.
pub async fn client_distribution(db: &Database, scope: Scope) -> Result<Vec<ClientSummary>> {
    let org_id = scope.organization_id()?;

    db.reader()
        .call(move |conn| {
            let rows = repository::find_tasks_by_client(conn, org_id)?;
            Ok::<Vec<ClientSummary>, rusqlite::Error>(
                rows.into_iter()
                    .map(|r| ClientSummary {
                        client_id: r.client_id,
                        first_name: r.first_name,
                        last_name: r.last_name,
                        task_count: r.task_count as u64,
                        completed_count: r.completed_count as u64,
                        completion_rate: pct(r.completed_count, r.task_count),
                    })
                    .collect(),
            )
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))
}

/// Performance summary for one user: assigned/completed counts,
/// completion rate, and average completion latency in hours.
pub async fn user_performance(db: &Database, user_id: i64) -> Result<UserPerformance> {
    let user = db
        .reader()
        .call(move |conn| repository::get_user(conn, user_id))
        .await?
        .ok_or_else(|| Error::ScopeNotFound(format!("user {user_id}")))?;

    let tasks = db
        .reader()
        .call(move |conn| repository::find_tasks_by_user(conn, user_id))
        .await?;

    let total_assigned = tasks.len() as i64;
    let completed: Vec<&TaskRecord> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .collect();
    let total_completed = completed.len() as i64;

    Ok(UserPerformance {
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        total_assigned: total_assigned as u64,
        total_completed: total_completed as u64,
        completion_rate: pct(total_completed, total_assigned),
        avg_completion_time_hours: avg_completion_hours(&completed),
    })
}

/// Self-service metrics for one user: latency, on-time rate, completed
/// count.
pub async fn personal_metrics(db: &Database, user_id: i64) -> Result<PersonalMetrics> {
    let user = db
        .reader()
        .call(move |conn| repository::get_user(conn, user_id))
        .await?;
    if user.is_none() {
        return Err(Error::ScopeNotFound(format!("user {user_id}")));
    }

    let tasks = db
        .reader()
        .call(move |conn| repository::find_tasks_by_user(conn, user_id))
        .await?;

    let completed: Vec<&TaskRecord> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .collect();

    Ok(PersonalMetrics {
        avg_completion_time_hours: avg_completion_hours(&completed),
        on_time_rate: on_time_rate(&completed),
        completed_count: completed.len() as u64,
        extra: "N/A".to_string(),
    })
}

// ── Shared ratio utilities ─────────────────────────────────────────

/// `part / total` as a percentage, 0.0 when the denominator is zero.
fn pct(part: i64, total: i64) -> f64 {
    if total > 0 {
        part as f64 * 100.0 / total as f64
    } else {
        0.0
    }
}

/// Mean of whole-hour completion deltas over tasks carrying a completion
/// stamp. 0.0 when no task qualifies.
fn avg_completion_hours(tasks: &[&TaskRecord]) -> f64 {
    let deltas: Vec<i64> = tasks
        .iter()
        .filter_map(|t| t.completed_at.map(|done| (done - t.created_at).num_hours()))
        .collect();
    if deltas.is_empty() {
        return 0.0;
    }
    deltas.iter().sum::<i64>() as f64 / deltas.len() as f64
}

/// Share of tasks completed at or before their due date. Tasks missing
/// either timestamp are excluded from numerator and denominator.
fn on_time_rate(tasks: &[&TaskRecord]) -> f64 {
    let mut eligible = 0i64;
    let mut on_time = 0i64;
    for t in tasks {
        if let (Some(due), Some(done)) = (t.due_at, t.completed_at) {
            eligible += 1;
            if done <= due {
                on_time += 1;
            }
        }
    }
    pct(on_time, eligible)
}
