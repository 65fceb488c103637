use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Task lifecycle status. Fixed set; stored as TEXT in the tasks table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    OnHold,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
        TaskStatus::OnHold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
            TaskStatus::OnHold => "ON_HOLD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

/// Priority tier. Fixed exhaustive classification, independent of the
/// data actually observed in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Reporting order: LOW, MEDIUM, HIGH, URGENT.
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
            TaskPriority::Urgent => "URGENT",
        }
    }

    /// Label used in distribution reports.
    pub fn display_label(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW PRIORITY",
            TaskPriority::Medium => "MEDIUM PRIORITY",
            TaskPriority::High => "HIGH PRIORITY",
            TaskPriority::Urgent => "URGENT PRIORITY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

/// A task record as the analytics engine sees it. Read-only view; the
/// engine never writes these back.
///
/// `completed_at` is supposed to be set exactly when `status` is
/// COMPLETED, but upstream writers have been observed to violate that.
/// Time-based computations (trend, latency, on-time) therefore require a
/// non-null `completed_at` and never derive it from `status` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default)]
    pub org_id: Option<i64>,
    #[serde(default)]
    pub assigned_user_id: Option<i64>,
    #[serde(default)]
    pub created_by_user_id: Option<i64>,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub finished: bool,
}

/// An organization row, as imported into the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub org_id: i64,
    pub name: String,
}

/// A user row, as imported into the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub org_id: Option<i64>,
}

/// A client row, as imported into the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub client_id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub org_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("DONE"), None);
        assert_eq!(TaskStatus::parse(""), None);
    }

    #[test]
    fn test_priority_round_trip() {
        for priority in TaskPriority::ALL {
            assert_eq!(TaskPriority::parse(priority.as_str()), Some(priority));
        }
        assert_eq!(TaskPriority::parse("CRITICAL"), None);
    }

    #[test]
    fn test_priority_report_order() {
        let labels: Vec<&str> = TaskPriority::ALL.iter().map(|p| p.display_label()).collect();
        assert_eq!(
            labels,
            vec![
                "LOW PRIORITY",
                "MEDIUM PRIORITY",
                "HIGH PRIORITY",
                "URGENT PRIORITY"
            ]
        );
    }

    #[test]
    fn test_status_serde_uses_wire_names() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let back: TaskStatus = serde_json::from_str("\"ON_HOLD\"").unwrap();
        assert_eq!(back, TaskStatus::OnHold);
    }
}
