pub mod analytics;
pub mod date_util;
pub mod error;
pub mod import;
pub mod model;
pub mod scope;
pub mod storage;

pub use analytics::{
    client_distribution, completion_trend, personal_metrics, priority_distribution, task_stats,
    user_performance,
};
pub use analytics::{
    ClientSummary, PersonalMetrics, PriorityBucket, TaskStats, TrendPoint, UserPerformance,
};
pub use error::{Error, Result};
pub use import::{import_snapshot, read_snapshot, ImportReport, Snapshot};
pub use model::{TaskPriority, TaskRecord, TaskStatus};
pub use scope::Scope;
pub use storage::Database;
