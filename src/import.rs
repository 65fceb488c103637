//! JSON snapshot import.
//!
//! The analytics engine itself never writes. This module is the single
//! write path: it loads a JSON export of the upstream task-tracking
//! backend (organizations, users, clients, tasks) into the local store,
//! upserting in dependency order inside one transaction.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{ClientRecord, OrganizationRecord, TaskRecord, UserRecord};
use crate::storage::{repository, Database};

/// A snapshot of the upstream store. Timestamps use chrono's default
/// JSON form (`2025-03-14T09:26:53`).
#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub organizations: Vec<OrganizationRecord>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub clients: Vec<ClientRecord>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

/// Row counts applied by an import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub organizations: usize,
    pub users: usize,
    pub clients: usize,
    pub tasks: usize,
}

/// Read a snapshot from a JSON file.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| Error::Import(format!("cannot open {}: {e}", path.display())))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| Error::Import(format!("cannot parse {}: {e}", path.display())))
}

/// Apply a snapshot to the store. Upserts everything in one transaction;
/// a failure rolls the whole import back.
pub async fn import_snapshot(db: &Database, snapshot: Snapshot) -> Result<ImportReport> {
    let report = ImportReport {
        organizations: snapshot.organizations.len(),
        users: snapshot.users.len(),
        clients: snapshot.clients.len(),
        tasks: snapshot.tasks.len(),
    };

    db.writer()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for org in &snapshot.organizations {
                repository::upsert_organization(&tx, org)?;
            }
            for user in &snapshot.users {
                repository::upsert_user(&tx, user)?;
            }
            for client in &snapshot.clients {
                repository::upsert_client(&tx, client)?;
            }
            for task in &snapshot.tasks {
                repository::upsert_task(&tx, task)?;
            }
            tx.commit()?;
            Ok::<(), rusqlite::Error>(())
        })
        .await?;

    log::info!(
        "imported {} orgs, {} users, {} clients, {} tasks",
        report.organizations,
        report.users,
        report.clients,
        report.tasks
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskStatus;
    use crate::scope::Scope;

    #[tokio::test]
    async fn test_import_round_trip() {
        let json = r#"{
            "organizations": [{"org_id": 1, "name": "Acme"}],
            "users": [{"user_id": 1, "username": "alice", "first_name": "Alice", "last_name": "Miller", "org_id": 1}],
            "clients": [{"client_id": 5, "first_name": "Carol", "last_name": "Jones", "org_id": 1}],
            "tasks": [{
                "id": 9,
                "title": "Quarterly report",
                "status": "COMPLETED",
                "priority": "HIGH",
                "created_at": "2025-03-01T08:00:00",
                "updated_at": "2025-03-02T10:00:00",
                "completed_at": "2025-03-02T10:00:00",
                "org_id": 1,
                "assigned_user_id": 1,
                "client_id": 5,
                "finished": true
            }]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        let db = Database::open_memory().await.unwrap();
        let report = import_snapshot(&db, snapshot).await.unwrap();
        assert_eq!(report.organizations, 1);
        assert_eq!(report.tasks, 1);

        let tasks = db
            .reader()
            .call(|conn| repository::find_tasks_by_user(conn, 1))
            .await
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 9);
        assert_eq!(tasks[0].status, TaskStatus::Completed);
        assert!(tasks[0].completed_at.is_some());

        let total = db
            .reader()
            .call(|conn| repository::count_all(conn, &Scope::Organization(1)))
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let db = Database::open_memory().await.unwrap();
        let make = || Snapshot {
            organizations: vec![OrganizationRecord {
                org_id: 1,
                name: "Acme".into(),
            }],
            ..Default::default()
        };
        import_snapshot(&db, make()).await.unwrap();
        import_snapshot(&db, make()).await.unwrap();

        let count: i64 = db
            .reader()
            .call(|conn| {
                Ok::<i64, rusqlite::Error>(conn.query_row(
                    "SELECT COUNT(*) FROM organizations",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_read_snapshot_missing_file() {
        let err = read_snapshot("/nonexistent/snapshot.json").unwrap_err();
        assert!(matches!(err, Error::Import(_)));
    }
}
