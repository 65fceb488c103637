use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::date_util;
use crate::model::{
    ClientRecord, OrganizationRecord, TaskPriority, TaskRecord, TaskStatus, UserRecord,
};
use crate::scope::Scope;

// ── Read primitives ────────────────────────────────────────────────
//
// Each primitive takes a plain connection plus filter arguments, so the
// calculators can batch several of them inside one reader call.

/// Count all tasks in scope.
pub fn count_all(conn: &Connection, scope: &Scope) -> rusqlite::Result<i64> {
    let (clause, bind) = scope.filter_sql(1);
    let sql = format!("SELECT COUNT(*) FROM tasks t WHERE 1=1{clause}");
    count_query(conn, &sql, &[], bind)
}

/// Count tasks in scope with the given status.
pub fn count_by_status(
    conn: &Connection,
    status: TaskStatus,
    scope: &Scope,
) -> rusqlite::Result<i64> {
    let (clause, bind) = scope.filter_sql(2);
    let sql = format!("SELECT COUNT(*) FROM tasks t WHERE t.status = ?1{clause}");
    count_query(conn, &sql, &[status.as_str()], bind)
}

/// Count tasks in scope with the given priority.
pub fn count_by_priority(
    conn: &Connection,
    priority: TaskPriority,
    scope: &Scope,
) -> rusqlite::Result<i64> {
    let (clause, bind) = scope.filter_sql(2);
    let sql = format!("SELECT COUNT(*) FROM tasks t WHERE t.priority = ?1{clause}");
    count_query(conn, &sql, &[priority.as_str()], bind)
}

/// Count overdue tasks in scope: due in the past and not COMPLETED.
/// Tasks without a due date are never overdue.
pub fn count_overdue(conn: &Connection, scope: &Scope) -> rusqlite::Result<i64> {
    let (clause, bind) = scope.filter_sql(1);
    let sql = format!(
        "SELECT COUNT(*) FROM tasks t
         WHERE t.due_at IS NOT NULL
           AND t.due_at < datetime('now')
           AND t.status != 'COMPLETED'{clause}"
    );
    count_query(conn, &sql, &[], bind)
}

/// Completions per calendar date within `[start, end]`, ascending by
/// date. Only rows with status COMPLETED and a non-null `completed_at`
/// inside the window are counted; dates with zero completions do not
/// appear.
pub fn find_completed_in_window(
    conn: &Connection,
    scope: &Scope,
    start: &str,
    end: &str,
) -> rusqlite::Result<Vec<(NaiveDate, i64)>> {
    let (clause, bind) = scope.filter_sql(3);
    let sql = format!(
        "SELECT date(t.completed_at), COUNT(*) FROM tasks t
         WHERE t.status = 'COMPLETED'
           AND t.completed_at IS NOT NULL
           AND t.completed_at >= ?1 AND t.completed_at <= ?2{clause}
         GROUP BY date(t.completed_at)
         ORDER BY date(t.completed_at)"
    );
    let mut stmt = conn.prepare(&sql)?;
    stmt.raw_bind_parameter(1, start)?;
    stmt.raw_bind_parameter(2, end)?;
    if let Some(v) = bind {
        stmt.raw_bind_parameter(3, v)?;
    }

    let mut out = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        let date_str: String = row.get(0)?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        out.push((date, row.get::<_, i64>(1)?));
    }
    Ok(out)
}

/// One row per client with at least one task in the organization,
/// ordered by task count descending. Clients without tasks are absent.
#[derive(Debug, Clone)]
pub struct ClientTaskRow {
    pub client_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub task_count: i64,
    pub completed_count: i64,
}

pub fn find_tasks_by_client(
    conn: &Connection,
    org_id: i64,
) -> rusqlite::Result<Vec<ClientTaskRow>> {
    let mut stmt = conn.prepare(
        "SELECT c.client_id, c.first_name, c.last_name,
                COUNT(t.task_id),
                SUM(CASE WHEN t.status = 'COMPLETED' THEN 1 ELSE 0 END)
         FROM clients c
         JOIN tasks t ON t.client_id = c.client_id
         WHERE c.org_id = ?1
         GROUP BY c.client_id, c.first_name, c.last_name
         ORDER BY COUNT(t.task_id) DESC",
    )?;
    let rows = stmt.query_map([org_id], |row| {
        Ok(ClientTaskRow {
            client_id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            task_count: row.get(3)?,
            completed_count: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        })
    })?;
    rows.collect()
}

/// All tasks assigned to a user, as full records. Latency and on-time
/// computations need both timestamp columns, not just counts.
pub fn find_tasks_by_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<TaskRecord>> {
    let mut stmt = conn.prepare(
        "SELECT task_id, title, description, status, priority,
                due_at, completed_at, created_at, updated_at,
                org_id, assigned_user_id, created_by_user_id, client_id, finished
         FROM tasks t
         WHERE t.assigned_user_id = ?1
         ORDER BY task_id",
    )?;
    let rows = stmt.query_map([user_id], task_from_row)?;
    rows.collect()
}

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRecord> {
    let status_str: String = row.get(3)?;
    let status = TaskStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown status: {status_str}").into(),
        )
    })?;
    let priority_str: String = row.get(4)?;
    let priority = TaskPriority::parse(&priority_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown priority: {priority_str}").into(),
        )
    })?;

    Ok(TaskRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status,
        priority,
        due_at: get_datetime_opt(row, 5)?,
        completed_at: get_datetime_opt(row, 6)?,
        created_at: get_datetime(row, 7)?,
        updated_at: get_datetime(row, 8)?,
        org_id: row.get(9)?,
        assigned_user_id: row.get(10)?,
        created_by_user_id: row.get(11)?,
        client_id: row.get(12)?,
        finished: row.get::<_, i64>(13)? != 0,
    })
}

fn get_datetime(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    date_util::parse_sql_datetime(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("invalid datetime: {raw}").into(),
        )
    })
}

fn get_datetime_opt(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(None),
        Some(s) => date_util::parse_sql_datetime(&s)
            .map(Some)
            .ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    format!("invalid datetime: {s}").into(),
                )
            }),
    }
}

// ── Users ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UserRow {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

pub fn get_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Option<UserRow>> {
    conn.query_row(
        "SELECT user_id, username, first_name, last_name FROM users WHERE user_id = ?1",
        [user_id],
        |row| {
            Ok(UserRow {
                user_id: row.get(0)?,
                username: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
            })
        },
    )
    .optional()
}

// ── Upserts (snapshot import path) ─────────────────────────────────

pub fn upsert_organization(
    conn: &Connection,
    org: &OrganizationRecord,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO organizations (org_id, name) VALUES (?1, ?2)
         ON CONFLICT(org_id) DO UPDATE SET name = excluded.name",
        params![org.org_id, org.name],
    )?;
    Ok(())
}

pub fn upsert_user(conn: &Connection, user: &UserRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO users (user_id, username, first_name, last_name, org_id)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id) DO UPDATE SET
            username = excluded.username, first_name = excluded.first_name,
            last_name = excluded.last_name, org_id = excluded.org_id",
        params![
            user.user_id,
            user.username,
            user.first_name,
            user.last_name,
            user.org_id,
        ],
    )?;
    Ok(())
}

pub fn upsert_client(conn: &Connection, client: &ClientRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO clients (client_id, first_name, last_name, email, org_id)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(client_id) DO UPDATE SET
            first_name = excluded.first_name, last_name = excluded.last_name,
            email = excluded.email, org_id = excluded.org_id",
        params![
            client.client_id,
            client.first_name,
            client.last_name,
            client.email,
            client.org_id,
        ],
    )?;
    Ok(())
}

pub fn upsert_task(conn: &Connection, task: &TaskRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO tasks (
            task_id, title, description, status, priority,
            due_at, completed_at, created_at, updated_at,
            org_id, assigned_user_id, created_by_user_id, client_id, finished
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        ON CONFLICT(task_id) DO UPDATE SET
            title=excluded.title, description=excluded.description,
            status=excluded.status, priority=excluded.priority,
            due_at=excluded.due_at, completed_at=excluded.completed_at,
            created_at=excluded.created_at, updated_at=excluded.updated_at,
            org_id=excluded.org_id, assigned_user_id=excluded.assigned_user_id,
            created_by_user_id=excluded.created_by_user_id,
            client_id=excluded.client_id, finished=excluded.finished",
        params![
            task.id,
            task.title,
            task.description,
            task.status.as_str(),
            task.priority.as_str(),
            task.due_at.map(date_util::to_sql_datetime),
            task.completed_at.map(date_util::to_sql_datetime),
            date_util::to_sql_datetime(task.created_at),
            date_util::to_sql_datetime(task.updated_at),
            task.org_id,
            task.assigned_user_id,
            task.created_by_user_id,
            task.client_id,
            task.finished as i32,
        ],
    )?;
    Ok(())
}

// ── Shared helpers ─────────────────────────────────────────────────

/// Run a single-value COUNT query with optional text parameters followed
/// by an optional scope bind.
fn count_query(
    conn: &Connection,
    sql: &str,
    text_params: &[&str],
    scope_bind: Option<i64>,
) -> rusqlite::Result<i64> {
    let mut stmt = conn.prepare(sql)?;
    let mut idx = 1;
    for p in text_params {
        stmt.raw_bind_parameter(idx, p)?;
        idx += 1;
    }
    if let Some(v) = scope_bind {
        stmt.raw_bind_parameter(idx, v)?;
    }
    let mut rows = stmt.raw_query();
    let row = rows.next()?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
    row.get(0)
}
