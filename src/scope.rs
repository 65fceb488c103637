use std::fmt;

use rusqlite::OptionalExtension;

use crate::error::{Error, Result};
use crate::storage::Database;

/// Visibility tier under which a metric is computed.
///
/// Constructed once per request by scope resolution, passed by value into
/// every calculator, never mutated. Authorization happens before a `Scope`
/// exists; every calculator treats the value as already authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// All tasks in the store.
    Global,
    /// Tasks belonging to one organization.
    Organization(i64),
    /// Tasks assigned to one user.
    User(i64),
}

impl Scope {
    /// SQL fragment restricting `tasks t` rows to this scope, plus the
    /// bind value for it. The fragment references positional parameter
    /// `idx` exactly when a bind value is returned.
    pub(crate) fn filter_sql(&self, idx: usize) -> (String, Option<i64>) {
        match *self {
            Scope::Global => (String::new(), None),
            Scope::Organization(org_id) => (format!(" AND t.org_id = ?{idx}"), Some(org_id)),
            Scope::User(user_id) => {
                (format!(" AND t.assigned_user_id = ?{idx}"), Some(user_id))
            }
        }
    }

    /// The organization id, for calculators that only support
    /// organization scope.
    pub fn organization_id(&self) -> Result<i64> {
        match *self {
            Scope::Organization(org_id) => Ok(org_id),
            other => Err(Error::InvalidScope(format!(
                "organization scope required, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Organization(id) => write!(f, "organization {id}"),
            Scope::User(id) => write!(f, "user {id}"),
        }
    }
}

/// Resolve an organization id to a validated scope. Fails with
/// `ScopeNotFound` when the organization does not exist.
pub async fn resolve_organization(db: &Database, org_id: i64) -> Result<Scope> {
    let exists: bool = db
        .reader()
        .call(move |conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM organizations WHERE org_id = ?1",
                [org_id],
                |row| row.get(0),
            )?;
            Ok::<bool, rusqlite::Error>(n > 0)
        })
        .await?;
    if exists {
        Ok(Scope::Organization(org_id))
    } else {
        Err(Error::ScopeNotFound(format!("organization {org_id}")))
    }
}

/// Resolve a username to a validated user scope.
pub async fn resolve_user(db: &Database, username: &str) -> Result<Scope> {
    lookup_user_id(db, username).await.map(Scope::User)
}

/// Look up a user id by username. Fails with `ScopeNotFound` when no such
/// user exists.
pub async fn lookup_user_id(db: &Database, username: &str) -> Result<i64> {
    let username = username.to_string();
    let found: Option<i64> = db
        .reader()
        .call({
            let username = username.clone();
            move |conn| {
                conn.query_row(
                    "SELECT user_id FROM users WHERE username = ?1",
                    [&username],
                    |row| row.get(0),
                )
                .optional()
            }
        })
        .await?;
    found.ok_or_else(|| Error::ScopeNotFound(format!("user {username}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_sql_global_has_no_clause() {
        let (clause, bind) = Scope::Global.filter_sql(1);
        assert!(clause.is_empty());
        assert!(bind.is_none());
    }

    #[test]
    fn test_filter_sql_organization() {
        let (clause, bind) = Scope::Organization(42).filter_sql(3);
        assert_eq!(clause, " AND t.org_id = ?3");
        assert_eq!(bind, Some(42));
    }

    #[test]
    fn test_filter_sql_user() {
        let (clause, bind) = Scope::User(7).filter_sql(2);
        assert_eq!(clause, " AND t.assigned_user_id = ?2");
        assert_eq!(bind, Some(7));
    }

    #[test]
    fn test_organization_id_rejects_other_scopes() {
        assert_eq!(Scope::Organization(5).organization_id().unwrap(), 5);
        assert!(matches!(
            Scope::Global.organization_id(),
            Err(Error::InvalidScope(_))
        ));
        assert!(matches!(
            Scope::User(1).organization_id(),
            Err(Error::InvalidScope(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_organization_not_found() {
        let db = Database::open_memory().await.unwrap();
        let err = resolve_organization(&db, 99).await.unwrap_err();
        assert!(matches!(err, Error::ScopeNotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_user_by_username() {
        let db = Database::open_memory().await.unwrap();
        db.writer()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO users (user_id, username, first_name, last_name)
                     VALUES (1, 'alice', 'Alice', 'Miller')",
                    [],
                )?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();

        assert_eq!(resolve_user(&db, "alice").await.unwrap(), Scope::User(1));
        assert!(matches!(
            resolve_user(&db, "bob").await,
            Err(Error::ScopeNotFound(_))
        ));
    }
}
