//! User directory
//!
//! Lookup of principals and their role assignments.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use auth::Role;
use db::{sqlx, DbPool, MySql, Row};
use error::DatabaseError;

use crate::models::{Principal, RoleAssignment};

/// Directory queries consumed by login and access decisions.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a principal with its role assignments by unique name
    async fn find_by_name(&self, name: &str) -> Result<Option<Principal>, DatabaseError>;

    /// Roles held by a principal; empty when the name is unknown
    async fn find_roles(&self, name: &str) -> Result<HashSet<Role>, DatabaseError>;

    /// Whether a principal named `name` exists and holds any of `roles`.
    ///
    /// Answered in one lookup so identity and membership are read together.
    async fn exists_with_any_role(
        &self,
        name: &str,
        roles: &HashSet<Role>,
    ) -> Result<bool, DatabaseError>;
}

fn lock_poisoned() -> DatabaseError {
    DatabaseError::QueryFailed("directory lock poisoned".to_string())
}

/// In-memory directory for development and testing
pub struct InMemoryDirectory {
    principals: RwLock<HashMap<String, Principal>>,
    next_id: AtomicI64,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            principals: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Store a principal, assigning ids. Names and emails are unique.
    pub fn insert(&self, principal: Principal) -> Result<Principal, DatabaseError> {
        let mut principals = self.principals.write().map_err(|_| lock_poisoned())?;

        if principals.contains_key(&principal.name) {
            return Err(DatabaseError::DuplicateEntry(format!("name {}", principal.name)));
        }
        if principals.values().any(|p| p.email == principal.email) {
            return Err(DatabaseError::DuplicateEntry(format!("email {}", principal.email)));
        }

        let mut stored = principal;
        stored.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst));
        for role in &mut stored.roles {
            role.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst));
        }
        principals.insert(stored.name.clone(), stored.clone());
        Ok(stored)
    }

    pub fn len(&self) -> usize {
        self.principals.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Option<Principal>, DatabaseError> {
        let principals = self.principals.read().map_err(|_| lock_poisoned())?;
        Ok(principals.get(name).cloned())
    }

    async fn find_roles(&self, name: &str) -> Result<HashSet<Role>, DatabaseError> {
        let principals = self.principals.read().map_err(|_| lock_poisoned())?;
        Ok(principals.get(name).map(Principal::role_set).unwrap_or_default())
    }

    async fn exists_with_any_role(
        &self,
        name: &str,
        roles: &HashSet<Role>,
    ) -> Result<bool, DatabaseError> {
        let principals = self.principals.read().map_err(|_| lock_poisoned())?;
        Ok(principals
            .get(name)
            .map(|p| p.has_any_role(roles))
            .unwrap_or(false))
    }
}

/// Tables backing [`MySqlUserDirectory`]. Role rows go with their user.
pub const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS users (
        id BIGINT AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(255) NOT NULL UNIQUE,
        email VARCHAR(255) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS authorities (
        id BIGINT AUTO_INCREMENT PRIMARY KEY,
        authority VARCHAR(32) NOT NULL,
        user_id BIGINT NOT NULL,
        CONSTRAINT fk_authorities_user FOREIGN KEY (user_id)
            REFERENCES users (id) ON DELETE CASCADE
    )",
];

fn query_failed(e: sqlx::Error) -> DatabaseError {
    tracing::error!("User directory query failed: {}", e);
    DatabaseError::QueryFailed(e.to_string())
}

/// One-row query answering whether `name` holds any of `roles` (as 0/1).
fn membership_query<'a>(name: &'a str, roles: &HashSet<Role>) -> sqlx::QueryBuilder<'a, MySql> {
    let mut builder = sqlx::QueryBuilder::<MySql>::new(
        "SELECT CAST(EXISTS(SELECT 1 FROM users u JOIN authorities a ON a.user_id = u.id WHERE u.name = ",
    );
    builder.push_bind(name);
    builder.push(" AND a.authority IN (");
    {
        let mut separated = builder.separated(", ");
        for role in roles {
            separated.push_bind(role.as_str());
        }
        separated.push_unseparated(")) AS SIGNED)");
    }
    builder
}

/// MySQL-backed directory over the `users` and `authorities` tables
#[derive(Clone)]
pub struct MySqlUserDirectory {
    pool: DbPool,
}

impl MySqlUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create the directory tables if they do not exist yet
    pub async fn init_schema(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(query_failed)?;
        }
        tracing::info!("User directory schema ready");
        Ok(())
    }

    async fn assignments(&self, user_id: i64) -> Result<Vec<RoleAssignment>, DatabaseError> {
        let rows = sqlx::query("SELECT id, authority FROM authorities WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed)?;

        let mut assignments = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(query_failed)?;
            let authority: String = row.try_get("authority").map_err(query_failed)?;
            match Role::normalize(&authority) {
                Some(role) => assignments.push(RoleAssignment {
                    id: Some(id),
                    authority: role,
                }),
                None => tracing::warn!(user_id, authority = %authority, "Skipping unknown stored authority"),
            }
        }
        Ok(assignments)
    }
}

#[async_trait]
impl UserDirectory for MySqlUserDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Option<Principal>, DatabaseError> {
        let row = sqlx::query("SELECT id, name, email, password FROM users WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: i64 = row.try_get("id").map_err(query_failed)?;
        let principal = Principal {
            id: Some(id),
            name: row.try_get("name").map_err(query_failed)?,
            email: row.try_get("email").map_err(query_failed)?,
            password_hash: row.try_get("password").map_err(query_failed)?,
            roles: self.assignments(id).await?,
        };
        Ok(Some(principal))
    }

    async fn find_roles(&self, name: &str) -> Result<HashSet<Role>, DatabaseError> {
        let authorities: Vec<String> = sqlx::query_scalar(
            "SELECT a.authority FROM authorities a JOIN users u ON a.user_id = u.id WHERE u.name = ?",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(authorities
            .iter()
            .filter_map(|a| Role::normalize(a))
            .collect())
    }

    async fn exists_with_any_role(
        &self,
        name: &str,
        roles: &HashSet<Role>,
    ) -> Result<bool, DatabaseError> {
        // `IN ()` is not valid SQL; an empty set can never match anyway
        if roles.is_empty() {
            return Ok(false);
        }

        let mut builder = membership_query(name, roles);
        let exists: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed)?;
        Ok(exists != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn alice() -> Principal {
        Principal::new("alice", "alice@example.com", "hash").with_role(Role::User)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let directory = InMemoryDirectory::new();
        let stored = assert_ok!(directory.insert(alice()));
        assert!(stored.id.is_some());
        assert!(stored.roles[0].id.is_some());

        let found = directory.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(found.email, "alice@example.com");
        assert!(directory.find_by_name("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_or_email_rejected() {
        let directory = InMemoryDirectory::new();
        assert_ok!(directory.insert(alice()));

        let err = assert_err!(directory.insert(alice()));
        assert!(matches!(err, DatabaseError::DuplicateEntry(_)));

        let same_email = Principal::new("alice2", "alice@example.com", "hash");
        assert_err!(directory.insert(same_email));
        assert_eq!(directory.len(), 1);
    }

    #[tokio::test]
    async fn test_find_roles() {
        let directory = InMemoryDirectory::new();
        directory.insert(alice().with_role(Role::Admin)).unwrap();

        let roles = directory.find_roles("alice").await.unwrap();
        assert_eq!(roles, HashSet::from([Role::User, Role::Admin]));
        assert!(directory.find_roles("nobody").await.unwrap().is_empty());
    }

    const MEMBERSHIP_PREFIX: &str =
        "SELECT CAST(EXISTS(SELECT 1 FROM users u JOIN authorities a ON a.user_id = u.id WHERE u.name = ?";

    #[test]
    fn test_membership_query_single_role() {
        let roles = HashSet::from([Role::Admin]);
        let builder = membership_query("alice", &roles);
        assert_eq!(
            builder.sql(),
            format!("{} AND a.authority IN (?)) AS SIGNED)", MEMBERSHIP_PREFIX)
        );
    }

    #[test]
    fn test_membership_query_binds_every_role() {
        let roles = HashSet::from([Role::User, Role::Admin]);
        let builder = membership_query("alice", &roles);
        assert_eq!(
            builder.sql(),
            format!("{} AND a.authority IN (?, ?)) AS SIGNED)", MEMBERSHIP_PREFIX)
        );
    }

    #[tokio::test]
    async fn test_exists_with_any_role() {
        let directory = InMemoryDirectory::new();
        directory.insert(alice()).unwrap();

        let user_or_admin = HashSet::from([Role::User, Role::Admin]);
        let admin = HashSet::from([Role::Admin]);

        assert!(directory.exists_with_any_role("alice", &user_or_admin).await.unwrap());
        assert!(!directory.exists_with_any_role("alice", &admin).await.unwrap());
        assert!(!directory.exists_with_any_role("alice", &HashSet::new()).await.unwrap());
        assert!(!directory.exists_with_any_role("ghost", &user_or_admin).await.unwrap());
    }
}
