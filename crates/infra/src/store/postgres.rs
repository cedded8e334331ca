//! Postgres-backed account store.
//!
//! ## Schema
//!
//! `migrate()` creates three tables if they are missing:
//! - `account_groups (id, name UNIQUE)`
//! - `account_users (id, username UNIQUE, email, date_joined)`
//! - `account_user_groups (user_id, group_id, position)` with cascading
//!   foreign keys, so deleting a user or group drops its memberships.
//!
//! Uniqueness and reference integrity come from the constraints; violations
//! are mapped back to field-level validation errors.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use prediction_accounts::{fields, Group, GroupPatch, NewGroup, NewUser, User, UserPatch};
use prediction_core::{DomainError, DomainResult, GroupId, UserId};

use super::AccountStore;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS account_groups (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        CONSTRAINT account_groups_name_key UNIQUE (name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS account_users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL DEFAULT '',
        date_joined TIMESTAMPTZ NOT NULL,
        CONSTRAINT account_users_username_key UNIQUE (username)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS account_user_groups (
        user_id UUID NOT NULL REFERENCES account_users (id) ON DELETE CASCADE,
        group_id UUID NOT NULL REFERENCES account_groups (id) ON DELETE CASCADE,
        position INT NOT NULL,
        PRIMARY KEY (user_id, group_id)
    )
    "#,
];

pub struct PostgresAccountStore {
    pool: Arc<PgPool>,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> DomainResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the account tables if they do not exist yet.
    pub async fn migrate(&self) -> DomainResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        tracing::info!("account schema ready");
        Ok(())
    }

    async fn begin(&self) -> DomainResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| map_sqlx_error("begin", e))
    }

    async fn load_groups_of(&self, user_id: UserId) -> DomainResult<Vec<GroupId>> {
        let rows = sqlx::query(
            r#"
            SELECT group_id
            FROM account_user_groups
            WHERE user_id = $1
            ORDER BY position
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_user_groups", e))?;

        rows.iter()
            .map(|row| column::<Uuid>(row, "group_id").map(GroupId::from_uuid))
            .collect()
    }
}

async fn replace_memberships(
    tx: &mut Transaction<'static, Postgres>,
    user_id: UserId,
    groups: &[GroupId],
) -> DomainResult<()> {
    sqlx::query("DELETE FROM account_user_groups WHERE user_id = $1")
        .bind(user_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("clear_user_groups", e))?;

    for (position, group_id) in groups.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO account_user_groups (user_id, group_id, position)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(group_id.as_uuid())
        .bind(position as i32)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user_group", e))?;
    }
    Ok(())
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> DomainResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::storage(format!("failed to read column {name}: {e}")))
}

fn user_from_row(row: &PgRow, groups: Vec<GroupId>) -> DomainResult<User> {
    Ok(User {
        id: UserId::from_uuid(column(row, "id")?),
        username: column(row, "username")?,
        email: column(row, "email")?,
        groups,
        date_joined: column(row, "date_joined")?,
    })
}

fn group_from_row(row: &PgRow) -> DomainResult<Group> {
    Ok(Group {
        id: GroupId::from_uuid(column(row, "id")?),
        name: column(row, "name")?,
    })
}

/// Map constraint violations to field errors; everything else is a storage failure.
fn map_sqlx_error(op: &'static str, err: sqlx::Error) -> DomainError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some("account_users_username_key") => {
                    DomainError::validation("username", fields::USERNAME_TAKEN)
                }
                Some("account_groups_name_key") => {
                    DomainError::validation("name", fields::GROUP_NAME_TAKEN)
                }
                _ => DomainError::storage(format!("{op}: {db}")),
            };
        }
        if db.is_foreign_key_violation() {
            return DomainError::validation("groups", fields::UNKNOWN_GROUP);
        }
    }
    tracing::error!(operation = op, error = %err, "postgres operation failed");
    DomainError::storage(format!("{op}: {err}"))
}

#[async_trait::async_trait]
impl AccountStore for PostgresAccountStore {
    async fn list_users(&self) -> DomainResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, email, date_joined
            FROM account_users
            ORDER BY date_joined DESC, id DESC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;

        let memberships = sqlx::query(
            r#"
            SELECT user_id, group_id
            FROM account_user_groups
            ORDER BY user_id, position
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_user_groups", e))?;

        let mut groups_by_user: HashMap<Uuid, Vec<GroupId>> = HashMap::new();
        for row in &memberships {
            let user_id: Uuid = column(row, "user_id")?;
            let group_id: Uuid = column(row, "group_id")?;
            groups_by_user
                .entry(user_id)
                .or_default()
                .push(GroupId::from_uuid(group_id));
        }

        rows.iter()
            .map(|row| {
                let id: Uuid = column(row, "id")?;
                user_from_row(row, groups_by_user.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn get_user(&self, id: UserId) -> DomainResult<User> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, date_joined
            FROM account_users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_user", e))?
        .ok_or(DomainError::NotFound)?;

        let groups = self.load_groups_of(id).await?;
        user_from_row(&row, groups)
    }

    async fn create_user(&self, new: NewUser, date_joined: DateTime<Utc>) -> DomainResult<User> {
        let user = new.into_user(UserId::new(), date_joined);
        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO account_users (id, username, email, date_joined)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.date_joined)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        replace_memberships(&mut tx, user.id, &user.groups).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(user)
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> DomainResult<User> {
        let mut user = self.get_user(id).await?;
        user.apply(patch);

        let mut tx = self.begin().await?;
        let updated = sqlx::query(
            r#"
            UPDATE account_users
            SET username = $2, email = $3
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        if updated.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }

        replace_memberships(&mut tx, id, &user.groups).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> DomainResult<()> {
        let deleted = sqlx::query("DELETE FROM account_users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        if deleted.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn list_groups(&self) -> DomainResult<Vec<Group>> {
        let rows = sqlx::query("SELECT id, name FROM account_groups ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_groups", e))?;
        rows.iter().map(group_from_row).collect()
    }

    async fn get_group(&self, id: GroupId) -> DomainResult<Group> {
        let row = sqlx::query("SELECT id, name FROM account_groups WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_group", e))?
            .ok_or(DomainError::NotFound)?;
        group_from_row(&row)
    }

    async fn create_group(&self, new: NewGroup) -> DomainResult<Group> {
        let group = new.into_group(GroupId::new());
        sqlx::query("INSERT INTO account_groups (id, name) VALUES ($1, $2)")
            .bind(group.id.as_uuid())
            .bind(&group.name)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_group", e))?;
        Ok(group)
    }

    async fn update_group(&self, id: GroupId, patch: GroupPatch) -> DomainResult<Group> {
        let mut group = self.get_group(id).await?;
        group.apply(patch);

        let updated = sqlx::query("UPDATE account_groups SET name = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(&group.name)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_group", e))?;
        if updated.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(group)
    }

    async fn delete_group(&self, id: GroupId) -> DomainResult<()> {
        let deleted = sqlx::query("DELETE FROM account_groups WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_group", e))?;
        if deleted.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }
}
