use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::auth::{hash_blocking, PasswordHasher};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewPermit, NewUser, Permit, User, UserUpdate};
use crate::database::store::{PermitStore, UserStore};
use crate::types::UserField;

const USER_COLUMNS: &str =
    "id, name, password_hash, email, role, created_at, activated_at, last_login_at";

const PERMIT_COLUMNS: &str = "id, keeper_id, user_id, group_id, created_at";

/// `UserStore` over the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    hasher: Arc<dyn PasswordHasher>,
}

impl PgUserStore {
    pub fn new(pool: PgPool, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { pool, hasher }
    }

    async fn select_one_where(
        &self,
        column: UserField,
        value: &str,
    ) -> Result<Option<User>, DatabaseError> {
        // Column names come from the allowlist only
        let query = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column.as_str());
        let user = sqlx::query_as::<_, User>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, input: NewUser) -> Result<Uuid, DatabaseError> {
        let password_hash = hash_blocking(self.hasher.clone(), input.password).await?;
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO users (id, name, password_hash, email, role, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&password_hash)
        .bind(&input.email)
        .bind(input.role.as_str())
        .bind(input.created_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn read_all(&self) -> Result<Vec<User>, DatabaseError> {
        let query = format!("SELECT {} FROM users ORDER BY created_at, id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&query).fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn read_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn read_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        self.select_one_where(UserField::Email, email).await
    }

    async fn read_by_name(&self, name: &str) -> Result<Option<User>, DatabaseError> {
        self.select_one_where(UserField::Name, name).await
    }

    async fn count_by_field(&self, field: UserField, value: &str) -> Result<i64, DatabaseError> {
        let query = match field {
            UserField::Name => "SELECT COUNT(*) FROM users WHERE name = $1",
            UserField::Email => "SELECT COUNT(*) FROM users WHERE email = $1",
            UserField::Role => "SELECT COUNT(*) FROM users WHERE role = $1",
        };

        let count: (i64,) = sqlx::query_as(query)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;

        debug!(%field, count = count.0, "Counted users by field");
        Ok(count.0)
    }

    async fn update(&self, id: Uuid, changes: UserUpdate) -> Result<bool, DatabaseError> {
        if changes.is_empty() {
            return Ok(self.read_by_id(id).await?.is_some());
        }

        let result = sqlx::query(
            "UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                activated_at = COALESCE($4, activated_at),
                last_login_at = COALESCE($5, last_login_at)
             WHERE id = $1",
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.activated_at)
        .bind(changes.last_login_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password(&self, id: Uuid, password: &str) -> Result<bool, DatabaseError> {
        let password_hash = hash_blocking(self.hasher.clone(), password.to_string()).await?;

        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// `PermitStore` over the `permits` table
#[derive(Clone)]
pub struct PgPermitStore {
    pool: PgPool,
}

impl PgPermitStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select_where(
        &self,
        column: &'static str,
        value: Uuid,
    ) -> Result<Vec<Permit>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM permits WHERE {} = $1 ORDER BY created_at, id",
            PERMIT_COLUMNS, column
        );
        let permits = sqlx::query_as::<_, Permit>(&query)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;
        Ok(permits)
    }
}

#[async_trait]
impl PermitStore for PgPermitStore {
    async fn create(&self, input: NewPermit) -> Result<Uuid, DatabaseError> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO permits (id, keeper_id, user_id, group_id, created_at)
             VALUES ($1, $2, $3, $4, NOW())",
        )
        .bind(id)
        .bind(input.keeper_id)
        .bind(input.scope.user_id())
        .bind(input.scope.group_id())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn read_by_id(&self, id: Uuid) -> Result<Option<Permit>, DatabaseError> {
        let query = format!("SELECT {} FROM permits WHERE id = $1", PERMIT_COLUMNS);
        let permit = sqlx::query_as::<_, Permit>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(permit)
    }

    async fn read_by_keeper_id(&self, keeper_id: Uuid) -> Result<Vec<Permit>, DatabaseError> {
        self.select_where("keeper_id", keeper_id).await
    }

    async fn read_by_user_id(&self, user_id: Uuid) -> Result<Vec<Permit>, DatabaseError> {
        self.select_where("user_id", user_id).await
    }

    async fn read_by_group_id(&self, group_id: Uuid) -> Result<Vec<Permit>, DatabaseError> {
        self.select_where("group_id", group_id).await
    }

    async fn read_users_for_keeper(&self, keeper_id: Uuid) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT DISTINCT u.id, u.name, u.password_hash, u.email, u.role,
                    u.created_at, u.activated_at, u.last_login_at
             FROM users u
             JOIN permits p ON p.user_id = u.id
             WHERE p.keeper_id = $1
             ORDER BY u.created_at, u.id",
        )
        .bind(keeper_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM permits WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
