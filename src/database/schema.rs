//! Table definitions for the Postgres backend.
//!
//! Statements are idempotent so `ensure_schema` can run at every startup.
//! Keepers and groups live in tables owned elsewhere, so their ids are
//! stored without foreign keys.

use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;

pub const USERS_NAME_UNIQUE: &str = "users_name_unique";
pub const USERS_EMAIL_UNIQUE: &str = "users_email_unique";

// Concurrent CREATE TABLE IF NOT EXISTS can still collide on pg_type, so
// schema creation is serialized on a transaction-scoped advisory lock.
const SCHEMA_LOCK_KEY: i64 = 0x6b65_6570_6572;
const LOCK_SCHEMA: &str = "SELECT pg_advisory_xact_lock($1)";

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            UUID PRIMARY KEY,
    name          VARCHAR(50) NOT NULL,
    password_hash TEXT NOT NULL,
    email         TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'user',
    created_at    TIMESTAMPTZ NOT NULL,
    activated_at  TIMESTAMPTZ,
    last_login_at TIMESTAMPTZ,
    CONSTRAINT users_name_unique UNIQUE (name),
    CONSTRAINT users_email_unique UNIQUE (email),
    CONSTRAINT users_role_check CHECK (role IN ('user', 'admin'))
)
"#;

const CREATE_PERMITS: &str = r#"
CREATE TABLE IF NOT EXISTS permits (
    id         UUID PRIMARY KEY,
    keeper_id  UUID NOT NULL,
    user_id    UUID REFERENCES users (id) ON DELETE CASCADE,
    group_id   UUID,
    created_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT permits_single_scope CHECK (user_id IS NULL OR group_id IS NULL)
)
"#;

const CREATE_PERMITS_KEEPER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS permits_keeper_id_idx ON permits (keeper_id)";

const CREATE_PERMITS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS permits_user_id_idx ON permits (user_id)";

const CREATE_PERMITS_GROUP_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS permits_group_id_idx ON permits (group_id)";

pub const STATEMENTS: &[&str] = &[
    CREATE_USERS,
    CREATE_PERMITS,
    CREATE_PERMITS_KEEPER_INDEX,
    CREATE_PERMITS_USER_INDEX,
    CREATE_PERMITS_GROUP_INDEX,
];

/// Create tables and indexes if missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;
    sqlx::query(LOCK_SCHEMA)
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    info!(statements = STATEMENTS.len(), "Schema ensured");
    Ok(())
}
