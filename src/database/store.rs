use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewPermit, NewUser, Permit, User, UserUpdate};
use crate::types::UserField;

/// Persistence for user records. Name and email are unique across all users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Hash the password and insert. Duplicate name or email fails with
    /// `UniqueViolation` and writes nothing.
    async fn create(&self, input: NewUser) -> Result<Uuid, DatabaseError>;

    /// Every user, ordered by creation time.
    async fn read_all(&self) -> Result<Vec<User>, DatabaseError>;

    async fn read_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn read_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn read_by_name(&self, name: &str) -> Result<Option<User>, DatabaseError>;

    async fn count_by_field(&self, field: UserField, value: &str) -> Result<i64, DatabaseError>;

    /// Fields left as `None` keep their stored value. Returns false if `id` is unknown.
    async fn update(&self, id: Uuid, changes: UserUpdate) -> Result<bool, DatabaseError>;

    async fn update_password(&self, id: Uuid, password: &str) -> Result<bool, DatabaseError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

/// Persistence for keeper access grants. There is no update.
#[async_trait]
pub trait PermitStore: Send + Sync {
    async fn create(&self, input: NewPermit) -> Result<Uuid, DatabaseError>;

    async fn read_by_id(&self, id: Uuid) -> Result<Option<Permit>, DatabaseError>;

    async fn read_by_keeper_id(&self, keeper_id: Uuid) -> Result<Vec<Permit>, DatabaseError>;

    async fn read_by_user_id(&self, user_id: Uuid) -> Result<Vec<Permit>, DatabaseError>;

    async fn read_by_group_id(&self, group_id: Uuid) -> Result<Vec<Permit>, DatabaseError>;

    /// Users holding a user-scoped permit on the keeper.
    async fn read_users_for_keeper(&self, keeper_id: Uuid) -> Result<Vec<User>, DatabaseError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError>;
}
