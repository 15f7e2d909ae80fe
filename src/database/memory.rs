//! In-process backend with the same constraints as the Postgres schema:
//! unique name and email, the name length limit, the user foreign key on
//! permits, and cascade of permits when a user is deleted.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{hash_blocking, PasswordHasher};
use crate::database::manager::DatabaseError;
use crate::database::models::{
    timestamp_now, NewPermit, NewUser, Permit, User, UserUpdate, MAX_NAME_LENGTH,
};
use crate::database::schema::{USERS_EMAIL_UNIQUE, USERS_NAME_UNIQUE};
use crate::database::store::{PermitStore, UserStore};
use crate::types::UserField;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    permits: HashMap<Uuid, Permit>,
}

impl Tables {
    /// Mirrors the unique constraints; `skip` is the row being updated.
    fn check_unique(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        skip: Option<Uuid>,
    ) -> Result<(), DatabaseError> {
        for user in self.users.values().filter(|u| Some(u.id) != skip) {
            if name == Some(user.name.as_str()) {
                return Err(DatabaseError::UniqueViolation {
                    constraint: USERS_NAME_UNIQUE.to_string(),
                });
            }
            if email == Some(user.email.as_str()) {
                return Err(DatabaseError::UniqueViolation {
                    constraint: USERS_EMAIL_UNIQUE.to_string(),
                });
            }
        }
        Ok(())
    }

    fn sorted_users<'a>(users: impl Iterator<Item = &'a User>) -> Vec<User> {
        let mut users: Vec<User> = users.cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        users
    }

    fn permits_where(&self, predicate: impl Fn(&Permit) -> bool) -> Vec<Permit> {
        let mut permits: Vec<Permit> =
            self.permits.values().filter(|p| predicate(*p)).cloned().collect();
        permits.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        permits
    }
}

fn check_name_length(name: &str) -> Result<(), DatabaseError> {
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(DatabaseError::ConstraintViolation(format!(
            "name exceeds {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

/// Shared handle; clones see the same tables.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    hasher: Arc<dyn PasswordHasher>,
}

impl MemoryStore {
    pub fn new(hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            hasher,
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, input: NewUser) -> Result<Uuid, DatabaseError> {
        check_name_length(&input.name)?;
        let password_hash = hash_blocking(self.hasher.clone(), input.password).await?;

        let mut tables = self.tables.write().await;
        tables.check_unique(Some(&input.name), Some(&input.email), None)?;

        let id = Uuid::new_v4();
        tables.users.insert(
            id,
            User {
                id,
                name: input.name,
                password_hash,
                email: input.email,
                role: input.role,
                created_at: input.created_at,
                activated_at: None,
                last_login_at: None,
            },
        );
        Ok(id)
    }

    async fn read_all(&self) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(Tables::sorted_users(tables.users.values()))
    }

    async fn read_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn read_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn read_by_name(&self, name: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.name == name).cloned())
    }

    async fn count_by_field(&self, field: UserField, value: &str) -> Result<i64, DatabaseError> {
        let tables = self.tables.read().await;
        let count = tables
            .users
            .values()
            .filter(|u| match field {
                UserField::Name => u.name == value,
                UserField::Email => u.email == value,
                UserField::Role => u.role.as_str() == value,
            })
            .count();
        Ok(count as i64)
    }

    async fn update(&self, id: Uuid, changes: UserUpdate) -> Result<bool, DatabaseError> {
        if let Some(name) = &changes.name {
            check_name_length(name)?;
        }

        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Ok(false);
        }
        tables.check_unique(changes.name.as_deref(), changes.email.as_deref(), Some(id))?;

        if let Some(user) = tables.users.get_mut(&id) {
            changes.apply_to(user);
        }
        Ok(true)
    }

    async fn update_password(&self, id: Uuid, password: &str) -> Result<bool, DatabaseError> {
        if !self.tables.read().await.users.contains_key(&id) {
            return Ok(false);
        }
        let password_hash = hash_blocking(self.hasher.clone(), password.to_string()).await?;

        // Re-check: the user may have been deleted while hashing
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.permits.retain(|_, permit| permit.user_id != Some(id));
        Ok(true)
    }
}

#[async_trait]
impl PermitStore for MemoryStore {
    async fn create(&self, input: NewPermit) -> Result<Uuid, DatabaseError> {
        let mut tables = self.tables.write().await;

        if let Some(user_id) = input.scope.user_id() {
            if !tables.users.contains_key(&user_id) {
                return Err(DatabaseError::ConstraintViolation(format!(
                    "user {} does not exist",
                    user_id
                )));
            }
        }

        let id = Uuid::new_v4();
        tables.permits.insert(
            id,
            Permit {
                id,
                keeper_id: input.keeper_id,
                user_id: input.scope.user_id(),
                group_id: input.scope.group_id(),
                created_at: timestamp_now(),
            },
        );
        Ok(id)
    }

    async fn read_by_id(&self, id: Uuid) -> Result<Option<Permit>, DatabaseError> {
        Ok(self.tables.read().await.permits.get(&id).cloned())
    }

    async fn read_by_keeper_id(&self, keeper_id: Uuid) -> Result<Vec<Permit>, DatabaseError> {
        Ok(self.tables.read().await.permits_where(|p| p.keeper_id == keeper_id))
    }

    async fn read_by_user_id(&self, user_id: Uuid) -> Result<Vec<Permit>, DatabaseError> {
        Ok(self.tables.read().await.permits_where(|p| p.user_id == Some(user_id)))
    }

    async fn read_by_group_id(&self, group_id: Uuid) -> Result<Vec<Permit>, DatabaseError> {
        Ok(self.tables.read().await.permits_where(|p| p.group_id == Some(group_id)))
    }

    async fn read_users_for_keeper(&self, keeper_id: Uuid) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut user_ids: Vec<Uuid> = tables
            .permits
            .values()
            .filter(|p| p.keeper_id == keeper_id)
            .filter_map(|p| p.user_id)
            .collect();
        user_ids.sort();
        user_ids.dedup();

        Ok(Tables::sorted_users(user_ids.iter().filter_map(|id| tables.users.get(id))))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.tables.write().await.permits.remove(&id).is_some())
    }
}
