use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{Argon2Hasher, PasswordHasher};
use crate::config::{AppConfig, PasswordConfig};
use crate::database::memory::MemoryStore;
use crate::database::models::User;
use crate::error::AccountResult;
use crate::services::Services;

/// Argon2 at its minimum cost; only for tests.
pub fn cheap_password_config() -> PasswordConfig {
    PasswordConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
        pepper: None,
        min_length: 6,
    }
}

pub fn cheap_hasher() -> Arc<dyn PasswordHasher> {
    Arc::new(Argon2Hasher::new(&cheap_password_config()).expect("valid test params"))
}

/// In-memory services plus tracking of the users created through it
pub struct TestContext {
    pub services: Services<MemoryStore, MemoryStore>,
    created_users: Vec<Uuid>,
}

impl TestContext {
    pub fn new() -> Self {
        let mut config = AppConfig::from_env();
        config.security.password = cheap_password_config();

        Self {
            services: Services::in_memory(&config).expect("in-memory services"),
            created_users: Vec::new(),
        }
    }

    /// Sign up a user with a unique name and email derived from `prefix`
    pub async fn create_test_user(&mut self, prefix: &str, password: &str) -> AccountResult<User> {
        let suffix = Uuid::new_v4().simple().to_string();
        let name = format!("{}_{}", prefix, &suffix[..8]);
        let email = format!("{}@example.com", name);

        let user = self.services.accounts.sign_up(&name, password, &email).await?;
        self.created_users.push(user.id);
        Ok(user)
    }

    pub fn created_users(&self) -> &[Uuid] {
        &self.created_users
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_names_are_unique() {
        let mut ctx = TestContext::new();
        let first = ctx.create_test_user("test", "password1").await.unwrap();
        let second = ctx.create_test_user("test", "password1").await.unwrap();

        assert_ne!(first.name, second.name);
        assert!(first.name.starts_with("test_"));
        assert_eq!(ctx.created_users().len(), 2);
    }
}
