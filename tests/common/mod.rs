#![allow(dead_code)]

use std::sync::{Arc, Once};

use keeper_accounts::auth::{Argon2Hasher, PasswordHasher};
use keeper_accounts::config::{AppConfig, LoggingConfig, PasswordConfig};
use keeper_accounts::database::MemoryStore;
use keeper_accounts::logging::init_tracing;
use keeper_accounts::Services;
use uuid::Uuid;

static TRACING: Once = Once::new();

pub fn init_test_tracing() {
    TRACING.call_once(|| {
        init_tracing(&LoggingConfig {
            filter: "keeper_accounts=debug".to_string(),
        });
    });
}

/// Minimum Argon2 cost keeps the suite fast
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::from_env();
    config.security.password = PasswordConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
        pepper: None,
        min_length: 6,
    };
    config
}

pub fn test_hasher() -> Arc<dyn PasswordHasher> {
    Arc::new(Argon2Hasher::new(&test_config().security.password).expect("valid test params"))
}

pub fn memory_services() -> Services<MemoryStore, MemoryStore> {
    init_test_tracing();
    Services::in_memory(&test_config()).expect("in-memory services")
}

/// Name and email no other test will use
pub fn unique_identity(prefix: &str) -> (String, String) {
    let suffix = Uuid::new_v4().simple().to_string();
    let name = format!("{}_{}", prefix, &suffix[..12]);
    let email = format!("{}@example.com", name);
    (name, email)
}
