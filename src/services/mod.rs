pub mod account_service;
pub mod permit_service;

pub use account_service::AccountService;
pub use permit_service::PermitService;

use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{Argon2Hasher, PasswordHasher};
use crate::config::{config, AppConfig};
use crate::database::manager::DatabaseManager;
use crate::database::memory::MemoryStore;
use crate::database::repository::{PgPermitStore, PgUserStore};
use crate::database::schema::ensure_schema;
use crate::database::store::{PermitStore, UserStore};
use crate::error::AccountResult;

/// Account and permit services sharing one backend
pub struct Services<U: UserStore, P: PermitStore> {
    pub accounts: AccountService<U>,
    pub permits: PermitService<P>,
}

impl Services<PgUserStore, PgPermitStore> {
    /// Connect with the process-wide config, create the schema if missing
    /// and build the services over the new pool.
    pub async fn connect() -> AccountResult<Self> {
        let config = config();
        let pool = DatabaseManager::connect(&config.database).await?;
        ensure_schema(&pool).await?;
        Self::postgres(pool, config)
    }

    pub fn postgres(pool: PgPool, config: &AppConfig) -> AccountResult<Self> {
        let password = &config.security.password;
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new(password)?);

        Ok(Self {
            accounts: AccountService::new(
                PgUserStore::new(pool.clone(), hasher.clone()),
                hasher,
                password,
            )?,
            permits: PermitService::new(PgPermitStore::new(pool)),
        })
    }
}

impl Services<MemoryStore, MemoryStore> {
    pub fn in_memory(config: &AppConfig) -> AccountResult<Self> {
        let password = &config.security.password;
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new(password)?);
        let store = MemoryStore::new(hasher.clone());

        Ok(Self {
            accounts: AccountService::new(store.clone(), hasher, password)?,
            permits: PermitService::new(store),
        })
    }
}
