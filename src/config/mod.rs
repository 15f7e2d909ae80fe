use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub password: PasswordConfig,
}

/// Argon2id cost parameters and password policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    #[serde(skip_serializing)]
    pub pepper: Option<String>,
    pub min_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive used when RUST_LOG is unset
    pub filter: String,
}

impl AppConfig {
    /// Load `.env` if present, then build from the environment.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Password overrides
        let password = &mut self.security.password;
        if let Ok(v) = env::var("PASSWORD_MEMORY_KIB") {
            password.memory_kib = v.parse().unwrap_or(password.memory_kib);
        }
        if let Ok(v) = env::var("PASSWORD_ITERATIONS") {
            password.iterations = v.parse().unwrap_or(password.iterations);
        }
        if let Ok(v) = env::var("PASSWORD_PARALLELISM") {
            password.parallelism = v.parse().unwrap_or(password.parallelism);
        }
        if let Ok(v) = env::var("PASSWORD_PEPPER") {
            password.pepper = if v.is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("PASSWORD_MIN_LENGTH") {
            password.min_length = v.parse().unwrap_or(password.min_length);
        }

        // Logging overrides
        if let Ok(v) = env::var("LOG_FILTER") {
            self.logging.filter = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                password: PasswordConfig {
                    memory_kib: 19 * 1024,
                    iterations: 2,
                    parallelism: 1,
                    pepper: None,
                    min_length: 8,
                },
            },
            logging: LoggingConfig {
                filter: "keeper_accounts=debug,sqlx=warn".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                password: PasswordConfig {
                    memory_kib: 19 * 1024,
                    iterations: 2,
                    parallelism: 1,
                    pepper: None,
                    min_length: 10,
                },
            },
            logging: LoggingConfig {
                filter: "keeper_accounts=info,sqlx=warn".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                password: PasswordConfig {
                    memory_kib: 64 * 1024,
                    iterations: 3,
                    parallelism: 1,
                    pepper: None,
                    min_length: 12,
                },
            },
            logging: LoggingConfig {
                filter: "keeper_accounts=info,sqlx=error".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once on first use
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::load);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
