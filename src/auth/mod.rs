pub mod password;

pub use password::{hash_blocking, verify_blocking, Argon2Hasher, HashError, PasswordHasher};
