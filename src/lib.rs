//! User accounts, password hashing and keeper permits.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod services;
pub mod types;

pub use error::{AccountError, AccountResult};
pub use services::{AccountService, PermitService, Services};

#[cfg(test)]
pub mod testing;
