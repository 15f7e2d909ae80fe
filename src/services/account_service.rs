//! Account lifecycle: signup, authentication, profile and password changes, deletion.

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::{verify_blocking, PasswordHasher};
use crate::config::PasswordConfig;
use crate::database::manager::DatabaseError;
use crate::database::models::{timestamp_now, NewUser, User, UserUpdate, MAX_NAME_LENGTH};
use crate::database::schema::USERS_EMAIL_UNIQUE;
use crate::database::store::UserStore;
use crate::error::{AccountError, AccountResult};
use crate::types::{UnknownField, UserField};

// Verified against when the email is unknown, so both failure paths verify once
const DUMMY_PASSWORD: &str = "keeper-accounts-dummy-password";

/// Orchestrates the user store and password hasher.
///
/// Uniqueness of name and email is left to the store; nothing is
/// pre-checked before an insert or update.
pub struct AccountService<U: UserStore> {
    users: U,
    hasher: Arc<dyn PasswordHasher>,
    min_password_length: usize,
    dummy_hash: String,
}

impl<U: UserStore> AccountService<U> {
    /// Hashes the dummy password up front so the first unknown-email login
    /// costs one verify, the same as a wrong password.
    pub fn new(
        users: U,
        hasher: Arc<dyn PasswordHasher>,
        config: &PasswordConfig,
    ) -> AccountResult<Self> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            users,
            hasher,
            min_password_length: config.min_length,
            dummy_hash,
        })
    }

    /// Create an account with the default role and return the stored record.
    pub async fn sign_up(&self, name: &str, password: &str, email: &str) -> AccountResult<User> {
        let name = normalize_name(name)?;
        let email = normalize_email(email)?;
        self.check_password(password)?;

        let input = NewUser {
            name,
            password: password.to_string(),
            email,
            role: Default::default(),
            created_at: timestamp_now(),
        };

        let id = self.users.create(input).await.map_err(duplicate_account)?;
        info!(user_id = %id, "User signed up");

        self.get(id).await
    }

    /// Check credentials and stamp the login time.
    ///
    /// Unknown email, wrong password and an unreadable stored hash all
    /// return `AuthFailure`.
    pub async fn authenticate(&self, email: &str, password: &str) -> AccountResult<User> {
        let email = email.trim().to_lowercase();

        let found = self.users.read_by_email(&email).await?;
        let stored_hash = match &found {
            Some(user) => user.password_hash.clone(),
            None => self.dummy_hash.clone(),
        };

        let verified =
            verify_blocking(self.hasher.clone(), password.to_string(), stored_hash).await;
        let valid = match verified {
            Ok(valid) => valid,
            Err(e) => {
                error!(error = %e, "Stored password hash could not be verified");
                false
            }
        };

        let Some(mut user) = found.filter(|_| valid) else {
            warn!("Authentication failed");
            return Err(AccountError::AuthFailure);
        };

        let login_at = timestamp_now();
        let changes = UserUpdate {
            last_login_at: Some(login_at),
            ..Default::default()
        };
        if !self.users.update(user.id, changes).await? {
            // Deleted between lookup and update
            warn!("Authentication failed");
            return Err(AccountError::AuthFailure);
        }

        user.last_login_at = Some(login_at);
        info!(user_id = %user.id, "User authenticated");
        Ok(user)
    }

    pub async fn change_password(&self, id: Uuid, new_password: &str) -> AccountResult<bool> {
        self.check_password(new_password)?;

        let changed = self.users.update_password(id, new_password).await?;
        if changed {
            info!(user_id = %id, "Password changed");
        }
        Ok(changed)
    }

    /// Mark the account activated now. Returns false for an unknown id.
    pub async fn activate(&self, id: Uuid) -> AccountResult<bool> {
        let changes = UserUpdate {
            activated_at: Some(timestamp_now()),
            ..Default::default()
        };
        let activated = self.users.update(id, changes).await?;
        if activated {
            info!(user_id = %id, "User activated");
        }
        Ok(activated)
    }

    /// Partial profile update; `None` keeps the current value.
    pub async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> AccountResult<bool> {
        let changes = UserUpdate {
            name: name.map(normalize_name).transpose()?,
            email: email.map(normalize_email).transpose()?,
            ..Default::default()
        };

        self.users.update(id, changes).await.map_err(duplicate_account)
    }

    /// Hard delete. Returns false if the account is already gone.
    pub async fn delete(&self, id: Uuid) -> AccountResult<bool> {
        let deleted = self.users.delete_by_id(id).await?;
        if deleted {
            info!(user_id = %id, "User deleted");
        }
        Ok(deleted)
    }

    pub async fn get(&self, id: Uuid) -> AccountResult<User> {
        self.users
            .read_by_id(id)
            .await?
            .ok_or(AccountError::NotFound { entity: "user", id })
    }

    pub async fn list(&self) -> AccountResult<Vec<User>> {
        Ok(self.users.read_all().await?)
    }

    /// Count users by a named field. Only `name`, `email` and `role` are accepted.
    ///
    /// The value is normalized the way signup stores it.
    pub async fn count_by_field(&self, field: &str, value: &str) -> AccountResult<i64> {
        let field: UserField = field
            .parse()
            .map_err(|e: UnknownField| AccountError::validation("field", e.to_string()))?;

        let count = self.count_normalized(field, value).await?;
        debug!(%field, count, "Counted users");
        Ok(count)
    }

    pub async fn is_name_taken(&self, name: &str) -> AccountResult<bool> {
        Ok(self.count_normalized(UserField::Name, name).await? > 0)
    }

    pub async fn is_email_taken(&self, email: &str) -> AccountResult<bool> {
        Ok(self.count_normalized(UserField::Email, email).await? > 0)
    }

    async fn count_normalized(&self, field: UserField, value: &str) -> AccountResult<i64> {
        let value = match field {
            UserField::Email => value.trim().to_lowercase(),
            UserField::Name | UserField::Role => value.trim().to_string(),
        };
        Ok(self.users.count_by_field(field, &value).await?)
    }

    fn check_password(&self, password: &str) -> AccountResult<()> {
        if password.chars().count() < self.min_password_length.max(1) {
            return Err(AccountError::validation(
                "password",
                format!("must be at least {} characters", self.min_password_length.max(1)),
            ));
        }
        Ok(())
    }
}

fn normalize_name(name: &str) -> AccountResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AccountError::validation("name", "must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AccountError::validation(
            "name",
            format!("must be at most {} characters", MAX_NAME_LENGTH),
        ));
    }
    Ok(name.to_string())
}

fn normalize_email(email: &str) -> AccountResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(AccountError::validation("email", "must look like name@domain")),
    }
}

fn duplicate_account(err: DatabaseError) -> AccountError {
    match err {
        DatabaseError::UniqueViolation { constraint } => {
            let field = if constraint == USERS_EMAIL_UNIQUE { "email" } else { "name" };
            AccountError::DuplicateAccount { field }
        }
        other => other.into(),
    }
}
