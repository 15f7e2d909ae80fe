use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Column limit on `users.name`.
pub const MAX_NAME_LENGTH: usize = 50;

/// Current time at the microsecond precision Postgres stores, so a record
/// written with it compares equal after a round trip.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_activated(&self) -> bool {
        self.activated_at.is_some()
    }
}

/// Input for `UserStore::create`. The password is plaintext here and is
/// hashed by the store before anything is written.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub password: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            email: email.into(),
            role: Role::default(),
            created_at: timestamp_now(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.activated_at.is_none()
            && self.last_login_at.is_none()
    }

    /// Apply onto an in-memory record with the same semantics as the SQL COALESCE update.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(at) = self.activated_at {
            user.activated_at = Some(at);
        }
        if let Some(at) = self.last_login_at {
            user.last_login_at = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: Uuid::new_v4(),
            name: "alice".to_string(),
            password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::User,
            created_at: Utc::now(),
            activated_at: None,
            last_login_at: None,
        }
    }

    #[test]
    fn serialized_user_omits_password_hash() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "user");
        assert_eq!(json["name"], "alice");
    }

    #[test]
    fn empty_update_changes_nothing() {
        let before = sample();
        let mut after = before.clone();
        let update = UserUpdate::default();
        assert!(update.is_empty());
        update.apply_to(&mut after);
        assert_eq!(before, after);
    }

    #[test]
    fn update_only_touches_given_fields() {
        let mut user = sample();
        let now = Utc::now();
        UserUpdate {
            email: Some("a@example.org".to_string()),
            last_login_at: Some(now),
            ..Default::default()
        }
        .apply_to(&mut user);

        assert_eq!(user.name, "alice");
        assert_eq!(user.email, "a@example.org");
        assert_eq!(user.last_login_at, Some(now));
        assert!(user.activated_at.is_none());
    }

    #[test]
    fn new_user_timestamp_has_microsecond_precision() {
        let input = NewUser::new("alice", "pw", "alice@example.com");
        assert_eq!(input.created_at.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!(Role::try_from("admin".to_string()), Ok(Role::Admin));
        assert_eq!(Role::User.to_string(), "user");
        assert!("root".parse::<Role>().is_err());
    }
}
