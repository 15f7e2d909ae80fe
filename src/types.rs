//! Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User columns that may be counted by value.
/// Used by every `UserStore` backend for existence and uniqueness checks;
/// anything outside this list is rejected before reaching a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    Name,
    Email,
    Role,
}

impl UserField {
    pub const ALL: [UserField; 3] = [UserField::Name, UserField::Email, UserField::Role];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserField::Name => "name",
            UserField::Email => "email",
            UserField::Role => "role",
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Field '{0}' cannot be counted")]
pub struct UnknownField(pub String);

impl FromStr for UserField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_allowlisted_fields() {
        assert_eq!("name".parse::<UserField>(), Ok(UserField::Name));
        assert_eq!("email".parse::<UserField>(), Ok(UserField::Email));
        assert_eq!("role".parse::<UserField>(), Ok(UserField::Role));
    }

    #[test]
    fn rejects_anything_else() {
        assert!("password_hash".parse::<UserField>().is_err());
        assert!("Name".parse::<UserField>().is_err());
        assert!("name; DROP TABLE users".parse::<UserField>().is_err());
    }
}
