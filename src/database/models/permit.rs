use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// An access grant on a keeper. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Permit {
    pub id: Uuid,
    pub keeper_id: Uuid,
    pub user_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Permit {
    pub fn scope(&self) -> PermitScope {
        match (self.user_id, self.group_id) {
            (Some(user_id), _) => PermitScope::User(user_id),
            (None, Some(group_id)) => PermitScope::Group(group_id),
            (None, None) => PermitScope::Public,
        }
    }
}

/// Who a permit applies to. At most one of user or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermitScope {
    Public,
    User(Uuid),
    Group(Uuid),
}

impl PermitScope {
    /// Build a scope from nullable columns, rejecting user and group together.
    pub fn from_parts(
        user_id: Option<Uuid>,
        group_id: Option<Uuid>,
    ) -> Result<Self, DatabaseError> {
        match (user_id, group_id) {
            (Some(_), Some(_)) => Err(DatabaseError::ConstraintViolation(
                "permit cannot be scoped to both a user and a group".to_string(),
            )),
            (Some(user_id), None) => Ok(PermitScope::User(user_id)),
            (None, Some(group_id)) => Ok(PermitScope::Group(group_id)),
            (None, None) => Ok(PermitScope::Public),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            PermitScope::User(id) => Some(*id),
            _ => None,
        }
    }

    pub fn group_id(&self) -> Option<Uuid> {
        match self {
            PermitScope::Group(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPermit {
    pub keeper_id: Uuid,
    pub scope: PermitScope,
}

impl NewPermit {
    pub fn new(
        keeper_id: Uuid,
        user_id: Option<Uuid>,
        group_id: Option<Uuid>,
    ) -> Result<Self, DatabaseError> {
        Ok(Self {
            keeper_id,
            scope: PermitScope::from_parts(user_id, group_id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_user_and_group_together() {
        let err = NewPermit::new(Uuid::new_v4(), Some(Uuid::new_v4()), Some(Uuid::new_v4()));
        assert!(matches!(err, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn scope_follows_columns() {
        let user_id = Uuid::new_v4();
        let permit = Permit {
            id: Uuid::new_v4(),
            keeper_id: Uuid::new_v4(),
            user_id: Some(user_id),
            group_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(permit.scope(), PermitScope::User(user_id));

        let public = Permit { user_id: None, ..permit };
        assert_eq!(public.scope(), PermitScope::Public);
    }
}
