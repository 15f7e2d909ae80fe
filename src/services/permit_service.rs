use tracing::info;
use uuid::Uuid;

use crate::database::models::{NewPermit, Permit, PermitScope, User};
use crate::database::store::PermitStore;
use crate::error::{AccountError, AccountResult};

/// Grants and revokes keeper access. Permits are never edited in place.
pub struct PermitService<P: PermitStore> {
    permits: P,
}

impl<P: PermitStore> PermitService<P> {
    pub fn new(permits: P) -> Self {
        Self { permits }
    }

    /// Grant access to a user, a group, or everyone when both are `None`.
    pub async fn grant(
        &self,
        keeper_id: Uuid,
        user_id: Option<Uuid>,
        group_id: Option<Uuid>,
    ) -> AccountResult<Permit> {
        let input = NewPermit::new(keeper_id, user_id, group_id)?;
        let id = self.permits.create(input).await?;
        info!(permit_id = %id, keeper_id = %keeper_id, "Permit granted");

        self.permits
            .read_by_id(id)
            .await?
            .ok_or_else(|| AccountError::Internal(format!("permit {} missing after insert", id)))
    }

    /// Returns false if the permit was already revoked.
    pub async fn revoke(&self, permit_id: Uuid) -> AccountResult<bool> {
        let revoked = self.permits.delete_by_id(permit_id).await?;
        if revoked {
            info!(permit_id = %permit_id, "Permit revoked");
        }
        Ok(revoked)
    }

    pub async fn get(&self, permit_id: Uuid) -> AccountResult<Permit> {
        self.permits
            .read_by_id(permit_id)
            .await?
            .ok_or(AccountError::NotFound { entity: "permit", id: permit_id })
    }

    pub async fn grants(&self, keeper_id: Uuid) -> AccountResult<Vec<Permit>> {
        Ok(self.permits.read_by_keeper_id(keeper_id).await?)
    }

    pub async fn grants_for_user(&self, user_id: Uuid) -> AccountResult<Vec<Permit>> {
        Ok(self.permits.read_by_user_id(user_id).await?)
    }

    pub async fn grants_for_group(&self, group_id: Uuid) -> AccountResult<Vec<Permit>> {
        Ok(self.permits.read_by_group_id(group_id).await?)
    }

    pub async fn granted_users(&self, keeper_id: Uuid) -> AccountResult<Vec<User>> {
        Ok(self.permits.read_users_for_keeper(keeper_id).await?)
    }

    /// True if any permit on the keeper is public, names the user, or names one of `group_ids`.
    pub async fn can_access(
        &self,
        keeper_id: Uuid,
        user_id: Uuid,
        group_ids: &[Uuid],
    ) -> AccountResult<bool> {
        let permits = self.permits.read_by_keeper_id(keeper_id).await?;
        Ok(permits.iter().any(|permit| match permit.scope() {
            PermitScope::Public => true,
            PermitScope::User(id) => id == user_id,
            PermitScope::Group(id) => group_ids.contains(&id),
        }))
    }
}
