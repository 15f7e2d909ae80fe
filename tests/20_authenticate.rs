mod common;

use anyhow::Result;
use keeper_accounts::auth::{HashError, PasswordHasher};
use keeper_accounts::database::MemoryStore;
use keeper_accounts::{AccountError, AccountService};
use std::sync::Arc;
use uuid::Uuid;

/// Writes a value that is not a PHC string, as a damaged row would hold.
struct CorruptingHasher(Arc<dyn PasswordHasher>);

impl PasswordHasher for CorruptingHasher {
    fn hash(&self, _plaintext: &str) -> Result<String, HashError> {
        Ok("not-a-phc-string".to_string())
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        self.0.verify(plaintext, hash)
    }
}

#[tokio::test]
async fn alice_scenario() -> Result<()> {
    let services = common::memory_services();
    let alice = services
        .accounts
        .sign_up("alice", "secret123", "alice@example.com")
        .await?;

    let stored = services.accounts.get(alice.id).await?;
    assert_eq!(stored.name, "alice");
    assert_eq!(stored.email, "alice@example.com");
    assert_ne!(stored.password_hash, "secret123");

    let authed = services.accounts.authenticate("alice@example.com", "secret123").await?;
    assert_eq!(authed.id, alice.id);

    let err = services
        .accounts
        .authenticate("alice@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::AuthFailure));
    Ok(())
}

#[tokio::test]
async fn successful_login_stamps_last_login() -> Result<()> {
    let services = common::memory_services();
    let user = services.accounts.sign_up("erin", "secret123", "erin@example.com").await?;
    assert!(user.last_login_at.is_none());

    let authed = services.accounts.authenticate("erin@example.com", "secret123").await?;
    let stamped = authed.last_login_at.expect("last login set");

    let stored = services.accounts.get(user.id).await?;
    assert_eq!(stored.last_login_at, Some(stamped));
    assert!(stamped >= user.created_at);
    Ok(())
}

#[tokio::test]
async fn unknown_email_and_wrong_password_are_indistinguishable() -> Result<()> {
    let services = common::memory_services();
    services.accounts.sign_up("frank", "secret123", "frank@example.com").await?;

    let unknown = services
        .accounts
        .authenticate("nobody@example.com", "secret123")
        .await
        .unwrap_err();
    let wrong = services
        .accounts
        .authenticate("frank@example.com", "not-it")
        .await
        .unwrap_err();

    assert!(matches!(unknown, AccountError::AuthFailure));
    assert!(matches!(wrong, AccountError::AuthFailure));
    assert_eq!(unknown.to_string(), wrong.to_string());
    assert_eq!(unknown.to_json(), wrong.to_json());
    Ok(())
}

#[tokio::test]
async fn failed_login_does_not_stamp_last_login() -> Result<()> {
    let services = common::memory_services();
    let user = services.accounts.sign_up("gina", "secret123", "gina@example.com").await?;

    let _ = services.accounts.authenticate("gina@example.com", "nope-nope").await;
    assert!(services.accounts.get(user.id).await?.last_login_at.is_none());
    Ok(())
}

#[tokio::test]
async fn email_lookup_is_case_insensitive() -> Result<()> {
    let services = common::memory_services();
    services.accounts.sign_up("hank", "secret123", "Hank@Example.com").await?;

    services.accounts.authenticate("HANK@example.COM", "secret123").await?;
    Ok(())
}

#[tokio::test]
async fn changed_password_replaces_the_old_one() -> Result<()> {
    let services = common::memory_services();
    let user = services.accounts.sign_up("ivy", "secret123", "ivy@example.com").await?;
    let old_hash = user.password_hash.clone();

    assert!(services.accounts.change_password(user.id, "n3w-secret").await?);
    assert_ne!(services.accounts.get(user.id).await?.password_hash, old_hash);

    assert!(matches!(
        services.accounts.authenticate("ivy@example.com", "secret123").await,
        Err(AccountError::AuthFailure)
    ));
    services.accounts.authenticate("ivy@example.com", "n3w-secret").await?;
    Ok(())
}

#[tokio::test]
async fn change_password_for_unknown_user_returns_false() -> Result<()> {
    let services = common::memory_services();
    assert!(!services.accounts.change_password(Uuid::new_v4(), "n3w-secret").await?);
    Ok(())
}

#[tokio::test]
async fn deleted_user_cannot_authenticate() -> Result<()> {
    let services = common::memory_services();
    let user = services.accounts.sign_up("jack", "secret123", "jack@example.com").await?;

    assert!(services.accounts.delete(user.id).await?);
    assert!(matches!(
        services.accounts.authenticate("jack@example.com", "secret123").await,
        Err(AccountError::AuthFailure)
    ));
    Ok(())
}

#[tokio::test]
async fn unreadable_stored_hash_is_an_auth_failure() -> Result<()> {
    common::init_test_tracing();
    let hasher: Arc<dyn PasswordHasher> = Arc::new(CorruptingHasher(common::test_hasher()));
    let config = common::test_config();
    let accounts =
        AccountService::new(MemoryStore::new(hasher.clone()), hasher, &config.security.password)?;
    accounts.sign_up("gina", "secret123", "gina@example.com").await?;

    let known = accounts.authenticate("gina@example.com", "secret123").await.unwrap_err();
    let unknown = accounts.authenticate("nobody@example.com", "secret123").await.unwrap_err();

    assert!(matches!(known, AccountError::AuthFailure), "got {known:?}");
    assert_eq!(known.to_json(), unknown.to_json());
    Ok(())
}
