//! Local credential store on top of the ledger's accounts table.
//!
//! Credentials are kept as `salt$hex(sha256(salt || password))`.

use engine::{AccountId, Authenticator, Engine, EngineError, ResultEngine};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub struct LocalAuthenticator {
    engine: Engine,
}

impl LocalAuthenticator {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{salt}${}", digest(&salt, password))
}

fn verify_password(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

impl Authenticator for LocalAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<AccountId> {
        match self.engine.account_by_username(username).await? {
            Some(account) if verify_password(&account.credential_hash, password) => Ok(account.id),
            _ => Err(EngineError::AuthenticationFailed),
        }
    }

    async fn create_account(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> ResultEngine<AccountId> {
        if password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }
        self.engine
            .create_account(username, &hash_password(password), email)
            .await
    }
}
