//! Boundary to the authentication collaborator.
//!
//! The ledger never checks credentials. An `Authenticator` does, and the
//! account id it returns is trusted as is. Implementations usually sit on
//! top of [`Engine::create_account`](crate::Engine::create_account) and
//! [`Engine::account_by_username`](crate::Engine::account_by_username).

use std::future::Future;

use crate::{AccountId, ResultEngine};

pub trait Authenticator: Send + Sync {
    /// Resolve valid credentials to their account.
    ///
    /// Fails with [`EngineError::AuthenticationFailed`](crate::EngineError::AuthenticationFailed)
    /// when they do not match.
    fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = ResultEngine<AccountId>> + Send;

    /// Register a new account.
    ///
    /// Fails with [`EngineError::DuplicateUsername`](crate::EngineError::DuplicateUsername)
    /// when the username is taken.
    fn create_account(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> impl Future<Output = ResultEngine<AccountId>> + Send;
}
