//! Account scope.
//!
//! Every ledger operation runs against exactly one account. The scope is an
//! explicit value handed to each operation; `Unscoped` makes the operation
//! fail instead of silently touching some other account's records.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Opaque identifier of an account, as supplied by the authentication
/// collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AccountId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| EngineError::InvalidId(format!("invalid account id: {s}")))
    }
}

impl From<Uuid> for AccountId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// The active account context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    #[default]
    Unscoped,
    Account(AccountId),
}

impl Scope {
    /// Returns the scoped account, or `Unscoped` naming the refused `action`.
    pub fn require(self, action: &str) -> ResultEngine<AccountId> {
        match self {
            Self::Account(id) => Ok(id),
            Self::Unscoped => Err(EngineError::Unscoped(format!("unable to {action}"))),
        }
    }

    #[must_use]
    pub fn account(self) -> Option<AccountId> {
        match self {
            Self::Account(id) => Some(id),
            Self::Unscoped => None,
        }
    }

    #[must_use]
    pub fn is_scoped(self) -> bool {
        matches!(self, Self::Account(_))
    }
}

impl From<AccountId> for Scope {
    fn from(value: AccountId) -> Self {
        Self::Account(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscoped_refuses_with_action() {
        let err = Scope::Unscoped.require("add item").unwrap_err();
        assert_eq!(err, EngineError::Unscoped("unable to add item".to_string()));
    }

    #[test]
    fn scoped_yields_account() {
        let id = AccountId::new();
        let scope = Scope::from(id);
        assert!(scope.is_scoped());
        assert_eq!(scope.require("list items").unwrap(), id);
        assert_eq!(scope.account(), Some(id));
    }

    #[test]
    fn account_id_parses_back() {
        let id = AccountId::new();
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<AccountId>().is_err());
    }
}
