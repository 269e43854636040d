use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};

use crate::{
    Account, AccountId, EngineError, ResultEngine, accounts,
    store::is_unique_violation,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Store a new account.
    ///
    /// `credential_hash` is whatever the authentication collaborator wants to
    /// keep; it is stored untouched.
    pub async fn create_account(
        &self,
        username: &str,
        credential_hash: &str,
        email: &str,
    ) -> ResultEngine<AccountId> {
        let username = normalize_required_name(username, "user")?;
        let account = Account::new(username, credential_hash.to_string(), email.trim().to_string());
        let id = with_tx!(self, |db_tx| insert_account(&db_tx, &account).await)?;
        tracing::info!(account = %id, username = %account.username, "account created");
        Ok(id)
    }

    pub async fn account(&self, id: AccountId) -> ResultEngine<Option<Account>> {
        accounts::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    pub async fn account_by_username(&self, username: &str) -> ResultEngine<Option<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username.trim()))
            .one(&self.database)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    pub(crate) async fn require_account(&self, id: AccountId) -> ResultEngine<Account> {
        self.account(id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }
}

async fn insert_account(db_tx: &DatabaseTransaction, account: &Account) -> ResultEngine<AccountId> {
    let taken = accounts::Entity::find()
        .filter(accounts::Column::Username.eq(account.username.as_str()))
        .one(db_tx)
        .await?
        .is_some();
    if taken {
        return Err(EngineError::DuplicateUsername(account.username.clone()));
    }

    let model: accounts::ActiveModel = account.into();
    match model.insert(db_tx).await {
        Ok(_) => Ok(account.id),
        Err(err) if is_unique_violation(&err) => {
            Err(EngineError::DuplicateUsername(account.username.clone()))
        }
        Err(err) => Err(err.into()),
    }
}
