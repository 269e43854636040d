//! Storage plumbing shared by every ledger operation.
//!
//! Holds the transaction settling used by `with_tx!`, the account scoped
//! query helpers and the per-account write locks.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Select,
    SqlErr,
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{AccountId, ResultEngine, items, sales};

/// Commit `tx` when `result` is `Ok`, roll it back otherwise.
///
/// The rollback is explicit so the connection is released before the error
/// reaches the caller. A failing rollback is logged and the original error is
/// returned.
pub(crate) async fn settle<T>(tx: DatabaseTransaction, result: ResultEngine<T>) -> ResultEngine<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, cause = %err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}

/// Entities owned by an account.
pub(crate) trait AccountScoped: EntityTrait {
    fn account_column() -> Self::Column;
    fn id_column() -> Self::Column;
}

impl AccountScoped for items::Entity {
    fn account_column() -> Self::Column {
        items::Column::AccountId
    }

    fn id_column() -> Self::Column {
        items::Column::Id
    }
}

impl AccountScoped for sales::Entity {
    fn account_column() -> Self::Column {
        sales::Column::AccountId
    }

    fn id_column() -> Self::Column {
        sales::Column::Id
    }
}

/// Select every row of `E` owned by `account`.
pub(crate) fn scoped<E: AccountScoped>(account: AccountId) -> Select<E> {
    E::find().filter(E::account_column().eq(account.to_string()))
}

/// Resolve `id` under `account`. Rows owned by other accounts do not resolve.
pub(crate) async fn find_scoped<E, C>(
    db: &C,
    account: AccountId,
    id: Uuid,
) -> ResultEngine<Option<E::Model>>
where
    E: AccountScoped,
    C: ConnectionTrait,
{
    Ok(scoped::<E>(account)
        .filter(E::id_column().eq(id.to_string()))
        .one(db)
        .await?)
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// One async mutex per account.
///
/// Write operations hold their account's guard for the whole transaction, so
/// two writes against the same account never interleave.
#[derive(Debug, Default)]
pub(crate) struct WriteLocks {
    locks: Mutex<HashMap<AccountId, Arc<AsyncMutex<()>>>>,
}

impl WriteLocks {
    pub(crate) async fn acquire(&self, account: AccountId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(account).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn write_locks_serialize_one_account() {
        let locks = Arc::new(WriteLocks::default());
        let account = AccountId::new();

        let guard = locks.acquire(account).await;
        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(account).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn write_locks_are_independent_across_accounts() {
        let locks = WriteLocks::default();
        let _a = locks.acquire(AccountId::new()).await;
        let _b = locks.acquire(AccountId::new()).await;
    }
}
