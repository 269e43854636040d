use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection};

use crate::{
    AccountId, InventoryItem, LedgerConfig, Money, ResultEngine, SaleRecord, SaleRow, items,
    sales,
    store::{WriteLocks, scoped},
};

mod accounts;
mod dashboard;
mod inventory;
mod sales_ledger;

/// Run a body inside a DB transaction, committing on success and rolling back
/// on error.
///
/// The body is an expression evaluating to `ResultEngine<T>`, usually an
/// awaited helper taking `&tx`.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = sea_orm::TransactionTrait::begin(&$self.database).await?;
        let result = $body;
        crate::store::settle($tx, result).await
    }};
}

pub(crate) use with_tx;

/// Entry point of the ledger.
///
/// Cheap to clone: clones share the connection pool and the per-account
/// write locks.
#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
    config: Arc<LedgerConfig>,
    writers: Arc<WriteLocks>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

async fn load_items<C: ConnectionTrait>(
    db: &C,
    account: AccountId,
) -> ResultEngine<Vec<InventoryItem>> {
    scoped::<items::Entity>(account)
        .all(db)
        .await?
        .into_iter()
        .map(InventoryItem::try_from)
        .collect()
}

/// Sales of `account` joined with their item. Sales whose item is gone are
/// left out.
async fn load_sale_rows<C: ConnectionTrait>(
    db: &C,
    account: AccountId,
) -> ResultEngine<Vec<SaleRow>> {
    let account_str = account.to_string();
    scoped::<sales::Entity>(account)
        .find_also_related(items::Entity)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(sale, item)| item.filter(|i| i.account_id == account_str).map(|i| (sale, i)))
        .map(|(sale, item)| {
            Ok(SaleRow {
                sale: SaleRecord::try_from(sale)?,
                item_name: item.name,
                item_price: Money::new(item.price_minor),
            })
        })
        .collect()
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    config: LedgerConfig,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default ledger configuration.
    pub fn config(mut self, config: LedgerConfig) -> EngineBuilder {
        self.config = config;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            config: Arc::new(self.config),
            writers: Arc::new(WriteLocks::default()),
        })
    }
}
