use chrono::Utc;
use sea_orm::DatabaseTransaction;

use crate::{AccountId, DashboardSnapshot, InventoryItem, ResultEngine, SaleRow, Scope};

use super::{Engine, load_items, load_sale_rows, with_tx};

impl Engine {
    /// Compute every dashboard figure for the scoped account.
    ///
    /// Items and sales are read in one transaction, so a sale recorded
    /// concurrently shows up either entirely or not at all.
    pub async fn dashboard(&self, scope: &Scope) -> ResultEngine<DashboardSnapshot> {
        let account = scope.require("compute dashboard")?;
        let (items, rows) = with_tx!(self, |db_tx| read_ledger(&db_tx, account).await)?;

        let snapshot =
            DashboardSnapshot::compute(Some(account), &items, &rows, &self.config, Utc::now());
        tracing::debug!(
            %account,
            items = snapshot.total_items,
            sales = snapshot.total_sales,
            revenue = %snapshot.total_revenue,
            "dashboard computed"
        );
        Ok(snapshot)
    }
}

async fn read_ledger(
    db_tx: &DatabaseTransaction,
    account: AccountId,
) -> ResultEngine<(Vec<InventoryItem>, Vec<SaleRow>)> {
    let items = load_items(db_tx, account).await?;
    let rows = load_sale_rows(db_tx, account).await?;
    Ok((items, rows))
}
