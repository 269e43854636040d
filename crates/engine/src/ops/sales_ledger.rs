use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{
    AccountId, EngineError, InventoryItem, MonthlyRevenue, Money, ProductRevenue, ResultEngine,
    SaleCmd, SaleQuery, SaleRecord, SaleRow, Scope, dashboard, items,
    listing::filter_and_sort_sales,
    sales,
    store::find_scoped,
    util::normalize_optional_text,
};

use super::{Engine, inventory::decrement_quantity, load_sale_rows, with_tx};

/// Upper bound for `monthly_revenue`'s window, ten years.
const MAX_MONTHS_BACK: u32 = 120;

impl Engine {
    /// Record a sale and take the sold units out of stock.
    ///
    /// The sale row and the stock decrement commit together or not at all.
    /// Selling more units than the item holds fails with
    /// [`EngineError::InsufficientStock`].
    pub async fn record_sale(&self, scope: &Scope, cmd: SaleCmd) -> ResultEngine<Uuid> {
        let account = scope.require("record sale")?;
        validate_sale(&cmd)?;
        let _guard = self.writers.acquire(account).await;

        let sale = with_tx!(self, |db_tx| insert_sale(&db_tx, account, cmd).await)?;
        tracing::info!(
            %account,
            sale = %sale.id,
            item = %sale.item_id,
            quantity = sale.quantity,
            total = %sale.total_price,
            "sale recorded"
        );
        Ok(sale.id)
    }

    /// Sales of the scoped account joined with their item.
    pub async fn list_sales(&self, scope: &Scope, query: &SaleQuery) -> ResultEngine<Vec<SaleRow>> {
        let account = scope.require("list sales")?;
        let rows = load_sale_rows(&self.database, account).await?;
        Ok(filter_and_sort_sales(rows, query))
    }

    /// Revenue of the sales made in `[start, end)`.
    pub async fn revenue_in_period(
        &self,
        scope: &Scope,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ResultEngine<Money> {
        let account = scope.require("compute revenue")?;
        let rows = load_sale_rows(&self.database, account).await?;
        Ok(dashboard::revenue_between(&rows, start, end))
    }

    pub async fn total_revenue(&self, scope: &Scope) -> ResultEngine<Money> {
        let account = scope.require("compute revenue")?;
        let rows = load_sale_rows(&self.database, account).await?;
        Ok(dashboard::total_revenue(&rows))
    }

    /// Revenue since local midnight of the first day of the current month.
    pub async fn revenue_this_month(&self, scope: &Scope) -> ResultEngine<Money> {
        let start = dashboard::start_of_month_local(Utc::now());
        self.revenue_in_period(scope, start, DateTime::<Utc>::MAX_UTC)
            .await
    }

    /// Revenue per local calendar month, oldest first, for the latest
    /// `months_back` months that have sales.
    pub async fn monthly_revenue(
        &self,
        scope: &Scope,
        months_back: u32,
    ) -> ResultEngine<Vec<MonthlyRevenue>> {
        let account = scope.require("compute monthly revenue")?;
        if !(1..=MAX_MONTHS_BACK).contains(&months_back) {
            return Err(EngineError::InvalidInput(format!(
                "months back must be between 1 and {MAX_MONTHS_BACK}"
            )));
        }
        let rows = load_sale_rows(&self.database, account).await?;
        Ok(dashboard::monthly_revenue(&rows, months_back as usize))
    }

    /// The `n` best selling items by revenue.
    pub async fn top_products(&self, scope: &Scope, n: usize) -> ResultEngine<Vec<ProductRevenue>> {
        let account = scope.require("rank products")?;
        let rows = load_sale_rows(&self.database, account).await?;
        Ok(dashboard::top_products(&rows, n))
    }
}

fn validate_sale(cmd: &SaleCmd) -> ResultEngine<()> {
    if cmd.quantity <= 0 {
        return Err(EngineError::InvalidInput(
            "sale quantity must be > 0".to_string(),
        ));
    }
    if cmd.unit_price.is_negative() {
        return Err(EngineError::InvalidInput(
            "sale price must be >= 0".to_string(),
        ));
    }
    Ok(())
}

async fn insert_sale(
    db_tx: &DatabaseTransaction,
    account: AccountId,
    cmd: SaleCmd,
) -> ResultEngine<SaleRecord> {
    let model = find_scoped::<items::Entity, _>(db_tx, account, cmd.item_id)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("item not exists".to_string()))?;
    let item = InventoryItem::try_from(model)?;

    let sale = SaleRecord::new(
        &item,
        cmd.quantity,
        cmd.unit_price,
        cmd.sold_at.unwrap_or_else(Utc::now),
        normalize_optional_text(cmd.category.as_deref()),
        normalize_optional_text(cmd.supplier_name.as_deref()),
        normalize_optional_text(cmd.supplier_address.as_deref()),
    )?;
    let active: sales::ActiveModel = (&sale).into();
    active.insert(db_tx).await?;

    if !decrement_quantity(db_tx, account, item.id, sale.quantity).await? {
        return Err(EngineError::KeyNotFound("item not exists".to_string()));
    }
    Ok(sale)
}
