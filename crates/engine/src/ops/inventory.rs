use chrono::{Local, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    AccountId, EngineError, InventoryItem, ItemQuery, ItemUpdate, LowStockPolicy, Money, NewItem,
    ResultEngine, Scope, StockLevel, dashboard, items,
    listing::filter_and_sort_items,
    store::find_scoped,
    util::{
        ensure_non_negative_price, ensure_non_negative_quantity, ensure_threshold,
        normalize_optional_text, normalize_required_name,
    },
};

use super::{Engine, load_items, with_tx};

impl Engine {
    /// Add an item to the scoped account's inventory and return its id.
    pub async fn add_item(&self, scope: &Scope, item: NewItem) -> ResultEngine<Uuid> {
        let account = scope.require("add item")?;
        let item = validate_new_item(account, item)?;
        let _guard = self.writers.acquire(account).await;

        let id = with_tx!(self, |db_tx| insert_item(&db_tx, &item).await)?;
        tracing::info!(%account, item = %id, name = %item.name, "item added");
        Ok(id)
    }

    /// Apply `update` to an item.
    ///
    /// Returns `false` when `id` is not an item of the scoped account.
    pub async fn update_item(
        &self,
        scope: &Scope,
        id: Uuid,
        update: ItemUpdate,
    ) -> ResultEngine<bool> {
        let account = scope.require("update item")?;
        let update = validate_update(update)?;
        let _guard = self.writers.acquire(account).await;

        let updated = with_tx!(self, |db_tx| apply_update(&db_tx, account, id, update).await)?;
        if updated {
            tracing::info!(%account, item = %id, "item updated");
        }
        Ok(updated)
    }

    /// Remove an item. Sales that refer to it are kept.
    pub async fn delete_item(&self, scope: &Scope, id: Uuid) -> ResultEngine<bool> {
        let account = scope.require("delete item")?;
        let _guard = self.writers.acquire(account).await;

        let deleted = with_tx!(self, |db_tx| remove_item(&db_tx, account, id).await)?;
        if deleted {
            tracing::info!(%account, item = %id, "item deleted");
        }
        Ok(deleted)
    }

    pub async fn item(&self, scope: &Scope, id: Uuid) -> ResultEngine<Option<InventoryItem>> {
        let account = scope.require("read item")?;
        find_scoped::<items::Entity, _>(&self.database, account, id)
            .await?
            .map(InventoryItem::try_from)
            .transpose()
    }

    /// Items of the scoped account, filtered and ordered by `query`.
    pub async fn list_items(
        &self,
        scope: &Scope,
        query: &ItemQuery,
    ) -> ResultEngine<Vec<InventoryItem>> {
        let account = scope.require("list items")?;
        let items = load_items(&self.database, account).await?;
        Ok(filter_and_sort_items(items, query))
    }

    /// Items at or below their low stock threshold under `policy`.
    pub async fn low_stock_items(
        &self,
        scope: &Scope,
        policy: LowStockPolicy,
    ) -> ResultEngine<Vec<InventoryItem>> {
        let account = scope.require("list low stock items")?;
        let items = load_items(&self.database, account).await?;
        Ok(dashboard::low_stock(&items, &policy))
    }

    /// Items whose expiry date falls within `horizon_days` of today, today
    /// included.
    pub async fn expiring_items(
        &self,
        scope: &Scope,
        horizon_days: u32,
    ) -> ResultEngine<Vec<InventoryItem>> {
        let account = scope.require("list expiring items")?;
        let items = load_items(&self.database, account).await?;
        let today = Local::now().date_naive();
        Ok(dashboard::expiring(&items, today, horizon_days))
    }

    pub async fn total_inventory_value(&self, scope: &Scope) -> ResultEngine<Money> {
        let account = scope.require("compute inventory value")?;
        let items = load_items(&self.database, account).await?;
        Ok(dashboard::total_inventory_value(&items))
    }

    pub async fn top_stocked_items(&self, scope: &Scope, n: usize) -> ResultEngine<Vec<StockLevel>> {
        let account = scope.require("rank stocked items")?;
        let items = load_items(&self.database, account).await?;
        Ok(dashboard::top_stocked(&items, n))
    }
}

fn validate_new_item(account: AccountId, item: NewItem) -> ResultEngine<InventoryItem> {
    let name = normalize_required_name(&item.name, "item")?;
    ensure_non_negative_quantity(item.quantity)?;
    ensure_non_negative_price(item.price)?;
    ensure_threshold(item.low_stock_threshold)?;

    Ok(InventoryItem {
        id: Uuid::new_v4(),
        account_id: account,
        name,
        category: normalize_optional_text(Some(&item.category))
            .unwrap_or_else(|| NewItem::DEFAULT_CATEGORY.to_string()),
        quantity: item.quantity,
        price: item.price,
        supplier_name: normalize_optional_text(item.supplier_name.as_deref()),
        supplier_address: normalize_optional_text(item.supplier_address.as_deref()),
        expiry_date: item.expiry_date,
        low_stock_threshold: item.low_stock_threshold,
        last_updated: Utc::now(),
    })
}

fn validate_update(mut update: ItemUpdate) -> ResultEngine<ItemUpdate> {
    update.name = update
        .name
        .as_deref()
        .map(|name| normalize_required_name(name, "item"))
        .transpose()?;
    update.category = update.category.as_deref().map(|category| {
        normalize_optional_text(Some(category))
            .unwrap_or_else(|| NewItem::DEFAULT_CATEGORY.to_string())
    });
    if let Some(quantity) = update.quantity {
        ensure_non_negative_quantity(quantity)?;
    }
    if let Some(price) = update.price {
        ensure_non_negative_price(price)?;
    }
    if let Some(threshold) = update.low_stock_threshold {
        ensure_threshold(threshold)?;
    }
    update.supplier_name = update
        .supplier_name
        .map(|name| normalize_optional_text(name.as_deref()));
    update.supplier_address = update
        .supplier_address
        .map(|address| normalize_optional_text(address.as_deref()));
    Ok(update)
}

async fn insert_item(db_tx: &DatabaseTransaction, item: &InventoryItem) -> ResultEngine<Uuid> {
    let model: items::ActiveModel = item.into();
    model.insert(db_tx).await?;
    Ok(item.id)
}

async fn apply_update(
    db_tx: &DatabaseTransaction,
    account: AccountId,
    id: Uuid,
    update: ItemUpdate,
) -> ResultEngine<bool> {
    let Some(model) = find_scoped::<items::Entity, _>(db_tx, account, id).await? else {
        return Ok(false);
    };

    let mut active: items::ActiveModel = model.into();
    if let Some(name) = update.name {
        active.name = ActiveValue::Set(name);
    }
    if let Some(category) = update.category {
        active.category = ActiveValue::Set(category);
    }
    if let Some(quantity) = update.quantity {
        active.quantity = ActiveValue::Set(quantity);
    }
    if let Some(price) = update.price {
        active.price_minor = ActiveValue::Set(price.cents());
    }
    if let Some(supplier_name) = update.supplier_name {
        active.supplier_name = ActiveValue::Set(supplier_name);
    }
    if let Some(supplier_address) = update.supplier_address {
        active.supplier_address = ActiveValue::Set(supplier_address);
    }
    if let Some(expiry_date) = update.expiry_date {
        active.expiry_date = ActiveValue::Set(expiry_date);
    }
    if let Some(threshold) = update.low_stock_threshold {
        active.low_stock_threshold = ActiveValue::Set(threshold);
    }
    active.last_updated = ActiveValue::Set(Utc::now());
    active.update(db_tx).await?;
    Ok(true)
}

async fn remove_item(db_tx: &DatabaseTransaction, account: AccountId, id: Uuid) -> ResultEngine<bool> {
    let deleted = items::Entity::delete_many()
        .filter(items::Column::AccountId.eq(account.to_string()))
        .filter(items::Column::Id.eq(id.to_string()))
        .exec(db_tx)
        .await?;
    Ok(deleted.rows_affected > 0)
}

/// Take `amount` units out of an item inside the caller's transaction.
///
/// Returns `false` when the item does not resolve under `account`. Fails with
/// `InsufficientStock` instead of letting the quantity go negative.
pub(crate) async fn decrement_quantity(
    db_tx: &DatabaseTransaction,
    account: AccountId,
    id: Uuid,
    amount: i64,
) -> ResultEngine<bool> {
    if amount <= 0 {
        return Err(EngineError::InvalidInput(
            "decrement must be > 0".to_string(),
        ));
    }

    let updated = items::Entity::update_many()
        .col_expr(
            items::Column::Quantity,
            Expr::col(items::Column::Quantity).sub(amount),
        )
        .filter(items::Column::AccountId.eq(account.to_string()))
        .filter(items::Column::Id.eq(id.to_string()))
        .filter(items::Column::Quantity.gte(amount))
        .exec(db_tx)
        .await?;
    if updated.rows_affected > 0 {
        return Ok(true);
    }

    match find_scoped::<items::Entity, _>(db_tx, account, id).await? {
        None => Ok(false),
        Some(model) => Err(EngineError::InsufficientStock(format!(
            "{} has {} units, {amount} requested",
            model.name, model.quantity
        ))),
    }
}
