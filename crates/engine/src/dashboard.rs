//! Dashboard metrics.
//!
//! Everything here is a pure function of an account's items and joined sale
//! rows. [`DashboardSnapshot::compute`] assembles them into one value; the
//! engine feeds it data read inside a single store transaction so a snapshot
//! never reflects half of a sale.
//!
//! Calendar months and "today" follow the local time zone.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
};

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{AccountId, InventoryItem, LedgerConfig, LowStockPolicy, Money, SaleRow};

/// A local calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    #[must_use]
    pub fn of(at: DateTime<Utc>) -> Self {
        let local = at.with_timezone(&Local);
        Self {
            year: local.year(),
            month: local.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    pub month: YearMonth,
    pub revenue: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyProfit {
    pub month: YearMonth,
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductRevenue {
    pub item_id: Uuid,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub item_id: Uuid,
    pub name: String,
    pub quantity: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Sale,
    InventoryUpdate,
}

/// One line of the recent activity feed.
///
/// For sales `quantity` is the units sold and `amount` the sale total; for
/// inventory updates they are the item's stock and unit price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub item_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub amount: Money,
    pub at: DateTime<Utc>,
}

/// Local midnight of the first day of the month containing `now`.
#[must_use]
pub fn start_of_month_local(now: DateTime<Utc>) -> DateTime<Utc> {
    let local = now.with_timezone(&Local);
    let midnight = NaiveDate::from_ymd_opt(local.year(), local.month(), 1)
        .and_then(|first| first.and_hms_opt(0, 0, 0))
        .unwrap_or_else(|| local.naive_local());
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|start| start.with_timezone(&Utc))
        // Midnight skipped by a DST jump.
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Sum of sale totals sold in `[start, end)`.
#[must_use]
pub fn revenue_between(rows: &[SaleRow], start: DateTime<Utc>, end: DateTime<Utc>) -> Money {
    rows.iter()
        .filter(|row| row.sale.sold_at >= start && row.sale.sold_at < end)
        .map(|row| row.sale.total_price)
        .sum()
}

#[must_use]
pub fn total_revenue(rows: &[SaleRow]) -> Money {
    rows.iter().map(|row| row.sale.total_price).sum()
}

/// Cost of everything sold, priced at each item's current price.
#[must_use]
pub fn total_cost(rows: &[SaleRow]) -> Money {
    rows.iter().map(SaleRow::current_cost).sum()
}

#[must_use]
pub fn total_inventory_value(items: &[InventoryItem]) -> Money {
    items.iter().map(InventoryItem::stock_value).sum()
}

/// Revenue of the latest `months` months that have sales, oldest first.
#[must_use]
pub fn monthly_revenue(rows: &[SaleRow], months: usize) -> Vec<MonthlyRevenue> {
    let mut buckets: BTreeMap<YearMonth, Money> = BTreeMap::new();
    for row in rows {
        *buckets.entry(YearMonth::of(row.sale.sold_at)).or_default() += row.sale.total_price;
    }
    let skip = buckets.len().saturating_sub(months);
    buckets
        .into_iter()
        .skip(skip)
        .map(|(month, revenue)| MonthlyRevenue { month, revenue })
        .collect()
}

/// Revenue, cost and profit of the latest `months` months that have sales,
/// oldest first.
#[must_use]
pub fn monthly_profit(rows: &[SaleRow], months: usize) -> Vec<MonthlyProfit> {
    let mut buckets: BTreeMap<YearMonth, (Money, Money)> = BTreeMap::new();
    for row in rows {
        let (revenue, cost) = buckets.entry(YearMonth::of(row.sale.sold_at)).or_default();
        *revenue += row.sale.total_price;
        *cost += row.current_cost();
    }
    let skip = buckets.len().saturating_sub(months);
    buckets
        .into_iter()
        .skip(skip)
        .map(|(month, (revenue, cost))| MonthlyProfit {
            month,
            revenue,
            cost,
            profit: revenue - cost,
        })
        .collect()
}

/// Items ranked by summed sale totals, best first. Ties go to the lower id.
#[must_use]
pub fn top_products(rows: &[SaleRow], n: usize) -> Vec<ProductRevenue> {
    let mut by_item: HashMap<Uuid, ProductRevenue> = HashMap::new();
    for row in rows {
        let entry = by_item
            .entry(row.sale.item_id)
            .or_insert_with(|| ProductRevenue {
                item_id: row.sale.item_id,
                name: row.item_name.clone(),
                quantity_sold: 0,
                revenue: Money::ZERO,
            });
        entry.quantity_sold = entry.quantity_sold.saturating_add(row.sale.quantity);
        entry.revenue += row.sale.total_price;
    }
    let mut ranked: Vec<ProductRevenue> = by_item.into_values().collect();
    ranked.sort_by_key(|p| (Reverse(p.revenue), p.item_id));
    ranked.truncate(n);
    ranked
}

/// Items with the most units on hand.
#[must_use]
pub fn top_stocked(items: &[InventoryItem], n: usize) -> Vec<StockLevel> {
    let mut ranked: Vec<&InventoryItem> = items.iter().collect();
    ranked.sort_by_key(|item| (Reverse(item.quantity), item.id));
    ranked
        .into_iter()
        .take(n)
        .map(|item| StockLevel {
            item_id: item.id,
            name: item.name.clone(),
            quantity: item.quantity,
        })
        .collect()
}

/// Low stock items, emptiest first.
#[must_use]
pub fn low_stock(items: &[InventoryItem], policy: &LowStockPolicy) -> Vec<InventoryItem> {
    let mut low: Vec<InventoryItem> = items
        .iter()
        .filter(|item| policy.is_low(item))
        .cloned()
        .collect();
    low.sort_by_key(|item| (item.quantity, item.id));
    low
}

/// Items expiring in `[today, today + horizon_days]`, soonest first, each
/// item at most once.
#[must_use]
pub fn expiring(items: &[InventoryItem], today: NaiveDate, horizon_days: u32) -> Vec<InventoryItem> {
    let mut seen = HashSet::new();
    let mut expiring: Vec<InventoryItem> = items
        .iter()
        .filter(|item| item.expires_within(today, horizon_days))
        .filter(|item| seen.insert(item.id))
        .cloned()
        .collect();
    expiring.sort_by_key(|item| (item.expiry_date, item.id));
    expiring
}

/// Sales and inventory updates merged newest first, at most `limit` entries.
#[must_use]
pub fn recent_activity(items: &[InventoryItem], rows: &[SaleRow], limit: usize) -> Vec<Activity> {
    let sales = rows.iter().map(|row| Activity {
        kind: ActivityKind::Sale,
        item_id: row.sale.item_id,
        name: row.item_name.clone(),
        quantity: row.sale.quantity,
        amount: row.sale.total_price,
        at: row.sale.sold_at,
    });
    let updates = items.iter().map(|item| Activity {
        kind: ActivityKind::InventoryUpdate,
        item_id: item.id,
        name: item.name.clone(),
        quantity: item.quantity,
        amount: item.price,
        at: item.last_updated,
    });
    let mut feed: Vec<Activity> = sales.chain(updates).collect();
    feed.sort_by_key(|a| (Reverse(a.at), a.kind, a.item_id));
    feed.truncate(limit);
    feed
}

/// Every dashboard figure for one account at one instant.
///
/// The `Default` value is the zeroed snapshot shown while no account is
/// active.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub account: Option<AccountId>,
    pub computed_at: DateTime<Utc>,
    pub total_items: usize,
    pub low_stock_count: usize,
    pub low_stock_items: Vec<InventoryItem>,
    pub total_inventory_value: Money,
    pub total_sales: usize,
    pub total_revenue: Money,
    pub revenue_this_month: Money,
    pub total_cost: Money,
    pub gross_profit: Money,
    /// Gross profit as a percentage of revenue, 0 without revenue.
    pub profit_margin: f64,
    pub expiring_count: usize,
    pub expiring_items: Vec<InventoryItem>,
    pub recent_activity: Vec<Activity>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub max_monthly_revenue: Money,
    pub monthly_profit: Vec<MonthlyProfit>,
    pub top_products: Vec<ProductRevenue>,
    pub top_stocked: Vec<StockLevel>,
}

impl DashboardSnapshot {
    #[must_use]
    pub fn compute(
        account: Option<AccountId>,
        items: &[InventoryItem],
        rows: &[SaleRow],
        config: &LedgerConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let today = now.with_timezone(&Local).date_naive();
        let low_stock_items = low_stock(items, &config.low_stock);
        let expiring_items = expiring(items, today, config.expiry_horizon_days);
        let total_revenue = total_revenue(rows);
        let total_cost = total_cost(rows);
        let gross_profit = total_revenue - total_cost;
        let monthly_revenue = monthly_revenue(rows, config.revenue_months as usize);
        let max_monthly_revenue = monthly_revenue
            .iter()
            .map(|m| m.revenue)
            .max()
            .unwrap_or(Money::ZERO);

        Self {
            account,
            computed_at: now,
            total_items: items.len(),
            low_stock_count: low_stock_items.len(),
            low_stock_items,
            total_inventory_value: total_inventory_value(items),
            total_sales: rows.len(),
            total_revenue,
            revenue_this_month: revenue_between(rows, start_of_month_local(now), DateTime::<Utc>::MAX_UTC),
            total_cost,
            gross_profit,
            profit_margin: gross_profit.percent_of(total_revenue),
            expiring_count: expiring_items.len(),
            expiring_items,
            recent_activity: recent_activity(items, rows, config.recent_activity_limit),
            monthly_revenue,
            max_monthly_revenue,
            monthly_profit: monthly_profit(rows, config.profit_months as usize),
            top_products: top_products(rows, config.top_products),
            top_stocked: top_stocked(items, config.top_stocked_items),
        }
    }
}
