//! Ledger tuning knobs.
//!
//! Every field has a default, so an empty config section yields a working
//! ledger. The app embeds [`LedgerConfig`] in its settings file.

use serde::{Deserialize, Serialize};

use crate::InventoryItem;

/// How an item is judged to be low on stock.
///
/// An item is low when `quantity <= threshold`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum LowStockPolicy {
    /// One threshold for every item.
    Global { threshold: i64 },
    /// Each item's own `low_stock_threshold`, or `default_threshold` when the
    /// item has none.
    PerItem { default_threshold: i64 },
}

impl LowStockPolicy {
    pub const DEFAULT_THRESHOLD: i64 = 10;

    #[must_use]
    pub fn threshold_for(&self, item: &InventoryItem) -> i64 {
        match *self {
            Self::Global { threshold } => threshold,
            Self::PerItem { default_threshold } => {
                item.low_stock_threshold.unwrap_or(default_threshold)
            }
        }
    }

    #[must_use]
    pub fn is_low(&self, item: &InventoryItem) -> bool {
        item.quantity <= self.threshold_for(item)
    }
}

impl Default for LowStockPolicy {
    fn default() -> Self {
        Self::Global {
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub low_stock: LowStockPolicy,
    /// Items expiring within this many days count as expiring.
    pub expiry_horizon_days: u32,
    pub recent_activity_limit: usize,
    /// Months kept in the monthly revenue series.
    pub revenue_months: u32,
    /// Months kept in the monthly profit series.
    pub profit_months: u32,
    pub top_products: usize,
    pub top_stocked_items: usize,
    /// Buffered events per subscriber before slow receivers start lagging.
    pub event_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            low_stock: LowStockPolicy::default(),
            expiry_horizon_days: 30,
            recent_activity_limit: 10,
            revenue_months: 12,
            profit_months: 6,
            top_products: 5,
            top_stocked_items: 5,
            event_capacity: 64,
        }
    }
}
