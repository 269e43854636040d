//! Command structs for engine operations.
//!
//! These types group parameters for write operations (add item, update item,
//! record sale), keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::Money;

/// Add a new item to the active account's inventory.
#[derive(Clone, Debug)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub price: Money,
    pub supplier_name: Option<String>,
    pub supplier_address: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub low_stock_threshold: Option<i64>,
}

impl NewItem {
    pub const DEFAULT_CATEGORY: &'static str = "Uncategorized";

    #[must_use]
    pub fn new(name: impl Into<String>, quantity: i64, price: Money) -> Self {
        Self {
            name: name.into(),
            category: Self::DEFAULT_CATEGORY.to_string(),
            quantity,
            price,
            supplier_name: None,
            supplier_address: None,
            expiry_date: None,
            low_stock_threshold: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn supplier(mut self, name: impl Into<String>) -> Self {
        self.supplier_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn supplier_address(mut self, address: impl Into<String>) -> Self {
        self.supplier_address = Some(address.into());
        self
    }

    #[must_use]
    pub fn expiry_date(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    #[must_use]
    pub fn low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }
}

/// Change some fields of an existing item.
///
/// Fields left as `None` keep their value. Optional attributes use a nested
/// `Option` so they can be cleared: `Some(None)` removes the value.
#[derive(Clone, Debug, Default)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Money>,
    pub supplier_name: Option<Option<String>>,
    pub supplier_address: Option<Option<String>>,
    pub expiry_date: Option<Option<NaiveDate>>,
    pub low_stock_threshold: Option<Option<i64>>,
}

impl ItemUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    #[must_use]
    pub fn price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn supplier(mut self, name: Option<String>) -> Self {
        self.supplier_name = Some(name);
        self
    }

    #[must_use]
    pub fn supplier_address(mut self, address: Option<String>) -> Self {
        self.supplier_address = Some(address);
        self
    }

    #[must_use]
    pub fn expiry_date(mut self, date: Option<NaiveDate>) -> Self {
        self.expiry_date = Some(date);
        self
    }

    #[must_use]
    pub fn low_stock_threshold(mut self, threshold: Option<i64>) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }
}

/// Record a sale of an inventory item.
#[derive(Clone, Debug)]
pub struct SaleCmd {
    pub item_id: Uuid,
    pub quantity: i64,
    pub unit_price: Money,
    /// Defaults to the item's category.
    pub category: Option<String>,
    /// Defaults to the item's supplier.
    pub supplier_name: Option<String>,
    pub supplier_address: Option<String>,
    /// Defaults to `Utc::now()` at recording time.
    pub sold_at: Option<DateTime<Utc>>,
}

impl SaleCmd {
    #[must_use]
    pub fn new(item_id: Uuid, quantity: i64, unit_price: Money) -> Self {
        Self {
            item_id,
            quantity,
            unit_price,
            category: None,
            supplier_name: None,
            supplier_address: None,
            sold_at: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn supplier(mut self, name: impl Into<String>) -> Self {
        self.supplier_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn supplier_address(mut self, address: impl Into<String>) -> Self {
        self.supplier_address = Some(address.into());
        self
    }

    #[must_use]
    pub fn sold_at(mut self, sold_at: DateTime<Utc>) -> Self {
        self.sold_at = Some(sold_at);
        self
    }
}
