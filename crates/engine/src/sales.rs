//! Sale records.
//!
//! A `SaleRecord` is a historical snapshot: quantity, unit price, total and
//! the item's category/supplier as they were when the sale happened. It is
//! written once, together with the matching stock decrement, and never
//! changed afterwards.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AccountId, EngineError, InventoryItem, Money, ResultEngine,
    util::{parse_account_id, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: Uuid,
    pub account_id: AccountId,
    pub item_id: Uuid,
    pub quantity: i64,
    pub unit_price: Money,
    /// `unit_price * quantity`, fixed at sale time.
    pub total_price: Money,
    pub sold_at: DateTime<Utc>,
    pub category: String,
    pub supplier_name: Option<String>,
    pub supplier_address: Option<String>,
}

impl SaleRecord {
    /// Builds a sale of `quantity` units of `item`.
    ///
    /// Category and supplier fall back to the item's own values when not
    /// given.
    pub fn new(
        item: &InventoryItem,
        quantity: i64,
        unit_price: Money,
        sold_at: DateTime<Utc>,
        category: Option<String>,
        supplier_name: Option<String>,
        supplier_address: Option<String>,
    ) -> ResultEngine<Self> {
        if quantity <= 0 {
            return Err(EngineError::InvalidInput(
                "sale quantity must be > 0".to_string(),
            ));
        }
        if unit_price.is_negative() {
            return Err(EngineError::InvalidInput(
                "sale price must be >= 0".to_string(),
            ));
        }
        let total_price = unit_price
            .times(quantity)
            .ok_or_else(|| EngineError::InvalidInput("sale total too large".to_string()))?;

        Ok(Self {
            id: Uuid::new_v4(),
            account_id: item.account_id,
            item_id: item.id,
            quantity,
            unit_price,
            total_price,
            sold_at,
            category: category.unwrap_or_else(|| item.category.clone()),
            supplier_name: supplier_name.or_else(|| item.supplier_name.clone()),
            supplier_address: supplier_address.or_else(|| item.supplier_address.clone()),
        })
    }
}

/// A sale joined with the item it refers to.
///
/// Only sales whose item still exists produce a row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SaleRow {
    pub sale: SaleRecord,
    pub item_name: String,
    /// The item's price now, which may differ from `sale.unit_price`.
    pub item_price: Money,
}

impl SaleRow {
    /// Cost of the sold units at the item's current price.
    #[must_use]
    pub fn current_cost(&self) -> Money {
        self.item_price.saturating_times(self.sale.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub price_minor: i64,
    pub total_minor: i64,
    pub sold_at: DateTimeUtc,
    pub category: String,
    pub supplier_name: Option<String>,
    pub supplier_address: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::items::Entity",
        from = "Column::ItemId",
        to = "super::items::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Item,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SaleRecord> for ActiveModel {
    fn from(value: &SaleRecord) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            account_id: ActiveValue::Set(value.account_id.to_string()),
            item_id: ActiveValue::Set(value.item_id.to_string()),
            quantity: ActiveValue::Set(value.quantity),
            price_minor: ActiveValue::Set(value.unit_price.cents()),
            total_minor: ActiveValue::Set(value.total_price.cents()),
            sold_at: ActiveValue::Set(value.sold_at),
            category: ActiveValue::Set(value.category.clone()),
            supplier_name: ActiveValue::Set(value.supplier_name.clone()),
            supplier_address: ActiveValue::Set(value.supplier_address.clone()),
        }
    }
}

impl TryFrom<Model> for SaleRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "sale")?,
            account_id: parse_account_id(&model.account_id)?,
            item_id: parse_uuid(&model.item_id, "item")?,
            quantity: model.quantity,
            unit_price: Money::new(model.price_minor),
            total_price: Money::new(model.total_minor),
            sold_at: model.sold_at,
            category: model.category,
            supplier_name: model.supplier_name,
            supplier_address: model.supplier_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn widget() -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            account_id: AccountId::new(),
            name: "Widget".to_string(),
            category: "Hardware".to_string(),
            quantity: 50,
            price: Money::new(2_00),
            supplier_name: Some("Acme".to_string()),
            supplier_address: Some("1 Main St".to_string()),
            expiry_date: None,
            low_stock_threshold: None,
            last_updated: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn total_is_price_times_quantity() {
        let item = widget();
        let sale = SaleRecord::new(&item, 5, Money::new(2_00), Utc::now(), None, None, None)
            .unwrap();
        assert_eq!(sale.total_price, Money::new(10_00));
        assert_eq!(sale.item_id, item.id);
        assert_eq!(sale.account_id, item.account_id);
    }

    #[test]
    fn snapshot_falls_back_to_item_attributes() {
        let item = widget();
        let sale = SaleRecord::new(
            &item,
            1,
            Money::new(2_00),
            Utc::now(),
            Some("Promo".to_string()),
            None,
            None,
        )
        .unwrap();
        assert_eq!(sale.category, "Promo");
        assert_eq!(sale.supplier_name.as_deref(), Some("Acme"));
        assert_eq!(sale.supplier_address.as_deref(), Some("1 Main St"));
    }

    #[test]
    fn rejects_zero_quantity_and_negative_price() {
        let item = widget();
        assert!(matches!(
            SaleRecord::new(&item, 0, Money::new(1), Utc::now(), None, None, None),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            SaleRecord::new(&item, 1, Money::new(-1), Utc::now(), None, None, None),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            SaleRecord::new(&item, 2, Money::new(i64::MAX), Utc::now(), None, None, None),
            Err(EngineError::InvalidInput(_))
        ));
    }
}
