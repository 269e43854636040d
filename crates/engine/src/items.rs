//! The module contains `InventoryItem` and its storage model.

use chrono::{DateTime, Days, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AccountId, EngineError, Money,
    util::{parse_account_id, parse_uuid},
};

/// An item kept in stock by an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub account_id: AccountId,
    pub name: String,
    pub category: String,
    /// Units on hand. Never negative: sales that would oversell are rejected.
    pub quantity: i64,
    /// Current unit price. Sales keep their own copy of the price at sale time.
    pub price: Money,
    pub supplier_name: Option<String>,
    pub supplier_address: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    /// Per-item low stock threshold, honored by
    /// [`LowStockPolicy::PerItem`](crate::LowStockPolicy::PerItem).
    pub low_stock_threshold: Option<i64>,
    pub last_updated: DateTime<Utc>,
}

impl InventoryItem {
    /// Value of the units on hand at the current price.
    #[must_use]
    pub fn stock_value(&self) -> Money {
        self.price.saturating_times(self.quantity)
    }

    /// `true` if the item expires in `[today, today + horizon_days]`.
    #[must_use]
    pub fn expires_within(&self, today: NaiveDate, horizon_days: u32) -> bool {
        let Some(expiry) = self.expiry_date else {
            return false;
        };
        let horizon_end = today
            .checked_add_days(Days::new(u64::from(horizon_days)))
            .unwrap_or(NaiveDate::MAX);
        expiry >= today && expiry <= horizon_end
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub price_minor: i64,
    pub supplier_name: Option<String>,
    pub supplier_address: Option<String>,
    pub expiry_date: Option<Date>,
    pub low_stock_threshold: Option<i64>,
    pub last_updated: DateTimeUtc,
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
    #[sea_orm(has_many = "super::sales::Entity")]
    Sales,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&InventoryItem> for ActiveModel {
    fn from(value: &InventoryItem) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            account_id: ActiveValue::Set(value.account_id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            category: ActiveValue::Set(value.category.clone()),
            quantity: ActiveValue::Set(value.quantity),
            price_minor: ActiveValue::Set(value.price.cents()),
            supplier_name: ActiveValue::Set(value.supplier_name.clone()),
            supplier_address: ActiveValue::Set(value.supplier_address.clone()),
            expiry_date: ActiveValue::Set(value.expiry_date),
            low_stock_threshold: ActiveValue::Set(value.low_stock_threshold),
            last_updated: ActiveValue::Set(value.last_updated),
        }
    }
}

impl TryFrom<Model> for InventoryItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "item")?,
            account_id: parse_account_id(&model.account_id)?,
            name: model.name,
            category: model.category,
            quantity: model.quantity,
            price: Money::new(model.price_minor),
            supplier_name: model.supplier_name,
            supplier_address: model.supplier_address,
            expiry_date: model.expiry_date,
            low_stock_threshold: model.low_stock_threshold,
            last_updated: model.last_updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn item(expiry_date: Option<NaiveDate>) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            account_id: AccountId::new(),
            name: "Milk".to_string(),
            category: "Dairy".to_string(),
            quantity: 12,
            price: Money::new(1_25),
            supplier_name: None,
            supplier_address: None,
            expiry_date,
            low_stock_threshold: None,
            last_updated: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn stock_value_is_price_times_quantity() {
        assert_eq!(item(None).stock_value(), Money::new(15_00));
    }

    #[test]
    fn expiry_window_is_inclusive() {
        let today = date(2024, 5, 1);
        assert!(item(Some(today)).expires_within(today, 30));
        assert!(item(Some(date(2024, 5, 31))).expires_within(today, 30));
        assert!(!item(Some(date(2024, 6, 1))).expires_within(today, 30));
        assert!(!item(Some(date(2024, 4, 30))).expires_within(today, 30));
        assert!(!item(None).expires_within(today, 30));
    }

    #[test]
    fn model_round_trip_keeps_fields() {
        let original = item(Some(date(2024, 6, 1)));
        let active = ActiveModel::from(&original);
        let model = Model {
            id: original.id.to_string(),
            account_id: original.account_id.to_string(),
            name: active.name.unwrap(),
            category: active.category.unwrap(),
            quantity: active.quantity.unwrap(),
            price_minor: active.price_minor.unwrap(),
            supplier_name: None,
            supplier_address: None,
            expiry_date: active.expiry_date.unwrap(),
            low_stock_threshold: None,
            last_updated: original.last_updated,
        };
        assert_eq!(InventoryItem::try_from(model).unwrap(), original);
    }
}
