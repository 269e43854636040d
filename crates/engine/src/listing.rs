//! Search and ordering for inventory and sales listings.
//!
//! Sortable fields are closed enums parsed at the boundary, so no caller
//! supplied text ever reaches a query. Sorting is stable and ties are always
//! broken by id ascending, whatever the requested direction.

use std::{cmp::Ordering, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{EngineError, InventoryItem, SaleRow, util::fold_text};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_text(s).as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(EngineError::InvalidInput(format!(
                "invalid sort order: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSortField {
    #[default]
    Name,
    Category,
    Quantity,
    Price,
    Supplier,
    ExpiryDate,
    LastUpdated,
}

impl FromStr for ItemSortField {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_text(s).replace([' ', '-'], "_").as_str() {
            "name" => Ok(Self::Name),
            "category" => Ok(Self::Category),
            "quantity" => Ok(Self::Quantity),
            "price" => Ok(Self::Price),
            "supplier" => Ok(Self::Supplier),
            "expiry" | "expiry_date" => Ok(Self::ExpiryDate),
            "last_updated" | "updated" => Ok(Self::LastUpdated),
            other => Err(EngineError::InvalidInput(format!(
                "invalid item sort field: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleSortField {
    #[default]
    Date,
    Item,
    Quantity,
    TotalPrice,
    Category,
    Supplier,
}

impl FromStr for SaleSortField {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_text(s).replace([' ', '-'], "_").as_str() {
            "date" | "sold_at" => Ok(Self::Date),
            "item" | "item_name" => Ok(Self::Item),
            "quantity" => Ok(Self::Quantity),
            "total" | "total_price" => Ok(Self::TotalPrice),
            "category" => Ok(Self::Category),
            "supplier" => Ok(Self::Supplier),
            other => Err(EngineError::InvalidInput(format!(
                "invalid sale sort field: {other}"
            ))),
        }
    }
}

/// Listing request for inventory items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub search: Option<String>,
    pub sort_by: ItemSortField,
    pub order: SortOrder,
}

impl ItemQuery {
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    #[must_use]
    pub fn sort(mut self, field: ItemSortField, order: SortOrder) -> Self {
        self.sort_by = field;
        self.order = order;
        self
    }
}

/// Listing request for sales. Newest sales come first by default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleQuery {
    pub search: Option<String>,
    pub sort_by: SaleSortField,
    pub order: SortOrder,
}

impl Default for SaleQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort_by: SaleSortField::Date,
            order: SortOrder::Descending,
        }
    }
}

impl SaleQuery {
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    #[must_use]
    pub fn sort(mut self, field: SaleSortField, order: SortOrder) -> Self {
        self.sort_by = field;
        self.order = order;
        self
    }
}

/// Folded search needle, `None` when there is nothing to search for.
fn needle(search: Option<&str>) -> Option<String> {
    search.map(fold_text).filter(|s| !s.is_empty())
}

fn any_contains(needle: &str, haystacks: &[Option<&str>]) -> bool {
    haystacks
        .iter()
        .flatten()
        .any(|text| fold_text(text).contains(needle))
}

fn text_key(value: Option<&str>) -> Option<String> {
    value.map(fold_text)
}

pub(crate) fn filter_and_sort_items(
    items: Vec<InventoryItem>,
    query: &ItemQuery,
) -> Vec<InventoryItem> {
    let needle = needle(query.search.as_deref());
    let mut items: Vec<InventoryItem> = items
        .into_iter()
        .filter(|item| {
            needle.as_deref().is_none_or(|n| {
                any_contains(
                    n,
                    &[
                        Some(item.name.as_str()),
                        Some(item.category.as_str()),
                        item.supplier_name.as_deref(),
                    ],
                )
            })
        })
        .collect();

    items.sort_by(|a, b| {
        let ordering = match query.sort_by {
            ItemSortField::Name => fold_text(&a.name).cmp(&fold_text(&b.name)),
            ItemSortField::Category => fold_text(&a.category).cmp(&fold_text(&b.category)),
            ItemSortField::Quantity => a.quantity.cmp(&b.quantity),
            ItemSortField::Price => a.price.cmp(&b.price),
            ItemSortField::Supplier => {
                text_key(a.supplier_name.as_deref()).cmp(&text_key(b.supplier_name.as_deref()))
            }
            ItemSortField::ExpiryDate => a.expiry_date.cmp(&b.expiry_date),
            ItemSortField::LastUpdated => a.last_updated.cmp(&b.last_updated),
        };
        query.order.apply(ordering).then_with(|| a.id.cmp(&b.id))
    });
    items
}

pub(crate) fn filter_and_sort_sales(rows: Vec<SaleRow>, query: &SaleQuery) -> Vec<SaleRow> {
    let needle = needle(query.search.as_deref());
    let mut rows: Vec<SaleRow> = rows
        .into_iter()
        .filter(|row| {
            needle.as_deref().is_none_or(|n| {
                any_contains(
                    n,
                    &[
                        Some(row.item_name.as_str()),
                        Some(row.sale.category.as_str()),
                        row.sale.supplier_name.as_deref(),
                        row.sale.supplier_address.as_deref(),
                    ],
                )
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        let ordering = match query.sort_by {
            SaleSortField::Date => a.sale.sold_at.cmp(&b.sale.sold_at),
            SaleSortField::Item => fold_text(&a.item_name).cmp(&fold_text(&b.item_name)),
            SaleSortField::Quantity => a.sale.quantity.cmp(&b.sale.quantity),
            SaleSortField::TotalPrice => a.sale.total_price.cmp(&b.sale.total_price),
            SaleSortField::Category => {
                fold_text(&a.sale.category).cmp(&fold_text(&b.sale.category))
            }
            SaleSortField::Supplier => text_key(a.sale.supplier_name.as_deref())
                .cmp(&text_key(b.sale.supplier_name.as_deref())),
        };
        query.order.apply(ordering).then_with(|| a.sale.id.cmp(&b.sale.id))
    });
    rows
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::{AccountId, Money};

    fn item(id: u128, name: &str, category: &str, quantity: i64) -> InventoryItem {
        InventoryItem {
            id: Uuid::from_u128(id),
            account_id: AccountId::from_uuid(Uuid::nil()),
            name: name.to_string(),
            category: category.to_string(),
            quantity,
            price: Money::new(100),
            supplier_name: Some("Acme Supplies".to_string()),
            supplier_address: None,
            expiry_date: None,
            low_stock_threshold: None,
            last_updated: Utc::now(),
        }
    }

    fn ids(items: &[InventoryItem]) -> Vec<u128> {
        items.iter().map(|i| i.id.as_u128()).collect()
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let items = vec![
            item(1, "Blue Widget", "Hardware", 5),
            item(2, "Gadget", "widgets", 5),
            item(3, "Sprocket", "Hardware", 5),
        ];
        let found = filter_and_sort_items(items.clone(), &ItemQuery::default().search("WIDGET"));
        assert_eq!(ids(&found), vec![1, 2]);

        let by_supplier = filter_and_sort_items(items, &ItemQuery::default().search("acme"));
        assert_eq!(by_supplier.len(), 3);
    }

    #[test]
    fn blank_search_matches_everything() {
        let items = vec![item(1, "A", "x", 1), item(2, "B", "y", 1)];
        let found = filter_and_sort_items(items, &ItemQuery::default().search("   "));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn ties_break_by_id_ascending_in_both_directions() {
        let items = vec![
            item(3, "C", "x", 7),
            item(1, "A", "x", 7),
            item(2, "B", "x", 9),
        ];
        let asc = filter_and_sort_items(
            items.clone(),
            &ItemQuery::default().sort(ItemSortField::Quantity, SortOrder::Ascending),
        );
        assert_eq!(ids(&asc), vec![1, 3, 2]);

        let desc = filter_and_sort_items(
            items,
            &ItemQuery::default().sort(ItemSortField::Quantity, SortOrder::Descending),
        );
        assert_eq!(ids(&desc), vec![2, 1, 3]);
    }

    #[test]
    fn sales_default_to_newest_first() {
        let now = Utc::now();
        let widget = item(1, "Widget", "Hardware", 10);
        let row = |id: u128, minutes_ago: i64| {
            let mut sale = crate::SaleRecord::new(
                &widget,
                1,
                Money::new(100),
                now - Duration::minutes(minutes_ago),
                None,
                None,
                None,
            )
            .unwrap();
            sale.id = Uuid::from_u128(id);
            SaleRow {
                sale,
                item_name: widget.name.clone(),
                item_price: widget.price,
            }
        };
        let rows = vec![row(1, 30), row(2, 5), row(3, 60)];
        let sorted = filter_and_sort_sales(rows, &SaleQuery::default());
        let order: Vec<u128> = sorted.iter().map(|r| r.sale.id.as_u128()).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[test]
    fn sort_fields_parse_at_the_boundary() {
        assert_eq!("Quantity".parse::<ItemSortField>().unwrap(), ItemSortField::Quantity);
        assert_eq!("Total Price".parse::<SaleSortField>().unwrap(), SaleSortField::TotalPrice);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Descending);
        assert!("name; DROP TABLE inventory".parse::<ItemSortField>().is_err());
    }
}
