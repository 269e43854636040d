//! Inventory and sales ledger for a small business.
//!
//! [`Engine`] runs every ledger operation against an explicit [`Scope`];
//! [`Session`] keeps the active account, caches the latest
//! [`DashboardSnapshot`] and publishes [`LedgerEvent`]s as the data changes.

pub use accounts::Account;
pub use auth::Authenticator;
pub use commands::{ItemUpdate, NewItem, SaleCmd};
pub use config::{LedgerConfig, LowStockPolicy};
pub use dashboard::{
    Activity, ActivityKind, DashboardSnapshot, MonthlyProfit, MonthlyRevenue, ProductRevenue,
    StockLevel, YearMonth, start_of_month_local,
};
pub use error::EngineError;
pub use events::{EventBus, LedgerEvent};
pub use items::InventoryItem;
pub use listing::{ItemQuery, ItemSortField, SaleQuery, SaleSortField, SortOrder};
pub use money::Money;
pub use ops::{Engine, EngineBuilder};
pub use sales::{SaleRecord, SaleRow};
pub use scope::{AccountId, Scope};
pub use session::Session;

mod accounts;
mod auth;
mod commands;
mod config;
mod dashboard;
mod error;
mod events;
mod items;
mod listing;
mod money;
mod ops;
mod sales;
mod scope;
mod session;
mod store;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
