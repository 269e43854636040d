use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{
    ItemQuery, ItemSortField, ItemUpdate, Money, NewItem, SaleCmd, SaleQuery, SaleSortField,
    Session, SortOrder,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::LocalAuthenticator,
    error::{AppError, Result},
};

#[derive(Parser, Debug)]
#[command(name = "stockroom")]
#[command(about = "Inventory and sales ledger for a small shop")]
pub struct Cli {
    /// Settings file (TOML). Defaults to `stockroom.toml` when present.
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or check accounts.
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
    /// Manage inventory items.
    Item(ItemArgs),
    /// Record and list sales.
    Sale(SaleArgs),
    /// Print every dashboard figure.
    Dashboard {
        /// Username of the account to act on.
        #[arg(long)]
        account: String,
    },
}

#[derive(Args, Debug)]
pub struct ItemArgs {
    /// Username of the account to act on.
    #[arg(long)]
    account: String,

    #[command(subcommand)]
    command: ItemCommand,
}

#[derive(Args, Debug)]
pub struct SaleArgs {
    /// Username of the account to act on.
    #[arg(long)]
    account: String,

    #[command(subcommand)]
    command: SaleCommand,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Check credentials and print the account id.
    Verify {
        #[arg(long)]
        username: String,
        #[arg(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        quantity: i64,
        #[arg(long, value_parser = parse_money)]
        price: Money,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        supplier_address: Option<String>,
        /// Expiry date as YYYY-MM-DD.
        #[arg(long)]
        expiry: Option<NaiveDate>,
        #[arg(long)]
        low_stock_threshold: Option<i64>,
    },
    Update {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        quantity: Option<i64>,
        #[arg(long, value_parser = parse_money)]
        price: Option<Money>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long, conflicts_with = "supplier")]
        clear_supplier: bool,
        #[arg(long)]
        supplier_address: Option<String>,
        #[arg(long, conflicts_with = "supplier_address")]
        clear_supplier_address: bool,
        #[arg(long)]
        expiry: Option<NaiveDate>,
        /// Remove the expiry date.
        #[arg(long, conflicts_with = "expiry")]
        clear_expiry: bool,
        #[arg(long)]
        low_stock_threshold: Option<i64>,
        /// Fall back to the configured default threshold.
        #[arg(long, conflicts_with = "low_stock_threshold")]
        clear_low_stock_threshold: bool,
    },
    Delete {
        #[arg(long)]
        id: Uuid,
    },
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value = "name", value_parser = parse_item_sort)]
        sort: ItemSortField,
        #[arg(long, default_value = "asc", value_parser = parse_order)]
        order: SortOrder,
    },
}

#[derive(Subcommand, Debug)]
pub enum SaleCommand {
    Record {
        #[arg(long)]
        item: Uuid,
        #[arg(long)]
        quantity: i64,
        /// Unit price; defaults to the item's current price.
        #[arg(long, value_parser = parse_money)]
        price: Option<Money>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        supplier_address: Option<String>,
    },
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value = "date", value_parser = parse_sale_sort)]
        sort: SaleSortField,
        #[arg(long, default_value = "desc", value_parser = parse_order)]
        order: SortOrder,
    },
}

fn parse_money(raw: &str) -> std::result::Result<Money, String> {
    raw.parse().map_err(|err: engine::EngineError| err.to_string())
}

fn parse_item_sort(raw: &str) -> std::result::Result<ItemSortField, String> {
    raw.parse().map_err(|err: engine::EngineError| err.to_string())
}

fn parse_sale_sort(raw: &str) -> std::result::Result<SaleSortField, String> {
    raw.parse().map_err(|err: engine::EngineError| err.to_string())
}

fn parse_order(raw: &str) -> std::result::Result<SortOrder, String> {
    raw.parse().map_err(|err: engine::EngineError| err.to_string())
}

/// Maps a `--field` / `--clear-field` pair onto an optional update.
fn set_or_clear<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear { Some(None) } else { value.map(Some) }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn enter_account(session: &Session, username: &str) -> Result<()> {
    let account = session
        .engine()
        .account_by_username(username)
        .await?
        .ok_or_else(|| AppError::UnknownAccount(username.to_string()))?;
    session.set_active_account(account.id).await?;
    Ok(())
}

pub async fn run(command: Command, session: &Session) -> Result<()> {
    match command {
        Command::Account { command } => run_account(command, session).await,
        Command::Item(ItemArgs { account, command }) => {
            enter_account(session, &account).await?;
            run_item(command, session).await
        }
        Command::Sale(SaleArgs { account, command }) => {
            enter_account(session, &account).await?;
            run_sale(command, session).await
        }
        Command::Dashboard { account } => {
            enter_account(session, &account).await?;
            let snapshot = session.refresh().await?;
            print_json(&*snapshot)
        }
    }
}

async fn run_account(command: AccountCommand, session: &Session) -> Result<()> {
    let auth = LocalAuthenticator::new(session.engine().clone());
    match command {
        AccountCommand::Create {
            username,
            email,
            password,
        } => {
            let id = session.signup(&auth, &username, &password, &email).await?;
            tracing::info!(account = %id, "account created from cli");
            print_json(&json!({ "id": id, "username": username }))
        }
        AccountCommand::Verify { username, password } => {
            let id = session.login(&auth, &username, &password).await?;
            print_json(&json!({ "id": id, "username": username }))
        }
    }
}

async fn run_item(command: ItemCommand, session: &Session) -> Result<()> {
    match command {
        ItemCommand::Add {
            name,
            quantity,
            price,
            category,
            supplier,
            supplier_address,
            expiry,
            low_stock_threshold,
        } => {
            let mut item = NewItem::new(name, quantity, price);
            if let Some(category) = category {
                item = item.category(category);
            }
            if let Some(supplier) = supplier {
                item = item.supplier(supplier);
            }
            if let Some(address) = supplier_address {
                item = item.supplier_address(address);
            }
            if let Some(expiry) = expiry {
                item = item.expiry_date(expiry);
            }
            if let Some(threshold) = low_stock_threshold {
                item = item.low_stock_threshold(threshold);
            }
            let id = session.add_item(item).await?;
            print_json(&json!({ "id": id }))
        }
        ItemCommand::Update {
            id,
            name,
            quantity,
            price,
            category,
            supplier,
            clear_supplier,
            supplier_address,
            clear_supplier_address,
            expiry,
            clear_expiry,
            low_stock_threshold,
            clear_low_stock_threshold,
        } => {
            let update = ItemUpdate {
                name,
                category,
                quantity,
                price,
                supplier_name: set_or_clear(supplier, clear_supplier),
                supplier_address: set_or_clear(supplier_address, clear_supplier_address),
                expiry_date: set_or_clear(expiry, clear_expiry),
                low_stock_threshold: set_or_clear(
                    low_stock_threshold,
                    clear_low_stock_threshold,
                ),
            };
            let updated = session.update_item(id, update).await?;
            print_json(&json!({ "id": id, "updated": updated }))
        }
        ItemCommand::Delete { id } => {
            let deleted = session.delete_item(id).await?;
            print_json(&json!({ "id": id, "deleted": deleted }))
        }
        ItemCommand::List {
            search,
            sort,
            order,
        } => {
            let query = ItemQuery {
                search,
                sort_by: sort,
                order,
            };
            print_json(&session.list_items(&query).await?)
        }
    }
}

async fn run_sale(command: SaleCommand, session: &Session) -> Result<()> {
    match command {
        SaleCommand::Record {
            item,
            quantity,
            price,
            category,
            supplier,
            supplier_address,
        } => {
            let unit_price = match price {
                Some(price) => price,
                None => session
                    .item(item)
                    .await?
                    .map(|found| found.price)
                    .ok_or_else(|| engine::EngineError::KeyNotFound("item not exists".to_string()))?,
            };
            let cmd = SaleCmd {
                category,
                supplier_name: supplier,
                supplier_address,
                ..SaleCmd::new(item, quantity, unit_price)
            };
            let id = session.record_sale(cmd).await?;
            print_json(&json!({ "id": id }))
        }
        SaleCommand::List {
            search,
            sort,
            order,
        } => {
            let query = SaleQuery {
                search,
                sort_by: sort,
                order,
            };
            print_json(&session.list_sales(&query).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn item_list_parses_sort_options() {
        let cli = Cli::parse_from([
            "stockroom",
            "item",
            "--account",
            "alice",
            "list",
            "--sort",
            "quantity",
            "--order",
            "desc",
        ]);
        let Command::Item(ItemArgs { account, command }) = cli.command else {
            panic!("expected item command");
        };
        assert_eq!(account, "alice");
        assert!(matches!(
            command,
            ItemCommand::List {
                sort: ItemSortField::Quantity,
                order: SortOrder::Descending,
                ..
            }
        ));
    }

    #[test]
    fn item_update_clears_optional_fields() {
        let cli = Cli::parse_from([
            "stockroom",
            "item",
            "--account",
            "alice",
            "update",
            "--id",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "--clear-supplier",
            "--supplier-address",
            "1 Main St",
            "--clear-low-stock-threshold",
        ]);
        let Command::Item(ItemArgs {
            command:
                ItemCommand::Update {
                    supplier,
                    clear_supplier,
                    supplier_address,
                    clear_supplier_address,
                    low_stock_threshold,
                    clear_low_stock_threshold,
                    ..
                },
            ..
        }) = cli.command
        else {
            panic!("expected item update");
        };
        assert_eq!(set_or_clear(supplier, clear_supplier), Some(None));
        assert_eq!(
            set_or_clear(supplier_address, clear_supplier_address),
            Some(Some("1 Main St".to_string()))
        );
        assert_eq!(
            set_or_clear(low_stock_threshold, clear_low_stock_threshold),
            Some(None)
        );
        assert_eq!(set_or_clear::<i64>(None, false), None);
    }

    #[test]
    fn clear_flag_conflicts_with_value() {
        for (set, clear) in [
            ("--supplier", "--clear-supplier"),
            ("--supplier-address", "--clear-supplier-address"),
            ("--low-stock-threshold", "--clear-low-stock-threshold"),
        ] {
            let parsed = Cli::try_parse_from([
                "stockroom",
                "item",
                "--account",
                "alice",
                "update",
                "--id",
                "67e55044-10b1-426f-9247-bb680e5fe0c8",
                set,
                "5",
                clear,
            ]);
            assert!(parsed.is_err(), "{set} with {clear} must be rejected");
        }
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let parsed = Cli::try_parse_from([
            "stockroom",
            "sale",
            "--account",
            "alice",
            "list",
            "--sort",
            "price; drop table sales",
        ]);
        assert!(parsed.is_err());
    }
}
