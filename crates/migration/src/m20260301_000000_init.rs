//! Initial schema migration.
//!
//! Creates the three relations of the ledger:
//!
//! - `accounts`: tenants owning inventory and sales
//! - `inventory`: stock items, scoped by `account_id`
//! - `sales`: recorded sales, scoped by `account_id` and pointing at an item
//!
//! `sales.item_id` is indexed but deliberately not a foreign key: deleting an
//! item leaves its historical sales in place, and readers drop them with an
//! inner join.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Username,
    PasswordHash,
    Email,
    CreatedAt,
}

#[derive(Iden)]
enum Inventory {
    Table,
    Id,
    AccountId,
    Name,
    Category,
    Quantity,
    PriceMinor,
    SupplierName,
    SupplierAddress,
    ExpiryDate,
    LowStockThreshold,
    LastUpdated,
}

#[derive(Iden)]
enum Sales {
    Table,
    Id,
    AccountId,
    ItemId,
    Quantity,
    PriceMinor,
    TotalMinor,
    SoldAt,
    Category,
    SupplierName,
    SupplierAddress,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Accounts::Email).string().not_null())
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Inventory
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Inventory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Inventory::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Inventory::AccountId).string().not_null())
                    .col(ColumnDef::new(Inventory::Name).string().not_null())
                    .col(ColumnDef::new(Inventory::Category).string().not_null())
                    .col(ColumnDef::new(Inventory::Quantity).big_integer().not_null())
                    .col(
                        ColumnDef::new(Inventory::PriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Inventory::SupplierName).string())
                    .col(ColumnDef::new(Inventory::SupplierAddress).string())
                    .col(ColumnDef::new(Inventory::ExpiryDate).date())
                    .col(ColumnDef::new(Inventory::LowStockThreshold).big_integer())
                    .col(
                        ColumnDef::new(Inventory::LastUpdated)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-inventory-account_id")
                            .from(Inventory::Table, Inventory::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-inventory-account_id")
                    .table(Inventory::Table)
                    .col(Inventory::AccountId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Sales
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sales::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Sales::AccountId).string().not_null())
                    .col(ColumnDef::new(Sales::ItemId).string().not_null())
                    .col(ColumnDef::new(Sales::Quantity).big_integer().not_null())
                    .col(ColumnDef::new(Sales::PriceMinor).big_integer().not_null())
                    .col(ColumnDef::new(Sales::TotalMinor).big_integer().not_null())
                    .col(ColumnDef::new(Sales::SoldAt).timestamp().not_null())
                    .col(ColumnDef::new(Sales::Category).string().not_null())
                    .col(ColumnDef::new(Sales::SupplierName).string())
                    .col(ColumnDef::new(Sales::SupplierAddress).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales-account_id")
                            .from(Sales::Table, Sales::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales-account_id-sold_at")
                    .table(Sales::Table)
                    .col(Sales::AccountId)
                    .col(Sales::SoldAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales-item_id")
                    .table(Sales::Table)
                    .col(Sales::ItemId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Inventory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
