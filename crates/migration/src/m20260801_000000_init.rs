//! Initial schema migration - creates all tables from scratch.
//!
//! Complete schema for Cassa:
//!
//! - `users`: identity registry + global-admin role
//! - `groups`: group registry
//! - `fleet_memberships`: which groups aggregate into which fleet
//! - `group_admins`: cache of the platform's per-group admin lists
//! - `transactions`: the append-only ledger of signed entries
//! - `exchange_rates`: operator-entered rates, one row per (currency, date)
//!
//! The ledger carries platform-assigned ids directly and takes no foreign
//! keys into the registry tables: registries are caches refreshed from the
//! platform, the entry log is the source of truth.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    UserId,
    Username,
    DisplayName,
    Role,
    CreatedAt,
}

#[derive(Iden)]
enum Groups {
    Table,
    GroupId,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum FleetMemberships {
    Table,
    Fleet,
    GroupId,
}

#[derive(Iden)]
enum GroupAdmins {
    Table,
    GroupId,
    UserId,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    GroupId,
    UserId,
    Kind,
    Date,
    AmountMinor,
    Currency,
    Fund,
    Note,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum ExchangeRates {
    Table,
    Currency,
    EffectiveDate,
    Rate,
    SetBy,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).string())
                    .col(ColumnDef::new(Users::DisplayName).string())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("member"),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Groups
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Groups::GroupId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Groups::Name).string().not_null())
                    .col(ColumnDef::new(Groups::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Fleet Memberships
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FleetMemberships::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FleetMemberships::Fleet).string().not_null())
                    .col(
                        ColumnDef::new(FleetMemberships::GroupId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(FleetMemberships::Fleet)
                            .col(FleetMemberships::GroupId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fleet_memberships-group_id")
                            .from(FleetMemberships::Table, FleetMemberships::GroupId)
                            .to(Groups::Table, Groups::GroupId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fleet_memberships-group_id")
                    .table(FleetMemberships::Table)
                    .col(FleetMemberships::GroupId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Group Admins
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(GroupAdmins::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupAdmins::GroupId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupAdmins::UserId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(GroupAdmins::GroupId)
                            .col(GroupAdmins::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_admins-group_id")
                            .from(GroupAdmins::Table, GroupAdmins::GroupId)
                            .to(Groups::Table, Groups::GroupId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_admins-user_id")
                            .from(GroupAdmins::Table, GroupAdmins::UserId)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-group_admins-user_id")
                    .table(GroupAdmins::Table)
                    .col(GroupAdmins::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Transactions::GroupId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Date).date().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Currency).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::Fund)
                            .string()
                            .not_null()
                            .default("none"),
                    )
                    .col(ColumnDef::new(Transactions::Note).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-group_id-date")
                    .table(Transactions::Table)
                    .col(Transactions::GroupId)
                    .col(Transactions::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-group_id-kind")
                    .table(Transactions::Table)
                    .col(Transactions::GroupId)
                    .col(Transactions::Kind)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Exchange Rates
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ExchangeRates::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ExchangeRates::Currency).string().not_null())
                    .col(
                        ColumnDef::new(ExchangeRates::EffectiveDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExchangeRates::Rate).string().not_null())
                    .col(
                        ColumnDef::new(ExchangeRates::SetBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExchangeRates::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ExchangeRates::Currency)
                            .col(ExchangeRates::EffectiveDate),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-exchange_rates-effective_date")
                    .table(ExchangeRates::Table)
                    .col(ExchangeRates::EffectiveDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(ExchangeRates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupAdmins::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FleetMemberships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
