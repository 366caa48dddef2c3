//! Create `users` table.
//!
//! `email` carries a unique index: it is the store-level guard that decides
//! concurrent registrations for the same address.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::FirstName, 250).not_null().default(""))
                    .col(string_len(Users::LastName, 250).not_null().default(""))
                    .col(string_len(Users::Email, 254).not_null())
                    .col(string_len(Users::Password, 255).not_null())
                    .col(string_len(Users::Salt, 64).not_null())
                    .col(text(Users::Roles).not_null().default("user"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Users { Table, Id, FirstName, LastName, Email, Password, Salt, Roles }
