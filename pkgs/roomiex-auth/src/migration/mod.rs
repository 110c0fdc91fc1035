//! Sea-ORM migrations for the accounts table
//!
//! `roomiex-store` folds `CreateAccountsTable` into its own migrator so a
//! single database carries every table. `Migrator` here is for running the
//! auth crate on its own.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_accounts_table;

pub use m20250301_000001_create_accounts_table::Migration as CreateAccountsTable;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateAccountsTable)]
    }
}
