//! Sea-ORM entities for roomiex-auth

pub mod accounts;

pub use accounts::Entity as Accounts;
