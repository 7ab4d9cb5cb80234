pub mod database;
pub mod error;
pub mod schema;

pub use database::{AccountStore, CredentialRecord, ReminderRecord, UserAccount};
pub use error::StorageError;

pub const GATEWAY_DB_FILENAME: &str = "gateway.db";
