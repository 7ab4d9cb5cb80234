use std::io;

use rusqlite;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("account {0} not found")]
    AccountNotFound(String),
    #[error("record already exists for {0}")]
    AlreadyExists(String),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}
