use anyhow::Result;
use rusqlite::Connection;

pub const ACCOUNTS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    account_id TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    plan TEXT NOT NULL DEFAULT 'free',
    created_at TEXT NOT NULL
);
"#;

pub const USAGE_COUNTERS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS usage_counters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id TEXT NOT NULL,
    category TEXT NOT NULL,
    used INTEGER NOT NULL DEFAULT 0,
    last_updated TEXT NOT NULL,
    UNIQUE(account_id, category)
);
"#;

pub const CREDENTIALS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS credentials (
    email TEXT PRIMARY KEY,
    account_id TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    last_login TEXT
);
"#;

pub const REMINDERS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reminders (
    reminder_id TEXT PRIMARY KEY,
    account_id TEXT NOT NULL,
    text TEXT NOT NULL,
    remind_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

pub const GATEWAY_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_usage_account ON usage_counters(account_id);
CREATE INDEX IF NOT EXISTS idx_reminders_account ON reminders(account_id);
"#;

pub fn init_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(ACCOUNTS_TABLE_SCHEMA)?;
    conn.execute_batch(USAGE_COUNTERS_TABLE_SCHEMA)?;
    conn.execute_batch(CREDENTIALS_TABLE_SCHEMA)?;
    conn.execute_batch(REMINDERS_TABLE_SCHEMA)?;
    conn.execute_batch(GATEWAY_INDEXES)?;
    Ok(())
}
