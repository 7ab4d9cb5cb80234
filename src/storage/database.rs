use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use uuid::Uuid;

use crate::quota::{SubscriptionPlan, UsageCategory, UsageCounters};

use super::error::StorageError;
use super::schema::init_database;
use super::GATEWAY_DB_FILENAME;

#[derive(Debug, Clone)]
pub struct UserAccount {
    pub account_id: String,
    pub email: String,
    pub plan: SubscriptionPlan,
    pub usage: UsageCounters,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub email: String,
    pub account_id: String,
    pub password_hash: String,
    pub created_at: String,
    pub last_login: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReminderRecord {
    pub reminder_id: String,
    pub account_id: String,
    pub text: String,
    pub remind_at: String,
    pub created_at: String,
}

pub struct AccountStore {
    conn: Mutex<Connection>,
}

impl AccountStore {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)?;
        let db_path = data_dir.join(GATEWAY_DB_FILENAME);
        let is_new = !db_path.exists();
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        if is_new {
            init_database(&conn)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates the account row and its zeroed usage counter rows in one
    /// transaction.
    pub fn create_account(
        &self,
        account_id: &str,
        email: &str,
        plan: SubscriptionPlan,
    ) -> Result<UserAccount, StorageError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))?;

        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO accounts (account_id, email, plan, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![account_id, email, plan.as_str(), now],
        )
        .map_err(|err| constraint_to_exists(err, account_id))?;

        for category in UsageCategory::ALL {
            tx.execute(
                r#"
                INSERT INTO usage_counters (account_id, category, used, last_updated)
                VALUES (?1, ?2, 0, ?3)
                "#,
                params![account_id, category.as_str(), now],
            )?;
        }

        tx.commit()?;

        Ok(UserAccount {
            account_id: account_id.to_string(),
            email: email.to_string(),
            plan,
            usage: UsageCounters::zeroed(),
            created_at: now,
        })
    }

    pub fn get_account(&self, account_id: &str) -> Result<Option<UserAccount>, StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT account_id, email, plan, created_at
            FROM accounts
            WHERE account_id = ?1
            "#,
        )?;

        let row = stmt
            .query_row(params![account_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .optional()?;

        let Some((account_id, email, plan, created_at)) = row else {
            return Ok(None);
        };

        // A record written without a plan is treated as free.
        let plan = plan
            .and_then(|value| value.parse::<SubscriptionPlan>().ok())
            .unwrap_or_default();
        let usage = load_usage_locked(&conn, &account_id)?;

        Ok(Some(UserAccount {
            account_id,
            email,
            plan,
            usage,
            created_at,
        }))
    }

    pub fn update_plan(
        &self,
        account_id: &str,
        plan: SubscriptionPlan,
    ) -> Result<(), StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))?;

        let changed = conn.execute(
            "UPDATE accounts SET plan = ?2 WHERE account_id = ?1",
            params![account_id, plan.as_str()],
        )?;

        if changed == 0 {
            return Err(StorageError::AccountNotFound(account_id.to_string()));
        }
        Ok(())
    }

    pub fn load_usage(&self, account_id: &str) -> Result<UsageCounters, StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))?;
        load_usage_locked(&conn, account_id)
    }

    /// Adds one to a counter iff it is still below `ceiling`, in a single
    /// transaction. Returns false when the ceiling was already reached, in
    /// which case nothing is written.
    pub fn increment_usage_if_below(
        &self,
        account_id: &str,
        category: UsageCategory,
        ceiling: u64,
    ) -> Result<bool, StorageError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))?;

        let now = Utc::now().to_rfc3339();
        // SQLite integers are signed 64-bit.
        let ceiling = ceiling.min(i64::MAX as u64) as i64;

        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT OR IGNORE INTO usage_counters (account_id, category, used, last_updated)
            VALUES (?1, ?2, 0, ?3)
            "#,
            params![account_id, category.as_str(), now],
        )?;

        let changed = tx.execute(
            r#"
            UPDATE usage_counters
            SET used = used + 1, last_updated = ?4
            WHERE account_id = ?1 AND category = ?2 AND used < ?3
            "#,
            params![account_id, category.as_str(), ceiling, now],
        )?;
        tx.commit()?;

        Ok(changed == 1)
    }

    pub fn save_usage(
        &self,
        account_id: &str,
        category: UsageCategory,
        used: u64,
    ) -> Result<(), StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO usage_counters (account_id, category, used, last_updated)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(account_id, category) DO UPDATE SET
                used = excluded.used,
                last_updated = excluded.last_updated
            "#,
            params![account_id, category.as_str(), used.min(i64::MAX as u64) as i64, now],
        )?;

        Ok(())
    }

    pub fn create_credentials(
        &self,
        email: &str,
        account_id: &str,
        password_hash: &str,
    ) -> Result<(), StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO credentials (email, account_id, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![email, account_id, password_hash, now],
        )
        .map_err(|err| constraint_to_exists(err, email))?;

        Ok(())
    }

    pub fn get_credentials(&self, email: &str) -> Result<Option<CredentialRecord>, StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT email, account_id, password_hash, created_at, last_login
            FROM credentials
            WHERE email = ?1
            "#,
        )?;

        let result = stmt
            .query_row(params![email], |row| {
                Ok(CredentialRecord {
                    email: row.get(0)?,
                    account_id: row.get(1)?,
                    password_hash: row.get(2)?,
                    created_at: row.get(3)?,
                    last_login: row.get(4)?,
                })
            })
            .optional()?;

        Ok(result)
    }

    pub fn touch_last_login(&self, email: &str) -> Result<(), StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "UPDATE credentials SET last_login = ?2 WHERE email = ?1",
            params![email, now],
        )?;

        Ok(())
    }

    pub fn create_reminder(
        &self,
        account_id: &str,
        text: &str,
        remind_at: &str,
    ) -> Result<ReminderRecord, StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))?;

        let reminder_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO reminders (reminder_id, account_id, text, remind_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![reminder_id, account_id, text, remind_at, now],
        )?;

        Ok(ReminderRecord {
            reminder_id,
            account_id: account_id.to_string(),
            text: text.to_string(),
            remind_at: remind_at.to_string(),
            created_at: now,
        })
    }

    pub fn list_reminders(&self, account_id: &str) -> Result<Vec<ReminderRecord>, StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT reminder_id, account_id, text, remind_at, created_at
            FROM reminders
            WHERE account_id = ?1
            ORDER BY created_at DESC
            "#,
        )?;

        let rows = stmt.query_map(params![account_id], |row| {
            Ok(ReminderRecord {
                reminder_id: row.get(0)?,
                account_id: row.get(1)?,
                text: row.get(2)?,
                remind_at: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        let mut reminders = Vec::new();
        for row in rows {
            reminders.push(row?);
        }
        Ok(reminders)
    }
}

/// Usage rows are overlaid onto zeroed counters: categories without a row stay
/// zero, present rows are never overwritten.
fn load_usage_locked(conn: &Connection, account_id: &str) -> Result<UsageCounters, StorageError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT category, used
        FROM usage_counters
        WHERE account_id = ?1
        "#,
    )?;

    let rows = stmt.query_map(params![account_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut usage = UsageCounters::zeroed();
    for row in rows {
        let (category, used) = row?;
        if let Ok(category) = category.parse::<UsageCategory>() {
            usage.set(category, used.max(0) as u64);
        }
    }
    Ok(usage)
}

fn constraint_to_exists(err: rusqlite::Error, key: &str) -> StorageError {
    match &err {
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == ErrorCode::ConstraintViolation =>
        {
            StorageError::AlreadyExists(key.to_string())
        }
        _ => StorageError::DatabaseError(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, AccountStore) {
        let dir = TempDir::new().expect("tempdir");
        let store = AccountStore::new(dir.path().to_path_buf()).expect("store");
        (dir, store)
    }

    #[test]
    fn test_account_round_trip() {
        let (_dir, store) = test_store();
        store
            .create_account("acct-1", "user@example.com", SubscriptionPlan::Pro)
            .unwrap();

        let account = store.get_account("acct-1").unwrap().expect("account");
        assert_eq!(account.email, "user@example.com");
        assert_eq!(account.plan, SubscriptionPlan::Pro);
        assert_eq!(account.usage, UsageCounters::zeroed());

        assert!(store.get_account("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_account_rejected() {
        let (_dir, store) = test_store();
        store
            .create_account("acct-1", "user@example.com", SubscriptionPlan::Free)
            .unwrap();
        let err = store
            .create_account("acct-1", "other@example.com", SubscriptionPlan::Free)
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn test_increment_stops_at_ceiling() {
        let (_dir, store) = test_store();
        store
            .create_account("acct-1", "user@example.com", SubscriptionPlan::Free)
            .unwrap();

        for _ in 0..3 {
            assert!(store
                .increment_usage_if_below("acct-1", UsageCategory::Images, 3)
                .unwrap());
        }
        assert!(!store
            .increment_usage_if_below("acct-1", UsageCategory::Images, 3)
            .unwrap());

        let usage = store.load_usage("acct-1").unwrap();
        assert_eq!(usage.images, 3);
        assert_eq!(usage.messages, 0);
    }

    #[test]
    fn test_increment_with_unbounded_ceiling() {
        let (_dir, store) = test_store();
        store
            .create_account("acct-1", "user@example.com", SubscriptionPlan::Premium)
            .unwrap();
        store
            .save_usage("acct-1", UsageCategory::Reminders, 500_000)
            .unwrap();

        assert!(store
            .increment_usage_if_below("acct-1", UsageCategory::Reminders, u64::MAX)
            .unwrap());
        let usage = store.load_usage("acct-1").unwrap();
        assert_eq!(usage.reminders, 500_001);
    }

    #[test]
    fn test_partial_usage_rows_fill_missing_only() {
        let (_dir, store) = test_store();
        // A counter row written without the rest of the account record.
        store
            .save_usage("legacy-acct", UsageCategory::Messages, 7)
            .unwrap();

        let usage = store.load_usage("legacy-acct").unwrap();
        assert_eq!(usage.messages, 7);
        assert_eq!(usage.images, 0);
        assert_eq!(usage.reminders, 0);

        // Incrementing must build on the existing value, not reset it.
        assert!(store
            .increment_usage_if_below("legacy-acct", UsageCategory::Messages, 15)
            .unwrap());
        assert_eq!(store.load_usage("legacy-acct").unwrap().messages, 8);
    }

    #[test]
    fn test_credentials_round_trip() {
        let (_dir, store) = test_store();
        store
            .create_credentials("user@example.com", "acct-1", "hash-value")
            .unwrap();

        let creds = store
            .get_credentials("user@example.com")
            .unwrap()
            .expect("credentials");
        assert_eq!(creds.account_id, "acct-1");
        assert_eq!(creds.password_hash, "hash-value");
        assert!(creds.last_login.is_none());

        store.touch_last_login("user@example.com").unwrap();
        let creds = store.get_credentials("user@example.com").unwrap().unwrap();
        assert!(creds.last_login.is_some());

        let err = store
            .create_credentials("user@example.com", "acct-2", "other-hash")
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn test_reminders_round_trip() {
        let (_dir, store) = test_store();
        store
            .create_reminder("acct-1", "water the plants", "2026-08-07T09:00:00Z")
            .unwrap();
        store
            .create_reminder("acct-1", "stand-up", "2026-08-07T10:00:00Z")
            .unwrap();

        let reminders = store.list_reminders("acct-1").unwrap();
        assert_eq!(reminders.len(), 2);
        assert!(store.list_reminders("acct-2").unwrap().is_empty());
    }

    #[test]
    fn test_update_plan() {
        let (_dir, store) = test_store();
        store
            .create_account("acct-1", "user@example.com", SubscriptionPlan::Free)
            .unwrap();
        store.update_plan("acct-1", SubscriptionPlan::Premium).unwrap();

        let account = store.get_account("acct-1").unwrap().unwrap();
        assert_eq!(account.plan, SubscriptionPlan::Premium);

        let err = store
            .update_plan("missing", SubscriptionPlan::Pro)
            .unwrap_err();
        assert!(matches!(err, StorageError::AccountNotFound(_)));
    }
}
