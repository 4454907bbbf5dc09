use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use food_cart_common::UserRecord;
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension, Row};

use super::{StoreError, UserStore};

const USER_COLUMNS: &str = "phone_number, external_subject_id, name, is_active, is_super_admin, \
                            created_at, updated_at, last_login";

/// SQLite-backed user store.
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

impl SqliteUserStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        let conn = if path == ":memory:" || path == "memory" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::IoError(e.to_string()))?;
            }
            Connection::open(path)?
        };

        // phone_number is the primary key so concurrent first logins cannot
        // create two records for one number.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                phone_number TEXT PRIMARY KEY,
                external_subject_id TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 1,
                is_super_admin INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                last_login TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at)",
            [],
        )?;

        tracing::info!("User store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    fn query_users(
        &self,
        filter: Option<&str>,
        excluded: &[String],
    ) -> Result<Vec<UserRecord>, StoreError> {
        let mut clauses = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(fragment) = filter {
            args.push(Value::Text(fragment.to_string()));
            clauses.push(format!("instr(phone_number, ?{}) > 0", args.len()));
        }

        if !excluded.is_empty() {
            let start = args.len();
            let placeholders: Vec<String> = (1..=excluded.len())
                .map(|i| format!("?{}", start + i))
                .collect();
            args.extend(excluded.iter().cloned().map(Value::Text));
            clauses.push(format!("phone_number NOT IN ({})", placeholders.join(", ")));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM users{} ORDER BY created_at ASC, phone_number ASC",
            USER_COLUMNS, where_clause
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let users = stmt
            .query_map(params_from_iter(args), row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        phone_number: row.get(0)?,
        external_subject_id: row.get(1)?,
        name: row.get(2)?,
        is_active: row.get::<_, i32>(3)? != 0,
        is_super_admin: row.get::<_, i32>(4)? != 0,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        last_login: row.get(7)?,
    })
}

impl UserStore for SqliteUserStore {
    fn find_by_phone(&self, phone_number: &str) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE phone_number = ?1", USER_COLUMNS),
                params![phone_number],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn insert(&self, user: &UserRecord) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT INTO users (phone_number, external_subject_id, name, is_active, is_super_admin,
                                created_at, updated_at, last_login)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(phone_number) DO NOTHING",
            params![
                user.phone_number,
                user.external_subject_id,
                user.name,
                user.is_active,
                user.is_super_admin,
                user.created_at,
                user.updated_at,
                user.last_login,
            ],
        )?;
        Ok(inserted == 1)
    }

    fn record_login(
        &self,
        phone_number: &str,
        is_super_admin: bool,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let matched = conn.execute(
            "UPDATE users SET last_login = ?1, is_super_admin = ?2 WHERE phone_number = ?3",
            params![at, is_super_admin, phone_number],
        )?;
        Ok(matched > 0)
    }

    fn update_name(
        &self,
        phone_number: &str,
        name: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let matched = conn.execute(
            "UPDATE users SET name = ?1, updated_at = ?2 WHERE phone_number = ?3",
            params![name, at, phone_number],
        )?;
        Ok(matched > 0)
    }

    fn update_account(
        &self,
        phone_number: &str,
        name: &str,
        is_active: bool,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let matched = conn.execute(
            "UPDATE users SET name = ?1, is_active = ?2, updated_at = ?3 WHERE phone_number = ?4",
            params![name, is_active, at, phone_number],
        )?;
        Ok(matched > 0)
    }

    fn list_excluding(&self, excluded: &[String]) -> Result<Vec<UserRecord>, StoreError> {
        self.query_users(None, excluded)
    }

    fn search_excluding(
        &self,
        fragment: &str,
        excluded: &[String],
    ) -> Result<Vec<UserRecord>, StoreError> {
        self.query_users(Some(fragment), excluded)
    }
}
