// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (registration and lookup by username)
//! - Records (workouts, meals, activities) through the [`Record`] trait

use crate::db::tables;
use crate::error::AppError;
use crate::models::{Activity, FieldKind, Meal, Record, User, Workout};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// SQLite database client.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Database(format!("Invalid database URL {url}: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open {url}: {e}")))?;

        tracing::info!(url, "Connected to SQLite");

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// Private in-memory database, used by tests.
    ///
    /// Every connection to `sqlite::memory:` is a separate database, so the
    /// pool is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// Create all tables if they do not exist yet.
    async fn init_schema(&self) -> Result<(), AppError> {
        let users = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            tables::USERS
        );
        sqlx::query(&users).execute(&self.pool).await?;

        self.create_record_table::<Workout>().await?;
        self.create_record_table::<Meal>().await?;
        self.create_record_table::<Activity>().await?;

        tracing::debug!("Database schema ready");
        Ok(())
    }

    async fn create_record_table<R: Record>(&self) -> Result<(), AppError> {
        let schema = R::SCHEMA;
        let columns: Vec<String> = schema
            .fields
            .iter()
            .map(|field| {
                let sql_type = match field.kind {
                    FieldKind::Text => "TEXT",
                    FieldKind::Integer => "INTEGER",
                };
                format!("{} {} NOT NULL", field.name, sql_type)
            })
            .collect();

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY AUTOINCREMENT, {})",
            schema.table,
            columns.join(", ")
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by exact username.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT id, username, password_hash, created_at FROM {} WHERE username = ?",
            tables::USERS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Get a user by id.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT id, username, password_hash, created_at FROM {} WHERE id = ?",
            tables::USERS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Insert a new user.
    ///
    /// Returns `Ok(None)` when the username is already taken; no row is
    /// written in that case.
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists_sql = format!("SELECT COUNT(*) FROM {} WHERE username = ?", tables::USERS);
        let (existing,): (i64,) = sqlx::query_as(&exists_sql)
            .bind(username)
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            return Ok(None);
        }

        let created_at = chrono::Utc::now().to_rfc3339();
        let insert_sql = format!(
            "INSERT INTO {} (username, password_hash, created_at) VALUES (?, ?, ?)",
            tables::USERS
        );
        let result = sqlx::query(&insert_sql)
            .bind(username)
            .bind(password_hash)
            .bind(&created_at)
            .execute(&mut *tx)
            .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            // A concurrent registration won the race.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;

        Ok(Some(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        }))
    }

    /// Number of registered users, logged at startup.
    pub async fn count_users(&self) -> Result<i64, AppError> {
        let sql = format!("SELECT COUNT(*) FROM {}", tables::USERS);
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    // ─── Record Operations ───────────────────────────────────────

    /// All records of type `R` in insertion order.
    pub async fn list<R: Record>(&self) -> Result<Vec<R>, AppError> {
        let schema = R::SCHEMA;
        let sql = format!(
            "SELECT id, {} FROM {} ORDER BY id",
            schema.column_list(),
            schema.table
        );
        Ok(sqlx::query_as::<_, R>(&sql).fetch_all(&self.pool).await?)
    }

    /// Get one record by id.
    pub async fn get<R: Record>(&self, id: i64) -> Result<Option<R>, AppError> {
        let schema = R::SCHEMA;
        let sql = format!(
            "SELECT id, {} FROM {} WHERE id = ?",
            schema.column_list(),
            schema.table
        );
        Ok(sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Insert a record, returning its generated id.
    pub async fn insert<R: Record>(&self, input: &R::Input) -> Result<i64, AppError> {
        let schema = R::SCHEMA;
        let placeholders = vec!["?"; schema.fields.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.table,
            schema.column_list(),
            placeholders
        );

        let result = R::bind(input, sqlx::query(&sql))
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Overwrite every editable column of record `id`.
    ///
    /// Returns `false` if no such record exists.
    pub async fn update<R: Record>(&self, id: i64, input: &R::Input) -> Result<bool, AppError> {
        let schema = R::SCHEMA;
        let assignments = schema
            .fields
            .iter()
            .map(|f| format!("{} = ?", f.name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {} SET {} WHERE id = ?", schema.table, assignments);

        let result = R::bind(input, sqlx::query(&sql))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete record `id`. Returns `false` if no such record exists.
    pub async fn delete<R: Record>(&self, id: i64) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", R::SCHEMA.table);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMeal, NewWorkout};

    #[tokio::test]
    async fn test_records_listed_in_insertion_order() {
        let db = Db::in_memory().await.unwrap();

        for (name, duration) in [("Run", 30), ("Bike", 60), ("Swim", 45)] {
            db.insert::<Workout>(&NewWorkout {
                name: name.to_string(),
                duration,
            })
            .await
            .unwrap();
        }

        let names: Vec<String> = db
            .list::<Workout>()
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, ["Run", "Bike", "Swim"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_report_missing_rows() {
        let db = Db::in_memory().await.unwrap();
        let input = NewMeal {
            name: "Salad".to_string(),
            calories: 350,
        };

        assert!(!db.update::<Meal>(99, &input).await.unwrap());
        assert!(!db.delete::<Meal>(99).await.unwrap());

        let id = db.insert::<Meal>(&input).await.unwrap();
        let changed = NewMeal {
            name: "Big salad".to_string(),
            calories: 600,
        };
        assert!(db.update::<Meal>(id, &changed).await.unwrap());
        assert_eq!(
            db.get::<Meal>(id).await.unwrap(),
            Some(Meal {
                id,
                name: "Big salad".to_string(),
                calories: 600
            })
        );

        assert!(db.delete::<Meal>(id).await.unwrap());
        assert_eq!(db.get::<Meal>(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tables_are_independent() {
        let db = Db::in_memory().await.unwrap();
        db.insert::<Workout>(&NewWorkout {
            name: "Run".to_string(),
            duration: 30,
        })
        .await
        .unwrap();

        assert!(db.list::<Meal>().await.unwrap().is_empty());
        assert!(db.list::<Activity>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_username_creates_no_row() {
        let db = Db::in_memory().await.unwrap();

        let first = db.create_user("alice", "hash-1").await.unwrap();
        assert!(first.is_some());

        let second = db.create_user("alice", "hash-2").await.unwrap();
        assert!(second.is_none());
        assert_eq!(db.count_users().await.unwrap(), 1);

        let stored = db.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "hash-1");
        assert_eq!(db.get_user(stored.id).await.unwrap().unwrap().username, "alice");
    }
}
