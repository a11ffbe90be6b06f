//! SQLite record store (embedded, no external dependencies)
//!
//! The table is created from the record's descriptor table on
//! initialization. The backend owns identifiers: inserts auto-increment and
//! ignore the caller's id.

use super::Store;
use crate::error::{internal, StoreError, StoreResult};
use crate::filter::{self, Condition};
use async_trait::async_trait;
use bookshelf_types::{Column, Field, FieldKind, FieldValue, Filters, Record};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const IN_MEMORY_URL: &str = "sqlite::memory:";

pub struct RelationalStore<T> {
    options: SqliteConnectOptions,
    max_connections: u32,
    /// Directory to create before connecting (file-backed databases only)
    data_dir: Option<PathBuf>,
    seed: Vec<T>,
    pool: OnceCell<SqlitePool>,
}

impl<T: Record> RelationalStore<T> {
    /// File-backed store. The file and its directory are created on
    /// initialization if missing.
    pub fn open(database_path: impl AsRef<Path>, seed: Vec<T>) -> Self {
        let path = database_path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        Self {
            options,
            max_connections: 5,
            data_dir: path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf),
            seed,
            pool: OnceCell::new(),
        }
    }

    /// Private in-memory database, gone when the store is dropped
    pub fn in_memory(seed: Vec<T>) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(IN_MEMORY_URL)
            .map_err(internal("parsing in-memory database url"))?;

        Ok(Self {
            options,
            // Every connection to :memory: is a separate database
            max_connections: 1,
            data_dir: None,
            seed,
            pool: OnceCell::new(),
        })
    }

    fn pool(&self) -> StoreResult<&SqlitePool> {
        self.pool.get().ok_or(StoreError::Uninitialized)
    }

    async fn connect(&self) -> StoreResult<SqlitePool> {
        if let Some(dir) = &self.data_dir {
            info!("Creating database directory: {}", dir.display());
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(internal("creating database directory"))?;
        }

        SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(self.options.clone())
            .await
            .map_err(internal("connecting to database"))
    }

    /// Column used to address a row: the primary key, or SQLite's rowid
    fn key_column() -> &'static str {
        T::primary_key().map(|f| f.name).unwrap_or("rowid")
    }

    fn column_list() -> String {
        T::fields()
            .iter()
            .map(|f| f.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn create_table_sql() -> String {
        let columns = T::fields()
            .iter()
            .map(|f| format!("{} {}", f.name, column_definition(f)))
            .collect::<Vec<_>>()
            .join(",\n    ");
        format!("CREATE TABLE IF NOT EXISTS {} (\n    {}\n)", T::TABLE, columns)
    }

    async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
        sqlx::query(&Self::create_table_sql())
            .execute(pool)
            .await
            .map_err(internal("creating table"))?;
        Ok(())
    }

    /// Insert each seed record whose slot (`position + 1`) is still empty
    async fn load_seed(&self, pool: &SqlitePool) -> StoreResult<usize> {
        let mut inserted = 0;
        for (i, record) in self.seed.iter().enumerate() {
            let slot = i as i64 + 1;
            if Self::fetch(pool, slot).await?.is_some() {
                continue;
            }
            // A deleted seed row leaves its slot empty for good, but a
            // re-inserted copy may already hold its unique values
            match Self::insert_row(pool, record).await {
                Ok(_) => inserted += 1,
                Err(StoreError::AlreadyExists(reason)) => {
                    debug!("Seed row {} already present: {}", slot, reason);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(inserted)
    }

    async fn fetch(pool: &SqlitePool, key: i64) -> StoreResult<Option<T>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            Self::column_list(),
            T::TABLE,
            Self::key_column()
        );
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(pool)
            .await
            .map_err(internal("fetching record"))?;

        row.as_ref().map(Self::decode_row).transpose()
    }

    async fn insert_row(pool: &SqlitePool, record: &T) -> StoreResult<i64> {
        let fields: Vec<&Field<T>> = T::fields().iter().filter(|f| !f.is_primary_key()).collect();
        let names = fields.iter().map(|f| f.name).collect::<Vec<_>>().join(", ");

        let mut builder = QueryBuilder::<Sqlite>::new(format!("INSERT INTO {} ({}) VALUES (", T::TABLE, names));
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_value(&mut builder, field.value(record));
        }
        builder.push(")");

        let result = builder
            .build()
            .execute(pool)
            .await
            .map_err(write_error::<T>("inserting record"))?;

        Ok(result.last_insert_rowid())
    }

    /// Rebuild a record from a row through its JSON representation
    fn decode_row(row: &SqliteRow) -> StoreResult<T> {
        let mut map = Map::new();
        for field in T::fields() {
            let value: Option<Value> = match field.kind {
                FieldKind::Text => row.try_get::<Option<String>, _>(field.name).map(|v| v.map(Value::from)),
                FieldKind::Float => row.try_get::<Option<f64>, _>(field.name).map(|v| v.map(Value::from)),
                FieldKind::Integer => row.try_get::<Option<i64>, _>(field.name).map(|v| v.map(Value::from)),
                FieldKind::Boolean => row.try_get::<Option<bool>, _>(field.name).map(|v| v.map(Value::from)),
            }
            .map_err(internal("decoding row"))?;

            if let Some(value) = value {
                map.insert(field.name.to_string(), value);
            }
        }

        serde_json::from_value(Value::Object(map)).map_err(internal("decoding row"))
    }
}

fn parse_key(id: &str) -> StoreResult<i64> {
    id.parse()
        .map_err(|_| StoreError::InvalidArgument(format!("identifier '{}' is not an integer", id)))
}

fn column_definition<T>(field: &Field<T>) -> String {
    let sql_type = match (field.kind, field.column) {
        (FieldKind::Text, Column::Sized(len)) => format!("VARCHAR({})", len),
        (FieldKind::Text, _) => "TEXT".to_string(),
        (FieldKind::Float, _) => "REAL".to_string(),
        (FieldKind::Integer, _) => "INTEGER".to_string(),
        (FieldKind::Boolean, _) => "BOOLEAN".to_string(),
    };

    match field.column {
        Column::PrimaryKey => "INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
        Column::Unique => format!("{} UNIQUE", sql_type),
        Column::Sized(_) | Column::Plain => sql_type,
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: FieldValue) {
    match value {
        FieldValue::Text(s) => builder.push_bind(s),
        FieldValue::Float(f) => builder.push_bind(f),
        FieldValue::Integer(i) => builder.push_bind(i),
        FieldValue::Boolean(b) => builder.push_bind(b),
    };
}

/// SQLite binds signed integers; counts past `i64::MAX` saturate
fn sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Like `internal`, but reports uniqueness violations as `AlreadyExists`
fn write_error<T: Record>(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::AlreadyExists(format!("{} record ({})", T::TABLE, db.message()))
        }
        _ => StoreError::internal(context, e),
    }
}

#[async_trait]
impl<T: Record> Store<T> for RelationalStore<T> {
    async fn initialize(&self) -> StoreResult<()> {
        let pool = self.pool.get_or_try_init(|| self.connect()).await?;

        info!("Database connection established, running migrations for {}...", T::TABLE);
        Self::run_migrations(pool).await?;

        let inserted = self.load_seed(pool).await?;
        info!("Relational {} store ready ({} seed rows inserted)", T::TABLE, inserted);
        Ok(())
    }

    async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            if !pool.is_closed() {
                pool.close().await;
                info!("Database connection for {} closed", T::TABLE);
            }
        }
    }

    async fn get(&self, id: &str) -> StoreResult<T> {
        let pool = self.pool()?;
        let key = parse_key(id)?;
        Self::fetch(pool, key)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("record {}", id)))
    }

    async fn get_all(&self, filters: &Filters<T>) -> StoreResult<Vec<T>> {
        let pool = self.pool()?;
        let query = filter::build(filters)?;

        // SQLite folds ASCII only, so substring predicates are checked here
        // with Unicode lowercasing, the same way the volatile store does
        let (text, numeric): (Vec<_>, Vec<_>) = query
            .predicates
            .iter()
            .partition(|p| matches!(p.condition, Condition::Contains(_)));

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM {}",
            Self::column_list(),
            T::TABLE
        ));

        for (i, predicate) in numeric.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            if let Condition::AtLeast(bound) = &predicate.condition {
                builder.push(format!("{} >= ", predicate.field.name));
                push_value(&mut builder, bound.clone());
            }
        }

        // The key breaks ties so pages never overlap
        builder.push(format!(
            " ORDER BY {} {}, {} ASC",
            query.sort.name,
            query.order.as_sql(),
            Self::key_column()
        ));
        if text.is_empty() {
            builder.push(" LIMIT ");
            builder.push_bind(sql_count(query.limit));
            builder.push(" OFFSET ");
            builder.push_bind(sql_count(query.offset));
        }

        debug!("Executing: {}", builder.sql());

        let rows = builder
            .build()
            .fetch_all(pool)
            .await
            .map_err(internal("finding records"))?;

        let records = rows
            .iter()
            .map(Self::decode_row)
            .collect::<StoreResult<Vec<T>>>()?;

        if text.is_empty() {
            return Ok(records);
        }
        Ok(records
            .into_iter()
            .filter(|record| text.iter().all(|p| p.matches(record)))
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn insert(&self, _id: &str, record: T) -> StoreResult<T> {
        let pool = self.pool()?;
        let key = Self::insert_row(pool, &record).await?;
        debug!("Inserted {} row {}", T::TABLE, key);

        Self::fetch(pool, key)
            .await?
            .ok_or_else(|| StoreError::internal("inserting record", "row vanished after insert"))
    }

    async fn update(&self, id: &str, fields: &Map<String, Value>) -> StoreResult<()> {
        let pool = self.pool()?;
        let key = parse_key(id)?;
        let updates = T::resolve_updates(fields)?;

        if updates.is_empty() {
            // Nothing to write, but the record must still exist
            return Self::fetch(pool, key)
                .await?
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(format!("record {}", id)));
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", T::TABLE));
        for (i, (field, value)) in updates.into_iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(format!("{} = ", field.name));
            push_value(&mut builder, value);
        }
        builder.push(format!(" WHERE {} = ", Self::key_column()));
        builder.push_bind(key);

        let result = builder
            .build()
            .execute(pool)
            .await
            .map_err(write_error::<T>("updating record"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("record {}", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let pool = self.pool()?;
        let key = parse_key(id)?;

        let sql = format!("DELETE FROM {} WHERE {} = ?1", T::TABLE, Self::key_column());
        let result = sqlx::query(&sql)
            .bind(key)
            .execute(pool)
            .await
            .map_err(internal("deleting record"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("record {}", id)));
        }
        Ok(())
    }
}
