pub mod models;
pub mod operations;
pub mod schema;

use std::env;
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use diesel::connection::{Connection, SimpleConnection};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{debug, info};

use crate::store::{Storage, StorageWrite};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
pub const DEFAULT_DB_PATH: &str = "fitapp.db";

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

static DB_PATH: OnceLock<String> = OnceLock::new();

/// The database path chosen for this process: an explicit [`set_db_path`],
/// else `DATABASE_URL`, else [`DEFAULT_DB_PATH`].
pub fn db_path() -> &'static str {
    DB_PATH.get_or_init(|| env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()))
}

pub fn set_db_path(path: &str) -> Result<()> {
    DB_PATH
        .set(path.to_string())
        .map_err(|e| anyhow!("Failed to set DB_PATH: {:?}", e))
}

pub fn connect(path: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(path);
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .with_context(|| format!("Failed to create DB pool for {}", path))?;

    let mut conn = pool.get()?;
    conn.batch_execute(
        "PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; PRAGMA busy_timeout = 5000;",
    )?;
    init_database(&mut conn)?;

    Ok(pool)
}

pub fn init_database(conn: &mut SqliteConnection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!("Failed to run migrations: {}", e))?;

    if applied.is_empty() {
        debug!("All migrations already applied");
    }
    for migration in applied {
        info!("Migration {} applied successfully", migration);
    }
    Ok(())
}

/// [`Storage`] backed by a single SQLite key-value table.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: DbPool,
}

impl SqliteStorage {
    pub fn open(path: &str) -> Result<Self> {
        info!("Opening storage at {}", path);
        Ok(Self {
            pool: connect(path)?,
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(db_path())
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.pool.get()?;
        operations::get_value(&mut conn, key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.pool.get()?;
        operations::put_value(&mut conn, key, value)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut conn = self.pool.get()?;
        operations::delete_value(&mut conn, key)?;
        Ok(())
    }

    fn write_batch(&self, writes: &[StorageWrite<'_>]) -> Result<()> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, anyhow::Error, _>(|conn| {
            for write in writes {
                match write {
                    StorageWrite::Set(key, value) => operations::put_value(conn, key, value)?,
                    StorageWrite::Remove(key) => operations::delete_value(conn, key)?,
                };
            }
            Ok(())
        })
        .context("Failed to apply storage batch")
    }
}
