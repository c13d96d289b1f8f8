use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::db::models::NewStorageEntry;
use crate::db::schema::storage;

pub fn get_value(conn: &mut SqliteConnection, key: &str) -> Result<Option<String>> {
    storage::table
        .find(key)
        .select(storage::value)
        .first::<String>(conn)
        .optional()
        .map_err(Into::into)
}

/// Inserts or overwrites the value stored under `key`.
pub fn put_value(conn: &mut SqliteConnection, key: &str, value: &str) -> Result<usize> {
    diesel::replace_into(storage::table)
        .values(&NewStorageEntry {
            key,
            value,
            updated_at: Utc::now().timestamp(),
        })
        .execute(conn)
        .map_err(Into::into)
}

pub fn delete_value(conn: &mut SqliteConnection, key: &str) -> Result<usize> {
    diesel::delete(storage::table.find(key))
        .execute(conn)
        .map_err(Into::into)
}
