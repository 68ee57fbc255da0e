//! SQLite caching layer for statement documents and price variations.

use crate::error::{DataError, Result};
use chrono::{NaiveDate, Utc};
use hobart_dataset::{EntityDocumentSet, StatementFamily};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// SQLite cache for retrieved data.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Create a new SQLite cache.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        // One JSON body per symbol and statement family
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                symbol TEXT NOT NULL,
                family TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (symbol, family)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS price_variations (
                symbol TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                value REAL NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, start_date, end_date)
            )",
            [],
        )?;

        Ok(())
    }

    /// Store the document of one statement family.
    pub fn put_document(&self, symbol: &str, family: StatementFamily, body: &Value) -> Result<()> {
        let fetched_at = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT OR REPLACE INTO documents (symbol, family, fetched_at, body)
             VALUES (?1, ?2, ?3, ?4)",
            params![symbol, family.name(), fetched_at, serde_json::to_string(body)?],
        )?;

        Ok(())
    }

    /// Get the document of one statement family.
    pub fn get_document(&self, symbol: &str, family: StatementFamily) -> Result<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE symbol = ?1 AND family = ?2",
                params![symbol, family.name()],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|body| serde_json::from_str(&body).map_err(DataError::from))
            .transpose()
    }

    /// Store all six documents of an entity in one transaction.
    pub fn put_document_set(&self, documents: &EntityDocumentSet) -> Result<()> {
        let fetched_at = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;

        for (family, body) in documents.documents() {
            tx.execute(
                "INSERT OR REPLACE INTO documents (symbol, family, fetched_at, body)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    documents.symbol(),
                    family.name(),
                    fetched_at,
                    serde_json::to_string(body)?
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Whether all six documents of `symbol` are cached.
    pub fn has_document_set(&self, symbol: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE symbol = ?1",
            params![symbol],
            |row| row.get(0),
        )?;

        Ok(count as usize == StatementFamily::ALL.len())
    }

    /// Get all six documents of `symbol`, or `None` unless every family is
    /// cached.
    pub fn get_document_set(&self, symbol: &str) -> Result<Option<EntityDocumentSet>> {
        let mut stmt = self
            .conn
            .prepare("SELECT family, body FROM documents WHERE symbol = ?1")?;
        let rows = stmt.query_map(params![symbol], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut documents = EntityDocumentSet::new(symbol);
        let mut found = 0;
        for row in rows {
            let (family, body) = row?;
            let family = StatementFamily::from_name(&family)
                .ok_or_else(|| DataError::Cache(format!("Unknown statement family: {family}")))?;
            documents.set_document(family, serde_json::from_str(&body)?);
            found += 1;
        }

        Ok((found == StatementFamily::ALL.len()).then_some(documents))
    }

    /// Store a price variation for `symbol` over `[start, end]`.
    pub fn put_price_variation(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        value: f64,
    ) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT OR REPLACE INTO price_variations (symbol, start_date, end_date, value, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![symbol, start.to_string(), end.to_string(), value, cached_at],
        )?;

        Ok(())
    }

    /// Get the price variation for `symbol` over `[start, end]`.
    pub fn get_price_variation(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<f64>> {
        let result = self
            .conn
            .query_row(
                "SELECT value FROM price_variations WHERE symbol = ?1 AND start_date = ?2 AND end_date = ?3",
                params![symbol, start.to_string(), end.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(result)
    }

    /// Clear all cached data.
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM documents", [])?;
        self.conn.execute("DELETE FROM price_variations", [])?;
        Ok(())
    }

    /// Clear cached data for a specific symbol.
    pub fn clear_symbol(&self, symbol: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM documents WHERE symbol = ?1", params![symbol])?;
        self.conn.execute(
            "DELETE FROM price_variations WHERE symbol = ?1",
            params![symbol],
        )?;
        Ok(())
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let documents: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;

        let symbols: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT symbol) FROM documents", [], |row| {
                    row.get(0)
                })?;

        let price_variations: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM price_variations", [], |row| row.get(0))?;

        Ok(CacheStats {
            documents: documents as usize,
            unique_symbols: symbols as usize,
            price_variations: price_variations as usize,
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cached statement documents
    pub documents: usize,
    /// Number of symbols with at least one document
    pub unique_symbols: usize,
    /// Number of cached price variations
    pub price_variations: usize,
}
