//! SQLite storage implementation

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{IndexEntryRecord, LemmaRecord, PageRecord, SiteRecord, SiteStatus};
use crate::SiteSearchError;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database file and initializes the schema
    pub fn new(path: &Path) -> Result<Self, SiteSearchError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (used by tests)
    pub fn new_in_memory() -> Result<Self, SiteSearchError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    Ok(SiteRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        status: SiteStatus::from_db_string(&row.get::<_, String>(3)?)
            .unwrap_or(SiteStatus::Failed),
        status_time: row.get(4)?,
        last_error: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        code: row.get(3)?,
        content: row.get(4)?,
    })
}

fn lemma_from_row(row: &Row<'_>) -> rusqlite::Result<LemmaRecord> {
    Ok(LemmaRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        lemma: row.get(2)?,
        frequency: row.get(3)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<IndexEntryRecord> {
    Ok(IndexEntryRecord {
        id: row.get(0)?,
        page_id: row.get(1)?,
        lemma_id: row.get(2)?,
        rank: row.get(3)?,
    })
}

/// Builds "?,?,?" for dynamic IN clauses
fn repeat_vars(count: usize) -> String {
    let mut vars = "?,".repeat(count);
    vars.pop();
    vars
}

const SITE_COLUMNS: &str = "id, url, name, status, status_time, last_error";
const PAGE_COLUMNS: &str = "id, site_id, path, code, content";
const LEMMA_COLUMNS: &str = "id, site_id, lemma, frequency";
const ENTRY_COLUMNS: &str = "id, page_id, lemma_id, rank";

impl Storage for SqliteStorage {
    // ===== Sites =====

    fn create_site(&mut self, url: &str, name: &str) -> StorageResult<SiteRecord> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO sites (url, name, status, status_time, last_error)
             VALUES (?1, ?2, ?3, ?4, NULL)",
            params![url, name, SiteStatus::Indexing.to_db_string(), now],
        )?;
        Ok(SiteRecord {
            id: self.conn.last_insert_rowid(),
            url: url.to_string(),
            name: name.to_string(),
            status: SiteStatus::Indexing,
            status_time: now,
            last_error: None,
        })
    }

    fn delete_site(&mut self, site_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM sites WHERE id = ?1", params![site_id])?;
        Ok(())
    }

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM sites WHERE url = ?1", SITE_COLUMNS))?;
        Ok(stmt.query_row(params![url], site_from_row).optional()?)
    }

    fn find_all_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM sites ORDER BY id", SITE_COLUMNS))?;
        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    fn find_sites_by_status(&self, status: SiteStatus) -> StorageResult<Vec<SiteRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sites WHERE status = ?1 ORDER BY id",
            SITE_COLUMNS
        ))?;
        let sites = stmt
            .query_map(params![status.to_db_string()], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    fn count_sites_by_status(&self, status: SiteStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sites WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn update_sites_status_by_status(
        &mut self,
        old: SiteStatus,
        new: SiteStatus,
        error: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE sites SET status = ?1, status_time = ?2, last_error = ?3 WHERE status = ?4",
            params![new.to_db_string(), now, error, old.to_db_string()],
        )?;
        Ok(())
    }

    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        error: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE sites SET status = ?1, status_time = ?2, last_error = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, error, site_id],
        )?;
        Ok(())
    }

    fn update_site_status_time(&mut self, site_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE sites SET status_time = ?1 WHERE id = ?2",
            params![now, site_id],
        )?;
        Ok(())
    }

    // ===== Pages =====

    fn create_page(
        &mut self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
            params![site_id, path, code, content],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn delete_page(&mut self, page_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM pages WHERE id = ?1", params![page_id])?;
        Ok(())
    }

    fn find_page_by_site_and_path(
        &self,
        site_id: i64,
        path: &str,
    ) -> StorageResult<Option<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pages WHERE site_id = ?1 AND path = ?2",
            PAGE_COLUMNS
        ))?;
        Ok(stmt
            .query_row(params![site_id, path], page_from_row)
            .optional()?)
    }

    fn find_pages_by_ids(&self, page_ids: &[i64]) -> StorageResult<Vec<PageRecord>> {
        if page_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM pages WHERE id IN ({})",
            PAGE_COLUMNS,
            repeat_vars(page_ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let pages = stmt
            .query_map(params_from_iter(page_ids.iter()), page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn count_pages_by_site(&self, site_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn delete_pages_by_site(&mut self, site_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM pages WHERE site_id = ?1", params![site_id])?;
        Ok(())
    }

    // ===== Lemmas =====

    fn create_lemmas(&mut self, site_id: i64, lemmas: &[String]) -> StorageResult<Vec<LemmaRecord>> {
        let mut created = Vec::with_capacity(lemmas.len());
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO lemmas (site_id, lemma, frequency) VALUES (?1, ?2, 1)",
            )?;
            for lemma in lemmas {
                stmt.execute(params![site_id, lemma])?;
                created.push(LemmaRecord {
                    id: tx.last_insert_rowid(),
                    site_id,
                    lemma: lemma.clone(),
                    frequency: 1,
                });
            }
        }
        tx.commit()?;
        Ok(created)
    }

    fn count_lemmas(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM lemmas", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_lemmas_by_site(&self, site_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM lemmas WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn find_lemmas_by_set(
        &self,
        lemmas: &[String],
        min_frequency: i64,
    ) -> StorageResult<Vec<LemmaRecord>> {
        if lemmas.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM lemmas WHERE frequency > ?1 AND lemma IN ({})",
            LEMMA_COLUMNS,
            repeat_vars(lemmas.len())
        );
        let mut values: Vec<Value> = vec![Value::Integer(min_frequency)];
        values.extend(lemmas.iter().map(|l| Value::Text(l.clone())));
        let mut stmt = self.conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(values), lemma_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(found)
    }

    fn find_lemmas_by_site_and_set(
        &self,
        site_id: i64,
        lemmas: &[String],
        min_frequency: i64,
    ) -> StorageResult<Vec<LemmaRecord>> {
        if lemmas.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM lemmas WHERE site_id = ?1 AND frequency > ?2 AND lemma IN ({})",
            LEMMA_COLUMNS,
            repeat_vars(lemmas.len())
        );
        let mut values: Vec<Value> =
            vec![Value::Integer(site_id), Value::Integer(min_frequency)];
        values.extend(lemmas.iter().map(|l| Value::Text(l.clone())));
        let mut stmt = self.conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(values), lemma_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(found)
    }

    fn increment_lemma_frequency(&mut self, lemma_ids: &[i64]) -> StorageResult<()> {
        if lemma_ids.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "UPDATE lemmas SET frequency = frequency + 1 WHERE id IN ({})",
            repeat_vars(lemma_ids.len())
        );
        self.conn
            .execute(&sql, params_from_iter(lemma_ids.iter()))?;
        Ok(())
    }

    fn decrement_lemma_frequency(&mut self, lemma_ids: &[i64]) -> StorageResult<()> {
        if lemma_ids.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "UPDATE lemmas SET frequency = frequency - 1 WHERE id IN ({})",
            repeat_vars(lemma_ids.len())
        );
        self.conn
            .execute(&sql, params_from_iter(lemma_ids.iter()))?;
        Ok(())
    }

    fn delete_lemmas_by_site(&mut self, site_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM lemmas WHERE site_id = ?1", params![site_id])?;
        Ok(())
    }

    // ===== Index entries =====

    fn create_index_entries(&mut self, entries: &[(i64, i64, f64)]) -> StorageResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO index_entries (page_id, lemma_id, rank) VALUES (?1, ?2, ?3)",
            )?;
            for (page_id, lemma_id, rank) in entries {
                stmt.execute(params![page_id, lemma_id, rank])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn find_index_entries_by_page(&self, page_id: i64) -> StorageResult<Vec<IndexEntryRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM index_entries WHERE page_id = ?1",
            ENTRY_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![page_id], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn find_index_entries_by_lemma(&self, lemma_id: i64) -> StorageResult<Vec<IndexEntryRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM index_entries WHERE lemma_id = ?1",
            ENTRY_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![lemma_id], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn find_index_entries_by_pages_and_lemma(
        &self,
        page_ids: &[i64],
        lemma_id: i64,
    ) -> StorageResult<Vec<IndexEntryRecord>> {
        if page_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM index_entries WHERE lemma_id = ?1 AND page_id IN ({})",
            ENTRY_COLUMNS,
            repeat_vars(page_ids.len())
        );
        let mut values: Vec<Value> = vec![Value::Integer(lemma_id)];
        values.extend(page_ids.iter().map(|id| Value::Integer(*id)));
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(values), entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn delete_index_entries_by_page(&mut self, page_id: i64) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM index_entries WHERE page_id = ?1",
            params![page_id],
        )?;
        Ok(())
    }

    fn delete_index_entries_by_site(&mut self, site_id: i64) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM index_entries WHERE page_id IN
             (SELECT id FROM pages WHERE site_id = ?1)",
            params![site_id],
        )?;
        Ok(())
    }
}
