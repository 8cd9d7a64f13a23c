//! Comic repository — CRUD for the `comics` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A comic root row. Created synchronously during ingestion; never rolled
/// back once committed.
#[derive(Debug, Clone)]
pub struct ComicRow {
    pub id: String,
    pub name: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub source_country: Option<String>,
    pub publish_date: Option<String>,
    pub banner_path: Option<String>,
    pub publisher_id: Option<String>,
    pub created_at: String,
}

impl ComicRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            summary: row.get("summary")?,
            description: row.get("description")?,
            source_country: row.get("source_country")?,
            publish_date: row.get("publish_date")?,
            banner_path: row.get("banner_path")?,
            publisher_id: row.get("publisher_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub fn insert(db: &Database, comic: &ComicRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO comics (id, name, summary, description, source_country, publish_date,
             banner_path, publisher_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                comic.id,
                comic.name,
                comic.summary,
                comic.description,
                comic.source_country,
                comic.publish_date,
                comic.banner_path,
                comic.publisher_id,
                comic.created_at,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<ComicRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM comics WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], ComicRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM comics", [], |r| r.get(0))?;
        Ok(count)
    })
}

/// Deletes a comic row. Returns the number of rows removed (0 or 1).
pub fn delete(db: &Database, id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM comics WHERE id = ?1", params![id])?;
        Ok(n)
    })
}
