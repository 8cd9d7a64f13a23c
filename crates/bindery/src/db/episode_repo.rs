//! Episode repository — CRUD for the `episodes` table.
//!
//! Bulk-created episodes carry `price = 0` and `banner_path = NULL`;
//! those defaults are the only marker distinguishing them from manually
//! created episodes.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct EpisodeRow {
    pub id: String,
    pub comic_id: String,
    pub season_id: Option<String>,
    pub episode_number: i64,
    pub banner_path: Option<String>,
    pub document_path: String,
    pub page_count: i64,
    pub price: f64,
    pub publisher_id: Option<String>,
    pub created_at: String,
}

impl EpisodeRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            comic_id: row.get("comic_id")?,
            season_id: row.get("season_id")?,
            episode_number: row.get("episode_number")?,
            banner_path: row.get("banner_path")?,
            document_path: row.get("document_path")?,
            page_count: row.get("page_count")?,
            price: row.get("price")?,
            publisher_id: row.get("publisher_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub fn insert(db: &Database, episode: &EpisodeRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO episodes (id, comic_id, season_id, episode_number, banner_path,
             document_path, page_count, price, publisher_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                episode.id,
                episode.comic_id,
                episode.season_id,
                episode.episode_number,
                episode.banner_path,
                episode.document_path,
                episode.page_count,
                episode.price,
                episode.publisher_id,
                episode.created_at,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<EpisodeRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM episodes WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], EpisodeRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

pub fn list_by_comic(db: &Database, comic_id: &str) -> Result<Vec<EpisodeRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT * FROM episodes WHERE comic_id = ?1 ORDER BY episode_number ASC")?;
        let rows: Vec<EpisodeRow> = stmt
            .query_map(params![comic_id], EpisodeRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn list_by_season(db: &Database, season_id: &str) -> Result<Vec<EpisodeRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT * FROM episodes WHERE season_id = ?1 ORDER BY episode_number ASC")?;
        let rows: Vec<EpisodeRow> = stmt
            .query_map(params![season_id], EpisodeRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn delete(db: &Database, id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM episodes WHERE id = ?1", params![id])?;
        Ok(n)
    })
}

pub fn delete_by_comic(db: &Database, comic_id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM episodes WHERE comic_id = ?1", params![comic_id])?;
        Ok(n)
    })
}

pub fn delete_by_season(db: &Database, season_id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute(
            "DELETE FROM episodes WHERE season_id = ?1",
            params![season_id],
        )?;
        Ok(n)
    })
}
