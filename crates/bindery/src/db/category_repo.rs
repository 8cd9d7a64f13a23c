//! Category repository — categories and their comic mappings.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl CategoryRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// A category ↔ comic mapping row. These are the dependents reviewed
/// before a category can be deleted.
#[derive(Debug, Clone)]
pub struct CategoryMappingRow {
    pub id: String,
    pub category_id: String,
    pub comic_id: String,
    pub created_at: String,
}

impl CategoryMappingRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            category_id: row.get("category_id")?,
            comic_id: row.get("comic_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub fn insert(db: &Database, category: &CategoryRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO categories (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![category.id, category.name, category.created_at],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<CategoryRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM categories WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], CategoryRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

pub fn delete(db: &Database, id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(n)
    })
}

pub fn insert_mapping(db: &Database, mapping: &CategoryMappingRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO category_mappings (id, category_id, comic_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                mapping.id,
                mapping.category_id,
                mapping.comic_id,
                mapping.created_at,
            ],
        )?;
        Ok(())
    })
}

pub fn list_mappings_by_category(
    db: &Database,
    category_id: &str,
) -> Result<Vec<CategoryMappingRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM category_mappings WHERE category_id = ?1")?;
        let rows: Vec<CategoryMappingRow> = stmt
            .query_map(params![category_id], CategoryMappingRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn list_mappings_by_comic(
    db: &Database,
    comic_id: &str,
) -> Result<Vec<CategoryMappingRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM category_mappings WHERE comic_id = ?1")?;
        let rows: Vec<CategoryMappingRow> = stmt
            .query_map(params![comic_id], CategoryMappingRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn delete_mappings_by_category(
    db: &Database,
    category_id: &str,
) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute(
            "DELETE FROM category_mappings WHERE category_id = ?1",
            params![category_id],
        )?;
        Ok(n)
    })
}

pub fn delete_mappings_by_comic(db: &Database, comic_id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute(
            "DELETE FROM category_mappings WHERE comic_id = ?1",
            params![comic_id],
        )?;
        Ok(n)
    })
}
