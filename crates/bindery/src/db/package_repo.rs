//! Premium-package repository — packages and their comic mappings.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct PackageRow {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub created_at: String,
}

impl PackageRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            price: row.get("price")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PackageComicRow {
    pub id: String,
    pub package_id: String,
    pub comic_id: String,
    pub created_at: String,
}

impl PackageComicRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            package_id: row.get("package_id")?,
            comic_id: row.get("comic_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub fn insert(db: &Database, package: &PackageRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO premium_packages (id, name, price, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![package.id, package.name, package.price, package.created_at],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<PackageRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM premium_packages WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], PackageRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

pub fn delete(db: &Database, id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM premium_packages WHERE id = ?1", params![id])?;
        Ok(n)
    })
}

pub fn insert_comic(db: &Database, mapping: &PackageComicRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO package_comics (id, package_id, comic_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                mapping.id,
                mapping.package_id,
                mapping.comic_id,
                mapping.created_at,
            ],
        )?;
        Ok(())
    })
}

pub fn list_comics_by_package(
    db: &Database,
    package_id: &str,
) -> Result<Vec<PackageComicRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM package_comics WHERE package_id = ?1")?;
        let rows: Vec<PackageComicRow> = stmt
            .query_map(params![package_id], PackageComicRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn list_packages_by_comic(
    db: &Database,
    comic_id: &str,
) -> Result<Vec<PackageComicRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM package_comics WHERE comic_id = ?1")?;
        let rows: Vec<PackageComicRow> = stmt
            .query_map(params![comic_id], PackageComicRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn delete_comics_by_package(db: &Database, package_id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute(
            "DELETE FROM package_comics WHERE package_id = ?1",
            params![package_id],
        )?;
        Ok(n)
    })
}

pub fn delete_comics_by_comic(db: &Database, comic_id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute(
            "DELETE FROM package_comics WHERE comic_id = ?1",
            params![comic_id],
        )?;
        Ok(n)
    })
}
