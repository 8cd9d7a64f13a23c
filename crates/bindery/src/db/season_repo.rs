//! Season repository — CRUD for the `seasons` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct SeasonRow {
    pub id: String,
    pub comic_id: String,
    pub name: String,
    pub ordinal: i64,
    pub created_at: String,
}

impl SeasonRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            comic_id: row.get("comic_id")?,
            name: row.get("name")?,
            ordinal: row.get("ordinal")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub fn insert(db: &Database, season: &SeasonRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO seasons (id, comic_id, name, ordinal, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                season.id,
                season.comic_id,
                season.name,
                season.ordinal,
                season.created_at,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<SeasonRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM seasons WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], SeasonRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

pub fn list_by_comic(db: &Database, comic_id: &str) -> Result<Vec<SeasonRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM seasons WHERE comic_id = ?1 ORDER BY ordinal ASC")?;
        let rows: Vec<SeasonRow> = stmt
            .query_map(params![comic_id], SeasonRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn delete(db: &Database, id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM seasons WHERE id = ?1", params![id])?;
        Ok(n)
    })
}

pub fn delete_by_comic(db: &Database, comic_id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM seasons WHERE comic_id = ?1", params![comic_id])?;
        Ok(n)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_comic(db: &Database, id: &str) {
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comics (id, name, created_at) VALUES (?1, 'Test', '2026-01-01T00:00:00Z')",
                params![id],
            )?;
            Ok(())
        })
        .unwrap();
    }

    fn sample_season(id: &str, comic_id: &str, ordinal: i64) -> SeasonRow {
        SeasonRow {
            id: id.to_string(),
            comic_id: comic_id.to_string(),
            name: format!("Season {}", ordinal),
            ordinal,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_insert_find_delete() {
        let db = Database::open_in_memory().unwrap();
        seed_comic(&db, "c1");
        insert(&db, &sample_season("s1", "c1", 1)).unwrap();

        let found = find_by_id(&db, "s1").unwrap().unwrap();
        assert_eq!(found.name, "Season 1");

        assert_eq!(delete(&db, "s1").unwrap(), 1);
        assert!(find_by_id(&db, "s1").unwrap().is_none());
    }

    #[test]
    fn test_list_by_comic_ordered() {
        let db = Database::open_in_memory().unwrap();
        seed_comic(&db, "c1");
        insert(&db, &sample_season("s2", "c1", 2)).unwrap();
        insert(&db, &sample_season("s1", "c1", 1)).unwrap();

        let rows = list_by_comic(&db, "c1").unwrap();
        let ordinals: Vec<i64> = rows.iter().map(|r| r.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2]);
    }
}
