use rusqlite::{params, Connection, Result};
use sqlite_vec::sqlite3_vec_init;
use std::sync::Once;
use zerocopy::IntoBytes;

static REGISTER_VEC: Once = Once::new();

fn register_sqlite_vec() {
    REGISTER_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// In-memory store for tagged lines and their embeddings.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        register_sqlite_vec();

        let conn = Connection::open_in_memory()?;

        conn.execute_batch(
            r#"
            CREATE TABLE lines (
                id INTEGER PRIMARY KEY,
                isbn13 INTEGER NOT NULL,
                text TEXT NOT NULL
            );
            "#,
        )?;

        // Dimension is fixed per embedder
        conn.execute(
            &format!(
                "CREATE VIRTUAL TABLE lines_vec USING vec0(
                embedding float[{}] distance_metric=cosine
                )",
                dimensions
            ),
            [],
        )?;

        Ok(Self { conn })
    }

    /// Insert a batch of lines with their embeddings in one transaction.
    pub fn insert_lines(&mut self, rows: &[(u64, &str, &[f32])]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut insert_line = tx.prepare("INSERT INTO lines (isbn13, text) VALUES (?1, ?2)")?;
            let mut insert_vec =
                tx.prepare("INSERT INTO lines_vec (rowid, embedding) VALUES (?1, ?2)")?;

            for (isbn13, text, embedding) in rows {
                insert_line.execute(params![*isbn13 as i64, text])?;
                let rowid = tx.last_insert_rowid();
                insert_vec.execute(params![rowid, embedding.as_bytes()])?;
            }
        }
        tx.commit()
    }

    pub fn count_lines(&self) -> Result<usize> {
        self.conn
            .query_row("SELECT COUNT(*) FROM lines", [], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
    }

    /// K nearest lines to `embedding`, closest first, as
    /// (isbn13, text, cosine distance).
    pub fn find_similar_lines(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<(u64, String, f32)>> {
        let mut stmt = self.conn.prepare(
            r#"
            WITH knn AS (
                SELECT rowid, distance
                FROM lines_vec
                WHERE embedding MATCH ?1 AND k = ?2
            )
            SELECT l.isbn13, l.text, knn.distance
            FROM knn
            JOIN lines l ON l.id = knn.rowid
            ORDER BY knn.distance, l.id
            "#,
        )?;

        let results = stmt
            .query_map(params![embedding.as_bytes(), limit as i64], |row| {
                Ok((row.get::<_, i64>(0)? as u64, row.get(1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_find_nearest() {
        let mut db = Database::open_in_memory(3).unwrap();
        db.insert_lines(&[
            (1, "1 x axis", &[1.0, 0.0, 0.0][..]),
            (2, "2 y axis", &[0.0, 1.0, 0.0][..]),
            (3, "3 mostly x", &[0.9, 0.1, 0.0][..]),
        ])
        .unwrap();
        assert_eq!(db.count_lines().unwrap(), 3);

        let hits = db.find_similar_lines(&[1.0, 0.0, 0.0], 2).unwrap();
        let ids: Vec<u64> = hits.iter().map(|h| h.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(hits[0].2.abs() < 1e-5);
        assert_eq!(hits[0].1, "1 x axis");
    }

    #[test]
    fn test_large_identifiers_round_trip() {
        let mut db = Database::open_in_memory(2).unwrap();
        db.insert_lines(&[(9780002005883, "9780002005883 text", &[1.0, 0.0][..])])
            .unwrap();
        let hits = db.find_similar_lines(&[1.0, 0.0], 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 9780002005883);
    }
}
