use anyhow::Result;
use rusqlite::{params, Connection};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub mod models;
use models::{Metric, Projection, Sport};

/// Thread-safe SQLite projection store (single connection with mutex).
///
/// The evaluator never touches this; it consumes a materialized list of
/// projections. Concurrency control over the store stays here.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path.
    /// `:memory:` works for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Insert a projection and return its assigned id.
    pub fn add_projection(&self, p: &Projection) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO projections (session_id, sport, player, metric, target, created_at)
             VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                p.session_id,
                p.sport.as_str(),
                p.player,
                p.metric.as_str(),
                p.target,
                p.created_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a session's projections in insertion order, optionally filtered
    /// by sport. Insertion order is the evaluation order.
    pub fn list_projections(&self, session_id: &str, sport: Option<Sport>) -> Result<Vec<Projection>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, sport, player, metric, target, created_at
             FROM projections
             WHERE session_id=?1 AND (?2 IS NULL OR sport=?2)
             ORDER BY id ASC",
        )?;
        let projections = stmt
            .query_map(params![session_id, sport.map(|s| s.as_str())], map_projection)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projections)
    }

    /// Remove one projection, double-keyed by id and session so one session
    /// cannot delete another's rows. Returns whether a row was deleted.
    pub fn remove_projection(&self, id: i64, session_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "DELETE FROM projections WHERE id=?1 AND session_id=?2",
            params![id, session_id],
        )?;
        Ok(n > 0)
    }

    /// Delete all of a session's projections. Returns the number removed.
    pub fn clear_projections(&self, session_id: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "DELETE FROM projections WHERE session_id=?1",
            params![session_id],
        )?;
        Ok(n)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn map_projection(row: &rusqlite::Row) -> rusqlite::Result<Projection> {
    let sport_text: String = row.get(2)?;
    let metric_text: String = row.get(4)?;
    Ok(Projection {
        id: row.get(0)?,
        session_id: row.get(1)?,
        sport: Sport::from_str(&sport_text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        player: row.get(3)?,
        metric: Metric::from_str(&metric_text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
        target: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS projections (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id  TEXT    NOT NULL,
    sport       TEXT    NOT NULL,
    player      TEXT    NOT NULL,
    metric      TEXT    NOT NULL,
    target      REAL    NOT NULL,
    created_at  TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_projections_session ON projections(session_id);
CREATE INDEX IF NOT EXISTS idx_projections_session_sport ON projections(session_id, sport);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn projection(session: &str, player: &str, metric: Metric, target: f64) -> Projection {
        Projection {
            id: None,
            session_id: session.to_string(),
            sport: metric.sport(),
            player: player.to_string(),
            metric,
            target,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_and_list_preserves_insertion_order() {
        let db = Database::open(":memory:").unwrap();
        db.add_projection(&projection("s1", "Aaron Judge", Metric::Hits, 1.0))
            .unwrap();
        db.add_projection(&projection("s1", "Juan Soto", Metric::HomeRuns, 1.0))
            .unwrap();

        let listed = db.list_projections("s1", None).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].player, "Aaron Judge");
        assert_eq!(listed[1].player, "Juan Soto");
        assert_eq!(listed[1].metric, Metric::HomeRuns);
        assert!(listed[0].id.is_some());
    }

    #[test]
    fn test_list_filters_by_sport() {
        let db = Database::open(":memory:").unwrap();
        db.add_projection(&projection("s1", "Aaron Judge", Metric::Hits, 1.0))
            .unwrap();
        db.add_projection(&projection("s1", "Nikola Jokic", Metric::Points, 25.0))
            .unwrap();

        let baseball = db.list_projections("s1", Some(Sport::Baseball)).unwrap();
        assert_eq!(baseball.len(), 1);
        assert_eq!(baseball[0].player, "Aaron Judge");
    }

    #[test]
    fn test_remove_is_session_scoped() {
        let db = Database::open(":memory:").unwrap();
        let id = db
            .add_projection(&projection("s1", "Aaron Judge", Metric::Hits, 1.0))
            .unwrap();

        assert!(!db.remove_projection(id, "other-session").unwrap());
        assert_eq!(db.list_projections("s1", None).unwrap().len(), 1);

        assert!(db.remove_projection(id, "s1").unwrap());
        assert!(db.list_projections("s1", None).unwrap().is_empty());
    }

    #[test]
    fn test_clear_only_touches_one_session() {
        let db = Database::open(":memory:").unwrap();
        db.add_projection(&projection("s1", "Aaron Judge", Metric::Hits, 1.0))
            .unwrap();
        db.add_projection(&projection("s1", "Juan Soto", Metric::Rbi, 2.0))
            .unwrap();
        db.add_projection(&projection("s2", "Mookie Betts", Metric::Runs, 1.0))
            .unwrap();

        assert_eq!(db.clear_projections("s1").unwrap(), 2);
        assert!(db.list_projections("s1", None).unwrap().is_empty());
        assert_eq!(db.list_projections("s2", None).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_projections_allowed() {
        let db = Database::open(":memory:").unwrap();
        db.add_projection(&projection("s1", "Aaron Judge", Metric::Hits, 1.0))
            .unwrap();
        db.add_projection(&projection("s1", "Aaron Judge", Metric::Hits, 2.0))
            .unwrap();
        assert_eq!(db.list_projections("s1", None).unwrap().len(), 2);
    }
}
