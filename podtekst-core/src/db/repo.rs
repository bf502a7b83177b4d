//! Database repository layer
//!
//! Stores whole [`StoredAnalysis`] records. The conversation and snapshot are
//! kept as JSON, with a few columns denormalized for listings and
//! fingerprint lookups.

use crate::error::{Error, Result};
use crate::types::{AnalysisSummary, Platform, StoredAnalysis};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SELECT_ANALYSIS: &str = r#"
    SELECT id, fingerprint, created_at, conversation, quantitative, qualitative
    FROM analyses
"#;

/// Raw row before JSON decoding.
struct AnalysisRow {
    id: String,
    fingerprint: String,
    created_at: i64,
    conversation: String,
    quantitative: String,
    qualitative: Option<String>,
}

impl AnalysisRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            fingerprint: row.get(1)?,
            created_at: row.get(2)?,
            conversation: row.get(3)?,
            quantitative: row.get(4)?,
            qualitative: row.get(5)?,
        })
    }

    fn into_stored(self) -> Result<StoredAnalysis> {
        let qualitative = match self.qualitative {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };
        Ok(StoredAnalysis {
            id: self.id,
            fingerprint: self.fingerprint,
            created_at: self.created_at,
            conversation: serde_json::from_str(&self.conversation)?,
            quantitative: serde_json::from_str(&self.quantitative)?,
            qualitative,
        })
    }
}

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        super::schema::run_migrations(&conn)
    }

    /// A poisoned lock only means another caller panicked mid-query;
    /// SQLite keeps the connection consistent, so keep using it.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ============================================
    // Analysis operations
    // ============================================

    /// Insert an analysis, replacing any existing record with the same id.
    pub fn save_analysis(&self, analysis: &StoredAnalysis) -> Result<()> {
        let conversation = serde_json::to_string(&analysis.conversation)?;
        let quantitative = serde_json::to_string(&analysis.quantitative)?;
        let qualitative = analysis
            .qualitative
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO analyses (
                id, fingerprint, created_at, title, platform, participant_count,
                total_messages, conversation, quantitative, qualitative
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                fingerprint = excluded.fingerprint,
                created_at = excluded.created_at,
                title = excluded.title,
                platform = excluded.platform,
                participant_count = excluded.participant_count,
                total_messages = excluded.total_messages,
                conversation = excluded.conversation,
                quantitative = excluded.quantitative,
                qualitative = excluded.qualitative
            "#,
            params![
                analysis.id,
                analysis.fingerprint,
                analysis.created_at,
                analysis.conversation.title,
                analysis.conversation.platform.as_str(),
                analysis.conversation.participants.len() as i64,
                analysis.quantitative.total_messages() as i64,
                conversation,
                quantitative,
                qualitative,
            ],
        )?;

        tracing::debug!(id = %analysis.id, fingerprint = %analysis.fingerprint, "Saved analysis");
        Ok(())
    }

    /// Get an analysis by id
    pub fn get_analysis(&self, id: &str) -> Result<Option<StoredAnalysis>> {
        let row = {
            let conn = self.lock();
            conn.query_row(
                &format!("{} WHERE id = ?1", SELECT_ANALYSIS),
                [id],
                AnalysisRow::from_row,
            )
            .optional()?
        };
        row.map(AnalysisRow::into_stored).transpose()
    }

    /// Get an analysis by id, failing if it does not exist
    pub fn require_analysis(&self, id: &str) -> Result<StoredAnalysis> {
        self.get_analysis(id)?
            .ok_or_else(|| Error::AnalysisNotFound(id.to_string()))
    }

    /// Most recent analysis with the same fingerprint created before
    /// `before_created_at`, excluding `exclude_id`.
    ///
    /// Records sharing a millisecond are ordered by insertion, so only the
    /// later of two same-instant uploads sees the earlier one.
    pub fn find_previous(
        &self,
        fingerprint: &str,
        before_created_at: i64,
        exclude_id: &str,
    ) -> Result<Option<StoredAnalysis>> {
        let row = {
            let conn = self.lock();
            conn.query_row(
                &format!(
                    "{} WHERE fingerprint = ?1 AND id != ?3
                       AND (created_at < ?2
                            OR (created_at = ?2
                                AND rowid < (SELECT rowid FROM analyses WHERE id = ?3)))
                     ORDER BY created_at DESC, rowid DESC LIMIT 1",
                    SELECT_ANALYSIS
                ),
                params![fingerprint, before_created_at, exclude_id],
                AnalysisRow::from_row,
            )
            .optional()?
        };
        row.map(AnalysisRow::into_stored).transpose()
    }

    /// List analyses, newest first
    pub fn list_analyses(&self, limit: Option<usize>) -> Result<Vec<AnalysisSummary>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, fingerprint, created_at, title, platform, participant_count, total_messages
            FROM analyses
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )?;

        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = stmt.query_map([limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, fingerprint, created_at, title, platform, participant_count, total_messages) =
                row?;
            let platform: Platform = platform.parse().map_err(Error::InvalidConversation)?;
            summaries.push(AnalysisSummary {
                id,
                fingerprint,
                created_at,
                title,
                platform,
                participant_count: participant_count as usize,
                total_messages: total_messages as u64,
            });
        }
        Ok(summaries)
    }

    /// Delete an analysis. Returns whether a record was removed.
    pub fn delete_analysis(&self, id: &str) -> Result<bool> {
        let conn = self.lock();
        let removed = conn.execute("DELETE FROM analyses WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    /// Count stored analyses
    pub fn count_analyses(&self) -> Result<i64> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM analyses", [], |r| r.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ConversationMetadata, Participant, ParsedConversation, PersonMetrics, QuantitativeAnalysis,
    };

    fn create_test_analysis(id: &str, fingerprint: &str, created_at: i64) -> StoredAnalysis {
        let conversation = ParsedConversation {
            platform: Platform::WhatsApp,
            title: "Alice & Bob".to_string(),
            participants: vec![
                Participant {
                    name: "Alice".to_string(),
                    platform_id: None,
                },
                Participant {
                    name: "Bob".to_string(),
                    platform_id: None,
                },
            ],
            messages: vec![],
            metadata: ConversationMetadata::default(),
        };
        let mut quantitative = QuantitativeAnalysis {
            version: Some(2),
            ..Default::default()
        };
        quantitative.per_person.insert(
            "Alice".to_string(),
            PersonMetrics {
                total_messages: 7,
                ..Default::default()
            },
        );
        StoredAnalysis {
            id: id.to_string(),
            fingerprint: fingerprint.to_string(),
            created_at,
            conversation,
            quantitative,
            qualitative: None,
        }
    }

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    #[test]
    fn test_save_and_get_analysis() {
        let db = test_db();
        let analysis = create_test_analysis("a1", "fp", 1000);
        db.save_analysis(&analysis).unwrap();

        let loaded = db.get_analysis("a1").unwrap().unwrap();
        assert_eq!(loaded, analysis);
        assert!(db.get_analysis("missing").unwrap().is_none());
        assert!(matches!(
            db.require_analysis("missing"),
            Err(Error::AnalysisNotFound(_))
        ));
    }

    #[test]
    fn test_save_replaces_whole_record() {
        let db = test_db();
        let mut analysis = create_test_analysis("a1", "fp", 1000);
        db.save_analysis(&analysis).unwrap();

        analysis.qualitative = Some(serde_json::json!({"summary": "cozy"}));
        analysis.quantitative.per_person.clear();
        db.save_analysis(&analysis).unwrap();

        let loaded = db.require_analysis("a1").unwrap();
        assert_eq!(loaded.qualitative, analysis.qualitative);
        assert!(loaded.quantitative.per_person.is_empty());
        assert_eq!(db.count_analyses().unwrap(), 1);
    }

    #[test]
    fn test_find_previous() {
        let db = test_db();
        db.save_analysis(&create_test_analysis("old", "fp", 1000)).unwrap();
        db.save_analysis(&create_test_analysis("mid", "fp", 2000)).unwrap();
        db.save_analysis(&create_test_analysis("other", "fp2", 2500)).unwrap();
        db.save_analysis(&create_test_analysis("new", "fp", 3000)).unwrap();

        let previous = db.find_previous("fp", 3000, "new").unwrap().unwrap();
        assert_eq!(previous.id, "mid");

        let previous = db.find_previous("fp", 1500, "x").unwrap().unwrap();
        assert_eq!(previous.id, "old");

        assert!(db.find_previous("fp", 1000, "old").unwrap().is_none());
        assert!(db.find_previous("nope", 9999, "x").unwrap().is_none());
    }

    #[test]
    fn test_find_previous_same_millisecond() {
        let db = test_db();
        db.save_analysis(&create_test_analysis("first", "fp", 5000)).unwrap();
        db.save_analysis(&create_test_analysis("second", "fp", 5000)).unwrap();

        let previous = db.find_previous("fp", 5000, "second").unwrap().unwrap();
        assert_eq!(previous.id, "first");
        assert!(db.find_previous("fp", 5000, "first").unwrap().is_none());

        // Re-saving keeps the original insertion order
        db.save_analysis(&create_test_analysis("first", "fp", 5000)).unwrap();
        let previous = db.find_previous("fp", 5000, "second").unwrap().unwrap();
        assert_eq!(previous.id, "first");
    }

    #[test]
    fn test_list_and_delete() {
        let db = test_db();
        db.save_analysis(&create_test_analysis("a", "fp", 1000)).unwrap();
        db.save_analysis(&create_test_analysis("b", "fp", 2000)).unwrap();

        let list = db.list_analyses(None).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "b");
        assert_eq!(list[0].total_messages, 7);
        assert_eq!(list[0].participant_count, 2);
        assert_eq!(list[0].platform, Platform::WhatsApp);

        assert_eq!(db.list_analyses(Some(1)).unwrap().len(), 1);

        assert!(db.delete_analysis("a").unwrap());
        assert!(!db.delete_analysis("a").unwrap());
        assert_eq!(db.count_analyses().unwrap(), 1);
    }
}
