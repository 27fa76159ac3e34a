//! DuckDB storage for feedback records.

use std::path::Path;

use arrow::record_batch::RecordBatch;
use duckdb::{Connection, Row, params};
use plaudit_core::{FeedbackRecord, FeedbackSubmission, Sentiment, SentimentVerdict};
use tracing::{debug, info};

use crate::{FeedbackStore, StoreError};

const SCHEMA: &str = "
CREATE SEQUENCE IF NOT EXISTS feedback_id_seq START 1;
CREATE TABLE IF NOT EXISTS feedback (
    id BIGINT PRIMARY KEY DEFAULT nextval('feedback_id_seq'),
    complaint_id VARCHAR NOT NULL,
    category VARCHAR NOT NULL,
    subcategory VARCHAR NOT NULL DEFAULT '',
    feedback_message VARCHAR NOT NULL DEFAULT '',
    rating INTEGER,
    name VARCHAR NOT NULL,
    email VARCHAR NOT NULL,
    submitted_at VARCHAR NOT NULL,
    sentiment VARCHAR,
    sentiment_confidence DOUBLE
);
";

const COLUMNS: &str = "id, complaint_id, category, subcategory, feedback_message, rating, \
                       name, email, submitted_at, sentiment, sentiment_confidence";

/// DuckDB-backed [`FeedbackStore`].
///
/// One `feedback` table, one row per record. Every statement runs in
/// DuckDB's autocommit mode, so each update is its own transaction.
///
/// Use [`open`](Self::open) for an in-memory database and
/// [`open_persistent`](Self::open_persistent) for a file that survives
/// process restarts. Both create the schema if it is missing.
pub struct DuckStore {
    conn: Connection,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_schema(conn)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self::with_schema(conn)?;
        info!(path = %path.display(), records = store.feedback_count()?, "opened feedback store");
        Ok(store)
    }

    fn with_schema(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Number of rows in the `feedback` table.
    pub fn feedback_count(&self) -> Result<usize, StoreError> {
        let sql = "SELECT count(*)::BIGINT AS cnt FROM feedback";
        let batches = self.query_arrow(sql)?;
        let batch = batches.first().ok_or(StoreError::NoResults)?;
        let col = batch
            .column(0)
            .as_any()
            .downcast_ref::<arrow::array::Int64Array>()
            .ok_or_else(|| StoreError::Other("count column not i64".into()))?;
        Ok(col.value(0) as usize)
    }

    /// Fetch a single record by id.
    pub fn get(&self, id: i64) -> Result<FeedbackRecord, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM feedback WHERE id = ?");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![id], row_to_record)?;
        match rows.next() {
            Some(row) => Ok(row?),
            None => Err(StoreError::NotFound(id)),
        }
    }

    // ── Escape hatch ──

    /// Execute arbitrary SQL and return Arrow RecordBatches.
    pub fn query_arrow(&self, sql: &str) -> Result<Vec<RecordBatch>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([])?.collect();
        Ok(batches)
    }

    /// Access the underlying DuckDB connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn select(&self, where_clause: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM feedback WHERE {where_clause} ORDER BY id");
        debug!(sql = %sql, "selecting feedback");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![], row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl FeedbackStore for DuckStore {
    fn insert(
        &self,
        submission: &FeedbackSubmission,
        submitted_at: &str,
    ) -> Result<FeedbackRecord, StoreError> {
        let id: i64 = self.conn.query_row(
            "INSERT INTO feedback (complaint_id, category, subcategory, feedback_message, \
             rating, name, email, submitted_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
            params![
                submission.complaint_id,
                submission.category,
                submission.subcategory,
                submission.feedback_message,
                submission.rating,
                submission.name,
                submission.email,
                submitted_at,
            ],
            |row| row.get(0),
        )?;

        Ok(FeedbackRecord {
            id,
            complaint_id: submission.complaint_id.clone(),
            category: submission.category.clone(),
            subcategory: submission.subcategory.clone(),
            feedback_message: submission.feedback_message.clone(),
            rating: submission.rating,
            name: submission.name.clone(),
            email: submission.email.clone(),
            submitted_at: submitted_at.to_string(),
            sentiment: None,
            sentiment_confidence: None,
        })
    }

    fn all(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.select("true")
    }

    fn missing_sentiment(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.select("sentiment IS NULL OR sentiment = ''")
    }

    fn by_rating_and_sentiment(
        &self,
        ratings: &[i32],
        labels: &[Sentiment],
    ) -> Result<Vec<FeedbackRecord>, StoreError> {
        if ratings.is_empty() || labels.is_empty() {
            return Ok(Vec::new());
        }
        // Both lists are typed values, never user text.
        let ratings = ratings
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let labels = labels
            .iter()
            .map(|l| format!("'{}'", l.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        self.select(&format!("rating IN ({ratings}) AND sentiment IN ({labels})"))
    }

    fn set_sentiment(&self, id: i64, verdict: &SentimentVerdict) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE feedback SET sentiment = ?, sentiment_confidence = ? WHERE id = ?",
            params![verdict.label.as_str(), verdict.confidence, id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.feedback_count()
    }
}

fn row_to_record(row: &Row<'_>) -> duckdb::Result<FeedbackRecord> {
    Ok(FeedbackRecord {
        id: row.get(0)?,
        complaint_id: row.get(1)?,
        category: row.get(2)?,
        subcategory: row.get(3)?,
        feedback_message: row.get(4)?,
        rating: row.get(5)?,
        name: row.get(6)?,
        email: row.get(7)?,
        submitted_at: row.get(8)?,
        sentiment: row.get(9)?,
        sentiment_confidence: row.get(10)?,
    })
}
