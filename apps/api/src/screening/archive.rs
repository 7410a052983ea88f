//! Transcript archive: write-mostly store of conversation snapshots for similarity search.
//!
//! The engine only ever calls `archive`, and swallows its failures. The read side
//! (`search`, `conversation_snapshots`, `stats`) and `delete_session` serve the HTTP API.

use std::sync::Mutex;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::screening::profile::{ChatMessage, Profile};

/// Messages of trailing transcript captured in one snapshot.
pub const SNAPSHOT_WINDOW: usize = 10;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("S3 error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One archived snapshot, as returned by a search.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ArchivedSnapshot {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub document: String,
    pub message_count: i32,
    pub score: f32,
    pub created_at: DateTime<Utc>,
}

/// Size of the archive, for the stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveStats {
    pub backend: String,
    pub snapshot_count: u64,
    pub conversation_count: u64,
}

#[async_trait]
pub trait TranscriptArchive: Send + Sync {
    async fn archive(
        &self,
        conversation_id: Uuid,
        messages: &[ChatMessage],
        profile: &Profile,
    ) -> Result<(), ArchiveError>;

    /// Snapshots most similar to `query`, best first.
    async fn search(&self, query: &str, limit: usize)
        -> Result<Vec<ArchivedSnapshot>, ArchiveError>;

    /// A conversation's snapshots, newest first. `score` is always 0.
    async fn conversation_snapshots(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ArchivedSnapshot>, ArchiveError>;

    async fn stats(&self) -> Result<ArchiveStats, ArchiveError>;

    /// Removes every snapshot of a conversation. Returns how many were removed.
    async fn delete_session(&self, conversation_id: Uuid) -> Result<u64, ArchiveError>;

    fn name(&self) -> &str;
}

/// Renders the searchable snapshot: the last `SNAPSHOT_WINDOW` messages, then the profile.
pub fn snapshot_document(
    messages: &[ChatMessage],
    profile: &Profile,
) -> Result<String, serde_json::Error> {
    let start = messages.len().saturating_sub(SNAPSHOT_WINDOW);
    let transcript = messages[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n");
    let profile_json = serde_json::to_string_pretty(profile)?;
    Ok(format!(
        "Conversation:\n{transcript}\n\nCandidate Info:\n{profile_json}"
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// S3 + Postgres archive
// ────────────────────────────────────────────────────────────────────────────

/// Uploads each snapshot to S3 and indexes its text in Postgres full-text search.
pub struct S3TranscriptArchive {
    pool: PgPool,
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl S3TranscriptArchive {
    pub fn new(pool: PgPool, s3: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { pool, s3, bucket }
    }
}

#[async_trait]
impl TranscriptArchive for S3TranscriptArchive {
    async fn archive(
        &self,
        conversation_id: Uuid,
        messages: &[ChatMessage],
        profile: &Profile,
    ) -> Result<(), ArchiveError> {
        let document = snapshot_document(messages, profile)?;
        let snapshot_id = Uuid::new_v4();
        let s3_key = format!("transcripts/{conversation_id}/{snapshot_id}.md");

        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&s3_key)
            .body(ByteStream::from(document.clone().into_bytes()))
            .content_type("text/markdown")
            .send()
            .await
            .map_err(|e| ArchiveError::Storage(format!("S3 upload failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO transcript_snapshots (id, conversation_id, s3_key, document, message_count)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(snapshot_id)
        .bind(conversation_id)
        .bind(&s3_key)
        .bind(&document)
        .bind(messages.len().min(SNAPSHOT_WINDOW) as i32)
        .execute(&self.pool)
        .await?;

        info!("Archived transcript snapshot to s3://{}/{}", self.bucket, s3_key);
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ArchivedSnapshot>, ArchiveError> {
        Ok(sqlx::query_as::<_, ArchivedSnapshot>(
            r#"
            SELECT id, conversation_id, document, message_count, created_at,
                   ts_rank(search_vector, plainto_tsquery('english', $1)) AS score
            FROM transcript_snapshots
            WHERE search_vector @@ plainto_tsquery('english', $1)
            ORDER BY score DESC, created_at DESC
            LIMIT $2
            "#,
        )
        .bind(query)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn conversation_snapshots(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ArchivedSnapshot>, ArchiveError> {
        Ok(sqlx::query_as::<_, ArchivedSnapshot>(
            r#"
            SELECT id, conversation_id, document, message_count, created_at,
                   0::REAL AS score
            FROM transcript_snapshots
            WHERE conversation_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(conversation_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn stats(&self) -> Result<ArchiveStats, ArchiveError> {
        let (snapshots, conversations): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT conversation_id) FROM transcript_snapshots",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(ArchiveStats {
            backend: self.name().to_string(),
            snapshot_count: snapshots.max(0) as u64,
            conversation_count: conversations.max(0) as u64,
        })
    }

    async fn delete_session(&self, conversation_id: Uuid) -> Result<u64, ArchiveError> {
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT s3_key FROM transcript_snapshots WHERE conversation_id = $1",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        for key in &keys {
            if let Err(e) = self
                .s3
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
            {
                warn!("Failed to delete s3://{}/{}: {e}", self.bucket, key);
            }
        }

        let result = sqlx::query("DELETE FROM transcript_snapshots WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    fn name(&self) -> &str {
        "s3"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory archive
// ────────────────────────────────────────────────────────────────────────────

/// Process-local archive for the interactive front end and tests.
/// Similarity is the share of query terms present in the snapshot.
#[derive(Default)]
pub struct InMemoryTranscriptArchive {
    snapshots: Mutex<Vec<ArchivedSnapshot>>,
}

impl InMemoryTranscriptArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshots(&self) -> Vec<ArchivedSnapshot> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ArchivedSnapshot>> {
        self.snapshots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl TranscriptArchive for InMemoryTranscriptArchive {
    async fn archive(
        &self,
        conversation_id: Uuid,
        messages: &[ChatMessage],
        profile: &Profile,
    ) -> Result<(), ArchiveError> {
        let document = snapshot_document(messages, profile)?;
        self.lock().push(ArchivedSnapshot {
            id: Uuid::new_v4(),
            conversation_id,
            document,
            message_count: messages.len().min(SNAPSHOT_WINDOW) as i32,
            score: 0.0,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ArchivedSnapshot>, ArchiveError> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Ok(vec![]);
        }

        let mut hits: Vec<ArchivedSnapshot> = self
            .lock()
            .iter()
            .filter_map(|snapshot| {
                let doc_terms = terms(&snapshot.document);
                let matched = query_terms.iter().filter(|t| doc_terms.contains(t)).count();
                if matched == 0 {
                    return None;
                }
                let mut hit = snapshot.clone();
                hit.score = matched as f32 / query_terms.len() as f32;
                Some(hit)
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn conversation_snapshots(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ArchivedSnapshot>, ArchiveError> {
        Ok(self
            .lock()
            .iter()
            .rev()
            .filter(|s| s.conversation_id == conversation_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<ArchiveStats, ArchiveError> {
        let snapshots = self.lock();
        let mut conversations: Vec<Uuid> = snapshots.iter().map(|s| s.conversation_id).collect();
        conversations.sort();
        conversations.dedup();
        Ok(ArchiveStats {
            backend: self.name().to_string(),
            snapshot_count: snapshots.len() as u64,
            conversation_count: conversations.len() as u64,
        })
    }

    async fn delete_session(&self, conversation_id: Uuid) -> Result<u64, ArchiveError> {
        let mut snapshots = self.lock();
        let before = snapshots.len();
        snapshots.retain(|s| s.conversation_id != conversation_id);
        Ok((before - snapshots.len()) as u64)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
