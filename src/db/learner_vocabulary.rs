use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::models::{LearnerStatus, LearnerVocabulary, LearnerWord, VocabularyEntry};
use crate::db::operations::DbOperations;
use crate::db::vocabulary::ENTRY_COLUMNS;
use crate::Result;

const PROGRESS_COLUMNS: &str = "user_id, entry_id, status, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: LearnerStatus,
}

impl DbOperations {
    async fn join_entries(&self, rows: Vec<LearnerVocabulary>) -> Result<Vec<LearnerWord>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let entry_ids: Vec<Uuid> = rows.iter().map(|r| r.entry_id).collect();
        let mut entries = sqlx::query_as::<_, VocabularyEntry>(&format!(
            "SELECT {} FROM vocabulary_entries WHERE id = ANY($1)",
            ENTRY_COLUMNS
        ))
        .bind(&entry_ids[..])
        .fetch_all(self.pool())
        .await?;
        self.attach_translations(&mut entries).await?;

        let mut by_id: HashMap<Uuid, VocabularyEntry> =
            entries.into_iter().map(|entry| (entry.id, entry)).collect();

        // A progress row whose entry vanished mid-request is dropped rather than failing the list.
        Ok(rows
            .into_iter()
            .filter_map(|progress| {
                by_id
                    .remove(&progress.entry_id)
                    .map(|entry| LearnerWord { progress, entry })
            })
            .collect())
    }

    pub async fn list_learner_words(&self, user_id: Uuid) -> Result<Vec<LearnerWord>> {
        let rows = sqlx::query_as::<_, LearnerVocabulary>(&format!(
            "SELECT {} FROM learner_vocabulary WHERE user_id = $1 ORDER BY updated_at DESC",
            PROGRESS_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        self.join_entries(rows).await
    }

    /// Starts tracking an entry for the learner. Existing progress is left untouched.
    /// `Ok(None)` means the entry does not exist.
    pub async fn track_word(&self, user_id: Uuid, entry_id: Uuid) -> Result<Option<LearnerWord>> {
        if !self.entry_exists(entry_id).await? {
            return Ok(None);
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO learner_vocabulary (user_id, entry_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (user_id, entry_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(entry_id)
        .bind(LearnerStatus::New)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_learner_word(user_id, entry_id).await
    }

    pub async fn get_learner_word(&self, user_id: Uuid, entry_id: Uuid) -> Result<Option<LearnerWord>> {
        let row = sqlx::query_as::<_, LearnerVocabulary>(&format!(
            "SELECT {} FROM learner_vocabulary WHERE user_id = $1 AND entry_id = $2",
            PROGRESS_COLUMNS
        ))
        .bind(user_id)
        .bind(entry_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(self.join_entries(row.into_iter().collect()).await?.pop())
    }

    pub async fn set_word_status(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        status: LearnerStatus,
    ) -> Result<Option<LearnerWord>> {
        let updated = sqlx::query(
            "UPDATE learner_vocabulary SET status = $1, updated_at = $2 WHERE user_id = $3 AND entry_id = $4",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(user_id)
        .bind(entry_id)
        .execute(self.pool())
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_learner_word(user_id, entry_id).await
    }

    pub async fn untrack_word(&self, user_id: Uuid, entry_id: Uuid) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM learner_vocabulary WHERE user_id = $1 AND entry_id = $2")
            .bind(user_id)
            .bind(entry_id)
            .execute(self.pool())
            .await?;

        Ok(deleted.rows_affected() > 0)
    }
}
