use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::db::models::{VocabularyEntry, VocabularyKind, VocabularyTranslation};
use crate::db::operations::DbOperations;
use crate::error::AppError;
use crate::Result;

pub(crate) const ENTRY_COLUMNS: &str =
    "id, english_text, kind, notes, tags, created_by_id, created_at, updated_at";
const TRANSLATION_COLUMNS: &str = "id, entry_id, language_code, translation, usage_example";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTranslation {
    #[validate(length(min = 2, message = "languageCode must be at least 2 characters"))]
    pub language_code: String,
    #[validate(length(min = 1, message = "translation must not be empty"))]
    pub translation: String,
    pub usage_example: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TranslationChanges {
    #[validate(length(min = 2, message = "languageCode must be at least 2 characters"))]
    pub language_code: Option<String>,
    #[validate(length(min = 1, message = "translation must not be empty"))]
    pub translation: Option<String>,
    pub usage_example: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    #[validate(length(min = 1, message = "englishText must not be empty"))]
    pub english_text: String,
    pub kind: Option<VocabularyKind>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    #[validate(nested)]
    pub translations: Option<Vec<NewTranslation>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EntryChanges {
    #[validate(length(min = 1, message = "englishText must not be empty"))]
    pub english_text: Option<String>,
    pub kind: Option<VocabularyKind>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl DbOperations {
    pub(crate) async fn attach_translations(&self, entries: &mut [VocabularyEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let entry_ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
        let translations = sqlx::query_as::<_, VocabularyTranslation>(&format!(
            "SELECT {} FROM vocabulary_translations WHERE entry_id = ANY($1) ORDER BY language_code ASC",
            TRANSLATION_COLUMNS
        ))
        .bind(&entry_ids[..])
        .fetch_all(self.pool())
        .await?;

        let mut by_entry: HashMap<Uuid, Vec<VocabularyTranslation>> = HashMap::new();
        for translation in translations {
            by_entry.entry(translation.entry_id).or_default().push(translation);
        }
        for entry in entries.iter_mut() {
            entry.translations = by_entry.remove(&entry.id).unwrap_or_default();
        }
        Ok(())
    }

    pub async fn list_entries(&self) -> Result<Vec<VocabularyEntry>> {
        let mut entries = sqlx::query_as::<_, VocabularyEntry>(&format!(
            "SELECT {} FROM vocabulary_entries ORDER BY updated_at DESC",
            ENTRY_COLUMNS
        ))
        .fetch_all(self.pool())
        .await?;
        self.attach_translations(&mut entries).await?;

        Ok(entries)
    }

    pub async fn get_entry(&self, id: Uuid) -> Result<Option<VocabularyEntry>> {
        let entry = sqlx::query_as::<_, VocabularyEntry>(&format!(
            "SELECT {} FROM vocabulary_entries WHERE id = $1",
            ENTRY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        let Some(entry) = entry else {
            return Ok(None);
        };
        let mut found = vec![entry];
        self.attach_translations(&mut found).await?;
        Ok(found.pop())
    }

    pub async fn entry_exists(&self, id: Uuid) -> Result<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM vocabulary_entries WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool())
                .await?;
        Ok(exists)
    }

    pub async fn create_entry(&self, created_by: Option<Uuid>, entry: &NewEntry) -> Result<VocabularyEntry> {
        let now = Utc::now();
        let entry_id = Uuid::new_v4();
        let tags = entry.tags.clone().unwrap_or_default();

        let mut tx = self.pool().begin().await?;
        sqlx::query(
            r#"
            INSERT INTO vocabulary_entries (id, english_text, kind, notes, tags, created_by_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            "#,
        )
        .bind(entry_id)
        .bind(&entry.english_text)
        .bind(entry.kind.unwrap_or(VocabularyKind::Word))
        .bind(&entry.notes)
        .bind(&tags[..])
        .bind(created_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for translation in entry.translations.iter().flatten() {
            sqlx::query(
                r#"
                INSERT INTO vocabulary_translations (id, entry_id, language_code, translation, usage_example)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(entry_id)
            .bind(&translation.language_code)
            .bind(&translation.translation)
            .bind(&translation.usage_example)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.get_entry(entry_id)
            .await?
            .ok_or_else(|| AppError::not_found("Vocabulary entry"))
    }

    pub async fn update_entry(&self, id: Uuid, changes: &EntryChanges) -> Result<Option<VocabularyEntry>> {
        let updated = sqlx::query(
            r#"
            UPDATE vocabulary_entries
            SET english_text = COALESCE($1, english_text),
                kind = COALESCE($2, kind),
                notes = COALESCE($3, notes),
                tags = COALESCE($4, tags),
                updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(&changes.english_text)
        .bind(changes.kind)
        .bind(&changes.notes)
        .bind(changes.tags.as_deref())
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool())
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_entry(id).await
    }

    /// Removes the entry together with its translations and any learner progress on it.
    pub async fn delete_entry(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM vocabulary_translations WHERE entry_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM learner_vocabulary WHERE entry_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM vocabulary_entries WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    pub async fn add_translation(
        &self,
        entry_id: Uuid,
        translation: &NewTranslation,
    ) -> Result<Option<VocabularyTranslation>> {
        if !self.entry_exists(entry_id).await? {
            return Ok(None);
        }

        let created = sqlx::query_as::<_, VocabularyTranslation>(&format!(
            r#"
            INSERT INTO vocabulary_translations (id, entry_id, language_code, translation, usage_example)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TRANSLATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(entry_id)
        .bind(&translation.language_code)
        .bind(&translation.translation)
        .bind(&translation.usage_example)
        .fetch_one(self.pool())
        .await?;

        Ok(Some(created))
    }

    pub async fn update_translation(
        &self,
        entry_id: Uuid,
        translation_id: Uuid,
        changes: &TranslationChanges,
    ) -> Result<Option<VocabularyTranslation>> {
        let updated = sqlx::query_as::<_, VocabularyTranslation>(&format!(
            r#"
            UPDATE vocabulary_translations
            SET language_code = COALESCE($1, language_code),
                translation = COALESCE($2, translation),
                usage_example = COALESCE($3, usage_example)
            WHERE id = $4 AND entry_id = $5
            RETURNING {}
            "#,
            TRANSLATION_COLUMNS
        ))
        .bind(&changes.language_code)
        .bind(&changes.translation)
        .bind(&changes.usage_example)
        .bind(translation_id)
        .bind(entry_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(updated)
    }

    pub async fn delete_translation(&self, entry_id: Uuid, translation_id: Uuid) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM vocabulary_translations WHERE id = $1 AND entry_id = $2")
            .bind(translation_id)
            .bind(entry_id)
            .execute(self.pool())
            .await?;

        Ok(deleted.rows_affected() > 0)
    }
}
