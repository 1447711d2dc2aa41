use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgConnection;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::db::models::{Lesson, LessonStatus, Task, TaskOption, TaskType};
use crate::db::operations::DbOperations;
use crate::error::AppError;
use crate::Result;

const LESSON_COLUMNS: &str =
    "id, title, description, status, published_at, author_id, created_at, updated_at";
const TASK_COLUMNS: &str = "id, lesson_id, prompt, task_type, sort_order, config";
const OPTION_COLUMNS: &str = "id, task_id, label, is_correct";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOption {
    pub id: Option<Uuid>,
    #[validate(length(min = 1, message = "option label must not be empty"))]
    pub label: String,
    pub is_correct: Option<bool>,
}

/// A task as submitted by a client. `id` is only meaningful when updating a lesson.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub id: Option<Uuid>,
    #[validate(length(min = 4, message = "prompt must be at least 4 characters"))]
    pub prompt: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[validate(range(min = 0, message = "order must not be negative"))]
    pub order: Option<i32>,
    /// Free-form settings for the task type; only JSON objects deserialize.
    pub config: Option<serde_json::Map<String, serde_json::Value>>,
    #[validate(nested)]
    pub options: Option<Vec<NewOption>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewLesson {
    #[validate(length(min = 2, message = "title must be at least 2 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub status: Option<LessonStatus>,
    #[validate(nested)]
    pub tasks: Option<Vec<NewTask>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LessonChanges {
    #[validate(length(min = 2, message = "title must be at least 2 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<LessonStatus>,
    #[validate(nested)]
    pub tasks: Option<Vec<TaskChanges>>,
}

pub type TaskChanges = NewTask;

impl NewTask {
    fn config_or_default(&self) -> serde_json::Value {
        serde_json::Value::Object(self.config.clone().unwrap_or_default())
    }
}

/// Publishing stamps the first publication time; reverting to draft clears it.
pub fn next_published_at(
    requested: Option<LessonStatus>,
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match requested {
        Some(LessonStatus::Published) => Some(current.unwrap_or(now)),
        Some(LessonStatus::Draft) => None,
        None => current,
    }
}

/// Converts a task count or index into a `sort_order` value without truncating.
fn to_sort_order<T>(position: T) -> Result<i32>
where
    T: TryInto<i32> + Copy + std::fmt::Display,
{
    position.try_into().map_err(|_| {
        AppError::InternalError(format!("task position {} does not fit a sort order", position))
    })
}

async fn insert_option(conn: &mut PgConnection, task_id: Uuid, option: &NewOption) -> Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO task_options (id, task_id, label, is_correct) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(task_id)
    .bind(&option.label)
    .bind(option.is_correct.unwrap_or(false))
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

async fn insert_task(
    conn: &mut PgConnection,
    lesson_id: Uuid,
    task: &NewTask,
    sort_order: i32,
) -> Result<Uuid> {
    let (task_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO tasks (id, lesson_id, prompt, task_type, sort_order, config)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(lesson_id)
    .bind(&task.prompt)
    .bind(task.task_type)
    .bind(sort_order)
    .bind(task.config_or_default())
    .fetch_one(&mut *conn)
    .await?;

    for option in task.options.iter().flatten() {
        insert_option(conn, task_id, option).await?;
    }

    Ok(task_id)
}

/// Upserts the submitted options and prunes every other option of the task.
async fn reconcile_options(conn: &mut PgConnection, task_id: Uuid, options: &[NewOption]) -> Result<()> {
    let mut keep_ids = Vec::with_capacity(options.len());

    for option in options {
        match option.id {
            Some(option_id) => {
                let updated = sqlx::query(
                    "UPDATE task_options SET label = $1, is_correct = $2 WHERE id = $3 AND task_id = $4",
                )
                .bind(&option.label)
                .bind(option.is_correct.unwrap_or(false))
                .bind(option_id)
                .bind(task_id)
                .execute(&mut *conn)
                .await?;

                if updated.rows_affected() == 0 {
                    return Err(AppError::not_found("Task option"));
                }
                keep_ids.push(option_id);
            }
            None => keep_ids.push(insert_option(conn, task_id, option).await?),
        }
    }

    sqlx::query("DELETE FROM task_options WHERE task_id = $1 AND NOT (id = ANY($2))")
        .bind(task_id)
        .bind(&keep_ids[..])
        .execute(&mut *conn)
        .await?;

    Ok(())
}

impl DbOperations {
    async fn attach_options(&self, tasks: &mut [Task]) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        let task_ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        let options = sqlx::query_as::<_, TaskOption>(&format!(
            "SELECT {} FROM task_options WHERE task_id = ANY($1)",
            OPTION_COLUMNS
        ))
        .bind(&task_ids[..])
        .fetch_all(self.pool())
        .await?;

        let mut by_task: HashMap<Uuid, Vec<TaskOption>> = HashMap::new();
        for option in options {
            by_task.entry(option.task_id).or_default().push(option);
        }
        for task in tasks.iter_mut() {
            task.options = by_task.remove(&task.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn attach_tasks(&self, lessons: &mut [Lesson]) -> Result<()> {
        if lessons.is_empty() {
            return Ok(());
        }
        let lesson_ids: Vec<Uuid> = lessons.iter().map(|l| l.id).collect();
        let mut tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE lesson_id = ANY($1) ORDER BY sort_order ASC",
            TASK_COLUMNS
        ))
        .bind(&lesson_ids[..])
        .fetch_all(self.pool())
        .await?;
        self.attach_options(&mut tasks).await?;

        let mut by_lesson: HashMap<Uuid, Vec<Task>> = HashMap::new();
        for task in tasks {
            by_lesson.entry(task.lesson_id).or_default().push(task);
        }
        for lesson in lessons.iter_mut() {
            lesson.tasks = by_lesson.remove(&lesson.id).unwrap_or_default();
        }
        Ok(())
    }

    pub async fn list_lessons(&self) -> Result<Vec<Lesson>> {
        let mut lessons = sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {} FROM lessons ORDER BY updated_at DESC",
            LESSON_COLUMNS
        ))
        .fetch_all(self.pool())
        .await?;
        self.attach_tasks(&mut lessons).await?;

        Ok(lessons)
    }

    pub async fn get_lesson(&self, id: Uuid) -> Result<Option<Lesson>> {
        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {} FROM lessons WHERE id = $1",
            LESSON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        match lesson {
            Some(lesson) => {
                let mut found = [lesson];
                self.attach_tasks(&mut found).await?;
                let [lesson] = found;
                Ok(Some(lesson))
            }
            None => Ok(None),
        }
    }

    async fn require_lesson(&self, id: Uuid) -> Result<Lesson> {
        self.get_lesson(id).await?.ok_or_else(|| AppError::not_found("Lesson"))
    }

    pub async fn create_lesson(&self, author_id: Uuid, lesson: &NewLesson) -> Result<Lesson> {
        let now = Utc::now();
        let lesson_id = Uuid::new_v4();
        let status = lesson.status.unwrap_or(LessonStatus::Draft);
        let published_at = next_published_at(Some(status), None, now);

        let mut tx = self.pool().begin().await?;
        sqlx::query(
            r#"
            INSERT INTO lessons (id, title, description, status, published_at, author_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            "#,
        )
        .bind(lesson_id)
        .bind(&lesson.title)
        .bind(&lesson.description)
        .bind(status)
        .bind(published_at)
        .bind(author_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (index, task) in lesson.tasks.iter().flatten().enumerate() {
            let order = match task.order {
                Some(order) => order,
                None => to_sort_order(index)?,
            };
            insert_task(&mut tx, lesson_id, task, order).await?;
        }
        tx.commit().await?;

        self.require_lesson(lesson_id).await
    }

    /// Applies a partial update. `Ok(None)` means the lesson does not exist.
    pub async fn update_lesson(&self, id: Uuid, changes: &LessonChanges) -> Result<Option<Lesson>> {
        let mut tx = self.pool().begin().await?;
        let existing = sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {} FROM lessons WHERE id = $1 FOR UPDATE",
            LESSON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let now = Utc::now();
        let title = changes.title.as_ref().unwrap_or(&existing.title);
        let description = changes.description.as_ref().or(existing.description.as_ref());
        let status = changes.status.unwrap_or(existing.status);
        let published_at = next_published_at(changes.status, existing.published_at, now);

        sqlx::query(
            r#"
            UPDATE lessons
            SET title = $1, description = $2, status = $3, published_at = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(status)
        .bind(published_at)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        for task in changes.tasks.iter().flatten() {
            match task.id {
                Some(task_id) => {
                    let updated = sqlx::query(
                        r#"
                        UPDATE tasks SET prompt = $1, task_type = $2, sort_order = $3, config = $4
                        WHERE id = $5 AND lesson_id = $6
                        "#,
                    )
                    .bind(&task.prompt)
                    .bind(task.task_type)
                    .bind(task.order.unwrap_or(0))
                    .bind(task.config_or_default())
                    .bind(task_id)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                    if updated.rows_affected() == 0 {
                        return Err(AppError::not_found("Task"));
                    }
                    if let Some(options) = &task.options {
                        reconcile_options(&mut tx, task_id, options).await?;
                    }
                }
                None => {
                    insert_task(&mut tx, id, task, task.order.unwrap_or(0)).await?;
                }
            }
        }
        tx.commit().await?;

        self.get_lesson(id).await
    }

    /// Removes the lesson with its tasks and options. Returns false when nothing matched.
    pub async fn delete_lesson(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool().begin().await?;
        sqlx::query(
            "DELETE FROM task_options WHERE task_id IN (SELECT id FROM tasks WHERE lesson_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM tasks WHERE lesson_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM lessons WHERE id = $1")
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

    /// Appends a task; without an explicit order it goes after the existing ones.
    pub async fn create_task(&self, lesson_id: Uuid, task: &NewTask) -> Result<Option<Task>> {
        let mut tx = self.pool().begin().await?;
        let lesson: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM lessons WHERE id = $1")
            .bind(lesson_id)
            .fetch_optional(&mut *tx)
            .await?;
        if lesson.is_none() {
            return Ok(None);
        }

        let order = match task.order {
            Some(order) => order,
            None => {
                let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE lesson_id = $1")
                    .bind(lesson_id)
                    .fetch_one(&mut *tx)
                    .await?;
                to_sort_order(count)?
            }
        };
        let task_id = insert_task(&mut tx, lesson_id, task, order).await?;
        tx.commit().await?;

        let mut tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(task_id)
        .fetch_all(self.pool())
        .await?;
        self.attach_options(&mut tasks).await?;

        Ok(tasks.pop())
    }

    pub async fn delete_task(&self, lesson_id: Uuid, task_id: Uuid) -> Result<bool> {
        let mut tx = self.pool().begin().await?;
        let task: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tasks WHERE id = $1 AND lesson_id = $2")
            .bind(task_id)
            .bind(lesson_id)
            .fetch_optional(&mut *tx)
            .await?;
        if task.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM task_options WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task_payload(prompt: &str) -> NewTask {
        NewTask {
            id: None,
            prompt: prompt.to_string(),
            task_type: TaskType::PickOne,
            order: None,
            config: None,
            options: None,
        }
    }

    #[test]
    fn test_publishing_stamps_once() {
        let now = Utc::now();
        let earlier = now - Duration::days(3);

        assert_eq!(next_published_at(Some(LessonStatus::Published), None, now), Some(now));
        assert_eq!(
            next_published_at(Some(LessonStatus::Published), Some(earlier), now),
            Some(earlier)
        );
        assert_eq!(next_published_at(Some(LessonStatus::Draft), Some(earlier), now), None);
        assert_eq!(next_published_at(None, Some(earlier), now), Some(earlier));
        assert_eq!(next_published_at(None, None, now), None);
    }

    #[test]
    fn test_lesson_payload_validation() {
        let mut lesson = NewLesson {
            title: "Ordering Coffee".into(),
            description: None,
            status: None,
            tasks: Some(vec![task_payload("Choose the polite phrase")]),
        };
        assert!(lesson.validate().is_ok());

        lesson.title = "O".into();
        assert!(lesson.validate().is_err());

        lesson.title = "Ordering Coffee".into();
        lesson.tasks = Some(vec![task_payload("Hi")]);
        assert!(lesson.validate().is_err());
    }

    #[test]
    fn test_title_length_counts_characters() {
        let lesson = NewLesson {
            title: "é".into(),
            description: None,
            status: None,
            tasks: None,
        };
        assert!(lesson.validate().is_err());

        let lesson = NewLesson { title: "éé".into(), ..lesson };
        assert!(lesson.validate().is_ok());
    }

    #[test]
    fn test_task_rejects_negative_order_and_empty_labels() {
        let mut task = task_payload("Fill in the blank");
        task.order = Some(-1);
        assert!(task.validate().is_err());

        task.order = Some(0);
        task.options = Some(vec![NewOption { id: None, label: String::new(), is_correct: None }]);
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_nested_option_errors_reach_the_lesson() {
        let mut task = task_payload("Pick the greeting");
        task.options = Some(vec![
            NewOption { id: None, label: "Hola".into(), is_correct: Some(true) },
            NewOption { id: None, label: String::new(), is_correct: None },
        ]);
        let changes = LessonChanges { tasks: Some(vec![task]), ..Default::default() };

        let err: AppError = changes.validate().unwrap_err().into();
        assert!(matches!(err, AppError::ValidationError(ref msg) if msg.contains("option label")));
    }

    #[test]
    fn test_task_config_must_be_an_object() {
        let rejected = serde_json::from_str::<NewTask>(
            r#"{"prompt": "Match the pairs", "type": "MATCH", "config": ["not", "an", "object"]}"#,
        );
        assert!(rejected.is_err());

        let task: NewTask = serde_json::from_str(
            r#"{"prompt": "Match the pairs", "type": "MATCH", "config": {"pairs": 3}}"#,
        )
        .unwrap();
        assert_eq!(task.config_or_default(), serde_json::json!({"pairs": 3}));

        let task = task_payload("Match the pairs");
        assert_eq!(task.config_or_default(), serde_json::json!({}));
    }

    #[test]
    fn test_sort_order_conversion_does_not_truncate() {
        assert_eq!(to_sort_order(7_i64).unwrap(), 7);
        assert_eq!(to_sort_order(3_usize).unwrap(), 3);

        let too_many = i64::from(i32::MAX) + 1;
        assert!(matches!(to_sort_order(too_many), Err(AppError::InternalError(_))));
    }

    #[test]
    fn test_changes_are_all_optional() {
        let changes: LessonChanges = serde_json::from_str("{}").unwrap();
        assert!(changes.validate().is_ok());

        let changes: LessonChanges =
            serde_json::from_str(r#"{"status": "PUBLISHED", "tasks": [{"id": null, "prompt": "Pick one answer", "type": "MATCH"}]}"#)
                .unwrap();
        assert_eq!(changes.status, Some(LessonStatus::Published));
        assert_eq!(changes.tasks.unwrap()[0].task_type, TaskType::Match);
    }

    #[test]
    fn test_task_payload_wire_names() {
        let task: NewTask = serde_json::from_str(
            r#"{"prompt": "Choose one", "type": "PICK_ONE", "order": 3,
                "options": [{"label": "Hola", "isCorrect": true}]}"#,
        )
        .unwrap();
        assert_eq!(task.order, Some(3));
        assert_eq!(task.options.unwrap()[0].is_correct, Some(true));
    }
}
