use chrono::{DateTime, Utc};

use crate::db::models::{AnalyticsOverview, LessonStatus, PublishedLessonSummary};
use crate::db::operations::DbOperations;
use crate::Result;

/// Mean task count per lesson, rounded to one decimal place. Zero when there are no lessons.
pub fn average_tasks_per_lesson(total_tasks: i64, total_lessons: i64) -> f64 {
    if total_lessons <= 0 {
        return 0.0;
    }
    let average = total_tasks as f64 / total_lessons as f64;
    (average * 10.0).round() / 10.0
}

impl DbOperations {
    pub async fn analytics_overview(&self) -> Result<AnalyticsOverview> {
        let (total_lessons, published_lessons): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = $1) FROM lessons",
        )
        .bind(LessonStatus::Published)
        .fetch_one(self.pool())
        .await?;

        let (total_tasks,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(self.pool())
            .await?;

        let latest: Option<(String, Option<DateTime<Utc>>)> = sqlx::query_as(
            r#"
            SELECT title, published_at FROM lessons
            WHERE status = $1
            ORDER BY published_at DESC NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(LessonStatus::Published)
        .fetch_optional(self.pool())
        .await?;

        Ok(AnalyticsOverview {
            total_lessons,
            published_lessons,
            draft_lessons: total_lessons - published_lessons,
            total_tasks,
            avg_tasks_per_lesson: average_tasks_per_lesson(total_tasks, total_lessons),
            latest_published_lesson: latest
                .map(|(title, published_at)| PublishedLessonSummary { title, published_at }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_rounds_to_one_decimal() {
        assert_eq!(average_tasks_per_lesson(0, 0), 0.0);
        assert_eq!(average_tasks_per_lesson(5, 0), 0.0);
        assert_eq!(average_tasks_per_lesson(6, 3), 2.0);
        assert_eq!(average_tasks_per_lesson(10, 3), 3.3);
        assert_eq!(average_tasks_per_lesson(5, 3), 1.7);
    }
}
