//! Database module for the lingua server
//!
//! PostgreSQL access through a shared `DbOperations` handle. Each resource
//! (users, lessons, vocabulary, learner progress, analytics) adds its own
//! `impl DbOperations` block in a sibling file.

pub mod analytics;
pub mod learner_vocabulary;
pub mod lessons;
pub mod models;
pub mod operations;
pub mod vocabulary;

pub use learner_vocabulary::StatusChange;
pub use lessons::{LessonChanges, NewLesson, NewOption, NewTask, TaskChanges};
pub use models::{
    AnalyticsOverview, LearnerStatus, LearnerVocabulary, LearnerWord, Lesson, LessonStatus,
    Role, Task, TaskOption, TaskType, User, UserProfile, VocabularyEntry, VocabularyKind,
    VocabularyTranslation,
};
pub use operations::DbOperations;
pub use vocabulary::{EntryChanges, NewEntry, NewTranslation, TranslationChanges};
