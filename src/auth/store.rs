use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::User;
use crate::Result;

/// Keyed access to user records. Authentication only reads through it;
/// `create_user` exists for registration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact, case-sensitive match.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn create_user(&self, user: &User) -> Result<User>;
}
