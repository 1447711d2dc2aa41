#![allow(dead_code)]

use async_trait::async_trait;
use lingua_server::auth::derive_credential;
use lingua_server::db::Role;
use lingua_server::error::DatabaseError;
use lingua_server::{AppError, AppState, DbOperations, Settings, User, UserStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// User store backed by a map, standing in for PostgreSQL.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn remove(&self, id: Uuid) {
        self.users.write().await.remove(&id);
    }

    pub async fn rename(&self, id: Uuid, name: &str) {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.name = name.to_string();
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> lingua_server::Result<Option<User>> {
        Ok(self.users.read().await.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> lingua_server::Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create_user(&self, user: &User) -> lingua_server::Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::DatabaseError(DatabaseError::Duplicate));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }
}

pub fn user_with_password(email: &str, password: &str, role: Role) -> User {
    let credential = derive_credential(password, None).expect("credential derivation");
    User::new(email.to_string(), "Test User".to_string(), role, credential.hash, credential.salt)
}

/// State over a lazy (never connected) pool and the given user store.
pub fn test_state(users: Arc<MemoryUserStore>) -> AppState {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let db = Arc::new(DbOperations::connect_lazy(&config.database).expect("lazy pool"));
    AppState::with_store(config, db, users)
}
