//! Persistence for user accounts and prediction logs.
//!
//! Accounts and logs are held in memory behind async locks and shared by
//! cloning the store handle. There are no update or delete paths: accounts
//! are created once and read on login, prediction records are append-only.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::classifier::PredictionLabel;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Username already exists")]
    DuplicateUsername,
}

#[derive(Debug, Clone)]
pub struct UserAccount {
    pub username: String,
    pub password_hash: String,
}

/// One persisted prediction. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub username: String,
    pub email_text: String,
    pub label: PredictionLabel,
    pub created_at: DateTime<Utc>,
}

/// Per-user aggregate totals for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub total: u64,
    pub legit: u64,
    pub phishing: u64,
}

#[derive(Clone, Default)]
pub struct Store {
    users: Arc<RwLock<HashMap<String, UserAccount>>>,
    predictions: Arc<RwLock<Vec<PredictionRecord>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a user account. Uniqueness is checked before insertion;
    /// duplicates are rejected, never overwritten.
    pub async fn create_user(&self, username: &str, password: &str) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(StoreError::DuplicateUsername);
        }
        users.insert(
            username.to_string(),
            UserAccount {
                username: username.to_string(),
                password_hash: hash_password(password),
            },
        );
        Ok(())
    }

    pub async fn find_user(&self, username: &str) -> Option<UserAccount> {
        self.users.read().await.get(username).cloned()
    }

    /// Checks a username/password pair. Unknown user and wrong password are
    /// indistinguishable to the caller.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> bool {
        match self.find_user(username).await {
            Some(user) => user.password_hash == hash_password(password),
            None => false,
        }
    }

    /// Appends a prediction record for `username` and returns its id.
    pub async fn append_prediction(
        &self,
        username: &str,
        email_text: &str,
        label: PredictionLabel,
    ) -> Uuid {
        let record = PredictionRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email_text: email_text.to_string(),
            label,
            created_at: Utc::now(),
        };
        let id = record.id;
        self.predictions.write().await.push(record);
        id
    }

    /// Aggregates prediction counts for one user.
    pub async fn counts_for_user(&self, username: &str) -> DashboardCounts {
        let predictions = self.predictions.read().await;
        let mut counts = DashboardCounts::default();
        for record in predictions.iter().filter(|r| r.username == username) {
            counts.total += 1;
            match record.label {
                PredictionLabel::Legit => counts.legit += 1,
                PredictionLabel::Phishing => counts.phishing += 1,
            }
        }
        counts
    }
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
