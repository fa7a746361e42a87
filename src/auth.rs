//! Authentication session
//!
//! The hosted platform owns credentials; the engine only tracks which
//! profile is currently signed in. Every user-scoped operation resolves
//! the identity through `current_user` and fails with `Unauthorized`
//! when nobody is signed in.

use crate::database::{Profile, Repository};
use crate::error::{AppError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tracks the currently signed-in profile
#[derive(Clone, Default)]
pub struct AuthSession {
    current: Arc<RwLock<Option<Profile>>>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an email to a profile and make it the active session
    pub async fn sign_in(&self, repo: &Repository, email: &str) -> Result<Profile> {
        let profile = repo
            .get_profile_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let mut current = self.current.write().await;
        *current = Some(profile.clone());

        tracing::info!("Signed in: {}", profile.email);
        Ok(profile)
    }

    /// Clear the active session
    pub async fn sign_out(&self) {
        let mut current = self.current.write().await;
        if let Some(profile) = current.take() {
            tracing::info!("Signed out: {}", profile.email);
        }
    }

    /// The signed-in profile id, or `Unauthorized`
    pub async fn current_user(&self) -> Result<String> {
        let current = self.current.read().await;
        current
            .as_ref()
            .map(|p| p.id.clone())
            .ok_or(AppError::Unauthorized)
    }

    /// The full signed-in profile, if any
    pub async fn current_profile(&self) -> Option<Profile> {
        self.current.read().await.clone()
    }
}
