//! Application state and initialization
//!
//! All services are initialized here and made available through AppState.

use crate::auth::AuthSession;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::functions::FunctionsClient;
use crate::services::{
    AssistantService, HabitsService, NotificationScheduler, Notifier, ReadingService,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

/// Monotonic revision counter for cached query state.
///
/// Bumping it tells every subscriber their cached rows may be stale and
/// should be refetched on next render.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: Arc<watch::Sender<u64>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Mark all cached query results stale
    pub fn invalidate(&self) {
        self.tx.send_modify(|revision| *revision += 1);
    }

    /// Current revision
    pub fn revision(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Watch for invalidations
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub auth: AuthSession,
    pub habits: HabitsService,
    pub reading: ReadingService,
    pub assistant: AssistantService,
    pub scheduler: Arc<NotificationScheduler>,
    pub changes: ChangeFeed,
}

impl AppState {
    /// Open the database and wire every service together
    pub async fn initialize(
        db_path: &Path,
        functions: FunctionsClient,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        tracing::info!("Initializing application state");

        let pool = create_pool(db_path).await?;
        let repo = Repository::new(pool);

        let auth = AuthSession::new();
        let scheduler = Arc::new(NotificationScheduler::new(notifier));
        let changes = ChangeFeed::new();

        let habits = HabitsService::new(repo.clone(), Arc::clone(&scheduler));
        let reading = ReadingService::new(repo.clone(), functions.clone());
        let assistant = AssistantService::new(
            repo.clone(),
            auth.clone(),
            functions,
            reading.clone(),
            changes.clone(),
        );

        tracing::info!("Application state initialized");

        Ok(Self {
            repo,
            auth,
            habits,
            reading,
            assistant,
            scheduler,
            changes,
        })
    }

    /// Tear down background work; armed reminder timers do not survive
    /// this (or a restart) by design
    pub fn shutdown(&self) {
        self.scheduler.cancel_all();
        tracing::info!("Application state shut down");
    }
}
