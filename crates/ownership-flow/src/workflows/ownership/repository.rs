use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::orchestrator::{SessionView, VerificationOrchestrator};

/// Identifier wrapper for verification sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored session. `revision` increments on every successful update.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: SessionId,
    pub revision: u64,
    pub orchestrator: VerificationOrchestrator,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(id: SessionId, orchestrator: VerificationOrchestrator) -> Self {
        let now = Utc::now();
        Self {
            id,
            revision: 0,
            orchestrator,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn response(&self) -> SessionResponse {
        SessionResponse {
            session_id: self.id.clone(),
            revision: self.revision,
            updated_at: self.updated_at,
            view: self.orchestrator.view(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub view: SessionView,
}

/// Persistence seam for sessions.
///
/// `update` must be a compare-and-swap on `revision`: a record whose revision
/// no longer matches the stored one is rejected with `Conflict`.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError>;
    fn update(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("session was modified concurrently")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Process-local repository; sessions vanish with the process.
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionRepository {
    records: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
}

impl InMemorySessionRepository {
    pub fn len(&self) -> usize {
        self.records.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store poisoned".to_string()))?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, mut record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store poisoned".to_string()))?;
        let stored = guard.get(&record.id).ok_or(RepositoryError::NotFound)?;
        if stored.revision != record.revision {
            return Err(RepositoryError::Conflict);
        }
        record.revision += 1;
        record.updated_at = Utc::now();
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }
}
