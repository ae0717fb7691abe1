use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{Intent, Person, PersonId, ScreenId, VerificationMethod};
use super::navigation::{deferred_kind, NavigationOutcome};
use super::orchestrator::{FlowError, PersonDraft, VerificationOrchestrator};
use super::params::{FlowParameterPatch, FlowParameters};
use super::prefill::{PrefillError, PrefillSource};
use super::repository::{RepositoryError, SessionId, SessionRecord, SessionRepository};
use super::requirements::RequirementState;
use super::roster::Removal;
use super::state::SubmissionKind;
use crate::config::WorkflowConfig;

/// Options accepted when a session is opened.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateSession {
    pub two_way_match: Option<bool>,
    pub flow_parameters: Option<FlowParameterPatch>,
}

/// Service hosting one orchestrator per session on top of a repository.
pub struct VerificationSessionService<R, P> {
    repository: Arc<R>,
    prefill: Arc<P>,
    config: WorkflowConfig,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("session-{id:06}"))
}

impl<R, P> VerificationSessionService<R, P>
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    pub fn new(repository: Arc<R>, prefill: Arc<P>, config: WorkflowConfig) -> Self {
        Self {
            repository,
            prefill,
            config,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Open a session seeded from the prefill source.
    pub fn create(&self, request: CreateSession) -> Result<SessionRecord, SessionServiceError> {
        let seed = self.prefill.load()?;
        let mut params = FlowParameters {
            two_way_match_enabled: request.two_way_match.unwrap_or(self.config.two_way_match),
            ..FlowParameters::default()
        };
        if let Some(patch) = &request.flow_parameters {
            params = params.apply(patch);
        }

        let orchestrator =
            VerificationOrchestrator::new(seed, params, self.config.transition_policy);
        let record = SessionRecord::new(next_session_id(), orchestrator);
        let stored = self.repository.insert(record)?;
        info!(session = %stored.id, "verification session created");
        Ok(stored)
    }

    pub fn get(&self, id: &SessionId) -> Result<SessionRecord, SessionServiceError> {
        let record = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Apply an intent. When `screen` is given the session must still be on
    /// it. Submissions wait out their simulated latency between suspending and
    /// resolving the workflow.
    pub async fn apply_intent(
        &self,
        id: &SessionId,
        screen: Option<&str>,
        intent: Intent,
    ) -> Result<(NavigationOutcome, SessionRecord), SessionServiceError> {
        let pinned = screen
            .map(|raw| raw.parse::<ScreenId>())
            .transpose()
            .map_err(FlowError::from)?;
        let record = self.get(id)?;
        let current = record.orchestrator.screen();
        if let Some(pinned) = pinned {
            record.orchestrator.ensure_on(pinned)?;
        }
        if deferred_kind(current, &intent).is_some() {
            return self.submit(id, intent).await;
        }

        self.mutate(id, |orchestrator| match pinned {
            Some(pinned) => orchestrator.apply_on(pinned.as_str(), &intent),
            None => orchestrator.apply(&intent),
        })
    }

    /// The latency and resolution run on a spawned task, so a caller that
    /// stops waiting cannot leave the session suspended.
    async fn submit(
        &self,
        id: &SessionId,
        intent: Intent,
    ) -> Result<(NavigationOutcome, SessionRecord), SessionServiceError> {
        let (pending, _) = self.mutate(id, |orchestrator| orchestrator.begin_submission(&intent))?;

        let repository = Arc::clone(&self.repository);
        let latency = self.latency(pending.kind);
        let session = id.clone();
        let resolution = tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            let resolved = mutate_record(repository.as_ref(), &session, |orchestrator| {
                orchestrator.resolve_submission()
            });
            if let Err(err) = &resolved {
                warn!(session = %session, %err, "submission could not be resolved");
            }
            resolved
        });

        resolution.await?
    }

    pub fn remove_person(
        &self,
        id: &SessionId,
        person: &PersonId,
    ) -> Result<(Removal, SessionRecord), SessionServiceError> {
        self.mutate(id, |orchestrator| orchestrator.remove(person))
    }

    pub fn restore_person(
        &self,
        id: &SessionId,
        person: &PersonId,
    ) -> Result<(Person, SessionRecord), SessionServiceError> {
        self.mutate(id, |orchestrator| orchestrator.restore(person))
    }

    pub fn add_person(
        &self,
        id: &SessionId,
        draft: PersonDraft,
    ) -> Result<(Person, SessionRecord), SessionServiceError> {
        self.mutate(id, |orchestrator| orchestrator.add(draft))
    }

    pub fn set_flow_parameters(
        &self,
        id: &SessionId,
        patch: &FlowParameterPatch,
    ) -> Result<(FlowParameters, SessionRecord), SessionServiceError> {
        self.mutate(id, |orchestrator| orchestrator.set_flow_parameters(patch))
    }

    pub fn set_verification_method(
        &self,
        id: &SessionId,
        method: VerificationMethod,
    ) -> Result<SessionRecord, SessionServiceError> {
        self.mutate(id, |orchestrator| orchestrator.set_verification_method(method))
            .map(|(_, record)| record)
    }

    pub fn mark_business_requirement_complete(
        &self,
        id: &SessionId,
    ) -> Result<(RequirementState, SessionRecord), SessionServiceError> {
        self.mutate(id, |orchestrator| orchestrator.mark_business_requirement_complete())
    }

    pub fn mark_ownership_requirement_complete(
        &self,
        id: &SessionId,
    ) -> Result<(RequirementState, SessionRecord), SessionServiceError> {
        self.mutate(id, |orchestrator| orchestrator.mark_ownership_requirement_complete())
    }

    pub fn complete_manual_review(
        &self,
        id: &SessionId,
    ) -> Result<(RequirementState, SessionRecord), SessionServiceError> {
        self.mutate(id, |orchestrator| orchestrator.complete_manual_review())
    }

    pub fn reset(&self, id: &SessionId) -> Result<SessionRecord, SessionServiceError> {
        self.mutate(id, |orchestrator| orchestrator.reset_state())
            .map(|(_, record)| record)
    }

    fn latency(&self, kind: SubmissionKind) -> Duration {
        match kind {
            SubmissionKind::BusinessDetails | SubmissionKind::BusinessDocuments => {
                self.config.submission_latency
            }
            SubmissionKind::SignatureDocument => self.config.document_preparation,
        }
    }

    fn mutate<T, F>(&self, id: &SessionId, operation: F) -> Result<(T, SessionRecord), SessionServiceError>
    where
        F: FnOnce(&mut VerificationOrchestrator) -> Result<T, FlowError>,
    {
        mutate_record(self.repository.as_ref(), id, operation)
    }
}

/// Fetch, run `operation` on the orchestrator, and store the result. The
/// record is left untouched when the operation fails.
fn mutate_record<R, T, F>(
    repository: &R,
    id: &SessionId,
    operation: F,
) -> Result<(T, SessionRecord), SessionServiceError>
where
    R: SessionRepository + ?Sized,
    F: FnOnce(&mut VerificationOrchestrator) -> Result<T, FlowError>,
{
    let mut record = repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
    let value = operation(&mut record.orchestrator)?;
    let stored = repository.update(record)?;
    Ok((value, stored))
}

/// Error raised by the session service.
#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Prefill(#[from] PrefillError),
    #[error("submission task failed: {0}")]
    SubmissionTask(#[from] tokio::task::JoinError),
}
