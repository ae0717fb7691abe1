use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::workflows::ownership::repository::{
    InMemorySessionRepository, RepositoryError, SessionId, SessionRecord, SessionRepository,
};
use crate::workflows::ownership::{
    FlowParameters, Intent, NavigationOutcome, OwnershipType, Person, PrefillData, ScreenId,
    StaticPrefill, TransitionPolicy, VerificationOrchestrator, VerificationSessionService,
};

pub(super) fn alice() -> Person {
    Person::owner("owner_alice", "Alice", 60.0, OwnershipType::Direct)
}

pub(super) fn bob() -> Person {
    Person::owner("owner_bob", "Bob", 40.0, OwnershipType::Direct)
}

pub(super) fn rhodes() -> Person {
    Person::director("director_1", "James Rhodes", "Chief Executive Officer")
}

pub(super) fn alice_bob_seed() -> PrefillData {
    PrefillData::new("Acme Dental LLC", vec![alice(), bob()], vec![rhodes()])
}

/// Prefill {A, B}; account {A, C}.
pub(super) fn two_way_seed() -> PrefillData {
    let a = Person::owner("A", "Anna", 50.0, OwnershipType::Direct);
    let b = Person::owner("B", "Ben", 30.0, OwnershipType::Direct);
    let c = Person::owner("C", "Cleo", 20.0, OwnershipType::Indirect);
    PrefillData::new("Two Way LLC", vec![a.clone(), b], vec![rhodes()])
        .with_account(vec![a, c], vec![rhodes()])
}

pub(super) fn orchestrator() -> VerificationOrchestrator {
    orchestrator_with(FlowParameters::default())
}

pub(super) fn orchestrator_with(params: FlowParameters) -> VerificationOrchestrator {
    VerificationOrchestrator::new(alice_bob_seed(), params, TransitionPolicy::Strict)
}

/// Apply intents in order, returning the screen reached after each one.
pub(super) fn drive(orchestrator: &mut VerificationOrchestrator, intents: &[Intent]) -> Vec<ScreenId> {
    intents
        .iter()
        .map(|intent| {
            orchestrator
                .apply(intent)
                .unwrap_or_else(|err| panic!("intent {} failed: {err}", intent.name()))
                .screen()
        })
        .collect()
}

pub(super) fn open_ownership_task() -> Intent {
    Intent::OpenTask {
        task: crate::workflows::ownership::DashboardTask::OwnershipVerification,
    }
}

/// Dashboard -> VerifyOwnership -> ConfirmStructure -> structure routing.
pub(super) fn walk_to_structure_result(orchestrator: &mut VerificationOrchestrator) -> ScreenId {
    let trail = drive(
        orchestrator,
        &[open_ownership_task(), Intent::Continue, Intent::Continue],
    );
    trail[2]
}

pub(super) fn advanced(outcome: NavigationOutcome, screen: ScreenId) {
    assert_eq!(outcome, NavigationOutcome::Advance { screen });
}

pub(super) fn workflow_config() -> WorkflowConfig {
    WorkflowConfig {
        submission_latency: Duration::from_millis(2000),
        document_preparation: Duration::from_millis(2000),
        ..WorkflowConfig::default()
    }
}

pub(super) fn build_service() -> (
    VerificationSessionService<InMemorySessionRepository, StaticPrefill>,
    Arc<InMemorySessionRepository>,
) {
    let repository = Arc::new(InMemorySessionRepository::default());
    let prefill = Arc::new(StaticPrefill::new(alice_bob_seed()));
    let service = VerificationSessionService::new(repository.clone(), prefill, workflow_config());
    (service, repository)
}

pub(super) struct ConflictRepository {
    pub(super) inner: InMemorySessionRepository,
}

impl SessionRepository for ConflictRepository {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, _record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        self.inner.fetch(id)
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn json_request(method: Method, uri: &str, body: Value) -> Request<axum::body::Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(&body).expect("serializable body"),
        ))
        .expect("valid request")
}

pub(super) fn empty_request(method: Method, uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .expect("valid request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
