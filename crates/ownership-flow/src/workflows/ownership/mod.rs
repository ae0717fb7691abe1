//! Beneficial-ownership verification workflow.
//!
//! `VerificationOrchestrator` owns the workflow state for one session. Screens
//! read its `SessionView` and report user actions as `Intent`s; the pure
//! navigation engine decides where each intent leads and which effects apply.
//! `VerificationSessionService` and `ownership_router` expose sessions over HTTP.

pub mod domain;
pub mod matching;
pub mod navigation;
pub mod orchestrator;
pub mod params;
pub mod prefill;
pub mod repository;
pub mod requirements;
pub mod roster;
pub mod router;
pub mod service;
pub mod state;

#[cfg(test)]
mod tests;

pub use domain::{
    BusinessCheckOutcome, DashboardTask, Intent, LegalEntityMatch, MatchGroup, OrgTreeOutcome,
    OwnershipType, Person, PersonId, RosterKind, ScreenId, StructureComplexity, UnknownScreen,
    VerificationMethod,
};
pub use matching::{classify, label_people, MatchClassification};
pub use navigation::{
    deferred_kind, next_screen, success_summary, success_variant, BlockReason, FlowEffect,
    NavigationError, NavigationOutcome, SuccessStep, SuccessSummary, SuccessVariant, Transition,
};
pub use orchestrator::{
    Affordances, FlowError, PersonDraft, SessionView, TransitionPolicy, VerificationOrchestrator,
};
pub use params::{FlowParameterPatch, FlowParameterStore, FlowParameters};
pub use prefill::{
    parse_prefill, CsvPrefillImporter, PrefillData, PrefillError, PrefillSource, StaticPrefill,
};
pub use repository::{
    InMemorySessionRepository, RepositoryError, SessionId, SessionRecord, SessionRepository,
    SessionResponse,
};
pub use requirements::{RequirementState, RequirementSummary, RequirementTracker};
pub use roster::{Removal, Roster, RosterBucket, RosterError, RosterView};
pub use router::ownership_router;
pub use service::{CreateSession, SessionServiceError, VerificationSessionService};
pub use state::{PendingSubmission, SubmissionKind, WorkflowState};
