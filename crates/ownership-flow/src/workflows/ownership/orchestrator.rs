use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::domain::{
    Intent, OwnershipType, Person, PersonId, RosterKind, ScreenId, UnknownScreen,
    VerificationMethod,
};
use super::navigation::{
    deferred_kind, next_screen, success_summary, BlockReason, FlowEffect, NavigationError,
    NavigationOutcome, SuccessSummary, Transition,
};
use super::params::{FlowParameterPatch, FlowParameters};
use super::prefill::PrefillData;
use super::requirements::{RequirementState, RequirementSummary};
use super::roster::{Removal, Roster, RosterError, RosterView};
use super::state::{PendingSubmission, SubmissionKind, WorkflowState};

/// How undefined `(screen, intent)` pairs are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Surface `NavigationError::InvalidTransition` to the caller.
    #[default]
    Strict,
    /// Log the error and fall back to the dashboard.
    Lenient,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    UnknownScreen(#[from] UnknownScreen),
    #[error("a {} submission is still pending", .0.label())]
    SubmissionPending(SubmissionKind),
    #[error("no submission is pending")]
    NoPendingSubmission,
    #[error("intent '{0}' does not start a submission")]
    NotDeferred(&'static str),
    #[error("business verification has no manual review pending")]
    NoManualReviewPending,
    #[error("intent issued from {requested} but the session is on {current}")]
    StaleScreen {
        requested: ScreenId,
        current: ScreenId,
    },
}

impl FlowError {
    pub fn is_validation(&self) -> bool {
        matches!(self, FlowError::Roster(err) if err.is_validation())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FlowError::Roster(RosterError::NotFound { .. }))
    }
}

/// Person entered by the user; the orchestrator assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDraft {
    pub name: String,
    #[serde(default)]
    pub ownership_percentage: Option<f32>,
    #[serde(default)]
    pub ownership_type: Option<OwnershipType>,
    #[serde(default)]
    pub role: Option<String>,
}

impl PersonDraft {
    pub fn owner(name: impl Into<String>, ownership_percentage: f32) -> Self {
        Self {
            name: name.into(),
            ownership_percentage: Some(ownership_percentage),
            ownership_type: Some(OwnershipType::Direct),
            role: None,
        }
    }

    pub fn director(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ownership_percentage: None,
            ownership_type: None,
            role: Some(role.into()),
        }
    }

    fn into_person(self, id: PersonId) -> Person {
        Person {
            id,
            name: self.name,
            ownership_percentage: self.ownership_percentage.unwrap_or(0.0),
            ownership_type: self.ownership_type.unwrap_or(OwnershipType::Direct),
            role: self.role.filter(|role| !role.trim().is_empty()),
            is_existing_in_account: Some(false),
            match_group: None,
        }
    }
}

/// Sole owner of a session's `WorkflowState`. Every operation builds the next
/// state on a copy and swaps it in only on success.
#[derive(Debug, Clone)]
pub struct VerificationOrchestrator {
    state: WorkflowState,
    seed: PrefillData,
    policy: TransitionPolicy,
    added_sequence: u64,
}

impl VerificationOrchestrator {
    pub fn new(seed: PrefillData, params: FlowParameters, policy: TransitionPolicy) -> Self {
        let state = WorkflowState::initial(&seed, params);
        info!(
            company = %seed.company_name,
            owners = state.owners.active().len(),
            directors = state.directors.active().len(),
            two_way_match = state.params().two_way_match_enabled,
            "verification workflow started"
        );
        Self {
            state,
            seed,
            policy,
            added_sequence: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn seed(&self) -> &PrefillData {
        &self.seed
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    pub fn screen(&self) -> ScreenId {
        self.state.screen
    }

    pub fn has_changes(&self) -> bool {
        self.state.has_changes()
    }

    pub fn is_directors_flow_active(&self) -> bool {
        self.state.is_directors_flow_active()
    }

    pub fn should_show_business_task(&self) -> bool {
        self.state.requirements().should_show_business_task()
    }

    pub fn should_show_ownership_task(&self) -> bool {
        self.state.requirements().should_show_ownership_task()
    }

    /// Remove a person from the active roster.
    pub fn remove(&mut self, id: &PersonId) -> Result<Removal, FlowError> {
        self.ensure_idle()?;
        let kind = self.state.active_roster;
        let mut next = self.state.clone();
        let removal = next.roster_mut(kind).remove(id).map_err(|err| desync(kind, err))?;
        self.state = next;
        info!(%id, roster = kind.label(), ?removal, "person removed");
        Ok(removal)
    }

    /// Put a removed person back on the active roster.
    pub fn restore(&mut self, id: &PersonId) -> Result<Person, FlowError> {
        self.ensure_idle()?;
        let kind = self.state.active_roster;
        let mut next = self.state.clone();
        let person = next
            .roster_mut(kind)
            .restore(id)
            .map_err(|err| desync(kind, err))?
            .clone();
        self.state = next;
        info!(%id, roster = kind.label(), "person restored");
        Ok(person)
    }

    pub fn add(&mut self, draft: PersonDraft) -> Result<Person, FlowError> {
        self.ensure_idle()?;
        let kind = self.state.active_roster;
        let id = self.next_person_id(kind);
        let mut next = self.state.clone();
        let person = next.roster_mut(kind).add(draft.into_person(id))?.clone();
        self.state = next;
        self.added_sequence += 1;
        info!(id = %person.id, roster = kind.label(), "person added");
        Ok(person)
    }

    pub fn set_flow_parameters(
        &mut self,
        patch: &FlowParameterPatch,
    ) -> Result<FlowParameters, FlowError> {
        self.ensure_idle()?;
        let mut next = self.state.clone();
        let previous = next.params.update(patch);
        let current = *next.params();
        if previous.two_way_match_enabled != current.two_way_match_enabled {
            reseed_rosters(&mut next, &self.seed);
            info!(
                two_way_match = current.two_way_match_enabled,
                "rosters reloaded for matching mode"
            );
        }
        self.state = next;
        Ok(current)
    }

    pub fn set_verification_method(&mut self, method: VerificationMethod) -> Result<(), FlowError> {
        self.ensure_idle()?;
        self.state.verification_method = Some(method);
        info!(method = method.label(), "verification method selected");
        Ok(())
    }

    pub fn mark_business_requirement_complete(&mut self) -> Result<RequirementState, FlowError> {
        self.ensure_idle()?;
        self.state.params.update(&FlowParameterPatch {
            business_requirement_complete: Some(true),
            ..FlowParameterPatch::default()
        });
        info!("business requirement complete");
        Ok(self.state.requirements().business())
    }

    pub fn mark_ownership_requirement_complete(&mut self) -> Result<RequirementState, FlowError> {
        self.ensure_idle()?;
        mark_ownership_complete(&mut self.state);
        info!("ownership requirement complete");
        Ok(self.state.requirements().ownership())
    }

    /// External reviewer signed off the business-verification manual review.
    pub fn complete_manual_review(&mut self) -> Result<RequirementState, FlowError> {
        self.ensure_idle()?;
        if !self.state.params().business_verification_needs_manual_review {
            return Err(FlowError::NoManualReviewPending);
        }
        self.state.params.update(&FlowParameterPatch {
            manual_review_complete: Some(true),
            ..FlowParameterPatch::default()
        });
        info!("business manual review complete");
        Ok(self.state.requirements().business())
    }

    /// Restore fresh rosters and return to the dashboard. Flow parameters and
    /// requirement progress survive.
    pub fn reset_state(&mut self) -> Result<(), FlowError> {
        self.ensure_idle()?;
        reset(&mut self.state, &self.seed);
        info!("workflow reset");
        Ok(())
    }

    /// Apply a navigation intent on the current screen.
    pub fn apply(&mut self, intent: &Intent) -> Result<NavigationOutcome, FlowError> {
        self.ensure_idle()?;
        self.navigate(intent)
    }

    /// Apply an intent the caller issued from `screen`. The intent is refused
    /// unless the session is still on that screen.
    pub fn apply_on(&mut self, screen: &str, intent: &Intent) -> Result<NavigationOutcome, FlowError> {
        let screen: ScreenId = screen.parse()?;
        self.ensure_idle()?;
        self.ensure_on(screen)?;
        self.navigate(intent)
    }

    /// Fails with `StaleScreen` when `screen` is not the current screen.
    pub fn ensure_on(&self, screen: ScreenId) -> Result<(), FlowError> {
        let current = self.state.screen;
        if screen != current {
            warn!(requested = %screen, %current, "intent issued from a stale screen");
            return Err(FlowError::StaleScreen {
                requested: screen,
                current,
            });
        }
        Ok(())
    }

    /// Suspend the workflow for a latency-bearing intent. Further mutations are
    /// rejected until `resolve_submission` runs.
    pub fn begin_submission(&mut self, intent: &Intent) -> Result<PendingSubmission, FlowError> {
        self.ensure_idle()?;
        let screen = self.state.screen;
        let kind = deferred_kind(screen, intent).ok_or(FlowError::NotDeferred(intent.name()))?;
        next_screen(screen, &self.state, intent)?;

        let pending = PendingSubmission {
            kind,
            screen,
            intent: intent.clone(),
            started_at: Utc::now(),
        };
        self.state.pending = Some(pending.clone());
        info!(screen = %screen, submission = kind.label(), "submission started");
        Ok(pending)
    }

    pub fn resolve_submission(&mut self) -> Result<NavigationOutcome, FlowError> {
        let pending = self
            .state
            .pending
            .clone()
            .ok_or(FlowError::NoPendingSubmission)?;
        let mut next = self.state.clone();
        next.pending = None;
        let outcome = self.commit(next, pending.screen, &pending.intent)?;
        info!(submission = pending.kind.label(), screen = %outcome.screen(), "submission resolved");
        Ok(outcome)
    }

    pub fn is_submission_pending(&self) -> bool {
        self.state.is_pending()
    }

    pub fn view(&self) -> SessionView {
        SessionView::from_state(&self.state, &self.seed)
    }

    fn navigate(&mut self, intent: &Intent) -> Result<NavigationOutcome, FlowError> {
        self.navigate_from(self.state.screen, intent)
    }

    fn navigate_from(
        &mut self,
        screen: ScreenId,
        intent: &Intent,
    ) -> Result<NavigationOutcome, FlowError> {
        self.commit(self.state.clone(), screen, intent)
    }

    fn commit(
        &mut self,
        mut next: WorkflowState,
        screen: ScreenId,
        intent: &Intent,
    ) -> Result<NavigationOutcome, FlowError> {
        let transition = match next_screen(screen, &next, intent) {
            Ok(transition) => transition,
            Err(err) => match self.policy {
                TransitionPolicy::Strict => return Err(err.into()),
                TransitionPolicy::Lenient => {
                    error!(%err, "invalid transition, returning to dashboard");
                    Transition {
                        outcome: NavigationOutcome::Advance {
                            screen: ScreenId::Dashboard,
                        },
                        effects: Vec::new(),
                    }
                }
            },
        };

        for effect in transition.effects {
            apply_effect(&mut next, &self.seed, effect);
        }

        match transition.outcome {
            NavigationOutcome::Advance { screen: to } => {
                info!(from = %screen, to = %to, intent = intent.name(), "screen changed");
                next.screen = to;
            }
            NavigationOutcome::Blocked { reason, .. } => {
                warn!(screen = %screen, ?reason, "continue blocked");
                next.screen = screen;
            }
        }

        self.state = next;
        Ok(transition.outcome)
    }

    fn ensure_idle(&self) -> Result<(), FlowError> {
        match &self.state.pending {
            Some(pending) => Err(FlowError::SubmissionPending(pending.kind)),
            None => Ok(()),
        }
    }

    fn next_person_id(&self, kind: RosterKind) -> PersonId {
        let roster = self.state.roster(kind);
        let mut sequence = self.added_sequence + 1;
        loop {
            let id = PersonId(format!("new_{}_{}", kind.id_prefix(), sequence));
            let taken = roster.is_original(&id)
                || roster.active().iter().any(|person| person.id == id)
                || roster.removed().iter().any(|person| person.id == id);
            if !taken {
                return id;
            }
            sequence += 1;
        }
    }
}

fn desync(kind: RosterKind, err: RosterError) -> FlowError {
    if let RosterError::NotFound { id, bucket } = &err {
        warn!(%id, ?bucket, roster = kind.label(), "roster lookup missed; state unchanged");
    }
    err.into()
}

fn reseed_rosters(state: &mut WorkflowState, seed: &PrefillData) {
    let two_way = state.params().two_way_match_enabled;
    state.owners = seed.roster(RosterKind::Owners, two_way);
    state.directors = seed.roster(RosterKind::Directors, two_way);
}

fn reset(state: &mut WorkflowState, seed: &PrefillData) {
    reseed_rosters(state, seed);
    state.screen = ScreenId::Dashboard;
    state.active_roster = RosterKind::Owners;
    state.verification_method = None;
    state.pending = None;
}

fn mark_ownership_complete(state: &mut WorkflowState) {
    state.params.update(&FlowParameterPatch {
        ownership_requirement_complete: Some(true),
        ..FlowParameterPatch::default()
    });
    state.ownership_in_review = false;
}

fn apply_effect(state: &mut WorkflowState, seed: &PrefillData, effect: FlowEffect) {
    match effect {
        FlowEffect::PatchParameters(patch) => {
            state.params.update(&patch);
        }
        FlowEffect::ReplaceRoster { kind, people } => {
            *state.roster_mut(kind) = Roster::seed(kind, people);
        }
        FlowEffect::SetActiveRoster(kind) => state.active_roster = kind,
        FlowEffect::SetVerificationMethod(method) => state.verification_method = Some(method),
        FlowEffect::MarkOwnershipComplete => mark_ownership_complete(state),
        FlowEffect::MarkOwnershipInReview => state.ownership_in_review = true,
        FlowEffect::ResetWorkflow => reset(state, seed),
    }
}

/// UI hints derived from the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Affordances {
    /// Present when a continue from the current screen would be refused.
    pub continue_blocked: Option<BlockReason>,
    pub data_mismatch_warning: bool,
}

/// Read model handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub screen: ScreenId,
    pub company_name: String,
    pub params: FlowParameters,
    pub requirements: RequirementSummary,
    pub active_roster: RosterKind,
    pub owners: RosterView,
    pub directors: RosterView,
    pub verification_method: Option<VerificationMethod>,
    pub has_changes: bool,
    pub is_directors_flow_active: bool,
    pub should_show_business_task: bool,
    pub should_show_ownership_task: bool,
    pub pending_submission: Option<PendingSubmission>,
    pub affordances: Affordances,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<SuccessSummary>,
}

impl SessionView {
    fn from_state(state: &WorkflowState, seed: &PrefillData) -> Self {
        let requirements = state.requirements();
        let continue_blocked = match next_screen(state.screen, state, &Intent::Continue) {
            Ok(Transition {
                outcome: NavigationOutcome::Blocked { reason, .. },
                ..
            }) => Some(reason),
            _ => None,
        };
        let success = (state.screen == ScreenId::Success).then(|| {
            success_summary(
                state.has_changes(),
                state.verification_method,
                state.is_directors_flow_active(),
            )
        });

        Self {
            screen: state.screen,
            company_name: seed.company_name.clone(),
            params: *state.params(),
            requirements: requirements.summary(),
            active_roster: state.active_roster,
            owners: RosterView::from(&state.owners),
            directors: RosterView::from(&state.directors),
            verification_method: state.verification_method,
            has_changes: state.has_changes(),
            is_directors_flow_active: state.is_directors_flow_active(),
            should_show_business_task: requirements.should_show_business_task(),
            should_show_ownership_task: requirements.should_show_ownership_task(),
            pending_submission: state.pending.clone(),
            affordances: Affordances {
                continue_blocked,
                data_mismatch_warning: state.screen == ScreenId::ConfirmStructure
                    && state.params.shows_data_mismatch_warning(),
            },
            success,
        }
    }
}
