use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Intent, RosterKind, ScreenId, VerificationMethod};
use super::params::{FlowParameterStore, FlowParameters};
use super::prefill::PrefillData;
use super::requirements::RequirementTracker;
use super::roster::Roster;

/// Latency-bearing submissions that suspend the workflow until resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    BusinessDetails,
    BusinessDocuments,
    SignatureDocument,
}

impl SubmissionKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::BusinessDetails => "business details",
            Self::BusinessDocuments => "business documents",
            Self::SignatureDocument => "signature document",
        }
    }
}

/// The single in-flight submission a workflow may carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingSubmission {
    pub kind: SubmissionKind,
    pub screen: ScreenId,
    /// Intent replayed when the submission resolves.
    pub intent: Intent,
    pub started_at: DateTime<Utc>,
}

/// Aggregate state owned by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    pub screen: ScreenId,
    pub params: FlowParameterStore,
    pub owners: Roster,
    pub directors: Roster,
    pub active_roster: RosterKind,
    pub verification_method: Option<VerificationMethod>,
    /// Set when an ownership pass finished through document upload and awaits review.
    pub ownership_in_review: bool,
    pub pending: Option<PendingSubmission>,
}

impl WorkflowState {
    pub fn initial(seed: &PrefillData, params: FlowParameters) -> Self {
        let params = FlowParameterStore::new(params);
        let two_way = params.get().two_way_match_enabled;
        Self {
            screen: ScreenId::Dashboard,
            params,
            owners: seed.roster(RosterKind::Owners, two_way),
            directors: seed.roster(RosterKind::Directors, two_way),
            active_roster: RosterKind::Owners,
            verification_method: None,
            ownership_in_review: false,
            pending: None,
        }
    }

    pub fn params(&self) -> &FlowParameters {
        self.params.get()
    }

    pub fn roster(&self, kind: RosterKind) -> &Roster {
        match kind {
            RosterKind::Owners => &self.owners,
            RosterKind::Directors => &self.directors,
        }
    }

    pub fn roster_mut(&mut self, kind: RosterKind) -> &mut Roster {
        match kind {
            RosterKind::Owners => &mut self.owners,
            RosterKind::Directors => &mut self.directors,
        }
    }

    pub fn active(&self) -> &Roster {
        self.roster(self.active_roster)
    }

    /// Changes on the roster the flow is currently operating on.
    pub fn has_changes(&self) -> bool {
        self.active().has_changes()
    }

    pub fn is_directors_flow_active(&self) -> bool {
        self.active_roster == RosterKind::Directors
    }

    pub fn requirements(&self) -> RequirementTracker<'_> {
        RequirementTracker::new(self.params.get(), self.ownership_in_review)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
