use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::LegalEntityMatch;

/// Flags selecting which branch of the workflow is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowParameters {
    pub ubos_found: bool,
    pub directors_found: bool,
    pub legal_entity_match: LegalEntityMatch,
    pub business_verification_complete: bool,
    pub business_verification_needs_manual_review: bool,
    /// Only meaningful while `business_verification_needs_manual_review` is set.
    pub manual_review_complete: bool,
    pub ownership_requirement_complete: bool,
    pub business_requirement_complete: bool,
    pub two_way_match_enabled: bool,
}

impl Default for FlowParameters {
    fn default() -> Self {
        Self {
            ubos_found: true,
            directors_found: true,
            legal_entity_match: LegalEntityMatch::Match,
            business_verification_complete: true,
            business_verification_needs_manual_review: false,
            manual_review_complete: false,
            ownership_requirement_complete: false,
            business_requirement_complete: false,
            two_way_match_enabled: false,
        }
    }
}

impl FlowParameters {
    /// Clear `manual_review_complete` when no manual review is in play.
    pub fn normalized(mut self) -> Self {
        if !self.business_verification_needs_manual_review && self.manual_review_complete {
            warn!("manual review completion ignored without a pending manual review");
            self.manual_review_complete = false;
        }
        self
    }

    pub fn apply(self, patch: &FlowParameterPatch) -> Self {
        Self {
            ubos_found: patch.ubos_found.unwrap_or(self.ubos_found),
            directors_found: patch.directors_found.unwrap_or(self.directors_found),
            legal_entity_match: patch.legal_entity_match.unwrap_or(self.legal_entity_match),
            business_verification_complete: patch
                .business_verification_complete
                .unwrap_or(self.business_verification_complete),
            business_verification_needs_manual_review: patch
                .business_verification_needs_manual_review
                .unwrap_or(self.business_verification_needs_manual_review),
            manual_review_complete: patch
                .manual_review_complete
                .unwrap_or(self.manual_review_complete),
            ownership_requirement_complete: patch
                .ownership_requirement_complete
                .unwrap_or(self.ownership_requirement_complete),
            business_requirement_complete: patch
                .business_requirement_complete
                .unwrap_or(self.business_requirement_complete),
            two_way_match_enabled: patch
                .two_way_match_enabled
                .unwrap_or(self.two_way_match_enabled),
        }
        .normalized()
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParameterPatch {
    pub ubos_found: Option<bool>,
    pub directors_found: Option<bool>,
    pub legal_entity_match: Option<LegalEntityMatch>,
    pub business_verification_complete: Option<bool>,
    pub business_verification_needs_manual_review: Option<bool>,
    pub manual_review_complete: Option<bool>,
    pub ownership_requirement_complete: Option<bool>,
    pub business_requirement_complete: Option<bool>,
    pub two_way_match_enabled: Option<bool>,
}

impl FlowParameterPatch {
    pub fn structure(ubos_found: bool, directors_found: bool) -> Self {
        Self {
            ubos_found: Some(ubos_found),
            directors_found: Some(directors_found),
            ..Self::default()
        }
    }
}

/// Holder of the live flow parameters; every write goes through normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowParameterStore {
    current: FlowParameters,
}

impl FlowParameterStore {
    pub fn new(initial: FlowParameters) -> Self {
        Self {
            current: initial.normalized(),
        }
    }

    pub fn get(&self) -> &FlowParameters {
        &self.current
    }

    pub fn replace(&mut self, params: FlowParameters) -> FlowParameters {
        let previous = self.current;
        self.current = params.normalized();
        debug!(?previous, current = ?self.current, "flow parameters replaced");
        previous
    }

    pub fn update(&mut self, patch: &FlowParameterPatch) -> FlowParameters {
        let previous = self.current;
        self.current = self.current.apply(patch);
        debug!(?patch, current = ?self.current, "flow parameters patched");
        previous
    }

    pub fn shows_data_mismatch_warning(&self) -> bool {
        self.current.legal_entity_match == LegalEntityMatch::Mismatch
    }
}
