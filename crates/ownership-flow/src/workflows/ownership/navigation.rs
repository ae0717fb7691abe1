//! Pure screen-to-screen routing. `next_screen` never mutates state; it returns
//! the destination together with the effects the orchestrator must apply.

use serde::Serialize;

use super::domain::{
    BusinessCheckOutcome, DashboardTask, Intent, OrgTreeOutcome, Person, RosterKind, ScreenId,
    StructureComplexity, VerificationMethod,
};
use super::params::FlowParameterPatch;
use super::state::{SubmissionKind, WorkflowState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("no transition from '{screen}' on intent '{intent}'")]
    InvalidTransition { screen: ScreenId, intent: &'static str },
}

/// Why a continue was refused; the screen stays put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    EmptyDirectors,
    TaskUnavailable,
}

impl BlockReason {
    pub const fn message(self) -> &'static str {
        match self {
            Self::EmptyDirectors => "add at least one director before continuing",
            Self::TaskUnavailable => "this task is not available yet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    Advance { screen: ScreenId },
    Blocked { screen: ScreenId, reason: BlockReason },
}

impl NavigationOutcome {
    pub const fn screen(&self) -> ScreenId {
        match self {
            Self::Advance { screen } | Self::Blocked { screen, .. } => *screen,
        }
    }

    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// State change requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEffect {
    PatchParameters(FlowParameterPatch),
    /// Replace a roster with a fresh one whose canonical set is `people`.
    ReplaceRoster { kind: RosterKind, people: Vec<Person> },
    SetActiveRoster(RosterKind),
    SetVerificationMethod(VerificationMethod),
    MarkOwnershipComplete,
    MarkOwnershipInReview,
    ResetWorkflow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub outcome: NavigationOutcome,
    pub effects: Vec<FlowEffect>,
}

impl Transition {
    fn advance(screen: ScreenId) -> Self {
        Self {
            outcome: NavigationOutcome::Advance { screen },
            effects: Vec::new(),
        }
    }

    fn blocked(screen: ScreenId, reason: BlockReason) -> Self {
        Self {
            outcome: NavigationOutcome::Blocked { screen, reason },
            effects: Vec::new(),
        }
    }

    fn with(mut self, effect: FlowEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Which success screen a finished pass shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessVariant {
    Complete,
    InReview,
}

pub fn success_variant(has_changes: bool, method: Option<VerificationMethod>) -> SuccessVariant {
    match (has_changes, method) {
        (true, Some(VerificationMethod::DocumentUpload)) => SuccessVariant::InReview,
        _ => SuccessVariant::Complete,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessStep {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessSummary {
    pub variant: SuccessVariant,
    pub title: &'static str,
    pub heading: &'static str,
    pub steps: Vec<SuccessStep>,
}

pub fn success_summary(
    has_changes: bool,
    method: Option<VerificationMethod>,
    directors_flow: bool,
) -> SuccessSummary {
    let variant = success_variant(has_changes, method);
    let title = if directors_flow {
        "Activate payments"
    } else {
        "Verify ownership"
    };
    let step = |id, label| SuccessStep { id, label };

    match variant {
        SuccessVariant::InReview => SuccessSummary {
            variant,
            title,
            heading: "Your information is in review",
            steps: vec![
                step("get-started", "Get started"),
                step("confirm-owners", "Confirm owners"),
                step("upload-docs", "Upload documents"),
                step("submit-information", "Submit information"),
            ],
        },
        SuccessVariant::Complete => {
            let mut steps = vec![
                step("get-started", "Get started"),
                step("confirm-owners", "Confirm owners"),
            ];
            if has_changes && method == Some(VerificationMethod::ElectronicSignature) {
                steps.push(step("esign-attestation", "E-sign attestation"));
            }
            steps.push(step("verification-complete", "Verification complete"));
            SuccessSummary {
                variant,
                title,
                heading: "You're all done",
                steps,
            }
        }
    }
}

/// Intents that must suspend for a simulated submission before they resolve.
pub fn deferred_kind(screen: ScreenId, intent: &Intent) -> Option<SubmissionKind> {
    match (screen, intent) {
        (ScreenId::BusinessVerification, Intent::BusinessCheck { .. }) => {
            Some(SubmissionKind::BusinessDetails)
        }
        (ScreenId::BusinessDocumentUpload, Intent::Submit) => Some(SubmissionKind::BusinessDocuments),
        (ScreenId::ESignature, Intent::Sign) => Some(SubmissionKind::SignatureDocument),
        _ => None,
    }
}

/// Structure-confirmation routing on the given flags.
fn structure_route(ubos_found: bool, directors_found: bool) -> Transition {
    if ubos_found {
        Transition::advance(ScreenId::ConfirmOwners)
            .with(FlowEffect::SetActiveRoster(RosterKind::Owners))
    } else if directors_found {
        Transition::advance(ScreenId::ConfirmDirectors)
            .with(FlowEffect::SetActiveRoster(RosterKind::Directors))
    } else {
        Transition::advance(ScreenId::NoOwnersFound)
    }
}

fn structure_flags(ubos_found: bool, directors_found: bool) -> FlowEffect {
    FlowEffect::PatchParameters(FlowParameterPatch::structure(ubos_found, directors_found))
}

fn editor_continue(state: &WorkflowState, kind: RosterKind) -> Transition {
    let roster = state.roster(kind);
    let current = ScreenId::editor(kind);

    if roster.is_empty() {
        return match kind {
            RosterKind::Owners => Transition::advance(ScreenId::NoOwnersTransition).with(
                FlowEffect::PatchParameters(FlowParameterPatch {
                    ubos_found: Some(false),
                    ..FlowParameterPatch::default()
                }),
            ),
            RosterKind::Directors => Transition::blocked(current, BlockReason::EmptyDirectors),
        };
    }

    let next = if roster.has_changes() {
        ScreenId::VerificationMethod
    } else {
        ScreenId::confirmation(kind)
    };
    Transition::advance(next).with(FlowEffect::SetActiveRoster(kind))
}

fn confirmation_continue(state: &WorkflowState, kind: RosterKind) -> Transition {
    let next = if state.roster(kind).has_changes() {
        ScreenId::VerificationMethod
    } else {
        ScreenId::Success
    };
    Transition::advance(next).with(FlowEffect::SetActiveRoster(kind))
}

fn switch_to_owners() -> Transition {
    Transition::advance(ScreenId::EditOwners)
        .with(structure_flags(true, false))
        .with(FlowEffect::SetActiveRoster(RosterKind::Owners))
}

fn finish(state: &WorkflowState) -> Transition {
    let completion = match success_variant(state.has_changes(), state.verification_method) {
        SuccessVariant::Complete => FlowEffect::MarkOwnershipComplete,
        SuccessVariant::InReview => FlowEffect::MarkOwnershipInReview,
    };
    Transition::advance(ScreenId::Dashboard)
        .with(completion)
        .with(FlowEffect::ResetWorkflow)
}

/// Compute the destination of `intent` on `current`.
pub fn next_screen(
    current: ScreenId,
    state: &WorkflowState,
    intent: &Intent,
) -> Result<Transition, NavigationError> {
    use Intent as I;
    use ScreenId as S;

    let transition = match (current, intent) {
        (S::Dashboard, I::OpenTask { task }) => {
            if !state.requirements().is_task_visible(*task) {
                Transition::blocked(current, BlockReason::TaskUnavailable)
            } else {
                match task {
                    DashboardTask::BusinessVerification => {
                        Transition::advance(S::BusinessVerification)
                    }
                    DashboardTask::OwnershipVerification => Transition::advance(S::VerifyOwnership),
                }
            }
        }

        (S::BusinessVerification, I::BusinessCheck { outcome }) => match outcome {
            BusinessCheckOutcome::Passed => Transition::advance(S::BusinessSuccess).with(
                FlowEffect::PatchParameters(FlowParameterPatch {
                    business_verification_complete: Some(true),
                    business_verification_needs_manual_review: Some(false),
                    ..FlowParameterPatch::default()
                }),
            ),
            BusinessCheckOutcome::ManualReviewRequired => {
                Transition::advance(S::BusinessDocumentUpload).with(FlowEffect::PatchParameters(
                    FlowParameterPatch {
                        business_verification_complete: Some(false),
                        business_verification_needs_manual_review: Some(true),
                        manual_review_complete: Some(false),
                        ..FlowParameterPatch::default()
                    },
                ))
            }
        },
        (S::BusinessVerification, I::Back) => Transition::advance(S::Dashboard),
        (S::BusinessDocumentUpload, I::Submit) => Transition::advance(S::BusinessReview).with(
            FlowEffect::PatchParameters(FlowParameterPatch {
                business_verification_complete: Some(true),
                business_verification_needs_manual_review: Some(true),
                ..FlowParameterPatch::default()
            }),
        ),
        (S::BusinessDocumentUpload, I::Back) => Transition::advance(S::BusinessVerification),
        (S::BusinessReview, I::Continue | I::Back) => Transition::advance(S::Dashboard),
        (S::BusinessSuccess, I::Continue) => Transition::advance(S::VerifyOwnership),
        (S::BusinessSuccess, I::Back) => Transition::advance(S::Dashboard),

        (S::VerifyOwnership, I::Continue) => Transition::advance(S::ConfirmStructure),
        (S::VerifyOwnership, I::Back) => Transition::advance(S::Dashboard),

        (S::ConfirmStructure, I::Continue) => {
            let params = state.params();
            structure_route(params.ubos_found, params.directors_found)
        }
        (S::ConfirmStructure, I::Edit) => Transition::advance(S::EditBusinessStructure),
        (S::ConfirmStructure, I::Back) => Transition::advance(S::VerifyOwnership),
        (S::EditBusinessStructure, I::Continue | I::Back) => {
            Transition::advance(S::ConfirmStructure)
        }

        (S::NoOwnersFound, I::AcceptNoOwners) => Transition::advance(S::NoOwnersTransition)
            .with(structure_flags(false, false))
            .with(FlowEffect::ReplaceRoster {
                kind: RosterKind::Directors,
                people: Vec::new(),
            })
            .with(FlowEffect::SetActiveRoster(RosterKind::Directors)),
        (S::NoOwnersFound, I::AddOwners) => Transition::advance(S::CompanyInformation),
        (S::NoOwnersFound, I::Back) => Transition::advance(S::ConfirmStructure),

        (S::CompanyInformation, I::SelectComplexity { complexity }) => match complexity {
            StructureComplexity::Simple => Transition::advance(S::EditOwners)
                .with(structure_flags(true, false))
                .with(FlowEffect::ReplaceRoster {
                    kind: RosterKind::Owners,
                    people: Vec::new(),
                })
                .with(FlowEffect::SetActiveRoster(RosterKind::Owners)),
            StructureComplexity::Complex => Transition::advance(S::OrgTreeBuilder),
        },
        (S::CompanyInformation, I::Back) => Transition::advance(S::NoOwnersFound),

        (S::OrgTreeBuilder, I::OrgTreeResult { outcome }) => match outcome {
            OrgTreeOutcome::OwnersIdentified { owners } => {
                let mut transition = structure_route(true, false);
                transition.effects.insert(0, structure_flags(true, false));
                transition.effects.insert(
                    1,
                    FlowEffect::ReplaceRoster {
                        kind: RosterKind::Owners,
                        people: owners.clone(),
                    },
                );
                transition
            }
            OrgTreeOutcome::DirectorsOnly => {
                let mut transition = structure_route(false, true);
                transition.effects.insert(0, structure_flags(false, true));
                transition
            }
        },
        (S::OrgTreeBuilder, I::Back) => Transition::advance(S::CompanyInformation),

        (S::ConfirmOwners, I::Continue) => confirmation_continue(state, RosterKind::Owners),
        (S::ConfirmDirectors, I::Continue) => confirmation_continue(state, RosterKind::Directors),
        (S::ConfirmOwners, I::Edit) => Transition::advance(S::EditOwners)
            .with(FlowEffect::SetActiveRoster(RosterKind::Owners)),
        (S::ConfirmDirectors, I::Edit) => Transition::advance(S::EditDirectors)
            .with(FlowEffect::SetActiveRoster(RosterKind::Directors)),
        (S::ConfirmOwners | S::ConfirmDirectors, I::Back) => {
            Transition::advance(S::ConfirmStructure)
        }
        (S::ConfirmDirectors | S::EditDirectors, I::AddOwners) => switch_to_owners(),

        (S::EditOwners, I::Continue) => editor_continue(state, RosterKind::Owners),
        (S::EditDirectors, I::Continue) => editor_continue(state, RosterKind::Directors),
        (S::EditOwners, I::Back) => Transition::advance(S::ConfirmOwners),
        (S::EditDirectors, I::Back) => {
            if state.directors.is_empty() {
                Transition::advance(S::NoOwnersTransition)
            } else {
                Transition::advance(S::ConfirmDirectors)
            }
        }

        (S::NoOwnersTransition, I::Continue) => Transition::advance(S::EditDirectors)
            .with(FlowEffect::SetActiveRoster(RosterKind::Directors)),
        (S::NoOwnersTransition, I::Back) => Transition::advance(S::EditOwners)
            .with(FlowEffect::SetActiveRoster(RosterKind::Owners)),

        (S::VerificationMethod, I::ChooseMethod { method }) => {
            let next = match method {
                VerificationMethod::ElectronicSignature => S::ESignature,
                VerificationMethod::DocumentUpload => S::DocumentReviewStatus,
            };
            Transition::advance(next).with(FlowEffect::SetVerificationMethod(*method))
        }
        (S::VerificationMethod, I::Back | I::Edit) => {
            Transition::advance(S::editor(state.active_roster))
        }

        (S::ESignature, I::Sign) => Transition::advance(S::ReviewAttestation),
        (S::ESignature, I::Cancel | I::Back) => Transition::advance(S::VerificationMethod),
        (S::ReviewAttestation, I::Submit) => Transition::advance(S::Success),
        (S::ReviewAttestation, I::Back) => Transition::advance(S::ESignature),
        (S::DocumentReviewStatus, I::Continue) => Transition::advance(S::Success),

        (S::Success, I::Finish) => finish(state),

        (screen, intent) => {
            return Err(NavigationError::InvalidTransition {
                screen,
                intent: intent.name(),
            })
        }
    };

    Ok(transition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::ownership::domain::{OwnershipType, PersonId};
    use crate::workflows::ownership::params::FlowParameters;
    use crate::workflows::ownership::prefill::PrefillData;

    fn state() -> WorkflowState {
        let seed = PrefillData::new(
            "Acme",
            vec![
                Person::owner("owner_alice", "Alice", 60.0, OwnershipType::Direct),
                Person::owner("owner_bob", "Bob", 40.0, OwnershipType::Direct),
            ],
            vec![Person::director("director_1", "James Rhodes", "CEO")],
        );
        WorkflowState::initial(&seed, FlowParameters::default())
    }

    #[test]
    fn structure_confirmation_follows_flag_precedence() {
        let mut state = state();
        let next = next_screen(ScreenId::ConfirmStructure, &state, &Intent::Continue)
            .expect("defined transition");
        assert_eq!(next.outcome.screen(), ScreenId::ConfirmOwners);

        state.params.replace(FlowParameters {
            ubos_found: false,
            ..FlowParameters::default()
        });
        let next = next_screen(ScreenId::ConfirmStructure, &state, &Intent::Continue)
            .expect("defined transition");
        assert_eq!(next.outcome.screen(), ScreenId::ConfirmDirectors);
        assert!(next
            .effects
            .contains(&FlowEffect::SetActiveRoster(RosterKind::Directors)));

        state.params.replace(FlowParameters {
            ubos_found: false,
            directors_found: false,
            ..FlowParameters::default()
        });
        let next = next_screen(ScreenId::ConfirmStructure, &state, &Intent::Continue)
            .expect("defined transition");
        assert_eq!(next.outcome.screen(), ScreenId::NoOwnersFound);
    }

    #[test]
    fn empty_owner_editor_switches_to_directors_explainer() {
        let mut state = state();
        state.owners.remove(&PersonId::from("owner_alice")).expect("alice");
        state.owners.remove(&PersonId::from("owner_bob")).expect("bob");

        let next = next_screen(ScreenId::EditOwners, &state, &Intent::Continue)
            .expect("defined transition");

        assert_eq!(next.outcome.screen(), ScreenId::NoOwnersTransition);
        assert_eq!(
            next.effects,
            vec![FlowEffect::PatchParameters(FlowParameterPatch {
                ubos_found: Some(false),
                ..FlowParameterPatch::default()
            })]
        );
    }

    #[test]
    fn empty_director_editor_is_blocked() {
        let mut state = state();
        state.directors.remove(&PersonId::from("director_1")).expect("director");

        let next = next_screen(ScreenId::EditDirectors, &state, &Intent::Continue)
            .expect("defined transition");

        assert_eq!(
            next.outcome,
            NavigationOutcome::Blocked {
                screen: ScreenId::EditDirectors,
                reason: BlockReason::EmptyDirectors,
            }
        );
        assert!(next.effects.is_empty());
    }

    #[test]
    fn org_tree_result_reenters_structure_routing() {
        let state = state();
        let owners = vec![Person::owner("orgtree_ubo_1", "Org Tree Owner", 60.0, OwnershipType::Indirect)];
        let next = next_screen(
            ScreenId::OrgTreeBuilder,
            &state,
            &Intent::OrgTreeResult {
                outcome: OrgTreeOutcome::OwnersIdentified { owners: owners.clone() },
            },
        )
        .expect("defined transition");
        assert_eq!(next.outcome.screen(), ScreenId::ConfirmOwners);
        assert_eq!(next.effects[0], structure_flags(true, false));
        assert_eq!(
            next.effects[1],
            FlowEffect::ReplaceRoster {
                kind: RosterKind::Owners,
                people: owners,
            }
        );

        let next = next_screen(
            ScreenId::OrgTreeBuilder,
            &state,
            &Intent::OrgTreeResult {
                outcome: OrgTreeOutcome::DirectorsOnly,
            },
        )
        .expect("defined transition");
        assert_eq!(next.outcome.screen(), ScreenId::ConfirmDirectors);
    }

    #[test]
    fn undefined_pairs_are_invalid_transitions() {
        let err = next_screen(ScreenId::Success, &state(), &Intent::Back)
            .expect_err("success has no back");
        assert_eq!(
            err,
            NavigationError::InvalidTransition {
                screen: ScreenId::Success,
                intent: "back",
            }
        );
    }

    #[test]
    fn success_variant_depends_only_on_changes_and_method() {
        use VerificationMethod::*;
        assert_eq!(success_variant(false, None), SuccessVariant::Complete);
        assert_eq!(success_variant(false, Some(DocumentUpload)), SuccessVariant::Complete);
        assert_eq!(success_variant(true, Some(ElectronicSignature)), SuccessVariant::Complete);
        assert_eq!(success_variant(true, Some(DocumentUpload)), SuccessVariant::InReview);
    }

    #[test]
    fn esign_step_only_listed_after_signed_changes() {
        let plain = success_summary(false, None, false);
        assert!(!plain.steps.iter().any(|step| step.id == "esign-attestation"));
        assert_eq!(plain.title, "Verify ownership");

        let signed = success_summary(true, Some(VerificationMethod::ElectronicSignature), true);
        assert!(signed.steps.iter().any(|step| step.id == "esign-attestation"));
        assert_eq!(signed.title, "Activate payments");

        let review = success_summary(true, Some(VerificationMethod::DocumentUpload), false);
        assert_eq!(review.heading, "Your information is in review");
        assert_eq!(review.steps.len(), 4);
    }

    #[test]
    fn deferred_intents_are_recognised() {
        assert_eq!(
            deferred_kind(ScreenId::ESignature, &Intent::Sign),
            Some(SubmissionKind::SignatureDocument)
        );
        assert_eq!(deferred_kind(ScreenId::ReviewAttestation, &Intent::Submit), None);
    }
}
