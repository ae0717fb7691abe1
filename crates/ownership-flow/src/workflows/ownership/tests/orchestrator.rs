use super::common::*;
use crate::workflows::ownership::{
    BusinessCheckOutcome, DashboardTask, FlowError, FlowParameterPatch, FlowParameters, Intent,
    LegalEntityMatch, NavigationError, OrgTreeOutcome, OwnershipType, Person, PersonDraft,
    PersonId, RequirementState, RosterBucket, RosterError, RosterKind, ScreenId,
    StaticPrefill, StructureComplexity, SubmissionKind, SuccessVariant, TransitionPolicy,
    UnknownScreen, VerificationMethod, VerificationOrchestrator,
};
use crate::workflows::ownership::PrefillSource;

#[test]
fn submissions_reject_reentry_until_resolved() {
    let mut flow = orchestrator();
    walk_to_structure_result(&mut flow);
    flow.apply(&Intent::Edit).expect("edit");
    flow.remove(&PersonId::from("owner_bob")).expect("remove bob");
    drive(
        &mut flow,
        &[
            Intent::Continue,
            Intent::ChooseMethod {
                method: VerificationMethod::ElectronicSignature,
            },
        ],
    );
    assert_eq!(flow.screen(), ScreenId::ESignature);

    let pending = flow.begin_submission(&Intent::Sign).expect("sign starts");
    assert_eq!(pending.kind, SubmissionKind::SignatureDocument);
    assert!(flow.is_submission_pending());

    assert_eq!(
        flow.begin_submission(&Intent::Sign).expect_err("already pending"),
        FlowError::SubmissionPending(SubmissionKind::SignatureDocument)
    );
    assert!(matches!(
        flow.restore(&PersonId::from("owner_bob")),
        Err(FlowError::SubmissionPending(_))
    ));
    assert!(matches!(flow.reset_state(), Err(FlowError::SubmissionPending(_))));
    assert_eq!(flow.screen(), ScreenId::ESignature);

    advanced(
        flow.resolve_submission().expect("resolves"),
        ScreenId::ReviewAttestation,
    );
    assert_eq!(
        flow.resolve_submission().expect_err("nothing pending"),
        FlowError::NoPendingSubmission
    );

    advanced(flow.apply(&Intent::Submit).expect("attest"), ScreenId::Success);
    let success = flow.view().success.expect("summary");
    assert_eq!(success.variant, SuccessVariant::Complete);
    assert!(success.steps.iter().any(|step| step.id == "esign-attestation"));
}

#[test]
fn begin_submission_requires_a_deferred_intent() {
    let mut flow = orchestrator();
    let err = flow
        .begin_submission(&Intent::Continue)
        .expect_err("continue is immediate");
    assert_eq!(err, FlowError::NotDeferred("continue"));
    assert!(!flow.is_submission_pending());
}

#[test]
fn strict_policy_surfaces_invalid_transitions() {
    let mut flow = orchestrator();
    let err = flow.apply(&Intent::Sign).expect_err("dashboard cannot sign");
    assert_eq!(
        err,
        FlowError::Navigation(NavigationError::InvalidTransition {
            screen: ScreenId::Dashboard,
            intent: "sign",
        })
    );
}

#[test]
fn lenient_policy_degrades_to_dashboard() {
    let mut flow = VerificationOrchestrator::new(
        alice_bob_seed(),
        FlowParameters::default(),
        TransitionPolicy::Lenient,
    );
    walk_to_structure_result(&mut flow);

    advanced(
        flow.apply(&Intent::Sign).expect("degraded"),
        ScreenId::Dashboard,
    );
}

#[test]
fn unknown_screens_are_rejected() {
    let mut flow = orchestrator();
    let err = flow
        .apply_on("kyb-legacy", &Intent::Continue)
        .expect_err("unknown screen");
    assert_eq!(
        err,
        FlowError::UnknownScreen(UnknownScreen("kyb-legacy".to_string()))
    );
}

#[test]
fn intents_from_another_screen_are_refused() {
    let mut flow = orchestrator_with(FlowParameters {
        business_verification_complete: false,
        ..FlowParameters::default()
    });
    let before = flow.state().clone();

    let err = flow
        .apply_on("success", &Intent::Finish)
        .expect_err("session is on the dashboard");
    assert_eq!(
        err,
        FlowError::StaleScreen {
            requested: ScreenId::Success,
            current: ScreenId::Dashboard,
        }
    );
    assert_eq!(flow.state().requirements().ownership(), RequirementState::Pending);

    let err = flow
        .apply_on("business-success", &Intent::Continue)
        .expect_err("business check never ran");
    assert!(matches!(err, FlowError::StaleScreen { .. }));
    assert_eq!(flow.screen(), ScreenId::Dashboard);
    assert_eq!(flow.state(), &before);
}

#[test]
fn intents_pinned_to_the_current_screen_apply() {
    let mut flow = orchestrator();
    advanced(
        flow.apply_on("dashboard", &open_ownership_task())
            .expect("dashboard is current"),
        ScreenId::VerifyOwnership,
    );
}

#[test]
fn missing_people_leave_state_untouched() {
    let mut flow = orchestrator();
    let before = flow.state().clone();

    let err = flow
        .restore(&PersonId::from("owner_alice"))
        .expect_err("alice was never removed");
    assert!(err.is_not_found());
    assert_eq!(
        err,
        FlowError::Roster(RosterError::NotFound {
            id: PersonId::from("owner_alice"),
            bucket: RosterBucket::Removed,
        })
    );
    assert_eq!(flow.state(), &before);
}

#[test]
fn added_people_get_sequential_ids() {
    let mut flow = orchestrator();
    walk_to_structure_result(&mut flow);

    let carol = flow.add(PersonDraft::owner("Carol", 15.0)).expect("valid");
    let dana = flow.add(PersonDraft::owner("  Dana ", 5.0)).expect("valid");
    assert_eq!(carol.id, PersonId::from("new_owner_1"));
    assert_eq!(dana.id, PersonId::from("new_owner_2"));
    assert_eq!(dana.name, "Dana");
    assert_eq!(flow.state().owners.added_ids().len(), 2);

    let err = flow.add(PersonDraft::owner("", 5.0)).expect_err("blank");
    assert!(err.is_validation());

    flow.remove(&carol.id).expect("carol active");
    assert!(flow.state().owners.removed().is_empty());
}

#[test]
fn accepting_no_owners_starts_an_empty_directors_flow() {
    let mut flow = orchestrator_with(FlowParameters {
        ubos_found: false,
        directors_found: false,
        ..FlowParameters::default()
    });
    assert_eq!(walk_to_structure_result(&mut flow), ScreenId::NoOwnersFound);

    let trail = drive(&mut flow, &[Intent::AcceptNoOwners, Intent::Continue]);
    assert_eq!(trail, vec![ScreenId::NoOwnersTransition, ScreenId::EditDirectors]);
    assert!(flow.state().directors.is_empty());
    assert!(flow.is_directors_flow_active());

    assert!(flow.apply(&Intent::Continue).expect("blocked").is_blocked());

    let director = flow
        .add(PersonDraft::director("Maria Hill", "Secretary"))
        .expect("valid director");
    assert_eq!(director.id, PersonId::from("new_director_1"));
    assert_eq!(director.ownership_percentage, 0.0);

    advanced(
        flow.apply(&Intent::Continue).expect("continue"),
        ScreenId::VerificationMethod,
    );
    advanced(flow.apply(&Intent::Back).expect("back"), ScreenId::EditDirectors);
}

#[test]
fn complex_structure_reenters_with_org_tree_owners() {
    let mut flow = orchestrator_with(FlowParameters {
        ubos_found: false,
        directors_found: false,
        ..FlowParameters::default()
    });
    walk_to_structure_result(&mut flow);

    let org_tree_owners = vec![
        Person::owner("orgtree_ubo_1", "Holding Partner", 60.0, OwnershipType::Indirect),
        Person::owner("orgtree_ubo_2", "Trust Partner", 40.0, OwnershipType::Indirect),
    ];
    let trail = drive(
        &mut flow,
        &[
            Intent::AddOwners,
            Intent::SelectComplexity {
                complexity: StructureComplexity::Complex,
            },
            Intent::OrgTreeResult {
                outcome: OrgTreeOutcome::OwnersIdentified {
                    owners: org_tree_owners,
                },
            },
        ],
    );
    assert_eq!(
        trail,
        vec![
            ScreenId::CompanyInformation,
            ScreenId::OrgTreeBuilder,
            ScreenId::ConfirmOwners
        ]
    );
    assert!(flow.state().params().ubos_found);
    assert!(!flow.state().params().directors_found);
    assert_eq!(flow.state().owners.active().len(), 2);
    assert!(!flow.has_changes());
}

#[test]
fn simple_structure_opens_an_empty_owner_editor() {
    let mut flow = orchestrator_with(FlowParameters {
        ubos_found: false,
        directors_found: false,
        ..FlowParameters::default()
    });
    walk_to_structure_result(&mut flow);

    let trail = drive(
        &mut flow,
        &[
            Intent::AddOwners,
            Intent::SelectComplexity {
                complexity: StructureComplexity::Simple,
            },
        ],
    );
    assert_eq!(trail[1], ScreenId::EditOwners);
    assert!(flow.state().owners.is_empty());

    flow.add(PersonDraft::owner("Sole Owner", 100.0)).expect("valid");
    advanced(
        flow.apply(&Intent::Continue).expect("continue"),
        ScreenId::VerificationMethod,
    );
}

#[test]
fn directors_flow_can_switch_to_owners() {
    let mut flow = orchestrator_with(FlowParameters {
        ubos_found: false,
        ..FlowParameters::default()
    });
    walk_to_structure_result(&mut flow);

    advanced(
        flow.apply(&Intent::AddOwners).expect("switch"),
        ScreenId::EditOwners,
    );
    assert!(!flow.is_directors_flow_active());
    assert!(flow.state().params().ubos_found);
    assert!(!flow.state().params().directors_found);
}

#[test]
fn business_manual_review_gates_ownership() {
    let mut flow = orchestrator_with(FlowParameters {
        business_verification_complete: false,
        ..FlowParameters::default()
    });

    let trail = drive(
        &mut flow,
        &[
            Intent::OpenTask {
                task: DashboardTask::BusinessVerification,
            },
            Intent::BusinessCheck {
                outcome: BusinessCheckOutcome::ManualReviewRequired,
            },
            Intent::Submit,
            Intent::Continue,
        ],
    );
    assert_eq!(
        trail,
        vec![
            ScreenId::BusinessVerification,
            ScreenId::BusinessDocumentUpload,
            ScreenId::BusinessReview,
            ScreenId::Dashboard
        ]
    );
    assert_eq!(
        flow.state().requirements().business(),
        RequirementState::ManualReviewPending
    );
    assert!(!flow.should_show_ownership_task());

    assert_eq!(
        flow.complete_manual_review().expect("review pending"),
        RequirementState::Complete
    );
    assert!(flow.should_show_ownership_task());
    assert!(!flow.should_show_business_task());
}

#[test]
fn passing_business_check_leads_into_ownership() {
    let mut flow = orchestrator_with(FlowParameters {
        business_verification_complete: false,
        ..FlowParameters::default()
    });
    assert_eq!(
        flow.complete_manual_review().expect_err("no review"),
        FlowError::NoManualReviewPending
    );

    let trail = drive(
        &mut flow,
        &[
            Intent::OpenTask {
                task: DashboardTask::BusinessVerification,
            },
            Intent::BusinessCheck {
                outcome: BusinessCheckOutcome::Passed,
            },
            Intent::Continue,
        ],
    );
    assert_eq!(trail[1], ScreenId::BusinessSuccess);
    assert_eq!(trail[2], ScreenId::VerifyOwnership);
    assert_eq!(
        flow.mark_business_requirement_complete().expect("idle"),
        RequirementState::Complete
    );
}

#[test]
fn in_review_ownership_completes_on_external_signal() {
    let mut flow = orchestrator();
    walk_to_structure_result(&mut flow);
    flow.apply(&Intent::Edit).expect("edit");
    flow.remove(&PersonId::from("owner_alice")).expect("remove");
    drive(
        &mut flow,
        &[
            Intent::Continue,
            Intent::ChooseMethod {
                method: VerificationMethod::DocumentUpload,
            },
            Intent::Continue,
            Intent::Finish,
        ],
    );
    assert!(flow.should_show_ownership_task());

    assert_eq!(
        flow.mark_ownership_requirement_complete().expect("idle"),
        RequirementState::Complete
    );
    assert!(!flow.should_show_ownership_task());
    assert!(flow.view().requirements.visible_tasks.is_empty());
}

#[test]
fn mismatch_warning_only_on_structure_confirmation() {
    let mut flow = orchestrator_with(FlowParameters {
        legal_entity_match: LegalEntityMatch::Mismatch,
        ..FlowParameters::default()
    });
    assert!(!flow.view().affordances.data_mismatch_warning);

    drive(&mut flow, &[open_ownership_task(), Intent::Continue]);
    assert_eq!(flow.screen(), ScreenId::ConfirmStructure);
    assert!(flow.view().affordances.data_mismatch_warning);
}

#[test]
fn toggling_two_way_match_reloads_rosters() {
    let seed = StaticPrefill::cactus_practice().load().expect("static prefill");
    let mut flow =
        VerificationOrchestrator::new(seed, FlowParameters::default(), TransitionPolicy::Strict);
    assert!(!flow.has_changes());

    let params = flow
        .set_flow_parameters(&FlowParameterPatch {
            two_way_match_enabled: Some(true),
            ..FlowParameterPatch::default()
        })
        .expect("idle");
    assert!(params.two_way_match_enabled);

    let removed: Vec<&str> = flow
        .state()
        .owners
        .removed()
        .iter()
        .map(|person| person.name.as_str())
        .collect();
    assert_eq!(removed, vec!["Bruce Banner", "Natasha Romanoff"]);
    assert!(flow.has_changes());
    assert_eq!(flow.state().roster(RosterKind::Directors).removed().len(), 1);
}
