use clap::{Args, ValueEnum};
use ownership_flow::error::AppError;
use ownership_flow::workflows::ownership::{
    DashboardTask, FlowError, FlowParameters, Intent, OwnershipType, Person, PersonId,
    PrefillData, RosterKind, ScreenId, SessionServiceError, TransitionPolicy, VerificationMethod,
    VerificationOrchestrator,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Run a single scenario instead of the full set.
    #[arg(long, value_enum)]
    pub(crate) scenario: Option<DemoScenario>,
    /// Print the roster contents after each scenario.
    #[arg(long)]
    pub(crate) show_rosters: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DemoScenario {
    /// Owners confirmed without edits.
    Unchanged,
    /// One owner removed, verified by document upload.
    RemovedOwner,
    /// Every owner removed, falling back to directors.
    NoOwners,
    /// Prefill and account records reconciled on load.
    TwoWayMatch,
    /// Ownership hidden until the business requirement is met.
    RequirementGating,
}

impl DemoScenario {
    const ALL: [Self; 5] = [
        Self::Unchanged,
        Self::RemovedOwner,
        Self::NoOwners,
        Self::TwoWayMatch,
        Self::RequirementGating,
    ];

    fn title(self) -> &'static str {
        match self {
            Self::Unchanged => "Unchanged owners confirm straight to success",
            Self::RemovedOwner => "Removing an owner routes document upload into review",
            Self::NoOwners => "Emptying the owners list switches to directors",
            Self::TwoWayMatch => "Two-way match parks account-only owners",
            Self::RequirementGating => "Ownership waits for the business requirement",
        }
    }
}

/// Screens visited by one scripted walkthrough plus observations worth printing.
#[derive(Debug)]
pub(crate) struct DemoReport {
    pub(crate) scenario: DemoScenario,
    pub(crate) trail: Vec<ScreenId>,
    pub(crate) notes: Vec<String>,
    pub(crate) orchestrator: VerificationOrchestrator,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let scenarios = match args.scenario {
        Some(scenario) => vec![scenario],
        None => DemoScenario::ALL.to_vec(),
    };

    println!("Ownership verification demo");
    for scenario in scenarios {
        let report = run_scenario(scenario).map_err(SessionServiceError::from)?;
        render_report(&report, args.show_rosters);
    }
    Ok(())
}

pub(crate) fn run_scenario(scenario: DemoScenario) -> Result<DemoReport, FlowError> {
    let mut walk = match scenario {
        DemoScenario::TwoWayMatch => Walk::new(
            two_way_seed(),
            FlowParameters {
                two_way_match_enabled: true,
                ..FlowParameters::default()
            },
        ),
        DemoScenario::RequirementGating => Walk::new(
            alice_bob_seed(),
            FlowParameters {
                business_verification_complete: false,
                ownership_requirement_complete: true,
                ..FlowParameters::default()
            },
        ),
        _ => Walk::new(alice_bob_seed(), FlowParameters::default()),
    };

    match scenario {
        DemoScenario::Unchanged => {
            walk.open_structure_result()?;
            walk.step(Intent::Continue)?;
            walk.note_success();
            walk.step(Intent::Finish)?;
        }
        DemoScenario::RemovedOwner => {
            walk.open_structure_result()?;
            walk.step(Intent::Edit)?;
            walk.orchestrator.remove(&PersonId::from("owner_alice"))?;
            walk.notes.push("removed Alice".to_string());
            walk.step(Intent::Continue)?;
            walk.step(Intent::ChooseMethod {
                method: VerificationMethod::DocumentUpload,
            })?;
            walk.step(Intent::Continue)?;
            walk.note_success();
            walk.step(Intent::Finish)?;
        }
        DemoScenario::NoOwners => {
            walk.open_structure_result()?;
            walk.step(Intent::Edit)?;
            walk.orchestrator.remove(&PersonId::from("owner_alice"))?;
            walk.orchestrator.remove(&PersonId::from("owner_bob"))?;
            walk.notes.push("removed Alice and Bob".to_string());
            walk.step(Intent::Continue)?;
            let params = *walk.orchestrator.state().params();
            walk.notes.push(format!(
                "ubos_found={} directors_found={}",
                params.ubos_found, params.directors_found
            ));
            walk.step(Intent::Continue)?;
        }
        DemoScenario::TwoWayMatch => {
            let owners = &walk.orchestrator.state().owners;
            let active: Vec<String> = owners
                .active()
                .iter()
                .map(|person| format!("{} ({})", person.name, group_label(person)))
                .collect();
            let removed: Vec<String> = owners
                .removed()
                .iter()
                .map(|person| format!("{} ({})", person.name, group_label(person)))
                .collect();
            walk.notes.push(format!("active: {}", active.join(", ")));
            walk.notes.push(format!("removed: {}", removed.join(", ")));
            walk.open_structure_result()?;
        }
        DemoScenario::RequirementGating => {
            let tasks = walk.orchestrator.view().requirements.visible_tasks;
            walk.notes.push(format!("visible tasks: {tasks:?}"));
            walk.step(Intent::OpenTask {
                task: DashboardTask::OwnershipVerification,
            })?;
        }
    }

    Ok(DemoReport {
        scenario,
        trail: walk.trail,
        notes: walk.notes,
        orchestrator: walk.orchestrator,
    })
}

struct Walk {
    orchestrator: VerificationOrchestrator,
    trail: Vec<ScreenId>,
    notes: Vec<String>,
}

impl Walk {
    fn new(seed: PrefillData, params: FlowParameters) -> Self {
        let orchestrator = VerificationOrchestrator::new(seed, params, TransitionPolicy::Strict);
        let trail = vec![orchestrator.screen()];
        Self {
            orchestrator,
            trail,
            notes: Vec::new(),
        }
    }

    fn step(&mut self, intent: Intent) -> Result<(), FlowError> {
        let outcome = self.orchestrator.apply(&intent)?;
        if outcome.is_blocked() {
            self.notes
                .push(format!("{} blocked on {}", intent.name(), outcome.screen()));
        } else {
            self.trail.push(outcome.screen());
        }
        Ok(())
    }

    fn open_structure_result(&mut self) -> Result<(), FlowError> {
        self.step(Intent::OpenTask {
            task: DashboardTask::OwnershipVerification,
        })?;
        self.step(Intent::Continue)?;
        self.step(Intent::Continue)
    }

    fn note_success(&mut self) {
        if let Some(success) = self.orchestrator.view().success {
            let steps: Vec<&str> = success.steps.iter().map(|step| step.label).collect();
            self.notes.push(format!(
                "success: {} [{}]",
                success.heading,
                steps.join(" > ")
            ));
        }
    }
}

fn render_report(report: &DemoReport, show_rosters: bool) {
    println!("\n{}", report.scenario.title());
    let trail: Vec<&str> = report.trail.iter().map(|screen| screen.as_str()).collect();
    println!("- screens: {}", trail.join(" -> "));
    for note in &report.notes {
        println!("- {note}");
    }

    let requirements = report.orchestrator.state().requirements();
    println!(
        "- requirements: business {} | ownership {}",
        requirements.business().label(),
        requirements.ownership().label()
    );

    if show_rosters {
        for kind in [RosterKind::Owners, RosterKind::Directors] {
            let roster = report.orchestrator.state().roster(kind);
            let names: Vec<&str> = roster.active().iter().map(|p| p.name.as_str()).collect();
            println!("  {}: {}", kind.label(), names.join(", "));
        }
    }
}

fn group_label(person: &Person) -> &'static str {
    person
        .match_group
        .map(|group| group.label())
        .unwrap_or("unclassified")
}

fn alice_bob_seed() -> PrefillData {
    PrefillData::new(
        "Acme Dental LLC",
        vec![
            Person::owner("owner_alice", "Alice", 60.0, OwnershipType::Direct),
            Person::owner("owner_bob", "Bob", 40.0, OwnershipType::Direct),
        ],
        vec![Person::director(
            "director_1",
            "James Rhodes",
            "Chief Executive Officer",
        )],
    )
}

fn two_way_seed() -> PrefillData {
    let anna = Person::owner("A", "Anna", 50.0, OwnershipType::Direct);
    let ben = Person::owner("B", "Ben", 30.0, OwnershipType::Direct);
    let cleo = Person::owner("C", "Cleo", 20.0, OwnershipType::Indirect);
    let directors = vec![Person::director(
        "director_1",
        "James Rhodes",
        "Chief Executive Officer",
    )];
    PrefillData::new("Two Way LLC", vec![anna.clone(), ben], directors.clone())
        .with_account(vec![anna, cleo], directors)
}
