use serde::Serialize;

use super::domain::DashboardTask;
use super::params::FlowParameters;

/// Progress of one regulatory requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementState {
    Pending,
    ManualReviewPending,
    Complete,
}

impl RequirementState {
    pub const fn is_satisfied(self) -> bool {
        matches!(self, Self::Complete)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ManualReviewPending => "manual-review-pending",
            Self::Complete => "complete",
        }
    }
}

/// Read-only evaluation of the business -> ownership dependency.
#[derive(Debug, Clone, Copy)]
pub struct RequirementTracker<'a> {
    params: &'a FlowParameters,
    ownership_in_review: bool,
}

impl<'a> RequirementTracker<'a> {
    pub fn new(params: &'a FlowParameters, ownership_in_review: bool) -> Self {
        Self {
            params,
            ownership_in_review,
        }
    }

    pub fn business(&self) -> RequirementState {
        let params = self.params;
        if params.business_requirement_complete {
            return RequirementState::Complete;
        }
        if !params.business_verification_complete {
            return RequirementState::Pending;
        }
        if params.business_verification_needs_manual_review && !params.manual_review_complete {
            RequirementState::ManualReviewPending
        } else {
            RequirementState::Complete
        }
    }

    pub fn ownership(&self) -> RequirementState {
        if self.params.ownership_requirement_complete {
            RequirementState::Complete
        } else if self.ownership_in_review {
            RequirementState::ManualReviewPending
        } else {
            RequirementState::Pending
        }
    }

    pub fn should_show_business_task(&self) -> bool {
        !self.business().is_satisfied()
    }

    /// Ownership never surfaces before the business requirement is satisfied.
    pub fn should_show_ownership_task(&self) -> bool {
        self.business().is_satisfied() && !self.ownership().is_satisfied()
    }

    pub fn visible_tasks(&self) -> Vec<DashboardTask> {
        let mut tasks = Vec::with_capacity(1);
        if self.should_show_business_task() {
            tasks.push(DashboardTask::BusinessVerification);
        }
        if self.should_show_ownership_task() {
            tasks.push(DashboardTask::OwnershipVerification);
        }
        tasks
    }

    pub fn is_task_visible(&self, task: DashboardTask) -> bool {
        match task {
            DashboardTask::BusinessVerification => self.should_show_business_task(),
            DashboardTask::OwnershipVerification => self.should_show_ownership_task(),
        }
    }

    pub fn summary(&self) -> RequirementSummary {
        RequirementSummary {
            business: self.business(),
            ownership: self.ownership(),
            visible_tasks: self.visible_tasks(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementSummary {
    pub business: RequirementState,
    pub ownership: RequirementState,
    pub visible_tasks: Vec<DashboardTask>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> FlowParameters {
        FlowParameters {
            business_verification_complete: false,
            ..FlowParameters::default()
        }
    }

    #[test]
    fn business_task_blocks_ownership_task() {
        let mut params = params();
        params.ownership_requirement_complete = true;
        let tracker = RequirementTracker::new(&params, false);

        assert_eq!(tracker.business(), RequirementState::Pending);
        assert_eq!(tracker.visible_tasks(), vec![DashboardTask::BusinessVerification]);
        assert!(!tracker.should_show_ownership_task());
    }

    #[test]
    fn manual_review_holds_business_requirement_open() {
        let mut params = params();
        params.business_verification_complete = true;
        params.business_verification_needs_manual_review = true;

        let tracker = RequirementTracker::new(&params, false);
        assert_eq!(tracker.business(), RequirementState::ManualReviewPending);
        assert!(tracker.should_show_business_task());

        params.manual_review_complete = true;
        let tracker = RequirementTracker::new(&params, false);
        assert_eq!(tracker.business(), RequirementState::Complete);
        assert_eq!(tracker.visible_tasks(), vec![DashboardTask::OwnershipVerification]);
    }

    #[test]
    fn ownership_in_review_is_still_unsatisfied() {
        let params = FlowParameters::default();
        let tracker = RequirementTracker::new(&params, true);
        assert_eq!(tracker.ownership(), RequirementState::ManualReviewPending);
        assert!(tracker.should_show_ownership_task());
    }

    #[test]
    fn both_requirements_complete_hide_every_task() {
        let params = FlowParameters {
            ownership_requirement_complete: true,
            business_requirement_complete: true,
            ..FlowParameters::default()
        };
        let tracker = RequirementTracker::new(&params, false);
        assert!(tracker.visible_tasks().is_empty());
    }
}
