use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier shared between prefill records and in-account records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipType {
    Direct,
    Indirect,
}

impl OwnershipType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Indirect => "indirect",
        }
    }
}

/// Two-way match bucket assigned when prefill and in-account data are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchGroup {
    ExistingMatch,
    NewMatch,
    Unexpected,
}

impl MatchGroup {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ExistingMatch => "existing-match",
            Self::NewMatch => "new-match",
            Self::Unexpected => "unexpected",
        }
    }
}

/// Beneficial owner or director record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    /// Always `0.0` for members of the directors roster.
    pub ownership_percentage: f32,
    pub ownership_type: OwnershipType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_existing_in_account: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_group: Option<MatchGroup>,
}

impl Person {
    pub fn owner(
        id: impl Into<String>,
        name: impl Into<String>,
        ownership_percentage: f32,
        ownership_type: OwnershipType,
    ) -> Self {
        Self {
            id: PersonId(id.into()),
            name: name.into(),
            ownership_percentage,
            ownership_type,
            role: None,
            is_existing_in_account: None,
            match_group: None,
        }
    }

    pub fn director(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: PersonId(id.into()),
            name: name.into(),
            ownership_percentage: 0.0,
            ownership_type: OwnershipType::Direct,
            role: Some(role.into()),
            is_existing_in_account: None,
            match_group: None,
        }
    }
}

/// Which roster the flow is currently operating on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RosterKind {
    #[default]
    Owners,
    Directors,
}

impl RosterKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Owners => "beneficial owners",
            Self::Directors => "directors",
        }
    }

    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Owners => "owner",
            Self::Directors => "director",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationMethod {
    ElectronicSignature,
    DocumentUpload,
}

impl VerificationMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ElectronicSignature => "electronic-signature",
            Self::DocumentUpload => "document-upload",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LegalEntityMatch {
    #[default]
    Match,
    NoResponse,
    Mismatch,
}

/// Answer to the company-structure questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureComplexity {
    Simple,
    Complex,
}

/// Externally decided result of submitting business details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessCheckOutcome {
    Passed,
    ManualReviewRequired,
}

/// Result of the org-tree analysis placeholder flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum OrgTreeOutcome {
    OwnersIdentified { owners: Vec<Person> },
    DirectorsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardTask {
    BusinessVerification,
    OwnershipVerification,
}

/// Every screen the router can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenId {
    #[default]
    Dashboard,
    BusinessVerification,
    BusinessDocumentUpload,
    BusinessReview,
    BusinessSuccess,
    VerifyOwnership,
    ConfirmStructure,
    EditBusinessStructure,
    ConfirmOwners,
    EditOwners,
    ConfirmDirectors,
    EditDirectors,
    NoOwnersFound,
    NoOwnersTransition,
    CompanyInformation,
    OrgTreeBuilder,
    VerificationMethod,
    ESignature,
    ReviewAttestation,
    DocumentReviewStatus,
    Success,
}

impl ScreenId {
    pub const ALL: [Self; 21] = [
        Self::Dashboard,
        Self::BusinessVerification,
        Self::BusinessDocumentUpload,
        Self::BusinessReview,
        Self::BusinessSuccess,
        Self::VerifyOwnership,
        Self::ConfirmStructure,
        Self::EditBusinessStructure,
        Self::ConfirmOwners,
        Self::EditOwners,
        Self::ConfirmDirectors,
        Self::EditDirectors,
        Self::NoOwnersFound,
        Self::NoOwnersTransition,
        Self::CompanyInformation,
        Self::OrgTreeBuilder,
        Self::VerificationMethod,
        Self::ESignature,
        Self::ReviewAttestation,
        Self::DocumentReviewStatus,
        Self::Success,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::BusinessVerification => "business-verification",
            Self::BusinessDocumentUpload => "business-document-upload",
            Self::BusinessReview => "business-review",
            Self::BusinessSuccess => "business-success",
            Self::VerifyOwnership => "verify-ownership",
            Self::ConfirmStructure => "confirm-structure",
            Self::EditBusinessStructure => "edit-business-structure",
            Self::ConfirmOwners => "confirm-owners",
            Self::EditOwners => "edit-owners",
            Self::ConfirmDirectors => "confirm-directors",
            Self::EditDirectors => "edit-directors",
            Self::NoOwnersFound => "no-owners-found",
            Self::NoOwnersTransition => "no-owners-transition",
            Self::CompanyInformation => "company-information",
            Self::OrgTreeBuilder => "org-tree-builder",
            Self::VerificationMethod => "verification-method",
            Self::ESignature => "e-signature",
            Self::ReviewAttestation => "review-attestation",
            Self::DocumentReviewStatus => "document-review-status",
            Self::Success => "success",
        }
    }

    /// Editor screen for a roster.
    pub const fn editor(kind: RosterKind) -> Self {
        match kind {
            RosterKind::Owners => Self::EditOwners,
            RosterKind::Directors => Self::EditDirectors,
        }
    }

    /// Confirmation screen for a roster.
    pub const fn confirmation(kind: RosterKind) -> Self {
        match kind {
            RosterKind::Owners => Self::ConfirmOwners,
            RosterKind::Directors => Self::ConfirmDirectors,
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown screen id '{0}'")]
pub struct UnknownScreen(pub String);

impl FromStr for ScreenId {
    type Err = UnknownScreen;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|screen| screen.as_str() == trimmed)
            .ok_or_else(|| UnknownScreen(trimmed.to_string()))
    }
}

/// User action reported by a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "kebab-case")]
pub enum Intent {
    Continue,
    Back,
    Edit,
    Submit,
    Sign,
    Cancel,
    Finish,
    AcceptNoOwners,
    AddOwners,
    OpenTask { task: DashboardTask },
    BusinessCheck { outcome: BusinessCheckOutcome },
    SelectComplexity { complexity: StructureComplexity },
    OrgTreeResult { outcome: OrgTreeOutcome },
    ChooseMethod { method: VerificationMethod },
}

impl Intent {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Back => "back",
            Self::Edit => "edit",
            Self::Submit => "submit",
            Self::Sign => "sign",
            Self::Cancel => "cancel",
            Self::Finish => "finish",
            Self::AcceptNoOwners => "accept-no-owners",
            Self::AddOwners => "add-owners",
            Self::OpenTask { .. } => "open-task",
            Self::BusinessCheck { .. } => "business-check",
            Self::SelectComplexity { .. } => "select-complexity",
            Self::OrgTreeResult { .. } => "org-tree-result",
            Self::ChooseMethod { .. } => "choose-method",
        }
    }
}
