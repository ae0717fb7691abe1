//! Seed data for new sessions: public-record prefill plus the people already on
//! the account.

mod parser;

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::domain::{OwnershipType, Person, RosterKind};
use super::matching::label_people;
use super::roster::Roster;

pub use parser::parse_prefill;

/// Read-only seed consumed once per session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefillData {
    pub company_name: String,
    pub owners: Vec<Person>,
    pub directors: Vec<Person>,
    /// Owners already recorded on the account, compared when two-way matching is on.
    pub account_owners: Vec<Person>,
    pub account_directors: Vec<Person>,
}

impl PrefillData {
    pub fn new(company_name: impl Into<String>, owners: Vec<Person>, directors: Vec<Person>) -> Self {
        Self {
            company_name: company_name.into(),
            owners,
            directors,
            account_owners: Vec::new(),
            account_directors: Vec::new(),
        }
    }

    pub fn with_account(mut self, owners: Vec<Person>, directors: Vec<Person>) -> Self {
        self.account_owners = owners;
        self.account_directors = directors;
        self
    }

    /// Build a fresh roster of `kind`, classified against the account records
    /// when `two_way_match` is set.
    pub fn roster(&self, kind: RosterKind, two_way_match: bool) -> Roster {
        let (prefill, account) = match kind {
            RosterKind::Owners => (&self.owners, &self.account_owners),
            RosterKind::Directors => (&self.directors, &self.account_directors),
        };

        if two_way_match {
            Roster::seed_classified(kind, label_people(prefill, account))
        } else {
            Roster::seed(kind, prefill.clone())
        }
    }
}

pub trait PrefillSource: Send + Sync {
    fn load(&self) -> Result<PrefillData, PrefillError>;
}

/// In-memory prefill, cloned on every load.
#[derive(Debug, Clone)]
pub struct StaticPrefill {
    data: PrefillData,
}

impl StaticPrefill {
    pub fn new(data: PrefillData) -> Self {
        Self { data }
    }

    /// Built-in demo company used when no CSV prefill is configured.
    pub fn cactus_practice() -> Self {
        let owners = vec![
            Person::owner("owner_1", "Tony Stark", 45.0, OwnershipType::Direct),
            Person::owner("owner_2", "Peper Pots", 35.0, OwnershipType::Direct),
            Person::owner("owner_3", "Peter Parker", 20.0, OwnershipType::Indirect),
        ];
        let directors = vec![
            Person::director("director_1", "James Rhodes", "Chief Executive Officer"),
            Person::director("director_2", "Happy Hogan", "Chief Financial Officer"),
            Person::director("director_3", "May Parker", "Board Member"),
        ];
        let account_owners = vec![
            Person::owner("owner_1", "Tony Stark", 45.0, OwnershipType::Direct),
            Person::owner("owner_unexpected_1", "Bruce Banner", 15.0, OwnershipType::Direct),
            Person::owner("owner_unexpected_2", "Natasha Romanoff", 5.0, OwnershipType::Indirect),
        ];
        let account_directors = vec![
            Person::director("director_1", "James Rhodes", "Chief Executive Officer"),
            Person::director("director_unexpected_1", "Steve Rogers", "Operations Manager"),
        ];

        Self::new(
            PrefillData::new("Cactus Practice LLC", owners, directors)
                .with_account(account_owners, account_directors),
        )
    }
}

impl PrefillSource for StaticPrefill {
    fn load(&self) -> Result<PrefillData, PrefillError> {
        Ok(self.data.clone())
    }
}

/// Prefill read from a CSV export with
/// `roster,source,id,name,percentage,ownership_type,role` columns.
#[derive(Debug, Clone)]
pub struct CsvPrefillImporter {
    path: PathBuf,
    company_name: String,
}

impl CsvPrefillImporter {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let company_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(|stem| stem.replace(['_', '-'], " "))
            .unwrap_or_else(|| "Imported company".to_string());
        Self { path, company_name }
    }

    pub fn with_company_name(mut self, company_name: impl Into<String>) -> Self {
        self.company_name = company_name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PrefillSource for CsvPrefillImporter {
    fn load(&self) -> Result<PrefillData, PrefillError> {
        let file = File::open(&self.path)?;
        parse_prefill(file, &self.company_name)
    }
}

#[derive(Debug)]
pub enum PrefillError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
}

impl std::fmt::Display for PrefillError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefillError::Io(err) => write!(f, "failed to read prefill export: {}", err),
            PrefillError::Csv(err) => write!(f, "invalid prefill CSV data: {}", err),
            PrefillError::InvalidRow { line, reason } => {
                write!(f, "invalid prefill row on line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for PrefillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrefillError::Io(err) => Some(err),
            PrefillError::Csv(err) => Some(err),
            PrefillError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for PrefillError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PrefillError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}
