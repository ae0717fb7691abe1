use serde::Serialize;
use std::collections::BTreeSet;

use super::domain::{MatchGroup, Person, PersonId, RosterKind};

/// Bucket a roster lookup was performed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterBucket {
    Active,
    Removed,
}

/// Errors raised while editing a roster.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RosterError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("person {id} is not in the {bucket:?} set")]
    NotFound { id: PersonId, bucket: RosterBucket },
}

impl RosterError {
    pub fn is_validation(&self) -> bool {
        matches!(self, RosterError::Validation(_))
    }
}

/// Result of a successful `remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Removal {
    /// Originally supplied person moved to `removed`, restorable.
    Recoverable,
    /// User-added person dropped outright.
    Discarded,
}

/// One editable list of persons, tracked against the list it was loaded with.
///
/// `active` and `removed` never share an id, every removed id belongs to the
/// canonical set, and every `added` id is active.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    kind: RosterKind,
    canonical: BTreeSet<PersonId>,
    active: Vec<Person>,
    removed: Vec<Person>,
    added: Vec<PersonId>,
}

impl Roster {
    /// Load a roster whose canonical set is exactly `people`, all active.
    pub fn seed(kind: RosterKind, people: Vec<Person>) -> Self {
        Self::seed_partitioned(kind, people, Vec::new())
    }

    /// Load a two-way classified roster: `unexpected` persons start in `removed`.
    pub fn seed_classified(kind: RosterKind, people: Vec<Person>) -> Self {
        let (removed, active): (Vec<Person>, Vec<Person>) = people
            .into_iter()
            .partition(|person| person.match_group == Some(MatchGroup::Unexpected));
        Self::seed_partitioned(kind, active, removed)
    }

    pub fn empty(kind: RosterKind) -> Self {
        Self::seed(kind, Vec::new())
    }

    fn seed_partitioned(kind: RosterKind, active: Vec<Person>, removed: Vec<Person>) -> Self {
        let mut canonical = BTreeSet::new();
        let mut roster = Self {
            kind,
            canonical: BTreeSet::new(),
            active: Vec::with_capacity(active.len()),
            removed: Vec::with_capacity(removed.len()),
            added: Vec::new(),
        };

        for person in active {
            if canonical.insert(person.id.clone()) {
                roster.active.push(normalize(kind, person));
            }
        }
        for person in removed {
            if canonical.insert(person.id.clone()) {
                roster.removed.push(normalize(kind, person));
            }
        }

        roster.canonical = canonical;
        roster
    }

    pub fn kind(&self) -> RosterKind {
        self.kind
    }

    pub fn active(&self) -> &[Person] {
        &self.active
    }

    pub fn removed(&self) -> &[Person] {
        &self.removed
    }

    pub fn added_ids(&self) -> &[PersonId] {
        &self.added
    }

    pub fn is_original(&self, id: &PersonId) -> bool {
        self.canonical.contains(id)
    }

    /// Take a person out of `active`. Originals become recoverable; user-added
    /// persons are discarded.
    pub fn remove(&mut self, id: &PersonId) -> Result<Removal, RosterError> {
        let position = self
            .active
            .iter()
            .position(|person| &person.id == id)
            .ok_or_else(|| RosterError::NotFound {
                id: id.clone(),
                bucket: RosterBucket::Active,
            })?;

        let person = self.active.remove(position);

        if let Some(added_at) = self.added.iter().position(|added| added == id) {
            self.added.remove(added_at);
            return Ok(Removal::Discarded);
        }

        if self.canonical.contains(id) {
            self.removed.push(person);
            Ok(Removal::Recoverable)
        } else {
            Ok(Removal::Discarded)
        }
    }

    /// Move a person from `removed` back to `active`.
    pub fn restore(&mut self, id: &PersonId) -> Result<&Person, RosterError> {
        let position = self
            .removed
            .iter()
            .position(|person| &person.id == id)
            .ok_or_else(|| RosterError::NotFound {
                id: id.clone(),
                bucket: RosterBucket::Removed,
            })?;

        let person = self.removed.remove(position);
        self.active.push(person);
        Ok(&self.active[self.active.len() - 1])
    }

    /// Append a user-entered person to `active` and record it as new.
    pub fn add(&mut self, person: Person) -> Result<&Person, RosterError> {
        if person.name.trim().is_empty() {
            return Err(RosterError::Validation("name must not be empty".to_string()));
        }
        if self.contains(&person.id) || self.canonical.contains(&person.id) {
            return Err(RosterError::Validation(format!(
                "person {} is already part of the {} roster",
                person.id,
                self.kind.label()
            )));
        }
        if self.kind == RosterKind::Owners
            && !(0.0..=100.0).contains(&person.ownership_percentage)
        {
            return Err(RosterError::Validation(format!(
                "ownership percentage must be between 0 and 100, found {}",
                person.ownership_percentage
            )));
        }

        let mut person = normalize(self.kind, person);
        person.name = person.name.trim().to_string();
        person.match_group = None;

        self.added.push(person.id.clone());
        self.active.push(person);
        Ok(&self.active[self.active.len() - 1])
    }

    /// True when the roster diverges from the list it was loaded with.
    pub fn has_changes(&self) -> bool {
        !self.removed.is_empty() || !self.added.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    fn contains(&self, id: &PersonId) -> bool {
        self.active.iter().any(|person| &person.id == id)
            || self.removed.iter().any(|person| &person.id == id)
    }
}

fn normalize(kind: RosterKind, mut person: Person) -> Person {
    if kind == RosterKind::Directors {
        person.ownership_percentage = 0.0;
    }
    person
}

/// Serializable snapshot of a roster for views.
#[derive(Debug, Clone, Serialize)]
pub struct RosterView {
    pub kind: RosterKind,
    pub active: Vec<Person>,
    pub removed: Vec<Person>,
    pub added: Vec<PersonId>,
    pub has_changes: bool,
    pub is_empty: bool,
}

impl From<&Roster> for RosterView {
    fn from(roster: &Roster) -> Self {
        Self {
            kind: roster.kind,
            active: roster.active.clone(),
            removed: roster.removed.clone(),
            added: roster.added.clone(),
            has_changes: roster.has_changes(),
            is_empty: roster.is_empty(),
        }
    }
}
