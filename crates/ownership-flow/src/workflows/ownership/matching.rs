//! Two-way comparison of public-record prefill data against the people already
//! on the account.

use serde::Serialize;
use std::collections::BTreeSet;

use super::domain::{MatchGroup, Person, PersonId};

/// Partition of every id seen in either data set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchClassification {
    pub existing_match: BTreeSet<PersonId>,
    pub new_match: BTreeSet<PersonId>,
    pub unexpected: BTreeSet<PersonId>,
}

impl MatchClassification {
    /// Group for an id, or `None` for ids in neither set (manual additions).
    pub fn group_of(&self, id: &PersonId) -> Option<MatchGroup> {
        if self.existing_match.contains(id) {
            Some(MatchGroup::ExistingMatch)
        } else if self.new_match.contains(id) {
            Some(MatchGroup::NewMatch)
        } else if self.unexpected.contains(id) {
            Some(MatchGroup::Unexpected)
        } else {
            None
        }
    }
}

pub fn classify<'a, P, A>(prefill_ids: P, account_ids: A) -> MatchClassification
where
    P: IntoIterator<Item = &'a PersonId>,
    A: IntoIterator<Item = &'a PersonId>,
{
    let prefill: BTreeSet<&PersonId> = prefill_ids.into_iter().collect();
    let account: BTreeSet<&PersonId> = account_ids.into_iter().collect();

    let mut classification = MatchClassification::default();
    for id in prefill.union(&account) {
        match (prefill.contains(id), account.contains(id)) {
            (true, true) => classification.existing_match.insert((*id).clone()),
            (true, false) => classification.new_match.insert((*id).clone()),
            (false, true) => classification.unexpected.insert((*id).clone()),
            (false, false) => false,
        };
    }
    classification
}

/// Merge both data sets into one labelled list: prefill order first, then
/// account-only records. Prefill records win for people present in both.
pub fn label_people(prefill: &[Person], account: &[Person]) -> Vec<Person> {
    let classification = classify(
        prefill.iter().map(|person| &person.id),
        account.iter().map(|person| &person.id),
    );

    let mut seen = BTreeSet::new();
    let mut labelled = Vec::with_capacity(prefill.len() + account.len());

    for person in prefill.iter().chain(account.iter()) {
        if !seen.insert(person.id.clone()) {
            continue;
        }
        let group = classification.group_of(&person.id);
        let mut person = person.clone();
        person.is_existing_in_account = Some(matches!(
            group,
            Some(MatchGroup::ExistingMatch) | Some(MatchGroup::Unexpected)
        ));
        person.match_group = group;
        labelled.push(person);
    }

    labelled
}
