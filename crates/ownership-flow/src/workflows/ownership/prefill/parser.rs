use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::{PrefillData, PrefillError};
use crate::workflows::ownership::domain::{OwnershipType, Person, PersonId};

pub fn parse_prefill<R: Read>(reader: R, company_name: &str) -> Result<PrefillData, PrefillError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut data = PrefillData::new(company_name, Vec::new(), Vec::new());

    for record in csv_reader.records() {
        let record = record?;
        // quoted fields may span lines, so take the record's own start line
        let line = record.position().map(|position| position.line()).unwrap_or_default();
        let row: PrefillRow = record.deserialize(Some(&headers))?;
        let target = row.target(line)?;
        let person = row.into_person(target.0, line)?;

        match target {
            (Roster::Owners, Source::Prefill) => data.owners.push(person),
            (Roster::Owners, Source::Account) => data.account_owners.push(person),
            (Roster::Directors, Source::Prefill) => data.directors.push(person),
            (Roster::Directors, Source::Account) => data.account_directors.push(person),
        }
    }

    Ok(data)
}

#[derive(Debug, Clone, Copy)]
enum Roster {
    Owners,
    Directors,
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Prefill,
    Account,
}

#[derive(Debug, Deserialize)]
struct PrefillRow {
    roster: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    source: Option<String>,
    id: String,
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    percentage: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    ownership_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    role: Option<String>,
}

impl PrefillRow {
    fn target(&self, line: u64) -> Result<(Roster, Source), PrefillError> {
        let roster = match self.roster.to_ascii_lowercase().as_str() {
            "owner" | "owners" | "ubo" => Roster::Owners,
            "director" | "directors" => Roster::Directors,
            other => return Err(invalid(line, format!("unknown roster '{other}'"))),
        };
        let source = match self.source.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("prefill") => Source::Prefill,
            Some("account") => Source::Account,
            Some(other) => return Err(invalid(line, format!("unknown source '{other}'"))),
        };
        Ok((roster, source))
    }

    fn into_person(self, roster: Roster, line: u64) -> Result<Person, PrefillError> {
        if self.id.is_empty() {
            return Err(invalid(line, "id must not be empty".to_string()));
        }
        if self.name.is_empty() {
            return Err(invalid(line, "name must not be empty".to_string()));
        }

        let ownership_type = match self.ownership_type.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("direct") => OwnershipType::Direct,
            Some("indirect") => OwnershipType::Indirect,
            Some(other) => {
                return Err(invalid(line, format!("unknown ownership type '{other}'")));
            }
        };

        let ownership_percentage = match (roster, self.percentage.as_deref()) {
            (Roster::Directors, _) | (Roster::Owners, None) => 0.0,
            (Roster::Owners, Some(raw)) => {
                let value = raw
                    .trim_end_matches('%')
                    .parse::<f32>()
                    .map_err(|_| invalid(line, format!("percentage '{raw}' is not a number")))?;
                if !(0.0..=100.0).contains(&value) {
                    return Err(invalid(line, format!("percentage {value} is out of range")));
                }
                value
            }
        };

        Ok(Person {
            id: PersonId(self.id),
            name: self.name,
            ownership_percentage,
            ownership_type,
            role: self.role,
            is_existing_in_account: None,
            match_group: None,
        })
    }
}

fn invalid(line: u64, reason: String) -> PrefillError {
    PrefillError::InvalidRow { line, reason }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
roster,source,id,name,percentage,ownership_type,role
owners,prefill,owner_alice,Alice,60,direct,
owners,,owner_bob,Bob,40%,indirect,
directors,prefill,director_1,James Rhodes,,,Chief Executive Officer
owners,account,owner_alice,Alice,60,direct,
owners,account,owner_carol,Carol,10,direct,
";

    #[test]
    fn splits_rows_by_roster_and_source() {
        let data = parse_prefill(EXPORT.as_bytes(), "Acme").expect("valid export");

        assert_eq!(data.company_name, "Acme");
        assert_eq!(data.owners.len(), 2);
        assert_eq!(data.owners[1].ownership_percentage, 40.0);
        assert_eq!(data.owners[1].ownership_type, OwnershipType::Indirect);
        assert_eq!(data.directors[0].role.as_deref(), Some("Chief Executive Officer"));
        assert_eq!(data.directors[0].ownership_percentage, 0.0);
        assert_eq!(data.account_owners.len(), 2);
        assert!(data.account_directors.is_empty());
    }

    #[test]
    fn reports_the_offending_line() {
        let export = "\
roster,source,id,name,percentage,ownership_type,role
owners,prefill,owner_alice,Alice,60,direct,
shareholders,prefill,owner_bob,Bob,40,direct,
";
        let err = parse_prefill(export.as_bytes(), "Acme").expect_err("bad roster");
        match err {
            PrefillError::InvalidRow { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("shareholders"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        let export = "\
roster,source,id,name,percentage,ownership_type,role
owners,prefill,owner_alice,Alice,160,direct,
";
        let err = parse_prefill(export.as_bytes(), "Acme").expect_err("160%");
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn line_numbers_follow_multiline_fields() {
        let export = "\
roster,source,id,name,percentage,ownership_type,role
directors,prefill,director_1,James Rhodes,,,\"Chief Executive
Officer\"
owners,prefill,owner_bob,Bob,forty,direct,
";
        let err = parse_prefill(export.as_bytes(), "Acme").expect_err("bad percentage");
        match err {
            PrefillError::InvalidRow { line, reason } => {
                assert_eq!(line, 4);
                assert!(reason.contains("forty"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
