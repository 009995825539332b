use std::fmt::Display;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::report::Report;

const SOURCE: &str = "source1";
const OBSERVATION: &str = "obs1";

/// (date, object, report_type, owner)
pub type Row = (&'static str, &'static str, &'static str, &'static str);

const REPORT_ROWS: [Row; 10] = [
    ("2023-01-01T00:00:00Z", "OBJECT1", "TOM", "user1"),
    ("2023-01-01T12:00:00Z", "OBJECT1", "TOM", "user2"),
    ("2023-01-02T12:00:00Z", "OBJECT1", "TOM", "user4"),
    ("2023-01-01T12:00:00Z", "OBJECT2", "TOM", "user1"),
    ("2023-01-01T12:00:00Z", "OBJECT2", "Bogus", "user2"),
    ("2023-01-01T18:00:00Z", "OBJECT2", "TOM", "user4"),
    ("2023-01-02T00:00:00Z", "OBJECT3", "Bogus", "user1"),
    ("2023-01-02T00:00:00Z", "OBJECT3", "TOM", "user2"),
    ("2023-01-02T12:00:00Z", "OBJECT3", "TOM", "user3"),
    ("2023-01-03T12:00:00Z", "OBJECT4", "TOM", "user3"),
];

/// Reports typed "TOM" / "Bogus", counted against by the reports service tests
pub const REPORTS: Fixture = Fixture::new("reports", &REPORT_ROWS);

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("fixture {fixture}: invalid date {date:?}: {source}")]
    Date {
        fixture: &'static str,
        date: &'static str,
        #[source]
        source: chrono::ParseError,
    },
}

/// A named, embedded dataset that can be seeded into a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixture {
    name: &'static str,
    rows: &'static [Row],
}

impl Fixture {
    pub const fn new(name: &'static str, rows: &'static [Row]) -> Self {
        Fixture { name, rows }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The literal records, in declaration order.
    pub fn records(&self) -> Result<Vec<Report>, FixtureError> {
        self.rows
            .iter()
            .map(|&(date, object, report_type, owner)| {
                let date = date
                    .parse::<DateTime<Utc>>()
                    .map_err(|source| FixtureError::Date {
                        fixture: self.name,
                        date,
                        source,
                    })?;

                Ok(Report {
                    date,
                    object: object.to_string(),
                    solved: false,
                    source: SOURCE.to_string(),
                    observation: OBSERVATION.to_string(),
                    report_type: report_type.to_string(),
                    owner: owner.to_string(),
                })
            })
            .collect()
    }
}

impl Display for Fixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
