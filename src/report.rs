use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single report about an observed object, as declared in a fixture.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Report {
    pub date: DateTime<Utc>,
    pub object: String,
    pub solved: bool,
    pub source: String,
    pub observation: String,
    pub report_type: String,
    pub owner: String,
}

/// A report as read back from a store, with the id the store assigned to it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StoredReport {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub report: Report,
}

impl StoredReport {
    pub fn new(id: String, report: Report) -> Self {
        StoredReport { id, report }
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} [{}] by {} at {}",
            self.object,
            self.report_type,
            self.source,
            self.owner,
            self.date.to_rfc3339()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_report() -> Report {
        Report {
            date: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            object: "OBJECT1".to_string(),
            solved: false,
            source: "source1".to_string(),
            observation: "obs1".to_string(),
            report_type: "TOM".to_string(),
            owner: "user1".to_string(),
        }
    }

    #[test]
    fn test_stored_report_is_flat() {
        // Given
        let stored = StoredReport::new("abc".to_string(), make_report());

        // When
        let value = serde_json::to_value(&stored).unwrap();

        // Then
        assert_eq!(value["_id"], "abc");
        assert_eq!(value["object"], "OBJECT1");
        assert_eq!(value["date"], "2023-01-01T00:00:00Z");
        assert_eq!(value.as_object().unwrap().len(), 8);
    }

    #[test]
    fn test_report_rejects_missing_field() {
        let json = r#"{"date":"2023-01-01T00:00:00Z","object":"OBJECT1","solved":false,
            "source":"source1","observation":"obs1","report_type":"TOM"}"#;

        let result: Result<Report, _> = serde_json::from_str(json);

        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        let report = make_report();

        assert_eq!(
            report.to_string(),
            "OBJECT1 TOM [source1] by user1 at 2023-01-01T00:00:00+00:00"
        );
    }
}
