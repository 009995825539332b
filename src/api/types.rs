use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};

use crate::report::{Report, StoredReport};

/// Fields every Data API action needs to address a collection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace<'a> {
    pub data_source: &'a str,
    pub database: &'a str,
    pub collection: &'a str,
}

/// Structs to map JSON payloads of the action endpoints

#[derive(Debug, Serialize)]
pub struct FindRequest<'a> {
    #[serde(flatten)]
    pub namespace: Namespace<'a>,
    pub filter: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl<'a> FindRequest<'a> {
    pub fn all(namespace: Namespace<'a>, limit: Option<u32>) -> Self {
        FindRequest {
            namespace,
            filter: json!({}),
            limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FindResponse {
    pub documents: Vec<ExtendedStoredReport>,
}

#[derive(Debug, Serialize)]
pub struct InsertManyRequest<'a> {
    #[serde(flatten)]
    pub namespace: Namespace<'a>,
    pub documents: Vec<ExtendedReport>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertManyResponse {
    pub inserted_ids: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct DeleteManyRequest<'a> {
    #[serde(flatten)]
    pub namespace: Namespace<'a>,
    pub filter: Value,
}

impl<'a> DeleteManyRequest<'a> {
    pub fn all(namespace: Namespace<'a>) -> Self {
        DeleteManyRequest {
            namespace,
            filter: json!({}),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteManyResponse {
    pub deleted_count: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub error_code: Option<String>,
}

/// Report encoded with Extended JSON dates, so the server stores a real date
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ExtendedReport {
    #[serde(
        serialize_with = "serialize_date",
        deserialize_with = "deserialize_date"
    )]
    pub date: DateTime<Utc>,
    pub object: String,
    pub solved: bool,
    pub source: String,
    pub observation: String,
    pub report_type: String,
    pub owner: String,
}

impl From<&Report> for ExtendedReport {
    fn from(report: &Report) -> Self {
        ExtendedReport {
            date: report.date,
            object: report.object.clone(),
            solved: report.solved,
            source: report.source.clone(),
            observation: report.observation.clone(),
            report_type: report.report_type.clone(),
            owner: report.owner.clone(),
        }
    }
}

impl From<ExtendedReport> for Report {
    fn from(report: ExtendedReport) -> Self {
        Report {
            date: report.date,
            object: report.object,
            solved: report.solved,
            source: report.source,
            observation: report.observation,
            report_type: report.report_type,
            owner: report.owner,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExtendedStoredReport {
    #[serde(rename = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(flatten)]
    pub report: ExtendedReport,
}

impl From<ExtendedStoredReport> for StoredReport {
    fn from(stored: ExtendedStoredReport) -> Self {
        StoredReport::new(stored.id, stored.report.into())
    }
}

// Extended JSON serialization / deserialization methods
fn serialize_date<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    json!({ "$date": date.to_rfc3339_opts(chrono::SecondsFormat::Millis, true) })
        .serialize(serializer)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DateRepr {
    Plain(DateTime<Utc>),
    Extended {
        #[serde(rename = "$date")]
        date: DateValue,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DateValue {
    Iso(DateTime<Utc>),
    Millis(i64),
    Canonical {
        #[serde(rename = "$numberLong")]
        millis: String,
    },
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = match DateRepr::deserialize(deserializer)? {
        DateRepr::Plain(date) => return Ok(date),
        DateRepr::Extended {
            date: DateValue::Iso(date),
        } => return Ok(date),
        DateRepr::Extended {
            date: DateValue::Millis(millis),
        } => millis,
        DateRepr::Extended {
            date: DateValue::Canonical { millis },
        } => millis.parse::<i64>().map_err(serde::de::Error::custom)?,
    };

    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| serde::de::Error::custom(format!("date out of range: {millis}")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Plain(String),
    ObjectId {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match IdRepr::deserialize(deserializer)? {
        IdRepr::Plain(id) => Ok(id),
        IdRepr::ObjectId { oid } => Ok(oid),
    }
}
