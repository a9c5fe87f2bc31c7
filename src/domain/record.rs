//! Record contract shared by every page.
//!
//! Records compose a [`RecordMeta`] (id + timestamps) and describe how the
//! projector searches, filters, sorts and groups them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    /// 0 until the store assigns one.
    #[serde(default)]
    pub id: RecordId,
    #[serde(default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RecordMeta {
    pub fn draft() -> Self {
        Self {
            id: RecordId(0),
            created_at: now(),
            updated_at: None,
        }
    }

    /// Seed records carry fixed ids and creation dates.
    pub fn seeded(id: u64, created: &str) -> Self {
        let created_at = DateTime::parse_from_rfc3339(created)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| now());
        Self {
            id: RecordId(id),
            created_at,
            updated_at: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(now());
    }
}

/// Where a freshly created record lands in its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    Front,
    Back,
}

/// One sort key per projection; ascending for text and dates, descending
/// for ranks, counts and scores.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Instant(i64),
    Rank(u8),
    Count(u64),
    Score(f64),
}

impl SortValue {
    pub fn text(s: &str) -> Self {
        SortValue::Text(s.trim().to_lowercase())
    }

    pub fn date(d: Option<NaiveDate>) -> Self {
        // Undated records sort last.
        let ts = d
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(i64::MAX);
        SortValue::Instant(ts)
    }

    pub fn instant(t: &DateTime<Utc>) -> Self {
        SortValue::Instant(t.timestamp())
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Instant(a), SortValue::Instant(b)) => a.cmp(b),
            (SortValue::Rank(a), SortValue::Rank(b)) => b.cmp(a),
            (SortValue::Count(a), SortValue::Count(b)) => b.cmp(a),
            (SortValue::Score(a), SortValue::Score(b)) => {
                b.partial_cmp(a).unwrap_or(Ordering::Equal)
            }
            _ => Ordering::Equal,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("{kind} has no toggleable field `{field}`")]
    UnknownFlag { kind: &'static str, field: String },
    #[error("{kind} records do not carry a status")]
    NoStatus { kind: &'static str },
    #[error("`{value}` is not a valid {kind} status")]
    InvalidStatus { kind: &'static str, value: String },
}

pub trait Record:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + 'static
{
    /// Page name, also the method prefix on the wire.
    const KIND: &'static str;
    /// Form fields that must be non-empty before a commit.
    const REQUIRED: &'static [&'static str];
    /// Counters and other values the form must never write.
    const SYSTEM_FIELDS: &'static [&'static str] = &[];
    const FACETS: &'static [&'static str];
    const SORT_KEYS: &'static [&'static str];
    const INSERT_AT: InsertAt = InsertAt::Back;
    /// Payload field of the fetch envelope.
    const ENVELOPE_FIELD: &'static str = "data";
    const FALLBACK_TO_SEED: bool = false;
    /// Records created elsewhere (loans) opt out of the form flow.
    const FORM_ENABLED: bool = true;

    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;

    fn id(&self) -> RecordId {
        self.meta().id
    }

    fn template() -> Self;
    fn seed() -> Vec<Self>;

    fn search_fields(&self) -> Vec<&str>;
    fn facet(&self, key: &str) -> Option<String>;
    fn sort_value(&self, key: &str) -> Option<SortValue>;

    /// Copies counters the form does not own back from the stored record.
    fn preserve_system_fields(&mut self, _original: &Self) {}

    /// Applied to a freshly created record before insertion.
    fn on_create(&mut self) {}

    /// Brings a record from seed or fetched data into a consistent state.
    fn on_load(&mut self) {}

    fn toggle(&mut self, field: &str) -> Result<(), RecordError> {
        Err(RecordError::UnknownFlag {
            kind: Self::KIND,
            field: field.to_string(),
        })
    }

    fn set_status(&mut self, _status: &str, _remarks: Option<&str>) -> Result<(), RecordError> {
        Err(RecordError::NoStatus { kind: Self::KIND })
    }

    fn stats(records: &[Self]) -> Value;

    fn missing_required(&self) -> Vec<&'static str> {
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        Self::REQUIRED
            .iter()
            .copied()
            .filter(|field| is_blank(value.get(*field)))
            .collect()
    }

    fn matches_search(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

pub fn is_blank(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}

/// Fields written by the store rather than by the form.
pub const META_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

pub fn flag_status(active: bool) -> String {
    if active { "active" } else { "inactive" }.to_string()
}

pub fn parse_status<T: Copy>(
    kind: &'static str,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, RecordError> {
    parse(raw).ok_or_else(|| RecordError::InvalidStatus {
        kind,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_values_order_by_direction() {
        assert_eq!(
            SortValue::text("Beta").compare(&SortValue::text("alpha")),
            Ordering::Greater
        );
        assert_eq!(
            SortValue::Rank(3).compare(&SortValue::Rank(1)),
            Ordering::Less
        );
        assert_eq!(
            SortValue::Count(10).compare(&SortValue::Count(200)),
            Ordering::Greater
        );
        assert_eq!(
            SortValue::Score(9.1).compare(&SortValue::Score(7.5)),
            Ordering::Less
        );
    }

    #[test]
    fn undated_records_sort_after_dated_ones() {
        let dated = SortValue::date(NaiveDate::from_ymd_opt(2024, 3, 1));
        let undated = SortValue::date(None);
        assert_eq!(dated.compare(&undated), Ordering::Less);
    }

    #[test]
    fn blank_detection_covers_strings_arrays_and_null() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&Value::Null)));
        assert!(is_blank(Some(&serde_json::json!("   "))));
        assert!(is_blank(Some(&serde_json::json!([]))));
        assert!(!is_blank(Some(&serde_json::json!("x"))));
        assert!(!is_blank(Some(&serde_json::json!(0))));
    }

    #[test]
    fn meta_round_trips_through_camel_case() {
        let meta = RecordMeta::seeded(7, "2024-01-15T09:00:00Z");
        let v = serde_json::to_value(&meta).expect("serialize");
        assert_eq!(v["id"], 7);
        assert_eq!(v["createdAt"], "2024-01-15T09:00:00Z");
        assert!(v["updatedAt"].is_null());
        let back: RecordMeta = serde_json::from_value(v).expect("deserialize");
        assert_eq!(back, meta);
    }
}
