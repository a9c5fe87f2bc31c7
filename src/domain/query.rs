//! Student queries (help desk tickets) with threaded responses.

use super::catalog::{Priority, QueryCategory, QueryStatus};
use super::record::{parse_status, InsertAt, Record, RecordError, RecordMeta, SortValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Responses are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub sender: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub subject: String,
    pub description: String,
    pub student_name: String,
    #[serde(default)]
    pub student_id: String,
    pub category: QueryCategory,
    pub priority: Priority,
    pub status: QueryStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub responses: Vec<Response>,
}

impl Query {
    /// Appends a response and optionally moves the ticket along.
    pub fn respond(
        &mut self,
        sender: &str,
        message: &str,
        status: Option<QueryStatus>,
        assigned_to: Option<&str>,
    ) {
        self.responses.push(Response {
            sender: sender.trim().to_string(),
            message: message.trim().to_string(),
            timestamp: Utc::now(),
        });
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(who) = assigned_to {
            let who = who.trim();
            self.assigned_to = if who.is_empty() {
                None
            } else {
                Some(who.to_string())
            };
        }
    }
}

impl Record for Query {
    const KIND: &'static str = "queries";
    const REQUIRED: &'static [&'static str] = &["subject", "description", "studentName"];
    const SYSTEM_FIELDS: &'static [&'static str] = &["responses"];
    const FACETS: &'static [&'static str] = &["category", "priority", "status"];
    const SORT_KEYS: &'static [&'static str] = &["date", "priority", "subject"];
    const INSERT_AT: InsertAt = InsertAt::Front;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn template() -> Self {
        Self {
            meta: RecordMeta::draft(),
            subject: String::new(),
            description: String::new(),
            student_name: String::new(),
            student_id: String::new(),
            category: QueryCategory::Academic,
            priority: Priority::Medium,
            status: QueryStatus::Open,
            assigned_to: None,
            responses: Vec::new(),
        }
    }

    fn seed() -> Vec<Self> {
        let mut fee = Self {
            meta: RecordMeta::seeded(1, "2024-01-08T09:20:00Z"),
            subject: "Fee receipt not generated".to_string(),
            description: "Paid semester fees online but the receipt is missing.".to_string(),
            student_name: "Aarav Sharma".to_string(),
            student_id: "21CSE045".to_string(),
            category: QueryCategory::Fees,
            priority: Priority::High,
            status: QueryStatus::InProgress,
            assigned_to: Some("Accounts Office".to_string()),
            responses: Vec::new(),
        };
        fee.responses.push(Response {
            sender: "Accounts Office".to_string(),
            message: "We are checking with the payment gateway.".to_string(),
            timestamp: fee.meta.created_at,
        });
        let hostel = Self {
            meta: RecordMeta::seeded(2, "2024-01-09T18:05:00Z"),
            subject: "Hostel room maintenance".to_string(),
            description: "The ceiling fan in room B-214 is not working.".to_string(),
            student_name: "Priya Nair".to_string(),
            student_id: "22ECE012".to_string(),
            category: QueryCategory::Hostel,
            priority: Priority::Medium,
            status: QueryStatus::Open,
            assigned_to: None,
            responses: Vec::new(),
        };
        let exam = Self {
            meta: RecordMeta::seeded(3, "2024-01-11T11:40:00Z"),
            subject: "Revaluation request".to_string(),
            description: "Requesting revaluation of the Thermodynamics paper.".to_string(),
            student_name: "Rohan Verma".to_string(),
            student_id: "21ME030".to_string(),
            category: QueryCategory::Examination,
            priority: Priority::Low,
            status: QueryStatus::Resolved,
            assigned_to: Some("Examination Cell".to_string()),
            responses: Vec::new(),
        };
        vec![fee, hostel, exam]
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.subject.as_str(),
            self.description.as_str(),
            self.student_name.as_str(),
            self.student_id.as_str(),
        ]
    }

    fn facet(&self, key: &str) -> Option<String> {
        match key {
            "category" => Some(self.category.as_str().to_string()),
            "priority" => Some(self.priority.as_str().to_string()),
            "status" => Some(self.status.as_str().to_string()),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "date" => Some(SortValue::instant(&self.meta.created_at)),
            "priority" => Some(SortValue::Rank(self.priority.rank())),
            "subject" => Some(SortValue::text(&self.subject)),
            _ => None,
        }
    }

    fn preserve_system_fields(&mut self, original: &Self) {
        self.responses = original.responses.clone();
    }

    fn set_status(&mut self, status: &str, _remarks: Option<&str>) -> Result<(), RecordError> {
        self.status = parse_status(Self::KIND, status, QueryStatus::parse)?;
        Ok(())
    }

    fn stats(records: &[Self]) -> Value {
        let count = |s: QueryStatus| records.iter().filter(|q| q.status == s).count();
        json!({
            "total": records.len(),
            "open": count(QueryStatus::Open),
            "inProgress": count(QueryStatus::InProgress),
            "resolved": count(QueryStatus::Resolved),
            "closed": count(QueryStatus::Closed),
            "unassigned": records.iter().filter(|q| q.assigned_to.is_none()).count(),
            "totalResponses": records.iter().map(|q| q.responses.len()).sum::<usize>(),
        })
    }
}
