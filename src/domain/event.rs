use super::catalog::{EventCategory, EventStatus};
use super::record::{parse_status, Record, RecordError, RecordMeta, SortValue};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: EventCategory,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: String,
    pub venue: String,
    #[serde(default)]
    pub organizer: String,
    #[serde(default)]
    pub max_attendees: u32,
    #[serde(default)]
    pub attendees: u64,
    pub status: EventStatus,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Record for Event {
    const KIND: &'static str = "events";
    const REQUIRED: &'static [&'static str] = &["title", "date", "venue"];
    const SYSTEM_FIELDS: &'static [&'static str] = &["attendees"];
    const FACETS: &'static [&'static str] = &["category", "status"];
    const SORT_KEYS: &'static [&'static str] = &["date", "title", "attendees"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn template() -> Self {
        Self {
            meta: RecordMeta::draft(),
            title: String::new(),
            description: String::new(),
            category: EventCategory::Academic,
            date: None,
            time: String::new(),
            venue: String::new(),
            organizer: String::new(),
            max_attendees: 100,
            attendees: 0,
            status: EventStatus::Upcoming,
            tags: Vec::new(),
        }
    }

    fn seed() -> Vec<Self> {
        let event = |id: u64, title: &str, category, date, venue: &str, attendees, status| Self {
            meta: RecordMeta::seeded(id, "2024-01-05T10:00:00Z"),
            title: title.to_string(),
            description: String::new(),
            category,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            time: "10:00".to_string(),
            venue: venue.to_string(),
            organizer: "Student Council".to_string(),
            max_attendees: 500,
            attendees,
            status,
            tags: Vec::new(),
        };
        vec![
            event(1, "Tech Symposium 2024", EventCategory::Academic, "2024-03-15", "Main Auditorium", 320, EventStatus::Upcoming),
            event(2, "Annual Cultural Fest", EventCategory::Cultural, "2024-02-20", "Open Air Theatre", 450, EventStatus::Upcoming),
            event(3, "Inter-College Cricket", EventCategory::Sports, "2024-01-25", "Sports Ground", 200, EventStatus::Completed),
            event(4, "Machine Learning Workshop", EventCategory::Workshop, "2024-02-05", "Lab Complex", 60, EventStatus::Ongoing),
            event(5, "Entrepreneurship Seminar", EventCategory::Seminar, "2024-03-02", "Seminar Hall", 120, EventStatus::Cancelled),
        ]
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.description.as_str(),
            self.venue.as_str(),
            self.organizer.as_str(),
        ]
    }

    fn facet(&self, key: &str) -> Option<String> {
        match key {
            "category" => Some(self.category.as_str().to_string()),
            "status" => Some(self.status.as_str().to_string()),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "date" => Some(SortValue::date(self.date)),
            "title" => Some(SortValue::text(&self.title)),
            "attendees" => Some(SortValue::Count(self.attendees)),
            _ => None,
        }
    }

    fn preserve_system_fields(&mut self, original: &Self) {
        self.attendees = original.attendees;
    }

    fn set_status(&mut self, status: &str, _remarks: Option<&str>) -> Result<(), RecordError> {
        self.status = parse_status(Self::KIND, status, EventStatus::parse)?;
        Ok(())
    }

    fn stats(records: &[Self]) -> Value {
        let count = |s: EventStatus| records.iter().filter(|e| e.status == s).count();
        json!({
            "total": records.len(),
            "upcoming": count(EventStatus::Upcoming),
            "ongoing": count(EventStatus::Ongoing),
            "completed": count(EventStatus::Completed),
            "cancelled": count(EventStatus::Cancelled),
            "totalAttendees": records.iter().map(|e| e.attendees).sum::<u64>(),
        })
    }
}
