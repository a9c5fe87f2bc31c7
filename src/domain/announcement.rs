use super::catalog::{AnnouncementCategory, Priority};
use super::record::{flag_status, InsertAt, Record, RecordError, RecordMeta, SortValue};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub content: String,
    pub category: AnnouncementCategory,
    pub priority: Priority,
    #[serde(default)]
    pub target_audience: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    pub is_active: bool,
    #[serde(default)]
    pub views: u64,
}

impl Record for Announcement {
    const KIND: &'static str = "announcements";
    const REQUIRED: &'static [&'static str] = &["title", "content"];
    const SYSTEM_FIELDS: &'static [&'static str] = &["views"];
    const FACETS: &'static [&'static str] = &["category", "priority", "status"];
    const SORT_KEYS: &'static [&'static str] = &["date", "title", "priority", "views"];
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
            title: String::new(),
            content: String::new(),
            category: AnnouncementCategory::General,
            priority: Priority::Medium,
            target_audience: vec!["all".to_string()],
            tags: Vec::new(),
            attachments: Vec::new(),
            author: String::new(),
            expiry_date: None,
            is_active: true,
            views: 0,
        }
    }

    fn seed() -> Vec<Self> {
        let row = |id: u64,
                   created: &str,
                   title: &str,
                   content: &str,
                   category: AnnouncementCategory,
                   priority: Priority,
                   audience: &[&str],
                   active: bool,
                   views: u64| Self {
            meta: RecordMeta::seeded(id, created),
            title: title.to_string(),
            content: content.to_string(),
            category,
            priority,
            target_audience: audience.iter().map(|s| s.to_string()).collect(),
            tags: Vec::new(),
            attachments: Vec::new(),
            author: "Administration".to_string(),
            expiry_date: None,
            is_active: active,
            views,
        };
        vec![
            row(
                1,
                "2024-01-10T09:00:00Z",
                "Mid-Semester Examination Schedule",
                "Mid-semester examinations begin on 12 February. Timetables are posted on the notice board.",
                AnnouncementCategory::Exam,
                Priority::High,
                &["students", "faculty"],
                true,
                245,
            ),
            row(
                2,
                "2024-01-12T10:30:00Z",
                "Republic Day Holiday",
                "The college remains closed on 26 January.",
                AnnouncementCategory::Holiday,
                Priority::Medium,
                &["all"],
                true,
                180,
            ),
            row(
                3,
                "2024-01-14T08:15:00Z",
                "Campus Placement Drive",
                "Final-year students can register for the placement drive until 20 January.",
                AnnouncementCategory::Placement,
                Priority::High,
                &["students"],
                true,
                320,
            ),
            row(
                4,
                "2024-01-15T11:00:00Z",
                "Library Timings Extended",
                "The central library stays open until 10 PM during examinations.",
                AnnouncementCategory::General,
                Priority::Low,
                &["students"],
                true,
                95,
            ),
            row(
                5,
                "2024-01-16T14:45:00Z",
                "Annual Cultural Fest Volunteers",
                "Volunteers for the cultural fest should report to the student council office.",
                AnnouncementCategory::Event,
                Priority::Medium,
                &["students"],
                false,
                60,
            ),
            row(
                6,
                "2024-01-18T09:30:00Z",
                "Revised Academic Calendar",
                "The academic calendar for the even semester has been revised.",
                AnnouncementCategory::Academic,
                Priority::Urgent,
                &["students", "faculty", "staff"],
                true,
                410,
            ),
        ]
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.content.as_str()]
    }

    fn facet(&self, key: &str) -> Option<String> {
        match key {
            "category" => Some(self.category.as_str().to_string()),
            "priority" => Some(self.priority.as_str().to_string()),
            "status" => Some(flag_status(self.is_active)),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "date" => Some(SortValue::instant(&self.meta.created_at)),
            "title" => Some(SortValue::text(&self.title)),
            "priority" => Some(SortValue::Rank(self.priority.rank())),
            "views" => Some(SortValue::Count(self.views)),
            _ => None,
        }
    }

    fn preserve_system_fields(&mut self, original: &Self) {
        self.views = original.views;
    }

    fn toggle(&mut self, field: &str) -> Result<(), RecordError> {
        match field {
            "isActive" => {
                self.is_active = !self.is_active;
                Ok(())
            }
            other => Err(RecordError::UnknownFlag {
                kind: Self::KIND,
                field: other.to_string(),
            }),
        }
    }

    fn stats(records: &[Self]) -> Value {
        let count = |p: Priority| records.iter().filter(|a| a.priority == p).count();
        json!({
            "total": records.len(),
            "active": records.iter().filter(|a| a.is_active).count(),
            "highPriority": count(Priority::High) + count(Priority::Urgent),
            "byPriority": {
                "low": count(Priority::Low),
                "medium": count(Priority::Medium),
                "high": count(Priority::High),
                "urgent": count(Priority::Urgent),
            },
            "totalViews": records.iter().map(|a| a.views).sum::<u64>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_defaults_to_medium_and_active() {
        let t = Announcement::template();
        assert_eq!(t.priority, Priority::Medium);
        assert!(t.is_active);
        assert_eq!(t.missing_required(), vec!["title", "content"]);
    }

    #[test]
    fn seed_ids_are_unique() {
        let seed = Announcement::seed();
        let mut ids: Vec<_> = seed.iter().map(|a| a.meta.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), seed.len());
    }

    #[test]
    fn toggle_only_knows_is_active() {
        let mut a = Announcement::template();
        a.toggle("isActive").expect("toggle");
        assert!(!a.is_active);
        assert!(a.toggle("priority").is_err());
    }

    #[test]
    fn stats_sum_views_over_full_list() {
        let stats = Announcement::stats(&Announcement::seed());
        assert_eq!(stats["total"], 6);
        assert_eq!(stats["active"], 5);
        assert_eq!(stats["totalViews"], 1310);
        assert_eq!(stats["byPriority"]["high"], 2);
    }
}
