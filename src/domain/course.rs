use super::catalog::Branch;
use super::record::{flag_status, Record, RecordError, RecordMeta, SortValue};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub max_marks: u32,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub code: String,
    pub department: Option<Branch>,
    pub semester: u8,
    pub credits: u8,
    #[serde(default)]
    pub instructor: String,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
    #[serde(default)]
    pub enrolled: u64,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl Course {
    pub fn add_assignment(&mut self, title: &str, due_date: Option<NaiveDate>, max_marks: u32) {
        self.assignments.push(Assignment {
            title: title.trim().to_string(),
            due_date,
            max_marks,
            posted_at: Utc::now(),
        });
    }
}

#[allow(clippy::too_many_arguments)]
fn seeded(
    id: u64,
    name: &str,
    code: &str,
    department: Branch,
    semester: u8,
    credits: u8,
    instructor: &str,
    enrolled: u64,
) -> Course {
    Course {
        meta: RecordMeta::seeded(id, "2023-12-01T08:00:00Z"),
        name: name.to_string(),
        code: code.to_string(),
        department: Some(department),
        semester,
        credits,
        instructor: instructor.to_string(),
        description: String::new(),
        is_active: true,
        enrolled,
        assignments: Vec::new(),
    }
}

impl Record for Course {
    const KIND: &'static str = "courses";
    const REQUIRED: &'static [&'static str] = &["name", "code", "department"];
    const SYSTEM_FIELDS: &'static [&'static str] = &["enrolled", "assignments"];
    const FACETS: &'static [&'static str] = &["department", "semester", "status"];
    const SORT_KEYS: &'static [&'static str] = &["name", "code", "credits", "enrolled"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn template() -> Self {
        Self {
            meta: RecordMeta::draft(),
            name: String::new(),
            code: String::new(),
            department: None,
            semester: 1,
            credits: 3,
            instructor: String::new(),
            description: String::new(),
            is_active: true,
            enrolled: 0,
            assignments: Vec::new(),
        }
    }

    fn seed() -> Vec<Self> {
        let mut dsa = seeded(
            1,
            "Data Structures",
            "CS201",
            Branch::Cse,
            3,
            4,
            "Dr. Meera Iyer",
            64,
        );
        dsa.add_assignment("Linked list lab", NaiveDate::from_ymd_opt(2024, 2, 5), 20);
        dsa.assignments[0].posted_at = dsa.meta.created_at;
        vec![
            dsa,
            seeded(2, "Digital Electronics", "EC202", Branch::Ece, 3, 3, "Prof. Arjun Rao", 58),
            seeded(3, "Thermodynamics", "ME203", Branch::Me, 3, 4, "Dr. Kavita Shah", 52),
            seeded(4, "Database Systems", "CS302", Branch::Cse, 5, 4, "Dr. Rahul Menon", 71),
            seeded(5, "Structural Analysis", "CE301", Branch::Ce, 5, 3, "Prof. Nisha Patel", 40),
        ]
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.code.as_str(),
            self.instructor.as_str(),
        ]
    }

    fn facet(&self, key: &str) -> Option<String> {
        match key {
            "department" => self.department.map(|d| d.as_str().to_string()),
            "semester" => Some(self.semester.to_string()),
            "status" => Some(flag_status(self.is_active)),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "name" => Some(SortValue::text(&self.name)),
            "code" => Some(SortValue::text(&self.code)),
            "credits" => Some(SortValue::Count(self.credits as u64)),
            "enrolled" => Some(SortValue::Count(self.enrolled)),
            _ => None,
        }
    }

    fn preserve_system_fields(&mut self, original: &Self) {
        self.enrolled = original.enrolled;
        self.assignments = original.assignments.clone();
    }

    fn on_create(&mut self) {
        self.code = self.code.trim().to_ascii_uppercase();
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
        let mut by_department = Map::new();
        for branch in Branch::ALL {
            let n = records
                .iter()
                .filter(|c| c.department == Some(*branch))
                .count();
            by_department.insert(branch.as_str().to_string(), json!(n));
        }
        json!({
            "total": records.len(),
            "active": records.iter().filter(|c| c.is_active).count(),
            "totalCredits": records.iter().map(|c| c.credits as u64).sum::<u64>(),
            "totalEnrolled": records.iter().map(|c| c.enrolled).sum::<u64>(),
            "totalAssignments": records.iter().map(|c| c.assignments.len()).sum::<usize>(),
            "byDepartment": by_department,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_requires_department() {
        let mut c = Course::template();
        c.name = "Algorithms".into();
        c.code = "CS301".into();
        assert_eq!(c.missing_required(), vec!["department"]);
        c.department = Some(Branch::Cse);
        assert!(c.missing_required().is_empty());
    }

    #[test]
    fn edits_cannot_drop_assignments() {
        let original = Course::seed().remove(0);
        let mut edited = original.clone();
        edited.assignments.clear();
        edited.enrolled = 0;
        edited.preserve_system_fields(&original);
        assert_eq!(edited.assignments.len(), 1);
        assert_eq!(edited.enrolled, 64);
    }

    #[test]
    fn stats_count_departments() {
        let stats = Course::stats(&Course::seed());
        assert_eq!(stats["total"], 5);
        assert_eq!(stats["byDepartment"]["CSE"], 2);
        assert_eq!(stats["totalCredits"], 18);
    }
}
