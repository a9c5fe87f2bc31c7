use super::catalog::{Branch, StudentStatus};
use super::record::{parse_status, Record, RecordError, RecordMeta, SortValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub roll_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub branch: Option<Branch>,
    pub year: u8,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub cgpa: f64,
    pub status: StudentStatus,
}

fn student(id: u64, name: &str, roll: &str, branch: Branch, year: u8, cgpa: f64) -> Student {
    let email = format!(
        "{}@college.edu",
        name.to_lowercase().replace(' ', ".")
    );
    Student {
        meta: RecordMeta::seeded(id, "2023-08-01T09:00:00Z"),
        name: name.to_string(),
        roll_number: roll.to_string(),
        email,
        phone: String::new(),
        branch: Some(branch),
        year,
        section: "A".to_string(),
        cgpa,
        status: StudentStatus::Active,
    }
}

impl Record for Student {
    const KIND: &'static str = "students";
    const REQUIRED: &'static [&'static str] = &["name", "rollNumber", "branch"];
    const FACETS: &'static [&'static str] = &["branch", "year", "status"];
    const SORT_KEYS: &'static [&'static str] = &["name", "rollNumber", "cgpa"];
    const FALLBACK_TO_SEED: bool = true;

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
            roll_number: String::new(),
            email: String::new(),
            phone: String::new(),
            branch: None,
            year: 1,
            section: String::new(),
            cgpa: 0.0,
            status: StudentStatus::Active,
        }
    }

    fn seed() -> Vec<Self> {
        let mut graduated = student(6, "Ishaan Gupta", "20IT004", Branch::It, 4, 8.4);
        graduated.status = StudentStatus::Graduated;
        vec![
            student(1, "Aarav Sharma", "21CSE045", Branch::Cse, 3, 8.7),
            student(2, "Priya Nair", "22ECE012", Branch::Ece, 2, 9.1),
            student(3, "Rohan Verma", "21ME030", Branch::Me, 3, 7.2),
            student(4, "Sneha Reddy", "22CSE008", Branch::Cse, 2, 8.9),
            student(5, "Karan Mehta", "23EE019", Branch::Ee, 1, 7.8),
            graduated,
        ]
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.roll_number.as_str(),
            self.email.as_str(),
        ]
    }

    fn facet(&self, key: &str) -> Option<String> {
        match key {
            "branch" => self.branch.map(|b| b.as_str().to_string()),
            "year" => Some(self.year.to_string()),
            "status" => Some(self.status.as_str().to_string()),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "name" => Some(SortValue::text(&self.name)),
            "rollNumber" => Some(SortValue::text(&self.roll_number)),
            "cgpa" => Some(SortValue::Score(self.cgpa)),
            _ => None,
        }
    }

    fn on_create(&mut self) {
        self.roll_number = self.roll_number.trim().to_ascii_uppercase();
    }

    fn set_status(&mut self, status: &str, _remarks: Option<&str>) -> Result<(), RecordError> {
        self.status = parse_status(Self::KIND, status, StudentStatus::parse)?;
        Ok(())
    }

    fn stats(records: &[Self]) -> Value {
        let mut by_branch = Map::new();
        for branch in Branch::ALL {
            let n = records.iter().filter(|s| s.branch == Some(*branch)).count();
            by_branch.insert(branch.as_str().to_string(), json!(n));
        }
        let average_cgpa = if records.is_empty() {
            0.0
        } else {
            let sum: f64 = records.iter().map(|s| s.cgpa).sum();
            (sum / records.len() as f64 * 100.0).round() / 100.0
        };
        json!({
            "total": records.len(),
            "active": records.iter().filter(|s| s.status == StudentStatus::Active).count(),
            "averageCgpa": average_cgpa,
            "byBranch": by_branch,
        })
    }
}
