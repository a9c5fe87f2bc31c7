use super::record::{flag_status, Record, RecordError, RecordMeta, SortValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub head: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub established: Option<u16>,
    #[serde(default)]
    pub faculty_count: u32,
    #[serde(default)]
    pub student_count: u32,
    pub is_active: bool,
}

impl Record for Department {
    const KIND: &'static str = "departments";
    const REQUIRED: &'static [&'static str] = &["name", "code"];
    const FACETS: &'static [&'static str] = &["status"];
    const SORT_KEYS: &'static [&'static str] = &["name", "code", "students"];

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
            head: String::new(),
            description: String::new(),
            established: None,
            faculty_count: 0,
            student_count: 0,
            is_active: true,
        }
    }

    fn seed() -> Vec<Self> {
        [
            (1, "Computer Science & Engineering", "CSE", "Dr. Meera Iyer", 1998, 32, 480),
            (2, "Electronics & Communication", "ECE", "Prof. Arjun Rao", 1998, 28, 420),
            (3, "Mechanical Engineering", "ME", "Dr. Kavita Shah", 1995, 25, 360),
            (4, "Civil Engineering", "CE", "Prof. Nisha Patel", 1995, 20, 300),
            (5, "Electrical Engineering", "EE", "Dr. Vikram Singh", 2001, 18, 240),
        ]
        .into_iter()
        .map(|(id, name, code, head, established, faculty, students)| Self {
            meta: RecordMeta::seeded(id, "2023-06-01T08:00:00Z"),
            name: name.to_string(),
            code: code.to_string(),
            head: head.to_string(),
            description: String::new(),
            established: Some(established),
            faculty_count: faculty,
            student_count: students,
            is_active: true,
        })
        .collect()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.code.as_str(), self.head.as_str()]
    }

    fn facet(&self, key: &str) -> Option<String> {
        match key {
            "status" => Some(flag_status(self.is_active)),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "name" => Some(SortValue::text(&self.name)),
            "code" => Some(SortValue::text(&self.code)),
            "students" => Some(SortValue::Count(self.student_count as u64)),
            _ => None,
        }
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
        json!({
            "total": records.len(),
            "active": records.iter().filter(|d| d.is_active).count(),
            "totalFaculty": records.iter().map(|d| d.faculty_count as u64).sum::<u64>(),
            "totalStudents": records.iter().map(|d| d.student_count as u64).sum::<u64>(),
        })
    }
}
