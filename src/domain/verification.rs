//! Clerk-side student verification applications.

use super::catalog::{ApplicationType, Branch, VerificationStatus};
use super::record::{parse_status, Record, RecordError, RecordMeta, SortValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub student_name: String,
    pub roll_number: String,
    pub branch: Option<Branch>,
    pub application_type: ApplicationType,
    #[serde(default)]
    pub documents: Vec<String>,
    pub status: VerificationStatus,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl Record for Application {
    const KIND: &'static str = "verification";
    const REQUIRED: &'static [&'static str] = &["studentName", "rollNumber"];
    const FACETS: &'static [&'static str] = &["status", "branch", "applicationType"];
    const SORT_KEYS: &'static [&'static str] = &["date", "name"];
    const ENVELOPE_FIELD: &'static str = "applications";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn template() -> Self {
        Self {
            meta: RecordMeta::draft(),
            student_name: String::new(),
            roll_number: String::new(),
            branch: None,
            application_type: ApplicationType::Admission,
            documents: Vec::new(),
            status: VerificationStatus::Pending,
            remarks: None,
        }
    }

    fn seed() -> Vec<Self> {
        let docs = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        vec![
            Self {
                meta: RecordMeta::seeded(1, "2024-01-20T09:00:00Z"),
                student_name: "Ananya Das".to_string(),
                roll_number: "24CSE101".to_string(),
                branch: Some(Branch::Cse),
                application_type: ApplicationType::Admission,
                documents: docs(&["marksheet", "identity_proof", "photograph"]),
                status: VerificationStatus::Pending,
                remarks: None,
            },
            Self {
                meta: RecordMeta::seeded(2, "2024-01-21T10:15:00Z"),
                student_name: "Vivek Kumar".to_string(),
                roll_number: "22ECE044".to_string(),
                branch: Some(Branch::Ece),
                application_type: ApplicationType::Bonafide,
                documents: docs(&["identity_proof"]),
                status: VerificationStatus::Verified,
                remarks: Some("Verified against enrolment register".to_string()),
            },
            Self {
                meta: RecordMeta::seeded(3, "2024-01-22T14:30:00Z"),
                student_name: "Meghna Pillai".to_string(),
                roll_number: "21ME017".to_string(),
                branch: Some(Branch::Me),
                application_type: ApplicationType::Scholarship,
                documents: docs(&["income_certificate", "marksheet"]),
                status: VerificationStatus::Pending,
                remarks: None,
            },
            Self {
                meta: RecordMeta::seeded(4, "2024-01-23T11:45:00Z"),
                student_name: "Farhan Ali".to_string(),
                roll_number: "20CE009".to_string(),
                branch: Some(Branch::Ce),
                application_type: ApplicationType::Transfer,
                documents: docs(&["transfer_certificate"]),
                status: VerificationStatus::Rejected,
                remarks: Some("Dues pending with accounts".to_string()),
            },
        ]
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.student_name.as_str(), self.roll_number.as_str()]
    }

    fn facet(&self, key: &str) -> Option<String> {
        match key {
            "status" => Some(self.status.as_str().to_string()),
            "branch" => self.branch.map(|b| b.as_str().to_string()),
            "applicationType" => Some(self.application_type.as_str().to_string()),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "date" => Some(SortValue::instant(&self.meta.created_at)),
            "name" => Some(SortValue::text(&self.student_name)),
            _ => None,
        }
    }

    fn set_status(&mut self, status: &str, remarks: Option<&str>) -> Result<(), RecordError> {
        self.status = parse_status(Self::KIND, status, VerificationStatus::parse)?;
        if let Some(r) = remarks {
            let r = r.trim();
            self.remarks = (!r.is_empty()).then(|| r.to_string());
        }
        Ok(())
    }

    fn stats(records: &[Self]) -> Value {
        let count = |s: VerificationStatus| records.iter().filter(|a| a.status == s).count();
        json!({
            "total": records.len(),
            "pending": count(VerificationStatus::Pending),
            "verified": count(VerificationStatus::Verified),
            "rejected": count(VerificationStatus::Rejected),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_status_records_remarks() {
        let mut a = Application::seed().remove(0);
        a.set_status("rejected", Some(" Photo unclear ")).expect("valid");
        assert_eq!(a.status, VerificationStatus::Rejected);
        assert_eq!(a.remarks.as_deref(), Some("Photo unclear"));
        a.set_status("verified", None).expect("valid");
        assert_eq!(a.remarks.as_deref(), Some("Photo unclear"));
    }
}
