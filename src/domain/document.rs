use super::catalog::{DocumentStatus, DocumentType};
use super::record::{parse_status, Record, RecordError, RecordMeta, SortValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub student_name: String,
    pub roll_number: String,
    pub document_type: Option<DocumentType>,
    #[serde(default)]
    pub file_name: String,
    pub status: DocumentStatus,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl Record for Document {
    const KIND: &'static str = "documents";
    const REQUIRED: &'static [&'static str] = &["studentName", "rollNumber", "documentType"];
    const FACETS: &'static [&'static str] = &["status", "documentType"];
    const SORT_KEYS: &'static [&'static str] = &["date", "name"];

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
            document_type: None,
            file_name: String::new(),
            status: DocumentStatus::Pending,
            remarks: None,
        }
    }

    fn seed() -> Vec<Self> {
        [
            (1, "Ananya Das", "24CSE101", DocumentType::Marksheet, "12th_marksheet.pdf", DocumentStatus::Pending),
            (2, "Ananya Das", "24CSE101", DocumentType::IdentityProof, "aadhaar.pdf", DocumentStatus::Approved),
            (3, "Meghna Pillai", "21ME017", DocumentType::IncomeCertificate, "income_2023.pdf", DocumentStatus::Pending),
            (4, "Farhan Ali", "20CE009", DocumentType::TransferCertificate, "tc_scan.jpg", DocumentStatus::Rejected),
            (5, "Vivek Kumar", "22ECE044", DocumentType::Photograph, "photo.png", DocumentStatus::Approved),
        ]
        .into_iter()
        .map(|(id, name, roll, kind, file, status)| Self {
            meta: RecordMeta::seeded(id, "2024-01-24T09:30:00Z"),
            student_name: name.to_string(),
            roll_number: roll.to_string(),
            document_type: Some(kind),
            file_name: file.to_string(),
            status,
            remarks: None,
        })
        .collect()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.student_name.as_str(),
            self.roll_number.as_str(),
            self.file_name.as_str(),
        ]
    }

    fn facet(&self, key: &str) -> Option<String> {
        match key {
            "status" => Some(self.status.as_str().to_string()),
            "documentType" => self.document_type.map(|t| t.as_str().to_string()),
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
        self.status = parse_status(Self::KIND, status, DocumentStatus::parse)?;
        if let Some(r) = remarks {
            let r = r.trim();
            self.remarks = (!r.is_empty()).then(|| r.to_string());
        }
        Ok(())
    }

    fn stats(records: &[Self]) -> Value {
        let count = |s: DocumentStatus| records.iter().filter(|d| d.status == s).count();
        let mut by_type = Map::new();
        for t in DocumentType::ALL {
            let n = records
                .iter()
                .filter(|d| d.document_type == Some(*t))
                .count();
            if n > 0 {
                by_type.insert(t.as_str().to_string(), json!(n));
            }
        }
        json!({
            "total": records.len(),
            "pending": count(DocumentStatus::Pending),
            "approved": count(DocumentStatus::Approved),
            "rejected": count(DocumentStatus::Rejected),
            "byType": by_type,
        })
    }
}
