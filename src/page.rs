//! Page models: one store, one form and one load banner per page.

use crate::domain::record::{Record, RecordError, RecordId};
use crate::domain::{
    Announcement, Application, Book, Course, Department, Document, Event, Loan, Query, Student,
};
use crate::form::{CommitOutcome, FormController, FormError, FormState};
use crate::loader::{LoadError, Payload};
use crate::store::{Criteria, CriteriaError, RecordStore};
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: RecordId },
    #[error("{0}")]
    BadParams(String),
}

impl PageError {
    /// Stable wire code.
    pub fn code(&self) -> &'static str {
        match self {
            PageError::Criteria(_) | PageError::BadParams(_) => "bad_params",
            PageError::NotFound { .. } => "not_found",
            PageError::Form(e) => match e {
                FormError::NoDraft => "no_draft",
                FormError::Disabled { .. } => "not_supported",
                FormError::NotFound { .. } => "not_found",
                FormError::MissingFields(_)
                | FormError::SystemField(_)
                | FormError::UnknownField(_)
                | FormError::InvalidValue(_) => "validation_failed",
            },
            PageError::Record(e) => match e {
                RecordError::InvalidStatus { .. } => "validation_failed",
                RecordError::UnknownFlag { .. } | RecordError::NoStatus { .. } => "bad_params",
            },
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            PageError::Form(FormError::MissingFields(missing)) => Some(json!({ "missing": missing })),
            PageError::Form(FormError::SystemField(f) | FormError::UnknownField(f)) => {
                Some(json!({ "field": f }))
            }
            _ => None,
        }
    }
}

pub fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Builds projector criteria from `{search?, filters?, sort?}`.
pub fn criteria_from_params(params: &Value) -> Result<Criteria, PageError> {
    let mut criteria = Criteria::new();
    if let Some(v) = params.get("search").filter(|v| !v.is_null()) {
        let s = v
            .as_str()
            .ok_or_else(|| PageError::BadParams("search must be a string".into()))?;
        criteria = criteria.search(s);
    }
    if let Some(v) = params.get("filters").filter(|v| !v.is_null()) {
        let obj = v
            .as_object()
            .ok_or_else(|| PageError::BadParams("filters must be an object".into()))?;
        for (facet, value) in obj {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(PageError::BadParams(format!(
                        "filter {} must be a string",
                        facet
                    )))
                }
            };
            criteria = criteria.filter(facet, &value);
        }
    }
    if let Some(v) = params.get("sort").filter(|v| !v.is_null()) {
        let s = v
            .as_str()
            .ok_or_else(|| PageError::BadParams("sort must be a string".into()))?;
        criteria = criteria.sort_by(s);
    }
    Ok(criteria)
}

#[derive(Debug, Clone)]
pub struct Page<R> {
    store: RecordStore<R>,
    form: FormController<R>,
    banner: Option<String>,
    generation: u64,
    loading: bool,
    mounted: bool,
}

impl<R: Record> Default for Page<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn decode<R: Record>(rows: Vec<Value>) -> Result<Vec<R>, LoadError> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(row).map_err(|e| LoadError::Decode {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

impl<R: Record> Page<R> {
    pub fn new() -> Self {
        Self {
            store: RecordStore::new(),
            form: FormController::new(),
            banner: None,
            generation: 0,
            loading: false,
            mounted: false,
        }
    }

    pub fn store(&self) -> &RecordStore<R> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RecordStore<R> {
        &mut self.store
    }

    #[cfg(test)]
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Synchronous seed mount, used at startup.
    pub fn mount_seed(&mut self) {
        self.generation += 1;
        self.store.load(R::seed());
        self.mounted = true;
        self.loading = false;
        self.banner = None;
    }

    /// Starts a new load. Any earlier load still in flight is superseded.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.mounted = true;
        self.generation
    }

    /// Applies a finished load if it belongs to the current generation.
    pub fn complete_load(&mut self, generation: u64, result: Result<Payload, LoadError>) -> bool {
        if generation != self.generation {
            debug!(
                kind = R::KIND,
                generation,
                current = self.generation,
                "stale load discarded"
            );
            return false;
        }
        self.loading = false;
        let records = result.and_then(|payload| match payload {
            Payload::Seed => Ok(R::seed()),
            Payload::Rows(rows) => decode::<R>(rows),
        });
        match records {
            Ok(records) => {
                info!(kind = R::KIND, count = records.len(), "page loaded");
                self.store.load(records);
                self.banner = None;
            }
            Err(e) => {
                warn!(kind = R::KIND, error = %e, "page load failed");
                self.banner = Some(format!("Failed to load {}: {}", R::KIND, e));
                if R::FALLBACK_TO_SEED {
                    self.store.load(R::seed());
                }
            }
        }
        true
    }

    pub fn unmount(&mut self) {
        self.generation += 1;
        self.store.clear();
        self.form.cancel();
        self.banner = None;
        self.loading = false;
        self.mounted = false;
    }

    pub fn state_json(&self) -> Value {
        json!({
            "mounted": self.mounted,
            "loading": self.loading,
            "generation": self.generation,
            "banner": self.banner,
            "count": self.store.len(),
            "empty": self.store.is_empty(),
        })
    }

    fn record_json(&self, id: RecordId) -> Value {
        self.store.get(id).map(to_json).unwrap_or(Value::Null)
    }

    fn form_json(&self) -> Value {
        let state = self.form.state();
        let original_id = match state {
            FormState::Editing { original_id, .. } => Some(*original_id),
            _ => None,
        };
        json!({
            "mode": state.mode(),
            "originalId": original_id,
            "draft": state.draft().map(to_json),
            "canCommit": self.form.can_commit(),
            "missing": self.form.missing_required(),
        })
    }
}

/// Page operations with JSON in and out, so the ipc layer can address a
/// page by name.
pub trait PageOps {
    fn envelope_field(&self) -> &'static str;
    fn begin_load(&mut self) -> u64;
    fn complete_load(&mut self, generation: u64, result: Result<Payload, LoadError>) -> bool;
    fn mount_seed(&mut self);
    fn unmount(&mut self);
    fn state(&self) -> Value;
    fn dismiss_banner(&mut self);

    fn list(&self, criteria: &Criteria) -> Result<Value, PageError>;
    fn groups(&self, by: &str, criteria: &Criteria) -> Result<Value, PageError>;
    fn stats(&self) -> Value;
    fn get(&self, id: RecordId) -> Result<Value, PageError>;

    fn form_create(&mut self) -> Result<Value, PageError>;
    fn form_edit(&mut self, id: RecordId) -> Result<Value, PageError>;
    fn form_patch(&mut self, fields: &Map<String, Value>) -> Result<Value, PageError>;
    fn form_get(&self) -> Value;
    fn form_cancel(&mut self) -> Value;
    fn form_commit(&mut self) -> Result<Value, PageError>;

    fn delete(&mut self, id: RecordId) -> Value;
    fn toggle(&mut self, id: RecordId, field: &str) -> Result<Value, PageError>;
    fn set_status(
        &mut self,
        id: RecordId,
        status: &str,
        remarks: Option<&str>,
    ) -> Result<Value, PageError>;
}

impl<R: Record> PageOps for Page<R> {
    fn envelope_field(&self) -> &'static str {
        R::ENVELOPE_FIELD
    }

    fn begin_load(&mut self) -> u64 {
        Page::begin_load(self)
    }

    fn complete_load(&mut self, generation: u64, result: Result<Payload, LoadError>) -> bool {
        Page::complete_load(self, generation, result)
    }

    fn mount_seed(&mut self) {
        Page::mount_seed(self)
    }

    fn unmount(&mut self) {
        Page::unmount(self)
    }

    fn state(&self) -> Value {
        self.state_json()
    }

    fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    fn list(&self, criteria: &Criteria) -> Result<Value, PageError> {
        criteria.validate::<R>()?;
        let records: Vec<Value> = self.store.project(criteria).into_iter().map(to_json).collect();
        Ok(json!({
            "total": self.store.len(),
            "matched": records.len(),
            "empty": records.is_empty(),
            "records": records,
            "loading": self.loading,
            "banner": self.banner,
        }))
    }

    fn groups(&self, by: &str, criteria: &Criteria) -> Result<Value, PageError> {
        if !R::FACETS.contains(&by) {
            return Err(CriteriaError::UnknownFacet {
                kind: R::KIND,
                facet: by.to_string(),
            }
            .into());
        }
        criteria.validate::<R>()?;
        let groups: Vec<Value> = self
            .store
            .group_by(by, criteria)
            .into_iter()
            .map(|(key, members)| {
                json!({
                    "key": key,
                    "count": members.len(),
                    "records": members.into_iter().map(to_json).collect::<Vec<_>>(),
                })
            })
            .collect();
        Ok(json!({ "by": by, "groups": groups }))
    }

    fn stats(&self) -> Value {
        self.store.stats()
    }

    fn get(&self, id: RecordId) -> Result<Value, PageError> {
        self.store
            .get(id)
            .map(to_json)
            .ok_or(PageError::NotFound { kind: R::KIND, id })
    }

    fn form_create(&mut self) -> Result<Value, PageError> {
        self.form.open_create()?;
        Ok(self.form_json())
    }

    fn form_edit(&mut self, id: RecordId) -> Result<Value, PageError> {
        self.form.open_edit(&self.store, id)?;
        Ok(self.form_json())
    }

    fn form_patch(&mut self, fields: &Map<String, Value>) -> Result<Value, PageError> {
        self.form.patch(fields)?;
        Ok(self.form_json())
    }

    fn form_get(&self) -> Value {
        self.form_json()
    }

    fn form_cancel(&mut self) -> Value {
        self.form.cancel();
        self.form_json()
    }

    fn form_commit(&mut self) -> Result<Value, PageError> {
        let outcome = self.form.commit(&mut self.store)?;
        Ok(match outcome {
            CommitOutcome::Created(id) => {
                info!(kind = R::KIND, %id, "record created");
                json!({ "applied": true, "action": "created", "id": id, "record": self.record_json(id) })
            }
            CommitOutcome::Updated(id) => {
                info!(kind = R::KIND, %id, "record updated");
                json!({ "applied": true, "action": "updated", "id": id, "record": self.record_json(id) })
            }
            CommitOutcome::Vanished(id) => {
                debug!(kind = R::KIND, %id, "edited record no longer exists");
                json!({ "applied": false, "action": "updated", "id": id })
            }
        })
    }

    fn delete(&mut self, id: RecordId) -> Value {
        match self.store.remove(id) {
            Some(_) => {
                info!(kind = R::KIND, %id, "record deleted");
                json!({ "applied": true, "id": id })
            }
            None => {
                debug!(kind = R::KIND, %id, "delete skipped, no such record");
                json!({ "applied": false, "id": id })
            }
        }
    }

    fn toggle(&mut self, id: RecordId, field: &str) -> Result<Value, PageError> {
        let applied = self.store.update(id, |r| r.toggle(field))?;
        if !applied {
            debug!(kind = R::KIND, %id, field, "toggle skipped, no such record");
        }
        Ok(json!({ "applied": applied, "id": id, "record": self.record_json(id) }))
    }

    fn set_status(
        &mut self,
        id: RecordId,
        status: &str,
        remarks: Option<&str>,
    ) -> Result<Value, PageError> {
        let applied = self.store.update(id, |r| r.set_status(status, remarks))?;
        if !applied {
            debug!(kind = R::KIND, %id, status, "status update skipped, no such record");
        }
        Ok(json!({ "applied": applied, "id": id, "record": self.record_json(id) }))
    }
}

/// Every page the sidecar serves.
#[derive(Debug, Default)]
pub struct Pages {
    pub announcements: Page<Announcement>,
    pub courses: Page<Course>,
    pub departments: Page<Department>,
    pub events: Page<Event>,
    pub queries: Page<Query>,
    pub students: Page<Student>,
    pub verification: Page<Application>,
    pub documents: Page<Document>,
    pub library: Page<Book>,
    pub loans: Page<Loan>,
}

impl Pages {
    pub const KINDS: &'static [&'static str] = &[
        "announcements",
        "courses",
        "departments",
        "events",
        "queries",
        "students",
        "verification",
        "documents",
        "library",
        "loans",
    ];

    pub fn get_mut(&mut self, kind: &str) -> Option<&mut dyn PageOps> {
        let page: &mut dyn PageOps = match kind {
            "announcements" => &mut self.announcements,
            "courses" => &mut self.courses,
            "departments" => &mut self.departments,
            "events" => &mut self.events,
            "queries" => &mut self.queries,
            "students" => &mut self.students,
            "verification" => &mut self.verification,
            "documents" => &mut self.documents,
            "library" => &mut self.library,
            "loans" => &mut self.loans,
            _ => return None,
        };
        Some(page)
    }

    pub fn mount_all_seed(&mut self) {
        for kind in Self::KINDS {
            if let Some(page) = self.get_mut(kind) {
                page.mount_seed();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded<R: Record>() -> Page<R> {
        let mut page = Page::new();
        page.mount_seed();
        page
    }

    #[test]
    fn stale_completion_is_discarded_after_unmount() {
        let mut page = Page::<Course>::new();
        let generation = page.begin_load();
        page.unmount();
        assert!(!page.complete_load(generation, Ok(Payload::Seed)));
        assert!(page.store().is_empty());
        assert_eq!(page.state_json()["mounted"], false);
        assert_eq!(page.state_json()["empty"], true);
    }

    #[test]
    fn later_load_supersedes_earlier_one() {
        let mut page = Page::<Event>::new();
        let first = page.begin_load();
        let second = page.begin_load();
        assert!(!page.complete_load(first, Ok(Payload::Rows(vec![]))));
        assert!(page.complete_load(second, Ok(Payload::Seed)));
        assert_eq!(page.store().len(), Event::seed().len());
    }

    #[test]
    fn failed_student_load_falls_back_to_seed() {
        let mut page = Page::<Student>::new();
        let generation = page.begin_load();
        page.complete_load(generation, Err(LoadError::Rejected("server down".into())));
        assert_eq!(page.store().len(), Student::seed().len());
        assert!(page.banner().is_some_and(|b| b.contains("server down")));
        page.dismiss_banner();
        assert!(page.banner().is_none());
    }

    #[test]
    fn failed_load_keeps_previous_records_without_fallback() {
        let mut page = seeded::<Announcement>();
        page.store_mut().remove(RecordId(1));
        let generation = page.begin_load();
        page.complete_load(generation, Err(LoadError::MissingPayload("data")));
        assert_eq!(page.store().len(), 5);
        assert!(page.banner().is_some());
    }

    #[test]
    fn malformed_rows_fail_the_whole_load() {
        let mut page = Page::<Department>::new();
        let generation = page.begin_load();
        page.complete_load(generation, Ok(Payload::Rows(vec![json!({"name": 3})])));
        assert!(page.store().is_empty());
        assert!(page.banner().is_some_and(|b| b.contains("record 0")));
    }

    #[test]
    fn toggle_changes_only_the_flag() {
        let mut page = seeded::<Announcement>();
        let before: Vec<Announcement> = page.store().records().to_vec();
        let out = page.toggle(RecordId(6), "isActive").expect("toggle");
        assert_eq!(out["applied"], true);
        for (old, new) in before.iter().zip(page.store().records()) {
            if old.id() == RecordId(6) {
                assert_eq!(new.is_active, !old.is_active);
                let mut restored = new.clone();
                restored.is_active = old.is_active;
                restored.meta.updated_at = old.meta.updated_at;
                assert_eq!(&restored, old);
            } else {
                assert_eq!(new, old);
            }
        }
    }

    #[test]
    fn mutations_on_missing_ids_are_noops() {
        let mut page = seeded::<Event>();
        let before = page.store().records().to_vec();
        assert_eq!(page.delete(RecordId(999))["applied"], false);
        let out = page
            .set_status(RecordId(999), "completed", None)
            .expect("no error");
        assert_eq!(out["applied"], false);
        assert_eq!(page.store().records(), before.as_slice());
    }

    #[test]
    fn invalid_status_maps_to_validation_failed() {
        let mut page = seeded::<Query>();
        let err = page.set_status(RecordId(1), "escalated", None).unwrap_err();
        assert_eq!(err.code(), "validation_failed");
    }

    #[test]
    fn groups_reject_unknown_facets() {
        let page = seeded::<Student>();
        let err = page.groups("hostel", &Criteria::new()).unwrap_err();
        assert_eq!(err.code(), "bad_params");
        let out = page.groups("branch", &Criteria::new()).expect("groups");
        assert_eq!(out["groups"][0]["key"], "CSE");
    }

    #[test]
    fn criteria_params_accept_numbers_and_all() {
        let criteria = criteria_from_params(&json!({
            "search": "",
            "filters": { "year": 2, "status": "all" },
            "sort": "cgpa"
        }))
        .expect("criteria");
        let page = seeded::<Student>();
        let out = page.list(&criteria).expect("list");
        assert!(out["records"]
            .as_array()
            .expect("records")
            .iter()
            .all(|r| r["year"] == 2));
        assert!(criteria_from_params(&json!({ "filters": [] })).is_err());
    }

    #[test]
    fn loans_reject_form_flow() {
        let mut pages = Pages::default();
        let loans = pages.get_mut("loans").expect("loans page");
        assert_eq!(loans.form_create().unwrap_err().code(), "not_supported");
    }

    #[test]
    fn commit_reports_missing_fields_in_details() {
        let mut page = seeded::<Course>();
        page.form_create().expect("open");
        let err = page.form_commit().unwrap_err();
        assert_eq!(err.code(), "validation_failed");
        assert_eq!(
            err.details(),
            Some(json!({ "missing": ["name", "code", "department"] }))
        );
    }
}
