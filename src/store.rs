//! In-memory record store and the filter/search projector over it.

use crate::domain::record::{InsertAt, Record, RecordId, RecordMeta};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Group label for records without a value for the grouping facet.
pub const UNSPECIFIED_GROUP: &str = "unspecified";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("{kind} cannot be filtered by `{facet}`")]
    UnknownFacet { kind: &'static str, facet: String },
    #[error("{kind} cannot be sorted by `{key}`")]
    UnknownSortKey { kind: &'static str, key: String },
}

/// Search text, categorical filters and an optional sort key.
///
/// Empty values and `"all"` leave a criterion unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    search: Option<String>,
    filters: Vec<(String, String)>,
    sort: Option<String>,
}

fn is_set(v: &str) -> bool {
    let v = v.trim();
    !v.is_empty() && !v.eq_ignore_ascii_case("all")
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whitespace-only text leaves search unset; otherwise the needle is
    /// matched as given, ignoring case.
    pub fn search(mut self, text: &str) -> Self {
        self.search = (!text.trim().is_empty()).then(|| text.to_lowercase());
        self
    }

    pub fn filter(mut self, facet: &str, value: &str) -> Self {
        if is_set(value) {
            self.filters.push((facet.to_string(), value.to_string()));
        }
        self
    }

    pub fn sort_by(mut self, key: &str) -> Self {
        self.sort = is_set(key).then(|| key.trim().to_string());
        self
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn validate<R: Record>(&self) -> Result<(), CriteriaError> {
        for (facet, _) in &self.filters {
            if !R::FACETS.contains(&facet.as_str()) {
                return Err(CriteriaError::UnknownFacet {
                    kind: R::KIND,
                    facet: facet.clone(),
                });
            }
        }
        if let Some(key) = &self.sort {
            if !R::SORT_KEYS.contains(&key.as_str()) {
                return Err(CriteriaError::UnknownSortKey {
                    kind: R::KIND,
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        if let Some(needle) = &self.search {
            if !record.matches_search(needle) {
                return false;
            }
        }
        self.filters.iter().all(|(facet, wanted)| {
            record
                .facet(facet)
                .is_some_and(|v| v == *wanted)
        })
    }
}

#[derive(Debug, Clone)]
pub struct RecordStore<R> {
    records: Vec<R>,
    next_id: u64,
}

impl<R: Record> Default for RecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> RecordStore<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    #[cfg(test)]
    pub fn with_records(records: Vec<R>) -> Self {
        let mut store = Self::new();
        store.load(records);
        store
    }

    /// Replaces the contents wholesale. Records arriving without an id, or
    /// with one already taken, get a fresh one.
    pub fn load(&mut self, records: Vec<R>) {
        let mut seen = HashSet::new();
        self.next_id = records
            .iter()
            .map(|r| r.id().0)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        let mut out = Vec::with_capacity(records.len());
        for mut record in records {
            record.on_load();
            let id = record.id();
            if id.0 == 0 || !seen.insert(id) {
                let fresh = self.allocate_id();
                record.meta_mut().id = fresh;
                seen.insert(fresh);
            }
            out.push(record);
        }
        self.records = out;
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.next_id = 1;
    }

    fn allocate_id(&mut self) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    #[cfg(test)]
    pub fn contains(&self, id: RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Records matching every active criterion, in store order unless a
    /// sort key is set. Sorting is stable.
    pub fn project(&self, criteria: &Criteria) -> Vec<&R> {
        let mut out: Vec<&R> = self
            .records
            .iter()
            .filter(|r| criteria.matches(*r))
            .collect();
        if let Some(key) = criteria.sort_key() {
            out.sort_by(|a, b| match (a.sort_value(key), b.sort_value(key)) {
                (Some(x), Some(y)) => x.compare(&y),
                _ => std::cmp::Ordering::Equal,
            });
        }
        out
    }

    /// Projection clustered by one facet. Groups appear in order of first
    /// appearance and keep projector order inside.
    pub fn group_by(&self, facet: &str, criteria: &Criteria) -> Vec<(String, Vec<&R>)> {
        let mut groups: Vec<(String, Vec<&R>)> = Vec::new();
        for record in self.project(criteria) {
            let key = record
                .facet(facet)
                .unwrap_or_else(|| UNSPECIFIED_GROUP.to_string());
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(record),
                None => groups.push((key, vec![record])),
            }
        }
        groups
    }

    /// Assigns an id, stamps creation time and inserts at the page's
    /// preferred end.
    pub fn insert(&mut self, mut record: R) -> RecordId {
        let id = self.allocate_id();
        let meta = record.meta_mut();
        *meta = RecordMeta::draft();
        meta.id = id;
        match R::INSERT_AT {
            InsertAt::Front => self.records.insert(0, record),
            InsertAt::Back => self.records.push(record),
        }
        id
    }

    /// Swaps in `record` for the stored one with the same id, keeping the
    /// stored id and creation time. Returns false when the id is absent.
    pub fn replace(&mut self, mut record: R) -> bool {
        let id = record.id();
        let Some(slot) = self.records.iter_mut().find(|r| r.id() == id) else {
            return false;
        };
        record.preserve_system_fields(slot);
        let created_at = slot.meta().created_at;
        let meta = record.meta_mut();
        meta.id = id;
        meta.created_at = created_at;
        meta.touch();
        *slot = record;
        true
    }

    /// Runs `f` against the record with `id` and refreshes its update time
    /// when `f` succeeds. `Ok(false)` when no such record exists.
    pub fn update<E>(
        &mut self,
        id: RecordId,
        f: impl FnOnce(&mut R) -> Result<(), E>,
    ) -> Result<bool, E> {
        let Some(slot) = self.records.iter_mut().find(|r| r.id() == id) else {
            return Ok(false);
        };
        let mut next = slot.clone();
        f(&mut next)?;
        next.meta_mut().touch();
        *slot = next;
        Ok(true)
    }

    pub fn remove(&mut self, id: RecordId) -> Option<R> {
        let pos = self.records.iter().position(|r| r.id() == id)?;
        Some(self.records.remove(pos))
    }

    pub fn stats(&self) -> Value {
        R::stats(&self.records)
    }
}
