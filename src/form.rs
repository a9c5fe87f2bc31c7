//! Create/edit form controller.
//!
//! A page has at most one draft in flight. Editing always knows which
//! record it started from, so there is no "edit with nothing selected".

use crate::domain::record::{Record, RecordId, META_FIELDS};
use crate::store::RecordStore;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum FormState<R> {
    Closed,
    Creating {
        draft: R,
    },
    Editing {
        original_id: RecordId,
        draft: R,
    },
}

impl<R> FormState<R> {
    pub fn mode(&self) -> &'static str {
        match self {
            FormState::Closed => "closed",
            FormState::Creating { .. } => "creating",
            FormState::Editing { .. } => "editing",
        }
    }

    pub fn draft(&self) -> Option<&R> {
        match self {
            FormState::Closed => None,
            FormState::Creating { draft } | FormState::Editing { draft, .. } => Some(draft),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("no form is open")]
    NoDraft,
    #[error("{kind} records are not edited through the form")]
    Disabled { kind: &'static str },
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: RecordId },
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("field `{0}` is managed by the system")]
    SystemField(String),
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Created(RecordId),
    Updated(RecordId),
    /// The edited record was deleted while the form was open.
    Vanished(RecordId),
}

#[derive(Debug, Clone)]
pub struct FormController<R> {
    state: FormState<R>,
}

impl<R: Record> Default for FormController<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> FormController<R> {
    pub fn new() -> Self {
        Self {
            state: FormState::Closed,
        }
    }

    pub fn state(&self) -> &FormState<R> {
        &self.state
    }

    fn ensure_enabled() -> Result<(), FormError> {
        if R::FORM_ENABLED {
            Ok(())
        } else {
            Err(FormError::Disabled { kind: R::KIND })
        }
    }

    pub fn open_create(&mut self) -> Result<&R, FormError> {
        Self::ensure_enabled()?;
        self.state = FormState::Creating {
            draft: R::template(),
        };
        self.state.draft().ok_or(FormError::NoDraft)
    }

    /// Leaves the current state alone when `id` is not in the store.
    pub fn open_edit(&mut self, store: &RecordStore<R>, id: RecordId) -> Result<&R, FormError> {
        Self::ensure_enabled()?;
        let record = store
            .get(id)
            .ok_or(FormError::NotFound { kind: R::KIND, id })?;
        self.state = FormState::Editing {
            original_id: id,
            draft: record.clone(),
        };
        self.state.draft().ok_or(FormError::NoDraft)
    }

    /// Merges editable fields into the draft. All-or-nothing: one bad field
    /// rejects the whole patch.
    pub fn patch(&mut self, fields: &Map<String, Value>) -> Result<&R, FormError> {
        let draft = match &mut self.state {
            FormState::Closed => return Err(FormError::NoDraft),
            FormState::Creating { draft } | FormState::Editing { draft, .. } => draft,
        };
        let mut doc = match serde_json::to_value(&*draft) {
            Ok(Value::Object(obj)) => obj,
            Ok(_) => return Err(FormError::InvalidValue("draft is not an object".into())),
            Err(e) => return Err(FormError::InvalidValue(e.to_string())),
        };
        for (key, value) in fields {
            if META_FIELDS.contains(&key.as_str()) || R::SYSTEM_FIELDS.contains(&key.as_str()) {
                return Err(FormError::SystemField(key.clone()));
            }
            if !doc.contains_key(key) {
                return Err(FormError::UnknownField(key.clone()));
            }
            doc.insert(key.clone(), value.clone());
        }
        let next: R = serde_json::from_value(Value::Object(doc))
            .map_err(|e| FormError::InvalidValue(e.to_string()))?;
        *draft = next;
        Ok(draft)
    }

    pub fn cancel(&mut self) {
        if !matches!(self.state, FormState::Closed) {
            debug!(kind = R::KIND, mode = self.state.mode(), "form cancelled");
        }
        self.state = FormState::Closed;
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        self.state
            .draft()
            .map(|d| d.missing_required())
            .unwrap_or_default()
    }

    pub fn can_commit(&self) -> bool {
        self.state.draft().is_some() && self.missing_required().is_empty()
    }

    /// Writes the draft into `store` and closes the form. On a validation
    /// failure the draft stays open untouched.
    pub fn commit(&mut self, store: &mut RecordStore<R>) -> Result<CommitOutcome, FormError> {
        let missing = match self.state.draft() {
            None => return Err(FormError::NoDraft),
            Some(draft) => draft.missing_required(),
        };
        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }
        match std::mem::replace(&mut self.state, FormState::Closed) {
            FormState::Closed => Err(FormError::NoDraft),
            FormState::Creating { mut draft } => {
                draft.on_create();
                Ok(CommitOutcome::Created(store.insert(draft)))
            }
            FormState::Editing {
                original_id,
                mut draft,
            } => {
                draft.meta_mut().id = original_id;
                if store.replace(draft) {
                    Ok(CommitOutcome::Updated(original_id))
                } else {
                    Ok(CommitOutcome::Vanished(original_id))
                }
            }
        }
    }
}
