use crate::ipc::error::{err, ok};
use crate::ipc::params::{id_param, opt_date_param, opt_u64_param, str_param};
use crate::ipc::types::{AppState, Request};
use crate::page::to_json;
use serde_json::json;
use std::convert::Infallible;
use tracing::debug;

const DEFAULT_MAX_MARKS: u64 = 100;

fn handle_assignments_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = &req.params;
    let parsed = id_param(p, "id").and_then(|id| {
        let title = str_param(p, "title")?.trim();
        if title.is_empty() {
            return Err("title must not be empty".to_string());
        }
        let max_marks = opt_u64_param(p, "maxMarks")?.unwrap_or(DEFAULT_MAX_MARKS);
        if !(1..=1000).contains(&max_marks) {
            return Err("maxMarks must be in 1..=1000".to_string());
        }
        Ok((id, title, opt_date_param(p, "dueDate")?, max_marks as u32))
    });
    let (id, title, due_date, max_marks) = match parsed {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    let store = state.pages.courses.store_mut();
    let applied = store
        .update(id, |c| {
            c.add_assignment(title, due_date, max_marks);
            Ok::<(), Infallible>(())
        })
        .unwrap_or(false);
    if !applied {
        debug!(%id, "assignment skipped, no such course");
    }
    ok(
        &req.id,
        json!({
            "applied": applied,
            "id": id,
            "record": store.get(id).map(to_json),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.assignments.add" => Some(handle_assignments_add(state, req)),
        _ => None,
    }
}
