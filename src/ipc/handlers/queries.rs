use crate::domain::catalog::QueryStatus;
use crate::ipc::error::{err, ok};
use crate::ipc::params::{id_param, opt_str_param, str_param};
use crate::ipc::types::{AppState, Request};
use crate::page::to_json;
use serde_json::json;
use std::convert::Infallible;
use tracing::{debug, info};

fn handle_queries_respond(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = &req.params;
    let parsed = id_param(p, "id").and_then(|id| {
        let sender = str_param(p, "sender")?.trim();
        let message = str_param(p, "message")?.trim();
        if sender.is_empty() || message.is_empty() {
            return Err("sender and message must not be empty".to_string());
        }
        Ok((id, sender, message, opt_str_param(p, "status")?, opt_str_param(p, "assignedTo")?))
    });
    let (id, sender, message, status_raw, assigned_to) = match parsed {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let status = match status_raw.map(|s| (s, QueryStatus::parse(s))) {
        None => None,
        Some((_, Some(s))) => Some(s),
        Some((raw, None)) => {
            return err(
                &req.id,
                "validation_failed",
                format!("`{}` is not a valid queries status", raw),
                None,
            )
        }
    };

    let store = state.pages.queries.store_mut();
    let applied = store
        .update(id, |q| {
            q.respond(sender, message, status, assigned_to);
            Ok::<(), Infallible>(())
        })
        .unwrap_or(false);
    if applied {
        info!(%id, sender, "query response added");
    } else {
        debug!(%id, "respond skipped, no such query");
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
        "queries.respond" => Some(handle_queries_respond(state, req)),
        _ => None,
    }
}
