//! Methods every page answers: `<page>.<op>`.

use crate::ipc::error::{err, ok, page_err};
use crate::ipc::params::{id_param, obj_param, opt_str_param, opt_u64_param, str_param};
use crate::ipc::types::{AppState, Request};
use crate::loader::{LoadSource, Ticket};
use crate::page::{criteria_from_params, PageError, PageOps, Pages};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

fn reply(req: &Request, result: Result<Value, PageError>) -> Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => page_err(&req.id, &e),
    }
}

fn load_source(params: &Value) -> Result<LoadSource, String> {
    match opt_str_param(params, "source")?.unwrap_or("seed") {
        "seed" => Ok(LoadSource::Seed),
        "file" => Ok(LoadSource::File(PathBuf::from(str_param(params, "path")?))),
        other => Err(format!("unknown load source: {}", other)),
    }
}

fn handle_load(state: &mut AppState, req: &Request, kind: &'static str) -> Value {
    let source = match load_source(&req.params) {
        Ok(s) => s,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let delay = match opt_u64_param(&req.params, "delayMs") {
        Ok(ms) => Duration::from_millis(ms.unwrap_or(0)),
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let Some(page) = state.pages.get_mut(kind) else {
        return err(&req.id, "not_found", format!("unknown page: {}", kind), None);
    };
    let generation = page.begin_load();
    let envelope_field = page.envelope_field();
    let ticket = Ticket {
        page: kind,
        generation,
        correlation: Uuid::new_v4(),
    };
    let correlation = ticket.correlation;
    let source_label = source.label();
    state.loader.spawn(ticket, source, envelope_field, delay);
    ok(
        &req.id,
        json!({
            "page": kind,
            "generation": generation,
            "ticket": correlation.to_string(),
            "source": source_label,
        }),
    )
}

fn handle_page_op(page: &mut dyn PageOps, req: &Request, op: &str) -> Option<Value> {
    let p = &req.params;
    let bad = |msg: String| err(&req.id, "bad_params", msg, None);
    let resp = match op {
        "unmount" => {
            page.unmount();
            ok(&req.id, page.state())
        }
        "state" => ok(&req.id, page.state()),
        "banner.dismiss" => {
            page.dismiss_banner();
            ok(&req.id, page.state())
        }
        "list" => reply(req, criteria_from_params(p).and_then(|c| page.list(&c))),
        "groups" => match str_param(p, "by") {
            Ok(by) => reply(req, criteria_from_params(p).and_then(|c| page.groups(by, &c))),
            Err(msg) => bad(msg),
        },
        "stats" => ok(&req.id, page.stats()),
        "get" => match id_param(p, "id") {
            Ok(id) => reply(req, page.get(id)),
            Err(msg) => bad(msg),
        },
        "form.create" => reply(req, page.form_create()),
        "form.edit" => match id_param(p, "id") {
            Ok(id) => reply(req, page.form_edit(id)),
            Err(msg) => bad(msg),
        },
        "form.patch" => match obj_param(p, "fields") {
            Ok(fields) => reply(req, page.form_patch(fields)),
            Err(msg) => bad(msg),
        },
        "form.get" => ok(&req.id, page.form_get()),
        "form.cancel" => ok(&req.id, page.form_cancel()),
        "form.commit" => reply(req, page.form_commit()),
        "delete" => match id_param(p, "id") {
            Ok(id) => ok(&req.id, page.delete(id)),
            Err(msg) => bad(msg),
        },
        "toggle" => {
            let field = match opt_str_param(p, "field") {
                Ok(f) => f.unwrap_or("isActive"),
                Err(msg) => return Some(bad(msg)),
            };
            match id_param(p, "id") {
                Ok(id) => reply(req, page.toggle(id, field)),
                Err(msg) => bad(msg),
            }
        }
        "setStatus" => {
            let parsed = id_param(p, "id").and_then(|id| {
                let status = str_param(p, "status")?;
                let remarks = opt_str_param(p, "remarks")?;
                Ok((id, status, remarks))
            });
            match parsed {
                Ok((id, status, remarks)) => reply(req, page.set_status(id, status, remarks)),
                Err(msg) => bad(msg),
            }
        }
        _ => return None,
    };
    Some(resp)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let (kind, op) = req.method.split_once('.')?;
    let kind: &'static str = Pages::KINDS.iter().copied().find(|k| *k == kind)?;
    if op == "load" {
        return Some(handle_load(state, req, kind));
    }
    let page = state.pages.get_mut(kind)?;
    handle_page_op(page, req, op)
}
