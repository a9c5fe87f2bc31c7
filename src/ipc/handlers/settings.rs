use crate::ipc::error::{err, ok, settings_err};
use crate::ipc::params::{obj_param, str_param};
use crate::ipc::types::{AppState, Request};
use crate::settings::{self, Role, Section};
use serde_json::json;

fn parse_role(req: &Request) -> Result<Role, serde_json::Value> {
    let raw = str_param(&req.params, "role").map_err(|m| err(&req.id, "bad_params", m, None))?;
    Role::parse(raw).map_err(|e| settings_err(&req.id, &e))
}

fn reply(state: &AppState, req: &Request, role: Role, doc: serde_json::Value) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "role": role.as_str(),
            "backend": state.settings.backend(),
            "settings": doc,
        }),
    )
}

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let role = match parse_role(req) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match settings::load(state.settings.as_ref(), role) {
        Ok(doc) => reply(state, req, role, doc),
        Err(e) => settings_err(&req.id, &e),
    }
}

fn handle_settings_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let role = match parse_role(req) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let section = match str_param(&req.params, "section") {
        Ok(s) => match Section::parse(s) {
            Ok(section) => section,
            Err(e) => return settings_err(&req.id, &e),
        },
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let patch = match obj_param(&req.params, "patch") {
        Ok(p) => p,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    match settings::update(state.settings.as_mut(), role, section, patch) {
        Ok(doc) => reply(state, req, role, doc),
        Err(e) => settings_err(&req.id, &e),
    }
}

fn handle_settings_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    let role = match parse_role(req) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match settings::reset(state.settings.as_mut(), role) {
        Ok(doc) => reply(state, req, role, doc),
        Err(e) => settings_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.update" => Some(handle_settings_update(state, req)),
        "settings.reset" => Some(handle_settings_reset(state, req)),
        _ => None,
    }
}
