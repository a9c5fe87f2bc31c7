use crate::domain::catalog::all_catalogs;
use crate::ipc::error::{err, ok};
use crate::ipc::params::{opt_u64_param, str_param};
use crate::ipc::types::{AppState, Request};
use crate::page::Pages;
use crate::settings::{SettingsPort, SqlitePort};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "settingsBackend": state.settings.backend(),
            "pendingLoads": state.loader.in_flight(),
            "pages": Pages::KINDS,
        }),
    )
}

/// Switches settings persistence to the workspace database.
pub fn select_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let port = SqlitePort::open(path)?;
    state.settings = Box::new(port) as Box<dyn SettingsPort>;
    state.workspace = Some(path.to_path_buf());
    info!(workspace = %path.display(), "workspace selected");
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match str_param(&req.params, "path") {
        Ok(p) => PathBuf::from(p),
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    match select_workspace(state, &path) {
        Ok(()) => ok(&req.id, json!({ "workspacePath": path.to_string_lossy() })),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:#}"), None),
    }
}

fn handle_catalogs_get(req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "catalogs": all_catalogs() }))
}

fn handle_loads_wait(state: &mut AppState, req: &Request) -> serde_json::Value {
    let timeout = match opt_u64_param(&req.params, "timeoutMs") {
        Ok(Some(ms)) => Duration::from_millis(ms),
        Ok(None) => state.config.load_timeout,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let completions = state.loader.wait(timeout);
    let received = completions.len();
    let applied = state.apply_completions(completions);
    ok(
        &req.id,
        json!({
            "received": received,
            "applied": applied,
            "outstanding": state.loader.in_flight(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "catalogs.get" => Some(handle_catalogs_get(req)),
        "loads.wait" => Some(handle_loads_wait(state, req)),
        _ => None,
    }
}
