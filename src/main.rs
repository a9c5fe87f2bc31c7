mod config;
mod db;
mod domain;
mod form;
mod ipc;
mod loader;
mod page;
mod settings;
mod store;

use std::io::{self, BufRead, Write};

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(filter: &str) {
    // stdout carries responses; logs go to stderr.
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn write_line(stdout: &mut impl Write, value: &serde_json::Value) -> io::Result<()> {
    let line = serde_json::to_string(value).unwrap_or_else(|_| "{\"ok\":false}".to_string());
    writeln!(stdout, "{}", line)?;
    stdout.flush()
}

fn main() {
    let config = config::Config::from_env();
    init_tracing(&config.log_filter);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        autoload_seed = config.autoload_seed,
        "erpd starting"
    );

    let workspace = config.workspace.clone();
    let mut state = ipc::AppState::new(config);
    if let Some(path) = workspace {
        if let Err(e) = ipc::select_workspace(&mut state, &path) {
            warn!(workspace = %path.display(), error = %format!("{e:#}"), "preselected workspace not opened");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        // Loads that finished while we were idle land before the request runs.
        let applied = state.pump();
        if applied > 0 {
            debug!(applied, "load results applied");
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => {
                debug!(id = %req.id, method = %req.method, "request");
                ipc::handle_request(&mut state, req)
            }
            Err(e) => {
                warn!(error = %e, "malformed request line");
                ipc::bad_json(e.to_string())
            }
        };
        if write_line(&mut stdout, &resp).is_err() {
            break;
        }
    }
    info!("stdin closed, shutting down");
}
