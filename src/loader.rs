//! Background page loads.
//!
//! A load runs on its own thread and reports back over a channel. The main
//! loop applies completions between requests; each completion carries the
//! page generation it was issued for, and pages drop completions whose
//! generation has moved on (remounted or unmounted).

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// Built-in mock records.
    Seed,
    /// JSON file holding a fetch response envelope.
    File(PathBuf),
}

impl LoadSource {
    pub fn label(&self) -> &'static str {
        match self {
            LoadSource::Seed => "seed",
            LoadSource::File(_) => "file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub page: &'static str,
    pub generation: u64,
    pub correlation: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Seed,
    Rows(Vec<Value>),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Rejected(String),
    #[error("response has no `{0}` array")]
    MissingPayload(&'static str),
    #[error("record {index} is malformed: {message}")]
    Decode { index: usize, message: String },
}

#[derive(Debug)]
pub struct Completion {
    pub ticket: Ticket,
    pub result: Result<Payload, LoadError>,
}

/// Reads a fetch envelope: `{"success": bool, "<field>": [...], "message"?}`.
pub fn parse_envelope(raw: &str, field: &'static str) -> Result<Vec<Value>, LoadError> {
    let envelope: Value = serde_json::from_str(raw)?;
    let success = envelope
        .get("success")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !success {
        let message = envelope
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("request failed")
            .to_string();
        return Err(LoadError::Rejected(message));
    }
    match envelope.get(field) {
        Some(Value::Array(rows)) => Ok(rows.clone()),
        _ => Err(LoadError::MissingPayload(field)),
    }
}

fn read_envelope(path: &Path, field: &'static str) -> Result<Vec<Value>, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_envelope(&raw, field)
}

pub struct Loader {
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    in_flight: usize,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn spawn(
        &mut self,
        ticket: Ticket,
        source: LoadSource,
        envelope_field: &'static str,
        delay: Duration,
    ) {
        debug!(
            page = ticket.page,
            generation = ticket.generation,
            correlation = %ticket.correlation,
            source = source.label(),
            delay_ms = delay.as_millis() as u64,
            "load.start"
        );
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            let result = match &source {
                LoadSource::Seed => Ok(Payload::Seed),
                LoadSource::File(path) => read_envelope(path, envelope_field).map(Payload::Rows),
            };
            // The receiver only goes away at shutdown.
            let _ = tx.send(Completion { ticket, result });
        });
    }

    /// Completions that have already arrived, without blocking.
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut out = Vec::new();
        while let Ok(done) = self.rx.try_recv() {
            out.push(done);
        }
        self.in_flight = self.in_flight.saturating_sub(out.len());
        out
    }

    /// Blocks until every spawned load has reported or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Vec<Completion> {
        let deadline = Instant::now() + timeout;
        let mut out = Vec::new();
        while self.in_flight > out.len() {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(done) => out.push(done),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        outstanding = self.in_flight - out.len(),
                        "load.wait timed out"
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.in_flight = self.in_flight.saturating_sub(out.len());
        out
    }
}
