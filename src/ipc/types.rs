use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::loader::{Completion, Loader};
use crate::page::Pages;
use crate::settings::{MemoryPort, SettingsPort};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub workspace: Option<PathBuf>,
    pub settings: Box<dyn SettingsPort>,
    pub pages: Pages,
    pub loader: Loader,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let mut pages = Pages::default();
        if config.autoload_seed {
            pages.mount_all_seed();
        }
        Self {
            config,
            workspace: None,
            settings: Box::new(MemoryPort::default()),
            pages,
            loader: Loader::new(),
        }
    }

    /// Hands finished loads to their pages. Returns how many were applied.
    pub fn apply_completions(&mut self, completions: Vec<Completion>) -> usize {
        let mut applied = 0;
        for done in completions {
            let Some(page) = self.pages.get_mut(done.ticket.page) else {
                continue;
            };
            if page.complete_load(done.ticket.generation, done.result) {
                applied += 1;
            } else {
                debug!(correlation = %done.ticket.correlation, "load result dropped");
            }
        }
        applied
    }

    /// Applies whatever has arrived without blocking.
    pub fn pump(&mut self) -> usize {
        let completions = self.loader.drain();
        self.apply_completions(completions)
    }
}
