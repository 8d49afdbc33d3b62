//! Runtime permission grants for a terminal host.
//!
//! Answers live in `<data_dir>/permissions.json`, keyed by permission kind.
//! A missing or unreadable file means every kind is Unknown.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use super::flow::PermissionGate;
use super::types::{PermissionKind, PermissionState};

#[derive(Serialize, Deserialize, Clone, Debug)]
struct GrantEntry {
    state: PermissionState,
    /// UTC millis of the user's answer.
    decided_at: i64,
}

/// The persisted grant table.
pub struct PermissionStore {
    path: PathBuf,
    entries: HashMap<PermissionKind, GrantEntry>,
}

impl PermissionStore {
    pub const FILE_NAME: &'static str = "permissions.json";

    /// Load the store from `<data_dir>/permissions.json`.
    pub fn load_in(data_dir: &Path) -> Self {
        Self::load_from(data_dir.join(Self::FILE_NAME))
    }

    pub fn load_from(path: PathBuf) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        Self { path, entries }
    }

    fn read_file(path: &Path) -> Option<HashMap<PermissionKind, GrantEntry>> {
        let data = match fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read permission store");
                return None;
            }
        };
        match serde_json::from_str(&data) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt permission store");
                None
            }
        }
    }

    pub fn state(&self, kind: PermissionKind) -> PermissionState {
        self.entries.get(&kind).map(|e| e.state).unwrap_or_default()
    }

    /// Record an answer and persist. Unknown answers (dismissed prompts) are not stored.
    pub fn record(&mut self, kind: PermissionKind, state: PermissionState) -> io::Result<()> {
        if state == PermissionState::Unknown {
            return Ok(());
        }
        let entry = GrantEntry {
            state,
            decided_at: chrono::Utc::now().timestamp_millis(),
        };
        self.entries.insert(kind, entry);
        self.persist()
    }

    /// Forget the answer for `kind`, so the next fetch prompts again.
    pub fn reset(&mut self, kind: PermissionKind) -> io::Result<bool> {
        let removed = self.entries.remove(&kind).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    fn persist(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// How the permission prompt gets answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptPolicy {
    /// Ask on the terminal.
    #[default]
    Ask,
    Grant,
    Deny,
}

/// Permission gate backed by a [`PermissionStore`] and a terminal prompt.
pub struct TerminalPermissions {
    store: Mutex<PermissionStore>,
    policy: PromptPolicy,
}

impl TerminalPermissions {
    pub fn new(store: PermissionStore, policy: PromptPolicy) -> Self {
        Self { store: Mutex::new(store), policy }
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut PermissionStore) -> T) -> T {
        match self.store.lock() {
            Ok(mut s) => f(&mut s),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    async fn prompt(&self, kind: PermissionKind) -> PermissionState {
        match self.policy {
            PromptPolicy::Grant => PermissionState::Granted,
            PromptPolicy::Deny => PermissionState::Denied,
            PromptPolicy::Ask => {
                let question = format!("Allow gambia to access this device's {}? [y/N] ", kind);
                match tokio::task::spawn_blocking(move || ask_terminal(&question)).await {
                    Ok(Ok(answer)) => answer,
                    Ok(Err(e)) => {
                        warn!(error = %e, "permission prompt failed");
                        PermissionState::Unknown
                    }
                    Err(e) => {
                        warn!(error = %e, "permission prompt task aborted");
                        PermissionState::Unknown
                    }
                }
            }
        }
    }
}

impl PermissionGate for TerminalPermissions {
    fn check(&self, kind: PermissionKind) -> PermissionState {
        self.with_store(|s| s.state(kind))
    }

    async fn request(&self, kind: PermissionKind) -> PermissionState {
        let answer = self.prompt(kind).await;
        debug!(%kind, %answer, "permission prompt answered");
        if let Err(e) = self.with_store(|s| s.record(kind, answer)) {
            warn!(error = %e, "could not persist permission answer");
        }
        answer
    }
}

fn ask_terminal(question: &str) -> io::Result<PermissionState> {
    let mut stderr = io::stderr();
    stderr.write_all(question.as_bytes())?;
    stderr.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        // EOF: the prompt was dismissed.
        return Ok(PermissionState::Unknown);
    }
    Ok(parse_answer(&line))
}

fn parse_answer(line: &str) -> PermissionState {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" | "allow" => PermissionState::Granted,
        _ => PermissionState::Denied,
    }
}
