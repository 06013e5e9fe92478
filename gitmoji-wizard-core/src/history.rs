use anyhow::{Context, Result};
use console::style;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::message::CommitDetails;

/// maximum number of completions offered for a text prompt
pub const MAX_SUGGESTIONS: usize = 10;

/// one past commit, as stored in `history.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub details: CommitDetails,
    pub timestamp: i64,
}

/// the text fields the history can complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryField {
    Emoji,
    Scope,
    Title,
    Message,
}

impl HistoryField {
    fn value<'a>(&self, details: &'a CommitDetails) -> &'a str {
        match self {
            HistoryField::Emoji => &details.emoji,
            HistoryField::Scope => &details.scope,
            HistoryField::Title => &details.title,
            HistoryField::Message => &details.message,
        }
    }
}

/// append-only commit history used to rank suggestions
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    path: Option<PathBuf>,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// a history that remembers nothing and never touches the disk
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            path: None,
            entries,
        }
    }

    /// load the history file; a malformed file is reported and treated as empty
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = if path.exists() {
            match read_entries(&path) {
                Ok(entries) => entries,
                Err(e) => {
                    eprintln!(
                        "{}",
                        style(format!("error loading history from {}", path.display()))
                            .red()
                            .bold()
                    );
                    eprintln!("{}", style(format!("{e:#}")).red());
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Self {
            path: Some(path),
            entries,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// append a commit with the current timestamp and rewrite the file
    pub fn record(&mut self, details: &CommitDetails) -> Result<()> {
        self.record_at(details, now())
    }

    pub fn record_at(&mut self, details: &CommitDetails, timestamp: i64) -> Result<()> {
        self.entries.push(HistoryEntry {
            details: details.clone(),
            timestamp,
        });
        self.save()
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        if !path.exists() {
            println!(
                "{} {}\n",
                style("created history file in").green().bold(),
                path.display()
            );
        }

        let content =
            serde_json::to_string(&self.entries).context("failed to serialise history")?;
        fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// most recent timestamp at which each distinct value of `field` was used
    pub fn last_used(&self, field: HistoryField) -> HashMap<&str, i64> {
        let mut last_used: HashMap<&str, i64> = HashMap::new();
        for entry in &self.entries {
            let value = field.value(&entry.details);
            let stamp = last_used.entry(value).or_insert(entry.timestamp);
            *stamp = (*stamp).max(entry.timestamp);
        }
        last_used
    }

    /// distinct past values of `field` starting with `input` (case-insensitive),
    /// most recently used first, at most [`MAX_SUGGESTIONS`]
    pub fn suggestions(&self, field: HistoryField, input: &str) -> Vec<String> {
        let prefix = input.to_lowercase();

        // (value, last use, first appearance)
        let mut candidates: Vec<(&str, i64, usize)> = Vec::new();
        for entry in &self.entries {
            let value = field.value(&entry.details);
            if value.is_empty() {
                continue;
            }
            match candidates.iter_mut().find(|(v, _, _)| *v == value) {
                Some(candidate) => candidate.1 = candidate.1.max(entry.timestamp),
                None => candidates.push((value, entry.timestamp, candidates.len())),
            }
        }

        candidates.retain(|(value, _, _)| value.to_lowercase().starts_with(&prefix));
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        candidates
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(value, _, _)| value.to_string())
            .collect()
    }
}

fn read_entries(path: &Path) -> Result<Vec<HistoryEntry>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).context("history file is not a list of commits")
}

/// current time as epoch seconds
pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
