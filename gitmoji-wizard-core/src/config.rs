use anyhow::{Context, Result};
use console::style;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// boolean `commit` flags that `start` may turn on by default
pub const COMMIT_FLAGS: &[&str] = &["add", "dry", "keep-alive", "push", "sign", "simple"];

/// which built-in emoji list the wizard offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmojiSet {
    #[default]
    Gitmoji,
    AiDevmojis,
}

impl EmojiSet {
    pub const ALL: [EmojiSet; 2] = [EmojiSet::Gitmoji, EmojiSet::AiDevmojis];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmojiSet::Gitmoji => "gitmoji",
            EmojiSet::AiDevmojis => "ai-devmojis",
        }
    }
}

impl fmt::Display for EmojiSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// arguments replayed by `start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultCommitArgs {
    /// path to the git repository
    pub repo: String,
    /// comma-separated list of remotes to push to
    pub remote: String,
}

impl Default for DefaultCommitArgs {
    fn default() -> Self {
        Self {
            repo: ".".to_string(),
            remote: "origin".to_string(),
        }
    }
}

impl DefaultCommitArgs {
    pub fn remotes(&self) -> Vec<String> {
        self.remote
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// user configuration, stored values merged over these defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub skip_scope: bool,
    pub skip_message: bool,
    pub capitalize_title: bool,
    pub enable_history: bool,
    pub emoji_set: EmojiSet,
    pub default_commit_flags: Vec<String>,
    pub default_commit_args: DefaultCommitArgs,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skip_scope: false,
            skip_message: false,
            capitalize_title: true,
            enable_history: true,
            emoji_set: EmojiSet::default(),
            default_commit_flags: Vec::new(),
            default_commit_args: DefaultCommitArgs::default(),
        }
    }
}

impl Config {
    /// `(key, value)` pairs in declaration order, for display
    pub fn entries(&self) -> Vec<(String, String)> {
        vec![
            ("skip_scope".into(), self.skip_scope.to_string()),
            ("skip_message".into(), self.skip_message.to_string()),
            ("capitalize_title".into(), self.capitalize_title.to_string()),
            ("enable_history".into(), self.enable_history.to_string()),
            ("emoji_set".into(), self.emoji_set.to_string()),
            (
                "default_commit_flags".into(),
                format!("[{}]", self.default_commit_flags.join(", ")),
            ),
            (
                "default_commit_args".into(),
                format!(
                    "repo={}, remote={}",
                    self.default_commit_args.repo, self.default_commit_args.remote
                ),
            ),
        ]
    }
}

/// reasons a configuration is refused before it is written
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown config key `{0}`")]
    UnknownKey(String),
    #[error("config key `{key}` must be of type {expected}, found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("unknown emoji set `{0}` (expected one of: gitmoji, ai-devmojis)")]
    UnknownEmojiSet(String),
    #[error("unknown commit flag `{0}` (expected one of: {flags})", flags = COMMIT_FLAGS.join(", "))]
    UnknownCommitFlag(String),
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },
}

fn expected_type(key: &str) -> Option<&'static str> {
    match key {
        "skip_scope" | "skip_message" | "capitalize_title" | "enable_history" => Some("boolean"),
        "emoji_set" => Some("string"),
        "default_commit_flags" => Some("array"),
        "default_commit_args" => Some("table"),
        "default_commit_args.repo" | "default_commit_args.remote" => Some("string"),
        _ => None,
    }
}

fn check_type(key: &str, value: &toml::Value) -> Result<(), ConfigError> {
    let expected = expected_type(key).ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    if value.type_str() != expected {
        return Err(ConfigError::WrongType {
            key: key.to_string(),
            expected,
            found: value.type_str(),
        });
    }
    Ok(())
}

/// validate a raw config table and turn it into a [`Config`]
pub fn check_config(table: &toml::Table) -> Result<Config, ConfigError> {
    for (key, value) in table {
        check_type(key, value)?;

        match (key.as_str(), value) {
            ("emoji_set", toml::Value::String(name)) => {
                if !EmojiSet::ALL.iter().any(|set| set.as_str() == name) {
                    return Err(ConfigError::UnknownEmojiSet(name.clone()));
                }
            }
            ("default_commit_flags", toml::Value::Array(flags)) => {
                for flag in flags {
                    match flag.as_str() {
                        Some(name) if COMMIT_FLAGS.contains(&name) => {}
                        Some(name) => return Err(ConfigError::UnknownCommitFlag(name.to_string())),
                        None => {
                            return Err(ConfigError::WrongType {
                                key: "default_commit_flags".to_string(),
                                expected: "array of strings",
                                found: flag.type_str(),
                            });
                        }
                    }
                }
            }
            ("default_commit_args", toml::Value::Table(args)) => {
                for (sub_key, sub_value) in args {
                    check_type(&format!("default_commit_args.{sub_key}"), sub_value)?;
                }
            }
            _ => {}
        }
    }

    toml::Value::Table(table.clone())
        .try_into::<Config>()
        .map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            reason: e.to_string(),
        })
}

/// parse a `--set` value: a toml literal when it is one, a plain string otherwise
pub fn parse_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("value = {raw}"))
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

/// reads and writes `config.toml`
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// load the stored configuration merged over the defaults
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", self.path.display()))
    }

    /// the raw stored table, empty when nothing was saved yet
    pub fn load_table(&self) -> Result<toml::Table> {
        if !self.path.exists() {
            return Ok(toml::Table::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        content
            .parse::<toml::Table>()
            .with_context(|| format!("failed to parse config file {}", self.path.display()))
    }

    /// whether `key` was explicitly saved by the user
    pub fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.load_table()?.contains_key(key))
    }

    pub fn save(&self, config: &Config) -> Result<Config> {
        let table = toml::Table::try_from(config).context("failed to serialise config")?;
        self.save_table(&table)
    }

    /// validate then write a raw table; nothing is written when validation fails
    pub fn save_table(&self, table: &toml::Table) -> Result<Config> {
        let config = check_config(table)?;

        if !self.path.exists() {
            println!(
                "{} {}",
                style("creating config file").yellow().bold(),
                self.path.display()
            );
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(table).context("failed to serialise config")?;
        fs::write(&self.path, content)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        println!("{}", style("✅ config updated").green());

        Ok(config)
    }

    /// apply `key=value` assignments (dotted keys reach into tables) and save
    pub fn apply(&self, assignments: &[String]) -> Result<Config> {
        let mut table = self.load_table()?;

        for assignment in assignments {
            let (key, raw) = assignment
                .split_once('=')
                .with_context(|| format!("expected KEY=VALUE, got `{assignment}`"))?;
            let key = key.trim();
            let value = parse_value(raw.trim());

            match key.split_once('.') {
                Some((parent, child)) => {
                    let entry = table
                        .entry(parent.to_string())
                        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
                    match entry {
                        toml::Value::Table(inner) => {
                            inner.insert(child.to_string(), value);
                        }
                        other => {
                            return Err(ConfigError::WrongType {
                                key: parent.to_string(),
                                expected: "table",
                                found: other.type_str(),
                            }
                            .into());
                        }
                    }
                }
                None => {
                    table.insert(key.to_string(), value);
                }
            }
        }

        self.save_table(&table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.toml"));
        (dir, store)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let (_dir, store) = store();
        let config = store.load().unwrap();
        assert_eq!(config, Config::default());
        assert!(config.capitalize_title);
        assert!(config.enable_history);
        assert_eq!(config.default_commit_args.repo, ".");
    }

    #[test]
    fn stored_values_win_over_defaults() {
        let (_dir, store) = store();
        fs::write(
            store.path(),
            "skip_scope = true\nemoji_set = \"ai-devmojis\"\n[default_commit_args]\nremote = \"fork\"\n",
        )
        .unwrap();

        let config = store.load().unwrap();
        assert!(config.skip_scope);
        assert!(!config.skip_message);
        assert_eq!(config.emoji_set, EmojiSet::AiDevmojis);
        assert_eq!(config.default_commit_args.remote, "fork");
        assert_eq!(config.default_commit_args.repo, ".");
    }

    #[test]
    fn save_then_load_keeps_values() {
        let (_dir, store) = store();
        let config = Config {
            skip_message: true,
            default_commit_flags: vec!["push".into(), "keep-alive".into()],
            ..Config::default()
        };
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
        assert!(store.has_key("default_commit_args").unwrap());
    }

    #[rstest]
    #[case("colour = true", ConfigError::UnknownKey("colour".into()))]
    #[case(
        "skip_scope = \"yes\"",
        ConfigError::WrongType { key: "skip_scope".into(), expected: "boolean", found: "string" }
    )]
    #[case("emoji_set = \"kaomoji\"", ConfigError::UnknownEmojiSet("kaomoji".into()))]
    #[case("default_commit_flags = [\"force\"]", ConfigError::UnknownCommitFlag("force".into()))]
    #[case(
        "[default_commit_args]\nbranch = \"main\"",
        ConfigError::UnknownKey("default_commit_args.branch".into())
    )]
    fn invalid_tables_are_rejected(#[case] content: &str, #[case] expected: ConfigError) {
        let table: toml::Table = content.parse().unwrap();
        assert_eq!(check_config(&table).unwrap_err(), expected);
    }

    #[test]
    fn rejected_save_leaves_previous_file_untouched() {
        let (_dir, store) = store();
        store.save(&Config::default()).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let err = store.apply(&["unknown_key=1".to_string()]).unwrap_err();
        assert!(err.to_string().contains("unknown config key"));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn apply_parses_literals_and_dotted_keys() {
        let (_dir, store) = store();
        let config = store
            .apply(&[
                "skip_scope=true".to_string(),
                "default_commit_args.remote=origin, fork".to_string(),
                "default_commit_flags=[\"push\"]".to_string(),
            ])
            .unwrap();

        assert!(config.skip_scope);
        assert_eq!(config.default_commit_args.remotes(), vec!["origin", "fork"]);
        assert_eq!(config.default_commit_flags, vec!["push"]);
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn parse_value_falls_back_to_string() {
        assert_eq!(parse_value("true"), toml::Value::Boolean(true));
        assert_eq!(parse_value("gitmoji"), toml::Value::String("gitmoji".into()));
        assert_eq!(parse_value("\"quoted\""), toml::Value::String("quoted".into()));
    }
}
