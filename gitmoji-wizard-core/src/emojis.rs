use anyhow::{Context, Result, bail};
use console::style;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::EmojiSet;
use crate::history::{HistoryField, HistoryStore};

/// an emoji and what it means
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Gitmoji {
    pub emoji: String,
    pub description: String,
}

impl Gitmoji {
    pub fn new(emoji: &str, description: &str) -> Self {
        Self {
            emoji: emoji.to_string(),
            description: description.to_string(),
        }
    }
}

/// one entry of the emoji prompt: what is shown and what ends up in the commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiChoice {
    pub value: String,
    pub label: String,
}

// https://gitmoji.dev
const GITMOJIS: &[(&str, &str)] = &[
    ("🎨", "Improve structure / format of the code."),
    ("⚡️", "Improve performance."),
    ("🔥", "Remove code or files."),
    ("🐛", "Fix a bug."),
    ("🚑️", "Critical hotfix."),
    ("✨", "Introduce new features."),
    ("📝", "Add or update documentation."),
    ("🚀", "Deploy stuff."),
    ("💄", "Add or update the UI and style files."),
    ("🎉", "Begin a project."),
    ("✅", "Add, update, or pass tests."),
    ("🔒️", "Fix security or privacy issues."),
    ("🔐", "Add or update secrets."),
    ("🔖", "Release / Version tags."),
    ("🚨", "Fix compiler / linter warnings."),
    ("🚧", "Work in progress."),
    ("💚", "Fix CI Build."),
    ("⬇️", "Downgrade dependencies."),
    ("⬆️", "Upgrade dependencies."),
    ("📌", "Pin dependencies to specific versions."),
    ("👷", "Add or update CI build system."),
    ("📈", "Add or update analytics or track code."),
    ("♻️", "Refactor code."),
    ("➕", "Add a dependency."),
    ("➖", "Remove a dependency."),
    ("🔧", "Add or update configuration files."),
    ("🔨", "Add or update development scripts."),
    ("🌐", "Internationalization and localization."),
    ("✏️", "Fix typos."),
    ("💩", "Write bad code that needs to be improved."),
    ("⏪️", "Revert changes."),
    ("🔀", "Merge branches."),
    ("📦️", "Add or update compiled files or packages."),
    ("👽️", "Update code due to external API changes."),
    ("🚚", "Move or rename resources (e.g.: files, paths, routes)."),
    ("📄", "Add or update license."),
    ("💥", "Introduce breaking changes."),
    ("🍱", "Add or update assets."),
    ("♿️", "Improve accessibility."),
    ("💡", "Add or update comments in source code."),
    ("🍻", "Write code drunkenly."),
    ("💬", "Add or update text and literals."),
    ("🗃️", "Perform database related changes."),
    ("🔊", "Add or update logs."),
    ("🔇", "Remove logs."),
    ("👥", "Add or update contributor(s)."),
    ("🚸", "Improve user experience / usability."),
    ("🏗️", "Make architectural changes."),
    ("📱", "Work on responsive design."),
    ("🤡", "Mock things."),
    ("🥚", "Add or update an easter egg."),
    ("🙈", "Add or update a .gitignore file."),
    ("📸", "Add or update snapshots."),
    ("⚗️", "Perform experiments."),
    ("🔍️", "Improve SEO."),
    ("🏷️", "Add or update types."),
    ("🌱", "Add or update seed files."),
    ("🚩", "Add, update, or remove feature flags."),
    ("🥅", "Catch errors."),
    ("💫", "Add or update animations and transitions."),
    ("🗑️", "Deprecate code that needs to be cleaned up."),
    ("🛂", "Work on code related to authorization, roles and permissions."),
    ("🩹", "Simple fix for a non-critical issue."),
    ("🧐", "Data exploration/inspection."),
    ("⚰️", "Remove dead code."),
    ("🧪", "Add a failing test."),
    ("👔", "Add or update business logic."),
    ("🩺", "Add or update healthcheck."),
    ("🧱", "Infrastructure related changes."),
    ("🧑‍💻", "Improve developer experience."),
    ("💸", "Add sponsorships or money related infrastructure."),
    ("🧵", "Add or update code related to multithreading or concurrency."),
    ("🦺", "Add or update code related to validation."),
];

const AI_DEVMOJIS: &[(&str, &str)] = &[
    ("🧠", "Add or update a model architecture."),
    ("🏋️", "Add or update training code."),
    ("🎯", "Add or update evaluation and metrics."),
    ("📊", "Add or update data processing or datasets."),
    ("🧹", "Clean or filter data."),
    ("🔬", "Run or log an experiment."),
    ("🎛️", "Tune hyperparameters."),
    ("💾", "Add or update checkpoints and model saving."),
    ("📈", "Add or update logging of training curves."),
    ("🚀", "Deploy or serve a model."),
    ("⚡️", "Improve training or inference speed."),
    ("🐛", "Fix a bug."),
    ("✨", "Introduce new features."),
    ("♻️", "Refactor code."),
    ("📝", "Add or update documentation."),
    ("✅", "Add, update, or pass tests."),
    ("🔧", "Add or update configuration files."),
    ("📦️", "Add or update dependencies."),
    ("🧪", "Add a notebook or exploratory code."),
    ("🗑️", "Remove dead code or stale experiments."),
];

/// conventional commit types offered in simple mode
const CONVENTIONAL: &[(&str, &str, &str)] = &[
    ("✨", "feat", "A new feature"),
    ("🐛", "fix", "A bug fix"),
    ("📝", "docs", "Documentation only changes"),
    ("🎨", "style", "Changes that do not affect the meaning of the code"),
    ("♻️", "refactor", "A code change that neither fixes a bug nor adds a feature"),
    ("⚡️", "perf", "A code change that improves performance"),
    ("✅", "test", "Adding missing tests or correcting existing tests"),
    ("📦️", "build", "Changes that affect the build system or external dependencies"),
    ("👷", "ci", "Changes to CI configuration files and scripts"),
    ("🔧", "chore", "Other changes that don't modify src or test files"),
    ("⏪️", "revert", "Reverts a previous commit"),
];

const CUSTOM_EMOJIS_TEMPLATE: &str = r#"# A file to add your own emojis.

# For instance, uncomment the following lines to add new emojis
# to the list of suggestions for when you commit:

# [[emoji]]
# emoji = "🧫"
# description = "Experimental code"

# [[emoji]]
# emoji = "💪"
# description = "Add utility functions"
"#;

pub fn builtin(set: EmojiSet) -> Vec<Gitmoji> {
    let table = match set {
        EmojiSet::Gitmoji => GITMOJIS,
        EmojiSet::AiDevmojis => AI_DEVMOJIS,
    };
    table.iter().map(|(e, d)| Gitmoji::new(e, d)).collect()
}

#[derive(Deserialize)]
struct CustomEmojiFile {
    #[serde(default)]
    emoji: Vec<Gitmoji>,
}

/// check that every custom emoji has a non-empty emoji and description
pub fn validate_custom_emojis(emojis: &[Gitmoji]) -> Result<()> {
    for gitmoji in emojis {
        if gitmoji.emoji.trim().is_empty() {
            bail!("custom gitmojis must have a non-empty 'emoji' key");
        }
        if gitmoji.description.trim().is_empty() {
            bail!(
                "custom gitmoji {} must have a non-empty 'description' key",
                gitmoji.emoji
            );
        }
    }
    Ok(())
}

fn read_custom_emojis(path: &Path) -> Result<Vec<Gitmoji>> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, CUSTOM_EMOJIS_TEMPLATE)
            .with_context(|| format!("failed to write {}", path.display()))?;
        return Ok(Vec::new());
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file: CustomEmojiFile = toml::from_str(&content).context("invalid custom gitmojis file")?;
    validate_custom_emojis(&file.emoji)?;
    Ok(file.emoji)
}

/// load the user's extra emojis, writing a commented template on first use
///
/// any problem is reported and yields an empty list.
pub fn load_custom_emojis(path: &Path) -> Vec<Gitmoji> {
    match read_custom_emojis(path) {
        Ok(emojis) => emojis,
        Err(e) => {
            eprintln!(
                "{}",
                style(format!(
                    "error loading custom gitmojis from {}, ignoring.",
                    path.display()
                ))
                .red()
                .bold()
            );
            eprintln!("{}", style(format!("{e:#}")).red());
            Vec::new()
        }
    }
}

/// merge custom emojis over a built-in set; a custom entry replaces a built-in
/// one with the same emoji
pub fn merge(builtin: Vec<Gitmoji>, custom: &[Gitmoji]) -> Vec<Gitmoji> {
    let mut merged = builtin;
    for gitmoji in custom {
        match merged.iter_mut().find(|g| g.emoji == gitmoji.emoji) {
            Some(existing) => existing.description = gitmoji.description.clone(),
            None => merged.push(gitmoji.clone()),
        }
    }
    merged
}

/// the choices shown by the emoji prompt
#[derive(Debug, Clone, Default)]
pub struct EmojiCatalog {
    gitmojis: Vec<Gitmoji>,
}

impl EmojiCatalog {
    pub fn new(set: EmojiSet, custom: &[Gitmoji]) -> Self {
        Self {
            gitmojis: merge(builtin(set), custom),
        }
    }

    /// gitmoji choices, most recently used first; unused ones keep catalog order
    pub fn choices(&self, history: &HistoryStore) -> Vec<EmojiChoice> {
        let last_used: HashMap<&str, i64> = history.last_used(HistoryField::Emoji);
        let mut sorted: Vec<&Gitmoji> = self.gitmojis.iter().collect();
        sorted.sort_by_key(|g| std::cmp::Reverse(last_used.get(g.emoji.as_str()).copied().unwrap_or(0)));

        sorted
            .into_iter()
            .map(|g| EmojiChoice {
                value: g.emoji.clone(),
                label: format!("{} {}", g.emoji, g.description),
            })
            .collect()
    }

    /// conventional commit types, value `"{emoji} {type}:"`
    pub fn conventional_choices() -> Vec<EmojiChoice> {
        let width = CONVENTIONAL
            .iter()
            .map(|(_, kind, _)| kind.len())
            .max()
            .unwrap_or_default();

        CONVENTIONAL
            .iter()
            .map(|(emoji, kind, description)| EmojiChoice {
                value: format!("{emoji} {kind}:"),
                label: format!("{emoji} {kind:<width$} ―― {description}"),
            })
            .collect()
    }
}
