use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::env;
use std::path::{Path, PathBuf};

/// environment variable overriding the application directory
pub const HOME_ENV: &str = "GITMOJI_WIZARD_HOME";

const APP_NAME: &str = "gitmoji-wizard";

/// locations of the files the wizard persists between runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// resolve the application directory from the environment
    pub fn from_env() -> Self {
        if let Ok(home) = env::var(HOME_ENV) {
            if !home.trim().is_empty() {
                return Self::new(resolve_path(&home));
            }
        }

        let root = if let Some(config_dir) = dirs::config_dir() {
            config_dir.join(APP_NAME)
        } else if let Some(home) = dirs::home_dir() {
            home.join(format!(".{APP_NAME}"))
        } else {
            PathBuf::from(format!(".{APP_NAME}"))
        };
        Self::new(root)
    }

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn history(&self) -> PathBuf {
        self.root.join("history.json")
    }

    pub fn custom_emojis(&self) -> PathBuf {
        self.root.join("custom_gitmojis.toml")
    }

    /// create the application directory if needed
    pub fn ensure_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))
    }
}

lazy_static! {
    static ref ENV_VAR: Regex =
        Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
            .expect("valid env var pattern");
}

/// expand `$VAR`, `${VAR}` and a leading `~`, then make the path absolute
///
/// unknown variables are left untouched. the path does not need to exist.
pub fn resolve_path(path: &str) -> PathBuf {
    let expanded = ENV_VAR.replace_all(path, |caps: &Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        env::var(name).unwrap_or_else(|_| caps[0].to_string())
    });

    let expanded = expand_tilde(&expanded);

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(expanded),
            Err(_) => expanded,
        }
    };

    absolute.canonicalize().unwrap_or(absolute)
}

fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn files_live_under_the_root() {
        let paths = AppPaths::new("/tmp/gw");
        assert_eq!(paths.config(), PathBuf::from("/tmp/gw/config.toml"));
        assert_eq!(paths.history(), PathBuf::from("/tmp/gw/history.json"));
        assert_eq!(
            paths.custom_emojis(),
            PathBuf::from("/tmp/gw/custom_gitmojis.toml")
        );
    }

    #[test]
    fn resolve_expands_env_vars() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        // SAFETY: the variable name is unique to this test
        unsafe { env::set_var("GW_TEST_RESOLVE_DIR", &root) };

        assert_eq!(resolve_path("$GW_TEST_RESOLVE_DIR"), root);
        assert_eq!(resolve_path("${GW_TEST_RESOLVE_DIR}/sub"), root.join("sub"));
    }

    #[test]
    fn resolve_keeps_unknown_vars() {
        let resolved = resolve_path("/nowhere/$GW_TEST_SURELY_UNSET_VAR/x");
        assert_eq!(resolved, PathBuf::from("/nowhere/$GW_TEST_SURELY_UNSET_VAR/x"));
    }

    #[test]
    fn resolve_makes_relative_paths_absolute() {
        assert!(resolve_path("some/relative/dir").is_absolute());
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/projects"), home.join("projects"));
            assert_eq!(expand_tilde("~"), home);
        }
        assert_eq!(expand_tilde("a/~/b"), PathBuf::from("a/~/b"));
    }
}
