// config.rs: verifier configuration
//
// Loaded from a JSON file (every field optional) and then overridden from
// EEXT_* environment variables. A missing file means defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Program names (or absolute paths) of the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub gpg: String,
    pub git: String,
    pub rpm: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            gpg: "gpg".to_string(),
            git: "git".to_string(),
            rpm: "rpm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discard stdout of streamed tool invocations. Stderr is always shown.
    pub quiet: bool,
    pub tools: ToolPaths,
    /// Fixed short commit length. When unset, git is asked for the
    /// repository's own abbreviation length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_commit_len: Option<usize>,
    /// Directory holding cloned source repositories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist. Environment overrides are applied afterwards.
    pub fn load(path: &Path) -> Result<Config> {
        let mut config = if path.exists() {
            let data = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<Config>(&data)
                .with_context(|| format!("parsing config {}", path.display()))?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply EEXT_QUIET, EEXT_SRC_DIR and EEXT_SHORT_COMMIT_LEN overrides.
    /// `lookup` abstracts the environment so callers can inject values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("EEXT_QUIET") {
            self.quiet = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = lookup("EEXT_SRC_DIR").filter(|v| !v.is_empty()) {
            self.src_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("EEXT_SHORT_COMMIT_LEN").filter(|v| !v.is_empty()) {
            let len: usize = v
                .trim()
                .parse()
                .with_context(|| format!("parsing EEXT_SHORT_COMMIT_LEN={}", v))?;
            anyhow::ensure!(len > 0, "EEXT_SHORT_COMMIT_LEN must be positive");
            self.short_commit_len = Some(len);
        }
        Ok(())
    }

    /// Location of a cloned repository. Named repos live under `src_dir`;
    /// without a name the current directory is the repository.
    pub fn repo_dir(&self, repo: Option<&str>) -> PathBuf {
        match repo.filter(|r| !r.is_empty()) {
            Some(repo) => self
                .src_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(repo),
            None => PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.tools, ToolPaths::default());
        assert_eq!(config.tools.gpg, "gpg");
        assert_eq!(config.tools.git, "git");
        assert_eq!(config.tools.rpm, "rpm");
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eext.json");
        fs::write(&path, r#"{"quiet": true, "tools": {"gpg": "/usr/bin/gpg2"}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.quiet);
        assert_eq!(config.tools.gpg, "/usr/bin/gpg2");
        assert_eq!(config.tools.git, "git");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eext.json");
        fs::write(&path, "{not json").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("EEXT_QUIET", "yes"),
                ("EEXT_SRC_DIR", "/src"),
                ("EEXT_SHORT_COMMIT_LEN", "12"),
            ]))
            .unwrap();
        assert!(config.quiet);
        assert_eq!(config.src_dir, Some(PathBuf::from("/src")));
        assert_eq!(config.short_commit_len, Some(12));

        config.apply_env(env(&[("EEXT_QUIET", "0")])).unwrap();
        assert!(!config.quiet);
    }

    #[test]
    fn bad_short_len_is_rejected() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("EEXT_SHORT_COMMIT_LEN", "ten")])).is_err());
        assert!(config.apply_env(env(&[("EEXT_SHORT_COMMIT_LEN", "0")])).is_err());
    }

    #[test]
    fn repo_dir_resolution() {
        let mut config = Config::default();
        assert_eq!(config.repo_dir(None), PathBuf::from("."));
        assert_eq!(config.repo_dir(Some("libfoo")), PathBuf::from("./libfoo"));
        config.src_dir = Some(PathBuf::from("/work/src"));
        assert_eq!(config.repo_dir(Some("libfoo")), PathBuf::from("/work/src/libfoo"));
        assert_eq!(config.repo_dir(Some("")), PathBuf::from("."));
    }
}
