use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::JsonFileStore;
use crate::workflow::NoteTemplates;

pub const PROJECT_DIR: &str = ".bugboard";
pub const STORE_ENV: &str = "BUGBOARD_STORE";
pub const AUTHOR_ENV: &str = "BUGBOARD_AUTHOR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub notes: NoteTemplates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            poll_interval_ms: default_poll_interval_ms(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// Command-line values that take precedence over env and files.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub store: Option<PathBuf>,
    pub author: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub board: BoardConfig,
    pub user: UserConfig,
    pub store_path: PathBuf,
    pub author: Option<String>,
}

impl EffectiveConfig {
    /// Open the JSON file store this config points at.
    #[must_use]
    pub fn open_store(&self) -> JsonFileStore {
        JsonFileStore::with_options(
            &self.store_path,
            self.board.store.poll_interval(),
            self.board.store.lock_timeout(),
        )
    }
}

pub fn load_board_config(project_root: &Path) -> Result<BoardConfig> {
    let path = project_root.join(PROJECT_DIR).join("config.toml");
    if !path.exists() {
        return Ok(BoardConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<BoardConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    anyhow::ensure!(
        config.store.poll_interval_ms > 0,
        "Invalid {}: [store] poll_interval_ms must be at least 1",
        path.display()
    );
    Ok(config)
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("bugboard/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn resolve_config(project_root: &Path, overrides: &ConfigOverrides) -> Result<EffectiveConfig> {
    let board = load_board_config(project_root)?;
    let user = load_user_config()?;

    let store_path = resolve_store_path(
        project_root,
        overrides.store.as_deref(),
        env::var_os(STORE_ENV).map(PathBuf::from).as_deref(),
        &board.store.path,
    );
    let author = resolve_author(
        overrides.author.as_deref(),
        env::var(AUTHOR_ENV).ok().as_deref(),
        user.author.as_deref(),
    );

    Ok(EffectiveConfig {
        board,
        user,
        store_path,
        author,
    })
}

fn resolve_store_path(
    project_root: &Path,
    flag: Option<&Path>,
    env_path: Option<&Path>,
    configured: &Path,
) -> PathBuf {
    let chosen = [flag, env_path]
        .into_iter()
        .flatten()
        .find(|p| !p.as_os_str().is_empty())
        .unwrap_or(configured);
    if chosen.is_absolute() {
        chosen.to_path_buf()
    } else {
        project_root.join(chosen)
    }
}

fn resolve_author(flag: Option<&str>, env_author: Option<&str>, user: Option<&str>) -> Option<String> {
    [flag, env_author, user]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(ToString::to_string)
}

fn default_store_path() -> PathBuf {
    PathBuf::from(PROJECT_DIR).join("reports.json")
}

const fn default_poll_interval_ms() -> u64 {
    500
}

const fn default_lock_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn make_temp_dir(label: &str) -> std::path::PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("bugboard-config-test-{label}-{id}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("temp dir must be created");
        dir
    }

    #[test]
    fn missing_board_config_uses_defaults() {
        let root = make_temp_dir("board-default");
        let cfg = load_board_config(&root).expect("load should succeed");
        assert_eq!(cfg.store.path, PathBuf::from(".bugboard/reports.json"));
        assert_eq!(cfg.store.poll_interval(), Duration::from_millis(500));
        assert_eq!(cfg.notes, NoteTemplates::default());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn partial_board_config_keeps_other_defaults() {
        let root = make_temp_dir("board-partial");
        std::fs::create_dir_all(root.join(PROJECT_DIR)).expect("create project dir");
        std::fs::write(
            root.join(PROJECT_DIR).join("config.toml"),
            r#"
[store]
poll_interval_ms = 50

[notes]
completion = "Xác nhận Hoàn thành."
"#,
        )
        .expect("write config");

        let cfg = load_board_config(&root).expect("load should succeed");
        assert_eq!(cfg.store.poll_interval_ms, 50);
        assert_eq!(cfg.store.lock_timeout_ms, 5_000);
        assert_eq!(cfg.notes.completion, "Xác nhận Hoàn thành.");
        assert_eq!(cfg.notes.initial_default, "Request received.");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn malformed_board_config_is_an_error() {
        let root = make_temp_dir("board-bad");
        std::fs::create_dir_all(root.join(PROJECT_DIR)).expect("create project dir");
        std::fs::write(root.join(PROJECT_DIR).join("config.toml"), "[store\npath = 3")
            .expect("write config");
        let err = load_board_config(&root).expect_err("parse must fail");
        assert!(err.to_string().contains("Failed to parse"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn store_path_precedence() {
        let root = Path::new("/work/board");
        let configured = Path::new(".bugboard/reports.json");

        assert_eq!(
            resolve_store_path(root, None, None, configured),
            PathBuf::from("/work/board/.bugboard/reports.json")
        );
        assert_eq!(
            resolve_store_path(root, None, Some(Path::new("shared.json")), configured),
            PathBuf::from("/work/board/shared.json")
        );
        assert_eq!(
            resolve_store_path(
                root,
                Some(Path::new("/srv/reports.json")),
                Some(Path::new("shared.json")),
                configured
            ),
            PathBuf::from("/srv/reports.json")
        );
    }

    #[test]
    fn blank_store_flag_falls_through_to_env() {
        let root = Path::new("/work/board");
        let configured = Path::new(".bugboard/reports.json");

        assert_eq!(
            resolve_store_path(
                root,
                Some(Path::new("")),
                Some(Path::new("/srv/shared.json")),
                configured
            ),
            PathBuf::from("/srv/shared.json")
        );
        assert_eq!(
            resolve_store_path(root, Some(Path::new("")), Some(Path::new("")), configured),
            PathBuf::from("/work/board/.bugboard/reports.json")
        );
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let root = make_temp_dir("board-zero-poll");
        std::fs::create_dir_all(root.join(PROJECT_DIR)).expect("create project dir");
        std::fs::write(
            root.join(PROJECT_DIR).join("config.toml"),
            "[store]\npoll_interval_ms = 0\n",
        )
        .expect("write config");

        let err = load_board_config(&root).expect_err("zero poll interval must fail");
        assert!(err.to_string().contains("poll_interval_ms must be at least 1"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn author_precedence_skips_blank_values() {
        assert_eq!(
            resolve_author(Some("  "), Some("env-user"), Some("cfg-user")),
            Some("env-user".to_string())
        );
        assert_eq!(
            resolve_author(Some("flag-user"), Some("env-user"), None),
            Some("flag-user".to_string())
        );
        assert_eq!(resolve_author(None, None, None), None);
    }

    #[test]
    fn user_config_parses() {
        let cfg: UserConfig = toml::from_str(
            r#"
output = "json"
author = "triage-desk"
"#,
        )
        .expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.author.as_deref(), Some("triage-desk"));
    }
}
