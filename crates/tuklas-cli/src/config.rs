//! Configuration Vault – reads/writes `~/.tuklascope/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tuklas_runtime::gateway::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use zeroize::Zeroize;

/// Console log output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Compact => write!(f, "compact"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Persisted user configuration stored in `~/.tuklascope/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API key. Wiped from memory when the config is dropped.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gemini_api_key: String,

    /// Model name, e.g. "gemini-1.5-flash-latest".
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the Generative Language API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Journal database file. Defaults to `~/.tuklascope/journal.sqlite`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "gemini_api_key",
                if self.gemini_api_key.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("database_path", &self.database_path)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Drop for Config {
    fn drop(&mut self) {
        self.gemini_api_key.zeroize();
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            model: default_model(),
            api_base_url: default_api_base_url(),
            database_path: None,
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    pub fn has_api_key(&self) -> bool {
        !self.gemini_api_key.trim().is_empty()
    }

    /// Where the journal lives: the configured path or the default next to
    /// the config file.
    pub fn journal_path(&self) -> PathBuf {
        match &self.database_path {
            Some(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => journal_path_for_home(&home_dir()),
        }
    }
}

fn home_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string())
}

/// Return the path to `~/.tuklascope/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(&home_dir())
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".tuklascope").join("config.toml")
}

pub(crate) fn journal_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".tuklascope").join("journal.sqlite")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// The stored config, or defaults with environment overrides applied.
pub fn load_or_default() -> Result<Config, String> {
    Ok(load()?.unwrap_or_else(|| {
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        cfg
    }))
}

/// Apply `TUKLAS_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `TUKLAS_API_KEY` | `gemini_api_key` |
/// | `TUKLAS_MODEL` | `model` |
/// | `TUKLAS_API_URL` | `api_base_url` |
/// | `TUKLAS_DB_PATH` | `database_path` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("TUKLAS_API_KEY")
        && !v.trim().is_empty()
    {
        cfg.gemini_api_key.zeroize();
        cfg.gemini_api_key = v;
    }
    if let Ok(v) = std::env::var("TUKLAS_MODEL")
        && !v.trim().is_empty()
    {
        cfg.model = v;
    }
    if let Ok(v) = std::env::var("TUKLAS_API_URL")
        && !v.trim().is_empty()
    {
        cfg.api_base_url = v;
    }
    if let Ok(v) = std::env::var("TUKLAS_DB_PATH")
        && !v.trim().is_empty()
    {
        cfg.database_path = Some(v);
    }
}

/// Save the config to disk, creating `~/.tuklascope/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        create_private_dir(parent)?;
    }
    let mut raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    let written = write_private_file(path, raw.as_bytes());
    raw.zeroize();
    written.map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}

/// Create `dir` (and parents), owner-only (rwx------) on Unix.
pub(crate) fn create_private_dir(dir: &Path) -> Result<(), String> {
    fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create directory {}: {}", dir.display(), e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .map_err(|e| format!("Failed to set permissions on {}: {}", dir.display(), e))?;
    }
    Ok(())
}

#[cfg(unix)]
fn write_private_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .and_then(|mut f| f.write_all(bytes))
}

#[cfg(not(unix))]
fn write_private_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    /// Serialises tests that read or write `TUKLAS_*` variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn config_debug_redacts_api_key() {
        let mut cfg = Config::default();
        cfg.gemini_api_key = "AIza-super-secret".to_string();
        let debug_str = format!("{:?}", cfg);
        assert!(!debug_str.contains("AIza-super-secret"), "api key must not appear in debug output");
        assert!(debug_str.contains("<redacted>"), "debug output must show <redacted> for a set key");
    }

    #[test]
    fn config_debug_shows_not_set_for_empty_key() {
        let debug_str = format!("{:?}", Config::default());
        assert!(debug_str.contains("<not set>"));
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600, "config file must have 0o600 permissions");

        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .expect("dir metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700, "config directory must have 0o700 permissions");
    }

    #[test]
    fn roundtrip_keeps_key_and_format() {
        let _env = env_lock();
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let mut cfg = Config::default();
        cfg.gemini_api_key = "AIza-roundtrip".to_string();
        cfg.log_format = LogFormat::Json;
        save_to(&cfg, &path).expect("save");

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("log_format = \"json\""));
        assert!(!raw.contains("database_path"));

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.model, DEFAULT_MODEL);
        assert_eq!(loaded.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(loaded.log_format, LogFormat::Json);
        assert!(loaded.has_api_key());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let _env = env_lock();
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = \"gemini-pro-vision\"\n").unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.model, "gemini-pro-vision");
        assert_eq!(loaded.log_format, LogFormat::Compact);
        assert_eq!(loaded.database_path, None);
    }

    #[test]
    fn paths_point_to_tuklascope_dir() {
        let p = config_path_for_home("/home/learner");
        assert_eq!(p, PathBuf::from("/home/learner/.tuklascope/config.toml"));
        let j = journal_path_for_home("/home/learner");
        assert_eq!(j, PathBuf::from("/home/learner/.tuklascope/journal.sqlite"));
    }

    #[test]
    fn explicit_database_path_wins() {
        let _env = env_lock();
        let mut cfg = Config::default();
        cfg.database_path = Some("/data/journal.sqlite".to_string());
        assert_eq!(cfg.journal_path(), PathBuf::from("/data/journal.sqlite"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn apply_env_overrides_changes_key_and_model() {
        let _env = env_lock();
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe {
            std::env::set_var("TUKLAS_API_KEY", "AIza-from-env");
            std::env::set_var("TUKLAS_MODEL", "gemini-2.0-flash");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        unsafe {
            std::env::remove_var("TUKLAS_API_KEY");
            std::env::remove_var("TUKLAS_MODEL");
        }
        assert_eq!(cfg.gemini_api_key, "AIza-from-env");
        assert_eq!(cfg.model, "gemini-2.0-flash");
    }

    #[test]
    fn apply_env_overrides_changes_url_and_db_path() {
        let _env = env_lock();
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe {
            std::env::set_var("TUKLAS_API_URL", "http://localhost:8089");
            std::env::set_var("TUKLAS_DB_PATH", "/tmp/tuklas.sqlite");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        unsafe {
            std::env::remove_var("TUKLAS_API_URL");
            std::env::remove_var("TUKLAS_DB_PATH");
        }
        assert_eq!(cfg.api_base_url, "http://localhost:8089");
        assert_eq!(cfg.journal_path(), PathBuf::from("/tmp/tuklas.sqlite"));
    }

    #[test]
    fn apply_env_overrides_ignores_blank_values() {
        let _env = env_lock();
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("TUKLAS_DB_PATH", "  ") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        unsafe { std::env::remove_var("TUKLAS_DB_PATH") };
        assert_eq!(cfg.database_path, None);
    }
}
