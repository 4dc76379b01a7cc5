//! Tests for configuration loading.

use std::io::Write;
use std::sync::{Mutex, OnceLock};

use reel::config::ReelConfig;
use reel::error::ReelError;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 11] = [
    "REEL_LLM_PROVIDER",
    "REEL_LLM_API_KEY",
    "REEL_LLM_BASE_URL",
    "REEL_LLM_MODEL",
    "REEL_LLM_TEMPERATURE",
    "REEL_LLM_MAX_ITERATIONS",
    "REEL_PROXY",
    "REEL_MEMORY_WINDOW",
    "REEL_MCP_BIND",
    "REEL_MCP_DEFAULT_USER",
    "REEL_MCP_SESSION_IDLE_SECS",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    /// Snapshot and clear the given variables.
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        for key in keys {
            std::env::remove_var(key);
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn load_reads_the_given_file() {
    let _lock = env_lock_guard();
    let _env = EnvGuard::capture(&CONFIG_ENV_VARS);
    let file = write_config(
        r#"
        [llm]
        provider = "deepseek"
        model = "deepseek-chat"
        max_iterations = 4

        [agent]
        memory_window = 8
        reply_title = "Media Bot"
        "#,
    );

    let config = ReelConfig::load(Some(file.path())).unwrap();

    assert_eq!(config.llm.provider, "deepseek");
    assert_eq!(config.llm.model, "deepseek-chat");
    assert_eq!(config.llm.max_iterations, 4);
    assert_eq!(config.agent.memory_window, 8);
    assert_eq!(config.agent.reply_title, "Media Bot");
    assert_eq!(config.mcp.bind, "127.0.0.1:3001");
}

#[test]
fn environment_wins_over_the_file() {
    let _lock = env_lock_guard();
    let _env = EnvGuard::capture(&CONFIG_ENV_VARS);
    let file = write_config("[llm]\nmodel = \"file-model\"\n[mcp]\ndefault_user = \"file-user\"\n");
    std::env::set_var("REEL_LLM_MODEL", "env-model");
    std::env::set_var("REEL_MCP_SESSION_IDLE_SECS", "0");
    std::env::set_var("REEL_LLM_API_KEY", "sk-env");

    let config = ReelConfig::load(Some(file.path())).unwrap();

    assert_eq!(config.llm.model, "env-model");
    assert_eq!(config.llm.api_key.as_deref(), Some("sk-env"));
    assert_eq!(config.mcp.default_user, "file-user");
    assert_eq!(config.mcp.idle_timeout(), None);
}

#[test]
fn invalid_numbers_in_the_environment_are_rejected() {
    let _lock = env_lock_guard();
    let _env = EnvGuard::capture(&CONFIG_ENV_VARS);
    std::env::set_var("REEL_LLM_TEMPERATURE", "warm");

    let err = ReelConfig::load(Some(write_config("").path())).unwrap_err();

    assert!(matches!(err, ReelError::Configuration(msg) if msg.contains("REEL_LLM_TEMPERATURE")));
}

#[test]
fn malformed_file_is_a_configuration_error() {
    let _lock = env_lock_guard();
    let _env = EnvGuard::capture(&CONFIG_ENV_VARS);
    let file = write_config("[llm\nmodel = ");

    let err = ReelConfig::load(Some(file.path())).unwrap_err();

    assert!(matches!(err, ReelError::Configuration(_)));
}

#[test]
fn missing_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ReelConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ReelError::Configuration(msg) if msg.contains("absent.toml")));
}
