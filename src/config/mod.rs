//! Configuration system (layered: defaults < TOML file < environment).

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ReelError;

/// Providers the bundled engine factory knows how to build.
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai", "deepseek"];

const DEFAULT_SYSTEM_PROMPT: &str = "You are Reel, a media automation assistant. \
Help the user find movies and TV series, manage subscriptions and keep them informed. \
Use the available tools when they help, and always explain briefly why you call one.";

const TELEGRAM_FORMAT: &str = "Messages are delivered through Telegram. \
Use *bold*, _italic_ and `code` only; do not use heading syntax.";

const SLACK_FORMAT: &str = "Messages are delivered through Slack. \
Use Slack mrkdwn: *bold*, _italic_, `code` and <url|text> links.";

/// Reasoning provider settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    /// Upper bound on model calls per turn.
    pub max_iterations: usize,
    /// HTTP(S) proxy for provider traffic.
    pub proxy: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            api_key: None,
            base_url: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.1,
            max_iterations: 10,
            proxy: None,
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_iterations", &self.max_iterations)
            .field("proxy", &self.proxy)
            .finish()
    }
}

/// Conversation behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Number of recent memory records replayed into a new session.
    pub memory_window: usize,
    /// Title attached to replies sent to the user.
    pub reply_title: String,
    pub system_prompt: String,
    /// Formatting notes appended to the prompt, keyed by a channel name
    /// fragment (matched case-insensitively).
    pub channel_prompts: BTreeMap<String, String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            memory_window: 30,
            reply_title: "Reel Assistant".into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            channel_prompts: BTreeMap::from([
                ("telegram".to_string(), TELEGRAM_FORMAT.to_string()),
                ("slack".to_string(), SLACK_FORMAT.to_string()),
            ]),
        }
    }
}

impl AgentSettings {
    /// System prompt for a session on `channel`.
    pub fn system_prompt_for(&self, channel: Option<&str>) -> String {
        let mut prompt = self.system_prompt.clone();
        let Some(channel) = channel.map(str::to_lowercase) else {
            return prompt;
        };
        let addendum = self
            .channel_prompts
            .iter()
            .find(|(key, _)| channel.contains(&key.to_lowercase()));
        if let Some((_, format)) = addendum {
            prompt.push_str("\n\n## Current Message Channel Format Requirements\n\n");
            prompt.push_str(format);
        }
        prompt
    }
}

/// MCP gateway settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpSettings {
    pub bind: String,
    /// User identity for clients that do not send one.
    pub default_user: String,
    /// Idle seconds before a protocol session is evicted; 0 disables.
    pub session_idle_secs: u64,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".into(),
            default_user: "mcp_user".into(),
            session_idle_secs: 3600,
        }
    }
}

impl McpSettings {
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.session_idle_secs > 0).then(|| Duration::from_secs(self.session_idle_secs))
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    pub llm: LlmSettings,
    pub agent: AgentSettings,
    pub mcp: McpSettings,
}

impl ReelConfig {
    /// Load the layered configuration.
    ///
    /// Reads `path` when given, otherwise the per-user `config.toml` if it
    /// exists, then applies `REEL_*` environment overrides (a `.env` file in
    /// the working directory is honored).
    pub fn load(path: Option<&Path>) -> Result<Self, ReelError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Location of the per-user configuration file.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "reel").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ReelError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ReelError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loading configuration file");
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ReelError> {
        toml::from_str(raw).map_err(|e| ReelError::Configuration(format!("invalid config: {e}")))
    }

    /// Apply `REEL_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ReelError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `REEL_*` overrides from an arbitrary lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ReelError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("REEL_LLM_PROVIDER") {
            self.llm.provider = v.trim().to_lowercase();
        }
        if let Some(v) = get("REEL_LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = get("REEL_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Some(v) = get("REEL_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("REEL_LLM_TEMPERATURE") {
            self.llm.temperature = parse_var("REEL_LLM_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("REEL_LLM_MAX_ITERATIONS") {
            self.llm.max_iterations = parse_var("REEL_LLM_MAX_ITERATIONS", &v)?;
        }
        if let Some(v) = get("REEL_PROXY") {
            self.llm.proxy = Some(v);
        }
        if let Some(v) = get("REEL_MEMORY_WINDOW") {
            self.agent.memory_window = parse_var("REEL_MEMORY_WINDOW", &v)?;
        }
        if let Some(v) = get("REEL_MCP_BIND") {
            self.mcp.bind = v;
        }
        if let Some(v) = get("REEL_MCP_DEFAULT_USER") {
            self.mcp.default_user = v;
        }
        if let Some(v) = get("REEL_MCP_SESSION_IDLE_SECS") {
            self.mcp.session_idle_secs = parse_var("REEL_MCP_SESSION_IDLE_SECS", &v)?;
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, ReelError>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ReelError::Configuration(format!("{key}={value:?}: {e}")))
}
