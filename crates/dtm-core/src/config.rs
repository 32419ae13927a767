use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::debug;

use crate::{
    domain::{ChannelMapping, ChatId, Destination, ThreadId},
    errors::Error,
    Result,
};

/// Discord caps `GET /channels/{id}/messages` at 100 per page.
const MAX_FETCH_LIMIT: u8 = 100;

/// Typed configuration for one mirror run.
///
/// Built once at startup and handed to the pipeline; nothing reads the config
/// file after this.
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub discord_bot_token: String,
    pub telegram_bot_token: String,

    // Routing, in configured order
    pub channel_mappings: Vec<ChannelMapping>,

    // Content
    pub filter_words: Vec<String>,
    pub message_window: Duration,

    // Runtime
    pub history_file: PathBuf,
    pub request_delay: Duration,
    pub fetch_limit: u8,
}

/// On-disk shape. Key names match the legacy `config.json`.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "DISCORD_BOT_TOKEN", default)]
    discord_bot_token: Option<String>,
    #[serde(rename = "TELEGRAM_BOT_TOKEN", default)]
    telegram_bot_token: Option<String>,
    #[serde(rename = "CHANNEL_MAPPING", default)]
    channel_mapping: serde_json::Map<String, serde_json::Value>,
    #[serde(rename = "FILTER_WORDS", default)]
    filter_words: Vec<String>,
    #[serde(rename = "MESSAGE_WINDOW_HOURS", default = "default_window_hours")]
    message_window_hours: f64,
    #[serde(rename = "HISTORY_FILE", default = "default_history_file")]
    history_file: PathBuf,
    #[serde(rename = "REQUEST_DELAY_SECONDS", default = "default_request_delay")]
    request_delay_seconds: f64,
    #[serde(rename = "FETCH_LIMIT", default = "default_fetch_limit")]
    fetch_limit: u64,
}

/// A mapping target: either `[chat_id, thread_id]` or `{ "chat_id": .., "thread_id": .. }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Pair(IdValue, Option<IdValue>),
    Object {
        chat_id: IdValue,
        #[serde(default)]
        thread_id: Option<IdValue>,
    },
}

/// Ids show up both as JSON numbers and as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Num(i64),
    Str(String),
}

impl IdValue {
    fn as_i64(&self) -> Option<i64> {
        match self {
            IdValue::Num(n) => Some(*n),
            IdValue::Str(s) => s.trim().parse::<i64>().ok(),
        }
    }
}

fn default_window_hours() -> f64 {
    1.0
}

fn default_history_file() -> PathBuf {
    PathBuf::from("upload_history.json")
}

fn default_request_delay() -> f64 {
    3.0
}

fn default_fetch_limit() -> u64 {
    50
}

impl Config {
    /// Load `.env` (if any), then the JSON config at `$DTM_CONFIG` (default `config.json`).
    ///
    /// Token environment variables take precedence over the file.
    pub fn load() -> Result<Self> {
        Self::load_with_dotenv(Path::new(".env"))
    }

    fn load_with_dotenv(dotenv: &Path) -> Result<Self> {
        let loaded = load_dotenv_if_present(dotenv);
        if !loaded.is_empty() {
            debug!(path = %dotenv.display(), keys = ?loaded, "loaded environment from dotenv file");
        }

        let path = env_path("DTM_CONFIG").unwrap_or_else(|| PathBuf::from("config.json"));
        let mut cfg = Self::from_file(&path)?;

        if let Some(token) = env_str("DISCORD_BOT_TOKEN").and_then(non_empty) {
            cfg.discord_bot_token = token;
        }
        if let Some(token) = env_str("TELEGRAM_BOT_TOKEN").and_then(non_empty) {
            cfg.telegram_bot_token = token;
        }

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_json(&txt)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(txt: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(txt)
            .map_err(|e| Error::Config(format!("config is not valid JSON: {e}")))?;

        let mut channel_mappings = Vec::with_capacity(raw.channel_mapping.len());
        for (source, value) in raw.channel_mapping {
            channel_mappings.push(parse_mapping(source, value)?);
        }

        if !raw.message_window_hours.is_finite() || raw.message_window_hours <= 0.0 {
            return Err(Error::Config(
                "MESSAGE_WINDOW_HOURS must be a positive number".to_string(),
            ));
        }
        if !raw.request_delay_seconds.is_finite() || raw.request_delay_seconds < 0.0 {
            return Err(Error::Config(
                "REQUEST_DELAY_SECONDS must not be negative".to_string(),
            ));
        }

        let message_window = Duration::try_from_secs_f64(raw.message_window_hours * 3600.0)
            .map_err(|_| Error::Config("MESSAGE_WINDOW_HOURS is out of range".to_string()))?;
        let request_delay = Duration::try_from_secs_f64(raw.request_delay_seconds)
            .map_err(|_| Error::Config("REQUEST_DELAY_SECONDS is out of range".to_string()))?;

        let fetch_limit = raw.fetch_limit.clamp(1, u64::from(MAX_FETCH_LIMIT)) as u8;

        let filter_words = raw
            .filter_words
            .into_iter()
            .filter(|w| !w.is_empty())
            .collect();

        Ok(Self {
            discord_bot_token: raw.discord_bot_token.unwrap_or_default(),
            telegram_bot_token: raw.telegram_bot_token.unwrap_or_default(),
            channel_mappings,
            filter_words,
            message_window,
            history_file: raw.history_file,
            request_delay,
            fetch_limit,
        })
    }

    /// Both platform tokens must be present before any channel is touched.
    pub fn require_credentials(&self) -> Result<()> {
        if self.discord_bot_token.trim().is_empty() {
            return Err(Error::Config("DISCORD_BOT_TOKEN is required".to_string()));
        }
        if self.telegram_bot_token.trim().is_empty() {
            return Err(Error::Config("TELEGRAM_BOT_TOKEN is required".to_string()));
        }
        Ok(())
    }
}

fn parse_mapping(source: String, value: serde_json::Value) -> Result<ChannelMapping> {
    let bad = |why: &str| Error::Config(format!("CHANNEL_MAPPING[{source}]: {why}"));

    let target: RawTarget = serde_json::from_value(value)
        .map_err(|_| bad("expected [chat_id, thread_id] or {\"chat_id\", \"thread_id\"}"))?;

    let (chat, thread) = match target {
        RawTarget::Pair(chat, thread) => (chat, thread),
        RawTarget::Object { chat_id, thread_id } => (chat_id, thread_id),
    };

    let chat_id = chat.as_i64().ok_or_else(|| bad("chat_id is not an integer"))?;
    let thread_id = match thread {
        None => None,
        Some(t) => {
            let id = t.as_i64().ok_or_else(|| bad("thread_id is not an integer"))?;
            Some(i32::try_from(id).map_err(|_| bad("thread_id is out of range"))?)
        }
    };

    if source.trim().is_empty() {
        return Err(bad("source channel id is empty"));
    }

    Ok(ChannelMapping {
        source_channel_id: source,
        destination: Destination {
            chat_id: ChatId(chat_id),
            thread_id: thread_id.map(ThreadId),
        },
    })
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Export `KEY=value` lines from a dotenv file into the process environment.
///
/// Real environment variables win. Returns the keys that were actually set.
fn load_dotenv_if_present(path: &Path) -> Vec<String> {
    let Ok(contents) = fs::read_to_string(path) else {
        return Vec::new();
    };

    let mut loaded = Vec::new();
    for line in contents.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((key, val)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || env::var_os(key).is_some() {
            continue;
        }

        env::set_var(key, unquote(val.trim()));
        loaded.push(key.to_string());
    }
    loaded
}

fn unquote(val: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = val.strip_prefix(q).and_then(|v| v.strip_suffix(q)) {
            return inner;
        }
    }
    val
}
