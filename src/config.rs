//! Runtime configuration read from the environment
//!
//! Values are read once at startup. Unset or unparseable values fall back
//! to their defaults.

use crate::protocol::DEFAULT_MAX_FRAME_BYTES;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_FRAGMENT_INTERVAL: Duration = Duration::from_millis(400);
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

/// Which reply source the server streams from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplyMode {
    #[default]
    Scripted,
    Echo,
}

impl FromStr for ReplyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scripted" => Ok(ReplyMode::Scripted),
            "echo" => Ok(ReplyMode::Echo),
            other => Err(format!("unknown reply mode '{other}'")),
        }
    }
}

impl fmt::Display for ReplyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyMode::Scripted => write!(f, "scripted"),
            ReplyMode::Echo => write!(f, "echo"),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub fragment_interval: Duration,
    pub reply: ReplyMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            fragment_interval: DEFAULT_FRAGMENT_INTERVAL,
            reply: ReplyMode::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind: parsed(&lookup, "CHAT_STREAM_BIND").unwrap_or(defaults.bind),
            port: parsed(&lookup, "CHAT_STREAM_PORT").unwrap_or(defaults.port),
            fragment_interval: parsed(&lookup, "CHAT_STREAM_FRAGMENT_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.fragment_interval),
            reply: parsed(&lookup, "CHAT_STREAM_REPLY").unwrap_or(defaults.reply),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub max_frame_bytes: usize,
    /// Replies running longer than this are cancelled; `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            base_url: lookup("CHAT_STREAM_URL")
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.base_url),
            max_frame_bytes: parsed::<usize>(&lookup, "CHAT_STREAM_MAX_FRAME_BYTES")
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_frame_bytes),
            timeout: parsed::<u64>(&lookup, "CHAT_STREAM_TIMEOUT_SECS")
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring invalid configuration value");
            None
        }
    }
}
