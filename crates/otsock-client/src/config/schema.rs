use serde::Deserialize;
use otsock_core::error::{OtSockError, Result};
use otsock_core::protocol::Dialect;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    pub client: ClientSection,

    #[serde(default)]
    pub protocol: ProtocolSection,

    #[serde(default)]
    pub reconnect: ReconnectSection,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(OtSockError::UnsupportedVersion);
        }
        self.client.validate()?;
        self.reconnect.validate()?;
        Ok(())
    }

    /// WebSocket endpoint: explicit `url`, or derived from `page_origin`.
    pub fn ws_url(&self) -> Result<String> {
        match (&self.client.url, &self.client.page_origin) {
            (Some(url), None) => Ok(url.clone()),
            (None, Some(origin)) => super::derive_ws_url(origin),
            _ => Err(OtSockError::BadConfig(
                "exactly one of client.url and client.page_origin must be set".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub page_origin: Option<String>,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    #[serde(default = "default_keepalive_ms")]
    pub keepalive_ms: u64,
}

impl ClientSection {
    pub fn validate(&self) -> Result<()> {
        match (&self.url, &self.page_origin) {
            (Some(url), None) => {
                super::validate_ws_url(url)?;
            }
            (None, Some(origin)) => {
                super::derive_ws_url(origin)?;
            }
            _ => {
                return Err(OtSockError::BadConfig(
                    "exactly one of client.url and client.page_origin must be set".into(),
                ))
            }
        }
        if self.username.trim().is_empty() {
            return Err(OtSockError::BadConfig("client.username must not be empty".into()));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(OtSockError::BadConfig(
                "client.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        if self.keepalive_ms != 0 && !(1000..=120000).contains(&self.keepalive_ms) {
            return Err(OtSockError::BadConfig(
                "client.keepalive_ms must be 0 or between 1000 and 120000".into(),
            ));
        }
        Ok(())
    }
}

fn default_username() -> String {
    "anonymous".into()
}
fn default_outbound_queue() -> usize {
    256
}
fn default_keepalive_ms() -> u64 {
    20000
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolSection {
    #[serde(default)]
    pub dialect: Dialect,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectSection {
    #[serde(default = "default_reconnect_enabled")]
    pub enabled: bool,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// 0 = retry forever.
    #[serde(default)]
    pub max_attempts: u32,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            enabled: default_reconnect_enabled(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_attempts: 0,
        }
    }
}

impl ReconnectSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=60000).contains(&self.initial_backoff_ms) {
            return Err(OtSockError::BadConfig(
                "reconnect.initial_backoff_ms must be between 10 and 60000".into(),
            ));
        }
        if self.max_backoff_ms < self.initial_backoff_ms || self.max_backoff_ms > 600000 {
            return Err(OtSockError::BadConfig(
                "reconnect.max_backoff_ms must be >= initial_backoff_ms and <= 600000".into(),
            ));
        }
        Ok(())
    }
}

fn default_reconnect_enabled() -> bool {
    true
}
fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    30000
}
