//! Client config loader (strict parsing).

pub mod schema;

use std::fs;

use url::Url;

use otsock_core::error::{OtSockError, Result};

pub use schema::{ClientConfig, ClientSection, ProtocolSection, ReconnectSection};

pub fn load_from_file(path: &str) -> Result<ClientConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| OtSockError::BadConfig(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ClientConfig> {
    let cfg: ClientConfig = serde_yaml::from_str(s)
        .map_err(|e| OtSockError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Socket endpoint for a hosting page: `http(s)://host[:port][/...]` -> `ws(s)://host[:port]/ws`.
///
/// Only scheme, host and port carry over; path, query, fragment and
/// credentials of the page are discarded.
pub fn derive_ws_url(page_origin: &str) -> Result<String> {
    let origin = Url::parse(page_origin)
        .map_err(|e| OtSockError::BadConfig(format!("invalid page origin {page_origin}: {e}")))?;
    let ws_scheme = match origin.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => {
            return Err(OtSockError::BadConfig(format!(
                "page origin scheme must be http or https, got {other}"
            )))
        }
    };
    let host = non_empty_host(&origin, page_origin)?;
    Ok(match origin.port() {
        Some(port) => format!("{ws_scheme}://{host}:{port}/ws"),
        None => format!("{ws_scheme}://{host}/ws"),
    })
}

/// Check an explicit socket URL: `ws` or `wss` with a host.
pub fn validate_ws_url(raw: &str) -> Result<()> {
    let url = Url::parse(raw)
        .map_err(|e| OtSockError::BadConfig(format!("invalid client.url {raw}: {e}")))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(OtSockError::BadConfig(
            "client.url must start with ws:// or wss://".into(),
        ));
    }
    non_empty_host(&url, raw)?;
    Ok(())
}

fn non_empty_host<'a>(url: &'a Url, raw: &str) -> Result<&'a str> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| OtSockError::BadConfig(format!("url has no host: {raw}")))
}
