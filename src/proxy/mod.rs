//! SOCKS5 proxy wiring and the fail-fast connectivity probe.
//!
//! Proxy routing is applied to one `reqwest::Client` that gets injected into
//! every network-performing component, never to ambient process state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tor Browser's default SOCKS5 port.
pub const DEFAULT_PROXY_PORT: u16 = 9150;
pub const DEFAULT_PROXY_HOST: &str = "127.0.0.1";

/// Endpoint that echoes the caller's public IP.
const IP_PROBE_URL: &str = "https://httpbin.org/ip";
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PROXY_HOST.to_string(),
            port: DEFAULT_PROXY_PORT,
        }
    }
}

impl ProxyConfig {
    /// SOCKS5 URL with remote DNS resolution, so lookups also go through Tor.
    pub fn url(&self) -> String {
        format!("socks5h://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid proxy address {0}: {1}")]
    InvalidProxy(String, String),

    #[error("Tor connection failed: {0}")]
    ProbeFailed(String),
}

/// Build the HTTP client every network call goes through. When a proxy is
/// supplied, all outbound traffic is routed over it.
pub fn build_client(proxy: Option<&ProxyConfig>) -> Result<reqwest::Client, ProxyError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        reqwest::header::HeaderValue::from_static("en-US"),
    );

    let mut builder = reqwest::Client::builder()
        .cookie_store(true)
        .default_headers(headers);

    if let Some(proxy) = proxy {
        let url = proxy.url();
        tracing::info!(proxy = %url, "routing traffic through SOCKS5 proxy");
        let proxy = reqwest::Proxy::all(&url)
            .map_err(|e| ProxyError::InvalidProxy(url.clone(), e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ProxyError::InvalidProxy("client".to_string(), e.to_string()))
}

#[derive(Debug, Deserialize)]
struct IpProbe {
    origin: String,
}

/// Verify connectivity by asking an external endpoint for our exit IP.
/// Returns the observed IP on success.
pub async fn verify_connectivity(client: &reqwest::Client) -> Result<String, ProxyError> {
    tracing::debug!(url = IP_PROBE_URL, "probing proxy connectivity");

    let response = client
        .get(IP_PROBE_URL)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
        .map_err(|e| ProxyError::ProbeFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ProxyError::ProbeFailed(format!(
            "probe returned HTTP {}",
            response.status()
        )));
    }

    let probe: IpProbe = response
        .json()
        .await
        .map_err(|e| ProxyError::ProbeFailed(format!("unparsable probe response: {e}")))?;

    Ok(probe.origin)
}
