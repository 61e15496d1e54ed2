//! HTTP transports.
//!
//! Anything that issues requests takes a [`Transport`] so the same code can
//! run directly, through a TOR SOCKS proxy, or against a fake in tests.
//! A transport is built once and borrowed for the whole run.

use crate::error::Result;
use crate::utils::truncate_for_log;
use reqwest::{Client, Proxy, StatusCode};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

pub trait Transport: fmt::Debug {
    /// GET `url`, failing if no response arrives within `timeout`.
    ///
    /// Non-success statuses are returned as responses, not errors.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse>;
}

/// `reqwest`-backed transport, optionally routed through a proxy.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    label: &'static str,
}

impl HttpTransport {
    /// A transport that talks to hosts directly.
    pub fn direct(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            label: "direct",
        })
    }

    /// A transport that routes every request through `proxy_url`
    /// (e.g. `socks5h://127.0.0.1:9050` for a local TOR client).
    pub fn via_proxy(user_agent: &str, proxy_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .proxy(Proxy::all(proxy_url)?)
            .build()?;
        Ok(Self {
            client,
            label: "proxied",
        })
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("label", &self.label)
            .finish()
    }
}

impl Transport for HttpTransport {
    #[instrument(level = "debug", skip_all, fields(transport = self.label, %url))]
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse> {
        let t0 = Instant::now();
        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "Request failed");
                return Err(e.into());
            }
        };
        let status = response.status();
        let body = response.text().await?;
        debug!(
            %status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched"
        );
        if !status.is_success() {
            debug!(body = %truncate_for_log(&body, 200), "Non-success response body");
        }
        Ok(FetchResponse { status, body })
    }
}
