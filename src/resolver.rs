//! Content source resolution.
//!
//! Article pages are not requested from the origin when a copy exists
//! elsewhere. [`Resolver::resolve`] walks a fixed cascade:
//!
//! 1. **Archive snapshot**: ask the Wayback availability API; if the closest
//!    snapshot is available, fetch it (through the anonymizing transport when
//!    one is configured).
//! 2. **Anonymized live fetch**: fetch the original URL through the
//!    anonymizing transport, if any.
//! 3. **Cache proxy**: fetch the cache-proxy rendering directly; a
//!    non-success status means the page is [`Resolution::Unavailable`].
//!
//! A failed availability lookup counts as "no snapshot". A transport error on
//! a content fetch is not retried here; it is returned to the caller.

use crate::config::SourceConfig;
use crate::document::Document;
use crate::error::Result;
use crate::transport::Transport;
use serde::Deserialize;
use std::fmt;
use tracing::{info, instrument, warn};

/// Where a resolved page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Archive,
    Anonymized,
    CacheProxy,
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentSource::Archive => "archive",
            ContentSource::Anonymized => "anonymized",
            ContentSource::CacheProxy => "cache-proxy",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum Resolution {
    Found {
        document: Document,
        source: ContentSource,
    },
    Unavailable,
}

/// Response of the Wayback Machine availability API.
#[derive(Debug, Deserialize)]
struct Availability {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<Snapshot>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    available: bool,
    url: String,
}

pub struct Resolver<'t, T: Transport> {
    direct: &'t T,
    anonymizing: Option<&'t T>,
    sources: &'t SourceConfig,
}

impl<T: Transport> fmt::Debug for Resolver<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("anonymizing", &self.anonymizing.is_some())
            .field("timeout_secs", &self.sources.timeout_secs)
            .finish()
    }
}

impl<'t, T: Transport> Resolver<'t, T> {
    pub fn new(direct: &'t T, anonymizing: Option<&'t T>, sources: &'t SourceConfig) -> Self {
        Self {
            direct,
            anonymizing,
            sources,
        }
    }

    /// Transport preferred for third-party services.
    fn preferred(&self) -> &'t T {
        self.anonymizing.unwrap_or(self.direct)
    }

    pub fn archive_lookup_url(&self, url: &str) -> String {
        format!(
            "{}{}",
            self.sources.archive_lookup_url,
            urlencoding::encode(url)
        )
    }

    pub fn cache_proxy_url(&self, url: &str) -> String {
        format!("{}{}", self.sources.cache_proxy_url, url)
    }

    #[instrument(level = "info", skip(self))]
    pub async fn resolve(&self, url: &str) -> Result<Resolution> {
        let timeout = self.sources.timeout();

        if let Some(snapshot_url) = self.closest_snapshot(url).await {
            info!(%snapshot_url, "Found a snapshot on the archive");
            let response = self.preferred().fetch(&snapshot_url, timeout).await?;
            if response.is_success() {
                return Ok(Resolution::Found {
                    document: Document::parse(&response.body),
                    source: ContentSource::Archive,
                });
            }
            warn!(status = %response.status, "Snapshot fetch was not successful; falling through");
        }

        if let Some(anonymizing) = self.anonymizing {
            info!("Not archived; fetching through the anonymizing transport");
            let response = anonymizing.fetch(url, timeout).await?;
            if response.is_success() {
                return Ok(Resolution::Found {
                    document: Document::parse(&response.body),
                    source: ContentSource::Anonymized,
                });
            }
            warn!(status = %response.status, "Anonymized fetch was not successful; falling through");
        }

        let cache_url = self.cache_proxy_url(url);
        info!(%cache_url, "Trying the cache proxy");
        let response = self.direct.fetch(&cache_url, timeout).await?;
        if !response.is_success() {
            warn!(status = %response.status, "Page has not been cached");
            return Ok(Resolution::Unavailable);
        }
        Ok(Resolution::Found {
            document: Document::parse(&response.body),
            source: ContentSource::CacheProxy,
        })
    }

    /// URL of the closest available snapshot, if any.
    async fn closest_snapshot(&self, url: &str) -> Option<String> {
        let lookup_url = self.archive_lookup_url(url);
        let response = match self.preferred().fetch(&lookup_url, self.sources.timeout()).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                warn!(status = %response.status, "Archive lookup was not successful");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Archive lookup failed");
                return None;
            }
        };

        match serde_json::from_str::<Availability>(&response.body) {
            Ok(availability) => availability
                .archived_snapshots
                .closest
                .filter(|snapshot| snapshot.available)
                .map(|snapshot| snapshot.url),
            Err(e) => {
                warn!(error = %e, "Archive lookup returned unexpected JSON");
                None
            }
        }
    }
}
