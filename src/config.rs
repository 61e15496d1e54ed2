//! Pipeline configuration loaded from an optional YAML file.
//!
//! Every field has a default matching the idnes.cz COVID-19 foreign-news
//! listing, so an empty file (or no file at all) is a valid configuration.
//!
//! ```yaml
//! site:
//!   max_listing: 460
//! pacing:
//!   article: { min_secs: 5.0, max_secs: 10.0 }
//! text:
//!   reduction: lemmatize_and_stem
//! enrichment:
//!   top_words: ~   # keep the full frequency table
//! ```

use crate::error::{Result, ScrapeError};
use crate::scrapers::enrich::FrequencyRetention;
use crate::text::ReductionMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub sources: SourceConfig,
    pub pacing: PacingConfig,
    pub text: TextConfig,
    pub enrichment: EnrichConfig,
}

/// The scraped site and its listing pages.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin prepended to relative article links.
    pub base_url: String,
    /// Path of the topic listing; the page number is appended.
    pub listing_path: String,
    /// Highest listing page known to exist.
    pub max_listing: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.idnes.cz".to_string(),
            listing_path: "/zpravy/zahranicni/koronavirus.K466979/".to_string(),
            max_listing: 455,
        }
    }
}

/// Fallback content sources and HTTP settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    pub archive_lookup_url: String,
    pub cache_proxy_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// SOCKS proxy of a running TOR client, e.g. `socks5h://127.0.0.1:9050`.
    pub tor_proxy: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            archive_lookup_url: "http://archive.org/wayback/available?url=".to_string(),
            cache_proxy_url: "https://webcache.googleusercontent.com/search?q=cache:".to_string(),
            timeout_secs: 30,
            user_agent: concat!("czech_news_miner/", env!("CARGO_PKG_VERSION")).to_string(),
            tor_proxy: None,
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Inclusive bounds of a randomized pause, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct DelayBounds {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayBounds {
    /// Reject bounds that cannot become a [`Duration`] (negative, NaN,
    /// infinite or out of range).
    fn validate(&self, name: &str) -> Result<()> {
        for (field, secs) in [("min_secs", self.min_secs), ("max_secs", self.max_secs)] {
            if let Err(e) = Duration::try_from_secs_f64(secs) {
                return Err(ScrapeError::InvalidConfig {
                    field: format!("pacing.{name}.{field}"),
                    reason: format!("{secs} seconds: {e}"),
                });
            }
        }
        Ok(())
    }

    pub fn min(&self) -> Duration {
        Duration::from_secs_f64(self.min_secs.max(0.0))
    }

    pub fn max(&self) -> Duration {
        Duration::from_secs_f64(self.max_secs.max(self.min_secs).max(0.0))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Pause between listing page requests.
    pub listing: DelayBounds,
    /// Pause between article requests.
    pub article: DelayBounds,
    /// Fixed seed for reproducible pauses.
    pub seed: Option<u64>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            listing: DelayBounds {
                min_secs: 5.0,
                max_secs: 10.0,
            },
            article: DelayBounds {
                min_secs: 10.0,
                max_secs: 15.0,
            },
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TextConfig {
    pub reduction: ReductionMode,
    /// Tab-separated `form<TAB>lemma` dictionary.
    pub lemma_dictionary: Option<PathBuf>,
    /// Newline-separated extra stopwords.
    pub extra_stopwords: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Number of most frequent words kept per article; `~` keeps all.
    pub top_words: Option<usize>,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self { top_words: Some(50) }
    }
}

impl EnrichConfig {
    pub fn retention(&self) -> FrequencyRetention {
        match self.top_words {
            Some(n) => FrequencyRetention::Top(n),
            None => FrequencyRetention::Full,
        }
    }
}

impl Config {
    /// Load from `path`, or fall back to defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path).await?;
        let config = Self::from_yaml(&contents)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(contents)?;
        config.pacing.listing.validate("listing")?;
        config.pacing.article.validate("article")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.site.base_url, "https://www.idnes.cz");
        assert_eq!(config.site.max_listing, 455);
        assert_eq!(config.sources.timeout(), Duration::from_secs(30));
        assert_eq!(config.pacing.article.min(), Duration::from_secs(10));
        assert_eq!(config.pacing.article.max(), Duration::from_secs(15));
        assert_eq!(config.text.reduction, ReductionMode::Lemmatize);
        assert_eq!(config.enrichment.retention(), FrequencyRetention::Top(50));
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
site:
  max_listing: 460
pacing:
  article: { min_secs: 1.0, max_secs: 2.5 }
  seed: 7
text:
  reduction: lemmatize_and_stem
enrichment:
  top_words: ~
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.site.max_listing, 460);
        assert_eq!(config.site.base_url, "https://www.idnes.cz");
        assert_eq!(config.pacing.article.max(), Duration::from_millis(2500));
        assert_eq!(config.pacing.listing.min(), Duration::from_secs(5));
        assert_eq!(config.pacing.seed, Some(7));
        assert_eq!(config.text.reduction, ReductionMode::LemmatizeAndStem);
        assert_eq!(config.enrichment.retention(), FrequencyRetention::Full);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = Config::from_yaml("  \n").unwrap();
        assert_eq!(config.sources.timeout_secs, 30);
    }

    #[test]
    fn test_inverted_bounds_are_clamped() {
        let bounds = DelayBounds {
            min_secs: 3.0,
            max_secs: 1.0,
        };
        assert_eq!(bounds.max(), Duration::from_secs(3));
    }

    #[test]
    fn test_unusable_delay_bounds_are_rejected() {
        for yaml in [
            "pacing:\n  article: { min_secs: 1.0, max_secs: .inf }\n",
            "pacing:\n  listing: { min_secs: .nan, max_secs: 2.0 }\n",
            "pacing:\n  listing: { min_secs: -1.0, max_secs: 2.0 }\n",
            "pacing:\n  article: { min_secs: 1.0, max_secs: 1.0e300 }\n",
        ] {
            let err = Config::from_yaml(yaml).unwrap_err();
            assert!(
                matches!(&err, ScrapeError::InvalidConfig { field, .. } if field.starts_with("pacing.")),
                "{yaml}: {err}"
            );
        }
        assert!(Config::from_yaml("pacing:\n  article: { min_secs: 0.0, max_secs: 0.5 }\n").is_ok());
    }
}
