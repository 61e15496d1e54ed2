//! Delimited-text record sets.
//!
//! Every stage writes one CSV file per listing page, one row per article,
//! with a leading `index` column:
//!
//! ```text
//! data_dir/
//! ├── partial_289.csv   # listing summaries
//! ├── full_289.csv      # summaries + article content
//! └── ...
//! ```
//!
//! List and mapping columns hold JSON literals (`["a","b"]`,
//! `{"stav":2}`) and are read back with a JSON parser. An empty cell is the
//! absent marker, so `[]` and "absent" stay distinguishable.

use crate::error::{Result, ScrapeError};
use crate::models::{ArticleContent, ArticleSummary, EnrichedArticle};
use chrono::{NaiveDate, NaiveTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

pub fn partial_path(data_dir: &Path, page: u32) -> PathBuf {
    data_dir.join(format!("partial_{page}.csv"))
}

pub fn full_path(data_dir: &Path, page: u32) -> PathBuf {
    data_dir.join(format!("full_{page}.csv"))
}

#[derive(Debug, Serialize, Deserialize)]
struct SummaryRow {
    index: usize,
    link: String,
    published_at: String,
    published_time: Option<String>,
    title_tokens: String,
    lead_tokens_short: Option<String>,
    is_premium: bool,
    is_video: bool,
    is_gallery: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct EnrichedRow {
    index: usize,
    link: String,
    published_at: String,
    published_time: Option<String>,
    title_tokens: String,
    lead_tokens_short: Option<String>,
    is_premium: bool,
    is_video: bool,
    is_gallery: bool,
    lead_tokens_full: Option<String>,
    word_frequencies: Option<String>,
    author_ids: Option<String>,
    topics: Option<String>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn opt_to_json<T: Serialize>(value: &Option<T>) -> Result<Option<String>> {
    value.as_ref().map(to_json).transpose()
}

fn from_json<T: DeserializeOwned>(index: usize, column: &str, cell: &str) -> Result<T> {
    serde_json::from_str(cell).map_err(|e| ScrapeError::MalformedRecord {
        index,
        reason: format!("column `{column}`: {e}"),
    })
}

fn opt_from_json<T: DeserializeOwned>(
    index: usize,
    column: &str,
    cell: Option<&str>,
) -> Result<Option<T>> {
    cell.map(|cell| from_json(index, column, cell)).transpose()
}

impl SummaryRow {
    fn from_summary(index: usize, summary: &ArticleSummary) -> Result<Self> {
        Ok(Self {
            index,
            link: summary.link.clone(),
            published_at: summary.published_at.format(DATE_FORMAT).to_string(),
            published_time: summary
                .published_time
                .map(|t| t.format(TIME_FORMAT).to_string()),
            title_tokens: to_json(&summary.title_tokens)?,
            lead_tokens_short: opt_to_json(&summary.lead_tokens_short)?,
            is_premium: summary.is_premium,
            is_video: summary.is_video,
            is_gallery: summary.is_gallery,
        })
    }

    fn into_summary(self) -> Result<ArticleSummary> {
        let index = self.index;
        let malformed = |reason: String| ScrapeError::MalformedRecord { index, reason };

        let published_at = NaiveDate::parse_from_str(&self.published_at, DATE_FORMAT)
            .map_err(|e| malformed(format!("published_at `{}`: {e}", self.published_at)))?;
        let published_time = self
            .published_time
            .as_deref()
            .map(|t| {
                NaiveTime::parse_from_str(t, TIME_FORMAT)
                    .map_err(|e| malformed(format!("published_time `{t}`: {e}")))
            })
            .transpose()?;

        Ok(ArticleSummary {
            link: self.link,
            published_at,
            published_time,
            title_tokens: from_json(index, "title_tokens", &self.title_tokens)?,
            lead_tokens_short: opt_from_json(
                index,
                "lead_tokens_short",
                self.lead_tokens_short.as_deref(),
            )?,
            is_premium: self.is_premium,
            is_video: self.is_video,
            is_gallery: self.is_gallery,
        })
    }
}

impl EnrichedRow {
    fn from_article(index: usize, article: &EnrichedArticle) -> Result<Self> {
        let s = SummaryRow::from_summary(index, &article.summary)?;
        let c = &article.content;
        Ok(Self {
            index,
            link: s.link,
            published_at: s.published_at,
            published_time: s.published_time,
            title_tokens: s.title_tokens,
            lead_tokens_short: s.lead_tokens_short,
            is_premium: s.is_premium,
            is_video: s.is_video,
            is_gallery: s.is_gallery,
            lead_tokens_full: opt_to_json(&c.lead_tokens_full)?,
            word_frequencies: opt_to_json(&c.word_frequencies)?,
            author_ids: opt_to_json(&c.author_ids)?,
            topics: opt_to_json(&c.topics)?,
        })
    }

    fn into_article(self) -> Result<EnrichedArticle> {
        let index = self.index;
        let content = ArticleContent {
            lead_tokens_full: opt_from_json(
                index,
                "lead_tokens_full",
                self.lead_tokens_full.as_deref(),
            )?,
            word_frequencies: opt_from_json(
                index,
                "word_frequencies",
                self.word_frequencies.as_deref(),
            )?,
            author_ids: opt_from_json(index, "author_ids", self.author_ids.as_deref())?,
            topics: opt_from_json(index, "topics", self.topics.as_deref())?,
        };
        let summary = SummaryRow {
            index,
            link: self.link,
            published_at: self.published_at,
            published_time: self.published_time,
            title_tokens: self.title_tokens,
            lead_tokens_short: self.lead_tokens_short,
            is_premium: self.is_premium,
            is_video: self.is_video,
            is_gallery: self.is_gallery,
        }
        .into_summary()?;
        Ok(EnrichedArticle { summary, content })
    }
}

pub fn write_summaries<W: io::Write>(writer: W, summaries: &[ArticleSummary]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for (index, summary) in summaries.iter().enumerate() {
        csv.serialize(SummaryRow::from_summary(index, summary)?)?;
    }
    csv.flush()?;
    Ok(())
}

/// Read summaries. Enriched files can be read too; their extra columns are ignored.
pub fn read_summaries<R: io::Read>(reader: R) -> Result<Vec<ArticleSummary>> {
    csv::Reader::from_reader(reader)
        .deserialize::<SummaryRow>()
        .map(|row| row?.into_summary())
        .collect()
}

pub fn write_enriched<W: io::Write>(writer: W, articles: &[EnrichedArticle]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for (index, article) in articles.iter().enumerate() {
        csv.serialize(EnrichedRow::from_article(index, article)?)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn read_enriched<R: io::Read>(reader: R) -> Result<Vec<EnrichedArticle>> {
    csv::Reader::from_reader(reader)
        .deserialize::<EnrichedRow>()
        .map(|row| row?.into_article())
        .collect()
}

#[instrument(level = "info", skip(summaries), fields(count = summaries.len()))]
pub async fn save_summaries(path: &Path, summaries: &[ArticleSummary]) -> Result<()> {
    let mut buf = Vec::new();
    write_summaries(&mut buf, summaries)?;
    fs::write(path, buf).await?;
    info!("Wrote summary records");
    Ok(())
}

#[instrument(level = "info")]
pub async fn load_summaries(path: &Path) -> Result<Vec<ArticleSummary>> {
    let bytes = fs::read(path).await?;
    read_summaries(bytes.as_slice())
}

#[instrument(level = "info", skip(articles), fields(count = articles.len()))]
pub async fn save_enriched(path: &Path, articles: &[EnrichedArticle]) -> Result<()> {
    let mut buf = Vec::new();
    write_enriched(&mut buf, articles)?;
    fs::write(path, buf).await?;
    info!("Wrote enriched records");
    Ok(())
}

#[instrument(level = "info")]
pub async fn load_enriched(path: &Path) -> Result<Vec<EnrichedArticle>> {
    let bytes = fs::read(path).await?;
    read_enriched(bytes.as_slice())
}

/// Page number of a `full_<page>.csv` file name.
fn full_file_page(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("full_")?
        .strip_suffix(".csv")?
        .parse()
        .ok()
}

/// Concatenate every `full_<page>.csv` in `data_dir`, in page order, into
/// `output` with a fresh index. Returns the number of merged rows.
#[instrument(level = "info")]
pub async fn merge(data_dir: &Path, output: &Path) -> Result<usize> {
    let mut pages = Vec::new();
    let mut entries = fs::read_dir(data_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        match full_file_page(&path) {
            Some(page) => pages.push((page, path)),
            None => {
                debug!(path = %path.display(), "Not a record file; ignoring")
            }
        }
    }
    pages.sort_by_key(|(page, _)| *page);

    if pages.is_empty() {
        warn!("No record files to merge");
    }

    let mut merged = Vec::new();
    for (page, path) in &pages {
        let articles = load_enriched(path).await?;
        info!(page, rows = articles.len(), "Merging page");
        merged.extend(articles);
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    save_enriched(output, &merged).await?;
    info!(files = pages.len(), rows = merged.len(), "Merged dataset");
    Ok(merged.len())
}
