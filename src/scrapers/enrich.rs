//! Article content enrichment.
//!
//! [`Enricher::enrich`] walks the listing summaries one at a time, in order,
//! and attaches the fields that only the article page itself provides:
//! the full lead, a word-frequency table of the body, anonymized author ids
//! and topic tags.
//!
//! Premium, video and gallery articles are skipped without any request.
//! Every other article is resolved through the [`Resolver`] cascade, and
//! consecutive requests are spaced by the configured [`DelayPolicy`].
//! Nothing here aborts the batch: a page that cannot be resolved, or an
//! element that is missing, only leaves the affected fields empty.

use crate::config::{DelayBounds, SiteConfig};
use crate::document::{Document, Query, QueryBuilder};
use crate::models::{ArticleContent, ArticleSummary, AuthorId, EnrichedArticle, WordFrequencies};
use crate::pacing::{DelayPolicy, pause};
use crate::resolver::{Resolution, Resolver};
use crate::text::Normalizer;
use crate::transport::Transport;
use itertools::Itertools;
use once_cell::sync::Lazy;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// How much of an article's word-frequency table is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyRetention {
    /// The `n` most frequent tokens; ties keep first-occurrence order.
    Top(usize),
    Full,
}

fn query(builder: QueryBuilder) -> Query {
    builder.build().expect("static article selector")
}

static OPENER: Lazy<Query> = Lazy::new(|| query(Query::tag("div").class("opener")));
// Older article template
static EXCERPT: Lazy<Query> = Lazy::new(|| query(Query::tag("div").class("excert")));
static BODY: Lazy<Query> = Lazy::new(|| query(Query::tag("div").id("art-text")));
static BODY_FALLBACK: Lazy<Query> = Lazy::new(|| query(Query::tag("div").class("content")));
static PARAGRAPH: Lazy<Query> = Lazy::new(|| query(Query::tag("p").unclassed()));
static AUTHORS: Lazy<Query> = Lazy::new(|| query(Query::tag("div").class("authors")));
static AUTHOR_NAME: Lazy<Query> =
    Lazy::new(|| query(Query::tag("span").attr("itemprop", "name")));
static TAGS: Lazy<Query> = Lazy::new(|| query(Query::tag("div").id("art-tags")));
static TAG: Lazy<Query> = Lazy::new(|| query(Query::tag("a")));

pub struct Enricher<'a, T: Transport, P: DelayPolicy + ?Sized> {
    resolver: Resolver<'a, T>,
    normalizer: &'a Normalizer,
    site: &'a SiteConfig,
    pacing: DelayBounds,
    delay: &'a mut P,
    retention: FrequencyRetention,
}

impl<'a, T: Transport, P: DelayPolicy + ?Sized> Enricher<'a, T, P> {
    pub fn new(
        resolver: Resolver<'a, T>,
        normalizer: &'a Normalizer,
        site: &'a SiteConfig,
        pacing: DelayBounds,
        delay: &'a mut P,
        retention: FrequencyRetention,
    ) -> Self {
        Self {
            resolver,
            normalizer,
            site,
            pacing,
            delay,
            retention,
        }
    }

    /// Enrich `summaries` sequentially, preserving their order.
    #[instrument(level = "info", skip_all, fields(count = summaries.len()))]
    pub async fn enrich(&mut self, summaries: Vec<ArticleSummary>) -> Vec<EnrichedArticle> {
        let total = summaries.len();
        let t0 = Instant::now();
        let mut requested_before = false;
        let mut enriched = Vec::with_capacity(total);

        for (i, summary) in summaries.into_iter().enumerate() {
            let remaining = total - i;
            info!(
                article = i + 1,
                total,
                eta_secs = (self.pacing.max_secs * remaining as f64).round() as u64,
                link = %summary.link,
                "Processing article"
            );

            if summary.is_restricted() {
                info!(
                    premium = summary.is_premium,
                    video = summary.is_video,
                    gallery = summary.is_gallery,
                    "Premium, gallery, or video article; skipping"
                );
                enriched.push(EnrichedArticle {
                    summary,
                    content: ArticleContent::absent(),
                });
                continue;
            }

            if requested_before {
                pause(&mut *self.delay, &self.pacing).await;
            }
            requested_before = true;

            let content = self.fetch_content(&summary.link).await;
            enriched.push(EnrichedArticle { summary, content });
        }

        let fetched = enriched.iter().filter(|a| !a.content.is_absent()).count();
        info!(
            total,
            fetched,
            skipped = total - fetched,
            elapsed_secs = t0.elapsed().as_secs(),
            "Finished enriching articles"
        );
        enriched
    }

    async fn fetch_content(&self, link: &str) -> ArticleContent {
        let url = match article_url(&self.site.base_url, link) {
            Ok(url) => url,
            Err(e) => {
                warn!(%link, error = %e, "Cannot build article URL; skipping");
                return ArticleContent::absent();
            }
        };

        match self.resolver.resolve(&url).await {
            Ok(Resolution::Found { document, source }) => {
                debug!(%url, %source, "Resolved article page");
                extract_content(&document, self.normalizer, self.retention)
            }
            Ok(Resolution::Unavailable) => {
                warn!(%url, "Tried the archive, the anonymizing transport and the cache proxy; found nothing. Skipping");
                ArticleContent::absent()
            }
            Err(e) => {
                warn!(%url, error = %e, "Resolving the article failed; skipping");
                ArticleContent::absent()
            }
        }
    }
}

/// Absolute URL of a site-relative article link.
pub fn article_url(base_url: &str, link: &str) -> Result<String, url::ParseError> {
    Ok(Url::parse(base_url)?.join(link)?.to_string())
}

/// Extract every content field from a resolved article page.
pub fn extract_content(
    document: &Document,
    normalizer: &Normalizer,
    retention: FrequencyRetention,
) -> ArticleContent {
    ArticleContent {
        lead_tokens_full: full_lead(document, normalizer),
        word_frequencies: word_frequencies(document, normalizer, retention),
        author_ids: author_ids(document),
        topics: topics(document),
    }
}

fn full_lead(document: &Document, normalizer: &Normalizer) -> Option<Vec<String>> {
    document
        .find_first(&OPENER)
        .or_else(|| document.find_first(&EXCERPT))
        .map(|lead| normalizer.normalize(&lead.text()))
}

fn word_frequencies(
    document: &Document,
    normalizer: &Normalizer,
    retention: FrequencyRetention,
) -> Option<WordFrequencies> {
    let body = document
        .find_first(&BODY)
        .or_else(|| document.find_first(&BODY_FALLBACK))?;
    let tokens: Vec<String> = body
        .find_all(&PARAGRAPH)
        .iter()
        .flat_map(|p| normalizer.normalize(&p.text()))
        .collect();
    Some(count_words(&tokens, retention))
}

/// Count tokens, keeping the entries selected by `retention`.
pub fn count_words(tokens: &[String], retention: FrequencyRetention) -> WordFrequencies {
    let counts = tokens.iter().counts();
    let mut ranked: Vec<(&String, usize)> = tokens
        .iter()
        .unique()
        .map(|token| (token, counts[token]))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    if let FrequencyRetention::Top(n) = retention {
        ranked.truncate(n);
    }
    ranked
        .into_iter()
        .map(|(token, count)| (token.clone(), count as u32))
        .collect()
}

fn author_ids(document: &Document) -> Option<Vec<AuthorId>> {
    let names = document.find_first(&AUTHORS)?.find_first(&AUTHOR_NAME)?.text();
    let ids: Vec<AuthorId> = names
        .split(", ")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(AuthorId::from_name)
        .collect();
    (!ids.is_empty()).then_some(ids)
}

fn topics(document: &Document) -> Option<Vec<String>> {
    let tags: Vec<String> = document
        .find_first(&TAGS)?
        .find_all(&TAG)
        .iter()
        .map(|tag| tag.text().trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .unique()
        .collect();
    (!tags.is_empty()).then_some(tags)
}
