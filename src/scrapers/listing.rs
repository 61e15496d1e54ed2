//! Listing page scraper.
//!
//! A listing page (`<base_url><listing_path><page>`) holds about three dozen
//! article blocks inside `div#list-art-count`. Each `div.art` block becomes
//! one [`ArticleSummary`], in document order.
//!
//! The block layout is assumed to be stable: a block without a link,
//! timestamp or headline means the site template changed, and the whole page
//! fails with [`ScrapeError::MalformedListing`].

use crate::config::SiteConfig;
use crate::document::{Document, Node, Query, QueryBuilder};
use crate::error::{Result, ScrapeError};
use crate::models::ArticleSummary;
use crate::text::Normalizer;
use crate::transport::Transport;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use itertools::Itertools;
use once_cell::sync::Lazy;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Label the site puts in front of premium leads.
pub const PREMIUM_LABEL: &str = "Premium";
/// Link suffix of photo-gallery articles.
pub const GALLERY_SUFFIX: &str = "/foto";

fn query(builder: QueryBuilder) -> Query {
    builder.build().expect("static listing selector")
}

static CONTAINER: Lazy<Query> = Lazy::new(|| query(Query::tag("div").id("list-art-count")));
static BLOCK: Lazy<Query> = Lazy::new(|| query(Query::tag("div").class("art")));
static LINK: Lazy<Query> = Lazy::new(|| query(Query::tag("a").class("art-link").has_attr("href")));
static TIME: Lazy<Query> = Lazy::new(|| query(Query::tag("span").class("time")));
static HEADLINE: Lazy<Query> = Lazy::new(|| query(Query::tag("h3")));
static LEAD: Lazy<Query> = Lazy::new(|| query(Query::tag("p").class("perex")));
static PREMIUM_MARK: Lazy<Query> = Lazy::new(|| query(Query::tag("a").class("premlab")));
static VIDEO_MARK: Lazy<Query> = Lazy::new(|| query(Query::tag("a").attr("score-type", "Video")));

/// URL of listing page number `page`.
pub fn listing_url(site: &SiteConfig, page: u32) -> String {
    format!(
        "{}{}{}",
        site.base_url.trim_end_matches('/'),
        site.listing_path,
        page
    )
}

/// Download and parse listing page number `page`.
#[instrument(level = "info", skip(transport, site, timeout))]
pub async fn fetch_listing<T: Transport>(
    transport: &T,
    site: &SiteConfig,
    timeout: Duration,
    page: u32,
) -> Result<Document> {
    let url = listing_url(site, page);
    let response = transport.fetch(&url, timeout).await?;
    if !response.is_success() {
        return Err(ScrapeError::Status {
            url,
            status: response.status,
        });
    }
    info!(bytes = response.body.len(), "Fetched listing page");
    Ok(Document::parse(&response.body))
}

/// Extract one summary per article block.
#[instrument(level = "info", skip_all)]
pub fn extract_listing(
    document: &Document,
    normalizer: &Normalizer,
    site: &SiteConfig,
) -> Result<Vec<ArticleSummary>> {
    let container = document
        .find_first(&CONTAINER)
        .ok_or_else(|| ScrapeError::MalformedListing {
            block: 0,
            reason: format!("no `{}` container", CONTAINER.css()),
        })?;

    let summaries = container
        .find_all(&BLOCK)
        .into_iter()
        .enumerate()
        .map(|(i, block)| extract_block(i, block, normalizer, site))
        .collect::<Result<Vec<_>>>()?;

    for link in summaries.iter().map(|s| &s.link).duplicates() {
        warn!(%link, "Link appears more than once on the listing page");
    }
    info!(count = summaries.len(), "Extracted article summaries");
    Ok(summaries)
}

fn extract_block(
    index: usize,
    block: Node<'_>,
    normalizer: &Normalizer,
    site: &SiteConfig,
) -> Result<ArticleSummary> {
    let malformed = |reason: &str| ScrapeError::MalformedListing {
        block: index,
        reason: reason.to_string(),
    };

    let anchor = block.find_first(&LINK).ok_or_else(|| malformed("missing article link"))?;
    let href = anchor.attr("href").ok_or_else(|| malformed("missing href"))?;
    let link = relative_link(href, &site.base_url);

    let raw_time = block
        .find_first(&TIME)
        .and_then(|span| span.attr("datetime"))
        .ok_or_else(|| malformed("missing timestamp"))?;
    let timestamp = parse_timestamp(raw_time)
        .ok_or_else(|| malformed(&format!("unparseable timestamp `{raw_time}`")))?;
    let (published_at, published_time) = split_timestamp(timestamp);

    let headline = anchor
        .find_first(&HEADLINE)
        .ok_or_else(|| malformed("missing headline"))?;
    let title_tokens = normalizer.normalize(&headline.text());

    let (lead_tokens_short, is_premium) = match block.find_first(&LEAD) {
        None => (None, false),
        Some(lead) => {
            let text = lead.text();
            if lead.find_first(&PREMIUM_MARK).is_some() {
                (Some(normalizer.normalize(strip_premium_label(&text))), true)
            } else {
                (Some(normalizer.normalize(&text)), false)
            }
        }
    };

    let is_video = block.find_first(&VIDEO_MARK).is_some();
    let is_gallery = link.ends_with(GALLERY_SUFFIX);

    debug!(%link, is_premium, is_video, is_gallery, "Parsed article block");
    Ok(ArticleSummary {
        link,
        published_at,
        published_time,
        title_tokens,
        lead_tokens_short,
        is_premium,
        is_video,
        is_gallery,
    })
}

/// Reduce absolute links on the site's own origin to their path.
fn relative_link(href: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    match href.strip_prefix(base) {
        Some(path) if path.starts_with('/') => path.to_string(),
        _ => href.to_string(),
    }
}

/// Parse a `datetime` attribute as local wall-clock time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    // Numeric offsets without a colon, e.g. `+0100`.
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.naive_local());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Split into date and time; midnight means the site recorded no time.
pub fn split_timestamp(timestamp: NaiveDateTime) -> (NaiveDate, Option<NaiveTime>) {
    let time = timestamp.time();
    let time = (time != NaiveTime::MIN).then_some(time);
    (timestamp.date(), time)
}

/// Drop the premium label and the separator character that follows it.
fn strip_premium_label(text: &str) -> &str {
    match text.trim_start().strip_prefix(PREMIUM_LABEL) {
        Some(rest) => {
            let mut chars = rest.chars();
            chars.next();
            chars.as_str()
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeTransport;

    fn block(href: &str, datetime: &str, title: &str, extra: &str) -> String {
        format!(
            r#"<div class="art">
                 <a class="art-link" href="{href}"><h3>{title}</h3></a>
                 <span class="time" datetime="{datetime}">před chvílí</span>
                 {extra}
               </div>"#
        )
    }

    fn page(blocks: &[String]) -> Document {
        Document::parse(&format!(
            r#"<html><body><div id="list-art-count">{}</div></body></html>"#,
            blocks.join("\n")
        ))
    }

    fn extract(doc: &Document) -> Result<Vec<ArticleSummary>> {
        extract_listing(doc, &Normalizer::default(), &SiteConfig::default())
    }

    #[test]
    fn test_premium_and_plain_blocks() {
        let doc = page(&[
            block(
                "/zpravy/zahranicni/premium.A200315_1",
                "2020-03-15T14:05:00+01:00",
                "Itálie uzavírá školy",
                r#"<p class="perex"><a class="premlab" href="/premium">Premium</a>X Vláda rozhodla o karanténě</p>"#,
            ),
            block(
                "/zpravy/zahranicni/plain.A200315_2",
                "2020-03-15T09:30:00+01:00",
                "Nemocnice hlásí rekord",
                r#"<p class="perex">Počet nakažených koronavirem roste</p>"#,
            ),
        ]);
        let summaries = extract(&doc).unwrap();
        assert_eq!(summaries.len(), 2);

        let premium = &summaries[0];
        assert!(premium.is_premium);
        let lead = premium.lead_tokens_short.as_ref().unwrap();
        assert!(!lead.iter().any(|t| t.contains("premium")));
        assert_eq!(lead, &vec!["karanténa", "rozhodnout", "vláda"]);

        let plain = &summaries[1];
        assert!(!plain.is_premium);
        assert_eq!(plain.link, "/zpravy/zahranicni/plain.A200315_2");
        assert_eq!(plain.title_tokens, vec!["hlásit", "nemocnice", "rekord"]);
        assert_eq!(
            plain.lead_tokens_short.as_ref().unwrap(),
            &vec!["koronavirus", "nakažený", "počet", "růst"]
        );
        assert_eq!(plain.published_time, NaiveTime::from_hms_opt(9, 30, 0));
    }

    #[test]
    fn test_midnight_means_no_time() {
        let doc = page(&[block("/a", "2020-03-15T00:00:00+01:00", "Titulek", "")]);
        let summary = &extract(&doc).unwrap()[0];
        assert_eq!(
            summary.published_at,
            NaiveDate::from_ymd_opt(2020, 3, 15).unwrap()
        );
        assert_eq!(summary.published_time, None);
    }

    #[test]
    fn test_missing_lead_video_and_gallery() {
        let doc = page(&[
            block(
                "/zpravy/video.V200315_1",
                "2020-03-15T10:00:00",
                "Video z Wu-chanu",
                r#"<a score-type="Video" href="/zpravy/video.V200315_1">přehrát</a>"#,
            ),
            block(
                "https://www.idnes.cz/zpravy/zahranicni/galerie.A200315_3/foto",
                "2020-03-15T11:00:00",
                "Prázdné ulice",
                "",
            ),
        ]);
        let summaries = extract(&doc).unwrap();

        assert!(summaries[0].is_video);
        assert!(!summaries[0].is_gallery);
        assert_eq!(summaries[0].lead_tokens_short, None);
        assert!(!summaries[0].is_premium);

        assert_eq!(summaries[1].link, "/zpravy/zahranicni/galerie.A200315_3/foto");
        assert!(summaries[1].is_gallery);
        assert!(!summaries[1].is_video);
    }

    #[test]
    fn test_preserves_document_order() {
        let blocks: Vec<String> = (1..=5)
            .map(|i| block(&format!("/clanek-{i}"), "2020-03-15T12:00:00", "Zpráva", ""))
            .collect();
        let links: Vec<_> = extract(&page(&blocks))
            .unwrap()
            .into_iter()
            .map(|s| s.link)
            .collect();
        assert_eq!(links, vec!["/clanek-1", "/clanek-2", "/clanek-3", "/clanek-4", "/clanek-5"]);
    }

    #[test]
    fn test_block_without_link_is_fatal() {
        let doc = page(&[
            block("/ok", "2020-03-15T12:00:00", "Zpráva", ""),
            r#"<div class="art"><span class="time" datetime="2020-03-15T12:00:00"></span></div>"#
                .to_string(),
        ]);
        match extract(&doc) {
            Err(ScrapeError::MalformedListing { block, .. }) => assert_eq!(block, 1),
            other => panic!("expected malformed listing, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_container_is_fatal() {
        let doc = Document::parse("<html><body><p>Stránka nenalezena</p></body></html>");
        assert!(matches!(
            extract(&doc),
            Err(ScrapeError::MalformedListing { .. })
        ));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 1, 5)
            .unwrap()
            .and_hms_opt(7, 45, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2021-01-05T07:45:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-01-05T07:45:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-01-05 07:45:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2021-01-05").map(split_timestamp),
            Some((NaiveDate::from_ymd_opt(2021, 1, 5).unwrap(), None))
        );
        assert_eq!(parse_timestamp("včera"), None);
    }

    #[test]
    fn test_parse_timestamp_fraction_and_compact_offset() {
        let expected = NaiveDate::from_ymd_opt(2020, 3, 15)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2020-03-15T14:05:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2020-03-15T14:05:00+0100"), Some(expected));
        assert_eq!(parse_timestamp("2020-03-15T14:05:00.250+0100").map(|t| t.time()),
            NaiveTime::from_hms_milli_opt(14, 5, 0, 250));
        assert_eq!(
            parse_timestamp("2020-03-15T14:05:00.000").map(split_timestamp),
            Some((expected.date(), Some(expected.time())))
        );
    }

    #[test]
    fn test_strip_premium_label() {
        assert_eq!(strip_premium_label("PremiumX Text"), " Text");
        assert_eq!(strip_premium_label("  Premium|Zbytek"), "Zbytek");
        assert_eq!(strip_premium_label("Bez štítku"), "Bez štítku");
    }

    #[test]
    fn test_listing_url() {
        assert_eq!(
            listing_url(&SiteConfig::default(), 289),
            "https://www.idnes.cz/zpravy/zahranicni/koronavirus.K466979/289"
        );
    }

    #[tokio::test]
    async fn test_fetch_listing_rejects_error_status() {
        let site = SiteConfig::default();
        let transport = FakeTransport::new().route(&listing_url(&site, 3), 503, "busy");
        let result = fetch_listing(&transport, &site, Duration::from_secs(1), 3).await;
        assert!(matches!(result, Err(ScrapeError::Status { .. })));
    }
}
