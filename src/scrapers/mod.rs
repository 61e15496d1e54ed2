//! Scrapers for the news site.
//!
//! Scraping runs in two phases:
//!
//! 1. **Listing**: [`listing`] fetches a listing page directly (or through the
//!    anonymizing relay) and turns every article block into an
//!    [`ArticleSummary`](crate::models::ArticleSummary).
//! 2. **Enrichment**: [`enrich`] resolves each unrestricted article through the
//!    [`Resolver`](crate::resolver::Resolver) cascade and extracts its lead,
//!    body word counts, authors and topics.
//!
//! Both phases are sequential and paced; a failed article only degrades its
//! own fields.

pub mod enrich;
pub mod listing;
