//! Typed view over parsed HTML.
//!
//! Lookups go through [`Query`] values (a tag plus id, class and attribute
//! filters) and return `Option`/`Vec`, so every "element may be missing"
//! branch is handled explicitly by the caller.

use crate::error::{Result, ScrapeError};
use scraper::{ElementRef, Html, Selector};
use std::fmt;

/// A compiled element query.
#[derive(Clone)]
pub struct Query {
    css: String,
    selector: Selector,
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Query").field(&self.css).finish()
    }
}

impl Query {
    pub fn tag(tag: &str) -> QueryBuilder {
        QueryBuilder {
            css: tag.to_string(),
        }
    }

    pub fn css(&self) -> &str {
        &self.css
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    css: String,
}

impl QueryBuilder {
    pub fn id(mut self, id: &str) -> Self {
        self.css.push_str(&format!("[id=\"{}\"]", escape(id)));
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.css.push('.');
        self.css.push_str(class);
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.css
            .push_str(&format!("[{}=\"{}\"]", name, escape(value)));
        self
    }

    pub fn has_attr(mut self, name: &str) -> Self {
        self.css.push_str(&format!("[{name}]"));
        self
    }

    /// Only match elements without a `class` attribute.
    pub fn unclassed(mut self) -> Self {
        self.css.push_str(":not([class])");
        self
    }

    pub fn build(self) -> Result<Query> {
        let selector = Selector::parse(&self.css).map_err(|e| ScrapeError::Selector {
            css: self.css.clone(),
            reason: e.to_string(),
        })?;
        Ok(Query {
            css: self.css,
            selector,
        })
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A parsed HTML page.
pub struct Document {
    html: Html,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").finish_non_exhaustive()
    }
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    pub fn find_first(&self, query: &Query) -> Option<Node<'_>> {
        self.html.select(&query.selector).next().map(Node)
    }

    pub fn find_all(&self, query: &Query) -> Vec<Node<'_>> {
        self.html.select(&query.selector).map(Node).collect()
    }
}

/// An element inside a [`Document`].
#[derive(Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Node").field(&self.0.value().name()).finish()
    }
}

impl<'a> Node<'a> {
    /// First matching descendant.
    pub fn find_first(&self, query: &Query) -> Option<Node<'a>> {
        self.0.select(&query.selector).next().map(Node)
    }

    /// All matching descendants in document order.
    pub fn find_all(&self, query: &Query) -> Vec<Node<'a>> {
        self.0.select(&query.selector).map(Node).collect()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    /// Concatenated text of this element and its descendants.
    pub fn text(&self) -> String {
        self.0.text().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div id="art-text">
            <p>First <b>bold</b> paragraph.</p>
            <p class="caption">Caption</p>
            <p>Second</p>
          </div>
          <a score-type="Video" href="/v">video</a>
        </body></html>
    "#;

    #[test]
    fn test_query_renders_css() {
        let q = Query::tag("p").class("perex").attr("score-type", "Video").unclassed();
        let q = q.build().unwrap();
        assert_eq!(q.css(), "p.perex[score-type=\"Video\"]:not([class])");
    }

    #[test]
    fn test_find_first_and_all() {
        let doc = Document::parse(PAGE);
        let body = doc
            .find_first(&Query::tag("div").id("art-text").build().unwrap())
            .unwrap();
        let paragraphs = body.find_all(&Query::tag("p").unclassed().build().unwrap());
        let texts: Vec<_> = paragraphs.iter().map(Node::text).collect();
        assert_eq!(texts, vec!["First bold paragraph.", "Second"]);
    }

    #[test]
    fn test_missing_element_is_none() {
        let doc = Document::parse(PAGE);
        assert!(doc
            .find_first(&Query::tag("div").class("opener").build().unwrap())
            .is_none());
        assert!(doc
            .find_all(&Query::tag("span").has_attr("datetime").build().unwrap())
            .is_empty());
    }

    #[test]
    fn test_attribute_lookup() {
        let doc = Document::parse(PAGE);
        let video = doc
            .find_first(&Query::tag("a").attr("score-type", "Video").build().unwrap())
            .unwrap();
        assert_eq!(video.attr("href"), Some("/v"));
        assert_eq!(video.attr("title"), None);
        assert!(doc.find_first(&Query::tag("body").build().unwrap()).is_some());
    }

    #[test]
    fn test_invalid_query_is_an_error() {
        assert!(Query::tag("div[").build().is_err());
    }
}
