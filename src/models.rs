//! Data models flowing through the pipeline.
//!
//! - [`FeedItem`]: one entry of the RSS feed, as parsed
//! - [`ExtractedContent`]: a feed item paired with the text recovered for it
//! - [`ContentOrigin`]: which fallback tier produced that text

use scraper::{Html, Node};
use serde::{Deserialize, Serialize};

/// A single news item from the feed.
///
/// Fields are kept exactly as the feed provides them; `published_at` is
/// free-form and never reparsed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedItem {
    /// The item headline.
    pub title: String,
    /// Publication date in the feed's own format, if the item has one.
    pub published_at: Option<String>,
    /// Link to the full article page.
    pub link: String,
    /// Short summary; may contain HTML markup.
    pub summary: String,
}

impl FeedItem {
    /// The summary with markup stripped and whitespace collapsed.
    ///
    /// Feeds commonly embed `<p>`, `<img>` or entity-encoded HTML in the
    /// description; only the readable text is kept. Inline markup joins its
    /// text to the neighbours, block elements are separated by a space.
    pub fn summary_text(&self) -> String {
        if !self.summary.contains('<') {
            return collapse_whitespace(&self.summary);
        }
        let fragment = Html::parse_fragment(&self.summary);
        let mut text = String::new();
        for node in fragment.root_element().descendants() {
            match node.value() {
                Node::Text(t) => text.push_str(t),
                Node::Element(e) if BLOCK_ELEMENTS.contains(&e.name()) => text.push(' '),
                _ => {}
            }
        }
        collapse_whitespace(&text)
    }
}

const BLOCK_ELEMENTS: [&str; 6] = ["p", "br", "div", "li", "h2", "h3"];

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Which source produced the body text of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentOrigin {
    /// Recovered from the article page by one of the extraction strategies.
    FullArticle,
    /// The feed summary, used because the page yielded nothing.
    Summary,
    /// Neither page nor summary; the body is a placeholder or error message.
    Unavailable,
}

/// A feed item together with the text chosen for its page.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub source_item: FeedItem,
    pub body_text: String,
    pub origin: ContentOrigin,
}
