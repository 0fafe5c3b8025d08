//! RSS feed retrieval and parsing.
//!
//! Every `<item>` element is collected regardless of where it sits in the
//! document, in document order. Only its direct `title`, `link`, `pubDate`
//! and `description` children are read; anything else is ignored.

use crate::error::FeedError;
use crate::http::Fetch;
use crate::models::FeedItem;
use quick_xml::Reader;
use quick_xml::escape::{escape, resolve_html5_entity, resolve_predefined_entity, unescape_with};
use quick_xml::events::Event;
use tracing::{info, instrument, warn};

/// Fetch the feed at `url` and parse its items.
///
/// # Errors
///
/// [`FeedError::Unavailable`] when the transport fails and
/// [`FeedError::Malformed`] when the body is not well-formed XML. A valid
/// feed with no items is `Ok` with an empty vector.
#[instrument(level = "info", skip(fetcher))]
pub fn fetch_feed<F: Fetch>(fetcher: &F, url: &str) -> Result<Vec<FeedItem>, FeedError> {
    let body = fetcher.fetch(url)?;
    let items = parse_feed(&body)?;
    info!(count = items.len(), "Parsed feed items");
    Ok(items)
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Title,
    Link,
    PubDate,
    Description,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"pubDate" => Some(Field::PubDate),
            b"description" => Some(Field::Description),
            _ => None,
        }
    }
}

/// Parser state while inside an `<item>`.
struct OpenItem {
    depth: usize,
    item: FeedItem,
    field: Option<(Field, usize)>,
    /// Escaped text of the current field; unescaped once the field closes.
    buffer: String,
}

impl OpenItem {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            item: FeedItem::default(),
            field: None,
            buffer: String::new(),
        }
    }

    fn close_field(&mut self) -> Result<(), FeedError> {
        let Some((field, _)) = self.field.take() else {
            return Ok(());
        };
        let raw = std::mem::take(&mut self.buffer);
        let text = unescape_with(&raw, resolve_entity)
            .map_err(|e| FeedError::Malformed(format!("{e} in {field:?}")))?
            .trim()
            .to_string();
        match field {
            Field::Title => self.item.title = text,
            Field::Link => self.item.link = text,
            Field::PubDate => self.item.published_at = Some(text).filter(|d| !d.is_empty()),
            Field::Description => self.item.summary = text,
        }
        Ok(())
    }
}

/// XML's five entities, then the HTML5 named set (`&eacute;`, `&nbsp;`)
/// that news feeds routinely leave in their text.
fn resolve_entity(name: &str) -> Option<&'static str> {
    resolve_predefined_entity(name).or_else(|| resolve_html5_entity(name))
}

/// Parse an RSS document into items.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>, FeedError> {
    let mut reader = Reader::from_str(xml);
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut open: Option<OpenItem> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            FeedError::Malformed(format!("{e} at byte {}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(e) => {
                depth += 1;
                match open.as_mut() {
                    None if e.name().as_ref() == b"item" => open = Some(OpenItem::new(depth)),
                    Some(current) if depth == current.depth + 1 => {
                        current.field = Field::from_name(e.name().as_ref()).map(|f| (f, depth));
                        current.buffer.clear();
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                if let Some(current) = open.as_mut() {
                    if matches!(current.field, Some((_, d)) if d == depth) {
                        current.close_field()?;
                    }
                    if current.depth == depth {
                        if let Some(done) = open.take() {
                            items.push(done.item);
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Empty(e) => {
                if open.is_none() && e.name().as_ref() == b"item" {
                    items.push(FeedItem::default());
                }
            }
            Event::Text(t) => {
                if let Some(current) = open.as_mut().filter(|o| o.field.is_some()) {
                    current.buffer.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(current) = open.as_mut().filter(|o| o.field.is_some()) {
                    current.buffer.push('&');
                    current.buffer.push_str(&String::from_utf8_lossy(&r));
                    current.buffer.push(';');
                }
            }
            Event::CData(c) => {
                if let Some(current) = open.as_mut().filter(|o| o.field.is_some()) {
                    let text = String::from_utf8_lossy(&c);
                    current.buffer.push_str(&escape(&*text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if open.is_some() || depth != 0 {
        warn!(depth, "Feed document ended with unclosed elements");
        return Err(FeedError::Malformed("unexpected end of document".to_string()));
    }
    Ok(items)
}
