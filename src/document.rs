//! The paginated document built from extracted articles.
//!
//! A [`Document`] is a plain value: a cover page followed by one page per
//! article, each page a list of styled [`TextBlock`]s. Turning it into bytes
//! is the job of a [`crate::outputs::DocumentWriter`].

use crate::error::RenderError;
use crate::models::{ContentOrigin, ExtractedContent};
use crate::sanitize::sanitize;
use chrono::{DateTime, Local};
use tracing::{debug, instrument, warn};

/// Line height in millimetres per point of font size.
pub const LINE_HEIGHT_FACTOR: f32 = 0.6;

const TITLE_SIZE: f32 = 16.0;
const HEADLINE_SIZE: f32 = 14.0;
const META_SIZE: f32 = 10.0;
const BODY_SIZE: f32 = 11.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

/// A run of text set in one font, followed by vertical space in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub font_size: f32,
    pub style: FontStyle,
    pub space_after: f32,
}

impl TextBlock {
    /// Build a block, rejecting characters the base-14 fonts cannot draw.
    pub fn new(
        text: impl Into<String>,
        font_size: f32,
        style: FontStyle,
        space_after: f32,
    ) -> Result<Self, RenderError> {
        let text = text.into();
        check_renderable(&text)?;
        Ok(Self {
            text,
            font_size,
            style,
            space_after,
        })
    }

    pub fn line_height(&self) -> f32 {
        self.font_size * LINE_HEIGHT_FACTOR
    }
}

/// Printable ASCII plus line breaks and tabs.
fn check_renderable(text: &str) -> Result<(), RenderError> {
    match text
        .char_indices()
        .find(|(_, c)| !c.is_ascii() || (c.is_ascii_control() && !matches!(*c, '\n' | '\r' | '\t')))
    {
        Some((offset, ch)) => Err(RenderError::Unrenderable { ch, offset }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageKind {
    Cover,
    Article {
        /// 1-based position of the item among the processed items.
        index: usize,
        title: String,
        link: String,
        /// Source of the body actually rendered on the page.
        origin: ContentOrigin,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub kind: PageKind,
    pub blocks: Vec<TextBlock>,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub generated_at: DateTime<Local>,
    pages: Vec<Page>,
    skipped: usize,
}

impl Document {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Items dropped because their page could not be rendered.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

fn cover_page(title: &str, generated_at: &DateTime<Local>) -> Page {
    let mut blocks = Vec::with_capacity(2);
    let generated = format!("Generated on {}", generated_at.format("%d/%m/%Y at %H:%M"));
    for (text, size, style) in [
        (sanitize(title), TITLE_SIZE, FontStyle::Bold),
        (generated, META_SIZE, FontStyle::Regular),
    ] {
        match TextBlock::new(text, size, style, 10.0) {
            Ok(block) => blocks.push(block),
            Err(e) => warn!(error = %e, "Dropping unrenderable cover line"),
        }
    }
    Page {
        kind: PageKind::Cover,
        blocks,
    }
}

/// Body text for an item and where it came from.
///
/// When the page yielded nothing, a non-empty feed summary wins over the
/// placeholder or error message.
fn resolve_body(content: &ExtractedContent) -> (String, ContentOrigin) {
    if content.origin == ContentOrigin::Unavailable {
        let summary = sanitize(&content.source_item.summary_text());
        let summary = summary.trim();
        if !summary.is_empty() {
            return (summary.to_string(), ContentOrigin::Summary);
        }
    }
    (sanitize(&content.body_text), content.origin)
}

fn article_page(index: usize, content: &ExtractedContent) -> Result<Page, RenderError> {
    let item = &content.source_item;
    let title = sanitize(&item.title);
    let mut blocks = vec![TextBlock::new(
        format!("{index}. {title}"),
        HEADLINE_SIZE,
        FontStyle::Bold,
        5.0,
    )?];

    if let Some(date) = item
        .published_at
        .as_deref()
        .map(sanitize)
        .filter(|d| !d.trim().is_empty())
    {
        blocks.push(TextBlock::new(
            format!("Published on {date}"),
            META_SIZE,
            FontStyle::Italic,
            5.0,
        )?);
    }

    let (body, origin) = resolve_body(content);
    blocks.push(TextBlock::new(body, BODY_SIZE, FontStyle::Regular, 0.0)?);

    Ok(Page {
        kind: PageKind::Article {
            index,
            title,
            link: item.link.clone(),
            origin,
        },
        blocks,
    })
}

/// Lay out the cover and one page per item, in input order.
///
/// An item whose page cannot be rendered is skipped with a warning; the rest
/// of the document is unaffected.
#[instrument(level = "info", skip_all, fields(items = items.len()))]
pub fn assemble(title: &str, generated_at: DateTime<Local>, items: Vec<ExtractedContent>) -> Document {
    let mut pages = Vec::with_capacity(items.len() + 1);
    pages.push(cover_page(title, &generated_at));
    let mut skipped = 0;

    for (i, content) in items.iter().enumerate() {
        let index = i + 1;
        match article_page(index, content) {
            Ok(page) => {
                debug!(index, "Rendered article page");
                pages.push(page);
            }
            Err(e) => {
                warn!(index, link = %content.source_item.link, error = %e, "Skipping article that could not be rendered");
                skipped += 1;
            }
        }
    }

    Document {
        title: sanitize(title),
        generated_at,
        pages,
        skipped,
    }
}
