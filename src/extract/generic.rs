//! Site-agnostic fallbacks used when the RTBF layout is not found.

use super::{ExtractionStrategy, TEXT_BLOCKS, element_text};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

/// Candidate content containers, most semantic first.
static CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        r#"[itemprop="articleBody"]"#,
        ".article-body",
        "main",
        "div.article",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("static selector"))
    .collect()
});

static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Paragraphs at or below this many characters are treated as navigation,
/// captions or bylines.
pub const MIN_PARAGRAPH_CHARS: usize = 50;

/// Tier B: paragraphs and sub-headings of the first content container
/// present on the page, unfiltered.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentContainer;

impl ExtractionStrategy for ContentContainer {
    fn name(&self) -> &'static str {
        "content-container"
    }

    fn extract(&self, page: &Html) -> Vec<String> {
        let Some(container) = CONTAINERS
            .iter()
            .find_map(|selector| page.select(selector).next())
        else {
            return Vec::new();
        };
        container.select(&TEXT_BLOCKS).map(element_text).collect()
    }
}

/// Tier C: every long-enough paragraph on the page.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongParagraphs;

impl ExtractionStrategy for LongParagraphs {
    fn name(&self) -> &'static str {
        "long-paragraphs"
    }

    fn extract(&self, page: &Html) -> Vec<String> {
        page.select(&PARAGRAPHS)
            .map(element_text)
            .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: &str = "Ce paragraphe est suffisamment long pour passer le filtre de longueur.";

    #[test]
    fn test_container_prefers_article() {
        let page = Html::parse_document(
            r#"<main><p>Dans main</p><article><p>Dans article</p><h3>Titre</h3></article></main>"#,
        );
        assert_eq!(ContentContainer.extract(&page), vec!["Dans article", "Titre"]);
    }

    #[test]
    fn test_container_falls_back_to_main() {
        let page = Html::parse_document(r#"<div class="nav"><p>Menu</p></div><main><p>Texte</p></main>"#);
        assert_eq!(ContentContainer.extract(&page), vec!["Texte"]);
    }

    #[test]
    fn test_container_keeps_short_paragraphs() {
        let page = Html::parse_document(r#"<div itemprop="articleBody"><p>Court.</p></div>"#);
        assert_eq!(ContentContainer.extract(&page), vec!["Court."]);
    }

    #[test]
    fn test_container_article_body_class() {
        let page = Html::parse_document(
            r#"<div class="sidebar"><p>A lire aussi</p></div><div class="article-body"><p>Corps</p><h2>Suite</h2></div>"#,
        );
        assert_eq!(ContentContainer.extract(&page), vec!["Corps", "Suite"]);
    }

    #[test]
    fn test_container_div_article() {
        let page = Html::parse_document(r#"<div class="nav"><p>Menu</p></div><div class="article"><p>Texte final</p></div>"#);
        assert_eq!(ContentContainer.extract(&page), vec!["Texte final"]);
    }

    #[test]
    fn test_no_container() {
        let page = Html::parse_document("<div><p>rien</p></div>");
        assert!(ContentContainer.extract(&page).is_empty());
    }

    #[test]
    fn test_long_paragraphs_filter() {
        let html = format!("<div><p>Accueil</p><p>{LONG}</p><p>Photo: Belga</p><p>  {LONG}  </p></div>");
        let page = Html::parse_document(&html);
        assert_eq!(LongParagraphs.extract(&page), vec![LONG.to_string(), LONG.to_string()]);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let exactly = "x".repeat(MIN_PARAGRAPH_CHARS);
        let above = "y".repeat(MIN_PARAGRAPH_CHARS + 1);
        let page = Html::parse_document(&format!("<p>{exactly}</p><p>{above}</p>"));
        assert_eq!(LongParagraphs.extract(&page), vec![above]);
    }
}
