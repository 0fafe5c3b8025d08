//! RTBF article layout.
//!
//! RTBF pages put the lead ("chapô") in `div.article__chapo` and the story in
//! `div.article__body`, interleaved with social embeds and ad slots that
//! carry the text of their widget. Both regions are looked up independently.

use super::{ExtractionStrategy, TEXT_BLOCKS, element_text};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static CHAPO: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.article__chapo").expect("static selector"));
static BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.article__body").expect("static selector"));

/// Class fragments marking embeds that are not part of the story.
const EXCLUDED_CLASSES: [&str; 2] = ["social-media", "advertisement"];

fn is_excluded(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|class| EXCLUDED_CLASSES.iter().any(|x| class.contains(x)))
}

/// Tier A: lead plus filtered body paragraphs and sub-headings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChapoAndBody;

impl ExtractionStrategy for ChapoAndBody {
    fn name(&self) -> &'static str {
        "site-specific"
    }

    fn extract(&self, page: &Html) -> Vec<String> {
        let mut fragments = Vec::new();
        if let Some(chapo) = page.select(&CHAPO).next() {
            fragments.push(element_text(chapo));
        }
        if let Some(body) = page.select(&BODY).next() {
            fragments.extend(
                body.select(&TEXT_BLOCKS)
                    .filter(|el| !is_excluded(el))
                    .map(element_text),
            );
        }
        fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Vec<String> {
        ChapoAndBody.extract(&Html::parse_document(html))
    }

    #[test]
    fn test_chapo_then_body_in_order() {
        let fragments = run(r#"
            <div class="article__chapo"><p>Intro</p></div>
            <div class="article__body">
              <h3>Contexte</h3>
              <p>Un.</p>
              <h2>Suite</h2>
              <p>Deux.</p>
            </div>"#);
        assert_eq!(fragments, vec!["Intro", "Contexte", "Un.", "Suite", "Deux."]);
    }

    #[test]
    fn test_excludes_embeds_and_ads() {
        let fragments = run(r#"
            <div class="article__body">
              <p>Garde.</p>
              <p class="embed social-media--twitter">Tweet</p>
              <p class="advertisement">Pub</p>
              <h2 class="block-advertisement-title">Sponsor</h2>
              <p class="lead">Garde aussi.</p>
            </div>"#);
        assert_eq!(fragments, vec!["Garde.", "Garde aussi."]);
    }

    #[test]
    fn test_body_without_chapo() {
        let fragments = run(r#"<div class="article__body"><p>Seul.</p></div>"#);
        assert_eq!(fragments, vec!["Seul."]);
    }

    #[test]
    fn test_chapo_without_body() {
        let fragments = run(r#"<div class="article__chapo">Chapô seul</div><p>ailleurs</p>"#);
        assert_eq!(fragments, vec!["Chapô seul"]);
    }

    #[test]
    fn test_other_layouts_yield_nothing() {
        assert!(run("<article><p>Autre site</p></article>").is_empty());
    }
}
