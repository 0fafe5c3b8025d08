//! Text normalization for the PDF base-14 fonts.
//!
//! The built-in Helvetica faces only cover a Latin-1 style code page, so all
//! text is downgraded to 7-bit ASCII before layout. Accented letters lose
//! their marks (`é` -> `e`), typographic quotes become plain ones, and
//! anything without an ASCII decomposition is dropped.

use unicode_normalization::UnicodeNormalization;

/// Map typographic quotation marks to their ASCII counterparts.
///
/// NFKD leaves these untouched, so they must be replaced before the
/// non-ASCII filter or they would simply vanish.
fn plain_quote(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{00AB}'
        | '\u{00BB}' => '"',
        other => other,
    }
}

/// Normalize `text` into the renderable ASCII subset.
///
/// Idempotent: the output is pure ASCII, which NFKD and the quote map both
/// leave unchanged.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(sanitize("café"), "cafe");
/// assert_eq!(sanitize("l\u{2019}école"), "l'ecole");
/// ```
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(plain_quote)
        .nfkd()
        .filter(char::is_ascii)
        .collect()
}
