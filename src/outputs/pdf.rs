//! PDF output on A4 sheets with the built-in Helvetica faces.
//!
//! Layout is a simple top-to-bottom flow: every logical page of the
//! [`Document`] starts on a fresh sheet, blocks are word-wrapped to the text
//! width, and a page that runs past the bottom margin continues on extra
//! sheets. Glyph widths are approximated from Helvetica metrics, which is
//! close enough to keep lines inside the margins.

use super::DocumentWriter;
use crate::document::{Document, FontStyle};
use crate::error::WriteError;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 10.0;
pub const BOTTOM_MARGIN_MM: f32 = 20.0;

const PT_TO_MM: f32 = 0.352_778;

/// Approximate advance width of `c` in ems.
fn char_width_em(c: char, style: FontStyle) -> f32 {
    let width = match c {
        'i' | 'j' | 'l' | '\'' | '|' => 0.222,
        ' ' | '.' | ',' | ':' | ';' | '!' | 'f' | 't' | 'I' | '[' | ']' | '/' => 0.278,
        '(' | ')' | '-' | 'r' | '"' => 0.333,
        'm' | 'M' => 0.833,
        'W' => 0.944,
        'w' => 0.722,
        'A'..='Z' => 0.667,
        _ => 0.556,
    };
    match style {
        FontStyle::Bold => width * 1.06,
        FontStyle::Regular | FontStyle::Italic => width,
    }
}

/// Rendered width of `text` in millimetres.
pub fn text_width_mm(text: &str, font_size: f32, style: FontStyle) -> f32 {
    text.chars().map(|c| char_width_em(c, style)).sum::<f32>() * font_size * PT_TO_MM
}

/// Word-wrap `text` to `max_width` millimetres.
///
/// Explicit line breaks are kept and blank lines come back as empty strings.
/// Words wider than a full line are split between characters.
pub fn wrap_text(text: &str, font_size: f32, style: FontStyle, max_width: f32) -> Vec<String> {
    let fits = |s: &str| text_width_mm(s, font_size, style) <= max_width;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for c in word.chars() {
                current.push(c);
                if !fits(&current) && current.chars().count() > 1 {
                    if let Some(last) = current.pop() {
                        lines.push(std::mem::replace(&mut current, last.to_string()));
                    }
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// A line of text at a fixed position, measured from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub font_size: f32,
    pub style: FontStyle,
    pub x: f32,
    pub baseline: f32,
}

/// One physical page.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub lines: Vec<PlacedLine>,
}

/// Flow every page of `document` onto sheets.
pub fn layout(document: &Document) -> Vec<Sheet> {
    let max_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let bottom = PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM;
    let mut sheets = Vec::with_capacity(document.page_count());

    for page in document.pages() {
        let mut sheet = Sheet::default();
        let mut cursor = MARGIN_MM;
        for block in &page.blocks {
            let line_height = block.line_height();
            for line in wrap_text(&block.text, block.font_size, block.style, max_width) {
                if cursor + line_height > bottom && cursor > MARGIN_MM {
                    sheets.push(std::mem::take(&mut sheet));
                    cursor = MARGIN_MM;
                }
                if !line.is_empty() {
                    sheet.lines.push(PlacedLine {
                        text: line,
                        font_size: block.font_size,
                        style: block.style,
                        x: MARGIN_MM,
                        baseline: cursor + line_height * 0.75,
                    });
                }
                cursor += line_height;
            }
            cursor += block.space_after;
        }
        sheets.push(sheet);
    }
    sheets
}

fn pdf_error<E: std::fmt::Debug>(e: E) -> WriteError {
    WriteError::Pdf(format!("{e:?}"))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn load(pdf: &PdfDocumentReference) -> Result<Self, WriteError> {
        Ok(Self {
            regular: pdf.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
            bold: pdf.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
            italic: pdf.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(pdf_error)?,
        })
    }

    fn for_style(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

/// Save through a `.part` file renamed into place, so `path` only ever holds
/// a complete document.
fn save_atomically(pdf: PdfDocumentReference, path: &Path) -> Result<(), WriteError> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = Path::new(&partial);

    let result = File::create(partial)
        .map_err(WriteError::from)
        .and_then(|file| {
            let mut out = BufWriter::new(file);
            pdf.save(&mut out).map_err(pdf_error)?;
            out.flush()?;
            Ok(())
        })
        .and_then(|()| fs::rename(partial, path).map_err(WriteError::from));

    if result.is_err() && partial.exists() {
        if let Err(e) = fs::remove_file(partial) {
            warn!(path = %partial.display(), error = %e, "Could not remove partial file");
        }
    }
    result
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfWriter;

impl DocumentWriter for PdfWriter {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    fn write(&self, document: &Document, path: &Path) -> Result<(), WriteError> {
        let sheets = layout(document);
        debug!(pages = document.page_count(), sheets = sheets.len(), "Laid out document");

        let (pdf, first_page, first_layer) = PdfDocument::new(
            document.title.clone(),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );
        let fonts = Fonts::load(&pdf)?;

        let mut targets = vec![(first_page, first_layer)];
        for n in 1..sheets.len() {
            targets.push(pdf.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                format!("Layer {}", n + 1),
            ));
        }

        for (sheet, (page, layer)) in sheets.iter().zip(targets) {
            let canvas = pdf.get_page(page).get_layer(layer);
            for line in &sheet.lines {
                canvas.use_text(
                    line.text.clone(),
                    line.font_size,
                    Mm(line.x),
                    Mm(PAGE_HEIGHT_MM - line.baseline),
                    fonts.for_style(line.style),
                );
            }
        }

        save_atomically(pdf, path)?;
        info!(sheets = sheets.len(), "Wrote PDF");
        Ok(())
    }
}
