use crate::canvas::{Command, Document};
use crate::font::{FontRegistry, fallback_width};
use crate::theme::{LayoutMetrics, Theme};
use crate::types::{Pt, Size};

const FOOTER_DISCLAIMER: &str = "Automated analysis. Not legal advice.";

/// Chrome fonts are fixed; body fonts are the composer's concern.
#[derive(Clone)]
pub struct ChromeFonts {
    pub title: String,
    pub footer: String,
}

impl Default for ChromeFonts {
    fn default() -> Self {
        Self {
            title: "Helvetica-Bold".to_string(),
            footer: "Helvetica".to_string(),
        }
    }
}

/// The exact header command sequence, shared by the page-open callback and
/// the post-build stamping pass so both passes paint byte-identical chrome.
pub fn header_commands(
    theme: &Theme,
    metrics: &LayoutMetrics,
    page_size: Size,
    title: &str,
    fonts: &ChromeFonts,
) -> Vec<Command> {
    let title_size = metrics.h1_size;
    let band = metrics.header_band;
    vec![
        Command::SetFillColor(theme.header_band),
        Command::DrawRect {
            x: Pt::ZERO,
            y: Pt::ZERO,
            width: page_size.width,
            height: band,
        },
        Command::Fill,
        Command::SetFillColor(theme.header_text),
        Command::SetFontName(fonts.title.clone()),
        Command::SetFontSize(title_size),
        Command::DrawString {
            x: metrics.margin,
            y: (band - title_size) / 2,
            text: title.to_string(),
        },
        Command::SetFillColor(theme.rule),
        Command::DrawRect {
            x: Pt::ZERO,
            y: band,
            width: page_size.width,
            height: Pt::from_f32(0.75),
        },
        Command::Fill,
    ]
}

fn footer_commands(
    theme: &Theme,
    metrics: &LayoutMetrics,
    page_size: Size,
    page_number: usize,
    total_pages: usize,
    fonts: &ChromeFonts,
    registry: Option<&FontRegistry>,
) -> Vec<Command> {
    let size = metrics.small_size;
    let band_top = page_size.height - metrics.footer_band;
    let text_y = band_top + (metrics.footer_band - size) / 2;
    let label = format!("Page {} of {}", page_number, total_pages);
    let label_width = match registry {
        Some(registry) => registry.measure_text_width(&fonts.footer, size, &label),
        None => fallback_width(size, &label),
    };
    vec![
        Command::SetFillColor(theme.rule),
        Command::DrawRect {
            x: metrics.margin,
            y: band_top,
            width: (page_size.width - metrics.margin * 2).max(Pt::ZERO),
            height: Pt::from_f32(0.5),
        },
        Command::Fill,
        Command::SetFillColor(theme.muted),
        Command::SetFontName(fonts.footer.clone()),
        Command::SetFontSize(size),
        Command::DrawString {
            x: metrics.margin,
            y: text_y,
            text: FOOTER_DISCLAIMER.to_string(),
        },
        Command::DrawString {
            x: (page_size.width - metrics.margin - label_width).max(Pt::ZERO),
            y: text_y,
            text: label,
        },
    ]
}

/// Second pass: with the final page count known, stamps the footer (and the
/// header again, append-only and identical to the first pass) onto every page
/// of the built document.
pub fn stamp_page_chrome(
    doc: &mut Document,
    theme: &Theme,
    metrics: &LayoutMetrics,
    title: &str,
    fonts: &ChromeFonts,
    registry: Option<&FontRegistry>,
) {
    let total_pages = doc.pages.len();
    let page_size = doc.page_size;
    let header = header_commands(theme, metrics, page_size, title, fonts);
    for (index, page) in doc.pages.iter_mut().enumerate() {
        page.commands.extend(header.iter().cloned());
        page.commands.extend(footer_commands(
            theme,
            metrics,
            page_size,
            index + 1,
            total_pages,
            fonts,
            registry,
        ));
    }
}
