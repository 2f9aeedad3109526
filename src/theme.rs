use crate::types::{Color, Pt, Rect, Size};

/// Color tokens for report chrome and cards.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub ink: Color,
    pub muted: Color,
    pub accent: Color,
    pub header_band: Color,
    pub header_text: Color,
    pub rule: Color,
    pub card_bg: Color,
    pub card_stroke: Color,
    pub danger_bg: Color,
    pub danger_stroke: Color,
    pub warn_bg: Color,
    pub warn_stroke: Color,
    pub ok_bg: Color,
    pub ok_stroke: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            ink: Color::from_hex(0x1F2430),
            muted: Color::from_hex(0x6B7280),
            accent: Color::from_hex(0x2557A7),
            header_band: Color::from_hex(0x1F2430),
            header_text: Color::WHITE,
            rule: Color::from_hex(0xD9DDE3),
            card_bg: Color::from_hex(0xF4F6F8),
            card_stroke: Color::from_hex(0xD9DDE3),
            danger_bg: Color::from_hex(0xFBEAEA),
            danger_stroke: Color::from_hex(0xC0392B),
            warn_bg: Color::from_hex(0xFdf3e0),
            warn_stroke: Color::from_hex(0xC77F0A),
            ok_bg: Color::from_hex(0xE9F6EC),
            ok_stroke: Color::from_hex(0x2E8B57),
        }
    }
}

impl Theme {
    /// Card background and stroke for a severity bucket.
    pub fn severity_colors(&self, severity: Severity) -> (Color, Color) {
        match severity {
            Severity::Ok => (self.ok_bg, self.ok_stroke),
            Severity::Warn => (self.warn_bg, self.warn_stroke),
            Severity::Danger => (self.danger_bg, self.danger_stroke),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Warn,
    Danger,
}

/// Fixed page geometry. The content frame is identical on every page; header
/// and footer bands are reserved outside it and painted by the chrome pass.
#[derive(Debug, Clone, Copy)]
pub struct LayoutMetrics {
    pub page_size: Size,
    pub margin: Pt,
    pub header_band: Pt,
    pub footer_band: Pt,
    pub band_gap: Pt,
    pub card_padding: Pt,
    pub card_radius: Pt,
    pub card_gap: Pt,
    pub min_card_height: Pt,
    pub body_size: Pt,
    pub h1_size: Pt,
    pub h2_size: Pt,
    pub small_size: Pt,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            page_size: Size::a4(),
            margin: Pt::from_f32(48.0),
            header_band: Pt::from_f32(56.0),
            footer_band: Pt::from_f32(40.0),
            band_gap: Pt::from_f32(18.0),
            card_padding: Pt::from_f32(10.0),
            card_radius: Pt::from_f32(6.0),
            card_gap: Pt::from_f32(10.0),
            min_card_height: Pt::from_f32(40.0),
            body_size: Pt::from_f32(10.0),
            h1_size: Pt::from_f32(16.0),
            h2_size: Pt::from_f32(12.5),
            small_size: Pt::from_f32(8.0),
        }
    }
}

impl LayoutMetrics {
    pub fn content_frame(&self) -> Rect {
        let top = self.header_band + self.band_gap;
        let bottom_reserved = self.footer_band + self.band_gap;
        Rect {
            x: self.margin,
            y: top,
            width: (self.page_size.width - self.margin * 2).max(Pt::ZERO),
            height: (self.page_size.height - top - bottom_reserved).max(Pt::ZERO),
        }
    }
}

/// Hard per-section item caps. Records are produced by a model pipeline and
/// occasionally degenerate; caps bound worst-case page counts.
#[derive(Debug, Clone, Copy)]
pub struct SectionCaps {
    pub critical_clauses: usize,
    pub unfair_clauses: usize,
    pub glossary: usize,
    pub checklist: usize,
    pub enriched_clauses: usize,
}

impl Default for SectionCaps {
    fn default() -> Self {
        Self {
            critical_clauses: 60,
            unfair_clauses: 60,
            glossary: 80,
            checklist: 120,
            enriched_clauses: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_frame_reserves_chrome_bands() {
        let metrics = LayoutMetrics::default();
        let frame = metrics.content_frame();
        assert_eq!(frame.y, Pt::from_f32(74.0));
        assert_eq!(
            frame.bottom(),
            metrics.page_size.height - Pt::from_f32(58.0)
        );
        assert_eq!(frame.x, Pt::from_f32(48.0));
    }
}
