//! Composition and pagination engine for contract-analysis reports.
//!
//! Takes a variable-shaped [`AnalysisRecord`] and renders a multi-page PDF
//! with fixed header/footer chrome, auto-sized severity cards, and correct
//! "page i of N" numbering via a second stamping pass over the built pages.

pub mod canvas;
pub mod composer;
pub mod debug;
pub mod doc_template;
pub mod error;
pub mod finalize;
pub mod flowable;
pub mod font;
pub mod frame;
pub mod page_template;
pub mod pdf;
pub mod record;
pub mod slug;
pub mod theme;
pub mod types;

pub use canvas::{Canvas, Command, Document};
pub use composer::Composer;
pub use debug::DebugLogger;
pub use doc_template::DocTemplate;
pub use error::ReportError;
pub use finalize::{ChromeFonts, stamp_page_chrome};
pub use flowable::{Flowable, Paragraph, TextAlign, TextStyle};
pub use font::FontRegistry;
pub use frame::{AddResult, Frame};
pub use page_template::{PageContext, PageTemplate};
pub use record::{AnalysisRecord, RiskLevel};
pub use slug::{slugify, suggested_filename};
pub use theme::{LayoutMetrics, SectionCaps, Theme};
pub use types::{Color, Pt, Rect, Size};

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_TITLE: &str = "Contract analysis";

/// Configured renderer, cheap to share across render calls. All inputs are
/// validated at build time so a render either produces a complete document or
/// fails before the first page.
pub struct ReportEngine {
    theme: Theme,
    metrics: LayoutMetrics,
    caps: SectionCaps,
    registry: Arc<FontRegistry>,
    body_font: Arc<str>,
    bold_font: Arc<str>,
    debug: Option<Arc<DebugLogger>>,
}

#[derive(Default)]
pub struct ReportEngineBuilder {
    theme: Option<Theme>,
    metrics: Option<LayoutMetrics>,
    caps: Option<SectionCaps>,
    body_font_file: Option<PathBuf>,
    bold_font_file: Option<PathBuf>,
    body_font_name: Option<String>,
    bold_font_name: Option<String>,
    debug_log_path: Option<PathBuf>,
}

impl ReportEngineBuilder {
    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn layout_metrics(mut self, metrics: LayoutMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn section_caps(mut self, caps: SectionCaps) -> Self {
        self.caps = Some(caps);
        self
    }

    /// TrueType file for body text. Without one, body text renders in the
    /// base-14 Helvetica with approximated metrics.
    pub fn body_font_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.body_font_file = Some(path.into());
        self
    }

    pub fn bold_font_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.bold_font_file = Some(path.into());
        self
    }

    /// Base-14 font name for body text when no file is registered.
    pub fn body_font_name(mut self, name: impl Into<String>) -> Self {
        self.body_font_name = Some(name.into());
        self
    }

    pub fn bold_font_name(mut self, name: impl Into<String>) -> Self {
        self.bold_font_name = Some(name.into());
        self
    }

    pub fn debug_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<ReportEngine, ReportError> {
        let theme = self.theme.unwrap_or_default();
        let metrics = self.metrics.unwrap_or_default();
        let caps = self.caps.unwrap_or_default();

        let frame = metrics.content_frame();
        if frame.width <= Pt::ZERO || frame.height <= Pt::ZERO {
            return Err(ReportError::InvalidConfiguration(format!(
                "margins and chrome bands leave no content area on a {}x{} page",
                frame.width.to_f32(),
                frame.height.to_f32()
            )));
        }

        let mut registry = FontRegistry::new();
        let body_font: Arc<str> = match &self.body_font_file {
            Some(path) => Arc::from(registry.register_file(path)?),
            None => Arc::from(
                self.body_font_name
                    .unwrap_or_else(|| "Helvetica".to_string()),
            ),
        };
        let bold_font: Arc<str> = match &self.bold_font_file {
            Some(path) => Arc::from(registry.register_file(path)?),
            None => Arc::from(
                self.bold_font_name
                    .unwrap_or_else(|| "Helvetica-Bold".to_string()),
            ),
        };

        let debug = match &self.debug_log_path {
            Some(path) => Some(Arc::new(DebugLogger::create(path)?)),
            None => None,
        };

        Ok(ReportEngine {
            theme,
            metrics,
            caps,
            registry: Arc::new(registry),
            body_font,
            bold_font,
            debug,
        })
    }
}

impl ReportEngine {
    pub fn builder() -> ReportEngineBuilder {
        ReportEngineBuilder::default()
    }

    pub fn font_registry(&self) -> &Arc<FontRegistry> {
        &self.registry
    }

    fn chrome_fonts(&self) -> ChromeFonts {
        ChromeFonts {
            title: self.bold_font.to_string(),
            footer: self.body_font.to_string(),
        }
    }

    fn report_title(record: &AnalysisRecord) -> String {
        if let Some(v2) = &record.v2 {
            if !v2.contract_type_short.trim().is_empty() {
                return v2.contract_type_short.trim().to_string();
            }
        }
        if !record.contract_type.trim().is_empty() {
            return record.contract_type.trim().to_string();
        }
        DEFAULT_TITLE.to_string()
    }

    /// Composes, paginates, and stamps chrome. The returned document carries
    /// the final page count in every footer.
    pub fn render_to_document(&self, record: &AnalysisRecord) -> Result<Document, ReportError> {
        if let Some(debug) = &self.debug {
            debug.log("render_start", &[("record_id", record.id.clone())]);
        }
        let composer = Composer::new(
            self.theme,
            self.metrics,
            self.caps,
            Some(self.registry.clone()),
            self.body_font.clone(),
            self.bold_font.clone(),
        )
        .with_debug(self.debug.clone());
        let story = composer.compose(record);

        let title = Self::report_title(record);
        let chrome_fonts = self.chrome_fonts();
        let header = finalize::header_commands(
            &self.theme,
            &self.metrics,
            self.metrics.page_size,
            &title,
            &chrome_fonts,
        );
        let template = PageTemplate::new(self.metrics.page_size, self.metrics.content_frame())
            .with_on_page(Arc::new(move |canvas, _ctx| {
                canvas.append_commands(&header);
            }));

        let mut doc = DocTemplate::new(template, story)
            .with_debug(self.debug.clone())
            .build()?;
        stamp_page_chrome(
            &mut doc,
            &self.theme,
            &self.metrics,
            &title,
            &chrome_fonts,
            Some(&self.registry),
        );

        if let Some(debug) = &self.debug {
            debug.emit_summary();
        }
        Ok(doc)
    }

    pub fn render_to_buffer(&self, record: &AnalysisRecord) -> Result<Vec<u8>, ReportError> {
        let doc = self.render_to_document(record)?;
        pdf::document_to_pdf(&doc, Some(&self.registry))
    }

    pub fn render_to_writer<W: Write>(
        &self,
        record: &AnalysisRecord,
        writer: &mut W,
    ) -> Result<(), ReportError> {
        let doc = self.render_to_document(record)?;
        pdf::write_document(&doc, Some(&self.registry), writer)
    }

    /// Download filename derived from the contract type.
    pub fn suggested_filename(&self, record: &AnalysisRecord) -> String {
        slug::suggested_filename(&Self::report_title(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BBOX_META_KEY;
    use crate::record::{AnalysisV2, CriticalClause, GlossaryEntry, RiskIndex};

    fn engine() -> ReportEngine {
        ReportEngine::builder().build().unwrap()
    }

    fn page_strings(page: &canvas::Page) -> Vec<String> {
        page.commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::DrawString { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn full_record() -> AnalysisRecord {
        AnalysisRecord {
            id: "rec-1".to_string(),
            contract_type: "Residential lease".to_string(),
            risk_level: RiskLevel::High,
            risk_rationale: "Termination rights are one-sided.".to_string(),
            summary: "word ".repeat(400),
            critical_clauses: (0..3)
                .map(|i| CriticalClause {
                    title: format!("Clause {i}"),
                    excerpt: "The landlord may terminate at any time.".to_string(),
                    rationale: "No reciprocal right exists.".to_string(),
                    specific_risk: "Loss of housing on short notice.".to_string(),
                    suggested_rewrite: "Either party may terminate with 60 days notice."
                        .to_string(),
                })
                .collect(),
            glossary: (0..10)
                .map(|i| GlossaryEntry {
                    term: format!("Term {i}"),
                    explanation: "An explanation.".to_string(),
                })
                .collect(),
            final_alerts: vec!["Verify the deposit account details.".to_string()],
            ..AnalysisRecord::default()
        }
    }

    #[test]
    fn invalid_geometry_is_a_configuration_error() {
        let metrics = LayoutMetrics {
            margin: Pt::from_f32(400.0),
            ..LayoutMetrics::default()
        };
        let result = ReportEngine::builder().layout_metrics(metrics).build();
        assert!(matches!(
            result,
            Err(ReportError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn minimal_record_renders_mandatory_sections_only() {
        let doc = engine()
            .render_to_document(&AnalysisRecord::default())
            .unwrap();
        assert!(!doc.pages.is_empty());
        let all: Vec<String> = doc.pages.iter().flat_map(page_strings).collect();
        assert!(all.iter().any(|s| s == "How to read this report"));
        assert!(all.iter().any(|s| s == RiskLevel::Medium.label()));
        assert!(!all.iter().any(|s| s == "Glossary"));
        assert!(!all.iter().any(|s| s == "Clause by clause"));
    }

    #[test]
    fn every_page_has_footer_with_final_total() {
        let doc = engine().render_to_document(&full_record()).unwrap();
        let total = doc.pages.len();
        assert!(total >= 2);
        for (index, page) in doc.pages.iter().enumerate() {
            let strings = page_strings(page);
            assert!(
                strings.contains(&format!("Page {} of {}", index + 1, total)),
                "page {} missing footer",
                index + 1
            );
        }
    }

    #[test]
    fn every_page_has_header_title() {
        let doc = engine().render_to_document(&full_record()).unwrap();
        for page in &doc.pages {
            assert!(page_strings(page).contains(&"Residential lease".to_string()));
        }
    }

    #[test]
    fn placed_content_stays_inside_the_frame() {
        let engine = engine();
        let frame = LayoutMetrics::default().content_frame();
        let bottom = frame.bottom().to_milli_i64();
        let doc = engine.render_to_document(&full_record()).unwrap();
        let mut boxes = 0;
        for page in &doc.pages {
            for cmd in &page.commands {
                if let Command::Meta { key, value } = cmd {
                    if key == BBOX_META_KEY {
                        boxes += 1;
                        let parts: Vec<i64> =
                            value.split(',').map(|v| v.parse().unwrap()).collect();
                        assert!(parts[1] >= frame.y.to_milli_i64());
                        assert!(
                            parts[1] + parts[3] <= bottom,
                            "flowable box {:?} crosses the footer band",
                            parts
                        );
                    }
                }
            }
        }
        assert!(boxes > 0);
    }

    #[test]
    fn degenerate_field_yields_bounded_page_count() {
        let record = AnalysisRecord {
            rebalanced_text: "clause ".repeat(2000),
            ..AnalysisRecord::default()
        };
        let doc = engine().render_to_document(&record).unwrap();
        assert!(doc.pages.len() >= 2);
        assert!(doc.pages.len() <= 10, "got {} pages", doc.pages.len());
    }

    #[test]
    fn degenerate_alert_item_never_paints_below_the_page() {
        let record = AnalysisRecord {
            final_alerts: vec!["alert ".repeat(3000)],
            ..AnalysisRecord::default()
        };
        let doc = engine().render_to_document(&record).unwrap();
        assert!(doc.pages.len() >= 2);
        let page_bottom = doc.page_size.height.to_milli_i64();
        for (index, page) in doc.pages.iter().enumerate() {
            for cmd in &page.commands {
                if let Command::DrawString { y, .. } = cmd {
                    assert!(
                        y.to_milli_i64() < page_bottom,
                        "text at y={} off page {}",
                        y.to_milli_i64(),
                        index + 1
                    );
                }
            }
        }
    }

    #[test]
    fn legacy_record_renders_no_v2_sections() {
        let doc = engine().render_to_document(&full_record()).unwrap();
        let all: Vec<String> = doc.pages.iter().flat_map(page_strings).collect();
        assert!(all.iter().any(|s| s == RiskLevel::High.label()));
        assert!(all.iter().any(|s| s == "Critical clauses"));
        assert!(all.iter().filter(|s| s.starts_with("Clause ")).count() >= 3);
        assert!(!all.iter().any(|s| s == "In plain language"));
        assert!(!all.iter().any(|s| s == "Contract balance"));
    }

    #[test]
    fn section_headings_use_the_accent_color() {
        let record = AnalysisRecord {
            summary: "Short overview.".to_string(),
            ..AnalysisRecord::default()
        };
        let doc = engine().render_to_document(&record).unwrap();
        let accent = Theme::default().accent;
        let has_accent = doc.pages.iter().any(|page| {
            page.commands
                .iter()
                .any(|cmd| matches!(cmd, Command::SetFillColor(c) if *c == accent))
        });
        assert!(has_accent);
    }

    #[test]
    fn analysis_date_is_rendered_when_present() {
        use chrono::TimeZone;
        let record = AnalysisRecord {
            created_at: Some(chrono::Utc.with_ymd_and_hms(2026, 3, 5, 9, 30, 0).unwrap()),
            ..AnalysisRecord::default()
        };
        let doc = engine().render_to_document(&record).unwrap();
        let all: Vec<String> = doc.pages.iter().flat_map(page_strings).collect();
        assert!(all.iter().any(|s| s == "Analyzed on 2026-03-05"));
    }

    #[test]
    fn v2_title_takes_precedence_in_header_and_filename() {
        let record = AnalysisRecord {
            contract_type: "Very long legacy contract type".to_string(),
            v2: Some(AnalysisV2 {
                contract_type_short: "Lease".to_string(),
                overall_risk: Some(RiskIndex {
                    score: 55,
                    level: RiskLevel::Medium,
                    why: "Mixed clauses.".to_string(),
                }),
                ..Default::default()
            }),
            ..AnalysisRecord::default()
        };
        let engine = engine();
        assert_eq!(engine.suggested_filename(&record), "lease.pdf");
        let doc = engine.render_to_document(&record).unwrap();
        assert!(page_strings(&doc.pages[0]).contains(&"Lease".to_string()));
    }

    #[test]
    fn render_to_buffer_emits_pdf_with_all_pages() {
        let engine = engine();
        let doc = engine.render_to_document(&full_record()).unwrap();
        let bytes = engine.render_to_buffer(&full_record()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.7"));
        assert!(text.contains(&format!("/Count {}", doc.pages.len())));
    }
}
