use crate::debug::DebugLogger;
use crate::flowable::{
    BalanceBar, BulletList, Card, Divider, Flowable, Paragraph, Spacer, TextStyle,
};
use crate::font::FontRegistry;
use crate::record::{
    AnalysisRecord, ChecklistItem, CriticalClause, EnrichedClause, GlossaryEntry, RiskLevel,
    TrafficLight, UnfairClause,
};
use crate::theme::{LayoutMetrics, SectionCaps, Severity, Theme};
use crate::types::{Color, Pt};
use std::sync::Arc;

const READING_GUIDE: &str = "This report summarizes an automated analysis of your contract. \
Red and amber cards flag clauses that deserve attention; green means no issue was found. \
It is an aid to reading the contract, not legal advice.";

fn severity_for_risk(level: RiskLevel) -> Severity {
    match level {
        RiskLevel::Low => Severity::Ok,
        RiskLevel::Medium => Severity::Warn,
        RiskLevel::High => Severity::Danger,
    }
}

fn severity_for_light(light: TrafficLight) -> Severity {
    match light {
        TrafficLight::Green => Severity::Ok,
        TrafficLight::Yellow => Severity::Warn,
        TrafficLight::Red => Severity::Danger,
    }
}

fn present(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Turns an analysis record into the flat story the page builder consumes.
/// Section order is fixed; each section is emitted only when its source field
/// is present, so a sparse record degrades to a short report rather than a
/// page of empty headings.
pub struct Composer {
    theme: Theme,
    metrics: LayoutMetrics,
    caps: SectionCaps,
    registry: Option<Arc<FontRegistry>>,
    body_font: Arc<str>,
    bold_font: Arc<str>,
    debug: Option<Arc<DebugLogger>>,
}

impl Composer {
    pub fn new(
        theme: Theme,
        metrics: LayoutMetrics,
        caps: SectionCaps,
        registry: Option<Arc<FontRegistry>>,
        body_font: Arc<str>,
        bold_font: Arc<str>,
    ) -> Self {
        Self {
            theme,
            metrics,
            caps,
            registry,
            body_font,
            bold_font,
            debug: None,
        }
    }

    pub fn with_debug(mut self, debug: Option<Arc<DebugLogger>>) -> Self {
        self.debug = debug;
        self
    }

    pub fn compose(&self, record: &AnalysisRecord) -> Vec<Box<dyn Flowable>> {
        let mut story: Vec<Box<dyn Flowable>> = Vec::new();

        self.push_reading_guide(&mut story);
        self.push_overview(&mut story, record);
        if let Some(v2) = &record.v2 {
            self.push_v2(&mut story, v2);
        }
        self.push_critical_clauses(&mut story, &record.critical_clauses);
        self.push_unfair_clauses(&mut story, &record.unfair_clauses);
        self.push_rebalanced_text(&mut story, &record.rebalanced_text);
        self.push_pros_cons(&mut story, &record.pros, &record.cons);
        self.push_glossary(&mut story, &record.glossary);
        self.push_final_alerts(&mut story, &record.final_alerts);

        story
    }

    fn push_reading_guide(&self, story: &mut Vec<Box<dyn Flowable>>) {
        let guide = self.neutral_card(vec![
            Box::new(self.bold_paragraph("How to read this report", self.metrics.h2_size)),
            Box::new(self.body_paragraph(READING_GUIDE)),
        ]);
        story.extend(guide);
    }

    fn push_overview(&self, story: &mut Vec<Box<dyn Flowable>>, record: &AnalysisRecord) {
        if present(&record.contract_type) {
            story.push(Box::new(self.heading(&format!(
                "Contract type: {}",
                record.contract_type.trim()
            ))));
            story.push(Box::new(Spacer::new_pt(self.metrics.card_gap)));
        }

        if let Some(created_at) = record.created_at {
            story.push(Box::new(self.muted_paragraph(&format!(
                "Analyzed on {}",
                created_at.format("%Y-%m-%d")
            ))));
            story.push(Box::new(Spacer::new_pt(self.metrics.card_gap / 2)));
        }

        let severity = severity_for_risk(record.risk_level);
        let mut badge: Vec<Box<dyn Flowable>> = vec![Box::new(
            self.bold_paragraph(record.risk_level.label(), self.metrics.h2_size),
        )];
        if present(&record.risk_rationale) {
            badge.push(Box::new(self.body_paragraph(record.risk_rationale.trim())));
        }
        story.extend(self.card(badge, severity));

        if present(&record.summary) {
            story.push(Box::new(self.heading("Summary")));
            story.push(Box::new(self.body_paragraph(record.summary.trim())));
            story.push(Box::new(Spacer::new_pt(self.metrics.card_gap)));
        }
    }

    fn push_v2(&self, story: &mut Vec<Box<dyn Flowable>>, v2: &crate::record::AnalysisV2) {
        if present(&v2.contract_type_short) {
            story.push(Box::new(
                self.muted_paragraph(v2.contract_type_short.trim()),
            ));
            story.push(Box::new(Spacer::new_pt(self.metrics.card_gap)));
        }

        if let Some(risk) = &v2.overall_risk {
            let severity = severity_for_risk(risk.level);
            let mut content: Vec<Box<dyn Flowable>> = vec![Box::new(self.bold_paragraph(
                &format!("Risk index: {}/100", risk.score.min(100)),
                self.metrics.h2_size,
            ))];
            if present(&risk.why) {
                content.push(Box::new(self.body_paragraph(risk.why.trim())));
            }
            story.extend(self.card(content, severity));
        }

        if present(&v2.plain_summary) {
            story.extend(self.neutral_card(vec![
                Box::new(self.bold_paragraph("In plain language", self.metrics.h2_size)),
                Box::new(self.body_paragraph(v2.plain_summary.trim())),
            ]));
        }

        if let Some(balance) = &v2.balance {
            story.push(Box::new(self.heading("Contract balance")));
            story.push(Box::new(self.muted_paragraph(&format!(
                "You {}% / Counterparty {}%",
                balance.user, balance.counterparty
            ))));
            story.push(Box::new(BalanceBar::new(
                balance.user,
                balance.counterparty,
                self.theme.ok_stroke,
                self.theme.danger_stroke,
                self.theme.rule,
            )));
            story.push(Box::new(Spacer::new_pt(self.metrics.card_gap)));
        }

        self.push_checklist(story, &v2.checklist);
        self.push_top_risks(story, &v2.top_risk_clauses);
        self.push_enriched_clauses(story, &v2.clauses);
    }

    fn push_checklist(&self, story: &mut Vec<Box<dyn Flowable>>, checklist: &[ChecklistItem]) {
        let items: Vec<Paragraph> = checklist
            .iter()
            .filter(|item| present(&item.text))
            .take(self.caps.checklist)
            .map(|item| {
                self.body_paragraph(&format!("{} {}", item.kind.prefix(), item.text.trim()))
            })
            .collect();
        if items.is_empty() {
            return;
        }
        self.log_capped("checklist", checklist.len(), items.len());
        story.push(Box::new(self.heading("Checklist")));
        story.push(Box::new(BulletList::new(items)));
        story.push(Box::new(Spacer::new_pt(self.metrics.card_gap)));
    }

    fn push_top_risks(
        &self,
        story: &mut Vec<Box<dyn Flowable>>,
        clauses: &[crate::record::TopRiskClause],
    ) {
        let usable: Vec<_> = clauses.iter().filter(|c| present(&c.title)).collect();
        if usable.is_empty() {
            return;
        }
        story.push(Box::new(self.heading("Main risk points")));
        for clause in usable {
            let mut content: Vec<Box<dyn Flowable>> = vec![Box::new(
                self.bold_paragraph(clause.title.trim(), self.metrics.body_size),
            )];
            if present(&clause.why) {
                content.push(Box::new(self.body_paragraph(clause.why.trim())));
            }
            story.extend(self.card(content, Severity::Warn));
        }
    }

    fn push_enriched_clauses(&self, story: &mut Vec<Box<dyn Flowable>>, clauses: &[EnrichedClause]) {
        let usable: Vec<_> = clauses
            .iter()
            .filter(|c| present(&c.title) || present(&c.diagnostic))
            .take(self.caps.enriched_clauses)
            .collect();
        if usable.is_empty() {
            return;
        }
        self.log_capped("enriched_clauses", clauses.len(), usable.len());
        story.push(Box::new(self.heading("Clause by clause")));
        for clause in usable {
            let severity = severity_for_light(clause.traffic_light);
            let mut content: Vec<Box<dyn Flowable>> = vec![Box::new(self.bold_paragraph(
                &format!(
                    "{} ({}, {}/100)",
                    clause.title.trim(),
                    clause.traffic_light.label(),
                    clause.score.min(100)
                ),
                self.metrics.body_size,
            ))];
            if present(&clause.diagnostic) {
                content.push(Box::new(self.body_paragraph(clause.diagnostic.trim())));
            }
            if present(&clause.excerpt) {
                content.push(Box::new(
                    self.muted_paragraph(&format!("\u{201c}{}\u{201d}", clause.excerpt.trim())),
                ));
            }
            if !clause.highlights.is_empty() {
                let highlights: Vec<Paragraph> = clause
                    .highlights
                    .iter()
                    .filter(|h| present(h))
                    .map(|h| self.body_paragraph(h.trim()))
                    .collect();
                if !highlights.is_empty() {
                    content.push(Box::new(BulletList::new(highlights)));
                }
            }
            story.extend(self.card(content, severity));
        }
    }

    fn push_critical_clauses(&self, story: &mut Vec<Box<dyn Flowable>>, clauses: &[CriticalClause]) {
        let usable: Vec<_> = clauses
            .iter()
            .filter(|c| present(&c.title) || present(&c.rationale))
            .take(self.caps.critical_clauses)
            .collect();
        if usable.is_empty() {
            return;
        }
        self.log_capped("critical_clauses", clauses.len(), usable.len());
        story.push(Box::new(self.heading("Critical clauses")));
        for clause in usable {
            let mut content: Vec<Box<dyn Flowable>> = Vec::new();
            if present(&clause.title) {
                content.push(Box::new(
                    self.bold_paragraph(clause.title.trim(), self.metrics.body_size),
                ));
            }
            if present(&clause.excerpt) {
                content.push(Box::new(
                    self.muted_paragraph(&format!("\u{201c}{}\u{201d}", clause.excerpt.trim())),
                ));
            }
            if present(&clause.rationale) {
                content.push(Box::new(self.body_paragraph(clause.rationale.trim())));
            }
            if present(&clause.specific_risk) {
                content.push(Box::new(
                    self.body_paragraph(&format!("Risk: {}", clause.specific_risk.trim())),
                ));
            }
            if present(&clause.suggested_rewrite) {
                content.push(Box::new(self.body_paragraph(&format!(
                    "Suggested rewrite: {}",
                    clause.suggested_rewrite.trim()
                ))));
            }
            story.extend(self.card(content, Severity::Danger));
        }
    }

    fn push_unfair_clauses(&self, story: &mut Vec<Box<dyn Flowable>>, clauses: &[UnfairClause]) {
        let usable: Vec<_> = clauses
            .iter()
            .filter(|c| present(&c.title) || present(&c.rationale))
            .take(self.caps.unfair_clauses)
            .collect();
        if usable.is_empty() {
            return;
        }
        self.log_capped("unfair_clauses", clauses.len(), usable.len());
        story.push(Box::new(self.heading("Potentially unfair clauses")));
        for clause in usable {
            let mut content: Vec<Box<dyn Flowable>> = Vec::new();
            if present(&clause.title) {
                content.push(Box::new(
                    self.bold_paragraph(clause.title.trim(), self.metrics.body_size),
                ));
            }
            if present(&clause.excerpt) {
                content.push(Box::new(
                    self.muted_paragraph(&format!("\u{201c}{}\u{201d}", clause.excerpt.trim())),
                ));
            }
            if present(&clause.rationale) {
                content.push(Box::new(self.body_paragraph(clause.rationale.trim())));
            }
            if present(&clause.legal_reference) {
                content.push(Box::new(
                    self.muted_paragraph(&format!("Reference: {}", clause.legal_reference.trim())),
                ));
            }
            story.extend(self.card(content, Severity::Warn));
        }
    }

    fn push_rebalanced_text(&self, story: &mut Vec<Box<dyn Flowable>>, text: &str) {
        if !present(text) {
            return;
        }
        story.push(Box::new(self.heading("Rebalanced wording")));
        // Plain paragraphs, not a card: this field is routinely pages long
        // and must flow across page breaks.
        story.push(Box::new(self.body_paragraph(text.trim())));
        story.push(Box::new(Spacer::new_pt(self.metrics.card_gap)));
    }

    fn push_pros_cons(&self, story: &mut Vec<Box<dyn Flowable>>, pros: &[String], cons: &[String]) {
        let pros: Vec<Paragraph> = pros
            .iter()
            .filter(|p| present(p))
            .map(|p| self.body_paragraph(p.trim()))
            .collect();
        let cons: Vec<Paragraph> = cons
            .iter()
            .filter(|c| present(c))
            .map(|c| self.body_paragraph(c.trim()))
            .collect();
        if pros.is_empty() && cons.is_empty() {
            return;
        }
        if !pros.is_empty() {
            story.push(Box::new(self.heading("In your favor")));
            story.push(Box::new(BulletList::new(pros).with_marker("+")));
            story.push(Box::new(Spacer::new_pt(self.metrics.card_gap)));
        }
        if !cons.is_empty() {
            story.push(Box::new(self.heading("Against you")));
            story.push(Box::new(BulletList::new(cons).with_marker("\u{2013}")));
            story.push(Box::new(Spacer::new_pt(self.metrics.card_gap)));
        }
    }

    fn push_glossary(&self, story: &mut Vec<Box<dyn Flowable>>, glossary: &[GlossaryEntry]) {
        let usable: Vec<_> = glossary
            .iter()
            .filter(|e| present(&e.term))
            .take(self.caps.glossary)
            .collect();
        if usable.is_empty() {
            return;
        }
        self.log_capped("glossary", glossary.len(), usable.len());
        story.push(Box::new(self.heading("Glossary")));
        story.push(Box::new(Divider::new(0.5, self.theme.rule)));
        for entry in usable {
            story.push(Box::new(
                self.bold_paragraph(entry.term.trim(), self.metrics.body_size),
            ));
            if present(&entry.explanation) {
                story.push(Box::new(self.body_paragraph(entry.explanation.trim())));
            }
            story.push(Box::new(Spacer::new_pt(self.metrics.card_gap / 2)));
        }
        story.push(Box::new(Spacer::new_pt(self.metrics.card_gap / 2)));
    }

    fn push_final_alerts(&self, story: &mut Vec<Box<dyn Flowable>>, alerts: &[String]) {
        let items: Vec<Paragraph> = alerts
            .iter()
            .filter(|a| present(a))
            .map(|a| self.body_paragraph(a.trim()))
            .collect();
        if items.is_empty() {
            return;
        }
        let content: Vec<Box<dyn Flowable>> = vec![
            Box::new(self.bold_paragraph("Before you sign", self.metrics.h2_size)),
            Box::new(BulletList::new(items)),
        ];
        story.extend(self.card(content, Severity::Warn));
    }

    /// Wraps content in a severity-colored card, falling back to the unboxed
    /// content when the measured box is taller than an empty page frame. The
    /// fallback keeps the content splittable instead of forcing an overfull
    /// box past the footer.
    fn card(&self, content: Vec<Box<dyn Flowable>>, severity: Severity) -> Vec<Box<dyn Flowable>> {
        let (background, stroke) = self.theme.severity_colors(severity);
        self.boxed(content, background, stroke)
    }

    /// Neutral card for informational blocks that carry no severity.
    fn neutral_card(&self, content: Vec<Box<dyn Flowable>>) -> Vec<Box<dyn Flowable>> {
        self.boxed(content, self.theme.card_bg, self.theme.card_stroke)
    }

    fn boxed(
        &self,
        content: Vec<Box<dyn Flowable>>,
        background: Color,
        stroke: Color,
    ) -> Vec<Box<dyn Flowable>> {
        let card = Card::new(content, background)
            .with_stroke(stroke)
            .with_padding(self.metrics.card_padding)
            .with_radius(self.metrics.card_radius)
            .with_min_height(self.metrics.min_card_height);

        let frame = self.metrics.content_frame();
        let usable = frame.height;
        let box_height = card.wrap(frame.width, Pt::from_f32(1.0e9)).height;
        let mut out: Vec<Box<dyn Flowable>> = Vec::new();
        if box_height > usable {
            if let Some(debug) = &self.debug {
                debug.log(
                    "card_unboxed",
                    &[("box_height_milli", box_height.to_milli_i64().to_string())],
                );
            }
            out.extend(card.into_content());
        } else {
            out.push(Box::new(card));
        }
        out.push(Box::new(Spacer::new_pt(self.metrics.card_gap)));
        out
    }

    fn heading(&self, text: &str) -> Paragraph {
        Paragraph::new(text)
            .with_style(TextStyle {
                font_name: self.bold_font.clone(),
                font_size: self.metrics.h2_size,
                line_height: None,
                color: self.theme.accent,
            })
            .with_font_registry(self.registry.clone())
    }

    fn bold_paragraph(&self, text: &str, size: Pt) -> Paragraph {
        Paragraph::new(text)
            .with_style(TextStyle {
                font_name: self.bold_font.clone(),
                font_size: size,
                line_height: None,
                color: self.theme.ink,
            })
            .with_font_registry(self.registry.clone())
    }

    fn body_paragraph(&self, text: &str) -> Paragraph {
        Paragraph::new(text)
            .with_style(TextStyle {
                font_name: self.body_font.clone(),
                font_size: self.metrics.body_size,
                line_height: None,
                color: self.theme.ink,
            })
            .with_font_registry(self.registry.clone())
    }

    fn muted_paragraph(&self, text: &str) -> Paragraph {
        Paragraph::new(text)
            .with_style(TextStyle {
                font_name: self.body_font.clone(),
                font_size: self.metrics.small_size,
                line_height: None,
                color: self.theme.muted,
            })
            .with_font_registry(self.registry.clone())
    }

    fn log_capped(&self, section: &str, total: usize, kept: usize) {
        if total > kept {
            if let Some(debug) = &self.debug {
                debug.log(
                    "section_capped",
                    &[
                        ("section", section.to_string()),
                        ("total", total.to_string()),
                        ("kept", kept.to_string()),
                    ],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RiskIndex;

    fn composer() -> Composer {
        Composer::new(
            Theme::default(),
            LayoutMetrics::default(),
            SectionCaps::default(),
            None,
            Arc::from("Helvetica"),
            Arc::from("Helvetica-Bold"),
        )
    }

    fn names(story: &[Box<dyn Flowable>]) -> Vec<&'static str> {
        story.iter().map(|f| f.debug_name()).collect()
    }

    #[test]
    fn minimal_record_emits_guide_and_badge_only() {
        let record = AnalysisRecord::default();
        let story = composer().compose(&record);
        let cards = names(&story).iter().filter(|n| **n == "Card").count();
        // Reading guide plus the risk badge; nothing else is present.
        assert_eq!(cards, 2);
        assert!(!names(&story).contains(&"BulletList"));
    }

    #[test]
    fn sparse_sections_are_skipped() {
        let record = AnalysisRecord {
            summary: "   ".to_string(),
            pros: vec!["".to_string(), "  ".to_string()],
            ..AnalysisRecord::default()
        };
        let story = composer().compose(&record);
        assert!(!names(&story).contains(&"BulletList"));
    }

    #[test]
    fn caps_bound_item_counts() {
        let record = AnalysisRecord {
            glossary: (0..200)
                .map(|i| GlossaryEntry {
                    term: format!("term {i}"),
                    explanation: "meaning".to_string(),
                })
                .collect(),
            ..AnalysisRecord::default()
        };
        let story = composer().compose(&record);
        // One bold term paragraph per glossary entry, capped at 80.
        let bold_terms = story
            .iter()
            .filter(|f| f.debug_name() == "Paragraph")
            .count();
        assert!(bold_terms <= 2 * SectionCaps::default().glossary + 16);
    }

    #[test]
    fn oversized_card_degrades_to_unboxed_content() {
        let huge = "word ".repeat(12_000);
        let record = AnalysisRecord {
            risk_level: RiskLevel::High,
            risk_rationale: huge,
            ..AnalysisRecord::default()
        };
        let story = composer().compose(&record);
        // The badge card would exceed an empty page; its content must appear
        // unboxed, leaving only the reading-guide card.
        let cards = names(&story).iter().filter(|n| **n == "Card").count();
        assert_eq!(cards, 1);
    }

    #[test]
    fn v2_sections_appear_when_present() {
        let record = AnalysisRecord {
            v2: Some(crate::record::AnalysisV2 {
                overall_risk: Some(RiskIndex {
                    score: 70,
                    level: RiskLevel::High,
                    why: "Unilateral termination.".to_string(),
                }),
                balance: Some(crate::record::BalanceScore {
                    user: 40,
                    counterparty: 60,
                }),
                ..Default::default()
            }),
            ..AnalysisRecord::default()
        };
        let story = composer().compose(&record);
        assert!(names(&story).contains(&"BalanceBar"));
        let cards = names(&story).iter().filter(|n| **n == "Card").count();
        // Guide, legacy badge, risk index card.
        assert_eq!(cards, 3);
    }
}
