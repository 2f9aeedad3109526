use crate::canvas::Canvas;
use crate::debug::DebugLogger;
use crate::error::ReportError;
use crate::flowable::{BreakBefore, Flowable};
use crate::frame::{AddResult, Frame};
use crate::page_template::{PageContext, PageTemplate};
use std::collections::VecDeque;
use std::sync::Arc;

/// Drives the story through a sequence of identically-framed pages. Chrome is
/// painted once per page open; content placement is delegated to the frame.
pub struct DocTemplate {
    template: PageTemplate,
    story: Vec<Box<dyn Flowable>>,
    debug: Option<Arc<DebugLogger>>,
}

impl DocTemplate {
    pub fn new(template: PageTemplate, story: Vec<Box<dyn Flowable>>) -> Self {
        Self {
            template,
            story,
            debug: None,
        }
    }

    pub fn with_debug(mut self, debug: Option<Arc<DebugLogger>>) -> Self {
        self.debug = debug;
        self
    }

    pub fn build(mut self) -> Result<crate::canvas::Document, ReportError> {
        let mut canvas = Canvas::new(self.template.page_size);
        let mut page_number = 1usize;
        self.open_page(&mut canvas, page_number);
        let mut frame = Frame::new(self.template.frame);

        let mut queue: VecDeque<Box<dyn Flowable>> = std::mem::take(&mut self.story).into();
        // One retry per flowable per page; the empty-frame overfull fallback
        // makes a second consecutive overflow impossible.
        let mut retried = false;
        while let Some(flowable) = queue.pop_front() {
            if flowable.pagination().break_before == BreakBefore::Page && !frame.is_empty() {
                self.log_page_break(page_number, "break_before");
                canvas.show_page();
                page_number += 1;
                self.open_page(&mut canvas, page_number);
                frame = Frame::new(self.template.frame);
            }
            let name = flowable.debug_name();
            match frame.add(flowable, &mut canvas) {
                AddResult::Placed => {
                    retried = false;
                }
                AddResult::Split(rest) => {
                    self.log_page_break(page_number, "split");
                    canvas.show_page();
                    page_number += 1;
                    self.open_page(&mut canvas, page_number);
                    frame = Frame::new(self.template.frame);
                    queue.push_front(rest);
                    retried = false;
                }
                AddResult::Overflow(flowable) => {
                    if retried {
                        return Err(ReportError::UnplaceableFlowable(name.to_string()));
                    }
                    self.log_page_break(page_number, "overflow");
                    canvas.show_page();
                    page_number += 1;
                    self.open_page(&mut canvas, page_number);
                    frame = Frame::new(self.template.frame);
                    queue.push_front(flowable);
                    retried = true;
                }
            }
        }

        let doc = canvas.finish();
        if let Some(debug) = &self.debug {
            debug.log("build_done", &[("pages", doc.pages.len().to_string())]);
        }
        Ok(doc)
    }

    fn open_page(&self, canvas: &mut Canvas, page_number: usize) {
        if let Some(on_page) = &self.template.on_page {
            on_page(canvas, &PageContext { page_number });
        }
    }

    fn log_page_break(&self, from_page: usize, reason: &str) {
        if let Some(debug) = &self.debug {
            debug.log(
                "page_break",
                &[
                    ("from_page", from_page.to_string()),
                    ("reason", reason.to_string()),
                ],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::flowable::{BreakBefore, Pagination, Paragraph, Spacer, TextStyle};
    use crate::types::{Pt, Rect, Size};

    fn template() -> PageTemplate {
        PageTemplate::new(
            Size::a4(),
            Rect {
                x: Pt::from_f32(48.0),
                y: Pt::from_f32(74.0),
                width: Pt::from_f32(499.28),
                height: Pt::from_f32(200.0),
            },
        )
    }

    #[test]
    fn empty_story_yields_one_page() {
        let doc = DocTemplate::new(template(), Vec::new()).build().unwrap();
        assert_eq!(doc.pages.len(), 1);
    }

    #[test]
    fn overflow_opens_new_page() {
        let story: Vec<Box<dyn Flowable>> = vec![
            Box::new(Spacer::new(150.0)),
            Box::new(Spacer::new(150.0)),
        ];
        let doc = DocTemplate::new(template(), story).build().unwrap();
        assert_eq!(doc.pages.len(), 2);
    }

    #[test]
    fn long_paragraph_splits_across_pages() {
        let text = (0..60).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let para = Paragraph::new(text).with_style(TextStyle::sized("Helvetica", 10.0));
        let doc = DocTemplate::new(template(), vec![Box::new(para)])
            .build()
            .unwrap();
        // 200pt frame at 12pt lines = 16 lines/page; 60 lines need 4 pages.
        assert_eq!(doc.pages.len(), 4);
        for page in &doc.pages {
            assert!(
                page.commands
                    .iter()
                    .any(|cmd| matches!(cmd, Command::DrawString { .. }))
            );
        }
    }

    #[test]
    fn on_page_runs_once_per_page() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let template = template().with_on_page(Arc::new(move |_canvas, _ctx| {
            count2.fetch_add(1, Ordering::Relaxed);
        }));
        let story: Vec<Box<dyn Flowable>> = vec![
            Box::new(Spacer::new(150.0)),
            Box::new(Spacer::new(150.0)),
            Box::new(Spacer::new(150.0)),
        ];
        let doc = DocTemplate::new(template, story).build().unwrap();
        assert_eq!(doc.pages.len(), 3);
        assert_eq!(count.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn break_before_page_opens_fresh_page() {
        let para = Paragraph::new("next section")
            .with_style(TextStyle::sized("Helvetica", 10.0))
            .with_pagination(Pagination {
                break_before: BreakBefore::Page,
                ..Pagination::default()
            });
        let story: Vec<Box<dyn Flowable>> =
            vec![Box::new(Spacer::new(20.0)), Box::new(para)];
        let doc = DocTemplate::new(template(), story).build().unwrap();
        assert_eq!(doc.pages.len(), 2);
    }

    #[test]
    fn oversized_spacer_terminates_overfull() {
        let story: Vec<Box<dyn Flowable>> = vec![Box::new(Spacer::new(5000.0))];
        let doc = DocTemplate::new(template(), story).build().unwrap();
        assert_eq!(doc.pages.len(), 1);
    }
}
