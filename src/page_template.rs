use crate::canvas::Canvas;
use crate::types::{Rect, Size};
use std::sync::Arc;

/// Per-page context passed to the chrome callback.
#[derive(Debug, Clone, Copy)]
pub struct PageContext {
    /// 1-based page number of the page being opened.
    pub page_number: usize,
}

pub type OnPageFn = dyn Fn(&mut Canvas, &PageContext) + Send + Sync;

/// Fixed geometry shared by every page: page size, the single content frame,
/// and an optional chrome painter invoked when a page is opened.
#[derive(Clone)]
pub struct PageTemplate {
    pub page_size: Size,
    pub frame: Rect,
    pub on_page: Option<Arc<OnPageFn>>,
}

impl PageTemplate {
    pub fn new(page_size: Size, frame: Rect) -> Self {
        Self {
            page_size,
            frame,
            on_page: None,
        }
    }

    pub fn with_on_page(mut self, on_page: Arc<OnPageFn>) -> Self {
        self.on_page = Some(on_page);
        self
    }
}
