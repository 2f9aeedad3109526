use crate::types::{Color, Pt, Rect, Size};

/// Drawing commands recorded per page. Coordinates are top-left origin with y
/// growing downward; the PDF writer performs the flip.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    SetFontName(String),
    SetFontSize(Pt),
    MoveTo {
        x: Pt,
        y: Pt,
    },
    LineTo {
        x: Pt,
        y: Pt,
    },
    CurveTo {
        x1: Pt,
        y1: Pt,
        x2: Pt,
        y2: Pt,
        x: Pt,
        y: Pt,
    },
    ClosePath,
    Fill,
    Stroke,
    FillStroke,
    /// Appends a rectangle to the current path; painted by a following
    /// Fill/Stroke/FillStroke.
    DrawRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    /// `y` is the top of the text box.
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    /// Non-rendered metadata used for page-aware reporting and layout
    /// assertions. Ignored by the PDF writer.
    Meta {
        key: String,
        value: String,
    },
}

/// Meta key under which placed-flowable bounding boxes are recorded.
pub const BBOX_META_KEY: &str = "__cl_bbox";

#[derive(Debug, Clone)]
pub struct Page {
    pub commands: Vec<Command>,
}

impl Page {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

/// Fully composed report: one command list per page. Pages stay revisitable
/// in memory, so chrome stamping with the final page count happens before any
/// bytes are serialized.
#[derive(Debug, Clone)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font_size: Pt,
    font_name: String,
}

impl GraphicsState {
    fn page_default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_f32(1.0),
            font_size: Pt::from_f32(12.0),
            font_name: "Helvetica".to_string(),
        }
    }
}

pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Page,
    state: GraphicsState,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current: Page::new(),
            state: GraphicsState::page_default(),
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color == color {
            return;
        }
        self.state.fill_color = color;
        self.current.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.state.stroke_color == color {
            return;
        }
        self.state.stroke_color = color;
        self.current.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        let width = width.max(Pt::ZERO);
        if self.state.line_width == width {
            return;
        }
        self.state.line_width = width;
        self.current.commands.push(Command::SetLineWidth(width));
    }

    pub fn set_font_name(&mut self, name: &str) {
        if self.state.font_name == name {
            return;
        }
        self.state.font_name = name.to_string();
        self.current
            .commands
            .push(Command::SetFontName(self.state.font_name.clone()));
    }

    pub fn set_font_size(&mut self, size: Pt) {
        if self.state.font_size == size {
            return;
        }
        self.state.font_size = size;
        self.current.commands.push(Command::SetFontSize(size));
    }

    pub fn move_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::LineTo { x, y });
    }

    pub fn curve_to(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt, x: Pt, y: Pt) {
        self.current.commands.push(Command::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
    }

    pub fn close_path(&mut self) {
        self.current.commands.push(Command::ClosePath);
    }

    pub fn fill(&mut self) {
        self.current.commands.push(Command::Fill);
    }

    pub fn stroke(&mut self) {
        self.current.commands.push(Command::Stroke);
    }

    pub fn fill_stroke(&mut self) {
        self.current.commands.push(Command::FillStroke);
    }

    pub fn draw_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.current.commands.push(Command::DrawRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.current.commands.push(Command::DrawString {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.current.commands.push(Command::Meta {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn record_flowable_bounds(&mut self, rect: Rect) {
        let value = format!(
            "{},{},{},{}",
            rect.x.to_milli_i64(),
            rect.y.to_milli_i64(),
            rect.width.to_milli_i64(),
            rect.height.to_milli_i64()
        );
        self.meta(BBOX_META_KEY, value);
    }

    /// Appends a pre-built command sequence verbatim, bypassing state
    /// deduplication so the same chrome sequence lands identically on every
    /// page and on both stamping passes. Tracked state is kept in sync.
    pub fn append_commands(&mut self, commands: &[Command]) {
        for command in commands {
            match command {
                Command::SetFillColor(color) => self.state.fill_color = *color,
                Command::SetStrokeColor(color) => self.state.stroke_color = *color,
                Command::SetLineWidth(width) => self.state.line_width = *width,
                Command::SetFontName(name) => self.state.font_name = name.clone(),
                Command::SetFontSize(size) => self.state.font_size = *size,
                _ => {}
            }
            self.current.commands.push(command.clone());
        }
    }

    pub fn current_command_count(&self) -> usize {
        self.current.commands.len()
    }

    pub fn is_current_empty(&self) -> bool {
        self.current.commands.is_empty()
    }

    pub fn show_page(&mut self) {
        let current = std::mem::replace(&mut self.current, Page::new());
        self.pages.push(current);
        self.state = GraphicsState::page_default();
    }

    pub fn finish(mut self) -> Document {
        if !self.current.commands.is_empty() || self.pages.is_empty() {
            self.show_page();
        }
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }

    pub fn finish_without_show(self) -> Document {
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_changes_are_deduplicated() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_fill_color(Color::rgb(0.5, 0.5, 0.5));
        canvas.set_fill_color(Color::rgb(0.5, 0.5, 0.5));
        canvas.set_font_size(Pt::from_f32(9.0));
        canvas.set_font_size(Pt::from_f32(9.0));
        assert_eq!(canvas.current_command_count(), 2);
    }

    #[test]
    fn append_commands_bypasses_dedup_and_syncs_state() {
        let chrome = vec![
            Command::SetFillColor(Color::BLACK),
            Command::SetFillColor(Color::BLACK),
        ];
        let mut canvas = Canvas::new(Size::a4());
        canvas.append_commands(&chrome);
        assert_eq!(canvas.current_command_count(), 2);
        // Tracked state was synced, so the next identical set is a no-op.
        canvas.set_fill_color(Color::BLACK);
        assert_eq!(canvas.current_command_count(), 2);
    }

    #[test]
    fn finish_emits_at_least_one_page() {
        let canvas = Canvas::new(Size::a4());
        let doc = canvas.finish();
        assert_eq!(doc.pages.len(), 1);
    }

    #[test]
    fn state_resets_per_page() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font_size(Pt::from_f32(9.0));
        canvas.show_page();
        canvas.set_font_size(Pt::from_f32(9.0));
        assert_eq!(canvas.current_command_count(), 1);
    }
}
