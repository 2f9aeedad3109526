use crate::canvas::Canvas;
use crate::font::{FontRegistry, fallback_width};
use crate::types::{Color, Pt, Size};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn huge_pt() -> Pt {
    // Large but safe sentinel for "unbounded" layout measurements.
    Pt::from_f32(1.0e9)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakBefore {
    Auto,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakInside {
    Auto,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pagination {
    pub break_before: BreakBefore,
    pub break_inside: BreakInside,
    pub orphans: usize,
    pub widows: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            break_before: BreakBefore::Auto,
            break_inside: BreakInside::Auto,
            orphans: 2,
            widows: 2,
        }
    }
}

impl Pagination {
    fn resolved_orphans(self) -> usize {
        self.orphans.max(1)
    }

    fn resolved_widows(self) -> usize {
        self.widows.max(1)
    }
}

pub trait Flowable: FlowableClone + Send + Sync {
    /// Measures the flowable at the given available width. Deterministic and
    /// free of cursor side effects; `draw` must paint exactly this size.
    fn wrap(&self, avail_width: Pt, avail_height: Pt) -> Size;
    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)>;
    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, avail_height: Pt);

    fn pagination(&self) -> Pagination {
        Pagination::default()
    }

    fn debug_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

pub trait FlowableClone {
    fn clone_box(&self) -> Box<dyn Flowable>;
}

impl<T> FlowableClone for T
where
    T: 'static + Flowable + Clone,
{
    fn clone_box(&self) -> Box<dyn Flowable> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Flowable> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub font_name: Arc<str>,
    pub font_size: Pt,
    /// None resolves through the font's own metrics (or 1.2 em without a
    /// registry).
    pub line_height: Option<Pt>,
    pub color: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_name: Arc::<str>::from("Helvetica"),
            font_size: Pt::from_f32(12.0),
            line_height: None,
            color: Color::BLACK,
        }
    }
}

impl TextStyle {
    pub fn sized(name: impl Into<Arc<str>>, size: f32) -> Self {
        Self {
            font_name: name.into(),
            font_size: Pt::from_f32(size),
            line_height: None,
            color: Color::BLACK,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

#[derive(Debug, Clone)]
struct LineLayout {
    text: String,
    width: Pt,
}

// Single-slot cache: the build loop measures and draws at the same width, so
// one keyed entry eliminates the duplicated line-break computation.
#[derive(Debug, Default)]
struct LineCache {
    entry: Option<(i64, Arc<Vec<LineLayout>>)>,
}

#[derive(Clone)]
pub struct Paragraph {
    text: String,
    style: TextStyle,
    align: TextAlign,
    pagination: Pagination,
    font_registry: Option<Arc<FontRegistry>>,
    line_cache: Arc<Mutex<LineCache>>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
            align: TextAlign::Left,
            pagination: Pagination::default(),
            font_registry: None,
            line_cache: Arc::new(Mutex::new(LineCache::default())),
        }
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_font_registry(mut self, registry: Option<Arc<FontRegistry>>) -> Self {
        self.font_registry = registry;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    fn derived(&self, text: String, pagination: Pagination) -> Self {
        Self {
            text,
            style: self.style.clone(),
            align: self.align,
            pagination,
            font_registry: self.font_registry.clone(),
            line_cache: Arc::new(Mutex::new(LineCache::default())),
        }
    }

    fn measure_text_width(&self, text: &str) -> Pt {
        match &self.font_registry {
            Some(registry) => {
                registry.measure_text_width(&self.style.font_name, self.style.font_size, text)
            }
            None => fallback_width(self.style.font_size, text),
        }
    }

    pub(crate) fn effective_line_height(&self) -> Pt {
        if let Some(height) = self.style.line_height {
            return height;
        }
        let fallback = self.style.font_size.mul_ratio(6, 5);
        match &self.font_registry {
            Some(registry) => {
                registry.line_height(&self.style.font_name, self.style.font_size, fallback)
            }
            None => fallback,
        }
    }

    /// Line-level split honoring orphan/widow minimums. Shared by the
    /// `Flowable` impl and containers that break inside their first item.
    pub(crate) fn split_at_height(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Paragraph, Paragraph)> {
        let lines = self.layout_lines(avail_width);
        let line_height = self.effective_line_height();
        let lh = line_height.to_milli_i64();
        let ah = avail_height.to_milli_i64();
        if lh <= 0 || ah <= 0 {
            return None;
        }
        let max_lines = (ah / lh) as usize;
        let total_lines = lines.len();
        if max_lines == 0 || max_lines >= total_lines {
            return None;
        }

        let orphans = self.pagination.resolved_orphans();
        let widows = self.pagination.resolved_widows();
        let mut split_at = max_lines;
        if split_at < orphans {
            return None;
        }
        if total_lines - split_at < widows {
            let adjusted = total_lines.saturating_sub(widows);
            if adjusted >= orphans {
                split_at = adjusted.min(max_lines);
            }
        }
        if split_at == 0 || split_at >= total_lines {
            return None;
        }

        let join = |slice: &[LineLayout]| {
            slice
                .iter()
                .map(|line| line.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        };
        let continued = Pagination {
            break_before: BreakBefore::Auto,
            ..self.pagination
        };
        let first = self.derived(join(&lines[..split_at]), continued);
        let second = self.derived(join(&lines[split_at..]), continued);
        Some((first, second))
    }

    fn layout_lines(&self, avail_width: Pt) -> Arc<Vec<LineLayout>> {
        let max_width = avail_width.max(Pt::from_f32(1.0));
        let key = max_width.to_milli_i64();
        if let Ok(cache) = self.line_cache.lock() {
            if let Some((cached_key, lines)) = &cache.entry {
                if *cached_key == key {
                    return lines.clone();
                }
            }
        }

        let mut lines: Vec<String> = Vec::new();
        let mut word_widths: HashMap<&str, Pt> = HashMap::new();
        let space_width = self.measure_text_width(" ");
        for segment in self.text.split('\n') {
            if segment.trim().is_empty() {
                lines.push(String::new());
                continue;
            }
            let mut current = String::new();
            let mut current_width = Pt::ZERO;
            for word in segment.split_whitespace() {
                let word_width = match word_widths.get(word) {
                    Some(value) => *value,
                    None => {
                        let value = self.measure_text_width(word);
                        word_widths.insert(word, value);
                        value
                    }
                };
                if word_width > max_width {
                    // A single word wider than the column is broken by glyph
                    // runs so layout always makes forward progress.
                    if !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                        current_width = Pt::ZERO;
                    }
                    let mut parts = split_long_word(self, word, max_width);
                    if let Some(last) = parts.pop() {
                        lines.extend(parts);
                        current_width = self.measure_text_width(&last);
                        current = last;
                    }
                    continue;
                }
                let extra = if current.is_empty() {
                    word_width
                } else {
                    space_width + word_width
                };
                if !current.is_empty() && current_width + extra > max_width {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                    current_width = word_width;
                } else {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(word);
                    current_width += extra;
                }
            }
            if !current.is_empty() {
                lines.push(current);
            }
        }
        if lines.is_empty() {
            lines.push(String::new());
        }

        let layouts: Vec<LineLayout> = lines
            .into_iter()
            .map(|text| {
                let width = if text.is_empty() {
                    Pt::ZERO
                } else {
                    self.measure_text_width(&text)
                };
                LineLayout { text, width }
            })
            .collect();
        let layouts = Arc::new(layouts);
        if let Ok(mut cache) = self.line_cache.lock() {
            cache.entry = Some((key, layouts.clone()));
        }
        layouts
    }
}

fn split_long_word(paragraph: &Paragraph, word: &str, max_width: Pt) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_width = Pt::ZERO;
    for ch in word.chars() {
        let w = paragraph.measure_text_width(&ch.to_string());
        let mut next_width = current_width + w;
        if !current.is_empty() && next_width > max_width {
            parts.push(std::mem::take(&mut current));
            next_width = w;
        }
        current.push(ch);
        current_width = next_width;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    if parts.is_empty() {
        parts.push(String::new());
    }
    parts
}

impl Flowable for Paragraph {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let lines = self.layout_lines(avail_width);
        let line_height = self.effective_line_height();
        let height = line_height * (lines.len() as i32);
        let width = lines
            .iter()
            .fold(Pt::ZERO, |acc, line| acc.max(line.width))
            .min(avail_width);
        Size { width, height }
    }

    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        let (first, second) = self.split_at_height(avail_width, avail_height)?;
        Some((Box::new(first), Box::new(second)))
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let lines = self.layout_lines(avail_width);
        canvas.set_fill_color(self.style.color);
        canvas.set_font_name(&self.style.font_name);
        canvas.set_font_size(self.style.font_size);

        let line_height = self.effective_line_height();
        let mut cursor_y = y;
        for line in lines.iter() {
            if !line.text.is_empty() {
                let offset = match self.align {
                    TextAlign::Left => Pt::ZERO,
                    TextAlign::Center => (avail_width - line.width).max(Pt::ZERO).mul_ratio(1, 2),
                    TextAlign::Right => (avail_width - line.width).max(Pt::ZERO),
                };
                canvas.draw_string(x + offset, cursor_y, line.text.clone());
            }
            cursor_y += line_height;
        }
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn debug_name(&self) -> &'static str {
        "Paragraph"
    }
}

#[derive(Debug, Clone)]
pub struct Spacer {
    height: Pt,
}

impl Spacer {
    pub fn new(height: f32) -> Self {
        Self::new_pt(Pt::from_f32(height))
    }

    pub fn new_pt(height: Pt) -> Self {
        Self {
            height: height.max(Pt::ZERO),
        }
    }
}

impl Flowable for Spacer {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: avail_width,
            height: self.height,
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, _canvas: &mut Canvas, _x: Pt, _y: Pt, _avail_width: Pt, _avail_height: Pt) {}

    fn debug_name(&self) -> &'static str {
        "Spacer"
    }
}

/// Thin horizontal rule used between report sections.
#[derive(Debug, Clone)]
pub struct Divider {
    thickness: Pt,
    color: Color,
    vertical_pad: Pt,
}

impl Divider {
    pub fn new(thickness: f32, color: Color) -> Self {
        Self {
            thickness: Pt::from_f32(thickness),
            color,
            vertical_pad: Pt::from_f32(4.0),
        }
    }
}

impl Flowable for Divider {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: avail_width,
            height: self.thickness + self.vertical_pad * 2,
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        canvas.set_fill_color(self.color);
        canvas.draw_rect(x, y + self.vertical_pad, avail_width, self.thickness);
        canvas.fill();
    }

    fn debug_name(&self) -> &'static str {
        "Divider"
    }
}

/// Bulleted paragraphs with a hanging indent. Splits between items, or
/// inside an item's lines when a single item is taller than the available
/// space.
#[derive(Clone)]
pub struct BulletList {
    items: Vec<Paragraph>,
    marker: String,
    indent: Pt,
    item_gap: Pt,
    pagination: Pagination,
    /// True on the trailing half of an intra-item split; the carried-over
    /// first item is a continuation and gets no marker.
    continued: bool,
}

impl BulletList {
    pub fn new(items: Vec<Paragraph>) -> Self {
        Self {
            items,
            marker: "\u{2022}".to_string(),
            indent: Pt::from_f32(12.0),
            item_gap: Pt::from_f32(2.0),
            pagination: Pagination::default(),
            continued: false,
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    fn body_width(&self, avail_width: Pt) -> Pt {
        (avail_width - self.indent).max(Pt::from_f32(1.0))
    }

    fn item_heights(&self, avail_width: Pt) -> Vec<Pt> {
        let body_width = self.body_width(avail_width);
        self.items
            .iter()
            .map(|item| item.wrap(body_width, huge_pt()).height)
            .collect()
    }
}

impl Flowable for BulletList {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let heights = self.item_heights(avail_width);
        let mut total = Pt::ZERO;
        for (idx, h) in heights.iter().enumerate() {
            if idx > 0 {
                total += self.item_gap;
            }
            total += *h;
        }
        Size {
            width: avail_width,
            height: total,
        }
    }

    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        if self.items.is_empty() {
            return None;
        }
        let heights = self.item_heights(avail_width);
        let mut used = Pt::ZERO;
        let mut fit = 0usize;
        for (idx, h) in heights.iter().enumerate() {
            let extra = if idx > 0 { self.item_gap + *h } else { *h };
            if used + extra > avail_height {
                break;
            }
            used += extra;
            fit = idx + 1;
        }
        if fit == 0 {
            // The first item alone is taller than the space; break inside its
            // lines so one degenerate item cannot force an overfull page.
            let body_width = self.body_width(avail_width);
            let (head, tail) = self.items[0].split_at_height(body_width, avail_height)?;
            let mut first = self.clone();
            first.items = vec![head];
            let mut second = self.clone();
            second.items = std::iter::once(tail)
                .chain(self.items[1..].iter().cloned())
                .collect();
            second.pagination.break_before = BreakBefore::Auto;
            second.continued = true;
            return Some((Box::new(first), Box::new(second)));
        }
        if fit >= self.items.len() {
            return None;
        }
        let mut first = self.clone();
        let mut second = self.clone();
        first.items = self.items[..fit].to_vec();
        second.items = self.items[fit..].to_vec();
        second.pagination.break_before = BreakBefore::Auto;
        second.continued = false;
        Some((Box::new(first), Box::new(second)))
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let body_width = self.body_width(avail_width);
        let mut cursor_y = y;
        for (idx, item) in self.items.iter().enumerate() {
            if idx > 0 {
                cursor_y += self.item_gap;
            }
            let size = item.wrap(body_width, huge_pt());
            if idx > 0 || !self.continued {
                canvas.set_fill_color(item.style().color);
                canvas.set_font_name(&item.style().font_name);
                canvas.set_font_size(item.style().font_size);
                canvas.draw_string(x, cursor_y, self.marker.clone());
            }
            item.draw(canvas, x + self.indent, cursor_y, body_width, huge_pt());
            cursor_y += size.height;
        }
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn debug_name(&self) -> &'static str {
        "BulletList"
    }
}

/// Two proportional filled bars visualizing the contract balance between the
/// user and the counterparty (v2 extension).
#[derive(Debug, Clone)]
pub struct BalanceBar {
    user: u8,
    counterparty: u8,
    user_color: Color,
    counterparty_color: Color,
    track_color: Color,
    height: Pt,
}

impl BalanceBar {
    pub fn new(
        user: u8,
        counterparty: u8,
        user_color: Color,
        counterparty_color: Color,
        track_color: Color,
    ) -> Self {
        Self {
            user,
            counterparty,
            user_color,
            counterparty_color,
            track_color,
            height: Pt::from_f32(8.0),
        }
    }
}

impl Flowable for BalanceBar {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: avail_width,
            height: self.height,
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let total = self.user as i32 + self.counterparty as i32;
        if total <= 0 {
            canvas.set_fill_color(self.track_color);
            canvas.draw_rect(x, y, avail_width, self.height);
            canvas.fill();
            return;
        }
        let user_width = avail_width.mul_ratio(self.user as i32, total);
        canvas.set_fill_color(self.user_color);
        canvas.draw_rect(x, y, user_width, self.height);
        canvas.fill();
        canvas.set_fill_color(self.counterparty_color);
        canvas.draw_rect(
            x + user_width,
            y,
            (avail_width - user_width).max(Pt::ZERO),
            self.height,
        );
        canvas.fill();
    }

    fn debug_name(&self) -> &'static str {
        "BalanceBar"
    }
}

/// Bordered, background-filled block auto-sized to its measured content:
/// measure first, decide the page break, then paint. The drawn box height is
/// always the measured content height plus fixed padding, never an estimate.
#[derive(Clone)]
pub struct Card {
    content: Vec<Box<dyn Flowable>>,
    background: Color,
    stroke: Option<Color>,
    padding: Pt,
    radius: Pt,
    min_height: Pt,
    content_gap: Pt,
    pagination: Pagination,
}

impl Card {
    pub fn new(content: Vec<Box<dyn Flowable>>, background: Color) -> Self {
        Self {
            content,
            background,
            stroke: None,
            padding: Pt::from_f32(10.0),
            radius: Pt::from_f32(6.0),
            min_height: Pt::ZERO,
            content_gap: Pt::from_f32(3.0),
            pagination: Pagination {
                break_inside: BreakInside::Avoid,
                ..Pagination::default()
            },
        }
    }

    pub fn with_stroke(mut self, color: Color) -> Self {
        self.stroke = Some(color);
        self
    }

    pub fn with_padding(mut self, padding: Pt) -> Self {
        self.padding = padding.max(Pt::ZERO);
        self
    }

    pub fn with_radius(mut self, radius: Pt) -> Self {
        self.radius = radius.max(Pt::ZERO);
        self
    }

    pub fn with_min_height(mut self, min_height: Pt) -> Self {
        self.min_height = min_height.max(Pt::ZERO);
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// The flowables inside this card, for the unboxed fallback path.
    pub fn into_content(self) -> Vec<Box<dyn Flowable>> {
        self.content
    }

    fn content_height(&self, inner_width: Pt) -> Pt {
        let mut total = Pt::ZERO;
        for (idx, item) in self.content.iter().enumerate() {
            if idx > 0 {
                total += self.content_gap;
            }
            total += item.wrap(inner_width, huge_pt()).height;
        }
        total
    }

    fn inner_width(&self, avail_width: Pt) -> Pt {
        (avail_width - self.padding * 2).max(Pt::from_f32(1.0))
    }

    fn rounded_rect_path(canvas: &mut Canvas, x: Pt, y: Pt, width: Pt, height: Pt, radius: Pt) {
        let mut r = radius;
        if r <= Pt::ZERO {
            canvas.draw_rect(x, y, width, height);
            return;
        }
        let max_r = (width / 2).min(height / 2);
        if r > max_r {
            r = max_r;
        }
        let k = 0.55228475;
        let c = r * k;
        let right = x + width;
        let bottom = y + height;

        canvas.move_to(x + r, y);
        canvas.line_to(right - r, y);
        canvas.curve_to(right - r + c, y, right, y + r - c, right, y + r);
        canvas.line_to(right, bottom - r);
        canvas.curve_to(
            right,
            bottom - r + c,
            right - r + c,
            bottom,
            right - r,
            bottom,
        );
        canvas.line_to(x + r, bottom);
        canvas.curve_to(x + r - c, bottom, x, bottom - r + c, x, bottom - r);
        canvas.line_to(x, y + r);
        canvas.curve_to(x, y + r - c, x + r - c, y, x + r, y);
        canvas.close_path();
    }
}

impl Flowable for Card {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let inner_width = self.inner_width(avail_width);
        let box_height = (self.content_height(inner_width) + self.padding * 2)
            .max(self.min_height);
        Size {
            width: avail_width,
            height: box_height,
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        // Cards never split; the composer degrades page-overflowing cards to
        // the unboxed path before they reach a frame.
        None
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let size = self.wrap(avail_width, huge_pt());
        canvas.set_fill_color(self.background);
        Self::rounded_rect_path(canvas, x, y, size.width, size.height, self.radius);
        if let Some(stroke) = self.stroke {
            canvas.set_stroke_color(stroke);
            canvas.set_line_width(Pt::from_f32(0.75));
            canvas.fill_stroke();
        } else {
            canvas.fill();
        }

        let inner_width = self.inner_width(avail_width);
        let mut cursor_y = y + self.padding;
        for (idx, item) in self.content.iter().enumerate() {
            if idx > 0 {
                cursor_y += self.content_gap;
            }
            let item_size = item.wrap(inner_width, huge_pt());
            item.draw(canvas, x + self.padding, cursor_y, inner_width, huge_pt());
            cursor_y += item_size.height;
        }
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn debug_name(&self) -> &'static str {
        "Card"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(v: f32) -> Pt {
        Pt::from_f32(v)
    }

    #[test]
    fn paragraph_wraps_at_available_width() {
        // Fallback metrics: 0.6em per char at 10pt = 6pt/char.
        let para = Paragraph::new("aaaa bbbb cccc").with_style(TextStyle::sized("Helvetica", 10.0));
        // 60pt fits "aaaa bbbb" (9 chars = 54pt); "cccc" wraps.
        let size = para.wrap(pt(60.0), huge_pt());
        let line_height = para.effective_line_height();
        assert_eq!(size.height, line_height * 2);
    }

    #[test]
    fn paragraph_breaks_unbroken_runs() {
        let long = "x".repeat(400);
        let para = Paragraph::new(long).with_style(TextStyle::sized("Helvetica", 10.0));
        // 60pt column = 10 chars per line = 40 lines.
        let size = para.wrap(pt(60.0), huge_pt());
        assert_eq!(size.height, para.effective_line_height() * 40);
    }

    #[test]
    fn paragraph_split_respects_available_height() {
        let text = (0..20).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let para = Paragraph::new(text).with_style(TextStyle::sized("Helvetica", 10.0));
        let line_height = para.effective_line_height();
        let (first, second) = para
            .split(pt(200.0), line_height * 5)
            .expect("paragraph should split");
        assert_eq!(first.wrap(pt(200.0), huge_pt()).height, line_height * 5);
        assert_eq!(second.wrap(pt(200.0), huge_pt()).height, line_height * 15);
    }

    #[test]
    fn paragraph_split_honors_orphans() {
        let para = Paragraph::new("one\ntwo\nthree").with_style(TextStyle::sized("Helvetica", 10.0));
        let line_height = para.effective_line_height();
        // Only one line fits; default orphans=2 refuses the split.
        assert!(para.split(pt(200.0), line_height).is_none());
    }

    #[test]
    fn card_height_is_content_plus_padding() {
        let para = Paragraph::new("hello world").with_style(TextStyle::sized("Helvetica", 10.0));
        let content_height = para.wrap(pt(180.0), huge_pt()).height;
        let card = Card::new(vec![Box::new(para)], Color::WHITE).with_padding(pt(10.0));
        let size = card.wrap(pt(200.0), huge_pt());
        assert!(size.height >= content_height + pt(20.0));
    }

    #[test]
    fn card_respects_min_height() {
        let para = Paragraph::new("x").with_style(TextStyle::sized("Helvetica", 8.0));
        let card = Card::new(vec![Box::new(para)], Color::WHITE)
            .with_padding(pt(4.0))
            .with_min_height(pt(80.0));
        assert_eq!(card.wrap(pt(200.0), huge_pt()).height, pt(80.0));
    }

    #[test]
    fn bullet_list_splits_between_items() {
        let items: Vec<Paragraph> = (0..6)
            .map(|i| {
                Paragraph::new(format!("item {i}")).with_style(TextStyle::sized("Helvetica", 10.0))
            })
            .collect();
        let list = BulletList::new(items);
        let one_item = list.item_heights(pt(300.0))[0];
        let (first, second) = list
            .split(pt(300.0), one_item * 3)
            .expect("list should split");
        let first_height = first.wrap(pt(300.0), huge_pt()).height;
        assert!(first_height <= one_item * 3);
        assert!(second.wrap(pt(300.0), huge_pt()).height > Pt::ZERO);
    }

    #[test]
    fn bullet_list_splits_inside_single_oversized_item() {
        let huge = Paragraph::new("alert ".repeat(3000)).with_style(TextStyle::sized("Helvetica", 10.0));
        let list = BulletList::new(vec![huge]);
        let line_height = Pt::from_f32(12.0);
        let avail = line_height * 10;
        let (first, second) = list
            .split(pt(300.0), avail)
            .expect("oversized item should split inside its lines");
        assert!(first.wrap(pt(300.0), huge_pt()).height <= avail);
        assert!(second.wrap(pt(300.0), huge_pt()).height > Pt::ZERO);
    }

    #[test]
    fn bullet_list_continuation_has_no_leading_marker() {
        use crate::canvas::{Canvas, Command};
        use crate::types::Size;
        let huge = Paragraph::new("alert ".repeat(3000)).with_style(TextStyle::sized("Helvetica", 10.0));
        let list = BulletList::new(vec![huge]);
        let (_, second) = list.split(pt(300.0), Pt::from_f32(120.0)).unwrap();
        let mut canvas = Canvas::new(Size::a4());
        second.draw(&mut canvas, Pt::ZERO, Pt::ZERO, pt(300.0), huge_pt());
        let doc = canvas.finish();
        let markers = doc.pages[0]
            .commands
            .iter()
            .filter(|cmd| matches!(cmd, Command::DrawString { text, .. } if text == "\u{2022}"))
            .count();
        assert_eq!(markers, 0);
    }

    #[test]
    fn balance_bar_splits_width_by_share() {
        use crate::canvas::{Canvas, Command};
        use crate::types::Size;
        let bar = BalanceBar::new(
            25,
            75,
            Color::rgb(0.0, 1.0, 0.0),
            Color::rgb(1.0, 0.0, 0.0),
            Color::rgb(0.9, 0.9, 0.9),
        );
        let mut canvas = Canvas::new(Size::a4());
        bar.draw(&mut canvas, Pt::ZERO, Pt::ZERO, pt(100.0), huge_pt());
        let doc = canvas.finish();
        let widths: Vec<i64> = doc.pages[0]
            .commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::DrawRect { width, .. } => Some(width.to_milli_i64()),
                _ => None,
            })
            .collect();
        assert_eq!(widths, vec![25_000, 75_000]);
    }
}
