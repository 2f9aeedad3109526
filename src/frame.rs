use crate::canvas::Canvas;
use crate::flowable::{BreakInside, Flowable};
use crate::types::{Pt, Rect};

/// Outcome of offering a flowable to a frame.
pub enum AddResult {
    /// The whole flowable was drawn into this frame.
    Placed,
    /// The leading part was drawn; the remainder must go to a fresh frame.
    Split(Box<dyn Flowable>),
    /// Nothing was drawn; the flowable must be retried on a fresh frame.
    Overflow(Box<dyn Flowable>),
}

/// One content region of a page with a downward-moving cursor. Placement is
/// measure-then-commit: `wrap` decides, `draw` paints exactly the measured
/// box, and the cursor advances by the measured height.
pub struct Frame {
    rect: Rect,
    cursor_y: Pt,
}

impl Frame {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            cursor_y: rect.y,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn remaining_height(&self) -> Pt {
        (self.rect.bottom() - self.cursor_y).max(Pt::ZERO)
    }

    pub fn cursor_y(&self) -> Pt {
        self.cursor_y
    }

    /// True until the first flowable is committed. An empty frame is the
    /// deadlock backstop: content too tall for it is drawn overfull rather
    /// than bounced forever between pages.
    pub fn is_empty(&self) -> bool {
        self.cursor_y == self.rect.y
    }

    pub fn add(&mut self, flowable: Box<dyn Flowable>, canvas: &mut Canvas) -> AddResult {
        let avail_width = self.rect.width;
        let avail_height = self.remaining_height();
        let size = flowable.wrap(avail_width, avail_height);

        if size.height <= avail_height {
            self.commit(&*flowable, canvas, size.height, avail_width);
            return AddResult::Placed;
        }

        let keep_together = flowable.pagination().break_inside == BreakInside::Avoid;
        if !keep_together {
            if let Some((first, rest)) = flowable.split(avail_width, avail_height) {
                let first_size = first.wrap(avail_width, avail_height);
                if first_size.height <= avail_height {
                    self.commit(&*first, canvas, first_size.height, avail_width);
                    return AddResult::Split(rest);
                }
            }
        }

        if self.is_empty() {
            // Taller than a whole empty frame and unsplittable: draw overfull
            // so the build loop always terminates.
            self.commit(&*flowable, canvas, avail_height, avail_width);
            return AddResult::Placed;
        }

        AddResult::Overflow(flowable)
    }

    fn commit(&mut self, flowable: &dyn Flowable, canvas: &mut Canvas, height: Pt, width: Pt) {
        flowable.draw(
            canvas,
            self.rect.x,
            self.cursor_y,
            width,
            self.remaining_height(),
        );
        canvas.record_flowable_bounds(Rect {
            x: self.rect.x,
            y: self.cursor_y,
            width,
            height,
        });
        self.cursor_y += height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BBOX_META_KEY, Command};
    use crate::flowable::{Paragraph, Spacer, TextStyle};
    use crate::types::Size;

    fn frame_rect(height: f32) -> Rect {
        Rect {
            x: Pt::from_f32(40.0),
            y: Pt::from_f32(60.0),
            width: Pt::from_f32(300.0),
            height: Pt::from_f32(height),
        }
    }

    #[test]
    fn placed_advances_cursor_by_measured_height() {
        let mut frame = Frame::new(frame_rect(500.0));
        let mut canvas = Canvas::new(Size::a4());
        match frame.add(Box::new(Spacer::new(25.0)), &mut canvas) {
            AddResult::Placed => {}
            _ => panic!("spacer should fit"),
        }
        assert_eq!(frame.cursor_y(), Pt::from_f32(85.0));
        assert!(!frame.is_empty());
    }

    #[test]
    fn splittable_content_is_split_at_frame_bottom() {
        let para = Paragraph::new((0..10).map(|i| format!("l{i}")).collect::<Vec<_>>().join("\n"))
            .with_style(TextStyle::sized("Helvetica", 10.0));
        let line_height = para.effective_line_height();
        let rect = Rect {
            height: line_height * 4,
            ..frame_rect(0.0)
        };
        let mut frame = Frame::new(rect);
        let mut canvas = Canvas::new(Size::a4());
        let rest = match frame.add(Box::new(para), &mut canvas) {
            AddResult::Split(rest) => rest,
            _ => panic!("paragraph should split"),
        };
        assert_eq!(frame.remaining_height(), Pt::ZERO);
        let rest_size = rest.wrap(Pt::from_f32(300.0), Pt::from_f32(10_000.0));
        assert_eq!(rest_size.height, line_height * 6);
    }

    #[test]
    fn unsplittable_overflow_moves_to_next_frame() {
        let mut frame = Frame::new(frame_rect(100.0));
        let mut canvas = Canvas::new(Size::a4());
        match frame.add(Box::new(Spacer::new(30.0)), &mut canvas) {
            AddResult::Placed => {}
            _ => panic!("first spacer should fit"),
        }
        match frame.add(Box::new(Spacer::new(90.0)), &mut canvas) {
            AddResult::Overflow(_) => {}
            _ => panic!("second spacer should overflow"),
        }
        // Cursor untouched by the overflow attempt.
        assert_eq!(frame.cursor_y(), Pt::from_f32(90.0));
    }

    #[test]
    fn oversized_content_on_empty_frame_is_drawn_overfull() {
        let mut frame = Frame::new(frame_rect(50.0));
        let mut canvas = Canvas::new(Size::a4());
        match frame.add(Box::new(Spacer::new(400.0)), &mut canvas) {
            AddResult::Placed => {}
            _ => panic!("empty-frame fallback should place"),
        }
        assert_eq!(frame.remaining_height(), Pt::ZERO);
    }

    #[test]
    fn placement_records_bounds_meta() {
        let mut frame = Frame::new(frame_rect(500.0));
        let mut canvas = Canvas::new(Size::a4());
        frame.add(Box::new(Spacer::new(25.0)), &mut canvas);
        let doc = canvas.finish();
        let bbox = doc.pages[0].commands.iter().find_map(|cmd| match cmd {
            Command::Meta { key, value } if key == BBOX_META_KEY => Some(value.clone()),
            _ => None,
        });
        assert_eq!(bbox.as_deref(), Some("40000,60000,300000,25000"));
    }
}
