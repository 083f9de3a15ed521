//! Status line, progress counter and end-of-session summary. Drawn over
//! whatever the active variant painted, in a fixed corner layout.

use ab_glyph::FontArc;
use tiny_skia::{Color, Pixmap};

use crate::color;
use crate::text::TextPainter;

const STATUS_SIZE: f32 = 20.0;
const PROGRESS_SIZE: f32 = 14.0;
const SUMMARY_TITLE_SIZE: f32 = 28.0;
const SUMMARY_LINE_SIZE: f32 = 18.0;

const STATUS_FG: [u8; 4] = [234, 234, 234, 255];
const PROGRESS_FG: [u8; 4] = [150, 150, 150, 255];
const SUMMARY_FG: [u8; 4] = [200, 200, 200, 255];

pub struct Hud {
    painter: TextPainter,
}

impl Hud {
    pub fn new(font: FontArc) -> Self {
        Self {
            painter: TextPainter::new(font),
        }
    }

    /// Status text, bottom center. Empty text draws nothing.
    pub fn draw_status(&mut self, canvas: &mut Pixmap, status: &str) {
        if status.is_empty() {
            return;
        }
        let cx = canvas.width() as f32 / 2.0;
        let baseline = canvas.height() as f32 - 36.0;
        self.painter
            .draw_centered(canvas, status, cx, baseline, STATUS_SIZE, color(STATUS_FG));
    }

    /// Trial counter, top left.
    pub fn draw_progress(&mut self, canvas: &mut Pixmap, current: usize, total: usize) {
        let text = format!("Ítem {current}/{total}");
        self.painter
            .draw(canvas, &text, 24.0, 30.0, PROGRESS_SIZE, color(PROGRESS_FG));
    }

    /// End-of-session screen: a title plus centered detail lines.
    pub fn draw_summary(&mut self, canvas: &mut Pixmap, title: &str, lines: &[String]) {
        let cx = canvas.width() as f32 / 2.0;
        let cy = canvas.height() as f32 / 2.0;
        self.painter
            .draw_centered(canvas, title, cx, cy - 80.0, SUMMARY_TITLE_SIZE, Color::WHITE);
        for (i, line) in lines.iter().enumerate() {
            self.painter.draw_centered(
                canvas,
                line,
                cx,
                cy - 20.0 + i as f32 * 30.0,
                SUMMARY_LINE_SIZE,
                color(SUMMARY_FG),
            );
        }
    }
}
