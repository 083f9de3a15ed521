//! Symbol-flash variant: a short symbol string is flashed, replaced by an
//! occluding mask, and the subject picks the ordering they saw.

use ab_glyph::FontArc;
use anyhow::Result;
use tiny_skia::{Paint, Pixmap, Rect, Transform};
use vpm_core::Item;

use crate::text::TextPainter;
use crate::{color, OptionRegion, VariantRenderer, CANVAS_BG};

const STIMULUS_SIZE: f32 = 64.0;
const OPTION_LABEL_SIZE: f32 = 24.0;
const OPTION_BOX_H: f32 = 48.0;
const OPTION_GAP: f32 = 14.0;
const MASK_H: f32 = 90.0;

const TEXT_FG: [u8; 4] = [234, 234, 234, 255];
const MASK_FILL: [u8; 4] = [60, 60, 60, 255];
const OPTION_BOX_BG: [u8; 4] = [45, 45, 45, 255];

pub struct SymbolRenderer {
    painter: TextPainter,
}

impl SymbolRenderer {
    pub fn new(font: FontArc) -> Self {
        Self {
            painter: TextPainter::new(font),
        }
    }

    /// Vertical center of the flash/mask band.
    fn stimulus_cy(canvas: &Pixmap) -> f32 {
        canvas.height() as f32 * 0.3
    }

    fn option_boxes(canvas: &Pixmap, count: usize) -> Vec<OptionRegion> {
        let w = canvas.width() as f32;
        let h = canvas.height() as f32;
        let box_w = (w * 0.5).max(10.0);
        let x = (w - box_w) / 2.0;
        let top = h * 0.5;
        (0..count)
            .map(|index| OptionRegion {
                index,
                x,
                y: top + index as f32 * (OPTION_BOX_H + OPTION_GAP),
                w: box_w,
                h: OPTION_BOX_H,
            })
            .collect()
    }
}

impl VariantRenderer for SymbolRenderer {
    fn present_stimulus(&mut self, canvas: &mut Pixmap, item: &Item) -> Result<()> {
        canvas.fill(CANVAS_BG);
        let text = item.stimulus.symbols().join(" ");
        let cx = canvas.width() as f32 / 2.0;
        let baseline = Self::stimulus_cy(canvas) + STIMULUS_SIZE * 0.35;
        self.painter
            .draw_centered(canvas, &text, cx, baseline, STIMULUS_SIZE, color(TEXT_FG));
        Ok(())
    }

    fn present_options(&mut self, canvas: &mut Pixmap, item: &Item) -> Result<Vec<OptionRegion>> {
        canvas.fill(CANVAS_BG);

        // Occluder where the stimulus was.
        let w = canvas.width() as f32;
        let mask_w = w * 0.6;
        let mask_y = Self::stimulus_cy(canvas) - MASK_H / 2.0;
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color(color(MASK_FILL));
        if let Some(rect) = Rect::from_xywh((w - mask_w) / 2.0, mask_y, mask_w, MASK_H) {
            canvas.fill_rect(rect, &paint, Transform::identity(), None);
        }

        let regions = Self::option_boxes(canvas, item.options.len());
        paint.set_color(color(OPTION_BOX_BG));
        for (region, opt) in regions.iter().zip(&item.options) {
            if let Some(rect) = Rect::from_xywh(region.x, region.y, region.w, region.h) {
                canvas.fill_rect(rect, &paint, Transform::identity(), None);
            }
            let label = opt.symbols().join(" ");
            let baseline = region.y + region.h / 2.0 + OPTION_LABEL_SIZE * 0.35;
            self.painter.draw_centered(
                canvas,
                &label,
                region.x + region.w / 2.0,
                baseline,
                OPTION_LABEL_SIZE,
                color(TEXT_FG),
            );
        }
        Ok(regions)
    }

    fn clear(&mut self, canvas: &mut Pixmap) {
        canvas.fill(CANVAS_BG);
    }
}
