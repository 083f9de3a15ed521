//! Scene-change variant: a fixed three-shape scene is flashed, then redrawn
//! with one named manipulation applied, and the subject picks which
//! manipulation happened.
//!
//! Geometry is fixed in a 400x140 scene space and scaled onto the canvas, so
//! a changed scene differs from the base scene only by the manipulation
//! itself.

use ab_glyph::FontArc;
use anyhow::Result;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};
use vpm_core::{ChangeKind, Item};

use crate::text::TextPainter;
use crate::{color, OptionRegion, VariantRenderer, CANVAS_BG};

pub const SCENE_W: f32 = 400.0;
pub const SCENE_H: f32 = 140.0;

const SCENE_FG: [u8; 4] = [234, 234, 234, 255]; // #eaeaea
const SCENE_BG: [u8; 4] = [34, 34, 34, 255]; // #222222

// Shape geometry in scene space.
const SQUARE_X: f32 = 40.0;
const SQUARE_Y: f32 = 50.0;
const SQUARE_SIDE: f32 = 40.0;
const CIRCLE_CX: f32 = 180.0;
const CIRCLE_CY: f32 = 70.0;
const CIRCLE_R: f32 = 20.0;
const TRIANGLE: [(f32, f32); 3] = [(280.0, 90.0), (320.0, 30.0), (360.0, 90.0)];
const TRIANGLE_AXIS_X: f32 = 320.0;
const TRIANGLE_PIVOT: (f32, f32) = (320.0, 70.0);

const OPTION_LABEL_SIZE: f32 = 22.0;
const OPTION_BOX_H: f32 = 56.0;
const OPTION_GAP: f32 = 16.0;
const OPTION_MARGIN: f32 = 40.0;
const OPTION_BOX_BG: [u8; 4] = [45, 45, 45, 255];

/// Option labels shown to the subject. Unrecognized change names fall back
/// to their raw wire form.
pub fn change_label(change: &ChangeKind) -> &str {
    match change {
        ChangeKind::None => "Sin cambios",
        ChangeKind::RemoveDot => "Quitar círculo",
        ChangeKind::SwapColors => "Intercambiar colores",
        ChangeKind::MirrorLeft => "Espejo horizontal",
        ChangeKind::RemoveSegment => "Quitar triángulo",
        ChangeKind::RemoveSmallShape => "Quitar cuadrado",
        ChangeKind::Rotate15 => "Rotar 15°",
        ChangeKind::Other(name) => name,
    }
}

/// The manipulation shown in the changed scene: the change named by the
/// item's correct option. A missing or out-of-range `correct_index` renders
/// as no change.
pub fn shown_change(item: &Item) -> ChangeKind {
    match item.correct_index {
        Some(ci) if ci < item.options.len() => item.options[ci].change(),
        _ => ChangeKind::None,
    }
}

/// Paints the scene with `change` applied. `at` maps scene space onto the
/// canvas; pass identity to draw at native scale.
pub fn draw_scene(canvas: &mut Pixmap, at: Transform, change: &ChangeKind) {
    let (fg, bg) = match change {
        ChangeKind::SwapColors => (color(SCENE_BG), color(SCENE_FG)),
        _ => (color(SCENE_FG), color(SCENE_BG)),
    };

    let mut paint = Paint::default();
    paint.anti_alias = true;

    paint.set_color(bg);
    let backdrop = Rect::from_xywh(0.0, 0.0, SCENE_W, SCENE_H).unwrap();
    canvas.fill_rect(backdrop, &paint, at, None);

    paint.set_color(fg);
    if *change != ChangeKind::RemoveSmallShape {
        let square = Rect::from_xywh(SQUARE_X, SQUARE_Y, SQUARE_SIDE, SQUARE_SIDE).unwrap();
        canvas.fill_rect(square, &paint, at, None);
    }
    if *change != ChangeKind::RemoveDot {
        let mut pb = PathBuilder::new();
        pb.push_circle(CIRCLE_CX, CIRCLE_CY, CIRCLE_R);
        let circle = pb.finish().unwrap();
        canvas.fill_path(&circle, &paint, FillRule::Winding, at, None);
    }
    if *change != ChangeKind::RemoveSegment {
        let mut pb = PathBuilder::new();
        pb.move_to(TRIANGLE[0].0, TRIANGLE[0].1);
        pb.line_to(TRIANGLE[1].0, TRIANGLE[1].1);
        pb.line_to(TRIANGLE[2].0, TRIANGLE[2].1);
        pb.close();
        let triangle = pb.finish().unwrap();
        let local = triangle_transform(change);
        canvas.fill_path(&triangle, &paint, FillRule::Winding, at.pre_concat(local), None);
    }
}

/// Scene-space transform applied to the triangle alone.
fn triangle_transform(change: &ChangeKind) -> Transform {
    match change {
        ChangeKind::MirrorLeft => {
            Transform::from_scale(-1.0, 1.0).post_translate(2.0 * TRIANGLE_AXIS_X, 0.0)
        }
        ChangeKind::Rotate15 => {
            Transform::from_rotate_at(15.0, TRIANGLE_PIVOT.0, TRIANGLE_PIVOT.1)
        }
        _ => Transform::identity(),
    }
}

/// Scene viewport: scaled to the upper canvas, horizontally centered.
fn scene_placement(canvas: &Pixmap) -> Transform {
    let w = canvas.width() as f32;
    let h = canvas.height() as f32;
    let scale = (w * 0.75 / SCENE_W).min(h * 0.45 / SCENE_H).max(0.1);
    let dx = (w - SCENE_W * scale) / 2.0;
    let dy = h * 0.08;
    Transform::from_scale(scale, scale).post_translate(dx, dy)
}

pub struct SceneRenderer {
    painter: TextPainter,
}

impl SceneRenderer {
    pub fn new(font: FontArc) -> Self {
        Self {
            painter: TextPainter::new(font),
        }
    }

    fn option_boxes(canvas: &Pixmap, count: usize) -> Vec<OptionRegion> {
        if count == 0 {
            return Vec::new();
        }
        let w = canvas.width() as f32;
        let h = canvas.height() as f32;
        let scale = (w * 0.75 / SCENE_W).min(h * 0.45 / SCENE_H).max(0.1);
        let top = h * 0.08 + SCENE_H * scale + 40.0;
        let gaps = OPTION_GAP * (count as f32 - 1.0);
        let box_w = ((w - 2.0 * OPTION_MARGIN - gaps) / count as f32).max(10.0);
        (0..count)
            .map(|index| OptionRegion {
                index,
                x: OPTION_MARGIN + index as f32 * (box_w + OPTION_GAP),
                y: top,
                w: box_w,
                h: OPTION_BOX_H,
            })
            .collect()
    }
}

impl VariantRenderer for SceneRenderer {
    fn present_stimulus(&mut self, canvas: &mut Pixmap, _item: &Item) -> Result<()> {
        canvas.fill(CANVAS_BG);
        draw_scene(canvas, scene_placement(canvas), &ChangeKind::None);
        Ok(())
    }

    fn present_options(&mut self, canvas: &mut Pixmap, item: &Item) -> Result<Vec<OptionRegion>> {
        canvas.fill(CANVAS_BG);
        draw_scene(canvas, scene_placement(canvas), &shown_change(item));

        let regions = Self::option_boxes(canvas, item.options.len());
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color(color(OPTION_BOX_BG));
        for (region, opt) in regions.iter().zip(&item.options) {
            if let Some(rect) = Rect::from_xywh(region.x, region.y, region.w, region.h) {
                canvas.fill_rect(rect, &paint, Transform::identity(), None);
            }
            let change = opt.change();
            let baseline = region.y + region.h / 2.0 + OPTION_LABEL_SIZE * 0.35;
            self.painter.draw_centered(
                canvas,
                change_label(&change),
                region.x + region.w / 2.0,
                baseline,
                OPTION_LABEL_SIZE,
                color(SCENE_FG),
            );
        }
        Ok(regions)
    }

    fn clear(&mut self, canvas: &mut Pixmap) {
        canvas.fill(CANVAS_BG);
    }
}
