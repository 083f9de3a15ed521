pub mod chrome;
pub mod font;
pub mod scene;
pub mod symbol;
mod text;

pub use chrome::Hud;
pub use scene::SceneRenderer;
pub use symbol::SymbolRenderer;

use anyhow::Result;
use tiny_skia::{Color, Pixmap};
use vpm_core::Item;

pub(crate) const CANVAS_BG: Color = Color::BLACK;

pub(crate) fn color(c: [u8; 4]) -> Color {
    Color::from_rgba8(c[0], c[1], c[2], c[3])
}

/// Canvas-space rectangle of one rendered answer option, handed back so the
/// host can hit-test pointer clicks against what is actually on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionRegion {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl OptionRegion {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }
}

/// One perceptual-memory variant's drawing behavior.
///
/// All three calls repaint the full canvas from the item alone, so repeating
/// a call yields identical pixels and a resize only needs a repaint.
pub trait VariantRenderer {
    /// Paints the flashed stimulus.
    fn present_stimulus(&mut self, canvas: &mut Pixmap, item: &Item) -> Result<()>;

    /// Paints the post-flash screen: mask or changed scene plus the option
    /// set. Returns the clickable region per option, in canvas pixels.
    fn present_options(&mut self, canvas: &mut Pixmap, item: &Item) -> Result<Vec<OptionRegion>>;

    /// Removes all trial content.
    fn clear(&mut self, canvas: &mut Pixmap);
}
