use std::collections::HashMap;

use ab_glyph::{point, Font, FontArc, Glyph, GlyphId, PxScale, ScaleFont};
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};

/// Rasterizes text straight into a pixmap, caching glyph coverage bitmaps
/// per (glyph, size) so steady-state frames only blit.
pub(crate) struct TextPainter {
    font: FontArc,
    cache: HashMap<GlyphCacheKey, CachedGlyph>,
}

#[derive(Clone)]
struct CachedGlyph {
    bitmap: Vec<u8>,
    width: u32,
    height: u32,
    bearing_x: i32,
    bearing_y: i32,
}

#[derive(Hash, Eq, PartialEq, Clone, Copy)]
struct GlyphCacheKey {
    glyph_id: u16,
    scale_bits: u32, // f32 bits for exact scale matching
}

impl TextPainter {
    pub fn new(font: FontArc) -> Self {
        Self {
            font,
            cache: HashMap::with_capacity(256),
        }
    }

    /// Advance width of `text` at `size` px.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        let scaled_font = self.font.as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut prev: Option<GlyphId> = None;
        for ch in text.chars() {
            let gid = self.font.glyph_id(ch);
            if let Some(prev_gid) = prev {
                width += scaled_font.kern(prev_gid, gid);
            }
            width += scaled_font.h_advance(gid);
            prev = Some(gid);
        }
        width
    }

    /// Draws `text` with its horizontal midpoint at `cx`.
    pub fn draw_centered(
        &mut self,
        pixmap: &mut Pixmap,
        text: &str,
        cx: f32,
        baseline_y: f32,
        size: f32,
        color: Color,
    ) {
        let x = cx - self.measure(text, size) / 2.0;
        self.draw(pixmap, text, x, baseline_y, size, color);
    }

    /// Draws `text` left-aligned at `x`, baseline at `baseline_y`.
    pub fn draw(
        &mut self,
        pixmap: &mut Pixmap,
        text: &str,
        x: f32,
        baseline_y: f32,
        size: f32,
        color: Color,
    ) {
        let w = pixmap.width();
        let h = pixmap.height();
        let cu8 = color.to_color_u8();
        let (cr, cg, cb, ca) = (cu8.red(), cu8.green(), cu8.blue(), cu8.alpha());

        let scale = PxScale::from(size);

        // Stage 1: layout and find cache misses in a limited scope
        let (glyphs_to_draw, misses) = {
            let scaled_font = self.font.as_scaled(scale);
            let mut pen_x = x;
            let mut prev = None;
            let mut glyphs = Vec::with_capacity(text.len());
            let mut misses: Vec<(GlyphId, PxScale, GlyphCacheKey)> = Vec::new();

            for ch in text.chars() {
                let gid = self.font.glyph_id(ch);
                if let Some(prev_gid) = prev {
                    pen_x += scaled_font.kern(prev_gid, gid);
                }
                let glyph = Glyph {
                    id: gid,
                    scale,
                    position: point(pen_x, baseline_y),
                };

                let key = GlyphCacheKey {
                    glyph_id: gid.0,
                    scale_bits: size.to_bits(),
                };
                if !self.cache.contains_key(&key) {
                    misses.push((gid, scale, key));
                }
                glyphs.push((glyph, key));
                pen_x += scaled_font.h_advance(gid);

                prev = Some(gid);
            }

            (glyphs, misses)
        };

        // Stage 2: rasterize misses (now we can mutably borrow the cache)
        if !misses.is_empty() {
            let scaled_font = self.font.as_scaled(scale);
            for (gid, sc, key) in misses {
                let g = Glyph {
                    id: gid,
                    scale: sc,
                    position: point(0.0, 0.0),
                };
                Self::cache_glyph(&mut self.cache, scaled_font, g, key);
            }
        }

        // Stage 3: blit cached glyphs
        let pixels = pixmap.pixels_mut();
        for (glyph, key) in glyphs_to_draw {
            if let Some(cached) = self.cache.get(&key) {
                blit_glyph(pixels, w, h, &glyph, cached, cr, cg, cb, ca);
            }
        }
    }

    fn cache_glyph(
        cache: &mut HashMap<GlyphCacheKey, CachedGlyph>,
        scaled_font: ab_glyph::PxScaleFont<&FontArc>,
        glyph: Glyph,
        key: GlyphCacheKey,
    ) {
        if let Some(outlined) = scaled_font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            let w = bounds.width().ceil() as u32;
            let h = bounds.height().ceil() as u32;
            if w == 0 || h == 0 {
                return;
            }
            let mut bitmap = vec![0u8; (w * h) as usize];
            outlined.draw(|x, y, cov| {
                bitmap[(y * w + x) as usize] = (cov * 255.0) as u8;
            });
            cache.insert(
                key,
                CachedGlyph {
                    bitmap,
                    width: w,
                    height: h,
                    bearing_x: bounds.min.x.floor() as i32,
                    bearing_y: bounds.min.y.floor() as i32,
                },
            );
        }
    }
}

#[inline]
#[allow(clippy::too_many_arguments)]
fn blit_glyph(
    pixels: &mut [PremultipliedColorU8],
    w: u32,
    h: u32,
    glyph: &Glyph,
    cached: &CachedGlyph,
    cr: u8,
    cg: u8,
    cb: u8,
    ca: u8,
) {
    let glyph_x = glyph.position.x as i32 + cached.bearing_x;
    let glyph_y = glyph.position.y as i32 + cached.bearing_y;

    let wi = w as i32;
    let hi = h as i32;

    let cr_f = cr as f32 / 255.0;
    let cg_f = cg as f32 / 255.0;
    let cb_f = cb as f32 / 255.0;
    let ca_f = ca as f32 / 255.0;

    for gy in 0..cached.height as i32 {
        let py = glyph_y + gy;
        if py < 0 || py >= hi {
            continue;
        }

        let src_row_start = (gy as u32 * cached.width) as usize;
        let dst_row_start = (py as u32 * w) as usize;

        for gx in 0..cached.width as i32 {
            let px = glyph_x + gx;
            if px < 0 || px >= wi {
                continue;
            }

            let coverage = cached.bitmap[src_row_start + gx as usize];
            if coverage == 0 {
                continue;
            }

            let coverage_f = (coverage as f32) / 255.0;
            let alpha = ca_f * coverage_f;

            if alpha >= 0.999 {
                // Opaque fast path
                pixels[dst_row_start + px as usize] =
                    PremultipliedColorU8::from_rgba(cr, cg, cb, 255).unwrap();
            } else {
                // Premultiplied over-blend
                let dst_idx = dst_row_start + px as usize;
                let dst = &pixels[dst_idx];

                let src_r = (cr_f * alpha * 255.0) as u8;
                let src_g = (cg_f * alpha * 255.0) as u8;
                let src_b = (cb_f * alpha * 255.0) as u8;
                let src_a = (alpha * 255.0) as u8;

                let inv = 1.0 - alpha;
                let out_r = ((src_r as f32) + (dst.red() as f32) * inv) as u8;
                let out_g = ((src_g as f32) + (dst.green() as f32) * inv) as u8;
                let out_b = ((src_b as f32) + (dst.blue() as f32) * inv) as u8;
                let out_a = src_a.max(dst.alpha());

                pixels[dst_idx] = PremultipliedColorU8::from_rgba(
                    out_r.min(out_a),
                    out_g.min(out_a),
                    out_b.min(out_a),
                    out_a,
                )
                .unwrap();
            }
        }
    }
}
