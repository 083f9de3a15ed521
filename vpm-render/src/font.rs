use std::path::Path;

use ab_glyph::FontArc;
use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

/// Faces tried in order when no font is configured. DejaVu Sans is what the
/// stimuli were designed against; the rest cover the glyphs we actually draw
/// (Latin, digits, a handful of Greek and math symbols).
const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\DejaVuSans.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Loads the face for all on-screen text: the explicit path if given,
/// otherwise the first present search-path entry.
pub fn load_font(explicit: Option<&Path>) -> Result<FontArc> {
    if let Some(path) = explicit {
        return read_font(path).with_context(|| format!("loading font {}", path.display()));
    }
    if let Some(font) = system_font() {
        return Ok(font);
    }
    bail!("no usable font found in the standard locations; pass --font <path>")
}

/// First loadable face from the search paths, if any. Tests use this to skip
/// text assertions on hosts without fonts.
pub fn system_font() -> Option<FontArc> {
    for candidate in FONT_SEARCH_PATHS {
        let path = Path::new(candidate);
        if !path.is_file() {
            continue;
        }
        match read_font(path) {
            Ok(font) => {
                debug!(path = candidate, "loaded font");
                return Some(font);
            }
            Err(err) => warn!(path = candidate, error = %err, "skipping unreadable font"),
        }
    }
    None
}

fn read_font(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path)?;
    Ok(FontArc::try_from_vec(bytes)?)
}
