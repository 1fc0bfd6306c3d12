use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;
use usvg::fontdb;

use crate::error::RasterError;

pub const DEFAULT_SCALE: f32 = 2.0;
/// Largest canvas side in pixels, after scaling.
pub const MAX_CANVAS_SIDE: f32 = 16_384.0;

static FONTS: Lazy<Arc<fontdb::Database>> = Lazy::new(|| {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    debug!(faces = db.len(), "loaded system fonts");
    Arc::new(db)
});

/// Rasterizes `svg` onto a `width` x `height` canvas scaled by `scale`.
///
/// The document is drawn from the top-left corner; anything that does not
/// fit the canvas is clipped.
pub fn rasterize(svg: &str, width: u32, height: u32, scale: f32) -> Result<Vec<u8>, RasterError> {
    let canvas_width = (width as f32 * scale).ceil();
    let canvas_height = (height as f32 * scale).ceil();
    let canvas_error = || RasterError::Canvas { width, height };
    if !scale.is_finite()
        || scale <= 0.0
        || canvas_width < 1.0
        || canvas_height < 1.0
        || canvas_width > MAX_CANVAS_SIDE
        || canvas_height > MAX_CANVAS_SIDE
    {
        return Err(canvas_error());
    }

    let mut opt = usvg::Options::default();
    opt.font_family = "DejaVu Sans Mono".to_string();
    opt.fontdb = Arc::clone(&FONTS);
    if let Some(size) = usvg::Size::from_wh(width as f32, height as f32) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas_width as u32, canvas_height as u32)
        .ok_or_else(canvas_error)?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    pixmap
        .encode_png()
        .map_err(|err| RasterError::Encode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_error;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn png_size(png: &[u8]) -> (u32, u32) {
        let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        (width, height)
    }

    #[test]
    fn canvas_is_scaled() {
        let png = rasterize(&render_error("boom", "dark"), 500, 200, DEFAULT_SCALE).unwrap();
        assert!(png.starts_with(PNG_MAGIC));
        assert_eq!(png_size(&png), (1000, 400));
    }

    #[test]
    fn oversized_documents_are_clipped() {
        let png = rasterize(&render_error("boom", "light"), 300, 100, 1.0).unwrap();
        assert_eq!(png_size(&png), (300, 100));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(rasterize("<svg", 10, 10, 1.0), Err(RasterError::Parse(_))));
        assert!(matches!(
            rasterize(&render_error("x", "dark"), 0, 10, 1.0),
            Err(RasterError::Canvas { .. })
        ));
        assert!(matches!(
            rasterize(&render_error("x", "dark"), 10, 10, f32::NAN),
            Err(RasterError::Canvas { .. })
        ));
        assert!(matches!(
            rasterize(&render_error("x", "dark"), 100_000, 200, DEFAULT_SCALE),
            Err(RasterError::Canvas { .. })
        ));
    }
}
