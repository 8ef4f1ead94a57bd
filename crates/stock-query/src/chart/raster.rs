//! PNG rasterisation of SVG scenes

use crate::error::{Result, StockQueryError};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use std::sync::{Arc, OnceLock};
use tracing::debug;

static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();

/// System fonts, loaded once per process
///
/// When no face answers to the generic `sans-serif` family, the first
/// available family stands in for it. Without any fonts text is skipped.
fn fonts() -> Arc<fontdb::Database> {
    FONTS
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();

            let query = fontdb::Query {
                families: &[fontdb::Family::SansSerif],
                ..fontdb::Query::default()
            };
            if db.query(&query).is_none() {
                let fallback = db
                    .faces()
                    .find_map(|face| face.families.first().map(|(name, _)| name.clone()));
                if let Some(family) = fallback {
                    db.set_sans_serif_family(family);
                }
            }

            debug!(faces = db.len(), "Loaded fonts for chart rendering");
            Arc::new(db)
        })
        .clone()
}

/// Rasterise an SVG document to PNG bytes at its intrinsic size
pub fn svg_to_png(svg: &str) -> Result<Vec<u8>> {
    let options = usvg::Options {
        fontdb: fonts(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| StockQueryError::Chart(format!("invalid chart scene: {e}")))?;

    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        StockQueryError::Chart(format!(
            "cannot allocate {}x{} canvas",
            size.width(),
            size.height()
        ))
    })?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| StockQueryError::Chart(format!("PNG encoding failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Chart;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    #[test]
    fn test_placeholder_png() {
        let png = svg_to_png(&Chart::placeholder("No data to visualize").to_svg()).unwrap();
        assert_eq!(png[..8], PNG_MAGIC);
        // IHDR width and height
        assert_eq!(u32::from_be_bytes(png[16..20].try_into().unwrap()), 600);
        assert_eq!(u32::from_be_bytes(png[20..24].try_into().unwrap()), 400);
    }

    #[test]
    fn test_invalid_scene() {
        let result = svg_to_png("not svg at all");
        assert!(matches!(result, Err(StockQueryError::Chart(_))));
    }
}
