//! Sketch export to encoded images and data URIs.
//!
//! The rendered surface is handed to the image-transformation collaborator
//! as a `data:image/png;base64,...` URI, optionally together with a mask
//! marking the inked area.

use base64::Engine;
use serde::{Deserialize, Serialize};
use sketch_core::{
    render, Color, DrawingSurface, LineCap, LineJoin, PathStyle, SketchError, StrokeStore,
};
use tiny_skia::{Pixmap, PixmapPaint, Transform};

use crate::backend::RasterSurface;
use crate::error::{RenderError, RenderResult};

/// Export output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image (keeps transparency unless a background is set).
    #[default]
    Png,
    /// JPEG image, always flattened onto the background.
    Jpeg,
}

impl ExportFormat {
    /// MIME type of the encoded bytes.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Configuration for sketch export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Colour painted under the ink. `None` keeps PNG output transparent.
    pub background: Option<Color>,
    /// JPEG quality 1-100 (default: 85).
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            background: None,
            jpeg_quality: 85,
        }
    }
}

/// Encodes raster surfaces.
#[derive(Debug, Clone, Default)]
pub struct SketchExporter {
    config: ExportConfig,
}

impl SketchExporter {
    /// Create an exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Encode the pixmap in `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the format is not compiled in.
    pub fn export(&self, pixmap: &Pixmap, format: ExportFormat) -> RenderResult<Vec<u8>> {
        match format {
            ExportFormat::Png => self.render_to_png(pixmap),
            ExportFormat::Jpeg => self.render_to_jpeg(pixmap),
        }
    }

    /// Encode as a data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn export_data_url(&self, pixmap: &Pixmap, format: ExportFormat) -> RenderResult<String> {
        let bytes = self.export(pixmap, format)?;
        Ok(data_url(&bytes, format))
    }

    /// Encode as PNG, flattened onto the background when one is set.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn render_to_png(&self, pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
        let encoded = match self.config.background {
            Some(bg) => flatten(pixmap, bg)?.encode_png(),
            None => pixmap.encode_png(),
        };
        encoded.map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Encode as JPEG over the background (white when unset).
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    #[cfg(feature = "jpeg")]
    pub fn render_to_jpeg(&self, pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
        use image::ImageEncoder;

        // JPEG has no alpha; a translucent background is made opaque so the
        // flattened premultiplied bytes equal straight RGB.
        let bg = self.config.background.unwrap_or(Color::WHITE);
        let flat = flatten(pixmap, Color { a: 255, ..bg })?;

        let rgb: Vec<u8> = flat
            .data()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality);
        encoder
            .write_image(&rgb, flat.width(), flat.height(), image::ColorType::Rgb8.into())
            .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }

    /// Encode as JPEG over the background (white when unset).
    ///
    /// # Errors
    ///
    /// Always fails: JPEG support is not compiled in.
    #[cfg(not(feature = "jpeg"))]
    pub fn render_to_jpeg(&self, _pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
        Err(RenderError::Unsupported(
            "JPEG export requires the `jpeg` feature".to_string(),
        ))
    }
}

/// Wrap encoded bytes in a base64 data URI.
#[must_use]
pub fn data_url(bytes: &[u8], format: ExportFormat) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{encoded}", format.mime_type())
}

/// Composite `pixmap` over a background colour.
fn flatten(pixmap: &Pixmap, background: Color) -> RenderResult<Pixmap> {
    let mut flat = Pixmap::new(pixmap.width(), pixmap.height())
        .ok_or_else(|| RenderError::Surface("Failed to create pixmap".to_string()))?;
    flat.fill(tiny_skia::Color::from_rgba8(
        background.r,
        background.g,
        background.b,
        background.a,
    ));
    flat.draw_pixmap(
        0,
        0,
        pixmap.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    Ok(flat)
}

/// Renders an edit mask: opaque white over the ink, transparent elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct MaskRenderer {
    margin: f32,
}

impl Default for MaskRenderer {
    fn default() -> Self {
        Self {
            margin: sketch_core::DEFAULT_MASK_MARGIN,
        }
    }
}

impl MaskRenderer {
    /// Create a mask renderer with the given dilation margin.
    #[must_use]
    pub fn new(margin: f32) -> Self {
        Self {
            margin: margin.max(0.0),
        }
    }

    /// Extra logical pixels of coverage on each side of every stroke.
    #[must_use]
    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Render the mask for `store` onto a `backing` sized pixmap scaled by
    /// `device_ratio`, so it lines up with the image rendered at that size.
    ///
    /// # Errors
    ///
    /// Returns an error if the mask pixmap cannot be allocated.
    pub fn render(
        &self,
        store: &StrokeStore,
        backing: (u32, u32),
        device_ratio: f32,
    ) -> RenderResult<Pixmap> {
        let (width, height) = backing;
        let mut mask = RasterSurface::new(0.0, 0.0, device_ratio)?;
        mask.set_backing_size(width, height)
            .map_err(|e: SketchError| RenderError::Surface(e.to_string()))?;
        mask.set_scale(device_ratio);
        mask.clear();

        for stroke in store.strokes() {
            let style = PathStyle {
                width: stroke.width + 2.0 * self.margin,
                color: Color::WHITE,
                cap: LineCap::Round,
                join: LineJoin::Round,
            };
            render::render_stroke_with(&mut mask, stroke, &style);
        }

        tracing::debug!(
            strokes = store.len(),
            margin = self.margin,
            "Mask rendered at {}x{}",
            width,
            height
        );
        Ok(mask.pixmap().clone())
    }

    /// Render the mask and encode it as a PNG data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn render_data_url(
        &self,
        store: &StrokeStore,
        backing: (u32, u32),
        device_ratio: f32,
    ) -> RenderResult<String> {
        let pixmap = self.render(store, backing, device_ratio)?;
        SketchExporter::with_defaults().export_data_url(&pixmap, ExportFormat::Png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketch_core::{PenConfig, PointerEvent, PointerEventKind, SketchConfig, SketchSession};

    fn sketch() -> SketchSession<RasterSurface> {
        let surface = RasterSurface::new(60.0, 40.0, 1.0).expect("surface");
        let mut session = SketchSession::new(surface, SketchConfig::default()).expect("session");
        let pen = PenConfig::new(6.0, Color::rgb(255, 0, 0)).expect("pen");
        session.set_pen(pen).expect("set pen");
        session
            .handle_pointer(&PointerEvent::new(PointerEventKind::Down, 10.0, 20.0, 0.0))
            .expect("down");
        session
            .handle_pointer(&PointerEvent::new(PointerEventKind::Up, 10.0, 20.0, 1.0))
            .expect("up");
        session
    }

    #[test]
    fn test_png_export_has_magic_bytes() {
        let session = sketch();
        let png = SketchExporter::with_defaults()
            .export(session.surface().pixmap(), ExportFormat::Png)
            .expect("png");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }

    #[test]
    fn test_jpeg_export_has_magic_bytes() {
        let session = sketch();
        let jpeg = SketchExporter::with_defaults()
            .export(session.surface().pixmap(), ExportFormat::Jpeg)
            .expect("jpeg");
        assert_eq!(jpeg[0], 0xFF);
        assert_eq!(jpeg[1], 0xD8);
    }

    #[test]
    fn test_jpeg_translucent_background_is_made_opaque() {
        let blank = Pixmap::new(8, 8).expect("pixmap");
        let exporter = SketchExporter::new(ExportConfig {
            background: Some(Color::rgba(255, 255, 255, 128)),
            ..ExportConfig::default()
        });
        let jpeg = exporter.render_to_jpeg(&blank).expect("jpeg");
        let decoded = image::load_from_memory(&jpeg).expect("decode").to_rgb8();
        assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| c > 250)));
    }

    #[test]
    fn test_negative_margin_is_clamped() {
        assert!(MaskRenderer::new(-5.0).margin().abs() < f32::EPSILON);
        let default_margin = MaskRenderer::default().margin();
        assert!((default_margin - sketch_core::DEFAULT_MASK_MARGIN).abs() < f32::EPSILON);
    }

    #[test]
    fn test_data_url_prefix_matches_format() {
        assert!(data_url(b"abc", ExportFormat::Png).starts_with("data:image/png;base64,"));
        assert_eq!(data_url(b"abc", ExportFormat::Jpeg), "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn test_background_flattens_transparency() {
        let session = sketch();
        let exporter = SketchExporter::new(ExportConfig {
            background: Some(Color::WHITE),
            ..ExportConfig::default()
        });
        let png = exporter
            .render_to_png(session.surface().pixmap())
            .expect("png");
        let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(decoded.get_pixel(50, 5).0, [255, 255, 255, 255]);
        assert_eq!(decoded.get_pixel(10, 20).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_mask_covers_ink_with_margin() {
        let session = sketch();
        let mask = MaskRenderer::new(4.0)
            .render(session.store(), session.controller().backing_size(), 1.0)
            .expect("mask");
        assert_eq!(mask.width(), session.surface().width());

        let alpha = |x, y| mask.pixel(x, y).map_or(0, |p| p.alpha());
        assert_eq!(alpha(10, 20), 255);
        // Dot radius 3 + margin 4.
        assert_eq!(alpha(15, 20), 255);
        assert_eq!(alpha(30, 20), 0);
    }

    #[test]
    fn test_empty_store_gives_transparent_mask() {
        let surface = RasterSurface::new(20.0, 20.0, 2.0).expect("surface");
        let session = SketchSession::new(surface, SketchConfig::default()).expect("session");
        let mask = MaskRenderer::default()
            .render(session.store(), session.controller().backing_size(), 2.0)
            .expect("mask");
        assert_eq!((mask.width(), mask.height()), (40, 40));
        assert!(mask.data().iter().all(|&b| b == 0));
    }
}
