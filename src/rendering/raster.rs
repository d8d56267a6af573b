/// Rasterizer adapter: capture options and the capture backends

use crate::rendering::layout::{RenderConfig, Rgba};
use crate::rendering::readiness::ReadyCanvas;
use crate::rendering::EncodedImage;
use crate::Result;
use std::future::Future;

/// Pixel density used when no exact output size is requested
pub const DEFAULT_PIXEL_RATIO: f32 = 2.0;

/// Options handed to the capture primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    pub pixel_ratio: f32,
    /// Fill behind the glyphs; `None` keeps the alpha channel
    pub background: Option<Rgba>,
    /// Exact output size in pixels, overriding `pixel_ratio` scaling
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Do not load font resources
    pub skip_fonts: bool,
}

impl CaptureOptions {
    /// Options consistent with `config`: 2x density by default, 1x with the
    /// exact preset size when a size preset is active. A transparent
    /// background is omitted rather than passed as a color.
    pub fn from_config(config: &RenderConfig) -> Self {
        let (pixel_ratio, width, height) = match config.size_preset {
            Some(p) => {
                let (w, h) = p.dimensions();
                (1.0, Some(w), Some(h))
            }
            None => (DEFAULT_PIXEL_RATIO, None, None),
        };
        Self {
            pixel_ratio,
            background: config.background.color(),
            width,
            height,
            skip_fonts: true,
        }
    }
}

/// Turns a loaded canvas into an encoded image.
pub trait Rasterizer: Send + Sync {
    fn capture(
        &self,
        canvas: &ReadyCanvas,
        options: &CaptureOptions,
    ) -> impl Future<Output = Result<EncodedImage>> + Send;
}

#[cfg(feature = "resvg")]
pub use self::resvg_backend::{render_svg_to_png, ResvgRasterizer};

#[cfg(feature = "resvg")]
mod resvg_backend {
    use super::{CaptureOptions, Rasterizer};
    use crate::rendering::paint::{paint_canvas, to_svg};
    use crate::rendering::readiness::ReadyCanvas;
    use crate::rendering::EncodedImage;
    use crate::{Error, Result};
    use resvg::tiny_skia::{Pixmap, Transform};
    use resvg::usvg;
    use std::sync::Arc;

    /// Rasterizes the canvas as an SVG scene with resvg.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ResvgRasterizer {
        /// Trade image smoothing and PNG compression for speed
        pub optimize_speed: bool,
    }

    impl Rasterizer for ResvgRasterizer {
        async fn capture(&self, canvas: &ReadyCanvas, options: &CaptureOptions) -> Result<EncodedImage> {
            let svg = to_svg(
                canvas.width,
                canvas.height,
                &paint_canvas(canvas, options.background),
            );
            let options = options.clone();
            let speed = self.optimize_speed;
            tokio::task::spawn_blocking(move || render_svg_to_png(&svg, &options, speed))
                .await
                .map_err(|e| Error::Capture(format!("capture task failed: {}", e)))?
        }
    }

    /// Parse, rasterize and PNG-encode an SVG scene.
    pub fn render_svg_to_png(svg: &str, options: &CaptureOptions, speed: bool) -> Result<EncodedImage> {
        let t0 = std::time::Instant::now();

        let mut opts = usvg::Options {
            image_rendering: if speed {
                usvg::ImageRendering::OptimizeSpeed
            } else {
                usvg::ImageRendering::OptimizeQuality
            },
            ..Default::default()
        };
        if !options.skip_fonts {
            Arc::make_mut(&mut opts.fontdb).load_system_fonts();
        }

        let tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
            .map_err(|e| Error::Capture(format!("Failed to parse scene: {}", e)))?;
        let size = tree.size();

        let ratio = if options.pixel_ratio > 0.0 {
            options.pixel_ratio
        } else {
            1.0
        };
        let width = options
            .width
            .unwrap_or_else(|| (size.width() * ratio).ceil() as u32);
        let height = options
            .height
            .unwrap_or_else(|| (size.height() * ratio).ceil() as u32);
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| Error::Capture(format!("Failed to create {}x{} pixmap", width, height)))?;

        let transform = Transform::from_scale(width as f32 / size.width(), height as f32 / size.height());
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        let t_raster = t0.elapsed();

        // png wants straight alpha; tiny-skia stores premultiplied
        let mut rgba = Vec::with_capacity(pixmap.data().len());
        for px in pixmap.pixels() {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            if speed {
                encoder.set_compression(png::Compression::Fast);
                encoder.set_filter(png::FilterType::NoFilter);
            } else {
                encoder.set_compression(png::Compression::Default);
                encoder.set_filter(png::FilterType::Paeth);
            }
            let mut writer = encoder
                .write_header()
                .map_err(|e| Error::Capture(format!("PNG write_header error: {}", e)))?;
            writer
                .write_image_data(&rgba)
                .map_err(|e| Error::Capture(format!("PNG write_image_data error: {}", e)))?;
            writer
                .finish()
                .map_err(|e| Error::Capture(format!("PNG finish error: {}", e)))?;
        }

        log::debug!(
            "captured {}x{} in {:?} (raster {:?})",
            width,
            height,
            t0.elapsed(),
            t_raster
        );
        Ok(EncodedImage { width, height, png: out })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::{Background, SizePreset};

    #[test]
    fn transparent_background_is_omitted() {
        let opts = CaptureOptions::from_config(&RenderConfig::default());
        assert_eq!(opts.background, None);
        assert_eq!(opts.pixel_ratio, DEFAULT_PIXEL_RATIO);
        assert!(opts.skip_fonts);
    }

    #[test]
    fn solid_background_is_passed_explicitly() {
        let cfg = RenderConfig {
            background: Background::Color(Rgba::rgb(1, 2, 3)),
            ..Default::default()
        };
        assert_eq!(
            CaptureOptions::from_config(&cfg).background,
            Some(Rgba::rgb(1, 2, 3))
        );
    }

    #[test]
    fn preset_forces_unit_ratio_and_exact_size() {
        for height in [20, 50, 200] {
            let cfg = RenderConfig {
                glyph_height_px: height,
                size_preset: Some(SizePreset::SquarePost),
                ..Default::default()
            };
            let opts = CaptureOptions::from_config(&cfg);
            assert_eq!(opts.pixel_ratio, 1.0);
            assert_eq!((opts.width, opts.height), (Some(1080), Some(1080)));
        }
    }

    #[cfg(feature = "resvg")]
    #[test]
    fn renders_scene_at_pixel_ratio() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="10" height="10" fill="red"/></svg>"#;
        let opts = CaptureOptions {
            pixel_ratio: 2.0,
            background: None,
            width: None,
            height: None,
            skip_fonts: true,
        };
        let img = render_svg_to_png(svg, &opts, true).unwrap();
        assert_eq!((img.width, img.height), (40, 20));
        assert_eq!(&img.png[0..8], b"\x89PNG\r\n\x1a\n");
    }
}
