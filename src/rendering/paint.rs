/// Paint command set and the SVG scene it serializes to

use crate::rendering::layout::{Rect, Rgba};
use crate::rendering::readiness::ReadyCanvas;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect { rect: Rect, rgba: Rgba },
    Image { rect: Rect, href: String },
}

/// Paint list for a loaded canvas, back to front. `background` is painted
/// first when present; a transparent canvas gets no fill at all.
pub fn paint_canvas(canvas: &ReadyCanvas, background: Option<Rgba>) -> Vec<PaintCommand> {
    let mut cmds = Vec::with_capacity(canvas.glyphs.len() + 1);
    if let Some(rgba) = background {
        cmds.push(PaintCommand::SolidRect {
            rect: Rect {
                x: 0.0,
                y: 0.0,
                width: canvas.width,
                height: canvas.height,
            },
            rgba,
        });
    }
    cmds.extend(canvas.glyphs.iter().map(|g| PaintCommand::Image {
        rect: g.rect,
        href: g.data_uri.clone(),
    }));
    cmds
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// Serialize paint commands to a standalone SVG document. Glyph images keep
/// their aspect ratio inside their slot (`xMidYMid meet`).
pub fn to_svg(width: f32, height: f32, cmds: &[PaintCommand]) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );
    for cmd in cmds {
        match cmd {
            PaintCommand::SolidRect { rect, rgba } => {
                let _ = write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="rgb({},{},{})" fill-opacity="{:.4}"/>"#,
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    rgba.r,
                    rgba.g,
                    rgba.b,
                    rgba.a as f32 / 255.0
                );
            }
            PaintCommand::Image { rect, href } => {
                let _ = write!(
                    svg,
                    r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid meet" xlink:href="{}"/>"#,
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    escape_attr(href)
                );
            }
        }
    }
    svg.push_str("</svg>");
    svg
}
