//! Layout composer: arranges resolved glyphs on a rectangular canvas.
//!
//! Glyphs inside a word sit almost edge to edge; words are separated by an
//! explicit gap and wrap as a whole when the line is full. A word that is
//! wider than a full line is broken between glyphs. Every line is centered.

use crate::glyph::{GlyphToken, Word};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gap between glyphs of one word, relative to glyph height
const LETTER_GAP_RATIO: f32 = 0.04;
/// Gap between words, relative to glyph height
const WORD_GAP_RATIO: f32 = 0.5;
/// Gap between wrapped lines, relative to glyph height
const LINE_GAP_RATIO: f32 = 0.16;

/// Allowed outer padding values in pixels
pub const PADDING_STEPS: [u32; 7] = [0, 8, 16, 24, 32, 48, 64];
/// Bounds of the glyph height slider
pub const GLYPH_HEIGHT_RANGE: (u32, u32) = (20, 200);
/// Bounds of the output width slider
pub const CONTAINER_WIDTH_RANGE: (u32, u32) = (200, 2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Self::rgb(it.next()??, it.next()??, it.next()??))
            }
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Canvas fill: a solid color or a genuinely transparent background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Background {
    Transparent,
    Color(Rgba),
}

/// One-click background choices; anything else goes through the custom hex
/// picker.
pub const PALETTE: [(&str, Background); 7] = [
    ("transparent", Background::Transparent),
    ("white", Background::Color(Rgba::rgb(0xff, 0xff, 0xff))),
    ("black", Background::Color(Rgba::rgb(0x00, 0x00, 0x00))),
    ("sky", Background::Color(Rgba::rgb(0x87, 0xce, 0xeb))),
    ("pink", Background::Color(Rgba::rgb(0xff, 0xb6, 0xc1))),
    ("lavender", Background::Color(Rgba::rgb(0xe6, 0xe6, 0xfa))),
    ("mint", Background::Color(Rgba::rgb(0x98, 0xff, 0x98))),
];

impl Background {
    pub fn color(&self) -> Option<Rgba> {
        match self {
            Background::Transparent => None,
            Background::Color(c) => Some(*c),
        }
    }
}

impl FromStr for Background {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        if let Some((_, bg)) = PALETTE.iter().find(|(name, _)| *name == key) {
            return Ok(*bg);
        }
        Rgba::from_hex(&key)
            .map(Background::Color)
            .ok_or_else(|| Error::Config(format!("unknown background {:?}", s)))
    }
}

impl TryFrom<String> for Background {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Background> for String {
    fn from(bg: Background) -> Self {
        bg.to_string()
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Background::Transparent => f.write_str("transparent"),
            Background::Color(c) => f.write_str(&c.to_hex()),
        }
    }
}

/// Fixed output sizes for social posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizePreset {
    SquarePost,
    PortraitPost,
    Story,
    LandscapePost,
}

impl SizePreset {
    pub const ALL: [SizePreset; 4] = [
        SizePreset::SquarePost,
        SizePreset::PortraitPost,
        SizePreset::Story,
        SizePreset::LandscapePost,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SizePreset::SquarePost => "square-post",
            SizePreset::PortraitPost => "portrait-post",
            SizePreset::Story => "story",
            SizePreset::LandscapePost => "landscape-post",
        }
    }

    /// Exact output size in pixels (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SizePreset::SquarePost => (1080, 1080),
            SizePreset::PortraitPost => (1080, 1350),
            SizePreset::Story => (1080, 1920),
            SizePreset::LandscapePost => (1200, 630),
        }
    }
}

impl FromStr for SizePreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SizePreset::ALL
            .into_iter()
            .find(|p| p.name() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| Error::Config(format!("unknown size preset {:?}", s)))
    }
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "{} ({}x{})", self.name(), w, h)
    }
}

/// Visual arrangement settings. Replaced as a whole on every change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub background: Background,
    pub padding_px: u32,
    pub glyph_height_px: u32,
    /// Canvas width; `None` shrinks the canvas to its content
    pub container_width_px: Option<u32>,
    /// Exact output size; overrides `container_width_px`
    pub size_preset: Option<SizePreset>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: Background::Transparent,
            padding_px: 16,
            glyph_height_px: 50,
            container_width_px: None,
            size_preset: None,
        }
    }
}

impl RenderConfig {
    /// Clamp the slider values into range and reject paddings that are not
    /// one of [`PADDING_STEPS`].
    pub fn checked(self) -> Result<Self> {
        if !PADDING_STEPS.contains(&self.padding_px) {
            return Err(Error::Config(format!(
                "padding {} is not one of {:?}",
                self.padding_px, PADDING_STEPS
            )));
        }
        Ok(Self {
            glyph_height_px: self
                .glyph_height_px
                .clamp(GLYPH_HEIGHT_RANGE.0, GLYPH_HEIGHT_RANGE.1),
            container_width_px: self
                .container_width_px
                .map(|w| w.clamp(CONTAINER_WIDTH_RANGE.0, CONTAINER_WIDTH_RANGE.1)),
            ..self
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A glyph placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBox {
    pub rect: Rect,
    pub token: GlyphToken,
}

/// Description of the composed canvas, ready to be loaded and captured.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTree {
    pub width: f32,
    pub height: f32,
    pub background: Background,
    pub preset: Option<SizePreset>,
    pub glyphs: Vec<GlyphBox>,
}

#[derive(Default)]
struct Line {
    /// (x offset within the line, width, token)
    items: Vec<(f32, f32, GlyphToken)>,
    width: f32,
}

impl Line {
    fn push(&mut self, gap: f32, width: f32, token: GlyphToken) {
        let x = if self.items.is_empty() {
            0.0
        } else {
            self.width + gap
        };
        self.items.push((x, width, token));
        self.width = x + width;
    }
}

fn glyph_width(token: &GlyphToken, height: f32) -> f32 {
    token
        .asset
        .intrinsic()
        .and_then(|s| s.aspect())
        .map(|a| height * a)
        .unwrap_or(height)
}

fn break_lines(words: &[Word], height: f32, limit: f32) -> Vec<Line> {
    let letter_gap = (height * LETTER_GAP_RATIO).max(1.0);
    let word_gap = height * WORD_GAP_RATIO;

    let mut lines: Vec<Line> = vec![Line::default()];
    for word in words.iter().filter(|w| !w.is_empty()) {
        let widths: Vec<f32> = word.glyphs.iter().map(|g| glyph_width(g, height)).collect();
        let word_w = widths.iter().sum::<f32>() + letter_gap * (widths.len() - 1) as f32;

        let fits_on_current = match lines.last() {
            Some(cur) if !cur.items.is_empty() => cur.width + word_gap + word_w <= limit,
            _ => true,
        };
        if fits_on_current && lines.last().is_some_and(|l| !l.items.is_empty()) {
            if let Some(cur) = lines.last_mut() {
                for (i, (g, w)) in word.glyphs.iter().zip(&widths).enumerate() {
                    let gap = if i == 0 { word_gap } else { letter_gap };
                    cur.push(gap, *w, g.clone());
                }
            }
            continue;
        }
        if lines.last().is_some_and(|l| !l.items.is_empty()) {
            lines.push(Line::default());
        }
        for (g, w) in word.glyphs.iter().zip(&widths) {
            let overflow = lines
                .last()
                .is_some_and(|l| !l.items.is_empty() && l.width + letter_gap + w > limit);
            if overflow {
                lines.push(Line::default());
            }
            if let Some(cur) = lines.last_mut() {
                cur.push(letter_gap, *w, g.clone());
            }
        }
    }
    lines.retain(|l| !l.items.is_empty());
    lines
}

/// Arrange `words` on a canvas according to `config`.
///
/// Without a preset the canvas is the configured container width (or the
/// content width) by the content height, plus padding. With a preset the
/// canvas has the preset's exact size and the content block is centered,
/// scaled down uniformly when it would not fit inside the padding.
pub fn compose(words: &[Word], config: &RenderConfig) -> LayoutTree {
    let height = config.glyph_height_px as f32;
    let pad = config.padding_px as f32;
    let line_gap = height * LINE_GAP_RATIO;

    let fixed = config.size_preset.map(|p| p.dimensions());
    let limit = match (fixed, config.container_width_px) {
        (Some((w, _)), _) | (None, Some(w)) => (w as f32 - 2.0 * pad).max(1.0),
        (None, None) => f32::INFINITY,
    };

    let lines = break_lines(words, height, limit);
    let content_w = lines.iter().map(|l| l.width).fold(0.0f32, f32::max);
    let content_h = if lines.is_empty() {
        0.0
    } else {
        lines.len() as f32 * height + (lines.len() - 1) as f32 * line_gap
    };

    let (canvas_w, canvas_h) = match fixed {
        Some((w, h)) => (w as f32, h as f32),
        None => {
            let natural = content_w + 2.0 * pad;
            let w = config
                .container_width_px
                .map(|cw| (cw as f32).max(natural))
                .unwrap_or(natural);
            (w, content_h + 2.0 * pad)
        }
    };

    let inner_w = (canvas_w - 2.0 * pad).max(0.0);
    let inner_h = (canvas_h - 2.0 * pad).max(0.0);
    let mut scale = 1.0f32;
    if fixed.is_some() && content_w > 0.0 && content_h > 0.0 {
        scale = scale.min(inner_w / content_w).min(inner_h / content_h);
    }
    let origin_x = pad + (inner_w - content_w * scale) / 2.0;
    let origin_y = pad + (inner_h - content_h * scale) / 2.0;

    let mut glyphs = Vec::new();
    for (row, line) in lines.into_iter().enumerate() {
        let line_x = (content_w - line.width) / 2.0;
        let line_y = row as f32 * (height + line_gap);
        for (x, w, token) in line.items {
            glyphs.push(GlyphBox {
                rect: Rect {
                    x: origin_x + (line_x + x) * scale,
                    y: origin_y + line_y * scale,
                    width: w * scale,
                    height: height * scale,
                },
                token,
            });
        }
    }

    LayoutTree {
        width: canvas_w,
        height: canvas_h,
        background: config.background,
        preset: config.size_preset,
        glyphs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetLayout;
    use crate::glyph::resolve;

    fn words(text: &str) -> Vec<Word> {
        resolve(text, None, &AssetLayout::default())
    }

    #[test]
    fn background_parses_palette_and_hex() {
        assert_eq!("transparent".parse::<Background>().unwrap(), Background::Transparent);
        assert_eq!(
            "Sky".parse::<Background>().unwrap(),
            Background::Color(Rgba::rgb(0x87, 0xce, 0xeb))
        );
        assert_eq!(
            "#fff".parse::<Background>().unwrap(),
            Background::Color(Rgba::rgb(255, 255, 255))
        );
        assert_eq!(
            "#11223380".parse::<Background>().unwrap().color().unwrap().a,
            0x80
        );
        assert!("#12".parse::<Background>().is_err());
        assert!("chartreuse".parse::<Background>().is_err());
    }

    #[test]
    fn preset_names_round_trip() {
        for p in SizePreset::ALL {
            assert_eq!(p.name().parse::<SizePreset>().unwrap(), p);
        }
        assert_eq!(SizePreset::SquarePost.dimensions(), (1080, 1080));
    }

    #[test]
    fn checked_clamps_sliders_and_rejects_odd_padding() {
        let cfg = RenderConfig {
            glyph_height_px: 5000,
            container_width_px: Some(10),
            ..Default::default()
        }
        .checked()
        .unwrap();
        assert_eq!(cfg.glyph_height_px, 200);
        assert_eq!(cfg.container_width_px, Some(200));

        let bad = RenderConfig {
            padding_px: 7,
            ..Default::default()
        };
        assert!(bad.checked().is_err());
    }

    #[test]
    fn single_line_fits_content() {
        let cfg = RenderConfig {
            padding_px: 8,
            ..Default::default()
        };
        let tree = compose(&words("AB C"), &cfg);
        assert_eq!(tree.glyphs.len(), 3);
        // A, gap 2, B, word gap 25, C
        let content = 50.0 + 2.0 + 50.0 + 25.0 + 50.0;
        assert!((tree.width - (content + 16.0)).abs() < 1e-3);
        assert!((tree.height - 66.0).abs() < 1e-3);
        assert!(tree.glyphs.iter().all(|g| (g.rect.y - 8.0).abs() < 1e-3));
        let c = &tree.glyphs[2];
        assert!((c.rect.x - (8.0 + 50.0 + 2.0 + 50.0 + 25.0)).abs() < 1e-3);
    }

    #[test]
    fn words_wrap_inside_container() {
        let cfg = RenderConfig {
            padding_px: 0,
            container_width_px: Some(200),
            ..Default::default()
        };
        let tree = compose(&words("ABC DEF"), &cfg);
        let rows: std::collections::BTreeSet<i32> =
            tree.glyphs.iter().map(|g| g.rect.y as i32).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(tree.width, 200.0);
    }

    #[test]
    fn long_word_breaks_between_glyphs() {
        let cfg = RenderConfig {
            padding_px: 0,
            container_width_px: Some(200),
            ..Default::default()
        };
        let tree = compose(&words("ABCDEFGH"), &cfg);
        assert!(tree.glyphs.iter().all(|g| g.rect.x + g.rect.width <= 200.0 + 1e-3));
        assert!(tree.height > 100.0);
    }

    #[test]
    fn preset_canvas_has_exact_size_and_fits_content() {
        let cfg = RenderConfig {
            glyph_height_px: 200,
            padding_px: 64,
            size_preset: Some(SizePreset::SquarePost),
            ..Default::default()
        };
        let tree = compose(&words("WWWWWWWWWWWWWWWWWWWWWWWW"), &cfg);
        assert_eq!((tree.width, tree.height), (1080.0, 1080.0));
        for g in &tree.glyphs {
            assert!(g.rect.x >= 64.0 - 1e-3);
            assert!(g.rect.x + g.rect.width <= 1080.0 - 64.0 + 1e-3);
            assert!(g.rect.y + g.rect.height <= 1080.0 - 64.0 + 1e-3);
        }
    }

    #[test]
    fn empty_input_yields_padding_only() {
        let tree = compose(&[], &RenderConfig::default());
        assert!(tree.glyphs.is_empty());
        assert_eq!(tree.width, 32.0);
    }

    #[test]
    fn background_does_not_change_glyph_choice() {
        let w = words("HI");
        let a = compose(&w, &RenderConfig::default());
        let b = compose(
            &w,
            &RenderConfig {
                background: "pink".parse().unwrap(),
                ..Default::default()
            },
        );
        let chars = |t: &LayoutTree| t.glyphs.iter().map(|g| g.token.ch).collect::<String>();
        assert_eq!(chars(&a), chars(&b));
    }
}
