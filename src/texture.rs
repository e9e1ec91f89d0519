use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::{debug, warn};
use parking_lot::RwLock;

use crate::catalog::{Rgb, ToolEntry};

/// Edge length of generated icon textures, in pixels.
pub const ICON_SIZE: u32 = 128;
const CORNER_RADIUS: f32 = 20.0;
const BORDER_INSET: u32 = 1;
const BORDER_WIDTH: u32 = 6;
const GLYPH_CELL: u32 = 10;

/// Where the pixels of an [`IconTexture`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureOrigin {
    Image,
    Glyph,
}

/// RGBA image painted onto the faces of a dropping cube.
#[derive(Debug, Clone)]
pub struct IconTexture {
    label: String,
    origin: TextureOrigin,
    image: RgbaImage,
}

impl IconTexture {
    /// Rounded tile in the tool colour with a white border and the tool glyph.
    pub fn glyph(label: &str, color: Rgb, glyph: char) -> Self {
        let mut image = RgbaImage::new(ICON_SIZE, ICON_SIZE);
        let [r, g, b] = color.to_array();
        let fill = Rgba([r, g, b, 255]);
        let white = Rgba([255, 255, 255, 255]);

        for (x, y, pixel) in image.enumerate_pixels_mut() {
            if inside_rounded_rect(x, y) {
                *pixel = fill;
            }
        }
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            if on_border(x, y) {
                *pixel = white;
            }
        }
        draw_glyph(&mut image, glyph, white);

        Self {
            label: label.to_string(),
            origin: TextureOrigin::Glyph,
            image,
        }
    }

    pub fn from_image(label: &str, image: RgbaImage) -> Self {
        let image = if image.dimensions() == (ICON_SIZE, ICON_SIZE) {
            image
        } else {
            imageops::resize(&image, ICON_SIZE, ICON_SIZE, FilterType::Triangle)
        };
        Self {
            label: label.to_string(),
            origin: TextureOrigin::Image,
            image,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn origin(&self) -> TextureOrigin {
        self.origin
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Tightly packed RGBA8 rows.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }
}

fn inside_rounded_rect(x: u32, y: u32) -> bool {
    let size = ICON_SIZE as f32;
    let px = x as f32 + 0.5;
    let py = y as f32 + 0.5;
    let cx = px.clamp(CORNER_RADIUS, size - CORNER_RADIUS);
    let cy = py.clamp(CORNER_RADIUS, size - CORNER_RADIUS);
    let (dx, dy) = (px - cx, py - cy);
    dx * dx + dy * dy <= CORNER_RADIUS * CORNER_RADIUS
}

fn on_border(x: u32, y: u32) -> bool {
    let lo = BORDER_INSET;
    let hi = ICON_SIZE - BORDER_INSET;
    let in_band = |v: u32| (lo..lo + BORDER_WIDTH).contains(&v) || (hi - BORDER_WIDTH..hi).contains(&v);
    let in_span = |v: u32| (lo..hi).contains(&v);
    (in_band(x) && in_span(y)) || (in_band(y) && in_span(x))
}

fn draw_glyph(image: &mut RgbaImage, glyph: char, color: Rgba<u8>) {
    let rows = glyph_rows(glyph);
    let width = 5 * GLYPH_CELL;
    let height = 7 * GLYPH_CELL;
    let left = (ICON_SIZE - width) / 2;
    let top = (ICON_SIZE - height) / 2;
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..5u32 {
            if bits & (0x10 >> col) == 0 {
                continue;
            }
            let x0 = left + col * GLYPH_CELL;
            let y0 = top + row as u32 * GLYPH_CELL;
            for y in y0..y0 + GLYPH_CELL {
                for x in x0..x0 + GLYPH_CELL {
                    image.put_pixel(x, y, color);
                }
            }
        }
    }
}

/// 5x7 bitmap rows, most significant of the low five bits is the left column.
fn glyph_rows(glyph: char) -> [u8; 7] {
    match glyph.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

/// Resolves the optional `image` of a catalog entry into pixels.
pub trait IconSource: Send + Sync {
    fn load(&self, path: &str) -> Result<RgbaImage>;
}

/// Source used when no icon assets ship with the page; every lookup fails
/// and the cache paints a glyph instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlyphOnly;

impl IconSource for GlyphOnly {
    fn load(&self, path: &str) -> Result<RgbaImage> {
        anyhow::bail!("no icon assets available for {path}")
    }
}

/// Loads icon images relative to a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryIcons {
    root: PathBuf,
}

impl DirectoryIcons {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl IconSource for DirectoryIcons {
    fn load(&self, path: &str) -> Result<RgbaImage> {
        let full = self.root.join(path);
        let image = image::open(&full)
            .with_context(|| format!("failed to load icon {}", full.display()))?;
        Ok(image.to_rgba8())
    }
}

/// Lazily populated label -> texture map. Entries are never evicted.
pub struct TextureCache {
    entries: RwLock<HashMap<String, Arc<IconTexture>>>,
    source: Box<dyn IconSource>,
}

impl TextureCache {
    pub fn new(source: impl IconSource + 'static) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            source: Box::new(source),
        }
    }

    /// Returns the cached texture for the tool, painting it on first use.
    pub fn get_or_create(&self, tool: &ToolEntry) -> Arc<IconTexture> {
        if let Some(texture) = self.entries.read().get(&tool.name) {
            return Arc::clone(texture);
        }
        let mut entries = self.entries.write();
        let texture = entries
            .entry(tool.name.clone())
            .or_insert_with(|| Arc::new(self.paint(tool)));
        Arc::clone(texture)
    }

    pub fn get(&self, label: &str) -> Option<Arc<IconTexture>> {
        self.entries.read().get(label).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn paint(&self, tool: &ToolEntry) -> IconTexture {
        if let Some(path) = tool.image.as_deref() {
            match self.source.load(path) {
                Ok(image) => {
                    debug!("loaded icon image {path} for {}", tool.name);
                    return IconTexture::from_image(&tool.name, image);
                }
                Err(err) => warn!("{err:#}; painting glyph for {} instead", tool.name),
            }
        }
        IconTexture::glyph(&tool.name, tool.color, tool.glyph())
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new(GlyphOnly)
    }
}

impl std::fmt::Debug for TextureCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureCache")
            .field("labels", &self.entries.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::catalog::ToolCatalog;

    fn docker() -> ToolEntry {
        ToolCatalog::default().get("Docker").cloned().unwrap()
    }

    #[test]
    fn glyph_texture_layout() {
        let texture = IconTexture::glyph("Docker", Rgb::from_u32(0x0db7ed), 'D');
        assert_eq!((texture.width(), texture.height()), (ICON_SIZE, ICON_SIZE));
        assert_eq!(texture.pixels().len(), (ICON_SIZE * ICON_SIZE * 4) as usize);
        // Rounded corner stays transparent.
        assert_eq!(texture.pixel(0, 0)[3], 0);
        assert_eq!(texture.pixel(3, 64), [255, 255, 255, 255]);
        assert_eq!(texture.pixel(12, 64), [0x0d, 0xb7, 0xed, 255]);
        // Top-left cell of the D is lit.
        assert_eq!(texture.pixel(44, 34), [255, 255, 255, 255]);
        assert_eq!(texture.origin(), TextureOrigin::Glyph);
    }

    #[test]
    fn same_label_returns_same_texture() {
        let cache = TextureCache::default();
        let tool = docker();
        let first = cache.get_or_create(&tool);
        let second = cache.get_or_create(&tool);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&first, &cache.get("Docker").unwrap()));
    }

    #[test]
    fn distinct_labels_get_distinct_textures() {
        let cache = TextureCache::default();
        let catalog = ToolCatalog::default();
        for tool in catalog.tools() {
            cache.get_or_create(tool);
        }
        assert_eq!(cache.len(), catalog.len());
    }

    #[test]
    fn missing_image_falls_back_to_glyph() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TextureCache::new(DirectoryIcons::new(dir.path()));
        let mut tool = docker();
        tool.image = Some("missing.png".to_string());
        let texture = cache.get_or_create(&tool);
        assert_eq!(texture.origin(), TextureOrigin::Glyph);
    }

    #[test]
    fn image_source_is_used_when_it_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker.png");
        RgbaImage::from_pixel(ICON_SIZE, ICON_SIZE, Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();
        let mut garbage = std::fs::File::create(dir.path().join("broken.png")).unwrap();
        garbage.write_all(b"not a png").unwrap();

        let cache = TextureCache::new(DirectoryIcons::new(dir.path()));
        let mut tool = docker();
        tool.image = Some("docker.png".to_string());
        let texture = cache.get_or_create(&tool);
        assert_eq!(texture.origin(), TextureOrigin::Image);
        assert_eq!(texture.pixel(64, 64), [1, 2, 3, 255]);

        let mut broken = ToolCatalog::default().get("Git").cloned().unwrap();
        broken.image = Some("broken.png".to_string());
        assert_eq!(cache.get_or_create(&broken).origin(), TextureOrigin::Glyph);
    }
}
