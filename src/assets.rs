//! HUD font loading and the glyph atlas.
//!
//! Glyphs for printable ASCII are rasterized with fontdue and packed row by row
//! into a single `R8Unorm` texture. No font is bundled with the crate, so the
//! atlas is loaded from a file found by [`font_candidates`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};

use crate::gpu::GpuContext;

/// Environment variable naming a TTF/OTF file for the HUD.
pub const FONT_ENV_VAR: &str = "FLAT_BUILDER_FONT";

/// Common locations of a monospace or sans font on desktop systems.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const ATLAS_PADDING: u32 = 1;

/// Errors that can occur when loading a HUD font.
#[derive(Debug)]
pub enum FontError {
    /// The font file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// fontdue rejected the font data.
    Parse(&'static str),
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::Io { path, source } => {
                write!(f, "failed to read font {}: {source}", path.display())
            }
            FontError::Parse(msg) => write!(f, "failed to parse font: {msg}"),
        }
    }
}

impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontError::Io { source, .. } => Some(source),
            FontError::Parse(_) => None,
        }
    }
}

/// Information about a single glyph in the font atlas.
#[derive(Clone, Copy, Debug)]
pub struct GlyphInfo {
    /// UV coordinates in the atlas (x, y, width, height) normalized to [0, 1].
    pub uv: [f32; 4],
    /// Size of the glyph in pixels.
    pub width: u32,
    pub height: u32,
    /// Offset from the pen position to the glyph's bottom-left corner.
    pub offset_x: f32,
    pub offset_y: f32,
    /// How far to advance the pen after this glyph.
    pub advance: f32,
}

/// Result of packing glyph rectangles into an atlas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtlasLayout {
    pub width: u32,
    pub height: u32,
    /// Top-left corner of each rectangle, in input order.
    pub positions: Vec<(u32, u32)>,
}

/// Pack rectangles into rows, doubling the smaller atlas side until they fit.
pub fn pack_rows(sizes: &[(u32, u32)]) -> AtlasLayout {
    let mut width = 256u32;
    let mut height = 256u32;

    loop {
        if let Some(positions) = try_pack(sizes, width, height) {
            return AtlasLayout {
                width,
                height,
                positions,
            };
        }
        if width <= height {
            width *= 2;
        } else {
            height *= 2;
        }
    }
}

fn try_pack(sizes: &[(u32, u32)], width: u32, height: u32) -> Option<Vec<(u32, u32)>> {
    let mut x = ATLAS_PADDING;
    let mut y = ATLAS_PADDING;
    let mut row_height = 0u32;
    let mut positions = Vec::with_capacity(sizes.len());

    for &(w, h) in sizes {
        if w + 2 * ATLAS_PADDING > width {
            return None;
        }
        if x + w + ATLAS_PADDING > width {
            x = ATLAS_PADDING;
            y += row_height + ATLAS_PADDING;
            row_height = 0;
        }
        if y + h + ATLAS_PADDING > height {
            return None;
        }
        positions.push((x, y));
        x += w + ATLAS_PADDING;
        row_height = row_height.max(h);
    }

    Some(positions)
}

/// Paths to try for the HUD font, in priority order: the configured path, the
/// environment override, then well-known system fonts.
pub fn font_candidates(configured: Option<&Path>, env_override: Option<PathBuf>) -> Vec<PathBuf> {
    configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(env_override)
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
        .collect()
}

/// A font atlas containing pre-rasterized glyphs.
pub struct FontAtlas {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    glyphs: HashMap<char, GlyphInfo>,
    size: f32,
    line_height: f32,
}

impl FontAtlas {
    /// Rasterize printable ASCII from TTF/OTF data and upload it to the GPU.
    pub fn new(gpu: &GpuContext, font_data: &[u8], size: f32) -> Result<Self, FontError> {
        let font = Font::from_bytes(font_data, FontSettings::default()).map_err(FontError::Parse)?;

        let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = (32u8..=126u8)
            .map(char::from)
            .map(|c| {
                let (metrics, bitmap) = font.rasterize(c, size);
                (c, metrics, bitmap)
            })
            .collect();

        let sizes: Vec<(u32, u32)> = rasterized
            .iter()
            .map(|(_, m, _)| (m.width as u32, m.height as u32))
            .collect();
        let layout = pack_rows(&sizes);

        let mut atlas_data = vec![0u8; (layout.width * layout.height) as usize];
        let mut glyphs = HashMap::with_capacity(rasterized.len());

        for ((c, metrics, bitmap), &(x, y)) in rasterized.iter().zip(&layout.positions) {
            let glyph_w = metrics.width as u32;
            let glyph_h = metrics.height as u32;

            for gy in 0..glyph_h {
                let src = (gy * glyph_w) as usize;
                let dst = ((y + gy) * layout.width + x) as usize;
                atlas_data[dst..dst + glyph_w as usize]
                    .copy_from_slice(&bitmap[src..src + glyph_w as usize]);
            }

            glyphs.insert(
                *c,
                GlyphInfo {
                    uv: [
                        x as f32 / layout.width as f32,
                        y as f32 / layout.height as f32,
                        glyph_w as f32 / layout.width as f32,
                        glyph_h as f32 / layout.height as f32,
                    ],
                    width: glyph_w,
                    height: glyph_h,
                    offset_x: metrics.xmin as f32,
                    offset_y: metrics.ymin as f32,
                    advance: metrics.advance_width,
                },
            );
        }

        let extent = wgpu::Extent3d {
            width: layout.width,
            height: layout.height,
            depth_or_array_layers: 1,
        };
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("HUD Font Atlas"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &atlas_data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(layout.width),
                rows_per_image: Some(layout.height),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("HUD Font Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let line_height = font
            .horizontal_line_metrics(size)
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2);

        Ok(Self {
            view,
            sampler,
            glyphs,
            size,
            line_height,
        })
    }

    /// Read a font file and build its atlas.
    pub fn load(gpu: &GpuContext, path: impl AsRef<Path>, size: f32) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(gpu, &data, size)
    }

    /// Try each candidate path and return the first font that loads.
    pub fn load_first(gpu: &GpuContext, candidates: &[PathBuf], size: f32) -> Option<Self> {
        for path in candidates {
            match Self::load(gpu, path, size) {
                Ok(atlas) => {
                    log::info!("HUD font: {}", path.display());
                    return Some(atlas);
                }
                Err(FontError::Io { .. }) => {}
                Err(e) => log::debug!("skipping {}: {e}", path.display()),
            }
        }
        None
    }

    pub fn glyph(&self, c: char) -> Option<&GlyphInfo> {
        self.glyphs.get(&c)
    }

    /// The pixel size this atlas was rasterized at.
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_keeps_rectangles_apart() {
        let sizes = vec![(10, 12); 40];
        let layout = pack_rows(&sizes);

        assert_eq!(layout.positions.len(), sizes.len());
        for (i, &(ax, ay)) in layout.positions.iter().enumerate() {
            assert!(ax + 10 < layout.width && ay + 12 < layout.height);
            for &(bx, by) in &layout.positions[i + 1..] {
                let apart = ax + 10 <= bx || bx + 10 <= ax || ay + 12 <= by || by + 12 <= ay;
                assert!(apart, "({ax},{ay}) overlaps ({bx},{by})");
            }
        }
    }

    #[test]
    fn packing_grows_the_atlas() {
        let layout = pack_rows(&[(300, 20), (20, 300)]);
        assert!(layout.width >= 302);
        assert!(layout.height >= 300);
        assert_eq!(layout.positions[0], (1, 1));
    }

    #[test]
    fn empty_glyphs_still_get_a_slot() {
        let layout = pack_rows(&[(0, 0), (5, 5)]);
        assert_eq!(layout.positions, vec![(1, 1), (2, 1)]);
    }

    #[test]
    fn candidates_are_ordered_by_priority() {
        let list = font_candidates(
            Some(Path::new("hud.ttf")),
            Some(PathBuf::from("/env/font.ttf")),
        );
        assert_eq!(list[0], PathBuf::from("hud.ttf"));
        assert_eq!(list[1], PathBuf::from("/env/font.ttf"));
        assert_eq!(list.len(), SYSTEM_FONTS.len() + 2);

        let bare = font_candidates(None, None);
        assert_eq!(bare.len(), SYSTEM_FONTS.len());
    }

    #[test]
    fn io_error_names_the_path() {
        let err = FontError::Io {
            path: PathBuf::from("missing.ttf"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("missing.ttf"));
    }
}
