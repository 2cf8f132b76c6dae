//! Host-side reference of the pixelate fragment stage.
//!
//! Mirrors `pixelate.wgsl` / `pixelate.frag` step for step, so shader output
//! can be checked against it and the block-uniformity property can be tested
//! without a GPU.

use glam::{UVec2, Vec2};

use crate::size::BlockSize;

/// Block size converted from pixels to normalised texture space.
pub fn block_uv(block: BlockSize, resolution: Vec2) -> Vec2 {
    block / resolution
}

/// Snap `uv` to the centre of the block containing it. Not clamped.
pub fn snap_uv(uv: Vec2, block_uv: Vec2) -> Vec2 {
    (uv / block_uv).floor() * block_uv + block_uv * 0.5
}

/// Integer block coordinate of `uv`; equal coordinates mean equal colour.
pub fn block_of(uv: Vec2, block_uv: Vec2) -> Vec2 {
    (uv / block_uv).floor()
}

/// Full fragment-stage coordinate: snap, then clamp into the texture.
pub fn sample_coord(uv: Vec2, block: BlockSize, resolution: Vec2) -> Vec2 {
    let block_uv = block_uv(block, resolution);
    snap_uv(uv, block_uv).clamp(Vec2::ZERO, Vec2::ONE)
}

/// Nearest-texel index for a clamped `uv`, as a clamp-to-edge nearest
/// sampler would pick it.
pub fn texel_index(uv: Vec2, dims: UVec2) -> UVec2 {
    let d = dims.as_vec2();
    let max = dims.saturating_sub(UVec2::ONE);
    (uv.clamp(Vec2::ZERO, Vec2::ONE) * d)
        .floor()
        .as_uvec2()
        .min(max)
}

// ---------------------------------------------------------------------------
// RGBA8 images
// ---------------------------------------------------------------------------

/// Tightly packed RGBA8 image, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rgba8Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
}

impl Rgba8Image {
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Horizontal red ramp, vertical green ramp, constant blue. Every texel of
    /// a reasonably sized image has a distinct colour.
    pub fn gradient(width: u32, height: u32) -> Self {
        let ramp = |v: u32, n: u32| ((v * 255) / n.saturating_sub(1).max(1)) as u8;
        Self::from_fn(width, height, |x, y| [ramp(x, width), ramp(y, height), 128, 255])
    }

    pub fn dims(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }

    pub fn from_bytes(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != (width * height * 4) as usize {
            return None;
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Some(Self {
            width,
            height,
            pixels,
        })
    }
}

/// Centre of pixel `(x, y)` in normalised coordinates.
pub fn pixel_uv(x: u32, y: u32, dims: UVec2) -> Vec2 {
    (Vec2::new(x as f32, y as f32) + 0.5) / dims.as_vec2()
}

/// Run the pixelate pass over `source` into a target of the same size.
pub fn pixelate_rgba8(source: &Rgba8Image, block: BlockSize) -> Rgba8Image {
    let dims = source.dims();
    let resolution = dims.as_vec2();
    Rgba8Image::from_fn(source.width, source.height, |x, y| {
        let coord = sample_coord(pixel_uv(x, y, dims), block, resolution);
        let t = texel_index(coord, dims);
        source.get(t.x, t.y)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const RES: Vec2 = Vec2::new(640.0, 480.0);

    #[test]
    fn block_uv_is_pixels_over_resolution() {
        let b = block_uv(Vec2::new(10.0, 12.0), RES);
        assert!((b.x - 10.0 / 640.0).abs() < 1e-7);
        assert!((b.y - 12.0 / 480.0).abs() < 1e-7);
    }

    #[test]
    fn snap_goes_to_block_centre() {
        let b = block_uv(Vec2::splat(10.0), RES);
        // Pixel 13 lives in block 1 whose centre is pixel 15.
        let uv = Vec2::new(13.5, 13.5) / RES;
        let snapped = snap_uv(uv, b) * RES;
        assert!((snapped.x - 15.0).abs() < 1e-3, "got {snapped}");
        assert!((snapped.y - 15.0).abs() < 1e-3, "got {snapped}");
    }

    #[test]
    fn uv_zero_samples_inside_the_texture() {
        let dims = UVec2::new(64, 64);
        let coord = sample_coord(Vec2::ZERO, Vec2::splat(8.0), dims.as_vec2());
        assert!(coord.cmpge(Vec2::ZERO).all() && coord.cmple(Vec2::ONE).all());
        assert_eq!(texel_index(coord, dims), UVec2::new(4, 4));
    }

    #[test]
    fn uv_just_below_one_is_clamped_into_bounds() {
        // 10 does not divide 64, so the last block hangs off the edge.
        let dims = UVec2::new(64, 64);
        let uv = Vec2::splat(1.0 - f32::EPSILON);
        let coord = sample_coord(uv, Vec2::splat(10.0), dims.as_vec2());
        assert!(coord.cmple(Vec2::ONE).all(), "got {coord}");
        let t = texel_index(coord, dims);
        assert!(t.x < 64 && t.y < 64, "got {t}");
    }

    #[test]
    fn texel_index_at_one_is_last_texel() {
        assert_eq!(texel_index(Vec2::ONE, UVec2::new(8, 4)), UVec2::new(7, 3));
    }

    #[test]
    fn same_block_same_colour() {
        let src = Rgba8Image::gradient(64, 48);
        let block = Vec2::new(8.0, 6.0);
        let out = pixelate_rgba8(&src, block);
        let b = block_uv(block, src.dims().as_vec2());

        for y in 0..out.height {
            for x in 0..out.width {
                let cell = block_of(pixel_uv(x, y, out.dims()), b);
                let (bx, by) = (cell.x as u32 * 8, cell.y as u32 * 6);
                assert_eq!(out.get(x, y), out.get(bx, by), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn neighbouring_blocks_differ_on_a_gradient() {
        let src = Rgba8Image::gradient(64, 64);
        let out = pixelate_rgba8(&src, Vec2::splat(8.0));
        assert_ne!(out.get(0, 0), out.get(8, 0));
        assert_ne!(out.get(0, 0), out.get(0, 8));
    }

    #[test]
    fn non_integral_blocks_still_quantise() {
        let src = Rgba8Image::gradient(32, 32);
        let out = pixelate_rgba8(&src, Vec2::splat(2.5));
        // Pixels 0 and 1 sit in block 0 (0..2.5), pixel 3 in block 1.
        assert_eq!(out.get(0, 0), out.get(1, 0));
        assert_ne!(out.get(1, 0), out.get(3, 0));
    }

    #[test]
    fn one_pixel_blocks_are_identity() {
        let src = Rgba8Image::gradient(16, 16);
        assert_eq!(pixelate_rgba8(&src, Vec2::ONE), src);
    }

    #[test]
    fn bytes_round_trip_checks_length() {
        let img = Rgba8Image::gradient(4, 2);
        let bytes = img.as_bytes();
        assert_eq!(Rgba8Image::from_bytes(4, 2, &bytes), Some(img));
        assert_eq!(Rgba8Image::from_bytes(4, 3, &bytes), None);
    }
}
