use glam::Vec2;

use crate::size::{Size, DEFAULT_BLOCK_SIZE};

// ---------------------------------------------------------------------------
// Base filter options: passed through untouched
// ---------------------------------------------------------------------------

/// How the filter output is composited onto its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Multiply,
    Screen,
    /// Overwrite the target.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialias {
    #[default]
    Off,
    On,
    /// Follow whatever the render target was created with.
    Inherit,
}

/// Options every filter accepts. The pixelate filter does not interpret
/// them; they are handed to the filter base as given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterOptions {
    pub blend_mode: BlendMode,
    /// Render-target resolution multiplier; `None` follows the renderer.
    pub resolution: Option<f32>,
    /// Extra pixels around the filter area.
    pub padding: f32,
    pub antialias: Antialias,
    pub blend_required: bool,
    pub clip_to_viewport: bool,
}

impl FilterOptions {
    pub const DEFAULT: Self = Self {
        blend_mode: BlendMode::Normal,
        resolution: None,
        padding: 0.0,
        antialias: Antialias::Off,
        blend_required: false,
        clip_to_viewport: true,
    };
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// PixelateOptions
// ---------------------------------------------------------------------------

/// Construction options: an optional block size plus the base options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelateOptions {
    pub size: Option<Size>,
    pub base: FilterOptions,
}

impl PixelateOptions {
    pub const DEFAULT: Self = Self {
        size: Some(Size::Scalar(DEFAULT_BLOCK_SIZE)),
        base: FilterOptions::DEFAULT,
    };

    /// Split into the block size to apply and the options to forward.
    /// A missing size falls back to the compiled-in default.
    pub fn resolve(self) -> (Size, FilterOptions) {
        (self.size.unwrap_or_default(), self.base)
    }
}

impl Default for PixelateOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Size> for PixelateOptions {
    fn from(size: Size) -> Self {
        Self {
            size: Some(size),
            ..Self::DEFAULT
        }
    }
}

impl From<f32> for PixelateOptions {
    fn from(s: f32) -> Self {
        Size::from(s).into()
    }
}

impl From<[f32; 2]> for PixelateOptions {
    fn from(pair: [f32; 2]) -> Self {
        Size::from(pair).into()
    }
}

impl From<Vec2> for PixelateOptions {
    fn from(p: Vec2) -> Self {
        Size::from(p).into()
    }
}

impl From<FilterOptions> for PixelateOptions {
    fn from(base: FilterOptions) -> Self {
        Self { size: None, base }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_size_uses_default() {
        let (size, base) = PixelateOptions {
            size: None,
            base: FilterOptions::DEFAULT,
        }
        .resolve();
        assert_eq!(size.block_size(), Vec2::splat(10.0));
        assert_eq!(base, FilterOptions::DEFAULT);
    }

    #[test]
    fn base_options_pass_through() {
        let base = FilterOptions {
            blend_mode: BlendMode::Add,
            padding: 4.0,
            ..FilterOptions::DEFAULT
        };
        let (size, forwarded) = PixelateOptions {
            size: Some(Size::Point(Vec2::new(3.0, 4.0))),
            base,
        }
        .resolve();
        assert_eq!(size, Size::Point(Vec2::new(3.0, 4.0)));
        assert_eq!(forwarded, base);
    }

    #[test]
    fn bare_sizes_convert_with_default_base() {
        let opts = PixelateOptions::from(20.0f32);
        assert_eq!(opts.size, Some(Size::Scalar(20.0)));
        assert_eq!(opts.base, FilterOptions::DEFAULT);

        let opts = PixelateOptions::from([5.0f32, 15.0]);
        assert_eq!(opts.size, Some(Size::Pair([5.0, 15.0])));
    }

    #[test]
    fn base_only_options_leave_size_unset() {
        let opts = PixelateOptions::from(FilterOptions {
            blend_mode: BlendMode::Screen,
            ..Default::default()
        });
        assert_eq!(opts.size, None);
        assert_eq!(opts.resolve().0, Size::Scalar(10.0));
    }

    #[test]
    fn framework_defaults() {
        let d = FilterOptions::default();
        assert_eq!(d.blend_mode, BlendMode::Normal);
        assert_eq!(d.antialias, Antialias::Off);
        assert!(d.clip_to_viewport);
        assert!(!d.blend_required);
        assert_eq!(d.resolution, None);
    }
}
