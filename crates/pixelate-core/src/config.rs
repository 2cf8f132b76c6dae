use glam::Vec2;

use crate::options::{FilterOptions, PixelateOptions};
use crate::size::{is_degenerate, BlockSize, Size};
use crate::uniforms::{UniformBuffer, UniformGroup, UniformType, PIXELATE_GROUP, SIZE_UNIFORM};

/// Host-side state of one pixelate filter: the `pixelateUniforms` group and
/// the base options forwarded to the renderer.
///
/// Every setter writes straight into the uniform buffer; there is no
/// deferred state.
#[derive(Debug, Clone)]
pub struct PixelateConfig {
    uniforms: UniformGroup,
    base: FilterOptions,
}

impl PixelateConfig {
    pub fn new(options: impl Into<PixelateOptions>) -> Self {
        let (size, base) = options.into().resolve();
        let value = size.block_size();
        warn_if_degenerate(value);
        Self {
            uniforms: UniformGroup::new(PIXELATE_GROUP).with(
                SIZE_UNIFORM,
                UniformType::Vec2F32,
                value,
            ),
            base,
        }
    }

    pub fn size(&self) -> BlockSize {
        self.buffer().value()
    }

    /// Apply a block size.
    ///
    /// A `Pair` swaps in a new uniform buffer; `Scalar` and `Point` write the
    /// existing one axis by axis.
    pub fn set_size(&mut self, size: impl Into<Size>) {
        match size.into() {
            Size::Point(p) => {
                let buffer = self.buffer_mut();
                buffer.set_x(p.x);
                buffer.set_y(p.y);
                warn_if_degenerate(p);
            }
            Size::Pair([x, y]) => {
                let value = Vec2::new(x, y);
                warn_if_degenerate(value);
                if let Some(old) = self.uniforms.replace(SIZE_UNIFORM, value) {
                    log::debug!("{SIZE_UNIFORM}: replaced buffer {:?}", old.id());
                }
            }
            Size::Scalar(s) => {
                let buffer = self.buffer_mut();
                buffer.set_x(s);
                buffer.set_y(s);
                warn_if_degenerate(Vec2::splat(s));
            }
        }
    }

    pub fn size_x(&self) -> f32 {
        self.size().x
    }

    pub fn set_size_x(&mut self, x: f32) {
        let buffer = self.buffer_mut();
        buffer.set_x(x);
        warn_if_degenerate(buffer.value());
    }

    pub fn size_y(&self) -> f32 {
        self.size().y
    }

    pub fn set_size_y(&mut self, y: f32) {
        let buffer = self.buffer_mut();
        buffer.set_y(y);
        warn_if_degenerate(buffer.value());
    }

    /// The buffer currently bound as `uSize`.
    pub fn buffer(&self) -> &UniformBuffer {
        match self.uniforms.get(SIZE_UNIFORM) {
            Some(uniform) => &uniform.buffer,
            None => unreachable!("{SIZE_UNIFORM} is inserted at construction"),
        }
    }

    fn buffer_mut(&mut self) -> &mut UniformBuffer {
        match self.uniforms.get_mut(SIZE_UNIFORM) {
            Some(uniform) => &mut uniform.buffer,
            None => unreachable!("{SIZE_UNIFORM} is inserted at construction"),
        }
    }

    pub fn uniforms(&self) -> &UniformGroup {
        &self.uniforms
    }

    pub fn base_options(&self) -> &FilterOptions {
        &self.base
    }
}

impl Default for PixelateConfig {
    fn default() -> Self {
        Self::new(PixelateOptions::DEFAULT)
    }
}

fn warn_if_degenerate(size: BlockSize) {
    if is_degenerate(size) {
        log::warn!("degenerate pixelate block size {size}; output is unspecified");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BlendMode;

    #[test]
    fn default_is_ten_by_ten() {
        let config = PixelateConfig::default();
        assert_eq!(config.size_x(), 10.0);
        assert_eq!(config.size_y(), 10.0);
    }

    #[test]
    fn scalar_sets_both_axes() {
        let config = PixelateConfig::new(20.0f32);
        assert_eq!((config.size_x(), config.size_y()), (20.0, 20.0));
    }

    #[test]
    fn pair_sets_axes_and_gets_a_fresh_buffer() {
        let mut config = PixelateConfig::default();
        let held = config.buffer().clone();

        config.set_size([5.0f32, 15.0]);

        assert_eq!((config.size_x(), config.size_y()), (5.0, 15.0));
        assert_ne!(config.buffer().id(), held.id());
        // The old handle does not see the new value.
        assert_eq!(held.value(), Vec2::splat(10.0));
    }

    #[test]
    fn pair_at_construction() {
        let config = PixelateConfig::new([5.0f32, 15.0]);
        assert_eq!(config.size(), Vec2::new(5.0, 15.0));
    }

    #[test]
    fn point_and_scalar_keep_buffer_identity() {
        let mut config = PixelateConfig::default();
        let id = config.buffer().id();

        config.set_size(Vec2::new(3.0, 4.0));
        assert_eq!(config.size(), Vec2::new(3.0, 4.0));
        assert_eq!(config.buffer().id(), id);

        config.set_size(6.0f32);
        assert_eq!(config.size(), Vec2::splat(6.0));
        assert_eq!(config.buffer().id(), id);
    }

    #[test]
    fn point_with_base_options() {
        let config = PixelateConfig::new(PixelateOptions {
            size: Some(Size::Point(Vec2::new(3.0, 4.0))),
            base: FilterOptions {
                blend_mode: BlendMode::Add,
                ..FilterOptions::DEFAULT
            },
        });
        assert_eq!((config.size_x(), config.size_y()), (3.0, 4.0));
        assert_eq!(config.base_options().blend_mode, BlendMode::Add);
    }

    #[test]
    fn set_size_x_leaves_y_alone() {
        let mut config = PixelateConfig::default();
        config.set_size_x(7.0);
        assert_eq!(config.size(), Vec2::new(7.0, 10.0));
    }

    #[test]
    fn every_write_bumps_the_version() {
        let mut config = PixelateConfig::default();
        let v0 = config.buffer().version();
        config.set_size_y(2.0);
        assert!(config.buffer().version() > v0);
    }

    #[test]
    fn pair_round_trip() {
        let mut config = PixelateConfig::default();
        for (a, b) in [(1.0f32, 1.0f32), (0.5, 32.0), (7.25, 3.5), (1024.0, 0.125)] {
            config.set_size([a, b]);
            assert_eq!((config.size_x(), config.size_y()), (a, b));
        }
    }

    #[test]
    fn degenerate_sizes_are_stored_as_given() {
        let mut config = PixelateConfig::default();
        config.set_size(0.0f32);
        assert_eq!(config.size(), Vec2::ZERO);
        config.set_size([-2.0f32, 4.0]);
        assert_eq!(config.size(), Vec2::new(-2.0, 4.0));
    }

    #[test]
    fn uniform_group_is_named() {
        let config = PixelateConfig::default();
        assert_eq!(config.uniforms().name(), PIXELATE_GROUP);
        assert_eq!(
            config.uniforms().get(SIZE_UNIFORM).map(|u| u.ty),
            Some(UniformType::Vec2F32)
        );
    }
}
