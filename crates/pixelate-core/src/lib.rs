pub mod config;
pub mod options;
pub mod sampling;
pub mod size;
pub mod uniforms;

pub use config::PixelateConfig;
pub use options::{Antialias, BlendMode, FilterOptions, PixelateOptions};
pub use size::{BlockSize, Size, SizeError, DEFAULT_BLOCK_SIZE};
pub use uniforms::{BufferId, UniformBuffer, UniformGroup, UniformType, PIXELATE_GROUP, SIZE_UNIFORM};
