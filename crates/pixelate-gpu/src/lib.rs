pub mod context;
pub mod filter;
pub mod program;
pub mod readback;

pub use context::{GpuContext, GpuError};
pub use filter::{FilterError, GlobalFilterUniforms, PixelateFilter, PixelateUniforms};
pub use program::{Backend, EntryPoints, Program, ProgramError, ProgramPair, Stage};
