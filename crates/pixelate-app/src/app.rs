use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use pixelate_core::sampling::Rgba8Image;
use pixelate_core::{PixelateOptions, Size};
use pixelate_gpu::readback::{create_target, read_rgba8, upload_rgba8};
use pixelate_gpu::{Backend, FilterError, GpuError, PixelateFilter};
use thiserror::Error;
use winit::window::Window;

use crate::input::{size_for_action, InputAction, InputState, Key};

// ---------------------------------------------------------------------------
// Simple FPS counter: logs to console once per second
// ---------------------------------------------------------------------------

struct FpsCounter {
    frames: u32,
    last_report: Instant,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: 0,
            last_report: Instant::now(),
        }
    }

    /// Increment the frame count.  Returns the FPS value if a full second has
    /// elapsed since the last report (so the caller can log it).
    fn tick(&mut self) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.last_report.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            let fps = self.frames as f32 / elapsed;
            self.frames = 0;
            self.last_report = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("failed to write image")]
    Image(#[from] image::ImageError),
}

/// Source image shown through the filter: diagonal colour bands over a
/// radial falloff, so blocks are easy to see at any size.
pub fn test_pattern(width: u32, height: u32) -> Rgba8Image {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    Rgba8Image::from_fn(width, height, |x, y| {
        let (u, v) = (x as f32 / w, y as f32 / h);
        let (dx, dy) = (u - 0.5, v - 0.5);
        let glow = 1.0 - (dx * dx + dy * dy).sqrt().min(0.7) / 0.7;
        let band = ((u + v) * 6.0).fract();
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;
        [
            to_u8(u * glow + band * 0.3),
            to_u8(v * glow),
            to_u8((1.0 - u) * glow + (1.0 - band) * 0.3),
            255,
        ]
    })
}

/// Prefer a linear (non-sRGB) surface format. The source bytes are shown
/// as-is, so the window matches the PNG written by a screenshot.
pub fn surface_format(formats: &[wgpu::TextureFormat]) -> wgpu::TextureFormat {
    match formats.iter().copied().find(|f| !f.is_srgb()) {
        Some(format) => format,
        None => {
            let format = formats[0];
            log::warn!("no linear surface format; {format:?} will look brighter than screenshots");
            format
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,

    filter: PixelateFilter,
    backend: Backend,
    /// Block size restored by `Reset`.
    initial_size: Size,

    // Source image (rebuilt on resize)
    source_tex: wgpu::Texture,
    source_view: wgpu::TextureView,

    input: InputState,
    fps: FpsCounter,
}

impl App {
    /// Initialise wgpu for a given window.  The window is wrapped in `Arc` so
    /// that the surface can safely hold a `'static` reference to it.
    pub fn new(window: Arc<Window>, initial_size: Size) -> Self {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        // ---- Instance -------------------------------------------------------
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // ---- Surface --------------------------------------------------------
        let surface = instance
            .create_surface(Arc::clone(&window))
            .expect("failed to create wgpu surface");

        // ---- Adapter --------------------------------------------------------
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("no suitable GPU adapter found");

        log::info!("GPU adapter: {}", adapter.get_info().name);

        // ---- Device & Queue -------------------------------------------------
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("pixelate-app device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("failed to create GPU device");

        // ---- Surface configuration ------------------------------------------
        let surface_caps = surface.get_capabilities(&adapter);

        let format = surface_format(&surface_caps.formats);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);
        log::info!(
            "Surface configured: {}×{} {:?} Fifo",
            surface_config.width,
            surface_config.height,
            format
        );

        // ---- Filter ---------------------------------------------------------
        let filter = PixelateFilter::new(&device, format, initial_size)
            .unwrap_or_else(|e| panic!("pixelate filter failed to build: {e}"));

        let source_tex = upload_rgba8(&device, &queue, &test_pattern(width, height), "source");
        let source_view = source_tex.create_view(&Default::default());

        Self {
            surface,
            device,
            queue,
            surface_config,
            filter,
            backend: Backend::Gpu,
            initial_size,
            source_tex,
            source_view,
            input: InputState::new(),
            fps: FpsCounter::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Resize
    // -------------------------------------------------------------------------

    /// Reconfigure the surface and rebuild the source image at the new size.
    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width == 0 || new_height == 0 {
            return;
        }
        self.surface_config.width = new_width;
        self.surface_config.height = new_height;
        self.surface.configure(&self.device, &self.surface_config);

        self.source_tex = upload_rgba8(
            &self.device,
            &self.queue,
            &test_pattern(new_width, new_height),
            "source",
        );
        self.source_view = self.source_tex.create_view(&Default::default());

        log::debug!("Surface resized to {}×{}", new_width, new_height);
    }

    // -------------------------------------------------------------------------
    // Input: called by main.rs window_event handler
    // -------------------------------------------------------------------------

    /// Translate a key press and return the resulting action, if any.
    pub fn on_key_pressed(&self, key: Key) -> Option<InputAction> {
        self.input.on_key(key)
    }

    /// Apply an action to the app state.
    ///
    /// Returns `true` if the app should exit (i.e. action was `Quit`).
    pub fn handle_action(&mut self, action: InputAction) -> bool {
        if let Some(size) = size_for_action(action, self.filter.size(), self.initial_size) {
            self.filter.set_size(size);
            log::debug!("block size → {}", self.filter.size());
            return false;
        }

        match action {
            InputAction::SelectBackend(backend) => {
                self.backend = backend;
                log::info!("Backend: {backend}");
            }

            InputAction::ToggleBackend => {
                self.backend = self.backend.other();
                log::info!("Backend: {}", self.backend);
            }

            InputAction::Screenshot => match self.screenshot() {
                Ok(path) => log::info!("Saved {}", path.display()),
                Err(e) => log::error!("screenshot failed: {e}"),
            },

            InputAction::Quit => return true,

            InputAction::Resize(_)
            | InputAction::ResizeX(_)
            | InputAction::ResizeY(_)
            | InputAction::Reset => {}
        }
        false
    }

    /// Render the current view offscreen and write it as a PNG in the
    /// working directory.
    fn screenshot(&self) -> Result<PathBuf, ScreenshotError> {
        let (width, height) = (self.surface_config.width, self.surface_config.height);

        // Pipelines are per target format, so the offscreen copy needs its own.
        let mut offscreen = PixelateFilter::new(
            &self.device,
            wgpu::TextureFormat::Rgba8Unorm,
            PixelateOptions {
                size: Some(Size::Point(self.filter.size())),
                base: *self.filter.base_options(),
            },
        )?;
        let target = create_target(&self.device, width, height, "screenshot");
        let target_view = target.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("screenshot-encoder"),
            });
        offscreen.apply(
            &self.device,
            &mut encoder,
            &self.source_view,
            &target_view,
            [width, height],
            self.backend,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let pixels = read_rgba8(&self.device, &self.queue, &target)?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = PathBuf::from(format!("pixelate-{stamp}.png"));
        image::save_buffer(
            &path,
            &pixels.as_bytes(),
            width,
            height,
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(path)
    }

    // -------------------------------------------------------------------------
    // Render
    // -------------------------------------------------------------------------

    /// Draw one frame: clear, then run the filter from the source image into
    /// the surface.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        if let Some(fps) = self.fps.tick() {
            log::debug!(
                "FPS: {:.1}  backend: {}  block: {}",
                fps,
                self.backend,
                self.filter.size(),
            );
        }

        let width = self.surface_config.width;
        let height = self.surface_config.height;

        // --- Acquire surface texture -----------------------------------------
        let output = self.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        // --- 1. Clear --------------------------------------------------------
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // --- 2. Pixelate -----------------------------------------------------
        self.filter.apply(
            &self.device,
            &mut encoder,
            &self.source_view,
            &surface_view,
            [width, height],
            self.backend,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_fills_the_requested_size() {
        let img = test_pattern(32, 16);
        assert_eq!((img.width, img.height), (32, 16));
        assert_eq!(img.pixels.len(), 32 * 16);
        assert!(img.pixels.iter().all(|p| p[3] == 255));
    }

    #[test]
    fn surface_format_prefers_linear() {
        use wgpu::TextureFormat::*;
        assert_eq!(surface_format(&[Bgra8UnormSrgb, Bgra8Unorm]), Bgra8Unorm);
        assert_eq!(surface_format(&[Rgba8Unorm, Rgba8UnormSrgb]), Rgba8Unorm);
    }

    #[test]
    fn surface_format_falls_back_to_first_when_all_srgb() {
        use wgpu::TextureFormat::*;
        assert_eq!(surface_format(&[Bgra8UnormSrgb, Rgba8UnormSrgb]), Bgra8UnormSrgb);
    }

    #[test]
    fn test_pattern_is_not_flat() {
        let img = test_pattern(64, 64);
        assert_ne!(img.get(0, 0), img.get(32, 32));
    }
}
