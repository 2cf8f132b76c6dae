use thiserror::Error;
use wgpu::{Adapter, Device, Instance, Queue};

pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
}

impl GpuContext {
    /// Create a headless GPU context (no surface). Used for offscreen
    /// filtering and testing. A surface-aware variant is created by
    /// `pixelate-app`.
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("pixelate-gpu device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        log::debug!("headless GPU context on {}", adapter.get_info().name);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }
}

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to request device")]
    DeviceRequestFailed(#[from] wgpu::RequestDeviceError),
    #[error("failed to map readback buffer")]
    Readback(#[from] wgpu::BufferAsyncError),
    #[error("readback channel closed before the map completed")]
    ReadbackLost,
    #[error("cannot read back {0:?} textures")]
    UnsupportedFormat(wgpu::TextureFormat),
}
