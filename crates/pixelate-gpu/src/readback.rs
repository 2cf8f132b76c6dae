//! Moving RGBA8 images between host memory and textures.

use pixelate_core::sampling::Rgba8Image;
use wgpu::util::DeviceExt;
use wgpu::{Device, Queue, Texture};

use crate::context::GpuError;

/// Upload `image` as an `Rgba8Unorm` texture the filter can sample.
pub fn upload_rgba8(device: &Device, queue: &Queue, image: &Rgba8Image, label: &str) -> Texture {
    device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &image.as_bytes(),
    )
}

/// An `Rgba8Unorm` render target that can be read back.
pub fn create_target(device: &Device, width: u32, height: u32, label: &str) -> Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Copy an `Rgba8Unorm` texture back to the host. Blocks until the GPU has
/// finished all submitted work.
pub fn read_rgba8(device: &Device, queue: &Queue, texture: &Texture) -> Result<Rgba8Image, GpuError> {
    if texture.format() != wgpu::TextureFormat::Rgba8Unorm {
        return Err(GpuError::UnsupportedFormat(texture.format()));
    }
    let (width, height) = (texture.width(), texture.height());
    let row_bytes = width * 4;
    let padded_row = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size: (padded_row * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback-encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        texture.size(),
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv().map_err(|_| GpuError::ReadbackLost)??;

    let mut bytes = Vec::with_capacity((row_bytes * height) as usize);
    {
        let mapped = slice.get_mapped_range();
        for row in mapped.chunks_exact(padded_row as usize) {
            bytes.extend_from_slice(&row[..row_bytes as usize]);
        }
    }
    buffer.unmap();

    Rgba8Image::from_bytes(width, height, &bytes).ok_or(GpuError::ReadbackLost)
}
