use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec2;

/// Name of the uniform group the pixelate shaders bind at group 1.
pub const PIXELATE_GROUP: &str = "pixelateUniforms";
/// Name of the block-size uniform inside [`PIXELATE_GROUP`].
pub const SIZE_UNIFORM: &str = "uSize";

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a host-side uniform buffer. Two handles with the same id
/// observe the same writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

// ---------------------------------------------------------------------------
// UniformBuffer
// ---------------------------------------------------------------------------

/// Host-side mirror of a 2-float uniform.
///
/// `version` increases on every write so the GPU side can tell when an
/// upload is due.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBuffer {
    id: BufferId,
    value: Vec2,
    version: u64,
}

impl UniformBuffer {
    pub fn new(value: Vec2) -> Self {
        Self {
            id: BufferId::next(),
            value,
            version: 0,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn value(&self) -> Vec2 {
        self.value
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set(&mut self, value: Vec2) {
        self.value = value;
        self.version += 1;
    }

    pub fn set_x(&mut self, x: f32) {
        self.value.x = x;
        self.version += 1;
    }

    pub fn set_y(&mut self, y: f32) {
        self.value.y = y;
        self.version += 1;
    }

    pub fn as_array(&self) -> [f32; 2] {
        self.value.to_array()
    }
}

// ---------------------------------------------------------------------------
// UniformGroup: named container of typed uniforms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    Vec2F32,
}

impl UniformType {
    /// WGSL spelling of the type.
    pub fn wgsl(self) -> &'static str {
        match self {
            UniformType::Vec2F32 => "vec2<f32>",
        }
    }

    /// GLSL spelling of the type.
    pub fn glsl(self) -> &'static str {
        match self {
            UniformType::Vec2F32 => "vec2",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    pub ty: UniformType,
    pub buffer: UniformBuffer,
}

/// A named resource group holding uniforms keyed by name.
#[derive(Debug, Clone)]
pub struct UniformGroup {
    name: &'static str,
    uniforms: HashMap<&'static str, Uniform>,
}

impl UniformGroup {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            uniforms: HashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn with(mut self, key: &'static str, ty: UniformType, value: Vec2) -> Self {
        self.uniforms.insert(
            key,
            Uniform {
                ty,
                buffer: UniformBuffer::new(value),
            },
        );
        self
    }

    pub fn get(&self, key: &str) -> Option<&Uniform> {
        self.uniforms.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Uniform> {
        self.uniforms.get_mut(key)
    }

    /// Swap in a fresh buffer for `key`. Returns the buffer it replaced.
    pub fn replace(&mut self, key: &'static str, value: Vec2) -> Option<UniformBuffer> {
        let uniform = self.uniforms.get_mut(key)?;
        Some(std::mem::replace(
            &mut uniform.buffer,
            UniformBuffer::new(value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_get_distinct_ids() {
        let a = UniformBuffer::new(Vec2::ZERO);
        let b = UniformBuffer::new(Vec2::ZERO);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn writes_bump_version_and_keep_identity() {
        let mut buf = UniformBuffer::new(Vec2::splat(10.0));
        let id = buf.id();
        buf.set_x(7.0);
        buf.set_y(3.0);
        assert_eq!(buf.value(), Vec2::new(7.0, 3.0));
        assert_eq!(buf.version(), 2);
        assert_eq!(buf.id(), id);
    }

    #[test]
    fn replace_hands_back_the_old_buffer() {
        let mut group = UniformGroup::new(PIXELATE_GROUP).with(
            SIZE_UNIFORM,
            UniformType::Vec2F32,
            Vec2::splat(10.0),
        );
        let before = group.get(SIZE_UNIFORM).unwrap().buffer.id();
        let old = group.replace(SIZE_UNIFORM, Vec2::new(5.0, 15.0)).unwrap();
        let now = &group.get(SIZE_UNIFORM).unwrap().buffer;

        assert_eq!(old.id(), before);
        assert_eq!(old.value(), Vec2::splat(10.0));
        assert_ne!(now.id(), before);
        assert_eq!(now.value(), Vec2::new(5.0, 15.0));
    }

    #[test]
    fn replace_unknown_key_is_none() {
        let mut group = UniformGroup::new(PIXELATE_GROUP);
        assert!(group.replace(SIZE_UNIFORM, Vec2::ONE).is_none());
    }

    #[test]
    fn type_spellings() {
        assert_eq!(UniformType::Vec2F32.wgsl(), "vec2<f32>");
        assert_eq!(UniformType::Vec2F32.glsl(), "vec2");
    }
}
