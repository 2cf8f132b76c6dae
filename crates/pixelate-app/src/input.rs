use pixelate_core::{BlockSize, Size};
use pixelate_gpu::Backend;

/// Smallest and largest block edge the viewer lets you dial in.
pub const MIN_BLOCK: f32 = 1.0;
pub const MAX_BLOCK: f32 = 256.0;
/// Pixels added or removed per key press.
pub const BLOCK_STEP: f32 = 2.0;

// ---------------------------------------------------------------------------
// Key: windowing-library-independent key representation
// ---------------------------------------------------------------------------

/// A keyboard key, independent of any windowing library.
///
/// `main.rs` maps `winit::keyboard::PhysicalKey` → `Key`; everything else
/// in the input pipeline works purely with this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit1,
    Digit2,
    Space,
    Equal, // = / + (same physical key; Shift state ignored)
    Minus, // - / _ (same physical key; Shift state ignored)
    Left,
    Right,
    Up,
    Down,
    R,
    P,
    Q,
    Escape,
}

// ---------------------------------------------------------------------------
// InputAction: what the app does in response to input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    /// Change both axes by the given number of pixels.
    Resize(f32),
    ResizeX(f32),
    ResizeY(f32),
    SelectBackend(Backend),
    ToggleBackend,
    Reset,
    Screenshot,
    Quit,
}

#[derive(Debug, Default)]
pub struct InputState;

impl InputState {
    pub fn new() -> Self {
        Self
    }

    /// Translate a `Key` press into an `InputAction`.
    pub fn on_key(&self, key: Key) -> Option<InputAction> {
        match key {
            Key::Digit1 => Some(InputAction::SelectBackend(Backend::Gpu)),
            Key::Digit2 => Some(InputAction::SelectBackend(Backend::Gl)),
            Key::Space => Some(InputAction::ToggleBackend),
            Key::Equal => Some(InputAction::Resize(BLOCK_STEP)),
            Key::Minus => Some(InputAction::Resize(-BLOCK_STEP)),
            Key::Right => Some(InputAction::ResizeX(BLOCK_STEP)),
            Key::Left => Some(InputAction::ResizeX(-BLOCK_STEP)),
            Key::Up => Some(InputAction::ResizeY(BLOCK_STEP)),
            Key::Down => Some(InputAction::ResizeY(-BLOCK_STEP)),
            Key::R => Some(InputAction::Reset),
            Key::P => Some(InputAction::Screenshot),
            Key::Q | Key::Escape => Some(InputAction::Quit),
        }
    }
}

/// Apply a step to one block edge, keeping it within the viewer's range.
pub fn step_block(current: f32, delta: f32) -> f32 {
    (current + delta).clamp(MIN_BLOCK, MAX_BLOCK)
}

/// Block size the filter should take after `action`, or `None` when the
/// action does not touch the size. `initial` is what `Reset` returns to.
pub fn size_for_action(action: InputAction, current: BlockSize, initial: Size) -> Option<Size> {
    match action {
        InputAction::Resize(delta) => Some(Size::Point(BlockSize::new(
            step_block(current.x, delta),
            step_block(current.y, delta),
        ))),
        InputAction::ResizeX(delta) => Some(Size::Point(BlockSize::new(
            step_block(current.x, delta),
            current.y,
        ))),
        InputAction::ResizeY(delta) => Some(Size::Point(BlockSize::new(
            current.x,
            step_block(current.y, delta),
        ))),
        InputAction::Reset => Some(initial),
        InputAction::SelectBackend(_)
        | InputAction::ToggleBackend
        | InputAction::Screenshot
        | InputAction::Quit => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
