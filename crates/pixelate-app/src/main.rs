use std::sync::Arc;

use pixelate_core::Size;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

mod app;
mod input;

use app::App;
use input::Key;

/// Environment variable holding the starting block size, e.g. `12` or `8x4`.
const SIZE_ENV: &str = "PIXELATE_SIZE";

/// Map a winit physical key code to our library-independent `Key`.
/// Returns `None` for keys we don't handle.
fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Digit1 => Some(Key::Digit1),
        KeyCode::Digit2 => Some(Key::Digit2),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Equal | KeyCode::NumpadAdd => Some(Key::Equal),
        KeyCode::Minus | KeyCode::NumpadSubtract => Some(Key::Minus),
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::KeyR => Some(Key::R),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::KeyQ => Some(Key::Q),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

/// Starting block size: `PIXELATE_SIZE` if set and parseable, otherwise the
/// filter default.
fn initial_size() -> Size {
    match std::env::var(SIZE_ENV) {
        Ok(raw) => match raw.parse::<Size>() {
            Ok(size) => {
                log::info!("{SIZE_ENV}={raw} → block size {size}");
                size
            }
            Err(e) => {
                log::warn!("ignoring {SIZE_ENV}={raw:?}: {e}");
                Size::default()
            }
        },
        Err(_) => Size::default(),
    }
}

// ---------------------------------------------------------------------------
// Handler: winit ApplicationHandler
// ---------------------------------------------------------------------------

struct Handler {
    window: Option<Arc<Window>>,
    app: Option<App>,
    initial_size: Size,
}

impl ApplicationHandler for Handler {
    /// Called once on desktop when the event loop starts.
    /// Creates the window then initialises the wgpu surface.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attrs = Window::default_attributes()
            .with_title("Pixelate")
            .with_inner_size(winit::dpi::LogicalSize::new(800u32, 600u32));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("failed to create window"),
        );

        log::info!("Window created (800×600)");

        let gpu_app = App::new(Arc::clone(&window), self.initial_size);
        self.window = Some(window);
        self.app = Some(gpu_app);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            // ----------------------------------------------------------------
            // Exit
            // ----------------------------------------------------------------
            WindowEvent::CloseRequested => {
                log::info!("Close requested: exiting");
                event_loop.exit();
            }

            // ----------------------------------------------------------------
            // Keyboard
            // ----------------------------------------------------------------
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                let Some(app) = &mut self.app else { return };
                let Some(key) = map_key(code) else { return };
                if let Some(action) = app.on_key_pressed(key) {
                    if app.handle_action(action) {
                        log::info!("Quit requested: exiting");
                        event_loop.exit();
                    }
                }
            }

            // ----------------------------------------------------------------
            // Resize: reconfigure the wgpu surface
            // ----------------------------------------------------------------
            WindowEvent::Resized(new_size) => {
                if let Some(app) = &mut self.app {
                    app.resize(new_size.width, new_size.height);
                }
            }

            // ----------------------------------------------------------------
            // Redraw: pixelate the source into the surface and present
            // ----------------------------------------------------------------
            WindowEvent::RedrawRequested => {
                if let Some(app) = &mut self.app {
                    match app.render() {
                        Ok(()) => {}
                        // Surface lost / outdated: reconfigure and try again next frame.
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            if let Some(window) = &self.window {
                                let size = window.inner_size();
                                app.resize(size.width, size.height);
                            }
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("GPU out of memory: exiting");
                            event_loop.exit();
                        }
                        Err(e) => log::warn!("render error: {e:?}"),
                    }
                }
            }

            _ => {}
        }
    }

    /// Drive continuous redraws (game-loop style).
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().expect("failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut handler = Handler {
        window: None,
        app: None,
        initial_size: initial_size(),
    };
    event_loop.run_app(&mut handler).expect("event loop error");
}
