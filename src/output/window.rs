use super::{OutputSink, PointerHandler, Poll};
use crate::tracking::{PointerEvent, PointerKind};
use anyhow::{Context, Result};
use image::RgbImage;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use std::time::{Duration, Instant};

/// Granularity of the input poll inside one wait
const POLL_INTERVAL: Duration = Duration::from_millis(2);

#[rustfmt::skip]
const LETTERS: [Key; 26] = [
    Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
    Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
    Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
];

#[rustfmt::skip]
const DIGITS: [Key; 10] = [
    Key::Key0, Key::Key1, Key::Key2, Key::Key3, Key::Key4,
    Key::Key5, Key::Key6, Key::Key7, Key::Key8, Key::Key9,
];

/// ASCII code of a key, for matching against the configured exit key
fn key_code(key: Key) -> Option<u8> {
    match key {
        Key::Escape => Some(27),
        Key::Enter => Some(b'\r'),
        Key::Space => Some(b' '),
        Key::Tab => Some(b'\t'),
        Key::Backspace => Some(8),
        _ => LETTERS
            .iter()
            .position(|&k| k == key)
            .map(|i| b'a' + i as u8)
            .or_else(|| DIGITS.iter().position(|&k| k == key).map(|i| b'0' + i as u8)),
    }
}

/// Turns polled left-button state into Down/Move/Up events
#[derive(Debug, Default)]
struct PointerTracker {
    button_down: bool,
    last_pos: Option<(i32, i32)>,
}

impl PointerTracker {
    /// A button change wins over motion in the same poll. The first sighting
    /// of the cursor with the button up only records its position.
    fn update(&mut self, pos: (i32, i32), down: bool) -> Option<PointerEvent> {
        let kind = match (self.button_down, down) {
            (false, true) => Some(PointerKind::Down),
            (true, false) => Some(PointerKind::Up),
            _ if self.last_pos.is_some_and(|last| last != pos) => Some(PointerKind::Move),
            _ => None,
        };

        self.button_down = down;
        self.last_pos = Some(pos);
        kind.map(|kind| PointerEvent::new(kind, pos.0, pos.1))
    }
}

/// On-screen window that shows frames and reports mouse drags
pub struct WindowOutput {
    title: String,
    window: Option<Window>,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
    exit_key: u8,
    pointer: PointerTracker,
}

impl WindowOutput {
    /// The window itself opens with the first frame, sized to it
    pub fn new(title: &str, exit_key: u8) -> Self {
        Self {
            title: title.to_string(),
            window: None,
            buffer: Vec::new(),
            width: 0,
            height: 0,
            exit_key,
            pointer: PointerTracker::default(),
        }
    }

    fn ensure_window(&mut self, width: usize, height: usize) -> Result<()> {
        if self.window.is_some() && (width, height) == (self.width, self.height) {
            return Ok(());
        }

        tracing::info!("Opening window \"{}\" ({}x{})", self.title, width, height);

        let window = Window::new(
            &self.title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .with_context(|| format!("Failed to open window \"{}\"", self.title))?;

        self.window = Some(window);
        self.buffer = vec![0; width * height];
        self.width = width;
        self.height = height;
        Ok(())
    }
}

impl OutputSink for WindowOutput {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let (width, height) = (frame.width() as usize, frame.height() as usize);
        self.ensure_window(width, height)?;

        for (dst, px) in self.buffer.iter_mut().zip(frame.pixels()) {
            *dst = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
        }

        let Some(window) = self.window.as_mut() else {
            return Ok(());
        };
        window
            .update_with_buffer(&self.buffer, width, height)
            .context("Failed to present frame")?;

        Ok(())
    }

    fn wait_events(&mut self, timeout: Duration, handler: &mut dyn PointerHandler) -> Result<Poll> {
        let deadline = Instant::now() + timeout;

        let Some(window) = self.window.as_mut() else {
            std::thread::sleep(timeout);
            return Ok(Poll::Continue);
        };

        loop {
            window.update();

            if !window.is_open() {
                tracing::info!("Window closed");
                return Ok(Poll::Terminate);
            }

            if let Some((fx, fy)) = window.get_mouse_pos(MouseMode::Clamp) {
                let down = window.get_mouse_down(MouseButton::Left);
                if let Some(event) = self.pointer.update((fx as i32, fy as i32), down) {
                    handler.on_pointer(event);
                }
            }

            let exit_pressed = window
                .get_keys_pressed(KeyRepeat::No)
                .into_iter()
                .filter_map(key_code)
                .any(|code| code == self.exit_key);
            if exit_pressed {
                tracing::info!("Exit key pressed");
                return Ok(Poll::Terminate);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(Poll::Continue);
            }
            std::thread::sleep((deadline - now).min(POLL_INTERVAL));
        }
    }
}
