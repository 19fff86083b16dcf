/// Terminal input tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement and jump while a key is held
///   - Edge-triggered menu keys (only fire on initial press)
///   - Mouse clicks and hover over menu buttons
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't
/// support it. The timeout has to bridge the gap between the first press
/// and the terminal's auto-repeat, so releases are noticed late there.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

use crate::domain::input::{FrameInput, Key};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(250);

/// Physical key bindings for the movement keys.
const KEY_BINDINGS: [(KeyCode, Key); 10] = [
    (KeyCode::Left, Key::Left),
    (KeyCode::Char('a'), Key::A),
    (KeyCode::Char('A'), Key::A),
    (KeyCode::Right, Key::Right),
    (KeyCode::Char('d'), Key::D),
    (KeyCode::Char('D'), Key::D),
    (KeyCode::Up, Key::Up),
    (KeyCode::Char('w'), Key::W),
    (KeyCode::Char('W'), Key::W),
    (KeyCode::Char(' '), Key::Space),
];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Left clicks this frame, as terminal (column, row).
    pub clicks: Vec<(u16, u16)>,

    /// Last known pointer position, set on mouse movement.
    pub pointer: Option<(u16, u16)>,
    pointer_moved: bool,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            clicks: Vec::with_capacity(2),
            pointer: None,
            pointer_moved: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.clicks.clear();
        self.pointer_moved = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.on_key(key),
                Ok(Event::Mouse(mouse)) => match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        self.clicks.push((mouse.column, mouse.row));
                        self.pointer = Some((mouse.column, mouse.row));
                    }
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        self.pointer = Some((mouse.column, mouse.row));
                        self.pointer_moved = true;
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        if !self.honor_release {
            let now = Instant::now();
            self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        match self.last_active.get(&code) {
            Some(_) if self.honor_release => true,
            Some(t) => t.elapsed() < HOLD_TIMEOUT,
            None => false,
        }
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Characters freshly pressed this frame, for menu hotkeys.
    pub fn pressed_chars(&self) -> impl Iterator<Item = char> + '_ {
        self.fresh_presses.iter().filter_map(|code| match code {
            KeyCode::Char(c) => Some(*c),
            _ => None,
        })
    }

    /// Pointer position if the mouse moved this frame.
    pub fn hover(&self) -> Option<(u16, u16)> {
        if self.pointer_moved { self.pointer } else { None }
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Fold the held movement keys into a simulation snapshot.
    pub fn frame_input(&self) -> FrameInput {
        let mut input = FrameInput::none();
        for (code, key) in KEY_BINDINGS {
            if self.is_held(code) {
                input.press(key);
            }
        }
        input
    }
}
