//! Keyboard state and the per-tick movement intent sampled from it.
//!
//! Platform listeners write key-down/key-up events into a [`KeyboardState`];
//! the frame loop calls [`KeyboardState::sample`] once per tick and passes the
//! resulting [`MovementIntent`] by value to the controller and animator.

use serde::Serialize;

use crate::config::ScriptSegment;

/// Immutable snapshot of movement input for one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MovementIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub sprint: bool,
}

impl MovementIntent {
    pub fn idle() -> Self {
        Self::default()
    }

    /// True when forward or backward is held.
    pub fn is_translating(&self) -> bool {
        self.forward || self.backward
    }
}

/// Keys the scene listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    W,
    A,
    S,
    D,
    Shift,
    Space,
    E,
}

impl Key {
    /// Maps a platform key string to a tracked key, case-insensitively.
    pub fn from_name(name: &str) -> Option<Key> {
        match name.to_lowercase().as_str() {
            "w" => Some(Key::W),
            "a" => Some(Key::A),
            "s" => Some(Key::S),
            "d" => Some(Key::D),
            "shift" => Some(Key::Shift),
            " " | "space" => Some(Key::Space),
            "e" => Some(Key::E),
            _ => None,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

const KEY_COUNT: usize = 7;

/// Level-triggered key buffer written by input listeners.
#[derive(Debug, Default, Clone)]
pub struct KeyboardState {
    down: [bool; KEY_COUNT],
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key event. Untracked keys are ignored.
    pub fn handle_key(&mut self, name: &str, pressed: bool) {
        if let Some(key) = Key::from_name(name) {
            self.set(key, pressed);
        }
    }

    pub fn set(&mut self, key: Key, pressed: bool) {
        self.down[key.slot()] = pressed;
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.down[key.slot()]
    }

    /// Releases every key (e.g. on focus loss).
    pub fn release_all(&mut self) {
        self.down = [false; KEY_COUNT];
    }

    /// Reads the current key state into a movement intent.
    pub fn sample(&self) -> MovementIntent {
        MovementIntent {
            forward: self.is_down(Key::W),
            backward: self.is_down(Key::S),
            left: self.is_down(Key::A),
            right: self.is_down(Key::D),
            jump: self.is_down(Key::Space),
            sprint: self.is_down(Key::Shift),
        }
    }
}

/// Replays a configured key timeline into a [`KeyboardState`].
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    segments: Vec<ScriptSegment>,
    segment: usize,
    remaining: u32,
}

impl ScriptedInput {
    pub fn new(segments: Vec<ScriptSegment>) -> Self {
        let remaining = segments.first().map(|s| s.ticks).unwrap_or(0);
        Self {
            segments,
            segment: 0,
            remaining,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.segment >= self.segments.len()
    }

    /// Writes this tick's key events into `keyboard`. Returns false once the
    /// timeline is exhausted (all keys released).
    pub fn drive(&mut self, keyboard: &mut KeyboardState) -> bool {
        while self.segment < self.segments.len() && self.remaining == 0 {
            self.segment += 1;
            self.remaining = self.segments.get(self.segment).map(|s| s.ticks).unwrap_or(0);
        }

        keyboard.release_all();
        let Some(segment) = self.segments.get(self.segment) else {
            return false;
        };
        for key in &segment.keys {
            keyboard.handle_key(key, true);
        }
        self.remaining -= 1;
        true
    }
}
