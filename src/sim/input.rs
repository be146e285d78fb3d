//! Player input aggregation
//!
//! Keyboard and touch events are folded into an [`InputState`] that the loop
//! reads once per tick: a movement [`Direction`] and a one-shot fire request.
//!
//! Hosts that capture input on another thread send [`HostEvent`]s through
//! [`channel`]; the loop drains the receiver at the start of every tick so a
//! tick always sees a consistent snapshot.

use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use super::state::Direction;

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    KeyA,
    KeyD,
    Space,
    ArrowUp,
}

impl Key {
    /// Map a DOM `KeyboardEvent.code`
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ArrowLeft" => Some(Key::ArrowLeft),
            "ArrowRight" => Some(Key::ArrowRight),
            "KeyA" => Some(Key::KeyA),
            "KeyD" => Some(Key::KeyD),
            "Space" => Some(Key::Space),
            "ArrowUp" => Some(Key::ArrowUp),
            _ => None,
        }
    }

    fn is_left(&self) -> bool {
        matches!(self, Key::ArrowLeft | Key::KeyA)
    }

    fn is_right(&self) -> bool {
        matches!(self, Key::ArrowRight | Key::KeyD)
    }

    fn is_fire(&self) -> bool {
        matches!(self, Key::Space | Key::ArrowUp)
    }
}

/// Everything a host can push into the loop between ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Touch/pointer pressed at screen x
    PointerDown { x: f32 },
    /// Pointer dragged while pressed
    PointerMove { x: f32 },
    PointerUp,
    /// On-screen fire button
    FireButton,
    TogglePause,
    /// Viewport changed size
    Resize { width: f32, height: f32 },
}

/// Aggregated input read by the loop
#[derive(Debug, Clone, Default)]
pub struct InputState {
    left_keys: u8,
    right_keys: u8,
    /// Fire keys currently held (key repeat must not re-fire)
    fire_keys: u8,
    /// Pressed pointer x, if any
    touch_x: Option<f32>,
    /// Edge from a fire key going down
    fire_edge: bool,
    /// Set by the on-screen fire control until consumed
    touch_fire: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        if key.is_left() {
            self.left_keys |= key_bit(key);
        } else if key.is_right() {
            self.right_keys |= key_bit(key);
        } else if key.is_fire() {
            if self.fire_keys & key_bit(key) == 0 {
                self.fire_edge = true;
            }
            self.fire_keys |= key_bit(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        let bit = !key_bit(key);
        self.left_keys &= bit;
        self.right_keys &= bit;
        self.fire_keys &= bit;
    }

    pub fn pointer_down(&mut self, x: f32) {
        if x.is_finite() {
            self.touch_x = Some(x);
        }
    }

    pub fn pointer_move(&mut self, x: f32) {
        if self.touch_x.is_some() && x.is_finite() {
            self.touch_x = Some(x);
        }
    }

    pub fn pointer_up(&mut self) {
        self.touch_x = None;
    }

    /// On-screen fire control pressed
    pub fn fire_button(&mut self) {
        self.touch_fire = true;
    }

    /// Resolve the movement intent. Keyboard wins over touch; opposing keys
    /// cancel out. Touch picks a side by comparing against half the width.
    pub fn direction(&self, viewport_width: f32) -> Direction {
        let left = self.left_keys != 0;
        let right = self.right_keys != 0;
        match (left, right) {
            (true, false) => return Direction::Left,
            (false, true) => return Direction::Right,
            (true, true) => return Direction::None,
            (false, false) => {}
        }

        match self.touch_x {
            Some(_) if viewport_width.is_nan() || viewport_width <= 0.0 => Direction::None,
            Some(x) if x < viewport_width * 0.5 => Direction::Left,
            Some(_) => Direction::Right,
            None => Direction::None,
        }
    }

    /// Whether a fire action is pending (without consuming it)
    pub fn fire_pending(&self) -> bool {
        self.fire_edge || self.touch_fire
    }

    /// Consume the pending fire action
    pub fn take_fire(&mut self) -> bool {
        let fire = self.fire_pending();
        self.fire_edge = false;
        self.touch_fire = false;
        fire
    }

    /// Forget everything (teardown, focus loss)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn key_bit(key: Key) -> u8 {
    match key {
        Key::ArrowLeft => 1 << 0,
        Key::ArrowRight => 1 << 1,
        Key::KeyA => 1 << 2,
        Key::KeyD => 1 << 3,
        Key::Space => 1 << 4,
        Key::ArrowUp => 1 << 5,
    }
}

/// Sending half of the input hand-off (input thread side)
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: mpsc::Sender<HostEvent>,
}

impl InputSender {
    /// Queue an event. Returns false once the loop has detached.
    pub fn send(&self, event: HostEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Receiving half, attached to the game loop
#[derive(Debug)]
pub struct InputReceiver {
    rx: mpsc::Receiver<HostEvent>,
}

impl InputReceiver {
    /// Take every event queued so far
    pub fn drain(&self) -> Vec<HostEvent> {
        self.rx.try_iter().collect()
    }
}

/// Create a single-producer/single-consumer input queue
pub fn channel() -> (InputSender, InputReceiver) {
    let (tx, rx) = mpsc::channel();
    (InputSender { tx }, InputReceiver { rx })
}
