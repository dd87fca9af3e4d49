use serde_derive::{Deserialize, Serialize};
use tracing::warn;

use std::collections::HashMap;

/// Joypad button ids as polled by the core.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub enum JoypadButton {
    B = 0,
    Y = 1,
    Select = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
    A = 8,
    X = 9,
    L = 10,
    R = 11,
    L2 = 12,
    R2 = 13,
    L3 = 14,
    R3 = 15,
}

impl JoypadButton {
    pub fn id(self) -> i16 {
        self as i16
    }
}

/// One-shot presses waiting to be delivered to the core.
///
/// The core polls one id at a time; a press is delivered (and consumed) only
/// when the polled id matches the oldest pending press. Storage is fixed at
/// construction, so a consumed press leaves a stale value past the logical
/// end that is never observable through this interface.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PressQueue {
    ids: Vec<i16>,
    len: usize,
}

impl PressQueue {
    pub fn with_capacity(capacity: usize) -> PressQueue {
        PressQueue {
            ids: vec![0; capacity],
            len: 0,
        }
    }

    pub fn push(&mut self, id: i16) -> bool {
        if self.len == self.ids.len() {
            warn!("dropping press {}, the queue is full", id);
            return false;
        }
        self.ids[self.len] = id;
        self.len += 1;
        true
    }

    pub fn push_button(&mut self, button: JoypadButton) -> bool {
        self.push(button.id())
    }

    /// Answers a poll for `id`: true consumes the front press by shifting
    /// the remaining ids one slot forward, false leaves the queue untouched.
    pub fn consume_front(&mut self, id: i16) -> bool {
        if self.len == 0 || self.ids[0] != id {
            return false;
        }
        for i in 0..self.len - 1 {
            self.ids[i] = self.ids[i + 1];
        }
        self.len -= 1;
        true
    }

    pub fn front(&self) -> Option<i16> {
        if self.len > 0 { Some(self.ids[0]) } else { None }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.ids.len()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

/// Addresses one pollable control: a controller port, a device class, an
/// index within the device, and the button or axis id.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct InputSlot {
    pub port: u32,
    pub device: u32,
    pub index: u32,
    pub id: u32,
}

/// Held-button levels, for cores that poll the current state every frame
/// rather than consuming one-shot presses.
#[derive(Clone, Debug, Default)]
pub struct ButtonStates {
    states: HashMap<InputSlot, i16>,
}

impl ButtonStates {
    pub fn new() -> ButtonStates {
        Default::default()
    }

    pub fn press(&mut self, slot: InputSlot) {
        self.states.insert(slot, 1);
    }

    pub fn release(&mut self, slot: InputSlot) {
        self.states.insert(slot, 0);
    }

    pub fn state(&self, slot: InputSlot) -> i16 {
        self.states.get(&slot).copied().unwrap_or(0)
    }

    pub fn pressed(&self, slot: InputSlot) -> bool {
        self.state(slot) != 0
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

#[test]
fn test_consume_front_shifts_the_queue() {
    let mut queue = PressQueue::with_capacity(3);
    for id in [5, 9, 2] {
        assert!(queue.push(id));
    }

    assert!(queue.consume_front(5));
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.front(), Some(9));

    assert!(queue.consume_front(9));
    assert!(queue.consume_front(2));
    assert!(queue.is_empty());
}

#[test]
fn test_consume_front_mismatch_leaves_queue_untouched() {
    let mut queue = PressQueue::with_capacity(3);
    queue.push(5);
    queue.push(9);

    assert!(!queue.consume_front(9));
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.front(), Some(5));
}

#[test]
fn test_consume_front_on_empty_queue() {
    let mut queue = PressQueue::with_capacity(3);
    assert!(!queue.consume_front(0));
}

#[test]
fn test_push_past_capacity() {
    let mut queue = PressQueue::with_capacity(2);
    assert!(queue.push(1));
    assert!(queue.push(2));
    assert!(!queue.push(3));
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_button_ids() {
    let tests = [
        (JoypadButton::B, 0),
        (JoypadButton::Start, 3),
        (JoypadButton::Right, 7),
        (JoypadButton::R3, 15),
    ];

    for (button, id) in tests.iter() {
        assert_eq!(button.id(), *id);
    }

    let mut queue = PressQueue::with_capacity(1);
    queue.push_button(JoypadButton::A);
    assert!(queue.consume_front(8));
}

#[test]
fn test_button_states() {
    let slot = InputSlot {
        port: 0,
        device: 1,
        index: 0,
        id: 4,
    };
    let other = InputSlot { id: 5, ..slot };

    let mut states = ButtonStates::new();
    assert_eq!(states.state(slot), 0);

    states.press(slot);
    assert!(states.pressed(slot));
    assert_eq!(states.state(slot), 1);
    assert!(!states.pressed(other));

    states.release(slot);
    assert!(!states.pressed(slot));

    states.press(other);
    states.clear();
    assert!(!states.pressed(other));
}
