//! Keyboard → kart controls

use minifb::Key;
use openkart_core::{Controls, PlayerInput};

/// One player's keys
#[derive(Debug, Clone, Copy)]
pub struct KeyMap {
    pub accelerate: Key,
    pub brake: Key,
    pub left: Key,
    pub right: Key,
    pub drift: Key,
}

/// Player 1: WASD, LeftShift drifts
pub const PLAYER_ONE: KeyMap = KeyMap {
    accelerate: Key::W,
    brake: Key::S,
    left: Key::A,
    right: Key::D,
    drift: Key::LeftShift,
};

/// Player 2: arrow keys, RightCtrl drifts
pub const PLAYER_TWO: KeyMap = KeyMap {
    accelerate: Key::Up,
    brake: Key::Down,
    left: Key::Left,
    right: Key::Right,
    drift: Key::RightCtrl,
};

pub const KEY_MAPS: [KeyMap; 2] = [PLAYER_ONE, PLAYER_TWO];

impl KeyMap {
    /// Poll continuous key state through `is_down`.
    pub fn read(&self, is_down: impl Fn(Key) -> bool) -> PlayerInput {
        PlayerInput {
            controls: Controls {
                accelerate: is_down(self.accelerate),
                brake: is_down(self.brake),
                left: is_down(self.left),
                right: is_down(self.right),
            },
            drift: is_down(self.drift),
        }
    }
}

/// Inputs for the first `players` players
pub fn read_players(players: usize, is_down: impl Fn(Key) -> bool) -> Vec<PlayerInput> {
    KEY_MAPS.iter().take(players).map(|map| map.read(&is_down)).collect()
}
