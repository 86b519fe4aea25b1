use std::collections::{HashMap, HashSet};

use winit::keyboard::KeyCode;

use crate::components::Direction;

/// Logical keys the core acts on. Physical key codes stop at the binding
/// table; nothing past it sees a KeyCode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKey {
    MoveNorth,
    MoveSouth,
    MoveWest,
    MoveEast,
    Rest,
    Examine,
    Inventory,
    Confirm,
    Back,
}

impl GameKey {
    /// Movement keys carry a direction; everything else is None.
    pub fn direction(self) -> Option<Direction> {
        match self {
            GameKey::MoveNorth => Some(Direction::North),
            GameKey::MoveSouth => Some(Direction::South),
            GameKey::MoveWest => Some(Direction::West),
            GameKey::MoveEast => Some(Direction::East),
            _ => None,
        }
    }
}

/// Configurable map from physical key codes to logical keys. Several
/// physical keys may share one logical key (arrows and WASD both move).
pub struct KeyBindings {
    map: HashMap<KeyCode, GameKey>,
}

impl KeyBindings {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Built-in table used when no bindings file is present.
    pub fn defaults() -> Self {
        let mut bindings = Self::new();
        bindings.bind(KeyCode::ArrowUp, GameKey::MoveNorth);
        bindings.bind(KeyCode::KeyW, GameKey::MoveNorth);
        bindings.bind(KeyCode::ArrowDown, GameKey::MoveSouth);
        bindings.bind(KeyCode::KeyS, GameKey::MoveSouth);
        bindings.bind(KeyCode::ArrowLeft, GameKey::MoveWest);
        bindings.bind(KeyCode::KeyA, GameKey::MoveWest);
        bindings.bind(KeyCode::ArrowRight, GameKey::MoveEast);
        bindings.bind(KeyCode::KeyD, GameKey::MoveEast);
        bindings.bind(KeyCode::KeyR, GameKey::Rest);
        bindings.bind(KeyCode::KeyX, GameKey::Examine);
        bindings.bind(KeyCode::KeyI, GameKey::Inventory);
        bindings.bind(KeyCode::Enter, GameKey::Confirm);
        bindings.bind(KeyCode::Escape, GameKey::Back);
        bindings
    }

    /// Bind a physical key. Rebinding an already-bound code replaces it.
    pub fn bind(&mut self, code: KeyCode, key: GameKey) {
        self.map.insert(code, key);
    }

    pub fn lookup(&self, code: KeyCode) -> Option<GameKey> {
        self.map.get(&code).copied()
    }

    /// True if any physical key bound to `key` was pressed this frame.
    pub fn just_pressed(&self, input: &InputSnapshot, key: GameKey) -> bool {
        self.map
            .iter()
            .any(|(code, k)| *k == key && input.just_pressed(*code))
    }

    /// True if any physical key bound to `key` is currently held.
    pub fn held(&self, input: &InputSnapshot, key: GameKey) -> bool {
        self.map
            .iter()
            .any(|(code, k)| *k == key && input.held(*code))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Per-frame input state fed by the composition root. The core only ever
/// asks "just pressed this frame" and "currently held".
#[derive(Debug, Default)]
pub struct InputSnapshot {
    just_pressed: HashSet<KeyCode>,
    held: HashSet<KeyCode>,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key-down edge. The key counts as held until `release`.
    pub fn press(&mut self, code: KeyCode) {
        // Key-repeat from the OS shows up as repeated downs; only a fresh
        // down is an edge.
        if self.held.insert(code) {
            self.just_pressed.insert(code);
        }
    }

    pub fn release(&mut self, code: KeyCode) {
        self.held.remove(&code);
    }

    /// Clear edge state at the end of the frame. Held keys persist.
    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
    }

    pub fn just_pressed(&self, code: KeyCode) -> bool {
        self.just_pressed.contains(&code)
    }

    pub fn held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }
}

/// Parse a physical key name as written in the bindings file.
pub fn parse_key_code(name: &str) -> Option<KeyCode> {
    let code = match name {
        "KeyA" => KeyCode::KeyA,
        "KeyB" => KeyCode::KeyB,
        "KeyC" => KeyCode::KeyC,
        "KeyD" => KeyCode::KeyD,
        "KeyE" => KeyCode::KeyE,
        "KeyF" => KeyCode::KeyF,
        "KeyG" => KeyCode::KeyG,
        "KeyH" => KeyCode::KeyH,
        "KeyI" => KeyCode::KeyI,
        "KeyJ" => KeyCode::KeyJ,
        "KeyK" => KeyCode::KeyK,
        "KeyL" => KeyCode::KeyL,
        "KeyM" => KeyCode::KeyM,
        "KeyN" => KeyCode::KeyN,
        "KeyO" => KeyCode::KeyO,
        "KeyP" => KeyCode::KeyP,
        "KeyQ" => KeyCode::KeyQ,
        "KeyR" => KeyCode::KeyR,
        "KeyS" => KeyCode::KeyS,
        "KeyT" => KeyCode::KeyT,
        "KeyU" => KeyCode::KeyU,
        "KeyV" => KeyCode::KeyV,
        "KeyW" => KeyCode::KeyW,
        "KeyX" => KeyCode::KeyX,
        "KeyY" => KeyCode::KeyY,
        "KeyZ" => KeyCode::KeyZ,
        "Digit0" => KeyCode::Digit0,
        "Digit1" => KeyCode::Digit1,
        "Digit2" => KeyCode::Digit2,
        "Digit3" => KeyCode::Digit3,
        "Digit4" => KeyCode::Digit4,
        "Digit5" => KeyCode::Digit5,
        "Digit6" => KeyCode::Digit6,
        "Digit7" => KeyCode::Digit7,
        "Digit8" => KeyCode::Digit8,
        "Digit9" => KeyCode::Digit9,
        "ArrowUp" => KeyCode::ArrowUp,
        "ArrowDown" => KeyCode::ArrowDown,
        "ArrowLeft" => KeyCode::ArrowLeft,
        "ArrowRight" => KeyCode::ArrowRight,
        "Enter" => KeyCode::Enter,
        "Space" => KeyCode::Space,
        "Escape" => KeyCode::Escape,
        "Tab" => KeyCode::Tab,
        "Period" => KeyCode::Period,
        "Comma" => KeyCode::Comma,
        _ => return None,
    };
    Some(code)
}

/// Parse a logical key name as written in the bindings file.
pub fn parse_game_key(name: &str) -> Option<GameKey> {
    let key = match name {
        "MoveNorth" => GameKey::MoveNorth,
        "MoveSouth" => GameKey::MoveSouth,
        "MoveWest" => GameKey::MoveWest,
        "MoveEast" => GameKey::MoveEast,
        "Rest" => GameKey::Rest,
        "Examine" => GameKey::Examine,
        "Inventory" => GameKey::Inventory,
        "Confirm" => GameKey::Confirm,
        "Back" => GameKey::Back,
        _ => return None,
    };
    Some(key)
}
