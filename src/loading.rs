use serde::Deserialize;

use crate::input::{KeyBindings, parse_game_key, parse_key_code};

/// Key-repeat timing, in seconds.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InputConfig {
    /// Pause after the immediate first fire of a held movement key.
    pub initial_delay: f32,
    /// Interval between re-fires once repeat has started.
    pub repeat_delay: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            initial_delay: 0.35,
            repeat_delay: 0.08,
        }
    }
}

/// Parse a KDL file and return the document. Logs a warning and returns None on failure.
fn parse_kdl_file(path: &str) -> Option<kdl::KdlDocument> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("failed to read {}: {}", path, e);
            return None;
        }
    };
    match content.parse::<kdl::KdlDocument>() {
        Ok(doc) => Some(doc),
        Err(e) => {
            log::warn!("failed to parse KDL {}: {}", path, e);
            None
        }
    }
}

/// Load key-repeat timing from a RON file.
pub fn load_input_config(path: &str) -> InputConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("failed to read {}: {}, using default input config", path, e);
            return InputConfig::default();
        }
    };
    match ron::from_str::<InputConfig>(&content) {
        Ok(config) => config,
        Err(e) => {
            log::warn!(
                "failed to parse RON {}: {}, using default input config",
                path,
                e
            );
            InputConfig::default()
        }
    }
}

/// Load the binding table from a KDL file of `bind` nodes, e.g.
/// `bind "KeyW" "MoveNorth"`. Unknown names are logged and skipped; a
/// missing, malformed, or empty file falls back to the default table.
pub fn load_bindings(path: &str) -> KeyBindings {
    let Some(doc) = parse_kdl_file(path) else {
        return KeyBindings::defaults();
    };

    let mut bindings = KeyBindings::new();
    for node in doc.nodes() {
        if node.name().to_string() != "bind" {
            continue;
        }

        let Some(code_name) = node.get(0).and_then(|v| v.as_string()) else {
            log::warn!("bind node without a key code in {}", path);
            continue;
        };
        let Some(key_name) = node.get(1).and_then(|v| v.as_string()) else {
            log::warn!("bind {:?} without an action in {}", code_name, path);
            continue;
        };

        let Some(code) = parse_key_code(code_name) else {
            log::warn!("unknown key code {:?} in {}", code_name, path);
            continue;
        };
        let Some(key) = parse_game_key(key_name) else {
            log::warn!("unknown action {:?} in {}", key_name, path);
            continue;
        };

        bindings.bind(code, key);
    }

    if bindings.is_empty() {
        log::warn!("{} bound no keys, using default bindings", path);
        return KeyBindings::defaults();
    }
    bindings
}
