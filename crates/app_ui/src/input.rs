//! Input handling and keybinding resolution

use app_core::{Command, CommandScope};
use std::collections::HashMap;
use winit::event::{ElementState, KeyEvent, MouseButton};
use winit::keyboard::{Key, ModifiersState, NamedKey};

/// Input handler that maps keys/mouse to commands
pub struct InputHandler {
    /// Key string -> every command bound to it; the window mode picks one
    bindings: HashMap<String, Vec<String>>,

    /// Current modifier state
    modifiers: ModifiersState,
}

impl InputHandler {
    /// Create a new input handler from command -> keys bindings
    pub fn new(bindings: &HashMap<String, Vec<String>>) -> Self {
        let mut key_to_commands: HashMap<String, Vec<String>> = HashMap::new();

        for (command, keys) in bindings {
            for key in keys {
                key_to_commands
                    .entry(key.to_lowercase())
                    .or_default()
                    .push(command.clone());
            }
        }

        Self {
            bindings: key_to_commands,
            modifiers: ModifiersState::empty(),
        }
    }

    /// Update modifier state
    pub fn update_modifiers(&mut self, modifiers: ModifiersState) {
        self.modifiers = modifiers;
    }

    /// Modifier that turns a canvas drag into a rectangle selection
    pub fn selection_modifier(&self) -> bool {
        self.modifiers.control_key() || self.modifiers.super_key() || self.modifiers.shift_key()
    }

    /// Handle a key event and return the command bound to it in `context`
    pub fn handle_key(&self, event: &KeyEvent, context: CommandScope) -> Option<Command> {
        if event.state != ElementState::Pressed {
            return None;
        }

        let key_str = key_to_string(&event.logical_key);
        if key_str.is_empty() {
            return None;
        }
        let full_key = build_key_string(self.modifiers, &key_str);

        tracing::debug!("Key pressed: {}", full_key);
        self.resolve(&full_key, context)
    }

    /// Look up a key string such as `Ctrl+s` for the given window mode
    pub fn resolve(&self, key: &str, context: CommandScope) -> Option<Command> {
        self.bindings
            .get(&key.to_lowercase())?
            .iter()
            .find(|id| CommandScope::of(id).applies_to(context))
            .map(|id| Command::new(id))
    }

    /// Handle mouse button
    pub fn handle_mouse_button(&self, button: MouseButton, state: ElementState) -> Option<Command> {
        if state != ElementState::Pressed {
            return None;
        }
        match button {
            MouseButton::Back => Some(Command::new(app_core::CommandId::NAV_BACK)),
            _ => None,
        }
    }
}

/// Build a key string with modifiers
fn build_key_string(modifiers: ModifiersState, key: &str) -> String {
    let mut parts = Vec::new();

    if modifiers.control_key() {
        parts.push("Ctrl");
    }
    if modifiers.alt_key() {
        parts.push("Alt");
    }
    // Shifted characters already arrive as their shifted glyph
    if modifiers.shift_key() && (key.chars().count() > 1 || key.chars().all(char::is_alphabetic)) {
        parts.push("Shift");
    }
    if modifiers.super_key() {
        parts.push("Super");
    }

    parts.push(key);
    parts.join("+")
}

/// Convert a logical key to a string
fn key_to_string(key: &Key) -> String {
    match key {
        Key::Named(named) => match named {
            NamedKey::Space => "Space".to_string(),
            NamedKey::Enter => "Return".to_string(),
            NamedKey::Tab => "Tab".to_string(),
            NamedKey::Escape => "Escape".to_string(),
            NamedKey::Backspace => "Backspace".to_string(),
            NamedKey::Delete => "Delete".to_string(),
            NamedKey::Home => "Home".to_string(),
            NamedKey::End => "End".to_string(),
            NamedKey::ArrowUp => "Up".to_string(),
            NamedKey::ArrowDown => "Down".to_string(),
            NamedKey::ArrowLeft => "Left".to_string(),
            NamedKey::ArrowRight => "Right".to_string(),
            NamedKey::F4 => "F4".to_string(),
            NamedKey::F11 => "F11".to_string(),
            _ => format!("{:?}", named),
        },
        Key::Character(c) => c.to_string(),
        _ => String::new(),
    }
}
