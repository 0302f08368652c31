//! Overlay input processing
//!
//! Collects GLFW window events as egui events between two frames. The
//! queue is drained into the `RawInput` of the next overlay frame.

use egui::{Event, Modifiers, PointerButton, Pos2};
use glfw::{Action, Key, MouseButton};

/// Lines scrolled per wheel notch, in points
const SCROLL_LINE_HEIGHT: f32 = 24.0;

/// Queue of egui events built from GLFW callbacks
#[derive(Debug, Clone, Default)]
pub struct UiInputProcessor {
    events: Vec<Event>,
    modifiers: Modifiers,
    pointer_pos: Pos2,
}

impl UiInputProcessor {
    /// Create an empty processor
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a key press or release
    pub fn key(&mut self, key: Key, action: Action, mods: glfw::Modifiers) {
        self.modifiers = translate_modifiers(mods);

        if let Some(key) = translate_key(key) {
            self.events.push(Event::Key {
                key,
                physical_key: None,
                pressed: action != Action::Release,
                repeat: action == Action::Repeat,
                modifiers: self.modifiers,
            });
        }
    }

    /// Queue a typed character
    pub fn char(&mut self, character: char) {
        if !character.is_control() {
            self.events.push(Event::Text(character.to_string()));
        }
    }

    /// Queue a mouse button press or release at the last pointer position
    pub fn mouse_button(&mut self, button: MouseButton, action: Action, mods: glfw::Modifiers) {
        self.modifiers = translate_modifiers(mods);

        if let Some(button) = translate_mouse_button(button) {
            self.events.push(Event::PointerButton {
                pos: self.pointer_pos,
                button,
                pressed: action == Action::Press,
                modifiers: self.modifiers,
            });
        }
    }

    /// Queue a pointer move
    pub fn cursor_position(&mut self, x: f64, y: f64) {
        self.pointer_pos = Pos2::new(x as f32, y as f32);
        self.events.push(Event::PointerMoved(self.pointer_pos));
    }

    /// Queue a scroll wheel movement
    pub fn scroll(&mut self, x_offset: f64, y_offset: f64) {
        self.events.push(Event::MouseWheel {
            unit: egui::MouseWheelUnit::Point,
            delta: egui::vec2(x_offset as f32, y_offset as f32) * SCROLL_LINE_HEIGHT,
            modifiers: self.modifiers,
        });
    }

    /// Modifier state from the last key or button event
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Take all queued events
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

fn translate_modifiers(mods: glfw::Modifiers) -> Modifiers {
    let ctrl = mods.contains(glfw::Modifiers::Control);
    Modifiers {
        alt: mods.contains(glfw::Modifiers::Alt),
        ctrl,
        shift: mods.contains(glfw::Modifiers::Shift),
        mac_cmd: false,
        command: ctrl,
    }
}

fn translate_mouse_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Button1 => Some(PointerButton::Primary),
        MouseButton::Button2 => Some(PointerButton::Secondary),
        MouseButton::Button3 => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Keys the overlay widgets react to: text editing, navigation and the
/// usual editing shortcuts.
fn translate_key(key: Key) -> Option<egui::Key> {
    let key = match key {
        Key::Left => egui::Key::ArrowLeft,
        Key::Right => egui::Key::ArrowRight,
        Key::Up => egui::Key::ArrowUp,
        Key::Down => egui::Key::ArrowDown,
        Key::Escape => egui::Key::Escape,
        Key::Tab => egui::Key::Tab,
        Key::Backspace => egui::Key::Backspace,
        Key::Enter | Key::KpEnter => egui::Key::Enter,
        Key::Space => egui::Key::Space,
        Key::Insert => egui::Key::Insert,
        Key::Delete => egui::Key::Delete,
        Key::Home => egui::Key::Home,
        Key::End => egui::Key::End,
        Key::PageUp => egui::Key::PageUp,
        Key::PageDown => egui::Key::PageDown,
        Key::Minus | Key::KpSubtract => egui::Key::Minus,
        Key::A => egui::Key::A,
        Key::C => egui::Key::C,
        Key::V => egui::Key::V,
        Key::X => egui::Key::X,
        Key::Y => egui::Key::Y,
        Key::Z => egui::Key::Z,
        _ => return None,
    };
    Some(key)
}
