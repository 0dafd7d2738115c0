use gesso_core::{EventName, InputEvent};
use gesso_ui_graphics::Point;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, KeyboardInput, MouseButton, VirtualKeyCode};

pub struct DesktopWinitPlatform {
    scale_factor: f64,
    cursor: Point,
}

impl DesktopWinitPlatform {
    pub fn new(scale_factor: f64) -> Self {
        Self {
            scale_factor,
            cursor: Point::ZERO,
        }
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn set_scale_factor(&mut self, factor: f64) {
        self.scale_factor = factor;
    }

    pub fn pointer_position(&self, position: PhysicalPosition<f64>) -> Point {
        Point {
            x: (position.x / self.scale_factor) as f32,
            y: (position.y / self.scale_factor) as f32,
        }
    }

    /// Records the cursor and returns its logical position.
    pub fn set_cursor(&mut self, position: PhysicalPosition<f64>) -> Point {
        self.cursor = self.pointer_position(position);
        self.cursor
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn keyboard_event(&self, input: &KeyboardInput) -> Option<InputEvent> {
        self.key_event(input.state, input.virtual_keycode?)
    }

    /// `keydown`/`keyup` carrying the DOM key code, for keys that have one.
    pub fn key_event(&self, state: ElementState, key: VirtualKeyCode) -> Option<InputEvent> {
        let code = dom_key_code(key)?;
        Some(match state {
            ElementState::Pressed => InputEvent::key_down(code),
            ElementState::Released => InputEvent::key_up(code),
        })
    }

    /// Pointer events raised by a mouse button change. Only the left button
    /// is routed; releasing it also produces a `click`.
    pub fn mouse_events(&self, state: ElementState, button: MouseButton) -> Vec<EventName> {
        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => vec![EventName::MouseDown],
            (MouseButton::Left, ElementState::Released) => {
                vec![EventName::MouseUp, EventName::Click]
            }
            _ => Vec::new(),
        }
    }
}

impl Default for DesktopWinitPlatform {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// DOM `keyCode` for a winit virtual key.
pub fn dom_key_code(key: VirtualKeyCode) -> Option<u32> {
    use VirtualKeyCode::*;

    let code = match key {
        Back => 8,
        Tab => 9,
        Return | NumpadEnter => 13,
        LShift | RShift => 16,
        LControl | RControl => 17,
        LAlt | RAlt => 18,
        Pause => 19,
        Capital => 20,
        Escape => 27,
        Space => 32,
        PageUp => 33,
        PageDown => 34,
        End => 35,
        Home => 36,
        Left => 37,
        Up => 38,
        Right => 39,
        Down => 40,
        Insert => 45,
        Delete => 46,
        Key0 => 48,
        Key1 => 49,
        Key2 => 50,
        Key3 => 51,
        Key4 => 52,
        Key5 => 53,
        Key6 => 54,
        Key7 => 55,
        Key8 => 56,
        Key9 => 57,
        A => 65,
        B => 66,
        C => 67,
        D => 68,
        E => 69,
        F => 70,
        G => 71,
        H => 72,
        I => 73,
        J => 74,
        K => 75,
        L => 76,
        M => 77,
        N => 78,
        O => 79,
        P => 80,
        Q => 81,
        R => 82,
        S => 83,
        T => 84,
        U => 85,
        V => 86,
        W => 87,
        X => 88,
        Y => 89,
        Z => 90,
        Numpad0 => 96,
        Numpad1 => 97,
        Numpad2 => 98,
        Numpad3 => 99,
        Numpad4 => 100,
        Numpad5 => 101,
        Numpad6 => 102,
        Numpad7 => 103,
        Numpad8 => 104,
        Numpad9 => 105,
        NumpadMultiply => 106,
        NumpadAdd => 107,
        NumpadSubtract => 109,
        NumpadDecimal => 110,
        NumpadDivide => 111,
        F1 => 112,
        F2 => 113,
        F3 => 114,
        F4 => 115,
        F5 => 116,
        F6 => 117,
        F7 => 118,
        F8 => 119,
        F9 => 120,
        F10 => 121,
        F11 => 122,
        F12 => 123,
        Numlock => 144,
        Scroll => 145,
        Semicolon => 186,
        Equals => 187,
        Comma => 188,
        Minus => 189,
        Period => 190,
        Slash => 191,
        Grave => 192,
        LBracket => 219,
        Backslash => 220,
        RBracket => 221,
        Apostrophe => 222,
        _ => return None,
    };
    Some(code)
}
