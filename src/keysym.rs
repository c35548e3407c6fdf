// Copyright 2025 Dustin McAfee
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Mapping from platform-neutral key identifiers to X11 keysym values.
//!
//! Named keys (arrows, function keys, modifiers, editing keys) use the fixed
//! keysym table below. Plain text bypasses the table: each character is
//! transmitted with its Unicode code point as the keysym, which servers honor
//! for Latin-1 and commonly beyond.

/// A platform-neutral identifier for a named (non-character) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Backspace,
    Tab,
    Return,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Left,
    Up,
    Right,
    Down,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Shift,
    Control,
    Meta,
    Alt,
}

impl Key {
    /// The X11 keysym transmitted for this key.
    pub fn keysym(self) -> u32 {
        match self {
            Key::Backspace => 0xff08,
            Key::Tab => 0xff09,
            Key::Return => 0xff0d,
            Key::Insert => 0xff63,
            Key::Delete => 0xffff,
            Key::Home => 0xff50,
            Key::End => 0xff57,
            Key::PageUp => 0xff55,
            Key::PageDown => 0xff56,
            Key::Left => 0xff51,
            Key::Up => 0xff52,
            Key::Right => 0xff53,
            Key::Down => 0xff54,
            Key::F1 => 0xffbe,
            Key::F2 => 0xffbf,
            Key::F3 => 0xffc0,
            Key::F4 => 0xffc1,
            Key::F5 => 0xffc2,
            Key::F6 => 0xffc3,
            Key::F7 => 0xffc4,
            Key::F8 => 0xffc5,
            Key::F9 => 0xffc6,
            Key::F10 => 0xffc7,
            Key::F11 => 0xffc8,
            Key::F12 => 0xffc9,
            Key::Shift => 0xffe1,
            Key::Control => 0xffe3,
            Key::Meta => 0xffe7,
            Key::Alt => 0xffe9,
        }
    }
}

/// The keysym used when sending a text character: its Unicode code point.
pub fn char_keysym(c: char) -> u32 {
    c as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys_map_to_x11_keysyms() {
        assert_eq!(Key::Backspace.keysym(), 0xff08);
        assert_eq!(Key::Return.keysym(), 0xff0d);
        assert_eq!(Key::Delete.keysym(), 0xffff);
        assert_eq!(Key::Left.keysym(), 0xff51);
        assert_eq!(Key::Down.keysym(), 0xff54);
        assert_eq!(Key::F1.keysym(), 0xffbe);
        assert_eq!(Key::F12.keysym(), 0xffc9);
        assert_eq!(Key::Shift.keysym(), 0xffe1);
    }

    #[test]
    fn text_uses_code_points() {
        assert_eq!(char_keysym('a'), 0x61);
        assert_eq!(char_keysym('é'), 0xe9);
        assert_eq!(char_keysym('€'), 0x20ac);
    }
}
