use evdev::KeyCode;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Modifier bitmask in HID report order.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Mods(u8);

const MOD_KEYS: [(Mods, KeyCode); 8] = [
    (Mods::LCTRL, KeyCode::KEY_LEFTCTRL),
    (Mods::LSHIFT, KeyCode::KEY_LEFTSHIFT),
    (Mods::LALT, KeyCode::KEY_LEFTALT),
    (Mods::LGUI, KeyCode::KEY_LEFTMETA),
    (Mods::RCTRL, KeyCode::KEY_RIGHTCTRL),
    (Mods::RSHIFT, KeyCode::KEY_RIGHTSHIFT),
    (Mods::RALT, KeyCode::KEY_RIGHTALT),
    (Mods::RGUI, KeyCode::KEY_RIGHTMETA),
];

impl Mods {
    pub const NONE: Mods = Mods(0);
    pub const LCTRL: Mods = Mods(0x01);
    pub const LSHIFT: Mods = Mods(0x02);
    pub const LALT: Mods = Mods(0x04);
    pub const LGUI: Mods = Mods(0x08);
    pub const RCTRL: Mods = Mods(0x10);
    pub const RSHIFT: Mods = Mods(0x20);
    pub const RALT: Mods = Mods(0x40);
    pub const RGUI: Mods = Mods(0x80);

    pub const CTRL: Mods = Mods(0x11);
    pub const SHIFT: Mods = Mods(0x22);
    pub const ALT: Mods = Mods(0x44);
    pub const GUI: Mods = Mods(0x88);

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Mods) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Mods) -> bool {
        self.0 & other.0 != 0
    }

    /// The modifier bit for a single modifier key.
    pub fn from_key(key: KeyCode) -> Option<Mods> {
        MOD_KEYS
            .iter()
            .find(|(_, code)| *code == key)
            .map(|(mods, _)| *mods)
    }

    /// Combined mask when every key is a modifier, `None` otherwise.
    pub fn from_keys(keys: &[KeyCode]) -> Option<Mods> {
        if keys.is_empty() {
            return None;
        }
        keys.iter()
            .try_fold(Mods::NONE, |acc, key| Mods::from_key(*key).map(|m| acc | m))
    }

    /// Modifier keys making up this mask, in HID bit order.
    pub fn keys(self) -> Vec<KeyCode> {
        MOD_KEYS
            .iter()
            .filter(|(mods, _)| self.contains(*mods))
            .map(|(_, key)| *key)
            .collect()
    }
}

impl BitOr for Mods {
    type Output = Mods;

    fn bitor(self, rhs: Mods) -> Mods {
        Mods(self.0 | rhs.0)
    }
}

impl BitOrAssign for Mods {
    fn bitor_assign(&mut self, rhs: Mods) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Mods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mods({:#04x})", self.0)
    }
}

pub fn is_modifier(key: &KeyCode) -> bool {
    Mods::from_key(*key).is_some()
}
