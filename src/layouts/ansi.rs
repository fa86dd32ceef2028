use crate::resolver::Hand;
use evdev::KeyCode as K;

const LEFT: &[K] = &[
    K::KEY_ESC,
    K::KEY_GRAVE,
    K::KEY_1,
    K::KEY_2,
    K::KEY_3,
    K::KEY_4,
    K::KEY_5,
    K::KEY_TAB,
    K::KEY_Q,
    K::KEY_W,
    K::KEY_E,
    K::KEY_R,
    K::KEY_T,
    K::KEY_CAPSLOCK,
    K::KEY_A,
    K::KEY_S,
    K::KEY_D,
    K::KEY_F,
    K::KEY_G,
    K::KEY_LEFTSHIFT,
    K::KEY_Z,
    K::KEY_X,
    K::KEY_C,
    K::KEY_V,
    K::KEY_B,
    K::KEY_LEFTCTRL,
    K::KEY_LEFTMETA,
    K::KEY_LEFTALT,
    K::KEY_F1,
    K::KEY_F2,
    K::KEY_F3,
    K::KEY_F4,
    K::KEY_F5,
    K::KEY_F6,
];

const RIGHT: &[K] = &[
    K::KEY_6,
    K::KEY_7,
    K::KEY_8,
    K::KEY_9,
    K::KEY_0,
    K::KEY_MINUS,
    K::KEY_EQUAL,
    K::KEY_BACKSPACE,
    K::KEY_Y,
    K::KEY_U,
    K::KEY_I,
    K::KEY_O,
    K::KEY_P,
    K::KEY_LEFTBRACE,
    K::KEY_RIGHTBRACE,
    K::KEY_BACKSLASH,
    K::KEY_H,
    K::KEY_J,
    K::KEY_K,
    K::KEY_L,
    K::KEY_SEMICOLON,
    K::KEY_APOSTROPHE,
    K::KEY_ENTER,
    K::KEY_N,
    K::KEY_M,
    K::KEY_COMMA,
    K::KEY_DOT,
    K::KEY_SLASH,
    K::KEY_RIGHTSHIFT,
    K::KEY_RIGHTALT,
    K::KEY_RIGHTMETA,
    K::KEY_COMPOSE,
    K::KEY_RIGHTCTRL,
    K::KEY_F7,
    K::KEY_F8,
    K::KEY_F9,
    K::KEY_F10,
    K::KEY_F11,
    K::KEY_F12,
    K::KEY_INSERT,
    K::KEY_DELETE,
    K::KEY_HOME,
    K::KEY_END,
    K::KEY_PAGEUP,
    K::KEY_PAGEDOWN,
    K::KEY_UP,
    K::KEY_DOWN,
    K::KEY_LEFT,
    K::KEY_RIGHT,
];

// Space and the thumb row stay unassigned.
pub(super) fn hand(key: &K) -> Hand {
    if LEFT.contains(key) {
        Hand::Left
    } else if RIGHT.contains(key) {
        Hand::Right
    } else {
        Hand::Unassigned
    }
}

pub(super) fn is_typing_key(key: &K) -> bool {
    matches!(
        *key,
        K::KEY_A
            | K::KEY_B
            | K::KEY_C
            | K::KEY_D
            | K::KEY_E
            | K::KEY_F
            | K::KEY_G
            | K::KEY_H
            | K::KEY_I
            | K::KEY_J
            | K::KEY_K
            | K::KEY_L
            | K::KEY_M
            | K::KEY_N
            | K::KEY_O
            | K::KEY_P
            | K::KEY_Q
            | K::KEY_R
            | K::KEY_S
            | K::KEY_T
            | K::KEY_U
            | K::KEY_V
            | K::KEY_W
            | K::KEY_X
            | K::KEY_Y
            | K::KEY_Z
            | K::KEY_SPACE
            | K::KEY_COMMA
            | K::KEY_DOT
            | K::KEY_SEMICOLON
            | K::KEY_SLASH
            | K::KEY_APOSTROPHE
            | K::KEY_MINUS
    )
}
