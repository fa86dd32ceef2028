mod ansi;

use crate::resolver::Hand;
use evdev::KeyCode;
use serde::{Deserialize, Serialize};

/// Built-in physical key tables: which hand types each key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Layout {
    #[default]
    Ansi,
    /// No built-in table, every key is unassigned unless configured.
    Blank,
}

impl Layout {
    pub fn hand(self, key: &KeyCode) -> Hand {
        match self {
            Layout::Ansi => ansi::hand(key),
            Layout::Blank => Hand::Unassigned,
        }
    }

    /// Keys that count as text typing for streak purposes.
    pub fn is_typing_key(self, key: &KeyCode) -> bool {
        match self {
            Layout::Ansi => ansi::is_typing_key(key),
            Layout::Blank => false,
        }
    }
}
