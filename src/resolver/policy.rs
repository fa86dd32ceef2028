//! Chord decision: what a second key press means for an unsettled tap-hold key.
//!
//! The decision runs an ordered chain of [`ChordRule`]s. Each rule either answers
//! with a [`Settlement`] or passes. The first answer wins and an exhausted chain
//! settles as tap, since a false hold (a stray modifier) does more damage than a
//! false tap.
//!
//! Default order:
//!
//! 1. [`ChordRule::Override`]: per-pair `ForceTap`/`ForceHold` entries win outright.
//! 2. [`ChordRule::Expired`]: the timeout already elapsed but no tick polled it yet.
//! 3. [`ChordRule::Streak`]: a typing streak was running when the key went down.
//! 4. [`ChordRule::Hands`]: same hand holds, opposite hands tap, unknown passes.

use crate::layouts::Layout;
use crate::mods::Mods;
use evdev::KeyCode;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
    Unassigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairOverride {
    ForceTap,
    ForceHold,
    UseDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Tap,
    Hold,
}

/// Caller supplied knowledge about keys.
pub trait KeyPolicy: Send {
    fn hand(&self, key: KeyCode) -> Hand;

    fn pair_override(&self, _tap_hold: KeyCode, _other: KeyCode) -> PairOverride {
        PairOverride::UseDefault
    }

    /// Whether pressing `key` keeps a typing streak going.
    fn streak_continues(&self, key: KeyCode) -> bool;

    /// Whether a hold producing `mods` may be applied before it settles.
    /// Alt and Gui are excluded by default: a lone tap of either opens menus.
    fn eager_mods(&self, mods: Mods) -> bool {
        !mods.intersects(Mods::ALT | Mods::GUI)
    }
}

/// Everything a rule may look at.
pub struct Chord<'a> {
    pub tap_hold: KeyCode,
    pub other: KeyCode,
    /// Milliseconds since the tap-hold key went down.
    pub elapsed: u32,
    pub timeout: u32,
    /// Whether a streak was active at the tap-hold press.
    pub streak: bool,
    pub policy: &'a dyn KeyPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordRule {
    Override,
    Expired,
    Streak,
    Hands,
}

impl ChordRule {
    pub fn name(self) -> &'static str {
        match self {
            ChordRule::Override => "override",
            ChordRule::Expired => "expired",
            ChordRule::Streak => "streak",
            ChordRule::Hands => "hands",
        }
    }

    pub fn decide(self, chord: &Chord) -> Option<Settlement> {
        match self {
            ChordRule::Override => match chord.policy.pair_override(chord.tap_hold, chord.other) {
                PairOverride::ForceTap => Some(Settlement::Tap),
                PairOverride::ForceHold => Some(Settlement::Hold),
                PairOverride::UseDefault => None,
            },
            ChordRule::Expired => (chord.elapsed >= chord.timeout).then_some(Settlement::Hold),
            ChordRule::Streak => chord.streak.then_some(Settlement::Tap),
            ChordRule::Hands => {
                match (
                    chord.policy.hand(chord.tap_hold),
                    chord.policy.hand(chord.other),
                ) {
                    (Hand::Unassigned, _) | (_, Hand::Unassigned) => None,
                    (a, b) if a == b => Some(Settlement::Hold),
                    _ => Some(Settlement::Tap),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordPolicy {
    rules: Vec<ChordRule>,
}

impl ChordPolicy {
    pub const DEFAULT_ORDER: [ChordRule; 4] = [
        ChordRule::Override,
        ChordRule::Expired,
        ChordRule::Streak,
        ChordRule::Hands,
    ];

    pub fn new(rules: Vec<ChordRule>) -> Self {
        Self { rules }
    }

    /// Settlement plus the rule that produced it, `None` when the chain fell through.
    pub fn decide(&self, chord: &Chord) -> (Settlement, Option<ChordRule>) {
        self.rules
            .iter()
            .find_map(|rule| rule.decide(chord).map(|settlement| (settlement, Some(*rule))))
            .unwrap_or((Settlement::Tap, None))
    }
}

impl Default for ChordPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ORDER.to_vec())
    }
}

/// [`KeyPolicy`] backed by a layout hand table and per-keyboard tables.
#[derive(Debug, Clone, Default)]
pub struct KeymapPolicy {
    layout: Layout,
    hands: HashMap<KeyCode, Hand>,
    overrides: HashMap<(KeyCode, KeyCode), PairOverride>,
    streak_keys: Option<HashSet<KeyCode>>,
}

impl KeymapPolicy {
    pub fn from_layout(layout: Layout) -> Self {
        Self {
            layout,
            ..Default::default()
        }
    }

    pub fn with_hand(mut self, key: KeyCode, hand: Hand) -> Self {
        self.hands.insert(key, hand);
        self
    }

    pub fn with_override(mut self, tap_hold: KeyCode, other: KeyCode, decision: PairOverride) -> Self {
        self.overrides.insert((tap_hold, other), decision);
        self
    }

    pub fn with_streak_keys(mut self, keys: impl IntoIterator<Item = KeyCode>) -> Self {
        self.streak_keys = Some(keys.into_iter().collect());
        self
    }
}

impl KeyPolicy for KeymapPolicy {
    fn hand(&self, key: KeyCode) -> Hand {
        self.hands
            .get(&key)
            .copied()
            .unwrap_or_else(|| self.layout.hand(&key))
    }

    fn pair_override(&self, tap_hold: KeyCode, other: KeyCode) -> PairOverride {
        self.overrides
            .get(&(tap_hold, other))
            .copied()
            .unwrap_or(PairOverride::UseDefault)
    }

    fn streak_continues(&self, key: KeyCode) -> bool {
        match &self.streak_keys {
            Some(keys) => keys.contains(&key),
            None => self.layout.is_typing_key(&key),
        }
    }
}
