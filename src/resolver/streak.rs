use crate::resolver::policy::KeyPolicy;
use crate::resolver::record::Timestamp;
use evdev::KeyCode;

/// Tracks whether the user is in the middle of typing text.
pub trait StreakTimer: Send {
    /// Called for every physical press the resolver sees.
    fn record(&mut self, key: KeyCode, time: Timestamp, policy: &dyn KeyPolicy);

    fn is_active(&self, now: Timestamp) -> bool;
}

/// Streaks switched off: never active, nothing recorded.
pub struct NoStreak;

impl StreakTimer for NoStreak {
    fn record(&mut self, _key: KeyCode, _time: Timestamp, _policy: &dyn KeyPolicy) {}

    fn is_active(&self, _now: Timestamp) -> bool {
        false
    }
}

pub struct TypingStreak {
    window: u32,
    last: Option<Timestamp>,
}

impl TypingStreak {
    pub fn new(window: u32) -> Self {
        Self { window, last: None }
    }
}

impl StreakTimer for TypingStreak {
    fn record(&mut self, key: KeyCode, time: Timestamp, policy: &dyn KeyPolicy) {
        self.last = policy.streak_continues(key).then_some(time);
    }

    fn is_active(&self, now: Timestamp) -> bool {
        self.last
            .is_some_and(|last| now.elapsed_since(last) < self.window)
    }
}

pub fn streak_timer(window: Option<u16>) -> Box<dyn StreakTimer> {
    match window {
        Some(window) => Box::new(TypingStreak::new(window as u32)),
        None => Box::new(NoStreak),
    }
}
