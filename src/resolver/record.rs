use evdev::KeyCode;
use std::time::Instant;

/// Millisecond tick count. Wraps around; compare with [`Timestamp::elapsed_since`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// Milliseconds from `earlier` to `self`, as an unsigned wrapping difference.
    pub const fn elapsed_since(self, earlier: Timestamp) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    pub const fn wrapping_add(self, ms: u32) -> Self {
        Timestamp(self.0.wrapping_add(ms))
    }
}

/// Turns wall clock instants into [`Timestamp`]s relative to process start.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now(&self) -> Timestamp {
        // Truncation is the wraparound.
        Timestamp(self.start.elapsed().as_millis() as u32)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Tap information attached to records the resolver injects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TapInfo {
    /// 0 for a hold, 1 for a tap.
    pub count: u8,
    /// Set when another key press settled the tap.
    pub interrupted: bool,
}

impl TapInfo {
    pub const HOLD: TapInfo = TapInfo {
        count: 0,
        interrupted: false,
    };

    pub const fn tap(interrupted: bool) -> Self {
        TapInfo {
            count: 1,
            interrupted,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyRecord {
    pub key: KeyCode,
    pub pressed: bool,
    pub time: Timestamp,
    /// `None` for physical events.
    pub tap: Option<TapInfo>,
}

impl KeyRecord {
    pub fn new(key: KeyCode, pressed: bool, time: Timestamp) -> Self {
        Self {
            key,
            pressed,
            time,
            tap: None,
        }
    }

    pub fn press(key: KeyCode, time: Timestamp) -> Self {
        Self::new(key, true, time)
    }

    pub fn release(key: KeyCode, time: Timestamp) -> Self {
        Self::new(key, false, time)
    }

    pub fn is_hold(&self) -> bool {
        matches!(self.tap, Some(TapInfo { count: 0, .. }))
    }
}
