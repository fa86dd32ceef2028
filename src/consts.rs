pub const RELEASE: i32 = 0;
pub const PRESS: i32 = 1;
pub const REPEAT: i32 = 2;

/// Hold timeout, ms.
pub const DEFAULT_TIMEOUT: u16 = 200;
/// Streak window, ms.
pub const DEFAULT_STREAK_WINDOW: u16 = 100;
/// Scan tick, ms.
pub const DEFAULT_TICK: u16 = 5;
