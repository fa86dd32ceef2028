//! Tap-hold resolver.
//!
//! Sits in front of the host's default key handling, holds back the press of at most
//! one tap-hold key and replays it as a tap or a hold once the outcome is known.

pub mod host;
pub mod policy;
pub mod record;
pub mod streak;

#[cfg(test)]
mod proptests;

use crate::mods::Mods;
use anyhow::Result;
use colored::Colorize;
use evdev::KeyCode;
use log::debug;
use std::collections::HashMap;
use std::time::Duration;

pub use host::{Action, Host};
pub use policy::{Chord, ChordPolicy, ChordRule, Hand, KeyPolicy, KeymapPolicy, PairOverride, Settlement};
pub use record::{Clock, KeyRecord, TapInfo, Timestamp};
pub use streak::{NoStreak, StreakTimer, TypingStreak, streak_timer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    /// A tap-hold key is down and not yet resolved.
    Unsettled,
    /// Nothing pending.
    Released,
    /// The pending key settled as tap; waiting for its physical release.
    Tapping,
    /// The pending key settled as hold; waiting for its physical release.
    Holding,
    /// Set while an injected record runs through the host.
    Recursing,
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Hold timeout in milliseconds, unless a key overrides it.
    pub timeout: u16,
    /// Pause between the injected tap press and release, in milliseconds.
    pub tap_delay: u16,
    /// Streak validity window in milliseconds, `None` disables streaks.
    pub streak_window: Option<u16>,
    pub eager_mods: bool,
    pub chord_rules: Vec<ChordRule>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            timeout: crate::consts::DEFAULT_TIMEOUT,
            tap_delay: 0,
            streak_window: None,
            eager_mods: false,
            chord_rules: ChordPolicy::DEFAULT_ORDER.to_vec(),
        }
    }
}

/// Per-key facts the resolver needs about a tap-hold key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TapHoldKey {
    pub timeout: Option<u16>,
    /// Set when the hold action is made of modifiers only.
    pub hold_mods: Option<Mods>,
}

pub type TapHoldKeys = HashMap<KeyCode, TapHoldKey>;

#[derive(Debug, Clone, Copy)]
struct PendingKey {
    /// The original press, replayed on settle.
    record: KeyRecord,
    timeout: u32,
    streak: bool,
}

#[derive(Debug, Clone, Copy)]
struct SettleTimer {
    start: Timestamp,
    timeout: u32,
}

impl SettleTimer {
    fn expired(&self, now: Timestamp) -> bool {
        now.elapsed_since(self.start) >= self.timeout
    }
}

pub struct Resolver {
    state: ResolverState,
    pending: Option<PendingKey>,
    timer: Option<SettleTimer>,
    eager_mods: Mods,
    /// Tap-hold keys that joined the pending key's hold and are still down.
    chained: Vec<KeyCode>,
    streak: Box<dyn StreakTimer>,
    chords: ChordPolicy,
    policy: Box<dyn KeyPolicy>,
    keys: TapHoldKeys,
    settings: ResolverSettings,
}

impl Resolver {
    pub fn new(settings: ResolverSettings, keys: TapHoldKeys, policy: Box<dyn KeyPolicy>) -> Self {
        Self {
            state: ResolverState::Released,
            pending: None,
            timer: None,
            eager_mods: Mods::NONE,
            chained: Vec::new(),
            streak: streak_timer(settings.streak_window),
            chords: ChordPolicy::new(settings.chord_rules.clone()),
            policy,
            keys,
            settings,
        }
    }

    pub fn state(&self) -> ResolverState {
        self.state
    }

    pub fn pending_key(&self) -> Option<KeyCode> {
        self.pending.map(|pending| pending.record.key)
    }

    pub fn eager_mods(&self) -> Mods {
        self.eager_mods
    }

    /// Hook for every key record. Returns `false` when the record was absorbed and the
    /// host must skip its default handling.
    pub fn on_event<H: Host + ?Sized>(&mut self, host: &mut H, record: &KeyRecord) -> Result<bool> {
        if self.state == ResolverState::Recursing {
            return Ok(true);
        }

        if record.pressed
            && matches!(self.state, ResolverState::Released | ResolverState::Tapping)
            && let Some(key) = self.keys.get(&record.key).copied()
        {
            self.begin(host, record, key)?;
            return Ok(false);
        }

        if !record.pressed {
            if self.pending_key() == Some(record.key) {
                self.finish(host, record)?;
                return Ok(false);
            }
            if self.release_chained(host, record)? {
                return Ok(false);
            }
        }

        if self.state == ResolverState::Unsettled {
            if record.pressed {
                let settlement = self.settle_on_press(host, record)?;
                if settlement == Some(Settlement::Tap)
                    && let Some(key) = self.keys.get(&record.key).copied()
                {
                    // The tap is fully out, so the next tap-hold key can take the slot.
                    self.begin(host, record, key)?;
                    return Ok(false);
                }
            } else {
                self.settle_on_release(host, record)?;
            }
        }

        if record.pressed && self.state == ResolverState::Holding && self.joins_hold(record) {
            self.chain_hold(host, record)?;
            self.streak.record(record.key, record.time, &*self.policy);
            return Ok(false);
        }

        if record.pressed {
            self.streak.record(record.key, record.time, &*self.policy);
        }
        Ok(true)
    }

    /// Polled once per scan tick; settles as hold when the timeout passed.
    pub fn on_tick<H: Host + ?Sized>(&mut self, host: &mut H, now: Timestamp) -> Result<()> {
        if self.state == ResolverState::Unsettled
            && self.timer.is_some_and(|timer| timer.expired(now))
        {
            debug!("{} timeout", "SETTLE".cyan());
            self.settle_as_hold(host)?;
        }
        Ok(())
    }

    fn begin<H: Host + ?Sized>(&mut self, host: &mut H, record: &KeyRecord, key: TapHoldKey) -> Result<()> {
        let timeout = key.timeout.unwrap_or(self.settings.timeout) as u32;
        let streak = self.streak.is_active(record.time);
        let mut captured = *record;
        captured.tap = None;

        self.pending = Some(PendingKey {
            record: captured,
            timeout,
            streak,
        });
        self.timer = Some(SettleTimer {
            start: record.time,
            timeout,
        });
        self.eager_mods = Mods::NONE;
        self.state = ResolverState::Unsettled;
        debug!(
            "{} {:?} pending ({}ms{})",
            "SETTLE".cyan(),
            record.key,
            timeout,
            if streak { ", streak" } else { "" }
        );

        if self.settings.eager_mods
            && !streak
            && let Some(mods) = key.hold_mods
            && self.policy.eager_mods(mods)
        {
            debug!("{} eager {:?}", "SETTLE".cyan(), mods);
            self.eager_mods = mods;
            host.process_action(&captured, Action::ModsTap { mods })?;
        }

        self.streak.record(record.key, record.time, &*self.policy);
        Ok(())
    }

    /// Physical release of the pending key.
    fn finish<H: Host + ?Sized>(&mut self, host: &mut H, release: &KeyRecord) -> Result<()> {
        match self.state {
            ResolverState::Unsettled => {
                debug!("{} released before timeout", "SETTLE".cyan());
                self.settle_as_tap(host, false, Some(release.time))?;
            }
            ResolverState::Holding => {
                if let Some(pending) = self.pending {
                    let mut record = pending.record;
                    record.pressed = false;
                    record.time = release.time;
                    if self.eager_mods.is_empty() {
                        record.tap = Some(TapInfo::HOLD);
                        self.process_recursively(host, &record, ResolverState::Released)?;
                    } else {
                        let mods = self.eager_mods;
                        host.process_action(&record, Action::ModsTap { mods })?;
                    }
                }
            }
            ResolverState::Tapping | ResolverState::Released | ResolverState::Recursing => {}
        }
        self.clear();
        Ok(())
    }

    fn chord(&self, pending: &PendingKey, other: &KeyRecord) -> (Settlement, Option<ChordRule>) {
        let chord = Chord {
            tap_hold: pending.record.key,
            other: other.key,
            elapsed: other.time.elapsed_since(pending.record.time),
            timeout: pending.timeout,
            streak: pending.streak,
            policy: &*self.policy,
        };
        self.chords.decide(&chord)
    }

    fn settle_on_press<H: Host + ?Sized>(&mut self, host: &mut H, other: &KeyRecord) -> Result<Option<Settlement>> {
        let Some(pending) = self.pending else {
            return Ok(None);
        };
        let (settlement, rule) = self.chord(&pending, other);
        debug!(
            "{} {:?} + {:?} -> {:?} ({})",
            "SETTLE".cyan(),
            pending.record.key,
            other.key,
            settlement,
            rule.map_or("default", ChordRule::name)
        );

        match settlement {
            Settlement::Hold => self.settle_as_hold(host)?,
            Settlement::Tap => self.settle_as_tap(host, true, None)?,
        }
        Ok(Some(settlement))
    }

    /// Release of a key that went down before the pending one. Only ever settles as
    /// hold, and only once half the timeout has passed.
    fn settle_on_release<H: Host + ?Sized>(&mut self, host: &mut H, other: &KeyRecord) -> Result<()> {
        let Some(pending) = self.pending else {
            return Ok(());
        };
        let elapsed = other.time.elapsed_since(pending.record.time);
        let (settlement, rule) = self.chord(&pending, other);

        if settlement == Settlement::Hold && elapsed.saturating_mul(2) >= pending.timeout {
            debug!(
                "{} {:?} on release of {:?} -> Hold ({})",
                "SETTLE".cyan(),
                pending.record.key,
                other.key,
                rule.map_or("default", ChordRule::name)
            );
            self.settle_as_hold(host)?;
        }
        Ok(())
    }

    fn settle_as_hold<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        let Some(pending) = self.pending else {
            return Ok(());
        };
        self.timer = None;

        if !self.eager_mods.is_empty() {
            debug!("{} eager mods held", "SETTLE".cyan());
            self.state = ResolverState::Holding;
            return Ok(());
        }

        let mut record = pending.record;
        record.tap = Some(TapInfo::HOLD);
        self.process_recursively(host, &record, ResolverState::Holding)
    }

    /// Replays the pending press as a tap. `released` is the physical release time when
    /// the key itself was let go, and stamps the injected release.
    fn settle_as_tap<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        interrupted: bool,
        released: Option<Timestamp>,
    ) -> Result<()> {
        let Some(pending) = self.pending else {
            return Ok(());
        };
        self.timer = None;
        let mut record = pending.record;
        let release_time = released.unwrap_or(record.time);

        if !self.eager_mods.is_empty() {
            // Plain mods release, so downstream retro tapping stays out of it.
            let mut release = record;
            release.pressed = false;
            release.time = release_time;
            host.process_action(&release, Action::Mods(self.eager_mods))?;
            self.eager_mods = Mods::NONE;
        }

        record.pressed = true;
        record.tap = Some(TapInfo::tap(interrupted));
        self.process_recursively(host, &record, ResolverState::Tapping)?;
        host.send_report()?;
        if self.settings.tap_delay > 0 {
            host.wait(Duration::from_millis(self.settings.tap_delay as u64));
        }

        record.pressed = false;
        record.time = release_time;
        self.process_recursively(host, &record, ResolverState::Tapping)
    }

    /// Whether a tap-hold press during a hold joins it, as when chording several home
    /// row modifiers. Decided by the chord rules at once, with no timing or streak.
    fn joins_hold(&self, other: &KeyRecord) -> bool {
        let Some(pending) = self.pending else {
            return false;
        };
        if !self
            .keys
            .get(&other.key)
            .is_some_and(|key| key.hold_mods.is_some())
        {
            return false;
        }
        let chord = Chord {
            tap_hold: pending.record.key,
            other: other.key,
            elapsed: 0,
            timeout: pending.timeout,
            streak: false,
            policy: &*self.policy,
        };
        self.chords.decide(&chord).0 == Settlement::Hold
    }

    fn chain_hold<H: Host + ?Sized>(&mut self, host: &mut H, press: &KeyRecord) -> Result<()> {
        debug!("{} {:?} joins the hold", "SETTLE".cyan(), press.key);
        let mut record = *press;
        record.tap = Some(TapInfo::HOLD);
        self.chained.push(press.key);
        self.process_recursively(host, &record, ResolverState::Holding)
    }

    /// Hold release for a chained key. Returns `false` when `release` is not one.
    fn release_chained<H: Host + ?Sized>(&mut self, host: &mut H, release: &KeyRecord) -> Result<bool> {
        let Some(index) = self.chained.iter().position(|key| *key == release.key) else {
            return Ok(false);
        };
        self.chained.swap_remove(index);
        let mut record = *release;
        record.tap = Some(TapInfo::HOLD);
        let state = self.state;
        self.process_recursively(host, &record, state)?;
        Ok(true)
    }

    /// Runs `record` through the host with the guard up, then moves to `next`.
    fn process_recursively<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        record: &KeyRecord,
        next: ResolverState,
    ) -> Result<()> {
        self.state = ResolverState::Recursing;
        let tracker = host.mouse_key_tracker();
        let result = host.process_record(self, record);
        host.set_mouse_key_tracker(tracker);
        self.state = next;
        result
    }

    fn clear(&mut self) {
        self.pending = None;
        self.timer = None;
        self.eager_mods = Mods::NONE;
        self.state = ResolverState::Released;
    }
}
