use crate::config::{Globals, KeyboardConfig, Mappings};
use crate::io::{Emitted, OutputEvent, Sink};
use crate::resolver::{Action, Host, KeyRecord, Resolver, Timestamp};
use anyhow::Result;
use evdev::KeyCode;
use log::debug;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

/// Default key handling behind the resolver: remaps, holds and pass-through.
pub struct Dispatcher<S: Sink> {
    sink: S,
    mappings: Mappings,
    /// Output keys each input key currently holds down.
    active: HashMap<KeyCode, Vec<KeyCode>>,
    queued: Vec<Emitted>,
    /// Hold that has seen no other press since it began.
    retro: Option<KeyCode>,
    retro_tapping: bool,
}

impl<S: Sink> Dispatcher<S> {
    pub fn new(sink: S, mappings: Mappings, retro_tapping: bool) -> Self {
        Self {
            sink,
            mappings,
            active: HashMap::new(),
            queued: Vec::new(),
            retro: None,
            retro_tapping,
        }
    }

    fn press(&mut self, key: KeyCode, keys: Vec<KeyCode>, stage: &'static str) {
        if keys.is_empty() {
            return;
        }
        self.queued.push((press_event(&keys), stage));
        self.active.insert(key, keys);
    }

    fn release(&mut self, key: KeyCode, stage: &'static str) -> bool {
        match self.active.remove(&key) {
            Some(keys) => {
                self.queued.push((release_event(&keys), stage));
                true
            }
            None => false,
        }
    }

    fn retro_tap(&mut self, key: KeyCode) {
        if self.retro.take() != Some(key) || !self.retro_tapping {
            return;
        }
        if let Some(tap) = self.mappings.get(&key).and_then(|remap| remap.tap.clone())
            && !tap.is_empty()
        {
            debug!("Retro tap {:?}", key);
            self.queued.push((press_event(&tap), "retro"));
            self.queued.push((release_event(&tap), "retro"));
        }
    }

    fn default_press(&mut self, record: &KeyRecord) {
        self.retro = None;

        let Some(remap) = self.mappings.get(&record.key) else {
            self.press(record.key, vec![record.key], "passthrough");
            return;
        };

        let tap = remap.tap.clone().unwrap_or_default();
        let hold = remap.hold.clone().unwrap_or_default();
        if (record.is_hold() || tap.is_empty()) && !hold.is_empty() {
            if record.is_hold() && !tap.is_empty() {
                self.retro = Some(record.key);
            }
            self.press(record.key, hold, "hold");
        } else {
            self.press(record.key, tap, "tap");
        }
    }

    fn default_release(&mut self, record: &KeyRecord) {
        let stage = if record.is_hold() { "hold" } else { "tap" };
        if self.release(record.key, stage) {
            self.retro_tap(record.key);
        } else if !self.mappings.contains_key(&record.key) {
            // Went down before the device was grabbed.
            self.queued
                .push((OutputEvent::Release(record.key), "passthrough"));
        }
    }
}

impl<S: Sink> Host for Dispatcher<S> {
    fn process_record(&mut self, resolver: &mut Resolver, record: &KeyRecord) -> Result<()> {
        if !resolver.on_event(self, record)? {
            return Ok(());
        }

        if record.pressed {
            self.default_press(record);
        } else {
            self.default_release(record);
        }
        Ok(())
    }

    fn process_action(&mut self, record: &KeyRecord, action: Action) -> Result<()> {
        match action {
            Action::ModsTap { mods } => {
                if record.pressed {
                    self.retro = None;
                    self.press(record.key, mods.keys(), "mods");
                    self.retro = Some(record.key);
                } else if self.release(record.key, "mods") {
                    self.retro_tap(record.key);
                }
            }
            Action::Mods(mods) => {
                if record.pressed {
                    self.retro = None;
                    self.press(record.key, mods.keys(), "mods");
                } else {
                    if self.retro == Some(record.key) {
                        self.retro = None;
                    }
                    self.release(record.key, "mods");
                }
            }
        }
        Ok(())
    }

    fn send_report(&mut self) -> Result<()> {
        if self.queued.is_empty() {
            return Ok(());
        }
        let queued = std::mem::take(&mut self.queued);
        self.sink.emit(&queued)
    }

    fn wait(&mut self, delay: Duration) {
        thread::sleep(delay);
    }
}

fn press_event(keys: &[KeyCode]) -> OutputEvent {
    match keys {
        [key] => OutputEvent::Press(*key),
        _ => OutputEvent::PressMany(keys.to_vec()),
    }
}

fn release_event(keys: &[KeyCode]) -> OutputEvent {
    match keys {
        [key] => OutputEvent::Release(*key),
        _ => OutputEvent::ReleaseMany(keys.to_vec()),
    }
}

/// One keyboard's resolver and dispatcher.
pub struct Pipeline<S: Sink> {
    resolver: Resolver,
    dispatcher: Dispatcher<S>,
}

impl<S: Sink> Pipeline<S> {
    pub fn new(resolver: Resolver, dispatcher: Dispatcher<S>) -> Self {
        Self {
            resolver,
            dispatcher,
        }
    }

    pub fn from_config(globals: &Globals, keyboard: &KeyboardConfig, sink: S) -> Self {
        let resolver = Resolver::new(
            globals.resolver_settings(),
            keyboard.tap_hold_keys(),
            Box::new(keyboard.policy()),
        );
        let dispatcher = Dispatcher::new(sink, keyboard.mappings.clone(), globals.retro_tapping);
        Self::new(resolver, dispatcher)
    }

    pub fn process_event(&mut self, record: KeyRecord) -> Result<()> {
        self.dispatcher.process_record(&mut self.resolver, &record)?;
        self.dispatcher.send_report()
    }

    pub fn tick(&mut self, now: Timestamp) -> Result<()> {
        self.resolver.on_tick(&mut self.dispatcher, now)?;
        self.dispatcher.send_report()
    }
}
