use crate::mods::Mods;
use crate::resolver::Resolver;
use crate::resolver::record::KeyRecord;
use anyhow::Result;
use std::time::Duration;

/// Actions the resolver runs directly, skipping the record pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Hold side of a mod-tap key. Its release may be retro-tapped downstream.
    ModsTap { mods: Mods },
    /// Plain modifiers, never retro-tapped.
    Mods(Mods),
}

/// The keyboard pipeline the resolver is hooked into.
pub trait Host {
    /// Full dispatch of a record. Implementations call [`Resolver::on_event`] first and
    /// run their default handling only when it returns `true`.
    fn process_record(&mut self, resolver: &mut Resolver, record: &KeyRecord) -> Result<()>;

    /// Executes `action` for `record` without going through [`Host::process_record`].
    fn process_action(&mut self, record: &KeyRecord, action: Action) -> Result<()>;

    /// Flushes pending output.
    fn send_report(&mut self) -> Result<()>;

    fn wait(&mut self, delay: Duration);

    /// Auto-mouse key tracker, saved and restored around injected records.
    fn mouse_key_tracker(&self) -> i8 {
        0
    }

    fn set_mouse_key_tracker(&mut self, _tracker: i8) {}
}
