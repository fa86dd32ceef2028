use crate::consts::*;
use crate::mods::is_modifier;
use anyhow::{Result, anyhow};
use colored::{ColoredString, Colorize};
use evdev::uinput::VirtualDevice;
use evdev::{AttributeSet, Device, EventType, InputEvent, KeyCode};
use log::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputEvent {
    Press(KeyCode),
    Release(KeyCode),
    PressMany(Vec<KeyCode>),
    ReleaseMany(Vec<KeyCode>),
}

impl OutputEvent {
    fn keys(&self) -> (&[KeyCode], i32) {
        match self {
            OutputEvent::Press(key) => (std::slice::from_ref(key), PRESS),
            OutputEvent::Release(key) => (std::slice::from_ref(key), RELEASE),
            OutputEvent::PressMany(keys) => (keys.as_slice(), PRESS),
            OutputEvent::ReleaseMany(keys) => (keys.as_slice(), RELEASE),
        }
    }
}

/// One queued output event and the stage that produced it.
pub type Emitted = (OutputEvent, &'static str);

/// Where a flushed report goes.
pub trait Sink {
    fn emit(&mut self, events: &[Emitted]) -> Result<()>;
}

impl Sink for Vec<OutputEvent> {
    fn emit(&mut self, events: &[Emitted]) -> Result<()> {
        self.extend(events.iter().map(|(event, _)| event.clone()));
        Ok(())
    }
}

pub struct VirtualKeyboard {
    device: VirtualDevice,
    no_emit: bool,
}

impl VirtualKeyboard {
    /// Virtual keyboard able to send every key `source` supports.
    pub fn create(source: &Device, name: &str, no_emit: bool) -> Result<Self> {
        let mut keys = AttributeSet::<KeyCode>::new();
        if let Some(supported) = source.supported_keys() {
            for key in supported.iter() {
                keys.insert(key);
            }
        }

        let device_name = format!("{} holdfast", name);
        let device = VirtualDevice::builder()
            .map_err(|e| anyhow!("Failed to open /dev/uinput (sudo modprobe uinput): {e}"))?
            .name(&device_name)
            .with_keys(&keys)?
            .build()?;

        Ok(Self { device, no_emit })
    }
}

impl Sink for VirtualKeyboard {
    fn emit(&mut self, events: &[Emitted]) -> Result<()> {
        let mut batch = Vec::new();
        for (event, stage) in events {
            let (keys, state) = event.keys();
            for key in keys {
                batch.push(InputEvent::new(EventType::KEY.0, key.code(), state));
                log_key(key, state, stage);
            }
        }

        if !self.no_emit && !batch.is_empty() {
            // emit() appends the SYN_REPORT.
            self.device.emit(&batch)?;
        }

        Ok(())
    }
}

fn log_key(key: &KeyCode, state: i32, stage: &str) {
    debug!(
        "{}[{}] {:?} [{}]",
        if is_modifier(key) { "    " } else { "" },
        state_arrow(state),
        key,
        stage.purple(),
    );
}

fn state_arrow(state: i32) -> ColoredString {
    match state {
        PRESS => "↓".green().bold(),
        _ => "↑".red().bold(),
    }
}
