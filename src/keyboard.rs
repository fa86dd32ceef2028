use crate::config::{Config, KeyboardConfig};
use crate::consts::{PRESS, REPEAT};
use crate::io::VirtualKeyboard;
use crate::pipeline::Pipeline;
use crate::resolver::{Clock, KeyRecord};
use anyhow::{Result, bail};
use crossbeam_channel::{select, unbounded};
use evdev::{Device, EventType, InputEvent, KeyCode};
use log::{debug, info, warn};
use std::thread;
use std::time::Duration;

pub struct Keyboard {
    pub name: String,
    pub device: Device,
    pub config: KeyboardConfig,
}

pub fn open_keyboard_devices(config: &Config) -> Result<Vec<Keyboard>> {
    debug!("Detecting keyboards");

    let mut keyboards = Vec::new();

    for (path, mut device) in evdev::enumerate() {
        let Some(name) = device.name().map(str::to_owned) else {
            continue;
        };
        let Some(keyboard_config) = config.keyboards.get(&name) else {
            debug!("Keyboard ignored: {} ({})", name, path.display());
            continue;
        };

        // Keys held while grabbing never see their release.
        let mut first = true;
        loop {
            let key_states = device.get_key_state()?;
            if key_states.iter().next().is_none() {
                break;
            }
            if first {
                first = false;
                warn!("Waiting for keys to be released on {}", name);
            }
            thread::sleep(Duration::from_millis(20));
        }

        device.grab()?;
        info!("Keyboard monitored: {} ({})", name, path.display());

        keyboards.push(Keyboard {
            name,
            device,
            config: keyboard_config.clone(),
        });
    }

    if keyboards.is_empty() {
        bail!("No keyboards found");
    } else {
        Ok(keyboards)
    }
}

pub fn process(keyboard: Keyboard, config: &Config) -> Result<()> {
    let globals = &config.globals;
    let sink = VirtualKeyboard::create(&keyboard.device, &keyboard.name, globals.no_emit)?;
    let mut pipeline = Pipeline::from_config(globals, &keyboard.config, sink);
    let clock = Clock::default();
    let tick = Duration::from_millis(globals.tick as u64);

    let mut device = keyboard.device;
    let name = keyboard.name;
    let (tx, rx) = unbounded::<InputEvent>();

    thread::spawn(move || {
        loop {
            match device.fetch_events() {
                Err(e) => {
                    warn!("Reading events failed: {e}");
                    break;
                }
                Ok(events) => {
                    for event in events {
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                }
            }
        }
    });

    loop {
        select! {
            recv(rx) -> ev => {
                let Ok(event) = ev else { break };
                if event.event_type() != EventType::KEY {
                    continue;
                }
                // Autorepeat stays with the host.
                if event.value() == REPEAT {
                    continue;
                }
                let record = KeyRecord::new(KeyCode(event.code()), event.value() == PRESS, clock.now());
                pipeline.process_event(record)?;
            }
            default(tick) => {}
        }
        pipeline.tick(clock.now())?;
    }

    info!("Keyboard disconnected: {}", name);
    Ok(())
}
