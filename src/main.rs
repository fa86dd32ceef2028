use anyhow::Result;
use holdfast::{
    config::config,
    keyboard::{open_keyboard_devices, process},
};
use log::error;
use std::thread;

fn main() -> Result<()> {
    env_logger::init();
    let config = config()?;
    let keyboards = open_keyboard_devices(&config)?;

    let mut handles = Vec::new();
    for keyboard in keyboards {
        let config = config.clone();

        let handle = thread::spawn(move || {
            let name = keyboard.name.clone();
            if let Err(e) = process(keyboard, &config) {
                error!("{}: {:#}", name, e);
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    Ok(())
}
