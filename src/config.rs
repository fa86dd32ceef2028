use crate::consts::{DEFAULT_STREAK_WINDOW, DEFAULT_TICK, DEFAULT_TIMEOUT};
use crate::layouts::Layout;
use crate::mods::Mods;
use crate::resolver::{
    ChordPolicy, ChordRule, Hand, KeymapPolicy, PairOverride, ResolverSettings, TapHoldKey,
    TapHoldKeys,
};
use anyhow::{Context, Result, bail};
use evdev::KeyCode;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::{env, fs};

/// Loads the config named on the command line, or the default one, writing defaults
/// out on first run.
pub fn config() -> Result<Config> {
    let config_path = match env::args().nth(1) {
        Some(arg_path) => PathBuf::from(arg_path),
        None => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("holdfast")
            .join("config.yml"),
    };

    let config = if !config_path.exists() {
        let config = Config::default();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_yaml::to_string(&config)?;
        fs::write(&config_path, serialized)?;
        info!("Default config written to {}", config_path.display());
        config
    } else {
        load(&config_path)?
    };

    config.validate()?;
    debug!("Config: {:#?}", config);

    Ok(config)
}

pub fn load(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse(&content, path.extension().is_some_and(|ext| ext == "toml"))
        .with_context(|| format!("parsing {}", path.display()))
}

pub fn parse(content: &str, toml: bool) -> Result<Config> {
    let config = if toml {
        toml::from_str(content)?
    } else {
        serde_yaml::from_str(content)?
    };
    Ok(config)
}

pub type Keyboards = HashMap<String, KeyboardConfig>;
pub type Mappings = HashMap<KeyCode, RemapAction>;
pub type Hands = HashMap<KeyCode, Hand>;

fn default_no_emit() -> bool {
    false
}

fn default_timeout() -> u16 {
    DEFAULT_TIMEOUT
}

fn default_tap_delay() -> u16 {
    0
}

fn default_tick() -> u16 {
    DEFAULT_TICK
}

fn default_eager_mods() -> bool {
    true
}

fn default_retro_tapping() -> bool {
    false
}

fn default_chord_rules() -> Vec<ChordRule> {
    ChordPolicy::DEFAULT_ORDER.to_vec()
}

fn home_row_mod(tap: KeyCode, hold: KeyCode) -> (KeyCode, RemapAction) {
    (
        tap,
        RemapAction {
            tap: Some(vec![tap]),
            hold: Some(vec![hold]),
            timeout: None,
        },
    )
}

fn default_mappings() -> Mappings {
    HashMap::from([
        home_row_mod(KeyCode::KEY_A, KeyCode::KEY_LEFTCTRL),
        home_row_mod(KeyCode::KEY_S, KeyCode::KEY_LEFTMETA),
        home_row_mod(KeyCode::KEY_D, KeyCode::KEY_LEFTALT),
        home_row_mod(KeyCode::KEY_F, KeyCode::KEY_LEFTSHIFT),
        home_row_mod(KeyCode::KEY_J, KeyCode::KEY_RIGHTSHIFT),
        home_row_mod(KeyCode::KEY_K, KeyCode::KEY_RIGHTALT),
        home_row_mod(KeyCode::KEY_L, KeyCode::KEY_RIGHTMETA),
        home_row_mod(KeyCode::KEY_SEMICOLON, KeyCode::KEY_RIGHTCTRL),
        (
            KeyCode::KEY_CAPSLOCK,
            RemapAction {
                tap: Some(vec![KeyCode::KEY_ESC]),
                hold: Some(vec![KeyCode::KEY_LEFTCTRL]),
                timeout: Some(150),
            },
        ),
    ])
}

fn default_keyboards() -> Keyboards {
    HashMap::from([(
        "AT Translated Set 2 keyboard".to_owned(),
        KeyboardConfig {
            mappings: default_mappings(),
            ..Default::default()
        },
    )])
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub globals: Globals,
    #[serde(default = "default_keyboards")]
    pub keyboards: Keyboards,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            globals: Globals::default(),
            keyboards: default_keyboards(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Globals {
    #[serde(default = "default_no_emit")]
    pub no_emit: bool,
    /// Hold timeout, ms.
    #[serde(default = "default_timeout")]
    pub timeout: u16,
    /// Pause between an injected tap's press and release, ms.
    #[serde(default = "default_tap_delay")]
    pub tap_delay: u16,
    /// Poll interval for the settle timer, ms.
    #[serde(default = "default_tick")]
    pub tick: u16,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default = "default_eager_mods")]
    pub eager_mods: bool,
    #[serde(default = "default_retro_tapping")]
    pub retro_tapping: bool,
    #[serde(default = "default_chord_rules")]
    pub chord_rules: Vec<ChordRule>,
}

impl Default for Globals {
    fn default() -> Self {
        Self {
            no_emit: default_no_emit(),
            timeout: default_timeout(),
            tap_delay: default_tap_delay(),
            tick: default_tick(),
            streak: StreakConfig::default(),
            eager_mods: default_eager_mods(),
            retro_tapping: default_retro_tapping(),
            chord_rules: default_chord_rules(),
        }
    }
}

fn default_streak_enabled() -> bool {
    true
}

fn default_streak_window() -> u16 {
    DEFAULT_STREAK_WINDOW
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakConfig {
    #[serde(default = "default_streak_enabled")]
    pub enabled: bool,
    /// ms
    #[serde(default = "default_streak_window")]
    pub window: u16,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            enabled: default_streak_enabled(),
            window: default_streak_window(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyboardConfig {
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub mappings: Mappings,
    /// Per-key hand assignments on top of the layout table.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub hands: Hands,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<OverrideEntry>,
    /// Replaces the layout's streak keys when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak_keys: Option<Vec<KeyCode>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemapAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tap: Option<Vec<KeyCode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold: Option<Vec<KeyCode>>,
    /// Hold timeout for this key, ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u16>,
}

impl RemapAction {
    pub fn is_tap_hold(&self) -> bool {
        self.tap.as_ref().is_some_and(|keys| !keys.is_empty())
            && self.hold.as_ref().is_some_and(|keys| !keys.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub tap_hold: KeyCode,
    pub other: KeyCode,
    pub decision: PairOverride,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let globals = &self.globals;
        if globals.timeout == 0 {
            bail!("globals.timeout must be greater than 0");
        }
        if globals.tick == 0 {
            bail!("globals.tick must be greater than 0");
        }
        if globals.streak.enabled && globals.streak.window == 0 {
            bail!("globals.streak.window must be greater than 0");
        }
        if globals.chord_rules.is_empty() {
            bail!("globals.chord_rules must name at least one rule");
        }
        let mut seen = HashSet::new();
        for rule in &globals.chord_rules {
            if !seen.insert(rule) {
                bail!("globals.chord_rules lists {} twice", rule.name());
            }
        }

        for (name, keyboard) in &self.keyboards {
            for (key, remap) in &keyboard.mappings {
                if remap.tap.as_ref().is_none_or(Vec::is_empty)
                    && remap.hold.as_ref().is_none_or(Vec::is_empty)
                {
                    bail!("{name}: mapping for {key:?} has neither tap nor hold");
                }
                if remap.timeout == Some(0) {
                    bail!("{name}: timeout for {key:?} must be greater than 0");
                }
            }
        }

        Ok(())
    }
}

impl Globals {
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            timeout: self.timeout,
            tap_delay: self.tap_delay,
            streak_window: self.streak.enabled.then_some(self.streak.window),
            eager_mods: self.eager_mods,
            chord_rules: self.chord_rules.clone(),
        }
    }
}

impl KeyboardConfig {
    pub fn tap_hold_keys(&self) -> TapHoldKeys {
        self.mappings
            .iter()
            .filter(|(_, remap)| remap.is_tap_hold())
            .map(|(key, remap)| {
                (
                    *key,
                    TapHoldKey {
                        timeout: remap.timeout,
                        hold_mods: remap.hold.as_deref().and_then(Mods::from_keys),
                    },
                )
            })
            .collect()
    }

    pub fn policy(&self) -> KeymapPolicy {
        let mut policy = KeymapPolicy::from_layout(self.layout);
        for (key, hand) in &self.hands {
            policy = policy.with_hand(*key, *hand);
        }
        for entry in &self.overrides {
            policy = policy.with_override(entry.tap_hold, entry.other, entry.decision);
        }
        if let Some(keys) = &self.streak_keys {
            policy = policy.with_streak_keys(keys.iter().copied());
        }
        policy
    }
}
