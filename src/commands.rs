//! Voice commands
//!
//! The closed set of recognized intents, and the pure value mappings
//! (percentages, colors, color temperature) behind them.

use crate::error::{HueError, HueResult};
use serde::{Deserialize, Serialize};

/// Native brightness ceiling of the bridge
pub const MAX_BRIGHTNESS: u8 = 254;

/// Color temperature limits in kelvin
pub const MIN_KELVIN: u32 = 2000;
pub const MAX_KELVIN: u32 = 6500;

/// Built-in color names -> (hue, saturation)
pub const COLORS: &[(&str, (u16, u8))] = &[
    ("red", (65160, 254)),
    ("green", (27975, 254)),
    ("blue", (45908, 254)),
    ("pink", (52673, 254)),
    ("violet", (48156, 254)),
    ("yellow", (10821, 254)),
    ("orange", (6308, 254)),
    ("white", (41439, 81)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

/// A recognized voice command. `group: None` means the default group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    TurnOn {
        group: Option<String>,
    },
    TurnOff {
        group: Option<String>,
    },
    SetBrightness {
        group: Option<String>,
        percent: String,
    },
    SetColor {
        group: Option<String>,
        color: String,
    },
    SetScene {
        group: Option<String>,
        scene: String,
    },
    AdjustBrightness {
        group: Option<String>,
        direction: Direction,
    },
    AdjustColorTemperature {
        group: Option<String>,
        direction: Direction,
    },
    /// Rediscover and reconnect to the bridge
    Connect,
}

impl Command {
    /// Spoken group name, if the command named one
    pub fn group(&self) -> Option<&str> {
        match self {
            Command::TurnOn { group }
            | Command::TurnOff { group }
            | Command::SetBrightness { group, .. }
            | Command::SetColor { group, .. }
            | Command::SetScene { group, .. }
            | Command::AdjustBrightness { group, .. }
            | Command::AdjustColorTemperature { group, .. } => group.as_deref(),
            Command::Connect => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::TurnOn { .. } => "turn on",
            Command::TurnOff { .. } => "turn off",
            Command::SetBrightness { .. } => "set brightness",
            Command::SetColor { .. } => "set color",
            Command::SetScene { .. } => "set scene",
            Command::AdjustBrightness { .. } => "adjust brightness",
            Command::AdjustColorTemperature { .. } => "adjust color temperature",
            Command::Connect => "connect",
        }
    }
}

/// Parse a spoken percentage such as "50%" or "50"
pub fn parse_percent(value: &str) -> HueResult<u8> {
    let trimmed = value.trim().trim_end_matches('%').trim();
    let percent: u32 = trimmed
        .parse()
        .map_err(|_| HueError::InvalidCommand(format!("not a percentage: '{}'", value)))?;
    if percent > 100 {
        return Err(HueError::InvalidCommand(format!(
            "percentage out of range: {}",
            percent
        )));
    }
    Ok(percent as u8)
}

/// Scale 1–100 % onto the bridge's 1–254 range. 0 % has no brightness;
/// the group is switched off instead.
pub fn percent_to_brightness(percent: u8) -> Option<u8> {
    if percent == 0 {
        return None;
    }
    let scaled = (f64::from(percent.min(100)) / 100.0 * f64::from(MAX_BRIGHTNESS)).round();
    Some((scaled as u8).clamp(1, MAX_BRIGHTNESS))
}

pub fn color(name: &str) -> Option<(u16, u8)> {
    let name = name.trim().to_lowercase();
    COLORS
        .iter()
        .find(|(color, _)| *color == name)
        .map(|(_, hs)| *hs)
}

/// Step brightness, clamped to 0..=254
pub fn step_brightness(current: u8, step: u8, direction: Direction) -> u8 {
    match direction {
        Direction::Increase => current.saturating_add(step).min(MAX_BRIGHTNESS),
        Direction::Decrease => current.saturating_sub(step),
    }
}

pub fn mired_to_kelvin(mired: u16) -> u32 {
    if mired == 0 {
        return MAX_KELVIN;
    }
    1_000_000 / u32::from(mired)
}

pub fn kelvin_to_mired(kelvin: u32) -> u16 {
    (1_000_000 / kelvin.max(1)) as u16
}

/// Step color temperature in kelvin, clamped to 2000..=6500 K
pub fn step_kelvin(current: u32, step: u16, direction: Direction) -> u32 {
    let next = match direction {
        Direction::Increase => current.saturating_add(u32::from(step)),
        Direction::Decrease => current.saturating_sub(u32::from(step)),
    };
    next.clamp(MIN_KELVIN, MAX_KELVIN)
}
