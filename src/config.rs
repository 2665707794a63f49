use anyhow::Result;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BRIGHTNESS_STEP: u8 = 50;
pub const DEFAULT_COLOR_TEMPERATURE_STEP: u16 = 1000;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Bridge
    /// Static bridge address; skips discovery when set
    #[serde(deserialize_with = "empty_as_none")]
    pub ip: Option<String>,
    /// Pre-provisioned bridge credential
    #[serde(deserialize_with = "empty_as_none")]
    pub username: Option<String>,
    /// Group used when a command names none (name or numeric id)
    #[serde(deserialize_with = "string_or_number")]
    pub default_group: Option<String>,

    // Behaviour
    #[serde(deserialize_with = "number_or_string")]
    pub brightness_step: u8,
    /// Kelvin per warmer/cooler step
    #[serde(deserialize_with = "number_or_string")]
    pub color_temperature_step: u16,
    /// Speak confirmations after each command
    #[serde(deserialize_with = "bool_or_string")]
    pub verbose: bool,

    // Feedback
    pub tts_engine: String,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ip: None,
            username: None,
            default_group: None,
            brightness_step: DEFAULT_BRIGHTNESS_STEP,
            color_temperature_step: DEFAULT_COLOR_TEMPERATURE_STEP,
            verbose: false,
            tts_engine: "log".to_string(),
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = config_path.with_extension("json.corrupt");
                let _ = std::fs::rename(config_path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// The address was set by hand rather than discovered
    pub fn user_supplied_ip(&self) -> bool {
        self.ip.is_some()
    }

    /// The credential was set by hand rather than issued by registration
    pub fn user_supplied_username(&self) -> bool {
        self.username.is_some()
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("huetalk")
        .join("config.json")
}

/// Directory for persisted bridge state (credential, dialog overrides)
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("huetalk")
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Num(u64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::Str(s)) if !s.trim().is_empty() => Some(s),
        Some(StringOrNumber::Num(n)) => Some(n.to_string()),
        _ => None,
    })
}

// Host settings UIs hand numbers over as strings too
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    let value = match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Num(n) => n,
        StringOrNumber::Str(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("expected a number, got '{}'", s)))?,
    };
    T::try_from(value).map_err(|_| D::Error::custom(format!("number out of range: {}", value)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrString {
    Bool(bool),
    Str(String),
}

// Host settings UIs hand booleans over as "true"/"false" strings
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => b,
        BoolOrString::Str(s) => s.trim().eq_ignore_ascii_case("true"),
    })
}
