//! Dialog lines
//!
//! Keyed English phrases with `{placeholder}` substitution. A JSON file of
//! `key -> phrase` in the data directory replaces individual lines.

use crate::tts::TtsEngine;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DIALOG_FILE: &str = "dialog.json";

const DEFAULT_LINES: &[(&str, &str)] = &[
    ("connect.to.bridge", "Press the link button on your Hue bridge now."),
    ("successfully.registered", "I am now registered with your Hue bridge."),
    ("failed.to.register", "I could not register with the bridge. Please try again."),
    ("successfully.connected", "Connected to your Hue bridge."),
    ("connecting", "Connecting to your Hue bridge."),
    ("bridge.not.found", "I could not find a Hue bridge on your network."),
    ("failed.to.connect", "I failed to connect to the Hue bridge."),
    ("ip.in.config", "The bridge address is set in your configuration. Please check it."),
    ("no.route", "I cannot reach the Hue bridge. Please check your network."),
    ("could.not.communicate", "I lost contact with the bridge. Trying to find it again."),
    ("invalid.user", "The configured Hue user is not registered with the bridge."),
    ("could.not.find.group", "I could not find a group called {name}."),
    ("using.group.0", "Using all lights instead."),
    ("set.brightness", "Brightness set to {brightness} percent."),
    ("increase.brightness", "Brightening the lights."),
    ("decrease.brightness", "Dimming the lights."),
    ("increase.color.temperature", "Making the lights cooler."),
    ("decrease.color.temperature", "Making the lights warmer."),
    ("activate.scene", "Activating {scene}."),
    ("scene.not.found", "I could not find a scene called {scene}."),
    ("unknown.color", "I don't know the color {color}."),
    ("unable.to.perform.action", "The bridge is not responding right now. Please try again later."),
];

#[derive(Debug, Clone, Default)]
pub struct Dialogs {
    overrides: HashMap<String, String>,
}

impl Dialogs {
    /// Built-in lines, with overrides from `dir/dialog.json` when present
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(DIALOG_FILE);
        let overrides = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
                Ok(lines) => {
                    debug!("Loaded {} dialog overrides from {:?}", lines.len(), path);
                    lines
                }
                Err(e) => {
                    warn!("⚠️ Ignoring invalid dialog file {:?}: {}", path, e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { overrides }
    }

    /// Render a dialog line. Unknown keys render as the key itself.
    pub fn render(&self, key: &str, params: &[(&str, &str)]) -> String {
        let template = self
            .overrides
            .get(key)
            .map(String::as_str)
            .or_else(|| {
                DEFAULT_LINES
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, line)| *line)
            })
            .unwrap_or(key);

        params
            .iter()
            .fold(template.to_string(), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }
}

/// Renders dialog lines and hands them to the TTS engine
#[derive(Debug, Clone)]
pub struct Feedback {
    engine: Arc<dyn TtsEngine>,
    dialogs: Dialogs,
}

impl Feedback {
    pub fn new(engine: Arc<dyn TtsEngine>, dialogs: Dialogs) -> Self {
        Self { engine, dialogs }
    }

    /// Speak a dialog line. A TTS failure is logged, never fatal.
    pub async fn say(&self, key: &str, params: &[(&str, &str)]) {
        let text = self.dialogs.render(key, params);
        if let Err(e) = self.engine.speak(&text).await {
            warn!("⚠️ Could not speak '{}': {}", key, e);
        }
    }
}
