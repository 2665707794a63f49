//! Speech through the desktop speech tools

use super::TtsEngine;
use anyhow::Result;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

const SPEECH_COMMANDS: &[&str] = &["spd-say", "espeak-ng"];

#[derive(Debug)]
pub struct SystemEngine;

impl Default for SystemEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TtsEngine for SystemEngine {
    async fn speak(&self, text: &str) -> Result<()> {
        debug!("System speaking: {}", text);

        // First tool that runs cleanly wins
        for program in SPEECH_COMMANDS {
            if let Ok(status) = Command::new(program).arg(text).status().await {
                if status.success() {
                    return Ok(());
                }
            }
        }

        Err(anyhow::anyhow!(
            "No system TTS command found (tried spd-say, espeak-ng)"
        ))
    }

    fn name(&self) -> &str {
        "system"
    }
}
