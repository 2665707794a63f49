//! Recording TTS engine for feedback assertions

use anyhow::{bail, Result};
use async_trait::async_trait;
use huetalk::tts::TtsEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MockTts {
    spoken: Mutex<Vec<String>>,
    broken: AtomicBool,
}

impl MockTts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `speak` fail, as a missing speech daemon would
    pub fn break_output(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    /// Lines spoken so far, oldest first
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn was_spoken(&self, fragment: &str) -> bool {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .any(|line| line.contains(fragment))
    }
}

#[async_trait]
impl TtsEngine for MockTts {
    async fn speak(&self, text: &str) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            bail!("no speech output available");
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
