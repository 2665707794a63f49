//! TTS (Text-to-Speech) Module
//!
//! Spoken feedback for command outcomes, behind one trait.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub mod log;
pub mod system;

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync + std::fmt::Debug {
    /// Speak the given text
    async fn speak(&self, text: &str) -> Result<()>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Factory to create the configured TTS engine
pub fn create_engine(name: &str) -> Arc<dyn TtsEngine> {
    let engine: Arc<dyn TtsEngine> = match name {
        "system" => Arc::new(system::SystemEngine::new()),
        "log" => Arc::new(log::LogEngine),
        _ => {
            warn!("  - Unknown engine '{}', falling back to log output", name);
            Arc::new(log::LogEngine)
        }
    };
    info!("✅ TTS engine '{}' initialized", engine.name());
    engine
}
