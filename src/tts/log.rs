//! Console feedback engine

use super::TtsEngine;
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Writes what would be spoken to the log and stdout
#[derive(Debug, Default)]
pub struct LogEngine;

#[async_trait]
impl TtsEngine for LogEngine {
    async fn speak(&self, text: &str) -> Result<()> {
        info!("🗣️ {}", text);
        println!("{}", text);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
