use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Append-only record of registrations and light changes
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `audit.log` next to the config file (respecting XDG)
    pub fn open_default() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        Self::new(config_dir.join("huetalk").join("audit.log"))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Write an entry to the audit log
    pub fn log(&self, entry: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(
            file,
            "[{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            entry
        )?;
        Ok(())
    }

    /// Log without failing the caller; audit problems only warrant a warning
    pub fn record(&self, entry: &str) {
        if let Err(e) = self.log(entry) {
            tracing::warn!("⚠️ Could not write audit log {:?}: {}", self.path, e);
        }
    }
}
