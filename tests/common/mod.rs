#![allow(dead_code)]

pub mod mock_bridge;
pub mod mock_tts;

use huetalk::audit::AuditLog;
use huetalk::config::Config;
use huetalk::credentials::CredentialStore;
use huetalk::dialog::{Dialogs, Feedback};
use huetalk::dispatcher::Dispatcher;
use huetalk::session::BridgeSession;
use mock_bridge::{MockBridge, MockDiscovery};
use mock_tts::MockTts;
use std::sync::Arc;
use tempfile::TempDir;

pub const BRIDGE_ADDRESS: &str = "192.168.1.20";

/// A session wired to fakes, with its state under a temp dir
pub struct TestContext {
    pub temp_dir: TempDir,
    pub bridge: Arc<MockBridge>,
    pub discovery: Arc<MockDiscovery>,
    pub tts: Arc<MockTts>,
    pub config: Config,
}

impl TestContext {
    pub fn new(bridge: MockBridge, config: Config) -> Self {
        Self::with_discovery(bridge, MockDiscovery::new(BRIDGE_ADDRESS), config)
    }

    pub fn with_discovery(bridge: MockBridge, discovery: MockDiscovery, config: Config) -> Self {
        Self {
            temp_dir: tempfile::tempdir().expect("Failed to create temp dir"),
            bridge: Arc::new(bridge),
            discovery: Arc::new(discovery),
            tts: Arc::new(MockTts::new()),
            config,
        }
    }

    pub fn store(&self) -> CredentialStore {
        CredentialStore::new(self.temp_dir.path().join("data"))
    }

    pub fn audit(&self) -> AuditLog {
        AuditLog::new(self.temp_dir.path().join("audit.log"))
    }

    pub fn session(&self) -> BridgeSession {
        BridgeSession::new(
            self.bridge.clone(),
            self.discovery.clone(),
            self.config.clone(),
            self.store(),
            self.audit(),
            Feedback::new(self.tts.clone(), Dialogs::default()),
        )
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.session(), self.audit())
    }
}
