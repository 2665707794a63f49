//! Bridge Session
//!
//! Owns the bridge address, the credential and the vocabulary cache, and
//! drives the connect / register state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//!                            \-> Unauthorized -> Registering -> Connected
//!                                                            \-> RegistrationFailed
//! ```
//!
//! The vocabulary cache only exists while the session is `Connected`.

use crate::audit::AuditLog;
use crate::bridge::{BridgeApi, Connection};
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::dialog::Feedback;
use crate::discovery::Discover;
use crate::error::{HueError, HueResult};
use crate::vocabulary::Vocabulary;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name this application registers under on the bridge
pub const DEVICE_TYPE: &str = "huetalk#voice";

/// Group 0 addresses every light on the bridge
pub const ALL_LIGHTS: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Unauthorized,
    Registering,
    Connected,
    RegistrationFailed,
}

/// Bounded wait for the link button: one attempt per interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval: Duration::from_secs(1),
        }
    }
}

pub struct BridgeSession {
    api: Arc<dyn BridgeApi>,
    discovery: Arc<dyn Discover>,
    config: Config,
    store: CredentialStore,
    audit: AuditLog,
    feedback: Feedback,
    policy: RegistrationPolicy,

    state: SessionState,
    address: Option<String>,
    username: Option<String>,
    connection: Option<Connection>,
    vocabulary: Option<Vocabulary>,
    default_group: Option<u32>,
}

impl BridgeSession {
    pub fn new(
        api: Arc<dyn BridgeApi>,
        discovery: Arc<dyn Discover>,
        config: Config,
        store: CredentialStore,
        audit: AuditLog,
        feedback: Feedback,
    ) -> Self {
        // A configured credential always wins over the stored one
        let username = match &config.username {
            Some(user) => Some(user.clone()),
            None => match store.username() {
                Ok(stored) => stored,
                Err(e) => {
                    warn!("⚠️ Could not read stored credential: {}", e);
                    None
                }
            },
        };

        Self {
            api,
            discovery,
            address: config.ip.clone(),
            config,
            store,
            audit,
            feedback,
            policy: RegistrationPolicy::default(),
            state: SessionState::Disconnected,
            username,
            connection: None,
            vocabulary: None,
            default_group: None,
        }
    }

    pub fn with_registration_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected && self.connection.is_some()
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref().filter(|_| self.is_connected())
    }

    /// The cache, only while connected
    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref().filter(|_| self.is_connected())
    }

    pub fn default_group(&self) -> u32 {
        self.default_group.unwrap_or(ALL_LIGHTS)
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn api(&self) -> &dyn BridgeApi {
        self.api.as_ref()
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn user_supplied_ip(&self) -> bool {
        self.config.user_supplied_ip()
    }

    pub fn user_supplied_username(&self) -> bool {
        self.config.user_supplied_username()
    }

    async fn resolve_address(&mut self) -> HueResult<String> {
        if let Some(address) = &self.address {
            return Ok(address.clone());
        }
        let address = self.discovery.discover().await?;
        self.address = Some(address.clone());
        Ok(address)
    }

    /// One connection attempt, no recovery.
    ///
    /// The bridge is probed with the credential; "unauthorized user" becomes
    /// `Unauthorized`, any other embedded error is `UnknownBridgeError`.
    /// Without a credential the session goes straight to `Unauthorized`.
    pub async fn attempt_connection(&mut self) -> HueResult<()> {
        self.state = SessionState::Connecting;
        let address = self.resolve_address().await?;

        let Some(username) = self.username.clone() else {
            debug!("No credential for bridge {}", address);
            self.state = SessionState::Unauthorized;
            return Err(HueError::MissingCredential);
        };

        debug!("Probing bridge {} as '{}'", address, username);
        if let Err(e) = self.api.probe(&address, &username).await {
            if matches!(e, HueError::Unauthorized(_)) {
                self.state = SessionState::Unauthorized;
            }
            return Err(e);
        }

        self.connection = Some(Connection { address, username });
        Ok(())
    }

    /// Poll the bridge for a new credential while the user presses the
    /// link button. Gives up after the policy's attempt count.
    pub async fn register_with_bridge(&mut self) -> HueResult<()> {
        self.state = SessionState::Registering;
        let address = self.resolve_address().await?;
        self.feedback.say("connect.to.bridge", &[]).await;

        info!(
            "🔗 Registering with bridge {} ({} attempts, {:?} apart)",
            address, self.policy.attempts, self.policy.interval
        );

        for attempt in 1..=self.policy.attempts {
            tokio::time::sleep(self.policy.interval).await;
            match self.api.create_user(&address, DEVICE_TYPE).await {
                Ok(username) => {
                    info!("✅ Registered with bridge on attempt {}", attempt);
                    self.audit
                        .record(&format!("Registered new credential with bridge {}", address));
                    self.username = Some(username.clone());
                    self.connection = Some(Connection { address, username });
                    self.feedback.say("successfully.registered", &[]).await;
                    return Ok(());
                }
                Err(HueError::LinkButtonNotPressed) => {
                    debug!("Registration attempt {} refused, waiting", attempt);
                }
                Err(e) => {
                    self.state = SessionState::Disconnected;
                    return Err(e);
                }
            }
        }

        warn!("❌ Registration window closed after {} attempts", self.policy.attempts);
        self.state = SessionState::RegistrationFailed;
        self.feedback.say("failed.to.register", &[]).await;
        Err(HueError::RegistrationFailed {
            attempts: self.policy.attempts,
        })
    }

    /// Connect, registering when the credential is missing or was
    /// auto-managed and rejected. A rejected user-supplied credential is
    /// reported as `Unauthorized` without registering.
    pub async fn connect(&mut self, acknowledge: bool) -> HueResult<()> {
        match self.attempt_connection().await {
            Ok(()) => {}
            Err(HueError::Unauthorized(user)) => {
                if self.user_supplied_username() {
                    warn!("❌ Configured user '{}' rejected by bridge", user);
                    return Err(HueError::Unauthorized(user));
                }
                info!("Stored credential rejected, registering again");
                self.username = None;
                self.register_with_bridge().await?;
            }
            Err(HueError::MissingCredential) => {
                self.register_with_bridge().await?;
            }
            Err(e) => {
                self.invalidate();
                return Err(e);
            }
        }

        if let Err(e) = self.update_bridge_data().await {
            self.invalidate();
            return Err(e);
        }

        if acknowledge {
            self.feedback.say("successfully.connected", &[]).await;
        }
        Ok(())
    }

    /// Connect unless already connected
    pub async fn ensure_connected(&mut self) -> HueResult<()> {
        if self.is_connected() {
            return Ok(());
        }
        self.connect(false).await
    }

    /// Drop the connection and everything learned through it
    pub fn invalidate(&mut self) {
        if self.connection.is_some() {
            debug!("Invalidating bridge session");
        }
        self.connection = None;
        self.vocabulary = None;
        self.state = SessionState::Disconnected;
    }

    /// Forget a discovered address and connect from scratch
    pub async fn reconnect(&mut self) -> HueResult<()> {
        self.invalidate();
        if !self.user_supplied_ip() {
            self.address = None;
        }
        self.connect(true).await
    }

    /// Runs on every transition into `Connected`
    async fn update_bridge_data(&mut self) -> HueResult<()> {
        if let Some(username) = &self.username {
            self.store.save_username(username)?;
        }

        self.refresh_vocabulary().await?;

        if self.default_group.is_none() {
            self.set_default_group().await;
        }

        self.state = SessionState::Connected;
        if let Some(conn) = &self.connection {
            info!("✅ Connected to bridge at {}", conn.address);
            self.audit
                .record(&format!("Connected to bridge {}", conn.address));
        }
        Ok(())
    }

    /// Rebuild the vocabulary cache from a fresh listing and swap it in
    pub async fn refresh_vocabulary(&mut self) -> HueResult<()> {
        let conn = self
            .connection
            .clone()
            .ok_or_else(|| HueError::ConnectionFailed("not connected".to_string()))?;

        let groups = self.api.groups(&conn).await?;
        let scenes = self.api.scenes(&conn).await?;
        let vocabulary = Vocabulary::build(&groups, &scenes);
        info!(
            "📚 Vocabulary: {} groups, {} scenes",
            vocabulary.groups().len(),
            vocabulary.scene_count()
        );
        self.vocabulary = Some(vocabulary);
        Ok(())
    }

    /// Pick the group used when a command names none. An unknown
    /// configured group falls back to all lights.
    async fn set_default_group(&mut self) {
        let Some(identifier) = self.config.default_group.clone() else {
            self.default_group = Some(ALL_LIGHTS);
            return;
        };

        let found = self
            .vocabulary
            .as_ref()
            .and_then(|v| v.group_by_identifier(&identifier));

        match found {
            Some(group_id) => {
                debug!("Default group '{}' -> {}", identifier, group_id);
                self.default_group = Some(group_id);
            }
            None => {
                warn!("⚠️ Default group '{}' not found, using group 0", identifier);
                self.feedback
                    .say("could.not.find.group", &[("name", identifier.as_str())])
                    .await;
                self.feedback.say("using.group.0", &[]).await;
                self.default_group = Some(ALL_LIGHTS);
            }
        }
    }
}
