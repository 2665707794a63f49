//! Command Dispatcher
//!
//! Routes a recognized [`Command`] to the bridge through a single pipeline:
//! make sure the session is connected, resolve the target group, run the
//! handler, then map failures to spoken outcomes.

use crate::audit::AuditLog;
use crate::bridge::{Connection, LightState};
use crate::commands::{self, Command, Direction};
use crate::error::{HueError, HueResult};
use crate::session::BridgeSession;
use tracing::{debug, info, warn};

/// What happened to a command, for the host to act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The bridge accepted the change
    Done,
    /// No usable bridge session; the reason has been spoken
    NotConnected,
    /// The bridge timed out on this request
    Unavailable,
    /// The bridge cannot be reached at the configured address
    NetworkUnreachable,
    GroupNotFound(String),
    SceneNotFound(String),
    UnknownColor(String),
    /// Reconnect requested while the address is pinned in config
    Refused,
}

/// Connection and group a command acts on
struct Target {
    conn: Connection,
    group_id: u32,
}

pub struct Dispatcher {
    session: BridgeSession,
    audit: AuditLog,
}

impl Dispatcher {
    pub fn new(session: BridgeSession, audit: AuditLog) -> Self {
        Self { session, audit }
    }

    pub fn session(&self) -> &BridgeSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut BridgeSession {
        &mut self.session
    }

    /// Handle one command. An unreachable auto-discovered bridge triggers
    /// one rediscovery and exactly one replay of the command.
    pub async fn handle(&mut self, command: &Command) -> HueResult<Outcome> {
        info!("🎯 Command: {}", command.name());

        match self.run(command).await {
            Err(HueError::NoRouteToHost(detail)) => {
                warn!("📡 No route to bridge: {}", detail);
                self.session.invalidate();
                if self.session.user_supplied_ip() {
                    self.say("no.route", &[]).await;
                    return Ok(Outcome::NetworkUnreachable);
                }

                self.say("could.not.communicate", &[]).await;
                if let Err(e) = self.session.reconnect().await {
                    return self.connection_failure(e).await;
                }

                debug!("Replaying '{}' after reconnect", command.name());
                let replay = self.run(command).await;
                self.recover(replay).await
            }
            result => self.recover(result).await,
        }
    }

    /// Errors with a defined local remedy become outcomes; the rest propagate
    async fn recover(&mut self, result: HueResult<Outcome>) -> HueResult<Outcome> {
        match result {
            Err(HueError::RequestTimeout) => {
                warn!("⏱️ Bridge request timed out");
                self.say("unable.to.perform.action", &[]).await;
                Ok(Outcome::Unavailable)
            }
            Err(HueError::NoRouteToHost(detail)) => {
                warn!("📡 Still no route to bridge: {}", detail);
                self.session.invalidate();
                self.say("no.route", &[]).await;
                Ok(Outcome::NetworkUnreachable)
            }
            Err(HueError::GroupNotFound(name)) => {
                self.say("could.not.find.group", &[("name", name.as_str())])
                    .await;
                Ok(Outcome::GroupNotFound(name))
            }
            Err(HueError::SceneNotFound(scene)) => {
                self.say("scene.not.found", &[("scene", scene.as_str())])
                    .await;
                Ok(Outcome::SceneNotFound(scene))
            }
            Err(
                e @ (HueError::DeviceNotFound
                | HueError::ConnectionFailed(_)
                | HueError::Unauthorized(_)
                | HueError::RegistrationFailed { .. }),
            ) => self.connection_failure(e).await,
            other => other,
        }
    }

    /// Speak why the session could not be established
    async fn connection_failure(&mut self, error: HueError) -> HueResult<Outcome> {
        warn!("❌ Could not connect to bridge: {}", error);
        if self.session.is_connected() {
            self.session.invalidate();
        }
        match error {
            HueError::DeviceNotFound => self.say("bridge.not.found", &[]).await,
            HueError::NoRouteToHost(_) => self.say("no.route", &[]).await,
            HueError::ConnectionFailed(_) | HueError::RequestTimeout => {
                self.say("failed.to.connect", &[]).await;
                if self.session.user_supplied_ip() {
                    self.say("ip.in.config", &[]).await;
                }
            }
            HueError::Unauthorized(_) => self.say("invalid.user", &[]).await,
            // Already announced by the registration loop
            HueError::RegistrationFailed { .. } => {}
            other => return Err(other),
        }
        Ok(Outcome::NotConnected)
    }

    async fn run(&mut self, command: &Command) -> HueResult<Outcome> {
        let (group_id, outcome) = match command {
            Command::Connect => return self.connect_lights().await,
            Command::TurnOn { group } => {
                let target = self.target(group.as_deref()).await?;
                (target.group_id, self.set_power(&target, true).await?)
            }
            Command::TurnOff { group } => {
                let target = self.target(group.as_deref()).await?;
                (target.group_id, self.set_power(&target, false).await?)
            }
            Command::SetBrightness { group, percent } => {
                let target = self.target(group.as_deref()).await?;
                (
                    target.group_id,
                    self.set_brightness(&target, percent).await?,
                )
            }
            Command::SetColor { group, color } => {
                let target = self.target(group.as_deref()).await?;
                (target.group_id, self.set_color(&target, color).await?)
            }
            Command::SetScene { group, scene } => {
                let target = self.target(group.as_deref()).await?;
                (target.group_id, self.set_scene(&target, scene).await?)
            }
            Command::AdjustBrightness { group, direction } => {
                let target = self.target(group.as_deref()).await?;
                (
                    target.group_id,
                    self.adjust_brightness(&target, *direction).await?,
                )
            }
            Command::AdjustColorTemperature { group, direction } => {
                let target = self.target(group.as_deref()).await?;
                (
                    target.group_id,
                    self.adjust_color_temperature(&target, *direction).await?,
                )
            }
        };

        if outcome == Outcome::Done {
            self.audit
                .record(&format!("{} (group {})", command.name(), group_id));
        }
        Ok(outcome)
    }

    /// Connect on demand and resolve the spoken group, or the default one
    async fn target(&mut self, group: Option<&str>) -> HueResult<Target> {
        self.session.ensure_connected().await?;

        let group_id = match group {
            None => self.session.default_group(),
            Some(name) => self
                .session
                .vocabulary()
                .and_then(|v| v.resolve_group(name))
                .ok_or_else(|| HueError::GroupNotFound(name.to_string()))?,
        };

        let conn = self
            .session
            .connection()
            .cloned()
            .ok_or_else(|| HueError::ConnectionFailed("session not connected".to_string()))?;
        Ok(Target { conn, group_id })
    }

    async fn say(&self, key: &str, params: &[(&str, &str)]) {
        self.session.feedback().say(key, params).await;
    }

    async fn say_verbose(&self, key: &str, params: &[(&str, &str)]) {
        if self.session.config().verbose {
            self.say(key, params).await;
        }
    }

    async fn set_power(&self, target: &Target, on: bool) -> HueResult<Outcome> {
        self.session
            .api()
            .set_group_state(&target.conn, target.group_id, &LightState::power(on))
            .await?;
        Ok(Outcome::Done)
    }

    async fn set_brightness(&self, target: &Target, percent: &str) -> HueResult<Outcome> {
        let value = commands::parse_percent(percent)?;
        let state = match commands::percent_to_brightness(value) {
            None => LightState::power(false),
            Some(bri) => LightState {
                on: Some(true),
                bri: Some(bri),
                ..LightState::default()
            },
        };
        self.session
            .api()
            .set_group_state(&target.conn, target.group_id, &state)
            .await?;

        self.say_verbose("set.brightness", &[("brightness", value.to_string().as_str())])
            .await;
        Ok(Outcome::Done)
    }

    /// Colors are applied light by light; groups have no hue of their own
    async fn set_color(&self, target: &Target, color: &str) -> HueResult<Outcome> {
        let Some((hue, sat)) = commands::color(color) else {
            self.say("unknown.color", &[("color", color)]).await;
            return Ok(Outcome::UnknownColor(color.to_string()));
        };

        let group = self
            .session
            .api()
            .group(&target.conn, target.group_id)
            .await?;
        let state = LightState {
            on: Some(true),
            hue: Some(hue),
            sat: Some(sat),
            ..LightState::default()
        };
        for light in &group.lights {
            self.session
                .api()
                .set_light_state(&target.conn, light, &state)
                .await?;
        }
        Ok(Outcome::Done)
    }

    async fn set_scene(&self, target: &Target, scene: &str) -> HueResult<Outcome> {
        let scene_id = self
            .session
            .vocabulary()
            .and_then(|v| v.resolve_scene(target.group_id, scene))
            .ok_or_else(|| HueError::SceneNotFound(scene.to_string()))?;

        self.say_verbose("activate.scene", &[("scene", scene)]).await;
        self.session
            .api()
            .activate_scene(&target.conn, target.group_id, &scene_id)
            .await?;
        Ok(Outcome::Done)
    }

    async fn adjust_brightness(
        &self,
        target: &Target,
        direction: Direction,
    ) -> HueResult<Outcome> {
        let group = self
            .session
            .api()
            .group(&target.conn, target.group_id)
            .await?;
        let current = group.action.bri.unwrap_or(0);
        let step = self.session.config().brightness_step;
        let next = commands::step_brightness(current, step, direction);
        debug!("Brightness {} -> {}", current, next);

        let state = if next == 0 {
            LightState::power(false)
        } else {
            LightState {
                on: Some(true),
                bri: Some(next),
                ..LightState::default()
            }
        };
        self.session
            .api()
            .set_group_state(&target.conn, target.group_id, &state)
            .await?;

        let dialog = match direction {
            Direction::Increase => "increase.brightness",
            Direction::Decrease => "decrease.brightness",
        };
        self.say_verbose(dialog, &[]).await;
        Ok(Outcome::Done)
    }

    async fn adjust_color_temperature(
        &self,
        target: &Target,
        direction: Direction,
    ) -> HueResult<Outcome> {
        let group = self
            .session
            .api()
            .group(&target.conn, target.group_id)
            .await?;
        let current = group
            .action
            .ct
            .map(commands::mired_to_kelvin)
            .unwrap_or(commands::MIN_KELVIN);
        let step = self.session.config().color_temperature_step;
        let next = commands::step_kelvin(current, step, direction);
        debug!("Color temperature {}K -> {}K", current, next);

        let state = LightState {
            ct: Some(commands::kelvin_to_mired(next)),
            ..LightState::default()
        };
        self.session
            .api()
            .set_group_state(&target.conn, target.group_id, &state)
            .await?;

        let dialog = match direction {
            Direction::Increase => "increase.color.temperature",
            Direction::Decrease => "decrease.color.temperature",
        };
        self.say_verbose(dialog, &[]).await;
        Ok(Outcome::Done)
    }

    /// Explicit reconnect; refused when the address is pinned in config
    async fn connect_lights(&mut self) -> HueResult<Outcome> {
        if self.session.user_supplied_ip() {
            self.say("ip.in.config", &[]).await;
            return Ok(Outcome::Refused);
        }

        self.say_verbose("connecting", &[]).await;
        match self.session.reconnect().await {
            Ok(()) => Ok(Outcome::Done),
            Err(e) => self.connection_failure(e).await,
        }
    }
}
