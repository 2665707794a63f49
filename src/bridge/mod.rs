//! Bridge API
//!
//! The handful of Hue REST operations the voice front-end needs, behind a
//! trait so the session and dispatcher can run against a fake bridge.

use crate::error::HueResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod http;

pub use http::HttpBridge;

/// Bridge error description for a rejected credential
pub const UNAUTHORIZED_USER: &str = "unauthorized user";

/// Bridge error type for "link button not pressed"
pub const LINK_BUTTON_NOT_PRESSED: u32 = 101;

/// Address plus credential of an authenticated bridge session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub address: String,
    pub username: String,
}

/// Current action of a group as reported by the bridge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupAction {
    #[serde(default)]
    pub on: bool,
    #[serde(default)]
    pub bri: Option<u8>,
    /// Color temperature in mireds
    #[serde(default)]
    pub ct: Option<u16>,
}

/// A bridge group (room, zone, or the implicit group 0)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub name: String,
    #[serde(default)]
    pub lights: Vec<String>,
    #[serde(default)]
    pub action: GroupAction,
}

/// A stored scene, optionally owned by one group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneInfo {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
}

impl SceneInfo {
    /// Owning group id, `None` for global scenes
    pub fn group_id(&self) -> Option<u32> {
        self.group.as_deref().and_then(|g| g.parse().ok())
    }
}

/// State change sent to a group or a light. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LightState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sat: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
}

impl LightState {
    pub fn power(on: bool) -> Self {
        Self {
            on: Some(on),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait BridgeApi: Send + Sync {
    /// Authenticated request used to validate a stored credential
    async fn probe(&self, address: &str, username: &str) -> HueResult<()>;

    /// Ask the bridge for a new credential. Only succeeds shortly after the
    /// link button has been pressed.
    async fn create_user(&self, address: &str, device_type: &str) -> HueResult<String>;

    async fn groups(&self, conn: &Connection) -> HueResult<HashMap<String, GroupInfo>>;

    async fn group(&self, conn: &Connection, group_id: u32) -> HueResult<GroupInfo>;

    async fn scenes(&self, conn: &Connection) -> HueResult<HashMap<String, SceneInfo>>;

    async fn set_group_state(
        &self,
        conn: &Connection,
        group_id: u32,
        state: &LightState,
    ) -> HueResult<()>;

    async fn set_light_state(
        &self,
        conn: &Connection,
        light_id: &str,
        state: &LightState,
    ) -> HueResult<()>;

    async fn activate_scene(
        &self,
        conn: &Connection,
        group_id: u32,
        scene_id: &str,
    ) -> HueResult<()> {
        let state = LightState {
            scene: Some(scene_id.to_string()),
            ..LightState::default()
        };
        self.set_group_state(conn, group_id, &state).await
    }
}
