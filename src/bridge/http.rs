use super::{
    BridgeApi, Connection, GroupInfo, LightState, SceneInfo, LINK_BUTTON_NOT_PRESSED,
    UNAUTHORIZED_USER,
};
use crate::error::{HueError, HueResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Hue bridge over its v1 REST API
#[derive(Debug, Clone)]
pub struct HttpBridge {
    client: Client,
}

impl HttpBridge {
    /// Client with the standard per-request timeout
    pub fn new() -> HueResult<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> HueResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn url(address: &str, path: &str) -> String {
        format!("http://{}/api{}", address, path)
    }

    async fn get_value(&self, url: &str) -> HueResult<Value> {
        debug!("Bridge GET {}", url);
        let value: Value = self.client.get(url).send().await?.json().await?;
        Ok(value)
    }

    async fn get<T: DeserializeOwned>(&self, conn: &Connection, path: &str) -> HueResult<T> {
        let url = Self::url(&conn.address, &format!("/{}{}", conn.username, path));
        let value = self.get_value(&url).await?;
        check_errors(&value, &conn.username)?;
        serde_json::from_value(value).map_err(|e| HueError::MalformedResponse(e.to_string()))
    }

    async fn put(&self, conn: &Connection, path: &str, state: &LightState) -> HueResult<()> {
        let url = Self::url(&conn.address, &format!("/{}{}", conn.username, path));
        debug!("Bridge PUT {} {:?}", url, state);
        let value: Value = self.client.put(&url).json(state).send().await?.json().await?;
        check_errors(&value, &conn.username)
    }
}

#[async_trait]
impl BridgeApi for HttpBridge {
    async fn probe(&self, address: &str, username: &str) -> HueResult<()> {
        let value = self
            .get_value(&Self::url(address, &format!("/{}", username)))
            .await?;
        check_errors(&value, username)
    }

    async fn create_user(&self, address: &str, device_type: &str) -> HueResult<String> {
        let url = Self::url(address, "");
        debug!("Bridge POST {} (register {})", url, device_type);
        let value: Value = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "devicetype": device_type }))
            .send()
            .await?
            .json()
            .await?;
        check_errors(&value, "")?;

        value
            .get(0)
            .and_then(|v| v.pointer("/success/username"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| HueError::MalformedResponse(value.to_string()))
    }

    async fn groups(&self, conn: &Connection) -> HueResult<HashMap<String, GroupInfo>> {
        self.get(conn, "/groups").await
    }

    async fn group(&self, conn: &Connection, group_id: u32) -> HueResult<GroupInfo> {
        self.get(conn, &format!("/groups/{}", group_id)).await
    }

    async fn scenes(&self, conn: &Connection) -> HueResult<HashMap<String, SceneInfo>> {
        self.get(conn, "/scenes").await
    }

    async fn set_group_state(
        &self,
        conn: &Connection,
        group_id: u32,
        state: &LightState,
    ) -> HueResult<()> {
        self.put(conn, &format!("/groups/{}/action", group_id), state)
            .await
    }

    async fn set_light_state(
        &self,
        conn: &Connection,
        light_id: &str,
        state: &LightState,
    ) -> HueResult<()> {
        self.put(conn, &format!("/lights/{}/state", light_id), state)
            .await
    }
}

/// Turn an embedded bridge error object into a `HueError`.
///
/// The bridge answers with either a bare object or a list of
/// `{"error": {...}}` / `{"success": {...}}` entries; the first error wins.
pub fn check_errors(value: &Value, username: &str) -> HueResult<()> {
    let error = match value {
        Value::Array(items) => items.iter().find_map(|item| item.get("error")),
        Value::Object(_) => value.get("error"),
        _ => None,
    };

    let Some(error) = error else {
        return Ok(());
    };

    let description = error
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let kind = error.get("type").and_then(Value::as_u64);

    if kind == Some(u64::from(LINK_BUTTON_NOT_PRESSED)) {
        return Err(HueError::LinkButtonNotPressed);
    }
    if description == UNAUTHORIZED_USER {
        return Err(HueError::Unauthorized(username.to_string()));
    }
    Err(HueError::UnknownBridgeError(description))
}
