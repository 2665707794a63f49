//! Scripted bridge and discovery for session and dispatcher tests

use async_trait::async_trait;
use huetalk::bridge::{BridgeApi, Connection, GroupAction, GroupInfo, LightState, SceneInfo};
use huetalk::discovery::Discover;
use huetalk::error::{HueError, HueResult};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const ISSUED_USERNAME: &str = "issued-user";

#[derive(Default)]
struct BridgeState {
    groups: HashMap<String, GroupInfo>,
    scenes: HashMap<String, SceneInfo>,
    valid_users: Vec<String>,
    /// Registration attempts refused before one succeeds
    refusals_left: u32,
    register_calls: u32,
    probe_calls: u32,
    /// Failures returned by the next set_group_state calls, in order
    group_failures: VecDeque<HueError>,
    group_states: Vec<(u32, LightState)>,
    light_states: Vec<(String, LightState)>,
}

/// In-memory bridge with a kitchen (1: lights 1, 2) and a living room (2: light 3)
pub struct MockBridge {
    state: Mutex<BridgeState>,
}

impl MockBridge {
    pub fn new() -> Self {
        let groups = HashMap::from([
            ("0".to_string(), group("Lightset 0", &["1", "2", "3"], 100, 300)),
            ("1".to_string(), group("Kitchen", &["1", "2"], 200, 250)),
            ("2".to_string(), group("Living Room", &["3"], 230, 160)),
        ]);
        let scenes = HashMap::from([
            ("kitchen-relax".to_string(), scene("Relax", Some("1"))),
            ("global-relax".to_string(), scene("Relax", None)),
            ("global-party".to_string(), scene("Party", None)),
        ]);

        Self {
            state: Mutex::new(BridgeState {
                groups,
                scenes,
                valid_users: vec![ISSUED_USERNAME.to_string()],
                ..BridgeState::default()
            }),
        }
    }

    pub fn with_user(self, username: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .valid_users
            .push(username.to_string());
        self
    }

    /// Refuse the first `n` registration attempts
    pub fn refuse_registrations(self, n: u32) -> Self {
        self.state.lock().unwrap().refusals_left = n;
        self
    }

    pub fn fail_next_group_state(&self, error: HueError) {
        self.state.lock().unwrap().group_failures.push_back(error);
    }

    pub fn rename_group(&self, id: &str, name: &str) {
        if let Some(g) = self.state.lock().unwrap().groups.get_mut(id) {
            g.name = name.to_string();
        }
    }

    pub fn register_calls(&self) -> u32 {
        self.state.lock().unwrap().register_calls
    }

    pub fn probe_calls(&self) -> u32 {
        self.state.lock().unwrap().probe_calls
    }

    pub fn group_states(&self) -> Vec<(u32, LightState)> {
        self.state.lock().unwrap().group_states.clone()
    }

    pub fn light_states(&self) -> Vec<(String, LightState)> {
        self.state.lock().unwrap().light_states.clone()
    }

    fn check_user(&self, username: &str) -> HueResult<()> {
        if self.state.lock().unwrap().valid_users.iter().any(|u| u == username) {
            Ok(())
        } else {
            Err(HueError::Unauthorized(username.to_string()))
        }
    }
}

fn group(name: &str, lights: &[&str], bri: u8, ct: u16) -> GroupInfo {
    GroupInfo {
        name: name.to_string(),
        lights: lights.iter().map(|l| l.to_string()).collect(),
        action: GroupAction {
            on: true,
            bri: Some(bri),
            ct: Some(ct),
        },
    }
}

fn scene(name: &str, group: Option<&str>) -> SceneInfo {
    SceneInfo {
        name: name.to_string(),
        group: group.map(str::to_string),
    }
}

#[async_trait]
impl BridgeApi for MockBridge {
    async fn probe(&self, _address: &str, username: &str) -> HueResult<()> {
        self.state.lock().unwrap().probe_calls += 1;
        self.check_user(username)
    }

    async fn create_user(&self, _address: &str, _device_type: &str) -> HueResult<String> {
        let mut state = self.state.lock().unwrap();
        state.register_calls += 1;
        if state.refusals_left > 0 {
            state.refusals_left -= 1;
            return Err(HueError::LinkButtonNotPressed);
        }
        Ok(ISSUED_USERNAME.to_string())
    }

    async fn groups(&self, conn: &Connection) -> HueResult<HashMap<String, GroupInfo>> {
        self.check_user(&conn.username)?;
        let mut groups = self.state.lock().unwrap().groups.clone();
        // The bridge never lists group 0
        groups.remove("0");
        Ok(groups)
    }

    async fn group(&self, conn: &Connection, group_id: u32) -> HueResult<GroupInfo> {
        self.check_user(&conn.username)?;
        self.state
            .lock()
            .unwrap()
            .groups
            .get(&group_id.to_string())
            .cloned()
            .ok_or_else(|| HueError::UnknownBridgeError(format!("resource, /groups/{}, not available", group_id)))
    }

    async fn scenes(&self, conn: &Connection) -> HueResult<HashMap<String, SceneInfo>> {
        self.check_user(&conn.username)?;
        Ok(self.state.lock().unwrap().scenes.clone())
    }

    async fn set_group_state(
        &self,
        conn: &Connection,
        group_id: u32,
        state: &LightState,
    ) -> HueResult<()> {
        self.check_user(&conn.username)?;
        let mut inner = self.state.lock().unwrap();
        if let Some(error) = inner.group_failures.pop_front() {
            return Err(error);
        }
        inner.group_states.push((group_id, state.clone()));
        Ok(())
    }

    async fn set_light_state(
        &self,
        conn: &Connection,
        light_id: &str,
        state: &LightState,
    ) -> HueResult<()> {
        self.check_user(&conn.username)?;
        self.state
            .lock()
            .unwrap()
            .light_states
            .push((light_id.to_string(), state.clone()));
        Ok(())
    }
}

/// Discovery that answers from a script, then with a fixed address
pub struct MockDiscovery {
    address: String,
    script: Mutex<VecDeque<HueResult<String>>>,
    calls: AtomicUsize,
}

impl MockDiscovery {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn then(self, result: HueResult<String>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Discover for MockDiscovery {
    async fn discover(&self) -> HueResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(self.address.clone()),
        }
    }
}
