//! Bridge Discovery
//!
//! Finds a Hue bridge on the local network with a single SSDP M-SEARCH.

use crate::error::{HueError, HueResult};
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, info};

pub const SSDP_ADDR: &str = "239.255.255.250:1900";
const SSDP_GROUP: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 1900);
const SSDP_MX: u8 = 1;
const SSDP_ST: &str = "urn:schemas-upnp-org:device:Basic:1";
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Header line only Hue bridges include in their SSDP reply
const BRIDGE_MARKER: &str = "hue-bridgeid";

/// Anything that can locate a bridge address
#[async_trait]
pub trait Discover: Send + Sync {
    async fn discover(&self) -> HueResult<String>;
}

/// SSDP discovery against the UPnP multicast group
#[derive(Debug, Clone)]
pub struct SsdpDiscovery {
    target: SocketAddr,
    timeout: Duration,
}

impl Default for SsdpDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl SsdpDiscovery {
    pub fn new() -> Self {
        Self {
            target: SocketAddr::V4(SSDP_GROUP),
            timeout: DISCOVERY_TIMEOUT,
        }
    }

    /// Send the search somewhere other than the multicast group
    pub fn with_target(mut self, target: SocketAddr) -> Self {
        self.target = target;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn search_request(&self) -> String {
        format!(
            "M-SEARCH * HTTP/1.1\r\n\
             HOST: {}\r\n\
             MAN: \"ssdp:discover\"\r\n\
             MX: {}\r\n\
             ST: {}\r\n\
             \r\n",
            SSDP_ADDR, SSDP_MX, SSDP_ST
        )
    }

    async fn search(&self) -> std::io::Result<String> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket
            .send_to(self.search_request().as_bytes(), self.target)
            .await?;

        let mut buf = [0u8; 4096];
        let len = socket.recv(&mut buf).await?;
        Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
    }
}

#[async_trait]
impl Discover for SsdpDiscovery {
    async fn discover(&self) -> HueResult<String> {
        info!("🔍 Searching for Hue bridge via SSDP...");

        let response = match tokio::time::timeout(self.timeout, self.search()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                debug!("SSDP search failed: {}", e);
                return Err(HueError::DeviceNotFound);
            }
            Err(_) => {
                debug!("SSDP search timed out after {:?}", self.timeout);
                return Err(HueError::DeviceNotFound);
            }
        };

        let host = parse_ssdp_response(&response).ok_or(HueError::DeviceNotFound)?;
        info!("✅ Found bridge at {}", host);
        Ok(host)
    }
}

/// Extract the bridge host from an SSDP reply.
///
/// The location header sits two lines above the `hue-bridgeid` marker.
pub fn parse_ssdp_response(response: &str) -> Option<String> {
    let lines: Vec<&str> = response.lines().collect();
    let marker = lines.iter().position(|l| l.starts_with(BRIDGE_MARKER))?;
    let location_line = lines.get(marker.checked_sub(2)?)?;

    let (_, value) = location_line.split_once(':')?;
    let location = url::Url::parse(value.trim()).ok()?;
    location.host_str().map(str::to_string)
}
