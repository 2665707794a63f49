//! HueTalk Error Types
//!
//! Centralized error handling for discovery, session and command failures.

use thiserror::Error;

/// Central error type for HueTalk
#[derive(Error, Debug)]
pub enum HueError {
    #[error("No Hue bridge responded to discovery")]
    DeviceNotFound,

    #[error("User '{0}' is not registered with the bridge")]
    Unauthorized(String),

    #[error("Registration failed after {attempts} attempts")]
    RegistrationFailed { attempts: u32 },

    #[error("No bridge credential")]
    MissingCredential,

    #[error("Link button not pressed")]
    LinkButtonNotPressed,

    #[error("No route to host: {0}")]
    NoRouteToHost(String),

    #[error("Failed to connect to bridge: {0}")]
    ConnectionFailed(String),

    #[error("Bridge request timed out")]
    RequestTimeout,

    #[error("Could not find group '{0}'")]
    GroupNotFound(String),

    #[error("Could not find scene '{0}'")]
    SceneNotFound(String),

    #[error("Unknown bridge error: {0}")]
    UnknownBridgeError(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Malformed bridge response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for HueTalk operations
pub type HueResult<T> = Result<T, HueError>;

/// Classify reqwest failures so callers can tell address problems from
/// credential problems.
impl From<reqwest::Error> for HueError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return HueError::RequestTimeout;
        }
        if err.is_connect() {
            if is_no_route(&err) {
                return HueError::NoRouteToHost(err.to_string());
            }
            return HueError::ConnectionFailed(err.to_string());
        }
        if err.is_decode() {
            return HueError::MalformedResponse(err.to_string());
        }
        HueError::ConnectionFailed(err.to_string())
    }
}

/// EHOSTUNREACH on Linux
const EHOSTUNREACH: i32 = 113;

/// Walk the source chain looking for an unreachable-host io error
fn is_no_route(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.raw_os_error() == Some(EHOSTUNREACH)
                || matches!(
                    io.kind(),
                    std::io::ErrorKind::HostUnreachable | std::io::ErrorKind::NetworkUnreachable
                )
            {
                return true;
            }
        }
        if e.to_string().contains("No route to host") {
            return true;
        }
        current = e.source();
    }
    false
}
