use std::time::Duration;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

mod common;
use common::mock_bridge::{MockBridge, MockDiscovery, ISSUED_USERNAME};
use common::{TestContext, BRIDGE_ADDRESS};
use huetalk::config::Config;
use huetalk::error::HueError;
use huetalk::session::{SessionState, ALL_LIGHTS};

#[tokio::test(start_paused = true)]
async fn test_registration_succeeds_after_refusals() {
    let ctx = TestContext::new(MockBridge::new().refuse_registrations(5), Config::default());
    let mut session = ctx.session();

    let start = Instant::now();
    assert_ok!(session.connect(false).await);

    assert_eq!(session.state(), SessionState::Connected);
    assert_eq!(session.username(), Some(ISSUED_USERNAME));
    assert_eq!(ctx.bridge.register_calls(), 6);
    // One second before each attempt
    assert_eq!(start.elapsed(), Duration::from_secs(6));

    assert_eq!(
        ctx.store().username().unwrap().as_deref(),
        Some(ISSUED_USERNAME)
    );
    let spoken = ctx.tts.spoken();
    assert_eq!(spoken.len(), 2);
    assert!(spoken[0].starts_with("Press the link button"));
    assert!(spoken[1].contains("registered with your Hue bridge"));
}

#[tokio::test(start_paused = true)]
async fn test_registration_gives_up_after_thirty_attempts() {
    let ctx = TestContext::new(MockBridge::new().refuse_registrations(u32::MAX), Config::default());
    let mut session = ctx.session();

    let start = Instant::now();
    let result = session.connect(false).await;

    assert!(matches!(result, Err(HueError::RegistrationFailed { attempts: 30 })));
    assert_eq!(ctx.bridge.register_calls(), 30);
    assert_eq!(start.elapsed(), Duration::from_secs(30));
    assert_eq!(session.state(), SessionState::RegistrationFailed);
    assert!(session.vocabulary().is_none());
    assert!(ctx.tts.was_spoken("could not register"));
}

#[tokio::test]
async fn test_stored_credential_skips_registration() {
    let ctx = TestContext::new(MockBridge::new().with_user("stored-user"), Config::default());
    ctx.store().save_username("stored-user").unwrap();
    let mut session = ctx.session();

    assert_ok!(session.connect(false).await);
    assert_eq!(ctx.bridge.probe_calls(), 1);
    assert_eq!(ctx.bridge.register_calls(), 0);
    assert_eq!(session.username(), Some("stored-user"));
    assert_eq!(session.connection().unwrap().address, BRIDGE_ADDRESS);

    let log = std::fs::read_to_string(ctx.audit().path()).unwrap();
    assert!(log.contains("Connected to bridge 192.168.1.20"));
}

#[tokio::test]
async fn test_user_supplied_credential_rejected_without_registering() {
    let config = Config {
        username: Some("bogus".to_string()),
        ..Config::default()
    };
    let ctx = TestContext::new(MockBridge::new(), config);
    let mut session = ctx.session();

    let result = session.connect(false).await;
    match result {
        Err(HueError::Unauthorized(user)) => assert_eq!(user, "bogus"),
        other => panic!("expected Unauthorized, got {:?}", other),
    }
    assert_eq!(ctx.bridge.register_calls(), 0);
    assert_eq!(session.state(), SessionState::Unauthorized);
    assert!(!session.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_stale_stored_credential_triggers_registration() {
    let ctx = TestContext::new(MockBridge::new(), Config::default());
    ctx.store().save_username("stale-user").unwrap();
    let mut session = ctx.session();

    assert_ok!(session.connect(false).await);
    assert_eq!(ctx.bridge.register_calls(), 1);
    assert_eq!(
        ctx.store().username().unwrap().as_deref(),
        Some(ISSUED_USERNAME)
    );
}

#[tokio::test]
async fn test_discovery_failure_reported() {
    let discovery = MockDiscovery::new(BRIDGE_ADDRESS).then(Err(HueError::DeviceNotFound));
    let ctx = TestContext::with_discovery(MockBridge::new(), discovery, Config::default());
    let mut session = ctx.session();

    let result = session.connect(false).await;
    assert!(matches!(result, Err(HueError::DeviceNotFound)));
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_configured_address_skips_discovery() {
    let config = Config {
        ip: Some("10.0.0.7".to_string()),
        username: Some(ISSUED_USERNAME.to_string()),
        ..Config::default()
    };
    let ctx = TestContext::new(MockBridge::new(), config);
    let mut session = ctx.session();

    assert_ok!(session.connect(false).await);
    assert_eq!(ctx.discovery.calls(), 0);
    assert_eq!(session.connection().unwrap().address, "10.0.0.7");
}

#[tokio::test]
async fn test_vocabulary_tracks_connection() {
    let config = Config {
        username: Some(ISSUED_USERNAME.to_string()),
        ..Config::default()
    };
    let ctx = TestContext::new(MockBridge::new(), config);
    let mut session = ctx.session();
    assert!(session.vocabulary().is_none());

    assert_ok!(session.connect(false).await);
    let vocab = session.vocabulary().unwrap();
    assert_eq!(vocab.groups().get("kitchen"), Some(&1));
    assert_eq!(vocab.scene_count(), 3);

    session.invalidate();
    assert!(session.vocabulary().is_none());
    assert_eq!(session.state(), SessionState::Disconnected);

    // Reconnect rebuilds from the bridge, old names do not survive
    ctx.bridge.rename_group("1", "Galley");
    assert_ok!(session.reconnect().await);
    let vocab = session.vocabulary().unwrap();
    assert_eq!(vocab.groups().get("galley"), Some(&1));
    assert!(vocab.groups().get("kitchen").is_none());
    assert_eq!(ctx.discovery.calls(), 2);
    assert!(ctx.tts.was_spoken("Connected to your Hue bridge"));
}

#[tokio::test]
async fn test_default_group_by_name() {
    let config = Config {
        username: Some(ISSUED_USERNAME.to_string()),
        default_group: Some("Living Room".to_string()),
        ..Config::default()
    };
    let ctx = TestContext::new(MockBridge::new(), config);
    let mut session = ctx.session();

    assert_ok!(session.connect(false).await);
    assert_eq!(session.default_group(), 2);
}

#[tokio::test]
async fn test_unknown_default_group_falls_back_to_all_lights() {
    let config = Config {
        username: Some(ISSUED_USERNAME.to_string()),
        default_group: Some("attic".to_string()),
        ..Config::default()
    };
    let ctx = TestContext::new(MockBridge::new(), config);
    let mut session = ctx.session();

    assert_ok!(session.connect(false).await);
    assert_eq!(session.default_group(), ALL_LIGHTS);
    assert!(ctx.tts.was_spoken("could not find a group called attic"));
    assert!(ctx.tts.was_spoken("Using all lights"));
}

#[tokio::test]
async fn test_ensure_connected_is_idempotent() {
    let config = Config {
        username: Some(ISSUED_USERNAME.to_string()),
        ..Config::default()
    };
    let ctx = TestContext::new(MockBridge::new(), config);
    let mut session = ctx.session();

    assert_ok!(session.ensure_connected().await);
    assert_ok!(session.ensure_connected().await);
    assert_eq!(ctx.bridge.probe_calls(), 1);
    assert_eq!(ctx.discovery.calls(), 1);

    session.invalidate();
    assert_err!(session.connection().ok_or(()));
}
