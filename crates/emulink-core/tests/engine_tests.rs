//! Integration tests for the engine
//!
//! Profiles come from a real directory and memory from the mock transport,
//! so detection, profile loading, polling, writes and macros run together.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use emulink_core::transport::{MockTransport, MockTransportBuilder};
use emulink_core::{
    ConsoleConfig, Engine, EngineConfig, EngineState, ProfileDirectory, ScriptBridge,
};
use tempfile::TempDir;

const SUNSHINE: &str = r#"{
    "id": "GMS",
    "name": "Super Mario Sunshine",
    "platform": "GCN",
    "dataPoints": [
        { "id": "coins", "type": "u32_be", "size": 4,
          "addresses": { "GMSE01": "0x80578A60", "GMSJ01": "0x80575F80" } },
        { "id": "pos_x", "type": "float_be", "size": 4, "formula": "v/100",
          "pointer": { "default": "0x8040A378" }, "offsets": ["0x10"] },
        { "id": "lives", "type": "u8", "size": 1,
          "pointer": { "default": "0x8040A378" }, "offsets": ["0x20", "0x4"] }
    ],
    "macros": [
        { "id": "extra_lives", "steps": [
            { "varId": "lives", "value": "99" },
            { "delay": 5 },
            { "varId": "coins", "value": "lives" }
        ] }
    ]
}"#;

fn config() -> EngineConfig {
    EngineConfig {
        poll_interval_ms: 10,
        detection_success_delay_ms: 20,
        detection_retry_delay_ms: 10,
        ..EngineConfig::default()
    }
}

fn profiles() -> (TempDir, ProfileDirectory) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("GMS.json"), SUNSHINE).unwrap();
    let profiles = ProfileDirectory::new(dir.path());
    (dir, profiles)
}

fn sunshine() -> Arc<MockTransport> {
    Arc::new(
        MockTransportBuilder::new()
            .write_str(0x8000_0000, "GMSE01")
            .write_u32_be(0x8057_8A60, 120)
            .write_u32_be(0x8040_A378, 0x8100_0000)
            .write_f32_be(0x8100_0010, 250.0)
            .write_u32_be(0x8100_0020, 0x8120_0000)
            .write_u8(0x8120_0004, 3)
            .build(),
    )
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(5) {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_profile_loaded_by_series_prefix() {
    let (_dir, profiles) = profiles();
    let engine = Engine::with_profile_source(sunshine(), config(), profiles);
    engine.start(ConsoleConfig::builtin()).unwrap();

    assert!(wait_until(|| engine.snapshot().raw.len() == 3));
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.values["coins"], 120.0);
    assert_eq!(snapshot.raw["pos_x"], 250.0);
    assert_eq!(snapshot.values["pos_x"], 2.5);
    assert_eq!(snapshot.values["lives"], 3.0);
    assert_eq!(engine.state(), EngineState::Polling);
    assert_eq!(engine.resolve("lives"), Some(0x8120_0004));

    engine.stop();
}

#[test]
fn test_null_pointer_drops_only_that_point() {
    let mock = sunshine();
    let (_dir, profiles) = profiles();
    let engine = Engine::with_profile_source(Arc::clone(&mock), config(), profiles);
    engine.start(ConsoleConfig::builtin()).unwrap();
    assert!(wait_until(|| engine.snapshot().raw.len() == 3));

    // Level unloaded: the second pointer in the chain is cleared
    mock.poke(55355, 0x8100_0020, &[0, 0, 0, 0]);
    assert!(wait_until(|| !engine.snapshot().raw.contains_key("lives")));

    let snapshot = engine.snapshot();
    assert!(snapshot.connected);
    assert!(snapshot.raw.contains_key("coins"));
    assert!(snapshot.raw.contains_key("pos_x"));
    assert_eq!(snapshot.raw.len(), snapshot.values.len());

    engine.stop();
}

#[test]
fn test_game_switch_reloads_profile() {
    let mock = sunshine();
    let (dir, profiles) = profiles();
    fs::write(
        dir.path().join("GZLE01.json"),
        r#"{ "id": "GZLE01", "name": "Wind Waker", "platform": "GCN", "dataPoints": [
              { "id": "health", "type": "u16_be", "size": 2,
                "addresses": { "default": "0x803CA764" } } ] }"#,
    )
    .unwrap();
    let engine = Engine::with_profile_source(Arc::clone(&mock), config(), profiles);
    engine.start(ConsoleConfig::builtin()).unwrap();
    assert!(wait_until(|| engine.snapshot().connected));

    mock.poke(55355, 0x8000_0000, b"GZLE01");
    mock.poke(55355, 0x803C_A764, &[0x00, 0x0C]);
    assert!(wait_until(|| engine.snapshot().values.get("health") == Some(&12.0)));
    assert_eq!(engine.profile().unwrap().id, "GZLE01");
    assert_eq!(engine.detected_game_id().as_deref(), Some("GZLE01"));

    engine.stop();
}

#[test]
fn test_detection_and_snapshot_subscriptions() {
    let mock = sunshine();
    let (_dir, profiles) = profiles();
    let engine = Engine::with_profile_source(Arc::clone(&mock), config(), profiles);
    let detections = engine.subscribe_detection();
    let snapshots = engine.subscribe();
    engine.start(ConsoleConfig::builtin()).unwrap();

    let detection = detections.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(detection.game_id.as_deref(), Some("GMSE01"));
    assert_eq!(detection.console.as_deref(), Some("GCN"));

    let snapshot = snapshots.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(snapshot.profile_id.as_deref(), Some("GMS"));

    mock.clear_port(55355);
    let lost = detections.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(!lost.is_detected());
    assert!(wait_until(|| !engine.snapshot().connected));

    engine.stop();
}

#[test]
fn test_macro_through_bridge() {
    let mock = sunshine();
    let (_dir, profiles) = profiles();
    let engine = Engine::with_profile_source(Arc::clone(&mock), config(), profiles);
    engine.start(ConsoleConfig::builtin()).unwrap();
    assert!(wait_until(|| engine.snapshot().raw.len() == 3));

    let bridge = ScriptBridge::new(engine.clone());
    assert!(bridge.run_macro("extra_lives"));
    assert!(wait_until(|| mock.writes().len() == 2));

    let writes = mock.writes();
    assert_eq!(writes[0].address, 0x8120_0004);
    assert_eq!(writes[0].data, vec![99]);
    // The reference reads the snapshot taken before or after the first write
    assert_eq!(writes[1].address, 0x8057_8A60);
    assert!(matches!(writes[1].data.as_slice(), [0, 0, 0, 3] | [0, 0, 0, 99]));

    engine.stop();
}

#[test]
fn test_stop_releases_everything() {
    let (_dir, profiles) = profiles();
    let engine = Engine::with_profile_source(sunshine(), config(), profiles);
    engine.start(ConsoleConfig::builtin()).unwrap();
    assert!(wait_until(|| engine.snapshot().connected));

    engine.stop();
    assert_eq!(engine.state(), EngineState::Idle);
    assert!(!engine.is_running());
    assert_eq!(engine.detected_game_id(), None);

    // Nothing publishes after stop
    let updated_at = engine.snapshot().updated_at;
    thread::sleep(Duration::from_millis(50));
    assert_eq!(engine.snapshot().updated_at, updated_at);
}
