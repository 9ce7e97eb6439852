//! Detection and polling engine.
//!
//! An [`Engine`] owns one transport and runs its work on named threads:
//! one detection loop while started, one polling loop while both a game and
//! a profile are active, and short-lived macro runs. Results are published
//! through [`Observable`]s so readers never wait on the loops.

mod cancel;
mod detection;
mod macros;
mod polling;
mod snapshot;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use serde::Serialize;
use strum::Display;
use tracing::{debug, info, warn};

pub use cancel::CancelToken;
pub use detection::{DetectionEvent, DetectionTracker, probe_consoles};
pub use polling::sweep;
pub use snapshot::{Detection, GameSnapshot, Observable};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::model::{ConsoleConfig, ProfileConfig};
use crate::resolve::{encode_value, parse_hex, resolve_address};
use crate::transport::{MemoryTransport, PinnedPort};

/// Supplies the profile for a detected game.
pub trait ProfileSource: Send + Sync {
    /// Profile covering `game_id`, or `None` if there is none.
    fn load_profile(&self, game_id: &str) -> Option<ProfileConfig>;
}

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EngineState {
    #[default]
    Idle,
    Detecting,
    /// A game is detected but no profile covers it.
    GameFound,
    Polling,
}

struct Worker {
    cancel: Arc<CancelToken>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn spawn<F>(name: &str, cancel: Arc<CancelToken>, run: F) -> Result<Self>
    where
        F: FnOnce(&CancelToken) + Send + 'static,
    {
        let token = Arc::clone(&cancel);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(&token))?;
        Ok(Self { cancel, handle })
    }

    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    fn stop(self) {
        self.cancel.cancel();
        let name = self.handle.thread().name().unwrap_or("worker").to_string();
        if self.handle.join().is_err() {
            warn!("Engine thread '{}' panicked", name);
        }
    }
}

#[derive(Default)]
struct Workers {
    /// Cancelled by `stop`; polling is never started under a cancelled session.
    session: Option<Arc<CancelToken>>,
    detection: Option<Worker>,
    polling: Option<Worker>,
    macros: Vec<Worker>,
}

struct Shared<T> {
    transport: T,
    config: EngineConfig,
    profile_source: Option<Box<dyn ProfileSource>>,
    profile: RwLock<Option<Arc<ProfileConfig>>>,
    snapshot: Observable<GameSnapshot>,
    detection: Observable<Detection>,
    state: RwLock<EngineState>,
    workers: Mutex<Workers>,
    /// Serializes polling restarts so two callers never start two pollers.
    polling_gate: Mutex<()>,
}

impl<T: MemoryTransport + 'static> Shared<T> {
    fn workers(&self) -> MutexGuard<'_, Workers> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn profile(&self) -> Option<Arc<ProfileConfig>> {
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_profile(&self, profile: Option<Arc<ProfileConfig>>) {
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = profile;
    }

    fn state(&self) -> EngineState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: EngineState) {
        let mut current = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *current != state {
            debug!("Engine state {} -> {}", *current, state);
            *current = state;
        }
    }

    fn take_polling(&self) -> Option<Worker> {
        self.workers().polling.take()
    }

    /// Replace the polling loop with one for `profile` on the detected game.
    fn restart_polling(self: &Arc<Self>, profile: Arc<ProfileConfig>, detection: &Detection) {
        let _gate = self
            .polling_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = self.take_polling() {
            old.stop();
        }

        let (Some(game_id), Some(port)) = (detection.game_id.clone(), detection.port) else {
            return;
        };

        let mut workers = self.workers();
        if workers.session.as_ref().is_none_or(|s| s.is_cancelled()) {
            return;
        }

        info!("Polling profile '{}' for {}", profile.id, game_id);
        let shared = Arc::clone(self);
        let worker = Worker::spawn(
            "emulink-polling",
            Arc::new(CancelToken::new()),
            move |cancel| {
                let transport = PinnedPort::new(&shared.transport, port);
                polling::run(
                    &transport,
                    &profile,
                    &game_id,
                    shared.config.poll_interval(),
                    &shared.snapshot,
                    cancel,
                );
            },
        );
        match worker {
            Ok(worker) => {
                workers.polling = Some(worker);
                self.set_state(EngineState::Polling);
            }
            Err(e) => warn!("Failed to start polling: {}", e),
        }
    }

    /// Stop polling and mark the last snapshot disconnected.
    fn stop_polling(&self) {
        let _gate = self
            .polling_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = self.take_polling() {
            old.stop();
        }
        let last = self.snapshot.get();
        if last.connected {
            self.snapshot.publish(last.disconnected());
        }
    }

    fn on_game_found(self: &Arc<Self>, detection: &Detection) {
        let Some(game_id) = detection.game_id.as_deref() else {
            return;
        };

        let profile = match &self.profile_source {
            Some(source) => {
                let loaded = source.load_profile(game_id).map(Arc::new);
                if loaded.is_none() {
                    warn!("No profile for game {}", game_id);
                }
                self.store_profile(loaded.clone());
                loaded
            }
            None => self.profile(),
        };

        match profile {
            Some(profile) => self.restart_polling(profile, detection),
            None => {
                self.stop_polling();
                self.snapshot.publish(GameSnapshot::default());
                self.set_state(EngineState::GameFound);
            }
        }
    }

    fn on_game_lost(&self) {
        self.stop_polling();
        self.set_state(EngineState::Detecting);
    }
}

/// Handle to a running (or stoppable) engine.
///
/// Clones share the same engine. Threads hold a clone until they exit, so an
/// engine that was started must be stopped with [`Engine::stop`].
pub struct Engine<T: MemoryTransport + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: MemoryTransport + 'static> Clone for Engine<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: MemoryTransport + 'static> Engine<T> {
    pub fn new(transport: T, config: EngineConfig) -> Self {
        Self::build(transport, config, None)
    }

    /// Engine that loads a profile whenever detection locks onto a new game.
    pub fn with_profile_source(
        transport: T,
        config: EngineConfig,
        source: impl ProfileSource + 'static,
    ) -> Self {
        Self::build(transport, config, Some(Box::new(source)))
    }

    fn build(
        transport: T,
        config: EngineConfig,
        profile_source: Option<Box<dyn ProfileSource>>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                config,
                profile_source,
                profile: RwLock::new(None),
                snapshot: Observable::default(),
                detection: Observable::default(),
                state: RwLock::new(EngineState::Idle),
                workers: Mutex::new(Workers::default()),
                polling_gate: Mutex::new(()),
            }),
        }
    }

    /// Start detecting games on `consoles`, stopping any previous run first.
    ///
    /// Consoles whose `idAddress` is not valid hex are skipped; if none are
    /// left the engine is not started.
    pub fn start(&self, consoles: Vec<ConsoleConfig>) -> Result<()> {
        self.stop();

        let consoles: Vec<ConsoleConfig> = consoles
            .into_iter()
            .filter(|console| {
                let usable = parse_hex(&console.id_address).is_some();
                if !usable {
                    warn!("Skipping console '{}': bad idAddress", console.id);
                }
                usable
            })
            .collect();
        if consoles.is_empty() {
            return Err(Error::invalid("no console with a valid idAddress"));
        }

        let session = Arc::new(CancelToken::new());
        let mut workers = self.shared.workers();
        workers.session = Some(Arc::clone(&session));
        self.shared.set_state(EngineState::Detecting);

        info!("Starting engine on {} console(s)", consoles.len());
        let shared = Arc::clone(&self.shared);
        let spawned = Worker::spawn("emulink-detection", session, move |cancel| {
            shared.run_detection(&consoles, cancel)
        });
        match spawned {
            Ok(worker) => {
                workers.detection = Some(worker);
                Ok(())
            }
            Err(e) => {
                workers.session = None;
                self.shared.set_state(EngineState::Idle);
                Err(e)
            }
        }
    }

    /// Stop every loop and macro, then release the transport socket.
    pub fn stop(&self) {
        let workers = std::mem::take(&mut *self.shared.workers());
        let Some(session) = workers.session else {
            return;
        };
        session.cancel();

        for worker in workers.detection.into_iter().chain(workers.polling) {
            worker.stop();
        }
        for worker in workers.macros {
            worker.stop();
        }

        self.shared.transport.close();
        self.shared.set_state(EngineState::Idle);
        self.shared.snapshot.publish(self.shared.snapshot.get().disconnected());
        self.shared.detection.publish_if_changed(Detection::default());
        info!("Engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.shared.workers().session.is_some()
    }

    /// Use `profile` from now on, restarting polling if a game is detected.
    pub fn set_profile(&self, profile: ProfileConfig) {
        let profile = Arc::new(profile);
        info!("Profile set to '{}'", profile.id);
        self.shared.store_profile(Some(Arc::clone(&profile)));

        let detection = self.shared.detection.get();
        if detection.is_detected() && self.is_running() {
            self.shared.restart_polling(profile, &detection);
        }
    }

    pub fn profile(&self) -> Option<Arc<ProfileConfig>> {
        self.shared.profile()
    }

    pub fn state(&self) -> EngineState {
        self.shared.state()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<GameSnapshot> {
        self.shared.snapshot.get()
    }

    pub fn subscribe(&self) -> std::sync::mpsc::Receiver<Arc<GameSnapshot>> {
        self.shared.snapshot.subscribe()
    }

    pub fn detection(&self) -> Arc<Detection> {
        self.shared.detection.get()
    }

    pub fn detected_game_id(&self) -> Option<String> {
        self.detection().game_id.clone()
    }

    pub fn detected_console(&self) -> Option<String> {
        self.detection().console.clone()
    }

    pub fn subscribe_detection(&self) -> std::sync::mpsc::Receiver<Arc<Detection>> {
        self.shared.detection.subscribe()
    }

    /// Resolve a data point of the active profile against the detected game.
    pub fn resolve(&self, id: &str) -> Option<u32> {
        let profile = self.profile()?;
        let point = profile.point(id)?;
        let detection = self.detection();
        let transport = PinnedPort::new(&self.shared.transport, detection.port?);
        resolve_address(
            &transport,
            point,
            detection.game_id.as_deref(),
            profile.big_endian_pointers(),
        )
    }

    /// Write `value` to the data point `id` at its declared size and endianness.
    ///
    /// Returns `false` (and logs) when there is no profile or game, the point
    /// is unknown or unresolved, or the write fails.
    pub fn write_variable(&self, id: &str, value: i32) -> bool {
        let Some(profile) = self.profile() else {
            warn!("Cannot write '{}': no profile loaded", id);
            return false;
        };
        let detection = self.detection();
        let (Some(game_id), Some(port)) = (detection.game_id.as_deref(), detection.port) else {
            warn!("Cannot write '{}': no game detected", id);
            return false;
        };
        let Some(point) = profile.point(id) else {
            warn!("Cannot write '{}': unknown data point", id);
            return false;
        };

        let transport = PinnedPort::new(&self.shared.transport, port);
        let big_endian = profile.big_endian_pointers();
        let Some(address) = resolve_address(&transport, point, Some(game_id), big_endian) else {
            debug!("Cannot write '{}': address not resolved", id);
            return false;
        };

        let little_endian = point.value_type.is_little_endian();
        let result = encode_value(value, point.byte_size, little_endian)
            .and_then(|data| transport.write(address as u64, &data));
        match result {
            Ok(()) => {
                debug!("Wrote {} to '{}' at {:#x}", value, id, address);
                true
            }
            Err(e) => {
                warn!("Write to '{}' failed: {}", id, e);
                false
            }
        }
    }

    /// Write raw bytes to the detected console.
    pub fn write_memory(&self, address: u64, data: &[u8]) -> Result<()> {
        let port = self.detection().port.ok_or(Error::NoGameDetected)?;
        self.shared.transport.write_on_port(port, address, data)
    }

    /// Start the macro `id` of the active profile on its own thread.
    ///
    /// Returns `false` if the engine is stopped or the macro is unknown.
    pub fn run_macro(&self, id: &str) -> bool {
        let Some(config) = self
            .profile()
            .and_then(|profile| profile.macro_by_id(id).cloned())
        else {
            warn!("Unknown macro '{}'", id);
            return false;
        };

        let mut workers = self.shared.workers();
        if workers.session.is_none() {
            warn!("Cannot run macro '{}': engine not running", id);
            return false;
        }
        workers.macros.retain(|worker| !worker.is_finished());

        let engine = self.clone();
        let spawned = Worker::spawn(
            "emulink-macro",
            Arc::new(CancelToken::new()),
            move |cancel| macros::run(&engine, &config, cancel),
        );
        match spawned {
            Ok(worker) => {
                workers.macros.push(worker);
                true
            }
            Err(e) => {
                warn!("Failed to start macro '{}': {}", id, e);
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::{Duration, Instant};

    use crate::transport::{MockTransport, MockTransportBuilder, WriteRecord};

    pub(crate) const PROFILE_JSON: &str = r#"{
        "id": "GZL",
        "name": "Wind Waker",
        "platform": "GCN",
        "dataPoints": [
            { "id": "health", "type": "u16_be", "size": 2, "formula": "v/4",
              "addresses": { "GZLE": "0x803CA764" } },
            { "id": "max_health", "type": "u16_be", "size": 2,
              "addresses": { "default": "0x803CA762" } },
            { "id": "rupees", "type": "u8", "size": 1,
              "addresses": { "default": "0x803CA768" } }
        ],
        "macros": [
            { "id": "full_heal", "steps": [
                { "varId": "health", "value": "max_health" },
                { "delay": 10 },
                { "varId": "rupees", "value": "-1" }
            ] },
            { "id": "slow", "steps": [
                { "delay": 10000 },
                { "varId": "rupees", "value": "1" }
            ] }
        ]
    }"#;

    pub(crate) fn profile() -> ProfileConfig {
        serde_json::from_str(PROFILE_JSON).unwrap()
    }

    pub(crate) fn fast_config() -> EngineConfig {
        EngineConfig {
            poll_interval_ms: 10,
            detection_success_delay_ms: 20,
            detection_retry_delay_ms: 10,
            ..EngineConfig::default()
        }
    }

    pub(crate) fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(5) {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    fn zelda() -> Arc<MockTransport> {
        Arc::new(
            MockTransportBuilder::new()
                .write_str(0x8000_0000, "GZLE01")
                .write_u16_be(0x803C_A762, 80)
                .write_u16_be(0x803C_A764, 48)
                .write_u8(0x803C_A768, 12)
                .build(),
        )
    }

    struct MapSource(HashMap<String, ProfileConfig>);

    impl ProfileSource for MapSource {
        fn load_profile(&self, game_id: &str) -> Option<ProfileConfig> {
            self.0.get(game_id).cloned()
        }
    }

    #[test]
    fn test_detects_and_polls() {
        let mock = zelda();
        let engine = Engine::new(Arc::clone(&mock), fast_config());
        engine.set_profile(profile());
        engine.start(ConsoleConfig::builtin()).unwrap();

        assert!(wait_until(|| engine.snapshot().connected));
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.raw["health"], 48.0);
        assert_eq!(snapshot.values["health"], 12.0);
        assert_eq!(snapshot.values["max_health"], 80.0);
        assert_eq!(snapshot.profile_id.as_deref(), Some("GZL"));
        assert!(snapshot.updated_at.is_some());

        assert_eq!(engine.detected_game_id().as_deref(), Some("GZLE01"));
        assert_eq!(engine.detected_console().as_deref(), Some("GCN"));
        assert_eq!(engine.state(), EngineState::Polling);

        engine.stop();
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(!engine.snapshot().connected);
        assert!(!engine.detection().is_detected());
        assert!(!engine.is_running());
    }

    #[test]
    fn test_game_on_second_console() {
        let mock = Arc::new(
            MockTransportBuilder::new()
                .port(55356)
                .write_str(0x8000_0000, "GZLE01")
                .write_u16_be(0x803C_A764, 48)
                .build(),
        );
        let engine = Engine::new(Arc::clone(&mock), fast_config());
        engine.set_profile(profile());
        engine.start(ConsoleConfig::builtin()).unwrap();

        assert!(wait_until(|| engine.snapshot().values.contains_key("health")));
        assert_eq!(engine.detected_console().as_deref(), Some("WII"));
        assert_eq!(engine.detection().port, Some(55356));
        engine.stop();
    }

    #[test]
    fn test_loss_after_failure_threshold() {
        let mock = zelda();
        let engine = Engine::new(Arc::clone(&mock), fast_config());
        engine.set_profile(profile());
        engine.start(ConsoleConfig::builtin()).unwrap();
        assert!(wait_until(|| engine.snapshot().connected));

        mock.set_offline(true);
        assert!(wait_until(|| !engine.detection().is_detected()));
        assert!(!engine.snapshot().connected);
        assert_eq!(engine.state(), EngineState::Detecting);
        assert!(engine.profile().is_some());

        // Same game again: polling resumes with the kept profile
        mock.set_offline(false);
        assert!(wait_until(|| engine.snapshot().connected));
        assert_eq!(engine.state(), EngineState::Polling);
        engine.stop();
    }

    #[test]
    fn test_game_without_profile() {
        let engine = Engine::new(zelda(), fast_config());
        engine.start(ConsoleConfig::builtin()).unwrap();

        assert!(wait_until(|| engine.state() == EngineState::GameFound));
        let snapshot = engine.snapshot();
        assert!(!snapshot.connected);
        assert_eq!(snapshot.profile_id, None);
        engine.stop();
    }

    #[test]
    fn test_profile_source_loads_on_detection() {
        let source = MapSource(HashMap::from([("GZLE01".to_string(), profile())]));
        let engine = Engine::with_profile_source(zelda(), fast_config(), source);
        engine.start(ConsoleConfig::builtin()).unwrap();

        assert!(wait_until(|| engine.snapshot().connected));
        assert_eq!(engine.profile().unwrap().id, "GZL");
        engine.stop();
    }

    #[test]
    fn test_profile_source_without_match() {
        let engine = Engine::with_profile_source(zelda(), fast_config(), MapSource(HashMap::new()));
        engine.set_profile(profile());
        engine.start(ConsoleConfig::builtin()).unwrap();

        assert!(wait_until(|| engine.state() == EngineState::GameFound));
        assert!(engine.profile().is_none());
        engine.stop();
    }

    #[test]
    fn test_set_profile_restarts_polling() {
        let engine = Engine::new(zelda(), fast_config());
        engine.set_profile(profile());
        engine.start(ConsoleConfig::builtin()).unwrap();
        assert!(wait_until(|| engine.snapshot().connected));

        let mut other = profile();
        other.id = "GZL-alt".to_string();
        other.data_points.retain(|p| p.id == "rupees");
        engine.set_profile(other);

        assert!(wait_until(|| {
            engine.snapshot().profile_id.as_deref() == Some("GZL-alt")
        }));
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.raw.keys().collect::<Vec<_>>(), vec!["rupees"]);
        engine.stop();
    }

    #[test]
    fn test_write_variable() {
        let mock = zelda();
        let engine = Engine::new(Arc::clone(&mock), fast_config());
        engine.set_profile(profile());
        engine.start(ConsoleConfig::builtin()).unwrap();
        assert!(wait_until(|| engine.detection().is_detected()));

        assert!(engine.write_variable("health", 40));
        assert!(!engine.write_variable("missing", 1));

        let writes = mock.writes();
        assert_eq!(
            writes,
            vec![WriteRecord {
                port: 55355,
                address: 0x803C_A764,
                data: vec![0x00, 40],
            }]
        );
        assert_eq!(engine.resolve("health"), Some(0x803C_A764));
        engine.stop();
    }

    #[test]
    fn test_writes_need_detected_game() {
        let mock = zelda();
        let engine = Engine::new(Arc::clone(&mock), fast_config());
        engine.set_profile(profile());

        assert!(!engine.write_variable("health", 40));
        assert!(matches!(
            engine.write_memory(0x803C_A764, &[1]),
            Err(Error::NoGameDetected)
        ));
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_run_macro() {
        let mock = zelda();
        let engine = Engine::new(Arc::clone(&mock), fast_config());
        engine.set_profile(profile());
        engine.start(ConsoleConfig::builtin()).unwrap();
        assert!(wait_until(|| engine.snapshot().raw.contains_key("max_health")));

        assert!(engine.run_macro("full_heal"));
        assert!(wait_until(|| mock.writes().len() == 2));

        let writes = mock.writes();
        assert_eq!(writes[0].address, 0x803C_A764);
        assert_eq!(writes[0].data, vec![0x00, 80]);
        assert_eq!(writes[1].address, 0x803C_A768);
        assert_eq!(writes[1].data, vec![0xFF]);

        assert!(!engine.run_macro("missing"));
        engine.stop();
    }

    #[test]
    fn test_macro_copies_high_bit_u32() {
        let copy: ProfileConfig = serde_json::from_str(
            r#"{
                "id": "GZL",
                "name": "Copy",
                "platform": "GCN",
                "dataPoints": [
                    { "id": "src", "type": "u32_be", "size": 4,
                      "addresses": { "default": "0x80001000" } },
                    { "id": "dst", "type": "u32_be", "size": 4,
                      "addresses": { "default": "0x80002000" } }
                ],
                "macros": [
                    { "id": "copy", "steps": [ { "varId": "dst", "value": "src" } ] }
                ]
            }"#,
        )
        .unwrap();
        let mock = Arc::new(
            MockTransportBuilder::new()
                .write_str(0x8000_0000, "GZLE01")
                .write_u32_be(0x8000_1000, 0x8000_0001)
                .write_u32_be(0x8000_2000, 0)
                .build(),
        );
        let engine = Engine::new(Arc::clone(&mock), fast_config());
        engine.set_profile(copy);
        engine.start(ConsoleConfig::builtin()).unwrap();
        assert!(wait_until(|| engine.snapshot().raw.contains_key("src")));
        assert_eq!(engine.snapshot().raw["src"], 2_147_483_649.0);

        assert!(engine.run_macro("copy"));
        assert!(wait_until(|| !mock.writes().is_empty()));
        let writes = mock.writes();
        assert_eq!(writes[0].address, 0x8000_2000);
        assert_eq!(writes[0].data, vec![0x80, 0x00, 0x00, 0x01]);
        engine.stop();
    }

    #[test]
    fn test_stop_cancels_macro() {
        let mock = zelda();
        let engine = Engine::new(Arc::clone(&mock), fast_config());
        engine.set_profile(profile());
        engine.start(ConsoleConfig::builtin()).unwrap();
        assert!(wait_until(|| engine.detection().is_detected()));

        assert!(engine.run_macro("slow"));
        let start = Instant::now();
        engine.stop();
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(mock.writes().is_empty());
        assert!(!engine.run_macro("slow"));
    }

    #[test]
    fn test_start_needs_usable_console() {
        let engine = Engine::new(MockTransport::new(), fast_config());
        let mut console = ConsoleConfig::builtin().remove(0);
        console.id_address = "nope".to_string();

        assert!(engine.start(vec![console]).is_err());
        assert!(!engine.is_running());
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_restart_replaces_session() {
        let engine = Engine::new(zelda(), fast_config());
        engine.set_profile(profile());
        engine.start(ConsoleConfig::builtin()).unwrap();
        assert!(wait_until(|| engine.snapshot().connected));

        engine.start(ConsoleConfig::builtin()).unwrap();
        assert!(engine.is_running());
        assert!(wait_until(|| engine.snapshot().connected));
        engine.stop();
        engine.stop();
    }
}
