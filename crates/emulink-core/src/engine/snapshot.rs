use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Updates buffered per subscriber before new ones are dropped.
const SUBSCRIBER_BUFFER: usize = 16;

/// The result of one complete polling sweep.
///
/// `values` and `raw` always hold the same keys: a point either succeeded
/// this sweep and appears in both, or is absent from both.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub connected: bool,
    /// Profile the values were read for; `None` when no profile is loaded.
    pub profile_id: Option<String>,
    /// Values after the point's formula, or the raw value if it has none.
    pub values: BTreeMap<String, f64>,
    pub raw: BTreeMap<String, f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl GameSnapshot {
    /// Same values, marked disconnected.
    pub fn disconnected(&self) -> Self {
        Self {
            connected: false,
            ..self.clone()
        }
    }
}

/// Game and console the detection loop is locked onto.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub game_id: Option<String>,
    /// Console tag of the console the game was found on.
    pub console: Option<String>,
    /// Memory server port of that console.
    pub port: Option<u16>,
}

impl Detection {
    pub fn found(game_id: impl Into<String>, console: impl Into<String>, port: u16) -> Self {
        Self {
            game_id: Some(game_id.into()),
            console: Some(console.into()),
            port: Some(port),
        }
    }

    pub fn is_detected(&self) -> bool {
        self.game_id.is_some()
    }
}

/// A value published by one writer and read by many.
///
/// Readers get the latest `Arc` without waiting on the writer beyond a
/// pointer swap; subscribers additionally receive each published value.
#[derive(Debug)]
pub struct Observable<T> {
    current: RwLock<Arc<T>>,
    subscribers: Mutex<Vec<SyncSender<Arc<T>>>>,
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(value)),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn get(&self) -> Arc<T> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    /// Replace the current value and notify subscribers.
    pub fn publish(&self, value: T) {
        let value = Arc::new(value);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&value);

        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Slow subscribers miss updates; disconnected ones are dropped
        subscribers.retain(|tx| {
            !matches!(
                tx.try_send(Arc::clone(&value)),
                Err(TrySendError::Disconnected(_))
            )
        });
    }

    /// Receive every value published from now on.
    pub fn subscribe(&self) -> Receiver<Arc<T>> {
        let (tx, rx) = sync_channel(SUBSCRIBER_BUFFER);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }
}

impl<T: PartialEq> Observable<T> {
    /// Publish only if the value differs from the current one.
    pub fn publish_if_changed(&self, value: T) -> bool {
        if *self.get() == value {
            return false;
        }
        self.publish(value);
        true
    }
}
