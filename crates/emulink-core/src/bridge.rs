//! Gate between untrusted scripts and the engine.
//!
//! Scripts may write raw memory, write data points and run macros. Writes
//! are validated and rate limited here before they reach the engine.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::bridge::{VALID_WRITE_SIZES, WRITE_MAX_PER_SECOND, WRITE_WINDOW_MS};
use crate::config::transport::MAX_ADDRESS;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::resolve::{encode_value, parse_hex};
use crate::transport::MemoryTransport;

/// Fixed-window counter: at most `max` calls per window.
///
/// The window starts at the first call after the previous one expired.
#[derive(Debug)]
pub struct WriteRateLimiter {
    max: u32,
    window: Duration,
    window_start: Option<Instant>,
    count: u32,
}

impl Default for WriteRateLimiter {
    fn default() -> Self {
        Self::new(WRITE_MAX_PER_SECOND, Duration::from_millis(WRITE_WINDOW_MS))
    }
}

impl WriteRateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            window_start: None,
            count: 0,
        }
    }

    /// Count a call made at `now`, returning whether it is allowed.
    pub fn check(&mut self, now: Instant) -> bool {
        let expired = self
            .window_start
            .is_none_or(|start| now.saturating_duration_since(start) > self.window);
        if expired {
            self.window_start = Some(now);
            self.count = 0;
        }

        if self.count >= self.max {
            return false;
        }
        self.count += 1;
        true
    }
}

/// Validate a raw script write and encode its value big-endian.
///
/// `size` must be 1, 2 or 4 and `address_hex` a hex address within 32 bits.
pub fn encode_raw_write(address_hex: &str, size: usize, value: i32) -> Result<(u64, Vec<u8>)> {
    if !VALID_WRITE_SIZES.contains(&size) {
        return Err(Error::invalid(format!(
            "write size {} (expected one of {:?})",
            size, VALID_WRITE_SIZES
        )));
    }
    let address = parse_hex(address_hex)
        .ok_or_else(|| Error::invalid(format!("address '{}'", address_hex)))?;
    if address > MAX_ADDRESS {
        return Err(Error::invalid(format!("address {:#x} out of range", address)));
    }
    Ok((address, encode_value(value, size, false)?))
}

pub struct ScriptBridge<T: MemoryTransport + 'static> {
    engine: Engine<T>,
    limiter: Mutex<WriteRateLimiter>,
}

impl<T: MemoryTransport + 'static> ScriptBridge<T> {
    pub fn new(engine: Engine<T>) -> Self {
        Self::with_limiter(engine, WriteRateLimiter::default())
    }

    pub fn with_limiter(engine: Engine<T>, limiter: WriteRateLimiter) -> Self {
        Self {
            engine,
            limiter: Mutex::new(limiter),
        }
    }

    pub fn engine(&self) -> &Engine<T> {
        &self.engine
    }

    fn allow_write(&self, call: &str) -> bool {
        let allowed = self
            .limiter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .check(Instant::now());
        if !allowed {
            debug!("{} dropped: write rate limit reached", call);
        }
        allowed
    }

    /// Write `value` big-endian at `size` bytes to a hex address.
    pub fn write(&self, address_hex: &str, size: usize, value: i32) -> bool {
        if !self.allow_write("write") {
            return false;
        }

        let result = encode_raw_write(address_hex, size, value)
            .and_then(|(address, data)| self.engine.write_memory(address, &data));
        if let Err(e) = result {
            warn!("Script write rejected: {}", e);
            return false;
        }
        true
    }

    /// Write a data point of the active profile.
    pub fn write_var(&self, id: &str, value: i32) -> bool {
        self.allow_write("write_var") && self.engine.write_variable(id, value)
    }

    /// Start a macro. Not rate limited.
    pub fn run_macro(&self, id: &str) -> bool {
        self.engine.run_macro(id)
    }
}
