//! Mock transport for testing
//!
//! Serves reads from sparse per-port memory instead of a UDP server and
//! records every write, so engine loops can be tested without sockets.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::transport::DEFAULT_PORT;
use crate::error::{Error, Result};
use crate::transport::{MemoryTransport, codec};

/// A write that reached the mock, with the port it was sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub port: u16,
    pub address: u64,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
struct MockState {
    port: u16,
    memory: HashMap<(u16, u64), u8>,
    writes: Vec<WriteRecord>,
    reads: usize,
    offline: bool,
}

/// In-memory `MemoryTransport`.
///
/// Unmapped bytes and offline ports behave like a server that never replies:
/// reads fail with `Error::Timeout`.
#[derive(Debug)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransportBuilder::new().build()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrite bytes on a port while the mock is in use.
    pub fn poke(&self, port: u16, address: u64, bytes: &[u8]) {
        let mut state = self.lock();
        for (i, byte) in bytes.iter().enumerate() {
            state.memory.insert((port, address + i as u64), *byte);
        }
    }

    /// Forget every byte mapped on a port.
    pub fn clear_port(&self, port: u16) {
        self.lock().memory.retain(|(p, _), _| *p != port);
    }

    /// When offline, every read times out.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.lock().writes.clone()
    }

    /// Number of reads that passed validation and reached the mock.
    pub fn read_count(&self) -> usize {
        self.lock().reads
    }
}

impl MockState {
    fn read(&mut self, port: u16, address: u64, size: usize) -> Result<Vec<u8>> {
        codec::validate_read(address, size)?;

        self.port = port;
        self.reads += 1;
        if self.offline {
            return Err(Error::Timeout { address });
        }

        (0..size as u64)
            .map(|i| self.memory.get(&(port, address + i)).copied())
            .collect::<Option<Vec<u8>>>()
            .ok_or(Error::Timeout { address })
    }

    fn write(&mut self, port: u16, address: u64, data: &[u8]) -> Result<()> {
        codec::validate_write(address, data)?;

        self.port = port;
        for (i, byte) in data.iter().enumerate() {
            self.memory.insert((port, address + i as u64), *byte);
        }
        self.writes.push(WriteRecord {
            port,
            address,
            data: data.to_vec(),
        });
        Ok(())
    }
}

impl MemoryTransport for MockTransport {
    fn read(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut state = self.lock();
        let port = state.port;
        state.read(port, address, size)
    }

    fn write(&self, address: u64, data: &[u8]) -> Result<()> {
        let mut state = self.lock();
        let port = state.port;
        state.write(port, address, data)
    }

    fn set_port(&self, port: u16) {
        self.lock().port = port;
    }

    fn port(&self) -> u16 {
        self.lock().port
    }

    fn close(&self) {}

    fn read_on_port(&self, port: u16, address: u64, size: usize) -> Result<Vec<u8>> {
        self.lock().read(port, address, size)
    }

    fn write_on_port(&self, port: u16, address: u64, data: &[u8]) -> Result<()> {
        self.lock().write(port, address, data)
    }
}

/// Builder for mock memory layouts
#[derive(Debug, Clone)]
pub struct MockTransportBuilder {
    port: u16,
    initial_port: u16,
    memory: HashMap<(u16, u64), u8>,
}

impl Default for MockTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransportBuilder {
    /// Create a builder targeting the default port
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            initial_port: DEFAULT_PORT,
            memory: HashMap::new(),
        }
    }

    /// Direct the following writes at another port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Port the built transport starts on
    pub fn initial_port(mut self, port: u16) -> Self {
        self.initial_port = port;
        self
    }

    pub fn write_bytes(mut self, address: u64, bytes: &[u8]) -> Self {
        for (i, byte) in bytes.iter().enumerate() {
            self.memory.insert((self.port, address + i as u64), *byte);
        }
        self
    }

    /// Write an ASCII game ID or other text, without terminator
    pub fn write_str(self, address: u64, text: &str) -> Self {
        self.write_bytes(address, text.as_bytes())
    }

    pub fn write_u8(self, address: u64, value: u8) -> Self {
        self.write_bytes(address, &[value])
    }

    pub fn write_u16_be(self, address: u64, value: u16) -> Self {
        self.write_bytes(address, &value.to_be_bytes())
    }

    pub fn write_u32_be(self, address: u64, value: u32) -> Self {
        self.write_bytes(address, &value.to_be_bytes())
    }

    pub fn write_u32_le(self, address: u64, value: u32) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_f32_be(self, address: u64, value: f32) -> Self {
        self.write_bytes(address, &value.to_be_bytes())
    }

    pub fn build(self) -> MockTransport {
        MockTransport {
            state: Mutex::new(MockState {
                port: self.initial_port,
                memory: self.memory,
                ..MockState::default()
            }),
        }
    }
}
