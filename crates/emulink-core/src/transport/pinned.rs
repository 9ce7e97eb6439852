use crate::error::Result;
use crate::transport::MemoryTransport;

/// A view of a shared transport that always targets one port.
///
/// Detection probes every configured console on the same transport, so a
/// poller or writer that relied on the transport's current port could end up
/// talking to the wrong emulator. Every operation through this view switches
/// to its port atomically.
pub struct PinnedPort<'a, T: MemoryTransport + ?Sized> {
    transport: &'a T,
    port: u16,
}

impl<'a, T: MemoryTransport + ?Sized> PinnedPort<'a, T> {
    pub fn new(transport: &'a T, port: u16) -> Self {
        Self { transport, port }
    }
}

impl<T: MemoryTransport + ?Sized> MemoryTransport for PinnedPort<'_, T> {
    fn read(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.transport.read_on_port(self.port, address, size)
    }

    fn write(&self, address: u64, data: &[u8]) -> Result<()> {
        self.transport.write_on_port(self.port, address, data)
    }

    /// Pinned views ignore port changes.
    fn set_port(&self, _port: u16) {}

    fn port(&self) -> u16 {
        self.port
    }

    fn close(&self) {
        self.transport.close()
    }

    fn read_on_port(&self, port: u16, address: u64, size: usize) -> Result<Vec<u8>> {
        self.transport.read_on_port(port, address, size)
    }

    fn write_on_port(&self, port: u16, address: u64, data: &[u8]) -> Result<()> {
        self.transport.write_on_port(port, address, data)
    }
}
