pub mod codec;
mod pinned;
mod udp;

// Mock transport for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use pinned::PinnedPort;
pub use udp::UdpTransport;

#[doc(hidden)]
pub use mock::{MockTransport, MockTransportBuilder, WriteRecord};

use crate::config::pointer::POINTER_SIZE;
use crate::error::Result;

/// Access to emulator memory.
///
/// Implementations serialize their own operations, so a single instance can
/// be shared between the detection loop, the polling loop and macros.
pub trait MemoryTransport: Send + Sync {
    /// Read `size` bytes at `address` from the current port.
    ///
    /// The returned buffer may be shorter than requested if the server
    /// replied with fewer bytes.
    fn read(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Send `data` to `address` without waiting for a reply.
    fn write(&self, address: u64, data: &[u8]) -> Result<()>;

    /// Switch the target port. A different port invalidates the current socket.
    fn set_port(&self, port: u16);

    fn port(&self) -> u16;

    /// Release the socket; the next operation opens a fresh one.
    fn close(&self);

    /// Switch to `port` and read, with no other operation in between.
    fn read_on_port(&self, port: u16, address: u64, size: usize) -> Result<Vec<u8>> {
        self.set_port(port);
        self.read(address, size)
    }

    /// Switch to `port` and write, with no other operation in between.
    fn write_on_port(&self, port: u16, address: u64, data: &[u8]) -> Result<()> {
        self.set_port(port);
        self.write(address, data)
    }

    /// Read a 32-bit pointer-sized value in the given byte order.
    ///
    /// Returns `None` when the reply is shorter than a pointer.
    fn read_u32(&self, address: u64, big_endian: bool) -> Result<Option<u32>> {
        let bytes = self.read(address, POINTER_SIZE)?;
        let Some(word) = bytes
            .get(..POINTER_SIZE)
            .and_then(|word| <[u8; 4]>::try_from(word).ok())
        else {
            return Ok(None);
        };
        Ok(Some(if big_endian {
            u32::from_be_bytes(word)
        } else {
            u32::from_le_bytes(word)
        }))
    }
}

impl<T: MemoryTransport + ?Sized> MemoryTransport for std::sync::Arc<T> {
    fn read(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read(address, size)
    }

    fn write(&self, address: u64, data: &[u8]) -> Result<()> {
        (**self).write(address, data)
    }

    fn set_port(&self, port: u16) {
        (**self).set_port(port)
    }

    fn port(&self) -> u16 {
        (**self).port()
    }

    fn close(&self) {
        (**self).close()
    }

    fn read_on_port(&self, port: u16, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_on_port(port, address, size)
    }

    fn write_on_port(&self, port: u16, address: u64, data: &[u8]) -> Result<()> {
        (**self).write_on_port(port, address, data)
    }
}
