use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::transport::{
    DEFAULT_PORT, DRAIN_ATTEMPTS, DRAIN_TIMEOUT_MS, MIN_RECV_BUFFER, SOCKET_TIMEOUT_MS,
};
use crate::error::{Error, Result};
use crate::transport::MemoryTransport;
use crate::transport::codec;

struct Inner {
    port: u16,
    socket: Option<UdpSocket>,
}

/// UDP client for an emulator-hosted memory server.
///
/// All operations take the same lock, so concurrent callers queue up
/// instead of interleaving datagrams on the shared socket.
pub struct UdpTransport {
    host: String,
    timeout: Duration,
    inner: Mutex<Inner>,
}

impl UdpTransport {
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_timeout(host, Duration::from_millis(SOCKET_TIMEOUT_MS))
    }

    pub fn with_timeout(host: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            timeout,
            inner: Mutex::new(Inner {
                port: DEFAULT_PORT,
                socket: None,
            }),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic mid-operation leaves at worst a stale socket, which is safe to reuse
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open_socket(&self) -> Result<UdpSocket> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.set_read_timeout(Some(self.timeout))?;
        debug!("Opened UDP socket on {:?}", socket.local_addr().ok());
        Ok(socket)
    }

    fn socket<'a>(&self, inner: &'a mut Inner) -> Result<&'a UdpSocket> {
        let socket = match inner.socket.take() {
            Some(socket) => socket,
            None => self.open_socket()?,
        };
        Ok(inner.socket.insert(socket))
    }

    /// Discard replies to requests that were abandoned after a timeout.
    fn drain(&self, socket: &UdpSocket) -> Result<()> {
        socket.set_read_timeout(Some(Duration::from_millis(DRAIN_TIMEOUT_MS)))?;
        let mut scratch = [0u8; MIN_RECV_BUFFER];
        let mut drained = 0;
        for _ in 0..DRAIN_ATTEMPTS {
            match socket.recv(&mut scratch) {
                Ok(_) => drained += 1,
                Err(_) => break,
            }
        }
        socket.set_read_timeout(Some(self.timeout))?;
        if drained > 0 {
            debug!("Drained {} stale datagram(s)", drained);
        }
        Ok(())
    }

    fn switch_port(inner: &mut Inner, port: u16) {
        if inner.port != port {
            debug!("Switching memory server port {} -> {}", inner.port, port);
            inner.port = port;
            inner.socket = None;
        }
    }

    fn write_request(address: u64, data: &[u8]) -> Result<Vec<u8>> {
        codec::encode_write_request(address, data)
            .inspect_err(|e| warn!("Rejected write: {}", e))
    }

    /// Fire-and-forget send; no reply is awaited.
    fn send_locked(&self, inner: &mut Inner, address: u64, request: &[u8]) -> Result<()> {
        let port = inner.port;
        let socket = self.socket(inner)?;
        if let Err(e) = socket.send_to(request, (self.host.as_str(), port)) {
            debug!("UDP write failed at {:#x} (port {}): {}", address, port, e);
            inner.socket = None;
            return Err(e.into());
        }
        Ok(())
    }

    fn read_locked(&self, inner: &mut Inner, address: u64, size: usize) -> Result<Vec<u8>> {
        let request = codec::encode_read_request(address, size)?;
        let port = inner.port;

        let result = self.exchange(inner, port, address, size, &request);
        if let Err(e) = &result {
            debug!("UDP read failed at {:#x} (port {}): {}", address, port, e);
            if matches!(e, Error::Io(_)) {
                inner.socket = None;
            }
        }
        result
    }

    fn exchange(
        &self,
        inner: &mut Inner,
        port: u16,
        address: u64,
        size: usize,
        request: &[u8],
    ) -> Result<Vec<u8>> {
        let socket = self.socket(inner)?;
        self.drain(socket)?;
        socket.send_to(request, (self.host.as_str(), port))?;

        let mut buffer = vec![0u8; size.max(MIN_RECV_BUFFER)];
        match socket.recv(&mut buffer) {
            Ok(received) => {
                buffer.truncate(received);
                Ok(buffer)
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(Error::Timeout { address })
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl MemoryTransport for UdpTransport {
    fn read(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if let Err(e) = codec::validate_read(address, size) {
            warn!("Rejected read: {}", e);
            return Err(e);
        }
        let mut inner = self.lock();
        self.read_locked(&mut inner, address, size)
    }

    fn write(&self, address: u64, data: &[u8]) -> Result<()> {
        let request = Self::write_request(address, data)?;
        let mut inner = self.lock();
        self.send_locked(&mut inner, address, &request)
    }

    fn set_port(&self, port: u16) {
        Self::switch_port(&mut self.lock(), port);
    }

    fn port(&self) -> u16 {
        self.lock().port
    }

    fn close(&self) {
        self.lock().socket = None;
    }

    fn read_on_port(&self, port: u16, address: u64, size: usize) -> Result<Vec<u8>> {
        codec::validate_read(address, size)?;
        let mut inner = self.lock();
        Self::switch_port(&mut inner, port);
        self.read_locked(&mut inner, address, size)
    }

    fn write_on_port(&self, port: u16, address: u64, data: &[u8]) -> Result<()> {
        let request = Self::write_request(address, data)?;
        let mut inner = self.lock();
        Self::switch_port(&mut inner, port);
        self.send_locked(&mut inner, address, &request)
    }
}
