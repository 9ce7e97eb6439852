//! Datagram framing for the emulator memory server.
//!
//! Every request starts with an 8-byte little-endian header:
//!
//! ```text
//! [0..4] address (u32 LE)
//! [4..8] size    (u32 LE)
//! [8..]  payload (writes only, `size` bytes)
//! ```
//!
//! A read is answered with one datagram holding the raw bytes of the region.

use crate::config::transport::{MAX_ADDRESS, MAX_READ_SIZE};
use crate::error::{Error, Result};

/// Length of the request header.
pub const HEADER_LEN: usize = 8;

/// A decoded request datagram, as seen by the memory server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub address: u32,
    pub size: u32,
    /// Empty for reads.
    pub payload: Vec<u8>,
}

impl Request {
    pub fn is_write(&self) -> bool {
        !self.payload.is_empty()
    }
}

fn check_address(address: u64) -> Result<u32> {
    if address > MAX_ADDRESS {
        return Err(Error::invalid(format!(
            "address {:#x} exceeds 32-bit range",
            address
        )));
    }
    Ok(address as u32)
}

/// Validate read arguments without building a datagram.
pub fn validate_read(address: u64, size: usize) -> Result<()> {
    check_address(address)?;
    if size == 0 || size > MAX_READ_SIZE {
        return Err(Error::invalid(format!(
            "read size {} outside 1..={}",
            size, MAX_READ_SIZE
        )));
    }
    Ok(())
}

/// Validate write arguments without building a datagram.
pub fn validate_write(address: u64, data: &[u8]) -> Result<()> {
    check_address(address)?;
    if data.is_empty() {
        return Err(Error::invalid("write payload is empty"));
    }
    Ok(())
}

pub fn encode_read_request(address: u64, size: usize) -> Result<[u8; HEADER_LEN]> {
    validate_read(address, size)?;

    let mut request = [0u8; HEADER_LEN];
    request[0..4].copy_from_slice(&(address as u32).to_le_bytes());
    request[4..8].copy_from_slice(&(size as u32).to_le_bytes());
    Ok(request)
}

pub fn encode_write_request(address: u64, data: &[u8]) -> Result<Vec<u8>> {
    validate_write(address, data)?;

    let mut request = Vec::with_capacity(HEADER_LEN + data.len());
    request.extend_from_slice(&(address as u32).to_le_bytes());
    request.extend_from_slice(&(data.len() as u32).to_le_bytes());
    request.extend_from_slice(data);
    Ok(request)
}

/// Decode a request datagram. Returns `None` for truncated datagrams.
pub fn decode_request(datagram: &[u8]) -> Option<Request> {
    let header = datagram.get(..HEADER_LEN)?;
    let address = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    let body = &datagram[HEADER_LEN..];
    let payload = if body.is_empty() {
        Vec::new()
    } else {
        body.get(..size as usize)?.to_vec()
    };

    Some(Request {
        address,
        size,
        payload,
    })
}
