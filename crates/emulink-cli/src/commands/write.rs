//! Write command implementation.
//!
//! Applies the same validation as script writes: sizes 1, 2 or 4 and values
//! encoded big-endian.

use anyhow::{Context, Result};
use emulink_core::{EngineConfig, MemoryTransport, UdpTransport, encode_raw_write};

/// Run the write command
pub fn run(
    config: &EngineConfig,
    port: u16,
    address: &str,
    size: usize,
    value: i32,
) -> Result<()> {
    let (address, data) = encode_raw_write(address, size, value)?;

    let transport = UdpTransport::with_timeout(config.host.as_str(), config.socket_timeout());
    transport
        .write_on_port(port, address, &data)
        .with_context(|| format!("Failed to write to {:#X}", address))?;

    println!(
        "Sent {} ({} byte(s): {:02X?}) to 0x{:X} on {}:{}",
        value,
        data.len(),
        data,
        address,
        transport.host(),
        port
    );
    Ok(())
}
