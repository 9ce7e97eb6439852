//! Read command implementation.
//!
//! Reads one region from the memory server and prints it in hexdump format:
//!
//! ```text
//! 0x80000000: 47 5A 4C 45 30 31 00 00  00 00 00 00 00 00 00 00  |GZLE01..........|
//! ```

use std::fmt::Write as _;

use anyhow::{Context, Result, anyhow};
use emulink_core::resolve::parse_hex;
use emulink_core::{EngineConfig, MemoryTransport, UdpTransport};

/// Run the read command
pub fn run(
    config: &EngineConfig,
    port: u16,
    address: &str,
    size: usize,
    ascii: bool,
) -> Result<()> {
    let address =
        parse_hex(address).ok_or_else(|| anyhow!("Invalid hex address: {}", address))?;

    let transport = UdpTransport::with_timeout(config.host.as_str(), config.socket_timeout());
    let bytes = transport
        .read_on_port(port, address, size)
        .with_context(|| format!("Failed to read {} bytes at {:#X}", size, address))?;

    println!(
        "{}:{} 0x{:X} ({} of {} bytes):",
        transport.host(),
        port,
        address,
        bytes.len(),
        size
    );
    println!();
    print!("{}", format_hexdump(&bytes, address, ascii));
    Ok(())
}

/// Format bytes as 16-byte hexdump lines labelled with absolute addresses.
pub fn format_hexdump(bytes: &[u8], base: u64, ascii: bool) -> String {
    let mut output = String::new();

    for (i, chunk) in bytes.chunks(16).enumerate() {
        let _ = write!(output, "0x{:08X}: ", base + (i * 16) as u64);

        for j in 0..16 {
            if j == 8 {
                output.push(' ');
            }
            match chunk.get(j) {
                Some(byte) => {
                    let _ = write!(output, "{:02X} ", byte);
                }
                None => output.push_str("   "),
            }
        }

        if ascii {
            output.push_str(" |");
            for byte in chunk {
                if (0x20..0x7F).contains(byte) {
                    output.push(*byte as char);
                } else {
                    output.push('.');
                }
            }
            for _ in chunk.len()..16 {
                output.push(' ');
            }
            output.push('|');
        }

        output.push('\n');
    }

    output
}
