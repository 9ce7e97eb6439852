//! Address resolution and raw value decoding.
//!
//! - `hex` - lenient hex address parsing
//! - `game_key` - game ID normalization and tiered key lookup
//! - `address` - static and pointer-chain address resolution
//! - `value` - typed decoding and encoding of raw bytes

mod address;
mod game_key;
mod hex;
mod value;

pub use address::*;
pub use game_key::*;
pub use hex::*;
pub use value::*;
