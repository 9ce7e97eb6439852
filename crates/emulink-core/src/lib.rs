pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod formula;
pub mod model;
pub mod resolve;
pub mod transport;

pub use bridge::{ScriptBridge, WriteRateLimiter, encode_raw_write};
pub use config::{EngineConfig, ProfileDirectory, load_consoles};
pub use engine::{Detection, Engine, EngineState, GameSnapshot, ProfileSource};
pub use error::{Error, Result};
pub use formula::{evaluate, try_evaluate};
pub use model::{ConsoleConfig, DataPoint, MacroConfig, MacroStep, ProfileConfig, ValueType};
pub use transport::{MemoryTransport, UdpTransport};
