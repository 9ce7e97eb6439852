//! Console and profile definitions handed to the engine.

mod console;
mod profile;
mod value_type;

pub use console::*;
pub use profile::*;
pub use value_type::*;
