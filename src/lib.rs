pub mod error;
pub mod tape;
pub mod command;
pub mod registry;
pub mod record;
pub mod machine;
pub mod config;
pub mod stats;
pub mod interpreter;
pub mod scriptgen;

#[cfg(test)]
mod reference;

pub use command::Command;
pub use config::Config;
pub use error::{Error, Result};
pub use interpreter::Interpreter;
pub use registry::Registry;
pub use stats::Stats;
pub use tape::Tape;
