//! Coarse→fine private set intersection between movers and watchers.

pub mod adapter;
pub mod orchestrator;
pub mod ports;
pub mod round;
pub mod types;
pub mod wire;

pub use adapter::*;
pub use orchestrator::*;
pub use ports::*;
pub use round::*;
pub use types::*;
pub use wire::*;
