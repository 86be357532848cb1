pub mod position_sources;

pub use position_sources::*;
