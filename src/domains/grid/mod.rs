//! Spatial quantization: positions to cells, watchers to visible cell sets.

pub mod quantize;
pub mod types;
pub mod visibility;

pub use quantize::*;
pub use types::*;
pub use visibility::*;
