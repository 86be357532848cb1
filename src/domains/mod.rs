pub mod grid;
pub mod intersection;
pub mod logger;

pub use grid::*;
pub use intersection::*;
pub use logger::*;
