pub mod round_client;
pub mod scheduler;
pub mod view;

pub use round_client::*;
pub use scheduler::*;
pub use view::*;
