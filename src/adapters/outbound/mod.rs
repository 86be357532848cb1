pub mod buffered_logger;
pub mod console_logger;
pub mod file_logger;
pub mod http_transport;
pub mod multi_logger;
pub mod noop_logger;
pub mod status_sink;
pub mod tracing_logger;

pub use buffered_logger::*;
pub use console_logger::*;
pub use file_logger::*;
pub use http_transport::*;
pub use multi_logger::*;
pub use noop_logger::*;
pub use status_sink::*;
pub use tracing_logger::*;
