//! # Built-in subscribers
//!
//! - [`LogWriter`]: renders every bus event through `tracing`.

mod log;

pub use log::LogWriter;
