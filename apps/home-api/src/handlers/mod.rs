//! HTTP handlers。

mod audit;
mod commands;
mod devices;
mod metrics;

pub use audit::*;
pub use commands::*;
pub use devices::*;
pub use metrics::*;
