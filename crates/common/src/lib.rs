pub mod config;
pub mod entities;
pub mod error;

mod log;

pub use config::{Config, LogConfig};
pub use log::logging_stdout;
