//! Classification configuration

mod config;

pub use config::{parse_class, Config, DEFAULT_TEXT_CHARS};
