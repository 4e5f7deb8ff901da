//! CLI commands

mod common;
mod main;

pub use common::{address_arg, load_image, parse_address, resolve_range};
pub use main::{configure_app, main};
