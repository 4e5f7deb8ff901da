//! Memory images fed into classification.

mod image;

pub use image::Image;
pub use image::{ADDRESS_SPACE, SNA_48K_SIZE};
