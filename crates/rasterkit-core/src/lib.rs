//! Generic-arity pixel algebra, the BCn block codec, and the DDS/SFI container formats.
//!
//! This crate is the core engine a script-driven image tool is built on top of: it owns
//! the in-memory raster representation and every codec that turns it into bytes. The
//! script host, the font rasteriser, the legacy voxel renderer, and the generic
//! third-party-backed image loader live above this crate and are not its concern.

pub mod algebra;
pub mod bcn;
pub mod colour;
pub mod convolution;
pub mod dds;
pub mod error;
pub mod geometry;
pub mod sfi;
pub mod swizzle;

mod image;

pub use colour::{Colour, Sample};
pub use error::{Error, Result};
pub use image::{Image2D, ImageRef};
