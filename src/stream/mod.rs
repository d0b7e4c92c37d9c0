//! The IVE binary stream.
//!
//! [`DataOutputStream`] and [`DataInputStream`] carry the envelope and the
//! primitive encodings. The per-category modules add `write_*`/`read_*`
//! methods on both for every object type the format knows.

mod compression;
mod drawable;
mod identity;
mod image;
mod input;
mod node;
mod object;
mod options;
mod output;
pub mod packed;
mod shape;
mod state;
pub mod tags;
mod terrain;
pub mod version;
mod volume;

pub use image::ImageMode;
pub use input::DataInputStream;
pub use options::{Endian, ReadOptions, WriteOptions, DEFAULT_COMPRESSION_LEVEL, MAX_EXTERNAL_DEPTH};
pub use output::DataOutputStream;

use crate::util::{Error, Result};

/// Turn a failed enum conversion into a structure error naming the field.
pub(crate) fn decode_enum<T>(value: Option<T>, what: &str, raw: i32) -> Result<T> {
    value.ok_or_else(|| Error::invalid(format!("invalid {what} {raw}")))
}
