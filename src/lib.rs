//! # IVE
//!
//! Reader and writer for the IVE binary scene-graph format.
//!
//! An IVE file is a versioned, optionally compressed stream holding one
//! scene graph: nodes, render state, drawables, shapes, images, terrain and
//! volume data. Objects referenced from several places are written once and
//! shared again on read, so a graph read back has the same shape it was
//! written with.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math re-exports and bounding volumes
//! - [`scene`] - The in-memory scene model
//! - [`stream`] - Binary input and output streams, one codec per object category
//! - [`codec`] - Image file encoders and decoders
//! - [`file_utils`] - Search paths for referenced files
//! - [`plugin`] - File-level reader/writer entry points
//!
//! ## Example
//!
//! ```ignore
//! use ive::prelude::*;
//!
//! let root = read_node_file("terrain.ive", &ReadOptions::default())?;
//! for child in root.children() {
//!     println!("{} [{}]", child.name(), child.kind.class_name());
//! }
//! write_node_file(&root, "terrain_z.ive", &"compressed".parse()?)?;
//! ```

pub mod codec;
pub mod file_utils;
pub mod plugin;
pub mod scene;
pub mod stream;
pub mod util;

// Re-export commonly used types
pub use plugin::{read_node_file, write_node_file, ReaderWriter, ReaderWriterIve};
pub use stream::{DataInputStream, DataOutputStream, Endian, ImageMode, ReadOptions, WriteOptions};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::plugin::{read_node_file, write_node_file, ReaderWriter, ReaderWriterIve};
    pub use crate::scene::*;
    pub use crate::stream::{Endian, ImageMode, ReadOptions, WriteOptions};
    pub use crate::util::{Error, Result};
}
