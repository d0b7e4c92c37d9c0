//! Reader and writer options.
//!
//! Options can be built in code or parsed from the space separated option
//! strings hosts pass to plugins, e.g. `"compressed noTexturesInIVEFile"`.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use super::image::ImageMode;
use super::version::VERSION;
use crate::file_utils::FilePathList;
use crate::util::{Error, Result};

/// Byte order of a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order of the host.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    pub const fn swapped(self) -> Self {
        match self {
            Self::Little => Self::Big,
            Self::Big => Self::Little,
        }
    }
}

impl Default for Endian {
    fn default() -> Self {
        Self::native()
    }
}

/// Default zlib level used by the `compressed` option.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 6;

/// Options controlling how a stream is written.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Format version to target; features newer than it are refused.
    pub version: u32,
    pub byte_order: Endian,
    /// zlib level for the payload, 0 for none.
    pub compression_level: i32,
    /// How images are stored unless the image asks otherwise.
    pub image_mode: ImageMode,
    /// Write ProxyNode children that come from external files inline.
    pub inline_external_references: bool,
    /// In reference mode, also write referenced images that do not exist yet.
    pub output_texture_files: bool,
    /// Height field error bound, relative to the field's extent.
    pub maximum_error_to_size_ratio: f64,
    pub opaque_image_extension: String,
    pub translucent_image_extension: String,
    /// Directories searched for source files, the first also receives texture files.
    pub database_paths: Vec<PathBuf>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: VERSION,
            byte_order: Endian::native(),
            compression_level: 0,
            image_mode: ImageMode::IncludeData,
            inline_external_references: false,
            output_texture_files: false,
            maximum_error_to_size_ratio: 0.001,
            opaque_image_extension: "jpg".into(),
            translucent_image_extension: "png".into(),
            database_paths: Vec::new(),
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_byte_order(mut self, order: Endian) -> Self {
        self.byte_order = order;
        self
    }

    /// Enable compression at the default level.
    pub fn compressed(mut self, enable: bool) -> Self {
        self.compression_level = if enable { DEFAULT_COMPRESSION_LEVEL } else { 0 };
        self
    }

    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level.clamp(0, 9);
        self
    }

    pub fn with_image_mode(mut self, mode: ImageMode) -> Self {
        self.image_mode = mode;
        self
    }

    pub fn with_inline_external_references(mut self, enable: bool) -> Self {
        self.inline_external_references = enable;
        self
    }

    pub fn with_output_texture_files(mut self, enable: bool) -> Self {
        self.output_texture_files = enable;
        self
    }

    pub fn with_maximum_error_to_size_ratio(mut self, ratio: f64) -> Self {
        self.maximum_error_to_size_ratio = ratio;
        self
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_paths.push(path.into());
        self
    }

    pub fn is_compressed(&self) -> bool {
        self.compression_level > 0
    }

    /// Search path for source files.
    pub fn file_path_list(&self) -> FilePathList {
        FilePathList::with_env(self.database_paths.clone())
    }
}

impl FromStr for WriteOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut opts = Self::default();
        for token in s.split_whitespace() {
            let (key, value) = split_option(token);
            match (key, value) {
                ("compressed", None) => opts = opts.compressed(true),
                ("compressed", Some(v)) => opts.compression_level = parse_value::<i32>(key, v)?.clamp(0, 9),
                ("noTexturesInIVEFile", None) => opts.image_mode = ImageMode::ReferenceFile,
                ("includeImageFileInIVEFile", None) => opts.image_mode = ImageMode::IncludeFile,
                ("compressImageData", None) => opts.image_mode = ImageMode::CompressData,
                ("inlineExternalReferencesInIVEFile", None) => opts.inline_external_references = true,
                ("OutputTextureFiles", None) => opts.output_texture_files = true,
                ("maximumErrorToSizeRatio", Some(v)) => {
                    opts.maximum_error_to_size_ratio = parse_value(key, v)?
                }
                ("version", Some(v)) => opts.version = parse_value(key, v)?,
                ("byteOrder", Some(v)) => {
                    opts.byte_order = match v.to_ascii_lowercase().as_str() {
                        "big" => Endian::Big,
                        "little" => Endian::Little,
                        "native" => Endian::native(),
                        _ => return Err(Error::other(format!("invalid byteOrder value '{v}'"))),
                    }
                }
                // Read-side options are accepted and ignored so one string can serve both.
                ("noLoadExternalReferenceFiles", None) => {}
                _ => warn!("ignoring unknown IVE write option '{token}'"),
            }
        }
        Ok(opts)
    }
}

/// Options controlling how a stream is read.
#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    /// Leave ProxyNode slots that name external files empty.
    pub no_load_external_reference_files: bool,
    /// Directories searched for external files, in order.
    pub database_paths: Vec<PathBuf>,
    /// Nesting depth of external loads.
    pub(crate) external_depth: u32,
}

/// Limit on nested external loads, which stops reference cycles between files.
pub const MAX_EXTERNAL_DEPTH: u32 = 32;

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_no_load_external_reference_files(mut self, enable: bool) -> Self {
        self.no_load_external_reference_files = enable;
        self
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_paths.push(path.into());
        self
    }

    /// Search path for external files.
    pub fn file_path_list(&self) -> FilePathList {
        FilePathList::with_env(self.database_paths.clone())
    }

    /// Options for loading a file referenced from the current one.
    pub(crate) fn nested(&self) -> Self {
        Self { external_depth: self.external_depth + 1, ..self.clone() }
    }
}

impl FromStr for ReadOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut opts = Self::default();
        for token in s.split_whitespace() {
            match split_option(token) {
                ("noLoadExternalReferenceFiles", None) => opts.no_load_external_reference_files = true,
                ("databasePath", Some(v)) => opts.database_paths.push(PathBuf::from(v)),
                _ => {}
            }
        }
        Ok(opts)
    }
}

fn split_option(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((k, v)) => (k, Some(v)),
        None => (token, None),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::other(format!("invalid value '{value}' for option {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_write_options() {
        let opts: WriteOptions = "compressed noTexturesInIVEFile version=30 byteOrder=big"
            .parse()
            .unwrap();
        assert!(opts.is_compressed());
        assert_eq!(opts.image_mode, ImageMode::ReferenceFile);
        assert_eq!(opts.version, 30);
        assert_eq!(opts.byte_order, Endian::Big);
    }

    #[test]
    fn test_parse_defaults_and_errors() {
        let opts: WriteOptions = "".parse().unwrap();
        assert!(!opts.is_compressed());
        assert_eq!(opts.image_mode, ImageMode::IncludeData);
        assert_eq!(opts.version, VERSION);

        assert!("version=abc".parse::<WriteOptions>().is_err());
        assert!("byteOrder=middle".parse::<WriteOptions>().is_err());
        // Unknown keys are only warned about.
        assert!("frobnicate".parse::<WriteOptions>().is_ok());
    }

    #[test]
    fn test_parse_read_options() {
        let opts: ReadOptions = "noLoadExternalReferenceFiles compressed".parse().unwrap();
        assert!(opts.no_load_external_reference_files);
        assert_eq!(opts.nested().external_depth, 1);
    }

    #[test]
    fn test_endian_swap() {
        assert_eq!(Endian::Little.swapped(), Endian::Big);
        assert_eq!(Endian::native().swapped().swapped(), Endian::native());
    }
}
