//! Image storage policy.
//!
//! An image is stored one of four ways, chosen per image from its write hint
//! and the stream options. Any mode that cannot be honoured falls back to
//! storing the pixel data itself, so an image is never silently lost.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::tags;
use super::version::{VERSION_0012, VERSION_0045};
use super::{decode_enum, DataInputStream, DataOutputStream};
use crate::codec;
use crate::scene::{Image, ImageRef, WriteHint};
use crate::util::Result;

/// How image data is stored in the stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ImageMode {
    /// Only the file name; the reader loads the file.
    ReferenceFile = 0,
    /// Raw pixel data and layout.
    #[default]
    IncludeData = 1,
    /// The bytes of the source image file.
    IncludeFile = 2,
    /// Pixels re-encoded with an image codec.
    CompressData = 3,
}

impl ImageMode {
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::ReferenceFile),
            1 => Some(Self::IncludeData),
            2 => Some(Self::IncludeFile),
            3 => Some(Self::CompressData),
            _ => None,
        }
    }
}

/// What will actually be written for one image.
enum ImagePlan {
    Reference,
    Data,
    File(Vec<u8>),
    Compressed { ext: String, bytes: Vec<u8> },
}

impl ImagePlan {
    fn mode(&self) -> ImageMode {
        match self {
            Self::Reference => ImageMode::ReferenceFile,
            Self::Data => ImageMode::IncludeData,
            Self::File(_) => ImageMode::IncludeFile,
            Self::Compressed { .. } => ImageMode::CompressData,
        }
    }
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

impl<W: Write> DataOutputStream<W> {
    /// Write an image reference; from version 45 images are shared by identity.
    pub fn write_image(&mut self, image: &ImageRef) -> Result<()> {
        if self.has(VERSION_0045) {
            let (id, is_new) = self.tables.images.get_or_assign(image);
            self.write_int(id)?;
            if !is_new {
                return Ok(());
            }
        }
        self.write_image_body(image)
    }

    fn requested_image_mode(&self, image: &Image) -> ImageMode {
        match image.write_hint {
            WriteHint::StoreInline => ImageMode::IncludeData,
            WriteHint::ExternalFile => ImageMode::ReferenceFile,
            WriteHint::NoPreference => self.image_mode(),
        }
    }

    fn plan_image(&self, image: &Image) -> ImagePlan {
        match self.requested_image_mode(image) {
            ImageMode::ReferenceFile if image.file_name.is_empty() => {
                debug!("image has no file name, storing its data");
                ImagePlan::Data
            }
            ImageMode::ReferenceFile => ImagePlan::Reference,
            ImageMode::IncludeData => ImagePlan::Data,
            ImageMode::IncludeFile => {
                let found = if image.file_name.is_empty() {
                    None
                } else {
                    self.options.file_path_list().find(&image.file_name)
                };
                match found.map(|path| fs::read(&path).map_err(|e| (path, e))) {
                    Some(Ok(bytes)) => match codec::decode(&bytes, &extension_of(&image.file_name)) {
                        Ok(_) => ImagePlan::File(bytes),
                        Err(e) => {
                            warn!(file = %image.file_name, error = %e, "cannot decode image file, storing its data");
                            ImagePlan::Data
                        }
                    },
                    Some(Err((path, e))) => {
                        warn!(path = %path.display(), error = %e, "cannot read image file, storing its data");
                        ImagePlan::Data
                    }
                    None => {
                        warn!(file = %image.file_name, "image file not found, storing its data");
                        ImagePlan::Data
                    }
                }
            }
            ImageMode::CompressData => {
                let ext = if image.is_translucent() {
                    self.options.translucent_image_extension.clone()
                } else {
                    self.options.opaque_image_extension.clone()
                };
                match codec::encode(image, &ext) {
                    Ok(bytes) => ImagePlan::Compressed { ext, bytes },
                    Err(e) => {
                        warn!(file = %image.file_name, ext = %ext, error = %e, "cannot compress image, storing its data");
                        ImagePlan::Data
                    }
                }
            }
        }
    }

    fn write_image_body(&mut self, image: &Image) -> Result<()> {
        let plan = self.plan_image(image);
        if !self.has(VERSION_0012) {
            return match plan {
                ImagePlan::Reference => {
                    self.write_bool(false)?;
                    self.write_string(&image.file_name)?;
                    self.output_texture_file(image);
                    Ok(())
                }
                _ => {
                    self.write_bool(true)?;
                    self.write_image_data(image)
                }
            };
        }

        self.write_uchar(plan.mode() as u8)?;
        match plan {
            ImagePlan::Reference => {
                self.write_string(&image.file_name)?;
                self.output_texture_file(image);
                Ok(())
            }
            ImagePlan::Data => self.write_image_data(image),
            ImagePlan::File(bytes) => {
                self.write_string(&image.file_name)?;
                self.write_byte_block(&bytes)
            }
            ImagePlan::Compressed { ext, bytes } => {
                self.write_string(&image.file_name)?;
                self.write_string(&ext)?;
                self.write_byte_block(&bytes)
            }
        }
    }

    /// Write a referenced image next to the output when asked to and it is missing.
    fn output_texture_file(&self, image: &Image) {
        if !self.options.output_texture_files || image.is_empty() {
            return;
        }
        let name = Path::new(&image.file_name);
        let dest: PathBuf = if name.is_absolute() {
            name.to_path_buf()
        } else {
            match self.options.database_paths.first() {
                Some(dir) => dir.join(name),
                None => name.to_path_buf(),
            }
        };
        if dest.exists() {
            return;
        }
        match codec::write_image_file(image, &dest) {
            Ok(()) => debug!(path = %dest.display(), "wrote texture file"),
            Err(e) => warn!(path = %dest.display(), error = %e, "cannot write texture file"),
        }
    }

    fn write_image_data(&mut self, image: &Image) -> Result<()> {
        self.write_int(tags::IMAGE)?;
        self.write_object_level(&image.object)?;
        self.write_string(&image.file_name)?;
        self.write_int(image.write_hint as i32)?;
        self.write_int(image.s)?;
        self.write_int(image.t)?;
        self.write_int(image.r)?;
        self.write_int(image.internal_texture_format)?;
        self.write_uint(image.pixel_format)?;
        self.write_uint(image.data_type)?;
        self.write_uint(image.packing)?;
        self.write_byte_block(&image.data)?;
        self.write_uint_array(&image.mipmap_offsets)
    }
}

impl<R: Read> DataInputStream<R> {
    pub fn read_image(&mut self) -> Result<ImageRef> {
        if !self.has(VERSION_0045) {
            return self.read_image_body();
        }
        let id = self.read_int()?;
        if let Some(image) = self.tables.images.get(id) {
            return Ok(image);
        }
        self.tables.images.claim(id)?;
        let image = self.read_image_body()?;
        self.tables.images.insert(id, image.clone());
        Ok(image)
    }

    fn read_image_body(&mut self) -> Result<ImageRef> {
        let mode = if self.has(VERSION_0012) {
            let raw = self.read_uchar()?;
            decode_enum(ImageMode::from_u8(raw), "image mode", raw as i32)?
        } else if self.read_bool()? {
            ImageMode::IncludeData
        } else {
            ImageMode::ReferenceFile
        };

        match mode {
            ImageMode::ReferenceFile => {
                let name = self.read_string()?;
                Ok(self.load_image_file(&name))
            }
            ImageMode::IncludeData => Ok(Arc::new(self.read_image_data()?)),
            ImageMode::IncludeFile => {
                let name = self.read_string()?;
                let bytes = self.read_byte_block()?;
                let mut image = codec::decode(&bytes, &extension_of(&name))?;
                image.file_name = name;
                Ok(Arc::new(image))
            }
            ImageMode::CompressData => {
                let name = self.read_string()?;
                let ext = self.read_string()?;
                let bytes = self.read_byte_block()?;
                let mut image = codec::decode(&bytes, &ext)?;
                image.file_name = name;
                Ok(Arc::new(image))
            }
        }
    }

    /// Resolve a referenced image. A missing or unreadable file yields an
    /// empty image that keeps the name.
    fn load_image_file(&mut self, name: &str) -> ImageRef {
        if let Some(image) = self.image_cache.get(name) {
            return image.clone();
        }
        let image = match self.options.file_path_list().find(name) {
            Some(path) => match codec::read_image_file(&path) {
                Ok(mut image) => {
                    image.file_name = name.to_string();
                    image
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot decode referenced image");
                    Image::empty(name)
                }
            },
            None => {
                warn!(file = %name, "referenced image not found");
                Image::empty(name)
            }
        };
        let image = Arc::new(image);
        self.image_cache.insert(name.to_string(), image.clone());
        image
    }

    fn read_image_data(&mut self) -> Result<Image> {
        self.expect_tag(tags::IMAGE, "Image")?;
        let object = self.read_object_level()?;
        let file_name = self.read_string()?;
        let raw = self.read_int()?;
        Ok(Image {
            object,
            file_name,
            write_hint: decode_enum(WriteHint::from_i32(raw), "image write hint", raw)?,
            s: self.read_int()?,
            t: self.read_int()?,
            r: self.read_int()?,
            internal_texture_format: self.read_int()?,
            pixel_format: self.read_uint()?,
            data_type: self.read_uint()?,
            packing: self.read_uint()?,
            data: self.read_byte_block()?,
            mipmap_offsets: self.read_uint_array()?,
        })
    }
}
