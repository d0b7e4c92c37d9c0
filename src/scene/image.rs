//! Image data carried by textures and terrain layers.

use super::gl;
use super::ObjectData;

/// Per-image preference for how it is stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum WriteHint {
    /// Follow the stream's image mode.
    #[default]
    NoPreference = 0,
    StoreInline = 1,
    ExternalFile = 2,
}

impl WriteHint {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::NoPreference),
            1 => Some(Self::StoreInline),
            2 => Some(Self::ExternalFile),
            _ => None,
        }
    }
}

/// Pixel block plus its description.
///
/// `data` holds rows bottom-up, as OpenGL uploads them.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub object: ObjectData,
    pub file_name: String,
    pub write_hint: WriteHint,
    pub s: i32,
    pub t: i32,
    pub r: i32,
    pub internal_texture_format: i32,
    pub pixel_format: u32,
    pub data_type: u32,
    pub packing: u32,
    pub data: Vec<u8>,
    /// Byte offsets of mipmap levels after the first.
    pub mipmap_offsets: Vec<u32>,
}

impl Default for Image {
    fn default() -> Self {
        Self {
            object: ObjectData::default(),
            file_name: String::new(),
            write_hint: WriteHint::NoPreference,
            s: 0,
            t: 0,
            r: 0,
            internal_texture_format: 0,
            pixel_format: 0,
            data_type: 0,
            packing: 1,
            data: Vec::new(),
            mipmap_offsets: Vec::new(),
        }
    }
}

impl Image {
    /// An image without pixels that remembers where it came from.
    pub fn empty(file_name: impl Into<String>) -> Self {
        Self { file_name: file_name.into(), ..Self::default() }
    }

    /// 8-bit image of `pixel_format` with tightly packed pixel rows.
    pub fn from_u8(s: i32, t: i32, pixel_format: u32, data: Vec<u8>) -> Self {
        Self {
            s,
            t,
            r: 1,
            internal_texture_format: pixel_format as i32,
            pixel_format,
            data_type: gl::GL_UNSIGNED_BYTE,
            data,
            ..Self::default()
        }
    }

    /// True if the image holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Components per pixel for the supported pixel formats.
    pub fn components(&self) -> Option<usize> {
        match self.pixel_format {
            gl::GL_ALPHA | gl::GL_LUMINANCE => Some(1),
            gl::GL_LUMINANCE_ALPHA => Some(2),
            gl::GL_RGB => Some(3),
            gl::GL_RGBA => Some(4),
            _ => None,
        }
    }

    /// True if the pixel format carries alpha and some pixel is not opaque.
    pub fn is_translucent(&self) -> bool {
        if self.data_type != gl::GL_UNSIGNED_BYTE {
            return matches!(self.pixel_format, gl::GL_ALPHA | gl::GL_LUMINANCE_ALPHA | gl::GL_RGBA);
        }
        let (stride, offset) = match self.pixel_format {
            gl::GL_ALPHA => (1, 0),
            gl::GL_LUMINANCE_ALPHA => (2, 1),
            gl::GL_RGBA => (4, 3),
            _ => return false,
        };
        self.data.iter().skip(offset).step_by(stride).any(|&a| a != 255)
    }

    /// Bytes in one row of the first level.
    pub fn row_size(&self) -> usize {
        self.components().unwrap_or(0) * self.s.max(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_keeps_name() {
        let img = Image::empty("missing.png");
        assert!(img.is_empty());
        assert_eq!(img.file_name, "missing.png");
    }

    #[test]
    fn test_translucency() {
        let opaque = Image::from_u8(2, 1, gl::GL_RGBA, vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert!(!opaque.is_translucent());
        let clear = Image::from_u8(2, 1, gl::GL_RGBA, vec![1, 2, 3, 255, 4, 5, 6, 10]);
        assert!(clear.is_translucent());
        let rgb = Image::from_u8(1, 1, gl::GL_RGB, vec![0, 0, 0]);
        assert!(!rgb.is_translucent());
        assert_eq!(rgb.row_size(), 3);
    }
}
