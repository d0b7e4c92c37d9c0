//! Image codecs used by the image storage modes.
//!
//! Codecs are looked up by file extension in a process-wide registry. Codecs
//! registered by the application are consulted first, newest first; the
//! built-in [`DefaultImageCodec`] handles whatever is left.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use parking_lot::RwLock;
use tracing::debug;

use crate::scene::{gl, Image};
use crate::util::{Error, Result};

/// Encoder/decoder for one or more image file formats.
pub trait ImageCodec: Send + Sync {
    /// Lowercase extensions handled, without the dot.
    fn extensions(&self) -> &[&str];

    /// Decode file bytes into an image with bottom-up rows.
    fn decode(&self, data: &[u8], ext: &str) -> Result<Image>;

    /// Encode an image into file bytes.
    fn encode(&self, image: &Image, ext: &str) -> Result<Vec<u8>>;
}

static REGISTRY: RwLock<Vec<Arc<dyn ImageCodec>>> = RwLock::new(Vec::new());

/// Register a codec; it takes precedence over earlier ones.
pub fn register_codec(codec: Arc<dyn ImageCodec>) {
    debug!(extensions = ?codec.extensions(), "registering image codec");
    REGISTRY.write().push(codec);
}

/// Codec for an extension, falling back to the built-in one.
pub fn codec_for(ext: &str) -> Arc<dyn ImageCodec> {
    let ext = ext.to_ascii_lowercase();
    let registry = REGISTRY.read();
    registry
        .iter()
        .rev()
        .find(|c| c.extensions().iter().any(|e| *e == ext))
        .cloned()
        .unwrap_or_else(|| Arc::new(DefaultImageCodec))
}

pub fn decode(data: &[u8], ext: &str) -> Result<Image> {
    codec_for(ext).decode(data, ext)
}

pub fn encode(image: &Image, ext: &str) -> Result<Vec<u8>> {
    codec_for(ext).encode(image, ext)
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Load and decode an image file, using its extension to pick the codec.
pub fn read_image_file(path: &Path) -> Result<Image> {
    let bytes = fs::read(path)?;
    let mut image = decode(&bytes, &extension(path))?;
    image.file_name = path.to_string_lossy().into_owned();
    Ok(image)
}

/// Encode an image and write it to `path`, creating parent directories.
pub fn write_image_file(image: &Image, path: &Path) -> Result<()> {
    let bytes = encode(image, &extension(path))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// Built-in codec backed by the `image` crate.
///
/// Handles 8-bit luminance, luminance-alpha, RGB and RGBA images. Rows are
/// flipped on the way in and out, since files store them top-down.
pub struct DefaultImageCodec;

impl DefaultImageCodec {
    fn format(ext: &str) -> Result<ImageFormat> {
        ImageFormat::from_extension(ext)
            .ok_or_else(|| Error::ImageCodec(format!("no codec for extension '{ext}'")))
    }
}

impl ImageCodec for DefaultImageCodec {
    fn extensions(&self) -> &[&str] {
        &["png", "jpg", "jpeg", "bmp", "tga"]
    }

    fn decode(&self, data: &[u8], ext: &str) -> Result<Image> {
        let format = Self::format(ext)?;
        let decoded = image::load_from_memory_with_format(data, format)
            .map_err(|e| Error::ImageCodec(e.to_string()))?
            .flipv();
        let (w, h) = (decoded.width() as i32, decoded.height() as i32);
        let (pixel_format, data) = match decoded {
            DynamicImage::ImageLuma8(b) => (gl::GL_LUMINANCE, b.into_raw()),
            DynamicImage::ImageLumaA8(b) => (gl::GL_LUMINANCE_ALPHA, b.into_raw()),
            DynamicImage::ImageRgb8(b) => (gl::GL_RGB, b.into_raw()),
            other if other.color().has_alpha() => (gl::GL_RGBA, other.into_rgba8().into_raw()),
            other => (gl::GL_RGB, other.into_rgb8().into_raw()),
        };
        Ok(Image::from_u8(w, h, pixel_format, data))
    }

    fn encode(&self, image: &Image, ext: &str) -> Result<Vec<u8>> {
        let format = Self::format(ext)?;
        if image.data_type != gl::GL_UNSIGNED_BYTE || image.r > 1 {
            return Err(Error::ImageCodec(format!(
                "cannot encode {}x{}x{} image of type 0x{:x}",
                image.s, image.t, image.r, image.data_type
            )));
        }
        let (w, h) = (image.s.max(0) as u32, image.t.max(0) as u32);
        let needed = image.row_size() * h as usize;
        if needed == 0 || image.data.len() < needed {
            return Err(Error::ImageCodec(format!(
                "image '{}' holds {} bytes, {} needed",
                image.file_name,
                image.data.len(),
                needed
            )));
        }
        let pixels = image.data[..needed].to_vec();
        let invalid = || Error::ImageCodec("pixel buffer does not match dimensions".into());
        let buffer = match image.pixel_format {
            gl::GL_LUMINANCE | gl::GL_ALPHA => {
                DynamicImage::ImageLuma8(image::GrayImage::from_raw(w, h, pixels).ok_or_else(invalid)?)
            }
            gl::GL_LUMINANCE_ALPHA => DynamicImage::ImageLumaA8(
                image::GrayAlphaImage::from_raw(w, h, pixels).ok_or_else(invalid)?,
            ),
            gl::GL_RGB => DynamicImage::ImageRgb8(image::RgbImage::from_raw(w, h, pixels).ok_or_else(invalid)?),
            gl::GL_RGBA => {
                DynamicImage::ImageRgba8(image::RgbaImage::from_raw(w, h, pixels).ok_or_else(invalid)?)
            }
            other => return Err(Error::ImageCodec(format!("unsupported pixel format 0x{other:x}"))),
        };
        // JPEG has no alpha channel.
        let buffer = match format {
            ImageFormat::Jpeg if buffer.color().has_alpha() => DynamicImage::ImageRgb8(buffer.to_rgb8()),
            _ => buffer,
        }
        .flipv();

        let mut out = Cursor::new(Vec::new());
        buffer
            .write_to(&mut out, format)
            .map_err(|e| Error::ImageCodec(e.to_string()))?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub;

    impl ImageCodec for Stub {
        fn extensions(&self) -> &[&str] {
            &["stub"]
        }

        fn decode(&self, data: &[u8], _ext: &str) -> Result<Image> {
            Ok(Image::from_u8(data.len() as i32, 1, gl::GL_LUMINANCE, data.to_vec()))
        }

        fn encode(&self, image: &Image, _ext: &str) -> Result<Vec<u8>> {
            Ok(image.data.clone())
        }
    }

    #[test]
    fn test_png_round_trip_keeps_row_order() {
        // Bottom row dark, top row bright.
        let img = Image::from_u8(2, 2, gl::GL_LUMINANCE, vec![0, 10, 200, 250]);
        let bytes = encode(&img, "png").unwrap();
        let back = decode(&bytes, "PNG").unwrap();
        assert_eq!(back.data, img.data);
        assert_eq!(back.pixel_format, gl::GL_LUMINANCE);

        let top_left = image::load_from_memory(&bytes).unwrap().to_luma8().get_pixel(0, 0).0[0];
        assert_eq!(top_left, 200);
    }

    #[test]
    fn test_jpeg_drops_alpha() {
        let img = Image::from_u8(8, 8, gl::GL_RGBA, vec![128; 8 * 8 * 4]);
        let back = decode(&encode(&img, "jpg").unwrap(), "jpg").unwrap();
        assert_eq!(back.pixel_format, gl::GL_RGB);
        assert_eq!((back.s, back.t), (8, 8));
    }

    #[test]
    fn test_unknown_extension_and_short_data() {
        let img = Image::from_u8(2, 2, gl::GL_RGB, vec![0; 3]);
        assert!(matches!(encode(&img, "png"), Err(Error::ImageCodec(_))));
        assert!(matches!(decode(&[0, 1, 2], "xyz"), Err(Error::ImageCodec(_))));
    }

    #[test]
    fn test_registered_codec_wins() {
        register_codec(Arc::new(Stub));
        let img = decode(&[1, 2, 3], "stub").unwrap();
        assert_eq!(img.s, 3);
        assert_eq!(encode(&img, "stub").unwrap(), vec![1, 2, 3]);
    }
}
