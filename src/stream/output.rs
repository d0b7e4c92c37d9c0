//! IVE output stream.
//!
//! Writes the envelope on creation, then primitives in the stream's byte
//! order. With compression on, everything after the envelope is staged in
//! memory and deflated by [`DataOutputStream::finish`].

use std::io::{self, Write};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use tracing::debug;

use super::compression;
use super::identity::WriteTable;
use super::image::ImageMode;
use super::options::{Endian, WriteOptions};
use super::packed::{self, PackedFloats};
use super::version::{self, ENDIAN_TYPE, VERSION, VERSION_0001, VERSION_0033};
use crate::scene::{
    Array, Drawable, Image, Layer, Locator, Node, Shader, Shape, ShapeAttributeList, StateAttribute,
    StateSet, Uniform, VolumeLayer, VolumeLocator, VolumeProperty,
};
use crate::util::{
    BoundingBox, BoundingSphere, DMat4, DQuat, DVec2, DVec3, DVec4, Error, Mat4, Plane, Result, Vec2,
    Vec3, Vec4,
};

#[derive(Debug)]
enum Sink<W> {
    Direct(W),
    Staged { target: W, buf: Vec<u8> },
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self {
            Self::Direct(w) => w.write(data),
            Self::Staged { buf, .. } => {
                buf.extend_from_slice(data);
                Ok(data.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Direct(w) => w.flush(),
            Self::Staged { .. } => Ok(()),
        }
    }
}

macro_rules! put {
    ($self:ident, $method:ident, $value:expr, $size:expr) => {{
        match $self.order {
            Endian::Little => $self.out.$method::<LittleEndian>($value)?,
            Endian::Big => $self.out.$method::<BigEndian>($value)?,
        }
        $self.pos += $size;
        Ok(())
    }};
}

/// Identity tables of one output stream.
#[derive(Debug, Default)]
pub(crate) struct WriteTables {
    pub state_sets: WriteTable<StateSet>,
    pub state_attributes: WriteTable<StateAttribute>,
    pub uniforms: WriteTable<Uniform>,
    pub shaders: WriteTable<Shader>,
    pub drawables: WriteTable<Drawable>,
    pub shapes: WriteTable<Shape>,
    pub nodes: WriteTable<Node>,
    pub images: WriteTable<Image>,
    pub layers: WriteTable<Layer>,
    pub locators: WriteTable<Locator>,
    pub volume_layers: WriteTable<VolumeLayer>,
    pub volume_locators: WriteTable<VolumeLocator>,
    pub volume_properties: WriteTable<VolumeProperty>,
    pub shape_attributes: WriteTable<ShapeAttributeList>,
}

/// Output stream for one IVE file.
#[derive(Debug)]
pub struct DataOutputStream<W: Write> {
    out: Sink<W>,
    pos: u64,
    order: Endian,
    version: u32,
    pub(crate) options: WriteOptions,
    pub(crate) tables: WriteTables,
}

impl<W: Write> DataOutputStream<W> {
    /// Create the stream and write the envelope.
    pub fn new(mut writer: W, options: WriteOptions) -> Result<Self> {
        let version = options.version;
        if !(VERSION_0001..=VERSION).contains(&version) {
            return Err(Error::UnsupportedVersion { found: version, supported: VERSION });
        }
        if options.is_compressed() && !version::has_feature(version, VERSION_0033) {
            return Err(Error::UnsupportedInVersion {
                feature: "compression",
                required: VERSION_0033,
                version,
            });
        }

        let order = options.byte_order;
        match order {
            Endian::Little => {
                writer.write_u32::<LittleEndian>(ENDIAN_TYPE)?;
                writer.write_u32::<LittleEndian>(version)?;
            }
            Endian::Big => {
                writer.write_u32::<BigEndian>(ENDIAN_TYPE)?;
                writer.write_u32::<BigEndian>(version)?;
            }
        }
        let mut pos = 8;
        if version::has_feature(version, VERSION_0033) {
            let level = options.compression_level;
            match order {
                Endian::Little => writer.write_i32::<LittleEndian>(level)?,
                Endian::Big => writer.write_i32::<BigEndian>(level)?,
            }
            pos += 4;
        }

        debug!(
            version,
            ?order,
            compression = options.compression_level,
            "writing IVE stream"
        );

        let out = if options.is_compressed() {
            Sink::Staged { target: writer, buf: Vec::new() }
        } else {
            Sink::Direct(writer)
        };

        Ok(Self {
            out,
            pos,
            order,
            version,
            options,
            tables: WriteTables::default(),
        })
    }

    /// Flush the payload, compressing it if requested, and return the writer.
    pub fn finish(self) -> Result<W> {
        match self.out {
            Sink::Direct(mut w) => {
                w.flush()?;
                Ok(w)
            }
            Sink::Staged { mut target, buf } => {
                let len = u32::try_from(buf.len())
                    .map_err(|_| Error::Compression("payload exceeds 4 GiB".into()))?;
                let packed = compression::compress(&buf, self.options.compression_level)?;
                debug!(raw = buf.len(), compressed = packed.len(), "compressed IVE payload");
                match self.order {
                    Endian::Little => target.write_u32::<LittleEndian>(len)?,
                    Endian::Big => target.write_u32::<BigEndian>(len)?,
                }
                target.write_all(&packed)?;
                target.flush()?;
                Ok(target)
            }
        }
    }

    /// Format version being written.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Bytes written so far, counting the envelope but not compression.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Image mode chosen for the stream.
    pub fn image_mode(&self) -> ImageMode {
        self.options.image_mode
    }

    /// True if the target version has a feature introduced in `since`.
    #[inline]
    pub fn has(&self, since: u32) -> bool {
        version::has_feature(self.version, since)
    }

    /// Fail unless the target version has the feature.
    pub fn require(&self, feature: &'static str, since: u32) -> Result<()> {
        if self.has(since) {
            Ok(())
        } else {
            Err(Error::UnsupportedInVersion { feature, required: since, version: self.version })
        }
    }

    // ---- scalars ----

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_uchar(v as u8)
    }

    pub fn write_char(&mut self, v: i8) -> Result<()> {
        self.out.write_i8(v)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_uchar(&mut self, v: u8) -> Result<()> {
        self.out.write_u8(v)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_short(&mut self, v: i16) -> Result<()> {
        put!(self, write_i16, v, 2)
    }

    pub fn write_ushort(&mut self, v: u16) -> Result<()> {
        put!(self, write_u16, v, 2)
    }

    pub fn write_int(&mut self, v: i32) -> Result<()> {
        put!(self, write_i32, v, 4)
    }

    pub fn write_uint(&mut self, v: u32) -> Result<()> {
        put!(self, write_u32, v, 4)
    }

    pub fn write_long(&mut self, v: i64) -> Result<()> {
        put!(self, write_i64, v, 8)
    }

    pub fn write_float(&mut self, v: f32) -> Result<()> {
        put!(self, write_f32, v, 4)
    }

    pub fn write_double(&mut self, v: f64) -> Result<()> {
        put!(self, write_f64, v, 8)
    }

    /// Write an element count.
    pub fn write_count(&mut self, n: usize) -> Result<()> {
        let n = i32::try_from(n).map_err(|_| Error::invalid(format!("count {n} exceeds i32")))?;
        self.write_int(n)
    }

    /// Write raw bytes with no length prefix.
    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.out.write_all(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    /// Write a `u32` length followed by the bytes.
    pub fn write_byte_block(&mut self, data: &[u8]) -> Result<()> {
        let len = u32::try_from(data.len())
            .map_err(|_| Error::invalid(format!("block of {} bytes exceeds u32", data.len())))?;
        self.write_uint(len)?;
        self.write_raw(data)
    }

    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_count(s.len())?;
        self.write_raw(s.as_bytes())
    }

    pub fn write_string_array(&mut self, items: &[String]) -> Result<()> {
        self.write_count(items.len())?;
        for s in items {
            self.write_string(s)?;
        }
        Ok(())
    }

    // ---- vectors and matrices ----

    pub fn write_vec2(&mut self, v: Vec2) -> Result<()> {
        self.write_float(v.x)?;
        self.write_float(v.y)
    }

    pub fn write_vec3(&mut self, v: Vec3) -> Result<()> {
        self.write_float(v.x)?;
        self.write_float(v.y)?;
        self.write_float(v.z)
    }

    pub fn write_vec4(&mut self, v: Vec4) -> Result<()> {
        for c in v.to_array() {
            self.write_float(c)?;
        }
        Ok(())
    }

    pub fn write_dvec2(&mut self, v: DVec2) -> Result<()> {
        self.write_double(v.x)?;
        self.write_double(v.y)
    }

    pub fn write_dvec3(&mut self, v: DVec3) -> Result<()> {
        self.write_double(v.x)?;
        self.write_double(v.y)?;
        self.write_double(v.z)
    }

    pub fn write_dvec4(&mut self, v: DVec4) -> Result<()> {
        for c in v.to_array() {
            self.write_double(c)?;
        }
        Ok(())
    }

    pub fn write_ubvec4(&mut self, v: [u8; 4]) -> Result<()> {
        self.write_raw(&v)
    }

    /// Quaternion as four doubles x, y, z, w.
    pub fn write_quat(&mut self, q: DQuat) -> Result<()> {
        for c in q.to_array() {
            self.write_double(c)?;
        }
        Ok(())
    }

    pub fn write_plane(&mut self, p: &Plane) -> Result<()> {
        self.write_dvec4(p.0)
    }

    pub fn write_bounding_sphere(&mut self, s: &BoundingSphere) -> Result<()> {
        self.write_dvec3(s.center)?;
        self.write_double(s.radius)
    }

    pub fn write_bounding_box(&mut self, b: &BoundingBox) -> Result<()> {
        self.write_dvec3(b.min)?;
        self.write_dvec3(b.max)
    }

    /// Column-major 4x4 float matrix.
    pub fn write_matrixf(&mut self, m: &Mat4) -> Result<()> {
        for c in m.to_cols_array() {
            self.write_float(c)?;
        }
        Ok(())
    }

    /// Column-major 4x4 double matrix.
    pub fn write_matrixd(&mut self, m: &DMat4) -> Result<()> {
        for c in m.to_cols_array() {
            self.write_double(c)?;
        }
        Ok(())
    }

    // ---- arrays ----

    fn write_seq<T: Copy>(&mut self, items: &[T], mut f: impl FnMut(&mut Self, T) -> Result<()>) -> Result<()> {
        self.write_count(items.len())?;
        for &item in items {
            f(self, item)?;
        }
        Ok(())
    }

    pub fn write_int_array(&mut self, a: &[i32]) -> Result<()> {
        self.write_seq(a, Self::write_int)
    }

    pub fn write_uint_array(&mut self, a: &[u32]) -> Result<()> {
        self.write_seq(a, Self::write_uint)
    }

    pub fn write_short_array(&mut self, a: &[i16]) -> Result<()> {
        self.write_seq(a, Self::write_short)
    }

    pub fn write_ushort_array(&mut self, a: &[u16]) -> Result<()> {
        self.write_seq(a, Self::write_ushort)
    }

    pub fn write_ubyte_array(&mut self, a: &[u8]) -> Result<()> {
        self.write_count(a.len())?;
        self.write_raw(a)
    }

    pub fn write_float_array(&mut self, a: &[f32]) -> Result<()> {
        self.write_seq(a, Self::write_float)
    }

    pub fn write_double_array(&mut self, a: &[f64]) -> Result<()> {
        self.write_seq(a, Self::write_double)
    }

    pub fn write_vec2_array(&mut self, a: &[Vec2]) -> Result<()> {
        self.write_seq(a, Self::write_vec2)
    }

    pub fn write_vec3_array(&mut self, a: &[Vec3]) -> Result<()> {
        self.write_seq(a, Self::write_vec3)
    }

    pub fn write_vec4_array(&mut self, a: &[Vec4]) -> Result<()> {
        self.write_seq(a, Self::write_vec4)
    }

    pub fn write_dvec2_array(&mut self, a: &[DVec2]) -> Result<()> {
        self.write_seq(a, Self::write_dvec2)
    }

    pub fn write_dvec3_array(&mut self, a: &[DVec3]) -> Result<()> {
        self.write_seq(a, Self::write_dvec3)
    }

    pub fn write_dvec4_array(&mut self, a: &[DVec4]) -> Result<()> {
        self.write_seq(a, Self::write_dvec4)
    }

    pub fn write_ubvec4_array(&mut self, a: &[[u8; 4]]) -> Result<()> {
        self.write_count(a.len())?;
        self.write_raw(bytemuck::cast_slice(a))
    }

    /// Tagged geometry array: type marker, then the counted elements.
    pub fn write_array(&mut self, a: &Array) -> Result<()> {
        self.write_uchar(a.type_marker())?;
        match a {
            Array::Int(v) => self.write_int_array(v),
            Array::UByte(v) => self.write_ubyte_array(v),
            Array::UShort(v) => self.write_ushort_array(v),
            Array::UInt(v) => self.write_uint_array(v),
            Array::Vec4ub(v) => self.write_ubvec4_array(v),
            Array::Float(v) => self.write_float_array(v),
            Array::Vec2(v) => self.write_vec2_array(v),
            Array::Vec3(v) => self.write_vec3_array(v),
            Array::Vec4(v) => self.write_vec4_array(v),
            Array::Short(v) => self.write_short_array(v),
            Array::Double(v) => self.write_double_array(v),
            Array::Vec2d(v) => self.write_dvec2_array(v),
            Array::Vec3d(v) => self.write_dvec3_array(v),
            Array::Vec4d(v) => self.write_dvec4_array(v),
        }
    }

    /// Packed float array; see [`packed::pack`] for the width selection.
    pub fn write_packed_float_array(&mut self, values: &[f32], max_error: f32) -> Result<()> {
        self.require("packed float arrays", version::VERSION_0035)?;
        if values.len() > packed::MAX_COUNT {
            return Err(Error::invalid(format!(
                "packed float array of {} values exceeds {}",
                values.len(),
                packed::MAX_COUNT
            )));
        }
        self.write_count(values.len())?;
        if values.is_empty() {
            return Ok(());
        }
        match packed::pack(values, max_error) {
            PackedFloats::AllSame(v) => {
                self.write_bool(true)?;
                self.write_float(v)
            }
            PackedFloats::U8 { min, max, samples } => {
                self.write_bool(false)?;
                self.write_int(packed::PACK_U8)?;
                self.write_float(min)?;
                self.write_float(max)?;
                self.write_raw(&samples)
            }
            PackedFloats::U16 { min, max, samples } => {
                self.write_bool(false)?;
                self.write_int(packed::PACK_U16)?;
                self.write_float(min)?;
                self.write_float(max)?;
                for s in samples {
                    self.write_ushort(s)?;
                }
                Ok(())
            }
            PackedFloats::Full(v) => {
                self.write_bool(false)?;
                self.write_int(packed::PACK_FULL)?;
                for f in v {
                    self.write_float(f)?;
                }
                Ok(())
            }
        }
    }
}
