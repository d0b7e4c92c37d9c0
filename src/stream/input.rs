//! IVE input stream.
//!
//! Reads the envelope on creation and picks the byte order from the endian
//! marker. A compressed payload is inflated up front and served from memory.

use std::collections::HashMap;
use std::io::{self, Cursor, Read};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tracing::debug;

use super::compression;
use super::identity::ReadTable;
use super::options::{Endian, ReadOptions};
use super::packed;
use super::version::{self, ENDIAN_TYPE, OPPOSITE_ENDIAN_TYPE, VERSION, VERSION_0033};
use crate::scene::{
    Array, Drawable, Image, ImageRef, Layer, Locator, Node, Shader, Shape, ShapeAttributeList,
    StateAttribute, StateSet, Uniform, VolumeLayer, VolumeLocator, VolumeProperty,
};
use crate::util::{
    BoundingBox, BoundingSphere, DMat4, DQuat, DVec2, DVec3, DVec4, Error, Mat4, Plane, Result, Vec2,
    Vec3, Vec4,
};

enum Source<R> {
    Direct(R),
    Memory(Cursor<Vec<u8>>),
}

impl<R: Read> Read for Source<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Direct(r) => r.read(buf),
            Self::Memory(c) => c.read(buf),
        }
    }
}

macro_rules! get {
    ($self:ident, $n:literal, $method:ident) => {{
        let b: [u8; $n] = $self.take()?;
        Ok(match $self.order {
            Endian::Little => LittleEndian::$method(&b),
            Endian::Big => BigEndian::$method(&b),
        })
    }};
}

/// Identity tables of one input stream.
pub(crate) struct ReadTables {
    pub state_sets: ReadTable<StateSet>,
    pub state_attributes: ReadTable<StateAttribute>,
    pub uniforms: ReadTable<Uniform>,
    pub shaders: ReadTable<Shader>,
    pub drawables: ReadTable<Drawable>,
    pub shapes: ReadTable<Shape>,
    pub nodes: ReadTable<Node>,
    pub images: ReadTable<Image>,
    pub layers: ReadTable<Layer>,
    pub locators: ReadTable<Locator>,
    pub volume_layers: ReadTable<VolumeLayer>,
    pub volume_locators: ReadTable<VolumeLocator>,
    pub volume_properties: ReadTable<VolumeProperty>,
    pub shape_attributes: ReadTable<ShapeAttributeList>,
}

impl Default for ReadTables {
    fn default() -> Self {
        Self {
            state_sets: ReadTable::new("StateSet"),
            state_attributes: ReadTable::new("StateAttribute"),
            uniforms: ReadTable::new("Uniform"),
            shaders: ReadTable::new("Shader"),
            drawables: ReadTable::new("Drawable"),
            shapes: ReadTable::new("Shape"),
            nodes: ReadTable::new("Node"),
            images: ReadTable::new("Image"),
            layers: ReadTable::new("Layer"),
            locators: ReadTable::new("Locator"),
            volume_layers: ReadTable::new("VolumeLayer"),
            volume_locators: ReadTable::new("VolumeLocator"),
            volume_properties: ReadTable::new("VolumeProperty"),
            shape_attributes: ReadTable::new("ShapeAttributeList"),
        }
    }
}

/// Input stream over one IVE file.
pub struct DataInputStream<R: Read> {
    src: Source<R>,
    pos: u64,
    order: Endian,
    version: u32,
    compression_level: i32,
    /// Bytes handed back by a peek, consumed before `src`.
    pushback: Vec<u8>,
    pub(crate) options: ReadOptions,
    pub(crate) tables: ReadTables,
    /// Images loaded by file name.
    pub(crate) image_cache: HashMap<String, ImageRef>,
}

impl<R: Read> DataInputStream<R> {
    /// Open a stream and read its envelope.
    pub fn new(reader: R, options: ReadOptions) -> Result<Self> {
        let mut stream = Self {
            src: Source::Direct(reader),
            pos: 0,
            order: Endian::native(),
            version: 0,
            compression_level: 0,
            pushback: Vec::new(),
            options,
            tables: ReadTables::default(),
            image_cache: HashMap::new(),
        };

        let marker = u32::from_ne_bytes(stream.take()?);
        stream.order = match marker {
            ENDIAN_TYPE => Endian::native(),
            OPPOSITE_ENDIAN_TYPE => Endian::native().swapped(),
            other => return Err(Error::InvalidEndianMarker(other)),
        };

        stream.version = stream.read_uint()?;
        if stream.version > VERSION {
            return Err(Error::UnsupportedVersion { found: stream.version, supported: VERSION });
        }

        if stream.has(VERSION_0033) {
            stream.compression_level = stream.read_int()?;
            if stream.compression_level > 0 {
                let len = stream.read_uint()? as usize;
                let mut packed = Vec::new();
                stream.src.read_to_end(&mut packed)?;
                let payload = compression::decompress(&packed, len)?;
                stream.src = Source::Memory(Cursor::new(payload));
            }
        }

        debug!(
            version = stream.version,
            order = ?stream.order,
            compression = stream.compression_level,
            "reading IVE stream"
        );
        Ok(stream)
    }

    /// Format version of the stream.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Byte order the stream was written in.
    #[inline]
    pub fn byte_order(&self) -> Endian {
        self.order
    }

    /// zlib level from the envelope, 0 if uncompressed.
    #[inline]
    pub fn compression_level(&self) -> i32 {
        self.compression_level
    }

    /// Position in the (inflated) stream.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// True if the stream has a feature introduced in `since`.
    #[inline]
    pub fn has(&self, since: u32) -> bool {
        version::has_feature(self.version, since)
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let n = self.pushback.len().min(buf.len());
        if n > 0 {
            buf[..n].copy_from_slice(&self.pushback[..n]);
            self.pushback.drain(..n);
        }
        match self.src.read_exact(&mut buf[n..]) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(Error::UnexpectedEof(self.pos)),
            Err(e) => Err(e.into()),
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut b = [0u8; N];
        self.fill(&mut b)?;
        Ok(b)
    }

    /// Read the next `i32` without consuming it.
    pub fn peek_int(&mut self) -> Result<i32> {
        let raw: [u8; 4] = self.take()?;
        self.pos -= 4;
        let mut pushback = raw.to_vec();
        pushback.append(&mut self.pushback);
        self.pushback = pushback;
        Ok(match self.order {
            Endian::Little => LittleEndian::read_i32(&raw),
            Endian::Big => BigEndian::read_i32(&raw),
        })
    }

    /// Consume a tag, failing with [`Error::TypeMismatch`] if it is not `tag`.
    pub fn expect_tag(&mut self, tag: i32, expected: &'static str) -> Result<()> {
        let found = self.read_int()?;
        if found != tag {
            return Err(Error::mismatch(expected, found));
        }
        Ok(())
    }

    // ---- scalars ----

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_uchar()? != 0)
    }

    pub fn read_char(&mut self) -> Result<i8> {
        Ok(self.read_uchar()? as i8)
    }

    pub fn read_uchar(&mut self) -> Result<u8> {
        let [b] = self.take::<1>()?;
        Ok(b)
    }

    pub fn read_short(&mut self) -> Result<i16> {
        get!(self, 2, read_i16)
    }

    pub fn read_ushort(&mut self) -> Result<u16> {
        get!(self, 2, read_u16)
    }

    pub fn read_int(&mut self) -> Result<i32> {
        get!(self, 4, read_i32)
    }

    pub fn read_uint(&mut self) -> Result<u32> {
        get!(self, 4, read_u32)
    }

    pub fn read_long(&mut self) -> Result<i64> {
        get!(self, 8, read_i64)
    }

    pub fn read_float(&mut self) -> Result<f32> {
        get!(self, 4, read_f32)
    }

    pub fn read_double(&mut self) -> Result<f64> {
        get!(self, 8, read_f64)
    }

    /// Read an element count.
    pub fn read_count(&mut self) -> Result<usize> {
        let n = self.read_int()?;
        usize::try_from(n).map_err(|_| Error::invalid(format!("negative count {n} at {}", self.pos)))
    }

    /// Read `len` raw bytes.
    pub fn read_raw(&mut self, len: usize) -> Result<Vec<u8>> {
        // Lengths come from the stream; grow in chunks instead of trusting them.
        const CHUNK: usize = 64 * 1024;
        let mut out = Vec::with_capacity(len.min(CHUNK));
        while out.len() < len {
            let start = out.len();
            let end = (start + CHUNK).min(len);
            out.resize(end, 0);
            self.fill(&mut out[start..end])?;
        }
        Ok(out)
    }

    /// Read a `u32` length followed by the bytes.
    pub fn read_byte_block(&mut self) -> Result<Vec<u8>> {
        let len = self.read_uint()? as usize;
        self.read_raw(len)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_count()?;
        let bytes = self.read_raw(len)?;
        Ok(String::from_utf8(bytes)?)
    }

    pub fn read_string_array(&mut self) -> Result<Vec<String>> {
        self.read_seq(Self::read_string)
    }

    // ---- vectors and matrices ----

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_float()?, self.read_float()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_float()?, self.read_float()?, self.read_float()?))
    }

    pub fn read_vec4(&mut self) -> Result<Vec4> {
        Ok(Vec4::new(
            self.read_float()?,
            self.read_float()?,
            self.read_float()?,
            self.read_float()?,
        ))
    }

    pub fn read_dvec2(&mut self) -> Result<DVec2> {
        Ok(DVec2::new(self.read_double()?, self.read_double()?))
    }

    pub fn read_dvec3(&mut self) -> Result<DVec3> {
        Ok(DVec3::new(self.read_double()?, self.read_double()?, self.read_double()?))
    }

    pub fn read_dvec4(&mut self) -> Result<DVec4> {
        Ok(DVec4::new(
            self.read_double()?,
            self.read_double()?,
            self.read_double()?,
            self.read_double()?,
        ))
    }

    pub fn read_ubvec4(&mut self) -> Result<[u8; 4]> {
        self.take()
    }

    pub fn read_quat(&mut self) -> Result<DQuat> {
        let v = self.read_dvec4()?;
        Ok(DQuat::from_xyzw(v.x, v.y, v.z, v.w))
    }

    pub fn read_plane(&mut self) -> Result<Plane> {
        Ok(Plane(self.read_dvec4()?))
    }

    pub fn read_bounding_sphere(&mut self) -> Result<BoundingSphere> {
        let center = self.read_dvec3()?;
        Ok(BoundingSphere::new(center, self.read_double()?))
    }

    pub fn read_bounding_box(&mut self) -> Result<BoundingBox> {
        let min = self.read_dvec3()?;
        Ok(BoundingBox::new(min, self.read_dvec3()?))
    }

    pub fn read_matrixf(&mut self) -> Result<Mat4> {
        let mut cols = [0f32; 16];
        for c in &mut cols {
            *c = self.read_float()?;
        }
        Ok(Mat4::from_cols_array(&cols))
    }

    pub fn read_matrixd(&mut self) -> Result<DMat4> {
        let mut cols = [0f64; 16];
        for c in &mut cols {
            *c = self.read_double()?;
        }
        Ok(DMat4::from_cols_array(&cols))
    }

    // ---- arrays ----

    fn read_seq<T>(&mut self, mut f: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let n = self.read_count()?;
        let mut out = Vec::with_capacity(n.min(4096));
        for _ in 0..n {
            out.push(f(self)?);
        }
        Ok(out)
    }

    pub fn read_int_array(&mut self) -> Result<Vec<i32>> {
        self.read_seq(Self::read_int)
    }

    pub fn read_uint_array(&mut self) -> Result<Vec<u32>> {
        self.read_seq(Self::read_uint)
    }

    pub fn read_short_array(&mut self) -> Result<Vec<i16>> {
        self.read_seq(Self::read_short)
    }

    pub fn read_ushort_array(&mut self) -> Result<Vec<u16>> {
        self.read_seq(Self::read_ushort)
    }

    pub fn read_ubyte_array(&mut self) -> Result<Vec<u8>> {
        let n = self.read_count()?;
        self.read_raw(n)
    }

    pub fn read_float_array(&mut self) -> Result<Vec<f32>> {
        self.read_seq(Self::read_float)
    }

    pub fn read_double_array(&mut self) -> Result<Vec<f64>> {
        self.read_seq(Self::read_double)
    }

    pub fn read_vec2_array(&mut self) -> Result<Vec<Vec2>> {
        self.read_seq(Self::read_vec2)
    }

    pub fn read_vec3_array(&mut self) -> Result<Vec<Vec3>> {
        self.read_seq(Self::read_vec3)
    }

    pub fn read_vec4_array(&mut self) -> Result<Vec<Vec4>> {
        self.read_seq(Self::read_vec4)
    }

    pub fn read_dvec2_array(&mut self) -> Result<Vec<DVec2>> {
        self.read_seq(Self::read_dvec2)
    }

    pub fn read_dvec3_array(&mut self) -> Result<Vec<DVec3>> {
        self.read_seq(Self::read_dvec3)
    }

    pub fn read_dvec4_array(&mut self) -> Result<Vec<DVec4>> {
        self.read_seq(Self::read_dvec4)
    }

    pub fn read_ubvec4_array(&mut self) -> Result<Vec<[u8; 4]>> {
        self.read_seq(Self::read_ubvec4)
    }

    /// Tagged geometry array.
    pub fn read_array(&mut self) -> Result<Array> {
        let marker = self.read_uchar()?;
        Ok(match marker {
            0 => Array::Int(self.read_int_array()?),
            1 => Array::UByte(self.read_ubyte_array()?),
            2 => Array::UShort(self.read_ushort_array()?),
            3 => Array::UInt(self.read_uint_array()?),
            4 => Array::Vec4ub(self.read_ubvec4_array()?),
            5 => Array::Float(self.read_float_array()?),
            6 => Array::Vec2(self.read_vec2_array()?),
            7 => Array::Vec3(self.read_vec3_array()?),
            8 => Array::Vec4(self.read_vec4_array()?),
            9 => Array::Short(self.read_short_array()?),
            10 => Array::Double(self.read_double_array()?),
            11 => Array::Vec2d(self.read_dvec2_array()?),
            12 => Array::Vec3d(self.read_dvec3_array()?),
            13 => Array::Vec4d(self.read_dvec4_array()?),
            other => return Err(Error::invalid(format!("unknown array type {other}"))),
        })
    }

    /// Packed float array written by `write_packed_float_array`.
    pub fn read_packed_float_array(&mut self) -> Result<Vec<f32>> {
        let n = self.read_count()?;
        if n == 0 {
            return Ok(Vec::new());
        }
        if n > packed::MAX_COUNT {
            return Err(Error::invalid(format!(
                "packed float array of {n} values exceeds {}",
                packed::MAX_COUNT
            )));
        }
        if self.read_bool()? {
            return Ok(vec![self.read_float()?; n]);
        }
        match self.read_int()? {
            packed::PACK_U8 => {
                let min = self.read_float()?;
                let max = self.read_float()?;
                let samples = self.read_raw(n)?;
                Ok(packed::unpack_u8(min, max, &samples))
            }
            packed::PACK_U16 => {
                let min = self.read_float()?;
                let max = self.read_float()?;
                let mut samples = Vec::with_capacity(n.min(4096));
                for _ in 0..n {
                    samples.push(self.read_ushort()?);
                }
                Ok(packed::unpack_u16(min, max, &samples))
            }
            packed::PACK_FULL => {
                let mut values = Vec::with_capacity(n.min(4096));
                for _ in 0..n {
                    values.push(self.read_float()?);
                }
                Ok(values)
            }
            other => Err(Error::invalid(format!("unknown float packing {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::options::WriteOptions;
    use crate::stream::DataOutputStream;

    fn write_with(opts: WriteOptions, f: impl FnOnce(&mut DataOutputStream<Vec<u8>>)) -> Vec<u8> {
        let mut out = DataOutputStream::new(Vec::new(), opts).unwrap();
        f(&mut out);
        out.finish().unwrap()
    }

    #[test]
    fn test_primitives_both_orders() {
        for order in [Endian::Little, Endian::Big] {
            let bytes = write_with(WriteOptions::new().with_byte_order(order), |out| {
                out.write_bool(true).unwrap();
                out.write_char(-5).unwrap();
                out.write_short(i16::MIN).unwrap();
                out.write_uint(u32::MAX).unwrap();
                out.write_long(i64::MIN).unwrap();
                out.write_double(f64::MAX).unwrap();
                out.write_string("héllo").unwrap();
                out.write_quat(DQuat::from_xyzw(0.0, 0.5, 0.5, 0.7)).unwrap();
            });
            let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
            assert_eq!(inp.byte_order(), order);
            assert!(inp.read_bool().unwrap());
            assert_eq!(inp.read_char().unwrap(), -5);
            assert_eq!(inp.read_short().unwrap(), i16::MIN);
            assert_eq!(inp.read_uint().unwrap(), u32::MAX);
            assert_eq!(inp.read_long().unwrap(), i64::MIN);
            assert_eq!(inp.read_double().unwrap(), f64::MAX);
            assert_eq!(inp.read_string().unwrap(), "héllo");
            assert_eq!(inp.read_quat().unwrap(), DQuat::from_xyzw(0.0, 0.5, 0.5, 0.7));
        }
    }

    #[test]
    fn test_bad_marker() {
        let err = DataInputStream::new(&[0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 0][..], ReadOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidEndianMarker(_)));
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut bytes = ENDIAN_TYPE.to_ne_bytes().to_vec();
        bytes.extend_from_slice(&(VERSION + 1).to_ne_bytes());
        bytes.extend_from_slice(&0i32.to_ne_bytes());
        let err = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).err().unwrap();
        assert!(matches!(err, Error::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let bytes = write_with(WriteOptions::new(), |out| {
            out.write_int(42).unwrap();
            out.write_uchar(7).unwrap();
        });
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        let pos = inp.pos();
        assert_eq!(inp.peek_int().unwrap(), 42);
        assert_eq!(inp.pos(), pos);
        assert_eq!(inp.read_int().unwrap(), 42);
        assert_eq!(inp.read_uchar().unwrap(), 7);
        assert!(matches!(inp.read_uchar(), Err(Error::UnexpectedEof(_))));
    }

    #[test]
    fn test_compressed_payload() {
        let bytes = write_with(WriteOptions::new().compressed(true), |out| {
            out.write_float_array(&vec![1.5; 1000]).unwrap();
        });
        assert!(bytes.len() < 1000);
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        assert!(inp.compression_level() > 0);
        assert_eq!(inp.read_float_array().unwrap(), vec![1.5; 1000]);
    }

    #[test]
    fn test_tagged_arrays() {
        let arrays = [
            Array::Vec3(vec![Vec3::new(1.0, 2.0, 3.0)]),
            Array::Vec4ub(vec![[1, 2, 3, 4], [5, 6, 7, 8]]),
            Array::Vec2d(vec![DVec2::new(-1.0, 1e300)]),
            Array::UShort(vec![]),
        ];
        let bytes = write_with(WriteOptions::new(), |out| {
            for a in &arrays {
                out.write_array(a).unwrap();
            }
        });
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        for a in &arrays {
            assert_eq!(&inp.read_array().unwrap(), a);
        }
    }

    #[test]
    fn test_packed_round_trip() {
        let values: Vec<f32> = (0..100).map(|i| (i as f32 * 0.37).sin() * 50.0).collect();
        let bytes = write_with(WriteOptions::new(), |out| {
            out.write_packed_float_array(&values, 0.5).unwrap();
            out.write_packed_float_array(&[], 0.5).unwrap();
            out.write_packed_float_array(&[2.0, 2.0], 0.5).unwrap();
        });
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        let restored = inp.read_packed_float_array().unwrap();
        for (a, b) in values.iter().zip(&restored) {
            assert!((a - b).abs() < 0.5);
        }
        assert!(inp.read_packed_float_array().unwrap().is_empty());
        assert_eq!(inp.read_packed_float_array().unwrap(), vec![2.0, 2.0]);
    }

    #[test]
    fn test_packed_count_bounded() {
        let bytes = write_with(WriteOptions::new(), |out| {
            out.write_int(400_000_000).unwrap();
            out.write_bool(true).unwrap();
            out.write_float(1.0).unwrap();
        });
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        let err = inp.read_packed_float_array().unwrap_err();
        assert!(matches!(err, Error::InvalidStructure(_)));
    }
}
