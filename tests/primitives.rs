//! Property tests for the primitive encodings in both byte orders.

use ive::util::{DMat4, DQuat, Vec3};
use ive::{DataInputStream, DataOutputStream, Endian, ReadOptions, WriteOptions};
use proptest::prelude::*;

fn endian() -> impl Strategy<Value = Endian> {
    prop_oneof![Just(Endian::Little), Just(Endian::Big)]
}

fn stream(order: Endian, f: impl FnOnce(&mut DataOutputStream<Vec<u8>>)) -> Vec<u8> {
    let mut out = DataOutputStream::new(Vec::new(), WriteOptions::new().with_byte_order(order)).unwrap();
    f(&mut out);
    out.finish().unwrap()
}

proptest! {
    #[test]
    fn prop_scalars(order in endian(), a: i32, b: u32, c: i16, d: i64, e: f64, f: u8, g: bool) {
        let bytes = stream(order, |out| {
            out.write_int(a).unwrap();
            out.write_uint(b).unwrap();
            out.write_short(c).unwrap();
            out.write_long(d).unwrap();
            out.write_double(e).unwrap();
            out.write_uchar(f).unwrap();
            out.write_bool(g).unwrap();
        });
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        prop_assert_eq!(inp.read_int().unwrap(), a);
        prop_assert_eq!(inp.read_uint().unwrap(), b);
        prop_assert_eq!(inp.read_short().unwrap(), c);
        prop_assert_eq!(inp.read_long().unwrap(), d);
        prop_assert_eq!(inp.read_double().unwrap().to_bits(), e.to_bits());
        prop_assert_eq!(inp.read_uchar().unwrap(), f);
        prop_assert_eq!(inp.read_bool().unwrap(), g);
        prop_assert!(inp.read_uchar().is_err());
    }

    #[test]
    fn prop_strings_and_arrays(
        order in endian(),
        s in ".{0,40}",
        ints in prop::collection::vec(any::<i32>(), 0..32),
        floats in prop::collection::vec(any::<f32>(), 0..32),
    ) {
        let bytes = stream(order, |out| {
            out.write_string(&s).unwrap();
            out.write_int_array(&ints).unwrap();
            out.write_float_array(&floats).unwrap();
        });
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        prop_assert_eq!(inp.read_string().unwrap(), s);
        prop_assert_eq!(inp.read_int_array().unwrap(), ints);
        let read: Vec<u32> = inp.read_float_array().unwrap().iter().map(|v| v.to_bits()).collect();
        let expected: Vec<u32> = floats.iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(read, expected);
    }

    #[test]
    fn prop_vectors_and_matrices(order in endian(), x in -1e6f32..1e6, y in -1e6f32..1e6, angle in -3.0f64..3.0) {
        let v = Vec3::new(x, y, x - y);
        let q = DQuat::from_rotation_y(angle);
        let m = DMat4::from_quat(q);
        let bytes = stream(order, |out| {
            out.write_vec3(v).unwrap();
            out.write_quat(q).unwrap();
            out.write_matrixd(&m).unwrap();
        });
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        prop_assert_eq!(inp.read_vec3().unwrap(), v);
        prop_assert_eq!(inp.read_quat().unwrap(), q);
        prop_assert_eq!(inp.read_matrixd().unwrap(), m);
    }

    #[test]
    fn prop_packed_floats_within_bound(
        values in prop::collection::vec(-100.0f32..100.0, 1..64),
        max_error in 0.001f32..2.0,
    ) {
        let bytes = stream(Endian::native(), |out| out.write_packed_float_array(&values, max_error).unwrap());
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        let read = inp.read_packed_float_array().unwrap();
        prop_assert_eq!(read.len(), values.len());
        for (a, b) in values.iter().zip(&read) {
            prop_assert!((a - b).abs() <= max_error, "{} decoded as {}", a, b);
        }
    }
}

#[test]
fn test_strings_are_length_prefixed_bytes() {
    let bytes = stream(Endian::Little, |out| out.write_string("tree").unwrap());
    assert_eq!(&bytes[12..], &[4, 0, 0, 0, b't', b'r', b'e', b'e']);
}

#[test]
fn test_packed_bound_is_strict() {
    let values = [0.0f32, 0.5, 65535.0];
    let bytes = stream(Endian::Little, |out| out.write_packed_float_array(&values, 0.5).unwrap());
    let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
    let read = inp.read_packed_float_array().unwrap();
    // Count, all-same flag, then the full-float marker.
    assert_eq!(&bytes[16..17], &[0]);
    assert_eq!(i32::from_le_bytes(bytes[17..21].try_into().unwrap()), ive::stream::packed::PACK_FULL);
    let bits: Vec<u32> = read.iter().map(|v| v.to_bits()).collect();
    let expected: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
    assert_eq!(bits, expected);
}
