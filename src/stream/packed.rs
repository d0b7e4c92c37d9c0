//! Lossy packing of float arrays.
//!
//! Values are quantized linearly between their minimum and maximum into 8 or
//! 16 bit samples. The writer tries the narrow widths in order and keeps the
//! first whose worst reconstruction error is strictly below the bound,
//! measured with [`dequantize`], the same formula the reader applies.

/// Packing marker for 8-bit samples.
pub const PACK_U8: i32 = 1;
/// Packing marker for 16-bit samples.
pub const PACK_U16: i32 = 2;
/// Packing marker for full floats.
pub const PACK_FULL: i32 = 4;

/// Largest element count a packed array may declare.
pub const MAX_COUNT: usize = 1 << 26;

/// Result of packing a non-empty array.
#[derive(Clone, Debug, PartialEq)]
pub enum PackedFloats {
    AllSame(f32),
    U8 { min: f32, max: f32, samples: Vec<u8> },
    U16 { min: f32, max: f32, samples: Vec<u16> },
    Full(Vec<f32>),
}

/// Reconstruct a sample.
#[inline]
pub fn dequantize(min: f32, max: f32, q: u32, levels: u32) -> f32 {
    min + q as f32 * ((max - min) / levels as f32)
}

/// Quantize by truncation, clamped to `levels`.
#[inline]
fn quantize(v: f32, min: f32, max: f32, levels: u32) -> u32 {
    let q = (v - min) * (levels as f32 / (max - min));
    (q as u32).min(levels)
}

fn try_quantize(values: &[f32], min: f32, max: f32, levels: u32, max_error: f32) -> Option<Vec<u32>> {
    let mut samples = Vec::with_capacity(values.len());
    for &v in values {
        let q = quantize(v, min, max, levels);
        let err = (dequantize(min, max, q, levels) - v).abs();
        // NaN errors fail too.
        if !(err < max_error) {
            return None;
        }
        samples.push(q);
    }
    Some(samples)
}

/// Pack a non-empty array under the error bound.
///
/// A bound of zero or less always keeps full floats.
pub fn pack(values: &[f32], max_error: f32) -> PackedFloats {
    let first = values[0];
    if values.iter().all(|&v| v == first) {
        return PackedFloats::AllSame(first);
    }
    if max_error > 0.0 {
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if min.is_finite() && max.is_finite() && max > min {
            if let Some(s) = try_quantize(values, min, max, u8::MAX as u32, max_error) {
                return PackedFloats::U8 { min, max, samples: s.into_iter().map(|q| q as u8).collect() };
            }
            if let Some(s) = try_quantize(values, min, max, u16::MAX as u32, max_error) {
                return PackedFloats::U16 { min, max, samples: s.into_iter().map(|q| q as u16).collect() };
            }
        }
    }
    PackedFloats::Full(values.to_vec())
}

/// Expand packed samples back to floats.
pub fn unpack_u8(min: f32, max: f32, samples: &[u8]) -> Vec<f32> {
    samples.iter().map(|&q| dequantize(min, max, q as u32, u8::MAX as u32)).collect()
}

pub fn unpack_u16(min: f32, max: f32, samples: &[u16]) -> Vec<f32> {
    samples.iter().map(|&q| dequantize(min, max, q as u32, u16::MAX as u32)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_all_same() {
        assert_eq!(pack(&[3.0, 3.0, 3.0], 0.1), PackedFloats::AllSame(3.0));
    }

    #[test]
    fn test_coarse_bound_uses_u8() {
        let values: Vec<f32> = (0..=255).map(|i| i as f32).collect();
        match pack(&values, 0.5) {
            PackedFloats::U8 { min, max, samples } => {
                assert_eq!((min, max), (0.0, 255.0));
                assert_eq!(unpack_u8(min, max, &samples), values);
            }
            other => panic!("expected u8 packing, got {other:?}"),
        }
    }

    #[test]
    fn test_tight_bound_uses_u16_then_full() {
        let values = [0.0f32, 1.0, 1000.0];
        assert!(matches!(pack(&values, 0.05), PackedFloats::U16 { .. }));
        assert!(matches!(pack(&values, 1e-6), PackedFloats::Full(_)));
        assert!(matches!(pack(&values, 0.0), PackedFloats::Full(_)));
    }

    #[test]
    fn test_error_equal_to_bound_keeps_full_floats() {
        // 0.5 truncates to sample 0 at both widths, an error of exactly 0.5.
        let values = [0.0f32, 0.5, 65535.0];
        assert_eq!(pack(&values, 0.5), PackedFloats::Full(values.to_vec()));
        assert!(matches!(pack(&values, f32::from_bits(0.5f32.to_bits() + 1)), PackedFloats::U8 { .. }));
    }

    #[test]
    fn test_non_finite_falls_back() {
        let values = [0.0f32, f32::NAN, 1.0];
        assert!(matches!(pack(&values, 10.0), PackedFloats::Full(_)));
    }

    proptest! {
        #[test]
        fn prop_packed_error_bound(
            values in prop::collection::vec(-1.0e4f32..1.0e4, 1..200),
            max_error in 1.0e-3f32..100.0,
        ) {
            let restored = match pack(&values, max_error) {
                PackedFloats::AllSame(v) => vec![v; values.len()],
                PackedFloats::U8 { min, max, samples } => unpack_u8(min, max, &samples),
                PackedFloats::U16 { min, max, samples } => unpack_u16(min, max, &samples),
                PackedFloats::Full(v) => v,
            };
            prop_assert_eq!(restored.len(), values.len());
            for (a, b) in values.iter().zip(&restored) {
                prop_assert!((a - b).abs() < max_error || a == b);
            }
        }
    }
}
