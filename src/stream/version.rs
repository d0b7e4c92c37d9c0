//! Stream envelope constants and feature gates.

/// Endian marker as written by the producer.
pub const ENDIAN_TYPE: u32 = 0x0102_0304;

/// Endian marker as seen by a consumer of the other byte order.
pub const OPPOSITE_ENDIAN_TYPE: u32 = 0x0403_0201;

pub const VERSION_0001: u32 = 1;
/// User data on objects.
pub const VERSION_0005: u32 = 5;
/// `culling_active` and the initial bound on nodes.
pub const VERSION_0010: u32 = 10;
/// Image mode byte (before: a bool followed by inline data).
pub const VERSION_0012: u32 = 12;
/// Texture anisotropy and border.
pub const VERSION_0017: u32 = 17;
/// Programs, shaders and uniforms.
pub const VERSION_0021: u32 = 21;
/// Shape drawable tessellation hints.
pub const VERSION_0024: u32 = 24;
/// PagedLOD priorities and database path.
pub const VERSION_0026: u32 = 26;
/// Terrain tiles, layers and locators.
pub const VERSION_0030: u32 = 30;
/// Compression marker in the envelope.
pub const VERSION_0033: u32 = 33;
/// Packed float arrays for height fields.
pub const VERSION_0035: u32 = 35;
/// Volume tiles, layers and properties.
pub const VERSION_0039: u32 = 39;
/// Primitive set instance counts.
pub const VERSION_0042: u32 = 42;
/// Shared image table.
pub const VERSION_0045: u32 = 45;
/// SpecularHighlights written under its own tag.
pub const VERSION_0046: u32 = 46;

/// Version written by default and the newest this crate reads.
pub const VERSION: u32 = VERSION_0046;

/// True if a stream of `version` carries a feature introduced in `since`.
#[inline]
pub const fn has_feature(version: u32, since: u32) -> bool {
    version >= since
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endian_markers_are_swaps() {
        assert_eq!(ENDIAN_TYPE.swap_bytes(), OPPOSITE_ENDIAN_TYPE);
    }

    #[test]
    fn test_feature_gates() {
        assert!(has_feature(VERSION, VERSION_0033));
        assert!(!has_feature(VERSION_0030, VERSION_0033));
        assert!(has_feature(VERSION_0033, VERSION_0033));
    }
}
