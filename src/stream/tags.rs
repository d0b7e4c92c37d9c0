//! Type tags written ahead of every concrete type and hierarchy level.
//!
//! Tags are stable: values are never reassigned, new ones are appended.

// Object/node hierarchy.
pub const OBJECT: i32 = 0x0000_0001;
pub const NODE: i32 = 0x0000_0002;
pub const GROUP: i32 = 0x0000_0003;
pub const MATRIX_TRANSFORM: i32 = 0x0000_0004;
pub const STATE_SET: i32 = 0x0000_0005;
pub const GEODE: i32 = 0x0000_0006;
pub const IMAGE: i32 = 0x0000_0007;
pub const BILLBOARD: i32 = 0x0000_0008;
pub const LOD: i32 = 0x0000_0009;
pub const PAGED_LOD: i32 = 0x0000_000A;
pub const TRANSFORM: i32 = 0x0000_000B;
pub const SWITCH: i32 = 0x0000_000C;
pub const LIGHT_SOURCE: i32 = 0x0000_000D;
pub const POSITION_ATTITUDE_TRANSFORM: i32 = 0x0000_000E;
pub const SEQUENCE: i32 = 0x0000_000F;
pub const CLIP_NODE: i32 = 0x0000_0010;
pub const PROXY_NODE: i32 = 0x0000_0011;

// Effects.
pub const EFFECT: i32 = 0x0100_0001;
pub const ANISOTROPIC_LIGHTING: i32 = 0x0100_0002;
pub const SPECULAR_HIGHLIGHTS: i32 = 0x0100_0006;
/// Tag SpecularHighlights was written with before it got its own.
pub const SPECULAR_HIGHLIGHTS_LEGACY: i32 = ANISOTROPIC_LIGHTING;

// Terrain.
pub const TERRAIN_TILE: i32 = 0x0020_0001;
pub const LOCATOR: i32 = 0x0020_0002;
pub const LAYER: i32 = 0x0020_0003;
pub const IMAGE_LAYER: i32 = 0x0020_0004;
pub const HEIGHT_FIELD_LAYER: i32 = 0x0020_0005;
pub const COMPOSITE_LAYER: i32 = 0x0020_0006;
pub const SWITCH_LAYER: i32 = 0x0020_0007;
pub const PROXY_LAYER: i32 = 0x0020_0008;

// Volume.
pub const VOLUME_TILE: i32 = 0x0030_0001;
pub const VOLUME_LOCATOR: i32 = 0x0030_0002;
pub const VOLUME_LAYER: i32 = 0x0030_0003;
pub const VOLUME_IMAGE_LAYER: i32 = 0x0030_0004;
pub const VOLUME_COMPOSITE_LAYER: i32 = 0x0030_0005;
pub const VOLUME_PROPERTY: i32 = 0x0030_0006;
pub const COMPOSITE_PROPERTY: i32 = 0x0030_0007;
pub const SWITCH_PROPERTY: i32 = 0x0030_0008;
pub const TRANSFER_FUNCTION_PROPERTY: i32 = 0x0030_0009;
pub const SCALAR_PROPERTY: i32 = 0x0030_000A;
pub const ISO_SURFACE_PROPERTY: i32 = 0x0030_000B;
pub const MIP_PROPERTY: i32 = 0x0030_000C;
pub const LIGHTING_PROPERTY: i32 = 0x0030_000D;
pub const ALPHA_FUNC_PROPERTY: i32 = 0x0030_000E;
pub const SAMPLE_DENSITY_PROPERTY: i32 = 0x0030_000F;
pub const TRANSPARENCY_PROPERTY: i32 = 0x0030_0010;

// State attributes.
pub const STATE_ATTRIBUTE: i32 = 0x0000_0100;
pub const TEXTURE: i32 = 0x0000_0101;
pub const TEXTURE_1D: i32 = 0x0000_0102;
pub const TEXTURE_2D: i32 = 0x0000_0103;
pub const TEXTURE_3D: i32 = 0x0000_0104;
pub const TEXTURE_CUBE_MAP: i32 = 0x0000_0105;
pub const TEX_ENV: i32 = 0x0000_0106;
pub const TEX_GEN: i32 = 0x0000_0108;
pub const CULL_FACE: i32 = 0x0000_0109;
pub const POLYGON_OFFSET: i32 = 0x0000_010A;
pub const SHADE_MODEL: i32 = 0x0000_010B;
pub const POINT: i32 = 0x0000_010C;
pub const TEX_MAT: i32 = 0x0000_010D;
pub const LINE_WIDTH: i32 = 0x0000_010E;
pub const DEPTH: i32 = 0x0000_0111;
pub const BLEND_FUNC: i32 = 0x0000_0113;
pub const MATERIAL: i32 = 0x0000_0114;
pub const ALPHA_FUNC: i32 = 0x0000_0115;
pub const LIGHT: i32 = 0x0000_0116;
pub const POLYGON_MODE: i32 = 0x0000_0117;
pub const FOG: i32 = 0x0000_0118;
pub const LIGHT_MODEL: i32 = 0x0000_0121;
pub const CLIP_PLANE: i32 = 0x0000_0122;
pub const FRONT_FACE: i32 = 0x0000_0123;
pub const PROGRAM: i32 = 0x0000_0124;
pub const SHADER: i32 = 0x0000_0125;
pub const UNIFORM: i32 = 0x0000_0126;
pub const VIEWPORT: i32 = 0x0000_0127;
pub const SCISSOR: i32 = 0x0000_0128;
pub const BLEND_COLOR: i32 = 0x0000_012A;
pub const BLEND_EQUATION: i32 = 0x0000_012B;

// Drawables.
pub const DRAWABLE: i32 = 0x0000_1000;
pub const GEOMETRY: i32 = 0x0000_1001;
pub const SHAPE_DRAWABLE: i32 = 0x0000_1002;

// Primitive sets.
pub const PRIMITIVE_SET: i32 = 0x0000_1010;
pub const DRAW_ARRAYS: i32 = 0x0000_1011;
pub const DRAW_ARRAY_LENGTHS: i32 = 0x0000_1012;
pub const DRAW_ELEMENTS_UBYTE: i32 = 0x0000_1013;
pub const DRAW_ELEMENTS_USHORT: i32 = 0x0000_1014;
pub const DRAW_ELEMENTS_UINT: i32 = 0x0000_1015;

// Shapes.
pub const SHAPE: i32 = 0x0000_2000;
pub const SPHERE: i32 = 0x0000_2001;
pub const BOX: i32 = 0x0000_2002;
pub const CONE: i32 = 0x0000_2003;
pub const CYLINDER: i32 = 0x0000_2004;
pub const CAPSULE: i32 = 0x0000_2005;
pub const HEIGHT_FIELD: i32 = 0x0000_2006;
pub const COMPOSITE_SHAPE: i32 = 0x0000_2007;
pub const TESSELLATION_HINTS: i32 = 0x0000_2008;

// User data.
pub const SHAPE_ATTRIBUTE_LIST: i32 = 0x0010_000B;
/// Written in place of an object the format cannot carry.
pub const NO_OBJECT: i32 = -1;

/// Human readable name of a tag, for diagnostics.
pub fn tag_name(tag: i32) -> &'static str {
    match tag {
        OBJECT => "Object",
        NODE => "Node",
        GROUP => "Group",
        MATRIX_TRANSFORM => "MatrixTransform",
        STATE_SET => "StateSet",
        GEODE => "Geode",
        IMAGE => "Image",
        BILLBOARD => "Billboard",
        LOD => "LOD",
        PAGED_LOD => "PagedLOD",
        TRANSFORM => "Transform",
        SWITCH => "Switch",
        LIGHT_SOURCE => "LightSource",
        POSITION_ATTITUDE_TRANSFORM => "PositionAttitudeTransform",
        SEQUENCE => "Sequence",
        CLIP_NODE => "ClipNode",
        PROXY_NODE => "ProxyNode",
        EFFECT => "Effect",
        ANISOTROPIC_LIGHTING => "AnisotropicLighting",
        SPECULAR_HIGHLIGHTS => "SpecularHighlights",
        TERRAIN_TILE => "TerrainTile",
        LOCATOR => "Locator",
        LAYER => "Layer",
        IMAGE_LAYER => "ImageLayer",
        HEIGHT_FIELD_LAYER => "HeightFieldLayer",
        COMPOSITE_LAYER => "CompositeLayer",
        SWITCH_LAYER => "SwitchLayer",
        PROXY_LAYER => "ProxyLayer",
        VOLUME_TILE => "VolumeTile",
        VOLUME_LOCATOR => "VolumeLocator",
        VOLUME_LAYER => "VolumeLayer",
        VOLUME_IMAGE_LAYER => "VolumeImageLayer",
        VOLUME_COMPOSITE_LAYER => "VolumeCompositeLayer",
        VOLUME_PROPERTY => "Property",
        COMPOSITE_PROPERTY => "CompositeProperty",
        SWITCH_PROPERTY => "SwitchProperty",
        TRANSFER_FUNCTION_PROPERTY => "TransferFunctionProperty",
        SCALAR_PROPERTY => "ScalarProperty",
        ISO_SURFACE_PROPERTY => "IsoSurfaceProperty",
        MIP_PROPERTY => "MaximumIntensityProjectionProperty",
        LIGHTING_PROPERTY => "LightingProperty",
        ALPHA_FUNC_PROPERTY => "AlphaFuncProperty",
        SAMPLE_DENSITY_PROPERTY => "SampleDensityProperty",
        TRANSPARENCY_PROPERTY => "TransparencyProperty",
        STATE_ATTRIBUTE => "StateAttribute",
        TEXTURE => "Texture",
        TEXTURE_1D => "Texture1D",
        TEXTURE_2D => "Texture2D",
        TEXTURE_3D => "Texture3D",
        TEXTURE_CUBE_MAP => "TextureCubeMap",
        TEX_ENV => "TexEnv",
        TEX_GEN => "TexGen",
        CULL_FACE => "CullFace",
        POLYGON_OFFSET => "PolygonOffset",
        SHADE_MODEL => "ShadeModel",
        POINT => "Point",
        TEX_MAT => "TexMat",
        LINE_WIDTH => "LineWidth",
        DEPTH => "Depth",
        BLEND_FUNC => "BlendFunc",
        MATERIAL => "Material",
        ALPHA_FUNC => "AlphaFunc",
        LIGHT => "Light",
        POLYGON_MODE => "PolygonMode",
        FOG => "Fog",
        LIGHT_MODEL => "LightModel",
        CLIP_PLANE => "ClipPlane",
        FRONT_FACE => "FrontFace",
        PROGRAM => "Program",
        SHADER => "Shader",
        UNIFORM => "Uniform",
        VIEWPORT => "Viewport",
        SCISSOR => "Scissor",
        BLEND_COLOR => "BlendColor",
        BLEND_EQUATION => "BlendEquation",
        DRAWABLE => "Drawable",
        GEOMETRY => "Geometry",
        SHAPE_DRAWABLE => "ShapeDrawable",
        PRIMITIVE_SET => "PrimitiveSet",
        DRAW_ARRAYS => "DrawArrays",
        DRAW_ARRAY_LENGTHS => "DrawArrayLengths",
        DRAW_ELEMENTS_UBYTE => "DrawElementsUByte",
        DRAW_ELEMENTS_USHORT => "DrawElementsUShort",
        DRAW_ELEMENTS_UINT => "DrawElementsUInt",
        SHAPE => "Shape",
        SPHERE => "Sphere",
        BOX => "Box",
        CONE => "Cone",
        CYLINDER => "Cylinder",
        CAPSULE => "Capsule",
        HEIGHT_FIELD => "HeightField",
        COMPOSITE_SHAPE => "CompositeShape",
        TESSELLATION_HINTS => "TessellationHints",
        SHAPE_ATTRIBUTE_LIST => "ShapeAttributeList",
        NO_OBJECT => "<none>",
        _ => "<unknown>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names() {
        assert_eq!(tag_name(MATRIX_TRANSFORM), "MatrixTransform");
        assert_eq!(tag_name(SPECULAR_HIGHLIGHTS_LEGACY), "AnisotropicLighting");
        assert_eq!(tag_name(0x7fff_0000), "<unknown>");
    }
}
