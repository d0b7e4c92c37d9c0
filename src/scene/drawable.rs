//! Drawables: geometry and shape drawables.

use super::gl;
use super::{ObjectData, ShapeRef, StateSetRef};
use crate::stream::tags;
use crate::util::{BoundingBox, DVec2, DVec3, DVec4, Vec2, Vec3, Vec4};

/// Fields common to every drawable.
#[derive(Clone, Debug)]
pub struct DrawableData {
    pub state_set: Option<StateSetRef>,
    /// Bound supplied by the application, if any.
    pub initial_bound: Option<BoundingBox>,
    /// Shape the drawable represents (used for intersection and by shape drawables).
    pub shape: Option<ShapeRef>,
    pub support_display_list: bool,
    pub use_display_list: bool,
    pub use_vertex_buffer_objects: bool,
}

impl Default for DrawableData {
    fn default() -> Self {
        Self {
            state_set: None,
            initial_bound: None,
            shape: None,
            support_display_list: true,
            use_display_list: true,
            use_vertex_buffer_objects: false,
        }
    }
}

/// Something that can be drawn.
#[derive(Clone, Debug)]
pub struct Drawable {
    pub object: ObjectData,
    pub core: DrawableData,
    pub kind: DrawableKind,
}

impl Drawable {
    pub fn new(kind: DrawableKind) -> Self {
        Self { object: ObjectData::default(), core: DrawableData::default(), kind }
    }

    /// Create a geometry drawable.
    pub fn geometry(geometry: Geometry) -> Self {
        Self::new(DrawableKind::Geometry(geometry))
    }

    /// Attach a state set.
    pub fn with_state_set(mut self, state_set: StateSetRef) -> Self {
        self.core.state_set = Some(state_set);
        self
    }
}

/// Concrete drawable types.
#[derive(Clone, Debug)]
pub enum DrawableKind {
    Geometry(Geometry),
    ShapeDrawable(ShapeDrawable),
}

impl DrawableKind {
    /// Tag written for this concrete type.
    pub fn type_tag(&self) -> i32 {
        match self {
            Self::Geometry(_) => tags::GEOMETRY,
            Self::ShapeDrawable(_) => tags::SHAPE_DRAWABLE,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Geometry(_) => "Geometry",
            Self::ShapeDrawable(_) => "ShapeDrawable",
        }
    }
}

/// How an attribute array maps onto the geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum AttributeBinding {
    #[default]
    Off = 0,
    Overall = 1,
    PerPrimitiveSet = 2,
    PerVertex = 4,
}

impl AttributeBinding {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::Off),
            1 => Some(Self::Overall),
            2 => Some(Self::PerPrimitiveSet),
            4 => Some(Self::PerVertex),
            _ => None,
        }
    }
}

/// Typed attribute array.
#[derive(Clone, Debug, PartialEq)]
pub enum Array {
    Int(Vec<i32>),
    UByte(Vec<u8>),
    UShort(Vec<u16>),
    UInt(Vec<u32>),
    Vec4ub(Vec<[u8; 4]>),
    Float(Vec<f32>),
    Vec2(Vec<Vec2>),
    Vec3(Vec<Vec3>),
    Vec4(Vec<Vec4>),
    Short(Vec<i16>),
    Double(Vec<f64>),
    Vec2d(Vec<DVec2>),
    Vec3d(Vec<DVec3>),
    Vec4d(Vec<DVec4>),
}

impl Array {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::UByte(v) => v.len(),
            Self::UShort(v) => v.len(),
            Self::UInt(v) => v.len(),
            Self::Vec4ub(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Vec2(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Vec2d(v) => v.len(),
            Self::Vec3d(v) => v.len(),
            Self::Vec4d(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Marker byte written ahead of the array.
    pub fn type_marker(&self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::UByte(_) => 1,
            Self::UShort(_) => 2,
            Self::UInt(_) => 3,
            Self::Vec4ub(_) => 4,
            Self::Float(_) => 5,
            Self::Vec2(_) => 6,
            Self::Vec3(_) => 7,
            Self::Vec4(_) => 8,
            Self::Short(_) => 9,
            Self::Double(_) => 10,
            Self::Vec2d(_) => 11,
            Self::Vec3d(_) => 12,
            Self::Vec4d(_) => 13,
        }
    }
}

/// Array with its binding.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryArray {
    pub binding: AttributeBinding,
    pub normalize: bool,
    pub array: Array,
}

impl GeometryArray {
    /// Per-vertex binding without normalisation.
    pub fn per_vertex(array: Array) -> Self {
        Self { binding: AttributeBinding::PerVertex, normalize: false, array }
    }

    /// Overall binding without normalisation.
    pub fn overall(array: Array) -> Self {
        Self { binding: AttributeBinding::Overall, normalize: false, array }
    }
}

/// A run of primitives over the geometry's arrays.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveSet {
    /// GL primitive mode (`GL_TRIANGLES`, ...).
    pub mode: u32,
    pub num_instances: i32,
    pub kind: PrimitiveSetKind,
}

impl PrimitiveSet {
    pub fn new(mode: u32, kind: PrimitiveSetKind) -> Self {
        Self { mode, num_instances: 0, kind }
    }

    /// `DrawArrays` over `count` vertices from `first`.
    pub fn draw_arrays(mode: u32, first: i32, count: i32) -> Self {
        Self::new(mode, PrimitiveSetKind::DrawArrays { first, count })
    }

    /// Indexed triangles with 16-bit indices.
    pub fn triangles_u16(indices: Vec<u16>) -> Self {
        Self::new(gl::GL_TRIANGLES, PrimitiveSetKind::DrawElementsUShort(indices))
    }
}

/// Concrete primitive set types.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveSetKind {
    DrawArrays { first: i32, count: i32 },
    DrawArrayLengths { first: i32, lengths: Vec<i32> },
    DrawElementsUByte(Vec<u8>),
    DrawElementsUShort(Vec<u16>),
    DrawElementsUInt(Vec<u32>),
}

impl PrimitiveSetKind {
    pub fn type_tag(&self) -> i32 {
        match self {
            Self::DrawArrays { .. } => tags::DRAW_ARRAYS,
            Self::DrawArrayLengths { .. } => tags::DRAW_ARRAY_LENGTHS,
            Self::DrawElementsUByte(_) => tags::DRAW_ELEMENTS_UBYTE,
            Self::DrawElementsUShort(_) => tags::DRAW_ELEMENTS_USHORT,
            Self::DrawElementsUInt(_) => tags::DRAW_ELEMENTS_UINT,
        }
    }
}

/// Vertex-array geometry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub primitive_sets: Vec<PrimitiveSet>,
    pub vertex_array: Option<GeometryArray>,
    pub normal_array: Option<GeometryArray>,
    pub color_array: Option<GeometryArray>,
    pub secondary_color_array: Option<GeometryArray>,
    pub fog_coord_array: Option<GeometryArray>,
    /// Texture coordinates by unit.
    pub tex_coord_arrays: Vec<Option<GeometryArray>>,
    /// Generic vertex attributes by index.
    pub vertex_attrib_arrays: Vec<Option<GeometryArray>>,
}

impl Geometry {
    /// Number of vertices in the vertex array.
    pub fn num_vertices(&self) -> usize {
        self.vertex_array.as_ref().map(|a| a.array.len()).unwrap_or(0)
    }
}

/// Tessellation controls for shape drawables.
#[derive(Clone, Debug)]
pub struct TessellationHints {
    pub object: ObjectData,
    pub tessellation_mode: i32,
    pub target_num_faces: u32,
    pub detail_ratio: f32,
    pub create_front_face: bool,
    pub create_back_face: bool,
    pub create_normals: bool,
    pub create_texture_coords: bool,
    pub create_top: bool,
    pub create_body: bool,
    pub create_bottom: bool,
}

impl Default for TessellationHints {
    fn default() -> Self {
        Self {
            object: ObjectData::default(),
            tessellation_mode: 0,
            target_num_faces: 100,
            detail_ratio: 1.0,
            create_front_face: true,
            create_back_face: false,
            create_normals: true,
            create_texture_coords: false,
            create_top: true,
            create_body: true,
            create_bottom: true,
        }
    }
}

/// Drawable rendering `core.shape`.
#[derive(Clone, Debug)]
pub struct ShapeDrawable {
    pub color: Vec4,
    pub tessellation_hints: Option<TessellationHints>,
}

impl Default for ShapeDrawable {
    fn default() -> Self {
        Self { color: Vec4::ONE, tessellation_hints: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_markers_unique() {
        let arrays = [
            Array::Int(vec![]),
            Array::UByte(vec![]),
            Array::UShort(vec![]),
            Array::UInt(vec![]),
            Array::Vec4ub(vec![]),
            Array::Float(vec![]),
            Array::Vec2(vec![]),
            Array::Vec3(vec![]),
            Array::Vec4(vec![]),
            Array::Short(vec![]),
            Array::Double(vec![]),
            Array::Vec2d(vec![]),
            Array::Vec3d(vec![]),
            Array::Vec4d(vec![]),
        ];
        for (i, a) in arrays.iter().enumerate() {
            assert_eq!(a.type_marker() as usize, i);
            assert!(a.is_empty());
        }
    }

    #[test]
    fn test_geometry_num_vertices() {
        let mut g = Geometry::default();
        assert_eq!(g.num_vertices(), 0);
        g.vertex_array = Some(GeometryArray::per_vertex(Array::Vec3(vec![Vec3::ZERO; 3])));
        assert_eq!(g.num_vertices(), 3);
    }
}
