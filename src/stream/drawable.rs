//! Drawables: geometry with its primitive sets and arrays, shape drawables.

use std::io::{Read, Write};
use std::sync::Arc;

use tracing::{debug, trace};

use super::tags;
use super::version::{VERSION_0024, VERSION_0042};
use super::{decode_enum, DataInputStream, DataOutputStream};
use crate::scene::{
    AttributeBinding, Drawable, DrawableData, DrawableKind, DrawableRef, Geometry, GeometryArray,
    PrimitiveSet, PrimitiveSetKind, ShapeDrawable, TessellationHints,
};
use crate::util::{Error, Result};

impl<W: Write> DataOutputStream<W> {
    pub fn write_drawable(&mut self, drawable: &DrawableRef) -> Result<()> {
        let (id, is_new) = self.tables.drawables.get_or_assign(drawable);
        self.write_int(id)?;
        if !is_new {
            return Ok(());
        }
        trace!(id, class = drawable.kind.class_name(), "write drawable");
        self.write_int(drawable.kind.type_tag())?;
        self.write_drawable_level(drawable)?;
        match &drawable.kind {
            DrawableKind::Geometry(g) => self.write_geometry(g),
            DrawableKind::ShapeDrawable(s) => self.write_shape_drawable(s),
        }
    }

    fn write_drawable_level(&mut self, drawable: &Drawable) -> Result<()> {
        self.write_int(tags::DRAWABLE)?;
        self.write_object_level(&drawable.object)?;
        let core = &drawable.core;
        self.write_bool(core.state_set.is_some())?;
        if let Some(ss) = &core.state_set {
            self.write_state_set(ss)?;
        }
        self.write_bool(core.initial_bound.is_some())?;
        if let Some(bound) = &core.initial_bound {
            self.write_bounding_box(bound)?;
        }
        self.write_bool(core.shape.is_some())?;
        if let Some(shape) = &core.shape {
            self.write_shape(shape)?;
        }
        self.write_bool(core.support_display_list)?;
        self.write_bool(core.use_display_list)?;
        self.write_bool(core.use_vertex_buffer_objects)
    }

    fn write_geometry(&mut self, g: &Geometry) -> Result<()> {
        self.write_count(g.primitive_sets.len())?;
        for ps in &g.primitive_sets {
            self.write_primitive_set(ps)?;
        }
        for array in [
            &g.vertex_array,
            &g.normal_array,
            &g.color_array,
            &g.secondary_color_array,
            &g.fog_coord_array,
        ] {
            self.write_geometry_array(array.as_ref())?;
        }
        for list in [&g.tex_coord_arrays, &g.vertex_attrib_arrays] {
            self.write_count(list.len())?;
            for array in list {
                self.write_geometry_array(array.as_ref())?;
            }
        }
        Ok(())
    }

    fn write_geometry_array(&mut self, array: Option<&GeometryArray>) -> Result<()> {
        self.write_bool(array.is_some())?;
        if let Some(a) = array {
            self.write_int(a.binding as i32)?;
            self.write_bool(a.normalize)?;
            self.write_array(&a.array)?;
        }
        Ok(())
    }

    fn write_primitive_set(&mut self, ps: &PrimitiveSet) -> Result<()> {
        self.write_int(ps.kind.type_tag())?;
        self.write_int(tags::PRIMITIVE_SET)?;
        self.write_uint(ps.mode)?;
        if self.has(VERSION_0042) {
            self.write_int(ps.num_instances)?;
        } else if ps.num_instances != 0 {
            debug!(num_instances = ps.num_instances, version = self.version(), "dropping instance count");
        }
        match &ps.kind {
            PrimitiveSetKind::DrawArrays { first, count } => {
                self.write_int(*first)?;
                self.write_int(*count)
            }
            PrimitiveSetKind::DrawArrayLengths { first, lengths } => {
                self.write_int(*first)?;
                self.write_int_array(lengths)
            }
            PrimitiveSetKind::DrawElementsUByte(v) => self.write_ubyte_array(v),
            PrimitiveSetKind::DrawElementsUShort(v) => self.write_ushort_array(v),
            PrimitiveSetKind::DrawElementsUInt(v) => self.write_uint_array(v),
        }
    }

    fn write_shape_drawable(&mut self, s: &ShapeDrawable) -> Result<()> {
        self.write_vec4(s.color)?;
        if !self.has(VERSION_0024) {
            return Ok(());
        }
        self.write_bool(s.tessellation_hints.is_some())?;
        if let Some(h) = &s.tessellation_hints {
            self.write_int(tags::TESSELLATION_HINTS)?;
            self.write_object_level(&h.object)?;
            self.write_int(h.tessellation_mode)?;
            self.write_uint(h.target_num_faces)?;
            self.write_float(h.detail_ratio)?;
            for flag in [
                h.create_front_face,
                h.create_back_face,
                h.create_normals,
                h.create_texture_coords,
                h.create_top,
                h.create_body,
                h.create_bottom,
            ] {
                self.write_bool(flag)?;
            }
        }
        Ok(())
    }
}

impl<R: Read> DataInputStream<R> {
    pub fn read_drawable(&mut self) -> Result<DrawableRef> {
        let id = self.read_int()?;
        if let Some(d) = self.tables.drawables.get(id) {
            return Ok(d);
        }
        self.tables.drawables.claim(id)?;

        let tag = self.read_int()?;
        let drawable = match tag {
            tags::GEOMETRY => {
                let (object, core) = self.read_drawable_level()?;
                Drawable { object, core, kind: DrawableKind::Geometry(self.read_geometry()?) }
            }
            tags::SHAPE_DRAWABLE => {
                let (object, core) = self.read_drawable_level()?;
                Drawable { object, core, kind: DrawableKind::ShapeDrawable(self.read_shape_drawable()?) }
            }
            tag => return Err(Error::UnknownTypeTag { category: "Drawable", tag }),
        };
        trace!(id, class = drawable.kind.class_name(), "read drawable");
        let drawable = Arc::new(drawable);
        self.tables.drawables.insert(id, drawable.clone());
        Ok(drawable)
    }

    fn read_drawable_level(&mut self) -> Result<(crate::scene::ObjectData, DrawableData)> {
        self.expect_tag(tags::DRAWABLE, "Drawable")?;
        let object = self.read_object_level()?;
        let state_set = if self.read_bool()? { Some(self.read_state_set()?) } else { None };
        let initial_bound = if self.read_bool()? { Some(self.read_bounding_box()?) } else { None };
        let shape = if self.read_bool()? { Some(self.read_shape()?) } else { None };
        let core = DrawableData {
            state_set,
            initial_bound,
            shape,
            support_display_list: self.read_bool()?,
            use_display_list: self.read_bool()?,
            use_vertex_buffer_objects: self.read_bool()?,
        };
        Ok((object, core))
    }

    fn read_geometry(&mut self) -> Result<Geometry> {
        let n = self.read_count()?;
        let mut primitive_sets = Vec::with_capacity(n.min(4096));
        for _ in 0..n {
            primitive_sets.push(self.read_primitive_set()?);
        }
        let mut g = Geometry {
            primitive_sets,
            vertex_array: self.read_geometry_array()?,
            normal_array: self.read_geometry_array()?,
            color_array: self.read_geometry_array()?,
            secondary_color_array: self.read_geometry_array()?,
            fog_coord_array: self.read_geometry_array()?,
            ..Geometry::default()
        };
        for list in [&mut g.tex_coord_arrays, &mut g.vertex_attrib_arrays] {
            let n = self.read_count()?;
            list.reserve(n.min(64));
            for _ in 0..n {
                list.push(self.read_geometry_array()?);
            }
        }
        Ok(g)
    }

    fn read_geometry_array(&mut self) -> Result<Option<GeometryArray>> {
        if !self.read_bool()? {
            return Ok(None);
        }
        let raw = self.read_int()?;
        let binding = decode_enum(AttributeBinding::from_i32(raw), "attribute binding", raw)?;
        let normalize = self.read_bool()?;
        Ok(Some(GeometryArray { binding, normalize, array: self.read_array()? }))
    }

    fn read_primitive_set(&mut self) -> Result<PrimitiveSet> {
        let tag = self.read_int()?;
        if !matches!(
            tag,
            tags::DRAW_ARRAYS
                | tags::DRAW_ARRAY_LENGTHS
                | tags::DRAW_ELEMENTS_UBYTE
                | tags::DRAW_ELEMENTS_USHORT
                | tags::DRAW_ELEMENTS_UINT
        ) {
            return Err(Error::UnknownTypeTag { category: "PrimitiveSet", tag });
        }
        self.expect_tag(tags::PRIMITIVE_SET, "PrimitiveSet")?;
        let mode = self.read_uint()?;
        let num_instances = if self.has(VERSION_0042) { self.read_int()? } else { 0 };
        let kind = match tag {
            tags::DRAW_ARRAYS => PrimitiveSetKind::DrawArrays {
                first: self.read_int()?,
                count: self.read_int()?,
            },
            tags::DRAW_ARRAY_LENGTHS => PrimitiveSetKind::DrawArrayLengths {
                first: self.read_int()?,
                lengths: self.read_int_array()?,
            },
            tags::DRAW_ELEMENTS_UBYTE => PrimitiveSetKind::DrawElementsUByte(self.read_ubyte_array()?),
            tags::DRAW_ELEMENTS_USHORT => PrimitiveSetKind::DrawElementsUShort(self.read_ushort_array()?),
            _ => PrimitiveSetKind::DrawElementsUInt(self.read_uint_array()?),
        };
        Ok(PrimitiveSet { mode, num_instances, kind })
    }

    fn read_shape_drawable(&mut self) -> Result<ShapeDrawable> {
        let color = self.read_vec4()?;
        let mut tessellation_hints = None;
        if self.has(VERSION_0024) && self.read_bool()? {
            self.expect_tag(tags::TESSELLATION_HINTS, "TessellationHints")?;
            let object = self.read_object_level()?;
            tessellation_hints = Some(TessellationHints {
                object,
                tessellation_mode: self.read_int()?,
                target_num_faces: self.read_uint()?,
                detail_ratio: self.read_float()?,
                create_front_face: self.read_bool()?,
                create_back_face: self.read_bool()?,
                create_normals: self.read_bool()?,
                create_texture_coords: self.read_bool()?,
                create_top: self.read_bool()?,
                create_body: self.read_bool()?,
                create_bottom: self.read_bool()?,
            });
        }
        Ok(ShapeDrawable { color, tessellation_hints })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{gl, Array};
    use crate::stream::version::VERSION_0039;
    use crate::stream::{ReadOptions, WriteOptions};
    use crate::util::{Vec2, Vec3, Vec4};

    fn round_trip(d: &DrawableRef, opts: WriteOptions) -> DrawableRef {
        let mut out = DataOutputStream::new(Vec::new(), opts).unwrap();
        out.write_drawable(d).unwrap();
        let bytes = out.finish().unwrap();
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        inp.read_drawable().unwrap()
    }

    fn quad() -> Geometry {
        let mut instanced = PrimitiveSet::draw_arrays(gl::GL_TRIANGLE_STRIP, 0, 4);
        instanced.num_instances = 12;
        Geometry {
            primitive_sets: vec![
                instanced,
                PrimitiveSet::triangles_u16(vec![0, 1, 2, 2, 1, 3]),
                PrimitiveSet::new(
                    gl::GL_LINE_STRIP,
                    PrimitiveSetKind::DrawArrayLengths { first: 0, lengths: vec![2, 2] },
                ),
            ],
            vertex_array: Some(GeometryArray::per_vertex(Array::Vec3(vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::Y,
                Vec3::ONE,
            ]))),
            color_array: Some(GeometryArray::overall(Array::Vec4(vec![Vec4::ONE]))),
            tex_coord_arrays: vec![None, Some(GeometryArray::per_vertex(Array::Vec2(vec![Vec2::ZERO; 4])))],
            ..Geometry::default()
        }
    }

    #[test]
    fn test_geometry_round_trip() {
        let d = Arc::new(Drawable::geometry(quad()));
        let read = round_trip(&d, WriteOptions::new());
        match &read.kind {
            DrawableKind::Geometry(g) => assert_eq!(g, &quad()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_instances_dropped_before_42() {
        let d = Arc::new(Drawable::geometry(quad()));
        let read = round_trip(&d, WriteOptions::new().with_version(VERSION_0039));
        match &read.kind {
            DrawableKind::Geometry(g) => {
                assert_eq!(g.primitive_sets[0].num_instances, 0);
                assert_eq!(g.primitive_sets[1], quad().primitive_sets[1]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_shape_drawable_hints() {
        let hints = TessellationHints { target_num_faces: 400, create_back_face: true, ..Default::default() };
        let d = Arc::new(Drawable::new(DrawableKind::ShapeDrawable(ShapeDrawable {
            color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            tessellation_hints: Some(hints),
        })));
        let read = round_trip(&d, WriteOptions::new());
        match &read.kind {
            DrawableKind::ShapeDrawable(s) => {
                assert_eq!(s.color, Vec4::new(1.0, 0.0, 0.0, 1.0));
                let h = s.tessellation_hints.as_ref().unwrap();
                assert_eq!(h.target_num_faces, 400);
                assert!(h.create_back_face);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
