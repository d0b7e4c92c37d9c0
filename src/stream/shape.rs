//! Analytic shapes, height fields and composite shapes.

use std::io::{Read, Write};
use std::sync::Arc;

use super::tags;
use super::version::VERSION_0035;
use super::{DataInputStream, DataOutputStream};
use crate::scene::{
    Axial, Capsule, CompositeShape, Cone, Cylinder, HeightField, Shape, ShapeBox, ShapeKind,
    ShapeRef, Sphere,
};
use crate::util::{Error, Quat, Result, Vec4};

impl<W: Write> DataOutputStream<W> {
    pub fn write_shape(&mut self, shape: &ShapeRef) -> Result<()> {
        let (id, is_new) = self.tables.shapes.get_or_assign(shape);
        self.write_int(id)?;
        if !is_new {
            return Ok(());
        }
        self.write_int(shape.kind.type_tag())?;
        self.write_int(tags::SHAPE)?;
        self.write_object_level(&shape.object)?;
        match &shape.kind {
            ShapeKind::Sphere(s) => {
                self.write_vec3(s.center)?;
                self.write_float(s.radius)
            }
            ShapeKind::Box(b) => {
                self.write_vec3(b.center)?;
                self.write_vec3(b.half_lengths)?;
                self.write_rotation(b.rotation)
            }
            ShapeKind::Cone(Cone(a)) | ShapeKind::Cylinder(Cylinder(a)) | ShapeKind::Capsule(Capsule(a)) => {
                self.write_vec3(a.center)?;
                self.write_float(a.radius)?;
                self.write_float(a.height)?;
                self.write_rotation(a.rotation)
            }
            ShapeKind::HeightField(hf) => self.write_height_field(hf),
            ShapeKind::Composite(c) => {
                self.write_bool(c.shape.is_some())?;
                if let Some(s) = &c.shape {
                    self.write_shape(s)?;
                }
                self.write_count(c.children.len())?;
                for child in &c.children {
                    self.write_shape(child)?;
                }
                Ok(())
            }
        }
    }

    fn write_rotation(&mut self, q: Quat) -> Result<()> {
        self.write_vec4(Vec4::from(q))
    }

    fn write_height_field(&mut self, hf: &HeightField) -> Result<()> {
        let cells = hf.columns as usize * hf.rows as usize;
        if hf.heights.len() != cells {
            return Err(Error::invalid(format!(
                "height field holds {} heights for {}x{} cells",
                hf.heights.len(),
                hf.columns,
                hf.rows
            )));
        }
        self.write_uint(hf.columns)?;
        self.write_uint(hf.rows)?;
        self.write_vec3(hf.origin)?;
        self.write_float(hf.x_interval)?;
        self.write_float(hf.y_interval)?;
        self.write_rotation(hf.rotation)?;
        self.write_float(hf.skirt_height)?;
        self.write_uint(hf.border_width)?;
        if self.has(VERSION_0035) {
            let max_error = (self.options.maximum_error_to_size_ratio * hf.extent() as f64) as f32;
            self.write_packed_float_array(&hf.heights, max_error)
        } else {
            self.write_float_array(&hf.heights)
        }
    }
}

impl<R: Read> DataInputStream<R> {
    pub fn read_shape(&mut self) -> Result<ShapeRef> {
        let id = self.read_int()?;
        if let Some(s) = self.tables.shapes.get(id) {
            return Ok(s);
        }
        self.tables.shapes.claim(id)?;
        let tag = self.read_int()?;
        if !matches!(
            tag,
            tags::SPHERE
                | tags::BOX
                | tags::CONE
                | tags::CYLINDER
                | tags::CAPSULE
                | tags::HEIGHT_FIELD
                | tags::COMPOSITE_SHAPE
        ) {
            return Err(Error::UnknownTypeTag { category: "Shape", tag });
        }
        self.expect_tag(tags::SHAPE, "Shape")?;
        let object = self.read_object_level()?;
        let kind = match tag {
            tags::SPHERE => ShapeKind::Sphere(Sphere { center: self.read_vec3()?, radius: self.read_float()? }),
            tags::BOX => ShapeKind::Box(ShapeBox {
                center: self.read_vec3()?,
                half_lengths: self.read_vec3()?,
                rotation: self.read_rotation()?,
            }),
            tags::CONE => ShapeKind::Cone(Cone(self.read_axial()?)),
            tags::CYLINDER => ShapeKind::Cylinder(Cylinder(self.read_axial()?)),
            tags::CAPSULE => ShapeKind::Capsule(Capsule(self.read_axial()?)),
            tags::HEIGHT_FIELD => ShapeKind::HeightField(self.read_height_field()?),
            _ => {
                let shape = if self.read_bool()? { Some(self.read_shape()?) } else { None };
                let n = self.read_count()?;
                let mut children = Vec::with_capacity(n.min(1024));
                for _ in 0..n {
                    children.push(self.read_shape()?);
                }
                ShapeKind::Composite(CompositeShape { shape, children })
            }
        };
        let shape = Arc::new(Shape { object, kind });
        self.tables.shapes.insert(id, shape.clone());
        Ok(shape)
    }

    fn read_rotation(&mut self) -> Result<Quat> {
        Ok(Quat::from_vec4(self.read_vec4()?))
    }

    fn read_axial(&mut self) -> Result<Axial> {
        Ok(Axial {
            center: self.read_vec3()?,
            radius: self.read_float()?,
            height: self.read_float()?,
            rotation: self.read_rotation()?,
        })
    }

    fn read_height_field(&mut self) -> Result<HeightField> {
        let mut hf = HeightField {
            columns: self.read_uint()?,
            rows: self.read_uint()?,
            origin: self.read_vec3()?,
            x_interval: self.read_float()?,
            y_interval: self.read_float()?,
            rotation: self.read_rotation()?,
            skirt_height: self.read_float()?,
            border_width: self.read_uint()?,
            heights: Vec::new(),
        };
        hf.heights = if self.has(VERSION_0035) {
            self.read_packed_float_array()?
        } else {
            self.read_float_array()?
        };
        let cells = hf.columns as usize * hf.rows as usize;
        if hf.heights.len() != cells {
            return Err(Error::invalid(format!(
                "height field holds {} heights for {}x{} cells",
                hf.heights.len(),
                hf.columns,
                hf.rows
            )));
        }
        Ok(hf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::version::VERSION_0033;
    use crate::stream::{ReadOptions, WriteOptions};
    use crate::util::Vec3;

    fn round_trip(shape: &ShapeRef, opts: WriteOptions) -> ShapeRef {
        let mut out = DataOutputStream::new(Vec::new(), opts).unwrap();
        out.write_shape(shape).unwrap();
        let bytes = out.finish().unwrap();
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        inp.read_shape().unwrap()
    }

    fn terrain(columns: u32, rows: u32) -> HeightField {
        let mut hf = HeightField::allocate(columns, rows);
        for r in 0..rows {
            for c in 0..columns {
                hf.set_height(c, r, (c * 7 + r * 3) as f32 * 0.25);
            }
        }
        hf
    }

    #[test]
    fn test_composite_shares_children() {
        let sphere = Arc::new(Shape::new(ShapeKind::Sphere(Sphere { center: Vec3::X, radius: 2.0 })));
        let composite = Arc::new(Shape::new(ShapeKind::Composite(CompositeShape {
            shape: Some(sphere.clone()),
            children: vec![
                sphere,
                Arc::new(Shape::new(ShapeKind::Capsule(Capsule(Axial { height: 4.0, ..Axial::default() })))),
            ],
        })));
        let read = round_trip(&composite, WriteOptions::new());
        match &read.kind {
            ShapeKind::Composite(c) => {
                assert!(Arc::ptr_eq(c.shape.as_ref().unwrap(), &c.children[0]));
                assert!(matches!(c.children[1].kind, ShapeKind::Capsule(Capsule(a)) if a.height == 4.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_height_field_packed_within_tolerance() {
        let hf = terrain(16, 16);
        let shape = Arc::new(Shape::new(ShapeKind::HeightField(hf.clone())));
        let ratio = 0.001;
        let read = round_trip(&shape, WriteOptions::new().with_maximum_error_to_size_ratio(ratio));
        let bound = (ratio * hf.extent() as f64) as f32;
        match &read.kind {
            ShapeKind::HeightField(r) => {
                assert_eq!((r.columns, r.rows), (16, 16));
                for (a, b) in hf.heights.iter().zip(&r.heights) {
                    assert!((a - b).abs() < bound || a == b);
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_height_field_exact_before_packing() {
        let hf = terrain(5, 3);
        let shape = Arc::new(Shape::new(ShapeKind::HeightField(hf.clone())));
        let read = round_trip(&shape, WriteOptions::new().with_version(VERSION_0033));
        assert!(matches!(&read.kind, ShapeKind::HeightField(r) if *r == hf));
    }

    #[test]
    fn test_height_field_size_checked() {
        let mut hf = HeightField::allocate(2, 2);
        hf.heights.pop();
        let shape = Arc::new(Shape::new(ShapeKind::HeightField(hf)));
        let mut out = DataOutputStream::new(Vec::new(), WriteOptions::new()).unwrap();
        assert!(matches!(out.write_shape(&shape), Err(Error::InvalidStructure(_))));
    }
}
