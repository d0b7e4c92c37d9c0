//! Analytic shapes.

use super::{ObjectData, ShapeRef};
use crate::stream::tags;
use crate::util::{Quat, Vec3};

/// An analytic shape.
#[derive(Clone, Debug)]
pub struct Shape {
    pub object: ObjectData,
    pub kind: ShapeKind,
}

impl Shape {
    pub fn new(kind: ShapeKind) -> Self {
        Self { object: ObjectData::default(), kind }
    }
}

/// Concrete shape types.
#[derive(Clone, Debug)]
pub enum ShapeKind {
    Sphere(Sphere),
    Box(ShapeBox),
    Cone(Cone),
    Cylinder(Cylinder),
    Capsule(Capsule),
    HeightField(HeightField),
    Composite(CompositeShape),
}

impl ShapeKind {
    pub fn type_tag(&self) -> i32 {
        match self {
            Self::Sphere(_) => tags::SPHERE,
            Self::Box(_) => tags::BOX,
            Self::Cone(_) => tags::CONE,
            Self::Cylinder(_) => tags::CYLINDER,
            Self::Capsule(_) => tags::CAPSULE,
            Self::HeightField(_) => tags::HEIGHT_FIELD,
            Self::Composite(_) => tags::COMPOSITE_SHAPE,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Sphere(_) => "Sphere",
            Self::Box(_) => "Box",
            Self::Cone(_) => "Cone",
            Self::Cylinder(_) => "Cylinder",
            Self::Capsule(_) => "Capsule",
            Self::HeightField(_) => "HeightField",
            Self::Composite(_) => "CompositeShape",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeBox {
    pub center: Vec3,
    pub half_lengths: Vec3,
    pub rotation: Quat,
}

impl Default for ShapeBox {
    fn default() -> Self {
        Self { center: Vec3::ZERO, half_lengths: Vec3::splat(0.5), rotation: Quat::IDENTITY }
    }
}

/// Fields shared by cone, cylinder and capsule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Axial {
    pub center: Vec3,
    pub radius: f32,
    pub height: f32,
    pub rotation: Quat,
}

impl Default for Axial {
    fn default() -> Self {
        Self { center: Vec3::ZERO, radius: 1.0, height: 1.0, rotation: Quat::IDENTITY }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cone(pub Axial);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cylinder(pub Axial);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Capsule(pub Axial);

/// Regular grid of heights.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    pub columns: u32,
    pub rows: u32,
    pub origin: Vec3,
    pub x_interval: f32,
    pub y_interval: f32,
    pub rotation: Quat,
    pub skirt_height: f32,
    pub border_width: u32,
    /// `columns * rows` heights, row by row.
    pub heights: Vec<f32>,
}

impl Default for HeightField {
    fn default() -> Self {
        Self {
            columns: 0,
            rows: 0,
            origin: Vec3::ZERO,
            x_interval: 1.0,
            y_interval: 1.0,
            rotation: Quat::IDENTITY,
            skirt_height: 0.0,
            border_width: 0,
            heights: Vec::new(),
        }
    }
}

impl HeightField {
    /// Flat grid of the given size.
    pub fn allocate(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            heights: vec![0.0; columns as usize * rows as usize],
            ..Self::default()
        }
    }

    pub fn height(&self, c: u32, r: u32) -> f32 {
        self.heights[(r * self.columns + c) as usize]
    }

    pub fn set_height(&mut self, c: u32, r: u32, h: f32) {
        let i = (r * self.columns + c) as usize;
        self.heights[i] = h;
    }

    /// Horizontal size of the grid, the scale the packed-height error is relative to.
    pub fn extent(&self) -> f32 {
        let w = self.x_interval * self.columns.saturating_sub(1) as f32;
        let h = self.y_interval * self.rows.saturating_sub(1) as f32;
        (w * w + h * h).sqrt()
    }
}

#[derive(Clone, Debug, Default)]
pub struct CompositeShape {
    pub shape: Option<ShapeRef>,
    pub children: Vec<ShapeRef>,
}
