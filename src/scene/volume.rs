//! Volume layers, locators and rendering properties.

use super::{CompositeEntry, ImageRef, ObjectData, VolumeLocatorRef, VolumePropertyRef};
use crate::stream::tags;
use crate::util::{DMat4, Vec4};

/// Maps a volume's unit cube onto the world.
#[derive(Clone, Debug)]
pub struct VolumeLocator {
    pub object: ObjectData,
    pub transform: DMat4,
}

impl Default for VolumeLocator {
    fn default() -> Self {
        Self { object: ObjectData::default(), transform: DMat4::IDENTITY }
    }
}

/// A volume data layer.
#[derive(Clone, Debug)]
pub struct VolumeLayer {
    pub object: ObjectData,
    pub file_name: String,
    pub locator: Option<VolumeLocatorRef>,
    pub property: Option<VolumePropertyRef>,
    pub kind: VolumeLayerKind,
}

impl VolumeLayer {
    pub fn new(kind: VolumeLayerKind) -> Self {
        Self {
            object: ObjectData::default(),
            file_name: String::new(),
            locator: None,
            property: None,
            kind,
        }
    }
}

#[derive(Clone, Debug)]
pub enum VolumeLayerKind {
    Image { image: Option<ImageRef> },
    Composite { layers: Vec<CompositeEntry<VolumeLayer>> },
}

impl VolumeLayerKind {
    pub fn type_tag(&self) -> i32 {
        match self {
            Self::Image { .. } => tags::VOLUME_IMAGE_LAYER,
            Self::Composite { .. } => tags::VOLUME_COMPOSITE_LAYER,
        }
    }
}

/// One-dimensional colour transfer function.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransferFunction1D {
    /// `(value, colour)` control points, ordered by value.
    pub color_map: Vec<(f32, Vec4)>,
}

/// A volume rendering property.
#[derive(Clone, Debug)]
pub struct VolumeProperty {
    pub object: ObjectData,
    pub kind: VolumePropertyKind,
}

impl VolumeProperty {
    pub fn new(kind: VolumePropertyKind) -> Self {
        Self { object: ObjectData::default(), kind }
    }
}

#[derive(Clone, Debug)]
pub enum VolumePropertyKind {
    Composite { properties: Vec<VolumePropertyRef> },
    Switch { properties: Vec<VolumePropertyRef>, active_property: i32 },
    TransferFunction { function: Option<TransferFunction1D> },
    IsoSurface(f32),
    AlphaFunc(f32),
    SampleDensity(f32),
    Transparency(f32),
    MaximumIntensityProjection,
    Lighting,
}

impl VolumePropertyKind {
    pub fn type_tag(&self) -> i32 {
        match self {
            Self::Composite { .. } => tags::COMPOSITE_PROPERTY,
            Self::Switch { .. } => tags::SWITCH_PROPERTY,
            Self::TransferFunction { .. } => tags::TRANSFER_FUNCTION_PROPERTY,
            Self::IsoSurface(_) => tags::ISO_SURFACE_PROPERTY,
            Self::AlphaFunc(_) => tags::ALPHA_FUNC_PROPERTY,
            Self::SampleDensity(_) => tags::SAMPLE_DENSITY_PROPERTY,
            Self::Transparency(_) => tags::TRANSPARENCY_PROPERTY,
            Self::MaximumIntensityProjection => tags::MIP_PROPERTY,
            Self::Lighting => tags::LIGHTING_PROPERTY,
        }
    }

    /// Value of the scalar kinds.
    pub fn scalar(&self) -> Option<f32> {
        match self {
            Self::IsoSurface(v) | Self::AlphaFunc(v) | Self::SampleDensity(v) | Self::Transparency(v) => {
                Some(*v)
            }
            _ => None,
        }
    }
}
