//! Terrain layers and locators.

use std::sync::Arc;

use super::{ImageRef, LayerRef, LocatorRef, ObjectData, ShapeRef};
use crate::stream::tags;
use crate::util::DMat4;

/// Coordinate system a locator maps into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum CoordinateSystemType {
    #[default]
    Geocentric = 0,
    Geographic = 1,
    Projected = 2,
}

impl CoordinateSystemType {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::Geocentric),
            1 => Some(Self::Geographic),
            2 => Some(Self::Projected),
            _ => None,
        }
    }
}

/// Maps a layer's local coordinates onto the world.
#[derive(Clone, Debug)]
pub struct Locator {
    pub object: ObjectData,
    pub coordinate_system_type: CoordinateSystemType,
    pub format: String,
    pub coordinate_system: String,
    pub equatorial_radius: f64,
    pub polar_radius: f64,
    pub transform: DMat4,
    pub define_as: bool,
    pub transform_scaled_by_resolution: bool,
}

impl Default for Locator {
    fn default() -> Self {
        Self {
            object: ObjectData::default(),
            coordinate_system_type: CoordinateSystemType::Geocentric,
            format: String::new(),
            coordinate_system: String::new(),
            // WGS84
            equatorial_radius: 6_378_137.0,
            polar_radius: 6_356_752.314_245_179,
            transform: DMat4::IDENTITY,
            define_as: true,
            transform_scaled_by_resolution: false,
        }
    }
}

/// Child slot of a composite layer: a file name, an inline layer, or both.
#[derive(Clone, Debug)]
pub struct CompositeEntry<T> {
    pub file_name: String,
    pub layer: Option<Arc<T>>,
}

impl<T> CompositeEntry<T> {
    pub fn inline(layer: Arc<T>) -> Self {
        Self { file_name: String::new(), layer: Some(layer) }
    }

    pub fn file(file_name: impl Into<String>) -> Self {
        Self { file_name: file_name.into(), layer: None }
    }
}

/// A terrain data layer.
#[derive(Clone, Debug)]
pub struct Layer {
    pub object: ObjectData,
    pub file_name: String,
    pub locator: Option<LocatorRef>,
    pub min_level: u32,
    pub max_level: u32,
    pub min_filter: u32,
    pub mag_filter: u32,
    pub kind: LayerKind,
}

impl Layer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            object: ObjectData::default(),
            file_name: String::new(),
            locator: None,
            min_level: 0,
            max_level: u32::MAX,
            min_filter: super::gl::GL_LINEAR_MIPMAP_LINEAR,
            mag_filter: super::gl::GL_LINEAR,
            kind,
        }
    }
}

/// Concrete layer types.
#[derive(Clone, Debug)]
pub enum LayerKind {
    Image { image: Option<ImageRef> },
    /// `height_field` must be a [`super::ShapeKind::HeightField`].
    HeightField { height_field: Option<ShapeRef> },
    Composite { layers: Vec<CompositeEntry<Layer>> },
    Switch { layers: Vec<CompositeEntry<Layer>>, active_layer: i32 },
    /// Layer loaded on demand from `file_name`.
    Proxy,
}

impl LayerKind {
    pub fn type_tag(&self) -> i32 {
        match self {
            Self::Image { .. } => tags::IMAGE_LAYER,
            Self::HeightField { .. } => tags::HEIGHT_FIELD_LAYER,
            Self::Composite { .. } => tags::COMPOSITE_LAYER,
            Self::Switch { .. } => tags::SWITCH_LAYER,
            Self::Proxy => tags::PROXY_LAYER,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Image { .. } => "ImageLayer",
            Self::HeightField { .. } => "HeightFieldLayer",
            Self::Composite { .. } => "CompositeLayer",
            Self::Switch { .. } => "SwitchLayer",
            Self::Proxy => "ProxyLayer",
        }
    }
}

/// Convenience for tile builders.
pub fn image_layer(image: ImageRef, locator: Option<LocatorRef>) -> LayerRef {
    let mut layer = Layer::new(LayerKind::Image { image: Some(image) });
    layer.locator = locator;
    Arc::new(layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Image;

    #[test]
    fn test_image_layer() {
        let img = Arc::new(Image::empty("a.png"));
        let layer = image_layer(img.clone(), None);
        match &layer.kind {
            LayerKind::Image { image: Some(i) } => assert!(Arc::ptr_eq(i, &img)),
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(layer.kind.type_tag(), tags::IMAGE_LAYER);
    }
}
