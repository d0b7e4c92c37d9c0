//! In-memory scene model carried by the IVE codec.
//!
//! The model describes the serialized shape of every concrete scene type and
//! nothing more: plain data structs, with shared sub-objects held through
//! `Arc` handles. Sharing is identity: two fields holding clones of the same
//! `Arc` refer to one object, which the codec writes once.
//!
//! Each polymorphic category is a struct carrying the fields common to the
//! category plus a `kind` enum with one variant per concrete type. The kind
//! enums expose `type_tag()`, the tag the codec writes for the variant.

pub mod gl;
mod drawable;
mod image;
mod node;
mod shape;
mod state;
mod terrain;
mod volume;

use std::sync::Arc;

pub use drawable::*;
pub use image::*;
pub use node::*;
pub use shape::*;
pub use state::*;
pub use terrain::*;
pub use volume::*;

/// Shared node handle.
pub type NodeRef = Arc<Node>;
/// Shared state set handle.
pub type StateSetRef = Arc<StateSet>;
/// Shared state attribute handle.
pub type StateAttributeRef = Arc<StateAttribute>;
/// Shared uniform handle.
pub type UniformRef = Arc<Uniform>;
/// Shared shader handle.
pub type ShaderRef = Arc<Shader>;
/// Shared drawable handle.
pub type DrawableRef = Arc<Drawable>;
/// Shared shape handle.
pub type ShapeRef = Arc<Shape>;
/// Shared image handle.
pub type ImageRef = Arc<Image>;
/// Shared terrain layer handle.
pub type LayerRef = Arc<Layer>;
/// Shared terrain locator handle.
pub type LocatorRef = Arc<Locator>;
/// Shared volume layer handle.
pub type VolumeLayerRef = Arc<VolumeLayer>;
/// Shared volume locator handle.
pub type VolumeLocatorRef = Arc<VolumeLocator>;
/// Shared volume property handle.
pub type VolumePropertyRef = Arc<VolumeProperty>;

/// How often an object is expected to change after loading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataVariance {
    Dynamic = 0,
    Static = 1,
    #[default]
    Unspecified = 2,
}

impl DataVariance {
    /// Convert from the stream byte.
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Dynamic),
            1 => Some(Self::Static),
            2 => Some(Self::Unspecified),
            _ => None,
        }
    }
}

/// Fields every serializable object carries.
#[derive(Clone, Debug, Default)]
pub struct ObjectData {
    /// Object name (may be empty).
    pub name: String,
    pub data_variance: DataVariance,
    /// Optional user payload of arbitrary category.
    pub user_data: Option<UserData>,
}

impl ObjectData {
    /// Create object data with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// User data is compared by category only.
impl PartialEq for ObjectData {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.data_variance == other.data_variance
            && self.user_data.as_ref().map(UserData::category)
                == other.user_data.as_ref().map(UserData::category)
    }
}

/// User payload attached to an object.
///
/// The format can carry nodes, state, drawables and shape attribute lists.
/// Anything else is represented by [`UserData::Unsupported`] and is dropped
/// on write.
#[derive(Clone, Debug)]
pub enum UserData {
    Node(NodeRef),
    StateSet(StateSetRef),
    StateAttribute(StateAttributeRef),
    Drawable(DrawableRef),
    ShapeAttributes(Arc<ShapeAttributeList>),
    /// An object of a category the format cannot encode.
    Unsupported { class_name: String },
}

impl UserData {
    /// Human readable category name.
    pub fn category(&self) -> &str {
        match self {
            Self::Node(_) => "Node",
            Self::StateSet(_) => "StateSet",
            Self::StateAttribute(_) => "StateAttribute",
            Self::Drawable(_) => "Drawable",
            Self::ShapeAttributes(_) => "ShapeAttributeList",
            Self::Unsupported { class_name } => class_name,
        }
    }
}

/// Value of a single shape attribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ShapeAttributeValue {
    #[default]
    Unknown,
    Integer(i32),
    Double(f64),
    String(String),
}

/// Named attribute, as attached to imported GIS shapes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeAttribute {
    pub name: String,
    pub value: ShapeAttributeValue,
}

impl ShapeAttribute {
    pub fn new(name: impl Into<String>, value: ShapeAttributeValue) -> Self {
        Self { name: name.into(), value }
    }
}

/// List of named attributes.
#[derive(Clone, Debug, Default)]
pub struct ShapeAttributeList {
    pub object: ObjectData,
    pub attributes: Vec<ShapeAttribute>,
}

/// Check two optional handles for identity.
pub fn same_ref<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_variance_from_u8() {
        assert_eq!(DataVariance::from_u8(0), Some(DataVariance::Dynamic));
        assert_eq!(DataVariance::from_u8(2), Some(DataVariance::Unspecified));
        assert_eq!(DataVariance::from_u8(7), None);
    }

    #[test]
    fn test_same_ref() {
        let a = Arc::new(1);
        let b = Arc::new(1);
        assert!(same_ref(&Some(a.clone()), &Some(a.clone())));
        assert!(!same_ref(&Some(a.clone()), &Some(b)));
        assert!(same_ref::<i32>(&None, &None));
        assert!(!same_ref(&Some(a), &None));
    }
}
