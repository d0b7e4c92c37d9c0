//! Scene-graph nodes.

use super::{
    DrawableRef, ImageRef, LayerRef, LocatorRef, NodeRef, ObjectData, StateAttributeRef,
    StateSetRef, VolumeLayerRef, VolumeLocatorRef,
};
use crate::stream::tags;
use crate::util::{BoundingSphere, DMat4, DQuat, DVec3, Vec3, Vec4};

/// Fields common to every node.
#[derive(Clone, Debug)]
pub struct NodeData {
    pub descriptions: Vec<String>,
    pub node_mask: u32,
    pub culling_active: bool,
    /// Bound supplied by the application, if any.
    pub initial_bound: Option<BoundingSphere>,
    pub state_set: Option<StateSetRef>,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            descriptions: Vec::new(),
            node_mask: 0xffff_ffff,
            culling_active: true,
            initial_bound: None,
            state_set: None,
        }
    }
}

/// A scene-graph node.
#[derive(Clone, Debug, Default)]
pub struct Node {
    pub object: ObjectData,
    pub core: NodeData,
    pub kind: NodeKind,
}

impl Node {
    /// Create a node of the given kind.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            object: ObjectData::named(name),
            core: NodeData::default(),
            kind,
        }
    }

    /// Create a group node holding the children.
    pub fn group(name: impl Into<String>, children: Vec<NodeRef>) -> Self {
        Self::new(name, NodeKind::Group(Group { children }))
    }

    /// Create a geode holding the drawables.
    pub fn geode(name: impl Into<String>, drawables: Vec<DrawableRef>) -> Self {
        Self::new(name, NodeKind::Geode(Geode { drawables }))
    }

    /// Attach a state set.
    pub fn with_state_set(mut self, state_set: StateSetRef) -> Self {
        self.core.state_set = Some(state_set);
        self
    }

    /// Node name.
    pub fn name(&self) -> &str {
        &self.object.name
    }

    /// The group part of this node, for every kind that derives from Group.
    pub fn as_group(&self) -> Option<&Group> {
        match &self.kind {
            NodeKind::Node | NodeKind::Geode(_) | NodeKind::Billboard(_) => None,
            NodeKind::Group(g) => Some(g),
            NodeKind::MatrixTransform(t) => Some(&t.group),
            NodeKind::PositionAttitudeTransform(t) => Some(&t.group),
            NodeKind::Switch(s) => Some(&s.group),
            NodeKind::Lod(l) => Some(&l.group),
            NodeKind::PagedLod(p) => Some(&p.lod.group),
            NodeKind::ProxyNode(p) => Some(&p.group),
            NodeKind::LightSource(l) => Some(&l.group),
            NodeKind::ClipNode(c) => Some(&c.group),
            NodeKind::Sequence(s) => Some(&s.group),
            NodeKind::TerrainTile(t) => Some(&t.group),
            NodeKind::VolumeTile(v) => Some(&v.group),
            NodeKind::AnisotropicLighting(a) => Some(&a.effect.group),
            NodeKind::SpecularHighlights(s) => Some(&s.effect.group),
        }
    }

    /// Children of this node (empty for leaves).
    pub fn children(&self) -> &[NodeRef] {
        self.as_group().map(|g| g.children.as_slice()).unwrap_or(&[])
    }

    /// Drawables held by a geode or billboard.
    pub fn drawables(&self) -> &[DrawableRef] {
        match &self.kind {
            NodeKind::Geode(g) => &g.drawables,
            NodeKind::Billboard(b) => &b.geode.drawables,
            _ => &[],
        }
    }
}

/// Concrete node types.
#[derive(Clone, Debug, Default)]
pub enum NodeKind {
    /// Plain leaf node.
    #[default]
    Node,
    Group(Group),
    MatrixTransform(MatrixTransform),
    PositionAttitudeTransform(PositionAttitudeTransform),
    Switch(Switch),
    Lod(Lod),
    PagedLod(PagedLod),
    ProxyNode(ProxyNode),
    Geode(Geode),
    Billboard(Billboard),
    LightSource(LightSource),
    ClipNode(ClipNode),
    Sequence(Sequence),
    TerrainTile(TerrainTile),
    VolumeTile(VolumeTile),
    AnisotropicLighting(AnisotropicLighting),
    SpecularHighlights(SpecularHighlights),
}

impl NodeKind {
    /// Tag written for this concrete type.
    pub fn type_tag(&self) -> i32 {
        match self {
            Self::Node => tags::NODE,
            Self::Group(_) => tags::GROUP,
            Self::MatrixTransform(_) => tags::MATRIX_TRANSFORM,
            Self::PositionAttitudeTransform(_) => tags::POSITION_ATTITUDE_TRANSFORM,
            Self::Switch(_) => tags::SWITCH,
            Self::Lod(_) => tags::LOD,
            Self::PagedLod(_) => tags::PAGED_LOD,
            Self::ProxyNode(_) => tags::PROXY_NODE,
            Self::Geode(_) => tags::GEODE,
            Self::Billboard(_) => tags::BILLBOARD,
            Self::LightSource(_) => tags::LIGHT_SOURCE,
            Self::ClipNode(_) => tags::CLIP_NODE,
            Self::Sequence(_) => tags::SEQUENCE,
            Self::TerrainTile(_) => tags::TERRAIN_TILE,
            Self::VolumeTile(_) => tags::VOLUME_TILE,
            Self::AnisotropicLighting(_) => tags::ANISOTROPIC_LIGHTING,
            Self::SpecularHighlights(_) => tags::SPECULAR_HIGHLIGHTS,
        }
    }

    /// Class name, as used in diagnostics.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Node => "Node",
            Self::Group(_) => "Group",
            Self::MatrixTransform(_) => "MatrixTransform",
            Self::PositionAttitudeTransform(_) => "PositionAttitudeTransform",
            Self::Switch(_) => "Switch",
            Self::Lod(_) => "LOD",
            Self::PagedLod(_) => "PagedLOD",
            Self::ProxyNode(_) => "ProxyNode",
            Self::Geode(_) => "Geode",
            Self::Billboard(_) => "Billboard",
            Self::LightSource(_) => "LightSource",
            Self::ClipNode(_) => "ClipNode",
            Self::Sequence(_) => "Sequence",
            Self::TerrainTile(_) => "TerrainTile",
            Self::VolumeTile(_) => "VolumeTile",
            Self::AnisotropicLighting(_) => "AnisotropicLighting",
            Self::SpecularHighlights(_) => "SpecularHighlights",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Group {
    pub children: Vec<NodeRef>,
}

/// Coordinate frame a transform is expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum ReferenceFrame {
    #[default]
    Relative = 0,
    Absolute = 1,
    AbsoluteRelativeToParent = 2,
}

impl ReferenceFrame {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::Relative),
            1 => Some(Self::Absolute),
            2 => Some(Self::AbsoluteRelativeToParent),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MatrixTransform {
    pub group: Group,
    pub reference_frame: ReferenceFrame,
    pub matrix: DMat4,
}

impl Default for MatrixTransform {
    fn default() -> Self {
        Self {
            group: Group::default(),
            reference_frame: ReferenceFrame::Relative,
            matrix: DMat4::IDENTITY,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PositionAttitudeTransform {
    pub group: Group,
    pub reference_frame: ReferenceFrame,
    pub position: DVec3,
    pub attitude: DQuat,
    pub scale: DVec3,
    pub pivot_point: DVec3,
}

impl Default for PositionAttitudeTransform {
    fn default() -> Self {
        Self {
            group: Group::default(),
            reference_frame: ReferenceFrame::Relative,
            position: DVec3::ZERO,
            attitude: DQuat::IDENTITY,
            scale: DVec3::ONE,
            pivot_point: DVec3::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Switch {
    pub group: Group,
    pub new_child_default_value: bool,
    /// One visibility flag per child.
    pub values: Vec<bool>,
}

impl Default for Switch {
    fn default() -> Self {
        Self {
            group: Group::default(),
            new_child_default_value: true,
            values: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum CenterMode {
    #[default]
    UseBoundingSphereCenter = 0,
    UserDefinedCenter = 1,
    UnionOfBoundingSphereAndUserDefined = 2,
}

impl CenterMode {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::UseBoundingSphereCenter),
            1 => Some(Self::UserDefinedCenter),
            2 => Some(Self::UnionOfBoundingSphereAndUserDefined),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum RangeMode {
    #[default]
    DistanceFromEyePoint = 0,
    PixelSizeOnScreen = 1,
}

impl RangeMode {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::DistanceFromEyePoint),
            1 => Some(Self::PixelSizeOnScreen),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Lod {
    pub group: Group,
    pub center_mode: CenterMode,
    pub user_center: DVec3,
    pub radius: f64,
    pub range_mode: RangeMode,
    /// `(min, max)` visibility range per child.
    pub ranges: Vec<(f32, f32)>,
}

/// Per-range external file of a paged LOD.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PagedLodFile {
    pub file_name: String,
    pub priority_offset: f32,
    pub priority_scale: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PagedLod {
    pub lod: Lod,
    pub database_path: String,
    pub num_children_that_cannot_be_expired: u32,
    pub files: Vec<PagedLodFile>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum LoadingExternalReferenceMode {
    #[default]
    LoadImmediately = 0,
    DeferLoadingToDatabasePager = 1,
    NoAutomaticLoading = 2,
}

impl LoadingExternalReferenceMode {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::LoadImmediately),
            1 => Some(Self::DeferLoadingToDatabasePager),
            2 => Some(Self::NoAutomaticLoading),
            _ => None,
        }
    }
}

/// Node whose children live in external files.
///
/// `file_names[i]` names the file child slot `i` is loaded from (empty for
/// children that are held inline).
#[derive(Clone, Debug, Default)]
pub struct ProxyNode {
    pub group: Group,
    pub center_mode: CenterMode,
    pub user_center: DVec3,
    pub radius: f64,
    pub loading_mode: LoadingExternalReferenceMode,
    pub database_path: String,
    pub file_names: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Geode {
    pub drawables: Vec<DrawableRef>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum BillboardMode {
    PointRotEye = 0,
    PointRotWorld = 1,
    #[default]
    AxialRot = 2,
}

impl BillboardMode {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::PointRotEye),
            1 => Some(Self::PointRotWorld),
            2 => Some(Self::AxialRot),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Billboard {
    pub geode: Geode,
    pub mode: BillboardMode,
    pub axis: Vec3,
    pub normal: Vec3,
    /// One position per drawable.
    pub positions: Vec<Vec3>,
}

impl Default for Billboard {
    fn default() -> Self {
        Self {
            geode: Geode::default(),
            mode: BillboardMode::AxialRot,
            axis: Vec3::Z,
            normal: Vec3::NEG_Y,
            positions: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LightSource {
    pub group: Group,
    pub reference_frame: ReferenceFrame,
    /// Must be a [`super::StateAttributeKind::Light`].
    pub light: Option<StateAttributeRef>,
}

#[derive(Clone, Debug, Default)]
pub struct ClipNode {
    pub group: Group,
    pub reference_frame: ReferenceFrame,
    /// Each entry must be a [`super::StateAttributeKind::ClipPlane`].
    pub clip_planes: Vec<StateAttributeRef>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum LoopMode {
    #[default]
    Loop = 0,
    Swing = 1,
}

impl LoopMode {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::Loop),
            1 => Some(Self::Swing),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum SequenceMode {
    #[default]
    Start = 0,
    Stop = 1,
    Pause = 2,
    Resume = 3,
}

impl SequenceMode {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::Start),
            1 => Some(Self::Stop),
            2 => Some(Self::Pause),
            3 => Some(Self::Resume),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sequence {
    pub group: Group,
    /// Display time per child, in seconds.
    pub times: Vec<f64>,
    pub loop_mode: LoopMode,
    pub begin: i32,
    pub end: i32,
    pub speed: f32,
    pub num_repeats: i32,
    pub mode: SequenceMode,
}

impl Default for Sequence {
    fn default() -> Self {
        Self {
            group: Group::default(),
            times: Vec::new(),
            loop_mode: LoopMode::Loop,
            begin: 0,
            end: -1,
            speed: 1.0,
            num_repeats: -1,
            mode: SequenceMode::Start,
        }
    }
}

/// Terrain tile key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileId {
    pub level: i32,
    pub x: i32,
    pub y: i32,
}

impl Default for TileId {
    fn default() -> Self {
        Self { level: -1, x: -1, y: -1 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum BlendingPolicy {
    #[default]
    Inherit = 0,
    DoNotSetBlending = 1,
    EnableBlending = 2,
    EnableBlendingWhenAlphaPresent = 3,
}

impl BlendingPolicy {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::Inherit),
            1 => Some(Self::DoNotSetBlending),
            2 => Some(Self::EnableBlending),
            3 => Some(Self::EnableBlendingWhenAlphaPresent),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TerrainTile {
    pub group: Group,
    pub tile_id: TileId,
    pub locator: Option<LocatorRef>,
    pub elevation_layer: Option<LayerRef>,
    /// Colour layers by unit; `None` for unused units.
    pub color_layers: Vec<Option<LayerRef>>,
    pub requires_normals: bool,
    pub treat_boundaries_to_valid_data_as_default_value: bool,
    pub blending_policy: BlendingPolicy,
}

#[derive(Clone, Debug, Default)]
pub struct VolumeTile {
    pub group: Group,
    pub tile_id: TileId,
    pub locator: Option<VolumeLocatorRef>,
    pub layer: Option<VolumeLayerRef>,
}

/// Fields shared by special-effect nodes.
#[derive(Clone, Debug)]
pub struct Effect {
    pub group: Group,
    pub enabled: bool,
    /// Technique index, or -1 for automatic selection.
    pub selected_technique: i32,
}

impl Default for Effect {
    fn default() -> Self {
        Self {
            group: Group::default(),
            enabled: true,
            selected_technique: -1,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AnisotropicLighting {
    pub effect: Effect,
    pub light_number: i32,
    /// Lighting lookup map.
    pub lighting_map: Option<ImageRef>,
}

#[derive(Clone, Debug)]
pub struct SpecularHighlights {
    pub effect: Effect,
    pub light_number: i32,
    pub texture_unit: i32,
    pub specular_color: Vec4,
    pub specular_exponent: f32,
}

impl Default for SpecularHighlights {
    fn default() -> Self {
        Self {
            effect: Effect::default(),
            light_number: 0,
            texture_unit: 0,
            specular_color: Vec4::ONE,
            specular_exponent: 16.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_group_children() {
        let leaf = Arc::new(Node::new("leaf", NodeKind::Node));
        let group = Node::group("root", vec![leaf.clone(), leaf.clone()]);
        assert_eq!(group.children().len(), 2);
        assert!(Arc::ptr_eq(&group.children()[0], &group.children()[1]));
        assert!(leaf.children().is_empty());
    }

    #[test]
    fn test_type_tags_are_distinct() {
        let kinds = [
            NodeKind::Node,
            NodeKind::Group(Group::default()),
            NodeKind::MatrixTransform(MatrixTransform::default()),
            NodeKind::Lod(Lod::default()),
            NodeKind::PagedLod(PagedLod::default()),
            NodeKind::AnisotropicLighting(AnisotropicLighting::default()),
            NodeKind::SpecularHighlights(SpecularHighlights::default()),
        ];
        let mut tags: Vec<i32> = kinds.iter().map(NodeKind::type_tag).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), kinds.len());
    }

    #[test]
    fn test_default_node_data() {
        let n = Node::default();
        assert_eq!(n.core.node_mask, 0xffff_ffff);
        assert!(n.core.culling_active);
        assert_eq!(n.kind.class_name(), "Node");
    }
}
