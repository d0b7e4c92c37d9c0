//! Render state: state sets, state attributes, uniforms and shaders.

use super::gl;
use super::{ImageRef, ObjectData, ShaderRef, StateAttributeRef, UniformRef};
use crate::stream::tags;
use crate::util::{DMat4, Mat4, Plane, Vec3, Vec4};

/// How a state set is sorted into render bins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum RenderBinMode {
    #[default]
    Inherit = 0,
    Use = 1,
    Override = 2,
    ProtectedOverride = 3,
}

impl RenderBinMode {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::Inherit),
            1 => Some(Self::Use),
            2 => Some(Self::Override),
            3 => Some(Self::ProtectedOverride),
            _ => None,
        }
    }
}

/// GL mode with its override value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeValue {
    pub mode: u32,
    pub value: u32,
}

/// Attribute reference with its override value.
#[derive(Clone, Debug)]
pub struct AttributeValue {
    pub attribute: StateAttributeRef,
    pub value: u32,
}

/// Uniform reference with its override value.
#[derive(Clone, Debug)]
pub struct UniformValue {
    pub uniform: UniformRef,
    pub value: u32,
}

/// A bundle of render state applied to a subgraph or drawable.
#[derive(Clone, Debug, Default)]
pub struct StateSet {
    pub object: ObjectData,
    pub render_hint: i32,
    pub render_bin_mode: RenderBinMode,
    pub bin_number: i32,
    pub bin_name: String,
    pub nest_render_bins: bool,
    pub modes: Vec<ModeValue>,
    pub attributes: Vec<AttributeValue>,
    /// Texture modes per texture unit.
    pub texture_modes: Vec<Vec<ModeValue>>,
    /// Texture attributes per texture unit.
    pub texture_attributes: Vec<Vec<AttributeValue>>,
    pub uniforms: Vec<UniformValue>,
}

impl StateSet {
    /// Set a GL mode.
    pub fn set_mode(&mut self, mode: u32, value: u32) {
        match self.modes.iter_mut().find(|m| m.mode == mode) {
            Some(m) => m.value = value,
            None => self.modes.push(ModeValue { mode, value }),
        }
    }

    /// Add an attribute with the ON value.
    pub fn add_attribute(&mut self, attribute: StateAttributeRef) {
        self.attributes.push(AttributeValue { attribute, value: gl::ON });
    }

    /// Add a texture attribute on a unit, growing the unit list as needed.
    pub fn add_texture_attribute(&mut self, unit: usize, attribute: StateAttributeRef) {
        if self.texture_attributes.len() <= unit {
            self.texture_attributes.resize_with(unit + 1, Vec::new);
        }
        self.texture_attributes[unit].push(AttributeValue { attribute, value: gl::ON });
    }

    /// Add a uniform with the ON value.
    pub fn add_uniform(&mut self, uniform: UniformRef) {
        self.uniforms.push(UniformValue { uniform, value: gl::ON });
    }
}

/// A typed piece of render state.
#[derive(Clone, Debug)]
pub struct StateAttribute {
    pub object: ObjectData,
    pub kind: StateAttributeKind,
}

impl StateAttribute {
    pub fn new(kind: StateAttributeKind) -> Self {
        Self { object: ObjectData::default(), kind }
    }
}

/// Concrete state attribute types.
#[derive(Clone, Debug)]
pub enum StateAttributeKind {
    AlphaFunc(AlphaFunc),
    BlendColor(BlendColor),
    BlendEquation(BlendEquation),
    BlendFunc(BlendFunc),
    ClipPlane(ClipPlane),
    CullFace(CullFace),
    Depth(Depth),
    Fog(Fog),
    FrontFace(FrontFace),
    Light(Light),
    LightModel(LightModel),
    LineWidth(LineWidth),
    Material(Material),
    Point(Point),
    PolygonMode(PolygonMode),
    PolygonOffset(PolygonOffset),
    Program(Program),
    Scissor(Scissor),
    ShadeModel(ShadeModel),
    TexEnv(TexEnv),
    TexGen(TexGen),
    TexMat(TexMat),
    Texture1D(Texture1D),
    Texture2D(Texture2D),
    Texture3D(Texture3D),
    TextureCubeMap(TextureCubeMap),
    Viewport(Viewport),
}

impl StateAttributeKind {
    /// Tag written for this concrete type.
    pub fn type_tag(&self) -> i32 {
        match self {
            Self::AlphaFunc(_) => tags::ALPHA_FUNC,
            Self::BlendColor(_) => tags::BLEND_COLOR,
            Self::BlendEquation(_) => tags::BLEND_EQUATION,
            Self::BlendFunc(_) => tags::BLEND_FUNC,
            Self::ClipPlane(_) => tags::CLIP_PLANE,
            Self::CullFace(_) => tags::CULL_FACE,
            Self::Depth(_) => tags::DEPTH,
            Self::Fog(_) => tags::FOG,
            Self::FrontFace(_) => tags::FRONT_FACE,
            Self::Light(_) => tags::LIGHT,
            Self::LightModel(_) => tags::LIGHT_MODEL,
            Self::LineWidth(_) => tags::LINE_WIDTH,
            Self::Material(_) => tags::MATERIAL,
            Self::Point(_) => tags::POINT,
            Self::PolygonMode(_) => tags::POLYGON_MODE,
            Self::PolygonOffset(_) => tags::POLYGON_OFFSET,
            Self::Program(_) => tags::PROGRAM,
            Self::Scissor(_) => tags::SCISSOR,
            Self::ShadeModel(_) => tags::SHADE_MODEL,
            Self::TexEnv(_) => tags::TEX_ENV,
            Self::TexGen(_) => tags::TEX_GEN,
            Self::TexMat(_) => tags::TEX_MAT,
            Self::Texture1D(_) => tags::TEXTURE_1D,
            Self::Texture2D(_) => tags::TEXTURE_2D,
            Self::Texture3D(_) => tags::TEXTURE_3D,
            Self::TextureCubeMap(_) => tags::TEXTURE_CUBE_MAP,
            Self::Viewport(_) => tags::VIEWPORT,
        }
    }

    /// Class name, as used in diagnostics.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::AlphaFunc(_) => "AlphaFunc",
            Self::BlendColor(_) => "BlendColor",
            Self::BlendEquation(_) => "BlendEquation",
            Self::BlendFunc(_) => "BlendFunc",
            Self::ClipPlane(_) => "ClipPlane",
            Self::CullFace(_) => "CullFace",
            Self::Depth(_) => "Depth",
            Self::Fog(_) => "Fog",
            Self::FrontFace(_) => "FrontFace",
            Self::Light(_) => "Light",
            Self::LightModel(_) => "LightModel",
            Self::LineWidth(_) => "LineWidth",
            Self::Material(_) => "Material",
            Self::Point(_) => "Point",
            Self::PolygonMode(_) => "PolygonMode",
            Self::PolygonOffset(_) => "PolygonOffset",
            Self::Program(_) => "Program",
            Self::Scissor(_) => "Scissor",
            Self::ShadeModel(_) => "ShadeModel",
            Self::TexEnv(_) => "TexEnv",
            Self::TexGen(_) => "TexGen",
            Self::TexMat(_) => "TexMat",
            Self::Texture1D(_) => "Texture1D",
            Self::Texture2D(_) => "Texture2D",
            Self::Texture3D(_) => "Texture3D",
            Self::TextureCubeMap(_) => "TextureCubeMap",
            Self::Viewport(_) => "Viewport",
        }
    }

    /// Texture fields, for the texture kinds.
    pub fn texture(&self) -> Option<&TextureData> {
        match self {
            Self::Texture1D(t) => Some(&t.texture),
            Self::Texture2D(t) => Some(&t.texture),
            Self::Texture3D(t) => Some(&t.texture),
            Self::TextureCubeMap(t) => Some(&t.texture),
            _ => None,
        }
    }

    /// Images held by a texture, in slot order.
    pub fn images(&self) -> Vec<&ImageRef> {
        match self {
            Self::Texture1D(t) => t.image.iter().collect(),
            Self::Texture2D(t) => t.image.iter().collect(),
            Self::Texture3D(t) => t.image.iter().collect(),
            Self::TextureCubeMap(t) => t.images.iter().flatten().collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlphaFunc {
    pub function: u32,
    pub reference_value: f32,
}

impl Default for AlphaFunc {
    fn default() -> Self {
        Self { function: gl::GL_ALWAYS, reference_value: 1.0 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BlendColor {
    pub constant_color: Vec4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendEquation {
    pub equation_rgb: u32,
    pub equation_alpha: u32,
}

impl Default for BlendEquation {
    fn default() -> Self {
        Self { equation_rgb: gl::GL_FUNC_ADD, equation_alpha: gl::GL_FUNC_ADD }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendFunc {
    pub source_rgb: u32,
    pub destination_rgb: u32,
    pub source_alpha: u32,
    pub destination_alpha: u32,
}

impl Default for BlendFunc {
    fn default() -> Self {
        Self {
            source_rgb: gl::GL_SRC_ALPHA,
            destination_rgb: gl::GL_ONE_MINUS_SRC_ALPHA,
            source_alpha: gl::GL_SRC_ALPHA,
            destination_alpha: gl::GL_ONE_MINUS_SRC_ALPHA,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClipPlane {
    pub plane: Plane,
    pub plane_number: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CullFace {
    pub mode: u32,
}

impl Default for CullFace {
    fn default() -> Self {
        Self { mode: gl::GL_BACK }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Depth {
    pub function: u32,
    pub z_near: f64,
    pub z_far: f64,
    pub write_mask: bool,
}

impl Default for Depth {
    fn default() -> Self {
        Self { function: gl::GL_LESS, z_near: 0.0, z_far: 1.0, write_mask: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub mode: u32,
    pub density: f32,
    pub start: f32,
    pub end: f32,
    pub color: Vec4,
    pub fog_coordinate_source: u32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            mode: gl::GL_EXP,
            density: 1.0,
            start: 0.0,
            end: 1.0,
            color: Vec4::ZERO,
            fog_coordinate_source: 0x8452, // GL_FRAGMENT_DEPTH
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontFace {
    pub mode: u32,
}

impl Default for FrontFace {
    fn default() -> Self {
        Self { mode: gl::GL_CCW }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub light_number: i32,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub position: Vec4,
    pub direction: Vec3,
    pub constant_attenuation: f32,
    pub linear_attenuation: f32,
    pub quadratic_attenuation: f32,
    pub spot_exponent: f32,
    pub spot_cutoff: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            light_number: 0,
            ambient: Vec4::new(0.05, 0.05, 0.05, 1.0),
            diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
            specular: Vec4::new(0.05, 0.05, 0.05, 1.0),
            position: Vec4::new(0.0, 0.0, 1.0, 0.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
            constant_attenuation: 1.0,
            linear_attenuation: 0.0,
            quadratic_attenuation: 0.0,
            spot_exponent: 0.0,
            spot_cutoff: 180.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightModel {
    pub ambient_intensity: Vec4,
    pub color_control: u32,
    pub local_viewer: bool,
    pub two_sided: bool,
}

impl Default for LightModel {
    fn default() -> Self {
        Self {
            ambient_intensity: Vec4::new(0.2, 0.2, 0.2, 1.0),
            color_control: 0x81F9, // GL_SINGLE_COLOR
            local_viewer: false,
            two_sided: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineWidth {
    pub width: f32,
}

impl Default for LineWidth {
    fn default() -> Self {
        Self { width: 1.0 }
    }
}

/// Which material colour tracks the vertex colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum ColorMode {
    Ambient = 0x1200,
    Diffuse = 0x1201,
    Specular = 0x1202,
    Emission = 0x1600,
    AmbientAndDiffuse = 0x1602,
    #[default]
    Off = 0,
}

impl ColorMode {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0x1200 => Some(Self::Ambient),
            0x1201 => Some(Self::Diffuse),
            0x1202 => Some(Self::Specular),
            0x1600 => Some(Self::Emission),
            0x1602 => Some(Self::AmbientAndDiffuse),
            0 => Some(Self::Off),
            _ => None,
        }
    }
}

/// Front and back value of a material property.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrontBack<T> {
    pub front_and_back: bool,
    pub front: T,
    pub back: T,
}

impl<T: Copy> FrontBack<T> {
    pub fn both(value: T) -> Self {
        Self { front_and_back: true, front: value, back: value }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub color_mode: ColorMode,
    pub ambient: FrontBack<Vec4>,
    pub diffuse: FrontBack<Vec4>,
    pub specular: FrontBack<Vec4>,
    pub emission: FrontBack<Vec4>,
    pub shininess: FrontBack<f32>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Off,
            ambient: FrontBack::both(Vec4::new(0.2, 0.2, 0.2, 1.0)),
            diffuse: FrontBack::both(Vec4::new(0.8, 0.8, 0.8, 1.0)),
            specular: FrontBack::both(Vec4::new(0.0, 0.0, 0.0, 1.0)),
            emission: FrontBack::both(Vec4::new(0.0, 0.0, 0.0, 1.0)),
            shininess: FrontBack::both(0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub size: f32,
    pub fade_threshold_size: f32,
    pub distance_attenuation: Vec3,
    pub min_size: f32,
    pub max_size: f32,
}

impl Default for Point {
    fn default() -> Self {
        Self {
            size: 1.0,
            fade_threshold_size: 1.0,
            distance_attenuation: Vec3::new(1.0, 0.0, 0.0),
            min_size: 0.0,
            max_size: 100.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolygonMode {
    pub front: u32,
    pub back: u32,
}

impl Default for PolygonMode {
    fn default() -> Self {
        Self { front: gl::GL_FILL, back: gl::GL_FILL }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PolygonOffset {
    pub factor: f32,
    pub units: f32,
}

/// Vertex attribute name bound to a location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttribBinding {
    pub name: String,
    pub index: u32,
}

#[derive(Clone, Debug)]
pub struct Program {
    pub attrib_bindings: Vec<AttribBinding>,
    pub frag_data_bindings: Vec<AttribBinding>,
    pub shaders: Vec<ShaderRef>,
    pub geometry_vertices_out: i32,
    pub geometry_input_type: u32,
    pub geometry_output_type: u32,
}

impl Default for Program {
    fn default() -> Self {
        Self {
            attrib_bindings: Vec::new(),
            frag_data_bindings: Vec::new(),
            shaders: Vec::new(),
            geometry_vertices_out: 1,
            geometry_input_type: gl::GL_TRIANGLES,
            geometry_output_type: gl::GL_TRIANGLE_STRIP,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scissor {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadeModel {
    pub mode: u32,
}

impl Default for ShadeModel {
    fn default() -> Self {
        Self { mode: gl::GL_SMOOTH }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexEnv {
    pub mode: u32,
    pub color: Vec4,
}

impl Default for TexEnv {
    fn default() -> Self {
        Self { mode: gl::GL_MODULATE, color: Vec4::ZERO }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum TexGenMode {
    #[default]
    ObjectLinear = 0x2401,
    EyeLinear = 0x2400,
    SphereMap = 0x2402,
    NormalMap = 0x8511,
    ReflectionMap = 0x8512,
}

impl TexGenMode {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0x2401 => Some(Self::ObjectLinear),
            0x2400 => Some(Self::EyeLinear),
            0x2402 => Some(Self::SphereMap),
            0x8511 => Some(Self::NormalMap),
            0x8512 => Some(Self::ReflectionMap),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexGen {
    pub mode: TexGenMode,
    pub plane_s: Plane,
    pub plane_t: Plane,
    pub plane_r: Plane,
    pub plane_q: Plane,
}

impl Default for TexGen {
    fn default() -> Self {
        Self {
            mode: TexGenMode::ObjectLinear,
            plane_s: Plane::new(1.0, 0.0, 0.0, 0.0),
            plane_t: Plane::new(0.0, 1.0, 0.0, 0.0),
            plane_r: Plane::new(0.0, 0.0, 1.0, 0.0),
            plane_q: Plane::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexMat {
    pub matrix: DMat4,
    pub scale_by_texture_rectangle_size: bool,
}

impl Default for TexMat {
    fn default() -> Self {
        Self { matrix: DMat4::IDENTITY, scale_by_texture_rectangle_size: false }
    }
}

/// Fields shared by all texture kinds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureData {
    pub wrap_s: u32,
    pub wrap_t: u32,
    pub wrap_r: u32,
    pub min_filter: u32,
    pub mag_filter: u32,
    pub max_anisotropy: f32,
    pub border_color: Vec4,
    pub border_width: i32,
    pub internal_format_mode: i32,
    pub internal_format: i32,
    pub use_hardware_mipmap_generation: bool,
    pub unref_image_data_after_apply: bool,
    pub resize_non_power_of_two_hint: bool,
}

impl Default for TextureData {
    fn default() -> Self {
        Self {
            wrap_s: gl::GL_CLAMP_TO_EDGE,
            wrap_t: gl::GL_CLAMP_TO_EDGE,
            wrap_r: gl::GL_CLAMP_TO_EDGE,
            min_filter: gl::GL_LINEAR_MIPMAP_LINEAR,
            mag_filter: gl::GL_LINEAR,
            max_anisotropy: 1.0,
            border_color: Vec4::ZERO,
            border_width: 0,
            internal_format_mode: 0,
            internal_format: 0,
            use_hardware_mipmap_generation: true,
            unref_image_data_after_apply: false,
            resize_non_power_of_two_hint: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Texture1D {
    pub texture: TextureData,
    pub image: Option<ImageRef>,
}

#[derive(Clone, Debug, Default)]
pub struct Texture2D {
    pub texture: TextureData,
    pub image: Option<ImageRef>,
}

#[derive(Clone, Debug, Default)]
pub struct Texture3D {
    pub texture: TextureData,
    pub image: Option<ImageRef>,
}

/// Cube map faces in stream order: +X, -X, +Y, -Y, +Z, -Z.
#[derive(Clone, Debug, Default)]
pub struct TextureCubeMap {
    pub texture: TextureData,
    pub images: [Option<ImageRef>; 6],
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Uniform value type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum UniformType {
    Float = 0x1406,
    FloatVec2 = 0x8B50,
    FloatVec3 = 0x8B51,
    FloatVec4 = 0x8B52,
    Int = 0x1404,
    IntVec2 = 0x8B53,
    IntVec3 = 0x8B54,
    IntVec4 = 0x8B55,
    Bool = 0x8B56,
    FloatMat4 = 0x8B5C,
    Sampler2D = 0x8B5E,
    #[default]
    Undefined = 0,
}

impl UniformType {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0x1406 => Some(Self::Float),
            0x8B50 => Some(Self::FloatVec2),
            0x8B51 => Some(Self::FloatVec3),
            0x8B52 => Some(Self::FloatVec4),
            0x1404 => Some(Self::Int),
            0x8B53 => Some(Self::IntVec2),
            0x8B54 => Some(Self::IntVec3),
            0x8B55 => Some(Self::IntVec4),
            0x8B56 => Some(Self::Bool),
            0x8B5C => Some(Self::FloatMat4),
            0x8B5E => Some(Self::Sampler2D),
            0 => Some(Self::Undefined),
            _ => None,
        }
    }

    /// True if values of this type are stored as floats.
    pub const fn is_float(self) -> bool {
        matches!(
            self,
            Self::Float | Self::FloatVec2 | Self::FloatVec3 | Self::FloatVec4 | Self::FloatMat4
        )
    }

    /// Scalar components per element.
    pub const fn components(self) -> usize {
        match self {
            Self::Float | Self::Int | Self::Bool | Self::Sampler2D => 1,
            Self::FloatVec2 | Self::IntVec2 => 2,
            Self::FloatVec3 | Self::IntVec3 => 3,
            Self::FloatVec4 | Self::IntVec4 => 4,
            Self::FloatMat4 => 16,
            Self::Undefined => 0,
        }
    }
}

/// Uniform values, flattened.
#[derive(Clone, Debug, PartialEq)]
pub enum UniformValues {
    Float(Vec<f32>),
    Int(Vec<i32>),
}

impl Default for UniformValues {
    fn default() -> Self {
        Self::Float(Vec::new())
    }
}

/// Named shader parameter.
#[derive(Clone, Debug, Default)]
pub struct Uniform {
    pub object: ObjectData,
    pub uniform_type: UniformType,
    pub num_elements: u32,
    pub values: UniformValues,
}

impl Uniform {
    /// Create a single float uniform.
    pub fn float(name: impl Into<String>, value: f32) -> Self {
        Self {
            object: ObjectData::named(name),
            uniform_type: UniformType::Float,
            num_elements: 1,
            values: UniformValues::Float(vec![value]),
        }
    }

    /// Create a single 4x4 matrix uniform.
    pub fn mat4(name: impl Into<String>, value: Mat4) -> Self {
        Self {
            object: ObjectData::named(name),
            uniform_type: UniformType::FloatMat4,
            num_elements: 1,
            values: UniformValues::Float(value.to_cols_array().to_vec()),
        }
    }

    /// Create a single int uniform.
    pub fn int(name: impl Into<String>, value: i32) -> Self {
        Self {
            object: ObjectData::named(name),
            uniform_type: UniformType::Int,
            num_elements: 1,
            values: UniformValues::Int(vec![value]),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum ShaderType {
    Vertex = 0x8B31,
    Fragment = 0x8B30,
    Geometry = 0x8DD9,
    #[default]
    Undefined = -1,
}

impl ShaderType {
    pub const fn from_i32(v: i32) -> Option<Self> {
        match v {
            0x8B31 => Some(Self::Vertex),
            0x8B30 => Some(Self::Fragment),
            0x8DD9 => Some(Self::Geometry),
            -1 => Some(Self::Undefined),
            _ => None,
        }
    }
}

/// GLSL shader source.
#[derive(Clone, Debug, Default)]
pub struct Shader {
    pub object: ObjectData,
    pub shader_type: ShaderType,
    pub source: String,
    pub file_name: String,
}

impl Shader {
    pub fn new(shader_type: ShaderType, source: impl Into<String>) -> Self {
        Self {
            object: ObjectData::default(),
            shader_type,
            source: source.into(),
            file_name: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_mode_replaces() {
        let mut ss = StateSet::default();
        ss.set_mode(gl::GL_LIGHTING, gl::ON);
        ss.set_mode(gl::GL_LIGHTING, gl::OFF);
        assert_eq!(ss.modes.len(), 1);
        assert_eq!(ss.modes[0].value, gl::OFF);
    }

    #[test]
    fn test_texture_attribute_units() {
        let mut ss = StateSet::default();
        let tex = Arc::new(StateAttribute::new(StateAttributeKind::Texture2D(Texture2D::default())));
        ss.add_texture_attribute(2, tex);
        assert_eq!(ss.texture_attributes.len(), 3);
        assert!(ss.texture_attributes[0].is_empty());
        assert_eq!(ss.texture_attributes[2].len(), 1);
    }

    #[test]
    fn test_uniform_type_components() {
        assert_eq!(UniformType::FloatMat4.components(), 16);
        assert!(UniformType::FloatVec3.is_float());
        assert!(!UniformType::IntVec2.is_float());
        assert_eq!(UniformType::from_i32(0x8B52), Some(UniformType::FloatVec4));
    }
}
