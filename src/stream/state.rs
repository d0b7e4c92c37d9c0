//! Render state: state sets, state attributes, programs, shaders and uniforms.

use std::io::{Read, Write};
use std::sync::Arc;

use tracing::trace;

use super::tags;
use super::version::{VERSION_0017, VERSION_0021};
use super::{decode_enum, DataInputStream, DataOutputStream};
use crate::scene::{
    AlphaFunc, AttribBinding, AttributeValue, BlendColor, BlendEquation, BlendFunc, ClipPlane,
    ColorMode, CullFace, Depth, Fog, FrontBack, FrontFace, ImageRef, Light, LightModel, LineWidth,
    Material, ModeValue, Point, PolygonMode, PolygonOffset, Program, RenderBinMode, Scissor,
    ShadeModel, Shader, ShaderRef, ShaderType, StateAttribute, StateAttributeKind,
    StateAttributeRef, StateSet, StateSetRef, TexEnv, TexGen, TexGenMode, TexMat, Texture1D,
    Texture2D, Texture3D, TextureCubeMap, TextureData, Uniform, UniformRef, UniformType,
    UniformValue, UniformValues, Viewport,
};
use crate::util::{Error, Result, Vec4};

impl<W: Write> DataOutputStream<W> {
    pub fn write_state_set(&mut self, state_set: &StateSetRef) -> Result<()> {
        let (id, is_new) = self.tables.state_sets.get_or_assign(state_set);
        self.write_int(id)?;
        if !is_new {
            return Ok(());
        }
        let ss = state_set.as_ref();
        self.write_int(tags::STATE_SET)?;
        self.write_object_level(&ss.object)?;
        self.write_int(ss.render_hint)?;
        self.write_int(ss.render_bin_mode as i32)?;
        self.write_int(ss.bin_number)?;
        self.write_string(&ss.bin_name)?;
        self.write_bool(ss.nest_render_bins)?;

        self.write_modes(&ss.modes)?;
        self.write_attribute_list(&ss.attributes)?;
        self.write_count(ss.texture_modes.len())?;
        for unit in &ss.texture_modes {
            self.write_modes(unit)?;
        }
        self.write_count(ss.texture_attributes.len())?;
        for unit in &ss.texture_attributes {
            self.write_attribute_list(unit)?;
        }

        if self.has(VERSION_0021) {
            self.write_count(ss.uniforms.len())?;
            for u in &ss.uniforms {
                self.write_uniform(&u.uniform)?;
                self.write_uint(u.value)?;
            }
        } else if !ss.uniforms.is_empty() {
            self.require("uniforms", VERSION_0021)?;
        }
        Ok(())
    }

    fn write_modes(&mut self, modes: &[ModeValue]) -> Result<()> {
        self.write_count(modes.len())?;
        for m in modes {
            self.write_uint(m.mode)?;
            self.write_uint(m.value)?;
        }
        Ok(())
    }

    fn write_attribute_list(&mut self, attributes: &[AttributeValue]) -> Result<()> {
        self.write_count(attributes.len())?;
        for a in attributes {
            self.write_state_attribute(&a.attribute)?;
            self.write_uint(a.value)?;
        }
        Ok(())
    }

    pub fn write_state_attribute(&mut self, attribute: &StateAttributeRef) -> Result<()> {
        let (id, is_new) = self.tables.state_attributes.get_or_assign(attribute);
        self.write_int(id)?;
        if is_new {
            trace!(id, class = attribute.kind.class_name(), "write state attribute");
            self.write_state_attribute_body(attribute)?;
        }
        Ok(())
    }

    fn write_state_attribute_level(&mut self, attribute: &StateAttribute) -> Result<()> {
        self.write_int(tags::STATE_ATTRIBUTE)?;
        self.write_object_level(&attribute.object)
    }

    fn write_state_attribute_body(&mut self, attribute: &StateAttribute) -> Result<()> {
        if matches!(attribute.kind, StateAttributeKind::Program(_)) {
            self.require("Program", VERSION_0021)?;
        }
        self.write_int(attribute.kind.type_tag())?;
        if attribute.kind.texture().is_none() {
            self.write_state_attribute_level(attribute)?;
        }
        match &attribute.kind {
            StateAttributeKind::AlphaFunc(a) => {
                self.write_uint(a.function)?;
                self.write_float(a.reference_value)
            }
            StateAttributeKind::BlendColor(b) => self.write_vec4(b.constant_color),
            StateAttributeKind::BlendEquation(b) => {
                self.write_uint(b.equation_rgb)?;
                self.write_uint(b.equation_alpha)
            }
            StateAttributeKind::BlendFunc(b) => {
                self.write_uint(b.source_rgb)?;
                self.write_uint(b.destination_rgb)?;
                self.write_uint(b.source_alpha)?;
                self.write_uint(b.destination_alpha)
            }
            StateAttributeKind::ClipPlane(c) => {
                self.write_plane(&c.plane)?;
                self.write_uint(c.plane_number)
            }
            StateAttributeKind::CullFace(c) => self.write_uint(c.mode),
            StateAttributeKind::Depth(d) => {
                self.write_uint(d.function)?;
                self.write_double(d.z_near)?;
                self.write_double(d.z_far)?;
                self.write_bool(d.write_mask)
            }
            StateAttributeKind::Fog(f) => {
                self.write_uint(f.mode)?;
                self.write_float(f.density)?;
                self.write_float(f.start)?;
                self.write_float(f.end)?;
                self.write_vec4(f.color)?;
                self.write_uint(f.fog_coordinate_source)
            }
            StateAttributeKind::FrontFace(f) => self.write_uint(f.mode),
            StateAttributeKind::Light(l) => {
                self.write_int(l.light_number)?;
                self.write_vec4(l.ambient)?;
                self.write_vec4(l.diffuse)?;
                self.write_vec4(l.specular)?;
                self.write_vec4(l.position)?;
                self.write_vec3(l.direction)?;
                self.write_float(l.constant_attenuation)?;
                self.write_float(l.linear_attenuation)?;
                self.write_float(l.quadratic_attenuation)?;
                self.write_float(l.spot_exponent)?;
                self.write_float(l.spot_cutoff)
            }
            StateAttributeKind::LightModel(l) => {
                self.write_vec4(l.ambient_intensity)?;
                self.write_uint(l.color_control)?;
                self.write_bool(l.local_viewer)?;
                self.write_bool(l.two_sided)
            }
            StateAttributeKind::LineWidth(l) => self.write_float(l.width),
            StateAttributeKind::Material(m) => {
                self.write_int(m.color_mode as i32)?;
                for fb in [&m.ambient, &m.diffuse, &m.specular, &m.emission] {
                    self.write_bool(fb.front_and_back)?;
                    self.write_vec4(fb.front)?;
                    self.write_vec4(fb.back)?;
                }
                self.write_bool(m.shininess.front_and_back)?;
                self.write_float(m.shininess.front)?;
                self.write_float(m.shininess.back)
            }
            StateAttributeKind::Point(p) => {
                self.write_float(p.size)?;
                self.write_float(p.fade_threshold_size)?;
                self.write_vec3(p.distance_attenuation)?;
                self.write_float(p.min_size)?;
                self.write_float(p.max_size)
            }
            StateAttributeKind::PolygonMode(p) => {
                self.write_uint(p.front)?;
                self.write_uint(p.back)
            }
            StateAttributeKind::PolygonOffset(p) => {
                self.write_float(p.factor)?;
                self.write_float(p.units)
            }
            StateAttributeKind::Program(p) => self.write_program(p),
            StateAttributeKind::Scissor(s) => {
                self.write_int(s.x)?;
                self.write_int(s.y)?;
                self.write_int(s.width)?;
                self.write_int(s.height)
            }
            StateAttributeKind::ShadeModel(s) => self.write_uint(s.mode),
            StateAttributeKind::TexEnv(t) => {
                self.write_uint(t.mode)?;
                self.write_vec4(t.color)
            }
            StateAttributeKind::TexGen(t) => {
                self.write_int(t.mode as i32)?;
                self.write_plane(&t.plane_s)?;
                self.write_plane(&t.plane_t)?;
                self.write_plane(&t.plane_r)?;
                self.write_plane(&t.plane_q)
            }
            StateAttributeKind::TexMat(t) => {
                self.write_matrixd(&t.matrix)?;
                self.write_bool(t.scale_by_texture_rectangle_size)
            }
            StateAttributeKind::Texture1D(t) => {
                self.write_texture_level(attribute, &t.texture)?;
                self.write_optional_image(t.image.as_ref())
            }
            StateAttributeKind::Texture2D(t) => {
                self.write_texture_level(attribute, &t.texture)?;
                self.write_optional_image(t.image.as_ref())
            }
            StateAttributeKind::Texture3D(t) => {
                self.write_texture_level(attribute, &t.texture)?;
                self.write_optional_image(t.image.as_ref())
            }
            StateAttributeKind::TextureCubeMap(t) => {
                self.write_texture_level(attribute, &t.texture)?;
                for face in &t.images {
                    self.write_optional_image(face.as_ref())?;
                }
                Ok(())
            }
            StateAttributeKind::Viewport(v) => {
                self.write_double(v.x)?;
                self.write_double(v.y)?;
                self.write_double(v.width)?;
                self.write_double(v.height)
            }
        }
    }

    fn write_texture_level(&mut self, attribute: &StateAttribute, t: &TextureData) -> Result<()> {
        self.write_int(tags::TEXTURE)?;
        self.write_state_attribute_level(attribute)?;
        self.write_uint(t.wrap_s)?;
        self.write_uint(t.wrap_t)?;
        self.write_uint(t.wrap_r)?;
        self.write_uint(t.min_filter)?;
        self.write_uint(t.mag_filter)?;
        if self.has(VERSION_0017) {
            self.write_float(t.max_anisotropy)?;
            self.write_vec4(t.border_color)?;
            self.write_int(t.border_width)?;
        }
        self.write_int(t.internal_format_mode)?;
        self.write_int(t.internal_format)?;
        self.write_bool(t.use_hardware_mipmap_generation)?;
        self.write_bool(t.unref_image_data_after_apply)?;
        self.write_bool(t.resize_non_power_of_two_hint)
    }

    fn write_optional_image(&mut self, image: Option<&ImageRef>) -> Result<()> {
        self.write_bool(image.is_some())?;
        match image {
            Some(image) => self.write_image(image),
            None => Ok(()),
        }
    }

    fn write_program(&mut self, p: &Program) -> Result<()> {
        for bindings in [&p.attrib_bindings, &p.frag_data_bindings] {
            self.write_count(bindings.len())?;
            for b in bindings {
                self.write_string(&b.name)?;
                self.write_uint(b.index)?;
            }
        }
        self.write_count(p.shaders.len())?;
        for shader in &p.shaders {
            self.write_shader(shader)?;
        }
        self.write_int(p.geometry_vertices_out)?;
        self.write_uint(p.geometry_input_type)?;
        self.write_uint(p.geometry_output_type)
    }

    pub fn write_shader(&mut self, shader: &ShaderRef) -> Result<()> {
        self.require("Shader", VERSION_0021)?;
        let (id, is_new) = self.tables.shaders.get_or_assign(shader);
        self.write_int(id)?;
        if is_new {
            self.write_int(tags::SHADER)?;
            self.write_object_level(&shader.object)?;
            self.write_int(shader.shader_type as i32)?;
            self.write_string(&shader.source)?;
            self.write_string(&shader.file_name)?;
        }
        Ok(())
    }

    pub fn write_uniform(&mut self, uniform: &UniformRef) -> Result<()> {
        self.require("Uniform", VERSION_0021)?;
        let (id, is_new) = self.tables.uniforms.get_or_assign(uniform);
        self.write_int(id)?;
        if !is_new {
            return Ok(());
        }
        let len = match &uniform.values {
            UniformValues::Float(v) => v.len(),
            UniformValues::Int(v) => v.len(),
        };
        let expected = uniform.num_elements as usize * uniform.uniform_type.components();
        if uniform.uniform_type.components() > 0 && len != expected {
            return Err(Error::invalid(format!(
                "uniform {:?} holds {len} values, expected {expected}",
                uniform.object.name
            )));
        }
        self.write_int(tags::UNIFORM)?;
        self.write_object_level(&uniform.object)?;
        self.write_int(uniform.uniform_type as i32)?;
        self.write_uint(uniform.num_elements)?;
        match (&uniform.values, uniform.uniform_type.is_float()) {
            (UniformValues::Float(v), true) => self.write_float_array(v),
            (UniformValues::Int(v), false) => self.write_int_array(v),
            _ => Err(Error::invalid(format!(
                "uniform {:?} values do not match type {:?}",
                uniform.object.name, uniform.uniform_type
            ))),
        }
    }
}

impl<R: Read> DataInputStream<R> {
    pub fn read_state_set(&mut self) -> Result<StateSetRef> {
        let id = self.read_int()?;
        if let Some(ss) = self.tables.state_sets.get(id) {
            return Ok(ss);
        }
        self.tables.state_sets.claim(id)?;

        self.expect_tag(tags::STATE_SET, "StateSet")?;
        let object = self.read_object_level()?;
        let render_hint = self.read_int()?;
        let raw = self.read_int()?;
        let render_bin_mode = decode_enum(RenderBinMode::from_i32(raw), "render bin mode", raw)?;
        let bin_number = self.read_int()?;
        let bin_name = self.read_string()?;
        let nest_render_bins = self.read_bool()?;

        let modes = self.read_modes()?;
        let attributes = self.read_attribute_list()?;
        let units = self.read_count()?;
        let mut texture_modes = Vec::with_capacity(units.min(32));
        for _ in 0..units {
            texture_modes.push(self.read_modes()?);
        }
        let units = self.read_count()?;
        let mut texture_attributes = Vec::with_capacity(units.min(32));
        for _ in 0..units {
            texture_attributes.push(self.read_attribute_list()?);
        }

        let mut uniforms = Vec::new();
        if self.has(VERSION_0021) {
            let n = self.read_count()?;
            uniforms.reserve(n.min(1024));
            for _ in 0..n {
                let uniform = self.read_uniform()?;
                uniforms.push(UniformValue { uniform, value: self.read_uint()? });
            }
        }

        let ss = Arc::new(StateSet {
            object,
            render_hint,
            render_bin_mode,
            bin_number,
            bin_name,
            nest_render_bins,
            modes,
            attributes,
            texture_modes,
            texture_attributes,
            uniforms,
        });
        self.tables.state_sets.insert(id, ss.clone());
        Ok(ss)
    }

    fn read_modes(&mut self) -> Result<Vec<ModeValue>> {
        let n = self.read_count()?;
        let mut modes = Vec::with_capacity(n.min(1024));
        for _ in 0..n {
            modes.push(ModeValue { mode: self.read_uint()?, value: self.read_uint()? });
        }
        Ok(modes)
    }

    fn read_attribute_list(&mut self) -> Result<Vec<AttributeValue>> {
        let n = self.read_count()?;
        let mut attributes = Vec::with_capacity(n.min(1024));
        for _ in 0..n {
            let attribute = self.read_state_attribute()?;
            attributes.push(AttributeValue { attribute, value: self.read_uint()? });
        }
        Ok(attributes)
    }

    pub fn read_state_attribute(&mut self) -> Result<StateAttributeRef> {
        let id = self.read_int()?;
        if let Some(a) = self.tables.state_attributes.get(id) {
            return Ok(a);
        }
        self.tables.state_attributes.claim(id)?;
        let attribute = Arc::new(self.read_state_attribute_body()?);
        trace!(id, class = attribute.kind.class_name(), "read state attribute");
        self.tables.state_attributes.insert(id, attribute.clone());
        Ok(attribute)
    }

    fn read_state_attribute_level(&mut self) -> Result<crate::scene::ObjectData> {
        self.expect_tag(tags::STATE_ATTRIBUTE, "StateAttribute")?;
        self.read_object_level()
    }

    fn read_state_attribute_body(&mut self) -> Result<StateAttribute> {
        let tag = self.read_int()?;
        let is_texture = matches!(
            tag,
            tags::TEXTURE_1D | tags::TEXTURE_2D | tags::TEXTURE_3D | tags::TEXTURE_CUBE_MAP
        );
        let object = if is_texture {
            None
        } else {
            if !is_attribute_tag(tag) {
                return Err(Error::UnknownTypeTag { category: "StateAttribute", tag });
            }
            Some(self.read_state_attribute_level()?)
        };

        let kind = match tag {
            tags::ALPHA_FUNC => StateAttributeKind::AlphaFunc(AlphaFunc {
                function: self.read_uint()?,
                reference_value: self.read_float()?,
            }),
            tags::BLEND_COLOR => {
                StateAttributeKind::BlendColor(BlendColor { constant_color: self.read_vec4()? })
            }
            tags::BLEND_EQUATION => StateAttributeKind::BlendEquation(BlendEquation {
                equation_rgb: self.read_uint()?,
                equation_alpha: self.read_uint()?,
            }),
            tags::BLEND_FUNC => StateAttributeKind::BlendFunc(BlendFunc {
                source_rgb: self.read_uint()?,
                destination_rgb: self.read_uint()?,
                source_alpha: self.read_uint()?,
                destination_alpha: self.read_uint()?,
            }),
            tags::CLIP_PLANE => StateAttributeKind::ClipPlane(ClipPlane {
                plane: self.read_plane()?,
                plane_number: self.read_uint()?,
            }),
            tags::CULL_FACE => StateAttributeKind::CullFace(CullFace { mode: self.read_uint()? }),
            tags::DEPTH => StateAttributeKind::Depth(Depth {
                function: self.read_uint()?,
                z_near: self.read_double()?,
                z_far: self.read_double()?,
                write_mask: self.read_bool()?,
            }),
            tags::FOG => StateAttributeKind::Fog(Fog {
                mode: self.read_uint()?,
                density: self.read_float()?,
                start: self.read_float()?,
                end: self.read_float()?,
                color: self.read_vec4()?,
                fog_coordinate_source: self.read_uint()?,
            }),
            tags::FRONT_FACE => StateAttributeKind::FrontFace(FrontFace { mode: self.read_uint()? }),
            tags::LIGHT => StateAttributeKind::Light(Light {
                light_number: self.read_int()?,
                ambient: self.read_vec4()?,
                diffuse: self.read_vec4()?,
                specular: self.read_vec4()?,
                position: self.read_vec4()?,
                direction: self.read_vec3()?,
                constant_attenuation: self.read_float()?,
                linear_attenuation: self.read_float()?,
                quadratic_attenuation: self.read_float()?,
                spot_exponent: self.read_float()?,
                spot_cutoff: self.read_float()?,
            }),
            tags::LIGHT_MODEL => StateAttributeKind::LightModel(LightModel {
                ambient_intensity: self.read_vec4()?,
                color_control: self.read_uint()?,
                local_viewer: self.read_bool()?,
                two_sided: self.read_bool()?,
            }),
            tags::LINE_WIDTH => StateAttributeKind::LineWidth(LineWidth { width: self.read_float()? }),
            tags::MATERIAL => StateAttributeKind::Material(self.read_material()?),
            tags::POINT => StateAttributeKind::Point(Point {
                size: self.read_float()?,
                fade_threshold_size: self.read_float()?,
                distance_attenuation: self.read_vec3()?,
                min_size: self.read_float()?,
                max_size: self.read_float()?,
            }),
            tags::POLYGON_MODE => StateAttributeKind::PolygonMode(PolygonMode {
                front: self.read_uint()?,
                back: self.read_uint()?,
            }),
            tags::POLYGON_OFFSET => StateAttributeKind::PolygonOffset(PolygonOffset {
                factor: self.read_float()?,
                units: self.read_float()?,
            }),
            tags::PROGRAM => StateAttributeKind::Program(self.read_program()?),
            tags::SCISSOR => StateAttributeKind::Scissor(Scissor {
                x: self.read_int()?,
                y: self.read_int()?,
                width: self.read_int()?,
                height: self.read_int()?,
            }),
            tags::SHADE_MODEL => StateAttributeKind::ShadeModel(ShadeModel { mode: self.read_uint()? }),
            tags::TEX_ENV => StateAttributeKind::TexEnv(TexEnv {
                mode: self.read_uint()?,
                color: self.read_vec4()?,
            }),
            tags::TEX_GEN => {
                let raw = self.read_int()?;
                StateAttributeKind::TexGen(TexGen {
                    mode: decode_enum(TexGenMode::from_i32(raw), "texgen mode", raw)?,
                    plane_s: self.read_plane()?,
                    plane_t: self.read_plane()?,
                    plane_r: self.read_plane()?,
                    plane_q: self.read_plane()?,
                })
            }
            tags::TEX_MAT => StateAttributeKind::TexMat(TexMat {
                matrix: self.read_matrixd()?,
                scale_by_texture_rectangle_size: self.read_bool()?,
            }),
            tags::VIEWPORT => StateAttributeKind::Viewport(Viewport {
                x: self.read_double()?,
                y: self.read_double()?,
                width: self.read_double()?,
                height: self.read_double()?,
            }),
            tags::TEXTURE_1D => {
                let (object, texture) = self.read_texture_level()?;
                let image = self.read_optional_image()?;
                return Ok(StateAttribute {
                    object,
                    kind: StateAttributeKind::Texture1D(Texture1D { texture, image }),
                });
            }
            tags::TEXTURE_2D => {
                let (object, texture) = self.read_texture_level()?;
                let image = self.read_optional_image()?;
                return Ok(StateAttribute {
                    object,
                    kind: StateAttributeKind::Texture2D(Texture2D { texture, image }),
                });
            }
            tags::TEXTURE_3D => {
                let (object, texture) = self.read_texture_level()?;
                let image = self.read_optional_image()?;
                return Ok(StateAttribute {
                    object,
                    kind: StateAttributeKind::Texture3D(Texture3D { texture, image }),
                });
            }
            tags::TEXTURE_CUBE_MAP => {
                let (object, texture) = self.read_texture_level()?;
                let mut images: [Option<ImageRef>; 6] = Default::default();
                for face in &mut images {
                    *face = self.read_optional_image()?;
                }
                return Ok(StateAttribute {
                    object,
                    kind: StateAttributeKind::TextureCubeMap(TextureCubeMap { texture, images }),
                });
            }
            tag => return Err(Error::UnknownTypeTag { category: "StateAttribute", tag }),
        };
        Ok(StateAttribute { object: object.unwrap_or_default(), kind })
    }

    fn read_material(&mut self) -> Result<Material> {
        let raw = self.read_int()?;
        let color_mode = decode_enum(ColorMode::from_i32(raw), "color mode", raw)?;
        let mut colors = [FrontBack::<Vec4>::default(); 4];
        for fb in &mut colors {
            *fb = FrontBack {
                front_and_back: self.read_bool()?,
                front: self.read_vec4()?,
                back: self.read_vec4()?,
            };
        }
        let shininess = FrontBack {
            front_and_back: self.read_bool()?,
            front: self.read_float()?,
            back: self.read_float()?,
        };
        let [ambient, diffuse, specular, emission] = colors;
        Ok(Material { color_mode, ambient, diffuse, specular, emission, shininess })
    }

    fn read_texture_level(&mut self) -> Result<(crate::scene::ObjectData, TextureData)> {
        self.expect_tag(tags::TEXTURE, "Texture")?;
        let object = self.read_state_attribute_level()?;
        let mut t = TextureData {
            wrap_s: self.read_uint()?,
            wrap_t: self.read_uint()?,
            wrap_r: self.read_uint()?,
            min_filter: self.read_uint()?,
            mag_filter: self.read_uint()?,
            ..TextureData::default()
        };
        if self.has(VERSION_0017) {
            t.max_anisotropy = self.read_float()?;
            t.border_color = self.read_vec4()?;
            t.border_width = self.read_int()?;
        }
        t.internal_format_mode = self.read_int()?;
        t.internal_format = self.read_int()?;
        t.use_hardware_mipmap_generation = self.read_bool()?;
        t.unref_image_data_after_apply = self.read_bool()?;
        t.resize_non_power_of_two_hint = self.read_bool()?;
        Ok((object, t))
    }

    fn read_optional_image(&mut self) -> Result<Option<ImageRef>> {
        if self.read_bool()? {
            Ok(Some(self.read_image()?))
        } else {
            Ok(None)
        }
    }

    fn read_program(&mut self) -> Result<Program> {
        let mut bindings: [Vec<AttribBinding>; 2] = Default::default();
        for list in &mut bindings {
            let n = self.read_count()?;
            list.reserve(n.min(256));
            for _ in 0..n {
                list.push(AttribBinding { name: self.read_string()?, index: self.read_uint()? });
            }
        }
        let n = self.read_count()?;
        let mut shaders = Vec::with_capacity(n.min(64));
        for _ in 0..n {
            shaders.push(self.read_shader()?);
        }
        let [attrib_bindings, frag_data_bindings] = bindings;
        Ok(Program {
            attrib_bindings,
            frag_data_bindings,
            shaders,
            geometry_vertices_out: self.read_int()?,
            geometry_input_type: self.read_uint()?,
            geometry_output_type: self.read_uint()?,
        })
    }

    pub fn read_shader(&mut self) -> Result<ShaderRef> {
        let id = self.read_int()?;
        if let Some(s) = self.tables.shaders.get(id) {
            return Ok(s);
        }
        self.tables.shaders.claim(id)?;
        self.expect_tag(tags::SHADER, "Shader")?;
        let object = self.read_object_level()?;
        let raw = self.read_int()?;
        let shader = Arc::new(Shader {
            object,
            shader_type: decode_enum(ShaderType::from_i32(raw), "shader type", raw)?,
            source: self.read_string()?,
            file_name: self.read_string()?,
        });
        self.tables.shaders.insert(id, shader.clone());
        Ok(shader)
    }

    pub fn read_uniform(&mut self) -> Result<UniformRef> {
        let id = self.read_int()?;
        if let Some(u) = self.tables.uniforms.get(id) {
            return Ok(u);
        }
        self.tables.uniforms.claim(id)?;
        self.expect_tag(tags::UNIFORM, "Uniform")?;
        let object = self.read_object_level()?;
        let raw = self.read_int()?;
        let uniform_type = decode_enum(UniformType::from_i32(raw), "uniform type", raw)?;
        let num_elements = self.read_uint()?;
        let values = if uniform_type.is_float() {
            UniformValues::Float(self.read_float_array()?)
        } else {
            UniformValues::Int(self.read_int_array()?)
        };
        let len = match &values {
            UniformValues::Float(v) => v.len(),
            UniformValues::Int(v) => v.len(),
        };
        let expected = num_elements as usize * uniform_type.components();
        if uniform_type.components() > 0 && len != expected {
            return Err(Error::invalid(format!(
                "uniform {:?} holds {len} values, expected {expected}",
                object.name
            )));
        }
        let uniform = Arc::new(Uniform { object, uniform_type, num_elements, values });
        self.tables.uniforms.insert(id, uniform.clone());
        Ok(uniform)
    }
}

/// Tags of the non-texture state attributes.
fn is_attribute_tag(tag: i32) -> bool {
    matches!(
        tag,
        tags::ALPHA_FUNC
            | tags::BLEND_COLOR
            | tags::BLEND_EQUATION
            | tags::BLEND_FUNC
            | tags::CLIP_PLANE
            | tags::CULL_FACE
            | tags::DEPTH
            | tags::FOG
            | tags::FRONT_FACE
            | tags::LIGHT
            | tags::LIGHT_MODEL
            | tags::LINE_WIDTH
            | tags::MATERIAL
            | tags::POINT
            | tags::POLYGON_MODE
            | tags::POLYGON_OFFSET
            | tags::PROGRAM
            | tags::SCISSOR
            | tags::SHADE_MODEL
            | tags::TEX_ENV
            | tags::TEX_GEN
            | tags::TEX_MAT
            | tags::VIEWPORT
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::gl;
    use crate::stream::version::VERSION_0012;
    use crate::stream::{ReadOptions, WriteOptions};

    fn round_trip(ss: &StateSetRef, opts: WriteOptions) -> Result<StateSetRef> {
        let mut out = DataOutputStream::new(Vec::new(), opts)?;
        out.write_state_set(ss)?;
        let bytes = out.finish()?;
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default())?;
        inp.read_state_set()
    }

    #[test]
    fn test_modes_and_shared_attribute() {
        let material = Arc::new(StateAttribute::new(StateAttributeKind::Material(Material {
            color_mode: ColorMode::Diffuse,
            shininess: FrontBack::both(32.0),
            ..Material::default()
        })));
        let mut ss = StateSet { bin_name: "RenderBin".into(), bin_number: 10, ..StateSet::default() };
        ss.set_mode(gl::GL_LIGHTING, gl::OFF);
        ss.add_attribute(material.clone());
        ss.add_texture_attribute(1, material);

        let read = round_trip(&Arc::new(ss), WriteOptions::new()).unwrap();
        assert_eq!(read.bin_name, "RenderBin");
        assert_eq!(read.modes, vec![ModeValue { mode: gl::GL_LIGHTING, value: gl::OFF }]);
        assert_eq!(read.texture_attributes.len(), 2);
        let a = &read.attributes[0].attribute;
        let b = &read.texture_attributes[1][0].attribute;
        assert!(Arc::ptr_eq(a, b));
        match &a.kind {
            StateAttributeKind::Material(m) => {
                assert_eq!(m.color_mode, ColorMode::Diffuse);
                assert_eq!(m.shininess.front, 32.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_uniforms_and_program() {
        let vs = Arc::new(Shader::new(ShaderType::Vertex, "void main() {}"));
        let program = Program { shaders: vec![vs.clone(), vs], ..Program::default() };
        let mut ss = StateSet::default();
        ss.add_attribute(Arc::new(StateAttribute::new(StateAttributeKind::Program(program))));
        ss.add_uniform(Arc::new(Uniform::float("scale", 2.5)));
        ss.add_uniform(Arc::new(Uniform::int("mode", 3)));

        let read = round_trip(&Arc::new(ss), WriteOptions::new()).unwrap();
        assert_eq!(read.uniforms.len(), 2);
        assert_eq!(read.uniforms[0].uniform.values, UniformValues::Float(vec![2.5]));
        assert_eq!(read.uniforms[1].uniform.values, UniformValues::Int(vec![3]));
        match &read.attributes[0].attribute.kind {
            StateAttributeKind::Program(p) => {
                assert_eq!(p.shaders.len(), 2);
                assert!(Arc::ptr_eq(&p.shaders[0], &p.shaders[1]));
                assert_eq!(p.shaders[0].source, "void main() {}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_uniforms_need_version_21() {
        let mut ss = StateSet::default();
        ss.add_uniform(Arc::new(Uniform::float("scale", 1.0)));
        let err = round_trip(&Arc::new(ss), WriteOptions::new().with_version(VERSION_0012)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedInVersion { required: VERSION_0021, .. }));
    }

    #[test]
    fn test_texture_border_dropped_before_17() {
        let tex = Texture2D {
            texture: TextureData { max_anisotropy: 8.0, wrap_s: gl::GL_REPEAT, ..TextureData::default() },
            image: None,
        };
        let mut ss = StateSet::default();
        ss.add_texture_attribute(0, Arc::new(StateAttribute::new(StateAttributeKind::Texture2D(tex))));

        let old = round_trip(&Arc::new(ss.clone()), WriteOptions::new().with_version(VERSION_0012)).unwrap();
        let new = round_trip(&Arc::new(ss), WriteOptions::new()).unwrap();
        let aniso = |s: &StateSetRef| s.texture_attributes[0][0].attribute.kind.texture().map(|t| t.max_anisotropy);
        assert_eq!(aniso(&old), Some(1.0));
        assert_eq!(aniso(&new), Some(8.0));
        assert_eq!(
            new.texture_attributes[0][0].attribute.kind.texture().map(|t| t.wrap_s),
            Some(gl::GL_REPEAT)
        );
    }

    #[test]
    fn test_mismatched_uniform_values() {
        let mut bad = Uniform::float("x", 1.0);
        bad.values = UniformValues::Int(vec![1]);
        let mut ss = StateSet::default();
        ss.add_uniform(Arc::new(bad));
        assert!(matches!(
            round_trip(&Arc::new(ss), WriteOptions::new()),
            Err(Error::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_uniform_value_count_checked_on_write() {
        let mut bad = Uniform::float("m", 0.0);
        bad.uniform_type = UniformType::FloatMat4;
        bad.num_elements = 1;
        bad.values = UniformValues::Float(vec![1.0, 2.0, 3.0]);
        let mut ss = StateSet::default();
        ss.add_uniform(Arc::new(bad));
        let mut out = DataOutputStream::new(Vec::new(), WriteOptions::new()).unwrap();
        let err = out.write_state_set(&Arc::new(ss)).unwrap_err();
        assert!(matches!(err, Error::InvalidStructure(msg) if msg.contains("expected 16")));
    }
}
