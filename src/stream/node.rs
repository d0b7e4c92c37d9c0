//! Node category: the node hierarchy and its dispatch.
//!
//! Each concrete type writes its tag, then its base level, then its own
//! fields. Levels: Object, Node, Group, Transform, LOD, Geode, Effect.

use std::io::{Read, Write};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::tags;
use super::version::{VERSION_0010, VERSION_0026, VERSION_0030, VERSION_0039, VERSION_0046};
use super::{decode_enum, DataInputStream, DataOutputStream};
use crate::plugin;
use crate::scene::{
    AnisotropicLighting, Billboard, BillboardMode, BlendingPolicy, CenterMode, ClipNode, Effect,
    Geode, Group, LightSource, LoadingExternalReferenceMode, Lod, LoopMode, MatrixTransform, Node,
    NodeKind, NodeRef, PagedLod, PagedLodFile, PositionAttitudeTransform, ProxyNode, RangeMode,
    ReferenceFrame, Sequence, SequenceMode, SpecularHighlights, Switch, TerrainTile, TileId,
    VolumeTile,
};
use crate::util::{Error, Result};

impl<W: Write> DataOutputStream<W> {
    /// Write a node reference: its id, then the node itself on first sight.
    pub fn write_node(&mut self, node: &NodeRef) -> Result<()> {
        let (id, is_new) = self.tables.nodes.get_or_assign(node);
        self.write_int(id)?;
        if is_new {
            trace!(id, class = node.kind.class_name(), name = %node.object.name, "write node");
            self.write_node_body(node)?;
        }
        Ok(())
    }

    fn write_node_body(&mut self, node: &Node) -> Result<()> {
        match &node.kind {
            NodeKind::Node => self.write_node_level(node),
            NodeKind::Group(g) => self.write_group_level(node, g),
            NodeKind::MatrixTransform(t) => {
                self.write_int(tags::MATRIX_TRANSFORM)?;
                self.write_transform_level(node, &t.group, t.reference_frame)?;
                self.write_matrixd(&t.matrix)
            }
            NodeKind::PositionAttitudeTransform(t) => {
                self.write_int(tags::POSITION_ATTITUDE_TRANSFORM)?;
                self.write_transform_level(node, &t.group, t.reference_frame)?;
                self.write_dvec3(t.position)?;
                self.write_quat(t.attitude)?;
                self.write_dvec3(t.scale)?;
                self.write_dvec3(t.pivot_point)
            }
            NodeKind::Switch(s) => {
                self.write_int(tags::SWITCH)?;
                self.write_group_level(node, &s.group)?;
                self.write_bool(s.new_child_default_value)?;
                self.write_count(s.values.len())?;
                for &v in &s.values {
                    self.write_bool(v)?;
                }
                Ok(())
            }
            NodeKind::Lod(l) => self.write_lod_level(node, l),
            NodeKind::PagedLod(p) => {
                self.write_int(tags::PAGED_LOD)?;
                self.write_lod_level(node, &p.lod)?;
                if self.has(VERSION_0026) {
                    self.write_string(&p.database_path)?;
                }
                self.write_uint(p.num_children_that_cannot_be_expired)?;
                self.write_count(p.files.len())?;
                for f in &p.files {
                    self.write_string(&f.file_name)?;
                    if self.has(VERSION_0026) {
                        self.write_float(f.priority_offset)?;
                        self.write_float(f.priority_scale)?;
                    }
                }
                Ok(())
            }
            NodeKind::ProxyNode(p) => self.write_proxy_node(node, p),
            NodeKind::Geode(g) => self.write_geode_level(node, g),
            NodeKind::Billboard(b) => {
                self.write_int(tags::BILLBOARD)?;
                self.write_geode_level(node, &b.geode)?;
                self.write_int(b.mode as i32)?;
                self.write_vec3(b.axis)?;
                self.write_vec3(b.normal)?;
                self.write_vec3_array(&b.positions)
            }
            NodeKind::LightSource(l) => {
                self.write_int(tags::LIGHT_SOURCE)?;
                self.write_group_level(node, &l.group)?;
                self.write_int(l.reference_frame as i32)?;
                self.write_bool(l.light.is_some())?;
                if let Some(light) = &l.light {
                    self.write_state_attribute(light)?;
                }
                Ok(())
            }
            NodeKind::ClipNode(c) => {
                self.write_int(tags::CLIP_NODE)?;
                self.write_group_level(node, &c.group)?;
                self.write_int(c.reference_frame as i32)?;
                self.write_count(c.clip_planes.len())?;
                for plane in &c.clip_planes {
                    self.write_state_attribute(plane)?;
                }
                Ok(())
            }
            NodeKind::Sequence(s) => {
                self.write_int(tags::SEQUENCE)?;
                self.write_group_level(node, &s.group)?;
                self.write_double_array(&s.times)?;
                self.write_int(s.loop_mode as i32)?;
                self.write_int(s.begin)?;
                self.write_int(s.end)?;
                self.write_float(s.speed)?;
                self.write_int(s.num_repeats)?;
                self.write_int(s.mode as i32)
            }
            NodeKind::TerrainTile(t) => self.write_terrain_tile(node, t),
            NodeKind::VolumeTile(v) => self.write_volume_tile(node, v),
            NodeKind::AnisotropicLighting(a) => {
                self.write_int(tags::ANISOTROPIC_LIGHTING)?;
                self.write_effect_level(node, &a.effect)?;
                self.write_int(a.light_number)?;
                self.write_bool(a.lighting_map.is_some())?;
                if let Some(image) = &a.lighting_map {
                    self.write_image(image)?;
                }
                Ok(())
            }
            NodeKind::SpecularHighlights(s) => {
                // Older streams share AnisotropicLighting's tag, which no reader can tell apart.
                self.require("SpecularHighlights", VERSION_0046)?;
                self.write_int(tags::SPECULAR_HIGHLIGHTS)?;
                self.write_effect_level(node, &s.effect)?;
                self.write_int(s.light_number)?;
                self.write_int(s.texture_unit)?;
                self.write_vec4(s.specular_color)?;
                self.write_float(s.specular_exponent)
            }
        }
    }

    fn write_node_level(&mut self, node: &Node) -> Result<()> {
        self.write_int(tags::NODE)?;
        self.write_object_level(&node.object)?;
        let core = &node.core;
        self.write_string_array(&core.descriptions)?;
        self.write_uint(core.node_mask)?;
        if self.has(VERSION_0010) {
            self.write_bool(core.culling_active)?;
            self.write_bool(core.initial_bound.is_some())?;
            if let Some(bound) = &core.initial_bound {
                self.write_bounding_sphere(bound)?;
            }
        }
        self.write_bool(core.state_set.is_some())?;
        if let Some(ss) = &core.state_set {
            self.write_state_set(ss)?;
        }
        Ok(())
    }

    fn write_group_level(&mut self, node: &Node, group: &Group) -> Result<()> {
        self.write_int(tags::GROUP)?;
        self.write_node_level(node)?;
        self.write_count(group.children.len())?;
        for child in &group.children {
            self.write_node(child)?;
        }
        Ok(())
    }

    fn write_transform_level(
        &mut self,
        node: &Node,
        group: &Group,
        reference_frame: ReferenceFrame,
    ) -> Result<()> {
        self.write_int(tags::TRANSFORM)?;
        self.write_group_level(node, group)?;
        self.write_int(reference_frame as i32)
    }

    fn write_lod_level(&mut self, node: &Node, lod: &Lod) -> Result<()> {
        self.write_int(tags::LOD)?;
        self.write_group_level(node, &lod.group)?;
        self.write_int(lod.center_mode as i32)?;
        self.write_dvec3(lod.user_center)?;
        self.write_double(lod.radius)?;
        self.write_int(lod.range_mode as i32)?;
        self.write_count(lod.ranges.len())?;
        for &(min, max) in &lod.ranges {
            self.write_float(min)?;
            self.write_float(max)?;
        }
        Ok(())
    }

    fn write_geode_level(&mut self, node: &Node, geode: &Geode) -> Result<()> {
        self.write_int(tags::GEODE)?;
        self.write_node_level(node)?;
        self.write_count(geode.drawables.len())?;
        for d in &geode.drawables {
            self.write_drawable(d)?;
        }
        Ok(())
    }

    fn write_effect_level(&mut self, node: &Node, effect: &Effect) -> Result<()> {
        self.write_int(tags::EFFECT)?;
        self.write_group_level(node, &effect.group)?;
        self.write_bool(effect.enabled)?;
        self.write_int(effect.selected_technique)
    }

    /// ProxyNode writes the node level and handles its children itself,
    /// so children that come from files can be left out.
    fn write_proxy_node(&mut self, node: &Node, proxy: &ProxyNode) -> Result<()> {
        self.write_int(tags::PROXY_NODE)?;
        self.write_node_level(node)?;
        self.write_int(proxy.center_mode as i32)?;
        self.write_dvec3(proxy.user_center)?;
        self.write_double(proxy.radius)?;
        self.write_int(proxy.loading_mode as i32)?;
        self.write_string(&proxy.database_path)?;
        self.write_string_array(&proxy.file_names)?;

        let inline_all = self.options.inline_external_references;
        let written: Vec<(usize, &NodeRef)> = proxy
            .group
            .children
            .iter()
            .enumerate()
            .filter(|(i, _)| inline_all || proxy.file_names.get(*i).map_or(true, |f| f.is_empty()))
            .collect();
        self.write_count(written.len())?;
        for (index, child) in written {
            self.write_uint(index as u32)?;
            self.write_node(child)?;
        }
        Ok(())
    }

    fn write_terrain_tile(&mut self, node: &Node, tile: &TerrainTile) -> Result<()> {
        self.require("TerrainTile", VERSION_0030)?;
        self.write_int(tags::TERRAIN_TILE)?;
        self.write_group_level(node, &tile.group)?;
        self.write_tile_id(&tile.tile_id)?;
        self.write_bool(tile.locator.is_some())?;
        if let Some(locator) = &tile.locator {
            self.write_locator(locator)?;
        }
        self.write_bool(tile.elevation_layer.is_some())?;
        if let Some(layer) = &tile.elevation_layer {
            self.write_layer(layer)?;
        }
        self.write_count(tile.color_layers.len())?;
        for layer in &tile.color_layers {
            self.write_bool(layer.is_some())?;
            if let Some(layer) = layer {
                self.write_layer(layer)?;
            }
        }
        self.write_bool(tile.requires_normals)?;
        self.write_bool(tile.treat_boundaries_to_valid_data_as_default_value)?;
        self.write_int(tile.blending_policy as i32)
    }

    fn write_volume_tile(&mut self, node: &Node, tile: &VolumeTile) -> Result<()> {
        self.require("VolumeTile", VERSION_0039)?;
        self.write_int(tags::VOLUME_TILE)?;
        self.write_group_level(node, &tile.group)?;
        self.write_tile_id(&tile.tile_id)?;
        self.write_bool(tile.locator.is_some())?;
        if let Some(locator) = &tile.locator {
            self.write_volume_locator(locator)?;
        }
        self.write_bool(tile.layer.is_some())?;
        if let Some(layer) = &tile.layer {
            self.write_volume_layer(layer)?;
        }
        Ok(())
    }

    fn write_tile_id(&mut self, id: &TileId) -> Result<()> {
        self.write_int(id.level)?;
        self.write_int(id.x)?;
        self.write_int(id.y)
    }
}

impl<R: Read> DataInputStream<R> {
    /// Read a node reference written by `write_node`.
    pub fn read_node(&mut self) -> Result<NodeRef> {
        let id = self.read_int()?;
        if let Some(node) = self.tables.nodes.get(id) {
            return Ok(node);
        }
        self.tables.nodes.claim(id)?;
        let node = Arc::new(self.read_node_body()?);
        trace!(id, class = node.kind.class_name(), name = %node.object.name, "read node");
        self.tables.nodes.insert(id, node.clone());
        Ok(node)
    }

    fn read_node_body(&mut self) -> Result<Node> {
        let tag = self.peek_int()?;
        match tag {
            tags::NODE => self.read_node_level(),
            tags::GROUP => {
                let (mut node, group) = self.read_group_level()?;
                node.kind = NodeKind::Group(group);
                Ok(node)
            }
            tags::MATRIX_TRANSFORM => {
                self.expect_tag(tags::MATRIX_TRANSFORM, "MatrixTransform")?;
                let (mut node, group, reference_frame) = self.read_transform_level()?;
                let matrix = self.read_matrixd()?;
                node.kind = NodeKind::MatrixTransform(MatrixTransform { group, reference_frame, matrix });
                Ok(node)
            }
            tags::POSITION_ATTITUDE_TRANSFORM => {
                self.expect_tag(tags::POSITION_ATTITUDE_TRANSFORM, "PositionAttitudeTransform")?;
                let (mut node, group, reference_frame) = self.read_transform_level()?;
                node.kind = NodeKind::PositionAttitudeTransform(PositionAttitudeTransform {
                    group,
                    reference_frame,
                    position: self.read_dvec3()?,
                    attitude: self.read_quat()?,
                    scale: self.read_dvec3()?,
                    pivot_point: self.read_dvec3()?,
                });
                Ok(node)
            }
            tags::SWITCH => {
                self.expect_tag(tags::SWITCH, "Switch")?;
                let (mut node, group) = self.read_group_level()?;
                let new_child_default_value = self.read_bool()?;
                let n = self.read_count()?;
                let mut values = Vec::with_capacity(n.min(4096));
                for _ in 0..n {
                    values.push(self.read_bool()?);
                }
                node.kind = NodeKind::Switch(Switch { group, new_child_default_value, values });
                Ok(node)
            }
            tags::LOD => {
                let (mut node, lod) = self.read_lod_level()?;
                node.kind = NodeKind::Lod(lod);
                Ok(node)
            }
            tags::PAGED_LOD => self.read_paged_lod(),
            tags::PROXY_NODE => self.read_proxy_node(),
            tags::GEODE => {
                let (mut node, geode) = self.read_geode_level()?;
                node.kind = NodeKind::Geode(geode);
                Ok(node)
            }
            tags::BILLBOARD => {
                self.expect_tag(tags::BILLBOARD, "Billboard")?;
                let (mut node, geode) = self.read_geode_level()?;
                let raw = self.read_int()?;
                node.kind = NodeKind::Billboard(Billboard {
                    geode,
                    mode: decode_enum(BillboardMode::from_i32(raw), "billboard mode", raw)?,
                    axis: self.read_vec3()?,
                    normal: self.read_vec3()?,
                    positions: self.read_vec3_array()?,
                });
                Ok(node)
            }
            tags::LIGHT_SOURCE => {
                self.expect_tag(tags::LIGHT_SOURCE, "LightSource")?;
                let (mut node, group) = self.read_group_level()?;
                let reference_frame = self.read_reference_frame()?;
                let light = if self.read_bool()? { Some(self.read_state_attribute()?) } else { None };
                node.kind = NodeKind::LightSource(LightSource { group, reference_frame, light });
                Ok(node)
            }
            tags::CLIP_NODE => {
                self.expect_tag(tags::CLIP_NODE, "ClipNode")?;
                let (mut node, group) = self.read_group_level()?;
                let reference_frame = self.read_reference_frame()?;
                let n = self.read_count()?;
                let mut clip_planes = Vec::with_capacity(n.min(64));
                for _ in 0..n {
                    clip_planes.push(self.read_state_attribute()?);
                }
                node.kind = NodeKind::ClipNode(ClipNode { group, reference_frame, clip_planes });
                Ok(node)
            }
            tags::SEQUENCE => {
                self.expect_tag(tags::SEQUENCE, "Sequence")?;
                let (mut node, group) = self.read_group_level()?;
                let times = self.read_double_array()?;
                let raw = self.read_int()?;
                let loop_mode = decode_enum(LoopMode::from_i32(raw), "loop mode", raw)?;
                let begin = self.read_int()?;
                let end = self.read_int()?;
                let speed = self.read_float()?;
                let num_repeats = self.read_int()?;
                let raw = self.read_int()?;
                let mode = decode_enum(SequenceMode::from_i32(raw), "sequence mode", raw)?;
                node.kind = NodeKind::Sequence(Sequence {
                    group,
                    times,
                    loop_mode,
                    begin,
                    end,
                    speed,
                    num_repeats,
                    mode,
                });
                Ok(node)
            }
            tags::TERRAIN_TILE => self.read_terrain_tile(),
            tags::VOLUME_TILE => self.read_volume_tile(),
            tags::ANISOTROPIC_LIGHTING => {
                self.expect_tag(tags::ANISOTROPIC_LIGHTING, "AnisotropicLighting")?;
                let (mut node, effect) = self.read_effect_level()?;
                let light_number = self.read_int()?;
                let lighting_map = if self.read_bool()? { Some(self.read_image()?) } else { None };
                node.kind = NodeKind::AnisotropicLighting(AnisotropicLighting {
                    effect,
                    light_number,
                    lighting_map,
                });
                Ok(node)
            }
            tags::SPECULAR_HIGHLIGHTS => {
                self.expect_tag(tags::SPECULAR_HIGHLIGHTS, "SpecularHighlights")?;
                let (mut node, effect) = self.read_effect_level()?;
                node.kind = NodeKind::SpecularHighlights(SpecularHighlights {
                    effect,
                    light_number: self.read_int()?,
                    texture_unit: self.read_int()?,
                    specular_color: self.read_vec4()?,
                    specular_exponent: self.read_float()?,
                });
                Ok(node)
            }
            tag => Err(Error::UnknownTypeTag { category: "Node", tag }),
        }
    }

    fn read_reference_frame(&mut self) -> Result<ReferenceFrame> {
        let raw = self.read_int()?;
        decode_enum(ReferenceFrame::from_i32(raw), "reference frame", raw)
    }

    fn read_node_level(&mut self) -> Result<Node> {
        self.expect_tag(tags::NODE, "Node")?;
        let mut node = Node { object: self.read_object_level()?, ..Node::default() };
        let core = &mut node.core;
        core.descriptions = self.read_string_array()?;
        core.node_mask = self.read_uint()?;
        if self.has(VERSION_0010) {
            core.culling_active = self.read_bool()?;
            if self.read_bool()? {
                core.initial_bound = Some(self.read_bounding_sphere()?);
            }
        }
        if self.read_bool()? {
            core.state_set = Some(self.read_state_set()?);
        }
        Ok(node)
    }

    fn read_group_level(&mut self) -> Result<(Node, Group)> {
        self.expect_tag(tags::GROUP, "Group")?;
        let node = self.read_node_level()?;
        let n = self.read_count()?;
        let mut children = Vec::with_capacity(n.min(4096));
        for _ in 0..n {
            children.push(self.read_node()?);
        }
        Ok((node, Group { children }))
    }

    fn read_transform_level(&mut self) -> Result<(Node, Group, ReferenceFrame)> {
        self.expect_tag(tags::TRANSFORM, "Transform")?;
        let (node, group) = self.read_group_level()?;
        let reference_frame = self.read_reference_frame()?;
        Ok((node, group, reference_frame))
    }

    fn read_lod_level(&mut self) -> Result<(Node, Lod)> {
        self.expect_tag(tags::LOD, "LOD")?;
        let (node, group) = self.read_group_level()?;
        let raw = self.read_int()?;
        let center_mode = decode_enum(CenterMode::from_i32(raw), "center mode", raw)?;
        let user_center = self.read_dvec3()?;
        let radius = self.read_double()?;
        let raw = self.read_int()?;
        let range_mode = decode_enum(RangeMode::from_i32(raw), "range mode", raw)?;
        let n = self.read_count()?;
        let mut ranges = Vec::with_capacity(n.min(4096));
        for _ in 0..n {
            ranges.push((self.read_float()?, self.read_float()?));
        }
        Ok((node, Lod { group, center_mode, user_center, radius, range_mode, ranges }))
    }

    fn read_geode_level(&mut self) -> Result<(Node, Geode)> {
        self.expect_tag(tags::GEODE, "Geode")?;
        let node = self.read_node_level()?;
        let n = self.read_count()?;
        let mut drawables = Vec::with_capacity(n.min(4096));
        for _ in 0..n {
            drawables.push(self.read_drawable()?);
        }
        Ok((node, Geode { drawables }))
    }

    fn read_effect_level(&mut self) -> Result<(Node, Effect)> {
        self.expect_tag(tags::EFFECT, "Effect")?;
        let (node, group) = self.read_group_level()?;
        let enabled = self.read_bool()?;
        let selected_technique = self.read_int()?;
        Ok((node, Effect { group, enabled, selected_technique }))
    }

    fn read_paged_lod(&mut self) -> Result<Node> {
        self.expect_tag(tags::PAGED_LOD, "PagedLOD")?;
        let (mut node, lod) = self.read_lod_level()?;
        let mut database_path = if self.has(VERSION_0026) { self.read_string()? } else { String::new() };
        if database_path.is_empty() {
            if let Some(first) = self.options.database_paths.first() {
                database_path = first.to_string_lossy().into_owned();
            }
        }
        let num_children_that_cannot_be_expired = self.read_uint()?;
        let n = self.read_count()?;
        let mut files = Vec::with_capacity(n.min(4096));
        for _ in 0..n {
            let file_name = self.read_string()?;
            let (priority_offset, priority_scale) = if self.has(VERSION_0026) {
                (self.read_float()?, self.read_float()?)
            } else {
                (0.0, 1.0)
            };
            files.push(PagedLodFile { file_name, priority_offset, priority_scale });
        }
        node.kind = NodeKind::PagedLod(PagedLod {
            lod,
            database_path,
            num_children_that_cannot_be_expired,
            files,
        });
        Ok(node)
    }

    fn read_proxy_node(&mut self) -> Result<Node> {
        self.expect_tag(tags::PROXY_NODE, "ProxyNode")?;
        let mut node = self.read_node_level()?;
        let raw = self.read_int()?;
        let center_mode = decode_enum(CenterMode::from_i32(raw), "center mode", raw)?;
        let user_center = self.read_dvec3()?;
        let radius = self.read_double()?;
        let raw = self.read_int()?;
        let loading_mode =
            decode_enum(LoadingExternalReferenceMode::from_i32(raw), "loading mode", raw)?;
        let database_path = self.read_string()?;
        let file_names = self.read_string_array()?;

        let n = self.read_count()?;
        let mut slots: Vec<(usize, NodeRef)> = Vec::with_capacity(n.min(4096));
        for _ in 0..n {
            let index = self.read_uint()? as usize;
            slots.push((index, self.read_node()?));
        }

        if !self.options.no_load_external_reference_files {
            for (index, file_name) in file_names.iter().enumerate() {
                if file_name.is_empty() || slots.iter().any(|(i, _)| *i == index) {
                    continue;
                }
                let mut options = self.options.nested();
                if !database_path.is_empty() {
                    options.database_paths.insert(0, database_path.clone().into());
                }
                match plugin::load_external_node(file_name, &options)? {
                    Some(child) => slots.push((index, child)),
                    None => warn!(file = %file_name, "ProxyNode child not found, skipping"),
                }
            }
        }
        slots.sort_by_key(|(i, _)| *i);
        debug!(children = slots.len(), files = file_names.len(), "read ProxyNode");

        node.kind = NodeKind::ProxyNode(ProxyNode {
            group: Group { children: slots.into_iter().map(|(_, c)| c).collect() },
            center_mode,
            user_center,
            radius,
            loading_mode,
            database_path,
            file_names,
        });
        Ok(node)
    }

    fn read_terrain_tile(&mut self) -> Result<Node> {
        self.expect_tag(tags::TERRAIN_TILE, "TerrainTile")?;
        let (mut node, group) = self.read_group_level()?;
        let tile_id = self.read_tile_id()?;
        let locator = if self.read_bool()? { Some(self.read_locator()?) } else { None };
        let elevation_layer = if self.read_bool()? { Some(self.read_layer()?) } else { None };
        let n = self.read_count()?;
        let mut color_layers = Vec::with_capacity(n.min(64));
        for _ in 0..n {
            color_layers.push(if self.read_bool()? { Some(self.read_layer()?) } else { None });
        }
        let requires_normals = self.read_bool()?;
        let treat_boundaries_to_valid_data_as_default_value = self.read_bool()?;
        let raw = self.read_int()?;
        let blending_policy = decode_enum(BlendingPolicy::from_i32(raw), "blending policy", raw)?;
        node.kind = NodeKind::TerrainTile(TerrainTile {
            group,
            tile_id,
            locator,
            elevation_layer,
            color_layers,
            requires_normals,
            treat_boundaries_to_valid_data_as_default_value,
            blending_policy,
        });
        Ok(node)
    }

    fn read_volume_tile(&mut self) -> Result<Node> {
        self.expect_tag(tags::VOLUME_TILE, "VolumeTile")?;
        let (mut node, group) = self.read_group_level()?;
        let tile_id = self.read_tile_id()?;
        let locator = if self.read_bool()? { Some(self.read_volume_locator()?) } else { None };
        let layer = if self.read_bool()? { Some(self.read_volume_layer()?) } else { None };
        node.kind = NodeKind::VolumeTile(VolumeTile { group, tile_id, locator, layer });
        Ok(node)
    }

    fn read_tile_id(&mut self) -> Result<TileId> {
        Ok(TileId { level: self.read_int()?, x: self.read_int()?, y: self.read_int()? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{ReadOptions, WriteOptions};
    use crate::util::{DMat4, DVec3};

    fn round_trip(root: &NodeRef, opts: WriteOptions) -> Result<NodeRef> {
        let mut out = DataOutputStream::new(Vec::new(), opts)?;
        out.write_node(root)?;
        let bytes = out.finish()?;
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default())?;
        inp.read_node()
    }

    #[test]
    fn test_matrix_transform_levels() {
        let leaf = Arc::new(Node::new("leaf", NodeKind::Node));
        let mt = MatrixTransform {
            group: Group { children: vec![leaf] },
            reference_frame: ReferenceFrame::Absolute,
            matrix: DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0)),
        };
        let mut node = Node::new("xf", NodeKind::MatrixTransform(mt));
        node.core.node_mask = 0x0f;
        let read = round_trip(&Arc::new(node), WriteOptions::new()).unwrap();
        assert_eq!(read.name(), "xf");
        assert_eq!(read.core.node_mask, 0x0f);
        match &read.kind {
            NodeKind::MatrixTransform(t) => {
                assert_eq!(t.reference_frame, ReferenceFrame::Absolute);
                assert_eq!(t.matrix.w_axis.truncate(), DVec3::new(1.0, 2.0, 3.0));
                assert_eq!(t.group.children[0].name(), "leaf");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_shared_child_read_once() {
        let shared = Arc::new(Node::new("shared", NodeKind::Node));
        let root = Arc::new(Node::group("root", vec![shared.clone(), shared]));
        let read = round_trip(&root, WriteOptions::new()).unwrap();
        let children = read.children();
        assert!(Arc::ptr_eq(&children[0], &children[1]));
    }

    #[test]
    fn test_specular_highlights_version_gate() {
        let node = Arc::new(Node::new(
            "fx",
            NodeKind::SpecularHighlights(SpecularHighlights::default()),
        ));
        let err = round_trip(&node, WriteOptions::new().with_version(VERSION_0039)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedInVersion { feature: "SpecularHighlights", .. }));
        let read = round_trip(&node, WriteOptions::new()).unwrap();
        assert!(matches!(read.kind, NodeKind::SpecularHighlights(_)));
    }

    #[test]
    fn test_sequence_and_switch() {
        let a = Arc::new(Node::new("a", NodeKind::Node));
        let b = Arc::new(Node::new("b", NodeKind::Node));
        let seq = Sequence {
            group: Group { children: vec![a.clone(), b.clone()] },
            times: vec![0.5, 1.5],
            loop_mode: LoopMode::Swing,
            num_repeats: 3,
            ..Sequence::default()
        };
        let switch = Switch {
            group: Group { children: vec![a, b] },
            new_child_default_value: false,
            values: vec![true, false],
        };
        let root = Arc::new(Node::group(
            "root",
            vec![
                Arc::new(Node::new("seq", NodeKind::Sequence(seq))),
                Arc::new(Node::new("sw", NodeKind::Switch(switch))),
            ],
        ));
        let read = round_trip(&root, WriteOptions::new()).unwrap();
        match (&read.children()[0].kind, &read.children()[1].kind) {
            (NodeKind::Sequence(s), NodeKind::Switch(sw)) => {
                assert_eq!(s.times, vec![0.5, 1.5]);
                assert_eq!(s.loop_mode, LoopMode::Swing);
                assert_eq!(s.num_repeats, 3);
                assert_eq!(sw.values, vec![true, false]);
                assert!(!sw.new_child_default_value);
                assert!(Arc::ptr_eq(&s.group.children[0], &sw.group.children[0]));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_node_tag() {
        let mut out = DataOutputStream::new(Vec::new(), WriteOptions::new()).unwrap();
        out.write_int(0).unwrap();
        out.write_int(0x5555).unwrap();
        let bytes = out.finish().unwrap();
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        let err = inp.read_node().unwrap_err();
        assert!(matches!(err, Error::UnknownTypeTag { category: "Node", tag: 0x5555 }));
    }
}
