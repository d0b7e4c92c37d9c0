//! Terrain layers and locators.
//!
//! Both categories keep their own identity tables; a layer id and a node id
//! of the same value are unrelated.

use std::io::{Read, Write};
use std::sync::Arc;

use super::tags;
use super::version::VERSION_0030;
use super::{decode_enum, DataInputStream, DataOutputStream};
use crate::scene::{
    CompositeEntry, CoordinateSystemType, Layer, LayerKind, LayerRef, Locator, LocatorRef,
};
use crate::util::{Error, Result};

impl<W: Write> DataOutputStream<W> {
    pub fn write_locator(&mut self, locator: &LocatorRef) -> Result<()> {
        self.require("Locator", VERSION_0030)?;
        let (id, is_new) = self.tables.locators.get_or_assign(locator);
        self.write_int(id)?;
        if !is_new {
            return Ok(());
        }
        self.write_int(tags::LOCATOR)?;
        self.write_object_level(&locator.object)?;
        self.write_int(locator.coordinate_system_type as i32)?;
        self.write_string(&locator.format)?;
        self.write_string(&locator.coordinate_system)?;
        self.write_double(locator.equatorial_radius)?;
        self.write_double(locator.polar_radius)?;
        self.write_matrixd(&locator.transform)?;
        self.write_bool(locator.define_as)?;
        self.write_bool(locator.transform_scaled_by_resolution)
    }

    pub fn write_layer(&mut self, layer: &LayerRef) -> Result<()> {
        self.require("Layer", VERSION_0030)?;
        let (id, is_new) = self.tables.layers.get_or_assign(layer);
        self.write_int(id)?;
        if !is_new {
            return Ok(());
        }
        self.write_int(layer.kind.type_tag())?;
        self.write_int(tags::LAYER)?;
        self.write_object_level(&layer.object)?;
        self.write_string(&layer.file_name)?;
        self.write_bool(layer.locator.is_some())?;
        if let Some(locator) = &layer.locator {
            self.write_locator(locator)?;
        }
        self.write_uint(layer.min_level)?;
        self.write_uint(layer.max_level)?;
        self.write_uint(layer.min_filter)?;
        self.write_uint(layer.mag_filter)?;

        match &layer.kind {
            LayerKind::Image { image } => {
                self.write_bool(image.is_some())?;
                match image {
                    Some(image) => self.write_image(image),
                    None => Ok(()),
                }
            }
            LayerKind::HeightField { height_field } => {
                self.write_bool(height_field.is_some())?;
                match height_field {
                    Some(hf) => self.write_shape(hf),
                    None => Ok(()),
                }
            }
            LayerKind::Composite { layers } => self.write_layer_entries(layers),
            LayerKind::Switch { layers, active_layer } => {
                self.write_layer_entries(layers)?;
                self.write_int(*active_layer)
            }
            LayerKind::Proxy => Ok(()),
        }
    }

    /// Entries loaded from a file keep only the name.
    fn write_layer_entries(&mut self, entries: &[CompositeEntry<Layer>]) -> Result<()> {
        self.write_count(entries.len())?;
        for e in entries {
            self.write_string(&e.file_name)?;
            self.write_bool(e.layer.is_some())?;
            if let Some(layer) = &e.layer {
                self.write_layer(layer)?;
            }
        }
        Ok(())
    }
}

impl<R: Read> DataInputStream<R> {
    pub fn read_locator(&mut self) -> Result<LocatorRef> {
        let id = self.read_int()?;
        if let Some(l) = self.tables.locators.get(id) {
            return Ok(l);
        }
        self.tables.locators.claim(id)?;
        self.expect_tag(tags::LOCATOR, "Locator")?;
        let object = self.read_object_level()?;
        let raw = self.read_int()?;
        let locator = Arc::new(Locator {
            object,
            coordinate_system_type: decode_enum(
                CoordinateSystemType::from_i32(raw),
                "coordinate system type",
                raw,
            )?,
            format: self.read_string()?,
            coordinate_system: self.read_string()?,
            equatorial_radius: self.read_double()?,
            polar_radius: self.read_double()?,
            transform: self.read_matrixd()?,
            define_as: self.read_bool()?,
            transform_scaled_by_resolution: self.read_bool()?,
        });
        self.tables.locators.insert(id, locator.clone());
        Ok(locator)
    }

    pub fn read_layer(&mut self) -> Result<LayerRef> {
        let id = self.read_int()?;
        if let Some(l) = self.tables.layers.get(id) {
            return Ok(l);
        }
        self.tables.layers.claim(id)?;
        let tag = self.read_int()?;
        if !matches!(
            tag,
            tags::IMAGE_LAYER
                | tags::HEIGHT_FIELD_LAYER
                | tags::COMPOSITE_LAYER
                | tags::SWITCH_LAYER
                | tags::PROXY_LAYER
        ) {
            return Err(Error::UnknownTypeTag { category: "Layer", tag });
        }
        self.expect_tag(tags::LAYER, "Layer")?;
        let object = self.read_object_level()?;
        let file_name = self.read_string()?;
        let locator = if self.read_bool()? { Some(self.read_locator()?) } else { None };
        let min_level = self.read_uint()?;
        let max_level = self.read_uint()?;
        let min_filter = self.read_uint()?;
        let mag_filter = self.read_uint()?;

        let kind = match tag {
            tags::IMAGE_LAYER => {
                LayerKind::Image { image: if self.read_bool()? { Some(self.read_image()?) } else { None } }
            }
            tags::HEIGHT_FIELD_LAYER => LayerKind::HeightField {
                height_field: if self.read_bool()? { Some(self.read_shape()?) } else { None },
            },
            tags::COMPOSITE_LAYER => LayerKind::Composite { layers: self.read_layer_entries()? },
            tags::SWITCH_LAYER => LayerKind::Switch {
                layers: self.read_layer_entries()?,
                active_layer: self.read_int()?,
            },
            _ => LayerKind::Proxy,
        };
        let layer = Arc::new(Layer {
            object,
            file_name,
            locator,
            min_level,
            max_level,
            min_filter,
            mag_filter,
            kind,
        });
        self.tables.layers.insert(id, layer.clone());
        Ok(layer)
    }

    fn read_layer_entries(&mut self) -> Result<Vec<CompositeEntry<Layer>>> {
        let n = self.read_count()?;
        let mut entries = Vec::with_capacity(n.min(256));
        for _ in 0..n {
            let file_name = self.read_string()?;
            let layer = if self.read_bool()? { Some(self.read_layer()?) } else { None };
            entries.push(CompositeEntry { file_name, layer });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{image_layer, gl, HeightField, Image, Shape, ShapeKind};
    use crate::stream::version::VERSION_0026;
    use crate::stream::{ReadOptions, WriteOptions};

    fn round_trip(layer: &LayerRef) -> LayerRef {
        let mut out = DataOutputStream::new(Vec::new(), WriteOptions::new()).unwrap();
        out.write_layer(layer).unwrap();
        let bytes = out.finish().unwrap();
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        inp.read_layer().unwrap()
    }

    #[test]
    fn test_switch_layer_shares_locator() {
        let locator = Arc::new(Locator {
            coordinate_system_type: CoordinateSystemType::Geographic,
            format: "WKT".into(),
            ..Locator::default()
        });
        let pixels = Image::from_u8(2, 2, gl::GL_LUMINANCE, vec![1, 2, 3, 4]);
        let color = image_layer(Arc::new(pixels), Some(locator.clone()));
        let mut elevation = Layer::new(LayerKind::HeightField {
            height_field: Some(Arc::new(Shape::new(ShapeKind::HeightField(HeightField::allocate(2, 2))))),
        });
        elevation.locator = Some(locator);
        let switch = Arc::new(Layer::new(LayerKind::Switch {
            layers: vec![
                CompositeEntry::inline(color),
                CompositeEntry::inline(Arc::new(elevation)),
                CompositeEntry::file("tiles/far.ive"),
            ],
            active_layer: 1,
        }));

        let read = round_trip(&switch);
        match &read.kind {
            LayerKind::Switch { layers, active_layer } => {
                assert_eq!(*active_layer, 1);
                assert_eq!(layers[2].file_name, "tiles/far.ive");
                assert!(layers[2].layer.is_none());
                let a = layers[0].layer.as_ref().and_then(|l| l.locator.clone()).unwrap();
                let b = layers[1].layer.as_ref().and_then(|l| l.locator.clone()).unwrap();
                assert!(Arc::ptr_eq(&a, &b));
                assert_eq!(a.format, "WKT");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_layers_need_version_30() {
        let layer = Arc::new(Layer::new(LayerKind::Proxy));
        let mut out = DataOutputStream::new(Vec::new(), WriteOptions::new().with_version(VERSION_0026)).unwrap();
        let err = out.write_layer(&layer).unwrap_err();
        assert!(matches!(err, Error::UnsupportedInVersion { feature: "Layer", .. }));
    }
}
