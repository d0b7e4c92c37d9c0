//! Volume layers, locators and properties.

use std::io::{Read, Write};
use std::sync::Arc;

use super::tags;
use super::version::VERSION_0039;
use super::{DataInputStream, DataOutputStream};
use crate::scene::{
    CompositeEntry, TransferFunction1D, VolumeLayer, VolumeLayerKind, VolumeLayerRef,
    VolumeLocator, VolumeLocatorRef, VolumeProperty, VolumePropertyKind, VolumePropertyRef,
};
use crate::util::{Error, Result};

impl<W: Write> DataOutputStream<W> {
    pub fn write_volume_locator(&mut self, locator: &VolumeLocatorRef) -> Result<()> {
        self.require("VolumeLocator", VERSION_0039)?;
        let (id, is_new) = self.tables.volume_locators.get_or_assign(locator);
        self.write_int(id)?;
        if is_new {
            self.write_int(tags::VOLUME_LOCATOR)?;
            self.write_object_level(&locator.object)?;
            self.write_matrixd(&locator.transform)?;
        }
        Ok(())
    }

    pub fn write_volume_layer(&mut self, layer: &VolumeLayerRef) -> Result<()> {
        self.require("VolumeLayer", VERSION_0039)?;
        let (id, is_new) = self.tables.volume_layers.get_or_assign(layer);
        self.write_int(id)?;
        if !is_new {
            return Ok(());
        }
        self.write_int(layer.kind.type_tag())?;
        self.write_int(tags::VOLUME_LAYER)?;
        self.write_object_level(&layer.object)?;
        self.write_string(&layer.file_name)?;
        self.write_bool(layer.locator.is_some())?;
        if let Some(locator) = &layer.locator {
            self.write_volume_locator(locator)?;
        }
        self.write_bool(layer.property.is_some())?;
        if let Some(property) = &layer.property {
            self.write_volume_property(property)?;
        }
        match &layer.kind {
            VolumeLayerKind::Image { image } => {
                self.write_bool(image.is_some())?;
                match image {
                    Some(image) => self.write_image(image),
                    None => Ok(()),
                }
            }
            VolumeLayerKind::Composite { layers } => {
                self.write_count(layers.len())?;
                for e in layers {
                    self.write_string(&e.file_name)?;
                    self.write_bool(e.layer.is_some())?;
                    if let Some(l) = &e.layer {
                        self.write_volume_layer(l)?;
                    }
                }
                Ok(())
            }
        }
    }

    pub fn write_volume_property(&mut self, property: &VolumePropertyRef) -> Result<()> {
        self.require("VolumeProperty", VERSION_0039)?;
        let (id, is_new) = self.tables.volume_properties.get_or_assign(property);
        self.write_int(id)?;
        if !is_new {
            return Ok(());
        }
        self.write_int(property.kind.type_tag())?;
        self.write_int(tags::VOLUME_PROPERTY)?;
        self.write_object_level(&property.object)?;
        match &property.kind {
            VolumePropertyKind::Composite { properties } => self.write_property_list(properties),
            VolumePropertyKind::Switch { properties, active_property } => {
                self.write_property_list(properties)?;
                self.write_int(*active_property)
            }
            VolumePropertyKind::TransferFunction { function } => {
                self.write_bool(function.is_some())?;
                if let Some(tf) = function {
                    self.write_count(tf.color_map.len())?;
                    for (value, color) in &tf.color_map {
                        self.write_float(*value)?;
                        self.write_vec4(*color)?;
                    }
                }
                Ok(())
            }
            VolumePropertyKind::IsoSurface(v)
            | VolumePropertyKind::AlphaFunc(v)
            | VolumePropertyKind::SampleDensity(v)
            | VolumePropertyKind::Transparency(v) => {
                self.write_int(tags::SCALAR_PROPERTY)?;
                self.write_float(*v)
            }
            VolumePropertyKind::MaximumIntensityProjection | VolumePropertyKind::Lighting => Ok(()),
        }
    }

    fn write_property_list(&mut self, properties: &[VolumePropertyRef]) -> Result<()> {
        self.write_count(properties.len())?;
        for p in properties {
            self.write_volume_property(p)?;
        }
        Ok(())
    }
}

impl<R: Read> DataInputStream<R> {
    pub fn read_volume_locator(&mut self) -> Result<VolumeLocatorRef> {
        let id = self.read_int()?;
        if let Some(l) = self.tables.volume_locators.get(id) {
            return Ok(l);
        }
        self.tables.volume_locators.claim(id)?;
        let tag = self.read_int()?;
        if tag != tags::VOLUME_LOCATOR {
            return Err(Error::UnknownTypeTag { category: "VolumeLocator", tag });
        }
        let locator = Arc::new(VolumeLocator {
            object: self.read_object_level()?,
            transform: self.read_matrixd()?,
        });
        self.tables.volume_locators.insert(id, locator.clone());
        Ok(locator)
    }

    pub fn read_volume_layer(&mut self) -> Result<VolumeLayerRef> {
        let id = self.read_int()?;
        if let Some(l) = self.tables.volume_layers.get(id) {
            return Ok(l);
        }
        self.tables.volume_layers.claim(id)?;
        let tag = self.read_int()?;
        if !matches!(tag, tags::VOLUME_IMAGE_LAYER | tags::VOLUME_COMPOSITE_LAYER) {
            return Err(Error::UnknownTypeTag { category: "VolumeLayer", tag });
        }
        self.expect_tag(tags::VOLUME_LAYER, "VolumeLayer")?;
        let object = self.read_object_level()?;
        let file_name = self.read_string()?;
        let locator = if self.read_bool()? { Some(self.read_volume_locator()?) } else { None };
        let property = if self.read_bool()? { Some(self.read_volume_property()?) } else { None };
        let kind = if tag == tags::VOLUME_IMAGE_LAYER {
            VolumeLayerKind::Image { image: if self.read_bool()? { Some(self.read_image()?) } else { None } }
        } else {
            let n = self.read_count()?;
            let mut layers = Vec::with_capacity(n.min(256));
            for _ in 0..n {
                let file_name = self.read_string()?;
                let layer = if self.read_bool()? { Some(self.read_volume_layer()?) } else { None };
                layers.push(CompositeEntry { file_name, layer });
            }
            VolumeLayerKind::Composite { layers }
        };
        let layer = Arc::new(VolumeLayer { object, file_name, locator, property, kind });
        self.tables.volume_layers.insert(id, layer.clone());
        Ok(layer)
    }

    pub fn read_volume_property(&mut self) -> Result<VolumePropertyRef> {
        let id = self.read_int()?;
        if let Some(p) = self.tables.volume_properties.get(id) {
            return Ok(p);
        }
        self.tables.volume_properties.claim(id)?;
        let tag = self.read_int()?;
        if !is_property_tag(tag) {
            return Err(Error::UnknownTypeTag { category: "VolumeProperty", tag });
        }
        self.expect_tag(tags::VOLUME_PROPERTY, "VolumeProperty")?;
        let object = self.read_object_level()?;
        let kind = match tag {
            tags::COMPOSITE_PROPERTY => VolumePropertyKind::Composite { properties: self.read_property_list()? },
            tags::SWITCH_PROPERTY => VolumePropertyKind::Switch {
                properties: self.read_property_list()?,
                active_property: self.read_int()?,
            },
            tags::TRANSFER_FUNCTION_PROPERTY => {
                let function = if self.read_bool()? {
                    let n = self.read_count()?;
                    let mut color_map = Vec::with_capacity(n.min(4096));
                    for _ in 0..n {
                        color_map.push((self.read_float()?, self.read_vec4()?));
                    }
                    Some(TransferFunction1D { color_map })
                } else {
                    None
                };
                VolumePropertyKind::TransferFunction { function }
            }
            tags::MIP_PROPERTY => VolumePropertyKind::MaximumIntensityProjection,
            tags::LIGHTING_PROPERTY => VolumePropertyKind::Lighting,
            scalar => {
                self.expect_tag(tags::SCALAR_PROPERTY, "ScalarProperty")?;
                let v = self.read_float()?;
                match scalar {
                    tags::ISO_SURFACE_PROPERTY => VolumePropertyKind::IsoSurface(v),
                    tags::ALPHA_FUNC_PROPERTY => VolumePropertyKind::AlphaFunc(v),
                    tags::SAMPLE_DENSITY_PROPERTY => VolumePropertyKind::SampleDensity(v),
                    _ => VolumePropertyKind::Transparency(v),
                }
            }
        };
        let property = Arc::new(VolumeProperty { object, kind });
        self.tables.volume_properties.insert(id, property.clone());
        Ok(property)
    }

    fn read_property_list(&mut self) -> Result<Vec<VolumePropertyRef>> {
        let n = self.read_count()?;
        let mut properties = Vec::with_capacity(n.min(256));
        for _ in 0..n {
            properties.push(self.read_volume_property()?);
        }
        Ok(properties)
    }
}

fn is_property_tag(tag: i32) -> bool {
    matches!(
        tag,
        tags::COMPOSITE_PROPERTY
            | tags::SWITCH_PROPERTY
            | tags::TRANSFER_FUNCTION_PROPERTY
            | tags::ISO_SURFACE_PROPERTY
            | tags::ALPHA_FUNC_PROPERTY
            | tags::SAMPLE_DENSITY_PROPERTY
            | tags::TRANSPARENCY_PROPERTY
            | tags::MIP_PROPERTY
            | tags::LIGHTING_PROPERTY
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{ReadOptions, WriteOptions};
    use crate::util::{DMat4, DVec3, Vec4};

    #[test]
    fn test_property_tree_round_trip() {
        let density = Arc::new(VolumeProperty::new(VolumePropertyKind::SampleDensity(0.005)));
        let tf = Arc::new(VolumeProperty::new(VolumePropertyKind::TransferFunction {
            function: Some(TransferFunction1D {
                color_map: vec![(0.0, Vec4::ZERO), (1.0, Vec4::ONE)],
            }),
        }));
        let composite = Arc::new(VolumeProperty::new(VolumePropertyKind::Composite {
            properties: vec![density.clone(), tf, density, Arc::new(VolumeProperty::new(VolumePropertyKind::Lighting))],
        }));
        let locator = Arc::new(VolumeLocator {
            object: Default::default(),
            transform: DMat4::from_scale(DVec3::splat(2.0)),
        });
        let mut layer = VolumeLayer::new(VolumeLayerKind::Image { image: None });
        layer.locator = Some(locator);
        layer.property = Some(composite);
        let layer = Arc::new(layer);

        let mut out = DataOutputStream::new(Vec::new(), WriteOptions::new()).unwrap();
        out.write_volume_layer(&layer).unwrap();
        let bytes = out.finish().unwrap();
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        let read = inp.read_volume_layer().unwrap();

        assert_eq!(read.locator.as_ref().unwrap().transform, DMat4::from_scale(DVec3::splat(2.0)));
        match &read.property.as_ref().unwrap().kind {
            VolumePropertyKind::Composite { properties } => {
                assert_eq!(properties.len(), 4);
                assert_eq!(properties[0].kind.scalar(), Some(0.005));
                assert!(Arc::ptr_eq(&properties[0], &properties[2]));
                assert!(matches!(
                    &properties[1].kind,
                    VolumePropertyKind::TransferFunction { function: Some(tf) } if tf.color_map.len() == 2
                ));
                assert!(matches!(properties[3].kind, VolumePropertyKind::Lighting));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_property_tag() {
        let mut out = DataOutputStream::new(Vec::new(), WriteOptions::new()).unwrap();
        out.write_int(0).unwrap();
        out.write_int(tags::LAYER).unwrap();
        let bytes = out.finish().unwrap();
        let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        let err = inp.read_volume_property().unwrap_err();
        assert!(matches!(err, Error::UnknownTypeTag { category: "VolumeProperty", .. }));
    }
}
