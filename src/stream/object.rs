//! Object level and the generic object entry points.
//!
//! Every concrete type bottoms out in the object level: its tag, the name,
//! the data variance and (from `VERSION_0005`) optional user data. User data
//! reaches any category through [`DataOutputStream::write_object`], which
//! writes a category tag before delegating.

use std::io::{Read, Write};
use std::sync::Arc;

use tracing::debug;

use super::tags;
use super::version::VERSION_0005;
use super::{decode_enum, DataInputStream, DataOutputStream};
use crate::scene::{
    DataVariance, ObjectData, ShapeAttribute, ShapeAttributeList, ShapeAttributeValue, UserData,
};
use crate::util::{Error, Result};

const ATTRIBUTE_UNKNOWN: i32 = 0;
const ATTRIBUTE_INTEGER: i32 = 1;
const ATTRIBUTE_DOUBLE: i32 = 2;
const ATTRIBUTE_STRING: i32 = 3;

impl<W: Write> DataOutputStream<W> {
    pub(crate) fn write_object_level(&mut self, object: &ObjectData) -> Result<()> {
        self.write_int(tags::OBJECT)?;
        self.write_string(&object.name)?;
        self.write_uchar(object.data_variance as u8)?;
        match &object.user_data {
            Some(user_data) => {
                self.require("user data", VERSION_0005)?;
                self.write_bool(true)?;
                self.write_object(user_data)
            }
            None if self.has(VERSION_0005) => self.write_bool(false),
            None => Ok(()),
        }
    }

    /// Write an object of any category, preceded by its category tag.
    ///
    /// Objects the format cannot carry are written as [`tags::NO_OBJECT`].
    pub fn write_object(&mut self, object: &UserData) -> Result<()> {
        match object {
            UserData::Node(n) => {
                self.write_int(tags::NODE)?;
                self.write_node(n)
            }
            UserData::StateSet(s) => {
                self.write_int(tags::STATE_SET)?;
                self.write_state_set(s)
            }
            UserData::StateAttribute(a) => {
                self.write_int(tags::STATE_ATTRIBUTE)?;
                self.write_state_attribute(a)
            }
            UserData::Drawable(d) => {
                self.write_int(tags::DRAWABLE)?;
                self.write_drawable(d)
            }
            UserData::ShapeAttributes(list) => {
                self.write_int(tags::SHAPE_ATTRIBUTE_LIST)?;
                self.write_shape_attribute_list(list)
            }
            UserData::Unsupported { class_name } => {
                debug!(class_name = %class_name, "dropping object the IVE format cannot carry");
                self.write_int(tags::NO_OBJECT)
            }
        }
    }

    fn write_shape_attribute_list(&mut self, list: &Arc<ShapeAttributeList>) -> Result<()> {
        let (id, is_new) = self.tables.shape_attributes.get_or_assign(list);
        self.write_int(id)?;
        if !is_new {
            return Ok(());
        }
        self.write_object_level(&list.object)?;
        self.write_count(list.attributes.len())?;
        for attr in &list.attributes {
            self.write_string(&attr.name)?;
            match &attr.value {
                ShapeAttributeValue::Unknown => self.write_int(ATTRIBUTE_UNKNOWN)?,
                ShapeAttributeValue::Integer(v) => {
                    self.write_int(ATTRIBUTE_INTEGER)?;
                    self.write_int(*v)?;
                }
                ShapeAttributeValue::Double(v) => {
                    self.write_int(ATTRIBUTE_DOUBLE)?;
                    self.write_double(*v)?;
                }
                ShapeAttributeValue::String(v) => {
                    self.write_int(ATTRIBUTE_STRING)?;
                    self.write_string(v)?;
                }
            }
        }
        Ok(())
    }
}

impl<R: Read> DataInputStream<R> {
    pub(crate) fn read_object_level(&mut self) -> Result<ObjectData> {
        self.expect_tag(tags::OBJECT, "Object")?;
        let name = self.read_string()?;
        let raw = self.read_uchar()?;
        let data_variance = decode_enum(DataVariance::from_u8(raw), "data variance", raw as i32)?;
        let user_data = if self.has(VERSION_0005) && self.read_bool()? {
            self.read_object()?
        } else {
            None
        };
        Ok(ObjectData { name, data_variance, user_data })
    }

    /// Read an object written by `write_object`; `None` for the empty sentinel.
    pub fn read_object(&mut self) -> Result<Option<UserData>> {
        let category = self.read_int()?;
        Ok(Some(match category {
            tags::NO_OBJECT => return Ok(None),
            tags::NODE => UserData::Node(self.read_node()?),
            tags::STATE_SET => UserData::StateSet(self.read_state_set()?),
            tags::STATE_ATTRIBUTE => UserData::StateAttribute(self.read_state_attribute()?),
            tags::DRAWABLE => UserData::Drawable(self.read_drawable()?),
            tags::SHAPE_ATTRIBUTE_LIST => UserData::ShapeAttributes(self.read_shape_attribute_list()?),
            tag => return Err(Error::UnknownTypeTag { category: "Object", tag }),
        }))
    }

    fn read_shape_attribute_list(&mut self) -> Result<Arc<ShapeAttributeList>> {
        let id = self.read_int()?;
        if let Some(list) = self.tables.shape_attributes.get(id) {
            return Ok(list);
        }
        self.tables.shape_attributes.claim(id)?;
        let object = self.read_object_level()?;
        let n = self.read_count()?;
        let mut attributes = Vec::with_capacity(n.min(1024));
        for _ in 0..n {
            let name = self.read_string()?;
            let value = match self.read_int()? {
                ATTRIBUTE_UNKNOWN => ShapeAttributeValue::Unknown,
                ATTRIBUTE_INTEGER => ShapeAttributeValue::Integer(self.read_int()?),
                ATTRIBUTE_DOUBLE => ShapeAttributeValue::Double(self.read_double()?),
                ATTRIBUTE_STRING => ShapeAttributeValue::String(self.read_string()?),
                other => return Err(Error::invalid(format!("unknown shape attribute type {other}"))),
            };
            attributes.push(ShapeAttribute { name, value });
        }
        let list = Arc::new(ShapeAttributeList { object, attributes });
        self.tables.shape_attributes.insert(id, list.clone());
        Ok(list)
    }
}
