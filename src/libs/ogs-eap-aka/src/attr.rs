//! Typed EAP-AKA attribute model

use crate::types::{AttrType, EapAkaSubtype};

/// Decoded attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Presence-only attribute (AT_ANY_ID_REQ, AT_RESULT_IND, ...)
    Flag,
    /// 16-bit value (AT_NOTIFICATION, AT_KDF, ...)
    U16(u16),
    /// Octet string value without reserved bytes or padding
    Octets(Vec<u8>),
}

impl AttrValue {
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            AttrValue::U16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_octets(&self) -> Option<&[u8]> {
        match self {
            AttrValue::Octets(v) => Some(v),
            _ => None,
        }
    }
}

/// A single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub attr_type: AttrType,
    pub value: AttrValue,
}

impl Attribute {
    pub fn flag(attr_type: AttrType) -> Self {
        Self { attr_type, value: AttrValue::Flag }
    }

    pub fn u16(attr_type: AttrType, v: u16) -> Self {
        Self { attr_type, value: AttrValue::U16(v) }
    }

    pub fn octets(attr_type: AttrType, v: impl Into<Vec<u8>>) -> Self {
        Self { attr_type, value: AttrValue::Octets(v.into()) }
    }
}

/// Ordered attribute set of one EAP-AKA message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    /// Message subtype; `None` when the peer sent one we don't recognise
    pub subtype: Option<EapAkaSubtype>,
    attrs: Vec<Attribute>,
}

impl AttributeSet {
    pub fn new(subtype: EapAkaSubtype) -> Self {
        Self { subtype: Some(subtype), attrs: Vec::new() }
    }

    pub fn push(&mut self, attr: Attribute) {
        self.attrs.push(attr);
    }

    /// Replace the first attribute of the same type, or append
    pub fn replace(&mut self, attr: Attribute) {
        match self.attrs.iter_mut().find(|a| a.attr_type == attr.attr_type) {
            Some(existing) => *existing = attr,
            None => self.attrs.push(attr),
        }
    }

    pub fn find(&self, attr_type: AttrType) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.attr_type == attr_type)
    }

    pub fn find_mut(&mut self, attr_type: AttrType) -> Option<&mut Attribute> {
        self.attrs.iter_mut().find(|a| a.attr_type == attr_type)
    }

    pub fn contains(&self, attr_type: AttrType) -> bool {
        self.find(attr_type).is_some()
    }

    pub fn remove(&mut self, attr_type: AttrType) -> Option<Attribute> {
        let pos = self.attrs.iter().position(|a| a.attr_type == attr_type)?;
        Some(self.attrs.remove(pos))
    }

    pub fn retain(&mut self, f: impl FnMut(&Attribute) -> bool) {
        self.attrs.retain(f);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}
