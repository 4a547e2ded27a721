//! Attribute dictionary
//!
//! The state machine never hard-codes attribute layouts. It asks an injected
//! [`AttributeDictionary`] to build attributes, find them in a set and tell
//! which ones belong to the encrypted category. [`SimDictionary`] describes
//! the RFC 4187 / RFC 5448 attribute space.

use crate::attr::{AttrValue, Attribute, AttributeSet};
use crate::error::CodecError;
use crate::types::{AttrType, EAP_AKA_RES_MAX_LEN, EAP_AKA_RES_MIN_LEN};

/// On-the-wire layout of an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// 2 reserved bytes then exactly `n` bytes
    Fixed(usize),
    /// Exactly `n` bytes without reserved bytes
    Raw(usize),
    /// 2 reserved bytes then a multiple of 4 bytes
    Reserved,
    /// 2-byte length in bits then the value, zero padded
    BitLength,
    /// 2-byte length in bytes then the value, zero padded
    ByteLength,
    /// 2 reserved bytes, presence only
    Flag,
    /// 2-byte big endian value
    U16,
}

/// Dictionary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrDef {
    pub attr_type: AttrType,
    pub name: &'static str,
    pub format: WireFormat,
    /// Carried inside AT_ENCR_DATA, or part of the encryption envelope
    pub encrypted: bool,
}

const fn def(attr_type: AttrType, name: &'static str, format: WireFormat, encrypted: bool) -> AttrDef {
    AttrDef { attr_type, name, format, encrypted }
}

static SIM_ATTRIBUTES: &[AttrDef] = &[
    def(AttrType::Rand, "AT_RAND", WireFormat::Fixed(16), false),
    def(AttrType::Autn, "AT_AUTN", WireFormat::Fixed(16), false),
    def(AttrType::Res, "AT_RES", WireFormat::BitLength, false),
    def(AttrType::Auts, "AT_AUTS", WireFormat::Raw(14), false),
    def(AttrType::Padding, "AT_PADDING", WireFormat::Reserved, true),
    def(AttrType::PermanentIdReq, "AT_PERMANENT_ID_REQ", WireFormat::Flag, false),
    def(AttrType::Mac, "AT_MAC", WireFormat::Fixed(16), false),
    def(AttrType::Notification, "AT_NOTIFICATION", WireFormat::U16, false),
    def(AttrType::AnyIdReq, "AT_ANY_ID_REQ", WireFormat::Flag, false),
    def(AttrType::Identity, "AT_IDENTITY", WireFormat::ByteLength, false),
    def(AttrType::FullauthIdReq, "AT_FULLAUTH_ID_REQ", WireFormat::Flag, false),
    def(AttrType::Counter, "AT_COUNTER", WireFormat::U16, true),
    def(AttrType::CounterTooSmall, "AT_COUNTER_TOO_SMALL", WireFormat::Flag, true),
    def(AttrType::NonceS, "AT_NONCE_S", WireFormat::Fixed(16), true),
    def(AttrType::ClientErrorCode, "AT_CLIENT_ERROR_CODE", WireFormat::U16, false),
    def(AttrType::KdfInput, "AT_KDF_INPUT", WireFormat::ByteLength, false),
    def(AttrType::Kdf, "AT_KDF", WireFormat::U16, false),
    def(AttrType::Iv, "AT_IV", WireFormat::Fixed(16), true),
    def(AttrType::EncrData, "AT_ENCR_DATA", WireFormat::Reserved, true),
    def(AttrType::NextPseudonym, "AT_NEXT_PSEUDONYM", WireFormat::ByteLength, true),
    def(AttrType::NextReauthId, "AT_NEXT_REAUTH_ID", WireFormat::ByteLength, true),
    def(AttrType::Checkcode, "AT_CHECKCODE", WireFormat::Reserved, false),
    def(AttrType::ResultInd, "AT_RESULT_IND", WireFormat::Flag, false),
    def(AttrType::Bidding, "AT_BIDDING", WireFormat::U16, false),
];

/// Attribute dictionary capability injected into composer, verifier and codec
pub trait AttributeDictionary: Send + Sync {
    /// Look up the definition of an attribute
    fn lookup(&self, attr_type: AttrType) -> Option<&AttrDef>;

    fn name(&self, attr_type: AttrType) -> &'static str {
        self.lookup(attr_type).map(|d| d.name).unwrap_or("AT_UNKNOWN")
    }

    fn is_encrypted(&self, attr_type: AttrType) -> bool {
        self.lookup(attr_type).map(|d| d.encrypted).unwrap_or(false)
    }

    /// Build an attribute of kind `attr_type` carrying `value`
    fn build(&self, attr_type: AttrType, value: AttrValue) -> Result<Attribute, CodecError> {
        let def = self
            .lookup(attr_type)
            .ok_or(CodecError::UnknownAttribute(attr_type as u8))?;
        validate(def, &value)?;
        Ok(Attribute { attr_type, value })
    }

    /// Find the first attribute of kind `attr_type` in `set`
    fn find<'a>(&self, set: &'a AttributeSet, attr_type: AttrType) -> Option<&'a Attribute> {
        set.find(attr_type)
    }
}

/// Check that `value` fits the wire format of `def`
pub fn validate(def: &AttrDef, value: &AttrValue) -> Result<(), CodecError> {
    let ok = match (def.format, value) {
        (WireFormat::Flag, AttrValue::Flag) => true,
        (WireFormat::U16, AttrValue::U16(_)) => true,
        (WireFormat::Fixed(n), AttrValue::Octets(v)) | (WireFormat::Raw(n), AttrValue::Octets(v)) => {
            v.len() == n
        }
        (WireFormat::Reserved, AttrValue::Octets(v)) => v.len() % 4 == 0 && v.len() <= 1016,
        (WireFormat::BitLength, AttrValue::Octets(v)) => {
            (EAP_AKA_RES_MIN_LEN..=EAP_AKA_RES_MAX_LEN).contains(&v.len())
        }
        (WireFormat::ByteLength, AttrValue::Octets(v)) => v.len() <= 1016,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(CodecError::InvalidAttributeValue(def.name))
    }
}

/// Dictionary for the EAP-SIM/AKA/AKA' attribute namespace
#[derive(Debug, Clone, Copy, Default)]
pub struct SimDictionary;

impl AttributeDictionary for SimDictionary {
    fn lookup(&self, attr_type: AttrType) -> Option<&AttrDef> {
        SIM_ATTRIBUTES.iter().find(|d| d.attr_type == attr_type)
    }
}
