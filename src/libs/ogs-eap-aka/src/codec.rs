//! EAP-AKA attribute codec
//!
//! [`AttributeCodec`] turns an [`AttributeSet`] into a signed EAP packet and
//! back. [`SimCodec`] implements the RFC 4187 layout: Type(1) Length(1, in
//! 4-byte words) Value, with AT_MAC signing and AT_ENCR_DATA handling.

use std::sync::Arc;

use ogs_crypt::aes::{aes128_cbc_decrypt, aes128_cbc_encrypt, AES_BLOCK_SIZE};
use ogs_crypt::sha::hmac;
use rand::RngCore;

use crate::attr::{AttrValue, Attribute, AttributeSet};
use crate::dict::{validate, AttrDef, AttributeDictionary, SimDictionary, WireFormat};
use crate::error::CodecError;
use crate::packet::{EapHeader, EapPacket, EAP_HEADER_LEN};
use crate::types::{AttrType, EapAkaSubtype, EapMethod, EAP_AKA_IV_LEN, EAP_AKA_MAC_LEN};

/// Subtype(1) + Reserved(2)
const AKA_HEADER_LEN: usize = 3;
/// Offset of the first attribute within an encoded EAP packet
const ATTRS_OFFSET: usize = EAP_HEADER_LEN + 1 + AKA_HEADER_LEN;
const MAX_ATTR_WORDS: usize = 255;

/// Keys and variant the codec needs for one message
#[derive(Debug, Clone, Copy)]
pub struct CodecContext<'a> {
    pub method: EapMethod,
    /// Signs AT_MAC
    pub k_aut: Option<&'a [u8]>,
    /// Encrypts and decrypts AT_ENCR_DATA
    pub k_encr: Option<&'a [u8; 16]>,
}

impl<'a> CodecContext<'a> {
    /// Context before any keys exist
    pub fn unkeyed(method: EapMethod) -> Self {
        Self { method, k_aut: None, k_encr: None }
    }
}

/// Attribute encode/decode collaborator
pub trait AttributeCodec: Send + Sync {
    /// Decode the type-data of an EAP-AKA packet (subtype onwards)
    fn decode(&self, type_data: &[u8], ctx: &CodecContext<'_>) -> Result<AttributeSet, CodecError>;

    /// Encode a complete EAP packet, signing AT_MAC if present
    fn encode(
        &self,
        header: &EapHeader,
        attrs: &AttributeSet,
        ctx: &CodecContext<'_>,
    ) -> Result<Vec<u8>, CodecError>;

    /// Copy of an encoded packet with the AT_MAC value zeroed, `None` without AT_MAC
    fn mac_input(&self, packet: &[u8]) -> Result<Option<Vec<u8>>, CodecError>;

    fn dictionary(&self) -> &dyn AttributeDictionary;
}

/// HMAC-SHA1-128 (AKA) or HMAC-SHA256-128 (AKA') over `data`
pub fn compute_mac(method: EapMethod, k_aut: &[u8], data: &[u8]) -> [u8; EAP_AKA_MAC_LEN] {
    let full = hmac(method.hash(), k_aut, &[data]);
    let mut mac = [0u8; EAP_AKA_MAC_LEN];
    mac.copy_from_slice(&full[..EAP_AKA_MAC_LEN]);
    mac
}

/// RFC 4187 attribute codec
#[derive(Clone)]
pub struct SimCodec {
    dict: Arc<dyn AttributeDictionary>,
}

impl Default for SimCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl SimCodec {
    pub fn new() -> Self {
        Self { dict: Arc::new(SimDictionary) }
    }

    pub fn with_dictionary(dict: Arc<dyn AttributeDictionary>) -> Self {
        Self { dict }
    }

    fn lookup(&self, attr_type: AttrType) -> Result<&AttrDef, CodecError> {
        self.dict
            .lookup(attr_type)
            .ok_or(CodecError::UnknownAttribute(attr_type as u8))
    }

    /// Append one attribute, returns the offset of its value within `out`
    fn write_attr(&self, out: &mut Vec<u8>, attr: &Attribute) -> Result<usize, CodecError> {
        let def = self.lookup(attr.attr_type)?;
        validate(def, &attr.value)?;

        let mut body = Vec::new();
        match (def.format, &attr.value) {
            (WireFormat::Flag, _) => body.extend_from_slice(&[0, 0]),
            (WireFormat::U16, AttrValue::U16(v)) => body.extend_from_slice(&v.to_be_bytes()),
            (WireFormat::Fixed(_), AttrValue::Octets(v)) | (WireFormat::Reserved, AttrValue::Octets(v)) => {
                body.extend_from_slice(&[0, 0]);
                body.extend_from_slice(v);
            }
            (WireFormat::Raw(_), AttrValue::Octets(v)) => body.extend_from_slice(v),
            (WireFormat::BitLength, AttrValue::Octets(v)) => {
                body.extend_from_slice(&((v.len() * 8) as u16).to_be_bytes());
                body.extend_from_slice(v);
            }
            (WireFormat::ByteLength, AttrValue::Octets(v)) => {
                body.extend_from_slice(&(v.len() as u16).to_be_bytes());
                body.extend_from_slice(v);
            }
            _ => return Err(CodecError::InvalidAttributeValue(def.name)),
        }
        while (body.len() + 2) % 4 != 0 {
            body.push(0);
        }

        let words = (body.len() + 2) / 4;
        if words > MAX_ATTR_WORDS {
            return Err(CodecError::MessageTooLong(body.len() + 2));
        }

        let start = out.len();
        out.push(attr.attr_type as u8);
        out.push(words as u8);
        out.extend_from_slice(&body);
        Ok(start)
    }

    /// Serialize encrypted-category attributes into AT_IV + AT_ENCR_DATA
    fn encrypt_attrs(
        &self,
        inner: &[&Attribute],
        k_encr: &[u8; 16],
    ) -> Result<(Attribute, Attribute), CodecError> {
        let mut plain = Vec::new();
        for attr in inner {
            self.write_attr(&mut plain, attr)?;
        }
        let rem = plain.len() % AES_BLOCK_SIZE;
        if rem != 0 {
            let pad = Attribute::octets(AttrType::Padding, vec![0u8; AES_BLOCK_SIZE - rem - 4]);
            self.write_attr(&mut plain, &pad)?;
        }

        let mut iv = [0u8; EAP_AKA_IV_LEN];
        rand::rng().fill_bytes(&mut iv);
        let cipher = aes128_cbc_encrypt(k_encr, &iv, &plain)?;

        Ok((
            Attribute::octets(AttrType::Iv, iv.to_vec()),
            Attribute::octets(AttrType::EncrData, cipher),
        ))
    }

    fn read_value(&self, def: &AttrDef, body: &[u8]) -> Result<AttrValue, CodecError> {
        let bad_length = || CodecError::InvalidAttributeLength { name: def.name, actual: body.len() + 2 };
        let value = match def.format {
            WireFormat::Flag => AttrValue::Flag,
            WireFormat::U16 => {
                if body.len() < 2 {
                    return Err(bad_length());
                }
                AttrValue::U16(u16::from_be_bytes([body[0], body[1]]))
            }
            WireFormat::Fixed(n) => {
                if body.len() != padded_body_len(2 + n) {
                    return Err(bad_length());
                }
                AttrValue::Octets(body[2..2 + n].to_vec())
            }
            WireFormat::Raw(n) => {
                if body.len() != padded_body_len(n) {
                    return Err(bad_length());
                }
                AttrValue::Octets(body[..n].to_vec())
            }
            WireFormat::Reserved => AttrValue::Octets(body[2..].to_vec()),
            WireFormat::BitLength | WireFormat::ByteLength => {
                let len = u16::from_be_bytes([body[0], body[1]]) as usize;
                let bytes = if def.format == WireFormat::BitLength { len.div_ceil(8) } else { len };
                if body.len() < 2 + bytes {
                    return Err(bad_length());
                }
                AttrValue::Octets(body[2..2 + bytes].to_vec())
            }
        };
        Ok(value)
    }

    /// Walk a run of attributes
    fn read_attrs(&self, data: &[u8], set: &mut AttributeSet) -> Result<(), CodecError> {
        let mut offset = 0;
        while offset < data.len() {
            let (attr_type, body, next) = next_attr(data, offset)?;
            offset = next;

            let Some(known) = AttrType::from_u8(attr_type) else {
                if AttrType::is_skippable(attr_type) {
                    log::debug!("Skipping unknown skippable attribute {}", attr_type);
                    continue;
                }
                return Err(CodecError::UnknownAttribute(attr_type));
            };
            let def = self.lookup(known)?;
            let value = self.read_value(def, body)?;
            set.push(Attribute { attr_type: known, value });
        }
        Ok(())
    }

    fn decrypt_attrs(
        &self,
        set: &mut AttributeSet,
        k_encr: &[u8; 16],
    ) -> Result<(), CodecError> {
        let (Some(iv), Some(cipher)) = (
            set.find(AttrType::Iv).and_then(|a| a.value.as_octets()),
            set.find(AttrType::EncrData).and_then(|a| a.value.as_octets()),
        ) else {
            return Err(CodecError::EncryptedData("AT_ENCR_DATA without AT_IV".into()));
        };
        let iv: [u8; EAP_AKA_IV_LEN] = iv
            .try_into()
            .map_err(|_| CodecError::EncryptedData("invalid AT_IV".into()))?;
        let plain = aes128_cbc_decrypt(k_encr, &iv, cipher)?;

        let mut inner = AttributeSet::default();
        self.read_attrs(&plain, &mut inner)?;
        for attr in inner.iter().filter(|a| a.attr_type != AttrType::Padding) {
            set.push(attr.clone());
        }
        Ok(())
    }
}

/// Body length of a fixed-size value once padded to a 4-byte boundary
fn padded_body_len(value_len: usize) -> usize {
    (value_len + 2).div_ceil(4) * 4 - 2
}

/// Split the attribute at `offset`, returns (type, body after type/length, next offset)
fn next_attr(data: &[u8], offset: usize) -> Result<(u8, &[u8], usize), CodecError> {
    if data.len() - offset < 4 {
        return Err(CodecError::BufferTooShort {
            expected: offset + 4,
            actual: data.len(),
        });
    }
    let attr_type = data[offset];
    let len = data[offset + 1] as usize * 4;
    if len == 0 {
        return Err(CodecError::InvalidAttributeLength { name: "attribute", actual: 0 });
    }
    if offset + len > data.len() {
        return Err(CodecError::BufferTooShort {
            expected: offset + len,
            actual: data.len(),
        });
    }
    Ok((attr_type, &data[offset + 2..offset + len], offset + len))
}

impl AttributeCodec for SimCodec {
    fn decode(&self, type_data: &[u8], ctx: &CodecContext<'_>) -> Result<AttributeSet, CodecError> {
        if type_data.len() < AKA_HEADER_LEN {
            return Err(CodecError::BufferTooShort {
                expected: AKA_HEADER_LEN,
                actual: type_data.len(),
            });
        }

        let mut set = AttributeSet::default();
        set.subtype = EapAkaSubtype::from_u8(type_data[0]);
        if set.subtype.is_none() {
            log::warn!("Unknown {} subtype {}", ctx.method.name(), type_data[0]);
        }
        self.read_attrs(&type_data[AKA_HEADER_LEN..], &mut set)?;

        if set.contains(AttrType::EncrData) {
            match ctx.k_encr {
                Some(k_encr) => self.decrypt_attrs(&mut set, k_encr)?,
                None => log::debug!("No K_encr yet, leaving AT_ENCR_DATA encrypted"),
            }
        }
        Ok(set)
    }

    fn encode(
        &self,
        header: &EapHeader,
        attrs: &AttributeSet,
        ctx: &CodecContext<'_>,
    ) -> Result<Vec<u8>, CodecError> {
        let subtype = attrs
            .subtype
            .ok_or(CodecError::InvalidAttributeValue("subtype"))?;

        let mut type_data = vec![subtype as u8, 0, 0];
        let mut inner = Vec::new();
        let mut mac_offset = None;

        for attr in attrs.iter() {
            let encrypted = self.dict.is_encrypted(attr.attr_type)
                && !matches!(attr.attr_type, AttrType::Iv | AttrType::EncrData);
            if encrypted {
                inner.push(attr);
                continue;
            }
            let start = self.write_attr(&mut type_data, attr)?;
            if attr.attr_type == AttrType::Mac {
                mac_offset = Some(start + 4);
            }
        }

        if !inner.is_empty() {
            let k_encr = ctx.k_encr.ok_or(CodecError::MissingKey("K_encr"))?;
            let (iv, encr) = self.encrypt_attrs(&inner, k_encr)?;
            self.write_attr(&mut type_data, &iv)?;
            self.write_attr(&mut type_data, &encr)?;
        }

        let mut packet = EapPacket {
            header: *header,
            type_data,
        }
        .encode()?;

        if let Some(offset) = mac_offset {
            let k_aut = ctx.k_aut.ok_or(CodecError::MissingKey("K_aut"))?;
            let at = EAP_HEADER_LEN + 1 + offset;
            packet[at..at + EAP_AKA_MAC_LEN].fill(0);
            let mac = compute_mac(ctx.method, k_aut, &packet);
            packet[at..at + EAP_AKA_MAC_LEN].copy_from_slice(&mac);
        }
        Ok(packet)
    }

    fn mac_input(&self, packet: &[u8]) -> Result<Option<Vec<u8>>, CodecError> {
        let eap = EapPacket::decode(packet)?;
        let end = EAP_HEADER_LEN + 1 + eap.type_data.len();
        if end < ATTRS_OFFSET {
            return Err(CodecError::BufferTooShort { expected: ATTRS_OFFSET, actual: end });
        }

        let attrs = &packet[ATTRS_OFFSET..end];
        let mut offset = 0;
        while offset < attrs.len() {
            let (attr_type, body, next) = next_attr(attrs, offset)?;
            if attr_type == AttrType::Mac as u8 {
                if body.len() != 2 + EAP_AKA_MAC_LEN {
                    return Err(CodecError::InvalidAttributeLength {
                        name: "AT_MAC",
                        actual: body.len() + 2,
                    });
                }
                let mut copy = packet[..end].to_vec();
                let at = ATTRS_OFFSET + offset + 4;
                copy[at..at + EAP_AKA_MAC_LEN].fill(0);
                return Ok(Some(copy));
            }
            offset = next;
        }
        Ok(None)
    }

    fn dictionary(&self) -> &dyn AttributeDictionary {
        self.dict.as_ref()
    }
}
