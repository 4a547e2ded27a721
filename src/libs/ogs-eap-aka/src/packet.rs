//! EAP packet framing (RFC 3748)

use crate::error::CodecError;

/// EAP header length: Code(1) + Identifier(1) + Length(2)
pub const EAP_HEADER_LEN: usize = 4;

/// EAP packet code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EapCode {
    Request = 1,
    Response = 2,
    Success = 3,
    Failure = 4,
}

impl EapCode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Request),
            2 => Some(Self::Response),
            3 => Some(Self::Success),
            4 => Some(Self::Failure),
            _ => None,
        }
    }
}

/// EAP method type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EapType {
    Identity = 1,
    Notification = 2,
    Nak = 3,
    Aka = 23,
    AkaPrime = 50,
}

impl EapType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Identity),
            2 => Some(Self::Notification),
            3 => Some(Self::Nak),
            23 => Some(Self::Aka),
            50 => Some(Self::AkaPrime),
            _ => None,
        }
    }
}

/// Fields of the EAP header that the method controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EapHeader {
    pub code: EapCode,
    pub identifier: u8,
    /// Method type, absent for Success/Failure
    pub eap_type: Option<u8>,
}

/// An EAP packet (RFC 3748).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EapPacket {
    pub header: EapHeader,
    /// Bytes following the type octet
    pub type_data: Vec<u8>,
}

impl EapPacket {
    /// Create an EAP-Success packet.
    pub fn new_success(identifier: u8) -> Self {
        Self {
            header: EapHeader { code: EapCode::Success, identifier, eap_type: None },
            type_data: Vec::new(),
        }
    }

    /// Create an EAP-Failure packet.
    pub fn new_failure(identifier: u8) -> Self {
        Self {
            header: EapHeader { code: EapCode::Failure, identifier, eap_type: None },
            type_data: Vec::new(),
        }
    }

    /// Encode to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let body_len = match self.header.eap_type {
            Some(_) => 1 + self.type_data.len(),
            None => 0,
        };
        let total_len = EAP_HEADER_LEN + body_len;
        let length = u16::try_from(total_len).map_err(|_| CodecError::MessageTooLong(total_len))?;

        let mut buf = Vec::with_capacity(total_len);
        buf.push(self.header.code as u8);
        buf.push(self.header.identifier);
        buf.extend_from_slice(&length.to_be_bytes());
        if let Some(eap_type) = self.header.eap_type {
            buf.push(eap_type);
            buf.extend_from_slice(&self.type_data);
        }
        Ok(buf)
    }

    /// Decode from bytes.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < EAP_HEADER_LEN {
            return Err(CodecError::BufferTooShort {
                expected: EAP_HEADER_LEN,
                actual: data.len(),
            });
        }

        let code = EapCode::from_u8(data[0]).ok_or(CodecError::InvalidEapCode(data[0]))?;
        let identifier = data[1];
        let length = u16::from_be_bytes([data[2], data[3]]) as usize;

        if length < EAP_HEADER_LEN || data.len() < length {
            return Err(CodecError::BufferTooShort {
                expected: length.max(EAP_HEADER_LEN),
                actual: data.len(),
            });
        }

        match code {
            EapCode::Success | EapCode::Failure => Ok(Self {
                header: EapHeader { code, identifier, eap_type: None },
                type_data: Vec::new(),
            }),
            EapCode::Request | EapCode::Response => {
                if length < EAP_HEADER_LEN + 1 {
                    return Err(CodecError::BufferTooShort {
                        expected: EAP_HEADER_LEN + 1,
                        actual: length,
                    });
                }
                Ok(Self {
                    header: EapHeader {
                        code,
                        identifier,
                        eap_type: Some(data[EAP_HEADER_LEN]),
                    },
                    type_data: data[EAP_HEADER_LEN + 1..length].to_vec(),
                })
            }
        }
    }
}
