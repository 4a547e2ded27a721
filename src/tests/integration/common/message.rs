//! Message verification utilities
//!
//! Records the EAP exchange of a test run so flows can be checked as a
//! sequence of message types.

use ogs_eap_aka::packet::{EapCode, EapPacket};
use ogs_eap_aka::prelude::EapAkaSubtype;

/// Message type for verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Request(EapAkaSubtype),
    Response(EapAkaSubtype),
    EapSuccess,
    EapFailure,
    /// Anything that does not decode
    Unknown,
}

/// Captured message for verification
#[derive(Debug, Clone)]
pub struct CapturedMessage {
    /// Message type
    pub msg_type: MessageType,

    /// EAP identifier
    pub identifier: Option<u8>,

    /// Raw message bytes
    pub raw: Vec<u8>,

    /// Source
    pub source: &'static str,
}

impl CapturedMessage {
    /// Classify a raw EAP packet
    pub fn from_packet(raw: &[u8], source: &'static str) -> Self {
        let (msg_type, identifier) = match EapPacket::decode(raw) {
            Ok(eap) => {
                let subtype = eap.type_data.first().copied().and_then(EapAkaSubtype::from_u8);
                let msg_type = match (eap.header.code, subtype) {
                    (EapCode::Request, Some(s)) => MessageType::Request(s),
                    (EapCode::Response, Some(s)) => MessageType::Response(s),
                    (EapCode::Success, _) => MessageType::EapSuccess,
                    (EapCode::Failure, _) => MessageType::EapFailure,
                    _ => MessageType::Unknown,
                };
                (msg_type, Some(eap.header.identifier))
            }
            Err(_) => (MessageType::Unknown, None),
        };
        Self { msg_type, identifier, raw: raw.to_vec(), source }
    }
}

/// Message capture buffer for collecting messages during tests
#[derive(Debug, Default)]
pub struct MessageCapture {
    messages: Vec<CapturedMessage>,
}

impl MessageCapture {
    /// Create a new message capture buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a message
    pub fn capture(&mut self, msg: CapturedMessage) {
        log::debug!("Captured {:?} from {} (id {:?})", msg.msg_type, msg.source, msg.identifier);
        self.messages.push(msg);
    }

    /// Get all captured messages
    pub fn messages(&self) -> &[CapturedMessage] {
        &self.messages
    }

    /// Message types in capture order
    pub fn types(&self) -> Vec<MessageType> {
        self.messages.iter().map(|m| m.msg_type).collect()
    }

    /// Get messages of a specific type
    pub fn messages_of_type(&self, msg_type: MessageType) -> Vec<&CapturedMessage> {
        self.messages.iter().filter(|m| m.msg_type == msg_type).collect()
    }

    /// Clear all captured messages
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Get the count of captured messages
    pub fn count(&self) -> usize {
        self.messages.len()
    }

    /// Check if a message sequence was observed, not necessarily contiguous
    pub fn has_sequence(&self, sequence: &[MessageType]) -> bool {
        let mut wanted = sequence.iter().peekable();
        for msg in &self.messages {
            if wanted.peek() == Some(&&msg.msg_type) {
                wanted.next();
            }
        }
        wanted.peek().is_none()
    }
}
