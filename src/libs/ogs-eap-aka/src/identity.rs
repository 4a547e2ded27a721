//! Peer identity classification and resolution
//!
//! EAP-SIM/AKA/AKA' identities carry a leading tag character (RFC 4186,
//! RFC 4187, RFC 5448) telling the server what kind of identity it is and
//! which method the peer would like to run.

use crate::error::IdentityError;

/// What the identity represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityType {
    Permanent,
    Pseudonym,
    FastReauth,
    /// No recognised tag, probably decorated by the supplicant
    Unknown,
}

/// Method the tag asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodHint {
    Sim,
    Aka,
    AkaPrime,
    Unknown,
}

impl MethodHint {
    pub fn name(self) -> &'static str {
        match self {
            MethodHint::Sim => "SIM",
            MethodHint::Aka => "AKA",
            MethodHint::AkaPrime => "AKA'",
            MethodHint::Unknown => "unknown",
        }
    }
}

/// Result of identity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityClass {
    pub id_type: IdentityType,
    pub method: MethodHint,
}

/// Classify an identity by its leading tag
pub fn classify_identity(identity: &[u8]) -> Result<IdentityClass, IdentityError> {
    let tag = *identity.first().ok_or(IdentityError::Empty)?;

    let (id_type, method) = match tag {
        b'0' => (IdentityType::Permanent, MethodHint::Aka),
        b'1' => (IdentityType::Permanent, MethodHint::Sim),
        b'2' => (IdentityType::Pseudonym, MethodHint::Aka),
        b'3' => (IdentityType::Pseudonym, MethodHint::Sim),
        b'4' => (IdentityType::FastReauth, MethodHint::Aka),
        b'5' => (IdentityType::FastReauth, MethodHint::Sim),
        b'6' => (IdentityType::Permanent, MethodHint::AkaPrime),
        b'7' => (IdentityType::Pseudonym, MethodHint::AkaPrime),
        b'8' => (IdentityType::FastReauth, MethodHint::AkaPrime),
        _ => (IdentityType::Unknown, MethodHint::Unknown),
    };
    Ok(IdentityClass { id_type, method })
}

/// Maps pseudonym and fast re-authentication identities to the identity
/// used for vector acquisition and key derivation
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, identity: &[u8], class: IdentityClass) -> Result<Vec<u8>, IdentityError>;
}

/// Uses the disclosed identity as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughResolver;

impl IdentityResolver for PassthroughResolver {
    fn resolve(&self, identity: &[u8], class: IdentityClass) -> Result<Vec<u8>, IdentityError> {
        if class.id_type != IdentityType::Permanent {
            log::debug!(
                "Using {:?} identity {} without resolution",
                class.id_type,
                String::from_utf8_lossy(identity)
            );
        }
        Ok(identity.to_vec())
    }
}
