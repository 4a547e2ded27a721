//! EAP-AKA error types

use ogs_crypt::{AesError, KdfError, MilenageError};
use thiserror::Error;

/// Attribute and EAP framing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Buffer too short for decoding
    #[error("Buffer too short: expected {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    /// Invalid EAP code
    #[error("Invalid EAP code: {0}")]
    InvalidEapCode(u8),

    /// EAP type is not AKA or AKA'
    #[error("Unexpected EAP type: {0}")]
    UnexpectedEapType(u8),

    /// Non-skippable attribute we do not understand
    #[error("Unknown non-skippable attribute: {0}")]
    UnknownAttribute(u8),

    /// Attribute length does not fit its wire format
    #[error("Invalid length for {name}: {actual} bytes")]
    InvalidAttributeLength { name: &'static str, actual: usize },

    /// Attribute value does not match the dictionary's format
    #[error("Invalid value for {0}")]
    InvalidAttributeValue(&'static str),

    /// Encoded message would overflow a length field
    #[error("Message too long: {0} bytes")]
    MessageTooLong(usize),

    /// Key needed for signing or encryption is not available yet
    #[error("Missing key: {0}")]
    MissingKey(&'static str),

    /// Encrypted attribute could not be processed
    #[error("Encrypted data error: {0}")]
    EncryptedData(String),
}

impl From<AesError> for CodecError {
    fn from(e: AesError) -> Self {
        CodecError::EncryptedData(format!("{:?}", e))
    }
}

/// Authentication vector acquisition errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorError {
    /// No vector source is provisioned for this identity
    #[error("No vector source for identity {0}")]
    UnknownSubscriber(String),

    /// Provisioned vector is malformed
    #[error("Malformed vector: {0}")]
    MalformedVector(String),

    /// Milenage computation failed
    #[error("Milenage failure: {0:?}")]
    Milenage(MilenageError),

    /// Provider state is unusable
    #[error("Vector provider unavailable: {0}")]
    Unavailable(String),
}

impl From<MilenageError> for VectorError {
    fn from(e: MilenageError) -> Self {
        VectorError::Milenage(e)
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration is syntactically valid but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Identity parsing and resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Empty identity")]
    Empty,

    /// Pseudonym or fast re-authentication identity could not be resolved
    #[error("Cannot resolve identity {0}")]
    Unresolvable(String),
}

/// EAP-AKA method error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EapAkaError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Key derivation failed: {0:?}")]
    Kdf(KdfError),

    /// Missing mandatory attribute
    #[error("Missing attribute: {0}")]
    MissingAttribute(&'static str),

    /// Attribute present with the wrong length
    #[error("Invalid {name} length: expected {expected}, got {actual}")]
    InvalidAttributeLength {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// AT_MAC verification failed
    #[error("MAC verification failed")]
    MacMismatch,

    /// AT_CHECKCODE does not match the identity exchange we saw
    #[error("Checkcode mismatch")]
    CheckcodeMismatch,

    /// AT_RES does not match XRES
    #[error("RES does not match XRES")]
    ResMismatch,

    /// Checkcode was updated after it was frozen
    #[error("Checkcode already finalised")]
    CheckcodeFrozen,

    /// Network name required for AKA' is not configured
    #[error("No network name available")]
    MissingNetworkName,

    /// Keys needed for this message have not been derived
    #[error("Session keys not available")]
    MissingKeys,

    /// Unreachable state reached; a bug, not a protocol condition
    #[error("Invariant violation: {0}")]
    Invariant(&'static str),
}

impl From<KdfError> for EapAkaError {
    fn from(e: KdfError) -> Self {
        EapAkaError::Kdf(e)
    }
}

impl EapAkaError {
    /// Whether this error indicates a programming error rather than a protocol condition
    pub fn is_invariant(&self) -> bool {
        matches!(self, EapAkaError::Invariant(_))
    }
}

/// EAP-AKA result type
pub type EapAkaResult<T> = Result<T, EapAkaError>;
