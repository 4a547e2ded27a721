//! EAP-AKA protocol constants (RFC 4187, RFC 5448)

use ogs_crypt::sha::ShaAlgorithm;
use serde::Deserialize;

use crate::packet::EapType;

/// Size of the AT_MAC value, both variants truncate the HMAC to 128 bits
pub const EAP_AKA_MAC_LEN: usize = 16;
pub const EAP_AKA_RAND_LEN: usize = 16;
pub const EAP_AKA_AUTN_LEN: usize = 16;
pub const EAP_AKA_AUTS_LEN: usize = 14;
pub const EAP_AKA_NONCE_LEN: usize = 16;
pub const EAP_AKA_IV_LEN: usize = 16;
/// RES is between 32 and 128 bits (TS 33.102)
pub const EAP_AKA_RES_MIN_LEN: usize = 4;
pub const EAP_AKA_RES_MAX_LEN: usize = 16;

/// Length of each MS-MPPE key half
pub const EAP_MPPE_KEY_LEN: usize = 32;

/// AT_KDF value for EAP-AKA' with CK'/IK'
pub const EAP_AKA_PRIME_KDF_CK_IK_PRIME: u16 = 1;
/// Legacy EAP-AKA key derivation (no AT_KDF on the wire)
pub const EAP_AKA_KDF_LEGACY: u16 = 0;

/// AT_BIDDING D bit, the server supports EAP-AKA'
pub const EAP_AKA_BIDDING_PREFER_AKA_PRIME: u16 = 0x8000;

/// AMF separation bit used when acquiring vectors for EAP-AKA'
pub const EAP_AKA_PRIME_AMF_SEPARATION: [u8; 2] = [0x80, 0x00];

// AT_NOTIFICATION code bits and values (RFC 4187 10.19)
pub const NOTIFICATION_S_BIT: u16 = 0x8000;
pub const NOTIFICATION_P_BIT: u16 = 0x4000;
pub const NOTIFICATION_GENERAL_FAILURE_AFTER_AUTH: u16 = 0;
pub const NOTIFICATION_TEMPORARILY_DENIED: u16 = 1026;
pub const NOTIFICATION_NOT_SUBSCRIBED: u16 = 1031;
pub const NOTIFICATION_GENERAL_FAILURE: u16 = 16384;
pub const NOTIFICATION_SUCCESS: u16 = 32768;

/// Name of a notification code, for logs
pub fn notification_name(code: u16) -> &'static str {
    match code {
        NOTIFICATION_GENERAL_FAILURE_AFTER_AUTH => "General-Failure-After-Authentication",
        NOTIFICATION_TEMPORARILY_DENIED => "Temporarily-Denied",
        NOTIFICATION_NOT_SUBSCRIBED => "Not-Subscribed",
        NOTIFICATION_GENERAL_FAILURE => "General-Failure",
        NOTIFICATION_SUCCESS => "Success",
        _ => "Unknown",
    }
}

/// AT_CLIENT_ERROR_CODE values (RFC 4187 10.20)
pub const CLIENT_ERROR_UNABLE_TO_PROCESS: u16 = 0;

pub fn client_error_name(code: u16) -> &'static str {
    match code {
        CLIENT_ERROR_UNABLE_TO_PROCESS => "Unable-To-Process-Packet",
        1 => "Unsupported-Version",
        2 => "Insufficient-Challenges",
        3 => "RANDs-Not-Fresh",
        _ => "Unknown",
    }
}

/// EAP-AKA subtype (RFC 4187 11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EapAkaSubtype {
    Challenge = 1,
    AuthenticationReject = 2,
    SynchronizationFailure = 4,
    Identity = 5,
    Notification = 12,
    Reauthentication = 13,
    ClientError = 14,
}

impl EapAkaSubtype {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Challenge),
            2 => Some(Self::AuthenticationReject),
            4 => Some(Self::SynchronizationFailure),
            5 => Some(Self::Identity),
            12 => Some(Self::Notification),
            13 => Some(Self::Reauthentication),
            14 => Some(Self::ClientError),
            _ => None,
        }
    }
}

/// EAP-AKA attribute type (RFC 4187 11, RFC 5448 6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrType {
    Rand = 1,
    Autn = 2,
    Res = 3,
    Auts = 4,
    Padding = 6,
    PermanentIdReq = 10,
    Mac = 11,
    Notification = 12,
    AnyIdReq = 13,
    Identity = 14,
    FullauthIdReq = 17,
    Counter = 19,
    CounterTooSmall = 20,
    NonceS = 21,
    ClientErrorCode = 22,
    KdfInput = 23,
    Kdf = 24,
    Iv = 129,
    EncrData = 130,
    NextPseudonym = 132,
    NextReauthId = 133,
    Checkcode = 134,
    ResultInd = 135,
    Bidding = 136,
}

impl AttrType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Rand),
            2 => Some(Self::Autn),
            3 => Some(Self::Res),
            4 => Some(Self::Auts),
            6 => Some(Self::Padding),
            10 => Some(Self::PermanentIdReq),
            11 => Some(Self::Mac),
            12 => Some(Self::Notification),
            13 => Some(Self::AnyIdReq),
            14 => Some(Self::Identity),
            17 => Some(Self::FullauthIdReq),
            19 => Some(Self::Counter),
            20 => Some(Self::CounterTooSmall),
            21 => Some(Self::NonceS),
            22 => Some(Self::ClientErrorCode),
            23 => Some(Self::KdfInput),
            24 => Some(Self::Kdf),
            129 => Some(Self::Iv),
            130 => Some(Self::EncrData),
            132 => Some(Self::NextPseudonym),
            133 => Some(Self::NextReauthId),
            134 => Some(Self::Checkcode),
            135 => Some(Self::ResultInd),
            136 => Some(Self::Bidding),
            _ => None,
        }
    }

    /// Attributes numbered 128 and above may be ignored by a receiver
    pub fn is_skippable(v: u8) -> bool {
        v >= 128
    }
}

/// Identity request level, narrows Any -> FullAuth -> Permanent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdReqLevel {
    None,
    Any,
    FullAuth,
    Permanent,
}

impl IdReqLevel {
    /// Attribute carried in the identity request for this level
    pub fn request_attr(self) -> Option<AttrType> {
        match self {
            IdReqLevel::None => None,
            IdReqLevel::Any => Some(AttrType::AnyIdReq),
            IdReqLevel::FullAuth => Some(AttrType::FullauthIdReq),
            IdReqLevel::Permanent => Some(AttrType::PermanentIdReq),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IdReqLevel::None => "None",
            IdReqLevel::Any => "Any-ID",
            IdReqLevel::FullAuth => "FullAuth-ID",
            IdReqLevel::Permanent => "Permanent-ID",
        }
    }
}

/// Method flavour, fixed at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EapMethod {
    Aka,
    #[default]
    AkaPrime,
}

impl EapMethod {
    /// EAP type number (RFC 3748 registry)
    pub fn eap_type(self) -> u8 {
        match self {
            EapMethod::Aka => EapType::Aka as u8,
            EapMethod::AkaPrime => EapType::AkaPrime as u8,
        }
    }

    /// Hash used for AT_MAC and AT_CHECKCODE
    pub fn hash(self) -> ShaAlgorithm {
        match self {
            EapMethod::Aka => ShaAlgorithm::Sha1,
            EapMethod::AkaPrime => ShaAlgorithm::Sha256,
        }
    }

    pub fn kdf(self) -> u16 {
        match self {
            EapMethod::Aka => EAP_AKA_KDF_LEGACY,
            EapMethod::AkaPrime => EAP_AKA_PRIME_KDF_CK_IK_PRIME,
        }
    }

    /// Only EAP-AKA advertises AT_BIDDING
    pub fn sends_bidding(self) -> bool {
        matches!(self, EapMethod::Aka)
    }

    pub fn name(self) -> &'static str {
        match self {
            EapMethod::Aka => "EAP-AKA",
            EapMethod::AkaPrime => "EAP-AKA'",
        }
    }
}
