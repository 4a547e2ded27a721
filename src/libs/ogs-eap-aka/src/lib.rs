//! NextGCore EAP-AKA / EAP-AKA' Server Method
//!
//! Server side of EAP-AKA (RFC 4187) and EAP-AKA' (RFC 5448, RFC 9048):
//! identity negotiation, challenge/response with a USIM, AT_MAC and
//! AT_CHECKCODE protection, key derivation and MS-MPPE key export.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ogs_eap_aka::prelude::*;
//!
//! let config = EapAkaConfig::from_yaml_str("eap_aka:\n  network_id: WLAN\n").unwrap();
//! let provider = MilenageVectorProvider::new();
//! provider
//!     .add_subscriber(
//!         "6001010000000001@wlan",
//!         SubscriberCredentials::with_opc([0x46; 16], [0xcd; 16], [0x00, 0x00], 1),
//!     )
//!     .unwrap();
//!
//! let mut session = EapAkaSession::new(
//!     b"6001010000000001@wlan",
//!     Arc::new(config),
//!     Arc::new(provider),
//!     Arc::new(SimCodec::new()),
//! );
//! let reply = session.start();
//! assert_eq!(reply.outcome, EapAkaOutcome::Continue);
//! assert_eq!(session.state(), EapAkaState::Challenge);
//! ```

pub mod error;
pub mod types;
pub mod attr;
pub mod dict;
pub mod packet;
pub mod codec;
pub mod identity;
pub mod checkcode;
pub mod vector;
pub mod keys;
pub mod context;
pub mod eap_aka_sm;

mod compose;        // Outbound requests
mod verify;         // Challenge response checks
mod negotiate;      // Identity ladder


pub use error::{EapAkaError, EapAkaResult};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::attr::{AttrValue, Attribute, AttributeSet};
    pub use crate::codec::{AttributeCodec, CodecContext, SimCodec};
    pub use crate::context::EapAkaConfig;
    pub use crate::dict::{AttributeDictionary, SimDictionary};
    pub use crate::eap_aka_sm::{EapAkaOutcome, EapAkaReply, EapAkaSession, EapAkaState};
    pub use crate::error::{
        CodecError, ConfigError, EapAkaError, EapAkaResult, IdentityError, VectorError,
    };
    pub use crate::identity::{IdentityResolver, PassthroughResolver};
    pub use crate::keys::MppeKeys;
    pub use crate::types::{AttrType, EapAkaSubtype, EapMethod, IdReqLevel};
    pub use crate::vector::{
        AuthVector, MilenageVectorProvider, StaticVectorProvider, SubscriberCredentials,
        VectorProvider, VectorRequest,
    };
}
