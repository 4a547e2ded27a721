//! NextGCore Cryptographic Library
//!
//! Cryptographic primitives needed by the EAP-AKA and EAP-AKA' server method:
//! Milenage vector generation, the two EAP key hierarchies and the hash, HMAC
//! and AES modes they are built on.

pub mod aes;        // AES-128 block and CBC operations
pub mod sha;        // SHA-1 and SHA-256, HMAC
pub mod kdf;        // Key Derivation Functions
pub mod milenage;   // 3GPP Milenage algorithm


pub use aes::AesError;
pub use kdf::KdfError;
pub use milenage::MilenageError;
