//! SHA-1 / SHA-256 Hashing and HMAC
//!
//! Wrapper around the `sha1`, `sha2` and `hmac` crates. EAP-AKA uses the SHA-1
//! family throughout (checkcode, HMAC-SHA1-128), EAP-AKA' the SHA-256 family.

use hmac::{Hmac, Mac};
use sha1::{Digest, Sha1};
use sha2::Sha256;

// Digest sizes
pub const SHA1_DIGEST_SIZE: usize = 20; // 160 / 8
pub const SHA256_DIGEST_SIZE: usize = 32; // 256 / 8

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Hash family selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaAlgorithm {
    Sha1,
    Sha256,
}

impl ShaAlgorithm {
    /// Digest size in bytes
    pub fn digest_size(self) -> usize {
        match self {
            ShaAlgorithm::Sha1 => SHA1_DIGEST_SIZE,
            ShaAlgorithm::Sha256 => SHA256_DIGEST_SIZE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaAlgorithm::Sha1 => "SHA-1",
            ShaAlgorithm::Sha256 => "SHA-256",
        }
    }
}

/// Incremental hash context for either family
#[derive(Clone)]
pub enum ShaContext {
    Sha1(Sha1),
    Sha256(Sha256),
}

impl ShaContext {
    /// Initialize a new context
    pub fn new(algorithm: ShaAlgorithm) -> Self {
        match algorithm {
            ShaAlgorithm::Sha1 => ShaContext::Sha1(Sha1::new()),
            ShaAlgorithm::Sha256 => ShaContext::Sha256(Sha256::new()),
        }
    }

    pub fn algorithm(&self) -> ShaAlgorithm {
        match self {
            ShaContext::Sha1(_) => ShaAlgorithm::Sha1,
            ShaContext::Sha256(_) => ShaAlgorithm::Sha256,
        }
    }

    /// Update the hash with additional data
    pub fn update(&mut self, data: &[u8]) {
        match self {
            ShaContext::Sha1(h) => h.update(data),
            ShaContext::Sha256(h) => h.update(data),
        }
    }

    /// Finalize the hash, consuming the context
    pub fn finalize(self) -> Vec<u8> {
        match self {
            ShaContext::Sha1(h) => h.finalize().to_vec(),
            ShaContext::Sha256(h) => h.finalize().to_vec(),
        }
    }
}

/// Compute SHA-1 hash of a message in one shot
pub fn sha1(message: &[u8]) -> [u8; SHA1_DIGEST_SIZE] {
    let mut digest = [0u8; SHA1_DIGEST_SIZE];
    digest.copy_from_slice(&Sha1::digest(message));
    digest
}

/// Compute SHA-256 hash of a message in one shot
pub fn sha256(message: &[u8]) -> [u8; SHA256_DIGEST_SIZE] {
    let mut digest = [0u8; SHA256_DIGEST_SIZE];
    digest.copy_from_slice(&Sha256::digest(message));
    digest
}

/// HMAC-SHA-256 over the concatenation of `parts`
pub fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; SHA256_DIGEST_SIZE] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; SHA256_DIGEST_SIZE];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// HMAC-SHA-1 over the concatenation of `parts`
pub fn hmac_sha1(key: &[u8], parts: &[&[u8]]) -> [u8; SHA1_DIGEST_SIZE] {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC can take key of any size");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; SHA1_DIGEST_SIZE];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// HMAC of the selected family, full length output
pub fn hmac(algorithm: ShaAlgorithm, key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    match algorithm {
        ShaAlgorithm::Sha1 => hmac_sha1(key, parts).to_vec(),
        ShaAlgorithm::Sha256 => hmac_sha256(key, parts).to_vec(),
    }
}
