//! Key Derivation Functions
//!
//! Implements the key derivation functions used by the EAP-AKA method family:
//! - 3GPP TS 33.220 Annex B.2.0 generic KDF (HMAC-SHA-256)
//! - RFC 5448 section 3.3: CK'/IK' derivation (FC = 0x20)
//! - RFC 5448 section 3.4: PRF' and the EAP-AKA' key hierarchy
//! - RFC 4187 section 7 / FIPS 186-2 change notice 1: the EAP-AKA key hierarchy

use crate::sha::{hmac_sha256, sha1, SHA1_DIGEST_SIZE, SHA256_DIGEST_SIZE};

// Length constants
pub const OGS_KEY_LEN: usize = 16;
pub const OGS_SQN_XOR_AK_LEN: usize = 6;

/// EAP-AKA key sizes (RFC 4187 section 7)
pub const EAP_AKA_MK_LEN: usize = SHA1_DIGEST_SIZE;
pub const EAP_AKA_K_ENCR_LEN: usize = 16;
pub const EAP_AKA_K_AUT_LEN: usize = 16;
/// EAP-AKA' K_aut and K_re sizes (RFC 5448 section 3.3)
pub const EAP_AKA_PRIME_K_AUT_LEN: usize = 32;
pub const EAP_AKA_PRIME_K_RE_LEN: usize = 32;
pub const EAP_MSK_LEN: usize = 64;
pub const EAP_EMSK_LEN: usize = 64;

/// Output octets of one FIPS 186-2 round (two SHA-1 G() outputs)
const FIPS186_2_ROUND_LEN: usize = 2 * SHA1_DIGEST_SIZE;

// FC (Function Code) values for KDF
const FC_FOR_CK_PRIME_IK_PRIME_DERIVATION: u8 = 0x20;

const EAP_AKA_PRIME_LABEL: &[u8] = b"EAP-AKA'";

/// Error type for key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfError {
    /// A parameter exceeds the 16-bit length field of the KDF input string
    ParamTooLong,
    /// The serving network name is empty
    EmptyNetworkName,
    /// PRF' can produce at most 255 blocks
    OutputTooLong,
}

/// KDF parameter (P_i); empty parameters are skipped, like the C code
struct KdfParam<'a> {
    buf: &'a [u8],
}

/// Common KDF function as defined in TS 33.220 clause B.2.0
///
/// S = FC || P0 || L0 || P1 || L1 || ..., output = HMAC-SHA-256(Key, S)
fn ogs_kdf_common(
    key: &[u8],
    fc: u8,
    params: &[KdfParam<'_>],
) -> Result<[u8; SHA256_DIGEST_SIZE], KdfError> {
    let mut s = Vec::with_capacity(1 + params.iter().map(|p| p.buf.len() + 2).sum::<usize>());
    s.push(fc);

    for param in params.iter().filter(|p| !p.buf.is_empty()) {
        let len = u16::try_from(param.buf.len()).map_err(|_| KdfError::ParamTooLong)?;
        s.extend_from_slice(param.buf);
        s.extend_from_slice(&len.to_be_bytes());
    }

    Ok(hmac_sha256(key, &[&s]))
}

/// RFC 5448 section 3.3: CK' and IK' derivation
///
/// CK' || IK' = KDF(CK || IK, 0x20 || network name || SQN xor AK)
pub fn ogs_kdf_ck_ik_prime(
    ck: &[u8; OGS_KEY_LEN],
    ik: &[u8; OGS_KEY_LEN],
    network_name: &[u8],
    sqn_xor_ak: &[u8; OGS_SQN_XOR_AK_LEN],
) -> Result<([u8; OGS_KEY_LEN], [u8; OGS_KEY_LEN]), KdfError> {
    if network_name.is_empty() {
        return Err(KdfError::EmptyNetworkName);
    }

    let mut key = [0u8; OGS_KEY_LEN * 2];
    key[..OGS_KEY_LEN].copy_from_slice(ck);
    key[OGS_KEY_LEN..].copy_from_slice(ik);

    let params = [
        KdfParam { buf: network_name },
        KdfParam { buf: sqn_xor_ak },
    ];
    let output = ogs_kdf_common(&key, FC_FOR_CK_PRIME_IK_PRIME_DERIVATION, &params)?;

    let mut ck_prime = [0u8; OGS_KEY_LEN];
    let mut ik_prime = [0u8; OGS_KEY_LEN];
    ck_prime.copy_from_slice(&output[..OGS_KEY_LEN]);
    ik_prime.copy_from_slice(&output[OGS_KEY_LEN..]);
    Ok((ck_prime, ik_prime))
}

/// RFC 5448 section 3.4.1: PRF'
///
/// T1 = HMAC-SHA-256(K, S | 0x01), Tn = HMAC-SHA-256(K, Tn-1 | S | n)
pub fn ogs_prf_prime(key: &[u8], s: &[u8], out_len: usize) -> Result<Vec<u8>, KdfError> {
    let blocks = out_len.div_ceil(SHA256_DIGEST_SIZE);
    if blocks > u8::MAX as usize {
        return Err(KdfError::OutputTooLong);
    }

    let mut output = Vec::with_capacity(blocks * SHA256_DIGEST_SIZE);
    let mut prev: Vec<u8> = Vec::new();
    for n in 1..=blocks as u8 {
        let t = hmac_sha256(key, &[&prev, s, &[n]]);
        output.extend_from_slice(&t);
        prev = t.to_vec();
    }
    output.truncate(out_len);
    Ok(output)
}

/// FIPS 186-2 G(t, c) with t = the SHA-1 initial state
///
/// `c` is zero padded to a full block and run through a single SHA-1
/// compression without the usual length padding.
fn fips186_2_g(xval: &[u8; SHA1_DIGEST_SIZE]) -> [u8; SHA1_DIGEST_SIZE] {
    let mut state: [u32; 5] = [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476, 0xC3D2E1F0];
    let mut block = [0u8; 64];
    block[..SHA1_DIGEST_SIZE].copy_from_slice(xval);
    ::sha1::compress(&mut state, &[block.into()]);

    let mut out = [0u8; SHA1_DIGEST_SIZE];
    for (chunk, word) in out.chunks_exact_mut(4).zip(state.iter()) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    out
}

/// XKEY = (1 + XKEY + w) mod 2^160
fn fips186_2_add_one(xkey: &mut [u8; SHA1_DIGEST_SIZE], w: &[u8; SHA1_DIGEST_SIZE]) {
    let mut carry: u16 = 1;
    for i in (0..SHA1_DIGEST_SIZE).rev() {
        let sum = xkey[i] as u16 + w[i] as u16 + carry;
        xkey[i] = sum as u8;
        carry = sum >> 8;
    }
}

/// FIPS 186-2 (change notice 1) pseudo-random function, RFC 4186 appendix B
///
/// Produces `out_len` bytes, rounded internally up to 40-byte rounds.
pub fn ogs_fips186_2_prf(mk: &[u8; EAP_AKA_MK_LEN], out_len: usize) -> Vec<u8> {
    let rounds = out_len.div_ceil(FIPS186_2_ROUND_LEN);
    let mut xkey = *mk;
    let mut output = Vec::with_capacity(rounds * FIPS186_2_ROUND_LEN);

    for _ in 0..rounds {
        for _ in 0..2 {
            let w = fips186_2_g(&xkey);
            fips186_2_add_one(&mut xkey, &w);
            output.extend_from_slice(&w);
        }
    }
    output.truncate(out_len);
    output
}

/// Key set produced by the EAP-AKA (KDF 0) hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EapAkaKeySet {
    pub mk: [u8; EAP_AKA_MK_LEN],
    pub k_encr: [u8; EAP_AKA_K_ENCR_LEN],
    pub k_aut: [u8; EAP_AKA_K_AUT_LEN],
    pub msk: [u8; EAP_MSK_LEN],
    pub emsk: [u8; EAP_EMSK_LEN],
}

/// RFC 4187 section 7: MK = SHA1(Identity | IK | CK), then FIPS 186-2 PRF
pub fn ogs_kdf_eap_aka(
    identity: &[u8],
    ck: &[u8; OGS_KEY_LEN],
    ik: &[u8; OGS_KEY_LEN],
) -> EapAkaKeySet {
    let mut input = Vec::with_capacity(identity.len() + OGS_KEY_LEN * 2);
    input.extend_from_slice(identity);
    input.extend_from_slice(ik);
    input.extend_from_slice(ck);
    let mk = sha1(&input);

    let stream = ogs_fips186_2_prf(
        &mk,
        EAP_AKA_K_ENCR_LEN + EAP_AKA_K_AUT_LEN + EAP_MSK_LEN + EAP_EMSK_LEN,
    );

    let mut keys = EapAkaKeySet {
        mk,
        k_encr: [0u8; EAP_AKA_K_ENCR_LEN],
        k_aut: [0u8; EAP_AKA_K_AUT_LEN],
        msk: [0u8; EAP_MSK_LEN],
        emsk: [0u8; EAP_EMSK_LEN],
    };
    let (k_encr, rest) = stream.split_at(EAP_AKA_K_ENCR_LEN);
    let (k_aut, rest) = rest.split_at(EAP_AKA_K_AUT_LEN);
    let (msk, emsk) = rest.split_at(EAP_MSK_LEN);
    keys.k_encr.copy_from_slice(k_encr);
    keys.k_aut.copy_from_slice(k_aut);
    keys.msk.copy_from_slice(msk);
    keys.emsk.copy_from_slice(emsk);
    keys
}

/// Key set produced by the EAP-AKA' (KDF 1) hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EapAkaPrimeKeySet {
    pub k_encr: [u8; EAP_AKA_K_ENCR_LEN],
    pub k_aut: [u8; EAP_AKA_PRIME_K_AUT_LEN],
    pub k_re: [u8; EAP_AKA_PRIME_K_RE_LEN],
    pub msk: [u8; EAP_MSK_LEN],
    pub emsk: [u8; EAP_EMSK_LEN],
}

/// RFC 5448 section 3.3: MK = PRF'(IK' | CK', "EAP-AKA'" | Identity)
pub fn ogs_kdf_eap_aka_prime(
    identity: &[u8],
    ck_prime: &[u8; OGS_KEY_LEN],
    ik_prime: &[u8; OGS_KEY_LEN],
) -> Result<EapAkaPrimeKeySet, KdfError> {
    let mut key = [0u8; OGS_KEY_LEN * 2];
    key[..OGS_KEY_LEN].copy_from_slice(ik_prime);
    key[OGS_KEY_LEN..].copy_from_slice(ck_prime);

    let mut s = Vec::with_capacity(EAP_AKA_PRIME_LABEL.len() + identity.len());
    s.extend_from_slice(EAP_AKA_PRIME_LABEL);
    s.extend_from_slice(identity);

    let total = EAP_AKA_K_ENCR_LEN
        + EAP_AKA_PRIME_K_AUT_LEN
        + EAP_AKA_PRIME_K_RE_LEN
        + EAP_MSK_LEN
        + EAP_EMSK_LEN;
    let mk = ogs_prf_prime(&key, &s, total)?;

    let mut keys = EapAkaPrimeKeySet {
        k_encr: [0u8; EAP_AKA_K_ENCR_LEN],
        k_aut: [0u8; EAP_AKA_PRIME_K_AUT_LEN],
        k_re: [0u8; EAP_AKA_PRIME_K_RE_LEN],
        msk: [0u8; EAP_MSK_LEN],
        emsk: [0u8; EAP_EMSK_LEN],
    };
    let (k_encr, rest) = mk.split_at(EAP_AKA_K_ENCR_LEN);
    let (k_aut, rest) = rest.split_at(EAP_AKA_PRIME_K_AUT_LEN);
    let (k_re, rest) = rest.split_at(EAP_AKA_PRIME_K_RE_LEN);
    let (msk, emsk) = rest.split_at(EAP_MSK_LEN);
    keys.k_encr.copy_from_slice(k_encr);
    keys.k_aut.copy_from_slice(k_aut);
    keys.k_re.copy_from_slice(k_re);
    keys.msk.copy_from_slice(msk);
    keys.emsk.copy_from_slice(emsk);
    Ok(keys)
}
