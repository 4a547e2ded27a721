//! AES-128 Operations
//!
//! Wrapper around the `aes` crate providing the two modes the EAP-AKA family
//! needs: raw single-block encryption (Milenage kernel) and CBC without
//! implicit padding (AT_ENCR_DATA, RFC 4187 section 10.12).

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

/// AES block size in bytes
pub const AES_BLOCK_SIZE: usize = 16;

/// AES-128 key size in bytes
pub const AES128_KEY_SIZE: usize = 16;

/// Error type for AES operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AesError {
    /// Key is not 16 bytes long
    InvalidKeySize,
    /// Input is empty or not a multiple of the block size
    InvalidInputLength,
}

/// AES-128 cipher context usable in both directions
pub struct Aes128Context {
    cipher: Aes128,
}

impl Aes128Context {
    /// Set up an AES-128 context with the given key
    pub fn new(key: &[u8]) -> Result<Self, AesError> {
        if key.len() != AES128_KEY_SIZE {
            return Err(AesError::InvalidKeySize);
        }
        Ok(Self {
            cipher: Aes128::new(GenericArray::from_slice(key)),
        })
    }

    /// Encrypt a single 16-byte block
    pub fn encrypt_block(&self, input: &[u8; AES_BLOCK_SIZE]) -> [u8; AES_BLOCK_SIZE] {
        let mut block = GenericArray::clone_from_slice(input);
        self.cipher.encrypt_block(&mut block);
        let mut out = [0u8; AES_BLOCK_SIZE];
        out.copy_from_slice(&block);
        out
    }

    /// Decrypt a single 16-byte block
    pub fn decrypt_block(&self, input: &[u8; AES_BLOCK_SIZE]) -> [u8; AES_BLOCK_SIZE] {
        let mut block = GenericArray::clone_from_slice(input);
        self.cipher.decrypt_block(&mut block);
        let mut out = [0u8; AES_BLOCK_SIZE];
        out.copy_from_slice(&block);
        out
    }
}

fn check_cbc_input(input: &[u8]) -> Result<(), AesError> {
    if input.is_empty() || input.len() % AES_BLOCK_SIZE != 0 {
        return Err(AesError::InvalidInputLength);
    }
    Ok(())
}

/// AES-128-CBC encryption
///
/// The caller is responsible for padding `input` to a multiple of the block
/// size; EAP-AKA pads with AT_PADDING before encrypting.
pub fn aes128_cbc_encrypt(
    key: &[u8],
    iv: &[u8; AES_BLOCK_SIZE],
    input: &[u8],
) -> Result<Vec<u8>, AesError> {
    check_cbc_input(input)?;
    let ctx = Aes128Context::new(key)?;

    let mut chain = *iv;
    let mut output = Vec::with_capacity(input.len());
    for chunk in input.chunks_exact(AES_BLOCK_SIZE) {
        let mut block = [0u8; AES_BLOCK_SIZE];
        for (i, b) in block.iter_mut().enumerate() {
            *b = chunk[i] ^ chain[i];
        }
        chain = ctx.encrypt_block(&block);
        output.extend_from_slice(&chain);
    }
    Ok(output)
}

/// AES-128-CBC decryption
pub fn aes128_cbc_decrypt(
    key: &[u8],
    iv: &[u8; AES_BLOCK_SIZE],
    input: &[u8],
) -> Result<Vec<u8>, AesError> {
    check_cbc_input(input)?;
    let ctx = Aes128Context::new(key)?;

    let mut chain = *iv;
    let mut output = Vec::with_capacity(input.len());
    for chunk in input.chunks_exact(AES_BLOCK_SIZE) {
        let mut block = [0u8; AES_BLOCK_SIZE];
        block.copy_from_slice(chunk);
        let plain = ctx.decrypt_block(&block);
        output.extend(plain.iter().zip(chain.iter()).map(|(p, c)| p ^ c));
        chain = block;
    }
    Ok(output)
}
