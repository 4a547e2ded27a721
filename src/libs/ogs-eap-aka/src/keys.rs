//! Key derivation selector
//!
//! KDF 0 is the EAP-AKA hierarchy of RFC 4187 section 7, KDF 1 the EAP-AKA'
//! hierarchy of RFC 5448 section 3.3.

use ogs_crypt::kdf::{ogs_kdf_ck_ik_prime, ogs_kdf_eap_aka, ogs_kdf_eap_aka_prime};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{EapAkaError, EapAkaResult};
use crate::types::{EapMethod, EAP_AKA_KDF_LEGACY, EAP_AKA_PRIME_KDF_CK_IK_PRIME, EAP_MPPE_KEY_LEN};
use crate::vector::AuthVector;

/// Session keys derived from one authentication vector
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeys {
    pub k_encr: [u8; 16],
    /// 16 bytes for EAP-AKA, 32 for EAP-AKA'
    pub k_aut: Vec<u8>,
    /// Re-authentication key, EAP-AKA' only
    pub k_re: Vec<u8>,
    pub msk: [u8; 64],
    pub emsk: [u8; 64],
}

impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeys")
            .field("k_aut_len", &self.k_aut.len())
            .finish_non_exhaustive()
    }
}

impl DerivedKeys {
    /// MS-MPPE-Recv-Key and MS-MPPE-Send-Key halves of the MSK
    pub fn mppe_keys(&self) -> MppeKeys {
        let mut keys = MppeKeys {
            recv_key: [0u8; EAP_MPPE_KEY_LEN],
            send_key: [0u8; EAP_MPPE_KEY_LEN],
        };
        keys.recv_key.copy_from_slice(&self.msk[..EAP_MPPE_KEY_LEN]);
        keys.send_key.copy_from_slice(&self.msk[EAP_MPPE_KEY_LEN..]);
        keys
    }
}

/// Keying material exported with EAP-Success
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MppeKeys {
    pub recv_key: [u8; EAP_MPPE_KEY_LEN],
    pub send_key: [u8; EAP_MPPE_KEY_LEN],
}

impl std::fmt::Debug for MppeKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MppeKeys { .. }")
    }
}

/// Identity, vector and keys of the current challenge round
#[derive(Debug, Default)]
pub struct KeyMaterial {
    /// Identity bound into MK
    pub identity: Vec<u8>,
    pub vector: Option<AuthVector>,
    pub derived: Option<DerivedKeys>,
}

/// Run the KDF selected by `kdf` over `vector`
pub fn derive_keys(
    method: EapMethod,
    kdf: u16,
    identity: &[u8],
    vector: &AuthVector,
    network_id: Option<&str>,
) -> EapAkaResult<DerivedKeys> {
    match (method, kdf) {
        (EapMethod::AkaPrime, EAP_AKA_PRIME_KDF_CK_IK_PRIME) => {
            let network = network_id
                .filter(|n| !n.is_empty())
                .ok_or(EapAkaError::MissingNetworkName)?;
            let (ck_prime, ik_prime) =
                ogs_kdf_ck_ik_prime(&vector.ck, &vector.ik, network.as_bytes(), &vector.sqn_xor_ak())?;
            let ks = ogs_kdf_eap_aka_prime(identity, &ck_prime, &ik_prime)?;
            log::trace!("Derived EAP-AKA' keys with CK'/IK'");
            Ok(DerivedKeys {
                k_encr: ks.k_encr,
                k_aut: ks.k_aut.to_vec(),
                k_re: ks.k_re.to_vec(),
                msk: ks.msk,
                emsk: ks.emsk,
            })
        }
        (EapMethod::Aka, EAP_AKA_KDF_LEGACY) => {
            let ks = ogs_kdf_eap_aka(identity, &vector.ck, &vector.ik);
            log::trace!("Derived EAP-AKA keys, MK {}", hex::encode(ks.mk));
            Ok(DerivedKeys {
                k_encr: ks.k_encr,
                k_aut: ks.k_aut.to_vec(),
                k_re: Vec::new(),
                msk: ks.msk,
                emsk: ks.emsk,
            })
        }
        _ => Err(EapAkaError::Invariant("KDF does not match method")),
    }
}
