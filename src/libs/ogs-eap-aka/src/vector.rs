//! Authentication vector acquisition
//!
//! The session asks a [`VectorProvider`] for one UMTS quintet per challenge.
//! Two providers are included: [`StaticVectorProvider`] hands out vectors
//! provisioned ahead of time, [`MilenageVectorProvider`] generates them from
//! subscriber credentials.

use std::collections::HashMap;
use std::sync::Mutex;

use ogs_crypt::milenage::{milenage_generate, milenage_opc};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::VectorError;
use crate::types::{EAP_AKA_RES_MAX_LEN, EAP_AKA_RES_MIN_LEN};

/// SQN is 48 bits
const SQN_MASK: u64 = (1 << 48) - 1;

/// UMTS authentication quintet
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AuthVector {
    pub rand: [u8; 16],
    pub autn: [u8; 16],
    pub ck: [u8; 16],
    pub ik: [u8; 16],
    /// Expected RES, 4 to 16 bytes
    pub xres: Vec<u8>,
}

impl std::fmt::Debug for AuthVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthVector")
            .field("rand", &hex::encode(self.rand))
            .field("autn", &hex::encode(self.autn))
            .field("xres_len", &self.xres.len())
            .finish_non_exhaustive()
    }
}

impl AuthVector {
    /// SQN xor AK, the first 6 bytes of AUTN
    pub fn sqn_xor_ak(&self) -> [u8; 6] {
        let mut out = [0u8; 6];
        out.copy_from_slice(&self.autn[..6]);
        out
    }

    pub fn amf(&self) -> [u8; 2] {
        [self.autn[6], self.autn[7]]
    }

    pub fn validate(&self) -> Result<(), VectorError> {
        if !(EAP_AKA_RES_MIN_LEN..=EAP_AKA_RES_MAX_LEN).contains(&self.xres.len()) {
            return Err(VectorError::MalformedVector(format!(
                "XRES length {} out of range",
                self.xres.len()
            )));
        }
        Ok(())
    }
}

/// What the session asks for
#[derive(Debug, Clone, Copy)]
pub struct VectorRequest<'a> {
    /// Identity the vector is for
    pub identity: &'a [u8],
    /// AMF bits that must be set (the EAP-AKA' separation bit)
    pub amf: Option<[u8; 2]>,
}

/// Vector source, shared by all sessions
pub trait VectorProvider: Send + Sync {
    fn get_vector(&self, req: &VectorRequest<'_>) -> Result<AuthVector, VectorError>;
}

/// Vectors provisioned per identity, e.g. loaded from a subscriber store
#[derive(Default)]
pub struct StaticVectorProvider {
    vectors: HashMap<Vec<u8>, AuthVector>,
}

impl StaticVectorProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identity: impl Into<Vec<u8>>, vector: AuthVector) -> Result<(), VectorError> {
        vector.validate()?;
        self.vectors.insert(identity.into(), vector);
        Ok(())
    }
}

impl VectorProvider for StaticVectorProvider {
    fn get_vector(&self, req: &VectorRequest<'_>) -> Result<AuthVector, VectorError> {
        let vector = self
            .vectors
            .get(req.identity)
            .ok_or_else(|| VectorError::UnknownSubscriber(String::from_utf8_lossy(req.identity).into()))?;

        if let Some(amf) = req.amf {
            let autn_amf = vector.amf();
            if autn_amf[0] & amf[0] != amf[0] || autn_amf[1] & amf[1] != amf[1] {
                log::warn!(
                    "Provisioned AUTN AMF {} lacks requested bits {}",
                    hex::encode(autn_amf),
                    hex::encode(amf)
                );
            }
        }
        Ok(vector.clone())
    }
}

/// Long-term subscriber credentials for Milenage
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SubscriberCredentials {
    pub k: [u8; 16],
    pub opc: [u8; 16],
    pub amf: [u8; 2],
    /// Next SQN to hand out
    pub sqn: u64,
}

impl SubscriberCredentials {
    /// Credentials with OPc already derived
    pub fn with_opc(k: [u8; 16], opc: [u8; 16], amf: [u8; 2], sqn: u64) -> Self {
        Self { k, opc, amf, sqn: sqn & SQN_MASK }
    }

    /// Credentials from the operator variant OP
    pub fn with_op(k: [u8; 16], op: [u8; 16], amf: [u8; 2], sqn: u64) -> Result<Self, VectorError> {
        let opc = milenage_opc(&k, &op)?;
        Ok(Self::with_opc(k, opc, amf, sqn))
    }
}

/// Generates vectors with Milenage, advancing each subscriber's SQN
#[derive(Default)]
pub struct MilenageVectorProvider {
    subscribers: Mutex<HashMap<Vec<u8>, SubscriberCredentials>>,
}

impl MilenageVectorProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subscriber(
        &self,
        identity: impl Into<Vec<u8>>,
        credentials: SubscriberCredentials,
    ) -> Result<(), VectorError> {
        let mut subscribers = self
            .subscribers
            .lock()
            .map_err(|_| VectorError::Unavailable("subscriber table poisoned".into()))?;
        subscribers.insert(identity.into(), credentials);
        Ok(())
    }

    /// SQN that will be used for the next vector
    pub fn next_sqn(&self, identity: &[u8]) -> Option<u64> {
        let subscribers = self.subscribers.lock().ok()?;
        subscribers.get(identity).map(|s| s.sqn)
    }
}

impl VectorProvider for MilenageVectorProvider {
    fn get_vector(&self, req: &VectorRequest<'_>) -> Result<AuthVector, VectorError> {
        let mut subscribers = self
            .subscribers
            .lock()
            .map_err(|_| VectorError::Unavailable("subscriber table poisoned".into()))?;
        let sub = subscribers
            .get_mut(req.identity)
            .ok_or_else(|| VectorError::UnknownSubscriber(String::from_utf8_lossy(req.identity).into()))?;

        let mut amf = sub.amf;
        if let Some(bits) = req.amf {
            amf[0] |= bits[0];
            amf[1] |= bits[1];
        }

        let mut rand = [0u8; 16];
        rand::rng().fill_bytes(&mut rand);

        let sqn_bytes = sub.sqn.to_be_bytes();
        let mut sqn = [0u8; 6];
        sqn.copy_from_slice(&sqn_bytes[2..]);

        let v = milenage_generate(&sub.opc, &amf, &sub.k, &sqn, &rand)?;
        sub.sqn = (sub.sqn + 1) & SQN_MASK;

        log::debug!(
            "Generated Milenage vector for {} (SQN {}, AMF {})",
            String::from_utf8_lossy(req.identity),
            hex::encode(sqn),
            hex::encode(amf)
        );

        Ok(AuthVector {
            rand: v.rand,
            autn: v.autn,
            ck: v.ck,
            ik: v.ik,
            xres: v.xres.to_vec(),
        })
    }
}
