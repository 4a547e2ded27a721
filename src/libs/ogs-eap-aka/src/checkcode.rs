//! AT_CHECKCODE accumulator (RFC 4187 10.13)
//!
//! Hashes every EAP-Request/AKA-Identity and EAP-Response/AKA-Identity packet.
//! The digest is finalised when the first challenge is built and frozen
//! afterwards.

use ogs_crypt::sha::{ShaAlgorithm, ShaContext};

use crate::error::{EapAkaError, EapAkaResult};

#[derive(Clone)]
pub struct Checkcode {
    algorithm: ShaAlgorithm,
    /// Running digest, present between the first identity packet and finalisation
    state: Option<ShaContext>,
    /// Frozen digest, empty if no identity packets were exchanged
    value: Option<Vec<u8>>,
}

impl Checkcode {
    pub fn new(algorithm: ShaAlgorithm) -> Self {
        Self { algorithm, state: None, value: None }
    }

    /// Digest one identity-phase packet, initialising on first use
    pub fn update(&mut self, packet: &[u8]) -> EapAkaResult<()> {
        if self.value.is_some() {
            return Err(EapAkaError::CheckcodeFrozen);
        }
        self.state
            .get_or_insert_with(|| ShaContext::new(self.algorithm))
            .update(packet);
        Ok(())
    }

    /// Finalise once; later calls return the frozen value
    pub fn finalize(&mut self) -> &[u8] {
        if self.value.is_none() {
            let digest = self.state.take().map(|ctx| ctx.finalize()).unwrap_or_default();
            log::debug!("Checkcode finalised ({} bytes)", digest.len());
            self.value = Some(digest);
        }
        self.value.as_deref().unwrap_or_default()
    }

    /// Frozen digest, `None` before finalisation
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn is_frozen(&self) -> bool {
        self.value.is_some()
    }

    /// Whether any identity packet has been digested
    pub fn is_started(&self) -> bool {
        self.state.is_some() || self.value.as_ref().is_some_and(|v| !v.is_empty())
    }
}
