//! AKA-Challenge response verification

use subtle::ConstantTimeEq;

use crate::attr::AttributeSet;
use crate::codec::compute_mac;
use crate::eap_aka_sm::{EapAkaSession, EapAkaState};
use crate::error::{EapAkaError, EapAkaResult};
use crate::types::{AttrType, EAP_AKA_MAC_LEN};

impl EapAkaSession {
    /// Check AT_MAC, AT_CHECKCODE and AT_RES of a challenge response
    pub(crate) fn process_challenge_response(
        &mut self,
        attrs: &AttributeSet,
        raw: &[u8],
    ) -> EapAkaResult<EapAkaState> {
        self.verify_mac(attrs, raw)?;
        self.verify_checkcode(attrs)?;
        self.verify_res(attrs)?;

        self.challenge_success = true;
        log::debug!("Challenge response verified");

        if attrs.contains(AttrType::ResultInd) {
            Ok(EapAkaState::SuccessNotification)
        } else {
            Ok(EapAkaState::Success)
        }
    }

    fn verify_mac(&self, attrs: &AttributeSet, raw: &[u8]) -> EapAkaResult<()> {
        let derived = self.keys.derived.as_ref().ok_or(EapAkaError::MissingKeys)?;

        let received = attrs
            .find(AttrType::Mac)
            .and_then(|a| a.value.as_octets())
            .ok_or(EapAkaError::MissingAttribute("AT_MAC"))?;
        if received.len() != EAP_AKA_MAC_LEN {
            return Err(EapAkaError::InvalidAttributeLength {
                name: "AT_MAC",
                expected: EAP_AKA_MAC_LEN,
                actual: received.len(),
            });
        }

        let input = self
            .codec
            .mac_input(raw)?
            .ok_or(EapAkaError::MissingAttribute("AT_MAC"))?;
        let expected = compute_mac(self.method, &derived.k_aut, &input);

        if !bool::from(expected[..].ct_eq(received)) {
            log::debug!("Received AT_MAC {}", hex::encode(received));
            log::debug!("Expected AT_MAC {}", hex::encode(expected));
            return Err(EapAkaError::MacMismatch);
        }
        Ok(())
    }

    fn verify_checkcode(&self, attrs: &AttributeSet) -> EapAkaResult<()> {
        let ours = self.checkcode.value().unwrap_or_default();

        let Some(received) = attrs
            .find(AttrType::Checkcode)
            .and_then(|a| a.value.as_octets())
        else {
            if !ours.is_empty() {
                log::debug!("Peer did not include AT_CHECKCODE");
            }
            return Ok(());
        };

        if received.len() != ours.len() || !bool::from(received.ct_eq(ours)) {
            log::debug!("Received AT_CHECKCODE {}", hex::encode(received));
            log::debug!("Expected AT_CHECKCODE {}", hex::encode(ours));
            return Err(EapAkaError::CheckcodeMismatch);
        }
        Ok(())
    }

    fn verify_res(&self, attrs: &AttributeSet) -> EapAkaResult<()> {
        let vector = self.keys.vector.as_ref().ok_or(EapAkaError::MissingKeys)?;

        let res = attrs
            .find(AttrType::Res)
            .and_then(|a| a.value.as_octets())
            .ok_or(EapAkaError::MissingAttribute("AT_RES"))?;

        if res.len() != vector.xres.len() {
            log::debug!(
                "AT_RES is {} bytes, XRES is {} bytes",
                res.len(),
                vector.xres.len()
            );
            return Err(EapAkaError::ResMismatch);
        }
        if !bool::from(res.ct_eq(vector.xres.as_slice())) {
            log::debug!("Received AT_RES {}", hex::encode(res));
            log::debug!("Expected XRES   {}", hex::encode(&vector.xres));
            return Err(EapAkaError::ResMismatch);
        }
        Ok(())
    }
}
