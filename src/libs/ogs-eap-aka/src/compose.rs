//! Outbound message construction
//!
//! Every request goes through [`EapAkaSession::compose`], which merges
//! policy-queued attributes, strips encrypted attributes until the session
//! may send them and assigns the next identifier.

use std::sync::Arc;

use crate::attr::{AttrValue, Attribute, AttributeSet};
use crate::codec::CodecContext;
use crate::eap_aka_sm::EapAkaSession;
use crate::error::{EapAkaError, EapAkaResult};
use crate::identity::classify_identity;
use crate::keys::derive_keys;
use crate::packet::{EapCode, EapHeader, EapPacket};
use crate::types::{
    notification_name, AttrType, EapAkaSubtype, EapMethod, EAP_AKA_BIDDING_PREFER_AKA_PRIME,
    EAP_AKA_MAC_LEN, EAP_AKA_PRIME_AMF_SEPARATION, NOTIFICATION_GENERAL_FAILURE,
    NOTIFICATION_P_BIT, NOTIFICATION_S_BIT, NOTIFICATION_SUCCESS,
};
use crate::vector::VectorRequest;

impl EapAkaSession {
    /// Encode a request from `attrs`, consuming queued attributes
    pub(crate) fn compose(&mut self, mut attrs: AttributeSet) -> EapAkaResult<Vec<u8>> {
        let codec = Arc::clone(&self.codec);
        let dict = codec.dictionary();

        // Attributes the method set itself win over queued ones
        for attr in self.pending.drain(..) {
            if !attrs.contains(attr.attr_type) {
                attrs.push(attr);
            }
        }

        if !self.allow_encrypted {
            attrs.retain(|a| {
                let encrypted = dict.is_encrypted(a.attr_type);
                if encrypted {
                    log::warn!(
                        "Dropping {}, encrypted attributes not allowed yet",
                        dict.name(a.attr_type)
                    );
                }
                !encrypted
            });
        }

        let header = EapHeader {
            code: EapCode::Request,
            identifier: self.aka_id,
            eap_type: Some(self.method.eap_type()),
        };
        let derived = self.keys.derived.as_ref();
        let ctx = CodecContext {
            method: self.method,
            k_aut: derived.map(|d| d.k_aut.as_slice()),
            k_encr: derived.map(|d| &d.k_encr),
        };
        let packet = codec.encode(&header, &attrs, &ctx)?;

        log::debug!(
            "Sending {} {:?} (id {}, {} bytes)",
            self.method.name(),
            attrs.subtype,
            self.aka_id,
            packet.len()
        );
        self.aka_id = self.aka_id.wrapping_add(1);
        Ok(packet)
    }

    pub(crate) fn compose_identity_request(&mut self) -> EapAkaResult<()> {
        let req = self
            .id_req
            .request_attr()
            .ok_or(EapAkaError::Invariant("identity request without a level"))?;

        self.allow_encrypted = false;

        let mut attrs = AttributeSet::new(EapAkaSubtype::Identity);
        attrs.push(self.codec.dictionary().build(req, AttrValue::Flag)?);
        let packet = self.compose(attrs)?;

        log::debug!("Requesting {} identity", self.id_req.name());
        self.checkcode.update(&packet)?;
        self.reply = packet;
        Ok(())
    }

    pub(crate) fn compose_challenge(&mut self) -> EapAkaResult<()> {
        let amf = match self.method {
            EapMethod::AkaPrime => Some(EAP_AKA_PRIME_AMF_SEPARATION),
            EapMethod::Aka => None,
        };

        let class = classify_identity(&self.keys.identity)?;
        let vector_identity = self.resolver.resolve(&self.keys.identity, class)?;
        let vector = self.provider.get_vector(&VectorRequest {
            identity: &vector_identity,
            amf,
        })?;
        vector.validate()?;

        let derived = derive_keys(
            self.method,
            self.kdf,
            &self.keys.identity,
            &vector,
            self.config.network_id.as_deref(),
        )?;

        let codec = Arc::clone(&self.codec);
        let dict = codec.dictionary();
        let mut attrs = AttributeSet::new(EapAkaSubtype::Challenge);

        if self.send_result_ind {
            attrs.push(dict.build(AttrType::ResultInd, AttrValue::Flag)?);
        }
        if self.send_at_bidding {
            attrs.push(dict.build(
                AttrType::Bidding,
                AttrValue::U16(EAP_AKA_BIDDING_PREFER_AKA_PRIME),
            )?);
        }
        if self.method == EapMethod::AkaPrime {
            let network = self
                .config
                .network_id
                .as_deref()
                .ok_or(EapAkaError::MissingNetworkName)?;
            attrs.push(dict.build(
                AttrType::KdfInput,
                AttrValue::Octets(network.as_bytes().to_vec()),
            )?);
            attrs.push(dict.build(AttrType::Kdf, AttrValue::U16(self.kdf))?);
        }
        attrs.push(dict.build(AttrType::Rand, AttrValue::Octets(vector.rand.to_vec()))?);
        attrs.push(dict.build(AttrType::Autn, AttrValue::Octets(vector.autn.to_vec()))?);
        attrs.push(Attribute::octets(AttrType::Mac, vec![0u8; EAP_AKA_MAC_LEN]));

        if !self.checkcode.is_started() {
            log::debug!("No identity exchange, sending empty AT_CHECKCODE");
        }
        let checkcode = self.checkcode.finalize().to_vec();
        attrs.push(dict.build(AttrType::Checkcode, AttrValue::Octets(checkcode))?);

        self.keys.vector = Some(vector);
        self.keys.derived = Some(derived);

        self.reply = self.compose(attrs)?;
        self.allow_encrypted = true;
        Ok(())
    }

    pub(crate) fn compose_success_notification(&mut self) -> EapAkaResult<()> {
        if self.keys.derived.is_none() {
            return Err(EapAkaError::MissingKeys);
        }
        let mut attrs = AttributeSet::new(EapAkaSubtype::Notification);
        attrs.push(Attribute::u16(AttrType::Notification, NOTIFICATION_SUCCESS));
        attrs.push(Attribute::octets(AttrType::Mac, vec![0u8; EAP_AKA_MAC_LEN]));
        self.reply = self.compose(attrs)?;
        Ok(())
    }

    pub(crate) fn compose_failure_notification(&mut self) -> EapAkaResult<()> {
        let injected = self
            .pending
            .iter()
            .find(|a| a.attr_type == AttrType::Notification)
            .and_then(|a| a.value.as_u16());
        let mut code = injected.unwrap_or(NOTIFICATION_GENERAL_FAILURE);

        code &= !NOTIFICATION_S_BIT;
        if self.challenge_success {
            code &= !NOTIFICATION_P_BIT;
        } else {
            code |= NOTIFICATION_P_BIT;
        }

        let mut attrs = AttributeSet::new(EapAkaSubtype::Notification);
        attrs.push(Attribute::u16(AttrType::Notification, code));
        if self.challenge_success {
            attrs.push(Attribute::octets(AttrType::Mac, vec![0u8; EAP_AKA_MAC_LEN]));
        }

        log::info!(
            "Sending failure notification {} ({})",
            notification_name(code),
            code
        );
        self.reply = self.compose(attrs)?;
        Ok(())
    }

    /// Identifier for EAP-Success/Failure, echoes the last response
    fn terminal_identifier(&self) -> u8 {
        self.last_response_id.unwrap_or(self.aka_id)
    }

    pub(crate) fn compose_eap_success(&mut self) -> EapAkaResult<()> {
        let derived = self.keys.derived.as_ref().ok_or(EapAkaError::MissingKeys)?;
        self.mppe = Some(derived.mppe_keys());
        self.reply = EapPacket::new_success(self.terminal_identifier()).encode()?;
        log::info!(
            "{} succeeded for {}",
            self.method.name(),
            String::from_utf8_lossy(&self.keys.identity)
        );
        Ok(())
    }

    pub(crate) fn compose_eap_failure(&mut self) -> EapAkaResult<()> {
        self.mppe = None;
        self.reply = EapPacket::new_failure(self.terminal_identifier()).encode()?;
        log::info!(
            "{} failed for {}",
            self.method.name(),
            String::from_utf8_lossy(&self.keys.identity)
        );
        Ok(())
    }
}
