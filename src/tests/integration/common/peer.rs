//! Simulated EAP-AKA peer
//!
//! Answers server requests the way a supplicant with a Milenage USIM would:
//! it checks AUTN, tracks SQN, derives the session keys, checks the server's
//! AT_MAC and AT_CHECKCODE, and signs its own responses.

use ogs_crypt::milenage::{milenage_check, MilenageCheck, MilenageError};
use ogs_eap_aka::checkcode::Checkcode;
use ogs_eap_aka::codec::compute_mac;
use ogs_eap_aka::keys::{derive_keys, DerivedKeys, MppeKeys};
use ogs_eap_aka::packet::{EapCode, EapHeader, EapPacket};
use ogs_eap_aka::prelude::*;

use super::subscriber::TestSubscriber;

/// How the peer misbehaves, if at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerBehaviour {
    /// Follows the protocol
    Honest,
    /// Answers the challenge with a corrupted RES
    WrongRes,
    /// Rejects every challenge
    RejectChallenge,
    /// Answers the identity request with a client error
    ClientError,
}

/// USIM side of an authentication run
pub struct SimulatedPeer {
    method: EapMethod,
    identity: Vec<u8>,
    /// Identity sent in AT_IDENTITY when asked
    disclosed_identity: Vec<u8>,
    k: [u8; 16],
    opc: [u8; 16],
    /// Highest SQN accepted so far
    sqn_ms: [u8; 6],
    network_id: Option<String>,
    codec: SimCodec,
    checkcode: Checkcode,
    keys: Option<DerivedKeys>,
    /// Echo AT_RESULT_IND when the server offers it
    pub result_ind: bool,
    pub behaviour: PeerBehaviour,
    /// Last AT_NOTIFICATION value received
    pub last_notification: Option<u16>,
    /// Identity-request levels seen, in order
    pub id_requests: Vec<AttrType>,
}

impl SimulatedPeer {
    /// Peer for `subscriber`, sending `identity` as its outer identity
    pub fn new(subscriber: &TestSubscriber, method: EapMethod, identity: &[u8]) -> Self {
        let last_seen = subscriber.security.sqn.saturating_sub(1);
        let mut sqn_ms = [0u8; 6];
        sqn_ms.copy_from_slice(&last_seen.to_be_bytes()[2..]);

        Self {
            method,
            identity: identity.to_vec(),
            disclosed_identity: subscriber.permanent_identity(method),
            k: subscriber.k(),
            opc: subscriber.opc(),
            sqn_ms,
            network_id: None,
            codec: SimCodec::new(),
            checkcode: Checkcode::new(method.hash()),
            keys: None,
            result_ind: true,
            behaviour: PeerBehaviour::Honest,
            last_notification: None,
            id_requests: Vec::new(),
        }
    }

    /// Access network name the peer expects in AT_KDF_INPUT
    pub fn with_network_id(mut self, network_id: &str) -> Self {
        self.network_id = Some(network_id.to_string());
        self
    }

    pub fn with_behaviour(mut self, behaviour: PeerBehaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    /// Identity disclosed in AT_IDENTITY
    pub fn with_disclosed_identity(mut self, identity: &[u8]) -> Self {
        self.disclosed_identity = identity.to_vec();
        self
    }

    /// Pretend the USIM already accepted `sqn`
    pub fn with_sqn_ms(mut self, sqn: u64) -> Self {
        self.sqn_ms.copy_from_slice(&sqn.to_be_bytes()[2..]);
        self
    }

    /// Identity the peer binds into its keys
    pub fn identity(&self) -> &[u8] {
        &self.identity
    }

    /// MPPE keys the peer derived, if the challenge succeeded
    pub fn mppe_keys(&self) -> Option<MppeKeys> {
        self.keys.as_ref().map(|k| k.mppe_keys())
    }

    fn ctx(&self) -> CodecContext<'_> {
        CodecContext {
            method: self.method,
            k_aut: self.keys.as_ref().map(|k| k.k_aut.as_slice()),
            k_encr: self.keys.as_ref().map(|k| &k.k_encr),
        }
    }

    fn encode(&self, request: &[u8], attrs: &AttributeSet) -> Vec<u8> {
        let header = EapHeader {
            code: EapCode::Response,
            identifier: request[1],
            eap_type: Some(self.method.eap_type()),
        };
        self.codec
            .encode(&header, attrs, &self.ctx())
            .expect("encode response")
    }

    /// Answer one EAP-Request
    pub fn respond(&mut self, request: &[u8]) -> Vec<u8> {
        let eap = EapPacket::decode(request).expect("decode request");
        assert_eq!(eap.header.code, EapCode::Request);
        assert_eq!(eap.header.eap_type, Some(self.method.eap_type()));

        let attrs = self
            .codec
            .decode(&eap.type_data, &self.ctx())
            .expect("decode attributes");
        match attrs.subtype {
            Some(EapAkaSubtype::Identity) => self.on_identity(request, &attrs),
            Some(EapAkaSubtype::Challenge) => self.on_challenge(request, &attrs),
            Some(EapAkaSubtype::Notification) => self.on_notification(request, &attrs),
            other => panic!("peer cannot handle {:?}", other),
        }
    }

    fn on_identity(&mut self, request: &[u8], attrs: &AttributeSet) -> Vec<u8> {
        let level = [AttrType::AnyIdReq, AttrType::FullauthIdReq, AttrType::PermanentIdReq]
            .into_iter()
            .find(|t| attrs.contains(*t))
            .expect("identity request without a level");
        self.id_requests.push(level);

        if self.behaviour == PeerBehaviour::ClientError {
            let mut resp = AttributeSet::new(EapAkaSubtype::ClientError);
            resp.push(Attribute::u16(AttrType::ClientErrorCode, 0));
            return self.encode(request, &resp);
        }

        self.checkcode.update(request).expect("checkcode open");
        self.identity = self.disclosed_identity.clone();
        let mut resp = AttributeSet::new(EapAkaSubtype::Identity);
        resp.push(Attribute::octets(AttrType::Identity, self.identity.clone()));
        let packet = self.encode(request, &resp);
        self.checkcode.update(&packet).expect("checkcode open");
        packet
    }

    fn on_challenge(&mut self, request: &[u8], attrs: &AttributeSet) -> Vec<u8> {
        let octets = |t: AttrType| -> Vec<u8> {
            attrs
                .find(t)
                .and_then(|a| a.value.as_octets())
                .map(<[u8]>::to_vec)
                .unwrap_or_else(|| panic!("challenge without {:?}", t))
        };
        let rand: [u8; 16] = octets(AttrType::Rand).try_into().expect("AT_RAND");
        let autn: [u8; 16] = octets(AttrType::Autn).try_into().expect("AT_AUTN");

        if self.method == EapMethod::AkaPrime {
            assert_eq!(attrs.find(AttrType::Kdf).and_then(|a| a.value.as_u16()), Some(1));
            assert_ne!(autn[6] & 0x80, 0, "AMF separation bit not set");
        } else {
            assert!(!attrs.contains(AttrType::Kdf));
        }

        if self.behaviour == PeerBehaviour::RejectChallenge {
            return self.encode(request, &AttributeSet::new(EapAkaSubtype::AuthenticationReject));
        }

        let (res, ck, ik) = match milenage_check(&self.opc, &self.k, &self.sqn_ms, &rand, &autn) {
            Ok(MilenageCheck::Accepted { res, ck, ik, sqn }) => {
                self.sqn_ms = sqn;
                (res, ck, ik)
            }
            Ok(MilenageCheck::SyncFailure { auts }) => {
                let mut resp = AttributeSet::new(EapAkaSubtype::SynchronizationFailure);
                resp.push(Attribute::octets(AttrType::Auts, auts.to_vec()));
                return self.encode(request, &resp);
            }
            Err(MilenageError::MacMismatch) | Err(MilenageError::AesError) => {
                return self.encode(request, &AttributeSet::new(EapAkaSubtype::AuthenticationReject));
            }
        };

        let vector = AuthVector { rand, autn, ck, ik, xres: res.to_vec() };
        let network = match self.method {
            EapMethod::AkaPrime => self.network_id.clone().or_else(|| {
                attrs
                    .find(AttrType::KdfInput)
                    .and_then(|a| a.value.as_octets())
                    .map(|n| String::from_utf8_lossy(n).into_owned())
            }),
            EapMethod::Aka => None,
        };
        let keys = derive_keys(self.method, self.method.kdf(), &self.identity, &vector, network.as_deref())
            .expect("peer key derivation");

        // Server AT_MAC is checked with the keys we derived
        let input = self
            .codec
            .mac_input(request)
            .expect("mac input")
            .expect("challenge without AT_MAC");
        let expected = compute_mac(self.method, &keys.k_aut, &input);
        let received = octets(AttrType::Mac);
        if received != expected {
            log::debug!("Peer: server AT_MAC does not verify");
            return self.encode(request, &AttributeSet::new(EapAkaSubtype::AuthenticationReject));
        }

        let server_checkcode = octets(AttrType::Checkcode);
        assert_eq!(server_checkcode, self.checkcode.finalize(), "server checkcode");

        self.keys = Some(keys);

        let mut res = res.to_vec();
        if self.behaviour == PeerBehaviour::WrongRes {
            res[0] ^= 0xff;
        }

        let mut resp = AttributeSet::new(EapAkaSubtype::Challenge);
        resp.push(Attribute::octets(AttrType::Res, res));
        if self.result_ind && attrs.contains(AttrType::ResultInd) {
            resp.push(Attribute::flag(AttrType::ResultInd));
        }
        resp.push(Attribute::octets(AttrType::Mac, vec![0u8; 16]));
        resp.push(Attribute::octets(AttrType::Checkcode, server_checkcode));
        self.encode(request, &resp)
    }

    fn on_notification(&mut self, request: &[u8], attrs: &AttributeSet) -> Vec<u8> {
        let code = attrs
            .find(AttrType::Notification)
            .and_then(|a| a.value.as_u16())
            .expect("notification without AT_NOTIFICATION");
        self.last_notification = Some(code);

        let mut resp = AttributeSet::new(EapAkaSubtype::Notification);
        if attrs.contains(AttrType::Mac) && self.keys.is_some() {
            resp.push(Attribute::octets(AttrType::Mac, vec![0u8; 16]));
        }
        self.encode(request, &resp)
    }
}
