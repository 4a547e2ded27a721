//! EAP-AKA / EAP-AKA' server state machine
//!
//! One [`EapAkaSession`] per authentication attempt. The owner creates it
//! from the outer EAP-Response/Identity, calls [`EapAkaSession::start`] for
//! the first request and feeds every peer response to
//! [`EapAkaSession::process_response`] until the outcome is terminal.

use std::sync::Arc;

use crate::attr::{Attribute, AttributeSet};
use crate::checkcode::Checkcode;
use crate::codec::{AttributeCodec, CodecContext};
use crate::context::EapAkaConfig;
use crate::error::{CodecError, EapAkaError, EapAkaResult};
use crate::identity::{
    classify_identity, IdentityClass, IdentityResolver, IdentityType, MethodHint,
    PassthroughResolver,
};
use crate::keys::{KeyMaterial, MppeKeys};
use crate::packet::{EapCode, EapPacket, EAP_HEADER_LEN};
use crate::types::{
    client_error_name, notification_name, AttrType, EapAkaSubtype, EapMethod, IdReqLevel,
    NOTIFICATION_S_BIT,
};
use crate::vector::VectorProvider;

/// EAP-AKA session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EapAkaState {
    /// AKA-Identity request outstanding
    Identity,
    /// AKA-Challenge outstanding
    Challenge,
    /// Protected success notification outstanding
    SuccessNotification,
    /// EAP-Success sent
    Success,
    /// Failure notification outstanding
    FailureNotification,
    /// EAP-Failure sent
    Failure,
}

impl EapAkaState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EapAkaState::Success | EapAkaState::Failure)
    }
}

/// What the owner should do with the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EapAkaOutcome {
    /// Send the request and wait for the next response
    Continue,
    /// Send EAP-Success and export the keys
    Success,
    /// Send EAP-Failure
    Reject,
}

/// Reply to one method invocation
#[derive(Debug, Clone)]
pub struct EapAkaReply {
    pub outcome: EapAkaOutcome,
    /// Encoded EAP packet
    pub packet: Vec<u8>,
    /// MS-MPPE keys, only with [`EapAkaOutcome::Success`]
    pub mppe_keys: Option<MppeKeys>,
}

/// EAP-AKA server session
pub struct EapAkaSession {
    pub(crate) state: EapAkaState,
    pub(crate) method: EapMethod,
    pub(crate) kdf: u16,
    pub(crate) id_req: IdReqLevel,
    pub(crate) keys: KeyMaterial,
    pub(crate) checkcode: Checkcode,
    pub(crate) challenge_success: bool,
    pub(crate) allow_encrypted: bool,
    pub(crate) send_result_ind: bool,
    pub(crate) send_at_bidding: bool,
    /// Identifier of the next request
    pub(crate) aka_id: u8,
    pub(crate) last_response_id: Option<u8>,
    /// Attributes queued by policy for the next request
    pub(crate) pending: Vec<Attribute>,
    pub(crate) config: Arc<EapAkaConfig>,
    pub(crate) provider: Arc<dyn VectorProvider>,
    pub(crate) codec: Arc<dyn AttributeCodec>,
    pub(crate) resolver: Arc<dyn IdentityResolver>,
    /// Last packet composed
    pub(crate) reply: Vec<u8>,
    pub(crate) mppe: Option<MppeKeys>,
}

impl EapAkaSession {
    /// Create a session from the outer EAP-Response/Identity
    pub fn new(
        identity: &[u8],
        config: Arc<EapAkaConfig>,
        provider: Arc<dyn VectorProvider>,
        codec: Arc<dyn AttributeCodec>,
    ) -> Self {
        let method = config.method;

        let class = match classify_identity(identity) {
            Ok(class) => class,
            Err(e) => {
                log::warn!("Outer identity unusable: {}", e);
                IdentityClass { id_type: IdentityType::Unknown, method: MethodHint::Unknown }
            }
        };

        let hinted = match method {
            EapMethod::Aka => MethodHint::Aka,
            EapMethod::AkaPrime => MethodHint::AkaPrime,
        };
        if class.method != MethodHint::Unknown && class.method != hinted {
            log::warn!(
                "Identity hints {} but running {}",
                class.method.name(),
                method.name()
            );
        }

        let (state, id_req) =
            if config.request_identity || class.id_type == IdentityType::Unknown {
                (EapAkaState::Identity, IdReqLevel::Any)
            } else {
                (EapAkaState::Challenge, IdReqLevel::None)
            };

        log::debug!(
            "New {} session for {} ({:?} identity), starting in {:?}",
            method.name(),
            String::from_utf8_lossy(identity),
            class.id_type,
            state
        );

        Self {
            state,
            method,
            kdf: method.kdf(),
            id_req,
            keys: KeyMaterial {
                identity: identity.to_vec(),
                vector: None,
                derived: None,
            },
            checkcode: Checkcode::new(method.hash()),
            challenge_success: false,
            allow_encrypted: false,
            send_result_ind: config.protected_success,
            send_at_bidding: method.sends_bidding(),
            aka_id: rand::random(),
            last_response_id: None,
            pending: Vec::new(),
            config,
            provider,
            codec,
            resolver: Arc::new(PassthroughResolver),
            reply: Vec::new(),
            mppe: None,
        }
    }

    /// Replace the pseudonym / fast re-authentication resolver
    pub fn with_identity_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Compose the first request
    pub fn start(&mut self) -> EapAkaReply {
        self.run_entry(self.state);
        self.make_reply()
    }

    /// Handle one EAP-Response from the peer
    pub fn process_response(&mut self, packet: &[u8]) -> EapAkaReply {
        let next = match self.state {
            // Whatever arrives acknowledges the success notification
            EapAkaState::SuccessNotification => {
                if let Ok(eap) = EapPacket::decode(packet) {
                    self.last_response_id = Some(eap.header.identifier);
                }
                EapAkaState::Success
            }
            EapAkaState::Success | EapAkaState::Failure => self.state,
            _ => self.dispatch(packet),
        };
        self.enter_state(next);
        self.make_reply()
    }

    /// Queue an attribute for the next request
    pub fn queue_reply_attribute(&mut self, attr: Attribute) {
        self.pending.push(attr);
    }

    pub fn state(&self) -> EapAkaState {
        self.state
    }

    pub fn method(&self) -> EapMethod {
        self.method
    }

    pub fn id_req(&self) -> IdReqLevel {
        self.id_req
    }

    /// Identity bound into the session keys
    pub fn identity(&self) -> &[u8] {
        &self.keys.identity
    }

    pub fn challenge_success(&self) -> bool {
        self.challenge_success
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    fn make_reply(&self) -> EapAkaReply {
        let outcome = match self.state {
            EapAkaState::Success => EapAkaOutcome::Success,
            EapAkaState::Failure => EapAkaOutcome::Reject,
            _ => EapAkaOutcome::Continue,
        };
        EapAkaReply {
            outcome,
            packet: self.reply.clone(),
            mppe_keys: match outcome {
                EapAkaOutcome::Success => self.mppe.clone(),
                _ => None,
            },
        }
    }

    /// Decode a response and pick the next state
    fn dispatch(&mut self, packet: &[u8]) -> EapAkaState {
        let eap = match EapPacket::decode(packet) {
            Ok(eap) => eap,
            Err(e) => {
                log::error!("Malformed EAP packet: {}", e);
                return EapAkaState::FailureNotification;
            }
        };
        self.last_response_id = Some(eap.header.identifier);

        if eap.header.code != EapCode::Response {
            log::error!("Expected EAP-Response, got {:?}", eap.header.code);
            return EapAkaState::FailureNotification;
        }
        if eap.header.eap_type != Some(self.method.eap_type()) {
            let e = CodecError::UnexpectedEapType(eap.header.eap_type.unwrap_or_default());
            log::error!("{} for {}", e, self.method.name());
            return EapAkaState::FailureNotification;
        }

        let decoded = {
            let derived = self.keys.derived.as_ref();
            let ctx = CodecContext {
                method: self.method,
                k_aut: derived.map(|d| d.k_aut.as_slice()),
                k_encr: derived.map(|d| &d.k_encr),
            };
            self.codec.decode(&eap.type_data, &ctx)
        };
        let attrs = match decoded {
            Ok(attrs) => attrs,
            Err(e) => {
                log::error!("Failed decoding attributes: {}", e);
                return EapAkaState::FailureNotification;
            }
        };
        let Some(subtype) = attrs.subtype else {
            log::error!("Response carries no usable subtype");
            return EapAkaState::FailureNotification;
        };

        let raw = &packet[..EAP_HEADER_LEN + 1 + eap.type_data.len()];
        match self.transition(subtype, &attrs, raw) {
            Ok(next) => next,
            Err(e) => {
                log::error!("{:?} in {:?} rejected: {}", subtype, self.state, e);
                EapAkaState::FailureNotification
            }
        }
    }

    fn transition(
        &mut self,
        subtype: EapAkaSubtype,
        attrs: &AttributeSet,
        raw: &[u8],
    ) -> EapAkaResult<EapAkaState> {
        use EapAkaState as S;
        use EapAkaSubtype as T;

        match (self.state, subtype) {
            (S::Identity, T::Identity) => self.process_identity_response(attrs, raw),
            (S::Challenge, T::Challenge) => self.process_challenge_response(attrs, raw),
            (S::Identity | S::Challenge, T::ClientError) => {
                let code = attrs
                    .find(AttrType::ClientErrorCode)
                    .and_then(|a| a.value.as_u16());
                match code {
                    Some(code) => log::info!(
                        "Peer rejected request with client error {} ({})",
                        client_error_name(code),
                        code
                    ),
                    None => log::info!("Peer rejected request with client error"),
                }
                Ok(S::Failure)
            }
            (S::Identity | S::Challenge, T::Notification) => self.process_notification(attrs),
            (S::Challenge, T::AuthenticationReject) => {
                log::info!("Peer rejected our authentication");
                Ok(S::Failure)
            }
            (S::Challenge, T::SynchronizationFailure) => {
                log::warn!("Resynchronisation is not supported");
                Ok(S::FailureNotification)
            }
            (S::FailureNotification, T::Notification) => Ok(S::Failure),
            (state, subtype) => {
                log::error!("Unexpected {:?} response in {:?}", subtype, state);
                Ok(S::FailureNotification)
            }
        }
    }

    /// Peer-initiated notification; only the S bit matters
    fn process_notification(&mut self, attrs: &AttributeSet) -> EapAkaResult<EapAkaState> {
        let code = attrs
            .find(AttrType::Notification)
            .and_then(|a| a.value.as_u16())
            .ok_or(EapAkaError::MissingAttribute("AT_NOTIFICATION"))?;
        log::info!("Peer sent notification {} ({})", notification_name(code), code);

        if code & NOTIFICATION_S_BIT == 0 {
            Ok(EapAkaState::Failure)
        } else {
            Ok(self.state)
        }
    }

    fn enter_state(&mut self, new_state: EapAkaState) {
        if new_state == self.state {
            log::debug!("Reentering state {:?}", new_state);
        } else {
            log::debug!("Changed state {:?} -> {:?}", self.state, new_state);
        }
        self.state = new_state;
        self.run_entry(new_state);
    }

    /// Run entry actions, falling back at most twice
    fn run_entry(&mut self, state: EapAkaState) {
        let mut target = state;
        loop {
            let Err(e) = self.on_enter(target) else {
                return;
            };
            if e.is_invariant() {
                log::error!("BUG: {} entering {:?}", e, target);
            } else {
                log::error!("Failed entering {:?}: {}", target, e);
            }

            let fallback = match target {
                EapAkaState::Failure => return,
                EapAkaState::FailureNotification => EapAkaState::Failure,
                _ => EapAkaState::FailureNotification,
            };
            log::debug!("Changed state {:?} -> {:?}", target, fallback);
            self.state = fallback;
            target = fallback;
        }
    }

    fn on_enter(&mut self, state: EapAkaState) -> EapAkaResult<()> {
        match state {
            EapAkaState::Identity => self.compose_identity_request(),
            EapAkaState::Challenge => self.compose_challenge(),
            EapAkaState::SuccessNotification => {
                if !self.challenge_success {
                    return Err(EapAkaError::Invariant(
                        "success notification before successful challenge",
                    ));
                }
                self.compose_success_notification()
            }
            EapAkaState::Success => {
                if !self.challenge_success {
                    return Err(EapAkaError::Invariant("success before successful challenge"));
                }
                self.compose_eap_success()
            }
            EapAkaState::FailureNotification => self.compose_failure_notification(),
            EapAkaState::Failure => self.compose_eap_failure(),
        }
    }
}

impl std::fmt::Debug for EapAkaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EapAkaSession")
            .field("state", &self.state)
            .field("method", &self.method)
            .field("id_req", &self.id_req)
            .field("identity", &String::from_utf8_lossy(&self.keys.identity))
            .field("challenge_success", &self.challenge_success)
            .field("aka_id", &self.aka_id)
            .finish_non_exhaustive()
    }
}
