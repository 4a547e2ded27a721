//! AKA-Identity negotiation
//!
//! The server only ever asks for a stronger identity: Any-ID, then
//! FullAuth-ID, then Permanent-ID, then it challenges whatever it has.

use crate::attr::AttributeSet;
use crate::eap_aka_sm::{EapAkaSession, EapAkaState};
use crate::error::{EapAkaError, EapAkaResult};
use crate::identity::classify_identity;
use crate::types::{AttrType, IdReqLevel};

impl EapAkaSession {
    pub(crate) fn process_identity_response(
        &mut self,
        attrs: &AttributeSet,
        raw: &[u8],
    ) -> EapAkaResult<EapAkaState> {
        self.checkcode.update(raw)?;

        if let Some(identity) = attrs.find(AttrType::Identity).and_then(|a| a.value.as_octets()) {
            match classify_identity(identity) {
                Ok(class) => log::debug!(
                    "Peer identity {} ({:?}, {})",
                    String::from_utf8_lossy(identity),
                    class.id_type,
                    class.method.name()
                ),
                Err(e) => log::warn!("Unclassifiable AT_IDENTITY: {}", e),
            }
            self.keys.identity = identity.to_vec();
        }

        let next = match self.id_req {
            IdReqLevel::None => {
                return Err(EapAkaError::Invariant("identity response without a request level"))
            }
            IdReqLevel::Any => {
                self.id_req = IdReqLevel::FullAuth;
                EapAkaState::Identity
            }
            IdReqLevel::FullAuth => {
                self.id_req = IdReqLevel::Permanent;
                EapAkaState::Identity
            }
            IdReqLevel::Permanent => EapAkaState::Challenge,
        };
        Ok(next)
    }
}
