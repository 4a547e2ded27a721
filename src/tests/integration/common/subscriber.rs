//! Subscriber provisioning utilities
//!
//! Provides test subscribers and their NAI identities.

use ogs_eap_aka::prelude::{EapMethod, SubscriberCredentials};

/// Realm appended to test identities
pub const TEST_REALM: &str = "wlan.mnc001.mcc001.3gppnetwork.org";

/// Test subscriber data
#[derive(Debug, Clone)]
pub struct TestSubscriber {
    /// IMSI (International Mobile Subscriber Identity)
    pub imsi: String,

    /// Security context
    pub security: SubscriberSecurity,
}

/// Subscriber security data, hex encoded as in a subscriber database
#[derive(Debug, Clone)]
pub struct SubscriberSecurity {
    /// Authentication key (K)
    pub k: String,

    /// Operator variant algorithm configuration field (OPc)
    pub opc: String,

    /// Authentication Management Field (AMF)
    pub amf: String,

    /// Sequence number the network uses next
    pub sqn: u64,
}

impl Default for SubscriberSecurity {
    fn default() -> Self {
        Self {
            // 3GPP TS 35.208 test set 1
            k: "465b5ce8b199b49faa5f0a2ee238a6bc".to_string(),
            opc: "cd63cb71954a9f4e48a5994e37a02baf".to_string(),
            amf: "0000".to_string(),
            sqn: 32,
        }
    }
}

impl TestSubscriber {
    /// Create a test subscriber with default security
    pub fn new(imsi: &str) -> Self {
        Self {
            imsi: imsi.to_string(),
            security: SubscriberSecurity::default(),
        }
    }

    /// Override the network SQN
    pub fn with_sqn(mut self, sqn: u64) -> Self {
        self.security.sqn = sqn;
        self
    }

    /// Override K and OPc
    pub fn with_keys(mut self, k: [u8; 16], opc: [u8; 16]) -> Self {
        self.security.k = hex::encode(k);
        self.security.opc = hex::encode(opc);
        self
    }

    pub fn k(&self) -> [u8; 16] {
        decode_hex(&self.security.k)
    }

    pub fn opc(&self) -> [u8; 16] {
        decode_hex(&self.security.opc)
    }

    pub fn amf(&self) -> [u8; 2] {
        decode_hex(&self.security.amf)
    }

    /// Credentials for the Milenage vector provider
    pub fn credentials(&self) -> SubscriberCredentials {
        SubscriberCredentials::with_opc(self.k(), self.opc(), self.amf(), self.security.sqn)
    }

    /// Permanent identity with the tag for `method`
    pub fn permanent_identity(&self, method: EapMethod) -> Vec<u8> {
        let tag = match method {
            EapMethod::Aka => '0',
            EapMethod::AkaPrime => '6',
        };
        format!("{}{}@{}", tag, self.imsi, TEST_REALM).into_bytes()
    }

    /// Pseudonym identity with the tag for `method`
    pub fn pseudonym(&self, method: EapMethod, pseudonym: &str) -> Vec<u8> {
        let tag = match method {
            EapMethod::Aka => '2',
            EapMethod::AkaPrime => '7',
        };
        format!("{}{}@{}", tag, pseudonym, TEST_REALM).into_bytes()
    }
}

fn decode_hex<const N: usize>(s: &str) -> [u8; N] {
    let bytes = hex::decode(s).expect("valid hex");
    bytes.try_into().expect("hex value has the wrong length")
}
