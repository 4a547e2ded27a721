//! Test context management
//!
//! Holds the configuration and vector provider shared by the sessions of a
//! test and drives a session against a simulated peer.

use std::sync::Arc;

use ogs_eap_aka::prelude::*;

use super::message::{CapturedMessage, MessageCapture};
use super::peer::SimulatedPeer;
use super::subscriber::TestSubscriber;

/// Upper bound on request/response rounds in one run
pub const MAX_ROUNDS: usize = 10;

/// Network name used by the test configurations
pub const TEST_NETWORK_ID: &str = "WLAN";

/// Shared state of one test
pub struct TestContext {
    pub config: Arc<EapAkaConfig>,
    pub provider: Arc<MilenageVectorProvider>,
    pub capture: MessageCapture,
}

impl TestContext {
    /// Context for `method` with default settings
    pub fn new(method: EapMethod) -> Self {
        let method = match method {
            EapMethod::Aka => "aka",
            EapMethod::AkaPrime => "aka_prime",
        };
        Self::from_yaml(&format!(
            "eap_aka:\n  network_id: {}\n  method: {}\n",
            TEST_NETWORK_ID, method
        ))
    }

    /// Context from a YAML configuration
    pub fn from_yaml(yaml: &str) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = EapAkaConfig::from_yaml_str(yaml).expect("valid configuration");
        Self {
            config: Arc::new(config),
            provider: Arc::new(MilenageVectorProvider::new()),
            capture: MessageCapture::new(),
        }
    }

    /// Register `subscriber` under its permanent identity
    pub fn provision(&self, subscriber: &TestSubscriber) {
        let identity = subscriber.permanent_identity(self.config.method);
        self.provider
            .add_subscriber(identity, subscriber.credentials())
            .expect("provision subscriber");
    }

    /// New session for the outer identity
    pub fn session(&self, identity: &[u8]) -> EapAkaSession {
        EapAkaSession::new(
            identity,
            Arc::clone(&self.config),
            self.provider.clone(),
            Arc::new(SimCodec::new()),
        )
    }

    /// Run `session` against `peer` until it finishes
    pub fn run(&mut self, session: &mut EapAkaSession, peer: &mut SimulatedPeer) -> EapAkaReply {
        let mut reply = session.start();
        self.capture.capture(CapturedMessage::from_packet(&reply.packet, "server"));

        for _ in 0..MAX_ROUNDS {
            if reply.outcome != EapAkaOutcome::Continue {
                return reply;
            }
            let response = peer.respond(&reply.packet);
            self.capture.capture(CapturedMessage::from_packet(&response, "peer"));

            reply = session.process_response(&response);
            self.capture.capture(CapturedMessage::from_packet(&reply.packet, "server"));
        }
        panic!("session did not finish within {} rounds", MAX_ROUNDS);
    }
}
