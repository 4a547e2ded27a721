//! Property-based tests for authentication flows
//!
//! Random subscribers run the whole exchange against the simulated USIM.

use proptest::prelude::*;

use ogs_eap_aka::prelude::*;

use crate::common::{MessageType, PeerBehaviour, SimulatedPeer, TestContext, TestSubscriber};

// ============================================================================
// Strategies for generating test data
// ============================================================================

/// Strategy for generating valid IMSI values
fn arb_imsi() -> impl Strategy<Value = String> {
    (100u32..999, 10u32..99, 0u64..9_999_999_999)
        .prop_map(|(mcc, mnc, msin)| format!("{:03}{:02}{:010}", mcc, mnc, msin))
}

/// Strategy for generating a provisioned subscriber
fn arb_subscriber() -> impl Strategy<Value = TestSubscriber> {
    (arb_imsi(), any::<[u8; 16]>(), any::<[u8; 16]>(), 1u64..(1 << 40)).prop_map(
        |(imsi, k, opc, sqn)| TestSubscriber::new(&imsi).with_keys(k, opc).with_sqn(sqn),
    )
}

fn arb_method() -> impl Strategy<Value = EapMethod> {
    prop_oneof![Just(EapMethod::Aka), Just(EapMethod::AkaPrime)]
}

// ============================================================================
// Flow properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// An honest USIM always authenticates and both ends agree on the MSK
    #[test]
    fn prop_honest_peer_succeeds(subscriber in arb_subscriber(), method in arb_method()) {
        let mut ctx = TestContext::new(method);
        ctx.provision(&subscriber);

        let identity = subscriber.permanent_identity(method);
        let mut session = ctx.session(&identity);
        let mut peer = SimulatedPeer::new(&subscriber, method, &identity);

        let reply = ctx.run(&mut session, &mut peer);
        prop_assert_eq!(reply.outcome, EapAkaOutcome::Success);
        prop_assert!(reply.mppe_keys.is_some());
        prop_assert_eq!(reply.mppe_keys, peer.mppe_keys());
    }

    /// Identity rounds never change the keys agreed at the end
    #[test]
    fn prop_identity_rounds_succeed(subscriber in arb_subscriber(), method in arb_method()) {
        let mut ctx = TestContext::new(method);
        ctx.provision(&subscriber);

        let mut session = ctx.session(b"anonymous@wlan");
        let mut peer = SimulatedPeer::new(&subscriber, method, b"anonymous");

        let reply = ctx.run(&mut session, &mut peer);
        prop_assert_eq!(reply.outcome, EapAkaOutcome::Success);
        prop_assert_eq!(peer.id_requests.len(), 3);
        prop_assert_eq!(reply.mppe_keys, peer.mppe_keys());
    }

    /// A wrong RES never authenticates and never yields keys
    #[test]
    fn prop_wrong_res_rejected(subscriber in arb_subscriber(), method in arb_method()) {
        let mut ctx = TestContext::new(method);
        ctx.provision(&subscriber);

        let identity = subscriber.permanent_identity(method);
        let mut session = ctx.session(&identity);
        let mut peer = SimulatedPeer::new(&subscriber, method, &identity)
            .with_behaviour(PeerBehaviour::WrongRes);

        let reply = ctx.run(&mut session, &mut peer);
        prop_assert_eq!(reply.outcome, EapAkaOutcome::Reject);
        prop_assert!(reply.mppe_keys.is_none());
        prop_assert_eq!(
            ctx.capture.types().last().copied(),
            Some(MessageType::EapFailure)
        );
    }
}
