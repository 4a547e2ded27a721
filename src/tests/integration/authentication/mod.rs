//! EAP-AKA flow integration tests
//!
//! Full runs of the RFC 4187 method between the server state machine and a
//! simulated USIM.

use ogs_eap_aka::prelude::*;
use ogs_eap_aka::types::{NOTIFICATION_GENERAL_FAILURE, NOTIFICATION_P_BIT};

use crate::common::{MessageType, PeerBehaviour, SimulatedPeer, TestContext, TestSubscriber};

use EapAkaSubtype::{AuthenticationReject, Challenge, ClientError, Identity, Notification};
use MessageType::{EapFailure, EapSuccess, Request, Response};

const IMSI: &str = "001010000000001";

/// Test EAP-AKA with a permanent outer identity: straight to the challenge
#[test]
fn test_aka_direct_challenge() {
    let mut ctx = TestContext::new(EapMethod::Aka);
    let subscriber = TestSubscriber::new(IMSI);
    ctx.provision(&subscriber);

    let identity = subscriber.permanent_identity(EapMethod::Aka);
    let mut session = ctx.session(&identity);
    let mut peer = SimulatedPeer::new(&subscriber, EapMethod::Aka, &identity);

    let reply = ctx.run(&mut session, &mut peer);
    assert_eq!(reply.outcome, EapAkaOutcome::Success);
    assert_eq!(
        ctx.capture.types(),
        vec![Request(Challenge), Response(Challenge), EapSuccess]
    );

    // Both ends derived the same MSK
    assert_eq!(reply.mppe_keys, peer.mppe_keys());
    assert!(reply.mppe_keys.is_some());

    // Network SQN advanced past the one used
    assert_eq!(ctx.provider.next_sqn(&identity), Some(subscriber.security.sqn + 1));
}

/// Test EAP-AKA with an anonymous outer identity and the full identity ladder
#[test]
fn test_aka_identity_rounds() {
    let mut ctx = TestContext::new(EapMethod::Aka);
    let subscriber = TestSubscriber::new(IMSI);
    ctx.provision(&subscriber);

    let mut session = ctx.session(b"anonymous@wlan.mnc001.mcc001.3gppnetwork.org");
    let mut peer = SimulatedPeer::new(&subscriber, EapMethod::Aka, b"anonymous");

    let reply = ctx.run(&mut session, &mut peer);
    assert_eq!(reply.outcome, EapAkaOutcome::Success);
    assert_eq!(
        peer.id_requests,
        vec![AttrType::AnyIdReq, AttrType::FullauthIdReq, AttrType::PermanentIdReq]
    );
    assert!(ctx.capture.has_sequence(&[
        Request(Identity),
        Response(Identity),
        Request(Identity),
        Response(Identity),
        Request(Identity),
        Response(Identity),
        Request(Challenge),
        Response(Challenge),
        EapSuccess,
    ]));
    assert_eq!(session.identity(), subscriber.permanent_identity(EapMethod::Aka).as_slice());
    assert_eq!(reply.mppe_keys, peer.mppe_keys());
}

/// Test identities increase by one per request and Success echoes the response
#[test]
fn test_aka_identifiers() {
    let mut ctx = TestContext::new(EapMethod::Aka);
    let subscriber = TestSubscriber::new(IMSI);
    ctx.provision(&subscriber);

    let mut session = ctx.session(b"anonymous@wlan");
    let mut peer = SimulatedPeer::new(&subscriber, EapMethod::Aka, b"anonymous");
    ctx.run(&mut session, &mut peer);

    let messages = ctx.capture.messages();
    let requests: Vec<u8> = messages
        .iter()
        .filter(|m| matches!(m.msg_type, Request(_)))
        .filter_map(|m| m.identifier)
        .collect();
    for pair in requests.windows(2) {
        assert_eq!(pair[1], pair[0].wrapping_add(1));
    }

    let last_response = messages.iter().rev().find(|m| matches!(m.msg_type, Response(_))).unwrap();
    let success = messages.last().unwrap();
    assert_eq!(success.msg_type, EapSuccess);
    assert_eq!(success.identifier, last_response.identifier);
}

/// Test a wrong RES ends in a failure notification and EAP-Failure
#[test]
fn test_aka_wrong_res() {
    let mut ctx = TestContext::new(EapMethod::Aka);
    let subscriber = TestSubscriber::new(IMSI);
    ctx.provision(&subscriber);

    let identity = subscriber.permanent_identity(EapMethod::Aka);
    let mut session = ctx.session(&identity);
    let mut peer = SimulatedPeer::new(&subscriber, EapMethod::Aka, &identity)
        .with_behaviour(PeerBehaviour::WrongRes);

    let reply = ctx.run(&mut session, &mut peer);
    assert_eq!(reply.outcome, EapAkaOutcome::Reject);
    assert!(reply.mppe_keys.is_none());
    assert!(!session.challenge_success());
    assert!(ctx.capture.has_sequence(&[
        Request(Challenge),
        Response(Challenge),
        Request(Notification),
        Response(Notification),
        EapFailure,
    ]));

    // Pre-challenge failure keeps the phase bit
    assert_eq!(peer.last_notification, Some(NOTIFICATION_GENERAL_FAILURE));
    assert_ne!(NOTIFICATION_GENERAL_FAILURE & NOTIFICATION_P_BIT, 0);
}

/// Test the peer rejecting our AUTN ends without a notification round
#[test]
fn test_aka_authentication_reject() {
    let mut ctx = TestContext::new(EapMethod::Aka);
    let subscriber = TestSubscriber::new(IMSI);
    ctx.provision(&subscriber);

    let identity = subscriber.permanent_identity(EapMethod::Aka);
    let mut session = ctx.session(&identity);
    let mut peer = SimulatedPeer::new(&subscriber, EapMethod::Aka, &identity)
        .with_behaviour(PeerBehaviour::RejectChallenge);

    let reply = ctx.run(&mut session, &mut peer);
    assert_eq!(reply.outcome, EapAkaOutcome::Reject);
    assert_eq!(
        ctx.capture.types(),
        vec![Request(Challenge), Response(AuthenticationReject), EapFailure]
    );
}

/// Test a USIM with different keys rejects the challenge
#[test]
fn test_aka_wrong_subscriber_keys() {
    let mut ctx = TestContext::new(EapMethod::Aka);
    let subscriber = TestSubscriber::new(IMSI);
    ctx.provision(&subscriber);

    let identity = subscriber.permanent_identity(EapMethod::Aka);
    let cloned = TestSubscriber::new(IMSI).with_keys([0x11; 16], [0x22; 16]);
    let mut session = ctx.session(&identity);
    let mut peer = SimulatedPeer::new(&cloned, EapMethod::Aka, &identity);

    let reply = ctx.run(&mut session, &mut peer);
    assert_eq!(reply.outcome, EapAkaOutcome::Reject);
    assert!(ctx.capture.has_sequence(&[Response(AuthenticationReject), EapFailure]));
}

/// Test a USIM ahead of the network asks for resynchronisation, which fails
#[test]
fn test_aka_synchronization_failure() {
    let mut ctx = TestContext::new(EapMethod::Aka);
    let subscriber = TestSubscriber::new(IMSI);
    ctx.provision(&subscriber);

    let identity = subscriber.permanent_identity(EapMethod::Aka);
    let mut session = ctx.session(&identity);
    let mut peer = SimulatedPeer::new(&subscriber, EapMethod::Aka, &identity)
        .with_sqn_ms(subscriber.security.sqn + 100);

    let reply = ctx.run(&mut session, &mut peer);
    assert_eq!(reply.outcome, EapAkaOutcome::Reject);
    assert!(ctx.capture.has_sequence(&[
        Response(EapAkaSubtype::SynchronizationFailure),
        Request(Notification),
        Response(Notification),
        EapFailure,
    ]));
}

/// Test a client error during identity negotiation
#[test]
fn test_aka_client_error() {
    let mut ctx = TestContext::new(EapMethod::Aka);
    let subscriber = TestSubscriber::new(IMSI);
    ctx.provision(&subscriber);

    let mut session = ctx.session(b"anonymous@wlan");
    let mut peer = SimulatedPeer::new(&subscriber, EapMethod::Aka, b"anonymous")
        .with_behaviour(PeerBehaviour::ClientError);

    let reply = ctx.run(&mut session, &mut peer);
    assert_eq!(reply.outcome, EapAkaOutcome::Reject);
    assert_eq!(
        ctx.capture.types(),
        vec![Request(Identity), Response(ClientError), EapFailure]
    );
}

/// Test an unprovisioned subscriber gets a failure notification straight away
#[test]
fn test_aka_unknown_subscriber() {
    let mut ctx = TestContext::new(EapMethod::Aka);
    let subscriber = TestSubscriber::new("001010000000099");

    let identity = subscriber.permanent_identity(EapMethod::Aka);
    let mut session = ctx.session(&identity);
    let mut peer = SimulatedPeer::new(&subscriber, EapMethod::Aka, &identity);

    let reply = ctx.run(&mut session, &mut peer);
    assert_eq!(reply.outcome, EapAkaOutcome::Reject);
    assert_eq!(
        ctx.capture.types(),
        vec![Request(Notification), Response(Notification), EapFailure]
    );
}

/// Test request_identity forces an identity round for a permanent identity
#[test]
fn test_aka_request_identity_setting() {
    let mut ctx = TestContext::from_yaml("eap_aka:\n  method: aka\n  request_identity: true\n");
    let subscriber = TestSubscriber::new(IMSI);
    ctx.provision(&subscriber);

    let identity = subscriber.permanent_identity(EapMethod::Aka);
    let mut session = ctx.session(&identity);
    let mut peer = SimulatedPeer::new(&subscriber, EapMethod::Aka, &identity);

    let reply = ctx.run(&mut session, &mut peer);
    assert_eq!(reply.outcome, EapAkaOutcome::Success);
    assert_eq!(ctx.capture.messages_of_type(Request(Identity)).len(), 3);
    assert_eq!(ctx.capture.messages()[0].msg_type, Request(Identity));
}
