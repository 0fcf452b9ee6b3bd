mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alloy_primitives::Address;

use chain_intents::reconcile::{ActualSignature, MessageChallenge, SignatureReconciler};
use chain_intents::signature::{EthereumSignatureVerifier, SignatureVerifier};
use chain_intents::types::Status;

use common::{sign_message, test_signing_key, wallet_address};

/// Verifier that accepts everything and counts invocations.
#[derive(Default)]
struct CountingVerifier {
    calls: AtomicUsize,
}

impl SignatureVerifier for CountingVerifier {
    fn matches(&self, _message: &str, _signed_message: &str, _signer: Address) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        true
    }
}

fn challenge(expected_signer: Option<Address>) -> MessageChallenge {
    MessageChallenge {
        expected_message: "Verification message ID to sign: 42".into(),
        expected_signer,
    }
}

#[test]
fn pending_until_signer_attached() {
    let reconciler = SignatureReconciler::new(Arc::new(EthereumSignatureVerifier));
    let status = reconciler.reconcile(&challenge(None), &ActualSignature::default());
    assert_eq!(status, Status::Pending);
}

#[test]
fn pending_when_signer_known_but_message_missing() {
    let reconciler = SignatureReconciler::new(Arc::new(EthereumSignatureVerifier));
    let actual = ActualSignature {
        signer: Some(Address::repeat_byte(0x11)),
        signed_message: None,
    };
    assert_eq!(reconciler.reconcile(&challenge(None), &actual), Status::Pending);
}

#[test]
fn signer_mismatch_fails_without_verifying() {
    let verifier = Arc::new(CountingVerifier::default());
    let reconciler = SignatureReconciler::new(verifier.clone());

    let actual = ActualSignature {
        signer: Some(Address::repeat_byte(0x22)),
        signed_message: Some("0xabcd".into()),
    };
    let status = reconciler.reconcile(&challenge(Some(Address::repeat_byte(0x11))), &actual);

    assert_eq!(status, Status::Failed);
    assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn valid_personal_sign_signature_succeeds() {
    let key = test_signing_key();
    let wallet = wallet_address(&key);
    let reconciler = SignatureReconciler::new(Arc::new(EthereumSignatureVerifier));

    let challenge = challenge(Some(wallet));
    let actual = ActualSignature {
        signer: Some(wallet),
        signed_message: Some(sign_message(&key, &challenge.expected_message)),
    };

    assert_eq!(reconciler.reconcile(&challenge, &actual), Status::Success);
}

#[test]
fn signature_over_different_message_fails() {
    let key = test_signing_key();
    let wallet = wallet_address(&key);
    let reconciler = SignatureReconciler::new(Arc::new(EthereumSignatureVerifier));

    let actual = ActualSignature {
        signer: Some(wallet),
        signed_message: Some(sign_message(&key, "some other message")),
    };

    assert_eq!(
        reconciler.reconcile(&challenge(Some(wallet)), &actual),
        Status::Failed
    );
}

#[test]
fn unconstrained_challenge_accepts_any_valid_signer() {
    let key = test_signing_key();
    let wallet = wallet_address(&key);
    let reconciler = SignatureReconciler::new(Arc::new(EthereumSignatureVerifier));

    let challenge = challenge(None);
    let actual = ActualSignature {
        signer: Some(wallet),
        signed_message: Some(sign_message(&key, &challenge.expected_message)),
    };

    assert_eq!(reconciler.reconcile(&challenge, &actual), Status::Success);
}

#[test]
fn malformed_signature_fails() {
    let key = test_signing_key();
    let wallet = wallet_address(&key);
    let reconciler = SignatureReconciler::new(Arc::new(EthereumSignatureVerifier));

    let actual = ActualSignature {
        signer: Some(wallet),
        signed_message: Some("not hex at all".into()),
    };

    assert_eq!(
        reconciler.reconcile(&challenge(Some(wallet)), &actual),
        Status::Failed
    );
}
