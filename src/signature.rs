use alloy_primitives::{hex, Address, Signature};

/// Checks that a signed message was produced by a claimed signer over a given
/// plaintext. Pure, no I/O.
pub trait SignatureVerifier: Send + Sync {
    /// True when `signed_message` is a valid signature of `message` by
    /// `signer`. Malformed input is a non-match, never an error.
    fn matches(&self, message: &str, signed_message: &str, signer: Address) -> bool;
}

/// EIP-191 personal-sign verification for EVM wallets.
///
/// The signed message is the usual 65-byte r || s || v payload as a hex string,
/// with or without a `0x` prefix. Recovery hashes the plaintext with the
/// `"\x19Ethereum Signed Message:\n"` prefix before recovering the signer, so
/// signatures produced by `personal_sign` verify directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct EthereumSignatureVerifier;

impl EthereumSignatureVerifier {
    fn recover(message: &str, signed_message: &str) -> Option<Address> {
        let bytes = hex::decode(signed_message).ok()?;
        if bytes.len() != 65 {
            return None;
        }
        let signature = Signature::from_raw(&bytes).ok()?;
        signature.recover_address_from_msg(message.as_bytes()).ok()
    }
}

impl SignatureVerifier for EthereumSignatureVerifier {
    fn matches(&self, message: &str, signed_message: &str, signer: Address) -> bool {
        Self::recover(message, signed_message) == Some(signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = "Verification message ID to sign: 7d8ef5a1";

    fn signer() -> Address {
        Address::repeat_byte(0x42)
    }

    #[test]
    fn one_byte_signature_is_non_match() {
        let verifier = EthereumSignatureVerifier;
        assert!(!verifier.matches(MESSAGE, "0xab", signer()));
    }

    #[test]
    fn non_hex_signature_is_non_match() {
        let verifier = EthereumSignatureVerifier;
        let garbage = "0x".to_string() + &"zz".repeat(65);
        assert!(!verifier.matches(MESSAGE, &garbage, signer()));
    }

    #[test]
    fn empty_signature_is_non_match() {
        let verifier = EthereumSignatureVerifier;
        assert!(!verifier.matches(MESSAGE, "", signer()));
    }

    #[test]
    fn wrong_length_hex_is_non_match() {
        // 64 bytes: valid hex, one byte short of r || s || v.
        let verifier = EthereumSignatureVerifier;
        let short = "11".repeat(64);
        assert!(!verifier.matches(MESSAGE, &short, signer()));
    }

    #[test]
    fn all_zero_signature_is_non_match() {
        let verifier = EthereumSignatureVerifier;
        let zeroes = "00".repeat(65);
        assert!(!verifier.matches(MESSAGE, &zeroes, signer()));
    }
}
