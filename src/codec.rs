//! Canonical Wire Codec
//!
//! The sole byte format accepted by the node's submission endpoint. Encoding
//! is bincode over the signed-transaction struct; field order is fixed by the
//! struct definition, so every implementation produces identical bytes for
//! identical transactions.

use bincode::Options;

use crate::error::TransactionError;
use crate::transaction::SignedTransaction;

/// Upper bound on an encoded transaction. A well-formed transfer is around
/// 200 bytes; anything larger is rejected before deserialization runs.
pub const MAX_TX_WIRE_BYTES: usize = 1024;

impl SignedTransaction {
    /// Encode to the canonical wire format.
    pub fn to_binary(&self) -> Result<Vec<u8>, TransactionError> {
        bincode::serialize(self).map_err(|_| TransactionError::MalformedEncoding)
    }

    /// Decode from the canonical wire format. Exact inverse of
    /// [`SignedTransaction::to_binary`].
    ///
    /// Fails with [`TransactionError::MalformedEncoding`] on truncated input,
    /// oversized input, trailing bytes, wrong field lengths, or public-key
    /// bytes that are not a valid curve point. Every transaction has exactly
    /// one accepted byte representation.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, TransactionError> {
        if bytes.len() > MAX_TX_WIRE_BYTES {
            return Err(TransactionError::MalformedEncoding);
        }
        // Same fixint layout as `bincode::serialize`, but strict about
        // consuming the whole input.
        bincode::options()
            .with_fixint_encoding()
            .reject_trailing_bytes()
            .deserialize(bytes)
            .map_err(|_| TransactionError::MalformedEncoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;
    use crate::signer::TransactionSigner;
    use crate::transaction::Transaction;

    fn signed_transfer() -> SignedTransaction {
        let sender = KeyPair::generate();
        let receiver = KeyPair::generate().address();
        let tx = Transaction::create(sender.address(), receiver, 7_500).unwrap();
        TransactionSigner::sign(&tx, sender.signing_key(), sender.public_key()).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let signed = signed_transfer();
        let bytes = signed.to_binary().unwrap();
        let decoded = SignedTransaction::from_binary(&bytes).unwrap();
        assert_eq!(signed, decoded);
        assert!(TransactionSigner::verify(&decoded));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let signed = signed_transfer();
        assert_eq!(signed.to_binary().unwrap(), signed.to_binary().unwrap());
    }

    #[test]
    fn test_truncated_input_is_rejected() {
        let bytes = signed_transfer().to_binary().unwrap();
        for len in [0, 1, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                SignedTransaction::from_binary(&bytes[..len]).is_err(),
                "accepted truncation to {} bytes",
                len
            );
        }
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut bytes = signed_transfer().to_binary().unwrap();
        bytes.extend_from_slice(&[0u8; 16]);
        assert!(matches!(
            SignedTransaction::from_binary(&bytes),
            Err(TransactionError::MalformedEncoding)
        ));
    }

    #[test]
    fn test_oversized_input_is_rejected() {
        let huge = vec![0u8; MAX_TX_WIRE_BYTES + 1];
        assert!(matches!(
            SignedTransaction::from_binary(&huge),
            Err(TransactionError::MalformedEncoding)
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(SignedTransaction::from_binary(&[0xffu8; 64]).is_err());
    }
}
