//! Transaction Signing and Verification
//!
//! All signing happens locally against the wallet's own key material; the
//! ledger only ever sees the signed result. Verification is a pure predicate:
//! any mismatch, including a signer key that does not hash to the claimed
//! sender address, yields `false` rather than an error.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::TransactionError;
use crate::keys::derive_address;
use crate::transaction::{SignedTransaction, Transaction};

pub struct TransactionSigner;

impl TransactionSigner {
    /// Sign `transaction` with `signing_key`.
    ///
    /// The caller-supplied `public_key` must be the signing key's own public
    /// half; a mismatched pair fails with [`TransactionError::SigningError`]
    /// before anything is signed. The signature covers the canonical signing
    /// hash, which excludes the signature field itself.
    pub fn sign(
        transaction: &Transaction,
        signing_key: &SigningKey,
        public_key: &VerifyingKey,
    ) -> Result<SignedTransaction, TransactionError> {
        if signing_key.verifying_key() != *public_key {
            return Err(TransactionError::SigningError);
        }
        let signature = signing_key.sign(&transaction.signing_hash());
        Ok(SignedTransaction {
            payload: transaction.clone(),
            signature,
            signer_public_key: *public_key,
        })
    }

    /// Check that the signature verifies over the canonical signing hash,
    /// that the signer's key derives to the claimed sender address, and that
    /// the id is the content hash of the transfer fields.
    pub fn verify(signed: &SignedTransaction) -> bool {
        match derive_address(signed.signer_public_key.as_bytes()) {
            Ok(addr) if addr == signed.payload.sender => {}
            _ => return false,
        }
        if signed.payload.id != signed.payload.content_id() {
            return false;
        }
        signed
            .signer_public_key
            .verify(&signed.payload.signing_hash(), &signed.signature)
            .is_ok()
    }
}
