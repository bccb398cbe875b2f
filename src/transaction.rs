//! Transaction Construction
//!
//! Builds unsigned transfer transactions. Construction is pure data work:
//! no I/O, no clock. The transaction id is a content hash over the transfer
//! fields, so two identical transfers are the same transaction and
//! resubmission is idempotent; replay accounting is the ledger's job.

use std::fmt;

use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TransactionError;
use crate::keys::Address;

/// Nanofer per FER (fixed-point, 9 decimal places).
pub const NANOFER_PER_FER: u64 = 1_000_000_000;

/// Domain tag for transaction ids.
const TXID_TAG: &[u8] = b"ferrite-txid-v1";

/// Domain tag for the signing hash.
const SIGNING_TAG: &[u8] = b"ferrite-tx-sign-v1";

/// A transaction id: SHA-256 over the transfer fields.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId([u8; 32]);

impl TxId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", hex::encode(self.0))
    }
}

/// An unsigned transfer transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Address,
    pub receiver: Address,
    /// Amount in nanofer.
    pub amount: u64,
    /// Content-derived id over (sender, receiver, amount).
    pub id: TxId,
}

impl Transaction {
    /// Create a transfer from `sender` to `receiver`.
    ///
    /// Fails with [`TransactionError::InvalidAmount`] on a zero amount.
    /// Self-transfers are allowed; the ledger decides whether they settle.
    pub fn create(
        sender: Address,
        receiver: Address,
        amount: u64,
    ) -> Result<Self, TransactionError> {
        if amount == 0 {
            return Err(TransactionError::InvalidAmount);
        }
        let id = Self::compute_id(&sender, &receiver, amount);
        Ok(Self {
            sender,
            receiver,
            amount,
            id,
        })
    }

    fn compute_id(sender: &Address, receiver: &Address, amount: u64) -> TxId {
        let mut hasher = Sha256::new();
        hasher.update(TXID_TAG);
        hasher.update(sender.as_bytes());
        hasher.update(receiver.as_bytes());
        hasher.update(amount.to_le_bytes());
        TxId(hasher.finalize().into())
    }

    /// The id this transaction's content dictates. Equal to `self.id` for
    /// anything built through [`Transaction::create`]; decoded or hand-built
    /// values may disagree, which verification treats as invalid.
    pub fn content_id(&self) -> TxId {
        Self::compute_id(&self.sender, &self.receiver, self.amount)
    }

    /// The message to be signed: a tagged hash over every field except the
    /// signature itself. Both signing and verification go through here, so
    /// this is the canonical encoding of the transfer.
    pub fn signing_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(SIGNING_TAG);
        hasher.update(self.sender.as_bytes());
        hasher.update(self.receiver.as_bytes());
        hasher.update(self.amount.to_le_bytes());
        hasher.update(self.id.as_bytes());
        hasher.finalize().into()
    }
}

/// A transaction bound to a signature proving authorization by the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub payload: Transaction,
    pub signature: Signature,
    pub signer_public_key: VerifyingKey,
}

impl SignedTransaction {
    pub fn id(&self) -> TxId {
        self.payload.id
    }
}

/// Parse a decimal FER amount ("10", "10.5", "0.000000001") into nanofer.
///
/// Rejects more than 9 fractional digits, non-digits, and values that
/// overflow `u64`. A parsed zero is representable; zero is rejected later by
/// [`Transaction::create`].
pub fn parse_amount(s: &str) -> Result<u64, TransactionError> {
    let (whole, frac) = match s.split_once('.') {
        // A dot requires digits on both sides; "10." is not an amount.
        Some((w, f)) if !f.is_empty() => (w, f),
        Some(_) => return Err(TransactionError::InvalidAmount),
        None => (s, ""),
    };
    if whole.is_empty() || frac.len() > 9 {
        return Err(TransactionError::InvalidAmount);
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TransactionError::InvalidAmount);
    }
    let whole: u64 = whole.parse().map_err(|_| TransactionError::InvalidAmount)?;
    let mut frac_nanofer: u64 = 0;
    if !frac.is_empty() {
        let scale = 10u64.pow((9 - frac.len()) as u32);
        let frac: u64 = frac.parse().map_err(|_| TransactionError::InvalidAmount)?;
        frac_nanofer = frac * scale;
    }
    whole
        .checked_mul(NANOFER_PER_FER)
        .and_then(|n| n.checked_add(frac_nanofer))
        .ok_or(TransactionError::InvalidAmount)
}

/// Format nanofer as a decimal FER string.
pub fn format_amount(nanofer: u64) -> String {
    format!(
        "{}.{:09} FER",
        nanofer / NANOFER_PER_FER,
        nanofer % NANOFER_PER_FER
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;

    fn addr() -> Address {
        KeyPair::generate().address()
    }

    #[test]
    fn test_create_rejects_zero_amount() {
        assert!(matches!(
            Transaction::create(addr(), addr(), 0),
            Err(TransactionError::InvalidAmount)
        ));
    }

    #[test]
    fn test_identical_transfers_share_an_id() {
        let (a, b) = (addr(), addr());
        let tx1 = Transaction::create(a, b, 500).unwrap();
        let tx2 = Transaction::create(a, b, 500).unwrap();
        assert_eq!(tx1.id, tx2.id);
        assert_eq!(tx1, tx2);
    }

    #[test]
    fn test_id_depends_on_every_field() {
        let (a, b, c) = (addr(), addr(), addr());
        let base = Transaction::create(a, b, 500).unwrap();
        assert_ne!(base.id, Transaction::create(a, b, 501).unwrap().id);
        assert_ne!(base.id, Transaction::create(a, c, 500).unwrap().id);
        assert_ne!(base.id, Transaction::create(c, b, 500).unwrap().id);
    }

    #[test]
    fn test_self_transfer_is_allowed() {
        let a = addr();
        assert!(Transaction::create(a, a, 100).is_ok());
    }

    #[test]
    fn test_signing_hash_is_stable() {
        let tx = Transaction::create(addr(), addr(), 42).unwrap();
        assert_eq!(tx.signing_hash(), tx.signing_hash());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("10").unwrap(), 10 * NANOFER_PER_FER);
        assert_eq!(parse_amount("10.5").unwrap(), 10_500_000_000);
        assert_eq!(parse_amount("0.000000001").unwrap(), 1);
        assert_eq!(parse_amount("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        for bad in ["", ".", "10.", "1.2.3", "abc", "1.0000000001", "-5", "1e9"] {
            assert!(parse_amount(bad).is_err(), "accepted {:?}", bad);
        }
        // Overflow past u64 nanofer.
        assert!(parse_amount("18446744073709.551616").is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(10_500_000_000), "10.500000000 FER");
        assert_eq!(format_amount(1), "0.000000001 FER");
    }
}
