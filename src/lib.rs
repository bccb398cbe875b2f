//! Ferrite Wallet Core
//!
//! Custody and transaction-signing core for the Ferrite cryptocurrency:
//! key generation, password-protected wallet files, transfer construction
//! and signing, the canonical wire codec, and ledger queries.
//!
//! ## Security Model
//!
//! - Private keys never leave the wallet; the only secret on disk is the
//!   Ed25519 seed, encrypted with Argon2id + ChaCha20-Poly1305
//! - Transaction signing happens locally
//! - Nodes are untrusted; signatures and addresses are verifiable end to end
//! - A wrong password and a tampered wallet file fail identically
//!
//! The CLI (argument parsing, password prompting, output formatting) and the
//! node itself live outside this crate.

pub mod codec;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod signer;
pub mod storage;
pub mod transaction;
pub mod wallet;

pub use error::{LedgerError, TransactionError, WalletError};
pub use keys::{derive_address, Address, KeyPair};
pub use ledger::{HttpLedgerClient, LedgerQueryClient};
pub use signer::TransactionSigner;
pub use storage::{EncryptedWalletRecord, SaveMode, WalletStore};
pub use transaction::{SignedTransaction, Transaction, TxId};
pub use wallet::Wallet;
