//! Error types for the wallet core.
//!
//! Every failure surfaces as a typed variant so callers can branch on the
//! kind instead of matching message strings. Nothing in the core retries or
//! swallows an error; retry policy belongs to the caller.

use std::path::PathBuf;

/// Errors from key handling, wallet files and encryption.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// Key material had the wrong length or format.
    #[error("invalid key material")]
    InvalidKey,

    /// Address string was not 64 hex characters.
    #[error("invalid address")]
    InvalidAddress,

    /// The password does not meet the minimum policy (non-empty).
    #[error("password must not be empty")]
    WeakPassword,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// No wallet file at the given path.
    #[error("wallet file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A create-only save found an existing wallet file.
    #[error("wallet file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// The wallet record is structurally invalid independent of the password
    /// (bad JSON, bad hex, wrong field lengths, unsupported version).
    #[error("wallet record is corrupt")]
    Corrupt,

    /// Wrong password or tampered ciphertext. Deliberately a single variant
    /// with no detail: the two cases must stay indistinguishable.
    #[error("wallet decryption failed")]
    DecryptionFailed,
}

/// Errors from transaction construction, signing and the wire codec.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Transfer amount must be strictly positive.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// The signing key and public key are not a matching pair.
    #[error("signing key does not match the supplied public key")]
    SigningError,

    /// Wire bytes were truncated or structurally invalid.
    #[error("malformed transaction encoding")]
    MalformedEncoding,
}

/// Errors from the external ledger interface.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The node could not be reached, timed out, or returned garbage.
    #[error("ledger node unreachable: {0}")]
    Unreachable(String),

    /// The ledger does not know the address. Callers treat this as zero
    /// balance / empty history, not as a failure.
    #[error("address not known to the ledger")]
    NotFound,

    /// The node answered with an RPC-level error.
    #[error("ledger rpc error {code}: {message}")]
    Rpc { code: i32, message: String },
}
