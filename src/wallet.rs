//! Wallet
//!
//! A named holder of one keypair and its derived address. The wallet lives
//! in memory only while loaded; persistence is explicit through
//! [`Wallet::write_to_file`] / [`crate::storage::WalletStore`], and nothing
//! is written in the background.
//!
//! A `Wallet` is owned by the caller that loaded it. Signing is synchronous
//! and must not be driven from two threads over the same handle without
//! external synchronization. Ledger queries never mutate the wallet, so
//! cancelling one cannot leave the handle in a partial state.

use std::path::Path;

use tracing::debug;

use crate::error::{LedgerError, TransactionError, WalletError};
use crate::keys::{Address, KeyPair};
use crate::ledger::LedgerQueryClient;
use crate::signer::TransactionSigner;
use crate::storage::{EncryptedWalletRecord, SaveMode};
use crate::transaction::{SignedTransaction, Transaction};

pub struct Wallet {
    name: String,
    address: Address,
    key_pair: KeyPair,
}

impl Wallet {
    /// Create a wallet with a freshly generated keypair.
    ///
    /// The password is validated here (non-empty) but only used once the
    /// wallet is persisted; creation itself performs no I/O, so a caller can
    /// inspect the wallet before committing it to storage.
    pub fn create_new(name: &str, password: &str) -> Result<Self, WalletError> {
        if password.is_empty() {
            return Err(WalletError::WeakPassword);
        }
        let key_pair = KeyPair::generate();
        let address = key_pair.address();
        debug!(name, %address, "created wallet");
        Ok(Self {
            name: name.to_string(),
            address,
            key_pair,
        })
    }

    /// Load a wallet from an encrypted wallet file.
    ///
    /// Fails with [`WalletError::NotFound`] for a missing file,
    /// [`WalletError::Corrupt`] for a structurally bad record, and
    /// [`WalletError::DecryptionFailed`] for a wrong password or tampered
    /// ciphertext (the last two indistinguishably).
    pub fn load_from_file(path: &Path, password: &str) -> Result<Self, WalletError> {
        let record = EncryptedWalletRecord::load(path)?;
        let recorded_address: Address =
            record.address.parse().map_err(|_| WalletError::Corrupt)?;

        let seed = record.decrypt_seed(password)?;
        let key_pair = KeyPair::from_seed_bytes(seed.as_ref())?;

        // The clear-text address must match the decrypted key material.
        if key_pair.address() != recorded_address {
            return Err(WalletError::Corrupt);
        }

        debug!(name = %record.name, address = %recorded_address, "loaded wallet");
        Ok(Self {
            name: record.name,
            address: recorded_address,
            key_pair,
        })
    }

    /// Encrypt and write this wallet to `path`.
    pub fn write_to_file(
        &self,
        path: &Path,
        password: &str,
        mode: SaveMode,
    ) -> Result<(), WalletError> {
        let seed = self.key_pair.seed_bytes();
        let record = EncryptedWalletRecord::encrypt(
            &self.name,
            &self.address.to_string(),
            &seed,
            password,
        )?;
        record.save(path, mode)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Build an unsigned transfer from this wallet to `receiver`.
    pub fn create_transaction(
        &self,
        receiver: Address,
        amount: u64,
    ) -> Result<Transaction, TransactionError> {
        Transaction::create(self.address, receiver, amount)
    }

    /// Sign a transaction with this wallet's key.
    pub fn sign_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<SignedTransaction, TransactionError> {
        TransactionSigner::sign(
            transaction,
            self.key_pair.signing_key(),
            self.key_pair.public_key(),
        )
    }

    /// Current balance in nanofer, as reported by the ledger right now.
    /// Never cached; an address the ledger does not know has balance zero.
    pub async fn balance<L>(&self, ledger: &L) -> Result<u64, LedgerError>
    where
        L: LedgerQueryClient + ?Sized,
    {
        match ledger.query_balance(&self.address).await {
            Ok(balance) => Ok(balance),
            Err(LedgerError::NotFound) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Transaction history for this wallet's address, in the ledger's own
    /// order. Each call re-queries; an unknown address has empty history.
    pub async fn history<L>(&self, ledger: &L) -> Result<Vec<SignedTransaction>, LedgerError>
    where
        L: LedgerQueryClient + ?Sized,
    {
        match ledger.query_history(&self.address).await {
            Ok(transactions) => Ok(transactions),
            Err(LedgerError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PASSWORD: &str = "hunter2-but-longer";

    #[test]
    fn test_create_rejects_empty_password() {
        assert!(matches!(
            Wallet::create_new("alice", ""),
            Err(WalletError::WeakPassword)
        ));
    }

    #[test]
    fn test_address_matches_key_pair() {
        let wallet = Wallet::create_new("alice", PASSWORD).unwrap();
        assert_eq!(wallet.address(), wallet.key_pair().address());
    }

    #[test]
    fn test_write_then_load_preserves_identity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alice.wallet");

        let wallet = Wallet::create_new("alice", PASSWORD).unwrap();
        wallet
            .write_to_file(&path, PASSWORD, SaveMode::CreateNew)
            .unwrap();

        let loaded = Wallet::load_from_file(&path, PASSWORD).unwrap();
        assert_eq!(loaded.name(), "alice");
        assert_eq!(loaded.address(), wallet.address());
        assert_eq!(
            loaded.key_pair().public_key(),
            wallet.key_pair().public_key()
        );
    }

    #[test]
    fn test_load_with_wrong_password_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alice.wallet");

        let wallet = Wallet::create_new("alice", PASSWORD).unwrap();
        wallet
            .write_to_file(&path, PASSWORD, SaveMode::CreateNew)
            .unwrap();

        assert!(matches!(
            Wallet::load_from_file(&path, "p2"),
            Err(WalletError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_sign_transaction_verifies() {
        let wallet = Wallet::create_new("alice", PASSWORD).unwrap();
        let receiver = Wallet::create_new("bob", PASSWORD).unwrap();

        let tx = wallet
            .create_transaction(receiver.address(), 10_000)
            .unwrap();
        let signed = wallet.sign_transaction(&tx).unwrap();

        assert!(TransactionSigner::verify(&signed));
        assert_eq!(signed.payload.sender, wallet.address());
    }
}
