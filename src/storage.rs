//! Encrypted Wallet Storage
//!
//! Securely persists wallet key material using:
//! - Argon2id for password-based key derivation (parameters stored per file)
//! - ChaCha20-Poly1305 for authenticated encryption
//!
//! The on-disk record is self-describing JSON with hex/base64 string fields.
//! Writes go to a temporary file in the same directory and are renamed into
//! place, so a crash mid-write never leaves a half-written record at the
//! wallet's canonical path.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::WalletError;
use crate::wallet::Wallet;

/// Current wallet file format version.
const WALLET_VERSION: u32 = 1;

/// File extension for wallet records.
pub const WALLET_FILE_EXTENSION: &str = "wallet";

/// Argon2 defaults (tuned for security vs. usability).
const ARGON2_MEMORY_KIB: u32 = 65536; // 64 MiB
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 4;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const SEED_LEN: usize = 32;

/// Whether a save may replace an existing wallet file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Fail with [`WalletError::AlreadyExists`] if the file is present.
    CreateNew,
    /// Replace whatever is at the path.
    Overwrite,
}

/// Key-derivation parameters, persisted so old files stay readable when the
/// defaults change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfParams {
    /// KDF identifier; only "argon2id" is understood.
    pub algorithm: String,
    pub m_cost_kib: u32,
    pub t_cost: u32,
    pub p_cost: u32,
    /// Argon2 salt (base64, unpadded).
    pub salt: String,
}

/// Encrypted wallet file structure.
///
/// Name and address are stored in the clear so a wallet can be inspected
/// without its password; the Ed25519 seed is what the ciphertext protects.
/// The Poly1305 authentication tag rides at the end of the ciphertext, so a
/// wrong password and a tampered record fail through the identical path.
#[derive(Debug, Serialize, Deserialize)]
pub struct EncryptedWalletRecord {
    version: u32,
    pub name: String,
    /// Address as 64 hex chars.
    pub address: String,
    kdf: KdfParams,
    /// ChaCha20-Poly1305 nonce (12 bytes, hex encoded).
    nonce: String,
    /// Encrypted seed plus auth tag (hex encoded).
    ciphertext: String,
}

impl EncryptedWalletRecord {
    /// Encrypt a wallet seed under `password` with a fresh salt and nonce.
    pub fn encrypt(
        name: &str,
        address: &str,
        seed: &[u8; SEED_LEN],
        password: &str,
    ) -> Result<Self, WalletError> {
        if password.is_empty() {
            return Err(WalletError::WeakPassword);
        }

        let salt = SaltString::generate(&mut OsRng);
        let kdf = KdfParams {
            algorithm: "argon2id".to_string(),
            m_cost_kib: ARGON2_MEMORY_KIB,
            t_cost: ARGON2_ITERATIONS,
            p_cost: ARGON2_PARALLELISM,
            salt: salt.as_str().to_string(),
        };
        let key = derive_key(password, &kdf)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill(&mut nonce_bytes);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), seed.as_slice())
            .map_err(|_| {
                WalletError::Io(io::Error::new(io::ErrorKind::Other, "encryption failed"))
            })?;

        Ok(Self {
            version: WALLET_VERSION,
            name: name.to_string(),
            address: address.to_string(),
            kdf,
            nonce: hex::encode(nonce_bytes),
            ciphertext: hex::encode(ciphertext),
        })
    }

    /// Decrypt the wallet seed.
    ///
    /// Structural problems independent of the password (unknown version, bad
    /// hex, wrong lengths) fail with [`WalletError::Corrupt`]. A wrong
    /// password and a tampered ciphertext both fail with
    /// [`WalletError::DecryptionFailed`] and are indistinguishable.
    pub fn decrypt_seed(&self, password: &str) -> Result<Zeroizing<[u8; SEED_LEN]>, WalletError> {
        if self.version != WALLET_VERSION {
            return Err(WalletError::Corrupt);
        }
        if self.kdf.algorithm != "argon2id" {
            return Err(WalletError::Corrupt);
        }

        let nonce_bytes = hex::decode(&self.nonce).map_err(|_| WalletError::Corrupt)?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(WalletError::Corrupt);
        }
        let ciphertext = hex::decode(&self.ciphertext).map_err(|_| WalletError::Corrupt)?;

        let key = derive_key(password, &self.kdf)?;

        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .map(Zeroizing::new)
            .map_err(|_| WalletError::DecryptionFailed)?;

        if plaintext.len() != SEED_LEN {
            return Err(WalletError::Corrupt);
        }
        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        seed.copy_from_slice(&plaintext);
        Ok(seed)
    }

    /// Write the record to `path`, atomically.
    pub fn save(&self, path: &Path, mode: SaveMode) -> Result<(), WalletError> {
        if mode == SaveMode::CreateNew && path.exists() {
            return Err(WalletError::AlreadyExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| WalletError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        // Write with restricted permissions, then rename into place.
        {
            let mut options = fs::OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;

        debug!(path = %path.display(), "wrote wallet file");
        Ok(())
    }

    /// Read a record from `path`.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(WalletError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&json).map_err(|_| WalletError::Corrupt)
    }
}

/// Derive a 32-byte encryption key from the password using Argon2id with the
/// record's stored parameters.
fn derive_key(password: &str, kdf: &KdfParams) -> Result<Zeroizing<[u8; KEY_LEN]>, WalletError> {
    let salt = SaltString::from_b64(&kdf.salt).map_err(|_| WalletError::Corrupt)?;

    let params = argon2::Params::new(kdf.m_cost_kib, kdf.t_cost, kdf.p_cost, Some(KEY_LEN))
        .map_err(|_| WalletError::Corrupt)?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| WalletError::Corrupt)?;
    let output = hash.hash.ok_or(WalletError::Corrupt)?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&output.as_bytes()[..KEY_LEN]);
    Ok(key)
}

/// Wallet file storage rooted at an explicit directory.
///
/// The directory is a constructor argument rather than process-wide state so
/// multiple stores can coexist, e.g. one per test.
#[derive(Debug, Clone)]
pub struct WalletStore {
    dir: PathBuf,
}

impl WalletStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Canonical path for a named wallet: `<dir>/<name>.wallet`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, WALLET_FILE_EXTENSION))
    }

    /// Create a new in-memory wallet. Nothing touches disk until
    /// [`WalletStore::save`].
    pub fn create(&self, name: &str, password: &str) -> Result<Wallet, WalletError> {
        Wallet::create_new(name, password)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Persist a wallet under its name.
    pub fn save(
        &self,
        wallet: &Wallet,
        password: &str,
        mode: SaveMode,
    ) -> Result<PathBuf, WalletError> {
        let path = self.path_for(wallet.name());
        wallet.write_to_file(&path, password, mode)?;
        Ok(path)
    }

    /// Load a wallet by name.
    pub fn load(&self, name: &str, password: &str) -> Result<Wallet, WalletError> {
        Wallet::load_from_file(&self.path_for(name), password)
    }

    /// Names of all wallets in the store, sorted.
    pub fn list(&self) -> Result<Vec<String>, WalletError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(WALLET_FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
