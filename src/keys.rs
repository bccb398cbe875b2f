//! Key Management
//!
//! Ed25519 keypair generation and address derivation.
//!
//! Security: the signing key is the only secret in the system. It never
//! leaves this struct unencrypted except through [`KeyPair::seed_bytes`],
//! which hands out a `Zeroizing` buffer for the encrypted-storage path. The
//! underlying `ed25519-dalek` key zeroes its memory on drop.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{SigningKey, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::WalletError;

/// Length of an address in raw bytes (SHA-256 output).
pub const ADDRESS_LENGTH: usize = 32;

/// A public wallet address: the SHA-256 digest of the Ed25519 public key,
/// rendered as 64 lowercase hex characters.
///
/// Derivation is pure, so the same public key always yields the same address,
/// in this process and any other.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| WalletError::InvalidAddress)?;
        let raw: [u8; ADDRESS_LENGTH] = bytes
            .try_into()
            .map_err(|_| WalletError::InvalidAddress)?;
        Ok(Address(raw))
    }
}

/// Derive the address for an Ed25519 public key.
///
/// Fails with [`WalletError::InvalidKey`] if the input is not exactly 32
/// bytes; it does not check that the bytes are a valid curve point, since the
/// hash is well-defined either way.
pub fn derive_address(public_key: &[u8]) -> Result<Address, WalletError> {
    if public_key.len() != PUBLIC_KEY_LENGTH {
        return Err(WalletError::InvalidKey);
    }
    let digest: [u8; ADDRESS_LENGTH] = Sha256::digest(public_key).into();
    Ok(Address(digest))
}

/// An Ed25519 keypair. The public half is cached so repeated signing and
/// address derivation avoid re-deriving it from the secret.
#[derive(Clone)]
pub struct KeyPair {
    signing: SigningKey,
    verifying: VerifyingKey,
}

impl KeyPair {
    /// Generate a fresh keypair from the OS entropy source.
    pub fn generate() -> Self {
        let signing = SigningKey::generate(&mut OsRng);
        let verifying = signing.verifying_key();
        Self { signing, verifying }
    }

    /// Rebuild a keypair from a stored 32-byte seed.
    pub fn from_seed_bytes(seed: &[u8]) -> Result<Self, WalletError> {
        let raw: [u8; SECRET_KEY_LENGTH] =
            seed.try_into().map_err(|_| WalletError::InvalidKey)?;
        let signing = SigningKey::from_bytes(&raw);
        let verifying = signing.verifying_key();
        Ok(Self { signing, verifying })
    }

    /// The secret seed, for the encrypted-storage path only. The returned
    /// buffer zeroes itself on drop.
    pub fn seed_bytes(&self) -> Zeroizing<[u8; SECRET_KEY_LENGTH]> {
        Zeroizing::new(self.signing.to_bytes())
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing
    }

    pub fn public_key(&self) -> &VerifyingKey {
        &self.verifying
    }

    /// The address derived from this keypair's public key.
    pub fn address(&self) -> Address {
        let digest: [u8; ADDRESS_LENGTH] = Sha256::digest(self.verifying.as_bytes()).into();
        Address(digest)
    }
}

impl fmt::Debug for KeyPair {
    // Never print the secret half.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_distinct_keys() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.public_key().as_bytes(), b.public_key().as_bytes());
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn test_seed_round_trip() {
        let pair = KeyPair::generate();
        let restored = KeyPair::from_seed_bytes(pair.seed_bytes().as_ref()).unwrap();
        assert_eq!(pair.public_key(), restored.public_key());
        assert_eq!(pair.address(), restored.address());
    }

    #[test]
    fn test_address_is_deterministic() {
        let pair = KeyPair::generate();
        let a = derive_address(pair.public_key().as_bytes()).unwrap();
        let b = derive_address(pair.public_key().as_bytes()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, pair.address());
    }

    #[test]
    fn test_derive_address_rejects_bad_length() {
        assert!(matches!(
            derive_address(&[0u8; 16]),
            Err(WalletError::InvalidKey)
        ));
        assert!(matches!(
            derive_address(&[0u8; 33]),
            Err(WalletError::InvalidKey)
        ));
    }

    #[test]
    fn test_address_string_round_trip() {
        let addr = KeyPair::generate().address();
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_address_rejects_bad_strings() {
        assert!("not-hex".parse::<Address>().is_err());
        assert!("abcd".parse::<Address>().is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let pair = KeyPair::generate();
        let rendered = format!("{:?}", pair);
        let seed_hex = hex::encode(pair.seed_bytes().as_ref());
        assert!(!rendered.contains(&seed_hex));
    }
}
