//! RSA key pair for one signing session
//!
//! Private keys live only in memory and are never serialized. The public
//! half can be exported as SPKI PEM for verification in another process.

use rand::{CryptoRng, RngCore};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::error::{MelsealError, Result};

/// Modulus size used for session keys
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Smallest modulus accepted (tests and benchmarks only)
pub const MIN_KEY_BITS: usize = 1024;

/// RSA private/public key pair
#[derive(Clone)]
pub struct KeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl KeyPair {
    /// Generate a 2048-bit key pair from the thread-local CSPRNG
    pub fn generate() -> Result<Self> {
        Self::generate_with_bits(DEFAULT_KEY_BITS)
    }

    /// Generate a key pair with a custom modulus size
    pub fn generate_with_bits(bits: usize) -> Result<Self> {
        Self::generate_with_rng(&mut rand::thread_rng(), bits)
    }

    /// Generate a key pair from the given CSPRNG
    ///
    /// # Errors
    /// * `InvalidKeySize` - If `bits` is below [`MIN_KEY_BITS`]
    /// * `KeyGeneration` - If prime generation fails
    pub fn generate_with_rng<R: CryptoRng + RngCore>(rng: &mut R, bits: usize) -> Result<Self> {
        if bits < MIN_KEY_BITS {
            return Err(MelsealError::InvalidKeySize {
                bits,
                minimum: MIN_KEY_BITS,
            });
        }

        let private = RsaPrivateKey::new(rng, bits).map_err(|e| MelsealError::KeyGeneration {
            reason: format!("{}-bit RSA generation failed", bits),
            source: Some(e),
        })?;
        Self::from_private_key(private)
    }

    /// Wrap an existing private key
    pub fn from_private_key(private: RsaPrivateKey) -> Result<Self> {
        private.validate().map_err(|e| MelsealError::KeyGeneration {
            reason: "private key failed validation".to_string(),
            source: Some(e),
        })?;

        let bits = private.n().bits();
        if bits < MIN_KEY_BITS {
            return Err(MelsealError::InvalidKeySize {
                bits,
                minimum: MIN_KEY_BITS,
            });
        }

        let public = private.to_public_key();
        Ok(Self { private, public })
    }

    /// The distributable half
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    /// Modulus size in bits
    pub fn modulus_bits(&self) -> usize {
        self.public.n().bits()
    }

    /// SHA-256 over the big-endian modulus and exponent, hex encoded
    pub fn fingerprint(&self) -> String {
        public_key_fingerprint(&self.public)
    }

    /// The public half as SPKI PEM
    pub fn public_key_pem(&self) -> Result<String> {
        public_key_to_pem(&self.public)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.modulus_bits())
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

/// Fingerprint of a public key, stable across processes
pub fn public_key_fingerprint(key: &RsaPublicKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.n().to_bytes_be());
    hasher.update(key.e().to_bytes_be());
    format!("{:x}", hasher.finalize())
}

/// Encode a public key as SPKI PEM (`-----BEGIN PUBLIC KEY-----`)
pub fn public_key_to_pem(key: &RsaPublicKey) -> Result<String> {
    key.to_public_key_pem(LineEnding::LF).map_err(|e| MelsealError::PublicKey {
        reason: e.to_string(),
    })
}

/// Decode an SPKI PEM public key
///
/// # Errors
/// * `PublicKey` - If the PEM is not an RSA SubjectPublicKeyInfo
pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem.trim()).map_err(|e| MelsealError::PublicKey {
        reason: e.to_string(),
    })
}
