//! RSASSA-PSS signing of feature bytes
//!
//! SHA-256 message hash, MGF1 with SHA-256, and the largest salt the modulus
//! allows (`em_len - h_len - 2`). Signing is randomized: the same input
//! produces different signature bytes on every call, all of which verify.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey};
use sha2::{Digest, Sha256};

use crate::crypto::keys::KeyPair;
use crate::error::{MelsealError, Result};

/// Output size of the PSS hash function
const HASH_LEN: usize = 32;

/// Maximum PSS salt length for a modulus of `modulus_bits`
pub fn max_salt_len(modulus_bits: usize) -> usize {
    let em_len = modulus_bits.saturating_sub(1).div_ceil(8);
    em_len.saturating_sub(HASH_LEN + 2)
}

pub(crate) fn pss_padding(modulus_bits: usize) -> Pss {
    Pss::new_with_salt::<Sha256>(max_salt_len(modulus_bits))
}

/// Opaque signature bytes for one segment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Wrap raw signature bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw signature bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Standard base64 (with padding)
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Decode from standard base64
    pub fn from_base64(encoded: &str) -> std::result::Result<Self, base64::DecodeError> {
        STANDARD.decode(encoded).map(Self)
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Signs canonical feature bytes with a session private key
#[derive(Clone)]
pub struct Signer {
    key: RsaPrivateKey,
    modulus_bits: usize,
    fingerprint: String,
}

impl Signer {
    /// Create a signer holding a copy of the private half of `keys`
    pub fn new(keys: &KeyPair) -> Self {
        Self {
            key: keys.private_key().clone(),
            modulus_bits: keys.modulus_bits(),
            fingerprint: keys.fingerprint(),
        }
    }

    /// Fingerprint of the matching public key
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Salt length used for every signature
    pub fn salt_len(&self) -> usize {
        max_salt_len(self.modulus_bits)
    }

    /// Size in bytes of every signature this signer produces
    pub fn signature_len(&self) -> usize {
        self.key.size()
    }

    /// Sign `feature_bytes`
    ///
    /// # Errors
    /// * `Signing` - If the RSA backend rejects the key or the message
    pub fn sign(&self, feature_bytes: &[u8]) -> Result<Signature> {
        let hashed = Sha256::digest(feature_bytes);
        let mut rng = rand::thread_rng();
        self.key
            .sign_with_rng(&mut rng, pss_padding(self.modulus_bits), &hashed)
            .map(Signature)
            .map_err(MelsealError::Signing)
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("modulus_bits", &self.modulus_bits)
            .field("salt_len", &self.salt_len())
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}
