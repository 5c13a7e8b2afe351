//! RSASSA-PSS verification of feature bytes
//!
//! A mismatch is a normal outcome, never an error. [`Verifier::verify`]
//! collapses every failure to `false`; [`Verifier::verify_detailed`] keeps
//! mismatches apart from malformed input.

use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::crypto::keys::{public_key_fingerprint, public_key_from_pem, KeyPair};
use crate::crypto::signer::{pss_padding, Signature};
use crate::error::Result;

/// Result of checking one segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// Signature matches the recomputed features
    Valid,
    /// Well-formed signature that does not match
    Mismatch,
    /// Signature could not be checked at all
    Malformed { reason: String },
    /// No signature was supplied for the segment
    Missing,
}

impl VerifyOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyOutcome::Valid)
    }
}

/// Checks signatures against a public key
#[derive(Debug, Clone)]
pub struct Verifier {
    key: RsaPublicKey,
}

impl Verifier {
    /// Create a verifier from the public half of `keys`
    pub fn new(keys: &KeyPair) -> Self {
        Self::from_public_key(keys.public_key().clone())
    }

    /// Create a verifier from a distributed public key
    pub fn from_public_key(key: RsaPublicKey) -> Self {
        Self { key }
    }

    /// Create a verifier from an SPKI PEM public key
    pub fn from_public_key_pem(pem: &str) -> Result<Self> {
        public_key_from_pem(pem).map(Self::from_public_key)
    }

    /// Fingerprint of the key this verifier trusts
    pub fn fingerprint(&self) -> String {
        public_key_fingerprint(&self.key)
    }

    /// True only if `signature` is a valid signature over `feature_bytes`
    pub fn verify(&self, signature: &Signature, feature_bytes: &[u8]) -> bool {
        self.verify_detailed(signature, feature_bytes).is_valid()
    }

    /// Classify the check of `signature` over `feature_bytes`
    pub fn verify_detailed(&self, signature: &Signature, feature_bytes: &[u8]) -> VerifyOutcome {
        let expected_len = self.key.size();
        if signature.len() != expected_len {
            return VerifyOutcome::Malformed {
                reason: format!(
                    "signature is {} bytes, key modulus is {} bytes",
                    signature.len(),
                    expected_len
                ),
            };
        }

        let hashed = Sha256::digest(feature_bytes);
        match self
            .key
            .verify(pss_padding(self.key.n().bits()), &hashed, signature.as_bytes())
        {
            Ok(()) => VerifyOutcome::Valid,
            Err(rsa::Error::Verification) => VerifyOutcome::Mismatch,
            Err(e) => VerifyOutcome::Malformed {
                reason: e.to_string(),
            },
        }
    }
}
