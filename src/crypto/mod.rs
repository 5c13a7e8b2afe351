//! Signing and verification
//!
//! Session key pairs, PEM export of the public half, the PSS signer, and
//! the verifier. Key material is read-only once constructed, so signers and
//! verifiers can be shared across worker threads without locking.

mod keys;
mod signer;
mod verifier;

pub use keys::{
    public_key_fingerprint, public_key_from_pem, public_key_to_pem, KeyPair, DEFAULT_KEY_BITS,
    MIN_KEY_BITS,
};
pub use signer::{max_salt_len, Signature, Signer};
pub use verifier::{Verifier, VerifyOutcome};
