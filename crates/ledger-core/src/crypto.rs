//! RSA-PSS signing over SHA-256.
//!
//! Verification never fails loudly: any malformed signature, wrong key or tampered
//! message yields `false`, with the reason only visible in the debug log.

use crate::error::{LedgerError, Result};
use rand::rngs::OsRng;
use rsa::pss::{BlindedSigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use tracing::debug;

/// Detached signature bytes, hex-encoded when serialized.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "hex::serde")] Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Signature({}..)", &hex[..hex.len().min(16)])
    }
}

/// An RSA key pair. The private half is only reachable through [`KeyPair::sign`].
#[derive(Clone)]
pub struct KeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl KeyPair {
    /// Generates a fresh key pair of `bits` modulus size from the given RNG.
    pub fn generate<R>(rng: &mut R, bits: usize) -> Result<Self>
    where
        R: rand::CryptoRng + rand::RngCore,
    {
        let private_key = RsaPrivateKey::new(rng, bits)
            .map_err(|e| LedgerError::Crypto(format!("key generation failed: {e}")))?;
        let public_key = private_key.to_public_key();
        Ok(Self {
            private_key,
            public_key,
        })
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn sign(&self, message: &[u8]) -> Result<Signature> {
        sign(&self.private_key, message)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair").finish_non_exhaustive()
    }
}

/// Signs `message` with a randomized PSS salt.
pub fn sign(private_key: &RsaPrivateKey, message: &[u8]) -> Result<Signature> {
    let signing_key = BlindedSigningKey::<Sha256>::new(private_key.clone());
    let signature = signing_key
        .try_sign_with_rng(&mut OsRng, message)
        .map_err(|e| LedgerError::Crypto(format!("signing failed: {e}")))?;
    Ok(Signature(signature.to_vec()))
}

pub fn verify(public_key: &RsaPublicKey, message: &[u8], signature: &Signature) -> bool {
    let signature = match rsa::pss::Signature::try_from(signature.as_bytes()) {
        Ok(s) => s,
        Err(e) => {
            debug!(error = %e, "malformed signature");
            return false;
        }
    };
    let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
    match verifying_key.verify(message, &signature) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "signature rejected");
            false
        }
    }
}
