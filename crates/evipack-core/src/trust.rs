//! Ed25519 signing and verification of container manifests.
//!
//! The scheme is deliberately small: Ed25519 over the canonical manifest
//! bytes ([`Manifest::signing_bytes`]), signature and public key stored as
//! hex strings in the manifest itself. Key generation and rotation beyond
//! this convenience layer is out of scope.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::OsRng;

use crate::errors::CoreError;
use crate::manifest::Manifest;

/// An Ed25519 keypair used to sign manifests.
#[derive(Clone)]
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    /// Generates a fresh random keypair.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Loads a keypair from a hex-encoded 32-byte secret.
    pub fn from_hex(secret_hex: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(secret_hex.trim()).map_err(|e| CoreError::InvalidKeyMaterial {
            field: "signing key",
            reason: e.to_string(),
        })?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidKeyMaterial {
                field: "signing key",
                reason: "expected 32 bytes".to_string(),
            })?;
        Ok(Self {
            signing: SigningKey::from_bytes(&bytes),
        })
    }

    /// Returns the hex-encoded secret key.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing.to_bytes())
    }

    /// Returns the hex-encoded public key.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing.verifying_key().to_bytes())
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the secret through Debug output.
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

/// Outcome of checking a manifest signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureCheck {
    /// No signature present.
    Unsigned,
    /// Signature present and cryptographically valid.
    Valid,
    /// Signature present and invalid (or undecodable).
    Invalid(String),
    /// Signature present but no usable public key; cannot assert either way.
    Indeterminate(String),
}

/// Signs the manifest in place.
///
/// Embeds the public key first so it is covered by the signature, then signs
/// the canonical bytes and stores the hex-encoded signature.
pub fn sign_manifest(manifest: &mut Manifest, keypair: &Keypair) -> Result<(), CoreError> {
    manifest.public_key = Some(keypair.public_key_hex());
    manifest.signature = None;
    let bytes = manifest.signing_bytes()?;
    let signature = keypair.signing.sign(&bytes);
    manifest.signature = Some(hex::encode(signature.to_bytes()));
    Ok(())
}

/// Checks the manifest signature against its embedded public key, or against
/// `external_key_hex` when supplied (the external key wins).
///
/// Never returns an error: malformed key material or a failed cryptographic
/// check is reported as [`SignatureCheck::Invalid`] so batch verification can
/// keep going, and a signed manifest with no key at all is
/// [`SignatureCheck::Indeterminate`] rather than a failure.
pub fn verify_manifest(manifest: &Manifest, external_key_hex: Option<&str>) -> SignatureCheck {
    let sig_hex = match &manifest.signature {
        Some(s) => s,
        None => return SignatureCheck::Unsigned,
    };

    let key_hex = match external_key_hex.or(manifest.public_key.as_deref()) {
        Some(k) => k,
        None => {
            return SignatureCheck::Indeterminate(
                "signed but no public key in manifest".to_string(),
            )
        }
    };

    let key = match decode_verifying_key(key_hex) {
        Ok(k) => k,
        Err(reason) => return SignatureCheck::Invalid(reason),
    };
    let signature = match decode_signature(sig_hex) {
        Ok(s) => s,
        Err(reason) => return SignatureCheck::Invalid(reason),
    };
    let bytes = match manifest.signing_bytes() {
        Ok(b) => b,
        Err(e) => return SignatureCheck::Invalid(format!("cannot canonicalize manifest: {e}")),
    };

    match key.verify(&bytes, &signature) {
        Ok(()) => SignatureCheck::Valid,
        Err(_) => SignatureCheck::Invalid("signature verification failed".to_string()),
    }
}

fn decode_verifying_key(key_hex: &str) -> Result<VerifyingKey, String> {
    let bytes = hex::decode(key_hex.trim()).map_err(|e| format!("invalid public key hex: {e}"))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| "public key must be 32 bytes".to_string())?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| format!("invalid public key: {e}"))
}

fn decode_signature(sig_hex: &str) -> Result<Signature, String> {
    let bytes = hex::decode(sig_hex.trim()).map_err(|e| format!("invalid signature hex: {e}"))?;
    let bytes: [u8; 64] = bytes
        .try_into()
        .map_err(|_| "signature must be 64 bytes".to_string())?;
    Ok(Signature::from_bytes(&bytes))
}
