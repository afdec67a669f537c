use crate::error::{Result, SiwxError};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Decode a base58 Solana address into its 32 public key bytes
pub fn decode_address(address: &str) -> Result<[u8; 32]> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| SiwxError::InvalidSignature(format!("Invalid base58 address: {}", e)))?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
        SiwxError::InvalidSignature(format!(
            "Solana address must decode to 32 bytes, got {}",
            bytes.len()
        ))
    })
}

/// Whether `address` is a base58-encoded 32-byte Solana public key
///
/// With `allow_off_curve` unset the key must also be a point on the ed25519
/// curve, i.e. a key that can actually sign. Program derived addresses are
/// off curve and only pass when `allow_off_curve` is set.
pub fn is_solana_address(address: &str, allow_off_curve: bool) -> bool {
    match decode_address(address) {
        Ok(bytes) => allow_off_curve || VerifyingKey::from_bytes(&bytes).is_ok(),
        Err(_) => false,
    }
}

/// Verify a detached ed25519 signature over the message bytes
///
/// # Arguments
/// * `message` - Raw message bytes that were signed
/// * `signature_b58` - Base58-encoded 64-byte signature
/// * `address` - Base58 public key of the signer
///
/// # Returns
/// * `Ok(true)` / `Ok(false)` - Whether the signature checks out
/// * `Err(SiwxError)` - The signature or key could not be decoded
pub fn verify_signature(message: &[u8], signature_b58: &str, address: &str) -> Result<bool> {
    let signature_bytes = bs58::decode(signature_b58)
        .into_vec()
        .map_err(|e| SiwxError::InvalidSignature(format!("Invalid signature encoding: {}", e)))?;
    let signature_bytes = <[u8; 64]>::try_from(signature_bytes.as_slice()).map_err(|_| {
        SiwxError::InvalidSignature(format!(
            "expected 64 signature bytes, got {}",
            signature_bytes.len()
        ))
    })?;

    let verifying_key = VerifyingKey::from_bytes(&decode_address(address)?)
        .map_err(|e| SiwxError::InvalidSignature(format!("Failed to derive verifying key: {}", e)))?;
    let signature = Signature::from_bytes(&signature_bytes);

    Ok(verifying_key.verify(message, &signature).is_ok())
}
