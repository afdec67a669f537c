use crate::error::{Result, SiwxError};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

/// Compute a Keccak-256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash a message the way `personal_sign` does (EIP-191 version `0x45`)
///
/// Format: `"\x19Ethereum Signed Message:\n" + len(message) + message`
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()).as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Derive the 20-byte Ethereum address of a secp256k1 public key
pub fn address_from_key(verifying_key: &VerifyingKey) -> [u8; 20] {
    // Uncompressed SEC1 point: 0x04 || x || y
    let point = verifying_key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Render an address with its EIP-55 mixed-case checksum
///
/// # Example
/// ```rust
/// use siwx::crypto::ecdsa::to_checksum_address;
///
/// let raw = hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
/// let address: [u8; 20] = raw.try_into().unwrap();
/// assert_eq!(
///     to_checksum_address(&address),
///     "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
/// );
/// ```
pub fn to_checksum_address(address: &[u8; 20]) -> String {
    let hex_addr = hex::encode(address);
    let hash = keccak256(hex_addr.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");
    for (i, c) in hex_addr.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }
    checksummed
}

/// Whether `address` is a `0x` address in its exact EIP-55 checksum form
pub fn is_eip55_address(address: &str) -> bool {
    let Some(body) = address.strip_prefix("0x") else {
        return false;
    };
    if body.len() != 40 {
        return false;
    }
    let Ok(bytes) = hex::decode(body) else {
        return false;
    };
    let Ok(raw) = <[u8; 20]>::try_from(bytes.as_slice()) else {
        return false;
    };
    to_checksum_address(&raw) == address
}

/// Recover the signer address of a `personal_sign` signature
///
/// # Arguments
/// * `message` - Raw message bytes that were signed
/// * `signature` - 65-byte `r || s || v` signature, `v` as 0/1 or 27/28
///
/// # Returns
/// * `Ok([u8; 20])` - The recovered address
/// * `Err(SiwxError)` - The signature is malformed or recovery failed
pub fn recover_address(message: &[u8], signature: &[u8]) -> Result<[u8; 20]> {
    if signature.len() != 65 {
        return Err(SiwxError::InvalidSignature(format!(
            "expected 65 signature bytes, got {}",
            signature.len()
        )));
    }

    let v = signature[64];
    let recovery_id = RecoveryId::from_byte(if v >= 27 { v - 27 } else { v })
        .ok_or_else(|| SiwxError::InvalidSignature(format!("invalid recovery id {v}")))?;
    let signature = Signature::from_slice(&signature[..64])
        .map_err(|e| SiwxError::InvalidSignature(format!("Failed to parse signature: {}", e)))?;

    let verifying_key =
        VerifyingKey::recover_from_prehash(&eip191_hash(message), &signature, recovery_id)
            .map_err(|e| SiwxError::InvalidSignature(format!("Failed to recover key: {}", e)))?;
    Ok(address_from_key(&verifying_key))
}

/// Verify a `0x`-hex `personal_sign` signature against an address
///
/// # Returns
/// * `Ok(true)` - The signature recovers to `address`
/// * `Ok(false)` - The signature is well formed but from another key
/// * `Err(SiwxError)` - The signature could not be decoded or recovered
pub fn verify_signature(message: &[u8], signature_hex: &str, address: &str) -> Result<bool> {
    let body = signature_hex.strip_prefix("0x").unwrap_or(signature_hex);
    let signature = hex::decode(body)
        .map_err(|e| SiwxError::InvalidSignature(format!("Invalid signature encoding: {}", e)))?;

    let recovered = recover_address(message, &signature)?;
    Ok(format!("0x{}", hex::encode(recovered)).eq_ignore_ascii_case(address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    fn sign(key: &SigningKey, message: &[u8]) -> String {
        let (signature, recovery_id) = key.sign_prehash_recoverable(&eip191_hash(message)).unwrap();
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }

    fn test_key() -> SigningKey {
        SigningKey::from_slice(&[0x42u8; 32]).unwrap()
    }

    #[test]
    fn test_keccak256() {
        let expected =
            hex::decode("47173285a8d7341e5e972fc677286384f802f8ef42a5ec5f03bbfa254cb01fad")
                .unwrap();
        assert_eq!(keccak256(b"hello world").as_slice(), expected.as_slice());
    }

    #[test]
    fn test_checksum_address() {
        let raw: [u8; 20] = hex::decode("fb6916095ca1df60bb79ce92ce3ea74c37c5d359")
            .unwrap()
            .try_into()
            .unwrap();
        let checksummed = to_checksum_address(&raw);
        assert_eq!(checksummed, "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359");
        assert!(is_eip55_address(&checksummed));
        assert!(!is_eip55_address(&checksummed.to_lowercase()));
        assert!(!is_eip55_address("0x1234"));
        assert!(!is_eip55_address("fB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"));
    }

    #[test]
    fn test_eip55_vectors() {
        let vectors = [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
            "0x52908400098527886E0F7030069857D2E4169EE7",
            "0x8617E340B3D01FA5F11F306F4090FD50E238070D",
            "0xde709f2102306220921060314715629080e2fb77",
            "0x27b1fdb04752bbc536007a920d24acb045561c26",
        ];
        for address in vectors {
            assert!(is_eip55_address(address), "{address} should be valid");

            let raw: [u8; 20] = hex::decode(&address[2..]).unwrap().try_into().unwrap();
            assert_eq!(to_checksum_address(&raw), address);
        }

        // One flipped letter case breaks the checksum
        assert!(!is_eip55_address("0x5aAeb6053F3E94C9b9A09f33669435e7Ef1BeAed"));
    }

    #[test]
    fn test_verify_signature() {
        let key = test_key();
        let address = to_checksum_address(&address_from_key(key.verifying_key()));
        let signature = sign(&key, b"sign in please");

        assert!(verify_signature(b"sign in please", &signature, &address).unwrap());
        assert!(!verify_signature(b"sign in, please", &signature, &address).unwrap_or(false));
    }

    #[test]
    fn test_verify_signature_other_key() {
        let key = test_key();
        let other = SigningKey::from_slice(&[0x07u8; 32]).unwrap();
        let address = to_checksum_address(&address_from_key(other.verifying_key()));
        let signature = sign(&key, b"message");

        assert!(!verify_signature(b"message", &signature, &address).unwrap());
    }

    #[test]
    fn test_malformed_signature() {
        let result = verify_signature(b"message", "0x1234", "0x0");
        assert!(matches!(result, Err(SiwxError::InvalidSignature(_))));

        let result = verify_signature(b"message", "not-hex", "0x0");
        assert!(matches!(result, Err(SiwxError::InvalidSignature(_))));
    }
}
