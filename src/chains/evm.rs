//! Sign-In-With-Ethereum (EIP-4361) messages.
//!
//! The address must be in EIP-55 checksum form. Signatures are 65-byte
//! `personal_sign` signatures, `0x`-hex encoded, and are checked by
//! recovering the signer. Contract wallets (EIP-1271) cannot be recovered
//! this way and are left to the verification fallback.

use super::SignatureScheme;
use crate::crypto::ecdsa;
use crate::error::Result;
use crate::message::MessageFields;

pub(crate) const CHAIN_NAME: &str = "Ethereum";

/// Message fields for an EVM account
///
/// Fields are fixed at construction and read through [`fields`](Self::fields):
///
/// ```rust,compile_fail
/// use siwx::{EvmMessage, MessageFields};
///
/// let fields = MessageFields::new("example.com", "0x0", "https://example.com", 1);
/// let mut message = EvmMessage::new(fields);
/// message.fields.domain = "evil.example".to_string();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmMessage {
    pub(crate) fields: MessageFields,
}

impl EvmMessage {
    pub fn new(fields: MessageFields) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &MessageFields {
        &self.fields
    }
}

impl SignatureScheme for EvmMessage {
    fn chain_name(&self) -> &'static str {
        CHAIN_NAME
    }

    fn is_valid_address(&self, address: &str) -> bool {
        ecdsa::is_eip55_address(address)
    }

    fn verify_signature(&self, message: &[u8], signature: &str, address: &str) -> Result<bool> {
        ecdsa::verify_signature(message, signature, address)
    }
}
