//! Sign-In-With-Solana messages.
//!
//! Addresses are base58 ed25519 public keys and signatures are detached
//! ed25519 signatures over the canonical text, base58 encoded.

use super::SignatureScheme;
use crate::crypto::ed25519;
use crate::error::Result;
use crate::message::MessageFields;

pub(crate) const CHAIN_NAME: &str = "Solana";

/// Message fields plus the Solana-only `allow_off_curve` switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolanaMessage {
    pub(crate) fields: MessageFields,
    /// Accept addresses that are not on the ed25519 curve (PDAs). Such
    /// addresses identify an account but can never produce a signature.
    pub(crate) allow_off_curve: bool,
}

impl SolanaMessage {
    pub fn new(fields: MessageFields) -> Self {
        Self {
            fields,
            allow_off_curve: false,
        }
    }

    pub fn with_allow_off_curve(mut self, allow_off_curve: bool) -> Self {
        self.allow_off_curve = allow_off_curve;
        self
    }

    pub fn fields(&self) -> &MessageFields {
        &self.fields
    }
}

impl SignatureScheme for SolanaMessage {
    fn chain_name(&self) -> &'static str {
        CHAIN_NAME
    }

    fn is_valid_address(&self, address: &str) -> bool {
        ed25519::is_solana_address(address, self.allow_off_curve)
    }

    fn allow_off_curve(&self) -> bool {
        self.allow_off_curve
    }

    fn verify_signature(&self, message: &[u8], signature: &str, address: &str) -> Result<bool> {
        ed25519::verify_signature(message, signature, address)
    }
}
