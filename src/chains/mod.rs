use crate::error::{Result, SiwxError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod evm;
pub mod solana;

pub use evm::EvmMessage;
pub use solana::SolanaMessage;

/// Chain-specific rules a message variant brings to validation and verification
pub trait SignatureScheme {
    /// Name rendered in the header line, e.g. `Solana`
    fn chain_name(&self) -> &'static str;

    /// Whether `address` follows this chain's address grammar
    fn is_valid_address(&self, address: &str) -> bool;

    /// Whether `allow_off_curve` style relaxations are active
    fn allow_off_curve(&self) -> bool {
        false
    }

    /// Verify `signature` over the canonical message bytes for `address`
    ///
    /// `Ok(false)` and `Err(_)` both mean the primary check failed; the error
    /// only adds a reason.
    fn verify_signature(&self, message: &[u8], signature: &str, address: &str) -> Result<bool>;
}

/// Supported chain families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainType {
    #[serde(rename = "sol", alias = "solana")]
    Solana,
    #[serde(rename = "evm", alias = "eth", alias = "ethereum")]
    Evm,
}

impl ChainType {
    /// Short tag used on the wire
    pub fn tag(&self) -> &'static str {
        match self {
            ChainType::Solana => "sol",
            ChainType::Evm => "evm",
        }
    }

    /// Chain name that appears in the message header
    pub fn chain_name(&self) -> &'static str {
        match self {
            ChainType::Solana => solana::CHAIN_NAME,
            ChainType::Evm => evm::CHAIN_NAME,
        }
    }

    /// Look up the chain type from a header chain name
    pub fn from_chain_name(name: &str) -> Option<Self> {
        [ChainType::Solana, ChainType::Evm]
            .into_iter()
            .find(|chain| chain.chain_name() == name)
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ChainType {
    type Err = SiwxError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "sol" | "solana" => Ok(ChainType::Solana),
            "evm" | "eth" | "ethereum" => Ok(ChainType::Evm),
            _ => Err(SiwxError::UnsupportedChainType(tag.to_string())),
        }
    }
}
