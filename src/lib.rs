//! # siwx
//!
//! A Rust library for **Sign-In-With-X** messages: the human-readable challenge a wallet
//! signs to prove control of an address, and the server-side verification of that
//! signature. One message model covers Solana (ed25519 key signatures) and EVM chains
//! (secp256k1 `personal_sign` recovery).
//!
//! ## Features
//!
//! - **Canonical Message Text** - Deterministic EIP-4361 style rendering and parsing
//! - **Field Validation** - Domain, address, URI, version, nonce and timestamp checks
//! - **Binding Checks** - Domain, nonce, expiration and not-before against verifier input
//! - **Pluggable Fallback** - Hook for signatures the chain primitive cannot check (EIP-1271)
//! - **Stateless Design** - No nonce storage or sessions, you control replay tracking
//!
//! ## Quick Start
//!
//! ```rust
//! use siwx::{create_message, ChainType, MessageFields, VerifyParams};
//!
//! let fields = MessageFields::new(
//!     "example.com",
//!     "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
//!     "https://example.com/login",
//!     1,
//! )
//! .with_statement("Sign in to Example");
//!
//! // Text to hand to the wallet; generates the nonce and issued-at time
//! let mut message = create_message(fields, ChainType::Evm);
//! let text = message.prepare_message().unwrap();
//! assert!(text.starts_with("example.com wants you to sign in with your Ethereum account:"));
//!
//! // Later, with the wallet's signature:
//! let params = VerifyParams::new("0x...signature").with_nonce(message.nonce().unwrap());
//! // message.verify(&params, None).await
//! ```
//!
//! ## Examples
//!
//! See the [basic_workflow demo](demos/basic_workflow.rs) for a complete sign-in flow:
//!
//! ```bash
//! cargo run --example basic_workflow
//! ```

pub mod chains;
pub mod config;
pub mod crypto;
pub mod error;
pub mod factory;
pub mod format;
pub mod message;
pub mod validation;
pub mod verify;

// Re-export main types for easier access
pub use chains::{ChainType, EvmMessage, SignatureScheme, SolanaMessage};
pub use config::{Provider, VerifyConfig, VerifyOpts};
pub use crypto::challenge::generate_nonce;
pub use error::{Result, SiwxError, VerifyError};
pub use factory::{
    create_message, create_message_for_tag, create_message_from_json, create_message_with,
    MessageExtensions,
};
pub use format::parse_message;
pub use message::{Message, MessageFields};
pub use validation::validate_fields;
pub use verify::{VerificationFallback, VerifyOutcome, VerifyParams};
