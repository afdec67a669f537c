use crate::message::Message;
use thiserror::Error;

/// Message validation and verification errors
///
/// Every variant corresponds to one way a Sign-In-With-X message can be
/// rejected. Comparison failures carry an `expected`/`received` pair so
/// callers can report exactly what did not line up.
///
/// # Example
/// ```rust
/// use siwx::{Result, SiwxError};
///
/// fn handle_result(result: Result<()>) {
///     match result {
///         Ok(()) => println!("Message is valid"),
///         Err(SiwxError::ExpiredMessage { received, .. }) => println!("Expired: {received}"),
///         Err(SiwxError::InvalidSignature(msg)) => println!("Signature error: {msg}"),
///         Err(e) => println!("Other error: {e}"),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SiwxError {
    /// `domain` is empty or contains `#` / `?`
    #[error("Invalid domain: expected {0:?} to be a valid domain")]
    InvalidDomain(String),

    /// `domain` does not match the domain provided for verification
    #[error(
        "Domain does not match provided domain for verification: expected {expected}, received {received}"
    )]
    DomainMismatch { expected: String, received: String },

    /// `nonce` does not match the nonce provided for verification
    #[error(
        "Nonce does not match provided nonce for verification: expected {expected}, received {received}"
    )]
    NonceMismatch { expected: String, received: String },

    /// `address` does not follow the chain's address grammar
    #[error("Invalid address {address} (allow off curve address: {allow_off_curve})")]
    InvalidAddress {
        address: String,
        allow_off_curve: bool,
    },

    /// `uri` does not conform to RFC 3986 or lacks a scheme/host
    #[error("URI does not conform to RFC 3986: {0}")]
    InvalidUri(String),

    /// `nonce` is shorter than 8 characters or not alphanumeric
    #[error("Nonce size smaller than 8 characters or is not alphanumeric: {received:?}")]
    InvalidNonce { received: String },

    /// `not_before` is present and in the future
    #[error("Message is not valid yet: expected {expected}, received {received}")]
    NotYetValidMessage { expected: String, received: String },

    /// Signature does not match the address of the message
    #[error("Signature does not match address of the message: {0}")]
    InvalidSignature(String),

    /// A timestamp is not RFC 3339 / ISO-8601
    #[error("Invalid time format for {field}: {value:?}")]
    InvalidTimeFormat { field: &'static str, value: String },

    /// `version` is not `1`
    #[error("Invalid message version: expected {expected}, received {received}")]
    InvalidMessageVersion { expected: String, received: String },

    /// The message text or a structured input could not be parsed
    #[error("Unable to parse the message: {0}")]
    UnableToParse(String),

    /// `expiration_time` is present and not after the verification instant
    #[error("Expired message: expected {expected}, received {received}")]
    ExpiredMessage { expected: String, received: String },

    /// Chain type tag is not one of the supported chains
    #[error("Unsupported blockchain type: {0}")]
    UnsupportedChainType(String),

    /// Verification parameters carry unknown keys or an inconsistent message
    #[error("Invalid verify params: {0}")]
    InvalidParamShape(String),

    /// Verification options carry unknown keys
    #[error("Invalid verify opts: {0}")]
    InvalidOptShape(String),
}

/// A verification failure raised to the caller
///
/// Returned by [`Message::verify`] when `suppress_exceptions` is off. The
/// message that was being verified travels with the error so the caller can
/// inspect it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct VerifyError {
    pub error: SiwxError,
    pub data: Box<Message>,
}

impl VerifyError {
    pub fn new(error: SiwxError, data: Message) -> Self {
        Self {
            error,
            data: Box::new(data),
        }
    }
}

pub type Result<T> = std::result::Result<T, SiwxError>;
