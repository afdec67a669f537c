use crate::{
    chains::{ChainType, EvmMessage, SignatureScheme, SolanaMessage},
    crypto::challenge::generate_nonce,
    error::{Result, SiwxError},
    factory::{create_message_with, MessageExtensions},
    format::{format_timestamp, parse_message, render},
    validation::validate_fields,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The only message version this crate understands
pub const MESSAGE_VERSION: &str = "1";

/// Structured challenge data shared by every chain
///
/// Field names follow the usual SIWE JSON shape (`chainId`, `issuedAt`, ...)
/// so request bodies can be deserialized directly.
///
/// # Example
/// ```rust
/// use siwx::MessageFields;
///
/// let fields = MessageFields::new(
///     "example.com",
///     "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
///     "https://example.com/login",
///     1,
/// )
/// .with_statement("Sign in to Example")
/// .with_nonce("abcdefgh12");
/// assert_eq!(fields.version, "1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MessageFields {
    /// RFC 3986 authority requesting the sign-in
    pub domain: String,
    /// Chain-specific account identifier
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: i64,
    /// Generated on finalization when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Set to the current time on finalization when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

impl MessageFields {
    /// Required fields only, version `1`
    pub fn new(
        domain: impl Into<String>,
        address: impl Into<String>,
        uri: impl Into<String>,
        chain_id: i64,
    ) -> Self {
        Self {
            domain: domain.into(),
            address: address.into(),
            statement: None,
            uri: uri.into(),
            version: MESSAGE_VERSION.to_string(),
            chain_id,
            nonce: None,
            issued_at: None,
            expiration_time: None,
            not_before: None,
            request_id: None,
            resources: None,
        }
    }

    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = Some(statement.into());
        self
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn with_issued_at(mut self, issued_at: impl Into<String>) -> Self {
        self.issued_at = Some(issued_at.into());
        self
    }

    pub fn with_expiration_time(mut self, expiration_time: impl Into<String>) -> Self {
        self.expiration_time = Some(expiration_time.into());
        self
    }

    pub fn with_not_before(mut self, not_before: impl Into<String>) -> Self {
        self.not_before = Some(not_before.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = Some(resources.into_iter().map(Into::into).collect());
        self
    }

    /// Whether `nonce` and `issued_at` are both populated
    pub fn is_finalized(&self) -> bool {
        is_set(&self.nonce) && is_set(&self.issued_at)
    }

    /// Fill in a generated `nonce` and the current `issued_at` if missing
    ///
    /// Values already present are never replaced, so calling this again is
    /// a no-op and the serialized text stays stable.
    pub fn finalize(&mut self) {
        if !is_set(&self.nonce) {
            self.nonce = Some(generate_nonce());
        }
        if !is_set(&self.issued_at) {
            self.issued_at = Some(format_timestamp(Utc::now()));
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// A Sign-In-With-X message for one of the supported chains
///
/// Built by [`create_message`](crate::factory::create_message) or parsed
/// from its canonical text. Every variant offers the same capabilities:
/// field accessors, [`to_message`](Message::to_message),
/// [`prepare_message`](Message::prepare_message),
/// [`validate`](Message::validate) and [`verify`](Message::verify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Solana(SolanaMessage),
    Evm(EvmMessage),
}

impl Message {
    pub fn chain_type(&self) -> ChainType {
        match self {
            Message::Solana(_) => ChainType::Solana,
            Message::Evm(_) => ChainType::Evm,
        }
    }

    pub fn fields(&self) -> &MessageFields {
        match self {
            Message::Solana(message) => &message.fields,
            Message::Evm(message) => &message.fields,
        }
    }

    fn fields_mut(&mut self) -> &mut MessageFields {
        match self {
            Message::Solana(message) => &mut message.fields,
            Message::Evm(message) => &mut message.fields,
        }
    }

    pub(crate) fn scheme(&self) -> &dyn SignatureScheme {
        match self {
            Message::Solana(message) => message,
            Message::Evm(message) => message,
        }
    }

    pub fn domain(&self) -> &str {
        &self.fields().domain
    }

    pub fn address(&self) -> &str {
        &self.fields().address
    }

    pub fn statement(&self) -> Option<&str> {
        self.fields().statement.as_deref()
    }

    pub fn uri(&self) -> &str {
        &self.fields().uri
    }

    pub fn version(&self) -> &str {
        &self.fields().version
    }

    pub fn chain_id(&self) -> i64 {
        self.fields().chain_id
    }

    pub fn nonce(&self) -> Option<&str> {
        self.fields().nonce.as_deref()
    }

    pub fn issued_at(&self) -> Option<&str> {
        self.fields().issued_at.as_deref()
    }

    pub fn expiration_time(&self) -> Option<&str> {
        self.fields().expiration_time.as_deref()
    }

    pub fn not_before(&self) -> Option<&str> {
        self.fields().not_before.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.fields().request_id.as_deref()
    }

    pub fn resources(&self) -> Option<&[String]> {
        self.fields().resources.as_deref()
    }

    pub fn allow_off_curve(&self) -> bool {
        self.scheme().allow_off_curve()
    }

    /// Set the Solana off-curve switch; other chains are returned unchanged
    pub fn with_allow_off_curve(self, allow_off_curve: bool) -> Self {
        match self {
            Message::Solana(message) => {
                Message::Solana(message.with_allow_off_curve(allow_off_curve))
            }
            other => other,
        }
    }

    /// See [`MessageFields::finalize`]
    pub fn finalize(&mut self) {
        self.fields_mut().finalize();
    }

    /// Run the field validator over this message
    pub fn validate_fields(&self) -> Result<()> {
        validate_fields(self.fields(), self.scheme())
    }

    /// Finalize, validate and render the canonical text to sign
    ///
    /// The first call may generate `nonce` and `issued_at`; later calls
    /// reuse them and return the same text.
    ///
    /// # Errors
    /// Any field validation error, see [`validate_fields`].
    pub fn to_message(&mut self) -> Result<String> {
        self.finalize();
        self.canonical_text()
    }

    /// Version-dispatching form of [`to_message`](Message::to_message)
    pub fn prepare_message(&mut self) -> Result<String> {
        match self.version() {
            MESSAGE_VERSION => self.to_message(),
            // Validation rejects other versions; no alternative layout exists yet.
            _ => self.to_message(),
        }
    }

    /// Validate and render without finalizing
    pub(crate) fn canonical_text(&self) -> Result<String> {
        self.validate_fields()?;
        render(self.fields(), self.scheme().chain_name())
    }
}

impl Message {
    /// Parse and validate canonical text, applying construction extensions
    ///
    /// Extensions are not part of the text; a Solana message with an
    /// off-curve address only parses when `allow_off_curve` is set here.
    pub fn parse_with(text: &str, extensions: MessageExtensions) -> Result<Self> {
        let (chain_type, fields) = parse_message(text)?;
        let message = create_message_with(fields, chain_type, extensions);
        message.validate_fields()?;
        Ok(message)
    }
}

impl FromStr for Message {
    type Err = SiwxError;

    /// Parse and validate the canonical text of a message
    fn from_str(text: &str) -> Result<Self> {
        Self::parse_with(text, MessageExtensions::default())
    }
}
