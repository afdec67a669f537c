//! Verification of signed messages.
//!
//! [`Message::verify`] runs an ordered list of checks and stops at the first
//! failure:
//!
//! 1. `params.message`, when given, matches the message being verified
//! 2. domain binding
//! 3. nonce binding
//! 4. expiration against the check time (`params.time` or now)
//! 5. not-before against the check time
//! 6. field validation and canonical re-serialization
//! 7. the chain's signature primitive, then the fallback if one is set
//!
//! Whether a failure comes back as `Err(VerifyError)` or as a failed
//! [`VerifyOutcome`] is decided once, from `suppress_exceptions`.

use crate::{
    config::{invalid_keys, Provider, VerifyOpts},
    error::{Result, SiwxError, VerifyError},
    format::{format_timestamp, non_empty, parse_timestamp},
    message::{Message, MessageFields},
};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Keys accepted by [`VerifyParams::from_json`]
pub const VERIFY_PARAMS_KEYS: [&str; 5] = ["signature", "domain", "nonce", "time", "message"];

/// Inputs binding a signature to the verifier's context
///
/// # Example
/// ```rust
/// use siwx::VerifyParams;
///
/// let params = VerifyParams::new("5Hx...signature")
///     .with_domain("example.com")
///     .with_nonce("abcdefgh12");
/// assert_eq!(params.time, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyParams {
    /// Signature in the chain's encoding (base58 for Solana, `0x`-hex for EVM)
    pub signature: String,
    /// Expected domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Expected nonce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// RFC 3339 instant to treat as "now"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Fields of the message being verified, if the caller echoes them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageFields>,
}

impl VerifyParams {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            ..Self::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_message(mut self, message: MessageFields) -> Self {
        self.message = Some(message);
        self
    }

    /// Build params from a JSON object, rejecting unknown keys
    ///
    /// # Errors
    /// - `InvalidParamShape` - not an object, or unknown keys present
    /// - `UnableToParse` - a known key holds a value of the wrong shape
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            SiwxError::InvalidParamShape("VerifyParams must be an object".to_string())
        })?;

        let invalid = invalid_keys(object, &VERIFY_PARAMS_KEYS);
        if !invalid.is_empty() {
            return Err(SiwxError::InvalidParamShape(format!(
                "{} is/are not valid key(s) for VerifyParams.",
                invalid.join(", ")
            )));
        }

        serde_json::from_value(value.clone())
            .map_err(|e| SiwxError::UnableToParse(format!("Invalid VerifyParams: {}", e)))
    }
}

/// Result of a verification
///
/// `data` is always the message that was verified, whatever the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyOutcome {
    pub success: bool,
    pub data: Message,
    pub error: Option<SiwxError>,
}

impl VerifyOutcome {
    pub fn success(data: Message) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn failure(data: Message, error: SiwxError) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

/// Second chance for signatures the chain primitive cannot check
///
/// Typical use is EIP-1271: a contract wallet's signature does not recover
/// to its address, so the fallback asks the contract through the
/// [`Provider`] in `opts`. Whatever the fallback returns is the final
/// result of the verification.
#[async_trait]
pub trait VerificationFallback: Send + Sync {
    /// `primary` is the failure of the primary signature check
    async fn verify(
        &self,
        params: &VerifyParams,
        opts: &VerifyOpts,
        message: &Message,
        primary: &SiwxError,
    ) -> Result<VerifyOutcome>;
}

impl Message {
    /// Verify a signature over this message
    ///
    /// Verification works on a finalized copy; the receiver is never
    /// modified. A message that was never serialized gets a fresh nonce in
    /// that copy and will therefore not match any signature.
    ///
    /// # Arguments
    /// * `params` - Signature plus the expected domain, nonce and time
    /// * `opts` - Provider, fallback and error policy; `None` for defaults
    ///
    /// # Returns
    /// * `Ok(VerifyOutcome)` - Success, a fallback verdict, or any failure
    ///   when `suppress_exceptions` is set
    /// * `Err(VerifyError)` - The first failed check, carrying the message
    ///
    /// # Example
    /// ```rust
    /// use siwx::{create_message, ChainType, MessageFields, VerifyOpts, VerifyParams};
    ///
    /// # tokio_test_block(async {
    /// let fields = MessageFields::new(
    ///     "example.com",
    ///     "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
    ///     "https://example.com",
    ///     1,
    /// )
    /// .with_nonce("abcdefgh12");
    /// let mut message = create_message(fields, ChainType::Evm);
    /// let _text = message.prepare_message().unwrap();
    ///
    /// let params = VerifyParams::new("0x00").with_domain("other.com");
    /// let opts = VerifyOpts::default().suppress_exceptions(true);
    /// let outcome = message.verify(&params, Some(&opts)).await.unwrap();
    /// assert!(!outcome.success);
    /// # });
    /// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
    /// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
    /// # }
    /// ```
    pub async fn verify(
        &self,
        params: &VerifyParams,
        opts: Option<&VerifyOpts>,
    ) -> std::result::Result<VerifyOutcome, VerifyError> {
        let default_opts = VerifyOpts::default();
        let opts = opts.unwrap_or(&default_opts);

        let mut message = self.clone();
        message.finalize();

        let result = run_checks(&message, params, opts).await;
        settle(result, message, opts)
    }

    /// [`verify`](Message::verify) with params taken from a JSON object
    ///
    /// Shape errors in `params` follow the same error policy as every other
    /// failed check.
    pub async fn verify_json(
        &self,
        params: &Value,
        opts: Option<&VerifyOpts>,
    ) -> std::result::Result<VerifyOutcome, VerifyError> {
        match VerifyParams::from_json(params) {
            Ok(params) => self.verify(&params, opts).await,
            Err(error) => {
                debug!(%error, "rejecting verify params");
                let default_opts = VerifyOpts::default();
                settle(Err(error), self.clone(), opts.unwrap_or(&default_opts))
            }
        }
    }

    /// Check `signature` and return the verified message
    ///
    /// Runs [`verify`](Message::verify) with no bindings beyond the time
    /// window and with `provider` passed along.
    pub async fn validate(
        &self,
        signature: &str,
        provider: Option<Provider>,
    ) -> std::result::Result<Message, VerifyError> {
        let params = VerifyParams::new(signature);
        let opts = VerifyOpts {
            provider,
            ..VerifyOpts::default()
        };

        let outcome = self.verify(&params, Some(&opts)).await?;
        if outcome.success {
            Ok(outcome.data)
        } else {
            let error = outcome.error.unwrap_or_else(|| {
                SiwxError::InvalidSignature("verification did not succeed".to_string())
            });
            Err(VerifyError::new(error, outcome.data))
        }
    }
}

fn settle(
    result: Result<VerifyOutcome>,
    message: Message,
    opts: &VerifyOpts,
) -> std::result::Result<VerifyOutcome, VerifyError> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(error) if opts.suppress_exceptions => Ok(VerifyOutcome::failure(message, error)),
        Err(error) => Err(VerifyError::new(error, message)),
    }
}

async fn run_checks(
    message: &Message,
    params: &VerifyParams,
    opts: &VerifyOpts,
) -> Result<VerifyOutcome> {
    let fields = message.fields();

    if let Some(expected) = &params.message {
        if expected != fields {
            debug!(domain = %fields.domain, "verify params carry a different message");
            return Err(SiwxError::InvalidParamShape(
                "message does not match the message being verified".to_string(),
            ));
        }
    }

    if let Some(domain) = non_empty(&params.domain) {
        if domain != fields.domain {
            debug!(expected = %domain, received = %fields.domain, "domain binding failed");
            return Err(SiwxError::DomainMismatch {
                expected: domain.to_string(),
                received: fields.domain.clone(),
            });
        }
    }

    if let Some(nonce) = non_empty(&params.nonce) {
        let received = fields.nonce.as_deref().unwrap_or_default();
        if nonce != received {
            debug!(expected = %nonce, received, "nonce binding failed");
            return Err(SiwxError::NonceMismatch {
                expected: nonce.to_string(),
                received: received.to_string(),
            });
        }
    }

    let check_time = match non_empty(&params.time) {
        Some(time) => parse_timestamp("time", time)?,
        None => Utc::now(),
    };
    let now = format_timestamp(check_time);

    if let Some(expiration_time) = non_empty(&fields.expiration_time) {
        let expiration = parse_timestamp("expiration_time", expiration_time)?;
        if check_time >= expiration {
            let expiration = format_timestamp(expiration);
            debug!(%now, %expiration, "message expired");
            return Err(SiwxError::ExpiredMessage {
                expected: format!("{now} < {expiration}"),
                received: format!("{now} >= {expiration}"),
            });
        }
    }

    if let Some(not_before) = non_empty(&fields.not_before) {
        let not_before = parse_timestamp("not_before", not_before)?;
        if check_time < not_before {
            let not_before = format_timestamp(not_before);
            debug!(%now, %not_before, "message not yet valid");
            return Err(SiwxError::NotYetValidMessage {
                expected: format!("{now} >= {not_before}"),
                received: format!("{now} < {not_before}"),
            });
        }
    }

    let text = message.canonical_text()?;

    let primary = message
        .scheme()
        .verify_signature(text.as_bytes(), &params.signature, &fields.address);
    let primary_error = match primary {
        Ok(true) => return Ok(VerifyOutcome::success(message.clone())),
        Ok(false) => SiwxError::InvalidSignature(format!(
            "signature was not produced by {}",
            fields.address
        )),
        Err(SiwxError::InvalidSignature(reason)) => {
            warn!(%reason, chain = %message.chain_type(), "signature check errored");
            SiwxError::InvalidSignature(reason)
        }
        Err(other) => {
            warn!(error = %other, chain = %message.chain_type(), "signature check errored");
            SiwxError::InvalidSignature(other.to_string())
        }
    };

    match &opts.verification_fallback {
        Some(fallback) => {
            debug!(error = %primary_error, "primary signature check failed, running fallback");
            fallback.verify(params, opts, message, &primary_error).await
        }
        None => Err(primary_error),
    }
}
