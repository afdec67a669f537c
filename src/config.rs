use crate::{
    error::{Result, SiwxError},
    verify::VerificationFallback,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Keys accepted by [`VerifyOpts::from_json`]
pub const VERIFY_OPTS_KEYS: [&str; 5] = [
    "provider",
    "suppressExceptions",
    "suppress_exceptions",
    "verificationFallback",
    "verification_fallback",
];

/// Data-only verification settings
///
/// This is the part of [`VerifyOpts`] that can live in a config file or a
/// request body. Runtime capabilities are attached to [`VerifyOpts`]
/// afterwards.
///
/// # Example
/// ```rust
/// use siwx::{VerifyConfig, VerifyOpts};
///
/// let config: VerifyConfig = serde_json::from_str(r#"{"suppressExceptions": true}"#).unwrap();
/// let opts = VerifyOpts::from_config(&config);
/// assert!(opts.suppress_exceptions);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VerifyConfig {
    /// Return failures as a failed outcome instead of an error
    #[serde(default, alias = "suppress_exceptions")]
    pub suppress_exceptions: bool,
}

/// Opaque chain client handed through to the verification fallback
///
/// The crate never looks inside; a fallback downcasts it to whatever client
/// type it was built for (an RPC client for EIP-1271 checks, say).
#[derive(Clone)]
pub struct Provider(Arc<dyn Any + Send + Sync>);

impl Provider {
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self(Arc::new(inner))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Provider(..)")
    }
}

/// Options for [`Message::verify`](crate::Message::verify)
#[derive(Clone, Default)]
pub struct VerifyOpts {
    /// Forwarded untouched to the fallback
    pub provider: Option<Provider>,
    /// Return failures as `Ok(VerifyOutcome { success: false, .. })`
    pub suppress_exceptions: bool,
    /// Consulted when the primary signature check fails
    pub verification_fallback: Option<Arc<dyn VerificationFallback>>,
}

impl fmt::Debug for VerifyOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyOpts")
            .field("provider", &self.provider)
            .field("suppress_exceptions", &self.suppress_exceptions)
            .field(
                "verification_fallback",
                &self.verification_fallback.as_ref().map(|_| ".."),
            )
            .finish()
    }
}

impl VerifyOpts {
    pub fn from_config(config: &VerifyConfig) -> Self {
        Self {
            suppress_exceptions: config.suppress_exceptions,
            ..Self::default()
        }
    }

    pub fn suppress_exceptions(mut self, suppress: bool) -> Self {
        self.suppress_exceptions = suppress;
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_fallback(mut self, fallback: impl VerificationFallback + 'static) -> Self {
        self.verification_fallback = Some(Arc::new(fallback));
        self
    }

    /// Build options from a JSON object, rejecting unknown keys
    ///
    /// `provider` and `verificationFallback` may appear only as `null`;
    /// attach the real capabilities with [`with_provider`](Self::with_provider)
    /// and [`with_fallback`](Self::with_fallback).
    ///
    /// # Errors
    /// `InvalidOptShape` for unknown keys or values of the wrong type.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| SiwxError::InvalidOptShape("VerifyOpts must be an object".to_string()))?;

        let invalid = invalid_keys(object, &VERIFY_OPTS_KEYS);
        if !invalid.is_empty() {
            return Err(SiwxError::InvalidOptShape(format!(
                "{} is/are not valid key(s) for VerifyOpts.",
                invalid.join(", ")
            )));
        }

        for key in ["provider", "verificationFallback", "verification_fallback"] {
            if object.get(key).is_some_and(|v| !v.is_null()) {
                return Err(SiwxError::InvalidOptShape(format!(
                    "{key} cannot be given as data"
                )));
            }
        }

        let mut suppress_exceptions = false;
        for key in ["suppressExceptions", "suppress_exceptions"] {
            if let Some(value) = object.get(key) {
                suppress_exceptions = value.as_bool().ok_or_else(|| {
                    SiwxError::InvalidOptShape(format!("{key} must be a boolean"))
                })?;
            }
        }

        Ok(Self {
            suppress_exceptions,
            ..Self::default()
        })
    }
}

/// Keys of `object` that are not in `allowed`, in the object's order
pub(crate) fn invalid_keys(object: &Map<String, Value>, allowed: &[&str]) -> Vec<String> {
    object
        .keys()
        .filter(|key| !allowed.contains(&key.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_from_json() {
        let config: VerifyConfig = serde_json::from_value(json!({"suppress_exceptions": true})).unwrap();
        assert!(config.suppress_exceptions);

        let config: VerifyConfig = serde_json::from_value(json!({})).unwrap();
        assert!(!config.suppress_exceptions);

        assert!(serde_json::from_value::<VerifyConfig>(json!({"strict": true})).is_err());
    }

    #[test]
    fn test_opts_from_json() {
        let opts = VerifyOpts::from_json(&json!({"suppressExceptions": true, "provider": null})).unwrap();
        assert!(opts.suppress_exceptions);
        assert!(opts.provider.is_none());
        assert!(opts.verification_fallback.is_none());
    }

    #[test]
    fn test_opts_unknown_keys() {
        let result = VerifyOpts::from_json(&json!({"suppressExceptions": true, "timeout": 5, "retries": 2}));
        match result {
            Err(SiwxError::InvalidOptShape(msg)) => {
                assert!(msg.contains("timeout"));
                assert!(msg.contains("retries"));
            }
            other => panic!("expected InvalidOptShape, got {other:?}"),
        }
    }

    #[test]
    fn test_opts_wrong_types() {
        let result = VerifyOpts::from_json(&json!({"suppressExceptions": "yes"}));
        assert!(matches!(result, Err(SiwxError::InvalidOptShape(_))));

        let result = VerifyOpts::from_json(&json!({"provider": "https://rpc.example"}));
        assert!(matches!(result, Err(SiwxError::InvalidOptShape(_))));

        let result = VerifyOpts::from_json(&json!([]));
        assert!(matches!(result, Err(SiwxError::InvalidOptShape(_))));
    }

    #[test]
    fn test_provider_downcast() {
        let provider = Provider::new(String::from("https://rpc.example"));
        assert_eq!(
            provider.downcast_ref::<String>().map(String::as_str),
            Some("https://rpc.example")
        );
        assert!(provider.downcast_ref::<u64>().is_none());
    }
}
