//! Field checks run before any message is rendered.
//!
//! Checks run in a fixed order and stop at the first failure: domain,
//! address, URI, version, nonce, free-text fields, then each timestamp.

use crate::{
    chains::SignatureScheme,
    crypto::challenge::is_valid_nonce,
    error::{Result, SiwxError},
    message::{MessageFields, MESSAGE_VERSION},
};
use chrono::DateTime;
use url::Url;

/// Validate every field of a message against the chain's rules
///
/// # Errors
/// - `InvalidDomain` - empty, or contains `#` or `?`
/// - `InvalidAddress` - rejected by the chain's address grammar
/// - `InvalidUri` - not an absolute URI with a host
/// - `InvalidMessageVersion` - version other than `1`
/// - `InvalidNonce` - missing, shorter than 8, or not alphanumeric
/// - `UnableToParse` - a line break in the statement, request id or a resource
/// - `InvalidTimeFormat` - a timestamp that is not RFC 3339
pub fn validate_fields(fields: &MessageFields, scheme: &dyn SignatureScheme) -> Result<()> {
    if !is_valid_domain(&fields.domain) {
        return Err(SiwxError::InvalidDomain(fields.domain.clone()));
    }

    if !scheme.is_valid_address(&fields.address) {
        return Err(SiwxError::InvalidAddress {
            address: fields.address.clone(),
            allow_off_curve: scheme.allow_off_curve(),
        });
    }

    if !is_valid_uri(&fields.uri) {
        return Err(SiwxError::InvalidUri(fields.uri.clone()));
    }

    if fields.version != MESSAGE_VERSION {
        return Err(SiwxError::InvalidMessageVersion {
            expected: MESSAGE_VERSION.to_string(),
            received: fields.version.clone(),
        });
    }

    let nonce = fields.nonce.as_deref().unwrap_or_default();
    if !is_valid_nonce(nonce) {
        return Err(SiwxError::InvalidNonce {
            received: nonce.to_string(),
        });
    }

    let free_text = [
        ("statement", fields.statement.as_deref()),
        ("request_id", fields.request_id.as_deref()),
    ];
    let resources = fields.resources.iter().flatten().map(|r| ("resources", Some(r.as_str())));
    for (field, value) in free_text.into_iter().chain(resources) {
        if value.is_some_and(has_line_break) {
            return Err(SiwxError::UnableToParse(format!(
                "{field} must not contain line breaks"
            )));
        }
    }

    let timestamps = [
        ("issued_at", &fields.issued_at),
        ("expiration_time", &fields.expiration_time),
        ("not_before", &fields.not_before),
    ];
    for (field, value) in timestamps {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            if !is_valid_iso8601(value) {
                return Err(SiwxError::InvalidTimeFormat {
                    field,
                    value: value.to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Non-empty single-line authority without fragment or query markers
pub fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty() && !domain.contains(['#', '?']) && !has_line_break(domain)
}

/// Absolute RFC 3986 URI with both a scheme and a host
///
/// `Url::parse` silently drops tabs and newlines, so those are rejected
/// up front.
pub fn is_valid_uri(uri: &str) -> bool {
    !uri.contains(['\t', '\n', '\r']) && Url::parse(uri).is_ok_and(|url| url.has_host())
}

fn has_line_break(value: &str) -> bool {
    value.contains(['\n', '\r'])
}

/// RFC 3339 date-time, the ISO-8601 profile SIWE messages use
pub fn is_valid_iso8601(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}
