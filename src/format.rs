//! Canonical message text.
//!
//! ```text
//! <domain> wants you to sign in with your <chain> account:
//! <address>
//!
//! <statement>
//!
//! URI: <uri>
//! Version: <version>
//! Chain ID: <chain id>
//! Nonce: <nonce>
//! Issued At: <issued at>
//! Expiration Time: <expiration time>
//! Not Before: <not before>
//! Request ID: <request id>
//! Resources:
//! - <resource>
//! ```
//!
//! Without a statement the address is followed by two blank lines. The
//! trailing optional lines appear only when set, always in this order.
//! Signatures are made over these exact bytes.

use crate::{
    chains::ChainType,
    error::{Result, SiwxError},
    message::MessageFields,
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::iter::Peekable;
use std::str::Split;

const HEADER_INFIX: &str = " wants you to sign in with your ";
const HEADER_SUFFIX: &str = " account:";
const URI_TAG: &str = "URI: ";
const VERSION_TAG: &str = "Version: ";
const CHAIN_ID_TAG: &str = "Chain ID: ";
const NONCE_TAG: &str = "Nonce: ";
const ISSUED_AT_TAG: &str = "Issued At: ";
const EXPIRATION_TIME_TAG: &str = "Expiration Time: ";
const NOT_BEFORE_TAG: &str = "Not Before: ";
const REQUEST_ID_TAG: &str = "Request ID: ";
const RESOURCES_TAG: &str = "Resources:";
const RESOURCE_PREFIX: &str = "- ";

/// Render a timestamp as RFC 3339 with milliseconds and a `Z` suffix
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp, naming the field on failure
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|_| SiwxError::InvalidTimeFormat {
            field,
            value: value.to_string(),
        })
}

/// `None` for a missing or empty string
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Render finalized fields into the canonical text
///
/// Expects validated fields; a missing `nonce` or `issued_at` is reported
/// as `UnableToParse`.
pub(crate) fn render(fields: &MessageFields, chain_name: &str) -> Result<String> {
    let nonce = non_empty(&fields.nonce)
        .ok_or_else(|| SiwxError::UnableToParse("missing Nonce".to_string()))?;
    let issued_at = non_empty(&fields.issued_at)
        .ok_or_else(|| SiwxError::UnableToParse("missing Issued At".to_string()))?;

    let mut lines = vec![
        format!("{}{HEADER_INFIX}{chain_name}{HEADER_SUFFIX}", fields.domain),
        fields.address.clone(),
        String::new(),
    ];
    if let Some(statement) = non_empty(&fields.statement) {
        lines.push(statement.to_string());
    }
    lines.push(String::new());

    lines.push(format!("{URI_TAG}{}", fields.uri));
    lines.push(format!("{VERSION_TAG}{}", fields.version));
    lines.push(format!("{CHAIN_ID_TAG}{}", fields.chain_id));
    lines.push(format!("{NONCE_TAG}{nonce}"));
    lines.push(format!("{ISSUED_AT_TAG}{issued_at}"));
    if let Some(expiration_time) = non_empty(&fields.expiration_time) {
        lines.push(format!("{EXPIRATION_TIME_TAG}{expiration_time}"));
    }
    if let Some(not_before) = non_empty(&fields.not_before) {
        lines.push(format!("{NOT_BEFORE_TAG}{not_before}"));
    }
    if let Some(request_id) = non_empty(&fields.request_id) {
        lines.push(format!("{REQUEST_ID_TAG}{request_id}"));
    }
    if let Some(resources) = &fields.resources {
        lines.push(RESOURCES_TAG.to_string());
        lines.extend(resources.iter().map(|r| format!("{RESOURCE_PREFIX}{r}")));
    }

    Ok(lines.join("\n"))
}

type Lines<'a> = Peekable<Split<'a, char>>;

fn next_line<'a>(lines: &mut Lines<'a>, what: &str) -> Result<&'a str> {
    lines
        .next()
        .ok_or_else(|| SiwxError::UnableToParse(format!("missing {what}")))
}

fn blank_line(lines: &mut Lines<'_>, after: &str) -> Result<()> {
    match lines.next() {
        Some("") => Ok(()),
        Some(line) => Err(SiwxError::UnableToParse(format!(
            "expected blank line after {after}, found {line:?}"
        ))),
        None => Err(SiwxError::UnableToParse(format!(
            "missing blank line after {after}"
        ))),
    }
}

fn tagged<'a>(lines: &mut Lines<'a>, tag: &str) -> Result<&'a str> {
    let line = next_line(lines, tag.trim_end())?;
    line.strip_prefix(tag)
        .ok_or_else(|| SiwxError::UnableToParse(format!("expected {tag:?}, found {line:?}")))
}

fn optional_tagged<'a>(lines: &mut Lines<'a>, tag: &str) -> Option<String> {
    lines
        .next_if(|line| line.starts_with(tag))
        .map(|line| line[tag.len()..].to_string())
}

/// Parse canonical text back into its chain type and fields
///
/// Lines must appear exactly as [`render`] writes them.
///
/// # Errors
/// `UnableToParse` naming the first line that does not fit.
pub fn parse_message(text: &str) -> Result<(ChainType, MessageFields)> {
    let mut lines = text.split('\n').peekable();

    let header = next_line(&mut lines, "header")?;
    let (domain, chain_name) = header
        .strip_suffix(HEADER_SUFFIX)
        .and_then(|rest| rest.split_once(HEADER_INFIX))
        .ok_or_else(|| SiwxError::UnableToParse(format!("invalid header {header:?}")))?;
    let chain_type = ChainType::from_chain_name(chain_name).ok_or_else(|| {
        SiwxError::UnableToParse(format!("unknown chain {chain_name:?} in header"))
    })?;

    let address = next_line(&mut lines, "address")?;
    blank_line(&mut lines, "address")?;
    let statement = match next_line(&mut lines, "URI")? {
        "" => None,
        statement => {
            blank_line(&mut lines, "statement")?;
            Some(statement.to_string())
        }
    };

    let uri = tagged(&mut lines, URI_TAG)?;
    let version = tagged(&mut lines, VERSION_TAG)?;
    let chain_id = tagged(&mut lines, CHAIN_ID_TAG)?;
    let chain_id = chain_id
        .parse::<i64>()
        .map_err(|_| SiwxError::UnableToParse(format!("invalid Chain ID {chain_id:?}")))?;
    let nonce = tagged(&mut lines, NONCE_TAG)?;
    let issued_at = tagged(&mut lines, ISSUED_AT_TAG)?;
    let expiration_time = optional_tagged(&mut lines, EXPIRATION_TIME_TAG);
    let not_before = optional_tagged(&mut lines, NOT_BEFORE_TAG);
    let request_id = optional_tagged(&mut lines, REQUEST_ID_TAG);

    let resources = match lines.next_if_eq(&RESOURCES_TAG) {
        Some(_) => {
            let mut resources = Vec::new();
            while let Some(line) = lines.next_if(|line| line.starts_with(RESOURCE_PREFIX)) {
                resources.push(line[RESOURCE_PREFIX.len()..].to_string());
            }
            Some(resources)
        }
        None => None,
    };

    if let Some(line) = lines.next() {
        return Err(SiwxError::UnableToParse(format!("unexpected line {line:?}")));
    }

    let fields = MessageFields {
        domain: domain.to_string(),
        address: address.to_string(),
        statement,
        uri: uri.to_string(),
        version: version.to_string(),
        chain_id,
        nonce: Some(nonce.to_string()),
        issued_at: Some(issued_at.to_string()),
        expiration_time,
        not_before,
        request_id,
        resources,
    };
    Ok((chain_type, fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> MessageFields {
        MessageFields::new(
            "example.com",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "https://example.com/login",
            1,
        )
        .with_nonce("abcdefgh12")
        .with_issued_at("2024-05-01T12:00:00.000Z")
    }

    #[test]
    fn test_render_minimal() {
        let text = render(&fields(), "Ethereum").unwrap();
        assert_eq!(
            text,
            "example.com wants you to sign in with your Ethereum account:\n\
             0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed\n\
             \n\
             \n\
             URI: https://example.com/login\n\
             Version: 1\n\
             Chain ID: 1\n\
             Nonce: abcdefgh12\n\
             Issued At: 2024-05-01T12:00:00.000Z"
        );
    }

    #[test]
    fn test_render_full() {
        let fields = fields()
            .with_statement("I accept the Terms of Service")
            .with_expiration_time("2024-05-02T12:00:00.000Z")
            .with_not_before("2024-05-01T11:00:00.000Z")
            .with_request_id("req-42")
            .with_resources(["ipfs://bafybeiemxf5abjwjbikoz4mc3a3dla6ual3jsgpdr4cjr3oz3evfyavhwq", "https://example.com/my-web2-claim.json"]);
        let mut fields = fields;
        fields.chain_id = -1;

        let text = render(&fields, "Solana").unwrap();
        assert_eq!(
            text,
            "example.com wants you to sign in with your Solana account:\n\
             0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed\n\
             \n\
             I accept the Terms of Service\n\
             \n\
             URI: https://example.com/login\n\
             Version: 1\n\
             Chain ID: -1\n\
             Nonce: abcdefgh12\n\
             Issued At: 2024-05-01T12:00:00.000Z\n\
             Expiration Time: 2024-05-02T12:00:00.000Z\n\
             Not Before: 2024-05-01T11:00:00.000Z\n\
             Request ID: req-42\n\
             Resources:\n\
             - ipfs://bafybeiemxf5abjwjbikoz4mc3a3dla6ual3jsgpdr4cjr3oz3evfyavhwq\n\
             - https://example.com/my-web2-claim.json"
        );
    }

    #[test]
    fn test_empty_statement_renders_as_absent() {
        let with_empty = render(&fields().with_statement(""), "Ethereum").unwrap();
        assert_eq!(with_empty, render(&fields(), "Ethereum").unwrap());
    }

    #[test]
    fn test_parse_inverts_render() {
        let fields = fields()
            .with_statement("Sign in")
            .with_not_before("2024-05-01T11:00:00.000Z")
            .with_resources(["https://example.com/a"]);
        let text = render(&fields, "Ethereum").unwrap();

        let (chain_type, parsed) = parse_message(&text).unwrap();
        assert_eq!(chain_type, ChainType::Evm);
        assert_eq!(parsed, fields);
        assert_eq!(render(&parsed, "Ethereum").unwrap(), text);
    }

    #[test]
    fn test_parse_without_statement() {
        let text = render(&fields(), "Solana").unwrap();
        let (chain_type, parsed) = parse_message(&text).unwrap();
        assert_eq!(chain_type, ChainType::Solana);
        assert_eq!(parsed.statement, None);
        assert_eq!(parsed.resources, None);
    }

    #[test]
    fn test_parse_rejects_unknown_chain() {
        let text = render(&fields(), "Bitcoin").unwrap();
        assert!(matches!(parse_message(&text), Err(SiwxError::UnableToParse(_))));
    }

    #[test]
    fn test_parse_rejects_out_of_order_lines() {
        let text = render(&fields(), "Ethereum")
            .unwrap()
            .replace("Version: 1\nChain ID: 1", "Chain ID: 1\nVersion: 1");
        assert!(matches!(parse_message(&text), Err(SiwxError::UnableToParse(_))));
    }

    #[test]
    fn test_parse_rejects_trailing_lines() {
        let text = format!("{}\nExtra: value", render(&fields(), "Ethereum").unwrap());
        assert!(matches!(parse_message(&text), Err(SiwxError::UnableToParse(_))));

        let text = format!("{}\n", render(&fields(), "Ethereum").unwrap());
        assert!(matches!(parse_message(&text), Err(SiwxError::UnableToParse(_))));
    }

    #[test]
    fn test_parse_timestamp() {
        let time = parse_timestamp("time", "2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(format_timestamp(time), "2024-05-01T10:00:00.000Z");

        assert!(matches!(
            parse_timestamp("time", "yesterday"),
            Err(SiwxError::InvalidTimeFormat { field: "time", .. })
        ));
    }
}
