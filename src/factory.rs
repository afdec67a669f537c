use crate::{
    chains::{ChainType, EvmMessage, SolanaMessage},
    error::{Result, SiwxError},
    message::{Message, MessageFields},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON key carrying [`MessageExtensions::allow_off_curve`] next to the fields
pub const ALLOW_OFF_CURVE_KEY: &str = "allowOffCurve";

/// Chain-specific construction data that is not part of the signed text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MessageExtensions {
    /// Solana only: accept an address that is not on the ed25519 curve
    #[serde(default)]
    pub allow_off_curve: bool,
}

impl MessageExtensions {
    pub fn allow_off_curve(mut self, allow_off_curve: bool) -> Self {
        self.allow_off_curve = allow_off_curve;
        self
    }
}

/// Build the message variant for `chain_type`
///
/// # Example
/// ```rust
/// use siwx::{create_message, ChainType, MessageFields};
///
/// let fields = MessageFields::new(
///     "solana.com",
///     "11111111111111111111111111111111",
///     "https://solana.com",
///     -1,
/// );
/// let message = create_message(fields, ChainType::Solana);
/// assert_eq!(message.chain_type(), ChainType::Solana);
/// ```
pub fn create_message(fields: MessageFields, chain_type: ChainType) -> Message {
    create_message_with(fields, chain_type, MessageExtensions::default())
}

/// Build the message variant for `chain_type` with chain-specific extensions
///
/// Extensions a chain does not use are ignored.
pub fn create_message_with(
    fields: MessageFields,
    chain_type: ChainType,
    extensions: MessageExtensions,
) -> Message {
    match chain_type {
        ChainType::Solana => Message::Solana(
            SolanaMessage::new(fields).with_allow_off_curve(extensions.allow_off_curve),
        ),
        ChainType::Evm => Message::Evm(EvmMessage::new(fields)),
    }
}

/// Build a message from a chain type tag such as `"sol"` or `"evm"`
///
/// # Errors
/// `UnsupportedChainType` carrying the tag when it names no known chain.
pub fn create_message_for_tag(fields: MessageFields, tag: &str) -> Result<Message> {
    Ok(create_message(fields, tag.parse()?))
}

/// Build a message from a JSON object of fields
///
/// Solana messages may also carry `allowOffCurve` (a boolean) in the same
/// object. Any other unknown key is rejected.
///
/// # Errors
/// `UnableToParse` when the value is not an object, `allowOffCurve` is not a
/// boolean, or the fields do not deserialize.
pub fn create_message_from_json(value: &Value, chain_type: ChainType) -> Result<Message> {
    let mut object = value
        .as_object()
        .cloned()
        .ok_or_else(|| SiwxError::UnableToParse("message fields must be an object".to_string()))?;

    let mut extensions = MessageExtensions::default();
    if chain_type == ChainType::Solana {
        if let Some(flag) = object.remove(ALLOW_OFF_CURVE_KEY) {
            extensions.allow_off_curve = flag.as_bool().ok_or_else(|| {
                SiwxError::UnableToParse(format!("{ALLOW_OFF_CURVE_KEY} must be a boolean"))
            })?;
        }
    }

    let fields: MessageFields = serde_json::from_value(Value::Object(object))
        .map_err(|e| SiwxError::UnableToParse(format!("Invalid message fields: {}", e)))?;
    Ok(create_message_with(fields, chain_type, extensions))
}
