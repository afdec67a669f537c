use chrono::{Duration, Utc};
use ed25519_dalek::Signer;
use k256::ecdsa::SigningKey as EvmKey;
use siwx::crypto::ecdsa::{address_from_key, eip191_hash, to_checksum_address};
use siwx::{
    create_message, create_message_for_tag, ChainType, Message, MessageFields, SiwxError,
    VerifyOpts, VerifyParams,
};
use std::str::FromStr;

fn solana_key() -> ed25519_dalek::SigningKey {
    ed25519_dalek::SigningKey::from_bytes(&[7u8; 32])
}

fn solana_address(key: &ed25519_dalek::SigningKey) -> String {
    bs58::encode(key.verifying_key().as_bytes()).into_string()
}

fn sign_solana(key: &ed25519_dalek::SigningKey, text: &str) -> String {
    bs58::encode(key.sign(text.as_bytes()).to_bytes()).into_string()
}

fn evm_key() -> EvmKey {
    EvmKey::from_slice(&[0x11u8; 32]).unwrap()
}

fn evm_address(key: &EvmKey) -> String {
    to_checksum_address(&address_from_key(key.verifying_key()))
}

fn sign_evm(key: &EvmKey, text: &str) -> String {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(&eip191_hash(text.as_bytes()))
        .unwrap();
    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(recovery_id.to_byte() + 27);
    format!("0x{}", hex::encode(bytes))
}

#[tokio::test]
async fn test_solana_message_sign_and_verify() {
    let key = solana_key();
    let nonce = "abcdefghiJs23232Hsp";
    let fields = MessageFields::new("solana.com", solana_address(&key), "https://solana.com", -1)
        .with_statement("This is a test message.")
        .with_nonce(nonce)
        .with_issued_at(Utc::now().to_rfc3339());

    let mut message = create_message_for_tag(fields, "sol").unwrap();
    let text = message.prepare_message().unwrap();
    assert!(text.starts_with("solana.com wants you to sign in with your Solana account:\n"));
    assert!(text.contains("\nChain ID: -1\n"));

    let signature = sign_solana(&key, &text);
    let params = VerifyParams::new(signature).with_nonce(nonce);
    let outcome = message.verify(&params, None).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.error, None);
    assert_eq!(outcome.data, message);
}

#[tokio::test]
async fn test_evm_message_sign_and_verify() {
    let key = evm_key();
    let fields = MessageFields::new("example.com", evm_address(&key), "https://example.com", 1)
        .with_nonce("abcdefgh12");

    let mut message = create_message(fields, ChainType::Evm);
    let text = message.prepare_message().unwrap();
    let signature = sign_evm(&key, &text);

    // Verify without any time override before an expiration
    let params = VerifyParams::new(signature.clone()).with_nonce("abcdefgh12");
    let outcome = message.verify(&params, None).await.unwrap();
    assert!(outcome.success);

    let verified = message.validate(&signature, None).await.unwrap();
    assert_eq!(verified.address(), message.address());
}

#[tokio::test]
async fn test_evm_signature_from_other_key() {
    let key = evm_key();
    let other = EvmKey::from_slice(&[0x22u8; 32]).unwrap();
    let fields = MessageFields::new("example.com", evm_address(&key), "https://example.com", 1)
        .with_nonce("abcdefgh12");

    let mut message = create_message(fields, ChainType::Evm);
    let text = message.prepare_message().unwrap();

    let params = VerifyParams::new(sign_evm(&other, &text));
    let error = message.verify(&params, None).await.unwrap_err();
    assert!(matches!(error.error, SiwxError::InvalidSignature(_)));
    assert_eq!(*error.data, message);
}

#[tokio::test]
async fn test_expired_message_rejected_before_signature() {
    let key = solana_key();
    let issued = Utc::now() - Duration::hours(2);
    let fields = MessageFields::new("example.com", solana_address(&key), "https://example.com", 1)
        .with_nonce("abcdefgh12")
        .with_issued_at(issued.to_rfc3339())
        .with_expiration_time((issued + Duration::hours(1)).to_rfc3339());

    let mut message = create_message(fields, ChainType::Solana);
    let text = message.prepare_message().unwrap();
    let params = VerifyParams::new(sign_solana(&key, &text));

    let opts = VerifyOpts::default().suppress_exceptions(true);
    let outcome = message.verify(&params, Some(&opts)).await.unwrap();
    assert!(!outcome.success);
    assert!(matches!(outcome.error, Some(SiwxError::ExpiredMessage { .. })));

    // Still valid when checked at a time inside the window
    let inside = VerifyParams {
        time: Some((issued + Duration::minutes(30)).to_rfc3339()),
        ..params
    };
    let outcome = message.verify(&inside, None).await.unwrap();
    assert!(outcome.success);
}

#[tokio::test]
async fn test_parsed_message_verifies() {
    let key = solana_key();
    let fields = MessageFields::new("example.com", solana_address(&key), "https://example.com/login", 101)
        .with_statement("Sign in to Example")
        .with_request_id("req-42")
        .with_resources(["https://example.com/terms", "ipfs://bafy"]);

    let mut message = create_message(fields, ChainType::Solana);
    let text = message.prepare_message().unwrap();
    let signature = sign_solana(&key, &text);

    // Server side only has the text and the signature
    let parsed = Message::from_str(&text).unwrap();
    assert_eq!(parsed, message);
    assert_eq!(parsed.resources().map(<[String]>::len), Some(2));

    let verified = parsed.validate(&signature, None).await.unwrap();
    assert_eq!(verified.request_id(), Some("req-42"));
}

#[test]
fn test_unknown_chain_tag() {
    let fields = MessageFields::new("example.com", "addr", "https://example.com", 1);
    let error = create_message_for_tag(fields, "cosmos").unwrap_err();
    assert_eq!(error, SiwxError::UnsupportedChainType("cosmos".to_string()));
}
