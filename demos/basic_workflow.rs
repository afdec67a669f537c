// demos/basic_workflow.rs

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use siwx::{create_message, ChainType, MessageFields, VerifyOpts, VerifyParams};
use std::collections::HashSet;

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Sign-In-With-Solana Example");

    // 1. The wallet's key pair (normally held by the user's wallet)
    let wallet = SigningKey::generate(&mut OsRng);
    let address = bs58::encode(wallet.verifying_key().as_bytes()).into_string();

    // 2. Simulate nonce storage (in real app, use Redis/DB)
    let mut issued_nonces: HashSet<String> = HashSet::new();
    let nonce = siwx::generate_nonce();
    issued_nonces.insert(nonce.clone());

    // 3. Server builds the message
    let fields = MessageFields::new("example.com", address, "https://example.com/login", 1)
        .with_statement("Sign in to Example")
        .with_nonce(nonce.clone());
    let mut message = create_message(fields, ChainType::Solana);
    let text = message.prepare_message()?;
    println!("\nMessage to sign:\n{}\n", text);

    // 4. Wallet signs the exact text
    let signature = bs58::encode(wallet.sign(text.as_bytes()).to_bytes()).into_string();

    // 5. Server verifies, binding domain and nonce
    let params = VerifyParams::new(signature)
        .with_domain("example.com")
        .with_nonce(nonce.clone());
    let outcome = message.verify(&params, None).await?;
    if outcome.success && issued_nonces.remove(&nonce) {
        println!("Sign-in successful for {}", outcome.data.address());
    }

    // 6. Replaying against another site fails; suppressed errors come back as values
    let replay = VerifyParams::new(params.signature.clone()).with_domain("evil.example");
    let opts = VerifyOpts::default().suppress_exceptions(true);
    let outcome = message.verify(&replay, Some(&opts)).await?;
    if let Some(error) = outcome.error {
        println!("Replay rejected (expected): {}", error);
    }

    println!("\nExample completed!");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_example_runs() {
        // Test that the example runs without panicking
        run().await.unwrap();
    }
}
