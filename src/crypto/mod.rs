pub mod challenge;
pub mod ecdsa;
pub mod ed25519;

// Re-export main functions for easier access
pub use challenge::generate_nonce;
