//! Read-only access to the key-value secret store (Vault KV version 2).

pub mod vault;

pub use vault::{KvSecret, SecretError, VaultClient};
