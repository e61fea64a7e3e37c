//! Per-request signing credentials.
//!
//! # Security
//! - Credentials arrive with each request and are never cached or persisted
//! - Keys are never logged; only the derived address is
//! - Accepts a BIP-39 mnemonic or a hex-encoded secp256k1 private key

use bip32::{DerivationPath, XPrv};
use bip39::{Language, Mnemonic};
use cosmrs::crypto::secp256k1::SigningKey;
use cosmrs::crypto::PublicKey;
use cosmrs::AccountId;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Standard Cosmos HD path (coin type 118).
pub const COSMOS_HD_PATH: &str = "m/44'/118'/0'/0/0";

/// Signing key plus the address it controls.
pub struct Wallet {
    signing_key: SigningKey,
    address: AccountId,
}

impl Wallet {
    /// Derive a wallet from a request credential.
    ///
    /// 64 hex characters (optionally `0x`-prefixed) are read as a raw private
    /// key; anything else is treated as a mnemonic phrase.
    pub fn from_credential(credential: &str, prefix: &str) -> BlockchainResult<Self> {
        let trimmed = credential.trim();
        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        if key_hex.len() == 64 && key_hex.chars().all(|c| c.is_ascii_hexdigit()) {
            Self::from_private_key(key_hex, prefix)
        } else {
            Self::from_mnemonic(trimmed, prefix)
        }
    }

    /// Derive a wallet from a mnemonic at [`COSMOS_HD_PATH`].
    ///
    /// Any checksummed English phrase of 12, 15, 18, 21 or 24 words.
    pub fn from_mnemonic(phrase: &str, prefix: &str) -> BlockchainResult<Self> {
        let normalized = phrase
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|e| BlockchainError::Wallet(format!("Invalid mnemonic phrase: {}", e)))?;
        let seed = mnemonic.to_seed_normalized("");

        let path: DerivationPath = COSMOS_HD_PATH
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid derivation path: {}", e)))?;
        let xprv = XPrv::derive_from_path(&seed, &path)
            .map_err(|e| BlockchainError::Wallet(format!("Key derivation failed: {}", e)))?;

        let key_bytes = xprv.private_key().to_bytes();
        let signing_key = SigningKey::from_slice(&key_bytes)
            .map_err(|e| BlockchainError::Wallet(format!("Invalid derived key: {}", e)))?;
        Self::from_signing_key(signing_key, prefix)
    }

    /// Load a wallet from a hex-encoded private key.
    pub fn from_private_key(private_key_hex: &str, prefix: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let bytes = hex::decode(key_hex)
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key: {}", e)))?;
        Self::from_signing_key(signing_key, prefix)
    }

    fn from_signing_key(signing_key: SigningKey, prefix: &str) -> BlockchainResult<Self> {
        let address = signing_key
            .public_key()
            .account_id(prefix)
            .map_err(|e| BlockchainError::Wallet(format!("Address derivation failed: {}", e)))?;

        tracing::debug!(address = %address, "Wallet loaded");

        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Bech32 address of this wallet.
    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn public_key(&self) -> PublicKey {
        self.signing_key.public_key()
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address.to_string())
            .finish_non_exhaustive()
    }
}

/// Parse a bech32 address and require the expected prefix.
pub fn parse_address(raw: &str, prefix: &str) -> BlockchainResult<AccountId> {
    let account: AccountId = raw
        .trim()
        .parse()
        .map_err(|_| BlockchainError::InvalidAddress(raw.to_string()))?;
    if account.prefix() != prefix {
        return Err(BlockchainError::InvalidAddress(format!(
            "{} (expected prefix '{}')",
            raw, prefix
        )));
    }
    Ok(account)
}
