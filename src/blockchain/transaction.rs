//! Transaction building and signing.
//!
//! # Responsibilities
//! - Turn transfer messages into protobuf `Any` messages
//! - Sign with SIGN_MODE_DIRECT for a given account number/sequence and fee
//! - Compute the transaction hash the node will index the bytes under

use cosmrs::bank::{MsgMultiSend, MsgSend, MultiSendIo};
use cosmrs::tendermint::chain;
use cosmrs::tx::{self, Msg, SignDoc, SignerInfo};
use cosmrs::{AccountId, Any, Coin};
use sha2::{Digest, Sha256};

use crate::blockchain::types::{AccountInfo, BlockchainError, BlockchainResult, CoinAmount, Fee};
use crate::blockchain::wallet::Wallet;

/// One side of a multisend: an address and the coins it sends or receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIo {
    pub address: AccountId,
    pub coins: Vec<CoinAmount>,
}

/// Bank message ready to be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferMessage {
    Send {
        from: AccountId,
        to: AccountId,
        amount: Vec<CoinAmount>,
    },
    MultiSend {
        inputs: Vec<TransferIo>,
        outputs: Vec<TransferIo>,
    },
}

/// Signed transaction bytes plus their hash.
#[derive(Debug, Clone)]
pub struct SignedTx {
    pub bytes: Vec<u8>,
    pub hash: String,
}

fn to_coin(coin: &CoinAmount) -> BlockchainResult<Coin> {
    Coin::new(coin.amount, &coin.denom)
        .map_err(|e| BlockchainError::Signing(format!("Invalid coin {}: {}", coin, e)))
}

fn to_coins(coins: &[CoinAmount]) -> BlockchainResult<Vec<Coin>> {
    coins.iter().map(to_coin).collect()
}

fn to_io(io: &TransferIo) -> BlockchainResult<MultiSendIo> {
    Ok(MultiSendIo {
        address: io.address.clone(),
        coins: to_coins(&io.coins)?,
    })
}

impl TransferMessage {
    /// Encode as a protobuf `Any`.
    pub fn to_any(&self) -> BlockchainResult<Any> {
        let encoded = match self {
            TransferMessage::Send { from, to, amount } => MsgSend {
                from_address: from.clone(),
                to_address: to.clone(),
                amount: to_coins(amount)?,
            }
            .to_any(),
            TransferMessage::MultiSend { inputs, outputs } => MsgMultiSend {
                inputs: inputs.iter().map(to_io).collect::<BlockchainResult<_>>()?,
                outputs: outputs.iter().map(to_io).collect::<BlockchainResult<_>>()?,
            }
            .to_any(),
        };
        encoded.map_err(|e| BlockchainError::Signing(format!("Message encoding failed: {}", e)))
    }
}

/// Signs transfer messages for one chain.
#[derive(Debug, Clone)]
pub struct TxSigner {
    chain_id: chain::Id,
}

impl TxSigner {
    pub fn new(chain_id: &str) -> BlockchainResult<Self> {
        let chain_id = chain_id
            .parse()
            .map_err(|e| BlockchainError::Config(format!("Invalid chain id '{}': {}", chain_id, e)))?;
        Ok(Self { chain_id })
    }

    pub fn chain_id(&self) -> &str {
        self.chain_id.as_str()
    }

    /// Build and sign a transaction.
    pub fn sign(
        &self,
        wallet: &Wallet,
        account: AccountInfo,
        messages: &[TransferMessage],
        memo: &str,
        fee: &Fee,
    ) -> BlockchainResult<SignedTx> {
        let anys = messages
            .iter()
            .map(TransferMessage::to_any)
            .collect::<BlockchainResult<Vec<_>>>()?;

        let body = tx::Body::new(anys, memo, 0u32);
        let signer_info = SignerInfo::single_direct(Some(wallet.public_key()), account.sequence);
        let auth_info = signer_info.auth_info(tx::Fee::from_amount_and_gas(to_coin(&fee.amount)?, fee.gas_limit));

        let sign_doc = SignDoc::new(&body, &auth_info, &self.chain_id, account.account_number)
            .map_err(|e| BlockchainError::Signing(format!("Sign doc: {}", e)))?;
        let raw = sign_doc
            .sign(wallet.signing_key())
            .map_err(|e| BlockchainError::Signing(format!("Signing failed: {}", e)))?;
        let bytes = raw
            .to_bytes()
            .map_err(|e| BlockchainError::Signing(format!("Encoding failed: {}", e)))?;

        let hash = tx_hash(&bytes);
        Ok(SignedTx { bytes, hash })
    }
}

/// Uppercase hex SHA-256 of the raw transaction bytes, as nodes index it.
pub fn tx_hash(bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(bytes))
}
